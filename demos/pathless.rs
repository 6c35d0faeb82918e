//! Apps mounted without a prefix, to combine their behaviour.
//!
//! Run with:
//!   cargo run --example pathless
//!
//! Try:
//!   curl http://localhost:3000/hello
//!   curl http://localhost:3000/world

use mounting::{App, Server, mount_root};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), mounting::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // GET /hello
    let hello = App::named("hello").with_fn(|ctx, next| Box::pin(async move {
        next.run(ctx).await?;
        if ctx.path() == "/hello" {
            ctx.set_text("Hello");
        }
        Ok(())
    }));

    // GET /world
    let world = App::named("world").with_fn(|ctx, next| Box::pin(async move {
        next.run(ctx).await?;
        if ctx.path() == "/world" {
            ctx.set_text("World");
        }
        Ok(())
    }));

    let app = App::new()
        .with_boxed(mount_root(hello))
        .with_boxed(mount_root(world));

    Server::bind("0.0.0.0:3000")?.serve(app).await
}
