//! The typical pattern: apps mounted at their own prefix.
//!
//! Run with:
//!   RUST_LOG=mounting=trace cargo run --example simple
//!
//! Try:
//!   curl http://localhost:3000/hello
//!   curl http://localhost:3000/world
//!   curl -i http://localhost:3000/        # 404

use mounting::{App, Server, mount};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), mounting::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let hello = App::named("hello").with_fn(|ctx, next| Box::pin(async move {
        next.run(ctx).await?;
        ctx.set_text("Hello");
        Ok(())
    }));

    let world = App::named("world").with_fn(|ctx, next| Box::pin(async move {
        next.run(ctx).await?;
        ctx.set_text("World");
        Ok(())
    }));

    let app = App::new()
        .with_boxed(mount("/hello", hello)?)
        .with_boxed(mount("/world", world)?);

    Server::bind("0.0.0.0:3000")?.serve(app).await
}
