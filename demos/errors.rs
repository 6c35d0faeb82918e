//! Errors raised deep inside mounted apps propagate up to the app the
//! server runs, where a single hook can report them.
//!
//! Run with:
//!   cargo run --example errors
//!
//! Try:
//!   curl -i http://localhost:3000/anything     # 500, reported once

use mounting::{App, Error, Server, mount_root};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), mounting::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let c = App::named("c").with_fn(|ctx, next| Box::pin(async move {
        next.run(ctx).await?;
        Err::<(), _>(Error::msg("tobi escaped!"))
    }));

    let b = App::named("b")
        .with_fn(|ctx, next| next.run(ctx))
        .with_boxed(mount_root(c));

    // Sub-apps can have hooks of their own, but only the app handed to the
    // server reports: the decision belongs to the parent.
    let a = App::named("a")
        .with_fn(|ctx, next| next.run(ctx))
        .with_boxed(mount_root(b))
        .on_error(|err, ctx| {
            warn!(method = %ctx.method(), path = %ctx.path(), "sending error \"{err}\" to alert service");
        });

    Server::bind("0.0.0.0:3000")?.serve(a).await
}
