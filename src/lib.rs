//! # mounting
//!
//! Mount middleware stacks under a path prefix.
//!
//! An application is an ordered stack of middleware sharing one mutable
//! request [`Context`]. [`mount`] takes a path prefix and a sub-application
//! (or a single middleware) and produces a middleware that:
//!
//! - passes requests outside the prefix straight to the next middleware;
//! - runs requests under the prefix through the sub-application with the
//!   prefix cut off the path (`/blog/2024` → `/2024`);
//! - puts the original path back before the chain goes on, and on every
//!   other way out too, failures included.
//!
//! Mount points nest: a mounted app can mount apps of its own, and each level
//! only ever sees the part of the path below its prefix.
//!
//! What this crate is not: a router. There is no parameter extraction, no
//! wildcard, no method dispatch. Prefixes are literal strings.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mounting::{App, Server, mount};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mounting::Error> {
//!     let hello = App::named("hello").with_fn(|ctx, next| Box::pin(async move {
//!         next.run(ctx).await?;
//!         ctx.set_text("Hello");
//!         Ok(())
//!     }));
//!
//!     let world = App::named("world").with_fn(|ctx, next| Box::pin(async move {
//!         next.run(ctx).await?;
//!         ctx.set_text("World");
//!         Ok(())
//!     }));
//!
//!     let app = App::new()
//!         .with_boxed(mount("/hello", hello)?)
//!         .with_boxed(mount("/world", world)?);
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//! ```
//!
//! ## Diagnostics
//!
//! Mount points emit [`tracing`] events under the `mounting::mount` target:
//! `mount` when built, then `enter`, `skip` and `leave` per request. They
//! cost nothing until a subscriber is installed.

mod app;
mod context;
mod error;
mod middleware;
mod mount;
mod prefix;
mod response;
mod server;

pub use app::{App, ErrorHook, Stack};
pub use context::Context;
pub use error::Error;
pub use middleware::{BoxFuture, BoxedMiddleware, FromFn, Middleware, Next, from_fn};
pub use mount::{Mountable, Target, mount, mount_root};
pub use prefix::Prefix;
pub use response::{ContentType, Response};
pub use server::Server;

/// Re-exported so callers can name methods and status codes without adding
/// `http` themselves.
pub use http::{Method, StatusCode};
