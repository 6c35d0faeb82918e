//! Mounting: run an app (or a single middleware) under a path prefix.
//!
//! ```text
//! GET /blog/2024/hello
//!   app ──▶ mount("/blog", blog)
//!             │  path = "/2024/hello", mount_path = "/blog"
//!             ├──▶ blog's own stack
//!             │  path = "/blog/2024/hello", mount_path = None
//!             └──▶ rest of app
//! ```
//!
//! Requests whose path does not fall under the prefix skip the mounted
//! target entirely. Requests that do see the path relative to the prefix
//! while they are inside it, and the original path again once they leave,
//! whichever way they leave: by running `next`, by returning, by failing,
//! or by being dropped mid-flight.
//!
//! Restoring is a plain reassignment. A middleware further down the
//! caller's chain that rewrites the path with
//! [`Context::set_path`](crate::Context::set_path) will see its rewrite
//! reverted once the mount point it ran behind has finished.
//!
//! Errors are never caught here. A failure deep inside nested mounts
//! surfaces to whichever app is running the outermost stack.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::app::{App, Stack};
use crate::context::Context;
use crate::error::Error;
use crate::middleware::{BoxFuture, BoxedMiddleware, Middleware, Next};
use crate::prefix::Prefix;

// ── Public API ────────────────────────────────────────────────────────────────

/// Mounts `target` under `prefix`.
///
/// `prefix` must begin with `/`; anything else fails with
/// [`Error::InvalidArgument`]. Mounting at `/` rewrites nothing and returns
/// the target itself, exactly as [`mount_root`] does.
///
/// ```rust
/// use mounting::{App, mount};
///
/// let hello = App::named("hello").with_fn(|ctx, next| Box::pin(async move {
///     next.run(ctx).await?;
///     ctx.set_text("Hello");
///     Ok(())
/// }));
///
/// let app = App::new().with_boxed(mount("/hello", hello)?);
/// # Ok::<(), mounting::Error>(())
/// ```
pub fn mount(prefix: &str, target: impl Mountable) -> Result<BoxedMiddleware, Error> {
    let prefix = Prefix::parse(prefix)?;
    Ok(build(prefix, target.into_target()))
}

/// Mounts `target` without a prefix, to combine the behaviour of several
/// apps in one chain.
pub fn mount_root(target: impl Mountable) -> BoxedMiddleware {
    build(Prefix::root(), target.into_target())
}

/// Anything that can be mounted: an [`App`] or a single [`Middleware`].
///
/// A composed [`Stack`] mounts exactly like the [`App`] it came from, even
/// when it arrives as a [`BoxedMiddleware`].
///
/// Sealed; the two implementations below are the only ones.
pub trait Mountable: private::Sealed {
    #[doc(hidden)]
    fn into_target(self) -> Target;
}

mod private {
    pub trait Sealed {}
}

impl<M: Middleware> private::Sealed for M {}
impl private::Sealed for App {}

impl<M: Middleware> Mountable for M {
    fn into_target(self) -> Target {
        if let Some(stack) = self.as_stack() {
            return Target::Stack(stack.clone());
        }
        Target::Handler(Arc::new(self))
    }
}

impl Mountable for App {
    fn into_target(self) -> Target {
        Target::Stack(self.compose())
    }
}

/// The two shapes a mount target comes in.
///
/// `#[doc(hidden)] pub` because it appears in [`Mountable`]'s signature.
#[doc(hidden)]
pub enum Target {
    /// A bare middleware. It is handed the caller's continuation and decides
    /// itself whether the chain goes on.
    Handler(BoxedMiddleware),
    /// A composed app. It runs to completion on its own, then the caller's
    /// chain always goes on.
    Stack(Stack),
}

impl Target {
    fn name(&self) -> &str {
        match self {
            Self::Stack(stack) => stack.name().unwrap_or("unnamed"),
            Self::Handler(_) => "unnamed",
        }
    }

    /// The target spliced straight into the caller's chain.
    fn spliced(self) -> BoxedMiddleware {
        match self {
            Self::Handler(handler) => handler,
            Self::Stack(stack) => Arc::new(stack),
        }
    }

    /// The target behind a mount point, normalised so that both shapes take
    /// `(ctx, next)` and run `next` when they are done.
    fn isolated(self) -> BoxedMiddleware {
        match self {
            Self::Handler(handler) => handler,
            Self::Stack(stack) => Arc::new(Isolated(stack)),
        }
    }
}

/// Runs a stack to completion, then the caller's `next`.
struct Isolated(Stack);

impl Middleware for Isolated {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            self.0.run(ctx).await?;
            next.run(ctx).await
        })
    }
}

// ── Mount ─────────────────────────────────────────────────────────────────────

/// Builds the middleware for a mount point. The root prefix splices the
/// target into the caller's chain as is.
fn build(prefix: Prefix, target: Target) -> BoxedMiddleware {
    let name = target.name().to_owned();
    if let Target::Stack(stack) = &target {
        if stack.has_error_hook() {
            debug!(target: "mounting::mount", prefix = %prefix, name = %name, "error hook of mounted app is ignored");
        }
    }
    if prefix.is_root() {
        debug!(target: "mounting::mount", prefix = %prefix, name = %name, "mount (spliced)");
        return target.spliced();
    }

    debug!(
        target: "mounting::mount",
        prefix = %prefix,
        name = %name,
        trailing_slash = prefix.is_slash_terminated(),
        "mount"
    );
    Arc::new(Mount { prefix, name, target: target.isolated() })
}

/// A mount point. Immutable once built; shared by every request.
struct Mount {
    prefix: Prefix,
    name: String,
    target: BoxedMiddleware,
}

impl Middleware for Mount {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        let Some(suffix) = self.prefix.strip(&ctx.path).map(str::to_owned) else {
            trace!(target: "mounting::mount", prefix = %self.prefix, name = %self.name, path = %ctx.path, "skip");
            return next.run(ctx);
        };

        Box::pin(async move {
            let mut scope = MountScope::enter(ctx, &self.prefix, suffix);
            let next = Next::restoring(scope.previous_path.clone(), scope.previous_mount.clone(), next);
            let result = self.target.call(&mut scope, next).await;
            drop(scope);
            result
        })
    }
}

// ── Mount scope ───────────────────────────────────────────────────────────────

/// Exclusive access to a context whose path has been rewritten for a mount
/// point. Dropping the scope puts the previous path and mount path back if
/// nothing else has.
struct MountScope<'c> {
    ctx: &'c mut Context,
    previous_path: String,
    previous_mount: Option<String>,
}

impl<'c> MountScope<'c> {
    fn enter(ctx: &'c mut Context, prefix: &Prefix, suffix: String) -> Self {
        trace!(target: "mounting::mount", prefix = %prefix, from = %ctx.path, to = %suffix, "enter");
        let previous_path = std::mem::replace(&mut ctx.path, suffix);
        let previous_mount = ctx.mount_path.replace(prefix.as_str().to_owned());
        Self { ctx, previous_path, previous_mount }
    }
}

impl Deref for MountScope<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for MountScope<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for MountScope<'_> {
    fn drop(&mut self) {
        if self.ctx.path != self.previous_path {
            trace!(target: "mounting::mount", from = %self.ctx.path, to = %self.previous_path, "leave");
            self.ctx.path = std::mem::take(&mut self.previous_path);
        }
        if self.ctx.mount_path != self.previous_mount {
            self.ctx.mount_path = self.previous_mount.take();
        }
    }
}
