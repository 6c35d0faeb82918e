//! The middleware contract and type erasure.
//!
//! # How a chain runs
//!
//! A middleware receives the request [`Context`] and a [`Next`]: the rest of
//! the chain, packaged as a one-shot continuation. It may do work, run
//! `next`, then do more work once everything downstream has finished:
//!
//! ```text
//! logger ──▶ auth ──▶ mount("/api", api) ──▶ (end)
//!   ◀────────  ◀────────  ◀───────────────────
//! ```
//!
//! Not running `next` ends the chain at that point. Errors travel back up
//! through every `?` on the way out.
//!
//! # How middleware are stored
//!
//! Stacks hold middleware of different concrete types, so each one is
//! erased to `Arc<dyn Middleware>` ([`BoxedMiddleware`]). `call` returns a
//! boxed future ([`BoxFuture`]) borrowing the context, which keeps the trait
//! object-safe. The per-request cost is one virtual call and one allocation
//! per layer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::trace;

use crate::app::Stack;
use crate::context::Context;
use crate::error::Error;

/// A heap-allocated, type-erased future borrowing the request context.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

/// A middleware shared across concurrent requests.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// One step in a chain.
///
/// Implement it on your own types, or wrap a closure with [`from_fn`].
///
/// ```rust
/// use mounting::{BoxFuture, Context, Middleware, Next};
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
///         Box::pin(async move {
///             next.run(ctx).await?;
///             ctx.set_header("x-powered-by", "mounting")
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a>;

    /// The composed app behind this middleware, if it is one. Lets
    /// [`mount`](crate::mount) treat a [`Stack`] like the app it came from.
    #[doc(hidden)]
    fn as_stack(&self) -> Option<&Stack> {
        None
    }
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        (**self).call(ctx, next)
    }

    fn as_stack(&self) -> Option<&Stack> {
        (**self).as_stack()
    }
}

// ── Closures ──────────────────────────────────────────────────────────────────

/// Turns a closure into a [`Middleware`].
///
/// The closure must return a boxed future; `Box::pin(async move { … })` is
/// the whole recipe:
///
/// ```rust
/// use mounting::from_fn;
///
/// let hello = from_fn(|ctx, next| Box::pin(async move {
///     next.run(ctx).await?;
///     ctx.set_text("Hello");
///     Ok(())
/// }));
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a> + Send + Sync + 'static,
{
    FromFn(f)
}

/// A closure middleware. Built by [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        (self.0)(ctx, next)
    }
}

// ── Continuation ──────────────────────────────────────────────────────────────

/// The remainder of a chain.
///
/// A `Next` is the layers still to run in the current stack, followed by
/// whatever the stack itself continues into once it is exhausted.
pub struct Next<'a> {
    rest: &'a [BoxedMiddleware],
    then: Then<'a>,
}

/// What happens after the last layer of a stack.
enum Then<'a> {
    /// Nothing: the stack was run on its own.
    End,
    /// Keep going in the enclosing chain.
    Chain(Box<Next<'a>>),
    /// Leave a mount point, then keep going in the enclosing chain.
    Restore {
        path: String,
        mount_path: Option<String>,
        next: Box<Next<'a>>,
    },
}

impl<'a> Next<'a> {
    /// Runs `stack` and then stops.
    pub(crate) fn end(stack: &'a [BoxedMiddleware]) -> Self {
        Self { rest: stack, then: Then::End }
    }

    /// Runs `stack` and then continues with `next`.
    pub(crate) fn chain(stack: &'a [BoxedMiddleware], next: Next<'a>) -> Self {
        Self { rest: stack, then: Then::Chain(Box::new(next)) }
    }

    /// Puts `path` and `mount_path` back into the context, then continues
    /// with `next`.
    pub(crate) fn restoring(path: String, mount_path: Option<String>, next: Next<'a>) -> Self {
        Self {
            rest: &[],
            then: Then::Restore { path, mount_path, next: Box::new(next) },
        }
    }

    /// Runs the rest of the chain against `ctx`.
    pub fn run<'c>(self, ctx: &'c mut Context) -> BoxFuture<'c>
    where
        'a: 'c,
    {
        let Next { rest, then } = self;
        if let Some((first, rest)) = rest.split_first() {
            return first.call(ctx, Next { rest, then });
        }

        match then {
            Then::End => Box::pin(std::future::ready(Ok(()))),
            Then::Chain(next) => next.run(ctx),
            Then::Restore { path, mount_path, next } => {
                trace!(target: "mounting::mount", from = %ctx.path, to = %path, "leave");
                ctx.path = path;
                ctx.mount_path = mount_path;
                next.run(ctx)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Method;

    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> BoxedMiddleware {
        let log = Arc::clone(log);
        Arc::new(from_fn(move |ctx, next| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push(name);
                next.run(ctx).await?;
                log.lock().unwrap().push(name);
                Ok(())
            })
        }))
    }

    #[tokio::test]
    async fn runs_layers_in_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = vec![recorder(&log, "a"), recorder(&log, "b"), recorder(&log, "c")];

        let mut ctx = Context::new(Method::GET, "/");
        Next::end(&stack).run(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), ["a", "b", "c", "c", "b", "a"]);
    }

    #[tokio::test]
    async fn not_running_next_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stop: BoxedMiddleware = Arc::new(from_fn(|ctx, _next| {
            Box::pin(async move {
                ctx.set_text("stopped");
                Ok(())
            })
        }));
        let stack = vec![stop, recorder(&log, "unreachable")];

        let mut ctx = Context::new(Method::GET, "/");
        Next::end(&stack).run(&mut ctx).await.unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(&ctx.response_body().unwrap()[..], b"stopped");
    }

    #[tokio::test]
    async fn chain_continues_into_the_enclosing_stack() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer = vec![recorder(&log, "outer")];
        let inner = vec![recorder(&log, "inner")];

        let mut ctx = Context::new(Method::GET, "/");
        Next::chain(&inner, Next::end(&outer)).run(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), ["inner", "outer", "outer", "inner"]);
    }

    #[tokio::test]
    async fn restoring_resets_path_before_continuing() {
        let seen = Arc::new(Mutex::new(None));
        let observer: BoxedMiddleware = {
            let seen = Arc::clone(&seen);
            Arc::new(from_fn(move |ctx, next| {
                *seen.lock().unwrap() = Some(ctx.path().to_owned());
                next.run(ctx)
            }))
        };
        let outer = vec![observer];

        let mut ctx = Context::new(Method::GET, "/");
        ctx.path = "/rewritten".to_owned();
        ctx.mount_path = Some("/api".to_owned());

        Next::restoring("/api/rewritten".to_owned(), None, Next::end(&outer))
            .run(&mut ctx)
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some("/api/rewritten"));
        assert_eq!(ctx.mount_path(), None);
    }

    #[tokio::test]
    async fn errors_propagate_through_every_layer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let fail: BoxedMiddleware =
            Arc::new(from_fn(|_ctx, _next| Box::pin(async { Err::<(), _>(Error::msg("boom")) })));
        let stack = vec![recorder(&log, "a"), fail];

        let mut ctx = Context::new(Method::GET, "/");
        let err = Next::end(&stack).run(&mut ctx).await.unwrap_err();

        assert_eq!(err.to_string(), "boom");
        // "a" entered but never reached its post-next half.
        assert_eq!(*log.lock().unwrap(), ["a"]);
    }
}
