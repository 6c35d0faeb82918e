//! Applications: named, ordered middleware stacks.
//!
//! An [`App`] is built once at startup, layer by layer. [`App::compose`]
//! freezes it into a [`Stack`], the cheap-to-clone form that the server and
//! mount points actually run.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tracing::error;

use crate::context::Context;
use crate::error::Error;
use crate::middleware::{BoxFuture, BoxedMiddleware, Middleware, Next, from_fn};
use crate::response::Response;

/// Called with every error that escapes an app's stack.
pub type ErrorHook = Arc<dyn Fn(&Error, &Context) + Send + Sync>;

/// An application: an ordered list of middleware plus an optional name.
///
/// Each builder call returns `self` so registrations chain naturally:
///
/// ```rust
/// use mounting::{App, mount};
///
/// let blog = App::named("blog").with_fn(|ctx, next| Box::pin(async move {
///     next.run(ctx).await?;
///     ctx.set_text("blog");
///     Ok(())
/// }));
///
/// let app = App::new().with_boxed(mount("/blog", blog).unwrap());
/// assert_eq!(app.len(), 1);
/// ```
pub struct App {
    name: Option<String>,
    middleware: Vec<BoxedMiddleware>,
    on_error: Option<ErrorHook>,
}

impl App {
    pub fn new() -> Self {
        Self { name: None, middleware: Vec::new(), on_error: None }
    }

    /// An app with a name. The name only shows up in diagnostics.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::new() }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Appends a middleware. Returns `self` for chaining.
    pub fn with(self, middleware: impl Middleware) -> Self {
        self.with_boxed(Arc::new(middleware))
    }

    /// Appends a middleware that is already shared, such as the result of
    /// [`mount`](crate::mount), without wrapping it again.
    pub fn with_boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends a closure middleware; see [`from_fn`].
    pub fn with_fn<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a> + Send + Sync + 'static,
    {
        self.with(from_fn(f))
    }

    /// Replaces the default error reporter.
    ///
    /// Only the hook of the app handed to the server fires. Errors raised
    /// inside mounted apps bubble up to it like any other; mounting an app
    /// that has a hook drops the hook and logs it at `debug`.
    pub fn on_error(mut self, hook: impl Fn(&Error, &Context) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Freezes the app into a runnable [`Stack`].
    pub fn compose(self) -> Stack {
        Stack {
            name: self.name.map(Arc::from),
            middleware: self.middleware.into(),
            on_error: self.on_error,
        }
    }
}

impl Default for App {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

// ── Stack ─────────────────────────────────────────────────────────────────────

/// A composed app. Cloning is one atomic increment per field.
///
/// A stack can be driven two ways:
///
/// - [`Stack::run`] runs it on its own; the last layer's `next` is a no-op.
/// - As a [`Middleware`], its last layer's `next` continues into the
///   enclosing chain, so the stack behaves like its layers spliced in place.
#[derive(Clone)]
pub struct Stack {
    name: Option<Arc<str>>,
    middleware: Arc<[BoxedMiddleware]>,
    on_error: Option<ErrorHook>,
}

impl Stack {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn has_error_hook(&self) -> bool {
        self.on_error.is_some()
    }

    /// Runs every layer against `ctx` and resolves once the chain has unwound.
    pub fn run<'c>(&'c self, ctx: &'c mut Context) -> BoxFuture<'c> {
        Next::end(&self.middleware).run(ctx)
    }

    /// Runs the stack and finalises the response.
    ///
    /// This is where errors stop bubbling: a failure is handed to the error
    /// hook and answered with `500 Internal Server Error`.
    pub async fn respond(&self, mut ctx: Context) -> Response {
        match self.run(&mut ctx).await {
            Ok(()) => ctx.into_response(),
            Err(e) => {
                self.report(&e, &ctx);
                Response::status_only(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn report(&self, err: &Error, ctx: &Context) {
        match &self.on_error {
            Some(hook) => hook(err, ctx),
            None => error!(
                method = %ctx.method(),
                path = %ctx.path(),
                app = self.name().unwrap_or("unnamed"),
                "unhandled error: {err}"
            ),
        }
    }
}

impl Middleware for Stack {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
        Next::chain(&self.middleware, next).run(ctx)
    }

    fn as_stack(&self) -> Option<&Stack> {
        Some(self)
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("name", &self.name)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
