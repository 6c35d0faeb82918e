//! Unified error type.

/// The error type returned by mounting's fallible operations.
///
/// Two families live here. Configuration mistakes ([`Error::InvalidArgument`],
/// [`Error::InvalidAddress`]) surface at construction time, before a single
/// request is served. Everything else is raised while a request is in flight,
/// either by the server's I/O or by a middleware, and travels up the chain
/// untouched until the outermost [`Stack`](crate::Stack) reports it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A constructor was given an argument it cannot work with, such as a
    /// mount prefix that does not begin with `/`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `Server::bind` was given something that is not a `host:port` pair.
    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A failure raised by a middleware.
    #[error(transparent)]
    Handler(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Wraps any error raised inside a middleware.
    ///
    /// ```rust
    /// use mounting::Error;
    ///
    /// fn page(raw: &str) -> Result<u32, Error> {
    ///     raw.parse().map_err(Error::handler)
    /// }
    /// assert!(page("two").is_err());
    /// ```
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::Handler(err.into())
    }

    /// A middleware failure that carries only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Handler(message.into())
    }
}
