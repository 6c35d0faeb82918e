//! Per-request mutable state shared by every middleware in a chain.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};

use crate::error::Error;
use crate::response::{ContentType, Response};

/// The request being served and the response being built for it.
///
/// One `Context` lives for exactly one request. Middleware receive it as
/// `&mut Context`, read what they need, and leave their mark on the response
/// side. Nothing is sent until the whole chain has finished.
///
/// While a request is inside a [`mount`](crate::mount) point, [`path`](Self::path)
/// is the path *relative to the mount prefix* and [`mount_path`](Self::mount_path)
/// is the prefix itself. Both revert once the request leaves the mount point.
pub struct Context {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) mount_path: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,

    pub(crate) status: Option<StatusCode>,
    pub(crate) response_headers: HeaderMap,
    pub(crate) response_body: Option<Bytes>,
}

impl Context {
    /// Builds a context for `target` (`/path` or `/path?query`) with no headers
    /// and an empty body. Handy for driving a stack without a socket.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };
        Self::from_parts(method, path.to_owned(), query, HeaderMap::new(), Bytes::new())
    }

    pub(crate) fn from_parts(
        method: Method,
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path,
            query,
            mount_path: None,
            headers,
            body,
            status: None,
            response_headers: HeaderMap::new(),
            response_body: None,
        }
    }

    // ── Request side ─────────────────────────────────────────────────────────

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Replaces the request path seen by everything downstream.
    ///
    /// The rewrite lasts until the request leaves the innermost mount point
    /// it was made behind. That includes rewrites made further down the
    /// caller's chain, after the mounted target ran `next`: they are undone
    /// once the mount point finishes.
    ///
    /// ```rust
    /// use mounting::{Context, Method};
    ///
    /// let mut ctx = Context::new(Method::GET, "/v1/users?limit=5");
    /// ctx.set_path("/users");
    /// assert_eq!(ctx.path(), "/users");
    /// assert_eq!(ctx.query(), Some("limit=5"));
    /// ```
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// The prefix of the innermost mount point the request is currently in.
    pub fn mount_path(&self) -> Option<&str> {
        self.mount_path.as_deref()
    }

    /// Request header lookup. Header names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Mutable request headers, for middleware that rewrite the request.
    ///
    /// ```rust
    /// use mounting::{Context, Method};
    ///
    /// let mut ctx = Context::new(Method::GET, "/");
    /// ctx.headers_mut().insert("x-forwarded-for", "10.0.0.1".parse().unwrap());
    /// assert_eq!(ctx.header("X-Forwarded-For"), Some("10.0.0.1"));
    /// ```
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    // ── Response side ────────────────────────────────────────────────────────

    /// The status the response will be sent with.
    ///
    /// `404 Not Found` until something sets a status or a body. Setting a body
    /// without an explicit status implies `200 OK`.
    pub fn status(&self) -> StatusCode {
        match (self.status, &self.response_body) {
            (Some(status), _) => status,
            (None, Some(_)) => StatusCode::OK,
            (None, None) => StatusCode::NOT_FOUND,
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn response_body(&self) -> Option<&Bytes> {
        self.response_body.as_ref()
    }

    /// Sets a `text/plain; charset=utf-8` body.
    pub fn set_text(&mut self, body: impl Into<String>) {
        self.set_bytes(ContentType::Text, body.into().into_bytes());
    }

    /// Sets an `application/json` body. Bring your own serialiser.
    pub fn set_json(&mut self, body: Vec<u8>) {
        self.set_bytes(ContentType::Json, body);
    }

    pub fn set_bytes(&mut self, content_type: ContentType, body: impl Into<Bytes>) {
        self.response_headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        self.response_body = Some(body.into());
    }

    /// Sets a response header, replacing any previous value.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let name = HeaderName::try_from(name)
            .map_err(|e| Error::InvalidArgument(format!("header name `{name}`: {e}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| Error::InvalidArgument(format!("header value for `{name}`: {e}")))?;
        self.response_headers.insert(name, value);
        Ok(())
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Finalises the response. Consumes the context.
    pub fn into_response(self) -> Response {
        let status = self.status();
        Response::new(status, self.response_headers, self.response_body.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_and_query() {
        let ctx = Context::new(Method::GET, "/search?q=rust&page=2");
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query(), Some("q=rust&page=2"));
        assert_eq!(ctx.mount_path(), None);
    }

    #[test]
    fn set_path_keeps_query_and_mount_path() {
        let mut ctx = Context::new(Method::GET, "/old?x=1");
        ctx.mount_path = Some("/api".to_owned());

        ctx.set_path("/new");

        assert_eq!(ctx.path(), "/new");
        assert_eq!(ctx.query(), Some("x=1"));
        assert_eq!(ctx.mount_path(), Some("/api"));
    }

    #[test]
    fn request_headers_are_writable() {
        let mut ctx = Context::new(Method::GET, "/");
        assert_eq!(ctx.header("x-user"), None);

        ctx.headers_mut().insert("x-user", HeaderValue::from_static("tobi"));

        assert_eq!(ctx.header("X-User"), Some("tobi"));
        assert!(ctx.response_headers().is_empty());
    }

    #[test]
    fn status_defaults_follow_the_body() {
        let mut ctx = Context::new(Method::GET, "/");
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);

        ctx.set_text("Hello");
        assert_eq!(ctx.status(), StatusCode::OK);

        ctx.set_status(StatusCode::CREATED);
        assert_eq!(ctx.status(), StatusCode::CREATED);
    }

    #[test]
    fn explicit_status_without_body() {
        let mut ctx = Context::new(Method::DELETE, "/users/42");
        ctx.set_status(StatusCode::NO_CONTENT);

        let res = ctx.into_response();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
    }

    #[test]
    fn body_sets_content_type() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_json(br#"{"id":1}"#.to_vec());
        assert_eq!(
            ctx.response_headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn rejects_invalid_header_names() {
        let mut ctx = Context::new(Method::GET, "/");
        assert!(matches!(
            ctx.set_header("bad header", "x"),
            Err(Error::InvalidArgument(_))
        ));
        ctx.set_header("x-request-id", "abc").unwrap();
        assert_eq!(ctx.response_headers().get("x-request-id").unwrap(), "abc");
    }
}
