//! Mount prefixes and the matching rule.
//!
//! Matching is literal: no parameters, no wildcards, no percent-decoding.
//! A prefix is either *exact* (`/blog`) or *slash-terminated* (`/blog/`),
//! and the shape decides what counts as a match:
//!
//! | prefix | path | suffix |
//! |---|---|---|
//! | `/blog` | `/blog` | `/` |
//! | `/blog` | `/blog/` | `/` |
//! | `/blog` | `/blog/2024` | `/2024` |
//! | `/blog` | `/blogroll` | no match |
//! | `/blog/` | `/blog` | no match |
//! | `/blog/` | `/blog/` | `/` |
//! | `/blog/` | `/blog/2024` | `/2024` |

use std::fmt;

use crate::error::Error;

/// A validated mount prefix. Always begins with `/`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Prefix {
    raw: String,
    trailing_slash: bool,
}

impl Prefix {
    /// Validates `raw` as a mount prefix.
    ///
    /// Fails with [`Error::InvalidArgument`] unless `raw` begins with `/`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if !raw.starts_with('/') {
            return Err(Error::InvalidArgument(format!(
                "mount path must begin with \"/\", got {raw:?}"
            )));
        }
        Ok(Self { raw: raw.to_owned(), trailing_slash: raw.ends_with('/') })
    }

    /// The root prefix, which matches every path without rewriting it.
    pub fn root() -> Self {
        Self { raw: "/".to_owned(), trailing_slash: true }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_root(&self) -> bool {
        self.raw == "/"
    }

    pub fn is_slash_terminated(&self) -> bool {
        self.trailing_slash
    }

    /// Returns the path the mounted target should see, or `None` when `path`
    /// does not fall under this prefix.
    ///
    /// The suffix always begins with `/`. For a slash-terminated prefix the
    /// trailing slash is handed over to the suffix, so `/blog/` against
    /// `/blog/2024` yields `/2024`.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.trailing_slash {
            // `raw` ends in '/', so whatever follows the shortened prefix
            // starts with '/' as well.
            let head = &self.raw[..self.raw.len() - 1];
            return path.starts_with(&self.raw).then(|| &path[head.len()..]);
        }

        let rest = path.strip_prefix(self.raw.as_str())?;
        if rest.is_empty() {
            return Some("/");
        }
        rest.starts_with('/').then_some(rest)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
