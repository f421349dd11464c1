//! The application calling convention.
//!
//! An [`Application`] takes an [`Environ`] and returns status, headers and
//! a [`Body`]. The body is a single-pass sequence of byte chunks with an
//! optional release hook that runs exactly once when the body is dropped,
//! whether it was drained fully, partially, or not at all.

use std::fmt;

use crate::environ::Environ;
use crate::error::{AdapterError, Result};
use crate::headers::HeaderCollection;

type Chunks = Box<dyn Iterator<Item = anyhow::Result<Vec<u8>>> + Send>;
type Release = Box<dyn FnOnce() + Send>;

/// A lazily produced response body.
pub struct Body {
    chunks: Chunks,
    release: Option<Release>,
}

impl Body {
    pub fn empty() -> Self {
        Self::from_chunks(std::iter::empty::<Vec<u8>>())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_chunks(std::iter::once(bytes.into()))
    }

    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Vec<u8>>,
        I::IntoIter: Send + 'static,
    {
        Self::from_fallible(
            chunks
                .into_iter()
                .map(|chunk| -> anyhow::Result<Vec<u8>> { Ok(chunk.into()) }),
        )
    }

    /// A body whose chunks may fail while being produced.
    pub fn from_fallible<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = anyhow::Result<Vec<u8>>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            chunks: Box::new(chunks.into_iter()),
            release: None,
        }
    }

    /// Attach a release hook, run once when the body is dropped.
    pub fn on_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    /// Concatenate every chunk in order. The release hook runs on return,
    /// on success and on failure alike.
    pub fn drain(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for chunk in self.chunks.by_ref() {
            buf.extend_from_slice(&chunk.map_err(AdapterError::Body)?);
        }
        Ok(buf)
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("releasable", &self.release.is_some())
            .finish_non_exhaustive()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(text)
    }
}

/// What an application returns.
#[derive(Debug)]
pub struct AppResponse {
    pub status: u16,
    pub headers: HeaderCollection,
    pub body: Body,
}

impl AppResponse {
    pub fn new(status: u16, headers: HeaderCollection, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// A synchronous application.
///
/// One long-lived instance serves every invocation in a container, one
/// invocation at a time.
pub trait Application: Send + Sync {
    fn call(&self, env: Environ) -> anyhow::Result<AppResponse>;
}

impl<F> Application for F
where
    F: Fn(Environ) -> anyhow::Result<AppResponse> + Send + Sync,
{
    fn call(&self, env: Environ) -> anyhow::Result<AppResponse> {
        self(env)
    }
}

/// Call the application exactly once.
pub fn invoke(app: &dyn Application, env: Environ) -> Result<AppResponse> {
    app.call(env).map_err(AdapterError::Application)
}
