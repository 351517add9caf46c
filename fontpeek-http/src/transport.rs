//! The request/response contract shared by every HTTP layer.
//!
//! Requests and responses use the `http` crate types re-exported by ureq so
//! the network transport, the disk cache and test fakes are interchangeable.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::time::Instant;

use thiserror::Error;
use ureq::Agent;
use ureq::http::{self, Method};

use crate::cache::CacheError;
use crate::cancel::{CancelToken, Canceled};
use crate::http::{MAX_BODY_SIZE, USER_AGENT, agent, redact_url, validate_url};
use crate::logger::Logger;

/// Outgoing request. Only the method, URI and headers are used.
pub type Request = http::Request<()>;

/// Incoming response with a streaming body.
pub type Response = http::Response<Body>;

/// Chunk size used when draining a body so cancellation is observed promptly.
const READ_CHUNK: usize = 16 * 1024;

/// Errors raised while executing a request or reading its body.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The run was cancelled before or during the exchange.
    #[error("request canceled")]
    Canceled,

    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only GET is supported by the transports in this crate.
    #[error("unsupported method {0}")]
    UnsupportedMethod(Method),

    /// Connection, TLS, timeout or protocol failure from ureq.
    #[error("{0}")]
    Network(ureq::Error),

    /// The response body exceeded the configured size limit.
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },

    /// Reading the response body failed.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// A wrapping transport got a response but could not read its body
    /// through. The boxed error is the read failure.
    #[error("{0}")]
    BodyRead(Box<TransportError>),

    /// The disk cache could not be used.
    #[error("cache error: {0}")]
    Cache(CacheError),
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        TransportError::Network(e)
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl From<CacheError> for TransportError {
    fn from(e: CacheError) -> Self {
        TransportError::Cache(e)
    }
}

impl From<Canceled> for TransportError {
    fn from(_: Canceled) -> Self {
        TransportError::Canceled
    }
}

/// Anything that turns a [`Request`] into a [`Response`].
///
/// Implementations are used sequentially and need not be thread safe.
pub trait Transport {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        (**self).execute(request, cancel)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        (**self).execute(request, cancel)
    }
}

/// Build a GET request with the default `User-Agent`.
pub fn get(url: &str) -> Result<Request, TransportError> {
    http::Request::get(url)
        .header(http::header::USER_AGENT, USER_AGENT)
        .body(())
        .map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// A response body. Dropping it releases the underlying connection.
pub struct Body {
    reader: Box<dyn Read>,
}

impl Body {
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            reader: Box::new(Cursor::new(bytes.into())),
        }
    }

    pub fn from_reader(reader: impl Read + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// Read the whole body into memory.
    ///
    /// Cancellation is checked between chunks. More than `limit` bytes yields
    /// [`TransportError::BodyTooLarge`].
    pub fn read_to_vec(mut self, limit: u64, cancel: &CancelToken) -> Result<Vec<u8>, TransportError> {
        let mut out = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            cancel.check()?;
            let n = match self.reader.read(&mut chunk) {
                Ok(0) => return Ok(out),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if (out.len() + n) as u64 > limit {
                return Err(TransportError::BodyTooLarge { limit });
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

/// Network transport backed by a ureq [`Agent`].
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self { agent: agent() }
    }

    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        cancel.check()?;
        if request.method() != Method::GET {
            return Err(TransportError::UnsupportedMethod(request.method().clone()));
        }
        let url = request.uri().to_string();
        validate_url(&url)?;

        let mut call = self.agent.get(&url);
        for (name, value) in request.headers() {
            call = call.header(name.as_str(), value.as_bytes());
        }
        let response = call.call()?;

        // The request may have blocked for a while; don't hand back a body
        // nobody wants.
        cancel.check()?;

        let (parts, body) = response.into_parts();
        let reader = body.into_reader().take(MAX_BODY_SIZE + 1);
        Ok(Response::from_parts(parts, Body::from_reader(reader)))
    }
}

/// Logs each exchange through a [`Logger`] before delegating. Credential
/// query values are redacted from the logged URL.
pub struct LoggingTransport<T> {
    inner: T,
    logger: Logger,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T, logger: Logger) -> Self {
        Self { inner, logger }
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        let url = redact_url(&request.uri().to_string());
        self.logger
            .log(format_args!("{} {}", request.method(), url));
        let started = Instant::now();
        let result = self.inner.execute(request, cancel);
        match &result {
            Ok(response) => self.logger.log(format_args!(
                "{} {} ({:?})",
                response.status().as_u16(),
                url,
                started.elapsed()
            )),
            Err(e) => self.logger.log(format_args!("failed {url}: {e}")),
        }
        result
    }
}
