//! HTTP plumbing for fontpeek.
//!
//! Provides:
//! - `cancel`: cooperative cancellation shared by a whole run
//! - `logger`: the per-run logging capability handed to each component
//! - `transport`: the `Transport` request/response contract, the ureq-backed
//!   network transport and a request-logging wrapper
//! - `cache`: an on-disk TTL cache that wraps any `Transport`
//! - `http`: agent construction, URL validation, credential redaction and
//!   shared limits

pub mod cache;
pub mod cancel;
pub mod http;
pub mod logger;
pub mod transport;

pub use cache::{CacheError, CacheOptions, DiskCache};
pub use cancel::{CancelToken, Canceled};
pub use logger::Logger;
pub use transport::{
    Body, LoggingTransport, Request, Response, Transport, TransportError, UreqTransport, get,
};
