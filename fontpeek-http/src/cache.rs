//! On-disk TTL cache for HTTP responses.
//!
//! [`DiskCache`] wraps another [`Transport`]. GET responses with a success
//! status are written to `<dir>/<sha256(method url)>.entry` (a non-default
//! `User-Agent` is folded into the key) and served from
//! there until they are older than the configured TTL. Only whitelisted
//! headers are persisted. Non-success responses are passed through and never
//! stored, so a transient 404 or 500 does not stick for the TTL.
//!
//! Entry layout (optionally gzip-compressed as a whole):
//!
//! ```text
//! {"url":"…","status":200,"headers":[["Content-Type","font/ttf"]],"stored_at":"…"}\n
//! <raw body bytes>
//! ```

use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::Builder;
use thiserror::Error;
use ureq::http::{self, HeaderName, HeaderValue, Method, StatusCode};

use crate::cancel::CancelToken;
use crate::http::{MAX_BODY_SIZE, USER_AGENT, redact_url};
use crate::logger::Logger;
use crate::transport::{Body, Request, Response, Transport, TransportError};

/// Default time-to-live for cached entries (14 days).
pub const DEFAULT_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Headers kept when a response is persisted.
pub const DEFAULT_HEADER_WHITELIST: &[&str] = &["Date", "Set-Cookie", "Content-Type", "Location"];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ENTRY_EXTENSION: &str = "entry";
/// Extension of in-progress writes; leftovers from a crash are removed by
/// [`DiskCache::clear`].
const PARTIAL_EXTENSION: &str = "partial";

/// Errors raised by the disk cache itself.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No platform cache directory could be determined.
    #[error("could not determine a cache directory for this platform")]
    NoCacheDir,

    /// Reading or writing a cache file failed.
    #[error("cache I/O error at '{path}': {error}")]
    Io { path: PathBuf, error: io::Error },

    /// A stored entry could not be decoded.
    #[error("corrupt cache entry '{path}': {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Construction options for [`DiskCache`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    dir: PathBuf,
    ttl: Duration,
    header_whitelist: Vec<String>,
    compress: bool,
    logger: Logger,
}

impl CacheOptions {
    /// Options storing entries directly in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: DEFAULT_TTL,
            header_whitelist: DEFAULT_HEADER_WHITELIST
                .iter()
                .map(|h| h.to_string())
                .collect(),
            compress: true,
            logger: Logger::noop(),
        }
    }

    /// Options storing entries under the platform cache dir, e.g.
    /// `~/.cache/<app>/<name>` on Linux.
    pub fn app_cache_dir(app: &str, name: &str) -> Result<Self, CacheError> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(Self::new(base.join(app).join(name)))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_header_whitelist<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_whitelist = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_gzip_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Metadata line stored in front of each cached body.
#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    /// RFC 3339 timestamp of when the entry was written.
    stored_at: String,
}

struct Entry {
    header: EntryHeader,
    body: Vec<u8>,
}

/// Caching transport wrapping `T`.
pub struct DiskCache<T> {
    inner: T,
    options: CacheOptions,
}

impl<T: Transport> DiskCache<T> {
    /// Create the cache, making sure the directory exists.
    pub fn new(inner: T, options: CacheOptions) -> Result<Self, CacheError> {
        fs::create_dir_all(&options.dir).map_err(|error| CacheError::Io {
            path: options.dir.clone(),
            error,
        })?;
        Ok(Self { inner, options })
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Path of the entry that would hold `method url` fetched with the
    /// default `User-Agent`.
    pub fn entry_path(&self, method: &Method, url: &str) -> PathBuf {
        self.keyed_path(method, url, None)
    }

    /// Servers pick the font format from the `User-Agent`, so a non-default
    /// agent gets its own entry.
    fn request_path(&self, request: &Request) -> PathBuf {
        let agent = request
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .filter(|agent| *agent != USER_AGENT);
        self.keyed_path(request.method(), &request.uri().to_string(), agent)
    }

    fn keyed_path(&self, method: &Method, url: &str, agent: Option<&str>) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(method.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(url.as_bytes());
        if let Some(agent) = agent {
            hasher.update(b"\n");
            hasher.update(agent.as_bytes());
        }
        self.options
            .dir
            .join(format!("{:x}", hasher.finalize()))
            .with_extension(ENTRY_EXTENSION)
    }

    /// Remove every stored entry and any abandoned partial write. Returns how
    /// many entries were deleted.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let io_err = |error| CacheError::Io {
            path: self.options.dir.clone(),
            error,
        };
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.options.dir).map_err(io_err)? {
            let path = dir_entry.map_err(io_err)?.path();
            let Some(ext) = path.extension() else {
                continue;
            };
            if ext != ENTRY_EXTENSION && ext != PARTIAL_EXTENSION {
                continue;
            }
            fs::remove_file(&path).map_err(|error| CacheError::Io {
                path: path.clone(),
                error,
            })?;
            if ext == ENTRY_EXTENSION {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn is_fresh(&self, header: &EntryHeader) -> bool {
        let Ok(stored_at) = DateTime::parse_from_rfc3339(&header.stored_at) else {
            return false;
        };
        let age = Utc::now().signed_duration_since(stored_at.with_timezone(&Utc));
        match age.to_std() {
            Ok(age) => age < self.options.ttl,
            // Timestamp in the future: clock skew, treat as fresh.
            Err(_) => true,
        }
    }

    fn load(&self, path: &Path) -> Result<Option<Entry>, CacheError> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    error,
                });
            }
        };
        let corrupt = |reason: String| CacheError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let reader: Box<dyn Read + '_> = if raw.starts_with(&GZIP_MAGIC) {
            Box::new(GzDecoder::new(raw.as_slice()))
        } else {
            Box::new(raw.as_slice())
        };
        let mut reader = BufReader::new(reader);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| corrupt(e.to_string()))?;
        let header: EntryHeader =
            serde_json::from_str(line.trim_end()).map_err(|e| corrupt(e.to_string()))?;
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(Some(Entry { header, body }))
    }

    fn store(&self, path: &Path, url: &str, parts: &http::response::Parts, body: &[u8]) -> Result<(), CacheError> {
        let headers = parts
            .headers
            .iter()
            .filter(|(name, _)| {
                self.options
                    .header_whitelist
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(name.as_str()))
            })
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let header = EntryHeader {
            url: url.to_string(),
            status: parts.status.as_u16(),
            headers,
            stored_at: Utc::now().to_rfc3339(),
        };

        let mut payload = serde_json::to_vec(&header).map_err(|e| CacheError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        payload.push(b'\n');
        payload.extend_from_slice(body);

        let io_err = |error| CacheError::Io {
            path: path.to_path_buf(),
            error,
        };
        let data = if self.options.compress {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&payload).map_err(io_err)?;
            encoder.finish().map_err(io_err)?
        } else {
            payload
        };

        // Write to a uniquely named temp file in the same directory, then
        // rename it over the entry. Concurrent writers never share a temp
        // file, and the temp file is deleted when the rename fails.
        let mut temp = Builder::new()
            .suffix(&format!(".{PARTIAL_EXTENSION}"))
            .tempfile_in(&self.options.dir)
            .map_err(io_err)?;
        temp.write_all(&data).map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl Entry {
    fn into_response(self) -> Result<Response, String> {
        let status = StatusCode::from_u16(self.header.status).map_err(|e| e.to_string())?;
        let mut builder = http::Response::builder().status(status);
        for (name, value) in &self.header.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| e.to_string())?;
            let value = HeaderValue::from_str(value).map_err(|e| e.to_string())?;
            builder = builder.header(name, value);
        }
        builder
            .body(Body::from_bytes(self.body))
            .map_err(|e| e.to_string())
    }
}

impl<T: Transport> Transport for DiskCache<T> {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        cancel.check()?;
        if request.method() != Method::GET {
            return self.inner.execute(request, cancel);
        }

        // Credentials stay out of logs and entry metadata; the key hash
        // still covers the full URL.
        let url = redact_url(&request.uri().to_string());
        let path = self.request_path(request);
        let logger = &self.options.logger;

        match self.load(&path) {
            Ok(Some(entry)) if self.is_fresh(&entry.header) => match entry.into_response() {
                Ok(response) => {
                    logger.log(format_args!("cache hit: {url}"));
                    return Ok(response);
                }
                Err(reason) => logger.log(format_args!("discarding cache entry for {url}: {reason}")),
            },
            Ok(Some(_)) => logger.log(format_args!("cache stale: {url}")),
            Ok(None) => logger.log(format_args!("cache miss: {url}")),
            Err(e) => logger.log(format_args!("discarding cache entry: {e}")),
        }

        let response = self.inner.execute(request, cancel)?;
        let (parts, body) = response.into_parts();
        let bytes = body
            .read_to_vec(MAX_BODY_SIZE, cancel)
            .map_err(|e| match e {
                TransportError::Canceled => TransportError::Canceled,
                other => TransportError::BodyRead(Box::new(other)),
            })?;

        if parts.status.is_success() {
            if let Err(e) = self.store(&path, &url, &parts, &bytes) {
                logger.log(format_args!("failed to store cache entry: {e}"));
            }
        }

        Ok(Response::from_parts(parts, Body::from_bytes(bytes)))
    }
}
