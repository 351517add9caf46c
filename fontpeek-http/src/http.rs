//! HTTP client helper with native-tls support.

use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};
use url::Url;

use crate::transport::TransportError;

/// Global timeout for a single HTTP exchange (30 seconds).
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum response body size accepted from the network (32 MB).
///
/// Large CJK families run to a few megabytes; anything beyond this is
/// treated as a misbehaving server.
pub const MAX_BODY_SIZE: u64 = 32 * 1024 * 1024;

/// Default `User-Agent` for outgoing requests.
pub const USER_AGENT: &str = concat!("fontpeek/", env!("CARGO_PKG_VERSION"));

/// Query parameters that carry credentials.
const SECRET_PARAMS: &[&str] = &["key"];

/// Placeholder written in place of a credential value.
pub const REDACTED: &str = "REDACTED";

/// `url` with credential query values replaced by [`REDACTED`], for logs and
/// cache metadata. Input that does not parse as a URL is returned as is.
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let is_secret = |name: &str| SECRET_PARAMS.contains(&name);
    if !parsed.query_pairs().any(|(name, _)| is_secret(&name)) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(name, value)| {
            let value = if is_secret(&name) {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.into()
}

/// Create a new HTTP agent configured with native-tls and a global timeout.
///
/// Non-2xx statuses are returned as ordinary responses rather than errors so
/// callers can inspect and report them.
pub fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(HTTP_TIMEOUT))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Validate that a URL can be fetched.
///
/// Enforces an `http` or `https` scheme and a non-empty host.
pub fn validate_url(url: &str) -> Result<Url, TransportError> {
    let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
        url: redact_url(url),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(TransportError::InvalidUrl {
                url: redact_url(url),
                reason: format!("unsupported scheme '{scheme}'"),
            });
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(TransportError::InvalidUrl {
            url: redact_url(url),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed)
}
