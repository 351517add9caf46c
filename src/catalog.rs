//! Remote font family catalog.
//!
//! [`WebfontsCatalog`] talks to the Google Fonts Developer API through any
//! [`Transport`], normally the shared disk cache, so repeated runs reuse the
//! same listing until it expires.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use fontpeek_http::http::MAX_BODY_SIZE;
use fontpeek_http::{CancelToken, Logger, Transport, TransportError, get};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Google Fonts Developer API listing endpoint.
pub const WEBFONTS_API: &str = "https://www.googleapis.com/webfonts/v1/webfonts";

/// Errors raised while retrieving the family listing.
///
/// Messages carry the underlying error text, so variants expose no
/// `source()` and a cause chain never repeats it.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog endpoint: {0}")]
    Endpoint(url::ParseError),

    #[error("request failed: {0}")]
    Transport(TransportError),

    #[error("catalog returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid catalog response: {0}")]
    Parse(serde_json::Error),

    #[error("operation canceled")]
    Canceled,
}

impl From<url::ParseError> for CatalogError {
    fn from(e: url::ParseError) -> Self {
        CatalogError::Endpoint(e)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}

impl From<TransportError> for CatalogError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Canceled => CatalogError::Canceled,
            other => CatalogError::Transport(other),
        }
    }
}

/// Ordering requested from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Alpha,
    Date,
    Popularity,
    Style,
    Trending,
}

impl SortOrder {
    pub const ALL: [SortOrder; 5] = [
        SortOrder::Alpha,
        SortOrder::Date,
        SortOrder::Popularity,
        SortOrder::Style,
        SortOrder::Trending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Alpha => "alpha",
            SortOrder::Date => "date",
            SortOrder::Popularity => "popularity",
            SortOrder::Style => "style",
            SortOrder::Trending => "trending",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_str() == wanted)
            .ok_or_else(|| format!("invalid sort order '{s}'"))
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One family as listed by the catalog. Only `family` is interpreted; the
/// rest is carried for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilyDescriptor {
    pub family: String,
    pub category: String,
    pub variants: Vec<String>,
    pub subsets: Vec<String>,
    pub version: String,
    pub last_modified: String,
    /// Variant name to font file URL.
    pub files: BTreeMap<String, String>,
}

impl FamilyDescriptor {
    pub fn named(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            ..Default::default()
        }
    }
}

/// Source of the ordered family listing.
pub trait Catalog {
    fn families(&self, cancel: &CancelToken, api_key: &str) -> Result<Vec<FamilyDescriptor>, CatalogError>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn families(&self, cancel: &CancelToken, api_key: &str) -> Result<Vec<FamilyDescriptor>, CatalogError> {
        (**self).families(cancel, api_key)
    }
}

#[derive(Deserialize)]
struct WebfontList {
    #[serde(default)]
    items: Vec<FamilyDescriptor>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Catalog backed by the Google Fonts Developer API.
pub struct WebfontsCatalog<T> {
    transport: T,
    endpoint: String,
    sort: Option<SortOrder>,
    logger: Logger,
}

impl<T: Transport> WebfontsCatalog<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            endpoint: WEBFONTS_API.to_string(),
            sort: None,
            logger: Logger::noop(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_sort(mut self, sort: Option<SortOrder>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    fn listing_url(&self, api_key: &str) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&self.endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", api_key);
            if let Some(sort) = self.sort {
                query.append_pair("sort", sort.as_str());
            }
        }
        Ok(url)
    }
}

impl<T: Transport> Catalog for WebfontsCatalog<T> {
    fn families(&self, cancel: &CancelToken, api_key: &str) -> Result<Vec<FamilyDescriptor>, CatalogError> {
        let url = self.listing_url(api_key)?;
        let response = self.transport.execute(&get(url.as_str())?, cancel)?;
        let status = response.status();
        let body = response.into_body().read_to_vec(MAX_BODY_SIZE, cancel)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let list: WebfontList = serde_json::from_slice(&body)?;
        self.logger
            .log(format_args!("catalog: {} families", list.items.len()));
        Ok(list.items)
    }
}
