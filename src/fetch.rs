//! Cached download of one family's font face.

use fontpeek_http::http::MAX_BODY_SIZE;
use fontpeek_http::{CancelToken, Logger, Transport, TransportError, get};
use ureq::http::{StatusCode, header};

use crate::error::FamilyError;
use crate::face::FaceResolver;

/// Resolves a family to a face and downloads it through a shared transport.
pub struct Fetcher<R, T> {
    resolver: R,
    transport: T,
    logger: Logger,
}

impl<R: FaceResolver, T: Transport> Fetcher<R, T> {
    pub fn new(resolver: R, transport: T) -> Self {
        Self {
            resolver,
            transport,
            logger: Logger::noop(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Return the raw face bytes for `family`.
    ///
    /// The response must be exactly `200 OK` with the `Content-Type` the
    /// resolver promised; anything else is [`FamilyError::InvalidResponse`]
    /// and the body is dropped unread.
    pub fn fetch(&self, cancel: &CancelToken, family: &str) -> Result<Vec<u8>, FamilyError> {
        cancel.check()?;
        let face = self
            .resolver
            .resolve(cancel, family, &self.transport)
            .map_err(|e| {
                if e.is_canceled() {
                    FamilyError::Canceled
                } else {
                    FamilyError::FaceResolutionFailed(e)
                }
            })?;
        if face.src.is_empty() {
            return Err(FamilyError::MissingFaceSource);
        }

        self.logger.log(format_args!("retrieving: {}", face.src));
        let request = get(&face.src).map_err(FamilyError::FetchFailed)?;
        let response = self
            .transport
            .execute(&request, cancel)
            .map_err(|e| match e {
                TransportError::Canceled => FamilyError::Canceled,
                // A caching transport reads the body before handing it back.
                TransportError::BodyRead(inner) => FamilyError::BodyReadFailed(*inner),
                other => FamilyError::FetchFailed(other),
            })?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if response.status() != StatusCode::OK || content_type != face.content_type {
            return Err(FamilyError::InvalidResponse {
                status: response.status().as_u16(),
                content_type: content_type.to_string(),
                expected: face.content_type,
            });
        }

        response
            .into_body()
            .read_to_vec(MAX_BODY_SIZE, cancel)
            .map_err(|e| match e {
                TransportError::Canceled => FamilyError::Canceled,
                other => FamilyError::BodyReadFailed(other),
            })
    }
}
