//! The sequential render loop.
//!
//! Every selected family gets a `"<family>:"` header followed by either the
//! encoded image or a single `"error: <message>"` line. A failure in one
//! family never stops the batch; only cancellation and a broken sink do.
//! A family interrupted by cancellation still gets its error line, so the
//! output never ends on a bare header.

use std::fmt;
use std::io::Write;

use fontpeek_fonts::{RasterEngine, Rasterizer};
use fontpeek_http::{CancelToken, Logger, Transport};

use crate::catalog::FamilyDescriptor;
use crate::error::{FamilyError, FontpeekError};
use crate::face::FaceResolver;
use crate::fetch::Fetcher;
use crate::graphics::TerminalEncoder;

/// Outcome counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub rendered: usize,
    pub failed: usize,
}

impl RenderSummary {
    pub fn total(&self) -> usize {
        self.rendered + self.failed
    }
}

impl fmt::Display for RenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rendered, {} failed", self.rendered, self.failed)
    }
}

/// Drives fetch, rasterize and encode for each family in order.
pub struct RenderLoop<R, T, E, N> {
    fetcher: Fetcher<R, T>,
    rasterizer: Rasterizer<E>,
    encoder: N,
    logger: Logger,
}

impl<R, T, E, N> RenderLoop<R, T, E, N>
where
    R: FaceResolver,
    T: Transport,
    E: RasterEngine,
    N: TerminalEncoder,
{
    pub fn new(fetcher: Fetcher<R, T>, rasterizer: Rasterizer<E>, encoder: N) -> Self {
        Self {
            fetcher,
            rasterizer,
            encoder,
            logger: Logger::noop(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Render `families` to `sink`, flushing after each one.
    pub fn run<W: Write + ?Sized>(
        &self,
        cancel: &CancelToken,
        families: &[&FamilyDescriptor],
        sink: &mut W,
    ) -> Result<RenderSummary, FontpeekError> {
        let mut summary = RenderSummary::default();
        for family in families {
            cancel.check()?;
            writeln!(sink, "{}:", family.family)?;
            match self.render_family(cancel, &family.family, sink) {
                Ok(()) => summary.rendered += 1,
                Err(e) if e.is_canceled() => {
                    writeln!(sink, "error: {e}")?;
                    sink.flush()?;
                    return Err(FontpeekError::Canceled);
                }
                Err(e) => {
                    self.logger
                        .log(format_args!("{}: {:?}", family.family, e));
                    writeln!(sink, "error: {e}")?;
                    summary.failed += 1;
                }
            }
            sink.flush()?;
        }
        Ok(summary)
    }

    fn render_family<W: Write + ?Sized>(
        &self,
        cancel: &CancelToken,
        family: &str,
        sink: &mut W,
    ) -> Result<(), FamilyError> {
        let bytes = self.fetcher.fetch(cancel, family)?;
        let image = self
            .rasterizer
            .rasterize(&bytes)
            .map_err(FamilyError::RasterizeFailed)?;

        // Encode fully before writing so a failed encode leaves no partial
        // escape sequence in the terminal.
        let mut encoded = Vec::new();
        self.encoder
            .encode(&mut encoded, &image)
            .map_err(FamilyError::EncodeFailed)?;
        sink.write_all(&encoded).map_err(FamilyError::EncodeFailed)
    }
}
