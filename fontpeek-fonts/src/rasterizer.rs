//! Panic-containing front end for a [`RasterEngine`].
//!
//! Font parsers and scalers are fed bytes from the network. A panic in one
//! of them must fail the current family only, so every call goes through
//! [`std::panic::catch_unwind`] and a caught panic becomes
//! [`RasterError::Panicked`].

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use image::RgbaImage;

use crate::config::RenderConfig;
use crate::engine::{GlyphEngine, RasterEngine};
use crate::error::RasterError;

/// Turns validated font bytes into a sample image using a fixed config.
#[derive(Debug, Clone)]
pub struct Rasterizer<E = GlyphEngine> {
    engine: E,
    config: RenderConfig,
}

impl Rasterizer<GlyphEngine> {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_engine(GlyphEngine, config)
    }
}

impl<E: RasterEngine> Rasterizer<E> {
    pub fn with_engine(engine: E, config: RenderConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Rasterize `data`. Never panics: engine panics come back as
    /// [`RasterError::Panicked`] and the process keeps running.
    pub fn rasterize(&self, data: &[u8]) -> Result<RgbaImage, RasterError> {
        // The engine only borrows `data` and the config, neither of which is
        // left half-updated by an unwind.
        match catch_unwind(AssertUnwindSafe(|| {
            self.engine.rasterize(data, &self.config)
        })) {
            Ok(result) => result,
            Err(payload) => Err(RasterError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
