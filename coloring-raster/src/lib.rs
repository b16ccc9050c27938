//! # Coloring Raster
//!
//! The pixel side of the coloring canvas. Everything that touches a buffer
//! lives here: the raster surface, stamp rasterization for brush strokes,
//! line-art extraction, the PNG/data-URI progress codec, and the
//! [`ColoringEngine`] that binds it all behind the contract the host UI
//! consumes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               ColoringEngine                │
//! ├──────────────┬──────────────┬───────────────┤
//! │ RasterSurface│ StrokeEngine │ OverlayCache  │
//! │ - white base │ - dab stamps │ - line-art    │
//! │ - DPR sizing │ - erase      │ - degraded    │
//! ├──────────────┴──────┬───────┴───────────────┤
//! │  Progress codec     │  coloring-core        │
//! │  - PNG data URIs    │  - input, brushes,    │
//! │                     │    viewport, store    │
//! └─────────────────────┴───────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod engine;
pub mod error;
pub mod lineart;
pub mod stroke;
pub mod surface;

pub use engine::{ColoringEngine, EngineConfig, OverlayState};
pub use error::{RasterError, RasterResult};
pub use lineart::{extract_line_art, CacheStats, LineArtOverlay, OverlayCache};
pub use stroke::StrokeEngine;
pub use surface::{CompositeMode, RasterSurface};

/// Coloring raster version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
