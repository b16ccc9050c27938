//! # Coloring Core
//!
//! Core logic for the freehand coloring canvas: viewport transforms, the
//! input-to-stroke pipeline, the brush catalog with dab planning, color
//! parsing, and progress storage. Everything here is pure state and
//! geometry - no pixel buffers and no environment dependencies - so the
//! whole pipeline is testable without a rendering target.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               coloring-core                 │
//! ├──────────────────┬──────────────────────────┤
//! │  Input Pipeline  │  Brush Catalog           │
//! │  - Stroke phases │  - Texture categories    │
//! │  - Pinch/pan     │  - Dab planning          │
//! ├──────────────────┼──────────────────────────┤
//! │  Viewport        │  Progress Store          │
//! │  - Zoom [1,4]    │  - KV capability         │
//! │  - Inverse map   │  - Debounced saves       │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! Rasterization of planned dabs and everything else that touches pixels
//! lives in the `coloring-raster` crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod brush;
pub mod color;
pub mod error;
pub mod input;
pub mod store;
pub mod viewport;

pub use brush::{catalog, catalog_json, BrushKind, BrushSpec, Dab, DabPlanner, JitterSource, TextureCategory, Tool};
pub use color::Rgba;
pub use error::{CoreError, CoreResult};
pub use input::{InputPipeline, PointerPhase, StrokeEvent, StrokePhase, TouchPoint};
pub use store::{FileStore, MemoryStore, ProgressStore, SaveScheduler, DEFAULT_QUIET_PERIOD};
pub use viewport::{Point, Size, ViewportTransform, MAX_SCALE, MIN_SCALE};

/// Coloring core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
