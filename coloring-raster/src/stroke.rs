//! Stroke rendering onto the raster surface.
//!
//! Takes the stroke events the input pipeline emits, plans dab geometry via
//! the brush catalog, and stamps it onto the surface. Strokes are
//! immediate-mode: nothing is retained once a stroke ends.

use coloring_core::{Dab, DabPlanner, JitterSource, Point, Rgba, Tool};

use crate::surface::{CompositeMode, RasterSurface};

/// State for the stroke currently being drawn, if any.
#[derive(Debug)]
struct ActiveStroke {
    planner: DabPlanner,
    color: Rgba,
    mode: CompositeMode,
}

/// Renders strokes onto a [`RasterSurface`].
#[derive(Debug, Default)]
pub struct StrokeEngine {
    active: Option<ActiveStroke>,
}

impl StrokeEngine {
    /// Create an engine with no stroke in progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stroke is currently in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Begin a stroke at a surface point.
    ///
    /// For brushes the size is clamped to the brush's range and the brush
    /// opacity is baked into the stroke color's alpha. The eraser stamps
    /// destination-out at full opacity regardless of brush state. Soft and
    /// rough textures leave their tap mark immediately.
    pub fn begin_stroke(
        &mut self,
        surface: &mut RasterSurface,
        at: Point,
        tool: Tool,
        color: Rgba,
        size: f32,
    ) {
        let (color, size, mode) = match tool {
            Tool::Brush(kind) => {
                let spec = kind.spec();
                (
                    spec.stroke_color(color),
                    spec.clamp_size(size),
                    CompositeMode::SourceOver,
                )
            }
            Tool::Eraser => (Rgba::WHITE, size.max(1.0), CompositeMode::DestinationOut),
        };

        // Seeding from the start point keeps crayon texture deterministic
        // for a given gesture without any platform randomness.
        let mut planner = DabPlanner::for_tool(tool, size, JitterSource::from_position(at));
        let dabs = planner.start(at);
        self.active = Some(ActiveStroke {
            planner,
            color,
            mode,
        });
        self.stamp_all(surface, &dabs);
    }

    /// Extend the stroke from the previous point to the current one.
    /// Ignored when no stroke is in progress (e.g. after a resize abandoned
    /// it).
    pub fn extend_stroke(&mut self, surface: &mut RasterSurface, from: Point, to: Point) {
        let Some(stroke) = self.active.as_mut() else {
            return;
        };
        let dabs = stroke.planner.segment(from, to);
        let (color, mode) = (stroke.color, stroke.mode);
        for dab in dabs {
            Self::stamp(surface, dab, color, mode);
        }
    }

    /// Finish the stroke. Returns `true` if a stroke was in progress, which
    /// is the signal to schedule a progress save.
    pub fn end_stroke(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Drop any stroke in progress without the end-of-stroke signal (used
    /// when a resize destroys the buffer mid-stroke).
    pub fn abandon(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("stroke abandoned mid-gesture");
        }
    }

    fn stamp_all(&self, surface: &mut RasterSurface, dabs: &[Dab]) {
        if let Some(stroke) = self.active.as_ref() {
            for &dab in dabs {
                Self::stamp(surface, dab, stroke.color, stroke.mode);
            }
        }
    }

    fn stamp(surface: &mut RasterSurface, dab: Dab, color: Rgba, mode: CompositeMode) {
        match dab {
            Dab::Disc { center, radius } => surface.stamp_disc(center, radius, color, mode),
            Dab::Capsule { from, to, radius } => {
                surface.stamp_capsule(from, to, radius, color, mode);
            }
        }
    }
}
