//! Input-to-stroke pipeline.
//!
//! Normalizes pointer and touch events into a continuous stream of stroke
//! events in surface coordinates, accounting for the viewport transform.
//! Multi-touch input is disambiguated by an explicit zoom mode: while it is
//! active every touch pans or pinches the viewport and none of them draw.

use serde::{Deserialize, Serialize};

use crate::viewport::{Point, Size, ViewportTransform};

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Pointer pressed (stroke may begin).
    Down,
    /// Pointer dragged.
    Move,
    /// Pointer released.
    Up,
    /// Pointer left the surface.
    Leave,
}

/// A single touch point in container-relative logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (stable across one finger's down/move/up).
    pub id: u32,
    /// X position relative to the container's top-left corner.
    pub x: f32,
    /// Y position relative to the container's top-left corner.
    pub y: f32,
}

impl TouchPoint {
    /// Create a new touch point.
    #[must_use]
    pub const fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    fn position(self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Stroke lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokePhase {
    /// No stroke in progress.
    Idle,
    /// A stroke is being drawn.
    Drawing,
}

/// A stroke event emitted by the pipeline, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeEvent {
    /// A stroke began at the given surface point.
    Begin(Point),
    /// The stroke extended from the previous point to a new one.
    Extend {
        /// Previous surface point.
        from: Point,
        /// Current surface point.
        to: Point,
    },
    /// The stroke ended (pointer up or leave).
    End,
}

/// Ongoing pinch/pan gesture state while zoom mode is active.
#[derive(Debug, Clone, Copy)]
struct PinchState {
    /// Distance between the two tracked touches, if two are down.
    distance: Option<f32>,
    /// Midpoint of the tracked touches.
    midpoint: Point,
}

/// Normalizes pointer/touch input into stroke events and viewport updates.
///
/// The pipeline owns the [`ViewportTransform`]; gesture handlers write it and
/// coordinate mapping reads it, in event order on the host's single thread.
#[derive(Debug)]
pub struct InputPipeline {
    viewport: ViewportTransform,
    container: Size,
    zoom_mode: bool,
    phase: StrokePhase,
    /// Touch id currently driving the stroke. A second concurrent touch is
    /// ignored entirely so it cannot smear the drawing.
    active_touch: Option<u32>,
    last_point: Option<Point>,
    pinch: Option<PinchState>,
}

impl InputPipeline {
    /// Create a pipeline for a container of the given logical size.
    #[must_use]
    pub fn new(container: Size) -> Self {
        Self {
            viewport: ViewportTransform::identity(),
            container,
            zoom_mode: false,
            phase: StrokePhase::Idle,
            active_touch: None,
            last_point: None,
            pinch: None,
        }
    }

    /// The current viewport transform.
    #[must_use]
    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    /// The current stroke phase.
    #[must_use]
    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// Whether zoom mode is active.
    #[must_use]
    pub fn zoom_mode(&self) -> bool {
        self.zoom_mode
    }

    /// Toggle zoom mode. Enabling it terminates any stroke in progress,
    /// returning the terminating event.
    pub fn set_zoom_mode(&mut self, enabled: bool) -> Option<StrokeEvent> {
        self.zoom_mode = enabled;
        self.pinch = None;
        if enabled {
            self.finish_stroke()
        } else {
            None
        }
    }

    /// Reset the viewport to the identity transform.
    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Restore a previously captured viewport transform (e.g. after a
    /// temporary reset for a full-artwork capture).
    pub fn set_viewport(&mut self, viewport: ViewportTransform) {
        self.viewport = viewport;
    }

    /// Update the container size after a resize.
    ///
    /// Resizing destroys the backing buffer, so an in-progress stroke is
    /// abandoned without a terminating event.
    pub fn set_container(&mut self, container: Size) {
        self.container = container;
        self.phase = StrokePhase::Idle;
        self.active_touch = None;
        self.last_point = None;
        self.pinch = None;
    }

    /// Map a container-relative pointer position to surface coordinates.
    #[must_use]
    pub fn to_surface_coordinates(&self, point: Point) -> Point {
        self.viewport.to_surface(point, self.container)
    }

    // -----------------------------------------------------------------------
    // Single-pointer (mouse/stylus) path
    // -----------------------------------------------------------------------

    /// Handle a pointer event by phase. Equivalent to calling the matching
    /// `pointer_*` method; convenient for hosts that carry phase + position
    /// in one event struct.
    pub fn pointer_event(&mut self, phase: PointerPhase, point: Point) -> Option<StrokeEvent> {
        match phase {
            PointerPhase::Down => self.pointer_down(point),
            PointerPhase::Move => self.pointer_move(point),
            PointerPhase::Up => self.pointer_up(),
            PointerPhase::Leave => self.pointer_leave(),
        }
    }

    /// Handle a pointer-down at a container-relative position.
    pub fn pointer_down(&mut self, point: Point) -> Option<StrokeEvent> {
        if self.zoom_mode || self.phase == StrokePhase::Drawing {
            return None;
        }
        let mapped = self.to_surface_coordinates(point);
        self.phase = StrokePhase::Drawing;
        self.last_point = Some(mapped);
        Some(StrokeEvent::Begin(mapped))
    }

    /// Handle a pointer-move at a container-relative position.
    pub fn pointer_move(&mut self, point: Point) -> Option<StrokeEvent> {
        if self.phase != StrokePhase::Drawing {
            return None;
        }
        let to = self.to_surface_coordinates(point);
        let from = self.last_point.replace(to)?;
        Some(StrokeEvent::Extend { from, to })
    }

    /// Handle a pointer-up.
    pub fn pointer_up(&mut self) -> Option<StrokeEvent> {
        self.finish_stroke()
    }

    /// Handle the pointer leaving the surface. A stroke in progress is
    /// terminated exactly as on pointer-up, so the pipeline can never be
    /// stuck in [`StrokePhase::Drawing`] with no pointer present.
    pub fn pointer_leave(&mut self) -> Option<StrokeEvent> {
        self.finish_stroke()
    }

    // -----------------------------------------------------------------------
    // Touch path
    // -----------------------------------------------------------------------

    /// Handle new touches landing on the surface.
    pub fn touch_start(&mut self, touches: &[TouchPoint]) -> Option<StrokeEvent> {
        if self.zoom_mode {
            self.pinch = Self::pinch_state(touches);
            return None;
        }
        if self.phase == StrokePhase::Drawing {
            // A second finger landed mid-stroke; ignore it.
            return None;
        }
        let first = touches.first()?;
        self.active_touch = Some(first.id);
        let mapped = self.to_surface_coordinates(first.position());
        self.phase = StrokePhase::Drawing;
        self.last_point = Some(mapped);
        Some(StrokeEvent::Begin(mapped))
    }

    /// Handle touch movement.
    pub fn touch_move(&mut self, touches: &[TouchPoint]) -> Option<StrokeEvent> {
        if self.zoom_mode {
            self.apply_pinch(touches);
            return None;
        }
        let active = self.active_touch?;
        let touch = touches.iter().find(|t| t.id == active)?;
        self.pointer_move(touch.position())
    }

    /// Handle touches lifting; `remaining` holds the touches still down.
    pub fn touch_end(&mut self, remaining: &[TouchPoint]) -> Option<StrokeEvent> {
        if self.zoom_mode {
            // Re-anchor the gesture so the transform does not jump when a
            // finger lifts.
            self.pinch = Self::pinch_state(remaining);
            return None;
        }
        match self.active_touch {
            Some(id) if remaining.iter().any(|t| t.id == id) => None,
            Some(_) => self.finish_stroke(),
            None => None,
        }
    }

    fn finish_stroke(&mut self) -> Option<StrokeEvent> {
        if self.phase != StrokePhase::Drawing {
            return None;
        }
        self.phase = StrokePhase::Idle;
        self.active_touch = None;
        self.last_point = None;
        Some(StrokeEvent::End)
    }

    fn pinch_state(touches: &[TouchPoint]) -> Option<PinchState> {
        match touches {
            [] => None,
            [only] => Some(PinchState {
                distance: None,
                midpoint: only.position(),
            }),
            [a, b, ..] => Some(PinchState {
                distance: Some(a.position().distance_to(b.position())),
                midpoint: a.position().lerp(b.position(), 0.5),
            }),
        }
    }

    /// Update the viewport from a pan/pinch movement. The scale update is
    /// `clamp(1, 4, previous × new_distance/old_distance)`; the pan follows
    /// the delta of the touch midpoint. The transform is written before any
    /// later coordinate-mapping read.
    fn apply_pinch(&mut self, touches: &[TouchPoint]) {
        let Some(next) = Self::pinch_state(touches) else {
            self.pinch = None;
            return;
        };
        if let Some(prev) = self.pinch {
            self.viewport
                .pan_by(next.midpoint.x - prev.midpoint.x, next.midpoint.y - prev.midpoint.y);
            if let (Some(old), Some(new)) = (prev.distance, next.distance) {
                if old > f32::EPSILON {
                    self.viewport.zoom_by(new / old);
                }
            }
        }
        self.pinch = Some(next);
    }
}
