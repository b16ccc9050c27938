//! Viewport transform for zoom and pan.
//!
//! The viewport scales around the container center, then translates by the
//! pan offset. The surface itself is never transformed - only the mapping
//! between container-relative pointer coordinates and surface coordinates.

use serde::{Deserialize, Serialize};

/// A point in logical (CSS/display) pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx.hypot(dy)
    }

    /// Linear interpolation towards another point.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
        }
    }
}

/// A size in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The center point of a rectangle of this size anchored at the origin.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Minimum zoom scale (fully zoomed out, identity).
pub const MIN_SCALE: f32 = 1.0;

/// Maximum zoom scale.
pub const MAX_SCALE: f32 = 4.0;

/// Zoom scale and pan offset applied when displaying the surface.
///
/// Invariant: `scale` stays within `[MIN_SCALE, MAX_SCALE]`. At
/// `scale == 1.0` and zero pan the transform is the identity and pointer
/// coordinates map to surface coordinates unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    /// Zoom scale (1.0 = 100%).
    pub scale: f32,
    /// Pan offset X in logical pixels.
    pub pan_x: f32,
    /// Pan offset Y in logical pixels.
    pub pan_y: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewportTransform {
    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Check whether this transform is the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.pan_x == 0.0 && self.pan_y == 0.0
    }

    /// Multiply the scale by `factor`, clamping to `[MIN_SCALE, MAX_SCALE]`.
    pub fn zoom_by(&mut self, factor: f32) {
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Translate the pan offset by `(dx, dy)` logical pixels.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Reset to the identity transform.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Map a surface point to its displayed position inside the container.
    ///
    /// The render transform scales around the container center, then
    /// translates by the pan offset.
    #[must_use]
    pub fn to_display(&self, point: Point, container: Size) -> Point {
        if self.is_identity() {
            return point;
        }
        let c = container.center();
        Point::new(
            (point.x - c.x).mul_add(self.scale, c.x) + self.pan_x,
            (point.y - c.y).mul_add(self.scale, c.y) + self.pan_y,
        )
    }

    /// Map a container-relative pointer position to surface coordinates.
    ///
    /// This is the exact inverse of [`to_display`](Self::to_display). At the
    /// identity transform the point is returned unchanged, with no
    /// floating-point arithmetic applied.
    #[must_use]
    pub fn to_surface(&self, point: Point, container: Size) -> Point {
        if self.is_identity() {
            return point;
        }
        let c = container.center();
        Point::new(
            (point.x - c.x - self.pan_x) / self.scale + c.x,
            (point.y - c.y - self.pan_y) / self.scale + c.y,
        )
    }
}
