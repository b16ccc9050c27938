//! Brush catalog and dab planning.
//!
//! Brushes are a fixed, immutable catalog. Each entry names a texture
//! category that selects the planning algorithm: a smooth stroked segment,
//! soft overlapping dabs, or rough jittered dabs. Planning is pure geometry;
//! rasterization of the planned dabs lives in the raster crate.

use serde::Serialize;

use crate::color::Rgba;
use crate::error::CoreResult;
use crate::viewport::Point;

/// Spacing between soft-marker dabs in logical pixels.
const SOFT_DAB_SPACING: f32 = 3.0;

/// Spacing between rough-crayon dabs in logical pixels.
const ROUGH_DAB_SPACING: f32 = 2.0;

/// Rough-crayon radius jitter, as a fraction of the nominal radius.
const ROUGH_RADIUS_JITTER: f32 = 0.2;

/// Rough-crayon center scatter, as a fraction of the brush size.
const ROUGH_CENTER_SCATTER: f32 = 0.15;

/// Rendering algorithm family for a brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureCategory {
    /// Single stroked segment with round caps and joins.
    Smooth,
    /// Overlapping discs that build up opacity, marker-like.
    Soft,
    /// Jittered discs approximating a waxy crayon.
    Rough,
    /// Like smooth but thin and fully opaque, pencil-like.
    Fine,
}

/// The fixed brush kinds offered on the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushKind {
    /// Smooth round brush.
    Brush,
    /// Soft marker.
    Marker,
    /// Rough wax crayon.
    Crayon,
    /// Fine pencil.
    Pencil,
}

impl BrushKind {
    /// All brush kinds, in palette order.
    pub const ALL: [Self; 4] = [Self::Brush, Self::Marker, Self::Crayon, Self::Pencil];

    /// The catalog entry for this brush kind.
    #[must_use]
    pub fn spec(self) -> &'static BrushSpec {
        &CATALOG[self as usize]
    }
}

/// The active drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Paint with the given brush.
    Brush(BrushKind),
    /// Subtract alpha (reveal the white base / line-art beneath).
    Eraser,
}

/// Immutable configuration of one brush on the palette.
#[derive(Debug, Clone, Serialize)]
pub struct BrushSpec {
    /// Which brush this describes.
    pub kind: BrushKind,
    /// Display name shown on the palette.
    pub name: &'static str,
    /// Texture category selecting the planning algorithm.
    pub texture: TextureCategory,
    /// Minimum stroke size (diameter) in logical pixels.
    pub min_size: f32,
    /// Maximum stroke size in logical pixels.
    pub max_size: f32,
    /// Default stroke size in logical pixels.
    pub default_size: f32,
    /// Base opacity baked into the stroke color.
    pub opacity: f32,
}

impl BrushSpec {
    /// Clamp a requested size to this brush's range.
    #[must_use]
    pub fn clamp_size(&self, size: f32) -> f32 {
        size.clamp(self.min_size, self.max_size)
    }

    /// The stroke color with this brush's opacity baked into its alpha.
    #[must_use]
    pub fn stroke_color(&self, base: Rgba) -> Rgba {
        base.with_opacity(self.opacity)
    }
}

/// The fixed brush catalog, indexed by [`BrushKind`] discriminant.
static CATALOG: [BrushSpec; 4] = [
    BrushSpec {
        kind: BrushKind::Brush,
        name: "Brush",
        texture: TextureCategory::Smooth,
        min_size: 4.0,
        max_size: 40.0,
        default_size: 12.0,
        opacity: 1.0,
    },
    BrushSpec {
        kind: BrushKind::Marker,
        name: "Marker",
        texture: TextureCategory::Soft,
        min_size: 8.0,
        max_size: 48.0,
        default_size: 20.0,
        opacity: 0.55,
    },
    BrushSpec {
        kind: BrushKind::Crayon,
        name: "Crayon",
        texture: TextureCategory::Rough,
        min_size: 6.0,
        max_size: 36.0,
        default_size: 15.0,
        opacity: 0.9,
    },
    BrushSpec {
        kind: BrushKind::Pencil,
        name: "Pencil",
        texture: TextureCategory::Fine,
        min_size: 1.0,
        max_size: 8.0,
        default_size: 3.0,
        opacity: 1.0,
    },
];

/// The full brush catalog in palette order.
#[must_use]
pub fn catalog() -> &'static [BrushSpec; 4] {
    &CATALOG
}

/// The catalog serialized as JSON, for palette UIs living outside this crate.
///
/// # Errors
///
/// Returns a serialization error if JSON encoding fails.
pub fn catalog_json() -> CoreResult<String> {
    Ok(serde_json::to_string(&CATALOG)?)
}

/// A planned stamp for the rasterizer, in logical surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dab {
    /// A filled disc.
    Disc {
        /// Disc center.
        center: Point,
        /// Disc radius.
        radius: f32,
    },
    /// A stroked segment with round caps (a capsule).
    Capsule {
        /// Segment start.
        from: Point,
        /// Segment end.
        to: Point,
        /// Half the stroke width.
        radius: f32,
    },
}

/// Seedable pseudo-random source for cosmetic stamp jitter.
///
/// A positional-hash generator: cheap, deterministic for a given seed, and
/// free of any platform randomness, so the rough texture can be tested with
/// a fixed seed while production strokes seed from the stroke start point.
#[derive(Debug, Clone)]
pub struct JitterSource {
    state: u32,
}

impl JitterSource {
    /// Create a source with an explicit seed.
    #[must_use]
    pub fn seeded(seed: u32) -> Self {
        Self {
            state: hash_u32(seed ^ 0x9E37_79B9),
        }
    }

    /// Seed from a stroke start position, so each stroke gets its own
    /// sequence without a platform RNG.
    #[must_use]
    pub fn from_position(point: Point) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (ix, iy) = ((point.x * 100.0).abs() as u32, (point.y * 100.0).abs() as u32);
        Self::seeded(
            ix.wrapping_mul(374_761_393)
                .wrapping_add(iy.wrapping_mul(668_265_263)),
        )
    }

    fn next_u32(&mut self) -> u32 {
        self.state = hash_u32(self.state.wrapping_add(0x9E37_79B9));
        self.state
    }

    /// Next value in `[0, 1)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() & 0x00FF_FFFF) as f32 / 16_777_216.0
    }

    /// Next value in `[-1, 1)`.
    #[must_use]
    pub fn next_signed(&mut self) -> f32 {
        self.next_f32().mul_add(2.0, -1.0)
    }
}

/// Avalanche hash over a `u32`.
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    x
}

/// Plans dab geometry for one stroke.
#[derive(Debug)]
pub struct DabPlanner {
    texture: TextureCategory,
    size: f32,
    jitter: JitterSource,
}

impl DabPlanner {
    /// Create a planner for one stroke of the given tool and size.
    ///
    /// The eraser always plans like a smooth brush: round-capped segments,
    /// no texture, whatever brush was last active.
    #[must_use]
    pub fn for_tool(tool: Tool, size: f32, jitter: JitterSource) -> Self {
        let texture = match tool {
            Tool::Brush(kind) => kind.spec().texture,
            Tool::Eraser => TextureCategory::Smooth,
        };
        Self {
            texture,
            size,
            jitter,
        }
    }

    /// Dabs for the stroke start.
    ///
    /// Soft and rough textures place an initial disc so a tap without any
    /// drag still leaves a mark; smooth and fine rely on segment rendering.
    pub fn start(&mut self, at: Point) -> Vec<Dab> {
        match self.texture {
            TextureCategory::Smooth | TextureCategory::Fine => Vec::new(),
            TextureCategory::Soft => vec![Dab::Disc {
                center: at,
                radius: self.size / 2.0,
            }],
            TextureCategory::Rough => vec![self.rough_dab(at)],
        }
    }

    /// Dabs for one movement segment, from the last point to the current one.
    pub fn segment(&mut self, from: Point, to: Point) -> Vec<Dab> {
        let radius = self.size / 2.0;
        match self.texture {
            TextureCategory::Smooth | TextureCategory::Fine => {
                vec![Dab::Capsule { from, to, radius }]
            }
            TextureCategory::Soft => self.spaced_discs(from, to, SOFT_DAB_SPACING, false),
            TextureCategory::Rough => self.spaced_discs(from, to, ROUGH_DAB_SPACING, true),
        }
    }

    /// Subdivide a segment into discs at a fixed spacing. The `from` end was
    /// stamped by the previous event, so stamping starts one step in.
    fn spaced_discs(&mut self, from: Point, to: Point, spacing: f32, jittered: bool) -> Vec<Dab> {
        let distance = from.distance_to(to);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = (distance / spacing).ceil().max(1.0) as u32;
        let mut dabs = Vec::with_capacity(steps as usize);
        for i in 1..=steps {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / steps as f32;
            let center = from.lerp(to, t);
            if jittered {
                dabs.push(self.rough_dab(center));
            } else {
                dabs.push(Dab::Disc {
                    center,
                    radius: self.size / 2.0,
                });
            }
        }
        dabs
    }

    /// A crayon dab: radius jittered by up to ±20%, center scattered by up
    /// to 15% of the brush size in a random direction.
    fn rough_dab(&mut self, center: Point) -> Dab {
        let radius = (self.size / 2.0)
            * ROUGH_RADIUS_JITTER.mul_add(self.jitter.next_signed(), 1.0);
        let angle = self.jitter.next_f32() * std::f32::consts::TAU;
        let offset = self.jitter.next_f32() * ROUGH_CENTER_SCATTER * self.size;
        Dab::Disc {
            center: Point::new(
                offset.mul_add(angle.cos(), center.x),
                offset.mul_add(angle.sin(), center.y),
            ),
            radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes_are_consistent() {
        for spec in catalog() {
            assert!(spec.min_size <= spec.default_size, "{}", spec.name);
            assert!(spec.default_size <= spec.max_size, "{}", spec.name);
            assert!(spec.opacity > 0.0 && spec.opacity <= 1.0, "{}", spec.name);
        }
    }

    #[test]
    fn test_kind_spec_lookup() {
        assert_eq!(BrushKind::Crayon.spec().texture, TextureCategory::Rough);
        assert_eq!(BrushKind::Pencil.spec().texture, TextureCategory::Fine);
        for kind in BrushKind::ALL {
            assert_eq!(kind.spec().kind, kind);
        }
    }

    #[test]
    fn test_catalog_json_is_valid() {
        let json = catalog_json().expect("catalog serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        assert_eq!(value.as_array().map(Vec::len), Some(4));
        assert_eq!(value[2]["texture"], "rough");
    }

    #[test]
    fn test_stroke_color_bakes_opacity() {
        let marker = BrushKind::Marker.spec();
        let color = marker.stroke_color(Rgba::new(10, 20, 30, 255));
        assert_eq!(color.a, 140); // 255 * 0.55, rounded
    }

    #[test]
    fn test_smooth_plans_single_capsule() {
        let jitter = JitterSource::seeded(1);
        let mut planner = DabPlanner::for_tool(Tool::Brush(BrushKind::Brush), 12.0, jitter);
        assert!(planner.start(Point::new(5.0, 5.0)).is_empty());
        let dabs = planner.segment(Point::new(5.0, 5.0), Point::new(50.0, 5.0));
        assert_eq!(
            dabs,
            vec![Dab::Capsule {
                from: Point::new(5.0, 5.0),
                to: Point::new(50.0, 5.0),
                radius: 6.0,
            }]
        );
    }

    #[test]
    fn test_soft_spacing_subdivision() {
        let jitter = JitterSource::seeded(1);
        let mut planner = DabPlanner::for_tool(Tool::Brush(BrushKind::Marker), 20.0, jitter);
        let dabs = planner.segment(Point::new(0.0, 0.0), Point::new(9.0, 0.0));
        // 9 px at 3 px spacing: three discs, ending exactly at the segment end.
        assert_eq!(dabs.len(), 3);
        match dabs[2] {
            Dab::Disc { center, radius } => {
                assert!((center.x - 9.0).abs() < 1e-4);
                assert!((radius - 10.0).abs() < f32::EPSILON);
            }
            Dab::Capsule { .. } => panic!("soft texture must plan discs"),
        }
    }

    #[test]
    fn test_rough_tap_leaves_jittered_disc() {
        let jitter = JitterSource::seeded(42);
        let mut planner = DabPlanner::for_tool(Tool::Brush(BrushKind::Crayon), 15.0, jitter);
        let dabs = planner.start(Point::new(50.0, 50.0));
        assert_eq!(dabs.len(), 1);
        match dabs[0] {
            Dab::Disc { center, radius } => {
                // Radius within +-20% of 7.5, center within 15% of size.
                assert!(radius >= 6.0 && radius <= 9.0, "radius {radius}");
                assert!(center.distance_to(Point::new(50.0, 50.0)) <= 0.15 * 15.0 + 1e-4);
            }
            Dab::Capsule { .. } => panic!("rough tap must plan a disc"),
        }
    }

    #[test]
    fn test_rough_jitter_is_deterministic_per_seed() {
        let plan = |seed: u32| {
            let mut planner =
                DabPlanner::for_tool(Tool::Brush(BrushKind::Crayon), 15.0, JitterSource::seeded(seed));
            planner.segment(Point::new(0.0, 0.0), Point::new(30.0, 10.0))
        };
        assert_eq!(plan(7), plan(7));
        assert_ne!(plan(7), plan(8));
    }

    #[test]
    fn test_eraser_plans_like_smooth() {
        let jitter = JitterSource::seeded(1);
        let mut planner = DabPlanner::for_tool(Tool::Eraser, 18.0, jitter);
        assert!(planner.start(Point::new(3.0, 3.0)).is_empty());
        let dabs = planner.segment(Point::new(3.0, 3.0), Point::new(8.0, 3.0));
        assert!(matches!(dabs.as_slice(), [Dab::Capsule { radius, .. }] if (radius - 9.0).abs() < f32::EPSILON));
    }

    #[test]
    fn test_zero_length_segment_still_stamps_soft() {
        let jitter = JitterSource::seeded(1);
        let mut planner = DabPlanner::for_tool(Tool::Brush(BrushKind::Marker), 10.0, jitter);
        let dabs = planner.segment(Point::new(4.0, 4.0), Point::new(4.0, 4.0));
        assert_eq!(dabs.len(), 1);
    }
}
