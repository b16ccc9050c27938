//! Raster surface management.
//!
//! The surface owns the backing pixel buffer. It is addressed in device
//! pixels but every drawing command takes logical (CSS/display) pixel
//! coordinates; the device-pixel-ratio mapping happens here and nowhere
//! else. The buffer always starts opaque white, and erased pixels carry
//! zero alpha - the visible content is the buffer composited over the
//! white base, which [`flatten`](RasterSurface::flatten) produces.

use coloring_core::{Point, Rgba, Size};
use image::{imageops, RgbaImage};

/// How a stamp combines with the pixels beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Normal painting: the stamp's color blends over the destination.
    SourceOver,
    /// Erasing: the stamp subtracts destination alpha, adding no color.
    DestinationOut,
}

/// The backing pixel buffer a user draws onto.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    buffer: RgbaImage,
    logical: Size,
    dpr: f32,
}

impl RasterSurface {
    /// Create a surface for the given logical size and device pixel ratio,
    /// filled opaque white.
    #[must_use]
    pub fn new(logical: Size, device_pixel_ratio: f32) -> Self {
        let dpr = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let (width, height) = Self::device_dimensions(logical, dpr);
        Self {
            buffer: RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255])),
            logical,
            dpr,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn device_dimensions(logical: Size, dpr: f32) -> (u32, u32) {
        let width = (logical.width * dpr).round().max(1.0) as u32;
        let height = (logical.height * dpr).round().max(1.0) as u32;
        (width, height)
    }

    /// Logical size in CSS pixels.
    #[must_use]
    pub fn logical_size(&self) -> Size {
        self.logical
    }

    /// Device buffer dimensions in pixels.
    #[must_use]
    pub fn device_size(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// The device pixel ratio this surface was sized with.
    #[must_use]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    /// The raw backing buffer (device pixels, straight alpha).
    #[must_use]
    pub fn buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Resize to a new logical size.
    ///
    /// The buffer is destroyed and reinitialized to opaque white: drawn
    /// content does not survive a resize, only a session save/restore does,
    /// and any stroke in progress is abandoned by the caller.
    pub fn resize(&mut self, logical: Size) {
        *self = Self::new(logical, self.dpr);
    }

    /// Refill the entire buffer with opaque white.
    pub fn clear(&mut self) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = image::Rgba([255, 255, 255, 255]);
        }
    }

    /// The visible content: the buffer composited over an opaque white base.
    ///
    /// Erased (zero-alpha) pixels show as white here, matching what the
    /// on-screen canvas shows above a white page.
    #[must_use]
    pub fn flatten(&self) -> RgbaImage {
        let mut out = self.buffer.clone();
        for pixel in out.pixels_mut() {
            let a = f32::from(pixel[3]) / 255.0;
            for c in 0..3 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    pixel[c] = f32::from(pixel[c]).mul_add(a, 255.0 * (1.0 - a)).round() as u8;
                }
            }
            pixel[3] = 255;
        }
        out
    }

    /// Stamp a filled disc at a logical-pixel center.
    pub fn stamp_disc(&mut self, center: Point, radius: f32, color: Rgba, mode: CompositeMode) {
        let cx = center.x * self.dpr;
        let cy = center.y * self.dpr;
        let r = radius * self.dpr;
        let (x0, y0, x1, y1) = self.stamp_bounds(cx - r, cy - r, cx + r, cy + r);

        for py in y0..=y1 {
            for px in x0..=x1 {
                #[allow(clippy::cast_precision_loss)]
                let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
                let dist = (fx - cx).hypot(fy - cy);
                let coverage = (r - dist + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    Self::blend(self.buffer.get_pixel_mut(px, py), color, coverage, mode);
                }
            }
        }
    }

    /// Stamp a round-capped segment (a capsule) between two logical points.
    pub fn stamp_capsule(
        &mut self,
        from: Point,
        to: Point,
        radius: f32,
        color: Rgba,
        mode: CompositeMode,
    ) {
        let (ax, ay) = (from.x * self.dpr, from.y * self.dpr);
        let (bx, by) = (to.x * self.dpr, to.y * self.dpr);
        let r = radius * self.dpr;
        let (x0, y0, x1, y1) = self.stamp_bounds(
            ax.min(bx) - r,
            ay.min(by) - r,
            ax.max(bx) + r,
            ay.max(by) + r,
        );

        let (abx, aby) = (bx - ax, by - ay);
        let len2 = abx.mul_add(abx, aby * aby);

        for py in y0..=y1 {
            for px in x0..=x1 {
                #[allow(clippy::cast_precision_loss)]
                let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
                let t = if len2 > f32::EPSILON {
                    ((fx - ax).mul_add(abx, (fy - ay) * aby) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dist = (fx - t.mul_add(abx, ax)).hypot(fy - t.mul_add(aby, ay));
                let coverage = (r - dist + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    Self::blend(self.buffer.get_pixel_mut(px, py), color, coverage, mode);
                }
            }
        }
    }

    /// Clamp a device-pixel stamp bounding box to the buffer, padded one
    /// pixel for the anti-aliased fringe.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn stamp_bounds(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (u32, u32, u32, u32) {
        let (w, h) = self.buffer.dimensions();
        let x0 = (min_x - 1.0).floor().max(0.0) as u32;
        let y0 = (min_y - 1.0).floor().max(0.0) as u32;
        let x1 = ((max_x + 1.0).ceil().max(0.0) as u32).min(w.saturating_sub(1));
        let y1 = ((max_y + 1.0).ceil().max(0.0) as u32).min(h.saturating_sub(1));
        (x0, y0, x1, y1)
    }

    /// Blend one stamp sample into a destination pixel. The stamp's
    /// effective alpha is the color's (already opacity-baked) alpha scaled
    /// by the geometric coverage; no further global-alpha pass exists.
    fn blend(dst: &mut image::Rgba<u8>, color: Rgba, coverage: f32, mode: CompositeMode) {
        let src_a = f32::from(color.a) / 255.0 * coverage;
        if src_a <= 0.0 {
            return;
        }
        match mode {
            CompositeMode::DestinationOut => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    dst[3] = (f32::from(dst[3]) * (1.0 - src_a)).round() as u8;
                }
            }
            CompositeMode::SourceOver => {
                let dst_a = f32::from(dst[3]) / 255.0;
                let out_a = dst_a.mul_add(1.0 - src_a, src_a);
                if out_a <= 0.0 {
                    *dst = image::Rgba([0, 0, 0, 0]);
                    return;
                }
                let src_c = [color.r, color.g, color.b];
                for c in 0..3 {
                    let blended = f32::from(src_c[c]).mul_add(
                        src_a,
                        f32::from(dst[c]) * dst_a * (1.0 - src_a),
                    ) / out_a;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    {
                        dst[c] = blended.round() as u8;
                    }
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    dst[3] = (out_a * 255.0).round() as u8;
                }
            }
        }
    }

    /// Draw a background image fit-and-centered onto the surface (flat
    /// mode). The image keeps its aspect ratio; uncovered margins stay
    /// white.
    pub fn draw_background(&mut self, background: &RgbaImage) {
        let (dw, dh) = self.buffer.dimensions();
        let (x, y, w, h) = fit_dimensions(background.dimensions(), (dw, dh));
        let resized = imageops::resize(background, w, h, imageops::FilterType::Lanczos3);
        imageops::overlay(&mut self.buffer, &resized, x, y);
    }

    /// Restore saved content onto the surface.
    ///
    /// The record is stretched to the surface's current device dimensions;
    /// pixel-perfect restoration across different canvas sizes is not
    /// guaranteed.
    pub fn restore_from(&mut self, saved: &RgbaImage) {
        let (dw, dh) = self.buffer.dimensions();
        let resized = if saved.dimensions() == (dw, dh) {
            saved.clone()
        } else {
            imageops::resize(saved, dw, dh, imageops::FilterType::Lanczos3)
        };
        imageops::overlay(&mut self.buffer, &resized, 0, 0);
    }
}

/// Fit-and-center a source into a destination preserving aspect ratio.
///
/// Returns the top-left placement and the scaled dimensions:
/// `scale = min(width ratio, height ratio)`, centered on both axes.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn fit_dimensions(src: (u32, u32), dst: (u32, u32)) -> (i64, i64, u32, u32) {
    let (sw, sh) = (src.0.max(1) as f32, src.1.max(1) as f32);
    let (dw, dh) = (dst.0 as f32, dst.1 as f32);
    let scale = (dw / sw).min(dh / sh);
    let w = ((sw * scale).round().max(1.0) as u32).min(dst.0);
    let h = ((sh * scale).round().max(1.0) as u32).min(dst.1);
    let x = i64::from((dst.0 - w) / 2);
    let y = i64::from((dst.1 - h) / 2);
    (x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> RasterSurface {
        RasterSurface::new(Size::new(100.0, 100.0), 1.0)
    }

    #[test]
    fn test_new_surface_is_opaque_white() {
        let s = surface();
        assert_eq!(s.device_size(), (100, 100));
        for pixel in s.buffer().pixels() {
            assert_eq!(pixel.0, [255, 255, 255, 255]);
        }
    }

    #[test]
    fn test_device_pixel_ratio_scales_buffer() {
        let s = RasterSurface::new(Size::new(100.0, 50.0), 2.0);
        assert_eq!(s.device_size(), (200, 100));

        // A disc stamped at logical (50, 25) lands at device (100, 50).
        let mut s = s;
        s.stamp_disc(Point::new(50.0, 25.0), 5.0, Rgba::BLACK, CompositeMode::SourceOver);
        assert_eq!(s.buffer().get_pixel(100, 50).0, [0, 0, 0, 255]);
        assert_eq!(s.buffer().get_pixel(10, 10).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_disc_stamp_is_local() {
        let mut s = surface();
        s.stamp_disc(Point::new(50.0, 50.0), 7.5, Rgba::new(255, 107, 107, 255), CompositeMode::SourceOver);

        let center = s.buffer().get_pixel(50, 50);
        assert_eq!(center.0, [255, 107, 107, 255]);
        // Pixels clearly outside the disc are untouched.
        assert_eq!(s.buffer().get_pixel(50, 62).0, [255, 255, 255, 255]);
        assert_eq!(s.buffer().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_capsule_covers_both_endpoints() {
        let mut s = surface();
        s.stamp_capsule(
            Point::new(20.0, 50.0),
            Point::new(80.0, 50.0),
            4.0,
            Rgba::BLACK,
            CompositeMode::SourceOver,
        );
        assert_eq!(s.buffer().get_pixel(20, 50).0, [0, 0, 0, 255]);
        assert_eq!(s.buffer().get_pixel(50, 50).0, [0, 0, 0, 255]);
        assert_eq!(s.buffer().get_pixel(80, 50).0, [0, 0, 0, 255]);
        // Round cap extends past the endpoint by the radius.
        assert_eq!(s.buffer().get_pixel(82, 50).0, [0, 0, 0, 255]);
        assert_eq!(s.buffer().get_pixel(90, 50).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_erase_on_fresh_surface_is_invisible() {
        let mut s = surface();
        let before = s.flatten();
        s.stamp_capsule(
            Point::new(10.0, 10.0),
            Point::new(90.0, 90.0),
            10.0,
            Rgba::WHITE,
            CompositeMode::DestinationOut,
        );
        assert_eq!(s.flatten(), before, "erasing nothing must change nothing");
    }

    #[test]
    fn test_erase_removes_painted_stroke() {
        let mut s = surface();
        s.stamp_disc(Point::new(50.0, 50.0), 10.0, Rgba::new(0, 0, 255, 255), CompositeMode::SourceOver);
        assert_ne!(s.flatten().get_pixel(50, 50).0, [255, 255, 255, 255]);

        s.stamp_disc(Point::new(50.0, 50.0), 12.0, Rgba::WHITE, CompositeMode::DestinationOut);
        assert_eq!(s.flatten().get_pixel(50, 50).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_semi_transparent_stamps_build_up() {
        let mut s = surface();
        let color = Rgba::new(0, 0, 0, 128);
        s.stamp_disc(Point::new(50.0, 50.0), 10.0, color, CompositeMode::SourceOver);
        let single = s.buffer().get_pixel(50, 50)[0];
        s.stamp_disc(Point::new(50.0, 50.0), 10.0, color, CompositeMode::SourceOver);
        let double = s.buffer().get_pixel(50, 50)[0];
        assert!(double < single, "overlap must darken ({single} -> {double})");
    }

    #[test]
    fn test_resize_reinitializes_to_white() {
        let mut s = surface();
        s.stamp_disc(Point::new(50.0, 50.0), 20.0, Rgba::BLACK, CompositeMode::SourceOver);
        s.resize(Size::new(60.0, 40.0));
        assert_eq!(s.device_size(), (60, 40));
        for pixel in s.buffer().pixels() {
            assert_eq!(pixel.0, [255, 255, 255, 255]);
        }
    }

    #[test]
    fn test_background_fits_and_centers() {
        // A 2:1 red image into a square surface: letterboxed top and bottom.
        let mut s = surface();
        let bg = RgbaImage::from_pixel(200, 100, image::Rgba([255, 0, 0, 255]));
        s.draw_background(&bg);

        assert_eq!(s.buffer().get_pixel(50, 50).0, [255, 0, 0, 255]);
        assert_eq!(s.buffer().get_pixel(50, 10).0, [255, 255, 255, 255]);
        assert_eq!(s.buffer().get_pixel(50, 90).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_fit_dimensions_math() {
        assert_eq!(fit_dimensions((200, 100), (100, 100)), (0, 25, 100, 50));
        assert_eq!(fit_dimensions((100, 100), (100, 100)), (0, 0, 100, 100));
        assert_eq!(fit_dimensions((50, 100), (100, 100)), (25, 0, 50, 100));
    }

    #[test]
    fn test_restore_stretches_to_current_size() {
        let mut s = RasterSurface::new(Size::new(50.0, 50.0), 1.0);
        let saved = RgbaImage::from_pixel(10, 10, image::Rgba([0, 128, 0, 255]));
        s.restore_from(&saved);
        assert_eq!(s.buffer().get_pixel(25, 25).0, [0, 128, 0, 255]);
        // Corner pixels may pick up a resampling wobble of at most one step.
        let corner = s.buffer().get_pixel(49, 49).0;
        assert!(corner[1] >= 127 && corner[0] <= 1 && corner[2] <= 1, "{corner:?}");
    }
}
