//! Line-art extraction from coloring-page images.
//!
//! Turns a photographic or scanned page into an alpha-masked overlay that
//! isolates dark linework: light "paper" pixels become fully transparent,
//! dark ink becomes opaque black, faint pencil grays become semi-transparent
//! black. The overlay sits above the user's coloring and is never mutated
//! after creation.

use std::collections::HashMap;

use image::RgbaImage;

use crate::codec;
use crate::error::RasterResult;

/// Brightness above which a pixel counts as paper and disappears.
const PAPER_BRIGHTNESS_THRESHOLD: u16 = 200;

/// A derived overlay for one background image.
#[derive(Debug, Clone)]
pub enum LineArtOverlay {
    /// Per-pixel alpha mask extracted from the source image.
    Extracted(RgbaImage),
    /// Degraded mode: pixel access failed, so the caller composites the
    /// original image with a multiply-style blend instead. The blend makes
    /// near-white paper vanish over any coloring while dark lines remain,
    /// approximating the true alpha mask.
    Original,
}

impl LineArtOverlay {
    /// Whether this overlay carries a real extracted alpha mask.
    #[must_use]
    pub fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }

    /// The extracted overlay re-encoded as PNG, for hosts that display the
    /// overlay as an image element. `None` in degraded mode (the caller
    /// already holds the original image).
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the PNG encoder fails.
    pub fn encoded_png(&self) -> RasterResult<Option<Vec<u8>>> {
        match self {
            Self::Extracted(image) => Ok(Some(codec::encode_png(image)?)),
            Self::Original => Ok(None),
        }
    }
}

/// Extract a line-art overlay from encoded image bytes.
///
/// Decode failure (including the cross-origin case where the host could not
/// obtain pixel data at all) is not an error: it yields the degraded
/// [`LineArtOverlay::Original`] so coloring continues with a blend-mode
/// approximation.
#[must_use]
pub fn extract_line_art(data: &[u8]) -> LineArtOverlay {
    match codec::decode_image(data) {
        Ok(image) => LineArtOverlay::Extracted(mask_linework(&image)),
        Err(e) => {
            tracing::warn!("line-art extraction falling back to original image: {e}");
            LineArtOverlay::Original
        }
    }
}

/// The per-pixel threshold transform, at the image's native resolution.
fn mask_linework(source: &RgbaImage) -> RgbaImage {
    let mut out = source.clone();
    for pixel in out.pixels_mut() {
        let brightness =
            (u16::from(pixel[0]) + u16::from(pixel[1]) + u16::from(pixel[2])) / 3;
        if brightness > PAPER_BRIGHTNESS_THRESHOLD {
            // Paper disappears.
            *pixel = image::Rgba([0, 0, 0, 0]);
        } else {
            // Linework: pure black, alpha proportional to darkness. Bold ink
            // saturates to fully opaque, faint gray stays translucent.
            let alpha = ((255 - brightness) * 2).min(255);
            #[allow(clippy::cast_possible_truncation)]
            {
                *pixel = image::Rgba([0, 0, 0, alpha as u8]);
            }
        }
    }
    out
}

/// Multiply-blend `overlay` onto `base` fit-and-centered, used for degraded
/// overlays: white overlay pixels leave the base unchanged, dark pixels
/// darken it.
pub fn multiply_blend(base: &mut RgbaImage, overlay: &RgbaImage) {
    let (x0, y0, w, h) = crate::surface::fit_dimensions(overlay.dimensions(), base.dimensions());
    let resized = image::imageops::resize(overlay, w, h, image::imageops::FilterType::Lanczos3);

    for (ox, oy, src) in resized.enumerate_pixels() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (bx, by) = ((i64::from(ox) + x0) as u32, (i64::from(oy) + y0) as u32);
        if bx >= base.width() || by >= base.height() {
            continue;
        }
        let dst = base.get_pixel_mut(bx, by);
        for c in 0..3 {
            #[allow(clippy::cast_possible_truncation)]
            {
                dst[c] = ((u16::from(dst[c]) * u16::from(src[c])) / 255) as u8;
            }
        }
    }
}

/// Statistics for overlay cache monitoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of extractions performed.
    pub misses: u64,
}

/// Memoizes line-art extraction per background image key.
///
/// Extraction runs at most once per distinct key per canvas session; the
/// cached overlay is invalidated only when the key changes, never mutated.
#[derive(Debug, Default)]
pub struct OverlayCache {
    entries: HashMap<String, LineArtOverlay>,
    stats: CacheStats,
}

impl OverlayCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the overlay for `key`, extracting from `data` on first use.
    pub fn get_or_extract(&mut self, key: &str, data: &[u8]) -> &LineArtOverlay {
        if self.entries.contains_key(key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            self.entries
                .insert(key.to_string(), extract_line_art(data));
        }
        &self.entries[key]
    }

    /// Whether an overlay for `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look at a cached overlay without touching the statistics.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&LineArtOverlay> {
        self.entries.get(key)
    }

    /// Cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with a horizontal 4 px black line.
    fn synthetic_page() -> RgbaImage {
        RgbaImage::from_fn(32, 32, |_, y| {
            if (14..18).contains(&y) {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn test_threshold_separates_paper_from_ink() {
        let page = synthetic_page();
        let overlay = extract_line_art(&codec::encode_png(&page).unwrap());
        let LineArtOverlay::Extracted(mask) = overlay else {
            panic!("valid image must extract");
        };

        // Paper is fully transparent, ink fully opaque black.
        assert_eq!(mask.get_pixel(16, 4).0, [0, 0, 0, 0]);
        assert_eq!(mask.get_pixel(16, 15).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_faint_gray_becomes_translucent_black() {
        let gray = RgbaImage::from_pixel(4, 4, image::Rgba([180, 180, 180, 255]));
        let overlay = extract_line_art(&codec::encode_png(&gray).unwrap());
        let LineArtOverlay::Extracted(mask) = overlay else {
            panic!("valid image must extract");
        };
        // (255 - 180) * 2 = 150: semi-transparent, forced to pure black.
        assert_eq!(mask.get_pixel(1, 1).0, [0, 0, 0, 150]);
    }

    #[test]
    fn test_undecodable_input_degrades_to_original() {
        let overlay = extract_line_art(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(overlay, LineArtOverlay::Original));
        assert!(overlay.encoded_png().unwrap().is_none());
    }

    #[test]
    fn test_cache_extracts_once_per_key() {
        let mut cache = OverlayCache::new();
        let png = codec::encode_png(&synthetic_page()).unwrap();

        assert!(cache.get_or_extract("page-1", &png).is_extracted());
        cache.get_or_extract("page-1", &png);
        cache.get_or_extract("page-1", &png);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);

        cache.get_or_extract("page-2", &png);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_multiply_blend_keeps_color_under_white() {
        let mut base = RgbaImage::from_pixel(8, 8, image::Rgba([200, 100, 50, 255]));
        let overlay = RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]));
        multiply_blend(&mut base, &overlay);
        assert_eq!(base.get_pixel(4, 4).0, [200, 100, 50, 255]);

        let black = RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]));
        multiply_blend(&mut base, &black);
        assert_eq!(base.get_pixel(4, 4).0, [0, 0, 0, 255]);
    }
}
