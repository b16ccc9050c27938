//! Encoding and decoding of surface snapshots.
//!
//! Saved progress records are PNG images wrapped in `data:image/png;base64,`
//! data URIs - a single portable string per record, storable in any
//! key-value string store.

use base64::Engine;
use image::{ImageEncoder, RgbaImage};

use crate::error::{RasterError, RasterResult};

/// Data-URI prefix for encoded surface snapshots.
const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Decode an image from raw bytes (PNG, JPEG, WebP, ...).
///
/// # Errors
///
/// Returns [`RasterError::Decode`] if the bytes are not a decodable image.
pub fn decode_image(data: &[u8]) -> RasterResult<RgbaImage> {
    let img = image::load_from_memory(data)
        .map_err(|e| RasterError::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
///
/// # Errors
///
/// Returns [`RasterError::Encode`] if PNG encoding fails.
pub fn encode_png(image: &RgbaImage) -> RasterResult<Vec<u8>> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    Ok(png_bytes)
}

/// Encode an RGBA buffer as a PNG data-URI string.
///
/// # Errors
///
/// Returns [`RasterError::Encode`] if PNG encoding fails.
pub fn encode_record(image: &RgbaImage) -> RasterResult<String> {
    let png_bytes = encode_png(image)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes);
    Ok(format!("{PNG_DATA_URI_PREFIX}{encoded}"))
}

/// Decode a progress record (a base64 image data URI) back into pixels.
///
/// Accepts any `data:image/*;base64,` URI, not just PNG, so records written
/// by earlier builds of the app remain loadable.
///
/// # Errors
///
/// Returns [`RasterError::Record`] if the string is not a base64 image data
/// URI, or [`RasterError::Decode`] if the payload is not a decodable image.
pub fn decode_record(record: &str) -> RasterResult<RgbaImage> {
    let rest = record
        .strip_prefix("data:")
        .ok_or_else(|| RasterError::Record("not a data URI".to_string()))?;

    let comma = rest
        .find(',')
        .ok_or_else(|| RasterError::Record("missing comma".to_string()))?;
    let (metadata, payload) = rest.split_at(comma);
    let payload = &payload[1..];

    if !metadata.contains(";base64") {
        return Err(RasterError::Record("not base64-encoded".to_string()));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| RasterError::Record(format!("invalid base64: {e}")))?;

    decode_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample_image() -> RgbaImage {
        RgbaImage::from_fn(4, 3, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_record_round_trip() {
        let img = sample_image();
        let record = encode_record(&img).expect("encode");
        assert!(record.starts_with("data:image/png;base64,"));

        let decoded = decode_record(&record).expect("decode");
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0), img.get_pixel(0, 0));
        assert_eq!(decoded.get_pixel(3, 2), img.get_pixel(3, 2));
    }

    #[test]
    fn test_decode_record_rejects_malformed_input() {
        assert!(matches!(
            decode_record("not a data uri"),
            Err(RasterError::Record(_))
        ));
        assert!(matches!(
            decode_record("data:image/png;base64"),
            Err(RasterError::Record(_))
        ));
        assert!(matches!(
            decode_record("data:image/png,rawpayload"),
            Err(RasterError::Record(_))
        ));
        assert!(matches!(
            decode_record("data:image/png;base64,!!!!"),
            Err(RasterError::Record(_))
        ));
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(matches!(
            decode_image(&[0, 1, 2, 3]),
            Err(RasterError::Decode(_))
        ));
    }
}
