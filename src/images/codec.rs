//! Image decoding, encoding, and content hashing.
//!
//! Decoding keeps the detected container format and the EXIF orientation
//! so that processors can honour them. Encoding picks encoder options per
//! output format: JPEG takes the spec quality, PNG can be optimized for size.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use thumbforge_common::{Error, Result};

/// Format used when the source format cannot be determined.
pub const FALLBACK_FORMAT: ImageFormat = ImageFormat::Jpeg;

/// A decoded source image.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    /// Container format detected from the content, if any.
    pub format: Option<ImageFormat>,
    /// Orientation recorded in the file's metadata.
    pub orientation: Orientation,
}

impl DecodedImage {
    /// The format to re-encode in when the output should match the source.
    pub fn format_or_fallback(&self) -> ImageFormat {
        self.format.unwrap_or(FALLBACK_FORMAT)
    }
}

/// Decode image bytes, detecting the format from the content.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::image(format!("Failed to read image data: {}", e)))?;
    let format = reader.format();

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| Error::image(format!("Failed to decode image: {}", e)))?;
    // Missing or unreadable metadata is not fatal; the pixels still decode.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let image = DynamicImage::from_decoder(decoder)
        .map_err(|e| Error::image(format!("Failed to decode image: {}", e)))?;

    Ok(DecodedImage {
        image,
        format,
        orientation,
    })
}

/// Encoder options for one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub format: ImageFormat,
    /// JPEG quality (1-100); `None` leaves the encoder default.
    pub quality: Option<u8>,
    /// Spend more effort for a smaller file where the encoder supports it.
    pub optimize: bool,
}

impl EncodeSettings {
    /// Plain settings for a format.
    pub fn plain(format: ImageFormat) -> Self {
        Self {
            format,
            quality: None,
            optimize: false,
        }
    }

    /// Settings for writing an image in `format` on behalf of a spec.
    ///
    /// JPEG output always carries the quality with optimize on. Other
    /// formats are written plainly unless the spec asks for optimization.
    pub fn for_output(format: ImageFormat, quality: u8, optimize: bool) -> Self {
        if format == ImageFormat::Jpeg {
            Self {
                format,
                quality: Some(quality),
                optimize: true,
            }
        } else {
            Self {
                format,
                quality: None,
                optimize,
            }
        }
    }
}

/// Encode an image with the given settings.
pub fn encode(image: &DynamicImage, settings: &EncodeSettings) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());

    let result = match settings.format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            match settings.quality {
                Some(quality) => {
                    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
                    rgb.write_with_encoder(encoder)
                }
                None => rgb.write_to(&mut buf, ImageFormat::Jpeg),
            }
        }
        ImageFormat::Png if settings.optimize => {
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            image.write_with_encoder(encoder)
        }
        ImageFormat::Png | ImageFormat::Tiff => image.write_to(&mut buf, settings.format),
        // The remaining encoders only take 8-bit samples.
        format => DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut buf, format),
    };

    result.map_err(|e| {
        Error::image(format!(
            "Failed to encode image as {:?}: {}",
            settings.format, e
        ))
    })?;

    Ok(buf.into_inner())
}

/// Look up an output format by file extension.
pub fn format_from_extension(ext: &str) -> Option<ImageFormat> {
    ImageFormat::from_extension(ext.to_lowercase())
}

/// Compute the content hash for image data.
///
/// Returns the first 16 hex characters of the SHA-256 digest.
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

#[cfg(test)]
pub(crate) mod test_images {
    use super::*;

    /// A solid-colour image encoded in `format`.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], format: ImageFormat) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        encode(&DynamicImage::ImageRgb8(img), &EncodeSettings::plain(format)).unwrap()
    }
}
