//! Image processors that make up a spec.
//!
//! Processors are declared in the spec module as tagged tables:
//!
//! ```toml
//! processors = [
//!   { type = "transpose", method = "auto" },
//!   { type = "resize", width = 100, height = 100, crop = true },
//!   { type = "format", format = "png" },
//! ]
//! ```
//!
//! They run in declaration order, each taking the previous one's output.

use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thumbforge_common::CropAnchor;

use crate::images::codec::format_from_extension;

/// Per-record inputs to processing.
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext {
    pub crop_horz: CropAnchor,
    pub crop_vert: CropAnchor,
    /// Orientation recorded in the source file.
    pub orientation: Orientation,
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self {
            crop_horz: CropAnchor::Center,
            crop_vert: CropAnchor::Center,
            orientation: Orientation::NoTransforms,
        }
    }
}

/// How a transpose processor reorients the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransposeMethod {
    /// Undo the orientation recorded in the file's EXIF data.
    #[default]
    Auto,
    FlipHorizontal,
    FlipVertical,
    #[serde(rename = "rotate_90")]
    Rotate90,
    #[serde(rename = "rotate_180")]
    Rotate180,
    #[serde(rename = "rotate_270")]
    Rotate270,
}

fn one() -> f32 {
    1.0
}

fn default_background() -> String {
    "#FFFFFF".to_string()
}

fn default_opacity() -> f32 {
    0.6
}

/// A single image operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Processor {
    /// Scale to fit, or scale and crop to fill, a target box.
    Resize {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        crop: bool,
        #[serde(default)]
        upscale: bool,
    },
    /// Enhancement factors; 1.0 leaves a property unchanged.
    Adjustment {
        #[serde(default = "one")]
        color: f32,
        #[serde(default = "one")]
        brightness: f32,
        #[serde(default = "one")]
        contrast: f32,
        #[serde(default = "one")]
        sharpness: f32,
    },
    /// Append a fading mirror image below the picture.
    Reflection {
        #[serde(default = "default_background")]
        background_color: String,
        /// Height of the reflection as a fraction of the image height.
        #[serde(default)]
        size: f32,
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
    Transpose {
        #[serde(default)]
        method: TransposeMethod,
    },
    /// Select the output format by file extension.
    Format { format: String },
}

impl Processor {
    /// Check parameters, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Resize {
                width,
                height,
                crop,
                ..
            } => {
                if width.is_none() && height.is_none() {
                    return Err("resize needs a width or a height".to_string());
                }
                if *width == Some(0) || *height == Some(0) {
                    return Err("resize dimensions must be positive".to_string());
                }
                if *crop && (width.is_none() || height.is_none()) {
                    return Err("cropping resize needs both width and height".to_string());
                }
                Ok(())
            }
            Self::Adjustment {
                color,
                brightness,
                contrast,
                sharpness,
            } => {
                for (name, factor) in [
                    ("color", color),
                    ("brightness", brightness),
                    ("contrast", contrast),
                    ("sharpness", sharpness),
                ] {
                    if !factor.is_finite() || *factor < 0.0 {
                        return Err(format!("adjustment {} must be >= 0, got {}", name, factor));
                    }
                }
                Ok(())
            }
            Self::Reflection {
                background_color,
                size,
                opacity,
            } => {
                if parse_hex_color(background_color).is_none() {
                    return Err(format!("invalid background color: {}", background_color));
                }
                if !(0.0..=1.0).contains(size) {
                    return Err(format!("reflection size must be within 0..=1, got {}", size));
                }
                if !(0.0..=1.0).contains(opacity) {
                    return Err(format!(
                        "reflection opacity must be within 0..=1, got {}",
                        opacity
                    ));
                }
                Ok(())
            }
            Self::Transpose { .. } => Ok(()),
            Self::Format { format } => match format_from_extension(format) {
                Some(_) => Ok(()),
                None => Err(format!("unknown output format: {}", format)),
            },
        }
    }

    /// The output format selected by a format processor.
    pub fn output_format(&self) -> Option<(ImageFormat, String)> {
        match self {
            Self::Format { format } => {
                format_from_extension(format).map(|f| (f, format.to_lowercase()))
            }
            _ => None,
        }
    }

    /// Apply the processor.
    pub fn apply(&self, img: DynamicImage, ctx: &ProcessContext) -> DynamicImage {
        match self {
            Self::Resize {
                width,
                height,
                crop,
                upscale,
            } => resize(img, *width, *height, *crop, *upscale, ctx),
            Self::Adjustment {
                color,
                brightness,
                contrast,
                sharpness,
            } => adjust(img, *color, *brightness, *contrast, *sharpness),
            Self::Reflection {
                background_color,
                size,
                opacity,
            } => {
                let background = parse_hex_color(background_color).unwrap_or([255, 255, 255]);
                reflect(img, background, *size, *opacity)
            }
            Self::Transpose { method } => transpose(img, *method, ctx.orientation),
            Self::Format { .. } => img,
        }
    }
}

fn resize(
    img: DynamicImage,
    width: Option<u32>,
    height: Option<u32>,
    crop: bool,
    upscale: bool,
    ctx: &ProcessContext,
) -> DynamicImage {
    let (cur_w, cur_h) = img.dimensions();
    if cur_w == 0 || cur_h == 0 {
        return img;
    }

    if crop {
        let (Some(w), Some(h)) = (width, height) else {
            return img;
        };
        let ratio = f64::max(w as f64 / cur_w as f64, h as f64 / cur_h as f64);
        let resize_w = ((cur_w as f64 * ratio).round() as u32).max(w);
        let resize_h = ((cur_h as f64 * ratio).round() as u32).max(h);
        let x = ctx.crop_horz.offset(resize_w, w);
        let y = ctx.crop_vert.offset(resize_h, h);
        return img
            .resize_exact(resize_w, resize_h, FilterType::Lanczos3)
            .crop_imm(x, y, w, h);
    }

    let ratio = match (width, height) {
        (Some(w), Some(h)) => f64::min(w as f64 / cur_w as f64, h as f64 / cur_h as f64),
        (Some(w), None) => w as f64 / cur_w as f64,
        (None, Some(h)) => h as f64 / cur_h as f64,
        (None, None) => return img,
    };
    let new_w = ((cur_w as f64 * ratio).round() as u32).max(1);
    let new_h = ((cur_h as f64 * ratio).round() as u32).max(1);
    if (new_w > cur_w || new_h > cur_h) && !upscale {
        return img;
    }
    img.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Blend `img` away from (factor > 1) or towards (factor < 1) `degenerate`.
fn blend(img: &RgbaImage, degenerate: &RgbaImage, factor: f32) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let src = img.get_pixel(x, y);
        let deg = degenerate.get_pixel(x, y);
        let mut out = [0u8; 4];
        for c in 0..3 {
            let v = deg[c] as f32 + (src[c] as f32 - deg[c] as f32) * factor;
            out[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        out[3] = src[3];
        Rgba(out)
    })
}

fn luma(p: &Rgba<u8>) -> u8 {
    ((299 * p[0] as u32 + 587 * p[1] as u32 + 114 * p[2] as u32) / 1000) as u8
}

fn adjust(
    img: DynamicImage,
    color: f32,
    brightness: f32,
    contrast: f32,
    sharpness: f32,
) -> DynamicImage {
    if [color, brightness, contrast, sharpness]
        .iter()
        .all(|f| (*f - 1.0).abs() < f32::EPSILON)
    {
        return img;
    }

    let mut rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();

    if (color - 1.0).abs() >= f32::EPSILON {
        let grey = RgbaImage::from_fn(w, h, |x, y| {
            let p = rgba.get_pixel(x, y);
            let l = luma(p);
            Rgba([l, l, l, p[3]])
        });
        rgba = blend(&rgba, &grey, color);
    }
    if (brightness - 1.0).abs() >= f32::EPSILON {
        let black = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]));
        rgba = blend(&rgba, &black, brightness);
    }
    if (contrast - 1.0).abs() >= f32::EPSILON {
        let pixels = (w as u64 * h as u64).max(1);
        let total: u64 = rgba.pixels().map(|p| luma(p) as u64).sum();
        let mean = (total / pixels) as u8;
        let flat = RgbaImage::from_pixel(w, h, Rgba([mean, mean, mean, 255]));
        rgba = blend(&rgba, &flat, contrast);
    }
    if (sharpness - 1.0).abs() >= f32::EPSILON {
        let smooth = imageops::blur(&rgba, 1.0);
        rgba = blend(&rgba, &smooth, sharpness);
    }

    DynamicImage::ImageRgba8(rgba)
}

fn reflect(img: DynamicImage, background: [u8; 3], size: f32, opacity: f32) -> DynamicImage {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let reflection_h = (h as f32 * size) as u32;

    let bg = image::Rgb(background);
    let mut out = image::RgbImage::from_pixel(w, h + reflection_h, bg);
    imageops::replace(&mut out, &rgb, 0, 0);
    if reflection_h == 0 || h == 0 {
        return DynamicImage::ImageRgb8(out);
    }

    // The mask runs from `start` (mostly reflection) to 255 (all background)
    // over the first `steps` of 255 levels spread across the image height.
    let start = 255.0 - 255.0 * opacity;
    let steps = (255.0 * size).max(1.0);
    let increment = (255.0 - start) / steps;

    for y in 0..reflection_h {
        let level = y as f32 * 255.0 / h as f32;
        let mask = if level < steps {
            (level * increment + start).min(255.0)
        } else {
            255.0
        } / 255.0;
        let src_y = h - 1 - y;
        for x in 0..w {
            let p = rgb.get_pixel(x, src_y);
            let mut px = [0u8; 3];
            for c in 0..3 {
                let v = background[c] as f32 * mask + p[c] as f32 * (1.0 - mask);
                px[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x, h + y, image::Rgb(px));
        }
    }

    DynamicImage::ImageRgb8(out)
}

fn transpose(img: DynamicImage, method: TransposeMethod, orientation: Orientation) -> DynamicImage {
    match method {
        TransposeMethod::Auto => {
            let mut img = img;
            img.apply_orientation(orientation);
            img
        }
        TransposeMethod::FlipHorizontal => img.fliph(),
        TransposeMethod::FlipVertical => img.flipv(),
        TransposeMethod::Rotate90 => img.rotate90(),
        TransposeMethod::Rotate180 => img.rotate180(),
        TransposeMethod::Rotate270 => img.rotate270(),
    }
}

/// Parse `#RGB` or `#RRGGBB`.
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b])
        }
        _ => None,
    }
}
