//! Logo compositing.
//!
//! The logo sits on a rounded backing patch centered on the canvas. Both are
//! drawn over the styled modules, so the occluded area must stay within what
//! the chosen error correction level can recover; that is left to the caller.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::debug;

use crate::config::{Color, LogoConfig};
use crate::error::RenderError;
use crate::paint::{self, Paint, Shape};

/// Decodes the logo bytes and scales them to exactly `width x height`.
pub fn decode_logo(logo: &LogoConfig) -> Result<RgbaImage, RenderError> {
    let decoded = image::load_from_memory(&logo.image_bytes).map_err(RenderError::LogoLoad)?;
    let (width, height) = (logo.width.max(1), logo.height.max(1));
    if decoded.width() == width && decoded.height() == height {
        return Ok(decoded.to_rgba8());
    }
    Ok(imageops::resize(&decoded.to_rgba8(), width, height, FilterType::Triangle))
}

/// Top-left corner of a `w x h` box centered on `center`; may be negative.
fn centered(center: (u32, u32), w: u32, h: u32) -> (i64, i64) {
    (center.0 as i64 - (w / 2) as i64, center.1 as i64 - (h / 2) as i64)
}

fn canvas_center(canvas: &RgbaImage) -> (u32, u32) {
    (canvas.width() / 2, canvas.height() / 2)
}

/// Draws the backing patch around `center`, unless its color is `transparent`.
pub fn draw_backing(canvas: &mut RgbaImage, logo: &LogoConfig, center: (u32, u32)) {
    if logo.background_color.is_transparent() {
        return;
    }
    let (x, y) = centered(center, logo.width, logo.height);
    let margin = logo.margin as f32;
    let patch = Shape::rounded_rect(
        x as f32 - margin,
        y as f32 - margin,
        logo.width as f32 + 2.0 * margin,
        logo.height as f32 + 2.0 * margin,
        logo.corner_radius as f32,
    );
    paint::fill(canvas, &patch, &Paint::Solid(logo.background_color));
}

/// Composites `logo` onto the center of `canvas`.
///
/// # Errors
///
/// Returns [`RenderError::LogoLoad`] when the image bytes cannot be decoded,
/// in which case the canvas is left untouched.
pub fn composite(canvas: &mut RgbaImage, logo: &LogoConfig) -> Result<(), RenderError> {
    let center = canvas_center(canvas);
    composite_at(canvas, logo, center)
}

/// Composites `logo` centered on the pixel `center`, usually the symbol
/// center reported by the encoder.
///
/// # Errors
///
/// Same as [`composite`].
pub fn composite_at(
    canvas: &mut RgbaImage,
    logo: &LogoConfig,
    center: (u32, u32),
) -> Result<(), RenderError> {
    let image = decode_logo(logo)?;
    draw_backing(canvas, logo, center);
    let (x, y) = centered(center, image.width(), image.height());
    imageops::overlay(canvas, &image, x, y);
    debug!("composited {}x{} logo at ({x}, {y})", image.width(), image.height());
    Ok(())
}

/// Convenience for tests and hosts: a solid-colored PNG of the given size.
pub fn solid_png(width: u32, height: u32, color: Color) -> Result<Vec<u8>, RenderError> {
    let image = RgbaImage::from_pixel(width, height, color.to_rgba());
    Ok(crate::helper::encode_png(&image)?)
}
