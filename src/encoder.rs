//! Encoder adapter.
//!
//! Symbol construction (segment modes, Reed-Solomon, masking, version
//! selection) is delegated to the `qrcode` crate. This module only turns the
//! finished module matrix into a pixel raster of the requested size.

use image::{ImageBuffer, RgbaImage};
use log::debug;
use qrcode::QrCode;

use crate::config::{Color, EccLevel, PixelSize};
use crate::error::RenderError;

/// Options forwarded to the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    pub pixel_size: PixelSize,
    /// Quiet zone, in modules.
    pub margin: u32,
    pub level: EccLevel,
    pub dark: Color,
    pub light: Color,
}

/// A finished monochrome raster.
#[derive(Clone, Debug)]
pub struct Raster {
    pub image: RgbaImage,
    /// Offset of the first module row and column, in pixels, as rasterized.
    pub margin_px: u32,
    /// Symbol width in modules as reported by the encoder.
    pub modules: u32,
    /// Pixel pitch of one module.
    pub module_px: u32,
}

impl Raster {
    /// Pixel center of the symbol, which is not the canvas center when the
    /// canvas is taller than wide.
    pub fn symbol_center(&self) -> (u32, u32) {
        let center = self.margin_px + self.modules * self.module_px / 2;
        (center, center)
    }
}

/// Encodes `payload` and rasterizes it at `options.pixel_size`.
///
/// Every module gets the same integer pixel size, the largest that fits
/// `modules + 2 * margin` modules across the canvas width. The symbol is
/// centered horizontally and starts `margin_px` pixels from the top; leftover
/// pixels widen the quiet zone. Canvases are expected to be square, a height
/// below the width is rejected.
///
/// # Errors
///
/// Returns [`RenderError::Encoding`] when the payload exceeds the capacity of
/// the chosen level and [`RenderError::CanvasTooSmall`] when a module would be
/// narrower than one pixel.
///
/// # Example
///
/// ```rust
/// use qrcanvas::config::{Color, EccLevel, PixelSize};
/// use qrcanvas::encoder::{encode, EncodeOptions};
///
/// let raster = encode("Hello, World!", &EncodeOptions {
///     pixel_size: PixelSize::square(200),
///     margin: 2,
///     level: EccLevel::M,
///     dark: Color::BLACK,
///     light: Color::WHITE,
/// }).unwrap();
/// assert_eq!(raster.image.dimensions(), (200, 200));
/// ```
pub fn encode(payload: &str, options: &EncodeOptions) -> Result<Raster, RenderError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), options.level.into())
        .map_err(|source| RenderError::Encoding { level: options.level, source })?;

    let modules = code.width() as u32;
    let PixelSize { width, height } = options.pixel_size;
    let too_small = RenderError::CanvasTooSmall { width, modules, margin: options.margin };
    let span = options.margin.checked_mul(2).and_then(|quiet| quiet.checked_add(modules));
    let Some(span) = span else {
        return Err(too_small);
    };
    let module_size = width / span;
    if module_size == 0 || height < width {
        return Err(too_small);
    }
    let margin_px = (width - modules * module_size) / 2;
    debug!("encoded {modules}x{modules} symbol, {module_size}px modules, {margin_px}px margin");

    let colors = code.to_colors();
    let dark = options.dark.to_rgba();
    let light = options.light.to_rgba();
    let image = ImageBuffer::from_fn(width, height, |x, y| {
        if x < margin_px || y < margin_px {
            return light;
        }
        let col = (x - margin_px) / module_size;
        let row = (y - margin_px) / module_size;
        if col >= modules || row >= modules {
            return light;
        }
        match colors[(row * modules + col) as usize] {
            qrcode::Color::Dark => dark,
            qrcode::Color::Light => light,
        }
    });

    Ok(Raster { image, margin_px, modules, module_px: module_size })
}
