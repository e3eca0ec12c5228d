//! Module geometry extraction.
//!
//! The encoder hands back pixels, not its module table, so the grid is
//! recovered by sampling: the first dark run on the symbol's top row is the
//! top edge of the top-left finder pattern, which is exactly seven modules
//! wide.

use image::RgbaImage;
use log::{debug, warn};

use crate::error::RenderError;

/// Red channel values below this count as dark.
pub const DARK_THRESHOLD: u8 = 128;

/// Width of a finder pattern, in modules.
const FINDER_MODULES: u32 = 7;

/// Below this module size, detection is unreliable.
pub const MIN_RELIABLE_MODULE_PX: u32 = 2;

/// The recovered module grid of a raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModuleGeometry {
    /// Module edge length, in pixels.
    pub module_size: u32,
    /// Grid dimension, in modules.
    pub dimension: u32,
    /// Offset of the first module row and column, in pixels.
    pub margin: u32,
}

impl ModuleGeometry {
    /// Top-left pixel of the cell at `(row, col)`.
    pub fn cell_origin(&self, row: u32, col: u32) -> (u32, u32) {
        (self.margin + col * self.module_size, self.margin + row * self.module_size)
    }

    /// Center of the cell at `(row, col)`, in canvas coordinates.
    pub fn cell_center(&self, row: u32, col: u32) -> (f32, f32) {
        let (x, y) = self.cell_origin(row, col);
        let half = self.module_size as f32 / 2.0;
        (x as f32 + half, y as f32 + half)
    }

    /// Pixel extent covered by the grid, margin included on the leading side.
    pub fn extent(&self) -> u32 {
        self.margin + self.dimension * self.module_size
    }
}

pub fn is_dark(image: &RgbaImage, x: u32, y: u32) -> bool {
    image.get_pixel(x, y).0[0] < DARK_THRESHOLD
}

/// Recovers the module grid from `image`, given the pixel margin it was
/// rasterized with.
///
/// # Errors
///
/// Returns [`RenderError::GeometryExtraction`] when the margin row lies
/// outside the image, contains no dark pixel, or its first dark run is too
/// short to be a finder edge.
pub fn extract(image: &RgbaImage, margin_px: u32) -> Result<ModuleGeometry, RenderError> {
    let (width, height) = image.dimensions();
    if margin_px >= height || 2 * margin_px >= width {
        return Err(RenderError::GeometryExtraction(format!(
            "margin of {margin_px}px leaves no symbol area in a {width}x{height} raster"
        )));
    }

    let start = (0..width)
        .find(|&x| is_dark(image, x, margin_px))
        .ok_or_else(|| {
            RenderError::GeometryExtraction(format!("row {margin_px} has no dark pixel"))
        })?;
    let run = (start..width).take_while(|&x| is_dark(image, x, margin_px)).count() as u32;

    let module_size = run / FINDER_MODULES;
    if module_size == 0 {
        return Err(RenderError::GeometryExtraction(format!(
            "dark run of {run}px at ({start}, {margin_px}) is shorter than a finder edge"
        )));
    }
    if run % FINDER_MODULES != 0 {
        warn!("finder edge of {run}px is not a multiple of {FINDER_MODULES}, modules may drift");
    }
    if module_size < MIN_RELIABLE_MODULE_PX {
        warn!(
            "{module_size}px modules are below the reliable detection floor of \
             {MIN_RELIABLE_MODULE_PX}px"
        );
    }

    let dimension = (width - 2 * margin_px) / module_size;
    debug!("extracted {dimension}x{dimension} grid of {module_size}px modules at {margin_px}px");
    Ok(ModuleGeometry { module_size, dimension, margin: margin_px })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Color, EccLevel, PixelSize};
    use crate::encoder::{encode, EncodeOptions};

    fn encode_raster(payload: &str, side: u32, margin: u32) -> crate::encoder::Raster {
        encode(
            payload,
            &EncodeOptions {
                pixel_size: PixelSize::square(side),
                margin,
                level: EccLevel::H,
                dark: Color::BLACK,
                light: Color::WHITE,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_geometry_round_trip() {
        let cases = [
            ("https://example.com", 300, 2),
            ("hello", 200, 4),
            ("a longer payload for a bigger symbol", 450, 1),
        ];
        for (payload, side, margin) in cases {
            let raster = encode_raster(payload, side, margin);
            let geometry = extract(&raster.image, raster.margin_px).unwrap();
            let expected_size = side / (raster.modules + 2 * margin);
            assert_eq!(geometry.dimension, raster.modules, "dimension for {payload}");
            assert_eq!(geometry.module_size, expected_size, "module size for {payload}");
            let far_edge = side - raster.margin_px;
            let extent = geometry.extent();
            assert!(extent.abs_diff(far_edge) <= 1, "extent {extent} vs {far_edge}");
        }
    }

    #[test]
    fn test_all_light_raster_fails() {
        let image = RgbaImage::from_pixel(100, 100, image::Rgba([255, 255, 255, 255]));
        let err = extract(&image, 10).unwrap_err();
        assert!(matches!(err, RenderError::GeometryExtraction(_)));
    }

    #[test]
    fn test_margin_outside_image_fails() {
        let image = RgbaImage::from_pixel(20, 20, image::Rgba([0, 0, 0, 255]));
        assert!(extract(&image, 10).is_err());
        assert!(extract(&image, 25).is_err());
    }

    #[test]
    fn test_short_run_fails() {
        let mut image = RgbaImage::from_pixel(50, 50, image::Rgba([255, 255, 255, 255]));
        for x in 5..9 {
            image.put_pixel(x, 5, image::Rgba([0, 0, 0, 255]));
        }
        assert!(extract(&image, 5).is_err());
    }

    #[test]
    fn test_cell_addressing() {
        let geometry = ModuleGeometry { module_size: 8, dimension: 29, margin: 18 };
        assert_eq!(geometry.cell_origin(0, 0), (18, 18));
        assert_eq!(geometry.cell_origin(2, 3), (42, 34));
        assert_eq!(geometry.cell_center(0, 1), (30.0, 22.0));
        assert_eq!(geometry.extent(), 18 + 29 * 8);
    }
}
