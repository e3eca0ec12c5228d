//! Style renderer: redraws the modules of a raster with a chosen shape and fill.
//!
//! Finder, timing and alignment patterns are not special-cased; they are drawn
//! with the same shape as data modules.

use image::RgbaImage;

use crate::config::{ModuleStyle, RenderConfig};
use crate::geometry::{is_dark, ModuleGeometry};
use crate::paint::{self, LinearGradient, Paint, Shape};

/// Gap left between neighbouring square modules, in pixels.
pub const MODULE_INSET: f32 = 0.5;

const ROUNDED_RADIUS: f32 = 0.25;
const DOT_RADIUS: f32 = 0.45;
const LIQUID_GROWTH: f32 = 1.15;

/// One grid cell in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub x: f32,
    pub y: f32,
    /// Module pitch.
    pub pitch: f32,
}

impl Cell {
    fn drawn_size(&self) -> f32 {
        self.pitch - MODULE_INSET
    }

    fn center(&self) -> (f32, f32) {
        (self.x + self.pitch / 2.0, self.y + self.pitch / 2.0)
    }
}

type DrawModule = fn(&mut RgbaImage, Cell, &Paint);

fn draw_square(canvas: &mut RgbaImage, cell: Cell, fill: &Paint) {
    let size = cell.drawn_size();
    paint::fill(canvas, &Shape::rect(cell.x, cell.y, size, size), fill);
}

fn draw_rounded(canvas: &mut RgbaImage, cell: Cell, fill: &Paint) {
    let size = cell.drawn_size();
    let shape = Shape::rounded_rect(cell.x, cell.y, size, size, size * ROUNDED_RADIUS);
    paint::fill(canvas, &shape, fill);
}

fn draw_dot(canvas: &mut RgbaImage, cell: Cell, fill: &Paint) {
    let (cx, cy) = cell.center();
    paint::fill(canvas, &Shape::circle(cx, cy, cell.drawn_size() * DOT_RADIUS), fill);
}

fn draw_liquid(canvas: &mut RgbaImage, cell: Cell, fill: &Paint) {
    let (cx, cy) = cell.center();
    let radius = cell.drawn_size() * DOT_RADIUS * LIQUID_GROWTH;
    paint::fill(canvas, &Shape::circle(cx, cy, radius), fill);
}

impl ModuleStyle {
    fn drawer(self) -> DrawModule {
        match self {
            ModuleStyle::Square => draw_square,
            ModuleStyle::Rounded => draw_rounded,
            ModuleStyle::Dot => draw_dot,
            ModuleStyle::Liquid => draw_liquid,
        }
    }
}

/// The dark-module paint for `config`: flat `colorDark`, or one gradient
/// spanning the canvas diagonal shared by every module.
pub fn module_paint(config: &RenderConfig) -> Paint {
    if config.gradient_enabled {
        Paint::Linear(LinearGradient {
            start: (0.0, 0.0),
            end: (config.pixel_size.width as f32, config.pixel_size.height as f32),
            from: config.gradient_start,
            to: config.gradient_end,
        })
    } else {
        Paint::Solid(config.color_dark)
    }
}

/// Classifies the cell at `(row, col)` of `source`.
///
/// Cells of three pixels or more take a majority vote over the 3x3 block
/// around the center; smaller cells use the center pixel alone.
pub fn is_dark_module(source: &RgbaImage, geometry: &ModuleGeometry, row: u32, col: u32) -> bool {
    let (x, y) = geometry.cell_origin(row, col);
    let half = geometry.module_size / 2;
    let (cx, cy) = (x + half, y + half);
    let (width, height) = source.dimensions();
    if cx >= width || cy >= height {
        return false;
    }
    if geometry.module_size < 3 {
        return is_dark(source, cx, cy);
    }
    let dark = (cy - 1..=cy + 1)
        .flat_map(|py| (cx - 1..=cx + 1).map(move |px| (px, py)))
        .filter(|&(px, py)| px < width && py < height && is_dark(source, px, py))
        .count();
    dark >= 5
}

/// Draws every dark module of `source` onto a fresh canvas the size of the
/// source, background filled with `colorLight`.
pub fn render(source: &RgbaImage, geometry: &ModuleGeometry, config: &RenderConfig) -> RgbaImage {
    let (width, height) = source.dimensions();
    let mut canvas = RgbaImage::new(width, height);
    paint::clear(&mut canvas, config.color_light);

    let fill = module_paint(config);
    let draw = config.module_style.drawer();
    let pitch = geometry.module_size as f32;
    for row in 0..geometry.dimension {
        for col in 0..geometry.dimension {
            if !is_dark_module(source, geometry, row, col) {
                continue;
            }
            let (x, y) = geometry.cell_origin(row, col);
            draw(&mut canvas, Cell { x: x as f32, y: y as f32, pitch }, &fill);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Color, EccLevel, PixelSize};
    use crate::encoder::{encode, EncodeOptions, Raster};
    use crate::geometry::extract;

    fn source() -> (Raster, ModuleGeometry) {
        let raster = encode(
            "https://example.com",
            &EncodeOptions {
                pixel_size: PixelSize::square(300),
                margin: 2,
                level: EccLevel::H,
                dark: Color::BLACK,
                light: Color::WHITE,
            },
        )
        .unwrap();
        let geometry = extract(&raster.image, raster.margin_px).unwrap();
        (raster, geometry)
    }

    fn center_pixel(geometry: &ModuleGeometry, row: u32, col: u32) -> (u32, u32) {
        let (x, y) = geometry.cell_origin(row, col);
        (x + geometry.module_size / 2, y + geometry.module_size / 2)
    }

    #[test]
    fn test_every_style_covers_every_dark_module() {
        let (raster, geometry) = source();
        for style in ModuleStyle::ALL {
            let config = RenderConfig { module_style: style, ..RenderConfig::default() };
            let canvas = render(&raster.image, &geometry, &config);
            let background = config.color_light.to_rgba();
            for row in 0..geometry.dimension {
                for col in 0..geometry.dimension {
                    let (px, py) = center_pixel(&geometry, row, col);
                    let filled = *canvas.get_pixel(px, py) != background;
                    assert_eq!(
                        filled,
                        is_dark_module(&raster.image, &geometry, row, col),
                        "{style:?} module ({row}, {col})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_light_area_keeps_background() {
        let (raster, geometry) = source();
        let config = RenderConfig {
            color_light: Color::rgb(250, 240, 230),
            module_style: ModuleStyle::Dot,
            ..RenderConfig::default()
        };
        let canvas = render(&raster.image, &geometry, &config);
        assert_eq!(canvas.get_pixel(0, 0).0, [250, 240, 230, 255]);
        assert_eq!(canvas.get_pixel(299, 299).0, [250, 240, 230, 255]);
    }

    #[test]
    fn test_gradient_is_one_continuous_field() {
        let (raster, geometry) = source();
        let config = RenderConfig {
            gradient_enabled: true,
            module_style: ModuleStyle::Dot,
            ..RenderConfig::default()
        };
        let canvas = render(&raster.image, &geometry, &config);
        let field = module_paint(&config);

        // The three finder patterns are dark at their centers.
        let last = geometry.dimension - 4;
        let finder_centers = [(3, 3), (3, last), (last, 3)];
        let mut seen = Vec::new();
        for (row, col) in finder_centers {
            let (px, py) = center_pixel(&geometry, row, col);
            let expected = field.color_at(px as f32 + 0.5, py as f32 + 0.5).to_rgba();
            assert_eq!(*canvas.get_pixel(px, py), expected, "module ({row}, {col})");
            seen.push(expected);
        }
        assert_ne!(seen[0], seen[1]);
        // Symmetric about the diagonal, so equal distance along the gradient axis.
        assert_eq!(seen[1], seen[2]);
    }

    #[test]
    fn test_square_leaves_anti_moire_gap() {
        let (raster, geometry) = source();
        let canvas = render(&raster.image, &geometry, &RenderConfig::default());
        // Top finder edge: the last pixel column of module 0 is half covered.
        let (x, y) = geometry.cell_origin(0, 0);
        let edge = x + geometry.module_size - 1;
        assert_eq!(canvas.get_pixel(x, y + 1).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(edge, y + 1).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_finder_patterns_are_styled_like_data_modules() {
        // Intentional: the corner module of the top-left finder is drawn as a
        // dot like any other module, leaving its outer corner light.
        let (raster, geometry) = source();
        let config = RenderConfig { module_style: ModuleStyle::Dot, ..RenderConfig::default() };
        let canvas = render(&raster.image, &geometry, &config);
        let (x, y) = geometry.cell_origin(0, 0);
        assert_eq!(canvas.get_pixel(x, y).0, [255, 255, 255, 255]);
        let (cx, cy) = center_pixel(&geometry, 0, 0);
        assert_eq!(canvas.get_pixel(cx, cy).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let (raster, geometry) = source();
        let config = RenderConfig {
            module_style: ModuleStyle::Liquid,
            gradient_enabled: true,
            ..RenderConfig::default()
        };
        let first = render(&raster.image, &geometry, &config);
        assert_eq!(first, render(&raster.image, &geometry, &config));
    }
}
