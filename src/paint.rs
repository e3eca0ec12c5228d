//! Minimal anti-aliased fill primitives over an RGBA canvas.
//!
//! Shapes are rasterized per pixel: coverage is the fraction of a 4x4 grid of
//! sub-samples that falls inside the shape, and the paint color is evaluated
//! at the pixel center. All arithmetic is deterministic, so identical inputs
//! produce identical pixels.

use image::RgbaImage;

use crate::config::Color;

const SUBSAMPLES: u32 = 4;

/// A linear gradient between two points in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub from: Color,
    pub to: Color,
}

impl LinearGradient {
    /// Color of the gradient field at `(x, y)`; positions outside the axis
    /// clamp to the end stops.
    pub fn color_at(&self, x: f32, y: f32) -> Color {
        let (dx, dy) = (self.end.0 - self.start.0, self.end.1 - self.start.1);
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            return self.from;
        }
        let t = ((x - self.start.0) * dx + (y - self.start.1) * dy) / len2;
        self.from.lerp(self.to, t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear(LinearGradient),
}

impl Paint {
    pub fn color_at(&self, x: f32, y: f32) -> Color {
        match self {
            Paint::Solid(color) => *color,
            Paint::Linear(gradient) => gradient.color_at(x, y),
        }
    }
}

/// Fillable shapes. A plain rectangle is a rounded rectangle with radius 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    RoundedRect { x: f32, y: f32, w: f32, h: f32, r: f32 },
    Circle { cx: f32, cy: f32, r: f32 },
}

impl Shape {
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        Shape::RoundedRect { x, y, w, h, r: 0.0 }
    }

    pub fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Self {
        Shape::RoundedRect { x, y, w, h, r: r.clamp(0.0, w.min(h) / 2.0) }
    }

    pub fn circle(cx: f32, cy: f32, r: f32) -> Self {
        Shape::Circle { cx, cy, r }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        match *self {
            Shape::RoundedRect { x, y, w, h, r } => {
                if px < x || py < y || px > x + w || py > y + h {
                    return false;
                }
                let r = r.min(w.min(h) / 2.0).max(0.0);
                // Distance to the rect shrunk by r; zero outside the corners.
                let nx = px.clamp(x + r, x + w - r);
                let ny = py.clamp(y + r, y + h - r);
                (px - nx) * (px - nx) + (py - ny) * (py - ny) <= r * r
            }
            Shape::Circle { cx, cy, r } => (px - cx) * (px - cx) + (py - cy) * (py - cy) <= r * r,
        }
    }

    /// Bounding box as `(x0, y0, x1, y1)`.
    fn bounds(&self) -> (f32, f32, f32, f32) {
        match *self {
            Shape::RoundedRect { x, y, w, h, .. } => (x, y, x + w, y + h),
            Shape::Circle { cx, cy, r } => (cx - r, cy - r, cx + r, cy + r),
        }
    }

    /// Fraction of the pixel at `(px, py)` covered by the shape.
    fn coverage(&self, px: u32, py: u32) -> f32 {
        let step = 1.0 / SUBSAMPLES as f32;
        let mut inside = 0;
        for sy in 0..SUBSAMPLES {
            for sx in 0..SUBSAMPLES {
                let x = px as f32 + (sx as f32 + 0.5) * step;
                let y = py as f32 + (sy as f32 + 0.5) * step;
                if self.contains(x, y) {
                    inside += 1;
                }
            }
        }
        inside as f32 / (SUBSAMPLES * SUBSAMPLES) as f32
    }
}

/// Fills every pixel of `canvas` with `color`.
pub fn clear(canvas: &mut RgbaImage, color: Color) {
    let rgba = color.to_rgba();
    for pixel in canvas.pixels_mut() {
        *pixel = rgba;
    }
}

/// Blends `shape` filled with `paint` over `canvas`.
pub fn fill(canvas: &mut RgbaImage, shape: &Shape, paint: &Paint) {
    let (x0, y0, x1, y1) = shape.bounds();
    let (width, height) = canvas.dimensions();
    let px0 = x0.floor().max(0.0) as u32;
    let py0 = y0.floor().max(0.0) as u32;
    let px1 = (x1.ceil().max(0.0) as u32).min(width);
    let py1 = (y1.ceil().max(0.0) as u32).min(height);

    for py in py0..py1 {
        for px in px0..px1 {
            let coverage = shape.coverage(px, py);
            if coverage == 0.0 {
                continue;
            }
            let color = paint.color_at(px as f32 + 0.5, py as f32 + 0.5);
            blend(canvas, px, py, color, coverage);
        }
    }
}

/// Source-over blend of `color` at `coverage` onto one pixel.
pub fn blend(canvas: &mut RgbaImage, px: u32, py: u32, color: Color, coverage: f32) {
    let alpha = coverage * color.a as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(px, py);
    let src = [color.r, color.g, color.b];
    for (channel, value) in dst.0.iter_mut().take(3).zip(src) {
        *channel = (value as f32 * alpha + *channel as f32 * (1.0 - alpha)).round() as u8;
    }
    dst.0[3] = (255.0 * alpha + dst.0[3] as f32 * (1.0 - alpha)).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(side: u32) -> RgbaImage {
        let mut canvas = RgbaImage::new(side, side);
        clear(&mut canvas, Color::WHITE);
        canvas
    }

    #[test]
    fn test_rect_fill_is_exact_on_pixel_grid() {
        let mut canvas = blank(10);
        fill(&mut canvas, &Shape::rect(2.0, 2.0, 3.0, 3.0), &Paint::Solid(Color::BLACK));
        assert_eq!(canvas.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(4, 4).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_half_pixel_edge_is_blended() {
        let mut canvas = blank(4);
        fill(&mut canvas, &Shape::rect(0.0, 0.0, 1.5, 1.0), &Paint::Solid(Color::BLACK));
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(1, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_rounded_corner_is_cut() {
        let shape = Shape::rounded_rect(0.0, 0.0, 10.0, 10.0, 4.0);
        assert!(!shape.contains(0.2, 0.2));
        assert!(shape.contains(5.0, 0.2));
        assert!(shape.contains(4.0, 4.0));
        assert!(!shape.contains(10.5, 5.0));
    }

    #[test]
    fn test_circle_coverage() {
        let mut canvas = blank(9);
        fill(&mut canvas, &Shape::circle(4.5, 4.5, 3.0), &Paint::Solid(Color::BLACK));
        assert_eq!(canvas.get_pixel(4, 4).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(8, 4).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_gradient_endpoints() {
        let gradient = LinearGradient {
            start: (0.0, 0.0),
            end: (100.0, 100.0),
            from: Color::BLACK,
            to: Color::WHITE,
        };
        assert_eq!(gradient.color_at(0.0, 0.0), Color::BLACK);
        assert_eq!(gradient.color_at(100.0, 100.0), Color::WHITE);
        assert_eq!(gradient.color_at(100.0, 0.0), Color::rgb(128, 128, 128));
        assert_eq!(gradient.color_at(-50.0, -50.0), Color::BLACK);
    }

    #[test]
    fn test_transparent_paint_is_noop() {
        let mut canvas = blank(3);
        fill(&mut canvas, &Shape::rect(0.0, 0.0, 3.0, 3.0), &Paint::Solid(Color::TRANSPARENT));
        assert_eq!(canvas, blank(3));
    }
}
