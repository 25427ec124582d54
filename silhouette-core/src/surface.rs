//! Drawing surfaces
//!
//! Containers render through the [`Surface`] trait. Two backends are
//! provided: [`RecordingSurface`] keeps a command log (handy for tests and
//! for replaying into another backend) and [`RasterSurface`] rasterizes into
//! an RGBA image that can be written out as PNG.

use crate::color::Hsla;
use image::{Rgba, RgbaImage};
use std::path::Path;

/// The primitives a container needs from a drawing backend
pub trait Surface {
    /// Clear `width` x `height` pixels starting at the origin
    fn clear_region(&mut self, width: u32, height: u32);

    /// Draw an image at the origin with a global alpha
    fn draw_image(&mut self, image: &RgbaImage, alpha: f64);

    /// Stroke thickness for following segment strokes
    fn set_line_width(&mut self, width: f64);

    /// Stroke the vertical run `x, y_top..=y_bottom`
    fn stroke_vertical_segment(&mut self, x: i32, y_top: i32, y_bottom: i32, color: Hsla);
}

/// A recorded drawing command
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear { width: u32, height: u32 },
    Image { width: u32, height: u32, alpha: f64 },
    LineWidth(f64),
    Stroke {
        x: i32,
        y_top: i32,
        y_bottom: i32,
        color: Hsla,
    },
}

/// Surface that records every call
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the stroke commands, in order
    pub fn strokes(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Surface for RecordingSurface {
    fn clear_region(&mut self, width: u32, height: u32) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn draw_image(&mut self, image: &RgbaImage, alpha: f64) {
        self.commands.push(DrawCommand::Image {
            width: image.width(),
            height: image.height(),
            alpha,
        });
    }

    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn stroke_vertical_segment(&mut self, x: i32, y_top: i32, y_bottom: i32, color: Hsla) {
        self.commands.push(DrawCommand::Stroke {
            x,
            y_top,
            y_bottom,
            color,
        });
    }
}

/// Software rasterizer backed by an RGBA image
pub struct RasterSurface {
    image: RgbaImage,
    line_width: f64,
}

impl RasterSurface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            line_width: 1.0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Write the current contents as a PNG file
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)
    }

    fn blend(&mut self, x: i64, y: i64, src: [u8; 4], alpha: f64) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        *dst = source_over(*dst, src, alpha);
    }
}

impl Surface for RasterSurface {
    fn clear_region(&mut self, width: u32, height: u32) {
        let width = width.min(self.image.width());
        let height = height.min(self.image.height());
        for y in 0..height {
            for x in 0..width {
                self.image.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, alpha: f64) {
        for (x, y, pixel) in image.enumerate_pixels() {
            self.blend(x as i64, y as i64, pixel.0, alpha);
        }
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = if width.is_finite() && width > 0.0 {
            width
        } else {
            1.0
        };
    }

    fn stroke_vertical_segment(&mut self, x: i32, y_top: i32, y_bottom: i32, color: Hsla) {
        let rgba = color.to_rgba8();
        // Columns whose centers lie within half the (at least one pixel) width
        let reach = ((self.line_width - 1.0) / 2.0).max(0.0).floor() as i64;
        let (top, bottom) = (y_top.min(y_bottom) as i64, y_top.max(y_bottom) as i64);
        for column in (x as i64 - reach)..=(x as i64 + reach) {
            for row in top..=bottom {
                self.blend(column, row, rgba, 1.0);
            }
        }
    }
}

fn source_over(dst: Rgba<u8>, src: [u8; 4], alpha: f64) -> Rgba<u8> {
    let src_a = src[3] as f64 / 255.0 * alpha.clamp(0.0, 1.0);
    let dst_a = dst.0[3] as f64 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let s = src[i] as f64 / 255.0;
        let d = dst.0[i] as f64 / 255.0;
        let c = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        out[i] = (c * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}
