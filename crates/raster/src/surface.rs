//! Off-screen bitmap surface. Created, painted and handed off inside one
//! render call; the capture is all-or-nothing and nothing shared survives a
//! failed call.

use crate::measure::{text_width, Layout, Prim};
use crate::{Glyphs, RasterError, Result};
use ab_glyph::PxScale;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

/// Minimal raster contract the slicing algorithm depends on. Lets pagination
/// be exercised against a mock raster with a known height.
pub trait Raster {
    fn width_px(&self) -> u32;
    fn height_px(&self) -> u32;
}

impl Raster for RgbaImage {
    fn width_px(&self) -> u32 {
        self.width()
    }

    fn height_px(&self) -> u32 {
        self.height()
    }
}

/// One-shot paint surface over an owned image buffer.
pub struct BitmapSurface {
    img: RgbaImage,
}

fn rgba(color: greffe_render::Color) -> Rgba<u8> {
    let [r, g, b] = color.0;
    Rgba([r, g, b, 255])
}

impl BitmapSurface {
    /// Allocates a white surface sized to the measured layout. Zero-height
    /// content still allocates one pixel row so the capture stays valid.
    pub fn new(layout: &Layout) -> Result<Self> {
        if layout.width_px == 0 {
            return Err(RasterError::Capture("zero-width layout".into()));
        }
        let h = layout.content_height_px.max(1);
        Ok(Self {
            img: RgbaImage::from_pixel(layout.width_px, h, Rgba([255, 255, 255, 255])),
        })
    }

    /// Paints every primitive and consumes the surface into its capture.
    pub fn capture(mut self, layout: &Layout, glyphs: &Glyphs) -> RgbaImage {
        for prim in &layout.prims {
            match prim {
                Prim::Rect { x, y, w, h, color } => {
                    self.fill(*x, *y, *w, *h, rgba(*color));
                }
                Prim::HLine { x, y, w, color } => {
                    let h = (layout.width_px as f32 / 800.0).max(1.0);
                    self.fill(*x, *y, *w, h, rgba(*color));
                }
                Prim::Text {
                    x,
                    y,
                    size,
                    color,
                    text,
                    bold,
                } => self.text(glyphs, *x, *y, *size, rgba(*color), text, *bold),
            }
        }
        self.img
    }

    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let (iw, ih) = (self.img.width() as i32, self.img.height() as i32);
        let x = (x.round() as i32).clamp(0, iw);
        let y = (y.round() as i32).clamp(0, ih);
        let w = (w.round() as i32).min(iw - x).max(0) as u32;
        let h = (h.round() as i32).min(ih - y).max(0) as u32;
        if w > 0 && h > 0 {
            draw_filled_rect_mut(&mut self.img, Rect::at(x, y).of_size(w, h), color);
        }
    }

    fn text(
        &mut self,
        glyphs: &Glyphs,
        x: f32,
        y: f32,
        size: f32,
        color: Rgba<u8>,
        text: &str,
        bold: bool,
    ) {
        match glyphs {
            Glyphs::Outline(font) => {
                let scale = PxScale::from(size);
                draw_text_mut(&mut self.img, color, x.round() as i32, y.round() as i32, scale, font, text);
                if bold {
                    // Faux bold: repaint shifted one device pixel.
                    draw_text_mut(
                        &mut self.img,
                        color,
                        x.round() as i32 + 1,
                        y.round() as i32,
                        scale,
                        font,
                        text,
                    );
                }
            }
            Glyphs::Bars => {
                // Proportional bar occupying the x-height band.
                let w = text_width(text, size);
                self.fill(x, y + size * 0.3, w, size * 0.5, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greffe_render::Color;

    fn layout(prims: Vec<Prim>, h: u32) -> Layout {
        Layout {
            prims,
            width_px: 200,
            content_height_px: h,
        }
    }

    #[test]
    fn test_capture_dimensions_match_layout() {
        let img = BitmapSurface::new(&layout(Vec::new(), 500))
            .unwrap()
            .capture(&layout(Vec::new(), 500), &Glyphs::Bars);
        assert_eq!((img.width(), img.height()), (200, 500));
    }

    #[test]
    fn test_zero_height_layout_captures_one_row() {
        let l = layout(Vec::new(), 0);
        let img = BitmapSurface::new(&l).unwrap().capture(&l, &Glyphs::Bars);
        assert_eq!(img.height(), 1);
    }

    #[test]
    fn test_out_of_bounds_rect_is_clipped_not_panicking() {
        let l = layout(
            vec![Prim::Rect { x: 150.0, y: 90.0, w: 500.0, h: 500.0, color: Color::INK }],
            100,
        );
        let img = BitmapSurface::new(&l).unwrap().capture(&l, &Glyphs::Bars);
        assert_eq!(img.get_pixel(160, 95).0, [17, 24, 39, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_bar_text_paints_pixels() {
        let l = layout(
            vec![Prim::Text {
                x: 10.0,
                y: 10.0,
                size: 20.0,
                color: Color::INK,
                text: "GREFFE".into(),
                bold: false,
            }],
            100,
        );
        let img = BitmapSurface::new(&l).unwrap().capture(&l, &Glyphs::Bars);
        let painted = img.pixels().filter(|p| p.0 != [255, 255, 255, 255]).count();
        assert!(painted > 0);
    }
}
