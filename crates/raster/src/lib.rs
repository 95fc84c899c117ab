//! Rasterize-and-paginate engine. Materializes a document tree onto an
//! off-screen bitmap at a fixed physical page width, then slices the capture
//! into discrete fixed-height pages. The slicing algorithm is independent of
//! the raster backend so it stays testable without drawing anything.

pub mod font;
mod measure;
mod paginate;
mod surface;

pub use font::Glyphs;
pub use measure::{measure, Layout, Prim};
pub use paginate::{paginate, slice_pages, PageSlice, RenderedArtifact};
pub use surface::{BitmapSurface, Raster};

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),
    #[error("surface capture failed: {0}")]
    Capture(String),
}

/// Logical drawing resolution before the capture scale is applied.
pub const BASE_DPI: f32 = 96.0;

/// Physical page geometry. Defaults to A4 at a 2× capture scale for print
/// fidelity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    pub scale: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 15.0,
            scale: 2.0,
        }
    }
}

impl PageGeometry {
    pub fn px_per_mm(&self) -> f32 {
        BASE_DPI / 25.4 * self.scale
    }

    pub fn width_px(&self) -> u32 {
        (self.width_mm * self.px_per_mm()).round() as u32
    }

    pub fn height_px(&self) -> u32 {
        (self.height_mm * self.px_per_mm()).round() as u32
    }

    pub fn margin_px(&self) -> f32 {
        self.margin_mm * self.px_per_mm()
    }

    pub fn content_width_px(&self) -> f32 {
        self.width_px() as f32 - 2.0 * self.margin_px()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.width_mm > 0.0 && self.height_mm > 0.0 && self.scale > 0.0) {
            return Err(RasterError::InvalidGeometry(format!(
                "{}x{} mm at {}x",
                self.width_mm, self.height_mm, self.scale
            )));
        }
        if self.margin_mm * 2.0 >= self.width_mm {
            return Err(RasterError::InvalidGeometry(format!(
                "margins {} mm leave no content width",
                self.margin_mm
            )));
        }
        // Sub-pixel pages pass the millimetre checks but round to nothing.
        if self.width_px() == 0 || self.height_px() == 0 {
            return Err(RasterError::InvalidGeometry(format!(
                "page rounds to {}x{} px",
                self.width_px(),
                self.height_px()
            )));
        }
        Ok(())
    }
}
