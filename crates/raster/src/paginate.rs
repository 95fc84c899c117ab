//! Explicit page slicing over a captured raster. One source image, one slice
//! descriptor per page; the output medium must clip hard to page bounds and
//! the PDF assembly does so by cropping each slice out of the capture.

use crate::measure::measure;
use crate::surface::{BitmapSurface, Raster};
use crate::{Glyphs, PageGeometry, Result};
use greffe_render::DocumentTree;
use image::RgbaImage;

/// One page of the artifact: the source capture shifted so that only this
/// page's band is visible. `offset_y` is the signed vertical offset of the
/// source image relative to the page origin, `-(index × page_height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub index: u32,
    pub offset_y: i64,
}

impl PageSlice {
    /// Top of this page's band inside the source image.
    pub fn source_top(&self) -> u32 {
        (-self.offset_y) as u32
    }
}

/// Computes the slice table for a raster of the given height. Exactly
/// `ceil(h / p)` slices; zero-height content still yields one page. The loop
/// is bounded only by the raster height, never by a page cap.
pub fn slice_pages(content_height_px: u32, page_height_px: u32) -> Vec<PageSlice> {
    assert!(page_height_px > 0, "page height must be positive");
    let count = (content_height_px as u64).div_ceil(page_height_px as u64).max(1);
    (0..count)
        .map(|i| PageSlice {
            index: i as u32,
            offset_y: -(i as i64 * page_height_px as i64),
        })
        .collect()
}

/// The paginated artifact: one capture plus its slice table and physical
/// page dimensions. Immutable once produced.
#[derive(Debug)]
pub struct RenderedArtifact {
    pub image: RgbaImage,
    pub page: PageGeometry,
    pub slices: Vec<PageSlice>,
}

impl RenderedArtifact {
    pub fn page_count(&self) -> usize {
        self.slices.len()
    }
}

/// Renders the tree onto a fresh off-screen surface at the page's fixed
/// width, captures it in one synchronous step, then slices the capture into
/// fixed-height pages. The surface lives and dies inside this call on every
/// path.
pub fn paginate(tree: &DocumentTree, page: PageGeometry, glyphs: &Glyphs) -> Result<RenderedArtifact> {
    page.validate()?;
    let layout = measure(tree, &page);
    log::debug!(
        "layout {}x{} px across {} primitives",
        layout.width_px,
        layout.content_height_px,
        layout.prims.len()
    );

    let image = BitmapSurface::new(&layout)?.capture(&layout, glyphs);
    let slices = slice_pages(image.height_px(), page.height_px());
    log::info!(
        "paginated {} px of content into {} page(s)",
        image.height_px(),
        slices.len()
    );
    Ok(RenderedArtifact { image, page, slices })
}
