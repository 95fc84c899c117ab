//! Assembles a paginated raster artifact into one standalone PDF. Each page
//! slice is cropped out of the source capture, so clipping to page bounds is
//! enforced here rather than delegated to the viewer.

use greffe_raster::{RenderedArtifact, Raster};
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;

pub type Result<T> = std::result::Result<T, PdfError>;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("pdf assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("page image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const PT_PER_MM: f32 = 72.0 / 25.4;

struct PageJpeg {
    bytes: Vec<u8>,
    width_px: u32,
    height_px: u32,
}

/// Crops one page band out of the capture and encodes it as JPEG. The crop
/// is the hard clip: a band never carries pixels of a neighboring page.
fn crop_page(artifact: &RenderedArtifact, top: u32, page_h_px: u32) -> Result<PageJpeg> {
    let img = &artifact.image;
    let band_h = page_h_px.min(img.height_px().saturating_sub(top)).max(1);
    let band = image::imageops::crop_imm(img, 0, top, img.width_px(), band_h).to_image();
    let rgb = DynamicImage::ImageRgba8(band).to_rgb8();

    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb).write_to(&mut cursor, ImageFormat::Jpeg)?;
    Ok(PageJpeg {
        bytes: cursor.into_inner(),
        width_px: img.width_px(),
        height_px: band_h,
    })
}

/// Builds the single-document PDF for a rendered artifact. Deterministic for
/// identical artifacts.
pub fn assemble(artifact: &RenderedArtifact) -> Result<Vec<u8>> {
    let page_w_pt = artifact.page.width_mm * PT_PER_MM;
    let page_h_pt = artifact.page.height_mm * PT_PER_MM;
    let page_h_px = artifact.page.height_px();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(artifact.slices.len());

    for slice in &artifact.slices {
        let jpeg = crop_page(artifact, slice.source_top(), page_h_px)?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => jpeg.width_px as i64,
                "Height" => jpeg.height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.bytes,
        ));

        // The band is placed flush with the top edge; a short final band
        // leaves white space at the bottom, exactly like the source page.
        let band_h_pt = jpeg.height_px as f32 / page_h_px as f32 * page_h_pt;
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_w_pt.into(),
                    0.into(),
                    0.into(),
                    band_h_pt.into(),
                    0.into(),
                    (page_h_pt - band_h_pt).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ];
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            Content { operations }.encode()?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_w_pt.into(), page_h_pt.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut Cursor::new(&mut out))?;
    log::debug!("assembled {} page(s), {} bytes", count, out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use greffe_raster::{slice_pages, PageGeometry};
    use image::RgbaImage;

    fn artifact(content_h: u32) -> RenderedArtifact {
        let page = PageGeometry {
            width_mm: 100.0,
            height_mm: 100.0,
            margin_mm: 10.0,
            scale: 1.0,
        };
        let image = RgbaImage::from_pixel(page.width_px(), content_h.max(1), image::Rgba([200, 0, 0, 255]));
        let slices = slice_pages(image.height(), page.height_px());
        RenderedArtifact { image, page, slices }
    }

    #[test]
    fn test_single_page_pdf() {
        let bytes = assemble(&artifact(50)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_page_count_matches_slices() {
        let a = artifact(1000);
        let expected = a.page_count();
        assert!(expected > 1);
        let doc = Document::load_mem(&assemble(&a).unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), expected);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let a = artifact(700);
        assert_eq!(assemble(&a).unwrap(), assemble(&a).unwrap());
    }
}
