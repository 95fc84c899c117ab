//! Glyph source discovery. The engine ships no font of its own; it probes a
//! small set of well-known system locations, in order, and degrades to bar
//! rendering when nothing usable is found. Set `GREFFE_FONT` to point at a
//! specific TrueType file.

use ab_glyph::FontVec;
use std::path::PathBuf;

/// Glyph backend for the bitmap surface.
pub enum Glyphs {
    /// Outline font loaded from disk.
    Outline(FontVec),
    /// No font available: text paints as proportional bars. Geometry is
    /// unaffected because measurement never consults the glyph source.
    Bars,
}

fn font_search_paths(explicit: Option<PathBuf>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    paths.extend(explicit);

    // Linux distributions
    paths.push(PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"));
    paths.push(PathBuf::from("/usr/share/fonts/dejavu/DejaVuSans.ttf"));
    paths.push(PathBuf::from(
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ));
    paths.push(PathBuf::from(
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    ));
    paths.push(PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"));

    // macOS
    paths.push(PathBuf::from("/Library/Fonts/Arial Unicode.ttf"));
    paths.push(PathBuf::from("/System/Library/Fonts/Supplemental/Arial.ttf"));

    // Local development assets
    paths.push(PathBuf::from("assets/fonts/DejaVuSans.ttf"));

    paths
}

impl Glyphs {
    /// Probes the search paths and loads the first parseable font.
    pub fn discover() -> Glyphs {
        let explicit = std::env::var_os("GREFFE_FONT").map(PathBuf::from);
        for path in font_search_paths(explicit) {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    log::info!("glyph source: {}", path.display());
                    return Glyphs::Outline(font);
                }
                Err(err) => {
                    log::debug!("unusable font {}: {}", path.display(), err);
                }
            }
        }
        log::warn!("no usable font found, text will paint as bars");
        Glyphs::Bars
    }
}
