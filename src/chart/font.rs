//! Font lookup for chart text.

use ab_glyph::FontVec;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

const SYSTEM_FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the font used for chart text.
///
/// An explicit `path` must load. Without one, the first readable system font
/// is used; `None` means text is skipped when rendering.
pub fn load_font(path: Option<&Path>) -> Result<Option<FontVec>> {
    if let Some(path) = path {
        let data =
            std::fs::read(path).with_context(|| format!("read font {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| anyhow!("failed to parse font file {}", path.display()))?;
        log::info!("loaded font {}", path.display());
        return Ok(Some(font));
    }

    for candidate in SYSTEM_FONT_PATHS {
        if let Ok(data) = std::fs::read(candidate) {
            if let Ok(font) = FontVec::try_from_vec(data) {
                log::info!("loaded system font {}", candidate);
                return Ok(Some(font));
            }
        }
    }

    log::warn!("no system font found; chart text will be skipped");
    Ok(None)
}
