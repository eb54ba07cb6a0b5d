//! Image encoding driven by [`ImageSettings`].

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use serde::{Serialize, Serializer};
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use crate::config::ImageSettings;

/// Output image container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageEncoding {
    Jpeg,
    Png,
}

impl ImageEncoding {
    /// File extension including the leading dot, e.g. `.jpg`.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => ".jpg",
            ImageEncoding::Png => ".png",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| anyhow!("{} has no image extension", path.display()))?;
        ext.parse()
    }
}

impl FromStr for ImageEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let ext = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(ImageEncoding::Jpeg),
            "png" => Ok(ImageEncoding::Png),
            _ => Err(anyhow!(
                "unsupported image encoding '{}'; expected .jpg or .png",
                s
            )),
        }
    }
}

impl Serialize for ImageEncoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.extension())
    }
}

/// Encodes `image` into an in-memory buffer.
pub fn encode(image: &RgbImage, settings: &ImageSettings) -> Result<Vec<u8>> {
    if settings.quality > 100 {
        return Err(anyhow!("image quality must be 0-100, got {}", settings.quality));
    }
    let mut out = Vec::new();
    match settings.encoding {
        ImageEncoding::Jpeg => {
            // quantization table scaling divides by quality
            let quality = settings.quality.max(1);
            let encoder = JpegEncoder::new_with_quality(&mut out, quality);
            image.write_with_encoder(encoder).context("encode jpeg")?;
        }
        ImageEncoding::Png => {
            image
                .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                .context("encode png")?;
        }
    }
    Ok(out)
}

/// Encodes `image` and writes it to `path`.
pub fn write(image: &RgbImage, settings: &ImageSettings, path: &Path) -> Result<()> {
    let bytes = encode(image, settings)?;
    std::fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))?;
    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
