//! Thumbnail rendering
//!
//! A square PNG is drawn either from a configured background image or from a
//! two-color gradient seeded by the keyword hash, so the same keyword always
//! gets the same colors. A darkened band across the lower third gives the
//! editor's caption room to sit on.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{BlogcastError, Result};

pub const THUMBNAIL_SIZE: u32 = 750;

const BAND_TOP: f32 = 0.62;
const BAND_BOTTOM: f32 = 0.86;
const FRAME_WIDTH: u32 = 12;

#[derive(Debug, Clone, Default)]
pub struct ThumbnailRenderer {
    background: Option<PathBuf>,
    size: Option<u32>,
}

impl ThumbnailRenderer {
    pub fn new(background: Option<PathBuf>) -> Self {
        Self {
            background,
            size: None,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size.max(FRAME_WIDTH * 4));
        self
    }

    fn size(&self) -> u32 {
        self.size.unwrap_or(THUMBNAIL_SIZE)
    }

    /// Draw the thumbnail for `keyword` in memory
    pub fn render(&self, keyword: &str) -> Result<RgbImage> {
        let size = self.size();
        let mut canvas = match &self.background {
            Some(path) => load_background(path, size)?,
            None => gradient(keyword, size),
        };
        let (_, accent) = palette(keyword);
        decorate(&mut canvas, accent);
        Ok(canvas)
    }

    /// Render and write a PNG to `path`
    pub fn render_to(&self, keyword: &str, path: &Path) -> Result<PathBuf> {
        let canvas = self.render(keyword)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        canvas
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| BlogcastError::Thumbnail(format!("Failed to save {}: {}", path.display(), e)))?;
        debug!("Thumbnail written to {}", path.display());
        Ok(path.to_path_buf())
    }
}

fn load_background(path: &Path, size: u32) -> Result<RgbImage> {
    let img = image::open(path).map_err(|e| {
        BlogcastError::Thumbnail(format!("Failed to load background {}: {}", path.display(), e))
    })?;
    Ok(img.resize_to_fill(size, size, FilterType::Lanczos3).to_rgb8())
}

/// Two colors derived from the keyword digest: gradient start and accent
fn palette(keyword: &str) -> (Rgb<u8>, Rgb<u8>) {
    let digest = Sha256::digest(keyword.as_bytes());
    // Keep channels in a mid range so the band and frame stay visible
    let channel = |b: u8| 48 + b % 160;
    (
        Rgb([channel(digest[0]), channel(digest[1]), channel(digest[2])]),
        Rgb([channel(digest[3]), channel(digest[4]), channel(digest[5])]),
    )
}

fn gradient(keyword: &str, size: u32) -> RgbImage {
    let (start, end) = palette(keyword);
    let span = (2 * size.saturating_sub(1)).max(1) as f32;
    RgbImage::from_fn(size, size, |x, y| {
        let t = (x + y) as f32 / span;
        Rgb([
            lerp(start[0], end[0], t),
            lerp(start[1], end[1], t),
            lerp(start[2], end[2], t),
        ])
    })
}

fn decorate(canvas: &mut RgbImage, accent: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    let band_top = (height as f32 * BAND_TOP) as u32;
    let band_bottom = (height as f32 * BAND_BOTTOM) as u32;

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let on_frame = x < FRAME_WIDTH
            || y < FRAME_WIDTH
            || x >= width.saturating_sub(FRAME_WIDTH)
            || y >= height.saturating_sub(FRAME_WIDTH);
        if on_frame {
            *pixel = accent;
        } else if (band_top..band_bottom).contains(&y) {
            for c in pixel.0.iter_mut() {
                *c = (*c as f32 * 0.35) as u8;
            }
        }
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    let t = t.clamp(0.0, 1.0);
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}
