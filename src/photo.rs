#![cfg(feature = "web")]

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::imageops::FilterType;
use image::ImageOutputFormat;
use std::io::Cursor;

/// Longest side of an uploaded product photo
pub const UPLOAD_MAX_SIDE: u32 = 1024;

pub const JPEG_QUALITY: u8 = 80;

/// Turn an uploaded photo into the JPEG data URL the sheet service stores
///
/// Photos larger than `max_side` are scaled down keeping the aspect ratio.
pub fn prepare_upload(bytes: &[u8], max_side: u32) -> Result<String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::Invalid(format!("unreadable image: {}", e)))?;

    let img = if img.width() > max_side || img.height() > max_side {
        img.resize(max_side, max_side, FilterType::Triangle)
    } else {
        img
    };

    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| Error::Export(e.to_string()))?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(out.into_inner())))
}
