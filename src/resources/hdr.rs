//! Equirectangular HDR loading.
//!
//! Decodes a Radiance HDR file into a floating-point 2D image suitable as
//! the source of the environment map pipeline. Failures are logged with the
//! path and decoder message and leave no partial state behind.

use std::path::Path;

use crate::errors::Result;

use super::format::PixelFormat;
use super::image::ImageData;

/// Load an equirectangular HDR file as an `Rgba32F` 2D image.
pub fn load_hdr(path: &Path) -> Result<ImageData> {
    let decoded = image::open(path).map_err(|err| {
        log::error!("Failed to load HDR '{}': {err}", path.display());
        err
    })?;

    let rgb = decoded.to_rgb32f();
    let (width, height) = rgb.dimensions();

    let mut out = ImageData::new_2d(width, height, PixelFormat::Rgba32F);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        out.put_texel(0, 0, x, y, &[pixel[0], pixel[1], pixel[2], 1.0]);
    }

    log::info!(
        "Loaded equirectangular map '{}' ({width}x{height})",
        path.display()
    );
    Ok(out)
}
