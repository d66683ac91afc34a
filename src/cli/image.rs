//! Images referenced from job scripts

use std::path::Path;

use afp_create::{common::Resolution, ioca::ImageContent, triplet::ColorModel};
use color_eyre::eyre::{self, eyre, WrapErr};
use log::debug;

/// Decode an image file into uncompressed RGB image content
pub fn load_image(path: &Path, resolution: Resolution) -> eyre::Result<ImageContent> {
    let img = ::image::open(path)
        .wrap_err_with(|| format!("Failed to decode image `{}`", path.display()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let too_large = || eyre!("Image `{}` is too large ({}x{})", path.display(), width, height);
    let w = u16::try_from(width).map_err(|_| too_large())?;
    let h = u16::try_from(height).map_err(|_| too_large())?;
    debug!("Loaded {} ({}x{})", path.display(), w, h);
    let mut content = ImageContent::new(w, h, ColorModel::Rgb, rgb.into_raw());
    content.resolution = resolution;
    Ok(content)
}
