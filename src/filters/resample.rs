//! Area-averaging resampling.
//!
//! Resizing goes through `fast_image_resize` with a box convolution filter.
//! When shrinking, each destination sample averages the source samples its
//! footprint covers, so integer downscales reduce to plain block averages.

use fast_image_resize as fr;

use crate::error::{FilterError, Result};
use crate::raster::Raster;

/// Resize a raster to `width` x `height` with area interpolation.
///
/// # Arguments
/// * `image` - Source raster (1 or 3 channels)
/// * `width` - Target width in pixels
/// * `height` - Target height in pixels
///
/// # Returns
/// New raster with the target size and the source channel count
pub fn resize_area(image: &Raster, width: usize, height: usize) -> Result<Raster> {
    image.ensure_non_empty("resize input")?;
    if width == 0 || height == 0 {
        return Err(FilterError::invalid(format!(
            "cannot resize to an empty {width}x{height} raster"
        )));
    }
    if (width, height) == (image.width(), image.height()) {
        return Ok(image.clone());
    }

    let pixel_type = match image.channels() {
        1 => fr::PixelType::U8,
        _ => fr::PixelType::U8x3,
    };
    let samples = image
        .as_array()
        .as_slice()
        .ok_or_else(|| FilterError::invalid("raster samples are not contiguous"))?;

    let src = fr::images::ImageRef::new(
        to_u32(image.width(), "source width")?,
        to_u32(image.height(), "source height")?,
        samples,
        pixel_type,
    )
    .map_err(|e| FilterError::invalid(format!("resize source: {e}")))?;
    let mut dst = fr::images::Image::new(
        to_u32(width, "target width")?,
        to_u32(height, "target height")?,
        pixel_type,
    );

    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Box));
    fr::Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| FilterError::invalid(format!("resize failed: {e}")))?;

    Raster::new(width, height, image.channels(), dst.into_vec())
}

/// Halve both dimensions (rounding down).
pub fn downscale_half(image: &Raster) -> Result<Raster> {
    resize_area(image, image.width() / 2, image.height() / 2)
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| FilterError::invalid(format!("{what} {value} is too large")))
}
