//! In-memory raster model shared by all filters.
//!
//! A [`Raster`] is an 8-bit image in (height, width, channels) layout, either
//! single-channel intensity or three-channel RGB. Operations borrow rasters
//! read-only and always allocate a fresh output.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::error::{FilterError, Result};

/// BT.601 luma coefficients used for color to gray conversion.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// 8-bit image with 1 or 3 channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    data: Array3<u8>,
}

impl Raster {
    /// Build a raster from interleaved samples.
    ///
    /// # Arguments
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `channels` - 1 (gray) or 3 (RGB)
    /// * `samples` - Row-major interleaved samples, `width * height * channels` long
    pub fn new(width: usize, height: usize, channels: usize, samples: Vec<u8>) -> Result<Self> {
        check_channels(channels)?;
        let expected = sample_count(width, height, channels)?;
        if samples.len() != expected {
            return Err(FilterError::invalid(format!(
                "sample count {} does not match {width}x{height}x{channels}",
                samples.len()
            )));
        }
        let data = Array3::from_shape_vec((height, width, channels), samples)
            .map_err(|e| FilterError::invalid(e.to_string()))?;
        Ok(Raster { data })
    }

    /// Wrap an existing (height, width, channels) array.
    pub fn from_array(data: Array3<u8>) -> Result<Self> {
        check_channels(data.dim().2)?;
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Raster { data })
    }

    /// Reassemble a raster from per-channel planes, in order.
    pub fn from_channels(planes: Vec<Array2<u8>>) -> Result<Self> {
        let views: Vec<ArrayView2<u8>> = planes.iter().map(|p| p.view()).collect();
        let data = ndarray::stack(Axis(2), &views)
            .map_err(|e| FilterError::invalid(format!("channel planes disagree: {e}")))?;
        Raster::from_array(data)
    }

    /// All-zero raster.
    pub fn zeros(width: usize, height: usize, channels: usize) -> Result<Self> {
        check_channels(channels)?;
        sample_count(width, height, channels)?;
        Ok(Raster {
            data: Array3::zeros((height, width, channels)),
        })
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// True when the raster holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 2D view of a single channel.
    ///
    /// Panics if `c >= self.channels()`.
    pub fn channel(&self, c: usize) -> ArrayView2<'_, u8> {
        self.data.index_axis(Axis(2), c)
    }

    pub fn as_array(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn into_array(self) -> Array3<u8> {
        self.data
    }

    /// Interleaved row-major samples.
    pub fn into_raw_vec(self) -> Vec<u8> {
        self.data.into_raw_vec_and_offset().0
    }

    /// Replicate a gray raster across three channels; color rasters are cloned.
    pub fn to_three_channel(&self) -> Raster {
        if self.channels() == 3 {
            return self.clone();
        }
        let (height, width, _) = self.data.dim();
        let gray = self.channel(0);
        let data = Array3::from_shape_fn((height, width, 3), |(y, x, _)| gray[[y, x]]);
        Raster { data }
    }

    /// Luma conversion; gray rasters are cloned.
    pub fn to_grayscale(&self) -> Raster {
        if self.channels() == 1 {
            return self.clone();
        }
        let (height, width, _) = self.data.dim();
        let src = &self.data;
        let data = Array3::from_shape_fn((height, width, 1), |(y, x, _)| {
            let luma = LUMA_R * src[[y, x, 0]] as f64
                + LUMA_G * src[[y, x, 1]] as f64
                + LUMA_B * src[[y, x, 2]] as f64;
            luma.round().clamp(0.0, 255.0) as u8
        });
        Raster { data }
    }

    pub(crate) fn ensure_non_empty(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            return Err(FilterError::invalid(format!(
                "{what} is empty ({}x{})",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

fn sample_count(width: usize, height: usize, channels: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or_else(|| {
            FilterError::invalid(format!("{width}x{height}x{channels} raster is too large"))
        })
}

fn check_channels(channels: usize) -> Result<()> {
    if channels == 1 || channels == 3 {
        Ok(())
    } else {
        Err(FilterError::invalid(format!(
            "expected 1 or 3 channels, got {channels}"
        )))
    }
}
