//! 3x3 smoothing filters: Average, Gaussian, Median.
//!
//! Unlike the gradient operators these filters replicate edge samples at the
//! border instead of zero-padding, so a flat image stays flat.
//!
//! ## Supported Formats
//!
//! - **Grayscale**: (height, width, 1)
//! - **RGB**: (height, width, 3) - every channel filtered independently

use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use super::convolution::{convolve_padded, Kernel, Padding};
use crate::error::{FilterError, Result};
use crate::raster::Raster;

/// Smoothing filter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingKind {
    Average,
    Gaussian,
    Median,
}

impl FromStr for SmoothingKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average" | "mean" | "box" => Ok(SmoothingKind::Average),
            "gaussian" => Ok(SmoothingKind::Gaussian),
            "median" => Ok(SmoothingKind::Median),
            _ => Err(FilterError::UnsupportedFilterKind(s.to_string())),
        }
    }
}

// Integer weights; the divisor is applied after summing so flat regions stay exact.
const AVERAGE: ([[f64; 3]; 3], f64) = ([[1.0; 3]; 3], 9.0);
const GAUSSIAN: ([[f64; 3]; 3], f64) = ([[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]], 16.0);

/// Apply a 3x3 smoothing filter.
///
/// # Arguments
/// * `image` - Raster with 1 or 3 channels
/// * `kind` - Filter to apply
///
/// # Returns
/// Smoothed raster with the same shape
pub fn smooth(image: &Raster, kind: SmoothingKind) -> Result<Raster> {
    image.ensure_non_empty("smoothing input")?;

    let planes = (0..image.channels())
        .into_par_iter()
        .map(|c| {
            let plane = image.channel(c);
            match kind {
                SmoothingKind::Average => linear_plane(plane, AVERAGE),
                SmoothingKind::Gaussian => linear_plane(plane, GAUSSIAN),
                SmoothingKind::Median => Ok(median_plane(plane)),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Raster::from_channels(planes)
}

fn linear_plane(plane: ArrayView2<u8>, (weights, divisor): ([[f64; 3]; 3], f64)) -> Result<Array2<u8>> {
    let values = plane.mapv(f64::from);
    let smoothed = convolve_padded(values.view(), &Kernel::from_rows(weights), Padding::Replicate)?;
    Ok(smoothed.mapv(|v| (v / divisor).clamp(0.0, 255.0) as u8))
}

fn median_plane(plane: ArrayView2<u8>) -> Array2<u8> {
    let (height, width) = plane.dim();

    Array2::from_shape_fn((height, width), |(y, x)| {
        let mut window = [0u8; 9];
        let mut i = 0;
        for dy in 0..3 {
            let sy = (y as isize + dy - 1).clamp(0, height as isize - 1) as usize;
            for dx in 0..3 {
                let sx = (x as isize + dx - 1).clamp(0, width as isize - 1) as usize;
                window[i] = plane[[sy, sx]];
                i += 1;
            }
        }
        window.sort_unstable();
        window[4]
    })
}
