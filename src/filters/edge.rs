//! Edge detection filters: Sobel, Prewitt, Roberts, Canny.
//!
//! All operators take a single-channel raster and return a single-channel
//! gradient map. Sobel, Prewitt and Roberts compute `sqrt(gx² + gy²)` and
//! rescale it so the strongest response maps to 255. A flat input has a zero
//! maximum and produces an all-zero map rather than an error.
//!
//! Canny is delegated to `imageproc` and sits behind the same
//! [`EdgeOperator`] trait, so callers switch operators without caring where
//! the implementation comes from.

use std::fmt;
use std::str::FromStr;

use image::GrayImage;
use log::debug;
use ndarray::{s, Array2, Axis, Zip};

use super::convolution::{convolve, Kernel};
use crate::error::{FilterError, Result};
use crate::raster::Raster;

// ============================================================================
// Kernels
// ============================================================================

pub const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
pub const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

pub const PREWITT_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]];
pub const PREWITT_Y: [[f64; 3]; 3] = [[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];

pub const ROBERTS_X: [[f64; 2]; 2] = [[1.0, 0.0], [0.0, -1.0]];
pub const ROBERTS_Y: [[f64; 2]; 2] = [[0.0, 1.0], [-1.0, 0.0]];

// ============================================================================
// Operator Interface
// ============================================================================

/// A gradient-based edge detector.
pub trait EdgeOperator: Send + Sync {
    /// Short operator name, used in log records.
    fn name(&self) -> &'static str;

    /// Compute the edge map of a single-channel raster.
    fn detect(&self, gray: &Raster) -> Result<Raster>;
}

/// Sobel 3x3 gradient operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sobel;

/// Prewitt 3x3 gradient operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prewitt;

/// Roberts 2x2 cross operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Roberts;

/// Canny detector with hysteresis thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canny {
    pub thresholds: CannyThresholds,
}

/// Low/high hysteresis thresholds for [`Canny`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyThresholds {
    pub low: f32,
    pub high: f32,
}

impl Default for CannyThresholds {
    fn default() -> Self {
        CannyThresholds {
            low: 50.0,
            high: 150.0,
        }
    }
}

impl EdgeOperator for Sobel {
    fn name(&self) -> &'static str {
        "sobel"
    }

    fn detect(&self, gray: &Raster) -> Result<Raster> {
        check_gray(gray, self.name())?;
        gradient_magnitude(
            gray,
            &Kernel::from_rows(SOBEL_X),
            &Kernel::from_rows(SOBEL_Y),
            self.name(),
        )
    }
}

impl EdgeOperator for Prewitt {
    fn name(&self) -> &'static str {
        "prewitt"
    }

    fn detect(&self, gray: &Raster) -> Result<Raster> {
        check_gray(gray, self.name())?;
        gradient_magnitude(
            gray,
            &Kernel::from_rows(PREWITT_X),
            &Kernel::from_rows(PREWITT_Y),
            self.name(),
        )
    }
}

impl EdgeOperator for Roberts {
    fn name(&self) -> &'static str {
        "roberts"
    }

    /// The 2x2 cross is slid over every full window without padding, so the
    /// last row and last column stay zero.
    fn detect(&self, gray: &Raster) -> Result<Raster> {
        check_gray(gray, self.name())?;
        let (height, width) = (gray.height(), gray.width());
        if height < 2 || width < 2 {
            return Err(FilterError::invalid(format!(
                "roberts needs at least 2x2 pixels, got {width}x{height}"
            )));
        }

        let image = gray.channel(0).mapv(f64::from);
        let mut magnitude = Array2::<f64>::zeros((height, width));

        Zip::indexed(magnitude.slice_mut(s![..height - 1, ..width - 1])).par_for_each(
            |(y, x), out| {
                let window = image.slice(s![y..y + 2, x..x + 2]);
                let mut gx = 0.0;
                let mut gy = 0.0;
                for ((v, kx), ky) in window
                    .iter()
                    .zip(ROBERTS_X.iter().flatten())
                    .zip(ROBERTS_Y.iter().flatten())
                {
                    gx += v * kx;
                    gy += v * ky;
                }
                *out = (gx * gx + gy * gy).sqrt();
            },
        );

        rescale_to_u8(magnitude, self.name())
    }
}

impl EdgeOperator for Canny {
    fn name(&self) -> &'static str {
        "canny"
    }

    fn detect(&self, gray: &Raster) -> Result<Raster> {
        check_gray(gray, self.name())?;
        let CannyThresholds { low, high } = self.thresholds;
        if !(low.is_finite() && high.is_finite()) || low < 0.0 || high < low {
            return Err(FilterError::invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {low}/{high}"
            )));
        }

        let (width, height) = (gray.width(), gray.height());
        let (buf_width, buf_height) = buffer_dims(width, height)?;
        let buffer = GrayImage::from_raw(buf_width, buf_height, gray.clone().into_raw_vec())
            .ok_or_else(|| FilterError::invalid("raster does not fit a gray image buffer"))?;

        debug!("canny: {width}x{height}, thresholds {low}/{high}");
        let edges = imageproc::edges::canny(&buffer, low, high);
        Raster::new(width, height, 1, edges.into_raw())
    }
}

// ============================================================================
// Operator Selection
// ============================================================================

/// Operator names accepted from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOperatorKind {
    Sobel,
    Prewitt,
    Roberts,
    Canny,
}

impl EdgeOperatorKind {
    /// Instantiate the operator. `thresholds` only affects Canny.
    pub fn operator(self, thresholds: CannyThresholds) -> Box<dyn EdgeOperator> {
        match self {
            EdgeOperatorKind::Sobel => Box::new(Sobel),
            EdgeOperatorKind::Prewitt => Box::new(Prewitt),
            EdgeOperatorKind::Roberts => Box::new(Roberts),
            EdgeOperatorKind::Canny => Box::new(Canny { thresholds }),
        }
    }
}

impl FromStr for EdgeOperatorKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sobel" => Ok(EdgeOperatorKind::Sobel),
            "prewitt" => Ok(EdgeOperatorKind::Prewitt),
            "roberts" => Ok(EdgeOperatorKind::Roberts),
            "canny" => Ok(EdgeOperatorKind::Canny),
            _ => Err(FilterError::UnsupportedFilterKind(s.to_string())),
        }
    }
}

impl fmt::Display for EdgeOperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeOperatorKind::Sobel => "sobel",
            EdgeOperatorKind::Prewitt => "prewitt",
            EdgeOperatorKind::Roberts => "roberts",
            EdgeOperatorKind::Canny => "canny",
        };
        f.write_str(name)
    }
}

/// Run an operator with default Canny thresholds.
pub fn detect_edges(gray: &Raster, kind: EdgeOperatorKind) -> Result<Raster> {
    kind.operator(CannyThresholds::default()).detect(gray)
}

// ============================================================================
// Helpers
// ============================================================================

fn check_gray(gray: &Raster, operator: &str) -> Result<()> {
    gray.ensure_non_empty(operator)?;
    if gray.channels() != 1 {
        return Err(FilterError::invalid(format!(
            "{operator} expects a single-channel image, got {} channels",
            gray.channels()
        )));
    }
    Ok(())
}

/// Image buffer dimensions for `imageproc`, which indexes with `u32`.
fn buffer_dims(width: usize, height: usize) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(FilterError::invalid(format!(
            "{width}x{height} exceeds the gray image buffer limits"
        ))),
    }
}

fn gradient_magnitude(
    gray: &Raster,
    kernel_x: &Kernel,
    kernel_y: &Kernel,
    operator: &str,
) -> Result<Raster> {
    let image = gray.channel(0).mapv(f64::from);
    let gx = convolve(image.view(), kernel_x)?;
    let gy = convolve(image.view(), kernel_y)?;

    let magnitude = Zip::from(&gx)
        .and(&gy)
        .map_collect(|&x, &y| (x * x + y * y).sqrt());

    rescale_to_u8(magnitude, operator)
}

/// Map the maximum magnitude to 255, truncating toward zero.
fn rescale_to_u8(magnitude: Array2<f64>, operator: &str) -> Result<Raster> {
    let max = magnitude.fold(0.0f64, |m, &v| m.max(v));
    let (height, width) = magnitude.dim();

    if max <= 0.0 {
        debug!("{operator}: gradient maximum is zero, emitting an all-zero map");
        return Raster::zeros(width, height, 1);
    }

    let scaled = magnitude.mapv(|v| (v / max * 255.0) as u8);
    Raster::from_array(scaled.insert_axis(Axis(2)))
}
