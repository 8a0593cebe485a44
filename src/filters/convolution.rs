//! Generic 2D kernel convolution.
//!
//! The kernel is rotated 180° before the multiply-accumulate, so this is true
//! convolution rather than correlation. Output always has the input shape.
//!
//! ## Border Handling
//!
//! - [`Padding::Zero`] - pads with zeros; used by the gradient operators
//! - [`Padding::Replicate`] - repeats the nearest edge sample; used by the
//!   3x3 smoothing filters
//!
//! Each output sample is the sum over an `ndarray` window view of the padded
//! image; rows of output are computed in parallel with rayon.

use ndarray::{s, Array2, ArrayView2, Zip};

use crate::error::{FilterError, Result};

/// Small immutable grid of real weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Array2<f64>,
}

impl Kernel {
    /// Wrap a weight grid. Empty grids are rejected.
    pub fn new(weights: Array2<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(FilterError::invalid("kernel has no weights"));
        }
        Ok(Kernel { weights })
    }

    /// Build a kernel from fixed-size rows.
    pub fn from_rows<const R: usize, const C: usize>(rows: [[f64; C]; R]) -> Self {
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let weights = Array2::from_shape_fn((R, C), |(y, x)| flat[y * C + x]);
        Kernel { weights }
    }

    /// 1x1 kernel of weight 1.
    pub fn identity() -> Self {
        Kernel::from_rows([[1.0]])
    }

    /// (rows, cols) of the weight grid.
    pub fn dim(&self) -> (usize, usize) {
        self.weights.dim()
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// The kernel rotated by 180°.
    pub fn flipped(&self) -> Kernel {
        Kernel {
            weights: self.weights.slice(s![..;-1, ..;-1]).to_owned(),
        }
    }
}

/// Border mode used when the kernel overhangs the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// Samples outside the image read as zero.
    #[default]
    Zero,
    /// Samples outside the image repeat the nearest edge sample.
    Replicate,
}

/// Convolve a single-channel image with zero padding.
///
/// # Arguments
/// * `image` - Single-channel real image (height, width)
/// * `kernel` - Convolution kernel
///
/// # Returns
/// Real-valued grid with the same shape as `image`
pub fn convolve(image: ArrayView2<f64>, kernel: &Kernel) -> Result<Array2<f64>> {
    convolve_padded(image, kernel, Padding::Zero)
}

/// Convolve a single-channel image using the given border mode.
///
/// The image is padded by `kernel_rows / 2` rows and `kernel_cols / 2` columns
/// on each side. For even-sized kernels the windows start at the top-left of
/// the padded grid so the output still matches the input shape.
pub fn convolve_padded(
    image: ArrayView2<f64>,
    kernel: &Kernel,
    padding: Padding,
) -> Result<Array2<f64>> {
    let (height, width) = image.dim();
    if height == 0 || width == 0 {
        return Err(FilterError::invalid(format!(
            "cannot convolve an empty {width}x{height} image"
        )));
    }
    let (k_h, k_w) = kernel.dim();
    if k_h == 0 || k_w == 0 {
        return Err(FilterError::invalid("kernel has no weights"));
    }

    let padded = pad(image, k_h / 2, k_w / 2, padding);
    let flipped = kernel.flipped();
    let span = padded.slice(s![..height + k_h - 1, ..width + k_w - 1]);

    let mut output = Array2::<f64>::zeros((height, width));
    Zip::indexed(&mut output).par_for_each(|(y, x), out| {
        let window = span.slice(s![y..y + k_h, x..x + k_w]);
        *out = window
            .iter()
            .zip(flipped.weights.iter())
            .map(|(v, w)| v * w)
            .sum();
    });

    Ok(output)
}

fn pad(image: ArrayView2<f64>, pad_h: usize, pad_w: usize, padding: Padding) -> Array2<f64> {
    let (height, width) = image.dim();
    let shape = (height + 2 * pad_h, width + 2 * pad_w);

    match padding {
        Padding::Zero => {
            let mut padded = Array2::<f64>::zeros(shape);
            padded
                .slice_mut(s![pad_h..pad_h + height, pad_w..pad_w + width])
                .assign(&image);
            padded
        }
        Padding::Replicate => Array2::from_shape_fn(shape, |(y, x)| {
            let sy = (y as isize - pad_h as isize).clamp(0, height as isize - 1) as usize;
            let sx = (x as isize - pad_w as isize).clamp(0, width as isize - 1) as usize;
            image[[sy, sx]]
        }),
    }
}
