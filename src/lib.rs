//! FilterLab Rust Engine
//!
//! Image transform and filtering engine for an interactive image-processing
//! tool: spatial convolution and edge detection, frequency-domain filtering,
//! hybrid-image synthesis, noise and histograms. Optional Python bindings via
//! PyO3.
//!
//! ## Image Format
//! Every operation works on [`Raster`] values:
//! - **Grayscale**: (height, width, 1) - single channel
//! - **RGB**: (height, width, 3) - 3 color channels
//!
//! Samples are `u8` (0-255). Operations borrow their inputs and return new
//! rasters; nothing is mutated in place and no state survives between calls.
//!
//! ## Errors
//! Failures are returned as [`FilterError`] before any expensive transform
//! work starts. Nothing in the crate panics on bad input.
//!
//! ## Logging
//! The crate emits `log` records (`debug` for call parameters and degenerate
//! inputs, `trace` per filtered channel) and never installs a logger itself.

pub mod error;
pub mod filters;
pub mod raster;

pub use error::{FilterError, Result};
pub use filters::convolution::{convolve, convolve_padded, Kernel, Padding};
pub use filters::edge::{
    detect_edges, Canny, CannyThresholds, EdgeOperator, EdgeOperatorKind, Prewitt, Roberts, Sobel,
};
pub use filters::frequency::{
    apply_frequency_filter, magnitude_spectrum, FilterFamily, FrequencyOutput, MaskSpec, PassType,
    Spectrum,
};
pub use filters::histogram::{gray_histogram, histograms, Histogram};
pub use filters::hybrid::{compose, scale_pyramid, HybridImage, HybridParams};
pub use filters::noise::{add_noise, NoiseKind};
pub use filters::resample::resize_area;
pub use filters::smoothing::{smooth, SmoothingKind};
pub use raster::Raster;

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::error::FilterError;
    use crate::filters::edge::{CannyThresholds, EdgeOperatorKind};
    use crate::filters::frequency::{self, MaskSpec};
    use crate::filters::histogram;
    use crate::filters::hybrid::{self, HybridParams, DEFAULT_PYRAMID_LEVELS};
    use crate::filters::noise::{self, NoiseKind};
    use crate::filters::smoothing::{self, SmoothingKind};
    use crate::raster::Raster;

    fn to_raster(image: &PyReadonlyArray3<'_, u8>) -> PyResult<Raster> {
        Ok(Raster::from_array(image.as_array().to_owned())?)
    }

    fn to_numpy<'py>(py: Python<'py>, raster: Raster) -> Bound<'py, PyArray3<u8>> {
        raster.into_array().into_pyarray(py)
    }

    // ========================================================================
    // Edge Detection
    // ========================================================================

    /// Detect edges in a grayscale (H, W, 1) image.
    ///
    /// # Arguments
    /// * `image` - Grayscale u8 image
    /// * `operator` - "sobel", "prewitt", "roberts" or "canny"
    /// * `low_threshold` - Canny low hysteresis threshold
    /// * `high_threshold` - Canny high hysteresis threshold
    #[pyfunction]
    #[pyo3(signature = (image, operator, low_threshold=50.0, high_threshold=150.0))]
    pub fn edge_detect<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        operator: &str,
        low_threshold: f32,
        high_threshold: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let kind: EdgeOperatorKind = operator.parse()?;
        let raster = to_raster(&image)?;
        let thresholds = CannyThresholds {
            low: low_threshold,
            high: high_threshold,
        };
        let result = py.allow_threads(|| kind.operator(thresholds).detect(&raster))?;
        Ok(to_numpy(py, result))
    }

    // ========================================================================
    // Frequency Filtering
    // ========================================================================

    /// Filter an image in the frequency domain.
    ///
    /// Returns `(filtered, magnitude_spectrum)`.
    #[pyfunction]
    #[pyo3(signature = (image, filter_type="ideal", pass_type="low", cutoff=30.0, order=2))]
    pub fn frequency_filter<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter_type: &str,
        pass_type: &str,
        cutoff: f64,
        order: u32,
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, Bound<'py, PyArray3<u8>>)> {
        let spec = MaskSpec::from_tokens(filter_type, pass_type, cutoff, order)?;
        let raster = to_raster(&image)?;
        let output = py.allow_threads(|| frequency::apply_frequency_filter(&raster, &spec))?;
        Ok((to_numpy(py, output.filtered), to_numpy(py, output.spectrum)))
    }

    /// Log-magnitude spectrum of an image, for display.
    #[pyfunction]
    pub fn magnitude_spectrum<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let raster = to_raster(&image)?;
        let result = py.allow_threads(|| frequency::magnitude_spectrum(&raster))?;
        Ok(to_numpy(py, result))
    }

    // ========================================================================
    // Hybrid Images
    // ========================================================================

    /// Blend the low frequencies of `image1` with the high frequencies of `image2`.
    ///
    /// Returns `(hybrid, low_component, high_component)`.
    #[pyfunction]
    #[pyo3(signature = (image1, image2, low_cutoff=30.0, high_cutoff=20.0, alpha=0.5))]
    pub fn hybrid_image<'py>(
        py: Python<'py>,
        image1: Option<PyReadonlyArray3<'py, u8>>,
        image2: Option<PyReadonlyArray3<'py, u8>>,
        low_cutoff: f64,
        high_cutoff: f64,
        alpha: f64,
    ) -> PyResult<(
        Bound<'py, PyArray3<u8>>,
        Bound<'py, PyArray3<u8>>,
        Bound<'py, PyArray3<u8>>,
    )> {
        let (Some(image1), Some(image2)) = (image1, image2) else {
            return Err(FilterError::invalid("both images must be provided").into());
        };
        let low = to_raster(&image1)?;
        let high = to_raster(&image2)?;
        let params = HybridParams {
            low_cutoff,
            high_cutoff,
            alpha,
        };
        let out = py.allow_threads(|| hybrid::compose(&low, &high, &params))?;
        Ok((
            to_numpy(py, out.hybrid),
            to_numpy(py, out.low_component),
            to_numpy(py, out.high_component),
        ))
    }

    /// Progressively halved copies of a hybrid image, full size first.
    #[pyfunction]
    #[pyo3(signature = (hybrid, scales=DEFAULT_PYRAMID_LEVELS))]
    pub fn hybrid_scales<'py>(
        py: Python<'py>,
        hybrid: PyReadonlyArray3<'py, u8>,
        scales: usize,
    ) -> PyResult<Vec<Bound<'py, PyArray3<u8>>>> {
        let raster = to_raster(&hybrid)?;
        let levels = py.allow_threads(|| hybrid::scale_pyramid(&raster, scales))?;
        Ok(levels.into_iter().map(|r| to_numpy(py, r)).collect())
    }

    // ========================================================================
    // Smoothing
    // ========================================================================

    /// 3x3 average, gaussian or median smoothing with edge padding.
    #[pyfunction]
    pub fn smooth<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter_type: &str,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let kind: SmoothingKind = filter_type.parse()?;
        let raster = to_raster(&image)?;
        let result = py.allow_threads(|| smoothing::smooth(&raster, kind))?;
        Ok(to_numpy(py, result))
    }

    // ========================================================================
    // Noise & Histograms
    // ========================================================================

    /// Add "gaussian", "uniform" or "salt & pepper" noise.
    ///
    /// # Arguments
    /// * `image` - u8 image (H, W, 1) or (H, W, 3)
    /// * `noise_type` - Noise model token
    /// * `amount` - Strength in [0, 1]
    /// * `seed` - Fixed seed for reproducible noise; OS entropy when omitted
    #[pyfunction]
    #[pyo3(signature = (image, noise_type, amount, seed=None))]
    pub fn add_noise<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        noise_type: &str,
        amount: f64,
        seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let kind: NoiseKind = noise_type.parse()?;
        let raster = to_raster(&image)?;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let result = py.allow_threads(|| noise::add_noise(&raster, kind, amount, &mut rng))?;
        Ok(to_numpy(py, result))
    }

    /// Per-channel 256-bin histograms and normalized CDFs.
    ///
    /// Returns `(histograms, cdfs)`, one list entry per channel.
    #[pyfunction]
    pub fn channel_histograms(
        py: Python<'_>,
        image: PyReadonlyArray3<'_, u8>,
    ) -> PyResult<(Vec<Vec<u64>>, Vec<Vec<f64>>)> {
        let raster = to_raster(&image)?;
        let hists = py.allow_threads(|| histogram::histograms(&raster))?;
        Ok(hists
            .iter()
            .map(|h| (h.counts().to_vec(), h.cdf().to_vec()))
            .unzip())
    }

    /// FilterLab Rust extension module
    #[pymodule]
    pub fn filterlab(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(edge_detect, m)?)?;
        m.add_function(wrap_pyfunction!(frequency_filter, m)?)?;
        m.add_function(wrap_pyfunction!(magnitude_spectrum, m)?)?;
        m.add_function(wrap_pyfunction!(hybrid_image, m)?)?;
        m.add_function(wrap_pyfunction!(hybrid_scales, m)?)?;
        m.add_function(wrap_pyfunction!(smooth, m)?)?;
        m.add_function(wrap_pyfunction!(add_noise, m)?)?;
        m.add_function(wrap_pyfunction!(channel_histograms, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::filterlab;
