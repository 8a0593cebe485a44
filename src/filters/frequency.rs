//! Frequency-domain filtering.
//!
//! Each channel is normalized to [0, 1], transformed with a 2D FFT, centered
//! so the zero frequency sits at (rows / 2, cols / 2), multiplied by a mask,
//! shifted back and inverted. The magnitude of the result is rescaled to
//! 0-255.
//!
//! ## Mask Families
//!
//! | Family | Low-pass | High-pass |
//! |--------|----------|-----------|
//! | Ideal | 1 inside the cutoff circle, else 0 | `1 - low` |
//! | Gaussian | `exp(-d² / (2 c²))` | `1 - low` |
//! | Butterworth | `1 / (1 + (d / c)^(2n))` | `1 / (1 + (c / d)^(2n))` |
//!
//! The Butterworth center distance is clamped to a small epsilon so the
//! high-pass branch never divides by zero.

use std::fmt;
use std::str::FromStr;

use fft2d::slice::{fft_2d, fftshift, ifft_2d, ifftshift};
use log::{debug, trace};
use ndarray::{Array2, ArrayView2, Zip};
use rayon::prelude::*;
use rustfft::num_complex::Complex;

use crate::error::{FilterError, Result};
use crate::raster::Raster;

/// Distance substituted at the exact mask center for Butterworth masks.
pub const BUTTERWORTH_CENTER_EPSILON: f64 = 1e-6;

// ============================================================================
// Spectrum
// ============================================================================

/// 2D complex spectrum of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    data: Array2<Complex<f64>>,
}

impl Spectrum {
    /// Forward 2D transform of a real image (unshifted).
    pub fn forward(image: ArrayView2<f64>) -> Result<Spectrum> {
        let (rows, cols) = image.dim();
        if rows == 0 || cols == 0 {
            return Err(FilterError::invalid(format!(
                "cannot transform an empty {cols}x{rows} grid"
            )));
        }
        let mut buffer: Vec<Complex<f64>> = image.iter().map(|&v| Complex::new(v, 0.0)).collect();
        fft_2d(cols, rows, &mut buffer);
        Ok(Spectrum {
            data: from_transposed(rows, cols, buffer)?,
        })
    }

    pub fn from_array(data: Array2<Complex<f64>>) -> Spectrum {
        Spectrum { data }
    }

    pub fn as_array(&self) -> &Array2<Complex<f64>> {
        &self.data
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Inverse 2D transform, normalized by `rows * cols`.
    ///
    /// Call on an unshifted spectrum.
    pub fn inverse(&self) -> Result<Array2<Complex<f64>>> {
        let (rows, cols) = self.non_empty_dim()?;
        let mut buffer = transposed(&self.data);
        // The transposed spectrum goes back through a second transposition,
        // so the result is in natural row-major order again.
        ifft_2d(rows, cols, &mut buffer);
        let scale = 1.0 / (rows * cols) as f64;
        buffer.iter_mut().for_each(|z| *z *= scale);
        Array2::from_shape_vec((rows, cols), buffer)
            .map_err(|e| FilterError::invalid(format!("inverse transform: {e}")))
    }

    /// Move the zero frequency from (0, 0) to (rows / 2, cols / 2).
    pub fn shift(&self) -> Result<Spectrum> {
        let (rows, cols) = self.non_empty_dim()?;
        let shifted = fftshift(rows, cols, &transposed(&self.data));
        Ok(Spectrum {
            data: from_transposed(rows, cols, shifted)?,
        })
    }

    /// Undo [`Spectrum::shift`].
    pub fn unshift(&self) -> Result<Spectrum> {
        let (rows, cols) = self.non_empty_dim()?;
        let unshifted = ifftshift(rows, cols, &transposed(&self.data));
        Ok(Spectrum {
            data: from_transposed(rows, cols, unshifted)?,
        })
    }

    /// Element-wise product with a real mask of the same shape.
    pub fn apply_mask(&self, mask: &Array2<f64>) -> Result<Spectrum> {
        if mask.dim() != self.data.dim() {
            return Err(FilterError::invalid(format!(
                "mask shape {:?} does not match spectrum shape {:?}",
                mask.dim(),
                self.data.dim()
            )));
        }
        Ok(Spectrum {
            data: Zip::from(&self.data)
                .and(mask)
                .map_collect(|&z, &m| z * m),
        })
    }

    /// `ln(1 + |F|)` min-max normalized to 0-255 for display.
    pub fn log_magnitude_u8(&self) -> Array2<u8> {
        let magnitude = self.data.mapv(|z| z.norm().ln_1p());
        let min = magnitude.fold(f64::INFINITY, |m, &v| m.min(v));
        let max = magnitude.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let range = max - min;

        if !(range > 0.0) {
            return Array2::zeros(magnitude.dim());
        }
        magnitude.mapv(|v| ((v - min) / range * 255.0) as u8)
    }

    fn non_empty_dim(&self) -> Result<(usize, usize)> {
        match self.data.dim() {
            (0, _) | (_, 0) => Err(FilterError::invalid("spectrum is empty")),
            dim => Ok(dim),
        }
    }
}

// fft2d keeps transforms transposed: a (rows, cols) spectrum lives in a
// row-major buffer of `cols` rows with `rows` samples each.

fn transposed(data: &Array2<Complex<f64>>) -> Vec<Complex<f64>> {
    data.t().iter().copied().collect()
}

fn from_transposed(
    rows: usize,
    cols: usize,
    buffer: Vec<Complex<f64>>,
) -> Result<Array2<Complex<f64>>> {
    Array2::from_shape_vec((cols, rows), buffer)
        .map(|a| a.reversed_axes())
        .map_err(|e| FilterError::invalid(format!("transposed spectrum: {e}")))
}

// ============================================================================
// Masks
// ============================================================================

/// Frequency mask shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterFamily {
    #[default]
    Ideal,
    Gaussian,
    Butterworth,
}

/// Whether the mask keeps frequencies inside or outside the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassType {
    #[default]
    Low,
    High,
}

impl FromStr for FilterFamily {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ideal" => Ok(FilterFamily::Ideal),
            "gaussian" => Ok(FilterFamily::Gaussian),
            "butterworth" => Ok(FilterFamily::Butterworth),
            _ => Err(FilterError::UnsupportedFilterKind(s.to_string())),
        }
    }
}

impl FromStr for PassType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(PassType::Low),
            "high" => Ok(PassType::High),
            _ => Err(FilterError::UnsupportedFilterKind(s.to_string())),
        }
    }
}

impl fmt::Display for FilterFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterFamily::Ideal => "ideal",
            FilterFamily::Gaussian => "gaussian",
            FilterFamily::Butterworth => "butterworth",
        })
    }
}

impl fmt::Display for PassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassType::Low => "low",
            PassType::High => "high",
        })
    }
}

/// Parameters of a frequency mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskSpec {
    pub family: FilterFamily,
    pub pass: PassType,
    /// Cutoff radius in frequency samples.
    pub cutoff: f64,
    /// Butterworth order; ignored by the other families.
    pub order: u32,
}

impl Default for MaskSpec {
    fn default() -> Self {
        MaskSpec {
            family: FilterFamily::Ideal,
            pass: PassType::Low,
            cutoff: 30.0,
            order: 2,
        }
    }
}

impl MaskSpec {
    pub fn new(family: FilterFamily, pass: PassType, cutoff: f64, order: u32) -> Self {
        MaskSpec {
            family,
            pass,
            cutoff,
            order,
        }
    }

    /// Parse the UI's family and pass tokens.
    pub fn from_tokens(family: &str, pass: &str, cutoff: f64, order: u32) -> Result<Self> {
        Ok(MaskSpec::new(family.parse()?, pass.parse()?, cutoff, order))
    }

    /// Check cutoff and order before any transform work.
    pub fn validate(&self) -> Result<()> {
        if !self.cutoff.is_finite() || self.cutoff <= 0.0 {
            return Err(FilterError::invalid(format!(
                "cutoff must be a positive radius, got {}",
                self.cutoff
            )));
        }
        if self.family == FilterFamily::Butterworth && self.order == 0 {
            return Err(FilterError::invalid("butterworth order must be at least 1"));
        }
        Ok(())
    }

    /// Build the mask for a (rows, cols) grid centered at (rows / 2, cols / 2).
    pub fn build(&self, rows: usize, cols: usize) -> Array2<f64> {
        let (crow, ccol) = (rows / 2, cols / 2);
        let cutoff = self.cutoff;
        let exponent = 2.0 * self.order as f64;

        Array2::from_shape_fn((rows, cols), |(y, x)| {
            let dy = y as f64 - crow as f64;
            let dx = x as f64 - ccol as f64;
            let dist_sq = dy * dy + dx * dx;

            match self.family {
                FilterFamily::Ideal => {
                    let low = if dist_sq.sqrt() <= cutoff { 1.0 } else { 0.0 };
                    self.select(low)
                }
                FilterFamily::Gaussian => {
                    let low = (-dist_sq / (2.0 * cutoff * cutoff)).exp();
                    self.select(low)
                }
                FilterFamily::Butterworth => {
                    let dist = if y == crow && x == ccol {
                        BUTTERWORTH_CENTER_EPSILON
                    } else {
                        dist_sq.sqrt()
                    };
                    match self.pass {
                        PassType::Low => 1.0 / (1.0 + (dist / cutoff).powf(exponent)),
                        PassType::High => 1.0 / (1.0 + (cutoff / dist).powf(exponent)),
                    }
                }
            }
        })
    }

    #[inline]
    fn select(&self, low: f64) -> f64 {
        match self.pass {
            PassType::Low => low,
            PassType::High => 1.0 - low,
        }
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Result of [`apply_frequency_filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyOutput {
    /// Filtered raster, same shape as the input.
    pub filtered: Raster,
    /// Log-magnitude spectrum per channel, for display only.
    pub spectrum: Raster,
}

/// Filter every channel of a 1- or 3-channel raster in the frequency domain.
///
/// # Arguments
/// * `image` - Input raster
/// * `spec` - Mask family, pass type, cutoff and order
///
/// # Returns
/// The filtered raster and its per-channel magnitude spectrum
pub fn apply_frequency_filter(image: &Raster, spec: &MaskSpec) -> Result<FrequencyOutput> {
    let planes = filter_planes(image, spec, true)?;
    let (filtered, spectra): (Vec<_>, Vec<_>) = planes.into_iter().unzip();
    Ok(FrequencyOutput {
        filtered: Raster::from_channels(filtered)?,
        spectrum: Raster::from_channels(spectra.into_iter().flatten().collect())?,
    })
}

/// Same as [`apply_frequency_filter`] without the display spectrum.
pub(crate) fn filter_only(image: &Raster, spec: &MaskSpec) -> Result<Raster> {
    let planes = filter_planes(image, spec, false)?;
    Raster::from_channels(planes.into_iter().map(|(filtered, _)| filtered).collect())
}

/// Log-magnitude spectrum of the grayscale version of `image`.
pub fn magnitude_spectrum(image: &Raster) -> Result<Raster> {
    image.ensure_non_empty("spectrum input")?;
    let gray = image.to_grayscale();
    let normalized = gray.channel(0).mapv(|v| v as f64 / 255.0);
    let display = Spectrum::forward(normalized.view())?.shift()?.log_magnitude_u8();
    Raster::from_channels(vec![display])
}

type FilteredPlane = (Array2<u8>, Option<Array2<u8>>);

fn filter_planes(image: &Raster, spec: &MaskSpec, with_spectrum: bool) -> Result<Vec<FilteredPlane>> {
    image.ensure_non_empty("frequency filter input")?;
    spec.validate()?;

    let (rows, cols) = (image.height(), image.width());
    debug!(
        "frequency filter: {} {}-pass, cutoff {}, order {}, {}x{}x{}",
        spec.family,
        spec.pass,
        spec.cutoff,
        spec.order,
        cols,
        rows,
        image.channels()
    );
    let mask = spec.build(rows, cols);

    (0..image.channels())
        .into_par_iter()
        .map(|c| {
            trace!("frequency filter: channel {c}");
            filter_channel(image.channel(c), &mask, with_spectrum)
        })
        .collect()
}

fn filter_channel(
    channel: ArrayView2<u8>,
    mask: &Array2<f64>,
    with_spectrum: bool,
) -> Result<FilteredPlane> {
    let normalized = channel.mapv(|v| v as f64 / 255.0);
    let centered = Spectrum::forward(normalized.view())?.shift()?;
    let display = with_spectrum.then(|| centered.log_magnitude_u8());

    let restored = centered.apply_mask(mask)?.unshift()?.inverse()?;
    let filtered = restored.mapv(|z| (z.norm() * 255.0).clamp(0.0, 255.0).round() as u8);

    Ok((filtered, display))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gray(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> Raster {
        let samples = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Raster::new(width, height, 1, samples).unwrap()
    }

    #[test]
    fn test_shift_moves_dc_to_center() {
        for (rows, cols) in [(4, 6), (5, 7), (1, 3)] {
            let mut data = Array2::<Complex<f64>>::zeros((rows, cols));
            data[[0, 0]] = Complex::new(1.0, 0.0);
            let shifted = Spectrum::from_array(data.clone()).shift().unwrap();
            assert_eq!(shifted.as_array()[[rows / 2, cols / 2]], Complex::new(1.0, 0.0));
            assert_eq!(shifted.unshift().unwrap().as_array(), &data);
        }
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let image = Array2::from_shape_fn((5, 6), |(y, x)| ((x * 7 + y * 3) % 11) as f64 / 10.0);

        let restored = Spectrum::forward(image.view())
            .and_then(|s| s.shift())
            .and_then(|s| s.unshift())
            .and_then(|s| s.inverse())
            .unwrap();

        for (z, &v) in restored.iter().zip(image.iter()) {
            assert_abs_diff_eq!(z.re, v, epsilon = 1e-9);
            assert_abs_diff_eq!(z.im, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_forward_dc_term_is_sum() {
        let image = Array2::from_elem((3, 4), 0.5);
        let spectrum = Spectrum::forward(image.view()).unwrap();
        assert_abs_diff_eq!(spectrum.as_array()[[0, 0]].re, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_masks_are_complementary() {
        for (rows, cols) in [(5, 7), (8, 8), (9, 4)] {
            for cutoff in [1.0, 3.5, 10.0] {
                for family in [FilterFamily::Ideal, FilterFamily::Gaussian] {
                    let low = MaskSpec::new(family, PassType::Low, cutoff, 2).build(rows, cols);
                    let high = MaskSpec::new(family, PassType::High, cutoff, 2).build(rows, cols);
                    for (l, h) in low.iter().zip(high.iter()) {
                        assert_abs_diff_eq!(*h, 1.0 - l, epsilon = 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_low_pass_center_is_one() {
        for family in [FilterFamily::Ideal, FilterFamily::Gaussian, FilterFamily::Butterworth] {
            let mask = MaskSpec::new(family, PassType::Low, 0.5, 3).build(6, 9);
            assert_abs_diff_eq!(mask[[3, 4]], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_butterworth_center_is_finite_for_every_order() {
        for cutoff in [1.0, 5.0, 40.0] {
            for order in [1, 2, 5] {
                let low = MaskSpec::new(FilterFamily::Butterworth, PassType::Low, cutoff, order)
                    .build(7, 7);
                let high = MaskSpec::new(FilterFamily::Butterworth, PassType::High, cutoff, order)
                    .build(7, 7);
                assert_abs_diff_eq!(low[[3, 3]], 1.0, epsilon = 1e-9);
                assert!(high[[3, 3]].is_finite());
                assert!(high[[3, 3]] < 1e-9);
                assert!(low.iter().chain(high.iter()).all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }

    #[test]
    fn test_ideal_mask_boundary() {
        let mask = MaskSpec::new(FilterFamily::Ideal, PassType::Low, 2.0, 1).build(9, 9);
        assert_eq!(mask[[4, 6]], 1.0);
        assert_eq!(mask[[4, 7]], 0.0);
        assert_eq!(mask[[6, 6]], 0.0);
    }

    #[test]
    fn test_low_plus_high_reconstructs_spectrum() {
        let image = Array2::from_shape_fn((8, 10), |(y, x)| ((x * x + 3 * y) % 17) as f64 / 16.0);
        let centered = Spectrum::forward(image.view()).unwrap().shift().unwrap();

        let low = MaskSpec::new(FilterFamily::Ideal, PassType::Low, 3.0, 1).build(8, 10);
        let high = MaskSpec::new(FilterFamily::Ideal, PassType::High, 3.0, 1).build(8, 10);
        let sum = centered.apply_mask(&low).unwrap().as_array()
            + centered.apply_mask(&high).unwrap().as_array();

        for (a, b) in sum.iter().zip(centered.as_array().iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
        }

        let restored = Spectrum::from_array(sum).unshift().unwrap().inverse().unwrap();
        for (z, &v) in restored.iter().zip(image.iter()) {
            assert_abs_diff_eq!(z.norm(), v, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pass_all_mask_returns_original_raster() {
        let img = gray(9, 6, |x, y| (x * 25 + y * 3) as u8);
        let spec = MaskSpec::new(FilterFamily::Ideal, PassType::Low, 1e6, 1);

        let out = apply_frequency_filter(&img, &spec).unwrap();

        assert_eq!(out.filtered, img);
    }

    #[test]
    fn test_high_pass_removes_constant_image() {
        let img = gray(8, 8, |_, _| 100);
        let spec = MaskSpec::new(FilterFamily::Ideal, PassType::High, 2.0, 1);

        let out = apply_frequency_filter(&img, &spec).unwrap();

        assert!(out.filtered.view().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_gaussian_low_pass_keeps_constant_image() {
        let img = gray(8, 6, |_, _| 100);
        let spec = MaskSpec::new(FilterFamily::Gaussian, PassType::Low, 4.0, 1);

        let out = apply_frequency_filter(&img, &spec).unwrap();

        assert!(out.filtered.view().iter().all(|&v| v == 100));
        // Only the DC term carries energy.
        assert_eq!(out.spectrum.as_array()[[3, 4, 0]], 255);
    }

    #[test]
    fn test_shape_preserved_for_color_input() {
        let samples = (0..5 * 7 * 3).map(|i| (i * 13 % 256) as u8).collect();
        let img = Raster::new(7, 5, 3, samples).unwrap();
        for family in [FilterFamily::Ideal, FilterFamily::Gaussian, FilterFamily::Butterworth] {
            for pass in [PassType::Low, PassType::High] {
                let out = apply_frequency_filter(&img, &MaskSpec::new(family, pass, 2.0, 2)).unwrap();
                assert_eq!(
                    (out.filtered.width(), out.filtered.height(), out.filtered.channels()),
                    (7, 5, 3)
                );
                assert_eq!(out.spectrum.channels(), 3);
            }
        }
    }

    #[test]
    fn test_channels_filtered_independently() {
        let samples = (0..4 * 4)
            .flat_map(|i| [(i * 16) as u8, 0, 255])
            .collect();
        let img = Raster::new(4, 4, 3, samples).unwrap();
        let spec = MaskSpec::new(FilterFamily::Gaussian, PassType::Low, 1.0, 1);

        let out = apply_frequency_filter(&img, &spec).unwrap();

        assert!(out.filtered.channel(1).iter().all(|&v| v == 0));
        assert!(out.filtered.channel(2).iter().all(|&v| v == 255));
    }

    #[test]
    fn test_unknown_tokens_are_unsupported() {
        assert!(matches!(
            MaskSpec::from_tokens("box", "low", 10.0, 2),
            Err(FilterError::UnsupportedFilterKind(_))
        ));
        assert!(matches!(
            MaskSpec::from_tokens("gaussian", "band", 10.0, 2),
            Err(FilterError::UnsupportedFilterKind(_))
        ));
        assert_eq!(
            MaskSpec::from_tokens("Butterworth", "HIGH", 10.0, 3).unwrap(),
            MaskSpec::new(FilterFamily::Butterworth, PassType::High, 10.0, 3)
        );
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let img = gray(4, 4, |_, _| 1);
        let zero_cutoff = MaskSpec::new(FilterFamily::Gaussian, PassType::Low, 0.0, 2);
        let zero_order = MaskSpec::new(FilterFamily::Butterworth, PassType::Low, 5.0, 0);
        assert!(apply_frequency_filter(&img, &zero_cutoff).is_err());
        assert!(apply_frequency_filter(&img, &zero_order).is_err());

        let empty = Raster::zeros(3, 0, 1).unwrap();
        assert!(matches!(
            apply_frequency_filter(&empty, &MaskSpec::default()),
            Err(FilterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_magnitude_spectrum_is_gray() {
        let samples = (0..6 * 6 * 3).map(|i| (i % 7 * 30) as u8).collect();
        let img = Raster::new(6, 6, 3, samples).unwrap();

        let spectrum = magnitude_spectrum(&img).unwrap();

        assert_eq!((spectrum.width(), spectrum.height(), spectrum.channels()), (6, 6, 1));
        assert_eq!(spectrum.view().iter().copied().max(), Some(255));
    }
}
