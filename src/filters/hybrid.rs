//! Hybrid image composition.
//!
//! A hybrid image keeps the low frequencies of one picture and the high
//! frequencies of another. Up close the high-frequency detail dominates; from
//! a distance (or downscaled) the low-frequency structure takes over.
//!
//! Both components are produced by the same Gaussian frequency filter used by
//! [`apply_frequency_filter`](super::frequency::apply_frequency_filter),
//! without its display spectrum, then blended as
//! `alpha * low + (1 - alpha) * high`.

use log::debug;
use ndarray::Zip;

use super::frequency::{filter_only, FilterFamily, MaskSpec, PassType};
use super::resample::{downscale_half, resize_area};
use crate::error::{FilterError, Result};
use crate::raster::Raster;

/// Pyramid levels stop once either dimension falls below this size.
pub const MIN_PYRAMID_SIZE: usize = 20;

/// Default number of levels returned by [`scale_pyramid`].
pub const DEFAULT_PYRAMID_LEVELS: usize = 5;

/// Blend parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridParams {
    /// Gaussian low-pass cutoff applied to the low-frequency source.
    pub low_cutoff: f64,
    /// Gaussian high-pass cutoff applied to the high-frequency source.
    pub high_cutoff: f64,
    /// Weight of the low component, in [0, 1].
    pub alpha: f64,
}

impl Default for HybridParams {
    fn default() -> Self {
        HybridParams {
            low_cutoff: 30.0,
            high_cutoff: 20.0,
            alpha: 0.5,
        }
    }
}

impl HybridParams {
    fn low_mask(&self) -> MaskSpec {
        MaskSpec::new(FilterFamily::Gaussian, PassType::Low, self.low_cutoff, 1)
    }

    fn high_mask(&self) -> MaskSpec {
        MaskSpec::new(FilterFamily::Gaussian, PassType::High, self.high_cutoff, 1)
    }

    /// Check alpha and both cutoffs.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(FilterError::invalid(format!(
                "alpha must lie in [0, 1], got {}",
                self.alpha
            )));
        }
        self.low_mask().validate()?;
        self.high_mask().validate()
    }
}

/// Output of [`compose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HybridImage {
    pub hybrid: Raster,
    pub low_component: Raster,
    pub high_component: Raster,
}

/// Combine the low frequencies of `low_source` with the high frequencies of
/// `high_source`.
///
/// `high_source` is area-resampled to the size of `low_source`. If only one
/// input is single-channel it is replicated to three channels first.
///
/// # Arguments
/// * `low_source` - Contributes the low-frequency structure
/// * `high_source` - Contributes the high-frequency detail
/// * `params` - Cutoffs and blend weight
///
/// # Returns
/// The hybrid image together with both filtered components
pub fn compose(low_source: &Raster, high_source: &Raster, params: &HybridParams) -> Result<HybridImage> {
    low_source.ensure_non_empty("low-frequency source")?;
    high_source.ensure_non_empty("high-frequency source")?;
    params.validate()?;

    debug!(
        "hybrid: low {}x{}x{} (cutoff {}), high {}x{}x{} (cutoff {}), alpha {}",
        low_source.width(),
        low_source.height(),
        low_source.channels(),
        params.low_cutoff,
        high_source.width(),
        high_source.height(),
        high_source.channels(),
        params.high_cutoff,
        params.alpha
    );

    let high_resized = resize_area(high_source, low_source.width(), low_source.height())?;
    let (low_input, high_input) = match (low_source.channels(), high_resized.channels()) {
        (1, 3) => (low_source.to_three_channel(), high_resized),
        (3, 1) => (low_source.clone(), high_resized.to_three_channel()),
        _ => (low_source.clone(), high_resized),
    };

    let low_component = filter_only(&low_input, &params.low_mask())?;
    let high_component = filter_only(&high_input, &params.high_mask())?;

    let alpha = params.alpha;
    let blended = Zip::from(low_component.as_array())
        .and(high_component.as_array())
        .map_collect(|&low, &high| {
            let v = alpha * low as f64 + (1.0 - alpha) * high as f64;
            v.clamp(0.0, 255.0).round() as u8
        });

    Ok(HybridImage {
        hybrid: Raster::from_array(blended)?,
        low_component,
        high_component,
    })
}

/// Progressively halved copies of a hybrid image, full resolution first.
///
/// Halving stops after `levels` entries or once the current level has a
/// dimension below [`MIN_PYRAMID_SIZE`].
pub fn scale_pyramid(hybrid: &Raster, levels: usize) -> Result<Vec<Raster>> {
    hybrid.ensure_non_empty("pyramid input")?;

    let mut pyramid = vec![hybrid.clone()];
    for _ in 1..levels {
        let Some(current) = pyramid.last() else { break };
        if current.width() < MIN_PYRAMID_SIZE || current.height() < MIN_PYRAMID_SIZE {
            break;
        }
        let next = downscale_half(current)?;
        pyramid.push(next);
    }
    Ok(pyramid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::frequency::apply_frequency_filter;

    fn pattern(width: usize, height: usize, channels: usize, seed: usize) -> Raster {
        let samples = (0..width * height * channels)
            .map(|i| ((i * 31 + seed * 17) % 256) as u8)
            .collect();
        Raster::new(width, height, channels, samples).unwrap()
    }

    #[test]
    fn test_alpha_one_returns_low_component() {
        let params = HybridParams {
            alpha: 1.0,
            ..HybridParams::default()
        };
        let out = compose(&pattern(16, 12, 3, 1), &pattern(16, 12, 3, 2), &params).unwrap();
        assert_eq!(out.hybrid, out.low_component);
    }

    #[test]
    fn test_alpha_zero_returns_high_component() {
        let params = HybridParams {
            alpha: 0.0,
            low_cutoff: 5.0,
            high_cutoff: 3.0,
        };
        let out = compose(&pattern(10, 10, 1, 3), &pattern(10, 10, 1, 4), &params).unwrap();
        assert_eq!(out.hybrid, out.high_component);
    }

    #[test]
    fn test_high_source_resized_and_promoted() {
        let low = pattern(12, 8, 1, 1);
        let high = pattern(30, 25, 3, 2);

        let out = compose(&low, &high, &HybridParams::default()).unwrap();

        for r in [&out.hybrid, &out.low_component, &out.high_component] {
            assert_eq!((r.width(), r.height(), r.channels()), (12, 8, 3));
        }
    }

    #[test]
    fn test_gray_high_source_is_promoted_to_color() {
        let out = compose(&pattern(9, 9, 3, 1), &pattern(4, 4, 1, 2), &HybridParams::default()).unwrap();
        assert_eq!(out.hybrid.channels(), 3);
        // Replicated channels stay identical after filtering.
        let high = &out.high_component;
        assert_eq!(high.channel(0), high.channel(1));
        assert_eq!(high.channel(1), high.channel(2));
    }

    #[test]
    fn test_blend_is_weighted_average() {
        let params = HybridParams {
            alpha: 0.25,
            ..HybridParams::default()
        };
        let out = compose(&pattern(8, 8, 1, 5), &pattern(8, 8, 1, 6), &params).unwrap();

        let hybrid = out.hybrid.as_array();
        let low = out.low_component.as_array();
        let high = out.high_component.as_array();
        for ((h, l), g) in hybrid.iter().zip(low.iter()).zip(high.iter()) {
            let expected = (0.25 * *l as f64 + 0.75 * *g as f64).round() as u8;
            assert_eq!(*h, expected);
        }
    }

    #[test]
    fn test_components_match_frequency_filter_output() {
        let low = pattern(10, 8, 3, 7);
        let high = pattern(10, 8, 3, 8);
        let params = HybridParams::default();

        let out = compose(&low, &high, &params).unwrap();

        let low_ref = apply_frequency_filter(&low, &params.low_mask()).unwrap();
        let high_ref = apply_frequency_filter(&high, &params.high_mask()).unwrap();
        assert_eq!(out.low_component, low_ref.filtered);
        assert_eq!(out.high_component, high_ref.filtered);
    }

    #[test]
    fn test_empty_input_is_rejected_before_work() {
        let empty = Raster::zeros(0, 0, 3).unwrap();
        let img = pattern(4, 4, 3, 0);
        assert!(matches!(
            compose(&empty, &img, &HybridParams::default()),
            Err(FilterError::InvalidInput(_))
        ));
        assert!(matches!(
            compose(&img, &empty, &HybridParams::default()),
            Err(FilterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_alpha_out_of_range_is_rejected() {
        let img = pattern(4, 4, 1, 0);
        for alpha in [-0.1, 1.5, f64::NAN] {
            let params = HybridParams {
                alpha,
                ..HybridParams::default()
            };
            assert!(compose(&img, &img, &params).is_err());
        }
    }

    #[test]
    fn test_pyramid_stops_below_minimum_size() {
        let img = Raster::zeros(100, 45, 1).unwrap();

        let levels = scale_pyramid(&img, DEFAULT_PYRAMID_LEVELS).unwrap();

        let sizes: Vec<_> = levels.iter().map(|r| (r.width(), r.height())).collect();
        assert_eq!(sizes, vec![(100, 45), (50, 22), (25, 11)]);
    }

    #[test]
    fn test_pyramid_respects_level_count() {
        let img = Raster::zeros(640, 640, 3).unwrap();
        let levels = scale_pyramid(&img, 3).unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[2].width(), 160);
        assert_eq!(scale_pyramid(&img, 1).unwrap().len(), 1);
    }
}
