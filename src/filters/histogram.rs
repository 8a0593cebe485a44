//! Per-channel intensity histograms and their cumulative distributions.

use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::error::Result;
use crate::raster::Raster;

/// Number of 8-bit intensity bins.
pub const BINS: usize = 256;

/// Pixel counts for the 256 intensity levels of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BINS],
}

impl Histogram {
    /// Count the samples of one channel plane.
    pub fn from_plane(plane: ArrayView2<u8>) -> Self {
        let mut counts = [0u64; BINS];
        for &v in plane.iter() {
            counts[v as usize] += 1;
        }
        Histogram { counts }
    }

    pub fn counts(&self) -> &[u64; BINS] {
        &self.counts
    }

    /// Total number of counted samples.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Running sum of the counts normalized so the last bin is 1.
    ///
    /// An empty histogram has an all-zero distribution.
    pub fn cdf(&self) -> [f64; BINS] {
        let mut cdf = [0.0; BINS];
        let total = self.total();
        if total == 0 {
            return cdf;
        }

        let mut running = 0u64;
        for (out, &count) in cdf.iter_mut().zip(self.counts.iter()) {
            running += count;
            *out = running as f64 / total as f64;
        }
        cdf
    }
}

/// One histogram per channel, in channel order (gray, or R, G, B).
pub fn histograms(image: &Raster) -> Result<Vec<Histogram>> {
    image.ensure_non_empty("histogram input")?;
    Ok((0..image.channels())
        .into_par_iter()
        .map(|c| Histogram::from_plane(image.channel(c)))
        .collect())
}

/// Histogram of the grayscale version of `image`.
pub fn gray_histogram(image: &Raster) -> Result<Histogram> {
    image.ensure_non_empty("histogram input")?;
    Ok(Histogram::from_plane(image.to_grayscale().channel(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_counts_per_channel() {
        let img = Raster::new(2, 2, 3, vec![0, 10, 255, 0, 10, 254, 5, 10, 255, 0, 11, 255]).unwrap();

        let hists = histograms(&img).unwrap();

        assert_eq!(hists.len(), 3);
        assert_eq!(hists[0].counts()[0], 3);
        assert_eq!(hists[0].counts()[5], 1);
        assert_eq!(hists[1].counts()[10], 3);
        assert_eq!(hists[1].counts()[11], 1);
        assert_eq!(hists[2].counts()[255], 3);
        assert!(hists.iter().all(|h| h.total() == 4));
    }

    #[test]
    fn test_cdf_is_monotone_and_ends_at_one() {
        let samples = (0..40u32).map(|i| (i * 37 % 256) as u8).collect();
        let img = Raster::new(8, 5, 1, samples).unwrap();

        let cdf = gray_histogram(&img).unwrap().cdf();

        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
        assert_abs_diff_eq!(cdf[BINS - 1], 1.0);
    }

    #[test]
    fn test_cdf_steps_at_occupied_bins() {
        let img = Raster::new(4, 1, 1, vec![10, 10, 10, 200]).unwrap();

        let cdf = gray_histogram(&img).unwrap().cdf();

        assert_eq!(cdf[9], 0.0);
        assert_abs_diff_eq!(cdf[10], 0.75);
        assert_abs_diff_eq!(cdf[199], 0.75);
        assert_abs_diff_eq!(cdf[200], 1.0);
    }

    #[test]
    fn test_gray_histogram_converts_color() {
        let img = Raster::new(1, 1, 3, vec![100, 100, 100]).unwrap();
        assert_eq!(gray_histogram(&img).unwrap().counts()[100], 1);
    }

    #[test]
    fn test_empty_histogram_has_zero_cdf() {
        let hist = Histogram::from_plane(ndarray::Array2::<u8>::zeros((0, 3)).view());
        assert!(hist.cdf().iter().all(|&v| v == 0.0));

        let empty = Raster::zeros(0, 0, 3).unwrap();
        assert!(matches!(histograms(&empty), Err(FilterError::InvalidInput(_))));
    }
}
