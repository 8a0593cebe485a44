//! Noise generation: Gaussian, uniform, salt-and-pepper.
//!
//! Every function takes the random number generator explicitly, so a seeded
//! generator reproduces the same noisy raster. `amount` runs from 0 (no
//! noise) to 1 (strongest):
//!
//! | Kind | Per-sample effect |
//! |------|-------------------|
//! | Gaussian | adds `N(0, (50 * amount)²)` |
//! | Uniform | adds `U(-50 * amount, 50 * amount)` |
//! | Salt & pepper | whole pixel set to 0 or 255, each with probability `amount / 2` |
//!
//! Additive results are clamped to [0, 255] and truncated.

use std::fmt;
use std::str::FromStr;

use log::debug;
use ndarray::{Array3, Axis};
use rand::Rng;

use crate::error::{FilterError, Result};
use crate::raster::Raster;

/// Standard deviation (Gaussian) or half-width (uniform) at `amount = 1`.
pub const NOISE_SCALE: f64 = 50.0;

/// Noise model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    Gaussian,
    Uniform,
    SaltAndPepper,
}

impl FromStr for NoiseKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Ok(NoiseKind::Gaussian),
            "uniform" => Ok(NoiseKind::Uniform),
            "salt & pepper" | "salt_pepper" | "salt-and-pepper" | "salt and pepper" => {
                Ok(NoiseKind::SaltAndPepper)
            }
            _ => Err(FilterError::UnsupportedFilterKind(s.to_string())),
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoiseKind::Gaussian => "gaussian",
            NoiseKind::Uniform => "uniform",
            NoiseKind::SaltAndPepper => "salt & pepper",
        })
    }
}

/// Add noise to a 1- or 3-channel raster.
///
/// # Arguments
/// * `image` - Input raster
/// * `kind` - Noise model
/// * `amount` - Strength in [0, 1]
/// * `rng` - Random source; samples are drawn in row-major order
///
/// # Returns
/// Noisy raster with the input shape
pub fn add_noise<R: Rng + ?Sized>(
    image: &Raster,
    kind: NoiseKind,
    amount: f64,
    rng: &mut R,
) -> Result<Raster> {
    image.ensure_non_empty("noise input")?;
    if !(0.0..=1.0).contains(&amount) {
        return Err(FilterError::invalid(format!(
            "noise amount must lie in [0, 1], got {amount}"
        )));
    }
    debug!(
        "noise: {kind}, amount {amount}, {}x{}x{}",
        image.width(),
        image.height(),
        image.channels()
    );

    let input = image.as_array();
    let output = match kind {
        NoiseKind::Gaussian => {
            let sigma = amount * NOISE_SCALE;
            input.mapv(|v| offset(v, standard_normal(rng) * sigma))
        }
        NoiseKind::Uniform => {
            let half_width = amount * NOISE_SCALE;
            input.mapv(|v| offset(v, (rng.random::<f64>() * 2.0 - 1.0) * half_width))
        }
        NoiseKind::SaltAndPepper => salt_and_pepper(input, amount, rng),
    };

    Raster::from_array(output)
}

/// Additive noise clamped to the 8-bit range.
#[inline]
fn offset(v: u8, noise: f64) -> u8 {
    (v as f64 + noise).clamp(0.0, 255.0) as u8
}

/// Box-Muller transform over two uniform draws.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = rng.random::<f64>().max(1e-12);
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// One draw per pixel; a hit overwrites every channel of that pixel.
fn salt_and_pepper<R: Rng + ?Sized>(input: &Array3<u8>, amount: f64, rng: &mut R) -> Array3<u8> {
    let mut output = input.clone();
    let half = amount / 2.0;

    for mut row in output.axis_iter_mut(Axis(0)) {
        for mut pixel in row.axis_iter_mut(Axis(0)) {
            let r = rng.random::<f64>();
            if r < half {
                pixel.fill(0);
            } else if r > 1.0 - half {
                pixel.fill(255);
            }
        }
    }
    output
}
