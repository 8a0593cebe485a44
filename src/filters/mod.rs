//! Filter modules for the transform and filtering engine.
//!
//! ## Supported Formats
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | Grayscale8 | (H, W, 1) | u8 | Single intensity channel, 0-255 |
//! | RGB8 | (H, W, 3) | u8 | Red, green, blue, 0-255 |
//!
//! Edge operators require grayscale input; every other filter accepts both
//! formats.
//!
//! ## Architecture
//!
//! - **Pure functions** - Inputs are borrowed, outputs freshly allocated
//! - **Validate first** - Bad rasters and parameters fail before transform work
//! - **Parallel channels** - Channels are filtered independently with rayon
//!   and reassembled in their original order
//!
//! ## Filter Categories
//!
//! - **Spatial**: convolution (zero or edge padding), smoothing
//! - **Edge detection**: Sobel, Prewitt, Roberts, Canny
//! - **Frequency**: ideal, Gaussian, Butterworth low/high-pass
//! - **Composition**: hybrid images, distance pyramid
//! - **Noise**: Gaussian, uniform, salt & pepper (caller-supplied RNG)
//! - **Statistics**: per-channel histograms and CDFs

pub mod convolution;
pub mod edge;
pub mod frequency;
pub mod histogram;
pub mod hybrid;
pub mod noise;
pub mod resample;
pub mod smoothing;
