//! Second-order IIR filter stages
//!
//! This module provides:
//! - Biquad coefficient sets (peaking, high-pass, low-pass designs)
//! - A Direct Form I filter stage with an enable/bypass flag
//! - The [`Effect`] trait implemented by stages and channel chains
//!
//! Coefficient designs are evaluated in `f64` and stored as `f32`, the
//! precision the audio path runs at.

use crate::domain::audio::Result;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Core trait for anything that filters a mono buffer in place
pub trait Effect: Send + Sync {
    /// Process a buffer of audio samples in-place
    ///
    /// # Requirements
    /// - No allocations in the hot path
    /// - Handle buffer of any size
    fn process(&mut self, buffer: &mut [f32]) -> Result<()>;

    /// Reset filter memory to silence
    fn reset(&mut self);

    /// Check if the effect is bypassed (zero processing overhead when true)
    fn is_bypassed(&self) -> bool;

    /// Toggle bypass state
    fn set_bypass(&mut self, bypass: bool);

    /// Name for debugging/display
    fn name(&self) -> &str;
}

/// Biquad filter coefficients
///
/// Normalised so that a0 == 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    /// Numerator coefficients
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    /// Denominator coefficients (a0 is normalized to 1.0)
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        // Unity gain (no filtering)
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

impl BiquadCoeffs {
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        }
    }

    /// Calculate coefficients for a peaking EQ filter
    ///
    /// Boosts or cuts frequencies around a center frequency.
    ///
    /// # Parameters
    /// - `sample_rate`: Audio sample rate in Hz (> 0)
    /// - `freq`: Center frequency in Hz
    /// - `q`: Quality factor (> 0)
    /// - `gain`: Linear gain at the center frequency (`10^(dB/20)`)
    #[must_use]
    pub fn peak(sample_rate: f64, freq: f32, q: f32, gain: f32) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        debug_assert!(q > 0.0, "quality must be positive");
        debug_assert!(gain > 0.0, "linear gain must be positive");

        let a = f64::from(gain).sqrt();
        let w0 = 2.0 * PI * f64::from(freq) / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * f64::from(q));

        Self::normalized(
            1.0 + alpha * a,
            -2.0 * cos_w0,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w0,
            1.0 - alpha / a,
        )
    }

    /// Calculate coefficients for a second-order high-pass filter
    ///
    /// The cutoff is pre-warped for the bilinear transform.
    #[must_use]
    pub fn high_pass(sample_rate: f64, freq: f32, q: f64) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        debug_assert!(q > 0.0, "quality must be positive");

        let n = 1.0 / (PI * f64::from(freq) / sample_rate).tan();
        let n_squared = n * n;
        let inv_q = 1.0 / q;

        Self::normalized(
            n_squared,
            -2.0 * n_squared,
            n_squared,
            1.0 + inv_q * n + n_squared,
            2.0 * (1.0 - n_squared),
            1.0 - inv_q * n + n_squared,
        )
    }

    /// Calculate coefficients for a second-order low-pass filter
    #[must_use]
    pub fn low_pass(sample_rate: f64, freq: f32, q: f64) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        debug_assert!(q > 0.0, "quality must be positive");

        let n = 1.0 / (PI * f64::from(freq) / sample_rate).tan();
        let n_squared = n * n;
        let inv_q = 1.0 / q;

        Self::normalized(
            1.0,
            2.0,
            1.0,
            1.0 + inv_q * n + n_squared,
            2.0 * (1.0 - n_squared),
            1.0 - inv_q * n + n_squared,
        )
    }

    /// Complex frequency response at `freq`
    pub fn response(&self, freq: f64, sample_rate: f64) -> Complex64 {
        let w = 2.0 * PI * freq / sample_rate;
        // z^-1 on the unit circle
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;

        let num = f64::from(self.b0) + f64::from(self.b1) * z1 + f64::from(self.b2) * z2;
        let den = 1.0 + f64::from(self.a1) * z1 + f64::from(self.a2) * z2;
        num / den
    }

    /// Magnitude response at `freq` in decibels
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        20.0 * self.response(freq, sample_rate).norm().max(1e-12).log10()
    }

    /// True if every coefficient is finite
    pub fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite())
    }
}

/// Stateful biquad filter using Direct Form I
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    // Previous input samples (x[n-1], x[n-2])
    x1: f32,
    x2: f32,
    // Previous output samples (y[n-1], y[n-2])
    y1: f32,
    y2: f32,
}

impl BiquadFilter {
    /// Create a new biquad filter with given coefficients
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Replace the coefficient set
    ///
    /// The whole set is copied in one assignment; filter memory is kept so
    /// coefficient changes do not click.
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Process a single sample
    #[inline]
    fn process_sample(&mut self, x: f32) -> f32 {
        // Direct Form I: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
        //                        - a1*y[n-1] - a2*y[n-2]
        let y = self.coeffs.b0 * x + self.coeffs.b1 * self.x1 + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Process a buffer of samples
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// One slot of a chain: a biquad plus its bypass flag
///
/// A bypassed stage passes audio through untouched and never reads its
/// coefficients, so stale coefficients in a bypassed slot are harmless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStage {
    filter: BiquadFilter,
    bypassed: bool,
}

impl FilterStage {
    /// New active stage with unity coefficients
    pub fn new() -> Self {
        Self {
            filter: BiquadFilter::new(BiquadCoeffs::default()),
            bypassed: false,
        }
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        self.filter.coeffs()
    }

    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.filter.set_coeffs(coeffs);
    }
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for FilterStage {
    fn process(&mut self, buffer: &mut [f32]) -> Result<()> {
        if !self.bypassed {
            self.filter.process(buffer);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.filter.reset();
    }

    fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.bypassed = bypass;
    }

    fn name(&self) -> &str {
        "FilterStage"
    }
}
