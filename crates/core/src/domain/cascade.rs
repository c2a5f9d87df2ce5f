//! Butterworth high-pass / low-pass cascades of second-order sections
//!
//! An order-N Butterworth response (N even) is realised as N/2 biquads that
//! share the cutoff frequency and differ only in Q. Section k uses
//!
//! ```text
//! Q_k = 1 / (2 cos((2k + 1) π / (2N)))     k = 0 .. N/2 - 1
//! ```
//!
//! which places each section on one conjugate pole pair of the analog
//! prototype. Sections are emitted in increasing k; the realised response
//! depends on cascading them in that order.
//!
//! Cascades are stored inline (no heap allocation) so a configuration pass can
//! run on the audio thread.

use crate::domain::audio::{AudioError, Result};
use crate::domain::filter::BiquadCoeffs;
use crate::domain::settings::Slope;
use std::f64::consts::PI;

/// Number of section slots in a cut band
pub const MAX_SECTIONS: usize = 4;

/// Highest order a cut band can realise
pub const MAX_ORDER: usize = 2 * MAX_SECTIONS;

/// Response type of a cut band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// Removes content below the cutoff (low-cut band)
    HighPass,
    /// Removes content above the cutoff (high-cut band)
    LowPass,
}

/// Ordered sequence of 1..=4 second-order coefficient sets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cascade {
    sections: [BiquadCoeffs; MAX_SECTIONS],
    len: usize,
}

impl Cascade {
    /// Design a Butterworth cascade of the given (even) order
    ///
    /// Rejects odd orders, orders outside 2..=8, non-positive sample rates and
    /// cutoffs outside (0, Nyquist).
    pub fn butterworth(kind: CutKind, freq: f32, sample_rate: f64, order: usize) -> Result<Self> {
        if order < 2 || order > MAX_ORDER || order % 2 != 0 {
            return Err(AudioError::InvalidConfiguration(format!(
                "cascade order must be even and within 2..={MAX_ORDER}, got {order}"
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AudioError::InvalidConfiguration(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if !(freq > 0.0 && f64::from(freq) < sample_rate / 2.0) {
            return Err(AudioError::InvalidConfiguration(format!(
                "cutoff {freq} Hz outside (0, {}) Hz",
                sample_rate / 2.0
            )));
        }

        Ok(Self::design(kind, freq, sample_rate, order))
    }

    /// Butterworth high-pass (low-cut) cascade
    pub fn highpass(freq: f32, sample_rate: f64, order: usize) -> Result<Self> {
        Self::butterworth(CutKind::HighPass, freq, sample_rate, order)
    }

    /// Butterworth low-pass (high-cut) cascade
    pub fn lowpass(freq: f32, sample_rate: f64, order: usize) -> Result<Self> {
        Self::butterworth(CutKind::LowPass, freq, sample_rate, order)
    }

    /// Cascade for a cut-band slope
    ///
    /// Slopes always map to a legal order, so this does not validate; the
    /// caller guarantees a positive sample rate and a sub-Nyquist cutoff.
    pub fn for_slope(kind: CutKind, freq: f32, sample_rate: f64, slope: Slope) -> Self {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        Self::design(kind, freq, sample_rate, slope.order())
    }

    fn design(kind: CutKind, freq: f32, sample_rate: f64, order: usize) -> Self {
        let len = order / 2;
        let mut sections = [BiquadCoeffs::default(); MAX_SECTIONS];

        for (k, section) in sections.iter_mut().take(len).enumerate() {
            let q = section_q(order, k);
            *section = match kind {
                CutKind::HighPass => BiquadCoeffs::high_pass(sample_rate, freq, q),
                CutKind::LowPass => BiquadCoeffs::low_pass(sample_rate, freq, q),
            };
        }

        Self { sections, len }
    }

    /// Number of sections (order / 2)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sections in cascade order
    pub fn as_slice(&self) -> &[BiquadCoeffs] {
        &self.sections[..self.len]
    }

    pub fn get(&self, index: usize) -> Option<&BiquadCoeffs> {
        self.as_slice().get(index)
    }

    /// Combined magnitude response of all sections in decibels
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        self.as_slice()
            .iter()
            .map(|c| c.magnitude_db(freq, sample_rate))
            .sum()
    }
}

/// Q of the k-th section of an order-N Butterworth cascade
fn section_q(order: usize, k: usize) -> f64 {
    let angle = (2 * k + 1) as f64 * PI / (2 * order) as f64;
    1.0 / (2.0 * angle.cos())
}
