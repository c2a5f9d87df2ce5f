//! Settings snapshot → filter coefficients → channel chains
//!
//! A configuration pass computes every coefficient set first
//! ([`ChainCoefficients::compute`]) and only then writes them into the two
//! channel chains, so the chains never end up describing different settings.
//! Both chains receive their own copy of the same values.

use crate::domain::cascade::{Cascade, CutKind};
use crate::domain::chain::{ChainPosition, ChannelChain};
use crate::domain::filter::BiquadCoeffs;
use crate::domain::settings::ChainSettings;
use tracing::trace;

/// Every coefficient set of one configuration pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub peak: BiquadCoeffs,
    pub low_cut: Cascade,
    pub high_cut: Cascade,
}

impl ChainCoefficients {
    pub fn compute(settings: &ChainSettings, sample_rate: f64) -> Self {
        Self {
            peak: make_peak_filter(settings, sample_rate),
            low_cut: make_low_cut_filter(settings, sample_rate),
            high_cut: make_high_cut_filter(settings, sample_rate),
        }
    }
}

/// Peaking EQ coefficients for the snapshot's peak band
pub fn make_peak_filter(settings: &ChainSettings, sample_rate: f64) -> BiquadCoeffs {
    BiquadCoeffs::peak(
        sample_rate,
        settings.peak_freq,
        settings.peak_quality,
        settings.peak_gain_linear(),
    )
}

/// High-pass cascade for the low-cut band
pub fn make_low_cut_filter(settings: &ChainSettings, sample_rate: f64) -> Cascade {
    Cascade::for_slope(
        CutKind::HighPass,
        settings.low_cut_freq,
        sample_rate,
        settings.low_cut_slope,
    )
}

/// Low-pass cascade for the high-cut band
pub fn make_high_cut_filter(settings: &ChainSettings, sample_rate: f64) -> Cascade {
    Cascade::for_slope(
        CutKind::LowPass,
        settings.high_cut_freq,
        sample_rate,
        settings.high_cut_slope,
    )
}

/// Write one pass worth of coefficients and bypass flags into a chain
pub fn update_channel_chain(
    chain: &mut ChannelChain,
    coefficients: &ChainCoefficients,
    settings: &ChainSettings,
) {
    chain.peak_mut().set_coeffs(coefficients.peak);
    chain.low_cut_mut().apply_cascade(&coefficients.low_cut);
    chain.high_cut_mut().apply_cascade(&coefficients.high_cut);

    chain.set_position_bypassed(ChainPosition::LowCut, settings.low_cut_bypassed);
    chain.set_position_bypassed(ChainPosition::Peak, settings.peak_bypassed);
    chain.set_position_bypassed(ChainPosition::HighCut, settings.high_cut_bypassed);
}

/// Run one configuration pass over both channel chains
///
/// Safe to call on every block: no allocation, no locking, and calling it
/// twice with the same snapshot leaves both chains unchanged the second time.
pub fn configure(
    left: &mut ChannelChain,
    right: &mut ChannelChain,
    settings: &ChainSettings,
    sample_rate: f64,
) {
    debug_assert!(sample_rate > 0.0, "sample rate must be positive");

    let coefficients = ChainCoefficients::compute(settings, sample_rate);

    update_channel_chain(left, &coefficients, settings);
    update_channel_chain(right, &coefficients, settings);

    trace!(
        low_cut_hz = settings.low_cut_freq,
        low_cut_slope = settings.low_cut_slope.db_per_octave(),
        peak_hz = settings.peak_freq,
        peak_db = settings.peak_gain_db,
        peak_q = settings.peak_quality,
        high_cut_hz = settings.high_cut_freq,
        high_cut_slope = settings.high_cut_slope.db_per_octave(),
        "Filters configured"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::Effect;
    use crate::domain::settings::Slope;
    use proptest::prelude::*;

    const SAMPLE_RATE: f64 = 44100.0;

    fn configured(settings: &ChainSettings) -> (ChannelChain, ChannelChain) {
        let mut left = ChannelChain::new();
        let mut right = ChannelChain::new();
        configure(&mut left, &mut right, settings, SAMPLE_RATE);
        (left, right)
    }

    fn coeff_bits(chain: &ChannelChain) -> Vec<u32> {
        let mut bits = Vec::new();
        let stages = chain
            .low_cut()
            .stages()
            .iter()
            .chain(std::iter::once(chain.peak()))
            .chain(chain.high_cut().stages().iter());
        for stage in stages {
            let c = stage.coeffs();
            bits.extend([c.b0, c.b1, c.b2, c.a1, c.a2].map(f32::to_bits));
            bits.push(u32::from(stage.is_bypassed()));
        }
        bits
    }

    #[test]
    fn test_low_cut_24db_scenario() {
        let settings = ChainSettings {
            low_cut_freq: 100.0,
            low_cut_slope: Slope::Slope24,
            ..Default::default()
        };
        let (left, _) = configured(&settings);
        let band = left.low_cut();

        assert!(!band.stage(0).unwrap().is_bypassed());
        assert!(!band.stage(1).unwrap().is_bypassed());
        assert!(band.stage(2).unwrap().is_bypassed());
        assert!(band.stage(3).unwrap().is_bypassed());

        let expected = Cascade::highpass(100.0, SAMPLE_RATE, 4).unwrap();
        let active: Vec<_> = band.active_coeffs().copied().collect();
        assert_eq!(active.as_slice(), expected.as_slice());
        assert!((band.magnitude_db(100.0, SAMPLE_RATE) + 3.01).abs() < 0.05);
    }

    #[test]
    fn test_flat_peak_scenario() {
        let settings = ChainSettings {
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            ..Default::default()
        };
        let (left, _) = configured(&settings);
        let peak = left.peak().coeffs();

        for freq in [100.0, 750.0, 4000.0] {
            assert!(peak.magnitude_db(freq, SAMPLE_RATE).abs() < 1e-3);
        }
    }

    #[test]
    fn test_high_cut_slope_drop_in_one_pass() {
        let mut settings = ChainSettings {
            high_cut_freq: 8000.0,
            high_cut_slope: Slope::Slope48,
            ..Default::default()
        };
        let mut left = ChannelChain::new();
        let mut right = ChannelChain::new();
        configure(&mut left, &mut right, &settings, SAMPLE_RATE);
        assert_eq!(left.high_cut().active_count(), 4);

        settings.high_cut_freq = 5000.0;
        settings.high_cut_slope = Slope::Slope12;
        configure(&mut left, &mut right, &settings, SAMPLE_RATE);

        let expected = Cascade::lowpass(5000.0, SAMPLE_RATE, 2).unwrap();
        for chain in [&left, &right] {
            let band = chain.high_cut();
            assert_eq!(band.active_count(), 1);
            assert_eq!(band.stage(0).unwrap().coeffs(), &expected.as_slice()[0]);
            assert!((1..4).all(|i| band.stage(i).unwrap().is_bypassed()));
        }
    }

    #[test]
    fn test_band_bypass_flags_reach_chain_positions() {
        let settings = ChainSettings {
            low_cut_bypassed: true,
            peak_bypassed: false,
            high_cut_bypassed: true,
            low_cut_slope: Slope::Slope36,
            ..Default::default()
        };
        let (left, right) = configured(&settings);

        for chain in [&left, &right] {
            assert!(chain.is_position_bypassed(ChainPosition::LowCut));
            assert!(!chain.is_position_bypassed(ChainPosition::Peak));
            assert!(chain.is_position_bypassed(ChainPosition::HighCut));
            // Slots are still loaded so un-bypassing is immediate
            assert_eq!(chain.low_cut().active_count(), 3);
        }
    }

    #[test]
    fn test_peak_boost_reaches_both_channels() {
        let settings = ChainSettings {
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            peak_quality: 1.0,
            ..Default::default()
        };
        let (mut left, mut right) = configured(&settings);

        let tone: Vec<f32> = (0..8820)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        let mut l = tone.clone();
        let mut r = tone;
        left.process(&mut l).unwrap();
        right.process(&mut r).unwrap();

        assert_eq!(l, r);
        let peak = l[4410..].iter().map(|s| s.abs()).fold(0.0_f32, f32::max);
        // +12 dB is a factor of ~3.98
        assert!((peak - 3.98).abs() < 0.1);
    }

    proptest! {
        #[test]
        fn prop_stereo_coherent_and_idempotent(
            low_cut_freq in 20.0f32..20000.0,
            high_cut_freq in 20.0f32..20000.0,
            peak_freq in 20.0f32..20000.0,
            peak_gain_db in -24.0f32..24.0,
            peak_quality in 0.1f32..10.0,
            low_slope in 0usize..4,
            high_slope in 0usize..4,
            flags in any::<(bool, bool, bool)>(),
        ) {
            let settings = ChainSettings {
                low_cut_freq,
                high_cut_freq,
                peak_freq,
                peak_gain_db,
                peak_quality,
                low_cut_slope: Slope::from_index(low_slope),
                high_cut_slope: Slope::from_index(high_slope),
                low_cut_bypassed: flags.0,
                peak_bypassed: flags.1,
                high_cut_bypassed: flags.2,
            };

            let mut left = ChannelChain::new();
            let mut right = ChannelChain::new();
            configure(&mut left, &mut right, &settings, SAMPLE_RATE);
            let first = coeff_bits(&left);

            prop_assert_eq!(&first, &coeff_bits(&right));
            prop_assert_eq!(left.low_cut().active_count(), low_slope + 1);
            prop_assert_eq!(left.high_cut().active_count(), high_slope + 1);

            configure(&mut left, &mut right, &settings, SAMPLE_RATE);
            prop_assert_eq!(&first, &coeff_bits(&left));
            prop_assert_eq!(&first, &coeff_bits(&right));
        }
    }
}
