//! Integration tests for the equalizer
//!
//! These tests drive the processor the way a host does: parameters written
//! from another thread, one configuration pass per block, state save/restore,
//! and presets on disk.

use eqtrain_core::domain::{
    configure, get_chain_settings, Cascade, ChainPosition, ChainSettings, ChannelChain, Effect,
    EqPreset, EqProcessor, ParamId, ParameterStore, PresetManager, Slope,
};
use proptest::prelude::*;
use std::sync::Arc;

const SAMPLE_RATE: f64 = 44100.0;
const BLOCK: usize = 256;

fn generate_sine_wave(frequency: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| 2.0 * std::f32::consts::PI * frequency * i as f32 / SAMPLE_RATE as f32)
        .map(|phase| phase.sin())
        .collect()
}

fn rms(buffer: &[f32]) -> f32 {
    (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt()
}

fn prepared(params: &Arc<ParameterStore>) -> EqProcessor {
    let mut processor = EqProcessor::new(Arc::clone(params));
    processor.prepare_to_play(SAMPLE_RATE, BLOCK).unwrap();
    processor
}

/// Process a whole signal in host-sized blocks, returning (left, right)
fn run(processor: &mut EqProcessor, signal: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut left = signal.to_vec();
    let mut right = signal.to_vec();
    for (l, r) in left.chunks_mut(BLOCK).zip(right.chunks_mut(BLOCK)) {
        processor.process_block(&mut [l, r]).unwrap();
    }
    (left, right)
}

// ============================================================================
// SIGNAL PATH
// ============================================================================

#[test]
fn test_default_parameters_are_nearly_transparent() {
    let params = Arc::new(ParameterStore::new());
    let mut processor = prepared(&params);

    let signal = generate_sine_wave(1000.0, 8192);
    let (left, right) = run(&mut processor, &signal);

    let ratio = rms(&left[4096..]) / rms(&signal[4096..]);
    assert!((ratio - 1.0).abs() < 0.01);
    assert_eq!(left, right);
}

#[test]
fn test_band_pass_shape() {
    let params = Arc::new(ParameterStore::new());
    params.set(ParamId::LowCutFreq, 300.0);
    params.set(ParamId::LowCutSlope, 3.0);
    params.set(ParamId::HighCutFreq, 3000.0);
    params.set(ParamId::HighCutSlope, 3.0);
    let mut processor = prepared(&params);

    let inside = generate_sine_wave(1000.0, 8192);
    let below = generate_sine_wave(60.0, 8192);
    let above = generate_sine_wave(12000.0, 8192);

    let (inside_out, _) = run(&mut processor, &inside);
    processor.release_resources();
    let (below_out, _) = run(&mut processor, &below);
    processor.release_resources();
    let (above_out, _) = run(&mut processor, &above);

    assert!(rms(&inside_out[4096..]) > 0.6);
    assert!(rms(&below_out[4096..]) < 1e-3);
    assert!(rms(&above_out[4096..]) < 1e-3);
}

#[test]
fn test_band_bypass_restores_signal() {
    let params = Arc::new(ParameterStore::new());
    params.set(ParamId::LowCutFreq, 2000.0);
    params.set(ParamId::LowCutSlope, 3.0);
    let mut processor = prepared(&params);

    let signal = generate_sine_wave(100.0, 8192);
    let (cut, _) = run(&mut processor, &signal);
    assert!(rms(&cut[4096..]) < 1e-3);

    params.set(ParamId::LowCutBypassed, 1.0);
    processor.release_resources();
    let (bypassed, _) = run(&mut processor, &signal);
    let ratio = rms(&bypassed[4096..]) / rms(&signal[4096..]);
    assert!((ratio - 1.0).abs() < 0.01);
    assert!(processor.left_chain().is_position_bypassed(ChainPosition::LowCut));
    // Slots stay loaded while the band is bypassed
    assert_eq!(processor.left_chain().low_cut().active_count(), 4);
}

#[test]
fn test_peak_boost_measured_matches_design() {
    let params = Arc::new(ParameterStore::new());
    params.set(ParamId::PeakFreq, 2000.0);
    params.set(ParamId::PeakGain, 9.0);
    params.set(ParamId::PeakQuality, 2.0);
    let mut processor = prepared(&params);

    let signal = generate_sine_wave(2000.0, 8192);
    let (left, _) = run(&mut processor, &signal);

    let measured_db = 20.0 * (rms(&left[4096..]) / rms(&signal[4096..])).log10();
    let designed_db = processor.left_chain().magnitude_db(2000.0, SAMPLE_RATE) as f32;
    assert!((measured_db - 9.0).abs() < 0.1);
    assert!((measured_db - designed_db).abs() < 0.1);
}

// ============================================================================
// CONFIGURATION PASS
// ============================================================================

#[test]
fn test_slope_switch_between_blocks() {
    let params = Arc::new(ParameterStore::new());
    params.set(ParamId::HighCutFreq, 6000.0);
    params.set(ParamId::HighCutSlope, 3.0);
    let mut processor = prepared(&params);
    assert_eq!(processor.right_chain().high_cut().active_count(), 4);

    params.set(ParamId::HighCutSlope, 0.0);
    let signal = generate_sine_wave(440.0, BLOCK);
    run(&mut processor, &signal);

    for chain in [processor.left_chain(), processor.right_chain()] {
        let band = chain.high_cut();
        assert_eq!(band.active_count(), 1);
        assert!(!band.stage(0).unwrap().is_bypassed());
        assert!((1..4).all(|i| band.stage(i).unwrap().is_bypassed()));
    }
}

#[test]
fn test_configure_matches_snapshot_extraction() {
    let params = ParameterStore::new();
    params.set(ParamId::LowCutFreq, 100.0);
    params.set(ParamId::LowCutSlope, 1.0);

    let settings = get_chain_settings(&params);
    assert_eq!(settings.low_cut_slope, Slope::Slope24);

    let mut left = ChannelChain::new();
    let mut right = ChannelChain::new();
    configure(&mut left, &mut right, &settings, SAMPLE_RATE);

    let expected = Cascade::highpass(100.0, SAMPLE_RATE, 4).unwrap();
    let active: Vec<_> = left.low_cut().active_coeffs().copied().collect();
    assert_eq!(active.as_slice(), expected.as_slice());
    assert_eq!(left, right);
}

#[test]
fn test_concurrent_parameter_writes() {
    let params = Arc::new(ParameterStore::new());
    let mut processor = prepared(&params);

    let writer = {
        let params = Arc::clone(&params);
        std::thread::spawn(move || {
            for i in 0..2000 {
                params.set(ParamId::PeakGain, (i % 48) as f32 - 24.0);
                params.set(ParamId::LowCutSlope, (i % 4) as f32);
                params.set(ParamId::HighCutFreq, 2000.0 + (i % 10) as f32 * 1000.0);
            }
        })
    };

    let signal = generate_sine_wave(500.0, BLOCK);
    for _ in 0..200 {
        let (left, right) = run(&mut processor, &signal);
        assert_eq!(left, right);
        assert!(left.iter().all(|s| s.is_finite()));
    }

    writer.join().unwrap();
}

// ============================================================================
// STATE AND PRESETS
// ============================================================================

#[test]
fn test_state_restore_between_instances() {
    let source_params = Arc::new(ParameterStore::new());
    source_params.set(ParamId::PeakFreq, 3000.0);
    source_params.set(ParamId::PeakGain, -6.0);
    source_params.set(ParamId::HighCutBypassed, 1.0);
    source_params.set(ParamId::AnalyzerEnabled, 0.0);
    let source = prepared(&source_params);
    let blob = source.get_state_information().unwrap();

    let target_params = Arc::new(ParameterStore::new());
    let mut target = prepared(&target_params);
    target.set_state_information(&blob).unwrap();

    assert_eq!(target.chain_settings(), source.chain_settings());
    assert!(!target_params.get_bool(ParamId::AnalyzerEnabled));
    assert_eq!(target.left_chain(), source.left_chain());
}

#[tokio::test]
async fn test_preset_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let manager = PresetManager::new(dir.path().to_path_buf());

    for preset in EqPreset::factory_presets() {
        manager.save_preset(&preset).await.unwrap();
    }
    let names = manager.list_presets().await.unwrap();
    assert!(names.contains(&"telephone".to_string()));

    let params = Arc::new(ParameterStore::new());
    manager
        .load_preset("telephone")
        .await
        .unwrap()
        .parameters
        .apply(&params);

    let mut processor = prepared(&params);
    processor.configure_filter();
    let settings: ChainSettings = processor.chain_settings();
    assert_eq!(settings.low_cut_freq, 300.0);
    assert_eq!(settings.high_cut_slope, Slope::Slope48);
    assert!(processor.left_chain().magnitude_db(100.0, SAMPLE_RATE) < -30.0);
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_active_slots_follow_slope(low in 0usize..4, high in 0usize..4) {
        let params = Arc::new(ParameterStore::new());
        params.set(ParamId::LowCutSlope, low as f32);
        params.set(ParamId::HighCutSlope, high as f32);
        let processor = prepared(&params);

        for chain in [processor.left_chain(), processor.right_chain()] {
            prop_assert_eq!(chain.low_cut().active_count(), low + 1);
            prop_assert_eq!(chain.high_cut().active_count(), high + 1);
            for i in 0..4 {
                prop_assert_eq!(chain.low_cut().stage(i).unwrap().is_bypassed(), i > low);
                prop_assert_eq!(chain.high_cut().stage(i).unwrap().is_bypassed(), i > high);
            }
        }
    }

    #[test]
    fn prop_reconfigure_is_idempotent(
        peak_freq in 20.0f32..20000.0,
        peak_gain in -24.0f32..24.0,
        low_cut_freq in 20.0f32..20000.0,
    ) {
        let params = Arc::new(ParameterStore::new());
        params.set(ParamId::PeakFreq, peak_freq);
        params.set(ParamId::PeakGain, peak_gain);
        params.set(ParamId::LowCutFreq, low_cut_freq);
        let mut processor = prepared(&params);

        let left = processor.left_chain().clone();
        let right = processor.right_chain().clone();
        processor.configure_filter();

        prop_assert_eq!(processor.left_chain(), &left);
        prop_assert_eq!(processor.right_chain(), &right);
        prop_assert_eq!(&left, &right);
    }
}
