//! Settings snapshot taken once per configuration pass

use crate::domain::params::{ParamId, ParameterStore};
use serde::{Deserialize, Serialize};

/// Cut-band steepness, one second-order section per 12 dB/octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Slope12,
    Slope24,
    Slope36,
    Slope48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Slope12, Slope::Slope24, Slope::Slope36, Slope::Slope48];

    /// Map a choice index to a slope, clamping out-of-range indices
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Slope::Slope12,
            1 => Slope::Slope24,
            2 => Slope::Slope36,
            _ => Slope::Slope48,
        }
    }

    /// Choice index 0..=3
    pub fn index(self) -> usize {
        self as usize
    }

    /// Number of active second-order sections
    pub fn sections(self) -> usize {
        self.index() + 1
    }

    /// Total Butterworth order realised by the band
    pub fn order(self) -> usize {
        2 * self.sections()
    }

    pub fn db_per_octave(self) -> u32 {
        12 * self.sections() as u32
    }
}

/// Immutable read of every parameter the filter configuration consumes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
    pub low_cut_bypassed: bool,
    pub peak_bypassed: bool,
    pub high_cut_bypassed: bool,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_slope: Slope::Slope12,
            high_cut_slope: Slope::Slope12,
            low_cut_bypassed: false,
            peak_bypassed: false,
            high_cut_bypassed: false,
        }
    }
}

impl ChainSettings {
    /// Linear peak gain (`10^(dB/20)`)
    pub fn peak_gain_linear(&self) -> f32 {
        10.0_f32.powf(self.peak_gain_db / 20.0)
    }
}

/// Read one snapshot from the parameter store
///
/// Each field is a single atomic load; fields may straddle a concurrent UI
/// update by at most one write. "Analyzer Enabled" is not part of the snapshot.
pub fn get_chain_settings(store: &ParameterStore) -> ChainSettings {
    ChainSettings {
        low_cut_freq: store.get_raw(ParamId::LowCutFreq),
        high_cut_freq: store.get_raw(ParamId::HighCutFreq),
        peak_freq: store.get_raw(ParamId::PeakFreq),
        peak_gain_db: store.get_raw(ParamId::PeakGain),
        peak_quality: store.get_raw(ParamId::PeakQuality),
        low_cut_slope: slope_from_raw(store.get_raw(ParamId::LowCutSlope)),
        high_cut_slope: slope_from_raw(store.get_raw(ParamId::HighCutSlope)),
        low_cut_bypassed: store.get_bool(ParamId::LowCutBypassed),
        peak_bypassed: store.get_bool(ParamId::PeakBypassed),
        high_cut_bypassed: store.get_bool(ParamId::HighCutBypassed),
    }
}

fn slope_from_raw(raw: f32) -> Slope {
    Slope::from_index(raw.round().max(0.0) as usize)
}
