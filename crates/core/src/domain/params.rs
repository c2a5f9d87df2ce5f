//! Parameter layout and the lock-free parameter store
//!
//! The store holds one atomic scalar per parameter. The UI/automation thread
//! writes through [`ParameterStore::set`]; the audio thread reads raw values
//! once per configuration pass. Reads and writes are tear-free per parameter,
//! no transaction spans several parameters.

use crate::domain::audio::{AudioError, Result};
use crossbeam::atomic::AtomicCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Labels of the four cut-band slope choices
pub const SLOPE_CHOICES: [&str; 4] = ["12 db/Oct", "24 db/Oct", "36 db/Oct", "48 db/Oct"];

/// Identifier of every parameter the equalizer exposes to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
    LowCutBypassed,
    PeakBypassed,
    HighCutBypassed,
    AnalyzerEnabled,
}

impl ParamId {
    pub const COUNT: usize = 11;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::LowCutFreq,
        ParamId::HighCutFreq,
        ParamId::PeakFreq,
        ParamId::PeakGain,
        ParamId::PeakQuality,
        ParamId::LowCutSlope,
        ParamId::HighCutSlope,
        ParamId::LowCutBypassed,
        ParamId::PeakBypassed,
        ParamId::HighCutBypassed,
        ParamId::AnalyzerEnabled,
    ];

    /// Fixed string identifier used by hosts and persisted state
    pub fn id(&self) -> &'static str {
        match self {
            ParamId::LowCutFreq => "LowCut Freq",
            ParamId::HighCutFreq => "HighCut Freq",
            ParamId::PeakFreq => "Peak Freq",
            ParamId::PeakGain => "Peak Gain",
            ParamId::PeakQuality => "Peak Quality",
            ParamId::LowCutSlope => "LowCut Slope",
            ParamId::HighCutSlope => "HighCut Slope",
            ParamId::LowCutBypassed => "LowCut Bypassed",
            ParamId::PeakBypassed => "Peak Bypassed",
            ParamId::HighCutBypassed => "HighCut Bypassed",
            ParamId::AnalyzerEnabled => "Analyzer Enabled",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Range, kind and default of this parameter
    pub fn descriptor(self) -> ParamDescriptor {
        let freq = ParamRange::new(20.0, 20000.0, 1.0, 0.25);
        let (kind, default) = match self {
            ParamId::LowCutFreq => (ParamKind::Float(freq), 20.0),
            ParamId::HighCutFreq => (ParamKind::Float(freq), 20000.0),
            ParamId::PeakFreq => (ParamKind::Float(freq), 750.0),
            ParamId::PeakGain => (ParamKind::Float(ParamRange::new(-24.0, 24.0, 0.5, 1.0)), 0.0),
            ParamId::PeakQuality => (ParamKind::Float(ParamRange::new(0.1, 10.0, 0.05, 1.0)), 1.0),
            ParamId::LowCutSlope | ParamId::HighCutSlope => {
                (ParamKind::Choice(&SLOPE_CHOICES), 0.0)
            }
            ParamId::LowCutBypassed | ParamId::PeakBypassed | ParamId::HighCutBypassed => {
                (ParamKind::Bool, 0.0)
            }
            ParamId::AnalyzerEnabled => (ParamKind::Bool, 1.0),
        };

        ParamDescriptor {
            id: self,
            name: self.id(),
            kind,
            default,
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ParamId {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self> {
        ParamId::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| AudioError::UnknownParameter(s.to_string()))
    }
}

/// Continuous parameter range with step interval and skew
///
/// Skew below 1.0 spends more of the normalised range on the low end, which is
/// what the frequency parameters use (0.25).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub interval: f32,
    pub skew: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, interval: f32, skew: f32) -> Self {
        Self {
            min,
            max,
            interval,
            skew,
        }
    }

    /// Snap to the step interval and clamp into range
    pub fn snap_to_legal_value(&self, value: f32) -> f32 {
        let value = if self.interval > 0.0 {
            self.min + self.interval * ((value - self.min) / self.interval).round()
        } else {
            value
        };
        value.clamp(self.min, self.max)
    }

    /// Plain value to normalised [0, 1]
    pub fn convert_to_0to1(&self, value: f32) -> f32 {
        let proportion = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Normalised [0, 1] to plain value
    pub fn convert_from_0to1(&self, proportion: f32) -> f32 {
        let mut proportion = proportion.clamp(0.0, 1.0);
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.min + (self.max - self.min) * proportion
    }
}

/// How a parameter's raw float value is interpreted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Float(ParamRange),
    Choice(&'static [&'static str]),
    Bool,
}

/// Static description of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    pub id: ParamId,
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: f32,
}

impl ParamDescriptor {
    /// Bring an arbitrary plain value into this parameter's legal domain
    pub fn legalize(&self, value: f32) -> f32 {
        let value = if value.is_nan() { self.default } else { value };
        match self.kind {
            ParamKind::Float(range) => range.snap_to_legal_value(value),
            ParamKind::Choice(choices) => value.round().clamp(0.0, (choices.len() - 1) as f32),
            ParamKind::Bool => {
                if value > 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Normalised [0, 1] to plain value, as host automation delivers it
    pub fn from_normalised(&self, proportion: f32) -> f32 {
        match self.kind {
            ParamKind::Float(range) => range.convert_from_0to1(proportion),
            ParamKind::Choice(choices) => proportion.clamp(0.0, 1.0) * (choices.len() - 1) as f32,
            // Host bool ranges snap the midpoint up
            ParamKind::Bool => {
                if proportion >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Plain value to normalised [0, 1]
    pub fn to_normalised(&self, value: f32) -> f32 {
        match self.kind {
            ParamKind::Float(range) => range.convert_to_0to1(value),
            ParamKind::Choice(choices) => value / (choices.len() - 1) as f32,
            ParamKind::Bool => value.clamp(0.0, 1.0),
        }
    }

    /// Human-readable rendering of a plain value
    pub fn display(&self, value: f32) -> String {
        match self.kind {
            ParamKind::Float(_) => format!("{value:.2}"),
            ParamKind::Choice(choices) => choices
                .get(value.round().max(0.0) as usize)
                .map(|c| (*c).to_string())
                .unwrap_or_default(),
            ParamKind::Bool => {
                let label = if value > 0.5 { "On" } else { "Off" };
                label.to_string()
            }
        }
    }
}

/// Lock-free store of raw (plain, unnormalised) parameter values
///
/// Shared by reference (typically behind an `Arc`) between the thread that
/// writes parameters and the audio thread that reads them.
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicCell<f32>; ParamId::COUNT],
}

impl ParameterStore {
    /// Create a store holding every parameter's default value
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicCell::new(ParamId::ALL[i].descriptor().default)),
        }
    }

    /// Raw plain value of a parameter
    #[inline]
    pub fn get_raw(&self, id: ParamId) -> f32 {
        self.values[id.index()].load()
    }

    /// Boolean view (`raw > 0.5`)
    #[inline]
    pub fn get_bool(&self, id: ParamId) -> bool {
        self.get_raw(id) > 0.5
    }

    /// Store a plain value, clamped and snapped into the parameter's domain
    ///
    /// Returns the value actually stored.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let legal = id.descriptor().legalize(value);
        self.values[id.index()].store(legal);
        legal
    }

    /// Store a value given in normalised [0, 1] form
    pub fn set_normalised(&self, id: ParamId, proportion: f32) -> f32 {
        let descriptor = id.descriptor();
        self.set(id, descriptor.from_normalised(proportion))
    }

    /// Current value in normalised [0, 1] form
    pub fn get_normalised(&self, id: ParamId) -> f32 {
        id.descriptor().to_normalised(self.get_raw(id))
    }

    /// Look up a raw value by its string identifier
    pub fn get_by_name(&self, name: &str) -> Result<f32> {
        Ok(self.get_raw(name.parse()?))
    }

    /// Set a raw value by its string identifier
    pub fn set_by_name(&self, name: &str, value: f32) -> Result<f32> {
        Ok(self.set(name.parse()?, value))
    }

    /// Put every parameter back to its default
    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.values[id.index()].store(id.descriptor().default);
        }
        debug!("Parameters reset to defaults");
    }

    /// Iterate over (id, raw value) pairs in layout order
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, f32)> + '_ {
        ParamId::ALL.into_iter().map(move |id| (id, self.get_raw(id)))
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
