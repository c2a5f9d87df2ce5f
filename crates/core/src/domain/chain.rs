//! Band chains and per-channel filter chains
//!
//! A [`ChannelChain`] is the fixed signal path LowCut → Peak → HighCut for one
//! audio channel. Each cut band is a [`CutBand`]: four filter-stage slots of
//! which the first `slope.sections()` are active. Topology never changes at
//! runtime; switching slope only moves the active/bypassed boundary.

use crate::domain::audio::{ProcessSpec, Result};
use crate::domain::cascade::{Cascade, MAX_SECTIONS};
use crate::domain::filter::{BiquadCoeffs, Effect, FilterStage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Positions of the chain, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

impl ChainPosition {
    pub const ALL: [ChainPosition; 3] = [
        ChainPosition::LowCut,
        ChainPosition::Peak,
        ChainPosition::HighCut,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Four biquad slots realising a cut band of up to 48 dB/octave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutBand {
    stages: [FilterStage; MAX_SECTIONS],
}

impl CutBand {
    /// New band with every slot bypassed
    pub fn new() -> Self {
        let mut band = Self {
            stages: std::array::from_fn(|_| FilterStage::new()),
        };
        band.bypass_all();
        band
    }

    /// Force-bypass every slot
    pub fn bypass_all(&mut self) {
        for stage in &mut self.stages {
            stage.set_bypass(true);
        }
    }

    /// Load a cascade into the leading slots
    ///
    /// All four slots are bypassed first, then section `i` of the cascade is
    /// copied into slot `i` and that slot is re-enabled. Slots past the
    /// cascade length stay bypassed and keep whatever coefficients they held.
    pub fn apply_cascade(&mut self, cascade: &Cascade) {
        self.bypass_all();

        for (stage, coeffs) in self.stages.iter_mut().zip(cascade.as_slice()) {
            stage.set_coeffs(*coeffs);
            stage.set_bypass(false);
        }
    }

    pub fn stage(&self, index: usize) -> Option<&FilterStage> {
        self.stages.get(index)
    }

    pub fn stages(&self) -> &[FilterStage; MAX_SECTIONS] {
        &self.stages
    }

    /// Number of slots currently processing audio
    pub fn active_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.is_bypassed()).count()
    }

    /// Coefficients of the active slots, in slot order
    pub fn active_coeffs(&self) -> impl Iterator<Item = &BiquadCoeffs> {
        self.stages
            .iter()
            .filter(|s| !s.is_bypassed())
            .map(|s| s.coeffs())
    }

    /// Combined magnitude response of the active slots in decibels
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        self.active_coeffs()
            .map(|c| c.magnitude_db(freq, sample_rate))
            .sum()
    }

    /// Run the active slots in slot order
    pub fn process(&mut self, buffer: &mut [f32]) -> Result<()> {
        for stage in &mut self.stages {
            if !stage.is_bypassed() {
                stage.process(buffer)?;
            }
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

impl Default for CutBand {
    fn default() -> Self {
        Self::new()
    }
}

/// LowCut → Peak → HighCut filter path for a single channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelChain {
    low_cut: CutBand,
    peak: FilterStage,
    high_cut: CutBand,
    /// Whole-position bypass, indexed by `ChainPosition`
    position_bypassed: [bool; 3],
    spec: Option<ProcessSpec>,
}

impl ChannelChain {
    pub fn new() -> Self {
        Self {
            low_cut: CutBand::new(),
            peak: FilterStage::new(),
            high_cut: CutBand::new(),
            position_bypassed: [false; 3],
            spec: None,
        }
    }

    /// Bind the chain to a processing spec and clear filter memory
    pub fn prepare(&mut self, spec: ProcessSpec) {
        self.reset();
        self.spec = Some(spec);
        debug!(
            sample_rate = spec.sample_rate,
            max_block_size = spec.max_block_size,
            channels = spec.channels,
            "Channel chain prepared"
        );
    }

    pub fn spec(&self) -> Option<&ProcessSpec> {
        self.spec.as_ref()
    }

    pub fn low_cut(&self) -> &CutBand {
        &self.low_cut
    }

    pub fn low_cut_mut(&mut self) -> &mut CutBand {
        &mut self.low_cut
    }

    pub fn peak(&self) -> &FilterStage {
        &self.peak
    }

    pub fn peak_mut(&mut self) -> &mut FilterStage {
        &mut self.peak
    }

    pub fn high_cut(&self) -> &CutBand {
        &self.high_cut
    }

    pub fn high_cut_mut(&mut self) -> &mut CutBand {
        &mut self.high_cut
    }

    pub fn is_position_bypassed(&self, position: ChainPosition) -> bool {
        self.position_bypassed[position.index()]
    }

    pub fn set_position_bypassed(&mut self, position: ChainPosition, bypassed: bool) {
        self.position_bypassed[position.index()] = bypassed;
    }

    /// Magnitude response of the whole chain in decibels, honoring bypass
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        let mut db = 0.0;
        if !self.is_position_bypassed(ChainPosition::LowCut) {
            db += self.low_cut.magnitude_db(freq, sample_rate);
        }
        if !self.is_position_bypassed(ChainPosition::Peak) && !self.peak.is_bypassed() {
            db += self.peak.coeffs().magnitude_db(freq, sample_rate);
        }
        if !self.is_position_bypassed(ChainPosition::HighCut) {
            db += self.high_cut.magnitude_db(freq, sample_rate);
        }
        db
    }
}

impl Default for ChannelChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for ChannelChain {
    fn process(&mut self, buffer: &mut [f32]) -> Result<()> {
        if !self.is_position_bypassed(ChainPosition::LowCut) {
            self.low_cut.process(buffer)?;
        }
        if !self.is_position_bypassed(ChainPosition::Peak) {
            self.peak.process(buffer)?;
        }
        if !self.is_position_bypassed(ChainPosition::HighCut) {
            self.high_cut.process(buffer)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }

    fn is_bypassed(&self) -> bool {
        self.position_bypassed.iter().all(|&b| b)
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.position_bypassed = [bypass; 3];
    }

    fn name(&self) -> &str {
        "ChannelChain"
    }
}
