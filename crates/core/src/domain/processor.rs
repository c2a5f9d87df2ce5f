//! Host-facing equalizer processor
//!
//! Owns the parameter store handle and the left/right channel chains, and
//! drives one configuration pass per processing block. The UI or automation
//! side keeps its own `Arc<ParameterStore>` clone and writes parameters
//! concurrently; the processor only ever reads them.

use crate::domain::audio::{AudioError, ChannelLayout, ProcessSpec, Result};
use crate::domain::chain::ChannelChain;
use crate::domain::config::{self, ParameterState};
use crate::domain::configurator::configure;
use crate::domain::filter::Effect;
use crate::domain::params::ParameterStore;
use crate::domain::settings::{get_chain_settings, ChainSettings};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cutoffs are kept below this fraction of the sample rate
const MAX_CUTOFF_RATIO: f64 = 0.49;

/// Three-band equalizer processor: low cut, peak, high cut
#[derive(Debug)]
pub struct EqProcessor {
    params: Arc<ParameterStore>,
    left: ChannelChain,
    right: ChannelChain,
    spec: Option<ProcessSpec>,
    layout: ChannelLayout,
}

impl EqProcessor {
    pub const NAME: &'static str = "EqTraining";

    /// Create a stereo processor reading from `params`
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            params,
            left: ChannelChain::new(),
            right: ChannelChain::new(),
            spec: None,
            layout: ChannelLayout::Stereo,
        }
    }

    pub fn name(&self) -> &str {
        Self::NAME
    }

    /// The equalizer has no tail beyond the filter memory
    pub fn tail_length_seconds(&self) -> f64 {
        0.0
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn left_chain(&self) -> &ChannelChain {
        &self.left
    }

    pub fn right_chain(&self) -> &ChannelChain {
        &self.right
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.spec.map(|s| s.sample_rate)
    }

    /// Mono or stereo output, with input matching output
    pub fn is_layout_supported(input_channels: usize, output_channels: usize) -> bool {
        ChannelLayout::from_count(output_channels).is_ok() && input_channels == output_channels
    }

    /// Switch the bus layout
    pub fn set_layout(&mut self, input_channels: usize, output_channels: usize) -> Result<()> {
        if !Self::is_layout_supported(input_channels, output_channels) {
            return Err(AudioError::UnsupportedLayout(format!(
                "{input_channels} in / {output_channels} out"
            )));
        }
        self.layout = ChannelLayout::from_count(output_channels)?;
        debug!(layout = ?self.layout, "Channel layout set");
        Ok(())
    }

    /// Prepare both chains for playback and configure them
    pub fn prepare_to_play(&mut self, sample_rate: f64, max_block_size: usize) -> Result<()> {
        let spec = ProcessSpec::mono(sample_rate, max_block_size)?;

        self.left.prepare(spec);
        self.right.prepare(spec);
        self.spec = Some(spec);

        self.configure_filter();

        info!(sample_rate, max_block_size, "Equalizer prepared");
        Ok(())
    }

    /// Clear filter memory; the chains stay allocated
    pub fn release_resources(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    /// Current settings snapshot
    pub fn chain_settings(&self) -> ChainSettings {
        get_chain_settings(&self.params)
    }

    /// Run one configuration pass from the current parameter values
    ///
    /// Does nothing until the processor has been prepared, since no sample
    /// rate is known before then.
    pub fn configure_filter(&mut self) {
        let Some(spec) = self.spec else {
            return;
        };

        let settings = clamp_to_nyquist(get_chain_settings(&self.params), spec.sample_rate);
        configure(&mut self.left, &mut self.right, &settings, spec.sample_rate);
    }

    /// Configure the filters, then filter each channel in place
    ///
    /// `channels[0]` runs through the left chain and `channels[1]` (stereo
    /// only) through the right chain. Channels beyond the layout are cleared.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]]) -> Result<()> {
        let spec = self.spec.ok_or_else(|| {
            AudioError::InvalidConfiguration(
                "process_block called before prepare_to_play".to_string(),
            )
        })?;

        let used = self.layout.count();
        if channels.len() < used {
            return Err(AudioError::BufferMismatch(format!(
                "expected {used} channels, got {}",
                channels.len()
            )));
        }
        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(AudioError::BufferMismatch(
                "channels have different lengths".to_string(),
            ));
        }
        if frames > spec.max_block_size {
            return Err(AudioError::BufferMismatch(format!(
                "block of {frames} frames exceeds prepared maximum {}",
                spec.max_block_size
            )));
        }

        for extra in channels.iter_mut().skip(used) {
            extra.fill(0.0);
        }

        self.configure_filter();

        self.left.process(&mut channels[0][..])?;
        if self.layout == ChannelLayout::Stereo {
            self.right.process(&mut channels[1][..])?;
        }

        Ok(())
    }

    /// Serialise every parameter value for the host
    pub fn get_state_information(&self) -> config::Result<Vec<u8>> {
        ParameterState::capture(&self.params).to_bytes()
    }

    /// Restore parameter values from a host blob and reconfigure
    ///
    /// A blob that fails to decode leaves every parameter untouched.
    pub fn set_state_information(&mut self, data: &[u8]) -> config::Result<()> {
        let state = match ParameterState::from_bytes(data) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Rejected state blob");
                return Err(e);
            }
        };

        let applied = state.apply(&self.params);
        self.configure_filter();

        info!(applied, "State restored");
        Ok(())
    }
}

/// Keep cut and peak frequencies strictly below Nyquist
fn clamp_to_nyquist(mut settings: ChainSettings, sample_rate: f64) -> ChainSettings {
    let limit = (sample_rate * MAX_CUTOFF_RATIO) as f32;
    settings.low_cut_freq = settings.low_cut_freq.min(limit);
    settings.high_cut_freq = settings.high_cut_freq.min(limit);
    settings.peak_freq = settings.peak_freq.min(limit);
    settings
}
