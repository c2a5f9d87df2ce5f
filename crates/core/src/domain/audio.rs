//! Audio-side domain models shared by the filter chains and the processor
//!
//! This module defines the error type for host-contract violations, the
//! processing spec handed to chains at preparation time, and the channel
//! layouts the equalizer accepts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when the host drives the equalizer
#[derive(Debug, Error)]
pub enum AudioError {
    /// Invalid processing configuration (sample rate, block size, filter order)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Requested channel layout is not mono or stereo
    #[error("Unsupported channel layout: {0}")]
    UnsupportedLayout(String),

    /// Parameter identifier is not part of the layout
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Buffer shape does not match the prepared layout
    #[error("Buffer mismatch: {0}")]
    BufferMismatch(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleRate {
    Hz44100,
    Hz48000,
    Hz96000,
    Custom(f64),
}

impl SampleRate {
    pub fn hz(&self) -> f64 {
        match self {
            SampleRate::Hz44100 => 44100.0,
            SampleRate::Hz48000 => 48000.0,
            SampleRate::Hz96000 => 96000.0,
            SampleRate::Custom(hz) => *hz,
        }
    }

    pub fn from_hz(hz: f64) -> Self {
        match hz as u32 {
            44100 if hz.fract() == 0.0 => SampleRate::Hz44100,
            48000 if hz.fract() == 0.0 => SampleRate::Hz48000,
            96000 if hz.fract() == 0.0 => SampleRate::Hz96000,
            _ => SampleRate::Custom(hz),
        }
    }

    /// Half the sample rate; cutoffs at or above this are degenerate
    pub fn nyquist(&self) -> f64 {
        self.hz() / 2.0
    }
}

/// Channel layouts accepted on the main bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn count(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    pub fn from_count(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(ChannelLayout::Mono),
            2 => Ok(ChannelLayout::Stereo),
            n => Err(AudioError::UnsupportedLayout(format!("{n} channels"))),
        }
    }
}

/// Processing spec handed to each channel chain at preparation time
///
/// Each chain filters a single channel, so `channels` is 1 for the chains the
/// processor owns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    pub max_block_size: usize,
    pub channels: usize,
}

impl ProcessSpec {
    /// Build a spec, rejecting values no filter design can work with
    pub fn new(sample_rate: f64, max_block_size: usize, channels: usize) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AudioError::InvalidConfiguration(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if max_block_size == 0 {
            return Err(AudioError::InvalidConfiguration(
                "maximum block size must be non-zero".to_string(),
            ));
        }
        if channels == 0 {
            return Err(AudioError::InvalidConfiguration(
                "channel count must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            max_block_size,
            channels,
        })
    }

    /// Spec for one mono chain
    pub fn mono(sample_rate: f64, max_block_size: usize) -> Result<Self> {
        Self::new(sample_rate, max_block_size, 1)
    }
}
