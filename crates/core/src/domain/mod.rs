//! Domain entities and filter-configuration rules

pub mod audio;
pub mod params;
pub mod settings;
pub mod filter;
pub mod cascade;
pub mod chain;
pub mod configurator;
pub mod processor;
pub mod config;

// Re-export specific items to avoid ambiguous glob imports
pub use audio::{AudioError, ChannelLayout, ProcessSpec, SampleRate};
pub use cascade::{Cascade, CutKind, MAX_ORDER, MAX_SECTIONS};
pub use chain::{ChainPosition, ChannelChain, CutBand};
pub use config::{AppConfig, ConfigError, EqPreset, ParameterState, PresetManager};
pub use configurator::{configure, ChainCoefficients};
pub use filter::{BiquadCoeffs, BiquadFilter, Effect, FilterStage};
pub use params::{ParamDescriptor, ParamId, ParamKind, ParamRange, ParameterStore, SLOPE_CHOICES};
pub use processor::EqProcessor;
pub use settings::{get_chain_settings, ChainSettings, Slope};
