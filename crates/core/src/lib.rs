//! Filter-configuration core of a three-band equalizer
//!
//! A low-cut, a parametric peak and a high-cut stage, applied identically to
//! the left and right channel. Parameters live in a lock-free
//! [`ParameterStore`](domain::ParameterStore); every processing block takes a
//! [`ChainSettings`](domain::ChainSettings) snapshot and turns it into biquad
//! coefficients for both channel chains.

pub mod domain;

pub use domain::*;
