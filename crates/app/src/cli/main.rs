//! EqTraining CLI
//!
//! Prepares the equalizer, applies a preset and/or parameter overrides, then
//! runs probe tones through both channels and prints the measured response.

use anyhow::{bail, Context};
use clap::Parser;
use eqtrain_core::domain::{
    AppConfig, EqPreset, EqProcessor, ParamId, ParameterStore, PresetManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eqtrain")]
#[command(about = "Three-band equalizer response probe", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// TOML file with sample rate, block size and preset directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the sample rate in Hz
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Preset to load (factory name or a file in the preset directory)
    #[arg(short, long)]
    preset: Option<String>,

    /// Parameter override, e.g. --set "Peak Gain=6"
    #[arg(short, long = "set", value_name = "ID=VALUE")]
    overrides: Vec<String>,

    /// Save the resulting parameters as a preset with this name
    #[arg(long)]
    save_preset: Option<String>,

    /// List presets and exit
    #[arg(long)]
    list_presets: bool,
}

/// Probe frequencies, roughly third-octave spaced
const PROBES: [f32; 12] = [
    25.0, 50.0, 100.0, 200.0, 400.0, 750.0, 1000.0, 2000.0, 4000.0, 8000.0, 12000.0, 16000.0,
];

fn parse_override(spec: &str) -> anyhow::Result<(ParamId, f32)> {
    let Some((name, value)) = spec.split_once('=') else {
        bail!("override must look like ID=VALUE, got {spec:?}");
    };
    let id: ParamId = name.trim().parse()?;
    let value: f32 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {id}"))?;
    Ok((id, value))
}

/// Run a sine through the processor and return its gain in dB
fn measure(
    processor: &mut EqProcessor,
    freq: f32,
    sample_rate: f64,
    block_size: usize,
) -> anyhow::Result<f64> {
    let frames = (sample_rate as usize).max(block_size * 4);
    let signal: Vec<f32> = (0..frames)
        .map(|i| 2.0 * std::f64::consts::PI * f64::from(freq) * i as f64 / sample_rate)
        .map(|phase| phase.sin() as f32)
        .collect();

    processor.release_resources();
    let mut left = signal.clone();
    let mut right = signal;
    for (l, r) in left.chunks_mut(block_size).zip(right.chunks_mut(block_size)) {
        processor.process_block(&mut [l, r])?;
    }

    // Skip the first half to let the filters settle
    let tail = &left[frames / 2..];
    let rms = (tail.iter().map(|s| f64::from(*s).powi(2)).sum::<f64>() / tail.len() as f64).sqrt();
    Ok(20.0 * (rms * std::f64::consts::SQRT_2).max(1e-9).log10())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path).await?,
        None => AppConfig::default(),
    };
    if let Some(sample_rate) = cli.sample_rate {
        config.sample_rate = sample_rate;
    }
    config.validate()?;

    let manager = PresetManager::new(config.preset_dir.clone());

    if cli.list_presets {
        for preset in EqPreset::factory_presets() {
            println!("{:<16} {}", preset.name, preset.description);
        }
        for name in manager.list_presets().await? {
            println!("{name:<16} (user)");
        }
        return Ok(());
    }

    let params = Arc::new(ParameterStore::new());

    if let Some(name) = &cli.preset {
        let preset = match EqPreset::factory_presets().into_iter().find(|p| &p.name == name) {
            Some(preset) => preset,
            None => manager.load_preset(name).await?,
        };
        preset.parameters.apply(&params);
        tracing::info!(preset = %preset.name, "Preset applied");
    }

    for spec in &cli.overrides {
        let (id, value) = parse_override(spec)?;
        let stored = params.set(id, value);
        tracing::debug!(parameter = %id, requested = value, stored, "Override applied");
    }

    if let Some(name) = &cli.save_preset {
        manager.save_preset(&EqPreset::from_store(name, &params)).await?;
    }

    let mut processor = EqProcessor::new(Arc::clone(&params));
    processor.prepare_to_play(config.sample_rate, config.block_size)?;

    println!("{}", EqProcessor::NAME);
    for (id, value) in params.iter() {
        println!("  {:<18} {}", id.id(), id.descriptor().display(value));
    }
    println!();
    println!("  {:>8}  {:>9}  {:>9}", "Hz", "measured", "designed");

    for freq in PROBES {
        if f64::from(freq) >= config.sample_rate / 2.0 {
            continue;
        }
        let measured = measure(&mut processor, freq, config.sample_rate, config.block_size)?;
        let designed = processor.left_chain().magnitude_db(f64::from(freq), config.sample_rate);
        println!("  {freq:>8.0}  {measured:>9.2}  {designed:>9.2}");
    }

    Ok(())
}
