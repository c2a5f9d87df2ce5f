//! Example demonstrating presets and host state restore
//!
//! Run with: cargo run --package eqtrain-core --example preset_demo

use eqtrain_core::domain::{EqPreset, EqProcessor, ParamId, ParameterStore, PresetManager};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("eqtrain_core=debug,info")
        .init();

    println!("=== EqTraining Preset Demo ===\n");

    // 1. Prepare a processor with default parameters
    let params = Arc::new(ParameterStore::new());
    let mut processor = EqProcessor::new(Arc::clone(&params));
    processor.prepare_to_play(48000.0, 512)?;
    println!("1. Prepared at {:?} Hz", processor.sample_rate());

    // 2. Write the factory presets to a scratch directory
    let preset_dir = std::env::temp_dir().join("eqtrain_preset_demo");
    let manager = PresetManager::new(preset_dir.clone());
    for preset in EqPreset::factory_presets() {
        manager.save_preset(&preset).await?;
    }
    println!("2. Presets in {}: {:?}", preset_dir.display(), manager.list_presets().await?);

    // 3. Load one and apply it
    let telephone = manager.load_preset("telephone").await?;
    telephone.parameters.apply(&params);
    processor.configure_filter();
    let settings = processor.chain_settings();
    println!(
        "3. Applied '{}': low cut {} Hz @ {} dB/oct, high cut {} Hz @ {} dB/oct",
        telephone.name,
        settings.low_cut_freq,
        settings.low_cut_slope.db_per_octave(),
        settings.high_cut_freq,
        settings.high_cut_slope.db_per_octave()
    );

    // 4. Save host state, change something, restore
    let blob = processor.get_state_information()?;
    params.set(ParamId::PeakGain, -18.0);
    processor.set_state_information(&blob)?;
    println!(
        "4. Restored state, peak gain back to {} dB",
        params.get_raw(ParamId::PeakGain)
    );

    // 5. Print the response of the left chain
    println!("\n5. Response:");
    for freq in [100.0, 300.0, 1000.0, 1500.0, 3400.0, 8000.0] {
        let db = processor.left_chain().magnitude_db(freq, 48000.0);
        println!("   {:>6.0} Hz  {:>7.2} dB", freq, db);
    }

    tokio::fs::remove_dir_all(&preset_dir).await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}
