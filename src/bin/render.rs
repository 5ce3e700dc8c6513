use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use triband::params::ParameterStore;
use triband::preset::{self, Manager};
use triband::render::render_file;
use triband::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "triband-render")]
#[command(version)]
#[command(about = "Run a WAV file through the three-band compressor.")]
struct Args {
    /// Mono or stereo WAV file to process
    input: PathBuf,
    /// Where to write the 32-bit float result
    output: PathBuf,
    #[arg(long, help = "Name of a preset in the preset directory")]
    preset: Option<String>,
    #[arg(long, help = "Path to a preset JSON file", conflicts_with = "preset")]
    preset_file: Option<PathBuf>,
    #[arg(long, env = "TRIBAND_PRESET_DIR", help = "Directory holding preset files")]
    preset_dir: Option<String>,
    #[arg(long = "set", value_name = "KEY=VALUE", help = "Override a parameter, e.g. threshold_mid=-20")]
    overrides: Vec<String>,
    #[arg(long, default_value_t = 512, help = "Processing block size in frames")]
    block_size: usize,
    #[arg(long, help = "Bypass all three bands")]
    global_bypass: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    info!("Args: {args:?}");

    let store = Arc::new(ParameterStore::new());

    if let Some(path) = &args.preset_file {
        let preset = preset::manager::load_preset_file(path)
            .with_context(|| format!("failed to load preset file {}", path.display()))?;
        store.apply(&preset.to_snapshot());
        info!("Loaded preset '{}'", preset.name);
    } else if let Some(name) = &args.preset {
        let preset_dir = args
            .preset_dir
            .clone()
            .unwrap_or_else(|| Settings::load().unwrap_or_default().preset_dir);
        let manager = Manager::new(&preset_dir)?;
        let preset = manager
            .get_preset_by_name(name)
            .ok_or_else(|| anyhow!("no preset named '{name}' in {preset_dir}"))?;
        store.apply(&preset.to_snapshot());
        info!("Loaded preset '{name}'");
    }

    for assignment in &args.overrides {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{assignment}'"))?;
        let value: f32 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid value in '{assignment}'"))?;
        let stored = store.set_by_key(key.trim(), value)?;
        info!("{} = {stored}", key.trim());
    }

    if args.global_bypass {
        store.set_global_bypass(true);
    }

    let stats = render_file(&args.input, &args.output, store, args.block_size)?;
    println!(
        "{} frames, {} channel(s) @ {} Hz, peak {:.3} -> {:.3}",
        stats.frames, stats.channels, stats.sample_rate, stats.input_peak, stats.output_peak
    );
    Ok(())
}
