use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::{
    io::{self, BufRead, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};
use triband::audio::Manager;
use triband::control::{ControlSurface, HELP, Outcome};
use triband::params::{Band, ParameterStore};
use triband::preset;
use triband::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "triband")]
#[command(version)]
#[command(about = "Three-band compressor running as a JACK client.")]
struct Args {
    #[arg(long, env = "TRIBAND_PRESET_DIR", help = "Directory holding preset files")]
    preset_dir: Option<String>,
    #[arg(long, help = "Preset to load at startup")]
    preset: Option<String>,
    #[arg(long, help = "Print the JACK graph's ports and stream format, then exit")]
    list_ports: bool,
    #[arg(long, help = "Do not read commands from stdin")]
    no_control: bool,
    #[arg(long, env = "TRIBAND_METER_MS", help = "Meter polling interval in milliseconds")]
    meter_ms: Option<u64>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    info!("triband v{}", env!("CARGO_PKG_VERSION"));
    info!("Args: {args:?}");

    let mut settings = Settings::load().unwrap_or_else(|e| {
        warn!("Failed to load settings, using defaults: {e:#}");
        Settings::default()
    });
    if let Some(dir) = args.preset_dir {
        settings.preset_dir = dir;
    }
    if let Some(name) = args.preset {
        settings.selected_preset = Some(name);
    }
    if let Some(ms) = args.meter_ms {
        settings.meter_refresh_ms = ms;
    }
    settings.apply_to_environment();
    debug!("{settings}");

    let store = Arc::new(ParameterStore::new());

    let presets = match preset::Manager::new(&settings.preset_dir) {
        Ok(manager) => Some(manager),
        Err(e) => {
            warn!("Presets unavailable: {e:#}");
            None
        }
    };
    if let (Some(name), Some(manager)) = (&settings.selected_preset, &presets) {
        match manager.get_preset_by_name(name) {
            Some(preset) => {
                store.apply(&preset.to_snapshot());
                info!("Loaded preset '{name}'");
            }
            None => warn!("Preset '{name}' not found"),
        }
    }

    let manager = Manager::new(&settings.audio, Arc::clone(&store))
        .context("failed to start JACK client")?;

    if args.list_ports {
        print_ports(&manager);
        manager.disconnect_all();
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let shutdown_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        shutdown_flag.store(false, Ordering::SeqCst);
    })
    .context("error setting Ctrl+C handler")?;

    if !args.no_control {
        let surface = ControlSurface::new(manager.engine().clone(), presets);
        let quit_flag = Arc::clone(&running);
        thread::Builder::new()
            .name("control".to_string())
            .spawn(move || run_control(surface, &quit_flag))
            .context("failed to spawn control thread")?;
    }

    let meters = manager.engine().meters().clone();
    let interval = Duration::from_millis(settings.meter_refresh_ms.max(10));
    while running.load(Ordering::SeqCst) {
        thread::sleep(interval);
        for band in Band::ALL {
            let reading = meters.reading(band);
            debug!(
                "{band}: in {:.1} dB, out {:.1} dB, gr {:.1} dB",
                reading.input_db, reading.output_db, reading.gain_reduction_db
            );
        }
    }

    manager.disconnect_all();
    Ok(())
}

fn print_ports(manager: &Manager) {
    println!(
        "JACK: {} Hz, {} frames",
        manager.sample_rate(),
        manager.buffer_size()
    );
    println!("Capture ports:");
    for port in manager.get_available_inputs() {
        println!("  {port}");
    }
    println!("Playback ports:");
    for port in manager.get_available_outputs() {
        println!("  {port}");
    }
}

fn run_control(mut surface: ControlSurface, running: &AtomicBool) {
    println!("{HELP}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match surface.execute_line(&line) {
            Ok(Outcome::Continue(text)) => println!("{}", text.trim_end()),
            Ok(Outcome::Quit) => break,
            Err(e) => println!("error: {e:#}"),
        }
        let _ = io::stdout().flush();
        if !running.load(Ordering::SeqCst) {
            return;
        }
    }
    running.store(false, Ordering::SeqCst);
}
