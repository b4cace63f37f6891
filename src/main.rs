mod app;
mod config;
mod event;
mod markers;
mod watch;
mod world;

use std::path::PathBuf;

use clap::Parser;
use foothold_runtime::ActivationMode;

use crate::app::App;
use crate::config::{FootholdConfig, load_config_from_path};
use crate::watch::ConfigWatcher;
use crate::world::{DemoScene, DemoWorld};

/// Headless host: scans a procedural scene and reports marker statistics.
#[derive(Parser, Debug)]
#[command(name = "foothold", version)]
struct Args {
    /// TOML configuration file
    #[arg(long, default_value = "foothold.toml")]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = DemoScene::Terrain)]
    scene: DemoScene,

    /// Frames to simulate at 60 Hz
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Overrides `general.mode` from the config file
    #[arg(long)]
    mode: Option<ActivationMode>,

    /// Terrain noise seed
    #[arg(long, default_value_t = 1337)]
    seed: i32,

    /// Reload the config file when it changes on disk
    #[arg(long)]
    watch: bool,

    /// Press the activation key every N frames (0: once at start)
    #[arg(long, default_value_t = 0)]
    press_every: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match load_config_from_path(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!(
                "could not load {} ({}); using defaults",
                args.config.display(),
                e
            );
            FootholdConfig::default()
        }
    };
    if let Some(mode) = args.mode {
        config.general.mode = mode.name().to_string();
    }

    let watcher = if args.watch {
        ConfigWatcher::spawn(args.config.clone())
    } else {
        ConfigWatcher::detached()
    };
    let world = DemoWorld::new(args.scene, args.seed);
    let mut app = App::new(config, args.config, world, watcher);

    const DT: f64 = 1.0 / 60.0;
    for frame in 0..args.frames {
        let due = match args.press_every {
            0 => frame == 1,
            n => frame > 0 && frame % n == 0,
        };
        if due && app.activation.mode() != ActivationMode::Continuous {
            app.press_activation();
        }
        app.step(DT);
        if args.watch {
            std::thread::sleep(std::time::Duration::from_secs_f64(DT));
        }
    }
    app.log_stats();
}
