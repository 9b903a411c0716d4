//! The binary entry point for the orrery viewer.

mod platform;

use clap::Parser;
use orrery_config::{CliArgs, Config, SceneConfig};

fn main() {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(root) => {
            let dirs = platform::PlatformDirs::rooted_at(root);
            if let Err(e) = dirs.create_dirs() {
                eprintln!("Failed to create directories under {}: {e}", root.display());
                std::process::exit(1);
            }
            dirs
        }
        None => match platform::PlatformDirs::resolve_and_create() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to initialize platform directories: {e}");
                std::process::exit(1);
            }
        },
    };

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Some(scene_path) = &args.scene {
        match SceneConfig::load(scene_path) {
            Ok(scene) => config.scene = scene,
            Err(e) => {
                eprintln!("Failed to load scene {}: {e}", scene_path.display());
                std::process::exit(1);
            }
        }
    }
    config.apply_cli_overrides(&args);

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    let screenshot_dir = dirs.data_dir.join("screenshots");
    orrery_app::run_with_config(config, screenshot_dir);
}
