//! The `orrery` binary.

use clap::Parser;
use orrery_app::platform::PlatformDirs;
use orrery_config::{CliArgs, Config};

fn main() {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve(args.config.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to resolve platform directories: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
        std::process::exit(1);
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    log::info!(
        "{} starting: {}x{}, {} frames",
        config.window.title,
        config.window.width,
        config.window.height,
        args.frames
    );

    if let Err(e) = orrery_app::run(&mut config, &args, &dirs.config_dir) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
