//! Command-line argument parsing for the orrery.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orrery", about = "Animated solar system with HDR bloom")]
pub struct CliArgs {
    /// Viewport width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of frames to render before exiting.
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Simulated frames per second; drives the animation clock.
    #[arg(long, default_value_t = 60.0)]
    pub fps: f32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Record command lists instead of driving a GPU.
    #[arg(long)]
    pub dry_run: bool,

    /// Write the last frame to this PNG file.
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Disable the bloom addition.
    #[arg(long)]
    pub no_bloom: bool,

    /// Disable orbit rings.
    #[arg(long)]
    pub no_orbits: bool,

    /// Disable the starfield.
    #[arg(long)]
    pub no_stars: bool,

    /// Enable the bright-pass blur.
    #[arg(long)]
    pub blur: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if args.no_bloom {
            self.render.bloom = false;
        }
        if args.no_orbits {
            self.render.orbits = false;
        }
        if args.no_stars {
            self.render.stars = false;
        }
        if args.blur {
            self.render.blur = true;
        }
    }
}
