//! Configuration system for the orrery.
//!
//! Settings persist to disk as RON, can be overridden from the command line,
//! and are turned into a per-frame render snapshot by the renderer.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BodyConfig, BodyRole, CameraConfig, Config, DebugConfig, RenderOptions, SceneConfig,
    CONFIG_FILE_NAME, WindowConfig, default_config_dir,
};
pub use error::ConfigError;
