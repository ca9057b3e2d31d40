//! Orrery application: loads the configuration, drives the frame loop and
//! optionally writes the final frame to disk.

pub mod platform;

use std::path::Path;

use orrery_config::{CliArgs, Config, ConfigError};
use orrery_render::{
    FrameConfig, FrameDriver, RecordingDevice, RenderDevice, RenderError, WgpuDevice,
};

/// How often, in frames, the config file is checked for edits.
pub const RELOAD_INTERVAL: u32 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] platform::PlatformError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Totals over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u32,
    pub draw_calls: usize,
    pub config_reloads: u32,
}

/// Simulation time of frame `frame`.
pub fn frame_time(frame: u32, fps: f32, time_scale: f32) -> f32 {
    frame as f32 / fps.max(1.0) * time_scale
}

/// Render `args.frames` frames on `device`.
///
/// With a `config_dir`, the file there is re-read every
/// [`RELOAD_INTERVAL`] frames; edited render options apply from the next
/// frame on. Scene changes need a restart.
pub fn render_frames<D: RenderDevice + ?Sized>(
    device: &mut D,
    config: &mut Config,
    args: &CliArgs,
    config_dir: Option<&Path>,
) -> Result<RunSummary, AppError> {
    let mut driver = FrameDriver::from_config(device, config)?;
    let mut summary = RunSummary::default();

    for frame in 0..args.frames {
        if let Some(dir) = config_dir.filter(|_| frame > 0 && frame % RELOAD_INTERVAL == 0) {
            match config.reload(dir) {
                Ok(Some(mut updated)) => {
                    updated.apply_cli_overrides(args);
                    config.render = updated.render;
                    summary.config_reloads += 1;
                }
                Ok(None) => {}
                Err(e) => log::warn!("Config reload failed, keeping current settings: {e}"),
            }
        }

        let frame_config = FrameConfig::snapshot(&config.render);
        let time = frame_time(frame, args.fps, config.scene.time_scale);
        let stats = driver.render_frame(device, &frame_config, time)?;
        summary.frames += 1;
        summary.draw_calls += stats.draw_calls;
    }

    log::info!(
        "Rendered {} frames ({} draw calls)",
        summary.frames,
        summary.draw_calls
    );
    Ok(summary)
}

/// Pick a device from the command line and run the frame loop.
pub fn run(config: &mut Config, args: &CliArgs, config_dir: &Path) -> Result<RunSummary, AppError> {
    let (width, height) = (config.window.width, config.window.height);

    if args.dry_run {
        log::info!("Dry run: recording command lists at {width}x{height}");
        let mut device = RecordingDevice::new(width, height);
        let summary = render_frames(&mut device, config, args, Some(config_dir))?;
        if args.screenshot.is_some() {
            log::warn!("No screenshot in a dry run");
        }
        return Ok(summary);
    }

    let mut device = WgpuDevice::new(width, height)?;
    let summary = render_frames(&mut device, config, args, Some(config_dir))?;
    if let Some(path) = &args.screenshot {
        device.save_screenshot(path)?;
    }
    Ok(summary)
}
