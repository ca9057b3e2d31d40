//! Per-frame render option snapshot.

use glam::Vec3;
use orrery_config::RenderOptions;

/// Colour of the point light at the root.
pub const LIGHT_COLOR: Vec3 = Vec3::ONE;

/// Render options frozen for one frame.
///
/// Built once at frame start and passed by reference into every pass, so
/// changes made to the live options mid-frame only show up next frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameConfig {
    pub shininess: f32,
    pub ambient: f32,
    pub light_intensity: f32,
    pub reflectivity: f32,
    pub light_constant: f32,
    pub light_linear: f32,
    pub light_quadratic: f32,
    pub light_color: Vec3,
    pub exposure: f32,
    pub gamma: f32,
    pub glow: f32,
    pub bloom: bool,
    pub outline: bool,
    pub blur: bool,
    pub grayscale: bool,
    pub vertical_mirror: bool,
    pub horizontal_mirror: bool,
    pub orbits: bool,
    pub stars: bool,
    pub realism: bool,
    pub blur_iterations: u32,
}

impl FrameConfig {
    pub fn snapshot(options: &RenderOptions) -> Self {
        Self {
            shininess: options.shininess,
            ambient: options.ambient,
            light_intensity: options.light_intensity,
            reflectivity: options.reflectivity,
            light_constant: options.light_constant,
            light_linear: options.light_linear,
            light_quadratic: options.light_quadratic,
            light_color: LIGHT_COLOR,
            exposure: options.exposure,
            gamma: options.gamma,
            glow: options.glow,
            bloom: options.bloom,
            outline: options.outline,
            blur: options.blur,
            grayscale: options.grayscale,
            vertical_mirror: options.vertical_mirror,
            horizontal_mirror: options.horizontal_mirror,
            orbits: options.orbits,
            stars: options.stars,
            realism: options.realism,
            blur_iterations: options.blur_iterations,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::snapshot(&RenderOptions::default())
    }
}

impl From<&RenderOptions> for FrameConfig {
    fn from(options: &RenderOptions) -> Self {
        Self::snapshot(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_carries_every_option() {
        let options = RenderOptions {
            shininess: 3.0,
            ambient: 0.5,
            light_intensity: 0.25,
            reflectivity: 0.75,
            light_constant: 2.0,
            light_linear: 0.1,
            light_quadratic: 0.2,
            exposure: 1.5,
            gamma: 2.2,
            glow: 4.0,
            bloom: false,
            outline: true,
            blur: true,
            grayscale: true,
            vertical_mirror: true,
            horizontal_mirror: true,
            orbits: false,
            stars: false,
            realism: true,
            blur_iterations: 4,
        };
        let frame = FrameConfig::from(&options);
        assert_eq!(
            frame,
            FrameConfig {
                shininess: 3.0,
                ambient: 0.5,
                light_intensity: 0.25,
                reflectivity: 0.75,
                light_constant: 2.0,
                light_linear: 0.1,
                light_quadratic: 0.2,
                light_color: LIGHT_COLOR,
                exposure: 1.5,
                gamma: 2.2,
                glow: 4.0,
                bloom: false,
                outline: true,
                blur: true,
                grayscale: true,
                vertical_mirror: true,
                horizontal_mirror: true,
                orbits: false,
                stars: false,
                realism: true,
                blur_iterations: 4,
            }
        );
    }

    #[test]
    fn test_default_blur_iterations() {
        assert_eq!(FrameConfig::default().blur_iterations, 10);
        assert!(!FrameConfig::default().blur);
    }
}
