//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level orrery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Viewport settings.
    pub window: WindowConfig,
    /// Render option surface: lighting knobs and post-process toggles.
    pub render: RenderOptions,
    /// Scene construction input.
    pub scene: SceneConfig,
    /// Fixed camera placement.
    pub camera: CameraConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Viewport configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Title used for logs and screenshots.
    pub title: String,
}

/// Render options consumed every frame.
///
/// The renderer never reads this directly while drawing; it copies it into a
/// frame snapshot at the start of every frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    /// Specular exponent for planet shading.
    pub shininess: f32,
    /// Ambient term added to every lit body.
    pub ambient: f32,
    /// Point light intensity at the sun.
    pub light_intensity: f32,
    /// Specular reflectivity.
    pub reflectivity: f32,
    /// Constant attenuation coefficient.
    pub light_constant: f32,
    /// Linear attenuation coefficient.
    pub light_linear: f32,
    /// Quadratic attenuation coefficient.
    pub light_quadratic: f32,
    /// HDR exposure used by the tone mapper.
    pub exposure: f32,
    /// Gamma applied after tone mapping.
    pub gamma: f32,
    /// Emissive boost of the sun; drives the bright pass.
    pub glow: f32,
    /// Add the bright-pass result back onto the image.
    pub bloom: bool,
    /// Outline shading on planets.
    pub outline: bool,
    /// Run the separable blur over the bright pass.
    pub blur: bool,
    /// Grayscale output.
    pub grayscale: bool,
    /// Mirror the output vertically.
    pub vertical_mirror: bool,
    /// Mirror the output horizontally.
    pub horizontal_mirror: bool,
    /// Draw orbit rings.
    pub orbits: bool,
    /// Draw the starfield.
    pub stars: bool,
    /// Debug mode: draw earth as a flat quad instead of a sphere.
    pub realism: bool,
    /// Number of blur passes (alternating horizontal/vertical).
    pub blur_iterations: u32,
}

/// Role a body plays in the scene; decides its material.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BodyRole {
    /// Emissive bloom source.
    Sun,
    /// Multi-texture planet (surface, clouds, night lights).
    Earth,
    /// Standard lit planet.
    Planet,
}

/// One celestial body of the scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    /// Unique node name.
    pub name: String,
    /// Name of the body this one orbits; `None` attaches it to the scene root.
    pub parent: Option<String>,
    /// Explicit role; derived from the name when absent.
    pub role: Option<BodyRole>,
    /// Orbit radius around the parent.
    pub orbit_radius: f32,
    /// Orbital angular rate in radians per simulation second.
    pub orbit_rate: f32,
    /// Uniform scale of the body (planet radius).
    pub self_scale: f32,
    /// Animation multiplier applied on top of `orbit_rate`.
    pub anim_rate: f32,
    /// Comma-separated texture paths, relative to the asset directory.
    pub textures: String,
}

/// Scene construction input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Bodies in attachment order; a parent must precede its children.
    pub bodies: Vec<BodyConfig>,
    /// Skybox cube faces: +X, -X, +Y, -Y, +Z, -Z.
    pub skybox_faces: [String; 6],
    /// Number of starfield points.
    pub star_count: u32,
    /// Seed for the starfield.
    pub star_seed: u64,
    /// Simulation seconds per wall-clock second.
    pub time_scale: f32,
    /// Directory textures are resolved against.
    pub asset_dir: PathBuf,
}

/// Fixed camera placement. Camera control lives outside the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position.
    pub position: [f32; 3],
    /// Look-at target.
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            shininess: 11.9,
            ambient: 0.04,
            light_intensity: 1.45,
            reflectivity: 0.137,
            light_constant: 1.0,
            light_linear: 0.001,
            light_quadratic: 0.001,
            exposure: 2.01,
            gamma: 0.67,
            glow: 2.0,
            bloom: true,
            outline: false,
            blur: false,
            grayscale: false,
            vertical_mirror: false,
            horizontal_mirror: false,
            orbits: true,
            stars: true,
            realism: false,
            blur_iterations: 10,
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            role: None,
            orbit_radius: 0.0,
            orbit_rate: 1.0,
            self_scale: 1.0,
            anim_rate: 0.0,
            textures: String::new(),
        }
    }
}

impl BodyConfig {
    /// Convenience constructor for a body attached to the scene root.
    pub fn new(
        name: &str,
        orbit_radius: f32,
        self_scale: f32,
        anim_rate: f32,
        textures: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            orbit_radius,
            self_scale,
            anim_rate,
            textures: textures.to_string(),
            ..Default::default()
        }
    }

    /// Set the orbital angular rate that `anim_rate` multiplies.
    pub fn with_orbit_rate(mut self, orbit_rate: f32) -> Self {
        self.orbit_rate = orbit_rate;
        self
    }

    /// Attach this body under a named parent instead of the root.
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// The texture list split on commas, trimmed, empty entries removed.
    pub fn texture_list(&self) -> Vec<String> {
        self.textures
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            bodies: default_bodies(),
            skybox_faces: [
                "milkyway/XP.jpg".to_string(),
                "milkyway/XN.jpg".to_string(),
                "milkyway/YP.jpg".to_string(),
                "milkyway/YN.jpg".to_string(),
                "milkyway/ZP.jpg".to_string(),
                "milkyway/ZN.jpg".to_string(),
            ],
            star_count: 10_000,
            star_seed: 42,
            time_scale: 10.0,
            asset_dir: PathBuf::from("assets"),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 18.0, 42.0],
            target: [0.0, 0.0, 0.0],
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 500.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// The solar system the renderer ships with: the sun, nine planets and the moon.
fn default_bodies() -> Vec<BodyConfig> {
    // name, orbit radius, orbit rate, scale, animation rate, textures
    let rows: [(&str, f32, f32, f32, f32, &str); 11] = [
        ("sun", 0.0, 0.0, 1.0, 0.5, "planets/2k_sun.jpg"),
        ("mercury", 3.0, 0.06, 0.2, 1.0, "planets/2k_mercury.jpg"),
        ("venus", 6.0, 0.05, 0.2, 1.0, "planets/2k_venus.jpg"),
        (
            "earth",
            9.0,
            0.038,
            0.3,
            2.4,
            "planets/2k_earth.jpg,planets/2k_earth_clouds.jpg,planets/2k_earth_nightmap.jpg",
        ),
        ("mars", 12.0, 0.029, 0.1, 1.0, "planets/2k_mars.jpg"),
        ("jupiter", 15.0, 0.022, 0.7, 1.0, "planets/2k_jupiter.jpg"),
        ("saturn", 18.0, 0.034, 0.6, 1.0, "planets/2k_saturn.jpg"),
        ("uranus", 21.0, 0.026, 0.4, 1.0, "planets/2k_uranus.jpg"),
        ("neptune", 24.0, 0.028, 0.4, 1.0, "planets/2k_neptune.jpg"),
        ("pluto", 27.0, 0.031, 0.1, 1.0, "planets/plutomap.png"),
        ("moon", 2.0, 1.0, 0.1, 2.0, "planets/2k_moon.jpg"),
    ];
    rows.iter()
        .map(|&(name, radius, orbit_rate, scale, anim_rate, textures)| {
            let body = BodyConfig::new(name, radius, scale, anim_rate, textures)
                .with_orbit_rate(orbit_rate);
            if name == "moon" {
                body.with_parent("earth")
            } else {
                body
            }
        })
        .collect()
}

/// Platform config directory for the orrery, if the platform has one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("orrery"))
}

// --- Load / Save / Reload ---

/// Name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Load `config.ron` from the given directory, or write the defaults there.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = read_config_file(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let write_error = |source| ConfigError::Write {
            path: config_path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(write_error)?;
        Ok(())
    }

    /// Re-read `config.ron`: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config_file(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
