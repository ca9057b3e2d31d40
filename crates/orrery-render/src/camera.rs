//! Camera view and projection matrices.

use glam::{Mat4, Vec3};
use orrery_config::CameraConfig;

/// Skybox cube half-size in world units.
pub const SKYBOX_SCALE: f32 = 60.0;

/// A fixed look-at camera with a standard-depth perspective projection.
///
/// Depth runs from 0 at the near plane to 1 at the far plane, so the depth
/// buffer clears to 1.0 and the skybox passes with `LessEqual`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrices {
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraMatrices {
    pub fn look_at(
        position: Vec3,
        target: Vec3,
        fov_y_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            view: Mat4::look_at_rh(position, target, Vec3::Y),
            projection: Mat4::perspective_rh(
                fov_y_degrees.to_radians(),
                aspect_ratio,
                near,
                far,
            ),
        }
    }

    /// Camera from config for a viewport of `width`×`height`.
    pub fn from_config(config: &CameraConfig, width: u32, height: u32) -> Self {
        Self::look_at(
            Vec3::from_array(config.position),
            Vec3::from_array(config.target),
            config.fov_y_degrees,
            width.max(1) as f32 / height.max(1) as f32,
            config.near,
            config.far,
        )
    }

    /// Model matrix of the skybox: centred on the camera.
    pub fn skybox_model(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(SKYBOX_SCALE))
    }
}
