//! Local and world transform composition.
//!
//! Bodies orbit in the XZ plane around their parent's origin. The local
//! transform is a pure function of the orbital parameters and the simulation
//! time; the world transform is the parent's world transform composed with it.

use glam::{Mat4, Vec3};

use crate::node::OrbitParams;

/// Orbit angle in radians at simulation time `time`.
pub fn orbit_angle(params: &OrbitParams, time: f32) -> f32 {
    time * params.orbit_rate * params.anim_rate
}

/// Local transform of a body at simulation time `time`.
///
/// `R_y(orbit_angle) * T(orbit_radius, 0, 0) * S(self_scale)`: the body is
/// carried along the orbit, then scaled to its radius. Identical inputs always
/// produce bit-identical matrices.
pub fn compute_local_transform(params: &OrbitParams, time: f32) -> Mat4 {
    let rotation = Mat4::from_rotation_y(orbit_angle(params, time));
    let translation = Mat4::from_translation(Vec3::new(params.orbit_radius, 0.0, 0.0));
    let scale = Mat4::from_scale(Vec3::splat(params.self_scale));
    rotation * translation * scale
}

/// World transform of a node whose parent sits at `parent_world`.
pub fn compute_world_transform(parent_world: Mat4, local: Mat4) -> Mat4 {
    parent_world * local
}

/// Model matrix for a node's orbit ring.
///
/// The unit ring is scaled to the orbit radius and placed in the parent's
/// frame, so it follows the parent but never the node's own rotation.
pub fn orbit_ring_transform(parent_world: Mat4, orbit_radius: f32) -> Mat4 {
    parent_world * Mat4::from_scale(Vec3::splat(orbit_radius))
}
