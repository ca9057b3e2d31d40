//! Orbit ring tessellation.

use glam::{Vec2, Vec3};

/// Samples in the unit orbit ring: 0° to 360° inclusive in 1° steps.
pub const ORBIT_RING_SAMPLES: usize = 361;

/// Unit circle sampled once per degree, `(cos θ, -sin θ)`.
///
/// The last sample repeats the first exactly so the ring can be drawn as a
/// closed strip.
pub fn orbit_ring_samples() -> Vec<Vec2> {
    let mut samples = Vec::with_capacity(ORBIT_RING_SAMPLES);
    for degree in 0..ORBIT_RING_SAMPLES - 1 {
        let theta = (degree as f64).to_radians();
        samples.push(Vec2::new(theta.cos() as f32, -theta.sin() as f32));
    }
    samples.push(samples[0]);
    samples
}

/// Lift a ring sample into the orbital (XZ) plane.
///
/// A body at orbit angle θ sits at `(cos θ, 0, -sin θ)` on its unit orbit,
/// which is exactly where ring sample θ lands.
pub fn ring_point_on_plane(sample: Vec2) -> Vec3 {
    Vec3::new(sample.x, 0.0, sample.y)
}
