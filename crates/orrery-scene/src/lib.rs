//! Scene graph for the orrery: celestial bodies arranged in a shallow
//! star → planet → moon hierarchy, world-transform propagation and the
//! per-frame depth-first traversal that feeds the renderer.

pub mod builder;
pub mod error;
pub mod graph;
pub mod node;
pub mod orbit;
pub mod transform;
pub mod traversal;

pub use error::SceneError;
pub use graph::SceneGraph;
pub use node::{NodeId, NodeRole, OrbitParams, SceneNode};
pub use orbit::{ORBIT_RING_SAMPLES, orbit_ring_samples, ring_point_on_plane};
pub use transform::{compute_local_transform, compute_world_transform, orbit_ring_transform};
pub use traversal::{
    MAX_DEPTH, NodeVisit, NodeVisitor, TraversalStats, traverse, update_world_transforms,
};
