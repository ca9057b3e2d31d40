//! Scene node data model.

use glam::Mat4;
use orrery_config::BodyRole;

/// Index of a node inside its [`SceneGraph`](crate::SceneGraph) arena.
///
/// Ids are only meaningful for the graph that issued them. A child refers to
/// its parent through an id, so the tree owns nodes in one direction only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which material and uniform set a node renders with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// The scene root: traversed, never drawn.
    Root,
    /// Emissive body; the source of the bright pass.
    Sun,
    /// Multi-texture body: surface, clouds, night lights.
    Earth,
    /// Standard lit body.
    Planet,
}

impl NodeRole {
    /// Role for a body whose description does not state one.
    pub fn from_name(name: &str) -> Self {
        match name {
            "sun" => NodeRole::Sun,
            "earth" => NodeRole::Earth,
            _ => NodeRole::Planet,
        }
    }

    /// Whether the traversal hands nodes of this role to the renderer.
    pub fn is_drawable(self) -> bool {
        self != NodeRole::Root
    }
}

impl From<BodyRole> for NodeRole {
    fn from(role: BodyRole) -> Self {
        match role {
            BodyRole::Sun => NodeRole::Sun,
            BodyRole::Earth => NodeRole::Earth,
            BodyRole::Planet => NodeRole::Planet,
        }
    }
}

/// Orbital parameters of a body relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitParams {
    /// Distance from the parent's origin.
    pub orbit_radius: f32,
    /// Orbital angular rate in radians per simulation second.
    pub orbit_rate: f32,
    /// Uniform scale (planet radius). Inherited by children.
    pub self_scale: f32,
    /// Multiplier on `orbit_rate`.
    pub anim_rate: f32,
}

impl OrbitParams {
    /// Orbital parameters with a unit orbit rate, so the orbit angle advances
    /// by `anim_rate` radians per simulation second.
    pub fn new(orbit_radius: f32, self_scale: f32, anim_rate: f32) -> Self {
        Self {
            orbit_radius,
            orbit_rate: 1.0,
            self_scale,
            anim_rate,
        }
    }

    pub fn with_orbit_rate(mut self, orbit_rate: f32) -> Self {
        self.orbit_rate = orbit_rate;
        self
    }
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }
}

/// A body in the scene.
#[derive(Clone, Debug)]
pub struct SceneNode {
    name: String,
    role: NodeRole,
    /// Orbit around the parent.
    pub orbit: OrbitParams,
    /// Ordered texture paths; the role decides how many are consumed.
    pub textures: Vec<String>,
    /// Invisible nodes are skipped together with their whole subtree.
    pub visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) local_transform: Mat4,
    pub(crate) world_transform: Mat4,
}

impl SceneNode {
    pub(crate) fn new(
        name: String,
        role: NodeRole,
        orbit: OrbitParams,
        textures: Vec<String>,
    ) -> Self {
        Self {
            name,
            role,
            orbit,
            textures,
            visible: true,
            parent: None,
            children: Vec::new(),
            local_transform: Mat4::IDENTITY,
            world_transform: Mat4::IDENTITY,
        }
    }

    /// Unique name within the graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role assigned at construction.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Parent id, `None` for the root and for detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion (draw) order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local transform computed by the last traversal that visited this node.
    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// World transform computed by the last traversal that visited this node.
    ///
    /// Stale between frames; only meaningful after the current frame's traversal.
    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    /// World-space position of the node's origin.
    pub fn world_position(&self) -> glam::Vec3 {
        self.world_transform.w_axis.truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_name() {
        assert_eq!(NodeRole::from_name("sun"), NodeRole::Sun);
        assert_eq!(NodeRole::from_name("earth"), NodeRole::Earth);
        assert_eq!(NodeRole::from_name("mars"), NodeRole::Planet);
        assert_eq!(NodeRole::from_name("Earth"), NodeRole::Planet);
    }

    #[test]
    fn test_root_is_not_drawable() {
        assert!(!NodeRole::Root.is_drawable());
        assert!(NodeRole::Sun.is_drawable());
        assert!(NodeRole::Planet.is_drawable());
    }

    #[test]
    fn test_body_role_conversion() {
        assert_eq!(NodeRole::from(BodyRole::Earth), NodeRole::Earth);
        assert_eq!(NodeRole::from(BodyRole::Sun), NodeRole::Sun);
    }

    #[test]
    fn test_new_node_is_detached_and_visible() {
        let node = SceneNode::new(
            "mars".to_string(),
            NodeRole::Planet,
            OrbitParams::new(12.0, 0.1, 0.029),
            vec!["mars.jpg".to_string()],
        );
        assert!(node.visible);
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
        assert_eq!(node.world_transform(), Mat4::IDENTITY);
    }
}
