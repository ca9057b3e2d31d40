//! Node arena with name lookup and parent/child bookkeeping.

use std::collections::HashMap;

use glam::Mat4;

use crate::error::SceneError;
use crate::node::{NodeId, NodeRole, OrbitParams, SceneNode};
use crate::traversal::MAX_DEPTH;

/// Owns every node of one scene.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]; children are
/// owned by their parent's child list, the parent link is a plain index. The
/// graph is an ordinary value: several graphs can coexist.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    names: HashMap<String, NodeId>,
    root: NodeId,
    root_transform: Mat4,
}

impl SceneGraph {
    /// Name of the node every graph starts with.
    pub const ROOT_NAME: &'static str = "root";

    /// A graph holding only the root, with an identity world origin.
    pub fn new() -> Self {
        Self::with_root_transform(Mat4::IDENTITY)
    }

    /// A graph whose root sits at an externally supplied world origin.
    pub fn with_root_transform(root_transform: Mat4) -> Self {
        let root = NodeId(0);
        let mut root_node = SceneNode::new(
            Self::ROOT_NAME.to_string(),
            NodeRole::Root,
            OrbitParams::default(),
            Vec::new(),
        );
        root_node.world_transform = root_transform;

        let mut names = HashMap::new();
        names.insert(Self::ROOT_NAME.to_string(), root);

        Self {
            nodes: vec![root_node],
            names,
            root,
            root_transform,
        }
    }

    /// Id of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// World transform of the root.
    pub fn root_transform(&self) -> Mat4 {
        self.root_transform
    }

    /// Move the root's world origin. Takes effect on the next traversal.
    pub fn set_root_transform(&mut self, transform: Mat4) {
        self.root_transform = transform;
    }

    /// Create a detached node whose role is derived from its name.
    pub fn create_node(
        &mut self,
        name: &str,
        orbit_radius: f32,
        self_scale: f32,
        anim_rate: f32,
        texture_paths: Vec<String>,
    ) -> Result<NodeId, SceneError> {
        self.create_node_with_role(
            name,
            NodeRole::from_name(name),
            OrbitParams::new(orbit_radius, self_scale, anim_rate),
            texture_paths,
        )
    }

    /// Create a detached node with an explicit role.
    pub fn create_node_with_role(
        &mut self,
        name: &str,
        role: NodeRole,
        orbit: OrbitParams,
        texture_paths: Vec<String>,
    ) -> Result<NodeId, SceneError> {
        if name.is_empty() {
            return Err(SceneError::EmptyName);
        }
        if role == NodeRole::Root {
            return Err(SceneError::ReservedRole);
        }
        if self.names.contains_key(name) {
            return Err(SceneError::DuplicateName(name.to_string()));
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode::new(
            name.to_string(),
            role,
            orbit,
            texture_paths,
        ));
        self.names.insert(name.to_string(), id);
        log::debug!("Created node '{name}' ({role:?})");
        Ok(id)
    }

    /// Append `child` to `parent`'s children.
    ///
    /// A rejected attachment leaves the graph untouched, logs a warning and
    /// returns the reason: an unknown id, a child that already has a parent,
    /// a cycle, or a tree deeper than [`MAX_DEPTH`].
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check_attach(parent, child).inspect_err(|err| {
            log::warn!("add_child ignored: {err}");
        })?;

        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;

        if let Some(existing) = self.nodes[child.index()].parent {
            return Err(SceneError::AlreadyParented {
                child: self.name_of(child).to_string(),
                parent: self.name_of(existing).to_string(),
            });
        }

        if child == self.root || self.ancestors_inclusive(parent).any(|id| id == child) {
            return Err(SceneError::Cycle {
                child: self.name_of(child).to_string(),
                parent: self.name_of(parent).to_string(),
            });
        }

        // Deepest level the child's subtree would reach below the parent's top ancestor.
        let depth = self.ancestors_inclusive(parent).count() - 1 + self.subtree_height(child);
        if depth > MAX_DEPTH {
            return Err(SceneError::TooDeep {
                child: self.name_of(child).to_string(),
                parent: self.name_of(parent).to_string(),
                max: MAX_DEPTH,
            });
        }
        Ok(())
    }

    /// Look a node up by name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    /// Mutably borrow a node. Tree links stay under the graph's control.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    /// Borrow a node by name.
    pub fn get(&self, name: &str) -> Option<&SceneNode> {
        self.find_by_name(name).and_then(|id| self.node(id))
    }

    /// Children of `id` in draw order; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    /// Depth below the root (root = 0), `None` for nodes not attached to the root.
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        self.node(id)?;
        let mut depth = 0;
        let mut top = id;
        for ancestor in self.ancestors_inclusive(id).skip(1) {
            depth += 1;
            top = ancestor;
        }
        (top == self.root).then_some(depth)
    }

    /// Show or hide a node and, implicitly, its whole subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        self.check(id)?;
        self.nodes[id.index()].visible = visible;
        Ok(())
    }

    /// Change a node's orbit radius.
    pub fn set_orbit_radius(&mut self, id: NodeId, orbit_radius: f32) -> Result<(), SceneError> {
        self.check(id)?;
        self.nodes[id.index()].orbit.orbit_radius = orbit_radius;
        Ok(())
    }

    /// Number of nodes including the root and detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a graph owns at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [SceneNode] {
        &mut self.nodes
    }

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    fn name_of(&self, id: NodeId) -> &str {
        self.nodes[id.index()].name()
    }

    /// `id` followed by its parent, grandparent, and so on.
    fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |current| self.nodes[current.index()].parent)
    }

    /// Levels in the subtree rooted at `id`, counting `id` itself.
    fn subtree_height(&self, id: NodeId) -> usize {
        let mut height = 0;
        let mut stack = vec![(id, 1usize)];
        while let Some((current, level)) = stack.pop() {
            height = height.max(level);
            for &child in &self.nodes[current.index()].children {
                stack.push((child, level + 1));
            }
        }
        height
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_earth() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let earth = graph
            .create_node("earth", 9.0, 0.038, 2.4, vec!["earth.jpg".to_string()])
            .unwrap();
        graph.add_child(graph.root(), earth).unwrap();
        (graph, earth)
    }

    #[test]
    fn test_new_graph_has_root_only() {
        let graph = SceneGraph::new();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.find_by_name("root"), Some(graph.root()));
        assert_eq!(graph.node(graph.root()).unwrap().role(), NodeRole::Root);
        assert_eq!(graph.depth_of(graph.root()), Some(0));
    }

    #[test]
    fn test_create_node_rejects_empty_name() {
        let mut graph = SceneGraph::new();
        let result = graph.create_node("", 1.0, 1.0, 1.0, Vec::new());
        assert_eq!(result, Err(SceneError::EmptyName));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_create_node_rejects_duplicate_name() {
        let (mut graph, _) = graph_with_earth();
        let result = graph.create_node("earth", 1.0, 1.0, 1.0, Vec::new());
        assert_eq!(result, Err(SceneError::DuplicateName("earth".to_string())));
    }

    #[test]
    fn test_create_node_rejects_root_role() {
        let mut graph = SceneGraph::new();
        let result =
            graph.create_node_with_role("origin", NodeRole::Root, OrbitParams::default(), vec![]);
        assert_eq!(result, Err(SceneError::ReservedRole));
    }

    #[test]
    fn test_created_node_is_detached() {
        let mut graph = SceneGraph::new();
        let mars = graph.create_node("mars", 12.0, 0.1, 1.0, Vec::new()).unwrap();
        assert_eq!(graph.parent(mars), None);
        assert_eq!(graph.depth_of(mars), None);
        assert!(graph.children(graph.root()).is_empty());
        assert_eq!(graph.node(mars).unwrap().role(), NodeRole::Planet);
    }

    #[test]
    fn test_add_child_links_both_directions() {
        let (graph, earth) = graph_with_earth();
        assert_eq!(graph.parent(earth), Some(graph.root()));
        assert_eq!(graph.children(graph.root()), &[earth]);
        assert_eq!(graph.depth_of(earth), Some(1));
    }

    #[test]
    fn test_add_child_refuses_reparenting() {
        let (mut graph, earth) = graph_with_earth();
        let mars = graph.create_node("mars", 12.0, 0.1, 1.0, Vec::new()).unwrap();
        graph.add_child(graph.root(), mars).unwrap();

        let result = graph.add_child(mars, earth);
        assert!(matches!(result, Err(SceneError::AlreadyParented { .. })));
        assert_eq!(graph.parent(earth), Some(graph.root()));
        assert!(graph.children(mars).is_empty());
    }

    #[test]
    fn test_add_child_refuses_root_and_cycles() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a", 1.0, 1.0, 1.0, Vec::new()).unwrap();
        let b = graph.create_node("b", 1.0, 1.0, 1.0, Vec::new()).unwrap();
        graph.add_child(a, b).unwrap();

        assert!(matches!(
            graph.add_child(a, graph.root()),
            Err(SceneError::Cycle { .. })
        ));
        assert!(matches!(graph.add_child(b, a), Err(SceneError::Cycle { .. })));
        assert!(matches!(graph.add_child(a, a), Err(SceneError::Cycle { .. })));
    }

    #[test]
    fn test_add_child_enforces_depth_limit() {
        let mut graph = SceneGraph::new();
        let mut parent = graph.root();
        for level in 1..=MAX_DEPTH {
            let id = graph
                .create_node(&format!("level{level}"), 1.0, 1.0, 1.0, Vec::new())
                .unwrap();
            graph.add_child(parent, id).unwrap();
            parent = id;
        }
        let too_deep = graph.create_node("too_deep", 1.0, 1.0, 1.0, vec![]).unwrap();
        assert!(matches!(
            graph.add_child(parent, too_deep),
            Err(SceneError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_attaching_a_deep_detached_subtree_is_checked() {
        let mut graph = SceneGraph::new();
        let planet = graph.create_node("planet", 1.0, 1.0, 1.0, vec![]).unwrap();
        let moon = graph.create_node("moon", 1.0, 1.0, 1.0, vec![]).unwrap();
        let pebble = graph.create_node("pebble", 1.0, 1.0, 1.0, vec![]).unwrap();
        let dust = graph.create_node("dust", 1.0, 1.0, 1.0, vec![]).unwrap();
        graph.add_child(planet, moon).unwrap();
        graph.add_child(moon, pebble).unwrap();
        graph.add_child(pebble, dust).unwrap();

        assert!(matches!(
            graph.add_child(graph.root(), planet),
            Err(SceneError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let mut graph = SceneGraph::new();
        let ghost = NodeId(99);
        assert_eq!(
            graph.add_child(graph.root(), ghost),
            Err(SceneError::UnknownNode(ghost))
        );
        assert_eq!(
            graph.set_visible(ghost, false),
            Err(SceneError::UnknownNode(ghost))
        );
        assert!(graph.node(ghost).is_none());
    }

    mod warnings {
        use std::cell::RefCell;

        thread_local! {
            static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        }

        struct CaptureLogger;

        impl log::Log for CaptureLogger {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                metadata.level() <= log::Level::Warn
            }

            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    CAPTURED.with(|c| c.borrow_mut().push(record.args().to_string()));
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: CaptureLogger = CaptureLogger;

        /// Warnings logged on this thread since the last call.
        pub fn take() -> Vec<String> {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Warn);
            }
            CAPTURED.with(|c| std::mem::take(&mut *c.borrow_mut()))
        }
    }

    #[test]
    fn test_every_rejected_attachment_logs_a_warning() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a", 1.0, 1.0, 1.0, Vec::new()).unwrap();
        let b = graph.create_node("b", 1.0, 1.0, 1.0, Vec::new()).unwrap();
        graph.add_child(graph.root(), a).unwrap();
        graph.add_child(a, b).unwrap();
        let mut parent = b;
        for level in 3..=MAX_DEPTH {
            let id = graph
                .create_node(&format!("level{level}"), 1.0, 1.0, 1.0, Vec::new())
                .unwrap();
            graph.add_child(parent, id).unwrap();
            parent = id;
        }
        let loose = graph.create_node("loose", 1.0, 1.0, 1.0, Vec::new()).unwrap();
        warnings::take();

        let rejections = [
            graph.add_child(graph.root(), NodeId(99)),
            graph.add_child(graph.root(), b),
            graph.add_child(a, graph.root()),
            graph.add_child(parent, loose),
        ];
        assert!(matches!(rejections[0], Err(SceneError::UnknownNode(_))));
        assert!(matches!(rejections[1], Err(SceneError::AlreadyParented { .. })));
        assert!(matches!(rejections[2], Err(SceneError::Cycle { .. })));
        assert!(matches!(rejections[3], Err(SceneError::TooDeep { .. })));

        let logged = warnings::take();
        assert_eq!(logged.len(), rejections.len(), "{logged:?}");
        assert!(logged.iter().all(|line| line.starts_with("add_child ignored")));
        assert!(graph.children(loose).is_empty());
        assert_eq!(graph.parent(loose), None);
    }

    #[test]
    fn test_find_by_name() {
        let (graph, earth) = graph_with_earth();
        assert_eq!(graph.find_by_name("earth"), Some(earth));
        assert_eq!(graph.find_by_name("vulcan"), None);
        assert_eq!(graph.get("earth").unwrap().orbit.orbit_radius, 9.0);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut graph = SceneGraph::new();
        let names = ["mercury", "venus", "earth", "mars"];
        let ids: Vec<NodeId> = names
            .iter()
            .map(|name| {
                let id = graph.create_node(name, 1.0, 1.0, 1.0, Vec::new()).unwrap();
                graph.add_child(graph.root(), id).unwrap();
                id
            })
            .collect();
        assert_eq!(graph.children(graph.root()), ids.as_slice());
    }

    #[test]
    fn test_set_orbit_radius() {
        let (mut graph, earth) = graph_with_earth();
        graph.set_orbit_radius(earth, 11.0).unwrap();
        assert_eq!(graph.node(earth).unwrap().orbit.orbit_radius, 11.0);
    }
}
