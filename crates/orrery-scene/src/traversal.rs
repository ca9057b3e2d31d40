//! Depth-first scene traversal.
//!
//! The walk uses an explicit work stack, so the hierarchy depth bound is a
//! checked property of the traversal rather than a property of the call stack.

use glam::Mat4;

use crate::graph::SceneGraph;
use crate::node::{NodeId, SceneNode};
use crate::transform::{compute_local_transform, compute_world_transform};

/// Levels allowed below the root (star → planet → moon).
pub const MAX_DEPTH: usize = 3;

/// A node handed to a [`NodeVisitor`], with its world transform already
/// computed for the current frame.
#[derive(Debug)]
pub struct NodeVisit<'a> {
    pub id: NodeId,
    pub node: &'a SceneNode,
    /// World transform of the parent (the accumulator this node was folded with).
    pub parent_world: Mat4,
    /// Levels below the root; direct children of the root are at depth 1.
    pub depth: usize,
    /// World transform of the root, where the light sits.
    pub root_world: Mat4,
}

impl NodeVisit<'_> {
    /// World transform computed for this node during the current traversal.
    pub fn world(&self) -> Mat4 {
        self.node.world_transform()
    }
}

/// Receives every visible non-root node in draw order.
pub trait NodeVisitor {
    fn visit(&mut self, visit: &NodeVisit<'_>);
}

impl<F> NodeVisitor for F
where
    F: FnMut(&NodeVisit<'_>),
{
    fn visit(&mut self, visit: &NodeVisit<'_>) {
        self(visit)
    }
}

/// Counters from one traversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Non-root nodes whose transform was computed and that reached the visitor.
    pub visited: usize,
    /// Invisible nodes that cut off their subtree (descendants are not counted).
    pub pruned_invisible: usize,
    /// Nodes skipped for being deeper than [`MAX_DEPTH`].
    pub pruned_depth: usize,
}

struct Pending {
    id: NodeId,
    parent_world: Mat4,
    depth: usize,
}

/// Walk the graph at simulation time `time`.
///
/// Each visible node's world transform is recomputed and stored before the
/// node reaches `visitor`. Children follow their parent; siblings keep
/// insertion order. An invisible node is skipped together with its subtree,
/// whatever its descendants' own flags say.
pub fn traverse<V>(graph: &mut SceneGraph, time: f32, visitor: &mut V) -> TraversalStats
where
    V: NodeVisitor + ?Sized,
{
    let mut stats = TraversalStats::default();
    let root = graph.root();
    let root_world = graph.root_transform();

    {
        let nodes = graph.nodes_mut();
        let root_node = &mut nodes[root.index()];
        root_node.local_transform = Mat4::IDENTITY;
        root_node.world_transform = root_world;
        if !root_node.visible {
            stats.pruned_invisible += 1;
            return stats;
        }
    }

    let mut stack: Vec<Pending> = graph
        .children(root)
        .iter()
        .rev()
        .map(|&id| Pending {
            id,
            parent_world: root_world,
            depth: 1,
        })
        .collect();

    while let Some(Pending {
        id,
        parent_world,
        depth,
    }) = stack.pop()
    {
        if depth > MAX_DEPTH {
            log::warn!(
                "Skipping '{}': deeper than {MAX_DEPTH} levels",
                graph.node(id).map(|n| n.name()).unwrap_or("?")
            );
            stats.pruned_depth += 1;
            continue;
        }

        let world = {
            let Some(node) = graph.node_mut(id) else {
                continue;
            };
            if !node.visible {
                stats.pruned_invisible += 1;
                continue;
            }
            let local = compute_local_transform(&node.orbit, time);
            let world = compute_world_transform(parent_world, local);
            node.local_transform = local;
            node.world_transform = world;
            world
        };

        if let Some(node) = graph.node(id) {
            stats.visited += 1;
            visitor.visit(&NodeVisit {
                id,
                node,
                parent_world,
                depth,
                root_world,
            });
        }

        stack.extend(graph.children(id).iter().rev().map(|&child| Pending {
            id: child,
            parent_world: world,
            depth: depth + 1,
        }));
    }

    stats
}

/// Recompute every reachable world transform without drawing anything.
pub fn update_world_transforms(graph: &mut SceneGraph, time: f32) -> TraversalStats {
    traverse(graph, time, &mut |_: &NodeVisit<'_>| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// root → sun, earth → moon, mars
    fn solar_graph() -> (SceneGraph, [NodeId; 4]) {
        let mut graph = SceneGraph::new();
        let sun = graph.create_node("sun", 0.0, 2.0, 0.0, vec![]).unwrap();
        let earth = graph.create_node("earth", 9.0, 0.038, 2.4, vec![]).unwrap();
        let moon = graph.create_node("moon", 3.0, 0.5, 1.5, vec![]).unwrap();
        let mars = graph.create_node("mars", 12.0, 0.1, 1.0, vec![]).unwrap();
        let root = graph.root();
        graph.add_child(root, sun).unwrap();
        graph.add_child(root, earth).unwrap();
        graph.add_child(earth, moon).unwrap();
        graph.add_child(root, mars).unwrap();
        (graph, [sun, earth, moon, mars])
    }

    fn visit_order(graph: &mut SceneGraph, time: f32) -> Vec<String> {
        let mut names = Vec::new();
        traverse(graph, time, &mut |visit: &NodeVisit<'_>| {
            names.push(visit.node.name().to_string())
        });
        names
    }

    #[test]
    fn test_preorder_with_siblings_in_insertion_order() {
        let (mut graph, _) = solar_graph();
        assert_eq!(visit_order(&mut graph, 0.0), ["sun", "earth", "moon", "mars"]);
    }

    #[test]
    fn test_single_body_world_position_and_scale() {
        let mut graph = SceneGraph::new();
        let earth = graph.create_node("earth", 9.0, 0.038, 2.4, vec![]).unwrap();
        graph.add_child(graph.root(), earth).unwrap();
        update_world_transforms(&mut graph, 0.0);

        let world = graph.node(earth).unwrap().world_transform();
        let (scale, _, translation) = world.to_scale_rotation_translation();
        assert!((translation.length() - 9.0).abs() < 1e-5);
        assert!(scale.abs_diff_eq(Vec3::splat(0.038), 1e-6));
    }

    #[test]
    fn test_root_is_not_visited() {
        let (mut graph, _) = solar_graph();
        let stats = update_world_transforms(&mut graph, 1.0);
        assert_eq!(stats.visited, 4);
        assert!(!visit_order(&mut graph, 1.0).contains(&"root".to_string()));
    }

    #[test]
    fn test_world_equals_parent_world_times_local() {
        let (mut graph, ids) = solar_graph();
        graph.set_root_transform(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let time = 4.75;
        update_world_transforms(&mut graph, time);

        for id in ids {
            let node = graph.node(id).unwrap();
            let parent = graph.node(node.parent().unwrap()).unwrap();
            let expected =
                parent.world_transform() * compute_local_transform(&node.orbit, time);
            assert!(
                node.world_transform().abs_diff_eq(expected, 1e-5),
                "{}",
                node.name()
            );
        }
    }

    #[test]
    fn test_three_level_composition_decomposes() {
        let (mut graph, [_, earth, moon, _]) = solar_graph();
        update_world_transforms(&mut graph, 0.0);

        // At t = 0 every rotation is identity: moon = T(9) S(0.038) T(3) S(0.5).
        let moon_world = graph.node(moon).unwrap().world_transform();
        let (scale, _, translation) = moon_world.to_scale_rotation_translation();
        assert!(scale.abs_diff_eq(Vec3::splat(0.038 * 0.5), 1e-6));
        assert!(translation.abs_diff_eq(Vec3::new(9.0 + 0.038 * 3.0, 0.0, 0.0), 1e-5));

        graph.set_orbit_radius(earth, 20.0).unwrap();
        update_world_transforms(&mut graph, 0.0);
        let moved = graph.node(moon).unwrap().world_position();
        assert!(moved.abs_diff_eq(Vec3::new(20.0 + 0.038 * 3.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_invisible_subtree_is_pruned() {
        let (mut graph, [_, earth, moon, _]) = solar_graph();
        graph.set_visible(earth, false).unwrap();
        // The moon's own flag does not matter once its parent is hidden.
        graph.set_visible(moon, true).unwrap();

        let mut names = Vec::new();
        let stats = traverse(&mut graph, 0.0, &mut |visit: &NodeVisit<'_>| {
            names.push(visit.node.name().to_string())
        });
        assert_eq!(names, ["sun", "mars"]);
        assert_eq!(stats.visited, 2);
        assert_eq!(stats.pruned_invisible, 1);
    }

    #[test]
    fn test_pruned_nodes_keep_stale_transforms() {
        let (mut graph, [_, earth, moon, _]) = solar_graph();
        update_world_transforms(&mut graph, 0.0);
        let before = graph.node(moon).unwrap().world_transform();

        graph.set_visible(earth, false).unwrap();
        update_world_transforms(&mut graph, 3.0);
        assert_eq!(graph.node(moon).unwrap().world_transform(), before);
    }

    #[test]
    fn test_hidden_root_prunes_everything() {
        let (mut graph, _) = solar_graph();
        let root = graph.root();
        graph.set_visible(root, false).unwrap();
        let stats = update_world_transforms(&mut graph, 0.0);
        assert_eq!(stats.visited, 0);
        assert_eq!(stats.pruned_invisible, 1);
    }

    #[test]
    fn test_visit_carries_depth_and_parent_world() {
        let (mut graph, [_, earth, moon, _]) = solar_graph();
        let mut seen = Vec::new();
        traverse(&mut graph, 0.5, &mut |visit: &NodeVisit<'_>| {
            seen.push((visit.id, visit.depth, visit.parent_world))
        });
        let earth_world = graph.node(earth).unwrap().world_transform();
        let (_, depth, parent_world) = seen.iter().find(|(id, _, _)| *id == moon).unwrap();
        assert_eq!(*depth, 2);
        assert_eq!(*parent_world, earth_world);
    }

    #[test]
    fn test_detached_nodes_are_not_visited() {
        let (mut graph, _) = solar_graph();
        graph.create_node("rogue", 5.0, 1.0, 1.0, vec![]).unwrap();
        assert!(!visit_order(&mut graph, 0.0).contains(&"rogue".to_string()));
    }
}
