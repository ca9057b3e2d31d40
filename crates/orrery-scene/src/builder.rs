//! Scene construction from configuration.

use orrery_config::BodyConfig;

use crate::error::SceneError;
use crate::graph::SceneGraph;
use crate::node::{NodeRole, OrbitParams};

impl SceneGraph {
    /// Build a graph from an ordered body list.
    ///
    /// Bodies without a parent orbit the root; a named parent must appear
    /// earlier in the list.
    pub fn from_bodies(bodies: &[BodyConfig]) -> Result<Self, SceneError> {
        let mut graph = SceneGraph::new();

        for body in bodies {
            let role = body
                .role
                .map(NodeRole::from)
                .unwrap_or_else(|| NodeRole::from_name(&body.name));
            let parent = match &body.parent {
                None => graph.root(),
                Some(name) => {
                    graph
                        .find_by_name(name)
                        .ok_or_else(|| SceneError::UnknownParent {
                            body: body.name.clone(),
                            parent: name.clone(),
                        })?
                }
            };

            let id = graph.create_node_with_role(
                &body.name,
                role,
                OrbitParams::new(body.orbit_radius, body.self_scale, body.anim_rate)
                    .with_orbit_rate(body.orbit_rate),
                body.texture_list(),
            )?;
            graph.add_child(parent, id)?;
        }

        log::info!("Built scene with {} bodies", bodies.len());
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_config::{BodyRole, SceneConfig};

    #[test]
    fn test_default_earth_orbit_params() {
        let graph = SceneGraph::from_bodies(&SceneConfig::default().bodies).unwrap();
        let earth = graph.node(graph.find_by_name("earth").unwrap()).unwrap();
        assert_eq!(earth.orbit.orbit_radius, 9.0);
        assert_eq!(earth.orbit.orbit_rate, 0.038);
        assert_eq!(earth.orbit.self_scale, 0.3);
        assert_eq!(earth.orbit.anim_rate, 2.4);

        let sun = graph.node(graph.find_by_name("sun").unwrap()).unwrap();
        assert_eq!(sun.orbit.self_scale, 1.0);
        assert_eq!(sun.orbit.orbit_rate, 0.0);
    }

    #[test]
    fn test_default_bodies_build() {
        let graph = SceneGraph::from_bodies(&SceneConfig::default().bodies).unwrap();
        let earth = graph.find_by_name("earth").unwrap();
        let moon = graph.find_by_name("moon").unwrap();
        assert_eq!(graph.parent(moon), Some(earth));
        assert_eq!(graph.depth_of(moon), Some(2));
        assert_eq!(graph.node(earth).unwrap().textures.len(), 3);
        assert_eq!(graph.get("sun").unwrap().role(), NodeRole::Sun);
        assert_eq!(graph.get("earth").unwrap().role(), NodeRole::Earth);
        assert_eq!(graph.get("moon").unwrap().role(), NodeRole::Planet);
    }

    #[test]
    fn test_explicit_role_wins_over_name() {
        let mut body = BodyConfig::new("homeworld", 9.0, 0.3, 1.0, "a.jpg,b.jpg");
        body.role = Some(BodyRole::Earth);
        let graph = SceneGraph::from_bodies(&[body]).unwrap();
        assert_eq!(graph.get("homeworld").unwrap().role(), NodeRole::Earth);
    }

    #[test]
    fn test_unknown_parent_is_an_error() {
        let bodies = [
            BodyConfig::new("moon", 2.0, 0.1, 1.0, "").with_parent("earth"),
            BodyConfig::new("earth", 9.0, 0.3, 1.0, ""),
        ];
        let err = SceneGraph::from_bodies(&bodies).unwrap_err();
        assert_eq!(
            err,
            SceneError::UnknownParent {
                body: "moon".to_string(),
                parent: "earth".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_body_is_an_error() {
        let bodies = [
            BodyConfig::new("mars", 12.0, 0.1, 1.0, ""),
            BodyConfig::new("mars", 13.0, 0.1, 1.0, ""),
        ];
        assert_eq!(
            SceneGraph::from_bodies(&bodies).unwrap_err(),
            SceneError::DuplicateName("mars".to_string())
        );
    }

    #[test]
    fn test_empty_texture_list() {
        let graph = SceneGraph::from_bodies(&[BodyConfig::new("rock", 5.0, 0.1, 1.0, " , ")])
            .unwrap();
        assert!(graph.get("rock").unwrap().textures.is_empty());
    }
}
