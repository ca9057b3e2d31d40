//! Per-body drawing: the traversal visitor that turns scene nodes into draws.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use glam::Vec3;
use orrery_config::SceneConfig;
use orrery_scene::{NodeId, NodeRole, NodeVisit, NodeVisitor, SceneGraph, orbit_ring_transform};

use crate::command::{CommandList, MeshId, TextureId};
use crate::device::{RenderDevice, TextureSource};
use crate::frame::FrameConfig;
use crate::material::{EarthVariant, Material, MaterialKind};
use crate::mesh;

/// Materials and meshes shared by every frame.
#[derive(Clone, Debug)]
pub struct SceneAssets {
    pub sun: Material,
    pub planet: Material,
    /// Indexed by texture count minus one.
    pub earth: [Material; 3],
    pub orbit: Material,
    pub stars: Material,
    pub skybox: Material,
    pub blur: Material,
    pub bloom: Material,
    pub sphere: MeshId,
    pub quad: MeshId,
    pub ring: MeshId,
    pub cube: MeshId,
    pub starfield: MeshId,
    pub skybox_texture: TextureId,
}

impl SceneAssets {
    /// Create every program and built-in mesh, and load the skybox.
    pub fn create<D: RenderDevice + ?Sized>(device: &mut D, scene: &SceneConfig) -> Self {
        let mut material = |kind| Material::new(device.create_material(kind), kind);
        let sun = material(MaterialKind::Sun);
        let planet = material(MaterialKind::Planet);
        let earth = [
            material(MaterialKind::Earth(EarthVariant::Surface)),
            material(MaterialKind::Earth(EarthVariant::SurfaceClouds)),
            material(MaterialKind::Earth(EarthVariant::SurfaceCloudsNight)),
        ];
        let orbit = material(MaterialKind::Orbit);
        let stars = material(MaterialKind::Stars);
        let skybox = material(MaterialKind::Skybox);
        let blur = material(MaterialKind::Blur);
        let bloom = material(MaterialKind::Bloom);

        let faces = scene
            .skybox_faces
            .clone()
            .map(|face| scene.asset_dir.join(face));

        Self {
            sun,
            planet,
            earth,
            orbit,
            stars,
            skybox,
            blur,
            bloom,
            sphere: device.create_mesh(&mesh::unit_sphere(mesh::SPHERE_SUBDIVISIONS)),
            quad: device.create_mesh(&mesh::quad()),
            ring: device.create_mesh(&mesh::orbit_ring()),
            cube: device.create_mesh(&mesh::skybox_cube()),
            starfield: device.create_mesh(&mesh::starfield(scene.star_count, scene.star_seed)),
            skybox_texture: device.load_texture(&TextureSource::Cube(faces)),
        }
    }

    pub fn earth_material(&self, variant: EarthVariant) -> Material {
        self.earth[variant.texture_count() - 1]
    }

    /// Every material that reads the camera matrices.
    pub fn camera_materials(&self) -> impl Iterator<Item = Material> + '_ {
        [
            self.sun,
            self.planet,
            self.earth[0],
            self.earth[1],
            self.earth[2],
            self.orbit,
            self.stars,
            self.skybox,
        ]
        .into_iter()
        .filter(|m| m.kind.uses_camera())
    }
}

/// Textures of every node, resolved once at setup.
#[derive(Clone, Debug, Default)]
pub struct TextureTable {
    by_node: HashMap<NodeId, Vec<TextureId>>,
}

impl TextureTable {
    /// Load each node's texture list. Paths shared by several nodes load once.
    pub fn load<D: RenderDevice + ?Sized>(
        device: &mut D,
        graph: &SceneGraph,
        asset_dir: &Path,
    ) -> Self {
        let mut cache: HashMap<PathBuf, TextureId> = HashMap::new();
        let mut by_node = HashMap::new();

        for (id, node) in graph.iter() {
            if node.textures.is_empty() {
                continue;
            }
            let textures = node
                .textures
                .iter()
                .map(|path| {
                    let path = asset_dir.join(path);
                    *cache.entry(path.clone()).or_insert_with(|| {
                        device.load_texture(&TextureSource::Image(path))
                    })
                })
                .collect();
            by_node.insert(id, textures);
        }

        log::info!("Loaded {} textures for {} bodies", cache.len(), by_node.len());
        Self { by_node }
    }

    /// Textures of `node` in declaration order; empty when it has none.
    pub fn get(&self, node: NodeId) -> &[TextureId] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, node: NodeId, textures: Vec<TextureId>) {
        self.by_node.insert(node, textures);
    }
}

/// Draws each visited node with the material its role selects.
pub struct BodyRenderer<'a> {
    pub list: &'a mut CommandList,
    pub assets: &'a SceneAssets,
    pub textures: &'a TextureTable,
    pub frame: &'a FrameConfig,
    pub camera_position: Vec3,
    /// Nodes already reported for a missing texture.
    pub missing_texture_reported: &'a mut HashSet<NodeId>,
}

impl BodyRenderer<'_> {
    fn draw_sun(&mut self, visit: &NodeVisit<'_>) {
        let material = self.assets.sun;
        let textures = self.textures.get(visit.id);

        material.use_program(self.list);
        material.set_model(self.list, visit.world());
        material.set_float(self.list, "glow", self.frame.glow);
        material.set_bool(self.list, "textured", !textures.is_empty());
        match textures.first() {
            Some(&texture) => self.list.bind_texture(0, texture),
            None => {
                if self.missing_texture_reported.insert(visit.id) {
                    log::error!("Texture not defined for '{}'", visit.node.name());
                }
            }
        }
        self.list.draw(self.assets.sphere);
    }

    fn draw_earth(&mut self, visit: &NodeVisit<'_>) {
        let mut textures = self.textures.get(visit.id);
        if textures.len() > 3 {
            if self.missing_texture_reported.insert(visit.id) {
                log::warn!(
                    "'{}' has {} textures, using the first 3",
                    visit.node.name(),
                    textures.len()
                );
            }
            textures = &textures[..3];
        }
        let variant = EarthVariant::for_texture_count(textures.len()).unwrap_or(EarthVariant::Surface);
        let material = self.assets.earth_material(variant);

        material.use_program(self.list);
        for (unit, &texture) in textures.iter().enumerate() {
            self.list.bind_texture(unit as u32, texture);
        }
        material.set_model(self.list, visit.world());
        self.apply_lighting(material, visit, !textures.is_empty());

        let mesh = if self.frame.realism {
            self.assets.quad
        } else {
            self.assets.sphere
        };
        self.list.draw(mesh);
    }

    fn draw_planet(&mut self, visit: &NodeVisit<'_>) {
        let material = self.assets.planet;
        let texture = self.textures.get(visit.id).first().copied();

        material.use_program(self.list);
        if let Some(texture) = texture {
            self.list.bind_texture(0, texture);
        }
        material.set_model(self.list, visit.world());
        self.apply_lighting(material, visit, texture.is_some());
        self.list.draw(self.assets.sphere);
    }

    fn draw_orbit(&mut self, visit: &NodeVisit<'_>) {
        let material = self.assets.orbit;
        material.use_program(self.list);
        material.set_model(
            self.list,
            orbit_ring_transform(visit.parent_world, visit.node.orbit.orbit_radius),
        );
        self.list.draw(self.assets.ring);
    }

    /// Point light at the root origin with distance attenuation.
    fn apply_lighting(&mut self, material: Material, visit: &NodeVisit<'_>, textured: bool) {
        let frame = self.frame;
        let list = &mut *self.list;
        material.set_vec3(list, "light_position", visit.root_world.w_axis.truncate());
        material.set_vec3(list, "light_color", frame.light_color);
        material.set_float(list, "shininess", frame.shininess);
        material.set_float(list, "ambient", frame.ambient);
        material.set_float(list, "light_intensity", frame.light_intensity);
        material.set_float(list, "reflectivity", frame.reflectivity);
        material.set_bool(list, "outline", frame.outline);
        material.set_float(list, "light_constant", frame.light_constant);
        material.set_float(list, "light_linear", frame.light_linear);
        material.set_float(list, "light_quadratic", frame.light_quadratic);
        material.set_vec3(list, "view_pos", self.camera_position);
        material.set_bool(list, "textured", textured);
    }
}

impl NodeVisitor for BodyRenderer<'_> {
    fn visit(&mut self, visit: &NodeVisit<'_>) {
        let role = visit.node.role();
        match role {
            NodeRole::Root => return,
            NodeRole::Sun => self.draw_sun(visit),
            NodeRole::Earth => self.draw_earth(visit),
            NodeRole::Planet => self.draw_planet(visit),
        }
        // The sun sits on its parent's origin and gets no ring.
        if self.frame.orbits && role != NodeRole::Sun {
            self.draw_orbit(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RenderCommand;
    use crate::recording::RecordingDevice;
    use orrery_scene::traverse;

    struct Fixture {
        device: RecordingDevice,
        assets: SceneAssets,
        graph: SceneGraph,
    }

    fn fixture(bodies: &[(&str, Option<&str>, usize)]) -> Fixture {
        let mut device = RecordingDevice::new(64, 64);
        let assets = SceneAssets::create(&mut device, &SceneConfig::default());
        let mut graph = SceneGraph::new();
        for &(name, parent, textures) in bodies {
            let paths = (0..textures).map(|i| format!("{name}{i}.jpg")).collect();
            let id = graph.create_node(name, 5.0, 0.5, 1.0, paths).unwrap();
            let parent = parent
                .and_then(|p| graph.find_by_name(p))
                .unwrap_or(graph.root());
            graph.add_child(parent, id).unwrap();
        }
        Fixture {
            device,
            assets,
            graph,
        }
    }

    fn render(fixture: &mut Fixture, frame: &FrameConfig) -> CommandList {
        let textures = TextureTable::load(&mut fixture.device, &fixture.graph, Path::new("assets"));
        let mut list = CommandList::new();
        let mut reported = HashSet::new();
        let mut renderer = BodyRenderer {
            list: &mut list,
            assets: &fixture.assets,
            textures: &textures,
            frame,
            camera_position: Vec3::new(0.0, 10.0, 30.0),
            missing_texture_reported: &mut reported,
        };
        traverse(&mut fixture.graph, 0.0, &mut renderer);
        list
    }

    fn bind_count(list: &CommandList) -> usize {
        list.iter()
            .filter(|c| matches!(c, RenderCommand::BindTexture { .. }))
            .count()
    }

    #[test]
    fn test_planet_draws_body_and_ring() {
        let mut f = fixture(&[("mars", None, 1)]);
        let list = render(&mut f, &FrameConfig::default());
        assert_eq!(list.draw_count(), 2);
        assert_eq!(bind_count(&list), 1);
        assert!(list.commands().contains(&RenderCommand::Draw { mesh: f.assets.ring }));
    }

    #[test]
    fn test_sun_has_no_ring() {
        let mut f = fixture(&[("sun", None, 1)]);
        let list = render(&mut f, &FrameConfig::default());
        assert_eq!(list.draw_count(), 1);
        assert!(
            list.commands()
                .contains(&RenderCommand::UseMaterial(f.assets.sun.id))
        );
    }

    #[test]
    fn test_sun_without_texture_still_draws() {
        let mut f = fixture(&[("sun", None, 0)]);
        let list = render(&mut f, &FrameConfig::default());
        assert_eq!(list.draw_count(), 1);
        assert_eq!(bind_count(&list), 0);
    }

    #[test]
    fn test_orbits_toggle() {
        let mut f = fixture(&[("mars", None, 1), ("phobos", Some("mars"), 1)]);
        let frame = FrameConfig {
            orbits: false,
            ..FrameConfig::default()
        };
        let list = render(&mut f, &frame);
        assert_eq!(list.draw_count(), 2);
    }

    #[test]
    fn test_untextured_planet_is_flat_shaded() {
        let mut f = fixture(&[("rock", None, 0)]);
        let list = render(&mut f, &FrameConfig::default());
        assert_eq!(bind_count(&list), 0);
        assert!(list.commands().iter().any(|c| matches!(
            c,
            RenderCommand::SetUniform {
                name: "textured",
                value: crate::command::UniformValue::Bool(false),
                ..
            }
        )));
    }

    #[test]
    fn test_earth_with_four_textures_uses_three() {
        let mut f = fixture(&[("earth", None, 4)]);
        let list = render(&mut f, &FrameConfig::default());
        assert_eq!(bind_count(&list), 3);
        let night = f.assets.earth_material(EarthVariant::SurfaceCloudsNight);
        assert!(list.commands().contains(&RenderCommand::UseMaterial(night.id)));
    }

    #[test]
    fn test_earth_without_textures_uses_surface_variant() {
        let mut f = fixture(&[("earth", None, 0)]);
        let list = render(&mut f, &FrameConfig::default());
        let surface = f.assets.earth_material(EarthVariant::Surface);
        assert!(list.commands().contains(&RenderCommand::UseMaterial(surface.id)));
        assert_eq!(bind_count(&list), 0);
    }

    #[test]
    fn test_realism_draws_earth_as_quad() {
        let mut f = fixture(&[("earth", None, 1)]);
        let frame = FrameConfig {
            realism: true,
            orbits: false,
            ..FrameConfig::default()
        };
        let list = render(&mut f, &frame);
        assert_eq!(
            list.commands().last(),
            Some(&RenderCommand::Draw { mesh: f.assets.quad })
        );
    }

    #[test]
    fn test_shared_texture_paths_load_once() {
        let mut device = RecordingDevice::new(8, 8);
        let mut graph = SceneGraph::new();
        for name in ["a", "b"] {
            let id = graph
                .create_node(name, 1.0, 1.0, 1.0, vec!["shared.jpg".to_string()])
                .unwrap();
            graph.add_child(graph.root(), id).unwrap();
        }
        let table = TextureTable::load(&mut device, &graph, Path::new("assets"));
        let a = graph.find_by_name("a").unwrap();
        let b = graph.find_by_name("b").unwrap();
        assert_eq!(table.get(a), table.get(b));
    }
}
