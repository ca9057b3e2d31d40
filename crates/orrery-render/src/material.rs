//! Materials: shader programs addressed through named uniforms.
//!
//! Each [`MaterialKind`] declares its uniform block up front. Assigning a name
//! the block does not declare is a silent no-op, so callers can push the same
//! lighting uniforms to every lit material without tracking which variant
//! actually reads them.

use glam::{Mat4, Vec3};

use crate::command::{CommandList, MaterialId, RenderCommand, UniformKind, UniformValue};

/// Shader variant of the earth material, by number of bound textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EarthVariant {
    /// Surface texture only.
    Surface,
    /// Surface and cloud layer.
    SurfaceClouds,
    /// Surface, clouds and night-side city lights.
    SurfaceCloudsNight,
}

impl EarthVariant {
    /// Variant for `count` textures; `None` outside 1..=3.
    pub fn for_texture_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(EarthVariant::Surface),
            2 => Some(EarthVariant::SurfaceClouds),
            3 => Some(EarthVariant::SurfaceCloudsNight),
            _ => None,
        }
    }

    pub fn texture_count(self) -> usize {
        match self {
            EarthVariant::Surface => 1,
            EarthVariant::SurfaceClouds => 2,
            EarthVariant::SurfaceCloudsNight => 3,
        }
    }
}

/// Every program the orrery draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Emissive body; writes the bright-pass attachment.
    Sun,
    Planet,
    Earth(EarthVariant),
    Orbit,
    Stars,
    Skybox,
    /// One separable Gaussian blur step.
    Blur,
    /// Tone-mapping composite of scene colour and bloom.
    Bloom,
}

/// A named entry of a material's uniform block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
}

const fn decl(name: &'static str, kind: UniformKind) -> UniformDecl {
    UniformDecl { name, kind }
}

const CAMERA_UNIFORMS: &[UniformDecl] = &[
    decl("view", UniformKind::Mat4),
    decl("projection", UniformKind::Mat4),
    decl("model", UniformKind::Mat4),
];

const SUN_UNIFORMS: &[UniformDecl] = &[
    decl("view", UniformKind::Mat4),
    decl("projection", UniformKind::Mat4),
    decl("model", UniformKind::Mat4),
    decl("glow", UniformKind::Float),
    decl("textured", UniformKind::Bool),
];

const LIT_UNIFORMS: &[UniformDecl] = &[
    decl("view", UniformKind::Mat4),
    decl("projection", UniformKind::Mat4),
    decl("model", UniformKind::Mat4),
    decl("light_position", UniformKind::Vec3),
    decl("light_color", UniformKind::Vec3),
    decl("view_pos", UniformKind::Vec3),
    decl("shininess", UniformKind::Float),
    decl("ambient", UniformKind::Float),
    decl("light_intensity", UniformKind::Float),
    decl("reflectivity", UniformKind::Float),
    decl("light_constant", UniformKind::Float),
    decl("light_linear", UniformKind::Float),
    decl("light_quadratic", UniformKind::Float),
    decl("outline", UniformKind::Bool),
    decl("textured", UniformKind::Bool),
];

const BLUR_UNIFORMS: &[UniformDecl] = &[decl("horizontal", UniformKind::Bool)];

const BLOOM_UNIFORMS: &[UniformDecl] = &[
    decl("exposure", UniformKind::Float),
    decl("gamma", UniformKind::Float),
    decl("grayscale", UniformKind::Bool),
    decl("vertical_mirror", UniformKind::Bool),
    decl("horizontal_mirror", UniformKind::Bool),
    decl("blur", UniformKind::Bool),
    decl("bloom", UniformKind::Bool),
];

impl MaterialKind {
    /// Uniform block declaration, in block order.
    pub fn uniforms(self) -> &'static [UniformDecl] {
        match self {
            MaterialKind::Sun => SUN_UNIFORMS,
            MaterialKind::Planet | MaterialKind::Earth(_) => LIT_UNIFORMS,
            MaterialKind::Orbit | MaterialKind::Stars | MaterialKind::Skybox => CAMERA_UNIFORMS,
            MaterialKind::Blur => BLUR_UNIFORMS,
            MaterialKind::Bloom => BLOOM_UNIFORMS,
        }
    }

    /// Declaration of `name`, if the block has it.
    pub fn uniform(self, name: &str) -> Option<&'static UniformDecl> {
        self.uniforms().iter().find(|u| u.name == name)
    }

    /// Number of texture units the program samples.
    pub fn texture_units(self) -> u32 {
        match self {
            MaterialKind::Sun | MaterialKind::Planet | MaterialKind::Skybox => 1,
            MaterialKind::Earth(variant) => variant.texture_count() as u32,
            MaterialKind::Blur => 1,
            MaterialKind::Bloom => 2,
            MaterialKind::Orbit | MaterialKind::Stars => 0,
        }
    }

    /// Whether the program reads `view`/`projection`.
    pub fn uses_camera(self) -> bool {
        self.uniform("view").is_some()
    }

    /// Whether the program renders into the two-attachment HDR target.
    pub fn writes_hdr(self) -> bool {
        !matches!(self, MaterialKind::Blur | MaterialKind::Bloom)
    }

    /// Stable label for logs and GPU object names.
    pub fn label(self) -> &'static str {
        match self {
            MaterialKind::Sun => "sun",
            MaterialKind::Planet => "planet",
            MaterialKind::Earth(EarthVariant::Surface) => "earth-1",
            MaterialKind::Earth(EarthVariant::SurfaceClouds) => "earth-2",
            MaterialKind::Earth(EarthVariant::SurfaceCloudsNight) => "earth-3",
            MaterialKind::Orbit => "orbit",
            MaterialKind::Stars => "stars",
            MaterialKind::Skybox => "skybox",
            MaterialKind::Blur => "blur",
            MaterialKind::Bloom => "bloom",
        }
    }
}

/// A device material together with its kind.
///
/// Methods record into a [`CommandList`]; nothing touches the device until
/// the list is submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Material {
    pub id: MaterialId,
    pub kind: MaterialKind,
}

impl Material {
    pub fn new(id: MaterialId, kind: MaterialKind) -> Self {
        Self { id, kind }
    }

    /// Make this the active program.
    pub fn use_program(&self, list: &mut CommandList) {
        list.push(RenderCommand::UseMaterial(self.id));
    }

    /// Assign a uniform. Unknown names and mismatched types are dropped.
    ///
    /// Returns whether a command was recorded.
    pub fn set_uniform(&self, list: &mut CommandList, name: &str, value: UniformValue) -> bool {
        let Some(decl) = self.kind.uniform(name) else {
            log::trace!("{}: no uniform '{name}', ignored", self.kind.label());
            return false;
        };
        if decl.kind != value.kind() {
            log::warn!(
                "{}: uniform '{name}' is {:?}, got {:?}",
                self.kind.label(),
                decl.kind,
                value.kind()
            );
            return false;
        }
        list.push(RenderCommand::SetUniform {
            material: self.id,
            name: decl.name,
            value,
        });
        true
    }

    pub fn set_bool(&self, list: &mut CommandList, name: &str, value: bool) -> bool {
        self.set_uniform(list, name, UniformValue::Bool(value))
    }

    pub fn set_float(&self, list: &mut CommandList, name: &str, value: f32) -> bool {
        self.set_uniform(list, name, UniformValue::Float(value))
    }

    pub fn set_vec3(&self, list: &mut CommandList, name: &str, value: Vec3) -> bool {
        self.set_uniform(list, name, UniformValue::Vec3(value))
    }

    pub fn set_mat4(&self, list: &mut CommandList, name: &str, value: Mat4) -> bool {
        self.set_uniform(list, name, UniformValue::Mat4(value))
    }

    pub fn set_view(&self, list: &mut CommandList, view: Mat4) -> bool {
        self.set_mat4(list, "view", view)
    }

    pub fn set_projection(&self, list: &mut CommandList, projection: Mat4) -> bool {
        self.set_mat4(list, "projection", projection)
    }

    pub fn set_model(&self, list: &mut CommandList, model: Mat4) -> bool {
        self.set_mat4(list, "model", model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet() -> Material {
        Material::new(MaterialId(4), MaterialKind::Planet)
    }

    #[test]
    fn test_unknown_uniform_is_noop() {
        let mut list = CommandList::new();
        assert!(!planet().set_float(&mut list, "does_not_exist", 1.0));
        assert!(list.is_empty());
    }

    #[test]
    fn test_mismatched_type_is_dropped() {
        let mut list = CommandList::new();
        assert!(!planet().set_bool(&mut list, "shininess", true));
        assert!(list.is_empty());
    }

    #[test]
    fn test_set_model_records_command() {
        let mut list = CommandList::new();
        let model = Mat4::from_translation(Vec3::X);
        assert!(planet().set_model(&mut list, model));
        assert_eq!(
            list.commands(),
            &[RenderCommand::SetUniform {
                material: MaterialId(4),
                name: "model",
                value: UniformValue::Mat4(model),
            }]
        );
    }

    #[test]
    fn test_blur_has_no_camera() {
        assert!(!MaterialKind::Blur.uses_camera());
        assert!(!MaterialKind::Bloom.uses_camera());
        assert!(MaterialKind::Skybox.uses_camera());
        assert!(MaterialKind::Earth(EarthVariant::Surface).uses_camera());
    }

    #[test]
    fn test_earth_variant_by_texture_count() {
        assert_eq!(EarthVariant::for_texture_count(0), None);
        assert_eq!(
            EarthVariant::for_texture_count(2),
            Some(EarthVariant::SurfaceClouds)
        );
        assert_eq!(EarthVariant::for_texture_count(4), None);
        for variant in [
            EarthVariant::Surface,
            EarthVariant::SurfaceClouds,
            EarthVariant::SurfaceCloudsNight,
        ] {
            assert_eq!(
                MaterialKind::Earth(variant).texture_units() as usize,
                variant.texture_count()
            );
        }
    }

    #[test]
    fn test_uniform_names_are_unique_per_block() {
        let kinds = [
            MaterialKind::Sun,
            MaterialKind::Planet,
            MaterialKind::Orbit,
            MaterialKind::Blur,
            MaterialKind::Bloom,
        ];
        for kind in kinds {
            let uniforms = kind.uniforms();
            for (i, a) in uniforms.iter().enumerate() {
                assert!(
                    uniforms[i + 1..].iter().all(|b| b.name != a.name),
                    "{} declares '{}' twice",
                    kind.label(),
                    a.name
                );
            }
        }
    }
}
