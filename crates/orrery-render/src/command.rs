//! Recorded draw submission.
//!
//! Every frame is expressed as a flat [`CommandList`]. A [`RenderDevice`](crate::RenderDevice)
//! replays the list; the recording device keeps it for inspection.

use glam::{Mat4, Vec3};

/// Handle to a material (shader program) created by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Handle to an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Handle to a sampled texture (2D or cube).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Handle to an offscreen render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

/// Where subsequent draws land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetRef {
    /// The device's output image.
    Default,
    Offscreen(TargetId),
}

/// Depth test used by subsequent draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    #[default]
    Less,
    LessEqual,
}

/// Value carried by a uniform assignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    /// Scalar type tag of the value.
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

/// Declared type of a material uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Bool,
    Int,
    Float,
    Vec3,
    Mat4,
}

/// One recorded GPU operation.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    BindTarget(TargetRef),
    /// Clears every colour attachment of the bound target, and depth when the target has one.
    Clear { color: [f32; 4], depth: f32 },
    SetDepthCompare(DepthCompare),
    UseMaterial(MaterialId),
    SetUniform {
        material: MaterialId,
        name: &'static str,
        value: UniformValue,
    },
    BindTexture { unit: u32, texture: TextureId },
    /// Exactly one draw call of the whole mesh with the active material.
    Draw { mesh: MeshId },
}

/// Ordered commands for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<RenderCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    pub fn bind_target(&mut self, target: TargetRef) {
        self.push(RenderCommand::BindTarget(target));
    }

    pub fn clear(&mut self, color: [f32; 4], depth: f32) {
        self.push(RenderCommand::Clear { color, depth });
    }

    pub fn set_depth_compare(&mut self, compare: DepthCompare) {
        self.push(RenderCommand::SetDepthCompare(compare));
    }

    pub fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.push(RenderCommand::BindTexture { unit, texture });
    }

    pub fn draw(&mut self, mesh: MeshId) {
        self.push(RenderCommand::Draw { mesh });
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of draw calls in the list.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Draw { .. }))
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenderCommand> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a RenderCommand;
    type IntoIter = std::slice::Iter<'a, RenderCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
