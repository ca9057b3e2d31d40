//! Turns a command list into render passes with per-draw uniform snapshots.
//!
//! Planning is CPU-only; [`super::WgpuDevice`] encodes the resulting passes.

use crate::command::{
    CommandList, DepthCompare, MaterialId, MeshId, RenderCommand, TargetRef, TextureId,
};
use crate::error::RenderError;
use crate::material::MaterialKind;

use super::uniforms::{UNIFORM_SLOT_SIZE, UniformBlock};

/// Persistent per-material state on the device.
#[derive(Clone, Debug)]
pub struct MaterialState {
    pub kind: MaterialKind,
    pub block: UniformBlock,
}

impl MaterialState {
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            kind,
            block: UniformBlock::new(kind),
        }
    }
}

/// Clear values applied when a pass begins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassClear {
    pub color: [f32; 4],
    pub depth: f32,
}

/// A draw with everything it reads frozen at record time.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedDraw {
    pub material: MaterialId,
    pub mesh: MeshId,
    pub depth_compare: DepthCompare,
    /// One entry per texture unit the material samples; `None` if nothing was bound.
    pub textures: Vec<Option<TextureId>>,
    /// Dynamic offset of this draw's uniform snapshot.
    pub uniform_offset: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedPass {
    pub target: TargetRef,
    pub clear: Option<PassClear>,
    pub draws: Vec<PlannedDraw>,
}

impl PlannedPass {
    fn new(target: TargetRef) -> Self {
        Self {
            target,
            clear: None,
            draws: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.clear.is_none() && self.draws.is_empty()
    }
}

/// Passes in submission order plus the uniform arena they index into.
#[derive(Clone, Debug, Default)]
pub struct FramePlan {
    pub passes: Vec<PlannedPass>,
    pub uniform_data: Vec<u8>,
}

impl FramePlan {
    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.draws.len()).sum()
    }
}

/// Maximum number of texture units any material samples.
pub const MAX_TEXTURE_UNITS: usize = 3;

/// Apply `commands` to `materials` and split them into passes.
///
/// A target bind opens a new pass. A clear after draws also opens one, on the
/// same target. Texture bindings and the depth test persist across passes.
pub fn plan_frame(
    commands: &CommandList,
    materials: &mut [MaterialState],
) -> Result<FramePlan, RenderError> {
    let mut plan = FramePlan::default();
    let mut current = PlannedPass::new(TargetRef::Default);
    let mut active: Option<MaterialId> = None;
    let mut depth_compare = DepthCompare::default();
    let mut units: [Option<TextureId>; MAX_TEXTURE_UNITS] = [None; MAX_TEXTURE_UNITS];

    for command in commands {
        match command {
            RenderCommand::BindTarget(target) => {
                let previous = std::mem::replace(&mut current, PlannedPass::new(*target));
                if !previous.is_empty() {
                    plan.passes.push(previous);
                }
            }
            RenderCommand::Clear { color, depth } => {
                if !current.draws.is_empty() {
                    let target = current.target;
                    plan.passes
                        .push(std::mem::replace(&mut current, PlannedPass::new(target)));
                }
                current.clear = Some(PassClear {
                    color: *color,
                    depth: *depth,
                });
            }
            RenderCommand::SetDepthCompare(compare) => depth_compare = *compare,
            RenderCommand::UseMaterial(id) => {
                material_state(materials, *id)?;
                active = Some(*id);
            }
            RenderCommand::SetUniform {
                material,
                name,
                value,
            } => {
                let state = material_state(materials, *material)?;
                if !state.block.set(name, *value) {
                    log::trace!(
                        "Uniform '{}' ignored by material '{}'",
                        name,
                        state.kind.label()
                    );
                }
            }
            RenderCommand::BindTexture { unit, texture } => match units.get_mut(*unit as usize) {
                Some(slot) => *slot = Some(*texture),
                None => log::warn!("Texture unit {} out of range, binding ignored", unit),
            },
            RenderCommand::Draw { mesh } => {
                let id = active.ok_or(RenderError::NoActiveMaterial)?;
                let state = material_state(materials, id)?;
                let uniform_offset = push_snapshot(&mut plan.uniform_data, state.block.bytes());
                let textures = units[..state.kind.texture_units() as usize].to_vec();
                current.draws.push(PlannedDraw {
                    material: id,
                    mesh: *mesh,
                    depth_compare,
                    textures,
                    uniform_offset,
                });
            }
        }
    }

    if !current.is_empty() {
        plan.passes.push(current);
    }
    Ok(plan)
}

fn material_state(
    materials: &mut [MaterialState],
    id: MaterialId,
) -> Result<&mut MaterialState, RenderError> {
    materials
        .get_mut(id.0 as usize)
        .ok_or(RenderError::UnknownHandle {
            kind: "material",
            id: id.0,
        })
}

fn push_snapshot(arena: &mut Vec<u8>, bytes: &[u8]) -> u32 {
    let offset = arena.len();
    arena.extend_from_slice(bytes);
    arena.resize(offset + UNIFORM_SLOT_SIZE as usize, 0);
    offset as u32
}
