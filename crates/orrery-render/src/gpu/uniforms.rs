//! Uniform block layout and packing.
//!
//! Every material has one uniform block. A `mat4` takes 64 bytes; every
//! other value takes a 16-byte slot with the payload in the leading floats.
//! Booleans and integers are stored as floats. The WGSL struct generated in
//! [`super::shaders`] follows the same order, so offsets match by construction.

use crate::command::{UniformKind, UniformValue};
use crate::material::{MaterialKind, UniformDecl};

/// Byte stride between per-draw snapshots in the uniform arena.
///
/// A multiple of the 256-byte dynamic offset alignment wgpu guarantees.
pub const UNIFORM_SLOT_SIZE: u64 = 512;

const MAT4_SIZE: u32 = 64;
const SCALAR_SLOT_SIZE: u32 = 16;

/// Size in bytes a uniform of `kind` occupies in a block.
pub fn slot_size(kind: UniformKind) -> u32 {
    match kind {
        UniformKind::Mat4 => MAT4_SIZE,
        _ => SCALAR_SLOT_SIZE,
    }
}

/// Byte offsets of every uniform in a material's block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformLayout {
    entries: Vec<(UniformDecl, u32)>,
    size: u32,
}

impl UniformLayout {
    pub fn for_kind(kind: MaterialKind) -> Self {
        Self::from_decls(kind.uniforms())
    }

    pub fn from_decls(decls: &[UniformDecl]) -> Self {
        let mut offset = 0;
        let entries = decls
            .iter()
            .map(|decl| {
                let entry = (*decl, offset);
                offset += slot_size(decl.kind);
                entry
            })
            .collect();
        Self {
            entries,
            size: offset,
        }
    }

    pub fn offset_of(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(decl, _)| decl.name == name)
            .map(|(_, offset)| *offset)
    }

    /// Total block size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn entries(&self) -> impl Iterator<Item = &(UniformDecl, u32)> {
        self.entries.iter()
    }
}

/// CPU copy of one material's uniform block.
///
/// Assignments persist until overwritten, mirroring program state on a GPU
/// that keeps uniforms per program. Each draw uploads a snapshot of it.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(kind: MaterialKind) -> Self {
        let layout = UniformLayout::for_kind(kind);
        let bytes = vec![0; layout.size().max(SCALAR_SLOT_SIZE) as usize];
        Self { layout, bytes }
    }

    /// Store `value` under `name`. Returns `false` for undeclared names and
    /// type mismatches, leaving the block unchanged.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        let Some((decl, offset)) = self.layout.entries().find(|(decl, _)| decl.name == name)
        else {
            return false;
        };
        if decl.kind != value.kind() {
            return false;
        }
        let start = *offset as usize;
        let packed = pack(value);
        let bytes: &[u8] = bytemuck::cast_slice(&packed);
        let len = slot_size(decl.kind) as usize;
        self.bytes[start..start + len].copy_from_slice(&bytes[..len]);
        true
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }
}

fn pack(value: UniformValue) -> [f32; 16] {
    let mut out = [0.0; 16];
    match value {
        UniformValue::Bool(b) => out[0] = if b { 1.0 } else { 0.0 },
        UniformValue::Int(i) => out[0] = i as f32,
        UniformValue::Float(f) => out[0] = f,
        UniformValue::Vec3(v) => out[..3].copy_from_slice(&v.to_array()),
        UniformValue::Mat4(m) => out = m.to_cols_array(),
    }
    out
}
