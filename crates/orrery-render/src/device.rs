//! The device seam between frame recording and a graphics backend.

use std::path::PathBuf;

use crate::command::{CommandList, MaterialId, MeshId, TargetId, TextureId};
use crate::error::RenderError;
use crate::material::MaterialKind;
use crate::mesh::MeshData;

/// Image data a texture is loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureSource {
    /// A 2D image file.
    Image(PathBuf),
    /// Six cube faces in +X, −X, +Y, −Y, +Z, −Z order.
    Cube([PathBuf; 6]),
}

/// Pixel format of a render target colour attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    /// Half-float HDR colour.
    Rgba16Float,
}

/// Description of an offscreen render target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    /// Number of colour attachments, each readable as a texture.
    pub color_attachments: u32,
    pub format: TargetFormat,
    pub depth: bool,
}

/// Result of a completeness check on a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetStatus {
    Complete,
    /// Not usable; draws into it have undefined results.
    Incomplete,
    /// The handle was released or never existed.
    Missing,
}

/// A backend that owns GPU objects and executes command lists.
///
/// Creation never fails hard: a backend that cannot compile a program or
/// decode an image logs the problem and hands out a usable handle anyway.
pub trait RenderDevice {
    fn create_material(&mut self, kind: MaterialKind) -> MaterialId;

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshId;

    /// Load a texture; unreadable sources yield a fallback texture.
    fn load_texture(&mut self, source: &TextureSource) -> TextureId;

    fn create_target(&mut self, desc: &TargetDesc) -> TargetId;

    fn release_target(&mut self, target: TargetId);

    fn target_status(&self, target: TargetId) -> TargetStatus;

    /// Colour attachment `attachment` of `target`, bindable as a texture.
    fn target_color(&self, target: TargetId, attachment: u32) -> Option<TextureId>;

    /// Execute a frame's commands in order.
    fn submit(&mut self, commands: &CommandList) -> Result<(), RenderError>;

    /// Current output size in pixels.
    fn output_size(&self) -> (u32, u32);

    /// Resize the default target.
    fn resize_output(&mut self, width: u32, height: u32);
}
