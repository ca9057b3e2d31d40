//! A device that executes nothing and remembers everything.
//!
//! Used by the test suite and by `orrery --dry-run`.

use std::collections::{HashMap, HashSet};

use crate::command::{CommandList, MaterialId, MeshId, RenderCommand, TargetId, TextureId};
use crate::device::{RenderDevice, TargetDesc, TargetStatus, TextureSource};
use crate::error::RenderError;
use crate::material::MaterialKind;
use crate::mesh::MeshData;

/// What a recorded texture handle refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedTexture {
    Loaded(TextureSource),
    /// Colour attachment `attachment` of a render target.
    Attachment { target: TargetId, attachment: u32 },
}

#[derive(Clone, Debug)]
struct RecordedTarget {
    desc: TargetDesc,
    attachments: Vec<TextureId>,
}

/// [`RenderDevice`] that records every submitted command list.
#[derive(Debug)]
pub struct RecordingDevice {
    width: u32,
    height: u32,
    materials: Vec<MaterialKind>,
    meshes: Vec<String>,
    textures: Vec<RecordedTexture>,
    targets: HashMap<TargetId, RecordedTarget>,
    next_target: u32,
    incomplete: HashSet<TargetId>,
    fail_all_targets: bool,
    submitted: Vec<CommandList>,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            materials: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            targets: HashMap::new(),
            next_target: 0,
            incomplete: HashSet::new(),
            fail_all_targets: false,
            submitted: Vec::new(),
        }
    }

    /// Report `target` as incomplete from now on.
    pub fn force_incomplete(&mut self, target: TargetId) {
        self.incomplete.insert(target);
    }

    /// Report every target created from now on as incomplete.
    pub fn fail_new_targets(&mut self, fail: bool) {
        self.fail_all_targets = fail;
    }

    /// All command lists submitted so far, oldest first.
    pub fn submitted(&self) -> &[CommandList] {
        &self.submitted
    }

    pub fn last_submitted(&self) -> Option<&CommandList> {
        self.submitted.last()
    }

    pub fn material_kind(&self, id: MaterialId) -> Option<MaterialKind> {
        self.materials.get(id.0 as usize).copied()
    }

    pub fn mesh_label(&self, id: MeshId) -> Option<&str> {
        self.meshes.get(id.0 as usize).map(String::as_str)
    }

    pub fn texture(&self, id: TextureId) -> Option<&RecordedTexture> {
        self.textures.get(id.0 as usize)
    }

    pub fn target_desc(&self, id: TargetId) -> Option<&TargetDesc> {
        self.targets.get(&id).map(|t| &t.desc)
    }

    /// Number of targets currently alive.
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    fn push_texture(&mut self, texture: RecordedTexture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() as u32 - 1)
    }

    fn validate(&self, commands: &CommandList) -> Result<(), RenderError> {
        let mut active = false;
        for command in commands {
            match command {
                RenderCommand::UseMaterial(id) => {
                    if id.0 as usize >= self.materials.len() {
                        return Err(RenderError::UnknownHandle {
                            kind: "material",
                            id: id.0,
                        });
                    }
                    active = true;
                }
                RenderCommand::Draw { mesh } => {
                    if !active {
                        return Err(RenderError::NoActiveMaterial);
                    }
                    if mesh.0 as usize >= self.meshes.len() {
                        return Err(RenderError::UnknownHandle {
                            kind: "mesh",
                            id: mesh.0,
                        });
                    }
                }
                RenderCommand::BindTexture { texture, .. } => {
                    if texture.0 as usize >= self.textures.len() {
                        return Err(RenderError::UnknownHandle {
                            kind: "texture",
                            id: texture.0,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl RenderDevice for RecordingDevice {
    fn create_material(&mut self, kind: MaterialKind) -> MaterialId {
        self.materials.push(kind);
        MaterialId(self.materials.len() as u32 - 1)
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshId {
        self.meshes.push(mesh.label.clone());
        MeshId(self.meshes.len() as u32 - 1)
    }

    fn load_texture(&mut self, source: &TextureSource) -> TextureId {
        self.push_texture(RecordedTexture::Loaded(source.clone()))
    }

    fn create_target(&mut self, desc: &TargetDesc) -> TargetId {
        let target = TargetId(self.next_target);
        self.next_target += 1;
        let attachments = (0..desc.color_attachments)
            .map(|attachment| self.push_texture(RecordedTexture::Attachment { target, attachment }))
            .collect();
        self.targets.insert(
            target,
            RecordedTarget {
                desc: desc.clone(),
                attachments,
            },
        );
        if self.fail_all_targets {
            self.incomplete.insert(target);
        }
        target
    }

    fn release_target(&mut self, target: TargetId) {
        self.targets.remove(&target);
        self.incomplete.remove(&target);
    }

    fn target_status(&self, target: TargetId) -> TargetStatus {
        if !self.targets.contains_key(&target) {
            TargetStatus::Missing
        } else if self.incomplete.contains(&target) {
            TargetStatus::Incomplete
        } else {
            TargetStatus::Complete
        }
    }

    fn target_color(&self, target: TargetId, attachment: u32) -> Option<TextureId> {
        self.targets
            .get(&target)?
            .attachments
            .get(attachment as usize)
            .copied()
    }

    fn submit(&mut self, commands: &CommandList) -> Result<(), RenderError> {
        let result = self.validate(commands);
        self.submitted.push(commands.clone());
        result
    }

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize_output(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TargetFormat;
    use crate::mesh;

    fn hdr_desc() -> TargetDesc {
        TargetDesc {
            label: "hdr",
            width: 64,
            height: 32,
            color_attachments: 2,
            format: TargetFormat::Rgba16Float,
            depth: true,
        }
    }

    #[test]
    fn test_target_attachments_are_distinct_textures() {
        let mut device = RecordingDevice::new(64, 32);
        let target = device.create_target(&hdr_desc());
        let a = device.target_color(target, 0).unwrap();
        let b = device.target_color(target, 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(device.target_color(target, 2), None);
        assert_eq!(
            device.texture(b),
            Some(&RecordedTexture::Attachment {
                target,
                attachment: 1
            })
        );
    }

    #[test]
    fn test_released_target_is_missing() {
        let mut device = RecordingDevice::new(64, 32);
        let target = device.create_target(&hdr_desc());
        assert_eq!(device.target_status(target), TargetStatus::Complete);
        device.release_target(target);
        assert_eq!(device.target_status(target), TargetStatus::Missing);
        assert_eq!(device.target_color(target, 0), None);
    }

    #[test]
    fn test_forced_incomplete() {
        let mut device = RecordingDevice::new(64, 32);
        let target = device.create_target(&hdr_desc());
        device.force_incomplete(target);
        assert_eq!(device.target_status(target), TargetStatus::Incomplete);
    }

    #[test]
    fn test_submit_records_and_validates() {
        let mut device = RecordingDevice::new(8, 8);
        let material = device.create_material(MaterialKind::Orbit);
        let ring = device.create_mesh(&mesh::orbit_ring());

        let mut bad = CommandList::new();
        bad.draw(ring);
        assert!(matches!(
            device.submit(&bad),
            Err(RenderError::NoActiveMaterial)
        ));

        let mut good = CommandList::new();
        good.push(RenderCommand::UseMaterial(material));
        good.draw(ring);
        device.submit(&good).unwrap();

        assert_eq!(device.submitted().len(), 2);
        assert_eq!(device.last_submitted(), Some(&good));
        assert_eq!(device.mesh_label(ring), Some("orbit-ring"));
    }
}
