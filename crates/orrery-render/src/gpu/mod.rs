//! wgpu backend for [`RenderDevice`].
//!
//! Frames render into an offscreen RGBA8 output texture that can be read
//! back as a screenshot. Each material owns one shader module; pipelines are
//! built lazily per (material, depth test, topology).

mod context;
pub mod readback;
pub mod replay;
pub mod shaders;
pub mod slots;
pub mod texture;
pub mod uniforms;

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::path::Path;

use wgpu::util::DeviceExt;

pub use context::{GpuContext, GpuContextError, init_gpu_context_blocking};

use crate::command::{CommandList, DepthCompare, MaterialId, MeshId, TargetId, TargetRef, TextureId};
use crate::device::{RenderDevice, TargetDesc, TargetFormat, TargetStatus, TextureSource};
use crate::error::RenderError;
use crate::material::MaterialKind;
use crate::mesh::{MeshData, Topology, Vertex};
use replay::{FramePlan, MaterialState, PlannedDraw, PlannedPass, plan_frame};
use slots::TextureSlots;
use texture::Pixels;
use uniforms::UNIFORM_SLOT_SIZE;

/// Format of the default target.
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform arena capacity at start-up, in draw slots.
const INITIAL_UNIFORM_SLOTS: u64 = 64;

struct GpuMaterial {
    kind: MaterialKind,
    module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    texture_layout: Option<wgpu::BindGroupLayout>,
}

struct GpuMesh {
    topology: Topology,
    vertices: wgpu::Buffer,
    indices: Option<wgpu::Buffer>,
    count: u32,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuTarget {
    desc: TargetDesc,
    attachments: Vec<TextureId>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
    complete: bool,
}

/// Attachment layout a pass renders into.
#[derive(Clone, Debug, PartialEq, Eq)]
struct TargetShape {
    colors: Vec<wgpu::TextureFormat>,
    depth: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    material: MaterialId,
    depth_compare: DepthCompare,
    topology: Topology,
}

/// A draw with its GPU bindings resolved.
struct PreparedDraw {
    key: PipelineKey,
    mesh: MeshId,
    uniform_offset: u32,
    textures: Option<wgpu::BindGroup>,
}

/// Headless wgpu implementation of [`RenderDevice`].
pub struct WgpuDevice {
    ctx: GpuContext,
    width: u32,
    height: u32,
    output: wgpu::Texture,
    output_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_capacity: u64,
    materials: Vec<GpuMaterial>,
    states: Vec<MaterialState>,
    meshes: Vec<GpuMesh>,
    textures: TextureSlots<GpuTexture>,
    targets: HashMap<TargetId, GpuTarget>,
    next_target: u32,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    fallback_2d: TextureId,
    fallback_cube: TextureId,
}

impl WgpuDevice {
    /// Initialize a GPU and an output image of `width`×`height`.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let ctx = init_gpu_context_blocking()?;
        Ok(Self::with_context(ctx, width, height))
    }

    pub fn with_context(ctx: GpuContext, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (output, output_view) = create_output(&ctx.device, width, height);

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sampler-linear"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("uniform-bind-group-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(UNIFORM_SLOT_SIZE),
                    },
                    count: None,
                }],
            });
        let uniform_capacity = INITIAL_UNIFORM_SLOTS * UNIFORM_SLOT_SIZE;
        let (uniform_buffer, uniform_bind_group) =
            create_uniform_arena(&ctx.device, &uniform_layout, uniform_capacity);

        let mut device = Self {
            ctx,
            width,
            height,
            output,
            output_view,
            sampler,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_capacity,
            materials: Vec::new(),
            states: Vec::new(),
            meshes: Vec::new(),
            textures: TextureSlots::new(),
            targets: HashMap::new(),
            next_target: 0,
            pipelines: HashMap::new(),
            fallback_2d: TextureId(0),
            fallback_cube: TextureId(0),
        };
        device.fallback_2d = device.push_texture("fallback-2d", &Pixels::fallback(1), false);
        device.fallback_cube = device.push_texture("fallback-cube", &Pixels::fallback(6), true);
        device
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Tightly packed RGBA8 pixels of the output image, top row first.
    pub fn read_output(&self) -> Result<Vec<u8>, RenderError> {
        readback::read_texture(&self.ctx.device, &self.ctx.queue, &self.output)
    }

    /// Read the output image back and write it to `path` as PNG.
    pub fn save_screenshot(&self, path: &Path) -> Result<(), RenderError> {
        let pixels = self.read_output()?;
        readback::save_png(path, self.width, self.height, &pixels)
    }

    fn push_texture(&mut self, label: &str, pixels: &Pixels, cube: bool) -> TextureId {
        let (texture, view) = texture::upload(&self.ctx.device, &self.ctx.queue, label, pixels, cube);
        TextureId(self.textures.insert(GpuTexture {
            _texture: texture,
            view,
        }))
    }

    fn push_attachment(&mut self, label: &str, desc: &TargetDesc) -> TextureId {
        let texture = self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: target_format(desc.format),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        TextureId(self.textures.insert(GpuTexture {
            _texture: texture,
            view,
        }))
    }

    fn texture_view(&self, id: TextureId) -> Result<Option<&wgpu::TextureView>, RenderError> {
        if !self.textures.is_issued(id.0) {
            return Err(RenderError::UnknownHandle {
                kind: "texture",
                id: id.0,
            });
        }
        Ok(self.textures.get(id.0).map(|t| &t.view))
    }

    fn create_texture_layout(&self, kind: MaterialKind) -> Option<wgpu::BindGroupLayout> {
        let units = kind.texture_units();
        if units == 0 {
            return None;
        }
        let view_dimension = if kind == MaterialKind::Skybox {
            wgpu::TextureViewDimension::Cube
        } else {
            wgpu::TextureViewDimension::D2
        };
        let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..units)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: shaders::SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        Some(
            self.ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(kind.label()),
                    entries: &entries,
                }),
        )
    }

    /// Attachment layout of `target`, or `None` if it cannot be drawn into.
    fn target_shape(&self, target: TargetRef) -> Option<TargetShape> {
        match target {
            TargetRef::Default => Some(TargetShape {
                colors: vec![OUTPUT_FORMAT],
                depth: false,
            }),
            TargetRef::Offscreen(id) => {
                let target = self.targets.get(&id).filter(|t| t.complete)?;
                Some(TargetShape {
                    colors: vec![target_format(target.desc.format); target.attachments.len()],
                    depth: target.depth.is_some(),
                })
            }
        }
    }

    fn pipeline_shape(kind: MaterialKind) -> TargetShape {
        match kind {
            MaterialKind::Blur => TargetShape {
                colors: vec![target_format(TargetFormat::Rgba16Float)],
                depth: false,
            },
            MaterialKind::Bloom => TargetShape {
                colors: vec![OUTPUT_FORMAT],
                depth: false,
            },
            _ => TargetShape {
                colors: vec![target_format(TargetFormat::Rgba16Float); 2],
                depth: true,
            },
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(material) = self.materials.get(key.material.0 as usize) else {
            return;
        };
        let shape = Self::pipeline_shape(material.kind);
        let color_targets: Vec<Option<wgpu::ColorTargetState>> = shape
            .colors
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();
        let depth_stencil = shape.depth.then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: match key.depth_compare {
                DepthCompare::Less => wgpu::CompareFunction::Less,
                DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });
        let (topology, strip_index_format) = match key.topology {
            Topology::TriangleList => (wgpu::PrimitiveTopology::TriangleList, None),
            Topology::LineStrip => (
                wgpu::PrimitiveTopology::LineStrip,
                Some(wgpu::IndexFormat::Uint32),
            ),
            Topology::PointList => (wgpu::PrimitiveTopology::PointList, None),
        };

        let pipeline = self
            .ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(material.kind.label()),
                layout: Some(&material.layout),
                vertex: wgpu::VertexState {
                    module: &material.module,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &material.module,
                    entry_point: Some("fs_main"),
                    targets: &color_targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            });
        log::debug!(
            "Built pipeline '{}' ({:?}, {:?})",
            material.kind.label(),
            key.depth_compare,
            key.topology
        );
        self.pipelines.insert(key, pipeline);
    }

    fn ensure_uniform_capacity(&mut self, bytes: u64) {
        if bytes <= self.uniform_capacity {
            return;
        }
        let capacity = bytes.next_power_of_two();
        let (buffer, bind_group) =
            create_uniform_arena(&self.ctx.device, &self.uniform_layout, capacity);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_capacity = capacity;
        log::debug!("Uniform arena grown to {} bytes", capacity);
    }

    /// Texture bind group for `draw`; unbound or released units get a fallback.
    fn texture_bind_group(
        &self,
        material: &GpuMaterial,
        draw: &PlannedDraw,
    ) -> Result<Option<wgpu::BindGroup>, RenderError> {
        let Some(layout) = &material.texture_layout else {
            return Ok(None);
        };
        let fallback = if material.kind == MaterialKind::Skybox {
            self.fallback_cube
        } else {
            self.fallback_2d
        };
        let mut views = Vec::with_capacity(draw.textures.len());
        for (unit, texture) in draw.textures.iter().enumerate() {
            let view = match texture {
                Some(id) => match self.texture_view(*id)? {
                    Some(view) => view,
                    None => {
                        log::warn!("Texture {} on unit {} was released", id.0, unit);
                        self.texture_view(fallback)?.ok_or(RenderError::UnknownHandle {
                            kind: "texture",
                            id: fallback.0,
                        })?
                    }
                },
                None => self.texture_view(fallback)?.ok_or(RenderError::UnknownHandle {
                    kind: "texture",
                    id: fallback.0,
                })?,
            };
            views.push(view);
        }

        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .into_iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: shaders::SAMPLER_BINDING,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        Ok(Some(self.ctx.device.create_bind_group(
            &wgpu::BindGroupDescriptor {
                label: Some(material.kind.label()),
                layout,
                entries: &entries,
            },
        )))
    }

    /// Resolve pipelines and bind groups for every draw of `pass`.
    fn prepare_pass(&mut self, pass: &PlannedPass) -> Result<Vec<PreparedDraw>, RenderError> {
        let shape = self.target_shape(pass.target);
        let mut prepared = Vec::with_capacity(pass.draws.len());
        for draw in &pass.draws {
            let mesh = self
                .meshes
                .get(draw.mesh.0 as usize)
                .ok_or(RenderError::UnknownHandle {
                    kind: "mesh",
                    id: draw.mesh.0,
                })?;
            let key = PipelineKey {
                material: draw.material,
                depth_compare: draw.depth_compare,
                topology: mesh.topology,
            };
            let Some(material) = self.materials.get(draw.material.0 as usize) else {
                return Err(RenderError::UnknownHandle {
                    kind: "material",
                    id: draw.material.0,
                });
            };
            if shape.as_ref() != Some(&Self::pipeline_shape(material.kind)) {
                log::warn!(
                    "Skipping '{}' draw: target {:?} does not match its outputs",
                    material.kind.label(),
                    pass.target
                );
                continue;
            }
            let textures = self.texture_bind_group(material, draw)?;
            prepared.push(PreparedDraw {
                key,
                mesh: draw.mesh,
                uniform_offset: draw.uniform_offset,
                textures,
            });
        }
        for draw in &prepared {
            self.ensure_pipeline(draw.key);
        }
        Ok(prepared)
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PlannedPass,
        draws: &[PreparedDraw],
    ) {
        let (colors, depth): (Vec<&wgpu::TextureView>, Option<&wgpu::TextureView>) =
            match pass.target {
                TargetRef::Default => (vec![&self.output_view], None),
                TargetRef::Offscreen(id) => {
                    let Some(target) = self.targets.get(&id).filter(|t| t.complete) else {
                        log::warn!("Skipping pass into unusable target {:?}", id);
                        return;
                    };
                    let colors = target
                        .attachments
                        .iter()
                        .filter_map(|t| self.textures.get(t.0))
                        .map(|t| &t.view)
                        .collect();
                    (colors, target.depth.as_ref().map(|(_, view)| view))
                }
            };

        let color_load = match pass.clear {
            Some(clear) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(clear.color[0]),
                g: f64::from(clear.color[1]),
                b: f64::from(clear.color[2]),
                a: f64::from(clear.color[3]),
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = match pass.clear {
            Some(clear) => wgpu::LoadOp::Clear(clear.depth),
            None => wgpu::LoadOp::Load,
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = colors
            .into_iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();
        let depth_stencil_attachment = depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: depth_load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("orrery-pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in draws {
            let (Some(pipeline), Some(mesh)) = (
                self.pipelines.get(&draw.key),
                self.meshes.get(draw.mesh.0 as usize),
            ) else {
                continue;
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
            if let Some(textures) = &draw.textures {
                render_pass.set_bind_group(1, textures, &[]);
            }
            render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            match &mesh.indices {
                Some(indices) => {
                    render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.count, 0, 0..1);
                }
                None => render_pass.draw(0..mesh.count, 0..1),
            }
        }
    }

    fn execute(&mut self, plan: &FramePlan) -> Result<(), RenderError> {
        self.ensure_uniform_capacity(plan.uniform_data.len() as u64);
        if !plan.uniform_data.is_empty() {
            self.ctx
                .queue
                .write_buffer(&self.uniform_buffer, 0, &plan.uniform_data);
        }

        let mut prepared = Vec::with_capacity(plan.passes.len());
        for pass in &plan.passes {
            prepared.push(self.prepare_pass(pass)?);
        }

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("orrery-frame"),
            });
        for (pass, draws) in plan.passes.iter().zip(&prepared) {
            self.encode_pass(&mut encoder, pass, draws);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl std::fmt::Debug for WgpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuDevice")
            .field("ctx", &self.ctx)
            .field("size", &(self.width, self.height))
            .field("materials", &self.materials.len())
            .field("meshes", &self.meshes.len())
            .field("targets", &self.targets.len())
            .finish_non_exhaustive()
    }
}

impl RenderDevice for WgpuDevice {
    fn create_material(&mut self, kind: MaterialKind) -> MaterialId {
        let source = shaders::material_source(kind);
        let module = self
            .ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kind.label()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        let info = pollster::block_on(module.get_compilation_info());
        for message in &info.messages {
            match message.message_type {
                wgpu::CompilationMessageType::Error => {
                    log::error!("Shader '{}' failed to compile: {}", kind.label(), message.message)
                }
                _ => log::debug!("Shader '{}': {}", kind.label(), message.message),
            }
        }

        let texture_layout = self.create_texture_layout(kind);
        let mut bind_group_layouts = vec![&self.uniform_layout];
        if let Some(layout) = &texture_layout {
            bind_group_layouts.push(layout);
        }
        let layout = self
            .ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(kind.label()),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

        self.materials.push(GpuMaterial {
            kind,
            module,
            layout,
            texture_layout,
        });
        self.states.push(MaterialState::new(kind));
        log::debug!("Created material '{}'", kind.label());
        MaterialId(self.materials.len() as u32 - 1)
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshId {
        let device = &self.ctx.device;
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(mesh.label.as_str()),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = (!mesh.indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(mesh.label.as_str()),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        self.meshes.push(GpuMesh {
            topology: mesh.topology,
            vertices,
            indices,
            count: mesh.element_count(),
        });
        MeshId(self.meshes.len() as u32 - 1)
    }

    fn load_texture(&mut self, source: &TextureSource) -> TextureId {
        match source {
            TextureSource::Image(path) => {
                let label = path.display().to_string();
                match texture::decode_image(path) {
                    Ok(pixels) => self.push_texture(&label, &pixels, false),
                    Err(e) => {
                        log::error!("{e}");
                        self.fallback_2d
                    }
                }
            }
            TextureSource::Cube(paths) => match texture::decode_cube(paths) {
                Ok(pixels) => self.push_texture("skybox", &pixels, true),
                Err(e) => {
                    log::error!("{e}");
                    self.fallback_cube
                }
            },
        }
    }

    fn create_target(&mut self, desc: &TargetDesc) -> TargetId {
        let id = TargetId(self.next_target);
        self.next_target += 1;

        let limits = self.ctx.device.limits();
        let complete = desc.width > 0
            && desc.height > 0
            && desc.width <= limits.max_texture_dimension_2d
            && desc.height <= limits.max_texture_dimension_2d
            && desc.color_attachments > 0
            && desc.color_attachments <= limits.max_color_attachments;
        if !complete {
            log::error!(
                "Render target '{}' ({}x{}, {} attachments) cannot be created",
                desc.label,
                desc.width,
                desc.height,
                desc.color_attachments
            );
            // Placeholder attachments keep the handles valid for binding.
            let placeholder = TargetDesc {
                width: 1,
                height: 1,
                ..desc.clone()
            };
            let attachments = (0..desc.color_attachments)
                .map(|i| self.push_attachment(&format!("{}-{}", desc.label, i), &placeholder))
                .collect();
            self.targets.insert(
                id,
                GpuTarget {
                    desc: desc.clone(),
                    attachments,
                    depth: None,
                    complete: false,
                },
            );
            return id;
        }

        let attachments = (0..desc.color_attachments)
            .map(|i| self.push_attachment(&format!("{}-{}", desc.label, i), desc))
            .collect();
        let depth = desc.depth.then(|| {
            let texture = self.ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(desc.label),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });
        self.targets.insert(
            id,
            GpuTarget {
                desc: desc.clone(),
                attachments,
                depth,
                complete: true,
            },
        );
        id
    }

    fn release_target(&mut self, target: TargetId) {
        if let Some(released) = self.targets.remove(&target) {
            for texture in released.attachments {
                self.textures.remove(texture.0);
            }
        }
    }

    fn target_status(&self, target: TargetId) -> TargetStatus {
        match self.targets.get(&target) {
            None => TargetStatus::Missing,
            Some(t) if t.complete => TargetStatus::Complete,
            Some(_) => TargetStatus::Incomplete,
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
        let plan = plan_frame(commands, &mut self.states)?;
        log::trace!(
            "Submitting {} passes, {} draws",
            plan.passes.len(),
            plan.draw_count()
        );
        self.execute(&plan)
    }

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize_output(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if (width, height) == (self.width, self.height) {
            return;
        }
        let (output, output_view) = create_output(&self.ctx.device, width, height);
        self.output = output;
        self.output_view = output_view;
        self.width = width;
        self.height = height;
    }
}

fn target_format(format: TargetFormat) -> wgpu::TextureFormat {
    match format {
        TargetFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
    }
}

fn create_output(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("output"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_uniform_arena(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("uniform-arena"),
        size: capacity,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uniform-arena"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(UNIFORM_SLOT_SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}
