//! Orrery rendering: frame recording into command lists, the offscreen
//! HDR/bloom pipeline, and a headless wgpu backend that executes them.

pub mod body;
pub mod camera;
pub mod command;
pub mod device;
pub mod driver;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod material;
pub mod mesh;
pub mod offscreen;
pub mod recording;

pub use body::{BodyRenderer, SceneAssets, TextureTable};
pub use camera::{CameraMatrices, SKYBOX_SCALE};
pub use command::{
    CommandList, DepthCompare, MaterialId, MeshId, RenderCommand, TargetId, TargetRef, TextureId,
    UniformKind, UniformValue,
};
pub use device::{RenderDevice, TargetDesc, TargetFormat, TargetStatus, TextureSource};
pub use driver::{FrameDriver, FrameStats};
pub use error::RenderError;
pub use frame::{FrameConfig, LIGHT_COLOR};
pub use gpu::{GpuContext, GpuContextError, WgpuDevice, init_gpu_context_blocking};
pub use material::{EarthVariant, Material, MaterialKind};
pub use mesh::{MeshData, Topology, Vertex};
pub use offscreen::{BlurOutput, CLEAR_COLOR, CLEAR_DEPTH, OffscreenPipeline, OffscreenTargets, PingPong};
pub use recording::{RecordedTexture, RecordingDevice};
