//! Render error types.

use crate::command::TargetId;

/// Errors surfaced by the render pipeline.
///
/// Most of these are also logged where they occur and the frame carries on;
/// the values exist so a caller can choose to stop instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A render target failed its completeness check.
    #[error("render target '{label}' ({target:?}) is not complete")]
    IncompleteTarget { label: &'static str, target: TargetId },

    /// A command referenced a handle the device does not know.
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    /// A draw was recorded before any material was made active.
    #[error("draw without an active material")]
    NoActiveMaterial,

    /// The body list could not be turned into a scene graph.
    #[error("scene setup failed: {0}")]
    Scene(#[from] orrery_scene::SceneError),

    /// GPU initialisation failed.
    #[error("GPU initialisation failed: {0}")]
    Context(#[from] crate::gpu::GpuContextError),

    /// Reading the output image back failed.
    #[error("output readback failed: {0}")]
    Readback(String),

    /// Writing a screenshot failed.
    #[error("failed to write screenshot: {0}")]
    Screenshot(#[from] std::io::Error),

    /// PNG encoding of a screenshot failed.
    #[error("failed to encode screenshot: {0}")]
    Encode(#[from] png::EncodingError),
}
