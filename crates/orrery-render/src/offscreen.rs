//! HDR offscreen rendering and the bloom post-process.
//!
//! The scene renders into a two-attachment half-float target: attachment 0
//! holds the full scene colour, attachment 1 only what the emissive material
//! marks as bright. The bright pass is blurred by ping-ponging between two
//! single-attachment targets, then a tone-mapping composite combines both
//! into the default target.

use glam::Mat4;

use crate::body::SceneAssets;
use crate::camera::CameraMatrices;
use crate::command::{CommandList, DepthCompare, TargetId, TargetRef, TextureId};
use crate::device::{RenderDevice, TargetDesc, TargetFormat, TargetStatus};
use crate::error::RenderError;
use crate::frame::FrameConfig;

/// Colour the scene and the output are cleared to.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Depth clear value: the far plane.
pub const CLEAR_DEPTH: f32 = 1.0;

/// Alternation state of the blur ping-pong.
///
/// Iteration `i` writes buffer `write_index()` and reads the bright pass on
/// the first iteration, the other buffer afterwards. Direction and buffer
/// index flip together, so the last written buffer is always known from the
/// flag alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingPong {
    horizontal: bool,
    first_iteration: bool,
}

impl PingPong {
    pub fn new() -> Self {
        Self {
            horizontal: true,
            first_iteration: true,
        }
    }

    /// Whether the current iteration blurs horizontally.
    pub fn horizontal(&self) -> bool {
        self.horizontal
    }

    pub fn first_iteration(&self) -> bool {
        self.first_iteration
    }

    /// Buffer the current iteration writes.
    pub fn write_index(&self) -> usize {
        usize::from(self.horizontal)
    }

    /// Buffer the current iteration reads (after the first iteration).
    pub fn read_index(&self) -> usize {
        usize::from(!self.horizontal)
    }

    pub fn advance(&mut self) {
        self.horizontal = !self.horizontal;
        self.first_iteration = false;
    }

    /// Buffer written by the most recent iteration, `None` before the first.
    pub fn last_written(&self) -> Option<usize> {
        (!self.first_iteration).then(|| usize::from(!self.horizontal))
    }
}

impl Default for PingPong {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles of one allocation of the offscreen targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffscreenTargets {
    pub hdr: TargetId,
    pub scene_color: TextureId,
    pub bright_color: TextureId,
    pub ping_pong: [TargetId; 2],
    pub ping_pong_color: [TextureId; 2],
}

impl OffscreenTargets {
    fn allocate<D: RenderDevice + ?Sized>(
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let hdr = device.create_target(&TargetDesc {
            label: "hdr",
            width,
            height,
            color_attachments: 2,
            format: TargetFormat::Rgba16Float,
            depth: true,
        });
        let ping_pong = ["ping-pong-0", "ping-pong-1"].map(|label| {
            device.create_target(&TargetDesc {
                label,
                width,
                height,
                color_attachments: 1,
                format: TargetFormat::Rgba16Float,
                depth: false,
            })
        });

        let color = |target: TargetId, attachment: u32| {
            device
                .target_color(target, attachment)
                .ok_or(RenderError::UnknownHandle {
                    kind: "target attachment",
                    id: target.0,
                })
        };

        Ok(Self {
            hdr,
            scene_color: color(hdr, 0)?,
            bright_color: color(hdr, 1)?,
            ping_pong,
            ping_pong_color: [color(ping_pong[0], 0)?, color(ping_pong[1], 0)?],
        })
    }

    fn release<D: RenderDevice + ?Sized>(&self, device: &mut D) {
        device.release_target(self.hdr);
        for target in self.ping_pong {
            device.release_target(target);
        }
    }

    fn labelled(&self) -> [(&'static str, TargetId); 3] {
        [
            ("hdr", self.hdr),
            ("ping-pong-0", self.ping_pong[0]),
            ("ping-pong-1", self.ping_pong[1]),
        ]
    }
}

/// What the composite pass samples as bloom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurOutput {
    pub texture: TextureId,
    /// Ping-pong buffer holding the result; `None` when the raw bright pass is used.
    pub buffer: Option<usize>,
    pub iterations: u32,
}

/// Owner of the offscreen targets and the three post-process passes.
#[derive(Debug)]
pub struct OffscreenPipeline {
    width: u32,
    height: u32,
    targets: OffscreenTargets,
}

impl OffscreenPipeline {
    /// Allocate targets for a `width`×`height` viewport (zero clamps to 1).
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        let targets = OffscreenTargets::allocate(device, width, height)?;
        let pipeline = Self {
            width,
            height,
            targets,
        };
        // Soft failure: logged, rendering goes on.
        let _ = pipeline.check_complete(device);
        log::info!("Offscreen targets allocated at {width}x{height}");
        Ok(pipeline)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn targets(&self) -> &OffscreenTargets {
        &self.targets
    }

    /// Reallocate every target at the new size.
    ///
    /// Returns `Ok(false)` without touching the device when the size is unchanged.
    pub fn resize<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<bool, RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return Ok(false);
        }
        self.targets.release(device);
        self.targets = OffscreenTargets::allocate(device, width, height)?;
        self.width = width;
        self.height = height;
        let _ = self.check_complete(device);
        log::info!("Offscreen targets resized to {width}x{height}");
        Ok(true)
    }

    /// Check every target; incomplete ones are logged and the first is returned.
    pub fn check_complete<D: RenderDevice + ?Sized>(&self, device: &D) -> Result<(), RenderError> {
        let mut first = None;
        for (label, target) in self.targets.labelled() {
            if device.target_status(target) != TargetStatus::Complete {
                log::error!("Framebuffer '{label}' not complete");
                first.get_or_insert(RenderError::IncompleteTarget { label, target });
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Record the scene pass: stars, bodies, then the skybox at the far plane.
    pub fn scene_pass<F>(
        &self,
        list: &mut CommandList,
        assets: &SceneAssets,
        frame: &FrameConfig,
        camera: &CameraMatrices,
        draw_bodies: F,
    ) where
        F: FnOnce(&mut CommandList),
    {
        list.bind_target(TargetRef::Offscreen(self.targets.hdr));
        list.clear(CLEAR_COLOR, CLEAR_DEPTH);
        list.set_depth_compare(DepthCompare::Less);

        if frame.stars {
            assets.stars.use_program(list);
            assets.stars.set_model(list, Mat4::IDENTITY);
            list.draw(assets.starfield);
        }

        draw_bodies(list);

        list.set_depth_compare(DepthCompare::LessEqual);
        assets.skybox.use_program(list);
        list.bind_texture(0, assets.skybox_texture);
        assets.skybox.set_model(list, camera.skybox_model());
        list.draw(assets.cube);
        list.set_depth_compare(DepthCompare::Less);

        list.bind_target(TargetRef::Default);
    }

    /// Record the blur iterations and return what the composite should sample.
    ///
    /// With blur off the iterations are skipped and the raw bright pass is
    /// returned.
    pub fn blur_pass(
        &self,
        list: &mut CommandList,
        assets: &SceneAssets,
        frame: &FrameConfig,
    ) -> BlurOutput {
        let unblurred = BlurOutput {
            texture: self.targets.bright_color,
            buffer: None,
            iterations: 0,
        };
        if !frame.blur || frame.blur_iterations == 0 {
            return unblurred;
        }

        let mut ping_pong = PingPong::new();
        assets.blur.use_program(list);
        for _ in 0..frame.blur_iterations {
            list.bind_target(TargetRef::Offscreen(
                self.targets.ping_pong[ping_pong.write_index()],
            ));
            assets.blur.set_bool(list, "horizontal", ping_pong.horizontal());
            let source = if ping_pong.first_iteration() {
                self.targets.bright_color
            } else {
                self.targets.ping_pong_color[ping_pong.read_index()]
            };
            list.bind_texture(0, source);
            list.draw(assets.quad);
            ping_pong.advance();
        }
        list.bind_target(TargetRef::Default);

        match ping_pong.last_written() {
            Some(buffer) => BlurOutput {
                texture: self.targets.ping_pong_color[buffer],
                buffer: Some(buffer),
                iterations: frame.blur_iterations,
            },
            None => unblurred,
        }
    }

    /// Record the tone-mapping composite into the default target.
    pub fn composite_pass(
        &self,
        list: &mut CommandList,
        assets: &SceneAssets,
        frame: &FrameConfig,
        bloom_input: TextureId,
    ) {
        let bloom = assets.bloom;
        list.bind_target(TargetRef::Default);
        list.clear(CLEAR_COLOR, CLEAR_DEPTH);
        bloom.use_program(list);
        list.bind_texture(0, self.targets.scene_color);
        list.bind_texture(1, bloom_input);
        bloom.set_float(list, "exposure", frame.exposure);
        bloom.set_float(list, "gamma", frame.gamma);
        bloom.set_bool(list, "grayscale", frame.grayscale);
        bloom.set_bool(list, "vertical_mirror", frame.vertical_mirror);
        bloom.set_bool(list, "horizontal_mirror", frame.horizontal_mirror);
        bloom.set_bool(list, "blur", frame.blur);
        bloom.set_bool(list, "bloom", frame.bloom);
        list.draw(assets.quad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RenderCommand;
    use crate::recording::RecordingDevice;
    use orrery_config::SceneConfig;

    fn setup() -> (RecordingDevice, SceneAssets, OffscreenPipeline) {
        let mut device = RecordingDevice::new(320, 200);
        let assets = SceneAssets::create(&mut device, &SceneConfig::default());
        let pipeline = OffscreenPipeline::new(&mut device, 320, 200).unwrap();
        (device, assets, pipeline)
    }

    #[test]
    fn test_ping_pong_parity() {
        for iterations in 1..=12 {
            let mut pp = PingPong::new();
            let mut last = None;
            for _ in 0..iterations {
                last = Some(pp.write_index());
                pp.advance();
            }
            assert_eq!(pp.last_written(), last, "after {iterations} iterations");
        }
        // Ten iterations starting horizontal end in buffer 0.
        let mut pp = PingPong::new();
        (0..10).for_each(|_| pp.advance());
        assert_eq!(pp.last_written(), Some(0));
    }

    #[test]
    fn test_ping_pong_reads_the_other_buffer() {
        let mut pp = PingPong::new();
        pp.advance();
        assert_eq!(pp.read_index(), 1 - pp.write_index());
        assert_eq!(Some(pp.read_index()), pp.last_written());
    }

    #[test]
    fn test_targets_are_allocated_at_viewport_size() {
        let (device, _, pipeline) = setup();
        let desc = device.target_desc(pipeline.targets().hdr).unwrap();
        assert_eq!((desc.width, desc.height), (320, 200));
        assert_eq!(desc.color_attachments, 2);
        assert!(desc.depth);
        let pp = device.target_desc(pipeline.targets().ping_pong[1]).unwrap();
        assert_eq!(pp.color_attachments, 1);
        assert!(!pp.depth);
        assert_eq!(device.live_targets(), 3);
    }

    #[test]
    fn test_resize_reallocates_everything() {
        let (mut device, _, mut pipeline) = setup();
        let before = *pipeline.targets();
        assert!(pipeline.resize(&mut device, 640, 480).unwrap());
        let after = *pipeline.targets();
        assert_ne!(before.hdr, after.hdr);
        assert_eq!(device.live_targets(), 3);
        assert_eq!(
            device.target_status(before.ping_pong[0]),
            TargetStatus::Missing
        );
        for (_, target) in after.labelled() {
            let desc = device.target_desc(target).unwrap();
            assert_eq!((desc.width, desc.height), (640, 480));
        }
    }

    #[test]
    fn test_resize_to_same_size_is_noop() {
        let (mut device, _, mut pipeline) = setup();
        let before = *pipeline.targets();
        assert!(!pipeline.resize(&mut device, 320, 200).unwrap());
        assert_eq!(before, *pipeline.targets());
    }

    #[test]
    fn test_resize_clamps_zero() {
        let (mut device, _, mut pipeline) = setup();
        pipeline.resize(&mut device, 0, 0).unwrap();
        assert_eq!(pipeline.size(), (1, 1));
    }

    #[test]
    fn test_incomplete_target_is_reported() {
        let (mut device, _, pipeline) = setup();
        assert!(pipeline.check_complete(&device).is_ok());
        device.force_incomplete(pipeline.targets().ping_pong[1]);
        match pipeline.check_complete(&device) {
            Err(RenderError::IncompleteTarget { label, .. }) => assert_eq!(label, "ping-pong-1"),
            other => panic!("expected incomplete target, got {other:?}"),
        }
    }

    #[test]
    fn test_scene_pass_draws_skybox_last_with_less_equal() {
        let (_, assets, pipeline) = setup();
        let mut list = CommandList::new();
        let camera = CameraMatrices::from_config(&Default::default(), 320, 200);
        pipeline.scene_pass(&mut list, &assets, &FrameConfig::default(), &camera, |_| {});

        let commands = list.commands();
        let less_equal = commands
            .iter()
            .position(|c| *c == RenderCommand::SetDepthCompare(DepthCompare::LessEqual))
            .unwrap();
        let skybox_draw = commands
            .iter()
            .position(|c| *c == RenderCommand::Draw { mesh: assets.cube })
            .unwrap();
        assert!(less_equal < skybox_draw);
        assert_eq!(
            commands[skybox_draw + 1],
            RenderCommand::SetDepthCompare(DepthCompare::Less)
        );
        assert_eq!(
            commands.last(),
            Some(&RenderCommand::BindTarget(TargetRef::Default))
        );
        assert_eq!(list.draw_count(), 2);
    }

    #[test]
    fn test_scene_pass_without_stars() {
        let (_, assets, pipeline) = setup();
        let mut list = CommandList::new();
        let camera = CameraMatrices::from_config(&Default::default(), 320, 200);
        let frame = FrameConfig {
            stars: false,
            ..FrameConfig::default()
        };
        pipeline.scene_pass(&mut list, &assets, &frame, &camera, |_| {});
        assert!(
            !list
                .commands()
                .contains(&RenderCommand::Draw { mesh: assets.starfield })
        );
    }

    #[test]
    fn test_blur_pass_iterations() {
        let (_, assets, pipeline) = setup();
        let mut list = CommandList::new();
        let frame = FrameConfig {
            blur: true,
            ..FrameConfig::default()
        };
        let output = pipeline.blur_pass(&mut list, &assets, &frame);
        assert_eq!(list.draw_count(), 10);
        assert_eq!(output.buffer, Some(0));
        assert_eq!(output.texture, pipeline.targets().ping_pong_color[0]);

        // First iteration samples the bright pass, later ones the other buffer.
        let sources: Vec<TextureId> = list
            .iter()
            .filter_map(|c| match c {
                RenderCommand::BindTexture { texture, .. } => Some(*texture),
                _ => None,
            })
            .collect();
        let targets = pipeline.targets();
        assert_eq!(sources[0], targets.bright_color);
        assert_eq!(sources[1], targets.ping_pong_color[1]);
        assert_eq!(sources[2], targets.ping_pong_color[0]);
    }

    #[test]
    fn test_blur_off_skips_iterations() {
        let (_, assets, pipeline) = setup();
        let mut list = CommandList::new();
        let output = pipeline.blur_pass(&mut list, &assets, &FrameConfig::default());
        assert!(list.is_empty());
        assert_eq!(output.texture, pipeline.targets().bright_color);
        assert_eq!(output.buffer, None);
    }
}
