//! Frame orchestration.

use std::collections::HashSet;

use orrery_config::{CameraConfig, Config};
use orrery_scene::{NodeId, SceneGraph, TraversalStats, traverse};

use crate::body::{BodyRenderer, SceneAssets, TextureTable};
use crate::camera::CameraMatrices;
use crate::command::CommandList;
use crate::device::RenderDevice;
use crate::error::RenderError;
use crate::frame::FrameConfig;
use crate::offscreen::{BlurOutput, OffscreenPipeline};

/// Counters for one rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub draw_calls: usize,
    pub commands: usize,
    pub traversal: TraversalStats,
    pub blur: BlurOutput,
}

/// Everything a frame needs, threaded explicitly instead of living in globals.
///
/// Owns the scene graph, the shared materials and meshes, the per-node
/// texture table and the offscreen pipeline. The device is borrowed per call.
#[derive(Debug)]
pub struct FrameDriver {
    graph: SceneGraph,
    assets: SceneAssets,
    textures: TextureTable,
    offscreen: OffscreenPipeline,
    camera: CameraConfig,
    missing_texture_reported: HashSet<NodeId>,
    frame_index: u64,
}

impl FrameDriver {
    /// Set up materials, meshes, textures and targets for `graph`.
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        graph: SceneGraph,
        config: &Config,
    ) -> Result<Self, RenderError> {
        let (width, height) = device.output_size();
        let assets = SceneAssets::create(device, &config.scene);
        let textures = TextureTable::load(device, &graph, &config.scene.asset_dir);
        let offscreen = OffscreenPipeline::new(device, width, height)?;

        Ok(Self {
            graph,
            assets,
            textures,
            offscreen,
            camera: config.camera.clone(),
            missing_texture_reported: HashSet::new(),
            frame_index: 0,
        })
    }

    /// Build the scene from the config's body list and set it up.
    pub fn from_config<D: RenderDevice + ?Sized>(
        device: &mut D,
        config: &Config,
    ) -> Result<Self, RenderError> {
        let graph = SceneGraph::from_bodies(&config.scene.bodies)?;
        Self::new(device, graph, config)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable scene access between frames.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn assets(&self) -> &SceneAssets {
        &self.assets
    }

    pub fn offscreen(&self) -> &OffscreenPipeline {
        &self.offscreen
    }

    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    /// Record and submit one frame at simulation time `time`.
    ///
    /// Camera uniforms first, then the scene pass, the blur pass and the
    /// composite, all in one command list.
    pub fn render_frame<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        frame: &FrameConfig,
        time: f32,
    ) -> Result<FrameStats, RenderError> {
        let (width, height) = self.offscreen.size();
        let camera = CameraMatrices::from_config(&self.camera, width, height);
        let mut list = CommandList::new();

        for material in self.assets.camera_materials() {
            material.set_view(&mut list, camera.view);
            material.set_projection(&mut list, camera.projection);
        }

        let mut traversal = TraversalStats::default();
        let graph = &mut self.graph;
        let assets = &self.assets;
        let textures = &self.textures;
        let reported = &mut self.missing_texture_reported;
        self.offscreen
            .scene_pass(&mut list, assets, frame, &camera, |list| {
                let mut renderer = BodyRenderer {
                    list,
                    assets,
                    textures,
                    frame,
                    camera_position: camera.position,
                    missing_texture_reported: reported,
                };
                traversal = traverse(graph, time, &mut renderer);
            });

        let blur = self.offscreen.blur_pass(&mut list, assets, frame);
        self.offscreen
            .composite_pass(&mut list, assets, frame, blur.texture);

        device.submit(&list)?;

        let stats = FrameStats {
            frame_index: self.frame_index,
            draw_calls: list.draw_count(),
            commands: list.len(),
            traversal,
            blur,
        };
        log::trace!(
            "Frame {}: {} draws, {} bodies",
            stats.frame_index,
            stats.draw_calls,
            stats.traversal.visited
        );
        self.frame_index += 1;
        Ok(stats)
    }

    /// Follow a viewport change: resizes the device output and the offscreen targets.
    pub fn resize<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<bool, RenderError> {
        device.resize_output(width, height);
        self.offscreen.resize(device, width, height)
    }
}
