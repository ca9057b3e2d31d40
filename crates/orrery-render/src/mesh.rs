//! CPU-side mesh data and the built-in geometry of the orrery.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use orrery_scene::{orbit_ring_samples, ring_point_on_plane};

/// Half extent of the cube the starfield is scattered in.
pub const STARFIELD_EXTENT: f32 = 100.0;

/// Icosphere subdivision level used for every body.
pub const SPHERE_SUBDIVISIONS: u32 = 4;

/// The single vertex format shared by all meshes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }

    /// Vertex buffer layout: position @0, normal @1, uv @2.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        use wgpu::{VertexAttribute, VertexFormat};

        const ATTRIBUTES: [VertexAttribute; 3] = [
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x3,
            },
            VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: VertexFormat::Float32x3,
            },
            VertexAttribute {
                offset: (std::mem::size_of::<[f32; 3]>() * 2) as wgpu::BufferAddress,
                shader_location: 2,
                format: VertexFormat::Float32x2,
            },
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Primitive assembly of a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    LineStrip,
    PointList,
}

/// Geometry ready for upload. An empty index list means non-indexed drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub label: String,
    pub topology: Topology,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of vertices (or indices) one draw consumes.
    pub fn element_count(&self) -> u32 {
        if self.indices.is_empty() {
            self.vertices.len() as u32
        } else {
            self.indices.len() as u32
        }
    }
}

/// Unit icosphere with equirectangular UVs.
pub fn unit_sphere(subdivisions: u32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut positions: Vec<Vec3> = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .iter()
    .map(|p| p.normalize())
    .collect();

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    for _ in 0..subdivisions {
        subdivide(&mut positions, &mut indices);
    }

    let vertices = positions
        .iter()
        .map(|&p| {
            let u = 0.5 + p.z.atan2(p.x) / std::f32::consts::TAU;
            let v = 0.5 - p.y.asin() / std::f32::consts::PI;
            Vertex::new(p, p, [u, v])
        })
        .collect();

    MeshData {
        label: "sphere".to_string(),
        topology: Topology::TriangleList,
        vertices,
        indices,
    }
}

/// Split every triangle into four at the edge midpoints, re-projected to the sphere.
fn subdivide(positions: &mut Vec<Vec3>, indices: &mut Vec<u32>) {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut next = Vec::with_capacity(indices.len() * 4);

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            positions.push((positions[a as usize] + positions[b as usize]).normalize());
            positions.len() as u32 - 1
        })
    };

    for tri in indices.chunks(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);
        next.extend_from_slice(&[a, ab, ca, b, bc, ab, c, ca, bc, ab, bc, ca]);
    }

    *indices = next;
}

/// Two-triangle quad covering `[-1, 1]²` in the XY plane, facing +Z.
///
/// Serves as the full-screen quad of the post-process passes and as the flat
/// stand-in body.
pub fn quad() -> MeshData {
    let corners = [
        (Vec3::new(-1.0, 1.0, 0.0), [0.0, 0.0]),
        (Vec3::new(-1.0, -1.0, 0.0), [0.0, 1.0]),
        (Vec3::new(1.0, 1.0, 0.0), [1.0, 0.0]),
        (Vec3::new(1.0, -1.0, 0.0), [1.0, 1.0]),
    ];
    MeshData {
        label: "quad".to_string(),
        topology: Topology::TriangleList,
        vertices: corners
            .iter()
            .map(|&(p, uv)| Vertex::new(p, Vec3::Z, uv))
            .collect(),
        indices: vec![0, 1, 2, 2, 1, 3],
    }
}

/// Cube of 36 non-indexed vertices spanning `[-1, 1]³`, sampled by direction.
pub fn skybox_cube() -> MeshData {
    #[rustfmt::skip]
    const POSITIONS: [[f32; 3]; 36] = [
        [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
        [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

        [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

        [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
    ];

    MeshData {
        label: "skybox".to_string(),
        topology: Topology::TriangleList,
        vertices: POSITIONS
            .iter()
            .map(|&p| {
                let p = Vec3::from_array(p);
                Vertex::new(p, -p.normalize(), [0.0, 0.0])
            })
            .collect(),
        indices: Vec::new(),
    }
}

/// Unit orbit ring in the XZ plane, drawn as a closed line strip.
pub fn orbit_ring() -> MeshData {
    MeshData {
        label: "orbit-ring".to_string(),
        topology: Topology::LineStrip,
        vertices: orbit_ring_samples()
            .into_iter()
            .map(|s| Vertex::new(ring_point_on_plane(s), Vec3::Y, [0.0, 0.0]))
            .collect(),
        indices: Vec::new(),
    }
}

/// `count` points scattered uniformly in `[-100, 100)³`. Deterministic per seed.
pub fn starfield(count: u32, seed: u64) -> MeshData {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let vertices = (0..count)
        .map(|_| {
            let p = Vec3::new(
                rng.random_range(-STARFIELD_EXTENT..STARFIELD_EXTENT),
                rng.random_range(-STARFIELD_EXTENT..STARFIELD_EXTENT),
                rng.random_range(-STARFIELD_EXTENT..STARFIELD_EXTENT),
            );
            Vertex::new(p, Vec3::ZERO, [0.0, 0.0])
        })
        .collect();

    MeshData {
        label: "starfield".to_string(),
        topology: Topology::PointList,
        vertices,
        indices: Vec::new(),
    }
}
