use glam::Vec3;

use crate::gfx::{GraphicsDevice, MeshHandle};
use crate::math::AABB;

/// Interleaved vertex: position at location 0, color at location 1
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;
}

/// Indexed triangle mesh kept on the CPU side
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unit cube centred on the origin with a distinct color per corner
    pub fn cube() -> Self {
        let vertices = vec![
            Vertex::new([-0.5, -0.5, -0.5], [0.9, 0.2, 0.2]),
            Vertex::new([0.5, -0.5, -0.5], [0.2, 0.9, 0.2]),
            Vertex::new([0.5, 0.5, -0.5], [0.2, 0.2, 0.9]),
            Vertex::new([-0.5, 0.5, -0.5], [0.9, 0.9, 0.2]),
            Vertex::new([-0.5, -0.5, 0.5], [0.9, 0.2, 0.9]),
            Vertex::new([0.5, -0.5, 0.5], [0.2, 0.9, 0.9]),
            Vertex::new([0.5, 0.5, 0.5], [0.8, 0.3, 0.02]),
            Vertex::new([-0.5, 0.5, 0.5], [0.5, 0.5, 0.5]),
        ];

        // Counter-clockwise when viewed from outside
        let indices = vec![
            4, 5, 6, 6, 7, 4, // front (+z)
            1, 0, 3, 3, 2, 1, // back (-z)
            0, 4, 7, 7, 3, 0, // left (-x)
            5, 1, 2, 2, 6, 5, // right (+x)
            7, 6, 2, 2, 3, 7, // top (+y)
            0, 1, 5, 5, 4, 0, // bottom (-y)
        ];

        Self { vertices, indices }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(self.vertices.iter().map(|v| Vec3::from_array(v.position)))
    }
}

/// Device-side mesh plus the index count needed to draw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadedMesh {
    pub handle: MeshHandle,
    pub index_count: u32,
}

impl UploadedMesh {
    pub fn upload<D: GraphicsDevice + ?Sized>(device: &mut D, mesh: &Mesh) -> Self {
        Self {
            handle: device.upload_mesh(mesh),
            index_count: mesh.index_count(),
        }
    }

    pub fn release<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        device.delete_mesh(self.handle);
    }
}
