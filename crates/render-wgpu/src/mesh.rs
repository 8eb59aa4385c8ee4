use bytemuck::{Pod, Zeroable};
use heightscape_terrain::HeightfieldMesh;
use wgpu::util::DeviceExt;

/// Edge length of the demo cube.
pub const CUBE_EDGE: f32 = 5.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Float32x3,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleave the terrain's attribute streams.
pub fn terrain_vertices(mesh: &HeightfieldMesh) -> Vec<Vertex> {
    mesh.positions()
        .iter()
        .zip(mesh.uvs())
        .zip(mesh.normals())
        .map(|((&position, &uv), &normal)| Vertex {
            position,
            uv,
            normal,
        })
        .collect()
}

/// Axis-aligned cube centred on the origin, one quad per face with its own
/// normal and a full `[0, 1]` UV square.
pub fn cube_geometry(edge: f32) -> (Vec<Vertex>, Vec<u32>) {
    let p = edge / 2.0;
    // Each face: normal, then corners counter-clockwise seen from outside.
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0],  [[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]]),
        ([0.0, 0.0, -1.0], [[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]]),
        ([1.0, 0.0, 0.0],  [[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]]),
        ([-1.0, 0.0, 0.0], [[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]]),
        ([0.0, 1.0, 0.0],  [[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]]),
        ([0.0, -1.0, 0.0], [[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (position, uv) in corners.into_iter().zip(uvs) {
            vertices.push(Vertex {
                position,
                uv,
                normal,
            });
        }
        indices.extend([base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Unit cube as 36 unindexed positions, for the skybox.
pub fn skybox_positions() -> Vec<[f32; 3]> {
    let (vertices, indices) = cube_geometry(2.0);
    indices
        .iter()
        .map(|&i| vertices[i as usize].position)
        .collect()
}

/// An indexed triangle mesh uploaded to the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn terrain(device: &wgpu::Device, mesh: &HeightfieldMesh) -> Self {
        Self::upload(device, "terrain", &terrain_vertices(mesh), mesh.indices())
    }

    pub fn cube(device: &wgpu::Device, edge: f32) -> Self {
        let (vertices, indices) = cube_geometry(edge);
        Self::upload(device, "cube", &vertices, &indices)
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use heightscape_terrain::TerrainConfig;

    #[test]
    fn cube_has_outward_ccw_faces() {
        let (vertices, indices) = cube_geometry(CUBE_EDGE);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for tri in indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from(vertices[tri[k] as usize].position));
            let face_normal = (b - a).cross(c - a).normalize();
            let stored = Vec3::from(vertices[tri[0] as usize].normal);
            assert!(face_normal.abs_diff_eq(stored, 1e-6));
        }
    }

    #[test]
    fn cube_extent_matches_edge() {
        let (vertices, _) = cube_geometry(CUBE_EDGE);
        for v in vertices {
            assert!(v.position.iter().all(|c| c.abs() == CUBE_EDGE / 2.0));
        }
    }

    #[test]
    fn skybox_is_unit_cube_triangle_list() {
        let positions = skybox_positions();
        assert_eq!(positions.len(), 36);
        assert!(positions.iter().flatten().all(|c| c.abs() == 1.0));
    }

    #[test]
    fn terrain_vertices_interleave_streams() {
        let config = TerrainConfig {
            x_slices: 2,
            z_slices: 3,
            ..TerrainConfig::default()
        };
        let mesh = HeightfieldMesh::from_heightmap(None, &config).unwrap();
        let vertices = terrain_vertices(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[5].position, mesh.positions()[5]);
        assert_eq!(vertices[5].uv, mesh.uvs()[5]);
        assert_eq!(vertices[5].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn vertex_layout_stride() {
        assert_eq!(Vertex::layout().array_stride, 32);
    }
}
