use std::path::Path;

use glam::Vec3;
use serde::Serialize;

use crate::{Heightmap, TerrainError};

/// Fraction of `max_height` subtracted from every sampled height so that the
/// darkest heightmap texels sit below the origin plane ("sea level").
pub const SEA_LEVEL_BIAS: f32 = 0.15;

/// Dimensions and resolution of the generated terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainConfig {
    /// World-space extent along X.
    pub world_width: f32,
    /// World-space extent along Z.
    pub world_depth: f32,
    /// Number of grid cells along X.
    pub x_slices: u32,
    /// Number of grid cells along Z.
    pub z_slices: u32,
    /// Height of a fully white texel before the sea-level bias.
    pub max_height: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            world_width: 200.0,
            world_depth: 200.0,
            x_slices: 100,
            z_slices: 100,
            max_height: 15.0,
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.x_slices == 0 || self.z_slices == 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "slices must be at least 1, got {}x{}",
                self.x_slices, self.z_slices
            )));
        }
        for (name, value) in [("world_width", self.world_width), ("world_depth", self.world_depth)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TerrainError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !self.max_height.is_finite() {
            return Err(TerrainError::InvalidConfig(format!(
                "max_height must be finite, got {}",
                self.max_height
            )));
        }
        let vertices = (self.x_slices as u64 + 1) * (self.z_slices as u64 + 1);
        if vertices > u32::MAX as u64 {
            return Err(TerrainError::InvalidConfig(format!(
                "{vertices} vertices do not fit 32-bit indices"
            )));
        }
        Ok(())
    }

    /// Vertices per row (along X).
    pub fn columns(&self) -> usize {
        self.x_slices as usize + 1
    }

    /// Vertex rows (along Z).
    pub fn rows(&self) -> usize {
        self.z_slices as usize + 1
    }

    pub fn x_step(&self) -> f32 {
        self.world_width / self.x_slices as f32
    }

    pub fn z_step(&self) -> f32 {
        self.world_depth / self.z_slices as f32
    }
}

/// Where the terrain heights came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightSource {
    Image { width: u32, height: u32 },
    /// No usable heightmap; every height is zero.
    Flat,
}

/// Summary of a generated mesh, used for logging and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshStats {
    pub vertex_count: usize,
    pub index_count: usize,
    pub triangle_count: usize,
    pub min_height: f32,
    pub max_height: f32,
    pub source: HeightSource,
}

/// Row-major `[z][x]` height buffer. Lives only while a mesh is being built.
struct HeightGrid {
    columns: usize,
    rows: usize,
    heights: Vec<f32>,
}

impl HeightGrid {
    fn sample(map: Option<&Heightmap>, config: &TerrainConfig) -> Self {
        let columns = config.columns();
        let rows = config.rows();
        let mut heights = Vec::with_capacity(columns * rows);
        for z in 0..rows as u32 {
            for x in 0..columns as u32 {
                let y = match map {
                    Some(map) => {
                        let value = map.sample_grid(x, z, config.x_slices, config.z_slices);
                        value as f32 / 255.0 * config.max_height
                            - config.max_height * SEA_LEVEL_BIAS
                    }
                    None => 0.0,
                };
                heights.push(y);
            }
        }
        Self {
            columns,
            rows,
            heights,
        }
    }

    fn get(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.columns + x]
    }

    /// Finite-difference normal from the left/right/down/up neighbours,
    /// each clamped to the vertex itself at the grid border.
    ///
    /// The Y component uses `x_step` for both axes, even when cells are not
    /// square. Do not switch it to `z_step`; the shading depends on it.
    fn normal(&self, x: usize, z: usize, x_step: f32) -> Vec3 {
        let h_l = self.get(x.saturating_sub(1), z);
        let h_r = self.get((x + 1).min(self.columns - 1), z);
        let h_d = self.get(x, z.saturating_sub(1));
        let h_u = self.get(x, (z + 1).min(self.rows - 1));
        Vec3::new(h_l - h_r, 2.0 * x_step, h_d - h_u).normalize()
    }
}

/// Static terrain mesh built from a heightmap: one vertex per grid corner,
/// two triangles per cell.
#[derive(Debug, Clone)]
pub struct HeightfieldMesh {
    config: TerrainConfig,
    source: HeightSource,
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl HeightfieldMesh {
    /// Load `path` and build the mesh.
    ///
    /// Only an invalid `config` is an error. A heightmap that cannot be read
    /// is logged and the terrain is generated flat instead.
    pub fn load(path: impl AsRef<Path>, config: &TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        let heightmap = match Heightmap::open(path.as_ref()) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::error!("{e}; generating flat terrain");
                None
            }
        };
        Self::from_heightmap(heightmap.as_ref(), config)
    }

    /// Build from an already decoded heightmap, or flat terrain for `None`.
    pub fn from_heightmap(map: Option<&Heightmap>, config: &TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;

        let grid = HeightGrid::sample(map, config);
        let columns = config.columns();
        let rows = config.rows();
        let x_step = config.x_step();
        let z_step = config.z_step();
        let total = columns * rows;

        let mut positions = Vec::with_capacity(total);
        let mut uvs = Vec::with_capacity(total);
        for z in 0..rows {
            for x in 0..columns {
                let x_pos = -config.world_width * 0.5 + x as f32 * x_step;
                let z_pos = -config.world_depth * 0.5 + z as f32 * z_step;
                positions.push([x_pos, grid.get(x, z), z_pos]);
                uvs.push([
                    x as f32 / config.x_slices as f32,
                    z as f32 / config.z_slices as f32,
                ]);
            }
        }

        // Second pass: every height is known before any normal is computed.
        let mut normals = Vec::with_capacity(total);
        for z in 0..rows {
            for x in 0..columns {
                normals.push(grid.normal(x, z, x_step).to_array());
            }
        }

        let indices = triangulate(config.x_slices, config.z_slices);

        let source = match map {
            Some(map) => HeightSource::Image {
                width: map.width(),
                height: map.height(),
            },
            None => HeightSource::Flat,
        };

        tracing::debug!(
            vertices = positions.len(),
            indices = indices.len(),
            ?source,
            "terrain mesh built"
        );

        Ok(Self {
            config: *config,
            source,
            positions,
            uvs,
            normals,
            indices,
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn source(&self) -> HeightSource {
        self.source
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Height of grid vertex `(x, z)`, if it exists.
    pub fn height_at(&self, x: u32, z: u32) -> Option<f32> {
        if x > self.config.x_slices || z > self.config.z_slices {
            return None;
        }
        let index = z as usize * self.config.columns() + x as usize;
        self.positions.get(index).map(|p| p[1])
    }

    pub fn stats(&self) -> MeshStats {
        let (min_height, max_height) = self
            .positions
            .iter()
            .map(|p| p[1])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        MeshStats {
            vertex_count: self.vertex_count(),
            index_count: self.index_count(),
            triangle_count: self.index_count() / 3,
            min_height,
            max_height,
            source: self.source,
        }
    }
}

/// Two triangles per cell, `(tl, bl, tr)` and `(tr, bl, br)`, counter-clockwise
/// seen from +Y, cells in row-major order.
fn triangulate(x_slices: u32, z_slices: u32) -> Vec<u32> {
    let columns = x_slices + 1;
    let mut indices = Vec::with_capacity(x_slices as usize * z_slices as usize * 6);
    for z in 0..z_slices {
        for x in 0..x_slices {
            let tl = z * columns + x;
            let tr = tl + 1;
            let bl = tl + columns;
            let br = bl + 1;
            indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        }
    }
    indices
}
