//! Reference tile builder working directly on input triangles
//!
//! Each tile keeps the walkable input triangles that overlap its footprint
//! (grown by the usual border of agent radius plus three cells), tagged with
//! the area id assigned by the scene's convex volumes.

use crate::builder::TileMeshBuilder;
use crate::input_geometry::InputGeometry;
use crate::nav_mesh::TilePayload;
use crate::settings::BuildSettings;
use crate::tile_grid::{TileBounds, TileCoord};
use glam::Vec3;
use navmesh_common::{calc_bounds, overlap_bounds_2d, Error, Result};
use rand::{Rng, RngCore};

/// Area id of walkable ground that no volume overrides
pub const WALKABLE_AREA: u8 = 63;

/// Area id that removes geometry from the mesh
pub const NULL_AREA: u8 = 0;

/// Border cells added around a tile, on top of the agent radius
const TILE_BORDER_CELLS: f32 = 3.0;

/// Tile payload produced by [`TriangleTileBuilder`]
#[derive(Debug, Clone, PartialEq)]
pub struct TileMesh {
    pub coord: TileCoord,
    pub bounds: TileBounds,
    pub triangles: Vec<[Vec3; 3]>,
    /// One area id per triangle
    pub areas: Vec<u8>,
}

impl TilePayload for TileMesh {
    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn memory_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.triangles.len() * std::mem::size_of::<[Vec3; 3]>()
            + self.areas.len()
    }

    fn sample_point(&self, rng: &mut dyn RngCore) -> Option<Vec3> {
        if self.triangles.is_empty() {
            return None;
        }
        let [a, b, c] = self.triangles[rng.gen_range(0..self.triangles.len())];

        // Uniform barycentric sample
        let s: f32 = rng.gen();
        let t: f32 = rng.gen();
        let (s, t) = if s + t > 1.0 { (1.0 - s, 1.0 - t) } else { (s, t) };
        Some(a + (b - a) * s + (c - a) * t)
    }
}

/// Builds tiles by selecting walkable triangles per tile
#[derive(Debug, Default)]
pub struct TriangleTileBuilder {
    tiles_built: usize,
}

impl TriangleTileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty tiles produced so far
    pub fn tiles_built(&self) -> usize {
        self.tiles_built
    }
}

impl TileMeshBuilder for TriangleTileBuilder {
    type Tile = TileMesh;

    fn build_tile(
        &mut self,
        geometry: &InputGeometry,
        settings: &BuildSettings,
        coord: TileCoord,
        bounds: &TileBounds,
    ) -> Result<Option<TileMesh>> {
        if settings.cell_size <= 0.0 {
            return Err(Error::Build(format!(
                "cell size {} is not positive",
                settings.cell_size
            )));
        }

        let border = settings.agent_radius + TILE_BORDER_CELLS * settings.cell_size;
        let search = bounds.expanded_xz(border);
        let walkable_cos = settings.agent_max_slope.to_radians().cos();

        let mut triangles = Vec::new();
        let mut areas = Vec::new();
        for tri in geometry.mesh().triangles() {
            let Some((tmin, tmax)) = calc_bounds(&tri) else {
                continue;
            };
            if !overlap_bounds_2d(tmin, tmax, search.bmin, search.bmax) {
                continue;
            }

            let [a, b, c] = tri;
            let normal = (b - a).cross(c - a).normalize_or_zero();
            if normal.y.abs() < walkable_cos {
                continue;
            }

            let centroid = (a + b + c) / 3.0;
            let area = geometry.area_override_at(centroid).unwrap_or(WALKABLE_AREA);
            if area == NULL_AREA {
                continue;
            }

            triangles.push(tri);
            areas.push(area);
        }

        if triangles.is_empty() {
            return Ok(None);
        }

        self.tiles_built += 1;
        Ok(Some(TileMesh {
            coord,
            bounds: *bounds,
            triangles,
            areas,
        }))
    }
}
