//! Mesh builder service interface and build statistics

use crate::input_geometry::InputGeometry;
use crate::nav_mesh::TilePayload;
use crate::settings::BuildSettings;
use crate::tile_grid::{TileBounds, TileCoord};
use navmesh_common::Result;
use std::fmt;
use std::time::Duration;

/// Produces tile payloads from input geometry.
///
/// Implementations must be free of side effects on failure. `Ok(None)` means
/// the tile holds no walkable geometry; `Err` is a builder fault. The editor
/// reports both as a failed build and leaves the mesh unchanged.
pub trait TileMeshBuilder {
    type Tile: TilePayload;

    fn build_tile(
        &mut self,
        geometry: &InputGeometry,
        settings: &BuildSettings,
        coord: TileCoord,
        bounds: &TileBounds,
    ) -> Result<Option<Self::Tile>>;
}

/// Outcome of a single tile build attempt
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    pub coord: TileCoord,
    pub success: bool,
    pub elapsed: Duration,
    pub triangle_count: usize,
    pub memory_kb: usize,
}

impl BuildResult {
    pub(crate) fn built<T: TilePayload>(coord: TileCoord, elapsed: Duration, tile: &T) -> Self {
        Self {
            coord,
            success: true,
            elapsed,
            triangle_count: tile.triangle_count(),
            memory_kb: tile.memory_bytes().div_ceil(1024),
        }
    }

    pub(crate) fn failed(coord: TileCoord, elapsed: Duration) -> Self {
        Self {
            coord,
            success: false,
            elapsed,
            triangle_count: 0,
            memory_kb: 0,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(
                f,
                "tile {}: {} tris, {} kB in {:.2} ms",
                self.coord,
                self.triangle_count,
                self.memory_kb,
                self.elapsed_ms()
            )
        } else {
            write!(f, "tile {}: build failed", self.coord)
        }
    }
}

/// Summary of a full rebuild
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildAllReport {
    /// False when any tile failed; the session was then left untouched
    pub success: bool,
    pub built: usize,
    /// Tiles skipped because no walkable geometry fell inside them
    pub empty: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub triangle_count: usize,
    pub memory_kb: usize,
}

impl fmt::Display for BuildAllReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(
                f,
                "{} tiles built ({} empty), {} tris, {} kB in {:.2} ms",
                self.built,
                self.empty,
                self.triangle_count,
                self.memory_kb,
                self.elapsed.as_secs_f64() * 1000.0
            )
        } else {
            write!(f, "build failed on {} tile(s); mesh unchanged", self.failed)
        }
    }
}
