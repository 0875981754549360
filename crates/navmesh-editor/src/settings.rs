//! Build settings shared by the editing tools and the mesh builder

use navmesh_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Region partitioning strategy requested from the mesh builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionType {
    #[default]
    Watershed,
    Monotone,
    Layers,
}

/// Build configuration edited through the UI and read by every tile operation.
///
/// Distances are in world units unless stated otherwise. `tile_size` is
/// measured in cells; a value of zero means the mesh is built as a single
/// untiled piece and tile editing is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub cell_size: f32,
    pub cell_height: f32,
    pub tile_size: i32,
    pub agent_height: f32,
    pub agent_radius: f32,
    pub agent_max_climb: f32,
    /// Maximum walkable slope in degrees
    pub agent_max_slope: f32,
    pub region_min_size: i32,
    pub region_merge_size: i32,
    pub edge_max_len: f32,
    pub edge_max_error: f32,
    pub verts_per_poly: i32,
    pub detail_sample_dist: f32,
    pub detail_sample_max_error: f32,
    pub partition: PartitionType,
    /// Upper bound on tiles a mesh may hold
    pub max_tiles: usize,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            cell_size: 0.3,
            cell_height: 0.2,
            tile_size: 32,
            agent_height: 2.0,
            agent_radius: 0.6,
            agent_max_climb: 0.9,
            agent_max_slope: 45.0,
            region_min_size: 8,
            region_merge_size: 20,
            edge_max_len: 12.0,
            edge_max_error: 1.3,
            verts_per_poly: 6,
            detail_sample_dist: 6.0,
            detail_sample_max_error: 1.0,
            partition: PartitionType::Watershed,
            max_tiles: 4096,
        }
    }
}

impl BuildSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_cell_height(mut self, cell_height: f32) -> Self {
        self.cell_height = cell_height;
        self
    }

    pub fn with_tile_size(mut self, tile_size: i32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_agent_radius(mut self, agent_radius: f32) -> Self {
        self.agent_radius = agent_radius;
        self
    }

    pub fn with_agent_height(mut self, agent_height: f32) -> Self {
        self.agent_height = agent_height;
        self
    }

    pub fn with_agent_max_slope(mut self, agent_max_slope: f32) -> Self {
        self.agent_max_slope = agent_max_slope;
        self
    }

    pub fn with_partition(mut self, partition: PartitionType) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_max_tiles(mut self, max_tiles: usize) -> Self {
        self.max_tiles = max_tiles;
        self
    }

    /// World-space edge length of one tile, `None` when the mesh is not tiled.
    pub fn tile_world_size(&self) -> Option<f32> {
        let ts = self.tile_size as f32 * self.cell_size;
        (ts > 0.0).then_some(ts)
    }

    /// Whether tile-level editing applies to meshes built with these settings
    pub fn is_tiled(&self) -> bool {
        self.tile_world_size().is_some()
    }

    /// Checks the settings for values no builder can work with.
    ///
    /// A zero tile size is valid (untiled build).
    pub fn validate(&self) -> Result<()> {
        if self.cell_size <= 0.0 {
            return Err(Error::InvalidConfig("cell size must be positive".to_string()));
        }
        if self.cell_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "cell height must be positive".to_string(),
            ));
        }
        if self.tile_size < 0 {
            return Err(Error::InvalidConfig(
                "tile size cannot be negative".to_string(),
            ));
        }
        if self.agent_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "agent height must be positive".to_string(),
            ));
        }
        if self.agent_radius < 0.0 || self.agent_max_climb < 0.0 {
            return Err(Error::InvalidConfig(
                "agent radius and climb cannot be negative".to_string(),
            ));
        }
        if !(0.0..=90.0).contains(&self.agent_max_slope) {
            return Err(Error::InvalidConfig(format!(
                "max slope {} outside 0..=90 degrees",
                self.agent_max_slope
            )));
        }
        if self.verts_per_poly < 3 {
            return Err(Error::InvalidConfig(
                "too few vertices per polygon".to_string(),
            ));
        }
        if self.max_tiles == 0 {
            return Err(Error::InvalidConfig("max tiles must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Loads settings from a JSON file; missing fields take their defaults.
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save_to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
