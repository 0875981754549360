//! Tiled navigation mesh container and its query handle
//!
//! The container addresses tiles by grid coordinate. Tile payloads are opaque
//! to the editor and shared behind `Arc`, so cloning a mesh to edit it is
//! cheap and never disturbs the mesh a reader currently holds.

use crate::tile_grid::{TileBounds, TileCoord, TileGrid};
use glam::Vec3;
use navmesh_common::{overlap_bounds_2d, Error, Result};
use rand::{Rng, RngCore};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What the editor needs to know about a built tile
pub trait TilePayload {
    /// Number of triangles in the tile
    fn triangle_count(&self) -> usize;

    /// Approximate memory footprint in bytes
    fn memory_bytes(&self) -> usize;

    /// Samples a point on the tile's walkable surface
    fn sample_point(&self, _rng: &mut dyn RngCore) -> Option<Vec3> {
        None
    }
}

/// Layout parameters of a tiled navigation mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavMeshParams {
    /// World position of the minimum corner of tile (0, 0)
    pub origin: Vec3,
    /// Tile extent along x
    pub tile_width: f32,
    /// Tile extent along z
    pub tile_height: f32,
    pub max_tiles: usize,
}

impl NavMeshParams {
    pub fn for_grid(grid: &TileGrid, max_tiles: usize) -> Self {
        Self {
            origin: grid.bmin(),
            tile_width: grid.tile_world_size(),
            tile_height: grid.tile_world_size(),
            max_tiles,
        }
    }

    /// Parameters for an untiled mesh: one tile spanning the whole bounds
    pub fn single_tile(bmin: Vec3, bmax: Vec3) -> Self {
        Self {
            origin: bmin,
            tile_width: (bmax.x - bmin.x).max(f32::EPSILON),
            tile_height: (bmax.z - bmin.z).max(f32::EPSILON),
            max_tiles: 1,
        }
    }
}

/// A tile stored in the mesh
#[derive(Debug)]
pub struct MeshTile<T> {
    pub coord: TileCoord,
    pub bounds: TileBounds,
    pub data: Arc<T>,
    /// Changes every time a tile is stored, so replaced tiles can be told apart
    pub salt: u32,
}

impl<T> Clone for MeshTile<T> {
    fn clone(&self) -> Self {
        Self {
            coord: self.coord,
            bounds: self.bounds,
            data: Arc::clone(&self.data),
            salt: self.salt,
        }
    }
}

/// Grid-addressed collection of tiles
#[derive(Debug)]
pub struct TiledNavMesh<T> {
    params: NavMeshParams,
    tiles: BTreeMap<TileCoord, MeshTile<T>>,
    next_salt: u32,
}

impl<T> Clone for TiledNavMesh<T> {
    fn clone(&self) -> Self {
        Self {
            params: self.params,
            tiles: self.tiles.clone(),
            next_salt: self.next_salt,
        }
    }
}

impl<T> TiledNavMesh<T> {
    pub fn new(params: NavMeshParams) -> Self {
        Self {
            params,
            tiles: BTreeMap::new(),
            next_salt: 1,
        }
    }

    pub fn params(&self) -> &NavMeshParams {
        &self.params
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Stores a tile, replacing whatever was at `coord`.
    ///
    /// Returns the replaced tile. Fails without modifying the mesh when a new
    /// coordinate would exceed `max_tiles`.
    pub fn add_tile(
        &mut self,
        coord: TileCoord,
        bounds: TileBounds,
        data: T,
    ) -> Result<Option<MeshTile<T>>> {
        if !self.tiles.contains_key(&coord) && self.tiles.len() >= self.params.max_tiles {
            return Err(Error::Build(format!(
                "cannot add tile {}: mesh is full ({} tiles)",
                coord, self.params.max_tiles
            )));
        }

        let salt = self.next_salt;
        self.next_salt = self.next_salt.wrapping_add(1).max(1);

        Ok(self.tiles.insert(
            coord,
            MeshTile {
                coord,
                bounds,
                data: Arc::new(data),
                salt,
            },
        ))
    }

    pub fn remove_tile(&mut self, coord: TileCoord) -> Option<MeshTile<T>> {
        self.tiles.remove(&coord)
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn tile_at(&self, coord: TileCoord) -> Option<&MeshTile<T>> {
        self.tiles.get(&coord)
    }

    /// Tiles in coordinate order
    pub fn tiles(&self) -> impl Iterator<Item = &MeshTile<T>> {
        self.tiles.values()
    }

    /// Grid location of a world position under this mesh's layout
    pub fn calc_tile_loc(&self, pos: Vec3) -> TileCoord {
        TileCoord::new(
            ((pos.x - self.params.origin.x) / self.params.tile_width).floor() as i32,
            ((pos.z - self.params.origin.z) / self.params.tile_height).floor() as i32,
        )
    }
}

impl<T: TilePayload> TiledNavMesh<T> {
    pub fn total_triangles(&self) -> usize {
        self.tiles.values().map(|t| t.data.triangle_count()).sum()
    }

    pub fn memory_bytes(&self) -> usize {
        self.tiles.values().map(|t| t.data.memory_bytes()).sum()
    }
}

/// Queryable view over one specific mesh instance.
///
/// Only the session creates query handles; a handle is replaced whenever the
/// session's mesh is.
#[derive(Debug)]
pub struct NavMeshQuery<T> {
    nav_mesh: Arc<TiledNavMesh<T>>,
}

impl<T> Clone for NavMeshQuery<T> {
    fn clone(&self) -> Self {
        Self {
            nav_mesh: Arc::clone(&self.nav_mesh),
        }
    }
}

impl<T> NavMeshQuery<T> {
    pub(crate) fn new(nav_mesh: Arc<TiledNavMesh<T>>) -> Self {
        Self { nav_mesh }
    }

    pub fn nav_mesh(&self) -> &Arc<TiledNavMesh<T>> {
        &self.nav_mesh
    }

    /// Tile whose footprint contains `point`
    pub fn find_tile(&self, point: Vec3) -> Option<&MeshTile<T>> {
        let coord = self.nav_mesh.calc_tile_loc(point);
        self.nav_mesh
            .tile_at(coord)
            .filter(|tile| tile.bounds.contains_xz(point))
    }

    /// Tiles whose footprint touches the XZ extent of `[min, max]`
    pub fn tiles_in_bounds(&self, min: Vec3, max: Vec3) -> Vec<&MeshTile<T>> {
        self.nav_mesh
            .tiles()
            .filter(|tile| overlap_bounds_2d(tile.bounds.bmin, tile.bounds.bmax, min, max))
            .collect()
    }
}

impl<T: TilePayload> NavMeshQuery<T> {
    /// Random point on the mesh, tiles weighted by triangle count
    pub fn find_random_point(&self, rng: &mut dyn RngCore) -> Option<Vec3> {
        let total: usize = self
            .nav_mesh
            .tiles()
            .map(|t| t.data.triangle_count().max(1))
            .sum();
        if total == 0 {
            return None;
        }

        let mut pick = rng.gen_range(0..total);
        let tile = self.nav_mesh.tiles().find(|t| {
            let weight = t.data.triangle_count().max(1);
            if pick < weight {
                true
            } else {
                pick -= weight;
                false
            }
        })?;

        tile.data.sample_point(rng).or_else(|| {
            let b = &tile.bounds;
            Some(Vec3::new(
                rng.gen_range(b.bmin.x..=b.bmax.x),
                b.bmin.y,
                rng.gen_range(b.bmin.z..=b.bmax.z),
            ))
        })
    }
}
