//! Tile grid indexing
//!
//! Maps world-space positions to tile coordinates and back to tile bounds.
//! Tiles partition the XZ plane into squares of `tile_size * cell_size` world
//! units anchored at the minimum corner of the input geometry; vertically
//! every tile spans the full height of the geometry.

use crate::settings::BuildSettings;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer tile position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub tx: i32,
    pub ty: i32,
}

impl TileCoord {
    pub const fn new(tx: i32, ty: i32) -> Self {
        Self { tx, ty }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.tx, self.ty)
    }
}

/// World-space box covered by a single tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub bmin: Vec3,
    pub bmax: Vec3,
}

impl TileBounds {
    /// Inclusive containment test on all three axes
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.bmin).all() && point.cmple(self.bmax).all()
    }

    /// Inclusive containment test ignoring height
    pub fn contains_xz(&self, point: Vec3) -> bool {
        point.x >= self.bmin.x
            && point.x <= self.bmax.x
            && point.z >= self.bmin.z
            && point.z <= self.bmax.z
    }

    pub fn center(&self) -> Vec3 {
        (self.bmin + self.bmax) * 0.5
    }

    /// Grows the box horizontally by `border` on every side
    pub fn expanded_xz(&self, border: f32) -> TileBounds {
        let pad = Vec3::new(border, 0.0, border);
        TileBounds {
            bmin: self.bmin - pad,
            bmax: self.bmax + pad,
        }
    }
}

#[inline]
fn world_size(tile_size: i32, cell_size: f32) -> Option<f32> {
    let ts = tile_size as f32 * cell_size;
    (ts > 0.0).then_some(ts)
}

/// Tile containing `point`.
///
/// Points on a shared edge belong to the tile whose minimum corner they lie
/// on. Returns `None` when `tile_size * cell_size <= 0` (the mesh is not tiled).
pub fn to_tile_coord(
    point: Vec3,
    mesh_bmin: Vec3,
    tile_size: i32,
    cell_size: f32,
) -> Option<TileCoord> {
    let ts = world_size(tile_size, cell_size)?;
    Some(TileCoord::new(
        ((point.x - mesh_bmin.x) / ts).floor() as i32,
        ((point.z - mesh_bmin.z) / ts).floor() as i32,
    ))
}

/// World bounds of the tile at `coord`.
///
/// Returns `None` when `tile_size * cell_size <= 0`.
pub fn tile_bounds(
    coord: TileCoord,
    mesh_bmin: Vec3,
    mesh_bmax: Vec3,
    tile_size: i32,
    cell_size: f32,
) -> Option<TileBounds> {
    let ts = world_size(tile_size, cell_size)?;
    Some(TileBounds {
        bmin: Vec3::new(
            mesh_bmin.x + coord.tx as f32 * ts,
            mesh_bmin.y,
            mesh_bmin.z + coord.ty as f32 * ts,
        ),
        bmax: Vec3::new(
            mesh_bmin.x + (coord.tx as f32 + 1.0) * ts,
            mesh_bmax.y,
            mesh_bmin.z + (coord.ty as f32 + 1.0) * ts,
        ),
    })
}

/// Tiles needed to cover `cells` cells, at least one
fn tiles_along(cells: i32, tile_size: i32) -> i32 {
    let cells = i64::from(cells.max(0));
    let tile_size = i64::from(tile_size);
    ((cells + tile_size - 1) / tile_size).clamp(1, i64::from(i32::MAX)) as i32
}

/// Tile layout covering a set of mesh bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    bmin: Vec3,
    bmax: Vec3,
    tile_size: i32,
    cell_size: f32,
    width: i32,
    height: i32,
}

impl TileGrid {
    /// Lays out the grid for the given mesh bounds, `None` if the settings are untiled.
    pub fn new(bmin: Vec3, bmax: Vec3, settings: &BuildSettings) -> Option<Self> {
        world_size(settings.tile_size, settings.cell_size)?;

        let cs = settings.cell_size;
        let ts = settings.tile_size;
        let gw = ((bmax.x - bmin.x) / cs + 0.5) as i32;
        let gh = ((bmax.z - bmin.z) / cs + 0.5) as i32;

        Some(Self {
            bmin,
            bmax,
            tile_size: ts,
            cell_size: cs,
            width: tiles_along(gw, ts),
            height: tiles_along(gh, ts),
        })
    }

    pub fn bmin(&self) -> Vec3 {
        self.bmin
    }

    pub fn bmax(&self) -> Vec3 {
        self.bmax
    }

    /// Tiles along the x axis
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Tiles along the z axis
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn tile_world_size(&self) -> f32 {
        self.tile_size as f32 * self.cell_size
    }

    /// Tile coordinate for a point; may lie outside the grid
    pub fn coord_at(&self, point: Vec3) -> TileCoord {
        let ts = self.tile_world_size();
        TileCoord::new(
            ((point.x - self.bmin.x) / ts).floor() as i32,
            ((point.z - self.bmin.z) / ts).floor() as i32,
        )
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        (0..self.width).contains(&coord.tx) && (0..self.height).contains(&coord.ty)
    }

    pub fn bounds(&self, coord: TileCoord) -> TileBounds {
        let ts = self.tile_world_size();
        TileBounds {
            bmin: Vec3::new(
                self.bmin.x + coord.tx as f32 * ts,
                self.bmin.y,
                self.bmin.z + coord.ty as f32 * ts,
            ),
            bmax: Vec3::new(
                self.bmin.x + (coord.tx as f32 + 1.0) * ts,
                self.bmax.y,
                self.bmin.z + (coord.ty as f32 + 1.0) * ts,
            ),
        }
    }

    /// All coordinates of the grid in row order
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        let width = self.width;
        (0..self.height).flat_map(move |ty| (0..width).map(move |tx| TileCoord::new(tx, ty)))
    }

    /// Grid coordinates whose tiles touch the XZ extent of `[min, max]`
    pub fn tiles_overlapping(&self, min: Vec3, max: Vec3) -> Vec<TileCoord> {
        let lo = self.coord_at(min);
        let hi = self.coord_at(max);

        let mut coords = Vec::new();
        for ty in lo.ty.max(0)..=hi.ty.min(self.height - 1) {
            for tx in lo.tx.max(0)..=hi.tx.min(self.width - 1) {
                coords.push(TileCoord::new(tx, ty));
            }
        }
        coords
    }
}
