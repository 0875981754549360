//! Tile edit coordination
//!
//! Translates edit requests into tile builds and removals against a
//! [`NavMeshSession`]. Every operation works on a copy of the session's mesh
//! and publishes it through the session's update path only once it has fully
//! succeeded; on failure the session keeps the exact mesh instance it had.

use crate::builder::{BuildAllReport, BuildResult, TileMeshBuilder};
use crate::input_geometry::InputGeometry;
use crate::nav_mesh::{NavMeshParams, TiledNavMesh};
use crate::session::NavMeshSession;
use crate::tile_grid::{TileBounds, TileCoord, TileGrid};
use glam::Vec3;
use navmesh_common::{Error, Result};
use std::sync::Arc;
use web_time::Instant;

/// Outcome of a single tile removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRemoval {
    pub coord: TileCoord,
    /// False when there was no tile at `coord`
    pub removed: bool,
}

/// Drives a [`TileMeshBuilder`] on behalf of the editing tools
#[derive(Debug)]
pub struct TileEditCoordinator<B> {
    builder: B,
}

impl<B: TileMeshBuilder> TileEditCoordinator<B> {
    pub fn new(builder: B) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    /// Rebuilds every tile covering the geometry into a fresh mesh.
    ///
    /// The new mesh replaces the session's only if every tile either built
    /// or turned out empty. If any tile fails the session is left untouched
    /// and the report has `success == false`.
    pub fn build_all_tiles(
        &mut self,
        session: &mut NavMeshSession<B::Tile>,
    ) -> Result<BuildAllReport> {
        let geometry = loaded_geometry(session)?;
        let settings = session.settings().clone();
        let start = Instant::now();

        let (params, layout) = match session.tile_grid() {
            Some(grid) => (
                NavMeshParams::for_grid(&grid, settings.max_tiles),
                grid.coords().map(|c| (c, grid.bounds(c))).collect::<Vec<_>>(),
            ),
            None => {
                let bounds = TileBounds {
                    bmin: geometry.mesh_bounds_min(),
                    bmax: geometry.mesh_bounds_max(),
                };
                (
                    NavMeshParams::single_tile(bounds.bmin, bounds.bmax),
                    vec![(TileCoord::new(0, 0), bounds)],
                )
            }
        };

        let mut mesh = TiledNavMesh::new(params);
        let mut results = Vec::new();
        let mut report = BuildAllReport::default();

        for (coord, bounds) in layout {
            let tile_start = Instant::now();
            let tile = match self.builder.build_tile(&geometry, &settings, coord, &bounds) {
                Ok(Some(tile)) => tile,
                Ok(None) => {
                    report.empty += 1;
                    continue;
                }
                Err(err) => {
                    log::warn!("Building tile {} failed: {}", coord, err);
                    report.failed += 1;
                    break;
                }
            };

            let result = BuildResult::built(coord, tile_start.elapsed(), &tile);
            if let Err(err) = mesh.add_tile(coord, bounds, tile) {
                log::warn!("Adding tile {} failed: {}", coord, err);
                report.failed += 1;
                break;
            }
            report.built += 1;
            report.triangle_count += result.triangle_count;
            report.memory_kb += result.memory_kb;
            results.push(result);
        }

        report.elapsed = start.elapsed();
        if report.failed > 0 {
            log::warn!("Build all tiles aborted; navigation mesh unchanged");
            return Ok(report);
        }

        report.success = true;
        session.update(Some(geometry), results, Some(Arc::new(mesh)));
        log::info!("Navigation mesh built: {}", report);
        Ok(report)
    }

    /// Removes every tile, leaving an empty but present mesh.
    ///
    /// Returns the number of tiles removed.
    pub fn remove_all_tiles(&mut self, session: &mut NavMeshSession<B::Tile>) -> Result<usize> {
        let geometry = loaded_geometry(session)?;

        let (mesh, removed) = match session.nav_mesh() {
            Some(current) => {
                let mut mesh = (**current).clone();
                let removed = mesh.tile_count();
                mesh.clear();
                (mesh, removed)
            }
            None => (TiledNavMesh::new(default_params(session, &geometry)), 0),
        };

        session.update(Some(geometry), Vec::new(), Some(Arc::new(mesh)));
        log::info!("Removed all tiles ({} removed)", removed);
        Ok(removed)
    }

    /// Builds the tile under `hit` and stores it, replacing any previous
    /// content of that tile.
    ///
    /// Returns `Ok(None)` when the settings are not tiled, in which case the
    /// edit is ignored. A failed build yields `success == false` and leaves
    /// the session untouched.
    pub fn build_tile(
        &mut self,
        session: &mut NavMeshSession<B::Tile>,
        hit: Vec3,
    ) -> Result<Option<BuildResult>> {
        let geometry = loaded_geometry(session)?;
        let Some(grid) = session.tile_grid() else {
            log::debug!("Tile build at {} ignored: navigation mesh is not tiled", hit);
            return Ok(None);
        };

        let coord = grid.coord_at(hit);
        let start = Instant::now();
        if !grid.contains(coord) {
            log::warn!("Tile {} is outside the {}x{} grid", coord, grid.width(), grid.height());
            return Ok(Some(BuildResult::failed(coord, start.elapsed())));
        }

        let mut mesh = match session.nav_mesh() {
            Some(current) if !matches_grid(&**current, &grid) => {
                log::warn!(
                    "Tile {} not built: mesh layout differs from settings, rebuild all tiles",
                    coord
                );
                return Ok(Some(BuildResult::failed(coord, start.elapsed())));
            }
            Some(current) => (**current).clone(),
            None => TiledNavMesh::new(NavMeshParams::for_grid(&grid, session.settings().max_tiles)),
        };

        let bounds = grid.bounds(coord);
        let tile = match self
            .builder
            .build_tile(&geometry, session.settings(), coord, &bounds)
        {
            Ok(Some(tile)) => tile,
            Ok(None) => {
                log::debug!("Tile {} has no walkable geometry", coord);
                return Ok(Some(BuildResult::failed(coord, start.elapsed())));
            }
            Err(err) => {
                log::warn!("Building tile {} failed: {}", coord, err);
                return Ok(Some(BuildResult::failed(coord, start.elapsed())));
            }
        };

        let result = BuildResult::built(coord, start.elapsed(), &tile);
        if let Err(err) = mesh.add_tile(coord, bounds, tile) {
            log::warn!("Adding tile {} failed: {}", coord, err);
            return Ok(Some(BuildResult::failed(coord, start.elapsed())));
        }

        let mut results = session.tile_results().to_vec();
        match results.iter_mut().find(|r| r.coord == coord) {
            Some(slot) => *slot = result.clone(),
            None => results.push(result.clone()),
        }

        session.update(Some(geometry), results, Some(Arc::new(mesh)));
        log::debug!("Built {}", result);
        Ok(Some(result))
    }

    /// Removes the tile under `hit` if there is one.
    ///
    /// Removing a missing tile changes nothing. Returns `Ok(None)` when the
    /// settings are not tiled.
    pub fn remove_tile(
        &mut self,
        session: &mut NavMeshSession<B::Tile>,
        hit: Vec3,
    ) -> Result<Option<TileRemoval>> {
        let geometry = loaded_geometry(session)?;
        let Some(grid) = session.tile_grid() else {
            log::debug!("Tile removal at {} ignored: navigation mesh is not tiled", hit);
            return Ok(None);
        };

        let coord = grid.coord_at(hit);
        let mut mesh = match session.nav_mesh() {
            Some(current) if !matches_grid(&**current, &grid) => {
                log::warn!(
                    "Tile {} not removed: mesh layout differs from settings, rebuild all",
                    coord
                );
                return Ok(Some(TileRemoval {
                    coord,
                    removed: false,
                }));
            }
            Some(current) if current.tile_at(coord).is_some() => (**current).clone(),
            _ => {
                log::debug!("No tile at {} to remove", coord);
                return Ok(Some(TileRemoval {
                    coord,
                    removed: false,
                }));
            }
        };

        mesh.remove_tile(coord);
        let results = session
            .tile_results()
            .iter()
            .filter(|r| r.coord != coord)
            .cloned()
            .collect();

        session.update(Some(geometry), results, Some(Arc::new(mesh)));
        log::debug!("Removed tile {}", coord);
        Ok(Some(TileRemoval {
            coord,
            removed: true,
        }))
    }
}

fn loaded_geometry<T>(session: &NavMeshSession<T>) -> Result<Arc<InputGeometry>> {
    session.geometry().cloned().ok_or(Error::MissingGeometry)
}

fn default_params<T>(session: &NavMeshSession<T>, geometry: &InputGeometry) -> NavMeshParams {
    match session.tile_grid() {
        Some(grid) => NavMeshParams::for_grid(&grid, session.settings().max_tiles),
        None => NavMeshParams::single_tile(geometry.mesh_bounds_min(), geometry.mesh_bounds_max()),
    }
}

/// Whether a mesh was laid out with the same grid as `grid`
fn matches_grid<T>(mesh: &TiledNavMesh<T>, grid: &TileGrid) -> bool {
    let params = mesh.params();
    params.origin == grid.bmin()
        && params.tile_width == grid.tile_world_size()
        && params.tile_height == grid.tile_world_size()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BuildSettings;
    use crate::test_helpers::{scenario_session, scenario_settings};
    use crate::triangle_builder::{TileMesh, TriangleTileBuilder};

    fn coordinator() -> TileEditCoordinator<TriangleTileBuilder> {
        TileEditCoordinator::new(TriangleTileBuilder::new())
    }

    #[test]
    fn test_operations_require_geometry() {
        let mut session: NavMeshSession<TileMesh> = NavMeshSession::new(scenario_settings());
        let mut coord = coordinator();
        assert!(matches!(
            coord.build_all_tiles(&mut session),
            Err(Error::MissingGeometry)
        ));
        assert!(matches!(
            coord.remove_all_tiles(&mut session),
            Err(Error::MissingGeometry)
        ));
        assert!(matches!(
            coord.build_tile(&mut session, Vec3::ZERO),
            Err(Error::MissingGeometry)
        ));
        assert!(matches!(
            coord.remove_tile(&mut session, Vec3::ZERO),
            Err(Error::MissingGeometry)
        ));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_build_all_covers_grid() {
        let mut session = scenario_session();
        let mut coord = coordinator();
        let report = coord.build_all_tiles(&mut session).unwrap();

        assert!(report.success);
        assert_eq!(report.built + report.empty, 400);
        assert_eq!(report.failed, 0);

        let mesh = session.nav_mesh().unwrap();
        assert_eq!(mesh.tile_count(), report.built);
        assert_eq!(session.tile_results().len(), report.built);
        assert_eq!(mesh.total_triangles(), report.triangle_count);
        assert_eq!(mesh.params().tile_width, 2.0);
        assert!(session.query().is_some());
    }

    #[test]
    fn test_build_tile_without_mesh_starts_one() {
        let mut session = scenario_session();
        let mut coord = coordinator();
        let result = coord
            .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
            .unwrap()
            .unwrap();

        assert!(result.success);
        assert_eq!(result.coord, TileCoord::new(2, 2));
        assert!(result.triangle_count > 0);
        let mesh = session.nav_mesh().unwrap();
        assert_eq!(mesh.tile_count(), 1);
        assert_eq!(
            mesh.tile_at(TileCoord::new(2, 2)).unwrap().bounds.bmax,
            Vec3::new(6.0, 10.0, 6.0)
        );
    }

    #[test]
    fn test_build_tile_rejects_stale_layout() {
        let mut session = scenario_session();
        let mut coord = coordinator();
        coord.build_all_tiles(&mut session).unwrap();
        let before = Arc::clone(session.nav_mesh().unwrap());

        session.settings_mut().tile_size = 4;
        let result = coord
            .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
            .unwrap()
            .unwrap();
        assert!(!result.success);
        assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));
    }

    #[test]
    fn test_remove_tile_rejects_stale_layout() {
        let mut session = scenario_session();
        let mut coord = coordinator();
        coord.build_all_tiles(&mut session).unwrap();
        let before = Arc::clone(session.nav_mesh().unwrap());

        session.settings_mut().tile_size = 4;
        let removal = coord
            .remove_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
            .unwrap()
            .unwrap();
        assert!(!removal.removed);

        let mesh = session.nav_mesh().unwrap();
        assert!(Arc::ptr_eq(mesh, &before));
        assert!(mesh.tile_at(TileCoord::new(1, 1)).is_some());
        assert!(mesh.tile_at(TileCoord::new(2, 2)).is_some());
    }

    #[test]
    fn test_remove_tile_keeps_untiled_mesh() {
        let mut session = scenario_session();
        let mut coord = coordinator();
        session.settings_mut().tile_size = 0;
        coord.build_all_tiles(&mut session).unwrap();
        let before = Arc::clone(session.nav_mesh().unwrap());

        session.settings_mut().tile_size = 2;
        let removal = coord
            .remove_tile(&mut session, Vec3::new(0.5, 0.0, 0.5))
            .unwrap()
            .unwrap();
        assert!(!removal.removed);
        assert_eq!(session.nav_mesh().unwrap().tile_count(), 1);
        assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));
    }

    #[test]
    fn test_remove_all_without_mesh_leaves_empty_mesh() {
        let mut session = scenario_session();
        let removed = coordinator().remove_all_tiles(&mut session).unwrap();
        assert_eq!(removed, 0);
        assert!(session.nav_mesh().unwrap().is_empty());
        assert!(session.query().is_some());
    }

    #[test]
    fn test_untiled_build_all_produces_single_tile() {
        let mut session = scenario_session();
        *session.settings_mut() = BuildSettings::default()
            .with_cell_size(1.0)
            .with_tile_size(0);
        let report = coordinator().build_all_tiles(&mut session).unwrap();

        assert!(report.success);
        assert_eq!(report.built, 1);
        let mesh = session.nav_mesh().unwrap();
        let tile = mesh.tile_at(TileCoord::new(0, 0)).unwrap();
        assert_eq!(tile.bounds.bmin, Vec3::ZERO);
        assert_eq!(tile.bounds.bmax, Vec3::new(40.0, 10.0, 40.0));
    }
}
