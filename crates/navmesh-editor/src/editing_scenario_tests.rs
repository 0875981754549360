//! End-to-end tile editing scenarios against the scenario scene
//!
//! Covers grid mapping through the coordinator, last-write-wins rebuilds,
//! idempotent removal and the guarantee that a failed edit leaves the
//! session holding the very same mesh instance it had before.

use crate::builder::TileMeshBuilder;
use crate::coordinator::{TileEditCoordinator, TileRemoval};
use crate::input_geometry::{ConvexVolume, InputGeometry};
use crate::session::NavMeshSession;
use crate::settings::BuildSettings;
use crate::test_helpers::{scenario_geometry, scenario_session};
use crate::tile_grid::{tile_bounds, to_tile_coord, TileBounds, TileCoord};
use crate::triangle_builder::{TileMesh, TriangleTileBuilder, NULL_AREA, WALKABLE_AREA};
use glam::Vec3;
use navmesh_common::{Error, Result};
use std::sync::Arc;

/// Reference builder that fails on one tile
struct FailingBuilder {
    inner: TriangleTileBuilder,
    fail_at: TileCoord,
}

impl TileMeshBuilder for FailingBuilder {
    type Tile = TileMesh;

    fn build_tile(
        &mut self,
        geometry: &InputGeometry,
        settings: &BuildSettings,
        coord: TileCoord,
        bounds: &TileBounds,
    ) -> Result<Option<TileMesh>> {
        if coord == self.fail_at {
            return Err(Error::Build(format!("injected failure at {}", coord)));
        }
        self.inner.build_tile(geometry, settings, coord, bounds)
    }
}

fn coordinator() -> TileEditCoordinator<TriangleTileBuilder> {
    TileEditCoordinator::new(TriangleTileBuilder::new())
}

fn failing_at(tx: i32, ty: i32) -> TileEditCoordinator<FailingBuilder> {
    TileEditCoordinator::new(FailingBuilder {
        inner: TriangleTileBuilder::new(),
        fail_at: TileCoord::new(tx, ty),
    })
}

fn assert_query_matches_mesh(session: &NavMeshSession<TileMesh>) {
    match (session.nav_mesh(), session.query()) {
        (Some(mesh), Some(query)) => assert!(Arc::ptr_eq(mesh, query.nav_mesh())),
        (None, None) => {}
        (mesh, query) => panic!(
            "query handle out of sync: mesh present = {}, query present = {}",
            mesh.is_some(),
            query.is_some()
        ),
    }
}

fn covering_volume(area: u8) -> ConvexVolume {
    ConvexVolume::new(
        vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(-1.0, 0.0, 41.0),
            Vec3::new(41.0, 0.0, 41.0),
            Vec3::new(41.0, 0.0, -1.0),
        ],
        -1.0,
        1.0,
        area,
    )
    .unwrap()
}

#[test]
fn test_scenario_a_point_maps_to_tile() {
    let geometry = scenario_geometry();
    let bmin = geometry.mesh_bounds_min();
    let bmax = geometry.mesh_bounds_max();
    assert_eq!(bmax, Vec3::new(40.0, 10.0, 40.0));

    let coord = to_tile_coord(Vec3::new(5.0, 0.0, 5.0), bmin, 2, 1.0).unwrap();
    assert_eq!(coord, TileCoord::new(2, 2));
    let bounds = tile_bounds(coord, bmin, bmax, 2, 1.0).unwrap();
    assert_eq!(bounds.bmin, Vec3::new(4.0, 0.0, 4.0));
    assert_eq!(bounds.bmax, Vec3::new(6.0, 10.0, 6.0));

    let mut session = scenario_session();
    let result = coordinator()
        .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap();
    assert!(result.success);
    assert_eq!(result.coord, TileCoord::new(2, 2));
    let tile = session.nav_mesh().unwrap().tile_at(coord).unwrap();
    assert_eq!(tile.bounds, bounds);
}

#[test]
fn test_scenario_b_boundary_point_goes_to_tile_starting_there() {
    let mut session = scenario_session();
    let result = coordinator()
        .build_tile(&mut session, Vec3::new(4.0, 0.0, 4.0))
        .unwrap()
        .unwrap();
    assert_eq!(result.coord, TileCoord::new(2, 2));

    let mesh = session.nav_mesh().unwrap();
    assert!(mesh.tile_at(TileCoord::new(2, 2)).is_some());
    assert!(mesh.tile_at(TileCoord::new(1, 1)).is_none());
}

#[test]
fn test_scenario_c_remove_all_keeps_empty_mesh() {
    let mut session = scenario_session();
    let mut coord = coordinator();

    let report = coord.build_all_tiles(&mut session).unwrap();
    assert!(report.success);
    assert!(report.built > 0);

    let removed = coord.remove_all_tiles(&mut session).unwrap();
    assert_eq!(removed, report.built);

    let mesh = session.nav_mesh().expect("mesh stays present");
    assert_eq!(mesh.tile_count(), 0);
    assert!(session.tile_results().is_empty());
    let query = session.query().expect("query handle stays derivable");
    assert!(Arc::ptr_eq(query.nav_mesh(), mesh));
    assert!(query.find_tile(Vec3::new(5.0, 0.0, 5.0)).is_none());
}

#[test]
fn test_scenario_d_rebuilding_a_tile_is_last_write_wins() {
    let mut session = scenario_session();
    let mut coord = coordinator();
    let hit = Vec3::new(5.0, 0.0, 5.0);
    let tile_coord = TileCoord::new(2, 2);

    coord.build_tile(&mut session, Vec3::new(9.0, 0.0, 9.0)).unwrap();
    let first = coord.build_tile(&mut session, hit).unwrap().unwrap();
    assert!(first.success);
    let results_after_first = session.tile_results().len();
    let first_tile = session.nav_mesh().unwrap().tile_at(tile_coord).unwrap().clone();
    assert!(first_tile.data.areas.iter().all(|&a| a == WALKABLE_AREA));

    // Change what the tile should contain, then rebuild it
    let mut geometry = InputGeometry::clone(session.geometry().unwrap());
    geometry.add_convex_volume(covering_volume(5)).unwrap();
    session.replace_geometry(geometry);

    let second = coord.build_tile(&mut session, hit).unwrap().unwrap();
    assert!(second.success);
    assert_eq!(session.tile_results().len(), results_after_first);
    assert_eq!(session.tile_result(tile_coord), Some(&second));

    let mesh = session.nav_mesh().unwrap();
    assert_eq!(mesh.tile_count(), 2);
    let tile = mesh.tile_at(tile_coord).unwrap();
    assert_ne!(tile.salt, first_tile.salt);
    assert!(!Arc::ptr_eq(&tile.data, &first_tile.data));
    assert!(tile.data.areas.iter().all(|&a| a == 5));
    assert_eq!(tile.data.triangles.len(), first_tile.data.triangles.len());
}

#[test]
fn test_removing_missing_tile_changes_nothing() {
    let mut session = scenario_session();
    let mut coord = coordinator();
    coord.build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0)).unwrap();

    let before = Arc::clone(session.nav_mesh().unwrap());
    let results_before = session.tile_results().to_vec();
    let revision = session.mesh_revision();
    session.mark_clean();

    let removal = coord
        .remove_tile(&mut session, Vec3::new(30.0, 0.0, 30.0))
        .unwrap()
        .unwrap();
    assert_eq!(
        removal,
        TileRemoval {
            coord: TileCoord::new(15, 15),
            removed: false,
        }
    );

    assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));
    assert_eq!(session.tile_results(), results_before.as_slice());
    assert_eq!(session.mesh_revision(), revision);
    assert!(!session.is_dirty());

    // Removing twice: the second call is a no-op
    let first = coord
        .remove_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap();
    assert!(first.removed);
    let after_first = Arc::clone(session.nav_mesh().unwrap());
    let second = coord
        .remove_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap();
    assert!(!second.removed);
    assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &after_first));
    assert!(session.tile_results().is_empty());
}

#[test]
fn test_remove_before_any_build_is_noop() {
    let mut session = scenario_session();
    session.mark_clean();
    let removal = coordinator()
        .remove_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap();
    assert!(!removal.removed);
    assert!(session.nav_mesh().is_none());
    assert!(!session.is_dirty());
}

#[test]
fn test_query_handle_tracks_mesh_after_every_operation() {
    let mut session = scenario_session();
    let mut coord = coordinator();
    assert_query_matches_mesh(&session);

    coord.build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0)).unwrap();
    assert_query_matches_mesh(&session);
    coord.build_all_tiles(&mut session).unwrap();
    assert_query_matches_mesh(&session);
    coord.remove_tile(&mut session, Vec3::new(5.0, 0.0, 5.0)).unwrap();
    assert_query_matches_mesh(&session);
    coord.remove_all_tiles(&mut session).unwrap();
    assert_query_matches_mesh(&session);

    session.load_geometry(scenario_geometry());
    assert_query_matches_mesh(&session);
    assert!(session.query().is_none());
}

#[test]
fn test_failed_build_keeps_mesh_instance() {
    let mut session = scenario_session();
    coordinator().build_all_tiles(&mut session).unwrap();
    let before = Arc::clone(session.nav_mesh().unwrap());
    let results_before = session.tile_results().to_vec();
    session.mark_clean();

    let result = failing_at(2, 2)
        .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.triangle_count, 0);
    assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));
    assert_eq!(session.tile_results(), results_before.as_slice());
    assert!(!session.is_dirty());
}

#[test]
fn test_empty_tile_build_is_a_failure() {
    let mut session = scenario_session();
    let mut coord = coordinator();
    coord.build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0)).unwrap();
    let before = Arc::clone(session.nav_mesh().unwrap());

    let mut geometry = InputGeometry::clone(session.geometry().unwrap());
    geometry.add_convex_volume(covering_volume(NULL_AREA)).unwrap();
    session.replace_geometry(geometry);

    let result = coord
        .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap();
    assert!(!result.success);
    // The old tile content survives
    let mesh = session.nav_mesh().unwrap();
    assert!(Arc::ptr_eq(mesh, &before));
    assert!(mesh.tile_at(TileCoord::new(2, 2)).is_some());
}

#[test]
fn test_point_outside_grid_is_a_failure() {
    let mut session = scenario_session();
    let mut coord = coordinator();
    coord.build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0)).unwrap();
    let before = Arc::clone(session.nav_mesh().unwrap());

    for point in [Vec3::new(-5.0, 0.0, -5.0), Vec3::new(41.0, 0.0, 5.0)] {
        let result = coord.build_tile(&mut session, point).unwrap().unwrap();
        assert!(!result.success);
        assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));
    }
    let result = coord
        .build_tile(&mut session, Vec3::new(-5.0, 0.0, -5.0))
        .unwrap()
        .unwrap();
    assert_eq!(result.coord, TileCoord::new(-3, -3));
}

#[test]
fn test_full_mesh_rejects_new_tile() {
    let mut session = scenario_session();
    session.settings_mut().max_tiles = 1;
    let mut coord = coordinator();

    assert!(coord
        .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap()
        .success);
    let before = Arc::clone(session.nav_mesh().unwrap());

    let result = coord
        .build_tile(&mut session, Vec3::new(9.0, 0.0, 9.0))
        .unwrap()
        .unwrap();
    assert!(!result.success);
    assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));

    // Rebuilding the stored tile still works
    assert!(coord
        .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap()
        .success);
}

#[test]
fn test_failed_build_all_leaves_session_untouched() {
    let mut session = scenario_session();
    coordinator().build_all_tiles(&mut session).unwrap();
    let before = Arc::clone(session.nav_mesh().unwrap());
    let results_before = session.tile_results().len();
    let revision = session.mesh_revision();
    session.mark_clean();

    let report = failing_at(3, 3).build_all_tiles(&mut session).unwrap();
    assert!(!report.success);
    assert_eq!(report.failed, 1);
    assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));
    assert_eq!(session.tile_results().len(), results_before);
    assert_eq!(session.mesh_revision(), revision);
    assert!(!session.is_dirty());
}

#[test]
fn test_results_follow_tile_edits() {
    let mut session = scenario_session();
    let mut coord = coordinator();
    coord.build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0)).unwrap();
    coord.build_tile(&mut session, Vec3::new(9.0, 0.0, 9.0)).unwrap();
    assert_eq!(session.tile_results().len(), 2);

    coord.remove_tile(&mut session, Vec3::new(9.5, 0.0, 9.5)).unwrap();
    assert_eq!(session.tile_results().len(), 1);
    assert!(session.tile_result(TileCoord::new(4, 4)).is_none());
    assert!(session.tile_result(TileCoord::new(2, 2)).is_some());
}

#[test]
fn test_untiled_settings_make_click_edits_inert() {
    let mut session = scenario_session();
    let mut coord = coordinator();
    coord.build_all_tiles(&mut session).unwrap();
    let before = Arc::clone(session.nav_mesh().unwrap());

    session.settings_mut().tile_size = 0;
    session.mark_clean();
    let hit = Vec3::new(5.0, 0.0, 5.0);
    assert!(coord.build_tile(&mut session, hit).unwrap().is_none());
    assert!(coord.remove_tile(&mut session, hit).unwrap().is_none());

    assert!(Arc::ptr_eq(session.nav_mesh().unwrap(), &before));
    assert!(!session.is_dirty());
}

#[test]
fn test_new_scene_drops_mesh() {
    let mut session = scenario_session();
    coordinator().build_all_tiles(&mut session).unwrap();
    let revision = session.mesh_revision();

    session.load_geometry(scenario_geometry());
    assert!(session.nav_mesh().is_none());
    assert!(session.tile_results().is_empty());
    assert!(session.mesh_revision() > revision);
}

#[test]
fn test_oversized_tile_size_builds_one_tile() {
    let mut session = scenario_session();
    session.settings_mut().tile_size = i32::MAX;
    let grid = session.tile_grid().unwrap();
    assert_eq!(grid.tile_count(), 1);

    let report = coordinator().build_all_tiles(&mut session).unwrap();
    assert!(report.success);
    assert_eq!(report.built, 1);

    let result = coordinator()
        .build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))
        .unwrap()
        .unwrap();
    assert!(result.success);
    assert_eq!(result.coord, TileCoord::new(0, 0));
}
