//! Navmesh session state
//!
//! The session is the single source of truth the editing tools read and
//! mutate. Geometry, per-tile build results and the compiled mesh are only
//! ever replaced together through [`NavMeshSession::update`], which also
//! derives the query handle, so a reader never sees a query over a mesh
//! other than the current one.

use crate::builder::BuildResult;
use crate::input_geometry::InputGeometry;
use crate::nav_mesh::{NavMeshQuery, TiledNavMesh};
use crate::settings::BuildSettings;
use crate::tile_grid::{TileCoord, TileGrid};
use std::sync::Arc;

/// Editing state for one loaded scene
#[derive(Debug)]
pub struct NavMeshSession<T> {
    geometry: Option<Arc<InputGeometry>>,
    tile_results: Vec<BuildResult>,
    nav_mesh: Option<Arc<TiledNavMesh<T>>>,
    query: Option<NavMeshQuery<T>>,
    settings: BuildSettings,
    dirty: bool,
    /// Incremented whenever the mesh identity changes
    mesh_revision: u64,
}

impl<T> NavMeshSession<T> {
    pub fn new(settings: BuildSettings) -> Self {
        Self {
            geometry: None,
            tile_results: Vec::new(),
            nav_mesh: None,
            query: None,
            settings,
            dirty: false,
            mesh_revision: 0,
        }
    }

    pub fn with_geometry(settings: BuildSettings, geometry: InputGeometry) -> Self {
        let mut session = Self::new(settings);
        session.load_geometry(geometry);
        session
    }

    /// Starts a new scene: installs `geometry` and drops any built mesh
    pub fn load_geometry(&mut self, geometry: InputGeometry) {
        self.update(Some(Arc::new(geometry)), Vec::new(), None);
    }

    /// Swaps in edited geometry, keeping the current mesh and results
    pub fn replace_geometry(&mut self, geometry: InputGeometry) {
        let results = self.tile_results.clone();
        let mesh = self.nav_mesh.clone();
        self.update(Some(Arc::new(geometry)), results, mesh);
    }

    /// Replaces geometry, build results and mesh in one step.
    ///
    /// The query handle is rebuilt from `nav_mesh` (absent when the mesh is
    /// absent) and the session is marked dirty.
    pub fn update(
        &mut self,
        geometry: Option<Arc<InputGeometry>>,
        tile_results: Vec<BuildResult>,
        nav_mesh: Option<Arc<TiledNavMesh<T>>>,
    ) {
        let same_mesh = match (&self.nav_mesh, &nav_mesh) {
            (Some(old), Some(new)) => Arc::ptr_eq(old, new),
            (None, None) => true,
            _ => false,
        };
        if !same_mesh {
            self.mesh_revision += 1;
        }

        self.query = nav_mesh.as_ref().map(|mesh| NavMeshQuery::new(Arc::clone(mesh)));
        self.geometry = geometry;
        self.tile_results = tile_results;
        self.nav_mesh = nav_mesh;
        self.dirty = true;
    }

    pub fn geometry(&self) -> Option<&Arc<InputGeometry>> {
        self.geometry.as_ref()
    }

    pub fn tile_results(&self) -> &[BuildResult] {
        &self.tile_results
    }

    /// Latest build result recorded for `coord`
    pub fn tile_result(&self, coord: TileCoord) -> Option<&BuildResult> {
        self.tile_results.iter().find(|r| r.coord == coord)
    }

    pub fn nav_mesh(&self) -> Option<&Arc<TiledNavMesh<T>>> {
        self.nav_mesh.as_ref()
    }

    pub fn query(&self) -> Option<&NavMeshQuery<T>> {
        self.query.as_ref()
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Settings are edited in place; they take effect on the next build
    pub fn settings_mut(&mut self) -> &mut BuildSettings {
        &mut self.settings
    }

    /// Grid laid over the loaded geometry, `None` when nothing is loaded or
    /// the settings are not tiled
    pub fn tile_grid(&self) -> Option<TileGrid> {
        let geometry = self.geometry.as_ref()?;
        TileGrid::new(
            geometry.mesh_bounds_min(),
            geometry.mesh_bounds_max(),
            &self.settings,
        )
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn mesh_revision(&self) -> u64 {
        self.mesh_revision
    }
}
