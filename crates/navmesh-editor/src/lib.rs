//! Tile-Based Incremental Navigation Mesh Editing
//!
//! This crate is the coordination layer of an interactive navigation mesh
//! editor. It maps world-space edit positions to a tile grid, decides which
//! tiles to rebuild or remove, and keeps the editing session (geometry,
//! per-tile build results, compiled mesh and its query handle) consistent
//! while the mesh is edited live.
//!
//! # Features
//!
//! - **Tile Grid Indexing**: Point to tile coordinate and tile bounds mapping
//! - **Incremental Edits**: Build or remove single tiles, or rebuild everything
//! - **All-or-nothing Updates**: A failed edit never leaves a half-built mesh
//! - **Interactive Tools**: Tile editor, convex volume editor and a crowd profiling harness
//! - **Pluggable Backends**: Mesh building and crowd simulation sit behind traits
//!
//! # Example
//!
//! ```rust,no_run
//! use navmesh_editor::{
//!     BuildSettings, InputGeometry, NavMeshSession, TileEditCoordinator, TriangleTileBuilder,
//! };
//! use glam::Vec3;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let geometry = InputGeometry::from_obj("level.obj")?;
//! let settings = BuildSettings::default().with_tile_size(32);
//! let mut session = NavMeshSession::with_geometry(settings, geometry);
//!
//! let mut coordinator = TileEditCoordinator::new(TriangleTileBuilder::new());
//! let report = coordinator.build_all_tiles(&mut session)?;
//! println!("{}", report);
//!
//! // Rebuild the tile under a clicked point
//! if let Some(result) = coordinator.build_tile(&mut session, Vec3::new(5.0, 0.0, 5.0))? {
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(unused))]

pub mod builder;
pub mod coordinator;
pub mod editor;
pub mod input_geometry;
pub mod nav_mesh;
pub mod session;
pub mod settings;
pub mod tile_grid;
pub mod tools;
pub mod triangle_builder;

#[cfg(test)]
mod editing_scenario_tests;
#[cfg(test)]
mod test_helpers;

pub use builder::{BuildAllReport, BuildResult, TileMeshBuilder};
pub use coordinator::{TileEditCoordinator, TileRemoval};
pub use editor::Editor;
pub use input_geometry::{ConvexVolume, InputGeometry, OffMeshConnection};
pub use nav_mesh::{MeshTile, NavMeshParams, NavMeshQuery, TilePayload, TiledNavMesh};
pub use session::NavMeshSession;
pub use settings::{BuildSettings, PartitionType};
pub use tile_grid::{tile_bounds, to_tile_coord, TileBounds, TileCoord, TileGrid};
pub use tools::{EditTool, ToolKind};
pub use triangle_builder::{TileMesh, TriangleTileBuilder};

pub use navmesh_common::{Error, Result};
