//! Shared fixtures for the editor tests
//!
//! The scenario scene is a 40 x 40 ground plane with a single vertical wall
//! triangle in the far corner that lifts the bounds to 10 units, giving mesh
//! bounds (0, 0, 0) .. (40, 10, 40). With a cell size of 1 and a tile size of
//! 2 that is a 20 x 20 grid of 2 x 2 tiles.

use crate::input_geometry::InputGeometry;
use crate::session::NavMeshSession;
use crate::settings::BuildSettings;
use crate::triangle_builder::TileMesh;
use navmesh_common::TriMesh;

/// Flat plane from (0, 0, 0) to (size, 0, size) split into
/// `subdivisions` x `subdivisions` quads
pub fn flat_plane_mesh(size: f32, subdivisions: usize) -> TriMesh {
    let n = subdivisions.max(1);
    let step = size / n as f32;

    let mut vertices = Vec::with_capacity((n + 1) * (n + 1) * 3);
    for z in 0..=n {
        for x in 0..=n {
            vertices.extend_from_slice(&[x as f32 * step, 0.0, z as f32 * step]);
        }
    }

    let row = (n + 1) as i32;
    let mut indices = Vec::with_capacity(n * n * 6);
    for z in 0..n as i32 {
        for x in 0..n as i32 {
            let i = z * row + x;
            indices.extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
        }
    }

    TriMesh::from_buffers(vertices, indices).expect("plane buffers are consistent")
}

/// Scenario plane plus the wall triangle
pub fn scenario_mesh() -> TriMesh {
    let mut mesh = flat_plane_mesh(40.0, 20);
    let base = mesh.vert_count as i32;
    mesh.vertices.extend_from_slice(&[
        38.0, 0.0, 39.0, //
        40.0, 0.0, 39.0, //
        39.0, 10.0, 39.0,
    ]);
    mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
    TriMesh::from_buffers(mesh.vertices, mesh.indices).expect("scenario buffers are consistent")
}

pub fn scenario_geometry() -> InputGeometry {
    InputGeometry::new(scenario_mesh()).expect("scenario mesh has triangles")
}

/// Cell size 1, tile size 2, no agent radius
pub fn scenario_settings() -> BuildSettings {
    BuildSettings::default()
        .with_cell_size(1.0)
        .with_tile_size(2)
        .with_agent_radius(0.0)
}

/// Session over the scenario scene, nothing built yet
pub fn scenario_session() -> NavMeshSession<TileMesh> {
    NavMeshSession::with_geometry(scenario_settings(), scenario_geometry())
}
