//! Input geometry for a loaded scene
//!
//! The triangle mesh is shared behind an `Arc`; annotations placed by the
//! editing tools (convex volumes, off-mesh connections) live next to it so a
//! modified copy of the geometry can be swapped into the session cheaply.

use glam::Vec3;
use navmesh_common::{calc_bounds, dist_sqr_2d, point_in_polygon_2d, Error, Result, TriMesh};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum number of vertices in a convex volume
pub const MAX_CONVEX_VOLUME_VERTS: usize = 12;

/// Maximum number of convex volumes per scene
pub const MAX_CONVEX_VOLUMES: usize = 256;

/// A prism that overrides the area type of the geometry it encloses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexVolume {
    /// Footprint vertices on the XZ plane
    pub verts: Vec<Vec3>,
    pub hmin: f32,
    pub hmax: f32,
    pub area: u8,
}

impl ConvexVolume {
    pub fn new(verts: Vec<Vec3>, hmin: f32, hmax: f32, area: u8) -> Result<Self> {
        if verts.len() < 3 {
            return Err(Error::InvalidMesh(
                "Convex volume requires at least 3 vertices".to_string(),
            ));
        }
        if verts.len() > MAX_CONVEX_VOLUME_VERTS {
            return Err(Error::InvalidMesh(format!(
                "Convex volume has too many vertices: {} (max: {})",
                verts.len(),
                MAX_CONVEX_VOLUME_VERTS
            )));
        }
        if hmin > hmax {
            return Err(Error::InvalidMesh(
                "Convex volume hmin > hmax".to_string(),
            ));
        }

        Ok(Self {
            verts,
            hmin,
            hmax,
            area,
        })
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.y >= self.hmin && point.y <= self.hmax && point_in_polygon_2d(point, &self.verts)
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        let (mut bmin, mut bmax) = calc_bounds(&self.verts).unwrap_or((Vec3::ZERO, Vec3::ZERO));
        bmin.y = self.hmin;
        bmax.y = self.hmax;
        (bmin, bmax)
    }
}

/// A user-placed link between two points that the mesh itself does not connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffMeshConnection {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
    pub bidirectional: bool,
    pub area: u8,
    pub flags: u16,
}

/// Geometry of the loaded scene plus editor annotations
#[derive(Debug, Clone)]
pub struct InputGeometry {
    mesh: Arc<TriMesh>,
    bmin: Vec3,
    bmax: Vec3,
    convex_volumes: Vec<ConvexVolume>,
    off_mesh_connections: Vec<OffMeshConnection>,
}

impl InputGeometry {
    pub fn new(mesh: TriMesh) -> Result<Self> {
        Self::from_shared(Arc::new(mesh))
    }

    pub fn from_shared(mesh: Arc<TriMesh>) -> Result<Self> {
        if mesh.tri_count == 0 {
            return Err(Error::InvalidMesh("input mesh has no triangles".to_string()));
        }
        let (bmin, bmax) = mesh.calculate_bounds();
        Ok(Self {
            mesh,
            bmin,
            bmax,
            convex_volumes: Vec::new(),
            off_mesh_connections: Vec::new(),
        })
    }

    /// Loads geometry from an OBJ file
    pub fn from_obj<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::new(TriMesh::from_obj(path)?)
    }

    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    pub fn mesh_bounds_min(&self) -> Vec3 {
        self.bmin
    }

    pub fn mesh_bounds_max(&self) -> Vec3 {
        self.bmax
    }

    pub fn convex_volumes(&self) -> &[ConvexVolume] {
        &self.convex_volumes
    }

    pub fn add_convex_volume(&mut self, volume: ConvexVolume) -> Result<()> {
        if self.convex_volumes.len() >= MAX_CONVEX_VOLUMES {
            return Err(Error::InvalidMesh(format!(
                "too many convex volumes (max: {})",
                MAX_CONVEX_VOLUMES
            )));
        }
        self.convex_volumes.push(volume);
        Ok(())
    }

    pub fn delete_convex_volume(&mut self, index: usize) -> Option<ConvexVolume> {
        (index < self.convex_volumes.len()).then(|| self.convex_volumes.remove(index))
    }

    /// Index of the first volume containing `point`
    pub fn convex_volume_at(&self, point: Vec3) -> Option<usize> {
        self.convex_volumes.iter().position(|v| v.contains(point))
    }

    pub fn clear_convex_volumes(&mut self) {
        self.convex_volumes.clear();
    }

    /// Area id the last containing volume assigns to `point`
    pub fn area_override_at(&self, point: Vec3) -> Option<u8> {
        self.convex_volumes
            .iter()
            .rev()
            .find(|v| v.contains(point))
            .map(|v| v.area)
    }

    pub fn off_mesh_connections(&self) -> &[OffMeshConnection] {
        &self.off_mesh_connections
    }

    pub fn add_off_mesh_connection(&mut self, connection: OffMeshConnection) {
        self.off_mesh_connections.push(connection);
    }

    /// Removes the connection whose start or end lies nearest to `point`
    /// within `radius`; returns whether one was removed.
    pub fn remove_off_mesh_connection_near(&mut self, point: Vec3, radius: f32) -> bool {
        let limit = radius * radius;
        let nearest = self
            .off_mesh_connections
            .iter()
            .enumerate()
            .map(|(i, c)| (i, dist_sqr_2d(c.start, point).min(dist_sqr_2d(c.end, point))))
            .filter(|&(_, d)| d < limit)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest {
            Some((i, _)) => {
                self.off_mesh_connections.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn remove_off_mesh_connections(&mut self) {
        self.off_mesh_connections.clear();
    }
}
