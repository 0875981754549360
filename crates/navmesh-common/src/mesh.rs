//! Triangle mesh used as editor input geometry

use crate::{Error, Result};
use glam::Vec3;

#[cfg(feature = "std")]
use std::fs::File;
#[cfg(feature = "std")]
use std::io::{BufRead, BufReader};
#[cfg(feature = "std")]
use std::path::Path;

/// A simple triangle mesh
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    /// The vertices of the mesh as a flat array of [x, y, z] coordinates
    pub vertices: Vec<f32>,
    /// The indices of the mesh, 3 per triangle
    pub indices: Vec<i32>,
    /// The number of vertices in the mesh
    pub vert_count: usize,
    /// The number of triangles in the mesh
    pub tri_count: usize,
}

impl TriMesh {
    /// Creates a new empty triangle mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh from flat vertex and index buffers
    pub fn from_buffers(vertices: Vec<f32>, indices: Vec<i32>) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "vertex buffer length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }

        let vert_count = vertices.len() / 3;
        if let Some(bad) = indices
            .iter()
            .find(|&&i| i < 0 || i as usize >= vert_count)
        {
            return Err(Error::InvalidMesh(format!(
                "triangle index {} out of range (vertices: {})",
                bad, vert_count
            )));
        }

        Ok(Self {
            tri_count: indices.len() / 3,
            vertices,
            indices,
            vert_count,
        })
    }

    /// Loads a mesh from an OBJ file
    ///
    /// This method is only available when the `std` feature is enabled.
    #[cfg(feature = "std")]
    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut mesh = Self::new();
        for line in reader.lines() {
            let line = line?;
            Self::parse_obj_line(&line, &mut mesh)?;
        }
        mesh.check_indices()?;

        Ok(mesh)
    }

    /// Parses OBJ content from a string
    ///
    /// # Example
    ///
    /// ```
    /// use navmesh_common::TriMesh;
    ///
    /// let obj_content = r#"
    /// v 0.0 0.0 0.0
    /// v 1.0 0.0 0.0
    /// v 0.5 0.0 1.0
    /// f 1 2 3
    /// "#;
    ///
    /// let mesh = TriMesh::from_obj_str(obj_content).unwrap();
    /// assert_eq!(mesh.vert_count, 3);
    /// assert_eq!(mesh.tri_count, 1);
    /// ```
    pub fn from_obj_str(content: &str) -> Result<Self> {
        let mut mesh = Self::new();
        for line in content.lines() {
            Self::parse_obj_line(line, &mut mesh)?;
        }
        mesh.check_indices()?;

        Ok(mesh)
    }

    fn parse_coord<'a>(tokens: &mut impl Iterator<Item = &'a str>, axis: char) -> Result<f32> {
        tokens
            .next()
            .ok_or_else(|| {
                Error::InvalidMesh(format!("Invalid vertex: missing {} coordinate", axis))
            })?
            .parse::<f32>()
            .map_err(|_| {
                Error::InvalidMesh(format!(
                    "Invalid vertex: {} coordinate is not a number",
                    axis
                ))
            })
    }

    /// Parses a single line from an OBJ file
    fn parse_obj_line(line: &str, mesh: &mut Self) -> Result<()> {
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let x = Self::parse_coord(&mut tokens, 'x')?;
                let y = Self::parse_coord(&mut tokens, 'y')?;
                let z = Self::parse_coord(&mut tokens, 'z')?;

                mesh.vertices.extend_from_slice(&[x, y, z]);
                mesh.vert_count += 1;
            }
            Some("f") => {
                let mut face_indices = Vec::new();

                for token in tokens {
                    let index_str = token.split('/').next().unwrap_or_default();
                    let index = index_str.parse::<i32>().map_err(|_| {
                        Error::InvalidMesh("Invalid face: vertex index is not a number".to_string())
                    })?;

                    // Negative indices are relative to the vertices read so far
                    let index = if index < 0 {
                        mesh.vert_count as i32 + index
                    } else {
                        index - 1
                    };
                    face_indices.push(index);
                }

                if face_indices.len() < 3 {
                    return Err(Error::InvalidMesh(
                        "Invalid face: less than 3 vertices".to_string(),
                    ));
                }

                // Fan triangulation for polygons
                for i in 1..(face_indices.len() - 1) {
                    mesh.indices.push(face_indices[0]);
                    mesh.indices.push(face_indices[i]);
                    mesh.indices.push(face_indices[i + 1]);
                    mesh.tri_count += 1;
                }
            }
            _ => {
                // Normals, texture coordinates, groups and comments are not needed
            }
        }

        Ok(())
    }

    fn check_indices(&self) -> Result<()> {
        match self
            .indices
            .iter()
            .find(|&&i| i < 0 || i as usize >= self.vert_count)
        {
            Some(bad) => Err(Error::InvalidMesh(format!(
                "face references vertex {} but only {} vertices exist",
                bad + 1,
                self.vert_count
            ))),
            None => Ok(()),
        }
    }

    /// Returns the position of vertex `i`
    #[inline]
    pub fn vertex(&self, i: usize) -> Vec3 {
        Vec3::new(
            self.vertices[i * 3],
            self.vertices[i * 3 + 1],
            self.vertices[i * 3 + 2],
        )
    }

    /// Returns the three corners of triangle `i`
    pub fn triangle(&self, i: usize) -> [Vec3; 3] {
        let idx = &self.indices[i * 3..i * 3 + 3];
        [
            self.vertex(idx[0] as usize),
            self.vertex(idx[1] as usize),
            self.vertex(idx[2] as usize),
        ]
    }

    /// Iterates over all triangles of the mesh
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        (0..self.tri_count).map(move |i| self.triangle(i))
    }

    /// Calculates the axis-aligned bounding box of the mesh
    pub fn calculate_bounds(&self) -> (Vec3, Vec3) {
        if self.vert_count == 0 {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        (0..self.vert_count).map(|i| self.vertex(i)).fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(bmin, bmax), v| (bmin.min(v), bmax.max(v)),
        )
    }
}
