//! Common utilities and data structures shared by the navmesh editing crates

mod geometry;
mod mesh;

pub use geometry::*;
pub use mesh::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no input geometry loaded")]
    MissingGeometry,

    #[error("tile build failed: {0}")]
    Build(String),

    #[error("crowd simulation error: {0}")]
    Crowd(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for navmesh editing operations
pub type Result<T> = std::result::Result<T, Error>;
