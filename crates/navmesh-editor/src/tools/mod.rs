//! Interactive edit tools
//!
//! A tool receives pointer and frame events from its host and turns them
//! into edits on the session it is attached to. The host owns the session
//! and passes it to every call, so a tool never holds on to it; whatever a
//! tool caches from the session is refreshed through
//! [`EditTool::on_session_changed`].

mod convex_volume_tool;
mod crowd_profiling_tool;
mod tile_tool;

pub use convex_volume_tool::{ConvexVolumeTool, ConvexVolumeToolConfig};
pub use crowd_profiling_tool::{
    AgentParams, AgentType, CrowdProfilingConfig, CrowdProfilingTool, CrowdSimulation,
    ProfilingStats,
};
pub use tile_tool::{TileEditOutcome, TileTool, TileToolState};

use crate::session::NavMeshSession;
use glam::Vec3;
use navmesh_common::Result;
use std::any::Any;
use std::fmt;

/// Tool variants known to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    TileEdit,
    ConvexVolume,
    CrowdProfiling,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::TileEdit => "Create Tiles",
            ToolKind::ConvexVolume => "Create Convex Volumes",
            ToolKind::CrowdProfiling => "Crowd Profiling",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle contract between a tool and its host.
///
/// The host calls [`attach`](EditTool::attach) before dispatching any other
/// event and again whenever a new scene is loaded.
pub trait EditTool<T>: Any {
    fn kind(&self) -> ToolKind;

    /// Binds the tool to `session`, dropping state tied to a previous one
    fn attach(&mut self, session: &mut NavMeshSession<T>) -> Result<()>;

    /// Called when the session's mesh instance was replaced
    fn on_session_changed(&mut self, session: &NavMeshSession<T>) -> Result<()>;

    /// Primary edit entry point; `point` is the scene hit for a ray from `origin`
    fn on_click(
        &mut self,
        session: &mut NavMeshSession<T>,
        origin: Vec3,
        point: Vec3,
        shift: bool,
    ) -> Result<()>;

    /// Per-frame step
    fn on_update(&mut self, session: &mut NavMeshSession<T>, dt: f32) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
