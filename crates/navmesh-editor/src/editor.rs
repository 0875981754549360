//! Editor host
//!
//! Owns the session and the single active tool. Events only reach a tool
//! after it has been attached, and a tool is told about a new mesh instance
//! right after the dispatch that produced it.

use crate::input_geometry::InputGeometry;
use crate::session::NavMeshSession;
use crate::settings::BuildSettings;
use crate::tools::{EditTool, ToolKind};
use glam::Vec3;
use navmesh_common::Result;

pub struct Editor<T> {
    session: NavMeshSession<T>,
    tool: Option<Box<dyn EditTool<T>>>,
    seen_revision: u64,
}

impl<T: 'static> Editor<T> {
    pub fn new(settings: BuildSettings) -> Self {
        Self::with_session(NavMeshSession::new(settings))
    }

    pub fn with_session(session: NavMeshSession<T>) -> Self {
        let seen_revision = session.mesh_revision();
        Self {
            session,
            tool: None,
            seen_revision,
        }
    }

    pub fn session(&self) -> &NavMeshSession<T> {
        &self.session
    }

    /// Direct session access; call [`sync`](Self::sync) after replacing the mesh
    pub fn session_mut(&mut self) -> &mut NavMeshSession<T> {
        &mut self.session
    }

    /// Loads a new scene and re-attaches the active tool to it
    pub fn load_geometry(&mut self, geometry: InputGeometry) -> Result<()> {
        self.session.load_geometry(geometry);
        self.seen_revision = self.session.mesh_revision();
        if let Some(tool) = self.tool.as_mut() {
            tool.attach(&mut self.session)?;
        }
        Ok(())
    }

    /// Attaches `tool` and makes it the active tool, returning the previous one
    pub fn set_tool(
        &mut self,
        mut tool: Box<dyn EditTool<T>>,
    ) -> Result<Option<Box<dyn EditTool<T>>>> {
        tool.attach(&mut self.session)?;
        log::debug!("Active tool: {}", tool.kind());
        self.seen_revision = self.session.mesh_revision();
        Ok(self.tool.replace(tool))
    }

    pub fn take_tool(&mut self) -> Option<Box<dyn EditTool<T>>> {
        self.tool.take()
    }

    pub fn tool_kind(&self) -> Option<ToolKind> {
        self.tool.as_ref().map(|tool| tool.kind())
    }

    /// The active tool, if it is a `U`
    pub fn tool_as<U: EditTool<T>>(&self) -> Option<&U> {
        self.tool.as_ref()?.as_any().downcast_ref::<U>()
    }

    pub fn tool_as_mut<U: EditTool<T>>(&mut self) -> Option<&mut U> {
        self.tool.as_mut()?.as_any_mut().downcast_mut::<U>()
    }

    /// Runs a tool-specific action against the session.
    ///
    /// Returns `Ok(None)` when the active tool is not a `U`.
    pub fn with_tool<U, R, F>(&mut self, action: F) -> Result<Option<R>>
    where
        U: EditTool<T>,
        F: FnOnce(&mut U, &mut NavMeshSession<T>) -> Result<R>,
    {
        let Some(tool) = self
            .tool
            .as_mut()
            .and_then(|tool| tool.as_any_mut().downcast_mut::<U>())
        else {
            return Ok(None);
        };
        let result = action(tool, &mut self.session);
        self.sync()?;
        result.map(Some)
    }

    pub fn click(&mut self, origin: Vec3, point: Vec3, shift: bool) -> Result<()> {
        let Some(tool) = self.tool.as_mut() else {
            return Ok(());
        };
        let result = tool.on_click(&mut self.session, origin, point, shift);
        self.sync()?;
        result
    }

    pub fn update(&mut self, dt: f32) -> Result<()> {
        let Some(tool) = self.tool.as_mut() else {
            return Ok(());
        };
        let result = tool.on_update(&mut self.session, dt);
        self.sync()?;
        result
    }

    /// Notifies the active tool if the mesh instance changed since the last
    /// notification
    pub fn sync(&mut self) -> Result<()> {
        let revision = self.session.mesh_revision();
        if revision == self.seen_revision {
            return Ok(());
        }
        self.seen_revision = revision;
        match self.tool.as_mut() {
            Some(tool) => tool.on_session_changed(&self.session),
            None => Ok(()),
        }
    }
}
