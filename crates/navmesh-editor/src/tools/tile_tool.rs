//! Tile editor: click to build the tile under the cursor, shift-click to remove it

use super::{EditTool, ToolKind};
use crate::builder::{BuildAllReport, BuildResult, TileMeshBuilder};
use crate::coordinator::{TileEditCoordinator, TileRemoval};
use crate::session::NavMeshSession;
use crate::tile_grid::TileBounds;
use glam::Vec3;
use navmesh_common::Result;
use std::any::Any;
use std::fmt;

/// What the tile editor is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileToolState {
    #[default]
    Idle,
    Building,
    Removing,
}

/// Result of the last tile editor action, for the status line
#[derive(Debug, Clone, PartialEq)]
pub enum TileEditOutcome {
    Built(BuildResult),
    Removed(TileRemoval),
    BuiltAll(BuildAllReport),
    RemovedAll(usize),
    /// The mesh is not tiled, the click did nothing
    Skipped,
}

impl TileEditOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            TileEditOutcome::Built(result) => !result.success,
            TileEditOutcome::BuiltAll(report) => !report.success,
            _ => false,
        }
    }
}

impl fmt::Display for TileEditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileEditOutcome::Built(result) => write!(f, "{}", result),
            TileEditOutcome::Removed(r) if r.removed => write!(f, "tile {}: removed", r.coord),
            TileEditOutcome::Removed(r) => write!(f, "tile {}: nothing to remove", r.coord),
            TileEditOutcome::BuiltAll(report) => write!(f, "{}", report),
            TileEditOutcome::RemovedAll(count) => write!(f, "{} tiles removed", count),
            TileEditOutcome::Skipped => f.write_str("navigation mesh is not tiled"),
        }
    }
}

/// Interactive tile build/remove tool
#[derive(Debug)]
pub struct TileTool<B> {
    coordinator: TileEditCoordinator<B>,
    state: TileToolState,
    hit_pos: Option<Vec3>,
    highlighted: Option<TileBounds>,
    last_outcome: Option<TileEditOutcome>,
}

impl<B: TileMeshBuilder> TileTool<B> {
    pub fn new(builder: B) -> Self {
        Self {
            coordinator: TileEditCoordinator::new(builder),
            state: TileToolState::Idle,
            hit_pos: None,
            highlighted: None,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> TileToolState {
        self.state
    }

    pub fn hit_pos(&self) -> Option<Vec3> {
        self.hit_pos
    }

    /// Bounds of the tile under the last click, for the renderer
    pub fn highlighted_tile(&self) -> Option<TileBounds> {
        self.highlighted
    }

    pub fn last_outcome(&self) -> Option<&TileEditOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn coordinator(&self) -> &TileEditCoordinator<B> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut TileEditCoordinator<B> {
        &mut self.coordinator
    }

    /// "Create All"
    pub fn build_all(&mut self, session: &mut NavMeshSession<B::Tile>) -> Result<BuildAllReport> {
        self.state = TileToolState::Building;
        let report = self.coordinator.build_all_tiles(session);
        self.state = TileToolState::Idle;

        let report = report?;
        self.last_outcome = Some(TileEditOutcome::BuiltAll(report.clone()));
        Ok(report)
    }

    /// "Remove All"
    pub fn remove_all(&mut self, session: &mut NavMeshSession<B::Tile>) -> Result<usize> {
        self.state = TileToolState::Removing;
        let removed = self.coordinator.remove_all_tiles(session);
        self.state = TileToolState::Idle;

        let removed = removed?;
        self.last_outcome = Some(TileEditOutcome::RemovedAll(removed));
        Ok(removed)
    }

    fn refresh_highlight(&mut self, session: &NavMeshSession<B::Tile>) {
        self.highlighted = match (self.hit_pos, session.tile_grid()) {
            (Some(pos), Some(grid)) => Some(grid.bounds(grid.coord_at(pos))),
            _ => None,
        };
    }

    fn edit(
        &mut self,
        session: &mut NavMeshSession<B::Tile>,
        point: Vec3,
        remove: bool,
    ) -> Result<TileEditOutcome> {
        let outcome = if remove {
            self.coordinator
                .remove_tile(session, point)?
                .map(TileEditOutcome::Removed)
        } else {
            self.coordinator
                .build_tile(session, point)?
                .map(TileEditOutcome::Built)
        };
        Ok(outcome.unwrap_or(TileEditOutcome::Skipped))
    }
}

impl<B> EditTool<B::Tile> for TileTool<B>
where
    B: TileMeshBuilder + 'static,
{
    fn kind(&self) -> ToolKind {
        ToolKind::TileEdit
    }

    fn attach(&mut self, _session: &mut NavMeshSession<B::Tile>) -> Result<()> {
        self.state = TileToolState::Idle;
        self.hit_pos = None;
        self.highlighted = None;
        self.last_outcome = None;
        Ok(())
    }

    fn on_session_changed(&mut self, session: &NavMeshSession<B::Tile>) -> Result<()> {
        self.refresh_highlight(session);
        Ok(())
    }

    fn on_click(
        &mut self,
        session: &mut NavMeshSession<B::Tile>,
        _origin: Vec3,
        point: Vec3,
        shift: bool,
    ) -> Result<()> {
        self.hit_pos = Some(point);
        self.refresh_highlight(session);

        self.state = if shift {
            TileToolState::Removing
        } else {
            TileToolState::Building
        };
        let outcome = self.edit(session, point, shift);
        self.state = TileToolState::Idle;

        let outcome = outcome?;
        if outcome.is_failure() {
            log::warn!("{}", outcome);
        }
        self.last_outcome = Some(outcome);
        Ok(())
    }

    fn on_update(&mut self, _session: &mut NavMeshSession<B::Tile>, _dt: f32) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
