//! Convex volume editor
//!
//! Clicks collect points whose XZ convex hull becomes the footprint of a new
//! area volume. Clicking again next to the last point closes the shape.
//! Shift-click deletes the volume under the cursor.

use super::{EditTool, ToolKind};
use crate::input_geometry::{ConvexVolume, InputGeometry, MAX_CONVEX_VOLUME_VERTS};
use crate::session::NavMeshSession;
use glam::Vec3;
use navmesh_common::{convex_hull_2d, Error, Result};
use std::any::Any;

/// Distance to the last point within which a click closes the shape
const CLOSE_SHAPE_DISTANCE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexVolumeToolConfig {
    /// Area id assigned to new volumes
    pub area_type: u8,
    pub box_height: f32,
    /// How far below the lowest hull point the volume starts
    pub box_descent: f32,
}

impl Default for ConvexVolumeToolConfig {
    fn default() -> Self {
        Self {
            area_type: 1,
            box_height: 6.0,
            box_descent: 1.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConvexVolumeTool {
    config: ConvexVolumeToolConfig,
    points: Vec<Vec3>,
    hull: Vec<usize>,
}

impl ConvexVolumeTool {
    pub fn new(config: ConvexVolumeToolConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
            hull: Vec::new(),
        }
    }

    pub fn config(&self) -> &ConvexVolumeToolConfig {
        &self.config
    }

    pub fn set_area_type(&mut self, area_type: u8) {
        self.config.area_type = area_type;
    }

    pub fn set_box_height(&mut self, box_height: f32) {
        self.config.box_height = box_height;
    }

    pub fn set_box_descent(&mut self, box_descent: f32) {
        self.config.box_descent = box_descent;
    }

    /// Points collected for the shape in progress
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Hull of the collected points, as indices into [`points`](Self::points)
    pub fn hull(&self) -> &[usize] {
        &self.hull
    }

    pub fn clear_shape(&mut self) {
        self.points.clear();
        self.hull.clear();
    }

    /// Deletes every volume in the scene
    pub fn clear_all_volumes<T>(&mut self, session: &mut NavMeshSession<T>) -> Result<()> {
        let mut geometry = editable_geometry(session)?;
        geometry.clear_convex_volumes();
        session.replace_geometry(geometry);
        self.clear_shape();
        Ok(())
    }

    fn delete_volume_at<T>(&mut self, session: &mut NavMeshSession<T>, point: Vec3) -> Result<()> {
        let mut geometry = editable_geometry(session)?;
        if let Some(index) = geometry.convex_volume_at(point) {
            geometry.delete_convex_volume(index);
            session.replace_geometry(geometry);
            log::debug!("Deleted convex volume {}", index);
        }
        Ok(())
    }

    fn close_shape<T>(&mut self, session: &mut NavMeshSession<T>) -> Result<()> {
        let verts: Vec<Vec3> = self.hull.iter().map(|&i| self.points[i]).collect();
        self.clear_shape();
        if verts.len() < 3 {
            return Ok(());
        }

        let min_y = verts.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
        let hmin = min_y - self.config.box_descent;
        let hmax = hmin + self.config.box_height;
        let volume = ConvexVolume::new(verts, hmin, hmax, self.config.area_type)?;

        let mut geometry = editable_geometry(session)?;
        if let Err(err) = geometry.add_convex_volume(volume) {
            log::warn!("Convex volume not added: {}", err);
            return Ok(());
        }
        session.replace_geometry(geometry);
        Ok(())
    }
}

fn editable_geometry<T>(session: &NavMeshSession<T>) -> Result<InputGeometry> {
    session
        .geometry()
        .map(|g| (**g).clone())
        .ok_or(Error::MissingGeometry)
}

impl<T: 'static> EditTool<T> for ConvexVolumeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ConvexVolume
    }

    fn attach(&mut self, _session: &mut NavMeshSession<T>) -> Result<()> {
        self.clear_shape();
        Ok(())
    }

    fn on_session_changed(&mut self, _session: &NavMeshSession<T>) -> Result<()> {
        Ok(())
    }

    fn on_click(
        &mut self,
        session: &mut NavMeshSession<T>,
        _origin: Vec3,
        point: Vec3,
        shift: bool,
    ) -> Result<()> {
        if shift {
            return self.delete_volume_at(session, point);
        }

        let close_sqr = CLOSE_SHAPE_DISTANCE * CLOSE_SHAPE_DISTANCE;
        let closes = self
            .points
            .last()
            .is_some_and(|last| last.distance_squared(point) < close_sqr);
        if closes {
            return self.close_shape(session);
        }

        if self.points.len() < MAX_CONVEX_VOLUME_VERTS {
            self.points.push(point);
            self.hull = convex_hull_2d(&self.points);
        }
        Ok(())
    }

    fn on_update(&mut self, _session: &mut NavMeshSession<T>, _dt: f32) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
