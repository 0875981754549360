//! 2D geometry operations on the XZ plane
//!
//! Editing tools work on the ground plane of a Y-up world: tile lookup, convex
//! volume placement and hit testing all ignore the vertical axis.

use glam::Vec3;

/// Calculate twice the signed area of a triangle on the XZ plane.
///
/// The sign indicates the winding order:
/// - Positive: clockwise (when looking down Y axis)
/// - Negative: counter-clockwise (when looking down Y axis)
/// - Zero: degenerate (collinear points)
#[inline]
pub fn tri_area_2d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let abx = b.x - a.x;
    let abz = b.z - a.z;
    let acx = c.x - a.x;
    let acz = c.z - a.z;
    acx * abz - abx * acz
}

/// Squared distance between two points on the XZ plane.
#[inline]
pub fn dist_sqr_2d(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    dx * dx + dz * dz
}

/// Check if two axis-aligned boxes overlap on the XZ plane (touching counts).
#[inline]
pub fn overlap_bounds_2d(amin: Vec3, amax: Vec3, bmin: Vec3, bmax: Vec3) -> bool {
    amin.x <= bmax.x && amax.x >= bmin.x && amin.z <= bmax.z && amax.z >= bmin.z
}

/// Axis-aligned bounds of a set of points, `None` when the set is empty.
pub fn calc_bounds(points: &[Vec3]) -> Option<(Vec3, Vec3)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(bmin, bmax), p| (bmin.min(*p), bmax.max(*p))),
    )
}

/// Check if a point lies inside a polygon on the XZ plane.
///
/// Crossing-number test; the polygon may be wound either way.
pub fn point_in_polygon_2d(point: Vec3, verts: &[Vec3]) -> bool {
    if verts.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = verts.len() - 1;
    for i in 0..verts.len() {
        let vi = verts[i];
        let vj = verts[j];
        if ((vi.z > point.z) != (vj.z > point.z))
            && (point.x < (vj.x - vi.x) * (point.z - vi.z) / (vj.z - vi.z) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Lexical order on (x, z), used to pick the hull start point.
fn lower_xz(a: Vec3, b: Vec3) -> bool {
    a.x < b.x || (a.x == b.x && a.z < b.z)
}

/// Check whether `c` lies strictly left of the line `a`-`b` when walking the hull.
fn left_of(a: Vec3, b: Vec3, c: Vec3) -> bool {
    let u1 = b.x - a.x;
    let v1 = b.z - a.z;
    let u2 = c.x - a.x;
    let v2 = c.z - a.z;
    u1 * v2 - v1 * u2 < 0.0
}

/// Compute the convex hull of points on the XZ plane (gift wrapping).
///
/// Returns indices into `points` in hull order.
pub fn convex_hull_2d(points: &[Vec3]) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut hull = 0;
    for i in 1..points.len() {
        if lower_xz(points[i], points[hull]) {
            hull = i;
        }
    }

    let mut out = Vec::with_capacity(points.len());
    loop {
        out.push(hull);
        let mut endpt = 0;
        for j in 1..points.len() {
            if hull == endpt || left_of(points[hull], points[endpt], points[j]) {
                endpt = j;
            }
        }
        hull = endpt;
        // Collinear or duplicate input can keep the walk from closing.
        if endpt == out[0] || out.len() >= points.len() {
            break;
        }
    }

    out
}
