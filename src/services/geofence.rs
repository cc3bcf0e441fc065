//! Point-in-polygon test for classroom geofences
//!
//! Ray casting with the even-odd rule: a horizontal ray from the point
//! toward decreasing latitude toggles membership at each edge crossing.
//! Horizontal edges use a small substitute denominator instead of exact
//! on-edge geometry, so a point lying exactly on such an edge may be
//! misclassified. Pure and deterministic for a given vertex ordering.

use crate::domain::types::{BoundaryPolygon, Coordinate};

/// Substitute denominator for edges with equal longitudes
const MIN_DENOMINATOR: f64 = 1e-10;

/// Whether `point` lies inside `polygon`
pub fn is_inside(point: &Coordinate, polygon: &BoundaryPolygon) -> bool {
    let vertices = polygon.vertices();
    let (x, y) = (point.latitude, point.longitude);

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = (vertices[i].latitude, vertices[i].longitude);
        let (xj, yj) = (vertices[j].latitude, vertices[j].longitude);

        // Edge must straddle the point's longitude; then compare against
        // the edge's latitude at that longitude.
        if (yi > y) != (yj > y) {
            let mut denominator = yj - yi;
            if denominator == 0.0 {
                denominator = MIN_DENOMINATOR;
            }
            let x_at_y = (xj - xi) * (y - yi) / denominator + xi;
            if x < x_at_y {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}
