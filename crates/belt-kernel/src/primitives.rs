//! Planar face builders on top of truck's sweep API.
//!
//! truck has no built-in disc or polygon face: wires are built from vertices
//! and swept arcs, then a plane is attached.

use std::f64::consts::TAU;
use truck_modeling::builder;
use truck_modeling::topology::{Edge, Face, Wire};
use truck_modeling::{Point3, Rad, Vector3};

use crate::types::KernelError;

/// Closed polyline wire through `points` in the plane `z = z`.
pub fn polygon_wire(points: &[[f64; 2]], z: f64) -> Result<Wire, KernelError> {
    if points.len() < 3 {
        return Err(KernelError::InvalidProfile {
            reason: format!("polygon has {} points, need at least 3", points.len()),
        });
    }
    if points.iter().flatten().any(|c| !c.is_finite()) {
        return Err(KernelError::InvalidProfile {
            reason: "polygon has a non-finite coordinate".to_string(),
        });
    }

    // Create all vertices first so edges share endpoints.
    let vertices: Vec<_> = points
        .iter()
        .map(|p| builder::vertex(Point3::new(p[0], p[1], z)))
        .collect();
    let n = vertices.len();
    let edges: Vec<Edge> = (0..n)
        .map(|i| builder::line(&vertices[i], &vertices[(i + 1) % n]))
        .collect();
    Ok(Wire::from_iter(edges))
}

/// Full circle of `radius` about the Z axis in the plane `z = z`.
pub fn circle_wire(radius: f64, z: f64) -> Wire {
    let v = builder::vertex(Point3::new(radius, 0.0, z));
    builder::rsweep(&v, Point3::new(0.0, 0.0, z), Vector3::unit_z(), Rad(TAU))
}

/// Planar face bounded by a closed polygon.
pub fn polygon_face(points: &[[f64; 2]], z: f64) -> Result<Face, KernelError> {
    let wire = polygon_wire(points, z)?;
    builder::try_attach_plane(&[wire]).map_err(|e| KernelError::InvalidProfile {
        reason: format!("failed to create planar face: {}", e),
    })
}

/// Planar annulus about the Z axis. The inner circle is reversed so it bounds a hole.
pub fn annulus_face(outer_radius: f64, inner_radius: f64, z: f64) -> Result<Face, KernelError> {
    if !(inner_radius > 0.0 && outer_radius > inner_radius && outer_radius.is_finite()) {
        return Err(KernelError::InvalidProfile {
            reason: format!(
                "annulus needs 0 < inner < outer, got inner {} outer {}",
                inner_radius, outer_radius
            ),
        });
    }
    let outer = circle_wire(outer_radius, z);
    let inner = circle_wire(inner_radius, z).inverse();
    builder::try_attach_plane(&[outer, inner]).map_err(|e| KernelError::InvalidProfile {
        reason: format!("failed to create annular face: {}", e),
    })
}
