//! Tessellation wrapper.
//!
//! Wraps truck-meshalgo to produce a flat RenderMesh suitable for STL output.

use crate::types::*;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;

type TruckSolid = truck_modeling::Solid;

/// Tessellate a truck Solid into a RenderMesh.
///
/// Faces are meshed individually so inverted faces can have their triangle
/// winding flipped before they are appended.
pub fn tessellate_solid(
    solid: &TruckSolid,
    tolerance: f64,
) -> std::result::Result<RenderMesh, KernelError> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(KernelError::TessellationFailed {
            reason: format!("tolerance must be positive, got {}", tolerance),
        });
    }

    let meshed_solid = solid.triangulation(tolerance);

    let mut all_vertices: Vec<f32> = Vec::new();
    let mut all_normals: Vec<f32> = Vec::new();
    let mut all_indices: Vec<u32> = Vec::new();
    let mut skipped_faces = 0usize;

    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            // Each meshed face's surface is Option<PolygonMesh>
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                skipped_faces += 1;
                continue;
            };

            // If face is inverted, the mesh needs inversion too
            let face_mesh = if !face.orientation() {
                let mut m = face_mesh;
                m.invert();
                m
            } else {
                face_mesh
            };

            let base_vertex = (all_vertices.len() / 3) as u32;

            let positions = face_mesh.positions();
            let normals = face_mesh.normals();

            for pos in positions {
                all_vertices.push(pos[0] as f32);
                all_vertices.push(pos[1] as f32);
                all_vertices.push(pos[2] as f32);
            }

            if normals.len() == positions.len() {
                for norm in normals {
                    all_normals.push(norm[0] as f32);
                    all_normals.push(norm[1] as f32);
                    all_normals.push(norm[2] as f32);
                }
            }

            for tri in face_mesh.tri_faces() {
                for v in tri.iter() {
                    all_indices.push(v.pos as u32 + base_vertex);
                }
            }
            for quad in face_mesh.quad_faces() {
                for k in [0, 1, 2, 0, 2, 3] {
                    all_indices.push(quad[k].pos as u32 + base_vertex);
                }
            }
        }
    }

    if skipped_faces > 0 {
        tracing::warn!(skipped_faces, "some faces could not be meshed individually");
    }

    // Fallback if nothing was tessellated
    if all_indices.is_empty() {
        return tessellate_solid_merged(solid, tolerance);
    }

    // Normals are only kept if every face supplied them.
    if all_normals.len() != all_vertices.len() {
        all_normals.clear();
    }

    Ok(RenderMesh {
        vertices: all_vertices,
        normals: all_normals,
        indices: all_indices,
    })
}

/// Fallback tessellation: merge everything into a single PolygonMesh.
fn tessellate_solid_merged(
    solid: &TruckSolid,
    tolerance: f64,
) -> std::result::Result<RenderMesh, KernelError> {
    use truck_meshalgo::tessellation::MeshedShape;

    let meshed = solid.triangulation(tolerance);
    let mesh = meshed.to_polygon();

    let positions = mesh.positions();
    let tri_faces = mesh.tri_faces();
    if tri_faces.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "solid produced no triangles".to_string(),
        });
    }

    let mut vertices = Vec::with_capacity(positions.len() * 3);
    let mut indices = Vec::with_capacity(tri_faces.len() * 3);

    for pos in positions {
        vertices.push(pos[0] as f32);
        vertices.push(pos[1] as f32);
        vertices.push(pos[2] as f32);
    }

    for tri in tri_faces {
        for v in tri.iter() {
            indices.push(v.pos as u32);
        }
    }

    Ok(RenderMesh {
        vertices,
        normals: Vec::new(),
        indices,
    })
}
