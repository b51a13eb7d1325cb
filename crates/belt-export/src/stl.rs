//! STL encoding of a [`RenderMesh`], binary and ASCII.
//!
//! Facet normals are recomputed from vertex winding rather than taken from
//! the mesh, so both encodings agree even when the kernel supplied none.

use belt_kernel::RenderMesh;

/// Reasons a mesh cannot be written as STL.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StlError {
    #[error("mesh has no triangles")]
    Empty,

    #[error("index {index} out of range (vertex count = {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("index count {0} is not a multiple of 3")]
    Ragged(usize),
}

/// One triangle with its unit normal.
struct Facet {
    normal: [f32; 3],
    corners: [[f32; 3]; 3],
}

fn facets(mesh: &RenderMesh) -> Result<Vec<Facet>, StlError> {
    if mesh.indices.len() % 3 != 0 {
        return Err(StlError::Ragged(mesh.indices.len()));
    }
    if mesh.indices.is_empty() {
        return Err(StlError::Empty);
    }
    let vertex_count = mesh.vertices.len() / 3;
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(StlError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }

    let corner = |i: u32| {
        let at = i as usize * 3;
        [mesh.vertices[at], mesh.vertices[at + 1], mesh.vertices[at + 2]]
    };
    Ok(mesh
        .indices
        .chunks_exact(3)
        .map(|tri| {
            let corners = [corner(tri[0]), corner(tri[1]), corner(tri[2])];
            Facet {
                normal: facet_normal(&corners),
                corners,
            }
        })
        .collect())
}

fn facet_normal([a, b, c]: &[[f32; 3]; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        // Degenerate sliver; readers ignore the stored normal anyway.
        [0.0, 0.0, 1.0]
    }
}

/// Binary STL: 80-byte header, u32 LE triangle count, then 50 bytes per
/// triangle (normal, three corners, zero attribute word).
pub fn binary_stl(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, StlError> {
    let facets = facets(mesh)?;

    let mut buf = Vec::with_capacity(84 + facets.len() * 50);
    let header = format!("binary STL: {}", name);
    buf.extend(header.bytes().take(80));
    buf.resize(80, 0);
    buf.extend_from_slice(&(facets.len() as u32).to_le_bytes());

    for facet in &facets {
        for c in facet.normal.iter().chain(facet.corners.iter().flatten()) {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

/// ASCII STL, one `facet` block per triangle.
pub fn ascii_stl(mesh: &RenderMesh, name: &str) -> Result<String, StlError> {
    use std::fmt::Write;

    let facets = facets(mesh)?;
    let mut out = String::with_capacity(facets.len() * 256);
    // Writing to a String cannot fail.
    let _ = writeln!(out, "solid {}", name);
    for facet in &facets {
        let [nx, ny, nz] = facet.normal;
        let _ = writeln!(out, "  facet normal {:e} {:e} {:e}", nx, ny, nz);
        out.push_str("    outer loop\n");
        for [x, y, z] in facet.corners {
            let _ = writeln!(out, "      vertex {:e} {:e} {:e}", x, y, z);
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    let _ = writeln!(out, "endsolid {}", name);
    Ok(out)
}
