//! MockKernel: deterministic test double implementing Kernel.
//!
//! Solids are kept as lists of analytic primitives instead of a B-rep: a union
//! concatenates primitive lists and a subtraction records the subtrahend's
//! material as voids. That is enough to count cuts, check transforms and
//! produce exact bounding boxes, and it never fails unless told to.

use crate::traits::Kernel;
use crate::types::*;
use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

/// Kernel operation kinds, for the op log and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOpKind {
    MakeFace,
    Extrude,
    Rotate,
    Scale,
    Union,
    Subtract,
    Tessellate,
    ExportStep,
}

/// One recorded kernel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockOp {
    pub kind: MockOpKind,
    /// Primitive count of each solid operand, in argument order.
    pub operand_sizes: Vec<usize>,
}

/// A standalone planar face awaiting extrude.
#[derive(Debug, Clone)]
enum MockFace {
    Polygon(Vec<[f64; 3]>),
    Annulus { outer: f64, inner: f64, z: f64 },
}

/// An extruded primitive.
#[derive(Debug, Clone)]
enum MockPrimitive {
    /// Straight prism: `top[i]` is `bottom[i]` swept by the extrude vector.
    Prism {
        bottom: Vec<[f64; 3]>,
        top: Vec<[f64; 3]>,
    },
    /// Annular ring about the Z axis.
    Ring {
        outer: f64,
        inner: f64,
        z0: f64,
        z1: f64,
    },
}

impl MockPrimitive {
    fn centroid(&self) -> [f64; 3] {
        match self {
            MockPrimitive::Prism { bottom, top } => {
                let n = (bottom.len() + top.len()) as f64;
                let mut c = [0.0; 3];
                for p in bottom.iter().chain(top) {
                    for i in 0..3 {
                        c[i] += p[i] / n;
                    }
                }
                c
            }
            MockPrimitive::Ring { z0, z1, .. } => [0.0, 0.0, (z0 + z1) / 2.0],
        }
    }

    /// Points whose bounding box is the primitive's bounding box.
    fn extreme_points(&self) -> Vec<[f64; 3]> {
        match self {
            MockPrimitive::Prism { bottom, top } => bottom.iter().chain(top).copied().collect(),
            MockPrimitive::Ring { outer, z0, z1, .. } => [*z0, *z1]
                .iter()
                .flat_map(|&z| {
                    [
                        [*outer, 0.0, z],
                        [0.0, *outer, z],
                        [-*outer, 0.0, z],
                        [0.0, -*outer, z],
                    ]
                })
                .collect(),
        }
    }
}

/// A synthetic solid: material minus voids.
#[derive(Debug, Clone, Default)]
struct MockSolid {
    material: Vec<MockPrimitive>,
    voids: Vec<MockPrimitive>,
}

impl MockSolid {
    fn size(&self) -> usize {
        self.material.len() + self.voids.len()
    }

    fn transform(
        &self,
        point: impl Fn([f64; 3]) -> [f64; 3],
        ring: impl Fn(&MockPrimitive) -> Result<MockPrimitive, KernelError>,
    ) -> Result<MockSolid, KernelError> {
        let map = |p: &MockPrimitive| -> Result<MockPrimitive, KernelError> {
            match p {
                MockPrimitive::Prism { bottom, top } => Ok(MockPrimitive::Prism {
                    bottom: bottom.iter().map(|&q| point(q)).collect(),
                    top: top.iter().map(|&q| point(q)).collect(),
                }),
                MockPrimitive::Ring { .. } => ring(p),
            }
        };
        Ok(MockSolid {
            material: self.material.iter().map(&map).collect::<Result<_, _>>()?,
            voids: self.voids.iter().map(&map).collect::<Result<_, _>>()?,
        })
    }
}

/// Deterministic test double for the geometry kernel.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    standalone_faces: HashMap<u64, MockFace>,
    ops: Vec<MockOp>,
    op_counts: HashMap<MockOpKind, usize>,
    /// Fail the nth (1-based) call of the given kind.
    fail_at: Option<(MockOpKind, usize)>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            solids: HashMap::new(),
            standalone_faces: HashMap::new(),
            ops: Vec::new(),
            op_counts: HashMap::new(),
            fail_at: None,
        }
    }

    /// Make the `nth` (1-based) call of `kind` fail with a kernel error.
    pub fn fail_on(&mut self, kind: MockOpKind, nth: usize) {
        self.fail_at = Some((kind, nth));
    }

    /// Every kernel call made so far, in order.
    pub fn ops(&self) -> &[MockOp] {
        &self.ops
    }

    pub fn count(&self, kind: MockOpKind) -> usize {
        self.op_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Centroids of every void cut into a solid.
    pub fn void_centroids(&self, solid: &KernelSolidHandle) -> Result<Vec<[f64; 3]>, KernelError> {
        Ok(self.get(solid)?.voids.iter().map(MockPrimitive::centroid).collect())
    }

    /// Number of material primitives in a solid.
    pub fn material_count(&self, solid: &KernelSolidHandle) -> Result<usize, KernelError> {
        Ok(self.get(solid)?.material.len())
    }

    /// Exact bounding box of a solid's material.
    pub fn bounds(&self, solid: &KernelSolidHandle) -> Result<Option<Aabb>, KernelError> {
        let mut points = self
            .get(solid)?
            .material
            .iter()
            .flat_map(MockPrimitive::extreme_points);
        Ok(points
            .next()
            .map(|first| points.fold(Aabb::point(first), Aabb::include)))
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn get(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or_else(|| KernelError::missing(handle))
    }

    fn store(&mut self, solid: MockSolid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    /// Log a call and apply failure injection.
    fn record(&mut self, kind: MockOpKind, operand_sizes: Vec<usize>) -> Result<(), KernelError> {
        let count = self.op_counts.entry(kind).or_insert(0);
        *count += 1;
        let nth = *count;
        self.ops.push(MockOp {
            kind,
            operand_sizes,
        });

        if self.fail_at == Some((kind, nth)) {
            let reason = format!("injected failure on {:?} #{}", kind, nth);
            return Err(match kind {
                MockOpKind::Union | MockOpKind::Subtract => KernelError::BooleanFailed { reason },
                MockOpKind::Rotate | MockOpKind::Scale => KernelError::TransformFailed { reason },
                MockOpKind::Tessellate => KernelError::TessellationFailed { reason },
                MockOpKind::ExportStep => KernelError::StepFailed { reason },
                MockOpKind::MakeFace | MockOpKind::Extrude => KernelError::Other { message: reason },
            });
        }
        Ok(())
    }

    /// Polygonal approximation of a ring, with a vertex at every quarter turn.
    fn tessellate_ring(
        mesh: &mut RenderMesh,
        outer: f64,
        inner: f64,
        z0: f64,
        z1: f64,
        tolerance: f64,
    ) {
        let ratio = (1.0 - tolerance / outer).clamp(-1.0, 1.0);
        let segments = (PI / ratio.acos()).ceil().clamp(8.0, 4096.0) as u32;
        let segments = segments.div_ceil(4) * 4;

        let base = (mesh.vertices.len() / 3) as u32;
        for k in 0..segments {
            let theta = TAU * f64::from(k) / f64::from(segments);
            let (s, c) = theta.sin_cos();
            for (r, z) in [(outer, z0), (outer, z1), (inner, z0), (inner, z1)] {
                mesh.vertices
                    .extend([(r * c) as f32, (r * s) as f32, z as f32]);
            }
        }

        // Per segment k: 0 outer-bottom, 1 outer-top, 2 inner-bottom, 3 inner-top.
        let v = |k: u32, corner: u32| base + (k % segments) * 4 + corner;
        for k in 0..segments {
            let n = k + 1;
            mesh.indices.extend([v(k, 0), v(n, 0), v(n, 1), v(k, 0), v(n, 1), v(k, 1)]);
            mesh.indices.extend([v(k, 2), v(k, 3), v(n, 3), v(k, 2), v(n, 3), v(n, 2)]);
            mesh.indices.extend([v(k, 1), v(n, 1), v(n, 3), v(k, 1), v(n, 3), v(k, 3)]);
            mesh.indices.extend([v(k, 0), v(k, 2), v(n, 2), v(k, 0), v(n, 2), v(n, 0)]);
        }
    }

    fn tessellate_prism(mesh: &mut RenderMesh, bottom: &[[f64; 3]], top: &[[f64; 3]]) {
        let n = bottom.len() as u32;
        let base = (mesh.vertices.len() / 3) as u32;
        for p in bottom.iter().chain(top) {
            mesh.vertices.extend([p[0] as f32, p[1] as f32, p[2] as f32]);
        }
        for i in 1..n.saturating_sub(1) {
            mesh.indices.extend([base, base + i + 1, base + i]);
            mesh.indices.extend([base + n, base + n + i, base + n + i + 1]);
        }
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.indices
                .extend([base + i, base + j, base + n + j, base + i, base + n + j, base + n + i]);
        }
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn rotate_point(p: [f64; 3], origin: [f64; 3], axis: [f64; 3], angle: f64) -> [f64; 3] {
    // Rodrigues' rotation formula; `axis` is unit length.
    let v = [p[0] - origin[0], p[1] - origin[1], p[2] - origin[2]];
    let (s, c) = angle.sin_cos();
    let k_x_v = cross(axis, v);
    let k_dot_v = axis[0] * v[0] + axis[1] * v[1] + axis[2] * v[2];
    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = origin[i] + v[i] * c + k_x_v[i] * s + axis[i] * k_dot_v * (1.0 - c);
    }
    out
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f64; 3], what: &str) -> Result<[f64; 3], KernelError> {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if !(len > 1e-12) {
        return Err(KernelError::TransformFailed {
            reason: format!("{} has zero length", what),
        });
    }
    Ok([v[0] / len, v[1] / len, v[2] / len])
}

fn is_z_axis(origin: [f64; 3], axis: [f64; 3]) -> bool {
    origin[0].abs() < 1e-12 && origin[1].abs() < 1e-12 && axis[0].abs() < 1e-12 && axis[1].abs() < 1e-12
}

impl Kernel for MockKernel {
    fn make_polygon_face(&mut self, outline: &[[f64; 2]], z: f64) -> Result<KernelId, KernelError> {
        self.record(MockOpKind::MakeFace, Vec::new())?;
        if outline.len() < 3 {
            return Err(KernelError::InvalidProfile {
                reason: format!("polygon has {} points, need at least 3", outline.len()),
            });
        }
        let id = self.alloc_id();
        let points = outline.iter().map(|p| [p[0], p[1], z]).collect();
        self.standalone_faces.insert(id.0, MockFace::Polygon(points));
        Ok(id)
    }

    fn make_annulus_face(
        &mut self,
        outer_radius: f64,
        inner_radius: f64,
        z: f64,
    ) -> Result<KernelId, KernelError> {
        self.record(MockOpKind::MakeFace, Vec::new())?;
        if !(inner_radius > 0.0 && outer_radius > inner_radius) {
            return Err(KernelError::InvalidProfile {
                reason: format!(
                    "annulus needs 0 < inner < outer, got inner {} outer {}",
                    inner_radius, outer_radius
                ),
            });
        }
        let id = self.alloc_id();
        self.standalone_faces.insert(
            id.0,
            MockFace::Annulus {
                outer: outer_radius,
                inner: inner_radius,
                z,
            },
        );
        Ok(id)
    }

    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOpKind::Extrude, Vec::new())?;
        let mock_face = self
            .standalone_faces
            .remove(&face.0)
            .ok_or(KernelError::FaceNotFound { id: face })?;
        let dir = normalize(direction, "extrude direction")?;
        let sweep = [dir[0] * depth, dir[1] * depth, dir[2] * depth];

        let primitive = match mock_face {
            MockFace::Polygon(bottom) => {
                let top = bottom
                    .iter()
                    .map(|p| [p[0] + sweep[0], p[1] + sweep[1], p[2] + sweep[2]])
                    .collect();
                MockPrimitive::Prism { bottom, top }
            }
            MockFace::Annulus { outer, inner, z } => {
                if sweep[0].abs() > 1e-12 || sweep[1].abs() > 1e-12 {
                    return Err(KernelError::NotSupported {
                        operation: "oblique ring extrude".to_string(),
                    });
                }
                let (z0, z1) = if sweep[2] >= 0.0 {
                    (z, z + sweep[2])
                } else {
                    (z + sweep[2], z)
                };
                MockPrimitive::Ring {
                    outer,
                    inner,
                    z0,
                    z1,
                }
            }
        };

        Ok(self.store(MockSolid {
            material: vec![primitive],
            voids: Vec::new(),
        }))
    }

    fn rotate(
        &mut self,
        solid: &KernelSolidHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        angle: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let size = self.get(solid)?.size();
        self.record(MockOpKind::Rotate, vec![size])?;
        let axis = normalize(axis_direction, "rotation axis")?;
        let on_z = is_z_axis(axis_origin, axis);

        let rotated = self.get(solid)?.transform(
            |p| rotate_point(p, axis_origin, axis, angle),
            |ring| {
                if on_z {
                    Ok(ring.clone())
                } else {
                    Err(KernelError::NotSupported {
                        operation: "ring rotation off the Z axis".to_string(),
                    })
                }
            },
        )?;
        Ok(self.store(rotated))
    }

    fn scale(
        &mut self,
        solid: &KernelSolidHandle,
        origin: [f64; 3],
        factor: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let size = self.get(solid)?.size();
        self.record(MockOpKind::Scale, vec![size])?;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(KernelError::TransformFailed {
                reason: format!("scale factor must be positive, got {}", factor),
            });
        }
        let on_z = is_z_axis(origin, [0.0, 0.0, 1.0]);
        let scale = |p: [f64; 3]| {
            [
                origin[0] + (p[0] - origin[0]) * factor,
                origin[1] + (p[1] - origin[1]) * factor,
                origin[2] + (p[2] - origin[2]) * factor,
            ]
        };

        let scaled = self.get(solid)?.transform(scale, |ring| match ring {
            MockPrimitive::Ring {
                outer,
                inner,
                z0,
                z1,
            } if on_z => Ok(MockPrimitive::Ring {
                outer: outer * factor,
                inner: inner * factor,
                z0: origin[2] + (z0 - origin[2]) * factor,
                z1: origin[2] + (z1 - origin[2]) * factor,
            }),
            _ => Err(KernelError::NotSupported {
                operation: "ring scale about a point off the Z axis".to_string(),
            }),
        })?;
        Ok(self.store(scaled))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let sizes = vec![self.get(a)?.size(), self.get(b)?.size()];
        self.record(MockOpKind::Union, sizes)?;

        let mut merged = self.get(a)?.clone();
        let solid_b = self.get(b)?;
        merged.material.extend(solid_b.material.iter().cloned());
        merged.voids.extend(solid_b.voids.iter().cloned());
        Ok(self.store(merged))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let sizes = vec![self.get(a)?.size(), self.get(b)?.size()];
        self.record(MockOpKind::Subtract, sizes)?;

        let mut result = self.get(a)?.clone();
        let solid_b = self.get(b)?;
        result.voids.extend(solid_b.material.iter().cloned());
        Ok(self.store(result))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        let size = self.get(solid)?.size();
        self.record(MockOpKind::Tessellate, vec![size])?;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(KernelError::TessellationFailed {
                reason: format!("tolerance must be positive, got {}", tolerance),
            });
        }

        let mut mesh = RenderMesh::default();
        for primitive in &self.get(solid)?.material {
            match primitive {
                MockPrimitive::Prism { bottom, top } => Self::tessellate_prism(&mut mesh, bottom, top),
                MockPrimitive::Ring {
                    outer,
                    inner,
                    z0,
                    z1,
                } => Self::tessellate_ring(&mut mesh, *outer, *inner, *z0, *z1, tolerance),
            }
        }
        Ok(mesh)
    }

    fn export_step(&mut self, solid: &KernelSolidHandle, file_name: &str) -> Result<String, KernelError> {
        let size = self.get(solid)?.size();
        self.record(MockOpKind::ExportStep, vec![size])?;
        let s = self.get(solid)?;

        let mut out = String::new();
        out.push_str("ISO-10303-21;\nHEADER;\n");
        out.push_str("FILE_DESCRIPTION(('MockKernel solid'),'2;1');\n");
        out.push_str(&format!(
            "FILE_NAME('{}','',(''),(''),'','MockKernel','');\n",
            file_name
        ));
        out.push_str("FILE_SCHEMA(('CONFIG_CONTROL_DESIGN'));\nENDSEC;\nDATA;\n");
        out.push_str(&format!("/* material: {} voids: {} */\n", s.material.len(), s.voids.len()));
        let points = s.material.iter().flat_map(MockPrimitive::extreme_points);
        for (i, p) in points.enumerate() {
            out.push_str(&format!(
                "#{} = CARTESIAN_POINT('', ({:?}, {:?}, {:?}));\n",
                i + 1,
                p[0],
                p[1],
                p[2]
            ));
        }
        out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        Ok(out)
    }

    fn release(&mut self, solid: KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }

    fn live_solids(&self) -> usize {
        self.solids.len()
    }
}
