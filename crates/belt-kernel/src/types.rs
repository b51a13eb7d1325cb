use serde::{Deserialize, Serialize};

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the kernel session that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Transient identifier of a standalone planar face awaiting extrusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KernelId(pub u64);

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("transform failed: {reason}")]
    TransformFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("STEP serialization failed: {reason}")]
    StepFailed { reason: String },

    #[error("face not found: {id:?}")]
    FaceNotFound { id: KernelId },

    #[error("solid not found: handle {handle}")]
    SolidNotFound { handle: u64 },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

impl KernelError {
    pub(crate) fn missing(handle: &KernelSolidHandle) -> Self {
        KernelError::SolidNotFound {
            handle: handle.id(),
        }
    }
}

/// Tessellated triangle mesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals, same layout as `vertices`. May be empty.
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounds of the vertices referenced by triangles, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut points = self.indices.iter().filter_map(|&i| {
            let i = i as usize * 3;
            self.vertices
                .get(i..i + 3)
                .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])])
        });
        let first = points.next()?;
        Some(points.fold(Aabb::point(first), |acc, p| acc.include(p)))
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub fn point(p: [f64; 3]) -> Self {
        Self { min: p, max: p }
    }

    pub fn include(self, p: [f64; 3]) -> Self {
        let mut out = self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(p[i]);
            out.max[i] = out.max[i].max(p[i]);
        }
        out
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.max[0] + self.min[0]) / 2.0,
            (self.max[1] + self.min[1]) / 2.0,
            (self.max[2] + self.min[2]) / 2.0,
        ]
    }

    /// True if every corner of `other` is within `tolerance` of the matching corner.
    pub fn approx_eq(&self, other: &Aabb, tolerance: f64) -> bool {
        (0..3).all(|i| {
            (self.min[i] - other.min[i]).abs() <= tolerance
                && (self.max[i] - other.max[i]).abs() <= tolerance
        })
    }
}
