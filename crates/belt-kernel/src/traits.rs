use crate::types::*;

/// Core geometry kernel trait. Provides the shape construction, transform and
/// serialization operations the belt pipeline drives.
/// Implemented by TruckKernel (wraps real truck) and MockKernel (deterministic test double).
///
/// Every operation returns a new handle and leaves its inputs untouched, so a
/// solid can be reused as an operand any number of times until it is released.
pub trait Kernel {
    /// Create a planar face in the plane `z = z` from a closed polygon.
    /// The outline is implicitly closed; do not repeat the first point.
    fn make_polygon_face(&mut self, outline: &[[f64; 2]], z: f64) -> Result<KernelId, KernelError>;

    /// Create a planar annular face centred on the Z axis in the plane `z = z`.
    fn make_annulus_face(
        &mut self,
        outer_radius: f64,
        inner_radius: f64,
        z: f64,
    ) -> Result<KernelId, KernelError>;

    /// Extrude a planar face along a direction vector. Consumes the face.
    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Rigid rotation of a solid about an axis, angle in radians.
    fn rotate(
        &mut self,
        solid: &KernelSolidHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        angle: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Uniform scale of a solid about a point.
    fn scale(
        &mut self,
        solid: &KernelSolidHandle,
        origin: [f64; 3],
        factor: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Tessellate a solid to a triangle mesh.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError>;

    /// Serialize a solid to a STEP document.
    fn export_step(&mut self, solid: &KernelSolidHandle, file_name: &str) -> Result<String, KernelError>;

    /// Drop a solid. Its handle is invalid afterwards.
    fn release(&mut self, solid: KernelSolidHandle);

    /// Number of solids currently held by the session.
    fn live_solids(&self) -> usize;
}
