//! TruckKernel: the real geometry kernel, backed by truck.

use crate::primitives;
use crate::tessellation;
use crate::traits::Kernel;
use crate::types::*;
use std::collections::HashMap;

// Import truck types selectively to avoid shadowing std::result::Result
use truck_modeling::builder;
use truck_modeling::topology::{Face, Solid};
use truck_modeling::{InnerSpace, Point3, Rad, Vector3};
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel};

/// Tolerance handed to truck's boolean operations.
pub const DEFAULT_BOOLEAN_TOLERANCE: f64 = 0.05;

/// Real geometry kernel backed by the truck BREP library.
///
/// One value is one kernel session. Sessions share no state, so independent
/// belts can be built on separate threads with one kernel each.
pub struct TruckKernel {
    next_handle: u64,
    next_id: u64,
    boolean_tolerance: f64,
    solids: HashMap<u64, Solid>,
    /// Standalone faces awaiting extrude.
    standalone_faces: HashMap<u64, Face>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_BOOLEAN_TOLERANCE)
    }

    pub fn with_tolerance(boolean_tolerance: f64) -> Self {
        Self {
            next_handle: 1,
            next_id: 1,
            boolean_tolerance,
            solids: HashMap::new(),
            standalone_faces: HashMap::new(),
        }
    }

    pub fn boolean_tolerance(&self) -> f64 {
        self.boolean_tolerance
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn store_face(&mut self, face: Face) -> KernelId {
        let id = self.alloc_id();
        self.standalone_faces.insert(id.0, face);
        id
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Result<&Solid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or_else(|| KernelError::missing(handle))
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn unit_vector(v: [f64; 3], what: &str) -> Result<Vector3, KernelError> {
    let v = Vector3::new(v[0], v[1], v[2]);
    if !(v.magnitude() > 1e-12) {
        return Err(KernelError::TransformFailed {
            reason: format!("{} has zero length", what),
        });
    }
    Ok(v.normalize())
}

impl Kernel for TruckKernel {
    fn make_polygon_face(&mut self, outline: &[[f64; 2]], z: f64) -> Result<KernelId, KernelError> {
        let face = primitives::polygon_face(outline, z)?;
        Ok(self.store_face(face))
    }

    fn make_annulus_face(
        &mut self,
        outer_radius: f64,
        inner_radius: f64,
        z: f64,
    ) -> Result<KernelId, KernelError> {
        let face = primitives::annulus_face(outer_radius, inner_radius, z)?;
        Ok(self.store_face(face))
    }

    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let truck_face = self
            .standalone_faces
            .remove(&face.0)
            .ok_or(KernelError::FaceNotFound { id: face })?;

        if !(depth.is_finite() && depth > 0.0) {
            return Err(KernelError::Other {
                message: format!("extrude depth must be positive, got {}", depth),
            });
        }
        let sweep_vec = unit_vector(direction, "extrude direction")? * depth;

        let solid = builder::tsweep(&truck_face, sweep_vec);
        Ok(self.store_solid(solid))
    }

    fn rotate(
        &mut self,
        solid: &KernelSolidHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        angle: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let axis = unit_vector(axis_direction, "rotation axis")?;
        let origin = Point3::new(axis_origin[0], axis_origin[1], axis_origin[2]);
        let rotated = builder::rotated(self.get_solid(solid)?, origin, axis, Rad(angle));
        Ok(self.store_solid(rotated))
    }

    fn scale(
        &mut self,
        solid: &KernelSolidHandle,
        origin: [f64; 3],
        factor: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(KernelError::TransformFailed {
                reason: format!("scale factor must be positive, got {}", factor),
            });
        }
        let origin = Point3::new(origin[0], origin[1], origin[2]);
        let scaled = builder::scaled(
            self.get_solid(solid)?,
            origin,
            Vector3::new(factor, factor, factor),
        );
        Ok(self.store_solid(scaled))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.get_solid(a)?;
        let solid_b = self.get_solid(b)?;

        let result = truck_shapeops::or(solid_a, solid_b, self.boolean_tolerance).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck or() returned None".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.get_solid(a)?;
        let mut solid_b = self.get_solid(b)?.clone();

        // Subtraction = A ∩ ¬B. not() mutates in place.
        solid_b.not();
        let result =
            truck_shapeops::and(solid_a, &solid_b, self.boolean_tolerance).ok_or_else(|| {
                KernelError::BooleanFailed {
                    reason: "truck and() returned None for subtraction".to_string(),
                }
            })?;
        Ok(self.store_solid(result))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        tessellation::tessellate_solid(self.get_solid(solid)?, tolerance)
    }

    fn export_step(&mut self, solid: &KernelSolidHandle, file_name: &str) -> Result<String, KernelError> {
        let compressed = self.get_solid(solid)?.compress();
        let header = StepHeaderDescriptor {
            file_name: file_name.to_string(),
            organization_system: "s3m-belt".to_string(),
            ..Default::default()
        };
        let step = CompleteStepDisplay::new(StepModel::from(&compressed), header).to_string();
        if step.is_empty() {
            return Err(KernelError::StepFailed {
                reason: "empty STEP document".to_string(),
            });
        }
        Ok(step)
    }

    fn release(&mut self, solid: KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }

    fn live_solids(&self) -> usize {
        self.solids.len()
    }
}
