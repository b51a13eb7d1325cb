//! Drives a [`Kernel`] session through the belt construction sequence:
//! ring, tooth void, rotated copies unioned in batches, cut, scale.

use std::time::Instant;

use belt_kernel::{Kernel, KernelError, KernelSolidHandle};
use belt_types::BeltSpecification;
use tracing::{debug, info, instrument};

use crate::profile::build_tooth_void_profile;
use crate::types::{
    AtStep, BeltSolidModel, BuildError, BuildOptions, BuildStats, BuildStep,
    GeometryConstructionError,
};

const ORIGIN: [f64; 3] = [0.0, 0.0, 0.0];
const Z_AXIS: [f64; 3] = [0.0, 0.0, 1.0];

/// Builds belt solids on a borrowed kernel session.
///
/// Intermediate solids are released as soon as they are consumed, and any
/// left over when a build fails are released before the error is returned.
/// After a successful [`build_belt`](Self::build_belt) the session holds only
/// the finished solid (plus whatever it held before).
pub struct BeltModelBuilder<'k, K: Kernel + ?Sized> {
    kernel: &'k mut K,
    options: BuildOptions,
    scratch: Vec<KernelSolidHandle>,
    stats: BuildStats,
}

impl<'k, K: Kernel + ?Sized> BeltModelBuilder<'k, K> {
    pub fn new(kernel: &'k mut K) -> Self {
        Self::with_options(kernel, BuildOptions::default())
    }

    pub fn with_options(kernel: &'k mut K, options: BuildOptions) -> Self {
        Self {
            kernel,
            options,
            scratch: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Annular ring between the inner wall and the pitch circle, extruded
    /// `width` along +Z from `z = 0`.
    #[instrument(skip_all, fields(outer = spec.pitch_radius(), inner = spec.inner_radius()))]
    pub fn build_base_ring(
        &mut self,
        spec: &BeltSpecification,
    ) -> Result<KernelSolidHandle, GeometryConstructionError> {
        let face = self
            .kernel
            .make_annulus_face(spec.pitch_radius(), spec.inner_radius(), 0.0)
            .at(BuildStep::BaseRing)?;
        self.kernel
            .extrude_face(face, Z_AXIS, spec.width())
            .at(BuildStep::BaseRing)
    }

    /// One tooth void at angle zero. It runs `extra_depth` past both faces
    /// of the ring so the cut never leaves a face coplanar with the ring's.
    pub fn build_tooth_void(
        &mut self,
        spec: &BeltSpecification,
    ) -> Result<KernelSolidHandle, GeometryConstructionError> {
        let outline = build_tooth_void_profile(spec);
        let margin = spec.profile().extra_depth;
        let face = self
            .kernel
            .make_polygon_face(&outline, -margin)
            .at(BuildStep::ToothVoid)?;
        self.kernel
            .extrude_face(face, Z_AXIS, spec.width() + 2.0 * margin)
            .at(BuildStep::ToothVoid)
    }

    /// Build the finished belt solid for `spec`.
    ///
    /// The specification is re-validated first. Kernel failures come back as
    /// [`BuildError::Geometry`] tagged with the step that failed; nothing is
    /// left half-built in the session.
    #[instrument(skip_all, fields(num_teeth = spec.num_teeth(), length_mm = spec.length_mm()))]
    pub fn build_belt(&mut self, spec: &BeltSpecification) -> Result<BeltSolidModel, BuildError> {
        spec.validate()?;

        self.stats = BuildStats::default();
        let started = Instant::now();
        let result = self.construct(spec);
        self.release_scratch();
        let handle = result?;

        let mut stats = std::mem::take(&mut self.stats);
        stats.kernel_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            batches = stats.batches,
            unions = stats.unions,
            kernel_time_ms = stats.kernel_time_ms,
            "belt solid built"
        );
        Ok(BeltSolidModel::new(handle, spec.clone(), stats))
    }

    fn construct(
        &mut self,
        spec: &BeltSpecification,
    ) -> Result<KernelSolidHandle, GeometryConstructionError> {
        let ring = self.build_base_ring(spec)?;
        let ring = self.track(ring);
        let tooth = self.build_tooth_void(spec)?;
        let tooth = self.track(tooth);

        let teeth = self.union_teeth(spec, &tooth)?;
        self.retire(tooth);

        let belt = self
            .kernel
            .boolean_subtract(&ring, &teeth)
            .at(BuildStep::Cut)?;
        let belt = self.track(belt);
        self.retire(ring);
        self.retire(teeth);
        debug!("teeth cut from ring");

        let factor = spec.scale_factor();
        let belt = if (factor - 1.0).abs() > f64::EPSILON {
            let scaled = self
                .kernel
                .scale(&belt, ORIGIN, factor)
                .at(BuildStep::Scale)?;
            let scaled = self.track(scaled);
            self.retire(belt);
            debug!(factor, "belt scaled about origin");
            scaled
        } else {
            belt
        };

        self.untrack(&belt);
        Ok(belt)
    }

    /// Union of every rotated copy of `tooth`. Teeth are unioned a batch at a
    /// time and each batch is merged into the running total, so no single
    /// boolean sees more than one batch of new geometry.
    fn union_teeth(
        &mut self,
        spec: &BeltSpecification,
        tooth: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, GeometryConstructionError> {
        let num_teeth = spec.num_teeth();
        let batch_size = self.options.batch_size.get();
        let batch_len = u32::try_from(batch_size).unwrap_or(u32::MAX);

        let mut total: Option<KernelSolidHandle> = None;
        for (batch, start) in (0..num_teeth).step_by(batch_size).enumerate() {
            let end = start.saturating_add(batch_len).min(num_teeth);

            let mut partial: Option<KernelSolidHandle> = None;
            for index in start..end {
                let rotated = self
                    .kernel
                    .rotate(tooth, ORIGIN, Z_AXIS, spec.tooth_angle(index))
                    .at(BuildStep::RotateTooth { index })?;
                let rotated = self.track(rotated);
                partial = Some(self.union_into(partial, rotated, BuildStep::UnionBatch { batch })?);
            }

            if let Some(partial) = partial {
                total = Some(self.union_into(total, partial, BuildStep::MergeBatch { batch })?);
                self.stats.batches += 1;
                debug!(batch, teeth_done = end, "tooth batch merged");
            }
        }

        total.ok_or_else(|| GeometryConstructionError {
            step: BuildStep::UnionBatch { batch: 0 },
            source: KernelError::Other {
                message: "belt has no teeth".to_string(),
            },
        })
    }

    /// Union `next` into `acc`, releasing both operands.
    fn union_into(
        &mut self,
        acc: Option<KernelSolidHandle>,
        next: KernelSolidHandle,
        step: BuildStep,
    ) -> Result<KernelSolidHandle, GeometryConstructionError> {
        let Some(acc) = acc else {
            return Ok(next);
        };
        let merged = self.kernel.boolean_union(&acc, &next).at(step)?;
        let merged = self.track(merged);
        self.stats.unions += 1;
        self.retire(acc);
        self.retire(next);
        Ok(merged)
    }

    fn track(&mut self, handle: KernelSolidHandle) -> KernelSolidHandle {
        self.scratch.push(handle.clone());
        handle
    }

    fn untrack(&mut self, handle: &KernelSolidHandle) {
        self.scratch.retain(|h| h != handle);
    }

    fn retire(&mut self, handle: KernelSolidHandle) {
        self.untrack(&handle);
        self.kernel.release(handle);
    }

    fn release_scratch(&mut self) {
        for handle in std::mem::take(&mut self.scratch) {
            self.kernel.release(handle);
        }
    }
}
