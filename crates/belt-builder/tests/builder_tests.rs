use std::f64::consts::{FRAC_PI_2, TAU};

use approx::assert_relative_eq;
use belt_builder::{BeltModelBuilder, BuildError, BuildOptions, BuildStep};
use belt_kernel::{Kernel, MockKernel, MockOpKind};
use belt_types::{BeltSpecification, DEFAULT_SCALE_FACTOR, DEFAULT_WIDTH_MM};
use proptest::prelude::*;

fn spec(teeth: u32, scale: f64) -> BeltSpecification {
    BeltSpecification::from_teeth(teeth, DEFAULT_WIDTH_MM, scale).unwrap()
}

fn options(batch_size: usize) -> BuildOptions {
    BuildOptions::with_batch_size(batch_size).unwrap()
}

/// Angle of a void centroid measured from +Y, in [0, 2pi).
fn void_angle(c: [f64; 3]) -> f64 {
    (c[1].atan2(c[0]) - FRAC_PI_2).rem_euclid(TAU)
}

// ── Tooth placement ────────────────────────────────────────────────────────

#[test]
fn seventy_tooth_belt_has_seventy_voids() {
    let mut kernel = MockKernel::new();
    let spec = spec(70, DEFAULT_SCALE_FACTOR);
    let model = BeltModelBuilder::new(&mut kernel).build_belt(&spec).unwrap();

    assert_eq!(kernel.material_count(model.handle()).unwrap(), 1, "One ring");
    assert_eq!(kernel.void_centroids(model.handle()).unwrap().len(), 70);
    assert_eq!(model.spec().num_teeth(), 70);
}

#[test]
fn voids_are_evenly_spaced_in_index_order() {
    let mut kernel = MockKernel::new();
    let spec = spec(37, 1.0);
    let model = BeltModelBuilder::new(&mut kernel).build_belt(&spec).unwrap();
    let centroids = kernel.void_centroids(model.handle()).unwrap();
    assert_eq!(centroids.len(), 37);

    let radius = centroids[0][0].hypot(centroids[0][1]);
    for (i, c) in centroids.iter().enumerate() {
        let expected = spec.tooth_angle(i as u32);
        let actual = void_angle(*c);
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9 || (TAU - diff) < 1e-9,
            "tooth {} at {} rad, expected {}",
            i,
            actual,
            expected
        );
        assert_relative_eq!(c[0].hypot(c[1]), radius, epsilon = 1e-9);
        assert_relative_eq!(c[2], spec.width() / 2.0, epsilon = 1e-9);
    }
}

#[test]
fn first_tooth_sits_on_positive_y() {
    let mut kernel = MockKernel::new();
    let spec = spec(70, 1.0);
    let model = BeltModelBuilder::new(&mut kernel).build_belt(&spec).unwrap();
    let first = kernel.void_centroids(model.handle()).unwrap()[0];
    assert_relative_eq!(first[0], 0.0, epsilon = 1e-12);
    assert!(first[1] > spec.inner_radius() - 1.0 && first[1] < spec.pitch_radius());
}

// ── Operation sequence ─────────────────────────────────────────────────────

#[test]
fn seventy_teeth_in_batches_of_ten() {
    let mut kernel = MockKernel::new();
    let spec = spec(70, DEFAULT_SCALE_FACTOR);
    let model = BeltModelBuilder::new(&mut kernel).build_belt(&spec).unwrap();

    assert_eq!(kernel.count(MockOpKind::Rotate), 70);
    assert_eq!(kernel.count(MockOpKind::Union), 69);
    assert_eq!(kernel.count(MockOpKind::Subtract), 1);
    assert_eq!(kernel.count(MockOpKind::Scale), 1);
    assert_eq!(model.stats().batches, 7);
    assert_eq!(model.stats().unions, 69);

    // Merges are the only unions whose second operand is a whole batch.
    let merges: Vec<_> = kernel
        .ops()
        .iter()
        .filter(|op| op.kind == MockOpKind::Union && op.operand_sizes[1] > 1)
        .collect();
    assert_eq!(merges.len(), 6);
    assert!(merges.iter().all(|op| op.operand_sizes[1] == 10));
}

#[test]
fn unit_scale_skips_scaling() {
    let mut kernel = MockKernel::new();
    BeltModelBuilder::new(&mut kernel)
        .build_belt(&spec(20, 1.0))
        .unwrap();
    assert_eq!(kernel.count(MockOpKind::Scale), 0);
}

#[test]
fn batch_of_one_merges_every_tooth() {
    let mut kernel = MockKernel::new();
    let model = BeltModelBuilder::with_options(&mut kernel, options(1))
        .build_belt(&spec(12, 1.0))
        .unwrap();
    assert_eq!(kernel.count(MockOpKind::Union), 11);
    assert_eq!(model.stats().batches, 12);
}

#[test]
fn batch_larger_than_belt_is_one_batch() {
    let mut kernel = MockKernel::new();
    let model = BeltModelBuilder::with_options(&mut kernel, options(500))
        .build_belt(&spec(15, 1.0))
        .unwrap();
    assert_eq!(kernel.count(MockOpKind::Union), 14);
    assert_eq!(model.stats().batches, 1);
    assert!(kernel
        .ops()
        .iter()
        .filter(|op| op.kind == MockOpKind::Union)
        .all(|op| op.operand_sizes[1] == 1));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn union_count_is_teeth_minus_one(teeth in 10u32..=120, batch in 1usize..=32) {
        let mut kernel = MockKernel::new();
        let model = BeltModelBuilder::with_options(&mut kernel, options(batch))
            .build_belt(&spec(teeth, 1.0))
            .unwrap();

        prop_assert_eq!(kernel.count(MockOpKind::Union), teeth as usize - 1);
        prop_assert_eq!(kernel.count(MockOpKind::Rotate), teeth as usize);
        prop_assert_eq!(model.stats().batches, (teeth as usize).div_ceil(batch));
        prop_assert_eq!(kernel.void_centroids(model.handle()).unwrap().len(), teeth as usize);
        for op in kernel.ops().iter().filter(|op| op.kind == MockOpKind::Union) {
            prop_assert!(op.operand_sizes[1] <= batch);
        }
    }
}

// ── Scaling ────────────────────────────────────────────────────────────────

#[test]
fn unscaled_bounds_match_pitch_circle_and_width() {
    let mut kernel = MockKernel::new();
    let spec = spec(70, 1.0);
    let model = BeltModelBuilder::new(&mut kernel).build_belt(&spec).unwrap();
    let bounds = kernel.bounds(model.handle()).unwrap().unwrap();

    let r = spec.pitch_radius();
    assert_relative_eq!(bounds.min[0], -r, epsilon = 1e-9);
    assert_relative_eq!(bounds.max[1], r, epsilon = 1e-9);
    assert_relative_eq!(bounds.min[2], 0.0, epsilon = 1e-12);
    assert_relative_eq!(bounds.max[2], DEFAULT_WIDTH_MM, epsilon = 1e-12);
}

#[test]
fn scale_grows_bounds_but_not_tooth_count() {
    let mut kernel = MockKernel::new();
    let plain = BeltModelBuilder::new(&mut kernel)
        .build_belt(&spec(70, 1.0))
        .unwrap();
    let scaled = BeltModelBuilder::new(&mut kernel)
        .build_belt(&spec(70, 1.02))
        .unwrap();

    let a = kernel.bounds(plain.handle()).unwrap().unwrap().size();
    let b = kernel.bounds(scaled.handle()).unwrap().unwrap().size();
    for axis in 0..3 {
        assert_relative_eq!(b[axis], a[axis] * 1.02, epsilon = 1e-9);
    }
    assert_eq!(
        kernel.void_centroids(plain.handle()).unwrap().len(),
        kernel.void_centroids(scaled.handle()).unwrap().len()
    );
}

// ── Session hygiene ────────────────────────────────────────────────────────

#[test]
fn only_the_result_stays_alive() {
    let mut kernel = MockKernel::new();
    let first = BeltModelBuilder::new(&mut kernel)
        .build_belt(&spec(30, DEFAULT_SCALE_FACTOR))
        .unwrap();
    assert_eq!(kernel.live_solids(), 1);

    let second = BeltModelBuilder::new(&mut kernel)
        .build_belt(&spec(30, 1.0))
        .unwrap();
    assert_eq!(kernel.live_solids(), 2);

    kernel.release(first.into_handle());
    kernel.release(second.into_handle());
    assert_eq!(kernel.live_solids(), 0);
}

#[test]
fn base_ring_and_tooth_void_are_single_solids() {
    let mut kernel = MockKernel::new();
    let spec = spec(70, 1.0);
    let mut builder = BeltModelBuilder::new(&mut kernel);
    let ring = builder.build_base_ring(&spec).unwrap();
    let tooth = builder.build_tooth_void(&spec).unwrap();

    let ring_bounds = kernel.bounds(&ring).unwrap().unwrap();
    assert_relative_eq!(ring_bounds.max[0], spec.pitch_radius(), epsilon = 1e-12);
    let tooth_bounds = kernel.bounds(&tooth).unwrap().unwrap();
    assert_relative_eq!(tooth_bounds.max[1], spec.inner_radius() + 1.4, epsilon = 1e-12);
    assert_relative_eq!(tooth_bounds.min[1], spec.inner_radius() - 1.0, epsilon = 1e-12);
    assert_eq!(kernel.live_solids(), 2);
}

#[test]
fn tooth_void_passes_through_both_ring_faces() {
    let mut kernel = MockKernel::new();
    let spec = spec(70, 1.0);
    let margin = spec.profile().extra_depth;
    let mut builder = BeltModelBuilder::new(&mut kernel);
    let ring = builder.build_base_ring(&spec).unwrap();
    let tooth = builder.build_tooth_void(&spec).unwrap();

    let ring_bounds = kernel.bounds(&ring).unwrap().unwrap();
    let tooth_bounds = kernel.bounds(&tooth).unwrap().unwrap();
    assert_relative_eq!(tooth_bounds.min[2], ring_bounds.min[2] - margin, epsilon = 1e-12);
    assert_relative_eq!(tooth_bounds.max[2], ring_bounds.max[2] + margin, epsilon = 1e-12);
    assert!(tooth_bounds.min[2] < 0.0 && tooth_bounds.max[2] > spec.width());
}

// ── Failure reporting ──────────────────────────────────────────────────────

fn failing_build(kind: MockOpKind, nth: usize, scale: f64) -> (BuildStep, usize) {
    let mut kernel = MockKernel::new();
    kernel.fail_on(kind, nth);
    let err = BeltModelBuilder::new(&mut kernel)
        .build_belt(&spec(70, scale))
        .unwrap_err();
    match err {
        BuildError::Geometry(e) => (e.step, kernel.live_solids()),
        other => panic!("expected a geometry error, got {:?}", other),
    }
}

#[test]
fn failure_inside_batch_names_the_batch() {
    // Batch 0 issues unions 1..=9, batch 1 issues 10..=18.
    assert_eq!(
        failing_build(MockOpKind::Union, 15, 1.0),
        (BuildStep::UnionBatch { batch: 1 }, 0)
    );
}

#[test]
fn failure_while_merging_names_the_merge() {
    // Union 19 merges batch 1 into batch 0.
    assert_eq!(
        failing_build(MockOpKind::Union, 19, 1.0),
        (BuildStep::MergeBatch { batch: 1 }, 0)
    );
}

#[test]
fn failure_on_rotation_names_the_tooth() {
    assert_eq!(
        failing_build(MockOpKind::Rotate, 3, 1.0),
        (BuildStep::RotateTooth { index: 2 }, 0)
    );
}

#[test]
fn failure_on_cut_and_scale() {
    assert_eq!(failing_build(MockOpKind::Subtract, 1, 1.0), (BuildStep::Cut, 0));
    assert_eq!(
        failing_build(MockOpKind::Scale, 1, DEFAULT_SCALE_FACTOR),
        (BuildStep::Scale, 0)
    );
}

#[test]
fn failure_building_ring() {
    assert_eq!(failing_build(MockOpKind::Extrude, 1, 1.0), (BuildStep::BaseRing, 0));
    assert_eq!(failing_build(MockOpKind::MakeFace, 2, 1.0), (BuildStep::ToothVoid, 0));
}

#[test]
fn geometry_error_message_carries_kernel_reason() {
    let mut kernel = MockKernel::new();
    kernel.fail_on(MockOpKind::Subtract, 1);
    let err = BeltModelBuilder::new(&mut kernel)
        .build_belt(&spec(10, 1.0))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("cutting teeth from ring"), "{}", message);
    assert!(message.contains("injected failure"), "{}", message);
}
