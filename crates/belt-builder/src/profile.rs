//! Cross-section of the material removed for one tooth.
//!
//! Coordinates are in the belt's XY plane with the tooth centred on +Y:
//! x runs tangentially, y radially. The wide edge sits `extra_depth` inside
//! the ring's inner wall so the cut opens cleanly onto the bore, and the
//! narrow edge sits `tooth_height` out into the ring material.

use belt_types::BeltSpecification;

/// Trapezoidal tooth-void outline, counter-clockwise, first point not repeated.
pub fn build_tooth_void_profile(spec: &BeltSpecification) -> Vec<[f64; 2]> {
    let profile = spec.profile();
    let inner_radius = spec.inner_radius();

    let base_y = inner_radius - profile.extra_depth;
    let tip_y = inner_radius + profile.tooth_height;
    let base_half = profile.bottom_width() / 2.0;
    let tip_half = profile.top_width() / 2.0;

    let mut outline = vec![
        [-base_half, base_y],
        [base_half, base_y],
        [tip_half, tip_y],
        [-tip_half, tip_y],
    ];
    if signed_area(&outline) < 0.0 {
        outline.reverse();
    }
    outline
}

/// Shoelace area; positive for counter-clockwise outlines.
pub fn signed_area(outline: &[[f64; 2]]) -> f64 {
    let n = outline.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let [x0, y0] = outline[i];
            let [x1, y1] = outline[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum();
    twice / 2.0
}
