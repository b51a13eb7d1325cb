use std::f64::consts::TAU;
use std::fmt;

use serde::Serialize;

use crate::error::InvalidInput;
use crate::profile::ToothProfile;

/// Fewest teeth a printable belt may have.
pub const MIN_TEETH: u32 = 10;
/// Narrowest printable belt, in millimetres.
pub const MIN_WIDTH_MM: f64 = 3.0;
/// Standard S3M belt width.
pub const DEFAULT_WIDTH_MM: f64 = 9.0;
/// Default shrinkage compensation for TPU.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.005;

/// Physical parameters of one belt.
///
/// Only constructible through the validating factories, so every value of this
/// type satisfies its invariants. `length_mm` is always exactly
/// `num_teeth * pitch`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeltSpecification {
    profile: ToothProfile,
    length_mm: f64,
    num_teeth: u32,
    width: f64,
    scale_factor: f64,
}

impl BeltSpecification {
    /// Build a specification with the standard S3M tooth profile.
    ///
    /// Exactly one of `length_mm` and `num_teeth` must be given. A requested
    /// length is snapped to the nearest whole number of teeth.
    pub fn new(
        length_mm: Option<f64>,
        num_teeth: Option<u32>,
        width: f64,
        scale_factor: f64,
    ) -> Result<Self, InvalidInput> {
        Self::with_profile(
            ToothProfile::default(),
            length_mm,
            num_teeth,
            width,
            scale_factor,
        )
    }

    pub fn from_length(length_mm: f64, width: f64, scale_factor: f64) -> Result<Self, InvalidInput> {
        Self::new(Some(length_mm), None, width, scale_factor)
    }

    pub fn from_teeth(num_teeth: u32, width: f64, scale_factor: f64) -> Result<Self, InvalidInput> {
        Self::new(None, Some(num_teeth), width, scale_factor)
    }

    /// Build a specification with a custom tooth profile.
    ///
    /// The profile is checked first since the derivation divides by its pitch.
    pub fn with_profile(
        profile: ToothProfile,
        length_mm: Option<f64>,
        num_teeth: Option<u32>,
        width: f64,
        scale_factor: f64,
    ) -> Result<Self, InvalidInput> {
        profile.validate()?;

        let teeth = match (length_mm, num_teeth) {
            (Some(_), Some(_)) => return Err(InvalidInput::Ambiguous { given: "both" }),
            (None, None) => return Err(InvalidInput::Ambiguous { given: "neither" }),
            (Some(length_mm), None) => {
                if !length_mm.is_finite() {
                    return Err(InvalidInput::NonFiniteLength { length_mm });
                }
                (length_mm / profile.pitch).round_ties_even()
            }
            (None, Some(n)) => f64::from(n),
        };

        if teeth < f64::from(MIN_TEETH) {
            return Err(InvalidInput::TooFewTeeth {
                num_teeth: teeth,
                min: MIN_TEETH,
            });
        }
        if teeth > f64::from(u32::MAX) {
            return Err(InvalidInput::TooManyTeeth {
                length_mm: teeth * profile.pitch,
                num_teeth: teeth,
                max: u32::MAX,
            });
        }
        let num_teeth = teeth as u32;

        let spec = Self {
            profile,
            length_mm: f64::from(num_teeth) * profile.pitch,
            num_teeth,
            width,
            scale_factor,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Re-check every invariant, first failure wins:
    /// tooth count, width, pitch radius, scale factor, then the profile.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.num_teeth < MIN_TEETH {
            return Err(InvalidInput::TooFewTeeth {
                num_teeth: f64::from(self.num_teeth),
                min: MIN_TEETH,
            });
        }

        if !self.width.is_finite() {
            return Err(InvalidInput::NonFiniteWidth { width: self.width });
        }
        if self.width < MIN_WIDTH_MM {
            return Err(InvalidInput::WidthTooSmall {
                width: self.width,
                min: MIN_WIDTH_MM,
            });
        }

        let required = self.profile.belt_thickness + self.profile.tooth_height;
        let pitch_radius = self.pitch_radius();
        if pitch_radius < required {
            return Err(InvalidInput::PitchRadiusTooSmall {
                pitch_radius,
                required,
            });
        }

        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(InvalidInput::InvalidScaleFactor {
                scale_factor: self.scale_factor,
            });
        }

        self.profile.validate()
    }

    pub fn profile(&self) -> &ToothProfile {
        &self.profile
    }

    /// Realised belt length, always a whole multiple of the pitch.
    pub fn length_mm(&self) -> f64 {
        self.length_mm
    }

    pub fn num_teeth(&self) -> u32 {
        self.num_teeth
    }

    /// Axial extrusion depth.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Radius of the circle whose circumference is the belt length.
    pub fn pitch_radius(&self) -> f64 {
        self.length_mm / TAU
    }

    /// Radius of the belt's inner wall before teeth are cut.
    pub fn inner_radius(&self) -> f64 {
        self.pitch_radius() - self.profile.belt_thickness
    }

    pub fn angle_step_degrees(&self) -> f64 {
        360.0 / f64::from(self.num_teeth)
    }

    /// Angular spacing between teeth, in radians.
    pub fn angle_step(&self) -> f64 {
        TAU / f64::from(self.num_teeth)
    }

    /// Rotation of tooth `index`, in radians. Computed from the index so no
    /// error accumulates around the belt.
    pub fn tooth_angle(&self, index: u32) -> f64 {
        TAU * f64::from(index) / f64::from(self.num_teeth)
    }

    /// The configuration block shown before a build.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// Base name for exported files, e.g. `s3m_belt_210.0mm_70t`.
    pub fn file_stem(&self) -> String {
        format!("s3m_belt_{:.1}mm_{}t", self.length_mm, self.num_teeth)
    }
}

impl fmt::Display for BeltSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final Belt Configuration")?;
        writeln!(f, "- Length: {:.2} mm", self.length_mm)?;
        writeln!(f, "- Number of Teeth: {}", self.num_teeth)?;
        writeln!(f, "- Belt Width: {:.2} mm", self.width)?;
        writeln!(f, "- Scale Factor: {:.1}%", self.scale_factor * 100.0)?;
        writeln!(f, "- Pitch Radius: {:.2} mm", self.pitch_radius())?;
        write!(f, "- Output Filename: {}", self.file_stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn teeth_drive_length() {
        let spec = BeltSpecification::from_teeth(70, 4.0, 1.005).unwrap();
        assert_eq!(spec.length_mm(), 210.0);
        assert_eq!(spec.num_teeth(), 70);
        assert_relative_eq!(spec.pitch_radius(), 33.422538, epsilon = 1e-5);
        assert_relative_eq!(spec.inner_radius(), spec.pitch_radius() - 2.0);
    }

    #[test]
    fn length_snaps_to_whole_teeth() {
        let spec = BeltSpecification::from_length(211.2, 9.0, 1.0).unwrap();
        assert_eq!(spec.num_teeth(), 70);
        assert_eq!(spec.length_mm(), 210.0);

        let spec = BeltSpecification::from_length(212.0, 9.0, 1.0).unwrap();
        assert_eq!(spec.num_teeth(), 71);
        assert_eq!(spec.length_mm(), 213.0);
    }

    #[test]
    fn half_pitch_ties_round_to_even() {
        // 70.5 teeth
        let spec = BeltSpecification::from_length(211.5, 9.0, 1.0).unwrap();
        assert_eq!(spec.num_teeth(), 70);
        // 71.5 teeth
        let spec = BeltSpecification::from_length(214.5, 9.0, 1.0).unwrap();
        assert_eq!(spec.num_teeth(), 72);
    }

    #[test]
    fn both_or_neither_is_ambiguous() {
        assert_eq!(
            BeltSpecification::new(Some(210.0), Some(70), 9.0, 1.0),
            Err(InvalidInput::Ambiguous { given: "both" })
        );
        assert_eq!(
            BeltSpecification::new(None, None, 9.0, 1.0),
            Err(InvalidInput::Ambiguous { given: "neither" })
        );
    }

    #[test]
    fn tooth_count_boundary() {
        let err = BeltSpecification::from_teeth(9, 9.0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Number of teeth must be at least 10 (got 9)");
        assert!(BeltSpecification::from_teeth(10, 9.0, 1.0).is_ok());
    }

    #[test]
    fn width_boundary() {
        let err = BeltSpecification::from_teeth(70, 2.99, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Belt width must be at least 3mm (got 2.99mm)");
        assert!(BeltSpecification::from_teeth(70, 3.0, 1.0).is_ok());
    }

    #[test]
    fn non_finite_width_is_rejected() {
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(
                matches!(
                    BeltSpecification::from_teeth(70, bad, 1.0),
                    Err(InvalidInput::NonFiniteWidth { .. })
                ),
                "width {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn tooth_count_checked_before_width() {
        assert!(matches!(
            BeltSpecification::from_teeth(5, 1.0, 1.0),
            Err(InvalidInput::TooFewTeeth { .. })
        ));
    }

    #[test]
    fn pitch_radius_must_hold_tooth() {
        let profile = ToothProfile {
            belt_thickness: 5.0,
            tooth_height: 1.4,
            ..ToothProfile::default()
        };
        // 10 teeth * 3mm => r = 4.77mm < 6.4mm
        let err = BeltSpecification::with_profile(profile, None, Some(10), 9.0, 1.0).unwrap_err();
        assert!(matches!(err, InvalidInput::PitchRadiusTooSmall { .. }));
    }

    #[test]
    fn scale_factor_must_be_positive() {
        for bad in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(
                matches!(
                    BeltSpecification::from_teeth(70, 9.0, bad),
                    Err(InvalidInput::InvalidScaleFactor { .. })
                ),
                "scale factor {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn negative_or_nan_length_is_rejected() {
        assert!(matches!(
            BeltSpecification::from_length(-30.0, 9.0, 1.0),
            Err(InvalidInput::TooFewTeeth { .. })
        ));
        assert!(matches!(
            BeltSpecification::from_length(f64::NAN, 9.0, 1.0),
            Err(InvalidInput::NonFiniteLength { .. })
        ));
    }

    #[test]
    fn length_beyond_tooth_count_range_is_too_long() {
        let err = BeltSpecification::from_length(1e12, 9.0, 1.0).unwrap_err();
        assert!(
            matches!(err, InvalidInput::TooManyTeeth { max, .. } if max == u32::MAX),
            "{:?}",
            err
        );
        assert!(err.to_string().contains("more than the maximum"));
    }

    #[test]
    fn angle_step_covers_full_turn() {
        let spec = BeltSpecification::from_teeth(70, 9.0, 1.0).unwrap();
        assert_relative_eq!(spec.angle_step_degrees() * 70.0, 360.0, epsilon = 1e-9);
        assert_relative_eq!(spec.tooth_angle(35), std::f64::consts::PI, epsilon = 1e-12);
        assert_eq!(spec.tooth_angle(0), 0.0);
    }

    #[test]
    fn file_stem_and_summary() {
        let spec = BeltSpecification::from_teeth(70, 4.0, 1.005).unwrap();
        assert_eq!(spec.file_stem(), "s3m_belt_210.0mm_70t");
        let summary = spec.summary();
        assert!(summary.contains("- Length: 210.00 mm"));
        assert!(summary.contains("- Number of Teeth: 70"));
        assert!(summary.contains("- Scale Factor: 100.5%"));
        assert!(summary.ends_with("s3m_belt_210.0mm_70t"));
    }
}
