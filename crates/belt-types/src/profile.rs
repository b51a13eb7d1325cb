use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// How the tooth void's two parallel edges are sized.
///
/// Profiles in the wild are given either as one base width with the tip
/// derived from it, or as two independently measured widths. Both describe the
/// same trapezoidal void.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToothWidths {
    /// Tip width is `base_width * tip_fraction`.
    DerivedTip { base_width: f64, tip_fraction: f64 },
    /// Bottom (wide, toward the belt centre) and top (tip) widths given directly.
    Independent { bottom_width: f64, top_width: f64 },
}

impl Default for ToothWidths {
    fn default() -> Self {
        ToothWidths::DerivedTip {
            base_width: 2.0,
            tip_fraction: 0.8,
        }
    }
}

/// S3M tooth profile constants, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToothProfile {
    /// Tooth-to-tooth distance along the belt centreline.
    pub pitch: f64,
    pub tooth_height: f64,
    pub widths: ToothWidths,
    pub tooth_radius: f64,
    pub belt_thickness: f64,
    /// Overshoot of the void past the inner wall so the cut never leaves a
    /// membrane behind.
    pub extra_depth: f64,
}

impl Default for ToothProfile {
    fn default() -> Self {
        Self {
            pitch: 3.0,
            tooth_height: 1.4,
            widths: ToothWidths::default(),
            tooth_radius: 0.6,
            belt_thickness: 2.0,
            extra_depth: 1.0,
        }
    }
}

impl ToothProfile {
    /// Width of the void edge nearest the belt centre.
    pub fn bottom_width(&self) -> f64 {
        match self.widths {
            ToothWidths::DerivedTip { base_width, .. } => base_width,
            ToothWidths::Independent { bottom_width, .. } => bottom_width,
        }
    }

    /// Width of the void at its deepest point into the belt material.
    pub fn top_width(&self) -> f64 {
        match self.widths {
            ToothWidths::DerivedTip {
                base_width,
                tip_fraction,
            } => base_width * tip_fraction,
            ToothWidths::Independent { top_width, .. } => top_width,
        }
    }

    /// Check the profile invariants.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        positive("pitch", self.pitch)?;
        positive("tooth_height", self.tooth_height)?;
        positive("tooth_radius", self.tooth_radius)?;
        positive("belt_thickness", self.belt_thickness)?;
        positive("extra_depth", self.extra_depth)?;

        match self.widths {
            ToothWidths::DerivedTip {
                base_width,
                tip_fraction,
            } => {
                positive("base_width", base_width)?;
                if !(tip_fraction > 0.0 && tip_fraction <= 1.0) {
                    return Err(InvalidInput::TipFractionOutOfRange { tip_fraction });
                }
            }
            ToothWidths::Independent {
                bottom_width,
                top_width,
            } => {
                positive("bottom_width", bottom_width)?;
                positive("top_width", top_width)?;
            }
        }

        let half_width = self.bottom_width() / 2.0;
        if self.tooth_radius >= half_width {
            return Err(InvalidInput::ToothRadiusTooLarge {
                tooth_radius: self.tooth_radius,
                half_width,
            });
        }

        if self.belt_thickness < self.tooth_height {
            return Err(InvalidInput::BeltTooThin {
                belt_thickness: self.belt_thickness,
                tooth_height: self.tooth_height,
            });
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), InvalidInput> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidInput::NonPositiveLength { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_profile_is_s3m() {
        let p = ToothProfile::default();
        assert_eq!(p.pitch, 3.0);
        assert_eq!(p.bottom_width(), 2.0);
        assert_relative_eq!(p.top_width(), 1.6);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn independent_widths_are_used_verbatim() {
        let p = ToothProfile {
            widths: ToothWidths::Independent {
                bottom_width: 1.9,
                top_width: 1.2,
            },
            ..ToothProfile::default()
        };
        assert_eq!(p.bottom_width(), 1.9);
        assert_eq!(p.top_width(), 1.2);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn tooth_radius_must_fit_in_base() {
        let p = ToothProfile {
            tooth_radius: 1.0,
            ..ToothProfile::default()
        };
        assert!(matches!(
            p.validate(),
            Err(InvalidInput::ToothRadiusTooLarge { .. })
        ));
    }

    #[test]
    fn belt_must_contain_tooth() {
        let p = ToothProfile {
            belt_thickness: 1.0,
            ..ToothProfile::default()
        };
        assert_eq!(
            p.validate(),
            Err(InvalidInput::BeltTooThin {
                belt_thickness: 1.0,
                tooth_height: 1.4
            })
        );
    }

    #[test]
    fn zero_and_nan_lengths_rejected() {
        let zero = ToothProfile {
            pitch: 0.0,
            ..ToothProfile::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(InvalidInput::NonPositiveLength { field: "pitch", .. })
        ));

        let nan = ToothProfile {
            extra_depth: f64::NAN,
            ..ToothProfile::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(InvalidInput::NonPositiveLength {
                field: "extra_depth",
                ..
            })
        ));
    }

    #[test]
    fn tip_fraction_bounds() {
        for bad in [0.0, -0.5, 1.01] {
            let p = ToothProfile {
                widths: ToothWidths::DerivedTip {
                    base_width: 2.0,
                    tip_fraction: bad,
                },
                ..ToothProfile::default()
            };
            assert!(
                matches!(p.validate(), Err(InvalidInput::TipFractionOutOfRange { .. })),
                "tip fraction {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn partial_profile_deserializes_with_defaults() {
        let p: ToothProfile = serde_json::from_str(
            r#"{"widths": {"type": "independent", "bottom_width": 2.0, "top_width": 1.5}}"#,
        )
        .unwrap();
        assert_eq!(p.pitch, 3.0);
        assert_eq!(p.top_width(), 1.5);
    }
}
