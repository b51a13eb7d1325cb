/// A violated belt or tooth-profile invariant.
///
/// Every variant is caller-fixable and its message is meant to be shown to the
/// user verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("exactly one of belt length or number of teeth must be provided, got {given}")]
    Ambiguous { given: &'static str },

    #[error("belt length must be a finite number of millimetres, got {length_mm}")]
    NonFiniteLength { length_mm: f64 },

    #[error("Number of teeth must be at least {min} (got {num_teeth})")]
    TooFewTeeth { num_teeth: f64, min: u32 },

    #[error("belt length {length_mm}mm needs {num_teeth} teeth, more than the maximum of {max}")]
    TooManyTeeth {
        length_mm: f64,
        num_teeth: f64,
        max: u32,
    },

    #[error("belt width must be a finite number of millimetres, got {width}")]
    NonFiniteWidth { width: f64 },

    #[error("Belt width must be at least {min}mm (got {width}mm)")]
    WidthTooSmall { width: f64, min: f64 },

    #[error(
        "pitch radius {pitch_radius:.3}mm is smaller than belt thickness plus tooth height ({required:.3}mm)"
    )]
    PitchRadiusTooSmall { pitch_radius: f64, required: f64 },

    #[error("scale factor must be a positive finite number, got {scale_factor}")]
    InvalidScaleFactor { scale_factor: f64 },

    #[error("tooth profile {field} must be a positive finite length, got {value}mm")]
    NonPositiveLength { field: &'static str, value: f64 },

    #[error("tooth tip fraction must be in (0, 1], got {tip_fraction}")]
    TipFractionOutOfRange { tip_fraction: f64 },

    #[error("tooth radius {tooth_radius}mm must be less than half the tooth base width ({half_width}mm)")]
    ToothRadiusTooLarge { tooth_radius: f64, half_width: f64 },

    #[error("belt thickness {belt_thickness}mm must be at least the tooth height {tooth_height}mm")]
    BeltTooThin {
        belt_thickness: f64,
        tooth_height: f64,
    },
}
