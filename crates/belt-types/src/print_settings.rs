use serde::Serialize;

/// Recommended slicer settings for printing a belt in TPU.
///
/// Descriptive only; nothing in the geometry pipeline reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrintSettings {
    pub material: &'static str,
    pub layer_height: &'static str,
    pub infill: &'static str,
    pub wall_thickness: &'static str,
    pub print_temperature: &'static str,
    pub bed_temperature: &'static str,
    pub print_speed: &'static str,
    pub retraction_speed: &'static str,
    pub retraction_distance: &'static str,
    pub fan_speed: &'static str,
}

pub const TPU_PRINT_SETTINGS: PrintSettings = PrintSettings {
    material: "TPU 95A",
    layer_height: "0.2mm",
    infill: "100%",
    wall_thickness: "1.2mm",
    print_temperature: "230°C",
    bed_temperature: "45°C",
    print_speed: "25mm/s",
    retraction_speed: "25mm/s",
    retraction_distance: "1mm",
    fan_speed: "50%",
};

impl PrintSettings {
    /// Labelled rows in display order.
    pub fn rows(&self) -> [(&'static str, &'static str); 10] {
        [
            ("Material", self.material),
            ("Layer Height", self.layer_height),
            ("Infill", self.infill),
            ("Wall Thickness", self.wall_thickness),
            ("Print Temperature", self.print_temperature),
            ("Bed Temperature", self.bed_temperature),
            ("Print Speed", self.print_speed),
            ("Retraction Speed", self.retraction_speed),
            ("Retraction Distance", self.retraction_distance),
            ("Fan Speed", self.fan_speed),
        ]
    }
}
