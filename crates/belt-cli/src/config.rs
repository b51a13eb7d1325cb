//! Optional JSON configuration for the `s3m-belt` host.
//!
//! Every field may be omitted; missing values fall back to library defaults.
//!
//! ```json
//! {
//!   "batch_size": 10,
//!   "tessellation_tolerance": 0.01,
//!   "boolean_tolerance": 0.05,
//!   "tooth": {
//!     "pitch": 3.0,
//!     "widths": { "type": "independent", "bottom_width": 2.0, "top_width": 1.6 }
//!   }
//! }
//! ```

use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{bail, Context, Result};
use belt_builder::BuildOptions;
use belt_export::{ExportOptions, StlFormat};
use belt_kernel::TruckKernel;
use belt_types::ToothProfile;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Teeth per union batch
    pub batch_size: Option<NonZeroUsize>,
    /// STL chordal tolerance in mm
    pub tessellation_tolerance: Option<f64>,
    /// Kernel boolean tolerance in mm
    pub boolean_tolerance: Option<f64>,
    /// Tooth profile overrides
    pub tooth: Option<ToothProfile>,
}

impl CliConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tessellation_tolerance", self.tessellation_tolerance),
            ("boolean_tolerance", self.boolean_tolerance),
        ] {
            if let Some(value) = value {
                if !(value.is_finite() && value > 0.0) {
                    bail!("{} must be positive (got {})", name, value);
                }
            }
        }
        if let Some(tooth) = &self.tooth {
            tooth.validate()?;
        }
        Ok(())
    }

    pub fn profile(&self) -> ToothProfile {
        self.tooth.unwrap_or_default()
    }

    pub fn build_options(&self) -> BuildOptions {
        match self.batch_size {
            Some(batch_size) => BuildOptions { batch_size },
            None => BuildOptions::default(),
        }
    }

    pub fn export_options(&self, ascii_stl: bool) -> ExportOptions {
        let defaults = ExportOptions::default();
        ExportOptions {
            tessellation_tolerance: self
                .tessellation_tolerance
                .unwrap_or(defaults.tessellation_tolerance),
            stl_format: if ascii_stl {
                StlFormat::Ascii
            } else {
                StlFormat::Binary
            },
        }
    }

    pub fn kernel(&self) -> TruckKernel {
        match self.boolean_tolerance {
            Some(tolerance) => TruckKernel::with_tolerance(tolerance),
            None => TruckKernel::new(),
        }
    }
}
