//! STL and STEP output for a finished belt solid.

use std::path::Path;

use belt_builder::{AtStep, BeltSolidModel, BuildStep, GeometryConstructionError};
use belt_kernel::{Kernel, KernelError};
use tracing::{info, instrument};

use crate::atomic::{write_all_atomic, write_atomic};
use crate::errors::ExportError;
use crate::stl::{ascii_stl, binary_stl};

/// Maximum chordal deviation of the STL mesh, in millimetres.
pub const DEFAULT_TESSELLATION_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub tessellation_tolerance: f64,
    pub stl_format: StlFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tessellation_tolerance: DEFAULT_TESSELLATION_TOLERANCE,
            stl_format: StlFormat::Binary,
        }
    }
}

/// Both artifacts, serialized from the same solid.
#[derive(Debug, Clone)]
pub struct BeltArtifacts {
    pub stl: Vec<u8>,
    pub step: String,
}

impl BeltArtifacts {
    /// Write both files. Either both land on disk or neither does.
    #[instrument(skip_all, fields(stl = %stl_path.display(), step = %step_path.display()))]
    pub fn write(&self, stl_path: &Path, step_path: &Path) -> Result<(), ExportError> {
        write_all_atomic(&[(stl_path, self.stl.as_slice()), (step_path, self.step.as_bytes())])?;
        info!("STL and STEP written");
        Ok(())
    }
}

/// Tessellate the belt and encode it as STL.
#[instrument(skip_all, fields(tolerance = options.tessellation_tolerance))]
pub fn stl_bytes<K: Kernel + ?Sized>(
    kernel: &mut K,
    model: &BeltSolidModel,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let mesh = kernel
        .tessellate(model.handle(), options.tessellation_tolerance)
        .at(BuildStep::Tessellate)?;

    let name = model.spec().file_stem();
    let encoded = match options.stl_format {
        StlFormat::Binary => binary_stl(&mesh, &name),
        StlFormat::Ascii => ascii_stl(&mesh, &name).map(String::into_bytes),
    };
    let bytes = encoded.map_err(|e| GeometryConstructionError {
        step: BuildStep::Tessellate,
        source: KernelError::TessellationFailed {
            reason: e.to_string(),
        },
    })?;

    info!(triangles = mesh.triangle_count(), bytes = bytes.len(), "STL encoded");
    Ok(bytes)
}

/// Serialize the belt's B-rep as a STEP document.
pub fn step_string<K: Kernel + ?Sized>(
    kernel: &mut K,
    model: &BeltSolidModel,
) -> Result<String, ExportError> {
    let file_name = format!("{}.step", model.spec().file_stem());
    let step = kernel
        .export_step(model.handle(), &file_name)
        .at(BuildStep::SerializeStep)?;
    info!(bytes = step.len(), "STEP serialized");
    Ok(step)
}

/// Produce both artifacts in memory. Nothing is returned unless both succeed.
pub fn export_artifacts<K: Kernel + ?Sized>(
    kernel: &mut K,
    model: &BeltSolidModel,
    options: &ExportOptions,
) -> Result<BeltArtifacts, ExportError> {
    let stl = stl_bytes(kernel, model, options)?;
    let step = step_string(kernel, model)?;
    Ok(BeltArtifacts { stl, step })
}

/// Write the belt as STL to `path`, replacing any existing file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn export_stl<K: Kernel + ?Sized>(
    kernel: &mut K,
    model: &BeltSolidModel,
    path: &Path,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let bytes = stl_bytes(kernel, model, options)?;
    write_atomic(path, &bytes)?;
    info!("STL written");
    Ok(())
}

/// Write the belt as STEP to `path`, replacing any existing file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn export_step<K: Kernel + ?Sized>(
    kernel: &mut K,
    model: &BeltSolidModel,
    path: &Path,
) -> Result<(), ExportError> {
    let step = step_string(kernel, model)?;
    write_atomic(path, step.as_bytes())?;
    info!("STEP written");
    Ok(())
}
