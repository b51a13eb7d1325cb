pub mod atomic;
pub mod errors;
pub mod export;
pub mod stl;

pub use atomic::{write_all_atomic, write_atomic};
pub use errors::ExportError;
pub use export::{
    export_artifacts, export_step, export_stl, step_string, stl_bytes, BeltArtifacts,
    ExportOptions, StlFormat, DEFAULT_TESSELLATION_TOLERANCE,
};
pub use stl::{ascii_stl, binary_stl, StlError};
