use std::fmt;
use std::num::NonZeroUsize;

use belt_kernel::{KernelError, KernelSolidHandle};
use belt_types::{BeltSpecification, InvalidInput};

/// Teeth unioned into one partial solid before it is merged into the running total.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Tuning knobs for belt construction. None of them change the resulting shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// How many rotated teeth are unioned together before merging the batch
    /// into the running total. Keeps boolean operands small.
    pub batch_size: NonZeroUsize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl BuildOptions {
    /// Options with the given batch size. Zero is rejected.
    pub fn with_batch_size(batch_size: usize) -> Option<Self> {
        NonZeroUsize::new(batch_size).map(|batch_size| Self { batch_size })
    }
}

/// The construction stage a kernel call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    BaseRing,
    ToothVoid,
    RotateTooth { index: u32 },
    UnionBatch { batch: usize },
    MergeBatch { batch: usize },
    Cut,
    Scale,
    Tessellate,
    SerializeStep,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::BaseRing => write!(f, "base ring"),
            BuildStep::ToothVoid => write!(f, "tooth void"),
            BuildStep::RotateTooth { index } => write!(f, "rotating tooth {}", index),
            BuildStep::UnionBatch { batch } => write!(f, "union of tooth batch {}", batch),
            BuildStep::MergeBatch { batch } => write!(f, "merging tooth batch {}", batch),
            BuildStep::Cut => write!(f, "cutting teeth from ring"),
            BuildStep::Scale => write!(f, "scaling"),
            BuildStep::Tessellate => write!(f, "tessellation"),
            BuildStep::SerializeStep => write!(f, "STEP serialization"),
        }
    }
}

/// A kernel failure, tagged with the stage that triggered it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("geometry construction failed during {step}: {source}")]
pub struct GeometryConstructionError {
    pub step: BuildStep,
    #[source]
    pub source: KernelError,
}

/// Attach a [`BuildStep`] to a kernel result.
pub trait AtStep<T> {
    fn at(self, step: BuildStep) -> Result<T, GeometryConstructionError>;
}

impl<T> AtStep<T> for Result<T, KernelError> {
    fn at(self, step: BuildStep) -> Result<T, GeometryConstructionError> {
        self.map_err(|source| GeometryConstructionError { step, source })
    }
}

/// Errors from building a belt solid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error(transparent)]
    Geometry(#[from] GeometryConstructionError),
}

/// Counters and timing from one build.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Tooth batches merged into the total.
    pub batches: usize,
    /// Boolean unions issued, batches and merges together.
    pub unions: usize,
    /// Wall time of the kernel sequence, in milliseconds.
    pub kernel_time_ms: f64,
}

/// A finished belt solid, still owned by the kernel session that built it.
#[derive(Debug)]
pub struct BeltSolidModel {
    handle: KernelSolidHandle,
    spec: BeltSpecification,
    stats: BuildStats,
}

impl BeltSolidModel {
    pub(crate) fn new(handle: KernelSolidHandle, spec: BeltSpecification, stats: BuildStats) -> Self {
        Self {
            handle,
            spec,
            stats,
        }
    }

    /// Handle to the solid in the kernel. Runtime-only.
    pub fn handle(&self) -> &KernelSolidHandle {
        &self.handle
    }

    /// The specification the solid was built from.
    pub fn spec(&self) -> &BeltSpecification {
        &self.spec
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn into_handle(self) -> KernelSolidHandle {
        self.handle
    }
}
