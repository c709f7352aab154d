//! Separable multi-threaded cosine transforms over power-of-two volumes.
//!
//! The crate computes the forward DCT-II and inverse DCT-III of 1D lines,
//! 2D planes and 3D volumes whose extents are powers of two. Each line is
//! reduced to a half-length radix-2 complex FFT; higher-rank transforms apply
//! the 1D kernel along every axis in turn.
//!
//! # Core Types
//!
//! - [`Dct3d`]: volume engine (`n1 × n2 × n3`), the main entry point
//! - [`Dct2d`]: plane engine (`rows × cols`)
//! - [`Dct1d`]: single-line kernel
//! - [`Volume`]: the accepted data layouts, flat buffers and nested vectors
//! - [`DctOptions`] / [`WorkerPolicy`]: parallel dispatch configuration
//!
//! # Example
//!
//! ```rust
//! use dct3d::Dct3d;
//!
//! let dct = Dct3d::<f64>::new(4, 8, 8)?;
//! let original: Vec<f64> = (0..4 * 8 * 8).map(|v| (v % 7) as f64).collect();
//!
//! let mut data = original.clone();
//! dct.forward(&mut data, true)?;
//! dct.inverse(&mut data, true)?;
//!
//! for (a, b) in data.iter().zip(&original) {
//!     assert!((a - b).abs() < 1e-10);
//! }
//! # Ok::<(), dct3d::DctError>(())
//! ```
//!
//! # Parallel Execution
//!
//! With the `parallel` feature (enabled by default) each axis pass splits its
//! outer loop across rayon workers once the volume reaches
//! [`PARALLEL_THRESHOLD`] elements. Passes are separated by a join, so a pass
//! always sees the complete output of the previous one.

mod compose;
mod engine;
mod fft;
mod kernel;
mod scalar;
mod scratch;
mod tables;
mod threading;
pub mod view;

pub use compose::AxisPass;
pub use engine::{Dct2d, Dct3d, DctOptions, WorkerPolicy};
pub use kernel::{Dct1d, Direction};
pub use scalar::DctFloat;
pub use view::{Shape, Volume};

// ============================================================================
// Constants
// ============================================================================

/// Default number of elements at which a transform switches to the parallel
/// path.
pub const PARALLEL_THRESHOLD: usize = 65_536;

/// Maximum number of strided lines gathered into scratch at once.
pub const GROUP_WIDTH: usize = 4;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur while planning or running a transform.
#[derive(Debug, thiserror::Error)]
pub enum DctError {
    /// Transform extent is not a power of two.
    #[error("extent {extent} of axis {axis} is not a power of two")]
    NotPowerOfTwo { axis: usize, extent: usize },

    /// `n1 * n2 * n3` does not fit in `usize`.
    #[error("volume size overflows usize")]
    VolumeOverflow,

    /// Worker count of zero.
    #[error("invalid worker count {requested}")]
    InvalidWorkers { requested: usize },

    /// Dedicated thread pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    /// Flat buffer shorter than the volume.
    #[error("buffer holds {actual} elements, volume needs {expected}")]
    VolumeTooSmall { expected: usize, actual: usize },

    /// Nested container whose length disagrees with the shape.
    #[error("axis {axis} at {index:?} has length {actual}, expected {expected}")]
    RaggedVolume {
        axis: usize,
        index: [usize; 2],
        expected: usize,
        actual: usize,
    },

    /// Line length differs from the planned 1D length.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A worker panicked during an axis pass. The data is left partially
    /// transformed.
    #[error("worker panicked during {pass} pass: {message}")]
    WorkerPanicked { pass: AxisPass, message: String },
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, DctError>;
