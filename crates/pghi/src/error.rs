//! Error types for phase reconstruction.

use thiserror::Error;

/// Errors that can occur during phase reconstruction.
///
/// All of these are input-contract violations reported synchronously to the
/// caller. Nothing here is transient; there is no retry path. Partial
/// reconstruction (silent regions left unresolved) is not an error — it is
/// reported through the unresolved mask on [`crate::PhaseField`].
#[derive(Debug, Error)]
pub enum PghiError {
    /// A magnitude entry was non-positive or non-finite where strictly
    /// positive is required for the log-magnitude step.
    #[error("invalid magnitude {value} at frame {frame}, bin {bin}: entries must be finite and > 0")]
    InvalidMagnitude {
        /// Time frame of the offending entry.
        frame: usize,
        /// Frequency bin of the offending entry.
        bin: usize,
        /// The offending value.
        value: f32,
    },

    /// The magnitude surface is all-zero; silence has no defined phase.
    #[error("degenerate input: magnitude surface is all-zero")]
    DegenerateInput,

    /// The gradient field shape does not match the magnitude surface shape.
    #[error("shape mismatch: expected {expected_frames}x{expected_bins}, got {got_frames}x{got_bins}")]
    ShapeMismatch {
        /// Expected number of time frames.
        expected_frames: usize,
        /// Expected number of frequency bins.
        expected_bins: usize,
        /// Actual number of time frames.
        got_frames: usize,
        /// Actual number of frequency bins.
        got_bins: usize,
    },
}

/// Convenience result type for phase reconstruction operations.
pub type Result<T> = std::result::Result<T, PghiError>;
