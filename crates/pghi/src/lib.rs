//! PGHI — phase reconstruction from magnitude-only spectrograms
//!
//! This crate rebuilds a phase spectrogram from the magnitude of an STFT,
//! enabling resynthesis after magnitude-only processing where the original
//! phase no longer exists. It implements phase-gradient heap integration
//! (PGHI) in two stages:
//!
//! - [`gradient`] - estimate the phase-derivative field from log-magnitude
//! - [`integrate`] - integrate that field into absolute phase, best-first
//!   from the most reliable (highest-magnitude) cells outward
//!
//! Computing the magnitude STFT itself, inverse-STFT resynthesis, and any
//! I/O are deliberately out of scope; both stages work on plain
//! `[time_frame][frequency_bin]` arrays owned by the caller.
//!
//! ## Example
//!
//! ```rust
//! use pghi::{estimate_gradient, integrate_phase};
//!
//! // A tiny synthetic magnitude surface (4 frames x 8 bins).
//! let magnitude: Vec<Vec<f32>> = (0..4)
//!     .map(|t| (0..8).map(|f| 1.0 + (t + f) as f32 * 0.1).collect())
//!     .collect();
//!
//! let gradient = estimate_gradient(&magnitude, 256, 1024, 1.0)?;
//! let phase = integrate_phase(&magnitude, &gradient, 1e-6)?;
//!
//! assert_eq!(phase.shape(), (4, 8));
//! assert_eq!(phase.unresolved_count(), 0);
//! # Ok::<(), pghi::PghiError>(())
//! ```
//!
//! Cells the integrator cannot reach through above-tolerance magnitudes are
//! reported in [`PhaseField::unresolved`], never silently zero-filled — a
//! resynthesis stage must decide what to do with them (typically zero the
//! bin or re-seed from a local maximum).

pub mod error;
pub mod gradient;
pub mod integrate;

// Re-export main types
pub use error::{PghiError, Result};
pub use gradient::{GradientField, estimate_gradient};
pub use integrate::{PhaseField, integrate_phase};
