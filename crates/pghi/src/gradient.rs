//! Phase-gradient estimation from a log-magnitude spectrogram
//!
//! Under a Gaussian-window approximation, the partial derivatives of STFT
//! phase are proportional to the partial derivatives of log-magnitude taken
//! along the *opposite* axis. This module discretizes those derivatives with
//! forward finite differences, producing the gradient field that
//! [`crate::integrate_phase`] later integrates into absolute phase.
//!
//! Reference: Průša, Balazs & Søndergaard, "A Noniterative Method for
//! Reconstruction of Phase from STFT Magnitude" (2017).

use std::f32::consts::PI;

use crate::error::{PghiError, Result};

/// Phase-gradient field over a spectrogram grid.
///
/// Holds one derivative estimate per direction per cell, indexed
/// `[time_frame][frequency_bin]` like the magnitude surface it was derived
/// from. Fields are public so callers can also build a field from an
/// analytic model rather than from measured magnitudes.
#[derive(Debug, Clone)]
pub struct GradientField {
    /// Frequency-direction phase derivative estimate, `[time_frame][frequency_bin]`.
    pub freq: Vec<Vec<f32>>,
    /// Time-direction phase derivative estimate, `[time_frame][frequency_bin]`.
    pub time: Vec<Vec<f32>>,
    /// Number of time frames.
    pub num_frames: usize,
    /// Number of frequency bins per frame.
    pub num_bins: usize,
}

impl GradientField {
    /// Grid shape as `(num_frames, num_bins)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_frames, self.num_bins)
    }
}

/// Estimate the phase-gradient field from an STFT magnitude surface.
///
/// `magnitude` is indexed `[time_frame][frequency_bin]` and must be strictly
/// positive everywhere (the estimate works on log-magnitude). `hop_size` is
/// the analysis hop `a` in samples, `window_len` the analysis window length
/// `M` in samples (equal to the number of FFT channels), and `lambda` the
/// time-frequency spread `λ` of the analysis window. `hop_size`,
/// `window_len` and `lambda` must be positive; that is a caller contract,
/// not a checked error.
///
/// Forward differences use a replicate-last-difference boundary: the
/// trailing frame/bin reuses the previous difference instead of wrapping or
/// zero-padding, which avoids a fabricated discontinuity at the edges. An
/// axis of length 1 has no difference to replicate and gets 0.
///
/// # Errors
/// [`PghiError::InvalidMagnitude`] if any entry is non-finite or ≤ 0,
/// [`PghiError::ShapeMismatch`] if the rows are not all the same length.
pub fn estimate_gradient(
    magnitude: &[Vec<f32>],
    hop_size: usize,
    window_len: usize,
    lambda: f32,
) -> Result<GradientField> {
    let num_frames = magnitude.len();
    let num_bins = magnitude.first().map_or(0, Vec::len);

    for (frame, row) in magnitude.iter().enumerate() {
        if row.len() != num_bins {
            return Err(PghiError::ShapeMismatch {
                expected_frames: num_frames,
                expected_bins: num_bins,
                got_frames: num_frames,
                got_bins: row.len(),
            });
        }
        for (bin, &value) in row.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(PghiError::InvalidMagnitude { frame, bin, value });
            }
        }
    }

    let log_mag: Vec<Vec<f32>> = magnitude
        .iter()
        .map(|row| row.iter().map(|&m| m.ln()).collect())
        .collect();

    // Forward difference along the time axis; the last frame replicates the
    // previous difference.
    let mut diff_time = vec![vec![0.0f32; num_bins]; num_frames];
    for t in 0..num_frames {
        for f in 0..num_bins {
            diff_time[t][f] = if t + 1 < num_frames {
                log_mag[t + 1][f] - log_mag[t][f]
            } else if t > 0 {
                diff_time[t - 1][f]
            } else {
                0.0
            };
        }
    }

    // Forward difference along the frequency axis, same boundary policy.
    let mut diff_freq = vec![vec![0.0f32; num_bins]; num_frames];
    for t in 0..num_frames {
        for f in 0..num_bins {
            diff_freq[t][f] = if f + 1 < num_bins {
                log_mag[t][f + 1] - log_mag[t][f]
            } else if f > 0 {
                diff_freq[t][f - 1]
            } else {
                0.0
            };
        }
    }

    let a = hop_size as f32;
    let m = window_len as f32;
    let freq_scale = -(lambda / (a * m));
    let time_scale = (a * m) / lambda;
    // Constant phase advance per hop from the heterodyne convention.
    let heterodyne = 2.0 * PI * a / m;

    let freq: Vec<Vec<f32>> = diff_time
        .iter()
        .map(|row| row.iter().map(|&d| freq_scale * d).collect())
        .collect();
    let time: Vec<Vec<f32>> = diff_freq
        .iter()
        .map(|row| row.iter().map(|&d| time_scale * d + heterodyne).collect())
        .collect();

    Ok(GradientField {
        freq,
        time,
        num_frames,
        num_bins,
    })
}
