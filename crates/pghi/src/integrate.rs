//! Heap-driven integration of the phase-gradient field
//!
//! Raster-order integration accumulates error fastest exactly where the
//! gradient estimate is least trustworthy: cells whose magnitude is near
//! zero. The integrator here runs a best-first search instead. Starting from
//! the global magnitude peak, it keeps a max-heap of frontier cells keyed by
//! each cell's own magnitude and always resolves the most reliable pending
//! cell next, stepping its phase from an already-resolved neighbor. Cells
//! below the reliability floor are discarded and reported through the
//! unresolved mask rather than integrated through.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::error::{PghiError, Result};
use crate::gradient::GradientField;

/// Reconstructed phase surface with per-cell resolution state.
///
/// Unresolved cells hold phase 0.0 and are flagged in [`PhaseField::unresolved`];
/// a consumer synthesizing a complex spectrogram must handle them explicitly
/// (zero the bin, or re-seed from a separate local maximum) rather than
/// trusting the placeholder value.
#[derive(Debug, Clone)]
pub struct PhaseField {
    /// Phase in radians, `[time_frame][frequency_bin]`.
    pub phase: Vec<Vec<f32>>,
    /// True where no phase was assigned (below tolerance, or unreachable
    /// from the seed through above-tolerance cells).
    pub unresolved: Vec<Vec<bool>>,
    /// Number of time frames.
    pub num_frames: usize,
    /// Number of frequency bins per frame.
    pub num_bins: usize,
}

impl PhaseField {
    /// Grid shape as `(num_frames, num_bins)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_frames, self.num_bins)
    }

    /// Whether a phase value was assigned at `(frame, bin)`.
    ///
    /// Returns false when the index is out of bounds.
    pub fn is_resolved(&self, frame: usize, bin: usize) -> bool {
        self.unresolved
            .get(frame)
            .and_then(|row| row.get(bin))
            .is_some_and(|&u| !u)
    }

    /// Number of cells left without a phase value.
    pub fn unresolved_count(&self) -> usize {
        self.unresolved
            .iter()
            .map(|row| row.iter().filter(|&&u| u).count())
            .sum()
    }

    /// Fraction of cells left without a phase value, in `[0, 1]`.
    pub fn unresolved_fraction(&self) -> f32 {
        let total = self.num_frames * self.num_bins;
        if total == 0 {
            return 0.0;
        }
        self.unresolved_count() as f32 / total as f32
    }
}

/// Frontier cell keyed by its own magnitude.
///
/// Max-heap ordering on magnitude; equal magnitudes order the lower
/// `(frame, bin)` index first so the traversal is a pure function of the
/// input.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    magnitude: f32,
    frame: usize,
    bin: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.magnitude
            .total_cmp(&other.magnitude)
            .then_with(|| other.frame.cmp(&self.frame))
            .then_with(|| other.bin.cmp(&self.bin))
    }
}

/// Axis-aligned neighbors in fixed scan order: previous frame, next frame,
/// previous bin, next bin. Tie-break rules elsewhere rely on this order.
fn axis_neighbors(
    frame: usize,
    bin: usize,
    num_frames: usize,
    num_bins: usize,
) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(4);
    if frame > 0 {
        out.push((frame - 1, bin));
    }
    if frame + 1 < num_frames {
        out.push((frame + 1, bin));
    }
    if bin > 0 {
        out.push((frame, bin - 1));
    }
    if bin + 1 < num_bins {
        out.push((frame, bin + 1));
    }
    out
}

/// Step a resolved neighbor's phase to `(frame, bin)` along the crossed axis.
///
/// Uses the trapezoidal mean of the gradient component at the two cells,
/// with the sign flipped when stepping against the axis direction.
fn step_phase(
    neighbor_phase: f32,
    gradient: &GradientField,
    frame: usize,
    bin: usize,
    n_frame: usize,
    n_bin: usize,
) -> f32 {
    if n_frame + 1 == frame {
        neighbor_phase + 0.5 * (gradient.time[n_frame][n_bin] + gradient.time[frame][bin])
    } else if n_frame == frame + 1 {
        neighbor_phase - 0.5 * (gradient.time[frame][bin] + gradient.time[n_frame][n_bin])
    } else if n_bin + 1 == bin {
        neighbor_phase + 0.5 * (gradient.freq[frame][n_bin] + gradient.freq[frame][bin])
    } else {
        neighbor_phase - 0.5 * (gradient.freq[frame][bin] + gradient.freq[frame][n_bin])
    }
}

/// Integrate a phase-gradient field into an absolute phase surface.
///
/// `magnitude` is the STFT magnitude surface the gradient was derived from,
/// `gradient` the field from [`crate::estimate_gradient`] (or an analytic
/// model), and `tol` the reliability floor as a fraction of the global
/// magnitude maximum, in `(0, 1)` by caller contract.
///
/// The cell holding the global maximum is resolved at phase 0 (absolute
/// phase is only defined up to a constant per connected region) and
/// propagation runs best-first outward from it. Every cell reachable from
/// the seed through cells of magnitude ≥ `tol · max` gets exactly one phase
/// assignment, derived from its highest-magnitude resolved neighbor; all
/// other cells stay flagged in the unresolved mask.
///
/// # Errors
/// [`PghiError::ShapeMismatch`] if `gradient` (or a ragged magnitude row)
/// disagrees with the surface shape, [`PghiError::DegenerateInput`] if the
/// surface maximum is zero.
pub fn integrate_phase(
    magnitude: &[Vec<f32>],
    gradient: &GradientField,
    tol: f32,
) -> Result<PhaseField> {
    let num_frames = magnitude.len();
    let num_bins = magnitude.first().map_or(0, Vec::len);

    for row in magnitude {
        if row.len() != num_bins {
            return Err(PghiError::ShapeMismatch {
                expected_frames: num_frames,
                expected_bins: num_bins,
                got_frames: num_frames,
                got_bins: row.len(),
            });
        }
    }
    if gradient.shape() != (num_frames, num_bins) {
        return Err(PghiError::ShapeMismatch {
            expected_frames: num_frames,
            expected_bins: num_bins,
            got_frames: gradient.num_frames,
            got_bins: gradient.num_bins,
        });
    }

    // Seed at the global maximum; raster-order first occurrence wins ties.
    let mut max_mag = 0.0f32;
    let mut seed = (0usize, 0usize);
    for (t, row) in magnitude.iter().enumerate() {
        for (f, &mag) in row.iter().enumerate() {
            if mag > max_mag {
                max_mag = mag;
                seed = (t, f);
            }
        }
    }
    if max_mag <= 0.0 {
        return Err(PghiError::DegenerateInput);
    }
    let floor = tol * max_mag;

    let mut phase = vec![vec![0.0f32; num_bins]; num_frames];
    let mut resolved = vec![vec![false; num_bins]; num_frames];
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();

    // The seed's phase reference is 0; its neighbors form the initial frontier.
    resolved[seed.0][seed.1] = true;
    for (nf, nb) in axis_neighbors(seed.0, seed.1, num_frames, num_bins) {
        heap.push(Candidate {
            magnitude: magnitude[nf][nb],
            frame: nf,
            bin: nb,
        });
    }

    let mut resolved_count = 1usize;
    while let Some(cell) = heap.pop() {
        let (frame, bin) = (cell.frame, cell.bin);
        // Cells reached via several neighbors are pushed several times;
        // the first resolution wins.
        if resolved[frame][bin] {
            continue;
        }
        // Below the reliability floor: discard without expanding, so the
        // search never integrates through near-silent cells.
        if cell.magnitude < floor {
            continue;
        }

        // Derive phase from the highest-magnitude resolved neighbor. At
        // least one exists: cells only enter the heap when a neighbor
        // resolves. Strict `>` keeps the first in scan order on ties.
        let mut best: Option<(usize, usize)> = None;
        let mut best_mag = f32::NEG_INFINITY;
        for (nf, nb) in axis_neighbors(frame, bin, num_frames, num_bins) {
            if resolved[nf][nb] && magnitude[nf][nb] > best_mag {
                best_mag = magnitude[nf][nb];
                best = Some((nf, nb));
            }
        }
        let Some((nf, nb)) = best else {
            continue;
        };

        phase[frame][bin] = step_phase(phase[nf][nb], gradient, frame, bin, nf, nb);
        resolved[frame][bin] = true;
        resolved_count += 1;

        for (nf, nb) in axis_neighbors(frame, bin, num_frames, num_bins) {
            if !resolved[nf][nb] {
                heap.push(Candidate {
                    magnitude: magnitude[nf][nb],
                    frame: nf,
                    bin: nb,
                });
            }
        }
    }

    let unresolved: Vec<Vec<bool>> = resolved
        .iter()
        .map(|row| row.iter().map(|&r| !r).collect())
        .collect();

    let total = num_frames * num_bins;
    debug!(
        frames = num_frames,
        bins = num_bins,
        seed_frame = seed.0,
        seed_bin = seed.1,
        resolved = resolved_count,
        unresolved = total - resolved_count,
        "phase integration finished"
    );

    Ok(PhaseField {
        phase,
        unresolved,
        num_frames,
        num_bins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gradient field with explicit planes, for hand-built scenarios.
    fn field(freq: Vec<Vec<f32>>, time: Vec<Vec<f32>>) -> GradientField {
        let num_frames = freq.len();
        let num_bins = freq.first().map_or(0, Vec::len);
        GradientField {
            freq,
            time,
            num_frames,
            num_bins,
        }
    }

    #[test]
    fn candidate_ordering_prefers_magnitude_then_low_index() {
        let a = Candidate {
            magnitude: 2.0,
            frame: 5,
            bin: 5,
        };
        let b = Candidate {
            magnitude: 1.0,
            frame: 0,
            bin: 0,
        };
        assert!(a > b, "higher magnitude must pop first");

        let c = Candidate {
            magnitude: 1.0,
            frame: 0,
            bin: 1,
        };
        assert!(b > c, "equal magnitudes must pop the lower index first");
    }

    #[test]
    fn single_row_integrates_left_to_right() {
        // Seed at (0,0); each step adds the trapezoidal mean of adjacent
        // frequency-gradient entries.
        let magnitude = vec![vec![4.0f32, 2.0, 1.0]];
        let g = field(vec![vec![0.5, 1.0, 2.0]], vec![vec![0.0; 3]]);

        let out = integrate_phase(&magnitude, &g, 0.1).unwrap();
        assert_eq!(out.unresolved_count(), 0);
        assert!((out.phase[0][0] - 0.0).abs() < 1e-6);
        assert!((out.phase[0][1] - 0.75).abs() < 1e-6);
        assert!((out.phase[0][2] - 2.25).abs() < 1e-6);
    }

    #[test]
    fn stepping_backward_negates_the_gradient() {
        // Peak on the right: integration walks right-to-left, subtracting.
        let magnitude = vec![vec![1.0f32, 2.0, 4.0]];
        let g = field(vec![vec![0.5, 1.0, 2.0]], vec![vec![0.0; 3]]);

        let out = integrate_phase(&magnitude, &g, 0.1).unwrap();
        assert!((out.phase[0][2] - 0.0).abs() < 1e-6);
        assert!((out.phase[0][1] - -1.5).abs() < 1e-6);
        assert!((out.phase[0][0] - -2.25).abs() < 1e-6);
    }

    #[test]
    fn resolves_from_highest_magnitude_neighbor() {
        // Cell (1,1) ends up with two resolved neighbors: (0,1) at magnitude
        // 2 and (1,0) at magnitude 6. The step must come from (1,0), whose
        // frequency gradients are nonzero, not from the quieter (0,1).
        let magnitude = vec![vec![10.0f32, 2.0], vec![6.0, 1.0]];
        let g = field(
            vec![vec![0.0, 0.0], vec![2.0, 4.0]],
            vec![vec![0.0, 0.0], vec![0.0, 0.0]],
        );

        let out = integrate_phase(&magnitude, &g, 0.01).unwrap();
        assert_eq!(out.unresolved_count(), 0);
        // phase(1,0) = 0, then (1,1) = 0 + (2 + 4) / 2 = 3.
        assert!((out.phase[1][1] - 3.0).abs() < 1e-6, "got {}", out.phase[1][1]);
    }

    #[test]
    fn below_floor_cells_stay_unresolved_and_block_expansion() {
        // A silent column splits the surface; the far side is unreachable.
        let magnitude = vec![
            vec![8.0f32, 1e-6, 3.0],
            vec![7.0, 1e-6, 3.0],
        ];
        let g = field(vec![vec![0.0; 3]; 2], vec![vec![0.0; 3]; 2]);

        let out = integrate_phase(&magnitude, &g, 0.1).unwrap();
        assert!(out.is_resolved(0, 0));
        assert!(out.is_resolved(1, 0));
        assert!(!out.is_resolved(0, 1), "silent cell must stay unresolved");
        assert!(!out.is_resolved(1, 1));
        assert!(!out.is_resolved(0, 2), "island behind silence must stay unresolved");
        assert!(!out.is_resolved(1, 2));
        assert_eq!(out.unresolved_count(), 4);
        assert!((out.unresolved_fraction() - 4.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn all_zero_surface_is_degenerate() {
        let magnitude = vec![vec![0.0f32; 3]; 3];
        let g = field(vec![vec![0.0; 3]; 3], vec![vec![0.0; 3]; 3]);
        assert!(matches!(
            integrate_phase(&magnitude, &g, 0.1),
            Err(PghiError::DegenerateInput)
        ));
    }

    #[test]
    fn gradient_shape_mismatch_is_rejected() {
        let magnitude = vec![vec![1.0f32; 4]; 3];
        let g = field(vec![vec![0.0; 3]; 3], vec![vec![0.0; 3]; 3]);
        let err = integrate_phase(&magnitude, &g, 0.1).unwrap_err();
        assert!(matches!(
            err,
            PghiError::ShapeMismatch {
                expected_frames: 3,
                expected_bins: 4,
                got_frames: 3,
                got_bins: 3,
            }
        ));
    }

    #[test]
    fn phase_field_helpers_report_consistently() {
        let out = PhaseField {
            phase: vec![vec![0.0; 2]; 2],
            unresolved: vec![vec![false, true], vec![false, false]],
            num_frames: 2,
            num_bins: 2,
        };
        assert_eq!(out.shape(), (2, 2));
        assert_eq!(out.unresolved_count(), 1);
        assert!((out.unresolved_fraction() - 0.25).abs() < 1e-6);
        assert!(out.is_resolved(0, 0));
        assert!(!out.is_resolved(0, 1));
        assert!(!out.is_resolved(9, 9), "out of bounds is not resolved");
    }
}
