//! Dynamic time warping over per-frame spectra.
//!
//! The cost table and backtrack are written out in full rather than delegated
//! to an optimization crate: the traversal direction and tie-break order are
//! part of the output contract and have to stay deterministic.

use tracing::debug;

use crate::dsp::similarity::cosine_similarity;
use crate::dsp::spectrum::Spectrogram;
use crate::dsp::{AnalysisError, CancelToken};

/// Minimum-cost monotonic alignment between two frame sequences.
///
/// `path` runs forward from `(0, 0)` to `(a_len - 1, b_len - 1)`; each step
/// increases `i`, `j`, or both by exactly one. `cost` is the accumulated
/// frame distance along the path.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub cost: f32,
    pub path: Vec<(usize, usize)>,
}

/// Frame distance used for alignment: `1 - cosine_similarity`.
///
/// Zero-norm frames compare with similarity 0 and therefore distance 1.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Align two spectrograms of shared stride.
///
/// `O(a_len * b_len)` time and space. Fails if either side has no frames:
/// there is no path through an empty sequence.
pub fn align(a: &Spectrogram, b: &Spectrogram) -> Result<Alignment, AnalysisError> {
    align_cancellable(a, b, &CancelToken::new())
}

/// Like [`align`], polling `cancel` once per table row.
pub fn align_cancellable(
    a: &Spectrogram,
    b: &Spectrogram,
    cancel: &CancelToken,
) -> Result<Alignment, AnalysisError> {
    if a.stride() != b.stride() {
        return Err(AnalysisError::StrideMismatch {
            left: a.stride(),
            right: b.stride(),
        });
    }
    if a.is_empty() {
        return Err(AnalysisError::EmptySpectrogram("left"));
    }
    if b.is_empty() {
        return Err(AnalysisError::EmptySpectrogram("right"));
    }

    let a_len = a.frame_count();
    let b_len = b.frame_count();

    // table[i * b_len + j] = cost of the cheapest monotonic path from (0, 0)
    // ending at (i, j).
    let mut table = vec![0.0f32; a_len * b_len];
    for (i, frame_a) in a.frames().enumerate() {
        cancel.checkpoint()?;
        for (j, frame_b) in b.frames().enumerate() {
            let idx = i * b_len + j;
            let best_predecessor = match (i, j) {
                (0, 0) => 0.0,
                (_, 0) => table[idx - b_len],
                (0, _) => table[idx - 1],
                _ => {
                    let diagonal = table[idx - b_len - 1];
                    let vertical = table[idx - b_len];
                    let horizontal = table[idx - 1];
                    diagonal.min(vertical).min(horizontal)
                }
            };
            table[idx] = cosine_distance(frame_a, frame_b) + best_predecessor;
        }
    }

    // Backtrack from the far corner, at each step taking the predecessor
    // that produced the minimum. Tie-break order is fixed: diagonal, then
    // vertical (i - 1, j), then horizontal (i, j - 1).
    let mut path = Vec::with_capacity(a_len + b_len);
    let (mut i, mut j) = (a_len - 1, b_len - 1);
    path.push((i, j));
    while i > 0 || j > 0 {
        (i, j) = if i == 0 {
            (0, j - 1)
        } else if j == 0 {
            (i - 1, 0)
        } else {
            let diagonal = table[(i - 1) * b_len + (j - 1)];
            let vertical = table[(i - 1) * b_len + j];
            let horizontal = table[i * b_len + (j - 1)];
            if diagonal <= vertical && diagonal <= horizontal {
                (i - 1, j - 1)
            } else if vertical <= horizontal {
                (i - 1, j)
            } else {
                (i, j - 1)
            }
        };
        path.push((i, j));
    }
    path.reverse();

    let cost = table[a_len * b_len - 1];
    debug!("alignment: {} steps, cost {:.4}", path.len(), cost);

    Ok(Alignment { cost, path })
}
