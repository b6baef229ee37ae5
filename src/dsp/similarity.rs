//! Cross-similarity between two spectrograms.

use tracing::debug;

use crate::dsp::spectrum::Spectrogram;
use crate::dsp::{AnalysisError, CancelToken};

/// Pairwise cosine similarities between every frame of A and every frame of
/// B, stored row-major over A's frames. Values lie in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    a_len: usize,
    b_len: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Number of frames on the A (row) side.
    pub fn a_len(&self) -> usize {
        self.a_len
    }

    /// Number of frames on the B (column) side.
    pub fn b_len(&self) -> usize {
        self.b_len
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Similarity between A's frame `i` and B's frame `j`.
    ///
    /// Panics if either index is out of range, like slice indexing.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.a_len && j < self.b_len, "cell ({i}, {j}) out of range");
        self.data[i * self.b_len + j]
    }

    /// All similarities of A's frame `i` against every frame of B.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.b_len..(i + 1) * self.b_len]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Normalized dot product in [-1, 1], truncated to the shorter slice when
/// lengths differ.
///
/// Exactly 0 when either vector has zero norm: the safeguard keeps silent
/// frames comparable instead of poisoning the matrix with NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = (norm_a * norm_b).sqrt();
    if denom > 0.0 { dot / denom } else { 0.0 }
}

/// Cosine similarity between every frame pair of two spectrograms.
///
/// Both spectrograms must share a stride. An empty side yields an empty
/// matrix. Cost is `O(a_len * b_len * stride)` — the dominant cost of the
/// whole engine for long clips. Every cell is independent of every other, so
/// the loop could be parallelized freely; the shipped implementation is
/// single-threaded.
pub fn similarity_matrix(
    a: &Spectrogram,
    b: &Spectrogram,
) -> Result<SimilarityMatrix, AnalysisError> {
    similarity_matrix_cancellable(a, b, &CancelToken::new())
}

/// Like [`similarity_matrix`], polling `cancel` once per A-frame row.
pub fn similarity_matrix_cancellable(
    a: &Spectrogram,
    b: &Spectrogram,
    cancel: &CancelToken,
) -> Result<SimilarityMatrix, AnalysisError> {
    if a.stride() != b.stride() {
        return Err(AnalysisError::StrideMismatch {
            left: a.stride(),
            right: b.stride(),
        });
    }

    // A frame's norm is shared by a whole row (or column) of cells; hoist
    // them out of the quadratic loop.
    let norms_a = frame_norms(a);
    let norms_b = frame_norms(b);

    let mut data = Vec::with_capacity(a.frame_count() * b.frame_count());
    for (i, frame_a) in a.frames().enumerate() {
        cancel.checkpoint()?;
        for (j, frame_b) in b.frames().enumerate() {
            let dot: f32 = frame_a.iter().zip(frame_b).map(|(&x, &y)| x * y).sum();
            let denom = norms_a[i] * norms_b[j];
            data.push(if denom > 0.0 { dot / denom } else { 0.0 });
        }
    }

    debug!(
        "similarity matrix: {} x {} cells at stride {}",
        a.frame_count(),
        b.frame_count(),
        a.stride(),
    );

    Ok(SimilarityMatrix {
        a_len: a.frame_count(),
        b_len: b.frame_count(),
        data,
    })
}

fn frame_norms(spectrogram: &Spectrogram) -> Vec<f32> {
    spectrogram
        .frames()
        .map(|frame| frame.iter().map(|&v| v * v).sum::<f32>().sqrt())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrogram(stride: usize, frames: &[&[f32]]) -> Spectrogram {
        let data = frames.iter().flat_map(|f| f.iter().copied()).collect();
        Spectrogram::from_frames(stride, data).expect("valid frames")
    }

    #[test]
    fn identical_frames_score_one_on_the_diagonal() {
        let a = spectrogram(4, &[&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]]);
        let matrix = similarity_matrix(&a, &a).expect("same stride");
        for i in 0..2 {
            assert!(
                (matrix.get(i, i) - 1.0).abs() < 1e-6,
                "diagonal cell {i} should be ~1.0"
            );
        }
    }

    #[test]
    fn matrix_is_structurally_symmetric() {
        let a = spectrogram(4, &[&[1.0, 0.0, 2.0, 0.5], &[0.0, 1.0, 0.0, 3.0]]);
        let b = spectrogram(
            4,
            &[&[2.0, 1.0, 0.0, 0.0], &[0.5, 0.5, 1.0, 1.0], &[1.0, 2.0, 3.0, 4.0]],
        );
        let ab = similarity_matrix(&a, &b).expect("same stride");
        let ba = similarity_matrix(&b, &a).expect("same stride");
        for i in 0..ab.a_len() {
            for j in 0..ab.b_len() {
                assert_eq!(ab.get(i, j), ba.get(j, i), "cell ({i}, {j})");
            }
        }
    }

    #[test]
    fn values_stay_within_the_cosine_range() {
        let a = spectrogram(4, &[&[1.0, 5.0, 0.25, 2.0], &[3.0, 0.0, 1.0, 0.0]]);
        let b = spectrogram(4, &[&[0.5, 0.5, 4.0, 1.0], &[2.0, 2.0, 2.0, 2.0]]);
        let matrix = similarity_matrix(&a, &b).expect("same stride");
        for &value in matrix.data() {
            assert!((-1.0..=1.0).contains(&value), "out of range: {value}");
        }
    }

    #[test]
    fn zero_norm_frame_scores_zero_everywhere() {
        let a = spectrogram(4, &[&[0.0, 0.0, 0.0, 0.0]]);
        let b = spectrogram(4, &[&[1.0, 2.0, 3.0, 4.0], &[0.0, 0.0, 0.0, 0.0]]);
        let matrix = similarity_matrix(&a, &b).expect("same stride");
        assert_eq!(matrix.row(0), &[0.0, 0.0]);
    }

    #[test]
    fn stride_mismatch_is_rejected() {
        let a = spectrogram(4, &[&[1.0, 2.0, 3.0, 4.0]]);
        let b = spectrogram(8, &[&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]]);
        assert_eq!(
            similarity_matrix(&a, &b),
            Err(AnalysisError::StrideMismatch { left: 4, right: 8 })
        );
    }

    #[test]
    fn empty_side_yields_an_empty_matrix() {
        let a = Spectrogram::from_frames(4, Vec::new()).expect("empty is valid");
        let b = spectrogram(4, &[&[1.0, 2.0, 3.0, 4.0]]);
        let matrix = similarity_matrix(&a, &b).expect("degenerate input is not an error");
        assert!(matrix.is_empty());
        assert_eq!(matrix.a_len(), 0);
        assert_eq!(matrix.b_len(), 1);
    }

    #[test]
    fn cancelled_token_stops_the_fill() {
        let a = spectrogram(4, &[&[1.0, 2.0, 3.0, 4.0]]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            similarity_matrix_cancellable(&a, &a, &cancel),
            Err(AnalysisError::Cancelled)
        );
    }

    #[test]
    fn free_function_matches_the_matrix_cells() {
        let u = [1.0, 2.0, 3.0, 4.0];
        let v = [4.0, 3.0, 2.0, 1.0];
        let a = spectrogram(4, &[&u]);
        let b = spectrogram(4, &[&v]);
        let matrix = similarity_matrix(&a, &b).expect("same stride");
        assert_eq!(matrix.get(0, 0), cosine_similarity(&u, &v));
    }
}
