//! Frame slicing: fixed-size, non-overlapping windows over a sample buffer.

use std::slice::ChunksExact;

use crate::dsp::AnalysisError;

/// Smallest frame length the transform stage can plan.
pub const MIN_FFT_SIZE: usize = 2;
/// Largest frame length the transform stage can plan.
pub const MAX_FFT_SIZE: usize = 4096;

/// Rejects frame lengths outside the supported power-of-two range.
///
/// Called at every construction boundary so bad configuration never reaches
/// a transform.
pub fn validate_fft_size(fft_size: usize) -> Result<(), AnalysisError> {
    if fft_size.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
        Ok(())
    } else {
        Err(AnalysisError::UnsupportedFftSize(fft_size))
    }
}

/// Number of whole frames in `len` samples. The `len % fft_size` tail is
/// discarded, never padded.
pub fn frame_count(len: usize, fft_size: usize) -> usize {
    len / fft_size
}

/// Iterate whole frames of exactly `fft_size` contiguous samples.
///
/// No overlap and no window function: each frame is the raw slice. Callers
/// validate `fft_size` up front via [`validate_fft_size`]; slicing itself is
/// size-agnostic.
pub fn frames(samples: &[f32], fft_size: usize) -> ChunksExact<'_, f32> {
    samples.chunks_exact(fft_size)
}
