//! Core analysis engine: framing, spectral transform, similarity, alignment.
//!
//! Every stage is a pure function over immutable inputs producing a new owned
//! buffer. There is no shared state between invocations, so embedding hosts
//! can run independent comparisons concurrently without coordination.

pub mod alignment;
pub mod framing;
pub mod similarity;
pub mod spectrum;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dsp::alignment::Alignment;
use crate::dsp::similarity::SimilarityMatrix;
use crate::dsp::spectrum::{Spectrogram, SpectrumProcessor};

/// Frame length used when the host does not configure one; matches the
/// resolution the comparison view was designed around.
pub const DEFAULT_FFT_SIZE: usize = 512;

/// Failures surfaced at stage boundaries.
///
/// All of these are deterministic: retrying a failed stage would reproduce
/// the same result, so callers should treat them as final.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("unsupported FFT size {0}: expected a power of two between 2 and 4096")]
    UnsupportedFftSize(usize),
    #[error("spectrogram stride mismatch: {left} vs {right}")]
    StrideMismatch { left: usize, right: usize },
    #[error("spectrogram buffer of {len} values is not a whole number of {stride}-bin frames")]
    RaggedBuffer { len: usize, stride: usize },
    #[error("cannot align against an empty {0} spectrogram")]
    EmptySpectrogram(&'static str),
    #[error("analysis cancelled")]
    Cancelled,
}

/// Decoded mono audio handed in by the capture/decode layer.
///
/// Samples are read as-is: channel selection and down-mixing are the caller's
/// job. The sample rate is carried for time-axis labelling and is not
/// consulted by the transforms themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl AudioClip {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }
}

/// Engine configuration.
///
/// `fft_size` doubles as the frame length and as the stride shared by the
/// similarity and alignment stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub fft_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
        }
    }
}

/// Cooperative cancellation flag polled between stage iterations (per FFT
/// frame, per similarity or alignment row). Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn checkpoint(&self) -> Result<(), AnalysisError> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Everything the comparison view needs for a pair of clips.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub spectrogram_a: Spectrogram,
    pub spectrogram_b: Spectrogram,
    pub similarity: SimilarityMatrix,
    pub alignment: Alignment,
}

/// Run the full comparison pipeline: both spectrograms, the cross-similarity
/// matrix, and the alignment path.
///
/// Fails fast on configuration errors; a clip shorter than one frame leaves
/// nothing to align and is rejected by the alignment stage.
pub fn compare_clips(
    a: &AudioClip,
    b: &AudioClip,
    config: AnalysisConfig,
) -> Result<Comparison, AnalysisError> {
    compare_clips_cancellable(a, b, config, &CancelToken::new())
}

/// Like [`compare_clips`], polling `cancel` at stage boundaries.
pub fn compare_clips_cancellable(
    a: &AudioClip,
    b: &AudioClip,
    config: AnalysisConfig,
    cancel: &CancelToken,
) -> Result<Comparison, AnalysisError> {
    let mut processor = SpectrumProcessor::new(config.fft_size)?;
    let spectrogram_a = processor.process_cancellable(&a.samples, cancel)?;
    let spectrogram_b = processor.process_cancellable(&b.samples, cancel)?;

    let similarity =
        similarity::similarity_matrix_cancellable(&spectrogram_a, &spectrogram_b, cancel)?;
    let alignment = alignment::align_cancellable(&spectrogram_a, &spectrogram_b, cancel)?;

    debug!(
        "compared clips: {} x {} frames at stride {}, alignment cost {:.4}",
        spectrogram_a.frame_count(),
        spectrogram_b.frame_count(),
        config.fft_size,
        alignment.cost,
    );

    Ok(Comparison {
        spectrogram_a,
        spectrogram_b,
        similarity,
        alignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_clip(frequency_hz: f32, sample_rate: u32, len: usize) -> AudioClip {
        let samples = (0..len)
            .map(|n| (n as f32 / sample_rate as f32 * frequency_hz * std::f32::consts::TAU).sin())
            .collect();
        AudioClip::new(sample_rate, samples)
    }

    #[test]
    fn identical_clips_align_on_the_diagonal() {
        let clip = sine_clip(440.0, 44_100, 2048);
        let comparison =
            compare_clips(&clip, &clip, AnalysisConfig::default()).expect("pipeline runs");

        assert_eq!(comparison.spectrogram_a.frame_count(), 4);
        assert_eq!(comparison.spectrogram_b.frame_count(), 4);

        for i in 0..4 {
            let on_diagonal = comparison.similarity.get(i, i);
            assert!(
                (on_diagonal - 1.0).abs() < 1e-4,
                "diagonal cell ({i}, {i}) should be ~1.0, saw {on_diagonal}"
            );
        }

        let identity: Vec<_> = (0..4).map(|i| (i, i)).collect();
        assert_eq!(comparison.alignment.path, identity);
        assert!(comparison.alignment.cost.abs() < 1e-4);
    }

    #[test]
    fn frame_shifted_clip_aligns_off_by_one() {
        // B drops A's first frame, so B's frame k is sample-identical to
        // A's frame k + 1; the cheapest path hugs the shifted diagonal and
        // only the unmatched opening frame costs anything.
        let a = sine_clip(440.0, 44_100, 2048);
        let b = AudioClip::new(a.sample_rate, a.samples[512..].to_vec());
        let comparison = compare_clips(&a, &b, AnalysisConfig::default()).expect("pipeline runs");

        let path = &comparison.alignment.path;
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(3, 2)));
        for pair in [(1, 0), (2, 1), (3, 2)] {
            assert!(path.contains(&pair), "path {path:?} misses {pair:?}");
        }

        // Matched frames are bitwise identical, so the whole cost is the
        // single unmatched pairing at the start.
        let expected = alignment::cosine_distance(
            comparison.spectrogram_a.frame(0),
            comparison.spectrogram_b.frame(0),
        );
        assert!((comparison.alignment.cost - expected).abs() < 1e-5);

        // And strictly cheaper than pairing frames index-for-index.
        let index_for_index: f32 = (0..3)
            .map(|i| {
                alignment::cosine_distance(
                    comparison.spectrogram_a.frame(i),
                    comparison.spectrogram_b.frame(i),
                )
            })
            .sum();
        assert!(comparison.alignment.cost <= index_for_index);
    }

    #[test]
    fn unsupported_fft_size_is_rejected_before_any_work() {
        let clip = sine_clip(440.0, 44_100, 2048);
        let config = AnalysisConfig { fft_size: 300 };
        assert_eq!(
            compare_clips(&clip, &clip, config).err(),
            Some(AnalysisError::UnsupportedFftSize(300))
        );
    }

    #[test]
    fn short_clip_fails_at_the_alignment_stage() {
        let long = sine_clip(440.0, 44_100, 2048);
        let short = sine_clip(440.0, 44_100, 100);
        assert_eq!(
            compare_clips(&long, &short, AnalysisConfig::default()).err(),
            Some(AnalysisError::EmptySpectrogram("right"))
        );
    }

    #[test]
    fn cancelled_token_aborts_the_pipeline() {
        let clip = sine_clip(440.0, 44_100, 2048);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            compare_clips_cancellable(&clip, &clip, AnalysisConfig::default(), &cancel).err(),
            Some(AnalysisError::Cancelled)
        );
    }

    #[test]
    fn clip_duration_uses_the_sample_rate() {
        let clip = AudioClip::new(44_100, vec![0.0; 44_100]);
        assert!((clip.duration_secs() - 1.0).abs() < f32::EPSILON);
        assert_eq!(clip.len(), 44_100);
        assert!(!clip.is_empty());
    }
}
