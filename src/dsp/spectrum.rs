//! Spectral analysis: per-frame FFT magnitudes over a framed clip.

use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use tracing::debug;

use crate::dsp::framing;
use crate::dsp::{AnalysisError, CancelToken};

/// Time-ordered magnitude spectra, one `stride`-bin row per frame, stored as
/// a single frame-major buffer.
///
/// The full symmetric FFT output is kept: for real input, bins above
/// `stride / 2` mirror the lower half. That redundancy is deliberate — the
/// intensity map renders every bin, and downstream consumers rely on rows
/// being exactly `stride` wide. All values are magnitudes, so never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    stride: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    /// Rebuild a spectrogram from an existing frame-major buffer, e.g. a
    /// cached analysis. The buffer must hold a whole number of frames.
    pub fn from_frames(stride: usize, data: Vec<f32>) -> Result<Self, AnalysisError> {
        framing::validate_fft_size(stride)?;
        if data.len() % stride != 0 {
            return Err(AnalysisError::RaggedBuffer {
                len: data.len(),
                stride,
            });
        }
        Ok(Self { stride, data })
    }

    /// Bins per frame; equals the FFT size the spectrogram was built with.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn frame_count(&self) -> usize {
        self.data.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Magnitudes of frame `index`.
    ///
    /// Panics if `index` is out of range, like slice indexing.
    pub fn frame(&self, index: usize) -> &[f32] {
        &self.data[index * self.stride..(index + 1) * self.stride]
    }

    /// Iterate frames in time order.
    pub fn frames(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.stride)
    }

    /// The flat frame-major buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Global magnitude peak; 0.0 for an empty spectrogram.
    pub fn max_magnitude(&self) -> f32 {
        self.data.iter().fold(0.0f32, |max, &value| max.max(value))
    }
}

/// Per-frame forward FFT with magnitude output.
///
/// Plans the transform once and reuses its input and scratch buffers across
/// frames and across calls; the input buffer is fully rewritten before every
/// frame, so no state leaks from one frame to the next.
pub struct SpectrumProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    input: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl SpectrumProcessor {
    pub fn new(fft_size: usize) -> Result<Self, AnalysisError> {
        framing::validate_fft_size(fft_size)?;
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Ok(Self {
            fft_size,
            input: vec![Complex32::new(0.0, 0.0); fft_size],
            scratch,
            fft,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Transform a clip into its spectrogram.
    ///
    /// Samples past the last whole frame are discarded; fewer samples than
    /// one frame yield an empty spectrogram. The transform applies no window
    /// function and no overlap, and contains no log or division, so finite
    /// input can never produce NaN or infinity.
    pub fn process(&mut self, samples: &[f32]) -> Spectrogram {
        let frames = framing::frame_count(samples.len(), self.fft_size);
        let mut data = Vec::with_capacity(frames * self.fft_size);
        for frame in framing::frames(samples, self.fft_size) {
            self.transform_frame(frame, &mut data);
        }
        debug!("spectrogram: {} frames x {} bins", frames, self.fft_size);
        Spectrogram {
            stride: self.fft_size,
            data,
        }
    }

    /// Like [`Self::process`], polling `cancel` before each frame.
    pub fn process_cancellable(
        &mut self,
        samples: &[f32],
        cancel: &CancelToken,
    ) -> Result<Spectrogram, AnalysisError> {
        let frames = framing::frame_count(samples.len(), self.fft_size);
        let mut data = Vec::with_capacity(frames * self.fft_size);
        for frame in framing::frames(samples, self.fft_size) {
            cancel.checkpoint()?;
            self.transform_frame(frame, &mut data);
        }
        Ok(Spectrogram {
            stride: self.fft_size,
            data,
        })
    }

    fn transform_frame(&mut self, frame: &[f32], out: &mut Vec<f32>) {
        // Overwrite every slot: the buffer still holds the previous frame's
        // in-place FFT output.
        for (slot, &sample) in self.input.iter_mut().zip(frame) {
            *slot = Complex32::new(sample, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.input, &mut self.scratch);
        out.extend(self.input.iter().map(|bin| bin.norm()));
    }
}
