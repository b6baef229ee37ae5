//! Audio spectral comparison engine.
//!
//! Turns decoded mono clips into magnitude spectrograms, renders them as RGBA
//! intensity maps, scores two clips against each other with a cosine
//! cross-similarity matrix, and aligns them with dynamic time warping.
//! Capture, decoding, and presentation belong to the embedding application;
//! this crate only ever sees `f32` samples and hands back owned buffers.
//!
//! ```
//! use wavematch::{AnalysisConfig, AudioClip, compare_clips};
//!
//! let sine = |n: usize| (n as f32 / 44_100.0 * 440.0 * std::f32::consts::TAU).sin();
//! let a = AudioClip::new(44_100, (0..4096).map(sine).collect());
//! let b = a.clone();
//!
//! let comparison = compare_clips(&a, &b, AnalysisConfig::default())?;
//! assert_eq!(comparison.alignment.path.first(), Some(&(0, 0)));
//! # Ok::<(), wavematch::AnalysisError>(())
//! ```

pub mod dsp;
pub mod render;
pub mod util;

pub use dsp::alignment::{Alignment, align};
pub use dsp::similarity::{SimilarityMatrix, cosine_similarity, similarity_matrix};
pub use dsp::spectrum::{Spectrogram, SpectrumProcessor};
pub use dsp::{
    AnalysisConfig, AnalysisError, AudioClip, CancelToken, Comparison, compare_clips,
    compare_clips_cancellable,
};
pub use render::RgbaImage;
pub use render::image::{colorize_similarity, colorize_spectrogram};
pub use render::palette::ColorTable;
