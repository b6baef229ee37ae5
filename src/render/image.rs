//! Rasterization of analysis artifacts into RGBA images.

use crate::dsp::similarity::SimilarityMatrix;
use crate::dsp::spectrum::Spectrogram;
use crate::render::RgbaImage;
use crate::render::palette::ColorTable;

/// Gamma applied to normalized magnitudes before lookup; compresses dynamic
/// range so quiet content stays visible.
const MAGNITUDE_GAMMA: f32 = 0.3;

/// Render a spectrogram as a `frame_count x stride` intensity map.
///
/// Pixel `(x, y)` shows bin `y` of frame `x`: time runs horizontally, bin 0
/// at the top. Magnitudes are normalized against the global peak, not per
/// frame. A silent spectrogram has a peak of zero; every value then scales
/// to 0 instead of dividing by zero.
pub fn colorize_spectrogram(spectrogram: &Spectrogram, table: &ColorTable) -> RgbaImage {
    let mut image = RgbaImage::new(spectrogram.frame_count(), spectrogram.stride());
    let max = spectrogram.max_magnitude();
    for (x, frame) in spectrogram.frames().enumerate() {
        for (y, &value) in frame.iter().enumerate() {
            let scaled = if max == 0.0 {
                0.0
            } else {
                (value / max).powf(MAGNITUDE_GAMMA)
            };
            image.put_pixel(x, y, table.color_for(scaled));
        }
    }
    image
}

/// Render a similarity matrix as a `b_len x a_len` heat map for the overlay
/// renderer that draws the alignment path on top.
///
/// Cell `(i, j)` lands at pixel `(x = j, y = i)`, so both axes read as time.
/// Similarities are looked up directly, clamped to [0, 1]; anti-correlated
/// frames render at the cold end of the scale.
pub fn colorize_similarity(matrix: &SimilarityMatrix, table: &ColorTable) -> RgbaImage {
    let mut image = RgbaImage::new(matrix.b_len(), matrix.a_len());
    for i in 0..matrix.a_len() {
        for j in 0..matrix.b_len() {
            let value = matrix.get(i, j).clamp(0.0, 1.0);
            image.put_pixel(j, i, table.color_for(value));
        }
    }
    image
}
