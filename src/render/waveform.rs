//! Amplitude preview polyline for a clip.

/// Map samples onto a `width x height` canvas as polyline points.
///
/// `x` sweeps the clip duration left to right; `y` places -1.0 at the top
/// edge and +1.0 at the bottom, matching the recorder's preview orientation.
/// An empty clip produces no points.
pub fn waveform_points(samples: &[f32], width: f32, height: f32) -> Vec<(f32, f32)> {
    let len = samples.len();
    samples
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let x = i as f32 / len as f32 * width;
            let y = (sample + 1.0) / 2.0 * height;
            (x, y)
        })
        .collect()
}
