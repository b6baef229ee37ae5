//! Color lookup tables for intensity maps.

use serde::{Deserialize, Serialize};

/// Entries in a lookup table; lookups index `floor(value * TABLE_SIZE)`
/// clamped into the table.
pub const TABLE_SIZE: usize = 255;

/// Returned for non-finite or out-of-range lookups. Loud on purpose: a bad
/// value should be visible in the output, not silently black.
pub const SENTINEL_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Immutable scalar-to-RGBA lookup table.
///
/// Built once from gradient stops and passed to the rasterizers explicitly;
/// there is no process-wide table and no hidden initialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTable {
    entries: Vec<[u8; 4]>,
}

impl ColorTable {
    /// Interpolate evenly spaced gradient stops into a fixed table.
    ///
    /// A single stop produces a constant table; no stops at all produce a
    /// table of sentinel entries.
    pub fn from_stops(stops: &[[u8; 4]]) -> Self {
        let entries = match stops {
            [] => vec![SENTINEL_COLOR; TABLE_SIZE],
            [only] => vec![*only; TABLE_SIZE],
            _ => {
                let max_index = (TABLE_SIZE - 1) as f32;
                let segments = (stops.len() - 1) as f32;
                (0..TABLE_SIZE)
                    .map(|i| {
                        let position = i as f32 / max_index * segments;
                        let segment = (position.floor() as usize).min(stops.len() - 2);
                        let t = position - segment as f32;
                        lerp_rgba(stops[segment], stops[segment + 1], t)
                    })
                    .collect()
            }
        };
        Self { entries }
    }

    /// Diverging blue -> green -> red scale used by the comparison view,
    /// fully opaque across the range.
    pub fn diverging() -> Self {
        Self::from_stops(&[[0, 0, 255, 255], [0, 255, 0, 255], [255, 0, 0, 255]])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Table entry for a scalar in [0, 1]: `floor(value * len)` clamped to
    /// the last entry. Non-finite or out-of-range values get
    /// [`SENTINEL_COLOR`].
    pub fn color_for(&self, value: f32) -> [u8; 4] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return SENTINEL_COLOR;
        }
        let index = ((value * self.entries.len() as f32) as usize).min(self.entries.len() - 1);
        self.entries[index]
    }
}

fn lerp_rgba(lo: [u8; 4], hi: [u8; 4], t: f32) -> [u8; 4] {
    let mut out = [0u8; 4];
    for channel in 0..4 {
        let lo = lo[channel] as f32;
        let hi = hi[channel] as f32;
        out[channel] = (lo + (hi - lo) * t).round() as u8;
    }
    out
}
