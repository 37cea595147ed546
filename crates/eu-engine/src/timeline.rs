//! Onset/offset frame vectors for one pattern cycle.

use eu_ir::{OnsetPattern, MAX_BEATS};
use heapless::Vec;

use crate::transport::Geometry;

/// Terminal entry larger than any realizable frame. Cursor scans stop on it
/// without a separate bounds check.
pub const SENTINEL: i64 = i64::MAX;

const CAPACITY: usize = MAX_BEATS as usize + 1;

/// Absolute frames of each onset and its matching offset, in pattern order,
/// each terminated by [`SENTINEL`].
///
/// Storage is inline, so recomputing never allocates.
#[derive(Clone, Debug)]
pub struct Timeline {
    onsets: Vec<i64, CAPACITY>,
    offsets: Vec<i64, CAPACITY>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// An empty timeline holding only the sentinels.
    pub fn new() -> Self {
        let mut timeline = Self { onsets: Vec::new(), offsets: Vec::new() };
        timeline.clear();
        timeline
    }

    /// Build a timeline from explicit frames. `None` if the vectors differ
    /// in length or hold more than [`MAX_BEATS`] entries.
    pub fn from_frames(onsets: &[i64], offsets: &[i64]) -> Option<Self> {
        if onsets.len() != offsets.len() || onsets.len() > MAX_BEATS as usize {
            return None;
        }
        let mut timeline = Self { onsets: Vec::new(), offsets: Vec::new() };
        timeline.onsets.extend_from_slice(onsets).ok()?;
        timeline.offsets.extend_from_slice(offsets).ok()?;
        timeline.terminate();
        Some(timeline)
    }

    /// Drop every real entry, keeping the sentinels.
    pub fn clear(&mut self) {
        self.onsets.clear();
        self.offsets.clear();
        self.terminate();
    }

    /// Lay out one cycle of `pattern` starting at `reference_frame`.
    ///
    /// Slot `i` lands at `reference_frame + i * delta`; the rounding error of
    /// `delta` accumulates across the cycle and is absorbed by the next
    /// resynchronization. Every offset is its onset plus one tick, even when
    /// that overlaps the next onset.
    pub fn recompute(
        &mut self,
        pattern: &OnsetPattern,
        bars_per_cycle: u16,
        reference_frame: i64,
        geometry: Geometry,
    ) {
        self.onsets.clear();
        self.offsets.clear();

        let delta = geometry.delta(bars_per_cycle, pattern.width());
        let mut frame = reference_frame;
        for onset in pattern.iter() {
            if onset {
                // At most MAX_BEATS onsets, so the pushes always fit.
                let _ = self.onsets.push(frame);
                let _ = self.offsets.push(frame.saturating_add(geometry.frames_per_tick));
            }
            frame = frame.saturating_add(delta);
        }
        self.terminate();
    }

    fn terminate(&mut self) {
        let _ = self.onsets.push(SENTINEL);
        let _ = self.offsets.push(SENTINEL);
    }

    /// Number of real (non-sentinel) entries.
    pub fn len(&self) -> usize {
        self.onsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Onset frame at `index`, or the sentinel past the end.
    #[inline]
    pub fn onset(&self, index: usize) -> i64 {
        self.onsets.get(index).copied().unwrap_or(SENTINEL)
    }

    /// Offset frame at `index`, or the sentinel past the end.
    #[inline]
    pub fn offset(&self, index: usize) -> i64 {
        self.offsets.get(index).copied().unwrap_or(SENTINEL)
    }

    /// Onset frames including the sentinel.
    pub fn onsets(&self) -> &[i64] {
        &self.onsets
    }

    /// Offset frames including the sentinel.
    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    /// Index of the first onset at or after `frame`.
    pub fn first_onset_from(&self, frame: i64) -> usize {
        self.onsets[..self.len()].partition_point(|&f| f < frame)
    }
}
