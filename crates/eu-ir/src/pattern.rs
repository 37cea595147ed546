//! Euclidean onset patterns.
//!
//! A pattern is a fixed-width bitmask: bit `width - 1` is the first slot,
//! bit 0 the last. Slots set to 1 are onsets, slots set to 0 are rests.

use core::fmt;

use crate::error::PatternError;

/// Widest pattern a `u64` mask can hold.
pub const MAX_BEATS: u16 = 64;

/// An immutable onset pattern of `width` beat slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OnsetPattern {
    bits: u64,
    width: u16,
}

impl OnsetPattern {
    /// Build a pattern from raw bits. Bits above `width` are masked off.
    pub fn from_bits(bits: u64, width: u16) -> Self {
        let width = width.min(MAX_BEATS);
        Self {
            bits: bits & mask(width),
            width,
        }
    }

    /// All-rest pattern.
    pub const fn rests(width: u16) -> Self {
        Self { bits: 0, width }
    }

    /// Every slot set.
    pub fn all(width: u16) -> Self {
        Self::from_bits(u64::MAX, width)
    }

    pub const fn bits(&self) -> u64 {
        self.bits
    }

    /// Number of beat slots.
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Number of onsets (set slots).
    pub const fn onset_count(&self) -> u32 {
        self.bits.count_ones()
    }

    /// Whether slot `index` (0 = first slot) is an onset.
    pub fn slot(&self, index: u16) -> bool {
        if index >= self.width {
            return false;
        }
        (self.bits >> (self.width - 1 - index)) & 1 == 1
    }

    /// Iterate over the slots, first slot first.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.width).map(move |i| self.slot(i))
    }

    /// Rotate by `rotation` slots: positive moves the first slot to the end
    /// (left rotation of the mask), negative rotates right.
    pub fn rotated(self, rotation: i16) -> Self {
        if self.width == 0 {
            return self;
        }
        let width = self.width as i32;
        let k = (rotation as i32).rem_euclid(width) as u32;
        if k == 0 {
            return self;
        }
        let bits = (self.bits << k) | (self.bits >> (width as u32 - k));
        Self::from_bits(bits, self.width)
    }
}

impl fmt::Display for OnsetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for onset in self.iter() {
            f.write_str(if onset { "x" } else { "." })?;
        }
        Ok(())
    }
}

/// True when `onsets` cannot fit into `beats` and the pattern degrades
/// to "fire every slot".
pub const fn saturates(onsets: u16, beats: u16) -> bool {
    onsets > beats
}

/// Distribute `onsets` as evenly as possible across `beats` slots, then
/// rotate by `rotation`.
///
/// `onsets > beats` is not an error: every slot fires and a warning is
/// logged. Callers that need to surface it can check [`saturates`].
pub fn generate(onsets: u16, beats: u16, rotation: i16) -> Result<OnsetPattern, PatternError> {
    if beats == 0 {
        return Err(PatternError::InvalidBeats);
    }
    if beats > MAX_BEATS {
        return Err(PatternError::TooManyBeats { beats });
    }

    let pattern = if onsets == 0 {
        OnsetPattern::rests(beats)
    } else if saturates(onsets, beats) {
        log::warn!("{} onsets can't fit in {} beats, firing every beat", onsets, beats);
        OnsetPattern::all(beats)
    } else {
        interleave(onsets, beats)
    };

    Ok(pattern.rotated(rotation))
}

/// `count` repetitions of a `width`-slot sub-sequence.
#[derive(Clone, Copy, Debug)]
struct Group {
    count: u16,
    pattern: u64,
    width: u16,
}

impl Group {
    /// Concatenate `tail` onto each repetition of `self`.
    fn append(self, tail: Group) -> Group {
        Group {
            count: self.count,
            pattern: (self.pattern << tail.width) | tail.pattern,
            width: self.width + tail.width,
        }
    }
}

/// Two-group folding: keep folding the remainder group into the large one
/// until at most one remainder unit is left. Requires `0 < onsets <= beats`.
fn interleave(onsets: u16, beats: u16) -> OnsetPattern {
    let mut large = Group { count: onsets, pattern: 0b1, width: 1 };
    let mut small = Group { count: beats - onsets, pattern: 0b0, width: 1 };

    while small.count > 1 {
        if large.count <= small.count {
            small.count -= large.count;
            large = large.append(small);
        } else {
            let remainder = Group { count: large.count - small.count, ..large };
            large = Group { count: small.count, ..large.append(small) };
            small = remainder;
        }
    }

    let mut bits = large.pattern;
    for _ in 1..large.count {
        bits = (bits << large.width) | large.pattern;
    }
    if small.count > 0 {
        bits = (bits << small.width) | small.pattern;
    }
    OnsetPattern::from_bits(bits, beats)
}

const fn mask(width: u16) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
