//! Host transport tracking.
//!
//! The host reports position objects carrying any subset of tempo, meter,
//! bar, frame, frame rate and speed. `TransportState` keeps the latest
//! values and reports which derived data went stale.

/// A partial transport update. Absent fields keep their previous value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransportUpdate {
    pub speed: Option<f32>,
    pub frames_per_second: Option<f32>,
    pub beats_per_minute: Option<f32>,
    pub beats_per_bar: Option<f32>,
    pub bar: Option<i64>,
    pub frame: Option<i64>,
}

impl TransportUpdate {
    /// A full position report, as most hosts send once per block while rolling.
    pub fn position(bar: i64, frame: i64, beats_per_minute: f32, beats_per_bar: f32) -> Self {
        Self {
            speed: Some(1.0),
            frames_per_second: None,
            beats_per_minute: Some(beats_per_minute),
            beats_per_bar: Some(beats_per_bar),
            bar: Some(bar),
            frame: Some(frame),
        }
    }
}

/// What an applied update invalidated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportChange {
    /// Frame-per-beat geometry changed: every timeline is stale
    pub geometry: bool,
    /// A new bar was observed, starting at `frame`
    pub bar: Option<BarStart>,
    /// Speed went from rolling to stopped
    pub stopped: bool,
}

impl TransportChange {
    pub fn is_empty(&self) -> bool {
        !self.geometry && self.bar.is_none() && !self.stopped
    }
}

/// A bar boundary reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarStart {
    pub bar: i64,
    pub frame: i64,
}

/// Longest bar a timeline can lay out: a cycle of `u16::MAX` such bars
/// still fits in an `i64` frame count.
pub const MAX_FRAMES_PER_BAR: i64 = i64::MAX / (u16::MAX as i64 + 1);

/// Frame counts derived from tempo, meter and frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Frames in one bar, truncated
    pub frames_per_bar: i64,
    /// Minimum note length: one MIDI clock (1/24 beat), truncated
    pub frames_per_tick: i64,
}

impl Geometry {
    /// `None` until tempo, meter and frame rate are all usable.
    pub fn from_transport(transport: &TransportState) -> Option<Self> {
        Self::new(transport.frames_per_second, transport.beats_per_minute, transport.beats_per_bar)
    }

    /// Geometry for explicit values. `None` when they yield no whole frame
    /// per bar.
    pub fn new(frames_per_second: f32, beats_per_minute: f32, beats_per_bar: f32) -> Option<Self> {
        let fps = frames_per_second as f64;
        let bpm = beats_per_minute as f64;
        let bpb = beats_per_bar as f64;
        if ![fps, bpm, bpb].iter().all(|v| v.is_finite() && *v > 0.0) {
            return None;
        }
        let frames_per_bar = (60.0 * fps / bpm * bpb) as i64;
        let frames_per_tick = ((60.0 * fps) / (bpm * 24.0)) as i64;
        if frames_per_bar <= 0 || frames_per_bar > MAX_FRAMES_PER_BAR {
            return None;
        }
        Some(Self { frames_per_bar, frames_per_tick })
    }

    pub fn frames_per_cycle(&self, bars_per_cycle: u16) -> i64 {
        self.frames_per_bar.saturating_mul(bars_per_cycle as i64)
    }

    /// Spacing between consecutive slots of a `beats`-slot cycle.
    pub fn delta(&self, bars_per_cycle: u16, beats: u16) -> i64 {
        if beats == 0 {
            return 0;
        }
        self.frames_per_cycle(bars_per_cycle) / beats as i64
    }
}

/// Transport values shared by every generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportState {
    pub speed: f32,
    pub frames_per_second: f32,
    pub beats_per_minute: f32,
    pub beats_per_bar: f32,
    /// Last bar reported by the host, -1 before the first report
    pub current_bar: i64,
    /// Absolute frame at the current position
    pub last_known_frame: i64,
}

impl TransportState {
    /// Stream-start state: stopped, no tempo, no bar observed yet.
    pub fn new(frames_per_second: f32) -> Self {
        Self {
            speed: 0.0,
            frames_per_second,
            beats_per_minute: 0.0,
            beats_per_bar: 0.0,
            current_bar: -1,
            last_known_frame: 0,
        }
    }

    /// Tempo, meter and frame rate are all positive and finite.
    pub fn is_valid(&self) -> bool {
        [self.frames_per_second, self.beats_per_minute, self.beats_per_bar]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    pub fn is_rolling(&self) -> bool {
        self.speed > 0.0
    }

    pub fn geometry(&self) -> Option<Geometry> {
        Geometry::from_transport(self)
    }

    /// Apply a host update. Re-applying an update that's already in effect
    /// reports no change.
    pub fn apply(&mut self, update: &TransportUpdate) -> TransportChange {
        let mut change = TransportChange::default();

        if let Some(frame) = update.frame {
            self.last_known_frame = frame;
        }

        if let Some(speed) = update.speed.filter(|s| s.is_finite()) {
            if self.is_rolling() && speed <= 0.0 {
                change.stopped = true;
            }
            self.speed = speed;
        }

        for (incoming, current, what) in [
            (update.frames_per_second, &mut self.frames_per_second, "frame rate"),
            (update.beats_per_minute, &mut self.beats_per_minute, "tempo"),
            (update.beats_per_bar, &mut self.beats_per_bar, "beats per bar"),
        ] {
            match incoming {
                Some(value) if !value.is_finite() => {
                    log::debug!("ignoring non-finite {} from host", what);
                }
                Some(value) if value != *current => {
                    log::debug!("{} changed to {}, timelines are stale", what, value);
                    *current = value;
                    change.geometry = true;
                }
                _ => {}
            }
        }

        if let Some(bar) = update.bar {
            if bar != self.current_bar {
                log::debug!("bar changed to {} at frame {}", bar, self.last_known_frame);
                self.current_bar = bar;
                change.bar = Some(BarStart { bar, frame: self.last_known_frame });
            }
        }

        change
    }

    /// Move the playhead forward by `frames` if the transport is rolling.
    pub fn advance(&mut self, frames: u32) {
        if self.is_rolling() {
            self.last_known_frame += frames as i64;
        }
    }
}
