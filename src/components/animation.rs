//! Time-driven animation clock.
//!
//! An [`AnimationClock`] never advances on its own. The frame to show is
//! derived purely from `now - origin`, so an animation is correct after any
//! gap between polls (a paused process, a long load) with no drift and no
//! catch-up work.
//!
//! Cycle counting:
//!
//! - `0` – static: the shown frame never changes.
//! - [`INFINITE_CYCLES`] – repeat forever.
//! - `N > 0` – play `N` full cycles, then freeze on the last frame. The freeze
//!   is permanent until [`AnimationClock::start_over`] re-arms the clock.

use std::sync::Arc;

use smallvec::SmallVec;

/// Key of an image owned by the host's resource cache.
pub type ImageKey = Arc<str>;

/// Sentinel cycle count meaning "repeat forever".
pub const INFINITE_CYCLES: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClock {
    frames: SmallVec<[ImageKey; 4]>,
    /// Milliseconds each frame is shown.
    frame_len: u64,
    cycles: i32,
    origin: u64,
    frame_showing: usize,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self {
            frames: SmallVec::new(),
            frame_len: 0,
            cycles: 0,
            origin: 0,
            frame_showing: 0,
        }
    }
}

impl AnimationClock {
    /// A single still image.
    pub fn still(frame: impl Into<ImageKey>) -> Self {
        let mut frames = SmallVec::new();
        frames.push(frame.into());
        Self {
            frames,
            ..Self::default()
        }
    }

    /// A cycling animation starting at time 0, repeating forever.
    ///
    /// Animations with fewer than two frames or a zero frame length are static.
    pub fn cycling<I, K>(frames: I, frame_len_ms: u64) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ImageKey>,
    {
        let frames: SmallVec<[ImageKey; 4]> = frames.into_iter().map(Into::into).collect();
        let cycles = if frames.len() > 1 && frame_len_ms > 0 {
            INFINITE_CYCLES
        } else {
            0
        };
        Self {
            frames,
            frame_len: frame_len_ms,
            cycles,
            origin: 0,
            frame_showing: 0,
        }
    }

    /// Restart from frame 0 at `now`, playing `cycles` more cycles.
    ///
    /// # Panics
    ///
    /// If `cycles` is negative and not [`INFINITE_CYCLES`].
    pub fn start_over(&mut self, now: u64, cycles: i32) {
        assert!(
            cycles >= 0 || cycles == INFINITE_CYCLES,
            "invalid animation cycle count {cycles}"
        );
        self.origin = now;
        self.cycles = if self.can_cycle() { cycles } else { 0 };
        self.frame_showing = 0;
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_len(&self) -> u64 {
        self.frame_len
    }

    pub fn cycles_remaining(&self) -> i32 {
        self.cycles
    }

    /// Index of the frame most recently returned by [`frame`](Self::frame).
    pub fn frame_showing(&self) -> usize {
        self.frame_showing
    }

    pub fn is_static(&self) -> bool {
        self.cycles == 0
    }

    /// The image to show at `now`, updating the shown-frame index.
    ///
    /// Returns `None` only for an animation without frames.
    pub fn frame(&mut self, now: u64) -> Option<&ImageKey> {
        if self.frames.is_empty() {
            return None;
        }
        if !self.is_static() {
            match self.index_at(now) {
                Progress::Cycling(idx) => self.frame_showing = idx,
                Progress::Finished => {
                    self.cycles = 0;
                    self.frame_showing = self.frames.len() - 1;
                }
            }
        }
        self.frames.get(self.frame_showing)
    }

    /// Whether the frame at `now` differs from the one last shown.
    ///
    /// A static animation, including one whose cycles ran out, never asks for
    /// a redraw.
    pub fn needs_redraw(&self, now: u64) -> bool {
        if self.is_static() || self.frames.is_empty() {
            return false;
        }
        let idx = match self.index_at(now) {
            Progress::Cycling(idx) => idx,
            Progress::Finished => self.frames.len() - 1,
        };
        idx != self.frame_showing
    }

    fn can_cycle(&self) -> bool {
        self.frames.len() > 1 && self.frame_len > 0
    }

    fn index_at(&self, now: u64) -> Progress {
        let cycle_len = self.frame_len * self.frames.len() as u64;
        let elapsed = now.saturating_sub(self.origin);
        if self.cycles > 0 && elapsed / cycle_len >= self.cycles as u64 {
            return Progress::Finished;
        }
        Progress::Cycling(((elapsed % cycle_len) / self.frame_len) as usize)
    }
}

enum Progress {
    Cycling(usize),
    Finished,
}
