//! Stopwatch timers scripts can start, stop and read.
//!
//! Timers accumulate the area's world-time delta while running. Reading a
//! timer gives seconds as a float.

use std::fmt;

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timer {
    running: bool,
    prev_ms: u64,
    elapsed_ms: u64,
}

impl Timer {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Zero the count. A running timer keeps running.
    pub fn reset(&mut self) {
        self.prev_ms = 0;
        self.elapsed_ms = 0;
    }

    pub fn tick(&mut self, delta_ms: u64) {
        if self.running {
            self.prev_ms = self.elapsed_ms;
            self.elapsed_ms += delta_ms;
        }
    }

    /// Seconds counted so far.
    pub fn count(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }

    /// True if the count crossed `seconds` during the last tick.
    pub fn crossed(&self, seconds: f64) -> bool {
        let mark = (seconds * 1000.0) as u64;
        self.prev_ms < mark && self.elapsed_ms >= mark
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<timer {:.3}s{}>", self.count(), if self.running { "" } else { " stopped" })
    }
}

/// Named timers of an area.
#[derive(Resource, Debug, Default, Clone)]
pub struct Timers {
    timers: FxHashMap<String, Timer>,
}

impl Timers {
    /// Get a timer, creating a stopped one if it does not exist.
    pub fn entry(&mut self, name: &str) -> &mut Timer {
        self.timers.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Timer> {
        self.timers.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Timer> {
        self.timers.remove(name)
    }

    /// Name and count of every timer, sorted by name.
    pub fn counts(&self) -> Vec<(String, f64)> {
        let mut counts: Vec<_> = self
            .timers
            .iter()
            .map(|(name, t)| (name.clone(), t.count()))
            .collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }

    pub fn advance(&mut self, delta_ms: u64) {
        for timer in self.timers.values_mut() {
            timer.tick(delta_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timers_do_not_count() {
        let mut timers = Timers::default();
        timers.entry("door");
        timers.advance(500);
        assert_eq!(timers.get("door").unwrap().count(), 0.0);

        timers.entry("door").set_running(true);
        timers.advance(1500);
        assert_eq!(timers.get("door").unwrap().count(), 1.5);
        assert!(timers.get("door").unwrap().crossed(1.0));

        timers.advance(100);
        assert!(!timers.get("door").unwrap().crossed(1.0));
    }

    #[test]
    fn reset_keeps_running_state() {
        let mut timer = Timer::default();
        timer.set_running(true);
        timer.tick(250);
        timer.reset();
        assert_eq!(timer.count(), 0.0);
        assert!(timer.is_running());
        assert_eq!(timer.to_string(), "<timer 0.000s>");
    }
}
