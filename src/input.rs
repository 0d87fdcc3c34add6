//! Analog keyboard input.

use std::collections::BTreeMap;

use embassy_time::Instant;

use crate::{
    grid::GridSize,
    keymap::{KeyMap, KeyPosition},
};

/// Pressure below which a key counts as released.
pub const PRESS_THRESHOLD: f32 = 0.01;

/// Snapshot of every pressed key for one tick.
///
/// Pressures are normalized to `0.0..=1.0`. Keys that are not pressed are
/// absent.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardState {
    pressures: BTreeMap<u16, f32>,
    timestamp: Instant,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::empty(Instant::from_ticks(0))
    }
}

impl KeyboardState {
    /// A snapshot with no key pressed
    pub fn empty(timestamp: Instant) -> Self {
        Self {
            pressures: BTreeMap::new(),
            timestamp,
        }
    }

    /// Build a snapshot from `(scan code, pressure)` pairs.
    ///
    /// Pressures are clamped into range; non-positive ones are dropped.
    pub fn from_pressures<I>(timestamp: Instant, pressures: I) -> Self
    where
        I: IntoIterator<Item = (u16, f32)>,
    {
        let mut state = Self::empty(timestamp);
        for (code, pressure) in pressures {
            state.press(code, pressure);
        }
        state
    }

    /// Record a key pressure
    pub fn press(&mut self, code: u16, pressure: f32) {
        if pressure.is_nan() || pressure <= 0.0 {
            self.pressures.remove(&code);
            return;
        }
        self.pressures.insert(code, pressure.min(1.0));
    }

    #[must_use]
    pub fn with_key(mut self, code: u16, pressure: f32) -> Self {
        self.press(code, pressure);
        self
    }

    pub const fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Pressure of a key, zero when released
    pub fn pressure(&self, code: u16) -> f32 {
        self.pressures.get(&code).copied().unwrap_or(0.0)
    }

    pub fn is_pressed(&self, code: u16) -> bool {
        self.pressures.contains_key(&code)
    }

    /// Iterate over `(scan code, pressure)` in scan code order
    pub fn iter(&self) -> impl Iterator<Item = (u16, f32)> + '_ {
        self.pressures.iter().map(|(&code, &pressure)| (code, pressure))
    }

    pub fn len(&self) -> usize {
        self.pressures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressures.is_empty()
    }

    /// Pressed keys resolved to grid positions.
    ///
    /// Keys without a mapping or outside `size` are skipped.
    pub fn positions<'a>(
        &'a self,
        keymap: &'a KeyMap,
        size: GridSize,
    ) -> impl Iterator<Item = (KeyPosition, f32)> + 'a {
        self.iter().filter_map(move |(code, pressure)| {
            keymap
                .lookup(code)
                .filter(|position| position.fits(size))
                .map(|position| (position, pressure))
        })
    }
}

/// Source of per-tick analog key snapshots.
pub trait AnalogInput: Send {
    /// Open the device. Returns `false` when analog reading is unavailable.
    fn initialize(&mut self) -> bool;

    /// Read the current pressure of every pressed key
    fn read_state(&mut self) -> KeyboardState;

    fn shutdown(&mut self) {}
}
