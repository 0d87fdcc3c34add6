//! Sparse per-key state for pressure-reactive effects.
//!
//! Effects keep one scalar per grid position (intensity, press depth) or per
//! scan code (deepest pressure seen). Entries fade every tick and are
//! dropped once they reach zero, so the maps only ever hold live keys.

use std::collections::BTreeMap;

use crate::{
    grid::GridSize,
    input::{KeyboardState, PRESS_THRESHOLD},
    keymap::{KeyMap, KeyPosition},
};

/// Sparse `position -> scalar` map with per-tick fading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PressureField {
    entries: BTreeMap<KeyPosition, f64>,
}

impl PressureField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the value at a position
    pub fn set(&mut self, position: KeyPosition, value: f64) {
        if value > 0.0 {
            self.entries.insert(position, value);
        } else {
            self.entries.remove(&position);
        }
    }

    /// Keep the larger of the stored and the given value
    pub fn raise(&mut self, position: KeyPosition, value: f64) {
        let current = self.get(position);
        if value > current {
            self.set(position, value);
        }
    }

    pub fn get(&self, position: KeyPosition) -> f64 {
        self.entries.get(&position).copied().unwrap_or(0.0)
    }

    /// Store the current pressure of every pressed, mapped key
    pub fn track_pressed(
        &mut self,
        state: &KeyboardState,
        keymap: &KeyMap,
        size: GridSize,
        gain: f64,
        limit: f64,
    ) {
        for (position, pressure) in state.positions(keymap, size) {
            self.set(position, (f64::from(pressure) * gain).clamp(0.0, limit));
        }
    }

    /// Fade every entry not held down in `state` by `rate`.
    ///
    /// Faded entries never grow and are removed at zero.
    pub fn fade_released(&mut self, state: &KeyboardState, keymap: &KeyMap, rate: f64) {
        let held: Vec<KeyPosition> = state
            .iter()
            .filter_map(|(code, _)| keymap.lookup(code))
            .collect();
        self.entries.retain(|position, value| {
            if held.contains(position) {
                return true;
            }
            *value -= rate;
            *value > 0.0
        });
    }

    /// Drop every entry whose key is not held down in `state`
    pub fn forget_released(&mut self, state: &KeyboardState, keymap: &KeyMap) {
        self.entries.retain(|position, _| {
            keymap
                .code_at(*position)
                .is_some_and(|code| state.is_pressed(code))
        });
    }

    /// Fade every entry by `rate`, removing those that reach zero
    pub fn fade_all(&mut self, rate: f64) {
        self.entries.retain(|_, value| {
            *value -= rate;
            *value > 0.0
        });
    }

    /// Drop entries outside the grid
    pub fn retain_within(&mut self, size: GridSize) {
        self.entries.retain(|position, _| position.fits(size));
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeyPosition, f64)> + '_ {
        self.entries.iter().map(|(&position, &value)| (position, value))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deepest pressure reached by each held key.
///
/// A peak survives pressure dips and is only reported and forgotten once the
/// key disappears from the snapshot entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakTracker {
    peaks: BTreeMap<u16, f32>,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a snapshot into the tracker and report released keys.
    ///
    /// `on_release` receives `(scan code, peak pressure)` for every tracked
    /// key absent from `state`.
    pub fn update<F>(&mut self, state: &KeyboardState, mut on_release: F)
    where
        F: FnMut(u16, f32),
    {
        for (code, pressure) in state.iter() {
            if pressure <= PRESS_THRESHOLD {
                continue;
            }
            let peak = self.peaks.entry(code).or_insert(pressure);
            if pressure > *peak {
                *peak = pressure;
            }
        }

        self.peaks.retain(|&code, &mut peak| {
            if state.is_pressed(code) {
                return true;
            }
            on_release(code, peak);
            false
        });
    }

    pub fn peak(&self, code: u16) -> Option<f32> {
        self.peaks.get(&code).copied()
    }

    pub fn clear(&mut self) {
        self.peaks.clear();
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}
