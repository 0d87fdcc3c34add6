pub mod analog;
pub mod audio;
pub mod color;
pub mod config;
pub mod effect;
pub mod error;
pub mod frame_scheduler;
pub mod grid;
pub mod input;
pub mod keymap;
pub mod manager;
pub mod math8;
pub mod noise;
pub mod param;
pub mod surface;

pub use analog::{PeakTracker, PressureField};
pub use audio::{AudioConfig, AudioFeed, AudioSource};
pub use color::{HsvF, Rgb};
pub use config::EngineConfig;
pub use effect::{Effect, EffectContext, EffectId, EffectLibrary, EffectSlot};
pub use error::{Error, Result};
pub use frame_scheduler::FramePacer;
pub use grid::{ColorGrid, GridSize};
pub use input::{AnalogInput, KeyboardState};
pub use keymap::{KeyMap, KeyPosition};
pub use manager::{EffectManager, TickOutcome};
pub use param::{Assignment, ParameterInfo, ParameterKind, ParameterSet, ParameterValue};
pub use surface::{EffectInfo, RecentColors};

pub use embassy_time::{Duration, Instant};

/// Per-key RGB output device
///
/// Implement this trait to drive a concrete keyboard. The engine calls it
/// only from the thread holding the engine lock.
pub trait HardwareSink: Send {
    /// Open the device. Returns `false` when it cannot be driven.
    fn initialize(&mut self) -> bool;

    /// Current grid size. Read after initialization and device changes.
    fn dimensions(&self) -> GridSize;

    /// Stage a complete frame
    fn set_full_grid(&mut self, grid: &ColorGrid);

    /// Show the staged frame
    fn present(&mut self);

    /// Return the device to its idle lighting
    fn reset(&mut self);

    fn shutdown(&mut self) {}
}
