//! Frame pacing.
//!
//! Computes frame deadlines with drift correction. The caller is
//! responsible for sleeping between frames.

use embassy_time::{Duration, Instant};
use tracing::trace;

/// Default tick period (about 60 FPS).
pub const DEFAULT_FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (zero if behind schedule).
    pub sleep_duration: Duration,
}

/// Fixed-rate frame pacer.
///
/// If the caller falls more than two frames behind, the backlog is dropped
/// and the schedule restarts from the current time instead of bursting to
/// catch up.
///
/// # Usage
///
/// ```ignore
/// let mut pacer = FramePacer::new(DEFAULT_FRAME_PERIOD);
///
/// loop {
///     manager.tick_now();
///     let result = pacer.tick(Instant::now());
///     std::thread::sleep(result.sleep_duration.into());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FramePacer {
    next_frame: Option<Instant>,
    frame_duration: Duration,
    dropped_frames: u64,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_PERIOD)
    }
}

impl FramePacer {
    /// Create a pacer. A zero period is raised to one millisecond.
    pub fn new(frame_duration: Duration) -> Self {
        Self {
            next_frame: None,
            frame_duration: frame_duration.max(Duration::from_millis(1)),
            dropped_frames: 0,
        }
    }

    pub const fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Frames skipped by drift correction so far
    pub const fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Forget the schedule; the next tick starts a new one
    pub fn reset(&mut self) {
        self.next_frame = None;
    }

    /// Account for one frame that ran at `now` and return timing
    /// information for the next one.
    pub fn tick(&mut self, now: Instant) -> FrameResult {
        let period = self.frame_duration.as_ticks();
        let mut next_frame = self.next_frame.unwrap_or(now);

        // Drift correction: skip the backlog after a long stall
        let max_drift = period * 2;
        if now.as_ticks() > next_frame.as_ticks() + max_drift {
            let behind = (now.as_ticks() - next_frame.as_ticks()) / period;
            self.dropped_frames += behind;
            trace!(frames = behind, "frame pacer skipped backlog");
            next_frame = now;
        }

        next_frame += self.frame_duration;
        self.next_frame = Some(next_frame);

        let sleep_duration = if next_frame > now {
            next_frame - now
        } else {
            Duration::from_ticks(0)
        };

        FrameResult {
            next_deadline: next_frame,
            sleep_duration,
        }
    }
}
