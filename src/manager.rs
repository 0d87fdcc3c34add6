//! Fixed-rate effect scheduler.
//!
//! [`EffectManager`] owns the hardware sink, the analog input and every
//! registered effect. A single ticker thread reads the keyboard, advances the
//! active effect and pushes its frame to the sink once per period. Effect
//! switches and parameter writes may come from any thread.

use std::{
    any::Any,
    mem,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, TryLockError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use embassy_time::{Duration, Instant};
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use crate::{
    HardwareSink,
    config::EngineConfig,
    effect::{Effect, EffectLibrary, EffectSlot},
    error::{Error, Result},
    frame_scheduler::FramePacer,
    grid::GridSize,
    input::AnalogInput,
    param::{Assignment, ParameterInfo, ParameterSet, ParameterValue},
    surface::EffectInfo,
};

const NO_EFFECT: usize = usize::MAX;

const TICKER_THREAD_NAME: &str = "keylight-ticker";

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame reached the sink
    Rendered,
    /// Another thread held the engine; the tick was dropped
    Skipped,
    /// No effect is running
    Idle,
    /// The active effect failed this tick
    Failed { failures: u32 },
    /// The active effect failed too often in a row and was switched off
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running { index: usize, failures: u32 },
}

struct Core<S, I> {
    sink: S,
    input: I,
    slots: Vec<EffectSlot>,
    state: RunState,
    size: GridSize,
    ready: bool,
}

impl<S: HardwareSink, I: AnalogInput> Core<S, I> {
    /// Clean up the running effect, if any, and go idle
    fn deactivate(&mut self) -> Option<usize> {
        let RunState::Running { index, .. } = mem::replace(&mut self.state, RunState::Idle) else {
            return None;
        };
        if let Some(slot) = self.slots.get_mut(index) {
            cleanup_slot(slot);
        }
        Some(index)
    }

    /// Initialize the effect at `index` against the current grid
    fn activate(&mut self, index: usize, now: Instant) -> Result<()> {
        let size = self.size;
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| Error::msg("effect index out of range"))?;
        let name = slot.name().to_owned();
        match catch_unwind(AssertUnwindSafe(|| slot.initialize(size, now))) {
            Ok(Ok(())) => {
                self.state = RunState::Running { index, failures: 0 };
                Ok(())
            }
            Ok(Err(err)) => {
                cleanup_slot(slot);
                self.state = RunState::Idle;
                self.sink.reset();
                Err(Error::effect(name, err.to_string()))
            }
            Err(payload) => {
                cleanup_slot(slot);
                self.state = RunState::Idle;
                self.sink.reset();
                Err(Error::effect(name, panic_message(payload.as_ref())))
            }
        }
    }

    fn tick(&mut self, now: Instant, failure_limit: u32) -> TickOutcome {
        let RunState::Running { index, failures } = self.state else {
            return TickOutcome::Idle;
        };
        let input = self.input.read_state();
        let Self {
            sink, slots, state, ..
        } = self;
        let Some(slot) = slots.get_mut(index) else {
            *state = RunState::Idle;
            return TickOutcome::Idle;
        };

        let rendered = catch_unwind(AssertUnwindSafe(|| {
            slot.render_to(&input, now, &mut *sink)
        }));
        let message = match rendered {
            Ok(Ok(())) => {
                *state = RunState::Running { index, failures: 0 };
                return TickOutcome::Rendered;
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let failures = failures.saturating_add(1);
        let effect = slot.name().to_owned();
        if failures < failure_limit {
            warn!(effect = %effect, failures, error = %message, "effect update failed");
            *state = RunState::Running { index, failures };
            return TickOutcome::Failed { failures };
        }

        error!(
            effect = %effect,
            failures,
            error = %message,
            "effect disabled after repeated failures"
        );
        cleanup_slot(slot);
        *state = RunState::Idle;
        sink.reset();
        TickOutcome::Disabled
    }
}

struct Shared<S, I> {
    core: Mutex<Core<S, I>>,
    armed: AtomicBool,
    shutdown: AtomicBool,
    active: AtomicUsize,
    names: Vec<String>,
    descriptions: Vec<String>,
    params: Vec<Arc<ParameterSet>>,
    frame_period: Duration,
    failure_limit: u32,
}

impl<S: HardwareSink, I: AnalogInput> Shared<S, I> {
    fn lock(&self) -> MutexGuard<'_, Core<S, I>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    fn set_idle(&self) {
        self.armed.store(false, Ordering::Release);
        self.active.store(NO_EFFECT, Ordering::Release);
    }

    fn tick(&self, now: Instant) -> TickOutcome {
        if self.shutdown.load(Ordering::Acquire) || !self.armed.load(Ordering::Acquire) {
            return TickOutcome::Idle;
        }
        let mut core = match self.core.try_lock() {
            Ok(core) => core,
            Err(TryLockError::WouldBlock) => {
                trace!("tick skipped, engine busy");
                return TickOutcome::Skipped;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        let outcome = core.tick(now, self.failure_limit);
        if matches!(outcome, TickOutcome::Disabled | TickOutcome::Idle) {
            self.set_idle();
        }
        outcome
    }

    fn run(&self) {
        let mut pacer = FramePacer::new(self.frame_period);
        debug!(period_ms = self.frame_period.as_millis(), "ticker started");
        while !self.shutdown.load(Ordering::Acquire) {
            self.tick(Instant::now());
            let frame = pacer.tick(Instant::now());
            if frame.sleep_duration.as_ticks() > 0 {
                thread::sleep(std::time::Duration::from_micros(
                    frame.sleep_duration.as_micros(),
                ));
            }
        }
        debug!(dropped = pacer.dropped_frames(), "ticker stopped");
    }
}

/// Owns the hardware, the registered effects and the ticker thread.
///
/// Every method takes `&self`, so the manager can be shared behind an
/// [`Arc`] between the configuration surface and the device-change watcher.
pub struct EffectManager<S, I>
where
    S: HardwareSink + 'static,
    I: AnalogInput + 'static,
{
    shared: Arc<Shared<S, I>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    initial_effect: Option<String>,
    manual_ticks: bool,
}

impl<S, I> EffectManager<S, I>
where
    S: HardwareSink + 'static,
    I: AnalogInput + 'static,
{
    /// Create a manager and apply the parameter overrides from `config`.
    ///
    /// Nothing touches the hardware until [`Self::initialize`] or
    /// [`Self::start`].
    pub fn new(sink: S, input: I, library: EffectLibrary, config: &EngineConfig) -> Result<Self> {
        let slots = library.into_slots();
        let names = slots.iter().map(|slot| slot.name().to_owned()).collect();
        let descriptions = slots
            .iter()
            .map(|slot| slot.description().to_owned())
            .collect();
        let params = slots.iter().map(|slot| Arc::clone(slot.parameters())).collect();

        let manager = Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    sink,
                    input,
                    slots,
                    state: RunState::Idle,
                    size: GridSize::default(),
                    ready: false,
                }),
                armed: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                active: AtomicUsize::new(NO_EFFECT),
                names,
                descriptions,
                params,
                frame_period: config.frame_period(),
                failure_limit: config.failure_limit(),
            }),
            ticker: Mutex::new(None),
            initial_effect: config.initial_effect.clone(),
            manual_ticks: config.manual_ticks,
        };
        manager.apply_overrides(config)?;
        Ok(manager)
    }

    /// Bring up the sink and the analog input and read the grid size.
    ///
    /// Returns [`Error::NotReady`] when either side reports failure.
    pub fn initialize(&self) -> Result<GridSize> {
        if self.shared.shutdown.load(Ordering::Acquire) {
            return Err(Error::NotReady);
        }
        let mut core = self.shared.lock();
        if core.ready {
            return Ok(core.size);
        }
        if !core.sink.initialize() {
            warn!("hardware sink failed to initialize");
            return Err(Error::NotReady);
        }
        if !core.input.initialize() {
            warn!("analog input failed to initialize");
            core.sink.shutdown();
            return Err(Error::NotReady);
        }
        core.size = core.sink.dimensions();
        core.ready = true;
        info!(rows = core.size.rows, cols = core.size.cols, "keyboard ready");
        Ok(core.size)
    }

    /// Initialize the hardware if needed, activate the configured initial
    /// effect and spawn the ticker thread.
    pub fn start(&self) -> Result<()> {
        self.initialize()?;
        if let Some(name) = self.initial_effect.as_deref() {
            if self.active_effect().is_none() {
                self.set_effect(name)?;
            }
        }

        self.spawn_ticker()
    }

    /// Spawn the ticker thread unless one exists or the engine is shut down
    fn spawn_ticker(&self) -> Result<()> {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.is_some() || self.shared.shutdown.load(Ordering::Acquire) {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(TICKER_THREAD_NAME.to_owned())
            .spawn(move || shared.run())?;
        *ticker = Some(handle);
        Ok(())
    }

    /// Switch to the effect registered under `name`.
    ///
    /// Waits for an in-flight tick, cleans up the previous effect and
    /// initializes the new one against the current grid. The ticker thread
    /// is spawned on first use unless the engine runs on manual ticks.
    pub fn set_effect(&self, name: &str) -> Result<()> {
        let index = self
            .shared
            .position(name)
            .ok_or_else(|| Error::UnknownEffect(name.to_owned()))?;

        let mut core = self.shared.lock();
        if !core.ready {
            return Err(Error::NotReady);
        }
        self.shared.set_idle();
        if let Some(previous) = core.deactivate() {
            debug!(effect = %self.shared.names[previous], "effect cleaned up");
        }
        if let Err(err) = core.activate(index, Instant::now()) {
            error!(effect = name, error = %err, "effect failed to initialize");
            return Err(err);
        }
        self.shared.active.store(index, Ordering::Release);
        self.shared.armed.store(true, Ordering::Release);
        drop(core);
        info!(effect = name, "effect activated");

        if self.manual_ticks {
            return Ok(());
        }
        self.spawn_ticker()
    }

    /// Clean up the active effect, reset the sink and go idle
    pub fn stop(&self) {
        self.shared.set_idle();
        let mut core = self.shared.lock();
        if let Some(index) = core.deactivate() {
            info!(effect = %self.shared.names[index], "effect stopped");
        }
        if core.ready {
            core.sink.reset();
        }
    }

    /// Stop, join the ticker and shut down the hardware. Safe to call twice.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.set_idle();

        let handle = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("ticker thread panicked");
            }
        }

        let mut core = self.shared.lock();
        core.deactivate();
        if core.ready {
            core.sink.reset();
            core.sink.shutdown();
            core.input.shutdown();
            core.ready = false;
        }
        info!("engine shut down");
    }

    /// Re-read the grid size after a device change and re-initialize the
    /// active effect against it
    pub fn device_changed(&self) -> Result<GridSize> {
        let mut core = self.shared.lock();
        if !core.ready {
            return Err(Error::NotReady);
        }
        let size = core.sink.dimensions();
        let previous = mem::replace(&mut core.size, size);
        debug!(
            rows = size.rows,
            cols = size.cols,
            previous_rows = previous.rows,
            previous_cols = previous.cols,
            "device changed"
        );
        if let RunState::Running { index, .. } = core.state {
            if let Err(err) = core.activate(index, Instant::now()) {
                self.shared.set_idle();
                error!(error = %err, "effect failed to follow device change");
                return Err(err);
            }
        }
        Ok(size)
    }

    /// Run one tick on the calling thread
    pub fn tick_now(&self) -> TickOutcome {
        self.shared.tick(Instant::now())
    }

    /// Run one tick on the calling thread with an explicit timestamp
    pub fn tick_at(&self, now: Instant) -> TickOutcome {
        self.shared.tick(now)
    }

    pub fn is_running(&self) -> bool {
        self.shared.armed.load(Ordering::Acquire)
    }

    /// Grid size read at the last initialization or device change
    pub fn grid_size(&self) -> GridSize {
        self.shared.lock().size
    }

    pub fn frame_period(&self) -> Duration {
        self.shared.frame_period
    }

    /// Name of the running effect
    pub fn active_effect(&self) -> Option<&str> {
        let index = self.shared.active.load(Ordering::Acquire);
        self.shared.names.get(index).map(String::as_str)
    }

    /// Registered effect names in registration order
    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        self.shared.names.iter().map(String::as_str)
    }

    /// Every registered effect with its parameters
    pub fn effects(&self) -> Vec<EffectInfo> {
        let active = self.shared.active.load(Ordering::Acquire);
        self.shared
            .names
            .iter()
            .zip(&self.shared.descriptions)
            .zip(&self.shared.params)
            .enumerate()
            .map(|(index, ((name, description), params))| EffectInfo {
                name: name.clone(),
                description: description.clone(),
                active: index == active,
                parameters: params.infos(),
            })
            .collect()
    }

    /// Parameter set of the effect registered under `name`
    pub fn parameter_set(&self, name: &str) -> Result<Arc<ParameterSet>> {
        self.shared
            .position(name)
            .and_then(|index| self.shared.params.get(index))
            .map(Arc::clone)
            .ok_or_else(|| Error::UnknownEffect(name.to_owned()))
    }

    pub fn parameters(&self, name: &str) -> Result<Vec<ParameterInfo>> {
        Ok(self.parameter_set(name)?.infos())
    }

    pub fn active_parameters(&self) -> Result<Vec<ParameterInfo>> {
        let name = self.active_effect().ok_or(Error::NoActiveEffect)?;
        self.parameters(name)
    }

    /// Assign a parameter of the running effect. Takes effect next tick.
    pub fn set_parameter_value(
        &self,
        parameter: &str,
        value: &ParameterValue,
    ) -> Result<Assignment> {
        let effect = self.active_effect().ok_or(Error::NoActiveEffect)?;
        let assignment = self.parameter_set(effect)?.set(parameter, value)?;
        log_assignment(effect, parameter, assignment);
        Ok(assignment)
    }

    /// Assign a parameter of the running effect from loosely typed JSON
    pub fn set_parameter_json(&self, parameter: &str, value: &Value) -> Result<Assignment> {
        let effect = self.active_effect().ok_or(Error::NoActiveEffect)?;
        let assignment = self.parameter_set(effect)?.set_json(parameter, value)?;
        log_assignment(effect, parameter, assignment);
        Ok(assignment)
    }

    /// Apply every parameter override in `config`.
    ///
    /// Fails on the first unknown effect or parameter name; overrides
    /// before it stay applied.
    pub fn apply_overrides(&self, config: &EngineConfig) -> Result<()> {
        for (effect, overrides) in &config.parameters {
            let params = self.parameter_set(effect)?;
            for (parameter, value) in overrides {
                let assignment = params.set_json(parameter, value)?;
                log_assignment(effect, parameter, assignment);
            }
        }
        Ok(())
    }
}

impl<S, I> Drop for EffectManager<S, I>
where
    S: HardwareSink + 'static,
    I: AnalogInput + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S, I> core::fmt::Debug for EffectManager<S, I>
where
    S: HardwareSink + 'static,
    I: AnalogInput + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EffectManager")
            .field("effects", &self.shared.names)
            .field("active", &self.active_effect())
            .field("frame_period", &self.shared.frame_period)
            .finish_non_exhaustive()
    }
}

fn cleanup_slot(slot: &mut EffectSlot) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| slot.cleanup())) {
        warn!(
            effect = slot.name(),
            error = %panic_message(payload.as_ref()),
            "effect cleanup panicked"
        );
    }
}

fn log_assignment(effect: &str, parameter: &str, assignment: Assignment) {
    match assignment {
        Assignment::Applied => trace!(effect, parameter, "parameter applied"),
        Assignment::Clamped => debug!(effect, parameter, "parameter clamped into range"),
        Assignment::Substituted => debug!(effect, parameter, "parameter value substituted"),
        Assignment::Rejected => warn!(effect, parameter, "parameter value rejected"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "effect panicked".to_owned()
    }
}
