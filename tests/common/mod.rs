#![allow(dead_code)]

use std::sync::{
    Arc, Mutex, MutexGuard,
    mpsc::{Receiver, Sender},
};

use myrtio_keylight::{
    AnalogInput, ColorGrid, Effect, EffectLibrary, EffectManager, EngineConfig, GridSize,
    HardwareSink, Instant, KeyboardState, ParameterSet, Result, Rgb, audio::UnavailableAudioSource,
    effect::EffectContext,
};

pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// Scan code of the G key, at row 3 column 5 of the standard layout
pub const KEY_G: u16 = 10;
pub const KEY_ESC: u16 = 41;

pub fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct SinkLog {
    pub size: GridSize,
    pub initialized: bool,
    pub frames: Vec<ColorGrid>,
    pub presents: usize,
    pub resets: usize,
    pub shutdowns: usize,
}

/// Sink that records every call. Clone the handle to inspect it.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    ready: bool,
}

impl RecordingSink {
    pub fn new(size: GridSize) -> Self {
        Self {
            log: Arc::new(Mutex::new(SinkLog {
                size,
                ..SinkLog::default()
            })),
            ready: true,
        }
    }

    pub fn broken() -> Self {
        Self {
            ready: false,
            ..Self::new(GridSize::new(6, 17))
        }
    }

    pub fn log(&self) -> MutexGuard<'_, SinkLog> {
        lock(&self.log)
    }

    pub fn resize(&self, size: GridSize) {
        self.log().size = size;
    }

    pub fn last_frame(&self) -> Option<ColorGrid> {
        self.log().frames.last().cloned()
    }
}

impl HardwareSink for RecordingSink {
    fn initialize(&mut self) -> bool {
        self.log().initialized = self.ready;
        self.ready
    }

    fn dimensions(&self) -> GridSize {
        self.log().size
    }

    fn set_full_grid(&mut self, grid: &ColorGrid) {
        self.log().frames.push(grid.clone());
    }

    fn present(&mut self) {
        self.log().presents += 1;
    }

    fn reset(&mut self) {
        self.log().resets += 1;
    }

    fn shutdown(&mut self) {
        self.log().shutdowns += 1;
    }
}

/// Input replaying whatever state was set last.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    state: Arc<Mutex<KeyboardState>>,
    shutdowns: Arc<Mutex<usize>>,
}

impl ScriptedInput {
    pub fn set(&self, state: KeyboardState) {
        *lock(&self.state) = state;
    }

    pub fn shutdowns(&self) -> usize {
        *lock(&self.shutdowns)
    }
}

impl AnalogInput for ScriptedInput {
    fn initialize(&mut self) -> bool {
        true
    }

    fn read_state(&mut self) -> KeyboardState {
        lock(&self.state).clone()
    }

    fn shutdown(&mut self) {
        *lock(&self.shutdowns) += 1;
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EffectLog {
    pub initializations: usize,
    pub updates: usize,
    pub cleanups: usize,
    pub last_size: GridSize,
}

/// How a [`TestEffect`] behaves on update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Fill(Rgb),
    Fail,
    Panic,
    /// Fails on the given update numbers (1-based), fills red otherwise
    FailOn(&'static [usize]),
}

#[derive(Debug)]
pub struct TestEffect {
    name: &'static str,
    behavior: Behavior,
    fail_initialize: bool,
    params: Arc<ParameterSet>,
    log: Arc<Mutex<EffectLog>>,
    frame: ColorGrid,
}

impl TestEffect {
    pub fn new(name: &'static str, behavior: Behavior) -> (Self, Arc<Mutex<EffectLog>>) {
        let log = Arc::new(Mutex::new(EffectLog::default()));
        let effect = Self {
            name,
            behavior,
            fail_initialize: false,
            params: ParameterSet::empty(),
            log: Arc::clone(&log),
            frame: ColorGrid::default(),
        };
        (effect, log)
    }

    #[must_use]
    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }
}

impl Effect for TestEffect {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "test effect"
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        {
            let mut log = lock(&self.log);
            log.initializations += 1;
            log.last_size = size;
        }
        if self.fail_initialize {
            return Err("initialize failed".into());
        }
        self.frame.resize(size);
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        let update = {
            let mut log = lock(&self.log);
            log.updates += 1;
            log.updates
        };
        match self.behavior {
            Behavior::Fill(color) => self.frame.fill(color),
            Behavior::Fail => return Err("update failed".into()),
            Behavior::Panic => panic!("update panicked"),
            Behavior::FailOn(failing) => {
                if failing.contains(&update) {
                    return Err("scripted failure".into());
                }
                self.frame.fill(RED);
            }
        }
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        lock(&self.log).cleanups += 1;
    }
}

/// Effect whose re-initialization blocks until released, holding the
/// engine lock meanwhile.
pub struct GateEffect {
    initializations: usize,
    entered: Sender<()>,
    release: Receiver<()>,
    params: Arc<ParameterSet>,
    frame: ColorGrid,
}

impl GateEffect {
    pub fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            initializations: 0,
            entered,
            release,
            params: ParameterSet::empty(),
            frame: ColorGrid::default(),
        }
    }
}

impl Effect for GateEffect {
    fn name(&self) -> &str {
        "gate"
    }

    fn description(&self) -> &str {
        "blocks on re-initialization"
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.initializations += 1;
        if self.initializations > 1 {
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
        self.frame.resize(size);
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        self.frame.fill(WHITE);
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }
}

/// Effect whose first update blocks until released, holding the engine
/// lock meanwhile.
pub struct StallEffect {
    updates: Arc<Mutex<usize>>,
    entered: Sender<()>,
    release: Receiver<()>,
    params: Arc<ParameterSet>,
    frame: ColorGrid,
}

impl StallEffect {
    pub fn new(entered: Sender<()>, release: Receiver<()>) -> (Self, Arc<Mutex<usize>>) {
        let updates = Arc::new(Mutex::new(0));
        let effect = Self {
            updates: Arc::clone(&updates),
            entered,
            release,
            params: ParameterSet::empty(),
            frame: ColorGrid::default(),
        };
        (effect, updates)
    }
}

impl Effect for StallEffect {
    fn name(&self) -> &str {
        "stall"
    }

    fn description(&self) -> &str {
        "blocks in its first update"
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.frame.resize(size);
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        let first = {
            let mut updates = lock(&self.updates);
            *updates += 1;
            *updates == 1
        };
        if first {
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
        self.frame.fill(WHITE);
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }
}

/// Lifecycle calls of several effects, in the order they happened
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Effect appending `name:call` to a shared [`Journal`].
pub struct JournalEffect {
    name: &'static str,
    journal: Journal,
    params: Arc<ParameterSet>,
    frame: ColorGrid,
}

impl JournalEffect {
    pub fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: Arc::clone(journal),
            params: ParameterSet::empty(),
            frame: ColorGrid::default(),
        }
    }

    fn record(&self, call: &str) {
        lock(&self.journal).push(format!("{}:{call}", self.name));
    }
}

impl Effect for JournalEffect {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "records its lifecycle"
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.record("initialize");
        self.frame.resize(size);
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        self.record("update");
        self.frame.fill(RED);
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.record("cleanup");
    }
}

/// Library of the given custom effects only
pub fn custom_library(effects: Vec<Box<dyn Effect>>) -> EffectLibrary {
    let mut library = EffectLibrary::new();
    for effect in effects {
        library.register(effect).unwrap();
    }
    library
}

/// Every built-in, without audio capture
pub fn standard_library() -> EffectLibrary {
    EffectLibrary::with_audio_source(&EffectContext::default(), Box::new(UnavailableAudioSource))
        .unwrap()
}

pub type TestManager = EffectManager<RecordingSink, ScriptedInput>;

/// A manager over a 6 x 17 recording sink, already initialized
pub fn manager(library: EffectLibrary) -> (TestManager, RecordingSink, ScriptedInput) {
    manager_with_config(library, &EngineConfig::default())
}

/// Like [`manager`], on manual ticks so only the test advances frames
/// until it calls `start`
pub fn manager_with_config(
    library: EffectLibrary,
    config: &EngineConfig,
) -> (TestManager, RecordingSink, ScriptedInput) {
    let config = EngineConfig {
        manual_ticks: true,
        ..config.clone()
    };
    threaded_manager(library, &config)
}

/// A manager using `config` as given
pub fn threaded_manager(
    library: EffectLibrary,
    config: &EngineConfig,
) -> (TestManager, RecordingSink, ScriptedInput) {
    let sink = RecordingSink::new(GridSize::new(6, 17));
    let input = ScriptedInput::default();
    let manager = EffectManager::new(sink.clone(), input.clone(), library, config).unwrap();
    manager.initialize().unwrap();
    (manager, sink, input)
}
