//! Terminal preview for myrtio-keylight effects
//!
//! Renders the key grid with 24-bit ANSI colors while a simulated typist
//! presses random keys.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    thread,
};

use clap::{Parser, Subcommand};
use myrtio_keylight::{
    AnalogInput, ColorGrid, EffectContext, EffectLibrary, EffectManager, EngineConfig, Error,
    FramePacer, GridSize, HardwareSink, Instant, KeyMap, KeyboardState, TickOutcome,
    keymap::{STANDARD_COLS, STANDARD_ROWS},
};
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Keys held at once by the simulated typist
const MAX_HELD_KEYS: usize = 4;

fn main() -> myrtio_keylight::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::List => list(&config),
        Commands::Run {
            effect,
            frames,
            params,
            typing_rate,
        } => run(config, &effect, frames, &params, typing_rate),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn context(config: &EngineConfig) -> EffectContext {
    EffectContext {
        keymap: KeyMap::standard(),
        seed: config.seed,
        audio: config.audio,
    }
}

fn list(config: &EngineConfig) -> myrtio_keylight::Result<()> {
    let library = EffectLibrary::standard(&context(config))?;
    let manager = EffectManager::new(
        TerminalSink::new(GridSize::default()),
        SimulatedTyping::new(config.seed, 0.0),
        library,
        config,
    )?;

    let mut out = io::stdout().lock();
    for effect in manager.effects() {
        writeln!(out, "{:<18}{}", effect.name, effect.description)?;
        for param in effect.parameters {
            writeln!(
                out,
                "    {:<18}{}",
                param.name,
                serde_json::to_string(&param.value)?
            )?;
        }
    }
    Ok(())
}

fn run(
    mut config: EngineConfig,
    effect: &str,
    frames: u64,
    params: &[String],
    typing_rate: f64,
) -> myrtio_keylight::Result<()> {
    for param in params {
        let (name, value) = parse_param(param)?;
        config = config.with_parameter(effect, name, value);
    }
    // Frames are counted and paced here
    config.manual_ticks = true;

    let size = GridSize::new(STANDARD_ROWS, STANDARD_COLS);
    let library = EffectLibrary::standard(&context(&config))?;
    let manager = EffectManager::new(
        TerminalSink::new(size),
        SimulatedTyping::new(config.seed, typing_rate),
        library,
        &config,
    )?;
    manager.initialize()?;
    manager.set_effect(effect)?;
    tracing::info!(effect, frames, "starting preview");

    let mut pacer = FramePacer::new(manager.frame_period());
    for _ in 0..frames {
        if let TickOutcome::Disabled = manager.tick_now() {
            tracing::warn!(effect, "effect disabled after repeated failures");
            break;
        }
        let timing = pacer.tick(Instant::now());
        thread::sleep(std::time::Duration::from_micros(
            timing.sleep_duration.as_micros(),
        ));
    }

    manager.shutdown();
    Ok(())
}

/// Split `name=value`. Values that are not JSON are taken as strings.
fn parse_param(param: &str) -> myrtio_keylight::Result<(&str, Value)> {
    let (name, raw) = param
        .split_once('=')
        .ok_or_else(|| Error::msg(format!("expected name=value, got `{param}`")))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
    Ok((name.trim(), value))
}

/// Draws each presented frame as a block of colored cells.
struct TerminalSink {
    size: GridSize,
    staged: ColorGrid,
    drawn: bool,
}

impl TerminalSink {
    fn new(size: GridSize) -> Self {
        Self {
            size,
            staged: ColorGrid::new(size),
            drawn: false,
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if self.drawn {
            // Move back to the top of the previous frame
            write!(out, "\x1b[{}A", self.staged.size().rows)?;
        }
        for row in self.staged.rows() {
            for cell in row {
                write!(out, "\x1b[48;2;{};{};{}m  ", cell.r, cell.g, cell.b)?;
            }
            writeln!(out, "\x1b[0m")?;
        }
        self.drawn = true;
        out.flush()
    }
}

impl HardwareSink for TerminalSink {
    fn initialize(&mut self) -> bool {
        true
    }

    fn dimensions(&self) -> GridSize {
        self.size
    }

    fn set_full_grid(&mut self, grid: &ColorGrid) {
        self.staged.clone_from(grid);
    }

    fn present(&mut self) {
        if let Err(err) = self.draw() {
            tracing::warn!(error = %err, "failed to draw frame");
        }
    }

    fn reset(&mut self) {
        self.staged.clear();
    }
}

/// A key being pressed and released over a few ticks
struct Keystroke {
    code: u16,
    peak: f32,
    age: u32,
    length: u32,
}

impl Keystroke {
    #[allow(clippy::cast_precision_loss)]
    fn pressure(&self) -> f32 {
        let progress = self.age as f32 / self.length as f32;
        self.peak * (progress * std::f32::consts::PI).sin()
    }
}

/// Analog input that types random keys of the standard layout.
struct SimulatedTyping {
    keymap: Arc<KeyMap>,
    rng: SmallRng,
    /// Chance of a new keystroke per tick
    rate: f64,
    held: Vec<Keystroke>,
}

impl SimulatedTyping {
    fn new(seed: u64, rate: f64) -> Self {
        Self {
            keymap: KeyMap::standard(),
            rng: SmallRng::seed_from_u64(seed),
            rate: rate.clamp(0.0, 1.0),
            held: Vec::new(),
        }
    }
}

impl AnalogInput for SimulatedTyping {
    fn initialize(&mut self) -> bool {
        true
    }

    fn read_state(&mut self) -> KeyboardState {
        for stroke in &mut self.held {
            stroke.age += 1;
        }
        self.held.retain(|stroke| stroke.age < stroke.length);

        if self.held.len() < MAX_HELD_KEYS && self.rng.gen_bool(self.rate) {
            if let Some(entry) = self.keymap.entries().choose(&mut self.rng) {
                self.held.push(Keystroke {
                    code: entry.code,
                    peak: self.rng.gen_range(0.3..=1.0),
                    age: 0,
                    length: self.rng.gen_range(6..30),
                });
            }
        }

        KeyboardState::from_pressures(
            Instant::now(),
            self.held
                .iter()
                .map(|stroke| (stroke.code, stroke.pressure())),
        )
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal preview for keyboard effects", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List effects and their parameters.
    List,
    /// Render an effect in the terminal.
    Run {
        /// Effect name, as shown by `list`.
        #[arg(short, long, default_value = "ripple")]
        effect: String,
        /// Number of frames to render.
        #[arg(short, long, default_value_t = 600)]
        frames: u64,
        /// Parameter override as `name=value`; repeatable.
        #[arg(short, long = "param")]
        params: Vec<String>,
        /// Chance of a new keystroke per frame.
        #[arg(long, default_value_t = 0.15)]
        typing_rate: f64,
    },
}
