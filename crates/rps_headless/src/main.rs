//! Headless rock-paper-scissors runner.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p rps_headless
//!
//! # Run one session to the end
//! cargo run -p rps_headless -- run --seed 42 --events events.json --record replay.bin
//!
//! # Win rates over many seeds
//! cargo run -p rps_headless -- batch --games 1000 --output results/batch.json
//!
//! # Verify a replay
//! cargo run -p rps_headless -- replay --file replay.bin --verify
//! ```
//!
//! Results and protocol responses go to stdout, logs to stderr.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rps_core::config::Config;
use rps_core::error::{Result, SimError};
use rps_core::replay::{InitialBatch, Replay};
use rps_core::world::UNEVEN_BATCH_RANGE;
use rps_headless::{
    batch::{run_batch, BatchConfig},
    runner::{HeadlessRunner, RunSettings, DEFAULT_DT, DEFAULT_MAX_STEPS},
    session::Session,
};

#[derive(Parser)]
#[command(name = "rps_headless")]
#[command(about = "Headless rock-paper-scissors runner for experiments and replay checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by commands that build a world.
#[derive(Args, Clone)]
struct WorldArgs {
    /// RON config file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds of simulated time per update
    #[arg(long, default_value_t = DEFAULT_DT)]
    dt: f32,
}

/// How the initial population is spawned.
#[derive(Args, Clone)]
struct PopulationArgs {
    /// Agents per kind in the initial batch (config batch size when omitted)
    #[arg(short, long)]
    batch: Option<u32>,

    /// Spawn an uneven random mix instead of a balanced batch
    #[arg(long, conflicts_with = "batch")]
    uneven: bool,

    /// Smallest per-kind count of an uneven mix
    #[arg(long, default_value_t = *UNEVEN_BATCH_RANGE.start())]
    mix_min: u32,

    /// Largest per-kind count of an uneven mix
    #[arg(long, default_value_t = *UNEVEN_BATCH_RANGE.end())]
    mix_max: u32,

    /// Update budget before a session counts as undecided
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_ticks: u64,
}

impl PopulationArgs {
    fn settings(&self, dt: f32) -> RunSettings {
        let batch = if self.uneven {
            Some(InitialBatch::Uneven {
                min: self.mix_min,
                max: self.mix_max,
            })
        } else {
            self.batch.map(InitialBatch::Balanced)
        };
        RunSettings {
            batch,
            dt,
            max_steps: self.max_ticks,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one session until a single kind is left
    Run {
        #[command(flatten)]
        world: WorldArgs,

        #[command(flatten)]
        population: PopulationArgs,

        /// Write the spawn and collision event log as JSON
        #[arg(long)]
        events: Option<PathBuf>,

        /// Record a replay file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Run many seeds in parallel and report win rates
    Batch {
        #[command(flatten)]
        world: WorldArgs,

        #[command(flatten)]
        population: PopulationArgs,

        /// Number of sessions
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Write full results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-run a recorded session
    Replay {
        /// Replay file
        #[arg(short, long)]
        file: PathBuf,

        /// Fail unless the final state hash matches the recording
        #[arg(long)]
        verify: bool,
    },

    /// Drive a world interactively with JSON lines on stdin
    Session {
        #[command(flatten)]
        world: WorldArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is for results and protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            world,
            population,
            events,
            record,
        }) => cmd_run(&world, &population, events.as_deref(), record.as_deref()),
        Some(Commands::Batch {
            world,
            population,
            games,
            parallel,
            output,
        }) => cmd_batch(&world, &population, games, parallel, output.as_deref()),
        Some(Commands::Replay { file, verify }) => cmd_replay(&file, verify),
        Some(Commands::Session { world }) => cmd_session(&world),
        None => cmd_session(&WorldArgs {
            config: None,
            seed: None,
            dt: DEFAULT_DT,
        }),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

fn load_config(args: &WorldArgs) -> Result<Config> {
    let config = match &args.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading config");
            Config::load(path)?
        }
        None => Config::default(),
    };
    Ok(match args.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SimError::InvalidState(format!("Failed to encode output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Run one session to the end
fn cmd_run(world: &WorldArgs, population: &PopulationArgs, events: Option<&Path>, record: Option<&Path>) -> Result<()> {
    let config = load_config(world)?;
    let mut runner = HeadlessRunner::new(config, population.settings(world.dt))?;
    let summary = runner.run();

    if let Some(path) = events {
        runner.write_events(path)?;
        tracing::info!(path = %path.display(), "Event log written");
    }
    if let Some(path) = record {
        runner.replay().save(path)?;
        tracing::info!(path = %path.display(), steps = runner.steps(), "Replay recorded");
    }

    print_json(&summary)
}

/// Run a batch of seeds
fn cmd_batch(
    world: &WorldArgs,
    population: &PopulationArgs,
    games: u32,
    parallel: usize,
    output: Option<&Path>,
) -> Result<()> {
    let config = BatchConfig {
        config: load_config(world)?,
        settings: population.settings(world.dt),
        games,
        seed_start: world.seed.unwrap_or(0),
        parallel,
    };
    let results = run_batch(&config)?;

    eprintln!("\n=== Batch Results ===");
    eprintln!("Games: {} ({} undecided)", results.summary.games, results.summary.undecided);
    for (kind, wins) in &results.summary.wins {
        eprintln!(
            "  {:<9} {:>6} wins ({:.1}%)",
            kind.display_name(),
            wins,
            results.summary.win_rates[kind] * 100.0
        );
    }
    eprintln!("Mean ticks to decision: {:.0}", results.summary.mean_ticks_to_decision);
    if !results.errors.is_empty() {
        eprintln!("Errors: {}", results.errors.len());
    }

    if let Some(path) = output {
        results.save(path)?;
        tracing::info!(path = %path.display(), "Batch results written");
    }

    print_json(&results.summary)
}

/// Replay a recorded session
fn cmd_replay(file: &Path, verify: bool) -> Result<()> {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = Replay::load(file)?;

    eprintln!("Loaded replay:");
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Batch: {:?}", replay.batch);
    eprintln!("  Spawns: {}", replay.spawns.len());
    eprintln!("  Duration: {} updates", replay.duration());

    if !verify {
        let world = replay.run()?;
        eprintln!("Finished at tick {} (hash {:016x})", world.tick(), world.state_hash());
        return Ok(());
    }

    eprintln!("Verifying replay...");
    match replay.verify() {
        Ok(world) => {
            eprintln!("PASS: Replay verification successful");
            eprintln!("  Expected hash: {:016x}", replay.final_hash);
            eprintln!("  Actual hash:   {:016x}", world.state_hash());
            Ok(())
        }
        Err(SimError::ReplayMismatch { tick, expected, actual }) => {
            eprintln!("FAIL: Replay produced different hash at tick {tick}!");
            eprintln!("  Expected: {expected:016x}");
            eprintln!("  Actual:   {actual:016x}");
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}

/// Serve an interactive session on stdin/stdout
fn cmd_session(world: &WorldArgs) -> Result<()> {
    tracing::info!("Starting interactive session");
    let mut session = Session::new(load_config(world)?, world.dt)?;
    let stdin = std::io::stdin();
    session.serve(stdin.lock(), std::io::stdout().lock())
}
