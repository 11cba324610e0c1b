//! Batch session runner.
//!
//! Runs many seeded sessions in parallel using rayon to see how often each
//! kind ends up winning under a given config.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rps_core::config::Config;
use rps_core::error::{Result, SimError};
use rps_core::kind::Kind;

use crate::runner::{write_json, HeadlessRunner, RunSettings};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Session config shared by every game. Its seed is ignored.
    pub config: Config,
    /// How each game is driven.
    pub settings: RunSettings,
    /// Number of games.
    pub games: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Worker threads (0 = rayon default).
    pub parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            config: Config::default(),
            settings: RunSettings::default(),
            games: 100,
            seed_start: 0,
            parallel: 0,
        }
    }
}

impl BatchConfig {
    /// `games` games with default settings.
    pub fn new(games: u32) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    /// Set the first seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the per-game settings.
    pub fn with_settings(mut self, settings: RunSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Outcome of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Seed used.
    pub seed: u64,
    /// Surviving kind, `None` if the step budget ran out.
    pub winner: Option<Kind>,
    /// Updates driven.
    pub steps: u64,
    /// Final world tick.
    pub tick: u64,
    /// Live agents at the end.
    pub survivors: usize,
    /// Final state hash.
    pub final_hash: u64,
}

/// A game that could not be set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Aggregate over the games of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games completed.
    pub games: usize,
    /// Games that ran out of steps with more than one kind alive.
    pub undecided: usize,
    /// Wins per kind, zeros included.
    pub wins: BTreeMap<Kind, usize>,
    /// Share of completed games won per kind.
    pub win_rates: BTreeMap<Kind, f64>,
    /// Mean final tick over decided games.
    pub mean_ticks_to_decision: f64,
}

impl BatchSummary {
    /// Aggregate `games`.
    pub fn from_games(games: &[GameResult]) -> Self {
        let mut wins: BTreeMap<Kind, usize> = Kind::ALL.iter().map(|&kind| (kind, 0)).collect();
        let mut decided_ticks = 0u64;
        let mut decided = 0usize;

        for game in games {
            if let Some(winner) = game.winner {
                *wins.entry(winner).or_insert(0) += 1;
                decided_ticks += game.tick;
                decided += 1;
            }
        }

        let total = games.len();
        let win_rates = wins
            .iter()
            .map(|(&kind, &count)| (kind, if total == 0 { 0.0 } else { count as f64 / total as f64 }))
            .collect();

        Self {
            games: total,
            undecided: total - decided,
            wins,
            win_rates,
            mean_ticks_to_decision: if decided == 0 {
                0.0
            } else {
                decided_ticks as f64 / decided as f64
            },
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Per-game results in seed order.
    pub games: Vec<GameResult>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Games that failed to start.
    pub errors: Vec<BatchError>,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

fn run_single_game(config: &BatchConfig, seed: u64) -> Result<GameResult> {
    let mut runner = HeadlessRunner::new(config.config.clone().with_seed(seed), config.settings)?;
    let summary = runner.run();
    Ok(GameResult {
        seed,
        winner: summary.winner,
        steps: summary.steps,
        tick: summary.tick,
        survivors: summary.counts.values().sum(),
        final_hash: summary.final_hash,
    })
}

/// Run every game of the batch.
pub fn run_batch(config: &BatchConfig) -> Result<BatchResults> {
    let start = Instant::now();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if config.parallel > 0 {
        builder = builder.num_threads(config.parallel);
    }
    let pool = builder
        .build()
        .map_err(|e| SimError::InvalidConfig(format!("cannot build thread pool: {e}")))?;

    info!(
        games = config.games,
        seed_start = config.seed_start,
        threads = pool.current_num_threads(),
        "Starting batch"
    );

    let results: Vec<std::result::Result<GameResult, BatchError>> = pool.install(|| {
        (0..config.games)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                run_single_game(config, seed)
                    .map(|game| {
                        debug!(seed, winner = ?game.winner, tick = game.tick, "Game finished");
                        game
                    })
                    .map_err(|e| {
                        warn!(seed, error = %e, "Game failed");
                        BatchError {
                            seed,
                            message: e.to_string(),
                        }
                    })
            })
            .collect()
    });

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(std::result::Result::is_ok);
    let games: Vec<GameResult> = games.into_iter().filter_map(std::result::Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(std::result::Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        undecided = summary.undecided,
        "Batch complete in {:.1}s",
        duration_seconds
    );

    Ok(BatchResults {
        games,
        summary,
        errors,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rps_core::replay::InitialBatch;

    fn small_batch(games: u32, parallel: usize) -> BatchConfig {
        BatchConfig {
            parallel,
            ..BatchConfig::new(games).with_seed(100).with_settings(RunSettings {
                batch: Some(InitialBatch::Balanced(4)),
                max_steps: 600,
                ..RunSettings::default()
            })
        }
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500).with_seed(12345);
        assert_eq!(config.games, 500);
        assert_eq!(config.seed_start, 12345);
    }

    #[test]
    fn test_results_in_seed_order() {
        let results = run_batch(&small_batch(6, 3)).unwrap();
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (100..106).collect::<Vec<_>>());
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.games, 6);
    }

    #[test]
    fn test_thread_count_does_not_change_results() {
        let single = run_batch(&small_batch(4, 1)).unwrap();
        let multi = run_batch(&small_batch(4, 4)).unwrap();
        assert_eq!(single.games, multi.games);
    }

    #[test]
    fn test_invalid_config_reported_per_game() {
        let mut config = small_batch(2, 1);
        config.config.max_population = 0;
        let results = run_batch(&config).unwrap();
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 2);
        assert_eq!(results.errors[0].seed, 100);
    }

    #[test]
    fn test_summary_counts() {
        let game = |seed, winner, tick| GameResult {
            seed,
            winner,
            steps: tick,
            tick,
            survivors: 1,
            final_hash: 0,
        };
        let summary = BatchSummary::from_games(&[
            game(0, Some(Kind::Rock), 100),
            game(1, Some(Kind::Rock), 300),
            game(2, Some(Kind::Paper), 200),
            game(3, None, 900),
        ]);

        assert_eq!(summary.games, 4);
        assert_eq!(summary.undecided, 1);
        assert_eq!(summary.wins[&Kind::Rock], 2);
        assert_eq!(summary.wins[&Kind::Scissors], 0);
        assert!((summary.win_rates[&Kind::Rock] - 0.5).abs() < f64::EPSILON);
        assert!((summary.mean_ticks_to_decision - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_games(&[]);
        assert_eq!(summary.games, 0);
        assert_eq!(summary.mean_ticks_to_decision, 0.0);
        assert_eq!(summary.wins.len(), 3);
    }
}
