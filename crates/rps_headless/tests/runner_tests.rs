//! Recorded runs survive a save/load round trip and replay exactly.

use rps_core::prelude::*;
use rps_core::replay::{InitialBatch, Replay};
use rps_headless::runner::{HeadlessRunner, RunSettings};
use rps_test_utils::determinism::verify_replay_determinism;

#[test]
fn recorded_uneven_session_verifies_from_disk() {
    let config = Config::default().with_seed(2024).with_boundary(BoundaryMode::Wrap);
    let settings = RunSettings {
        batch: Some(InitialBatch::Uneven { min: 2, max: 6 }),
        max_steps: 900,
        ..RunSettings::default()
    };
    let mut runner = HeadlessRunner::new(config, settings).unwrap();
    for _ in 0..15 {
        runner.step();
    }
    runner.spawn(Kind::Scissors, Vec2::new(20.0, 20.0));
    runner.spawn(Kind::Rock, Vec2::new(1180.0, 780.0));
    let summary = runner.run();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.replay");
    runner.replay().save(&path).unwrap();

    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded.final_hash, summary.final_hash);
    assert_eq!(loaded.final_tick, summary.tick);
    assert!(verify_replay_determinism(&loaded));

    let world = loaded.verify().unwrap();
    assert_eq!(world.counts(), summary.counts);
    assert_eq!(world.scoreboard().len(), summary.scoreboard.len());
}

#[test]
fn same_seed_same_summary() {
    let run = || {
        let mut runner = HeadlessRunner::new(
            Config::default().with_seed(9),
            RunSettings {
                batch: Some(InitialBatch::Balanced(6)),
                max_steps: 1200,
                ..RunSettings::default()
            },
        )
        .unwrap();
        runner.run()
    };
    assert_eq!(run(), run());
}
