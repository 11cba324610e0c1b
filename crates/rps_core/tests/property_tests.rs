//! Property-based tests for the simulation invariants.

use proptest::prelude::*;
use rps_core::prelude::*;
use rps_test_utils::determinism::strategies::{arb_kind, arb_position, arb_spawn_script};
use rps_test_utils::fixtures::{run_script, DT};

proptest! {
    /// Exactly one of two distinct kinds beats the other; a kind never
    /// beats itself.
    #[test]
    fn prop_dominance_is_total(a in arb_kind(), b in arb_kind()) {
        if a == b {
            prop_assert_eq!(a.compare(b), Outcome::Tie);
            prop_assert!(!a.beats(b));
        } else {
            prop_assert!(a.beats(b) ^ b.beats(a));
            prop_assert_eq!(a.compare(b).as_i8(), -b.compare(a).as_i8());
        }
    }

    /// N spawns into a cap of K leave min(N, K) live agents.
    #[test]
    fn prop_population_cap(
        cap in 1usize..40,
        kinds in proptest::collection::vec(arb_kind(), 0..80),
    ) {
        let config = Config::default().with_seed(0).with_max_population(cap);
        let mut world = World::new(config).unwrap();

        let mut rejected = 0;
        for (i, kind) in kinds.iter().enumerate() {
            let x = 20.0 + (i % 40) as f32 * 29.0;
            let y = 20.0 + (i / 40) as f32 * 400.0;
            if world.spawn(*kind, Vec2::new(x, y), None).is_none() {
                rejected += 1;
            }
        }

        let expected = kinds.len().min(cap);
        prop_assert_eq!(world.total_count(), expected);
        prop_assert_eq!(rejected, kinds.len() - expected);
    }

    /// The live population never exceeds the cap while the world runs.
    #[test]
    fn prop_cap_holds_during_run(
        cap in 1usize..30,
        script in arb_spawn_script(60, 40),
    ) {
        let config = Config::default().with_seed(5).with_max_population(cap);
        let mut world = World::new(config).unwrap();
        run_script(&mut world, &script, 40, DT);
        prop_assert!(world.total_count() <= cap);
        let live_by_kind: usize = world.counts().values().sum();
        prop_assert_eq!(live_by_kind, world.total_count());
    }

    /// Under bounce, live agents always end an update fully inside the arena.
    #[test]
    fn prop_bounce_keeps_bodies_inside(
        seed in 0u64..10_000,
        positions in proptest::collection::vec((arb_kind(), arb_position(1200.0, 800.0)), 1..30),
    ) {
        let config = Config::default().with_seed(seed).with_boundary(BoundaryMode::Bounce);
        let mut world = World::new(config).unwrap();
        for (kind, position) in positions {
            world.spawn(kind, position, None);
        }

        for _ in 0..30 {
            world.update(DT);
            for agent in world.agents() {
                prop_assert!(agent.position.x >= agent.radius);
                prop_assert!(agent.position.x <= 1200.0 - agent.radius);
                prop_assert!(agent.position.y >= agent.radius);
                prop_assert!(agent.position.y <= 800.0 - agent.radius);
            }
        }
    }

    /// Under wrap, positions stay within the arena.
    #[test]
    fn prop_wrap_keeps_centers_inside(
        seed in 0u64..10_000,
        positions in proptest::collection::vec((arb_kind(), arb_position(1200.0, 800.0)), 1..30),
    ) {
        let config = Config::default().with_seed(seed).with_boundary(BoundaryMode::Wrap);
        let mut world = World::new(config).unwrap();
        for (kind, position) in positions {
            world.spawn(kind, position, None);
        }

        for _ in 0..30 {
            world.update(DT);
            for agent in world.agents() {
                prop_assert!((0.0..1200.0).contains(&agent.position.x));
                prop_assert!((0.0..800.0).contains(&agent.position.y));
            }
        }
    }

    /// Speeds never exceed each agent's cap.
    #[test]
    fn prop_speed_is_capped(seed in 0u64..10_000, per_kind in 1u32..15) {
        let mut world = World::new(Config::default().with_seed(seed)).unwrap();
        world.spawn_batch(Some(per_kind));
        for _ in 0..60 {
            world.update(DT);
            for agent in world.agents() {
                prop_assert!(agent.velocity.length() <= agent.max_speed * (1.0 + 1e-4));
            }
        }
    }

    /// Same seed and call sequence give bit-identical ids, names and positions.
    #[test]
    fn prop_seeded_runs_are_identical(
        seed in 0u64..1_000_000,
        script in arb_spawn_script(30, 50),
    ) {
        let run = || {
            let mut world = World::with_sink(Config::default().with_seed(seed), EventLog::new()).unwrap();
            world.spawn_batch(Some(4));
            run_script(&mut world, &script, 50, DT);
            world
        };
        let a = run();
        let b = run();

        prop_assert_eq!(a.history(), b.history());
        prop_assert_eq!(a.sink().collisions(), b.sink().collisions());
        prop_assert_eq!(a.state_hash(), b.state_hash());
    }

    /// Ids are strictly increasing and survive resets without reuse.
    #[test]
    fn prop_ids_never_reused(resets in 1usize..5, per_kind in 1u32..5) {
        let mut world = World::new(Config::default().with_seed(1)).unwrap();
        let mut last: Option<AgentId> = None;
        for round in 0..resets {
            for id in world.spawn_batch(Some(per_kind)) {
                prop_assert!(last.map_or(true, |prev| id > prev));
                last = Some(id);
            }
            world.reset(Some(round as u64));
        }
    }
}
