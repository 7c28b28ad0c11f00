use flappy_coach::bots::create_bot;
use flappy_coach::runner::{run_session, RunOptions, RunReport};
use flappy_coach::store::JsonFileStore;
use flappy_coach_core::intervention::Release;
use flappy_coach_core::{GameConfig, HighScoreStore, MemoryStore};
use tempfile::TempDir;

fn options(seed: u32, rounds: u32) -> RunOptions {
    RunOptions {
        seed,
        rounds,
        max_ticks: 120_000,
        tick_hz: 60,
    }
}

fn simulate(bot: &str, store: Box<dyn HighScoreStore>, options: &RunOptions) -> RunReport {
    let config = GameConfig::default();
    let mut bot = create_bot(bot, &config).unwrap();
    run_session(bot.as_mut(), config, store, options).unwrap()
}

#[test]
fn every_round_is_recorded_and_every_intervention_released() {
    let report = simulate("gap-follower", Box::new(MemoryStore::default()), &options(1, 6));

    assert!(!report.truncated);
    assert_eq!(report.rounds.len(), 6);
    assert_eq!(report.stats.total_loss_count, 6);
    assert!(report.interventions >= 1);

    let rounds: Vec<u32> = report.rounds.iter().map(|r| r.round).collect();
    assert_eq!(rounds, vec![1, 2, 3, 4, 5, 6]);

    let mut seen = 0;
    for record in report.rounds.iter().filter_map(|r| r.intervention.as_ref()) {
        seen += 1;
        assert_eq!(record.release, Some(Release::Done));
        // 2.5 s of speech at 60 Hz, then the poll that reports done.
        assert_eq!(record.waited_ticks, 151);
        assert!(!record.line.is_empty());
    }
    assert_eq!(seen, report.interventions);
}

#[test]
fn high_score_carries_over_between_runs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("best.json");

    let first = simulate("gap-follower", Box::new(JsonFileStore::new(&path)), &options(3, 3));
    assert_eq!(first.starting_high_score, 0);
    assert!(first.stats.high_score > 0);

    let second = simulate("random", Box::new(JsonFileStore::new(&path)), &options(3, 2));
    assert_eq!(second.starting_high_score, first.stats.high_score);
    assert_eq!(second.stats.high_score, first.stats.high_score);
    assert!(second.rounds.iter().all(|r| !r.new_high_score));
}

#[test]
fn same_seed_gives_the_same_report() {
    let a = simulate("gap-follower", Box::new(MemoryStore::default()), &options(0xBEEF, 4));
    let b = simulate("gap-follower", Box::new(MemoryStore::default()), &options(0xBEEF, 4));
    assert_eq!(a.rounds, b.rounds);
    assert_eq!(a.ticks, b.ticks);
}

#[test]
fn tick_cap_truncates_the_run() {
    let mut capped = options(1, 5);
    capped.max_ticks = 30;
    let report = simulate("gap-follower", Box::new(MemoryStore::default()), &capped);
    assert!(report.truncated);
    assert_eq!(report.ticks, 30);
    assert!(report.rounds.is_empty());
}

#[test]
fn zero_rounds_is_rejected() {
    let config = GameConfig::default();
    let mut bot = create_bot("random", &config).unwrap();
    let result = run_session(
        bot.as_mut(),
        config,
        Box::new(MemoryStore::default()),
        &options(1, 0),
    );
    assert!(result.is_err());
}
