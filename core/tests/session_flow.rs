use std::cell::RefCell;
use std::rc::Rc;

use flappy_coach_core::config::{Curve, GameConfig};
use flappy_coach_core::intervention::Release;
use flappy_coach_core::tape::FrameInput;
use flappy_coach_core::{
    GameEvent, HighScoreStore, RoundController, RoundState, ScriptedCoach, Session, StoreError,
};

const DT: f64 = 1.0 / 60.0;

/// Stands in for a file on disk that outlives the session.
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<Option<u32>>>);

impl HighScoreStore for SharedStore {
    fn load_high_score(&mut self) -> Result<u32, StoreError> {
        Ok(self.0.borrow().unwrap_or(0))
    }

    fn save_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        *self.0.borrow_mut() = Some(score);
        Ok(())
    }
}

fn scoring_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.physics.gravity = 5.0;
    config.physics.flap_impulse = 0.0;
    config.obstacles.ceiling_margin = 50.0;
    config.obstacles.ground_margin = 50.0;
    config.difficulty.gap_height_base = 400.0;
    config.difficulty.gap_height_floor = 400.0;
    config.difficulty.gap_shrink = Curve::Flat;
    config.difficulty.speed_ramp = Curve::Flat;
    config.difficulty.max_speed = config.difficulty.base_speed;
    config.intervention.attempt_threshold = 2;
    config.intervention.time_threshold = 999_999.0;
    config
}

fn run_round(game: &mut RoundController, session: &mut Session) -> Vec<GameEvent> {
    let mut events = game.step(FrameInput::START, DT, session);
    while game.state() == RoundState::Playing {
        events.extend(game.tick(DT, session));
    }
    events
}

#[test]
fn high_score_survives_a_restart() {
    let disk = SharedStore::default();

    let best = {
        let mut session = Session::open(Box::new(disk.clone()));
        let mut game =
            RoundController::new(scoring_config(), 7, Box::new(ScriptedCoach::new(5)))
                .expect("valid config");
        run_round(&mut game, &mut session);
        let best = session.stats().high_score;
        assert!(best > 0);
        best
    };

    let session = Session::open(Box::new(disk));
    assert_eq!(session.stats().high_score, best);
    assert_eq!(session.stats().total_loss_count, 0);
}

#[test]
fn coach_interrupts_every_second_loss() {
    let mut session = Session::in_memory();
    let mut game = RoundController::new(scoring_config(), 42, Box::new(ScriptedCoach::new(2)))
        .expect("valid config");

    let mut finished = Vec::new();
    for loss in 1..=4u32 {
        let events = run_round(&mut game, &mut session);
        let opened = events
            .iter()
            .any(|e| matches!(e, GameEvent::InterventionStarted { .. }));
        assert_eq!(opened, loss % 2 == 0, "loss {loss}");

        while game.state() == RoundState::AwaitingAgent {
            for event in game.step(FrameInput::START, DT, &mut session) {
                if let GameEvent::InterventionFinished { release } = event {
                    finished.push(release);
                }
            }
        }
        assert_eq!(game.state(), RoundState::Idle);
        game.validate().expect("invariants hold between rounds");
    }

    assert_eq!(finished, vec![Release::Done, Release::Done]);
    assert_eq!(session.stats().total_loss_count, 4);
    assert_eq!(game.rounds_started(), 4);
}
