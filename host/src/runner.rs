use anyhow::{anyhow, Result};
use flappy_coach_core::collision::Collision;
use flappy_coach_core::constants::COACH_SPEECH_SECONDS;
use flappy_coach_core::intervention::Release;
use flappy_coach_core::tape::FrameInput;
use flappy_coach_core::{
    GameConfig, GameEvent, HighScoreStore, RoundController, RoundState, ScriptedCoach, Session,
    SessionStats,
};
use serde::Serialize;

use crate::bots::AutopilotBot;
use crate::util::seed_to_hex;

#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    pub seed: u32,
    pub rounds: u32,
    pub max_ticks: u64,
    pub tick_hz: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InterventionRecord {
    pub line: String,
    pub started_tick: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<Release>,
    pub waited_ticks: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundRecord {
    pub round: u32,
    pub score: u32,
    pub elapsed: f64,
    pub collision: Collision,
    pub new_high_score: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<InterventionRecord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub bot_id: String,
    pub seed: u32,
    pub seed_hex: String,
    pub tick_hz: u32,
    pub ticks: u64,
    pub truncated: bool,
    pub starting_high_score: u32,
    pub rounds: Vec<RoundRecord>,
    pub interventions: u32,
    pub stats: SessionStats,
}

impl RunReport {
    pub fn best_round_score(&self) -> u32 {
        self.rounds.iter().map(|round| round.score).max().unwrap_or(0)
    }
}

/// Drives `bot` through `options.rounds` lost rounds, or until the tick cap.
/// A coach intervention still open once the last round is lost is played out
/// so the report never ends with the gate held.
pub fn run_session(
    bot: &mut dyn AutopilotBot,
    config: GameConfig,
    store: Box<dyn HighScoreStore>,
    options: &RunOptions,
) -> Result<RunReport> {
    if options.rounds == 0 {
        return Err(anyhow!("rounds must be > 0"));
    }
    if options.tick_hz == 0 {
        return Err(anyhow!("tick_hz must be > 0"));
    }

    let dt = 1.0 / options.tick_hz as f64;
    let coach = ScriptedCoach::for_duration(COACH_SPEECH_SECONDS, options.tick_hz);
    let mut game = RoundController::new(config, options.seed, Box::new(coach))?;
    let mut session = Session::open(store);
    let starting_high_score = session.stats().high_score;

    bot.reset(options.seed);
    let mut rounds: Vec<RoundRecord> = Vec::with_capacity(options.rounds as usize);
    let mut interventions = 0u32;
    let mut ticks = 0u64;

    while ticks < options.max_ticks {
        let done = rounds.len() as u32 >= options.rounds;
        if done && game.state() != RoundState::AwaitingAgent {
            break;
        }

        let input = if done {
            FrameInput::IDLE
        } else {
            bot.next_input(&game.snapshot())
        };
        let events = game.step(input, dt, &mut session);
        ticks += 1;

        for event in events {
            match event {
                GameEvent::RoundLost { collision, summary } => rounds.push(RoundRecord {
                    round: game.rounds_started(),
                    score: summary.round.score,
                    elapsed: summary.round.elapsed_time,
                    collision,
                    new_high_score: summary.new_high_score,
                    intervention: None,
                }),
                GameEvent::InterventionStarted { request, .. } => {
                    interventions += 1;
                    if let Some(last) = rounds.last_mut() {
                        last.intervention = Some(InterventionRecord {
                            line: ScriptedCoach::line_for(&request),
                            started_tick: ticks,
                            release: None,
                            waited_ticks: 0,
                        });
                    }
                }
                GameEvent::InterventionFinished { release } => {
                    if let Some(record) = rounds
                        .last_mut()
                        .and_then(|round| round.intervention.as_mut())
                    {
                        record.release = Some(release);
                        record.waited_ticks = ticks - record.started_tick;
                    }
                }
                _ => {}
            }
        }

        game.validate()
            .map_err(|rule| anyhow!("invariant violated at tick {ticks}: {rule}"))?;
    }

    let truncated = (rounds.len() as u32) < options.rounds;
    if truncated {
        tracing::warn!(
            ticks,
            rounds = rounds.len(),
            wanted = options.rounds,
            "tick cap reached before the requested rounds finished"
        );
    }

    Ok(RunReport {
        bot_id: bot.id().to_string(),
        seed: options.seed,
        seed_hex: seed_to_hex(options.seed),
        tick_hz: options.tick_hz,
        ticks,
        truncated,
        starting_high_score,
        rounds,
        interventions,
        stats: *session.stats(),
    })
}
