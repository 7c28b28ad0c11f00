//! The round state machine.
//!
//! `Idle -> Playing -> Lost -> {Idle | AwaitingAgent} -> Idle`. One call to
//! [`RoundController::tick`] advances the machine by one frame. Nothing in
//! here blocks: a running coach session is polled once per tick.

use serde::{Deserialize, Serialize};

use crate::coach::{Coach, CoachRequest, SessionHandle};
use crate::collision::{self, Aabb, Collision};
use crate::config::{GameConfig, Progress};
use crate::error::{ConfigError, InvariantViolation};
use crate::intervention::{AgentStatus, Gate, InterventionScheduler, InterventionState, Release};
use crate::obstacles::{ObstacleGenerator, Pipe};
use crate::physics::{BirdState, PhysicsBody};
use crate::rng::SeededRng;
use crate::session::{RoundStats, RoundSummary, Session};
use crate::tape::FrameInput;


const GAP_BOUNDS_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    Idle,
    Playing,
    Lost,
    AwaitingAgent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Flap,
    StartOrRestart,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted { round: u32 },
    Flapped,
    PipeSpawned { gap_center: f64, gap_height: f64 },
    PipePassed { score: u32 },
    RoundLost { collision: Collision, summary: RoundSummary },
    NewHighScore { score: u32 },
    InterventionStarted {
        handle: SessionHandle,
        request: CoachRequest,
    },
    InterventionFinished { release: Release },
}

/// Read-only view for renderers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub state: RoundState,
    pub round: u32,
    pub bird: BirdState,
    pub bird_x: f64,
    pub pipes: Vec<Pipe>,
    pub score: u32,
    pub elapsed: f64,
    pub speed: f64,
    pub gap_height: f64,
    pub last_collision: Collision,
    pub intervention: InterventionState,
    pub rng_state: u32,
}

pub struct RoundController {
    config: GameConfig,
    state: RoundState,
    body: PhysicsBody,
    obstacles: ObstacleGenerator,
    round: RoundStats,
    rounds_started: u32,
    distance: f64,
    speed: f64,
    gap_height: f64,
    last_collision: Collision,
    scheduler: InterventionScheduler,
    events: Vec<GameEvent>,
}

impl RoundController {
    pub fn new(config: GameConfig, seed: u32, coach: Box<dyn Coach>) -> Result<Self, ConfigError> {
        config.validate()?;

        let start = Progress::default();
        Ok(Self {
            state: RoundState::Idle,
            body: PhysicsBody::new(config.physics.bird_start_y),
            obstacles: ObstacleGenerator::new(
                config.obstacles,
                config.world,
                SeededRng::new(seed),
            ),
            round: RoundStats::default(),
            rounds_started: 0,
            distance: 0.0,
            speed: config.difficulty.speed_at(start),
            gap_height: config.difficulty.gap_height_at(start),
            last_collision: Collision::None,
            scheduler: InterventionScheduler::new(config.intervention, coach),
            events: Vec::new(),
            config,
        })
    }

    #[inline]
    pub fn state(&self) -> RoundState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn round_stats(&self) -> RoundStats {
        self.round
    }

    #[inline]
    pub fn rounds_started(&self) -> u32 {
        self.rounds_started
    }

    #[inline]
    pub fn intervention(&self) -> &InterventionState {
        self.scheduler.state()
    }

    pub fn bird_box(&self) -> Aabb {
        let physics = &self.config.physics;
        Aabb {
            x: physics.bird_x,
            y: self.body.state().vertical_position,
            width: physics.bird_width,
            height: physics.bird_height,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            state: self.state,
            round: self.rounds_started,
            bird: self.body.state(),
            bird_x: self.config.physics.bird_x,
            pipes: self.obstacles.pipes().to_vec(),
            score: self.round.score,
            elapsed: self.round.elapsed_time,
            speed: self.speed,
            gap_height: self.gap_height,
            last_collision: self.last_collision,
            intervention: *self.scheduler.state(),
            rng_state: self.obstacles.rng_state(),
        }
    }

    /// Applies one input signal. Returns whether it changed anything; a
    /// restart while the coach holds the gate is dropped, not queued.
    pub fn handle_input(&mut self, input: Input) -> bool {
        match (input, self.state) {
            (Input::StartOrRestart, RoundState::Idle) => {
                self.start_round();
                true
            }
            (Input::StartOrRestart, RoundState::AwaitingAgent) => {
                tracing::trace!("restart ignored while the coach is speaking");
                false
            }
            (Input::Flap, RoundState::Playing) => {
                self.body.flap(self.config.physics.flap_impulse);
                self.events.push(GameEvent::Flapped);
                true
            }
            _ => false,
        }
    }

    /// Start, then flap, then tick.
    pub fn step(&mut self, input: FrameInput, dt: f64, session: &mut Session) -> Vec<GameEvent> {
        if input.start {
            self.handle_input(Input::StartOrRestart);
        }
        if input.flap {
            self.handle_input(Input::Flap);
        }
        self.tick(dt, session)
    }

    /// Advances one frame and returns every event raised since the last
    /// tick, inputs included. Negative or non-finite `dt` counts as zero.
    pub fn tick(&mut self, dt: f64, session: &mut Session) -> Vec<GameEvent> {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        match self.state {
            RoundState::Playing => self.advance_round(dt, session),
            RoundState::AwaitingAgent => self.poll_agent(dt),
            RoundState::Idle | RoundState::Lost => {}
        }

        std::mem::take(&mut self.events)
    }

    /// Forces `AwaitingAgent -> Idle`, closing the coach session.
    pub fn abort_intervention(&mut self) -> bool {
        if self.state != RoundState::AwaitingAgent || !self.scheduler.abort() {
            return false;
        }
        self.events.push(GameEvent::InterventionFinished {
            release: Release::Aborted,
        });
        self.transition(RoundState::Idle);
        true
    }

    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let awaiting = self.state == RoundState::AwaitingAgent;
        if awaiting != self.scheduler.is_holding() {
            return Err(InvariantViolation::AgentSessionState);
        }

        let intervention = self.scheduler.state();
        if self.round.elapsed_time < 0.0 || intervention.time_since_last < 0.0 {
            return Err(InvariantViolation::NegativeTime);
        }

        if self.round.score != self.obstacles.passed_count() {
            return Err(InvariantViolation::ScorePassedMismatch);
        }

        let world = &self.config.world;
        let margins = &self.config.obstacles;
        let min_top = world.top + margins.ceiling_margin - GAP_BOUNDS_EPSILON;
        let max_bottom = world.bottom - margins.ground_margin + GAP_BOUNDS_EPSILON;
        for pipe in self.obstacles.pipes() {
            if pipe.gap_top() < min_top || pipe.gap_bottom() > max_bottom {
                return Err(InvariantViolation::PipeGapOutOfBounds);
            }
        }

        Ok(())
    }

    fn transition(&mut self, next: RoundState) {
        tracing::debug!(from = ?self.state, to = ?next, "round state");
        self.state = next;
    }

    fn start_round(&mut self) {
        let start = Progress::default();
        self.body.reset(self.config.physics.bird_start_y);
        self.obstacles.reset();
        self.round = RoundStats::default();
        self.distance = 0.0;
        self.speed = self.config.difficulty.speed_at(start);
        self.gap_height = self.config.difficulty.gap_height_at(start);
        self.last_collision = Collision::None;
        self.rounds_started += 1;

        self.events.push(GameEvent::RoundStarted {
            round: self.rounds_started,
        });
        self.transition(RoundState::Playing);
    }

    fn advance_round(&mut self, dt: f64, session: &mut Session) {
        self.round.elapsed_time += dt;

        let physics = self.config.physics;
        self.body.apply_gravity(physics.gravity, dt);
        self.body.integrate(dt);

        // Difficulty only ever tightens within a round.
        let progress = Progress {
            score: self.round.score,
            elapsed: self.round.elapsed_time,
        };
        let difficulty = &self.config.difficulty;
        self.speed = difficulty.speed_at(progress).max(self.speed);
        self.gap_height = difficulty.gap_height_at(progress).min(self.gap_height);

        self.obstacles.advance(dt, self.speed);
        self.distance += self.speed * dt;
        for pipe in self.obstacles.spawn_if_due(self.distance, self.gap_height) {
            self.events.push(GameEvent::PipeSpawned {
                gap_center: pipe.gap_center,
                gap_height: pipe.gap_height,
            });
        }

        for _ in 0..self.obstacles.mark_passed(physics.bird_x) {
            self.round.score += 1;
            self.events.push(GameEvent::PipePassed {
                score: self.round.score,
            });
            let stats = session.stats();
            tracing::debug!(
                losses = stats.total_loss_count,
                best = stats.high_score,
                score = self.round.score,
                time = stats.total_time_played + self.round.elapsed_time,
                "pipe passed"
            );
        }
        self.obstacles.prune();

        let hit = collision::check(
            self.bird_box(),
            self.obstacles.pipes(),
            self.config.obstacles.pipe_width,
            &self.config.world,
        );
        if hit.is_hit() {
            self.lose(hit, session);
        }
    }

    fn lose(&mut self, hit: Collision, session: &mut Session) {
        self.last_collision = hit;
        self.transition(RoundState::Lost);

        let summary = session.finalize_round(&self.round);
        self.scheduler.record_round(self.round.elapsed_time);
        tracing::info!(
            round = self.rounds_started,
            score = self.round.score,
            collision = ?hit,
            losses = summary.stats.total_loss_count,
            best = summary.stats.high_score,
            "round lost"
        );

        self.events.push(GameEvent::RoundLost {
            collision: hit,
            summary,
        });
        if summary.new_high_score {
            self.events.push(GameEvent::NewHighScore {
                score: summary.stats.high_score,
            });
        }

        let request = CoachRequest {
            loss_count: summary.stats.total_loss_count,
            time_played: summary.stats.total_time_played,
            recent_score: self.round.score,
            high_score: summary.stats.high_score,
            new_high_score: summary.new_high_score,
        };
        match self.scheduler.begin(&request) {
            Gate::Open => self.transition(RoundState::Idle),
            Gate::Held(handle) => {
                self.events
                    .push(GameEvent::InterventionStarted { handle, request });
                self.transition(RoundState::AwaitingAgent);
            }
        }
    }

    fn poll_agent(&mut self, dt: f64) {
        match self.scheduler.poll(dt) {
            AgentStatus::Running => {}
            AgentStatus::Released(release) => {
                self.events
                    .push(GameEvent::InterventionFinished { release });
                self.transition(RoundState::Idle);
            }
        }
    }
}
