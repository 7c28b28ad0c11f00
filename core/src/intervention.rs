//! Decides when the coach interrupts between rounds and owns the coach
//! session for as long as it runs.

use serde::{Deserialize, Serialize};

use crate::coach::{AgentPoll, Coach, CoachRequest, SessionHandle};
use crate::config::InterventionConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionState {
    pub attempts_since_last: u32,
    pub time_since_last: f64,
    pub agent_session: Option<SessionHandle>,
    /// Seconds the open session has been polled for.
    pub waited: f64,
}

/// Either threshold fires; neither has priority.
pub fn should_intervene(state: &InterventionState, config: &InterventionConfig) -> bool {
    state.attempts_since_last >= config.attempt_threshold
        || state.time_since_last >= config.time_threshold
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Open,
    Held(SessionHandle),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Release {
    Done,
    Failed,
    TimedOut,
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentStatus {
    Running,
    Released(Release),
}

pub struct InterventionScheduler {
    config: InterventionConfig,
    state: InterventionState,
    coach: Box<dyn Coach>,
}

impl InterventionScheduler {
    pub fn new(config: InterventionConfig, coach: Box<dyn Coach>) -> Self {
        Self {
            config,
            state: InterventionState::default(),
            coach,
        }
    }

    #[inline]
    pub fn state(&self) -> &InterventionState {
        &self.state
    }

    #[inline]
    pub fn is_holding(&self) -> bool {
        self.state.agent_session.is_some()
    }

    pub fn record_round(&mut self, elapsed: f64) {
        self.state.attempts_since_last = self.state.attempts_since_last.saturating_add(1);
        self.state.time_since_last += elapsed.max(0.0);
    }

    /// Called once per finished round, after the round has been recorded.
    /// When the thresholds fire, both accumulators reset and a coach session
    /// opens; a coach that fails to open leaves the gate open.
    pub fn begin(&mut self, request: &CoachRequest) -> Gate {
        if self.state.agent_session.is_some() || !should_intervene(&self.state, &self.config) {
            return Gate::Open;
        }

        tracing::debug!(
            attempts = self.state.attempts_since_last,
            time = self.state.time_since_last,
            "intervention thresholds reached"
        );
        self.state.attempts_since_last = 0;
        self.state.time_since_last = 0.0;

        match self.coach.open_session(request) {
            Ok(handle) => {
                self.state.agent_session = Some(handle);
                self.state.waited = 0.0;
                Gate::Held(handle)
            }
            Err(err) => {
                tracing::warn!("coach session failed to open, skipping intervention: {err}");
                Gate::Open
            }
        }
    }

    /// Polls the open session once. `dt` counts toward `agent_max_wait`.
    pub fn poll(&mut self, dt: f64) -> AgentStatus {
        let Some(handle) = self.state.agent_session else {
            return AgentStatus::Released(Release::Done);
        };

        let release = match self.coach.poll(handle) {
            AgentPoll::Running => {
                self.state.waited += dt;
                if self.state.waited < self.config.agent_max_wait {
                    return AgentStatus::Running;
                }
                tracing::warn!(
                    handle = handle.0,
                    waited = self.state.waited,
                    "coach session timed out, releasing the restart gate"
                );
                Release::TimedOut
            }
            AgentPoll::Done => Release::Done,
            AgentPoll::Failed(reason) => {
                tracing::warn!(handle = handle.0, "coach session failed: {reason}");
                Release::Failed
            }
        };

        self.finish(handle);
        AgentStatus::Released(release)
    }

    /// Explicit cancel. Returns false when no session was open.
    pub fn abort(&mut self) -> bool {
        match self.state.agent_session {
            Some(handle) => {
                tracing::info!(handle = handle.0, "coach session aborted");
                self.finish(handle);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, handle: SessionHandle) {
        self.coach.close(handle);
        self.state.agent_session = None;
        self.state.waited = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::ScriptedCoach;
    use crate::error::AgentError;

    fn config(attempts: u32, seconds: f64) -> InterventionConfig {
        InterventionConfig {
            attempt_threshold: attempts,
            time_threshold: seconds,
            agent_max_wait: 1.0,
        }
    }

    fn request() -> CoachRequest {
        CoachRequest {
            loss_count: 3,
            time_played: 0.3,
            recent_score: 0,
            high_score: 0,
            new_high_score: false,
        }
    }

    struct BrokenCoach;

    impl Coach for BrokenCoach {
        fn open_session(&mut self, _: &CoachRequest) -> Result<SessionHandle, AgentError> {
            Err(AgentError::Unavailable("offline".to_string()))
        }

        fn poll(&mut self, _: SessionHandle) -> AgentPoll {
            AgentPoll::Failed("offline".to_string())
        }

        fn close(&mut self, _: SessionHandle) {}
    }

    struct ForeverCoach;

    impl Coach for ForeverCoach {
        fn open_session(&mut self, _: &CoachRequest) -> Result<SessionHandle, AgentError> {
            Ok(SessionHandle(77))
        }

        fn poll(&mut self, _: SessionHandle) -> AgentPoll {
            AgentPoll::Running
        }

        fn close(&mut self, _: SessionHandle) {}
    }

    #[test]
    fn either_threshold_fires() {
        let cfg = config(3, 10.0);
        let mut state = InterventionState::default();
        assert!(!should_intervene(&state, &cfg));
        state.attempts_since_last = 3;
        assert!(should_intervene(&state, &cfg));
        state.attempts_since_last = 0;
        state.time_since_last = 10.0;
        assert!(should_intervene(&state, &cfg));
        state.time_since_last = 9.99;
        assert!(!should_intervene(&state, &cfg));
    }

    #[test]
    fn third_loss_fires_and_resets() {
        let mut scheduler =
            InterventionScheduler::new(config(3, 999_999.0), Box::new(ScriptedCoach::new(1)));

        for _ in 0..2 {
            scheduler.record_round(0.1);
            assert_eq!(scheduler.begin(&request()), Gate::Open);
        }
        scheduler.record_round(0.1);
        assert!(matches!(scheduler.begin(&request()), Gate::Held(_)));
        assert_eq!(scheduler.state().attempts_since_last, 0);
        assert_eq!(scheduler.state().time_since_last, 0.0);
        assert!(!should_intervene(scheduler.state(), &config(3, 999_999.0)));
    }

    #[test]
    fn play_time_alone_fires() {
        let cfg = config(99, 1.0);
        let mut scheduler = InterventionScheduler::new(cfg, Box::new(ScriptedCoach::new(1)));

        for _ in 0..2 {
            scheduler.record_round(0.4);
            assert_eq!(scheduler.begin(&request()), Gate::Open);
        }
        assert!((scheduler.state().time_since_last - 0.8).abs() < 1e-9);

        scheduler.record_round(0.4);
        assert!(matches!(scheduler.begin(&request()), Gate::Held(_)));
        assert_eq!(scheduler.state().attempts_since_last, 0);
        assert_eq!(scheduler.state().time_since_last, 0.0);
    }

    #[test]
    fn poll_releases_when_done() {
        let mut scheduler =
            InterventionScheduler::new(config(1, 999.0), Box::new(ScriptedCoach::new(1)));
        scheduler.record_round(1.0);
        assert!(matches!(scheduler.begin(&request()), Gate::Held(_)));
        assert_eq!(scheduler.poll(0.1), AgentStatus::Running);
        assert_eq!(scheduler.poll(0.1), AgentStatus::Released(Release::Done));
        assert!(!scheduler.is_holding());
    }

    #[test]
    fn failed_open_keeps_gate_open() {
        let mut scheduler = InterventionScheduler::new(config(1, 999.0), Box::new(BrokenCoach));
        scheduler.record_round(1.0);
        assert_eq!(scheduler.begin(&request()), Gate::Open);
        assert!(!scheduler.is_holding());
        assert_eq!(scheduler.state().attempts_since_last, 0);
    }

    #[test]
    fn stuck_coach_times_out() {
        let mut scheduler = InterventionScheduler::new(config(1, 999.0), Box::new(ForeverCoach));
        scheduler.record_round(1.0);
        assert_eq!(scheduler.begin(&request()), Gate::Held(SessionHandle(77)));
        for _ in 0..3 {
            assert_eq!(scheduler.poll(0.25), AgentStatus::Running);
        }
        assert_eq!(
            scheduler.poll(0.25),
            AgentStatus::Released(Release::TimedOut)
        );
        assert!(!scheduler.is_holding());
    }

    #[test]
    fn abort_closes_session() {
        let mut scheduler = InterventionScheduler::new(config(1, 999.0), Box::new(ForeverCoach));
        assert!(!scheduler.abort());
        scheduler.record_round(1.0);
        scheduler.begin(&request());
        assert!(scheduler.abort());
        assert!(!scheduler.is_holding());
    }
}
