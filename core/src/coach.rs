//! The coach collaborator. A coach session may take arbitrarily long (an
//! LLM call, speech playback); the game only ever starts it and polls it.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentPoll {
    Running,
    Done,
    Failed(String),
}

/// Context handed to the coach when an intervention opens.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoachRequest {
    pub loss_count: u32,
    pub time_played: f64,
    pub recent_score: u32,
    pub high_score: u32,
    pub new_high_score: bool,
}

pub trait Coach {
    fn open_session(&mut self, request: &CoachRequest) -> Result<SessionHandle, AgentError>;
    /// Must not block.
    fn poll(&mut self, handle: SessionHandle) -> AgentPoll;
    fn close(&mut self, handle: SessionHandle);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Speech {
    pub handle: SessionHandle,
    pub text: String,
    pub remaining_polls: u32,
}

/// Deterministic coach: says one line, then reports done after a fixed
/// number of polls.
#[derive(Clone, Debug)]
pub struct ScriptedCoach {
    speech_polls: u32,
    next_handle: u64,
    active: Option<Speech>,
    transcript: Vec<String>,
}

impl ScriptedCoach {
    pub fn new(speech_polls: u32) -> Self {
        Self {
            speech_polls,
            next_handle: 1,
            active: None,
            transcript: Vec::new(),
        }
    }

    /// Speech length in seconds at a given tick rate.
    pub fn for_duration(seconds: f64, ticks_per_second: u32) -> Self {
        let polls = (seconds.max(0.0) * ticks_per_second as f64).ceil() as u32;
        Self::new(polls)
    }

    pub fn active(&self) -> Option<&Speech> {
        self.active.as_ref()
    }

    /// Every line spoken so far, oldest first.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn line_for(request: &CoachRequest) -> String {
        if request.new_high_score {
            format!("New best: {}! Keep that rhythm.", request.high_score)
        } else if request.recent_score == 0 {
            format!(
                "{} tries in {:.0}s. Tap a little earlier before each gap.",
                request.loss_count, request.time_played
            )
        } else {
            format!(
                "Nice run! {} this time, best is {}.",
                request.recent_score, request.high_score
            )
        }
    }
}

impl Coach for ScriptedCoach {
    fn open_session(&mut self, request: &CoachRequest) -> Result<SessionHandle, AgentError> {
        if self.active.is_some() {
            return Err(AgentError::Rejected(
                "a speech is already playing".to_string(),
            ));
        }
        let handle = SessionHandle(self.next_handle);
        self.next_handle += 1;

        let text = Self::line_for(request);
        tracing::info!(handle = handle.0, "coach: {text}");
        self.transcript.push(text.clone());
        self.active = Some(Speech {
            handle,
            text,
            remaining_polls: self.speech_polls,
        });
        Ok(handle)
    }

    fn poll(&mut self, handle: SessionHandle) -> AgentPoll {
        match self.active.as_mut() {
            Some(speech) if speech.handle == handle => {
                if speech.remaining_polls == 0 {
                    AgentPoll::Done
                } else {
                    speech.remaining_polls -= 1;
                    AgentPoll::Running
                }
            }
            _ => AgentPoll::Failed(format!("unknown session {}", handle.0)),
        }
    }

    fn close(&mut self, handle: SessionHandle) {
        if self.active.as_ref().map(|speech| speech.handle) == Some(handle) {
            self.active = None;
        }
    }
}
