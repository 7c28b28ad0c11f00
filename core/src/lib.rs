pub mod coach;
pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod intervention;
pub mod obstacles;
pub mod physics;
pub mod rng;
pub mod round;
pub mod session;
pub mod tape;

pub use coach::{AgentPoll, Coach, CoachRequest, ScriptedCoach, SessionHandle};
pub use config::GameConfig;
pub use error::{AgentError, ConfigError, InvariantViolation, StoreError};
pub use round::{GameEvent, Input, RoundController, RoundState, WorldSnapshot};
pub use session::{HighScoreStore, MemoryStore, Session, SessionStats};
