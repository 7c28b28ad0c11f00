use core::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NonPositive { field: &'static str, value: f64 },
    NotFinite { field: &'static str },
    GapFloorAboveBase { floor: f64, base: f64 },
    MaxSpeedBelowBase { max: f64, base: f64 },
    EmptyGapRange { available: f64, required: f64 },
    WorldInverted { top: f64, bottom: f64 },
    WorldInvertedHorizontal { left: f64, right: f64 },
    NegativeCurveCoefficient { curve: &'static str },
    ZeroThreshold,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be > 0, got {value}")
            }
            Self::NotFinite { field } => write!(f, "{field} must be a finite number"),
            Self::GapFloorAboveBase { floor, base } => write!(
                f,
                "gap_height_floor ({floor}) is above gap_height_base ({base})"
            ),
            Self::MaxSpeedBelowBase { max, base } => {
                write!(f, "max_speed ({max}) is below base_speed ({base})")
            }
            Self::EmptyGapRange {
                available,
                required,
            } => write!(
                f,
                "no room for the gap: {available} px between margins, {required} px required"
            ),
            Self::WorldInverted { top, bottom } => {
                write!(f, "world bounds inverted: top={top}, bottom={bottom}")
            }
            Self::WorldInvertedHorizontal { left, right } => {
                write!(f, "world bounds inverted: left={left}, right={right}")
            }
            Self::NegativeCurveCoefficient { curve } => {
                write!(f, "{curve} curve coefficients must be >= 0")
            }
            Self::ZeroThreshold => write!(
                f,
                "intervention thresholds must be >= 1 attempt and > 0 seconds"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    Io(String),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "high-score store i/o failed: {msg}"),
            Self::Corrupt(msg) => write!(f, "high-score store is corrupt: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentError {
    Unavailable(String),
    Rejected(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "coach unavailable: {msg}"),
            Self::Rejected(msg) => write!(f, "coach rejected the session: {msg}"),
        }
    }
}

impl std::error::Error for AgentError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    AgentSessionState,
    NegativeTime,
    ScorePassedMismatch,
    PipeGapOutOfBounds,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgentSessionState => write!(f, "AGENT_SESSION_STATE"),
            Self::NegativeTime => write!(f, "NEGATIVE_TIME"),
            Self::ScorePassedMismatch => write!(f, "SCORE_PASSED_MISMATCH"),
            Self::PipeGapOutOfBounds => write!(f, "PIPE_GAP_OUT_OF_BOUNDS"),
        }
    }
}

impl std::error::Error for InvariantViolation {}
