//! Static game configuration. Everything here is fixed once a
//! [`RoundController`](crate::round::RoundController) is built; `validate`
//! is the only gate, and an invalid config never reaches the simulation.

use serde::{Deserialize, Serialize};

use crate::constants::{
    AGENT_MAX_WAIT_SECONDS, BASE_SPEED, BIRD_HEIGHT, BIRD_START_Y, BIRD_WIDTH, BIRD_X,
    CEILING_MARGIN, FLAP_IMPULSE, GAP_HEIGHT_BASE, GAP_HEIGHT_FLOOR, GRAVITY, GROUND_LINE_Y,
    GROUND_MARGIN, INTERVENTION_ATTEMPTS, INTERVENTION_SECONDS, MAX_SPEED, PIPE_SPACING,
    PIPE_SPAWN_LEAD, PIPE_WIDTH, SCREEN_WIDTH,
};
use crate::error::ConfigError;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub world: WorldBounds,
    pub obstacles: ObstacleConfig,
    pub difficulty: DifficultyConfig,
    pub intervention: InterventionConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration, px/s².
    pub gravity: f64,
    /// Velocity assigned on flap, px/s (negative is up).
    pub flap_impulse: f64,
    pub bird_x: f64,
    pub bird_start_y: f64,
    pub bird_width: f64,
    pub bird_height: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            flap_impulse: FLAP_IMPULSE,
            bird_x: BIRD_X,
            bird_start_y: BIRD_START_Y,
            bird_width: BIRD_WIDTH,
            bird_height: BIRD_HEIGHT,
        }
    }
}

/// Playfield edges in screen coordinates (y down). `bottom` is the ground
/// line, not the bottom of the window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            top: 0.0,
            bottom: GROUND_LINE_Y,
            left: 0.0,
            right: SCREEN_WIDTH,
        }
    }
}

impl WorldBounds {
    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub pipe_width: f64,
    /// Scroll distance between consecutive spawns.
    pub pipe_spacing: f64,
    /// How far past `world.right` a pipe appears.
    pub spawn_lead: f64,
    pub ceiling_margin: f64,
    pub ground_margin: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            pipe_width: PIPE_WIDTH,
            pipe_spacing: PIPE_SPACING,
            spawn_lead: PIPE_SPAWN_LEAD,
            ceiling_margin: CEILING_MARGIN,
            ground_margin: GROUND_MARGIN,
        }
    }
}

/// Inputs to the difficulty curves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Progress {
    pub score: u32,
    /// Seconds since the round started.
    pub elapsed: f64,
}

/// A non-negative, non-decreasing offset as a function of [`Progress`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    Flat,
    Linear { per_point: f64, per_second: f64 },
    Stepped { every_points: u32, step: f64 },
    #[serde(skip)]
    Custom(fn(Progress) -> f64),
}

impl Curve {
    pub fn eval(&self, progress: Progress) -> f64 {
        let raw = match *self {
            Self::Flat => 0.0,
            Self::Linear {
                per_point,
                per_second,
            } => per_point * progress.score as f64 + per_second * progress.elapsed,
            Self::Stepped { every_points, step } => {
                if every_points == 0 {
                    0.0
                } else {
                    (progress.score / every_points) as f64 * step
                }
            }
            Self::Custom(curve) => curve(progress),
        };
        if raw.is_finite() {
            raw.max(0.0)
        } else {
            0.0
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Linear {
                per_point,
                per_second,
            } => {
                if !(per_point >= 0.0 && per_second >= 0.0) {
                    return Err(ConfigError::NegativeCurveCoefficient { curve: "linear" });
                }
            }
            Self::Stepped { step, .. } => {
                if !(step >= 0.0) {
                    return Err(ConfigError::NegativeCurveCoefficient { curve: "stepped" });
                }
            }
            Self::Flat | Self::Custom(_) => {}
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub base_speed: f64,
    pub max_speed: f64,
    pub speed_ramp: Curve,
    pub gap_height_base: f64,
    pub gap_height_floor: f64,
    pub gap_shrink: Curve,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_speed: BASE_SPEED,
            max_speed: MAX_SPEED,
            speed_ramp: Curve::Linear {
                per_point: 6.0,
                per_second: 1.0,
            },
            gap_height_base: GAP_HEIGHT_BASE,
            gap_height_floor: GAP_HEIGHT_FLOOR,
            gap_shrink: Curve::Stepped {
                every_points: 5,
                step: 8.0,
            },
        }
    }
}

impl DifficultyConfig {
    pub fn speed_at(&self, progress: Progress) -> f64 {
        (self.base_speed + self.speed_ramp.eval(progress)).min(self.max_speed)
    }

    pub fn gap_height_at(&self, progress: Progress) -> f64 {
        (self.gap_height_base - self.gap_shrink.eval(progress)).max(self.gap_height_floor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionConfig {
    /// Losses since the last intervention that trigger the coach.
    pub attempt_threshold: u32,
    /// Seconds played since the last intervention that trigger the coach.
    pub time_threshold: f64,
    /// Longest the game waits on a coach session before releasing the gate.
    pub agent_max_wait: f64,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            attempt_threshold: INTERVENTION_ATTEMPTS,
            time_threshold: INTERVENTION_SECONDS,
            agent_max_wait: AGENT_MAX_WAIT_SECONDS,
        }
    }
}

fn require_finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        require_finite("gravity", physics.gravity)?;
        require_finite("flap_impulse", physics.flap_impulse)?;
        require_finite("bird_x", physics.bird_x)?;
        require_finite("bird_start_y", physics.bird_start_y)?;
        require_positive("bird_width", physics.bird_width)?;
        require_positive("bird_height", physics.bird_height)?;

        let world = &self.world;
        for (field, value) in [
            ("world.top", world.top),
            ("world.bottom", world.bottom),
            ("world.left", world.left),
            ("world.right", world.right),
        ] {
            require_finite(field, value)?;
        }
        if world.top >= world.bottom {
            return Err(ConfigError::WorldInverted {
                top: world.top,
                bottom: world.bottom,
            });
        }
        if world.left >= world.right {
            return Err(ConfigError::WorldInvertedHorizontal {
                left: world.left,
                right: world.right,
            });
        }

        let obstacles = &self.obstacles;
        require_positive("pipe_width", obstacles.pipe_width)?;
        require_positive("pipe_spacing", obstacles.pipe_spacing)?;
        require_finite("spawn_lead", obstacles.spawn_lead)?;
        require_finite("ceiling_margin", obstacles.ceiling_margin)?;
        require_finite("ground_margin", obstacles.ground_margin)?;

        let difficulty = &self.difficulty;
        let base_speed = require_positive("base_speed", difficulty.base_speed)?;
        let max_speed = require_positive("max_speed", difficulty.max_speed)?;
        if max_speed < base_speed {
            return Err(ConfigError::MaxSpeedBelowBase {
                max: max_speed,
                base: base_speed,
            });
        }
        let gap_base = require_positive("gap_height_base", difficulty.gap_height_base)?;
        let gap_floor = require_positive("gap_height_floor", difficulty.gap_height_floor)?;
        if gap_floor > gap_base {
            return Err(ConfigError::GapFloorAboveBase {
                floor: gap_floor,
                base: gap_base,
            });
        }
        difficulty.speed_ramp.validate()?;
        difficulty.gap_shrink.validate()?;

        // The widest gap must fit; every shrunk gap then fits too.
        let available = world.height() - obstacles.ceiling_margin - obstacles.ground_margin;
        if available < gap_base {
            return Err(ConfigError::EmptyGapRange {
                available,
                required: gap_base,
            });
        }

        let intervention = &self.intervention;
        require_finite("time_threshold", intervention.time_threshold)?;
        if intervention.attempt_threshold == 0 || intervention.time_threshold <= 0.0 {
            return Err(ConfigError::ZeroThreshold);
        }
        require_positive("agent_max_wait", intervention.agent_max_wait)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default()
            .validate()
            .expect("default config must validate");
    }

    #[test]
    fn gap_floor_above_base_is_rejected() {
        let mut config = GameConfig::default();
        config.difficulty.gap_height_floor = config.difficulty.gap_height_base + 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GapFloorAboveBase { .. })
        ));
    }

    #[test]
    fn gap_that_cannot_fit_is_rejected() {
        let mut config = GameConfig::default();
        config.obstacles.ceiling_margin = 400.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyGapRange { .. })
        ));
    }

    #[test]
    fn negative_ramp_is_rejected() {
        let mut config = GameConfig::default();
        config.difficulty.speed_ramp = Curve::Linear {
            per_point: -1.0,
            per_second: 0.0,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeCurveCoefficient { curve: "linear" })
        );
    }

    #[test]
    fn inverted_world_names_the_bad_axis() {
        let mut config = GameConfig::default();
        config.world.left = config.world.right;
        assert_eq!(
            config.validate(),
            Err(ConfigError::WorldInvertedHorizontal {
                left: config.world.right,
                right: config.world.right,
            })
        );

        let mut config = GameConfig::default();
        config.world.top = config.world.bottom + 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WorldInverted { .. })
        ));
    }

    #[test]
    fn zero_attempt_threshold_is_rejected() {
        let mut config = GameConfig::default();
        config.intervention.attempt_threshold = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroThreshold));
    }

    #[test]
    fn speed_is_capped_and_gap_is_floored() {
        let difficulty = DifficultyConfig::default();
        let late = Progress {
            score: 10_000,
            elapsed: 10_000.0,
        };
        assert_eq!(difficulty.speed_at(late), difficulty.max_speed);
        assert_eq!(difficulty.gap_height_at(late), difficulty.gap_height_floor);
        assert_eq!(
            difficulty.speed_at(Progress::default()),
            difficulty.base_speed
        );
        assert_eq!(
            difficulty.gap_height_at(Progress::default()),
            difficulty.gap_height_base
        );
    }

    #[test]
    fn stepped_curve_only_moves_on_bucket_edges() {
        let curve = Curve::Stepped {
            every_points: 5,
            step: 8.0,
        };
        let at = |score| {
            curve.eval(Progress {
                score,
                elapsed: 0.0,
            })
        };
        assert_eq!(at(4), 0.0);
        assert_eq!(at(5), 8.0);
        assert_eq!(at(9), 8.0);
        assert_eq!(at(10), 16.0);
    }

    #[test]
    fn custom_curve_output_is_sanitised() {
        let curve = Curve::Custom(|_| f64::NAN);
        assert_eq!(curve.eval(Progress::default()), 0.0);
        let curve = Curve::Custom(|_| -5.0);
        assert_eq!(curve.eval(Progress::default()), 0.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: GameConfig = serde_json::from_str(
            r#"{"intervention":{"attempt_threshold":3},"difficulty":{"speed_ramp":{"kind":"flat"}}}"#,
        )
        .expect("partial config should parse");
        assert_eq!(config.intervention.attempt_threshold, 3);
        assert_eq!(config.intervention.time_threshold, INTERVENTION_SECONDS);
        assert!(matches!(config.difficulty.speed_ramp, Curve::Flat));
        assert_eq!(config.physics, PhysicsConfig::default());
    }
}
