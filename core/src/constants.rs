//! Default tuning, taken from the original pygame build and converted from
//! per-frame units at 60 fps to per-second units.

pub const TICKS_PER_SECOND: u32 = 60;

// World
pub const SCREEN_WIDTH: f64 = 400.0;
pub const SCREEN_HEIGHT: f64 = 600.0;
pub const GROUND_HEIGHT: f64 = 100.0;
pub const GROUND_LINE_Y: f64 = SCREEN_HEIGHT - GROUND_HEIGHT; // 500

// Bird
pub const BIRD_X: f64 = SCREEN_WIDTH / 6.0;
pub const BIRD_START_Y: f64 = SCREEN_HEIGHT / 2.0;
pub const BIRD_WIDTH: f64 = 34.0;
pub const BIRD_HEIGHT: f64 = 24.0;
pub const GRAVITY: f64 = 1_800.0; // 0.5 px/frame² * 60²
pub const FLAP_IMPULSE: f64 = -600.0; // -10 px/frame * 60

// Pipes
pub const PIPE_WIDTH: f64 = 80.0;
pub const PIPE_SPACING: f64 = SCREEN_WIDTH;
pub const PIPE_SPAWN_LEAD: f64 = 400.0; // first pipe at x = 800
pub const GAP_HEIGHT_BASE: f64 = 150.0;
pub const GAP_HEIGHT_FLOOR: f64 = 110.0;
pub const CEILING_MARGIN: f64 = 150.0;
pub const GROUND_MARGIN: f64 = 0.0;

// Scroll speed
pub const BASE_SPEED: f64 = 300.0; // 5 px/frame * 60
pub const MAX_SPEED: f64 = 480.0;

// Coach
pub const INTERVENTION_ATTEMPTS: u32 = 5;
pub const INTERVENTION_SECONDS: f64 = 30.0;
pub const AGENT_MAX_WAIT_SECONDS: f64 = 20.0;
pub const COACH_SPEECH_SECONDS: f64 = 2.5;
