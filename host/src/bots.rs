//! Autopilot input sources for headless runs.

use flappy_coach_core::config::GameConfig;
use flappy_coach_core::rng::SeededRng;
use flappy_coach_core::tape::FrameInput;
use flappy_coach_core::{RoundState, WorldSnapshot};

pub trait AutopilotBot {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn reset(&mut self, seed: u32);
    fn next_input(&mut self, world: &WorldSnapshot) -> FrameInput;
}

/// Geometry a bot needs that the snapshot does not carry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BotContext {
    pub bird_height: f64,
    pub world_top: f64,
    pub world_bottom: f64,
}

impl From<&GameConfig> for BotContext {
    fn from(config: &GameConfig) -> Self {
        Self {
            bird_height: config.physics.bird_height,
            world_top: config.world.top,
            world_bottom: config.world.bottom,
        }
    }
}

const BOT_IDS: [&str; 2] = ["gap-follower", "random"];

pub fn bot_ids() -> Vec<&'static str> {
    BOT_IDS.to_vec()
}

pub fn create_bot(id: &str, config: &GameConfig) -> Option<Box<dyn AutopilotBot>> {
    let context = BotContext::from(config);
    match id {
        "gap-follower" => Some(Box::new(GapFollower::new(context))),
        "random" => Some(Box::new(RandomFlapper::new())),
        _ => None,
    }
}

pub fn describe_bots() -> Vec<(&'static str, &'static str)> {
    let config = GameConfig::default();
    BOT_IDS
        .iter()
        .filter_map(|id| create_bot(id, &config))
        .map(|bot| (bot.id(), bot.description()))
        .collect()
}

/// Every bot presses start whenever a round is not running. During a coach
/// intervention that press is dropped by the controller.
fn wants_start(world: &WorldSnapshot) -> bool {
    matches!(world.state, RoundState::Idle | RoundState::AwaitingAgent)
}

/// Chance per flap decision of a lapse, as one in N.
const LAPSE_ONE_IN: u32 = 150;
const LAPSE_TICKS: u32 = 14;

/// Holds the bird in the lower half of the next gap: flaps only while falling
/// and below the trigger line. Occasional seeded lapses make it lose.
pub struct GapFollower {
    context: BotContext,
    rng: SeededRng,
    lapse_remaining: u32,
}

impl GapFollower {
    pub fn new(context: BotContext) -> Self {
        Self {
            context,
            rng: SeededRng::new(0),
            lapse_remaining: 0,
        }
    }

    fn target(&self, world: &WorldSnapshot) -> (f64, f64) {
        match world.pipes.iter().find(|pipe| !pipe.passed) {
            Some(pipe) => (pipe.gap_center, pipe.gap_height),
            None => (
                (self.context.world_top + self.context.world_bottom) * 0.5,
                world.gap_height,
            ),
        }
    }
}

impl AutopilotBot for GapFollower {
    fn id(&self) -> &'static str {
        "gap-follower"
    }

    fn description(&self) -> &'static str {
        "Keeps the bird just below the next gap's centre; lapses now and then"
    }

    fn reset(&mut self, seed: u32) {
        self.rng = SeededRng::new(seed ^ 0x9E37_79B9);
        self.lapse_remaining = 0;
    }

    fn next_input(&mut self, world: &WorldSnapshot) -> FrameInput {
        if wants_start(world) {
            self.lapse_remaining = 0;
            return FrameInput::START;
        }
        if world.state != RoundState::Playing {
            return FrameInput::IDLE;
        }
        if self.lapse_remaining > 0 {
            self.lapse_remaining -= 1;
            return FrameInput::IDLE;
        }

        let (gap_center, gap_height) = self.target(world);
        let bird_center = world.bird.vertical_position + self.context.bird_height * 0.5;
        let trigger = gap_center + gap_height / 3.0;
        if world.bird.vertical_velocity < 0.0 || bird_center <= trigger {
            return FrameInput::IDLE;
        }

        if self.rng.next_int(LAPSE_ONE_IN) == 0 {
            self.lapse_remaining = LAPSE_TICKS;
            return FrameInput::IDLE;
        }
        FrameInput::FLAP
    }
}

const RANDOM_FLAP_ONE_IN: u32 = 9;

/// Flaps with a fixed probability each tick.
pub struct RandomFlapper {
    rng: SeededRng,
}

impl RandomFlapper {
    pub fn new() -> Self {
        Self {
            rng: SeededRng::new(0),
        }
    }
}

impl Default for RandomFlapper {
    fn default() -> Self {
        Self::new()
    }
}

impl AutopilotBot for RandomFlapper {
    fn id(&self) -> &'static str {
        "random"
    }

    fn description(&self) -> &'static str {
        "Flaps on roughly one tick in nine"
    }

    fn reset(&mut self, seed: u32) {
        self.rng = SeededRng::new(seed);
    }

    fn next_input(&mut self, world: &WorldSnapshot) -> FrameInput {
        if wants_start(world) {
            return FrameInput::START;
        }
        if world.state == RoundState::Playing && self.rng.next_int(RANDOM_FLAP_ONE_IN) == 0 {
            FrameInput::FLAP
        } else {
            FrameInput::IDLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flappy_coach_core::coach::ScriptedCoach;
    use flappy_coach_core::{RoundController, Session};

    #[test]
    fn every_listed_bot_can_be_created() {
        let config = GameConfig::default();
        for id in bot_ids() {
            let bot = create_bot(id, &config).expect("listed bot");
            assert_eq!(bot.id(), id);
        }
        assert!(create_bot("nope", &config).is_none());
        assert_eq!(describe_bots().len(), bot_ids().len());
    }

    #[test]
    fn bots_press_start_when_idle() {
        let config = GameConfig::default();
        let game = RoundController::new(config.clone(), 1, Box::new(ScriptedCoach::new(1)))
            .unwrap();
        for id in bot_ids() {
            let mut bot = create_bot(id, &config).unwrap();
            bot.reset(5);
            assert_eq!(bot.next_input(&game.snapshot()), FrameInput::START);
        }
    }

    #[test]
    fn gap_follower_outscores_random_flapping() {
        let config = GameConfig::default();
        let mut best = [0u32; 2];
        for (slot, id) in ["gap-follower", "random"].iter().enumerate() {
            let mut bot = create_bot(id, &config).unwrap();
            bot.reset(11);
            let mut game =
                RoundController::new(config.clone(), 11, Box::new(ScriptedCoach::new(1)))
                    .unwrap();
            let mut session = Session::in_memory();
            for _ in 0..20_000 {
                let input = bot.next_input(&game.snapshot());
                game.step(input, 1.0 / 60.0, &mut session);
            }
            best[slot] = session.stats().high_score;
        }
        assert!(best[0] > best[1], "scores {best:?}");
        assert!(best[0] >= 3, "scores {best:?}");
    }
}
