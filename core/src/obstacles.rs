use serde::{Deserialize, Serialize};

use crate::config::{ObstacleConfig, WorldBounds};
use crate::rng::SeededRng;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Left edge.
    pub horizontal_position: f64,
    pub gap_center: f64,
    pub gap_height: f64,
    pub passed: bool,
}

impl Pipe {
    #[inline]
    pub fn gap_top(&self) -> f64 {
        self.gap_center - self.gap_height / 2.0
    }

    #[inline]
    pub fn gap_bottom(&self) -> f64 {
        self.gap_center + self.gap_height / 2.0
    }
}

/// Owns the live pipes of one round, in spawn order (leftmost first).
#[derive(Clone, Debug)]
pub struct ObstacleGenerator {
    config: ObstacleConfig,
    world: WorldBounds,
    pipes: Vec<Pipe>,
    last_spawn_distance: Option<f64>,
    passed_count: u32,
    rng: SeededRng,
}

impl ObstacleGenerator {
    pub fn new(config: ObstacleConfig, world: WorldBounds, rng: SeededRng) -> Self {
        Self {
            config,
            world,
            pipes: Vec::with_capacity(8),
            last_spawn_distance: None,
            passed_count: 0,
            rng,
        }
    }

    /// Clears the pipes for a new round. The random stream carries on, so
    /// every round of a seeded session is different but reproducible.
    pub fn reset(&mut self) {
        self.pipes.clear();
        self.last_spawn_distance = None;
        self.passed_count = 0;
    }

    #[inline]
    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    /// Pipes marked passed since the last reset, including pruned ones.
    #[inline]
    pub fn passed_count(&self) -> u32 {
        self.passed_count
    }

    #[inline]
    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    /// Inclusive bounds for a gap centre of the given height.
    pub fn gap_center_range(&self, gap_height: f64) -> (f64, f64) {
        let half = gap_height / 2.0;
        (
            self.world.top + self.config.ceiling_margin + half,
            self.world.bottom - self.config.ground_margin - half,
        )
    }

    /// Spawns a pipe on the first call of a round and then one for every
    /// `pipe_spacing` scrolled since the previous spawn. A step longer than
    /// the spacing yields several pipes, oldest first, each placed where it
    /// would have scrolled to by now.
    pub fn spawn_if_due(&mut self, distance_scrolled: f64, gap_height: f64) -> Vec<Pipe> {
        let mut spawned = Vec::new();
        let mut last = match self.last_spawn_distance {
            Some(last) => last,
            None => {
                self.last_spawn_distance = Some(distance_scrolled);
                spawned.push(self.spawn_at(0.0, gap_height));
                return spawned;
            }
        };

        while distance_scrolled - last >= self.config.pipe_spacing {
            last += self.config.pipe_spacing;
            spawned.push(self.spawn_at(distance_scrolled - last, gap_height));
        }
        self.last_spawn_distance = Some(last);
        spawned
    }

    fn spawn_at(&mut self, overshoot: f64, gap_height: f64) -> Pipe {
        let (low, high) = self.gap_center_range(gap_height);
        let pipe = Pipe {
            horizontal_position: self.world.right + self.config.spawn_lead - overshoot,
            gap_center: self.rng.next_range_f64(low, high),
            gap_height,
            passed: false,
        };
        self.pipes.push(pipe);
        pipe
    }

    pub fn advance(&mut self, dt: f64, speed: f64) {
        let dx = speed * dt;
        for pipe in &mut self.pipes {
            pipe.horizontal_position -= dx;
        }
    }

    /// Flips `passed` on every pipe whose right edge is now left of
    /// `bird_left`. Returns how many flipped.
    pub fn mark_passed(&mut self, bird_left: f64) -> u32 {
        let width = self.config.pipe_width;
        let mut newly = 0;
        for pipe in &mut self.pipes {
            if !pipe.passed && pipe.horizontal_position + width < bird_left {
                pipe.passed = true;
                newly += 1;
            }
        }
        self.passed_count += newly;
        newly
    }

    /// Drops pipes that have scrolled fully past `world.left`.
    pub fn prune(&mut self) -> usize {
        let width = self.config.pipe_width;
        let left = self.world.left;
        let before = self.pipes.len();
        self.pipes
            .retain(|pipe| pipe.horizontal_position + width >= left);
        before - self.pipes.len()
    }
}
