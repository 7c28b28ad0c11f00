use serde::{Deserialize, Serialize};

use crate::config::WorldBounds;
use crate::obstacles::Pipe;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collision {
    None,
    Ground,
    Ceiling,
    Pipe,
}

impl Collision {
    #[inline]
    pub fn is_hit(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Axis-aligned box; `y` is the top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Aabb {
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Strict overlap: shared edges do not intersect.
    #[inline]
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.x < other.right() && other.x < self.right()
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.overlaps_x(other) && self.y < other.bottom() && other.y < self.bottom()
    }
}

/// Upper and lower solid regions of a pipe, clipped to the world.
pub fn pipe_solids(pipe: &Pipe, pipe_width: f64, world: &WorldBounds) -> [Aabb; 2] {
    let upper = Aabb {
        x: pipe.horizontal_position,
        y: world.top,
        width: pipe_width,
        height: (pipe.gap_top() - world.top).max(0.0),
    };
    let gap_bottom = pipe.gap_bottom();
    let lower = Aabb {
        x: pipe.horizontal_position,
        y: gap_bottom,
        width: pipe_width,
        height: (world.bottom - gap_bottom).max(0.0),
    };
    [upper, lower]
}

/// First collision found, checked ceiling, ground, then pipes left to right.
pub fn check(bird: Aabb, pipes: &[Pipe], pipe_width: f64, world: &WorldBounds) -> Collision {
    if bird.y < world.top {
        return Collision::Ceiling;
    }
    if bird.bottom() > world.bottom {
        return Collision::Ground;
    }

    for pipe in pipes {
        let [upper, lower] = pipe_solids(pipe, pipe_width, world);
        if !bird.overlaps_x(&upper) {
            continue;
        }
        if bird.intersects(&upper) || bird.intersects(&lower) {
            return Collision::Pipe;
        }
    }

    Collision::None
}
