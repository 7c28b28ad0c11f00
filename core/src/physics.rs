use serde::{Deserialize, Serialize};

/// Vertical state of the bird. y grows downward, so a positive velocity
/// means falling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BirdState {
    pub vertical_position: f64,
    pub vertical_velocity: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct PhysicsBody {
    state: BirdState,
}

impl PhysicsBody {
    pub fn new(start_y: f64) -> Self {
        Self {
            state: BirdState {
                vertical_position: start_y,
                vertical_velocity: 0.0,
            },
        }
    }

    pub fn reset(&mut self, start_y: f64) {
        *self = Self::new(start_y);
    }

    #[inline]
    pub fn apply_gravity(&mut self, gravity: f64, dt: f64) {
        self.state.vertical_velocity += gravity * dt;
    }

    /// Replaces the velocity with the impulse; repeated flaps never stack.
    #[inline]
    pub fn flap(&mut self, impulse: f64) {
        self.state.vertical_velocity = impulse;
    }

    #[inline]
    pub fn integrate(&mut self, dt: f64) {
        self.state.vertical_position += self.state.vertical_velocity * dt;
    }

    #[inline]
    pub fn state(&self) -> BirdState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn gravity_then_flap_scenario() {
        let mut body = PhysicsBody::new(0.0);
        body.apply_gravity(20.0, 0.1);
        assert!(approx(body.state().vertical_velocity, 2.0));

        body.flap(-8.0);
        assert!(approx(body.state().vertical_velocity, -8.0));
    }

    #[test]
    fn flap_is_idempotent() {
        let mut body = PhysicsBody::new(100.0);
        body.apply_gravity(1_800.0, 0.5);
        body.flap(-600.0);
        let once = body.state();
        body.flap(-600.0);
        body.flap(-600.0);
        assert_eq!(body.state(), once);
    }

    #[test]
    fn integrate_moves_by_velocity_without_clamping() {
        let mut body = PhysicsBody::new(10.0);
        body.flap(-600.0);
        body.integrate(1.0);
        assert!(approx(body.state().vertical_position, -590.0));
    }

    #[test]
    fn each_gravity_tick_adds_exactly_g_dt() {
        let mut body = PhysicsBody::new(0.0);
        let dt = 1.0 / 60.0;
        let mut previous = body.state().vertical_velocity;
        for _ in 0..120 {
            body.apply_gravity(1_800.0, dt);
            body.integrate(dt);
            let velocity = body.state().vertical_velocity;
            assert!(velocity > previous);
            assert!(approx(velocity - previous, 1_800.0 * dt));
            previous = velocity;
        }
    }
}
