//! Gravity integration and axis-separated terrain collision

use super::terrain::Terrain;
use crate::util::math::Vec2;

/// Body parameters for gravity integration
#[derive(Debug, Clone, Copy)]
pub struct BodyParams {
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    /// Terminal fall speed
    pub max_fall_speed: f32,
    /// Collision disc radius against the terrain
    pub radius: i32,
}

/// Outcome of the vertical move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Vertical move succeeded; the body is in the air
    Airborne,
    /// Moving down and blocked: resting on terrain
    Landed,
    /// Moving up (or still) and blocked: grounded state is left untouched
    Blocked,
}

/// Result of one integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyStep {
    pub position: Vec2,
    pub velocity: Vec2,
    pub contact: Contact,
}

/// Physics system shared by worms and projectiles
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Add `gravity * dt` to vertical velocity, optionally clamped to a terminal speed
    pub fn apply_gravity(
        velocity: Vec2,
        gravity: f32,
        dt: f32,
        max_fall_speed: Option<f32>,
    ) -> Vec2 {
        let mut vy = velocity.y + gravity * dt;
        if let Some(max) = max_fall_speed {
            vy = vy.min(max);
        }
        Vec2::new(velocity.x, vy)
    }

    /// Integrate one step against the terrain.
    ///
    /// The horizontal axis is resolved first, then the vertical axis from the
    /// (possibly rolled back) horizontal position. A blocked axis keeps its old
    /// coordinate and has its velocity zeroed.
    pub fn step_body(
        position: Vec2,
        velocity: Vec2,
        params: &BodyParams,
        dt: f32,
        terrain: &Terrain,
    ) -> BodyStep {
        let mut velocity =
            Self::apply_gravity(velocity, params.gravity, dt, Some(params.max_fall_speed));
        let mut position = position;

        let moved_x = Vec2::new(position.x + velocity.x * dt, position.y);
        if terrain.is_solid_circle(moved_x, params.radius) {
            velocity.x = 0.0;
        } else {
            position = moved_x;
        }

        let moved_y = Vec2::new(position.x, position.y + velocity.y * dt);
        let contact = if terrain.is_solid_circle(moved_y, params.radius) {
            let contact = if velocity.y > 0.0 {
                Contact::Landed
            } else {
                Contact::Blocked
            };
            velocity.y = 0.0;
            contact
        } else {
            position = moved_y;
            Contact::Airborne
        };

        BodyStep {
            position,
            velocity,
            contact,
        }
    }
}
