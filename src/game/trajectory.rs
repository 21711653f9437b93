//! Ballistic trajectory preview for aiming

use super::physics::PhysicsSystem;
use super::terrain::Terrain;
use super::PROJECTILE_GRAVITY;
use crate::util::math::Vec2;

/// Maximum number of preview samples
pub const PREVIEW_POINTS: usize = 100;
/// Simulation step between samples (seconds)
pub const PREVIEW_STEP: f32 = 0.05;
/// Base muzzle speed before aim power is added
pub const BASE_SHOT_SPEED: f32 = 400.0;
/// Muzzle speed gained per point of aim power
pub const SHOT_SPEED_PER_POWER: f32 = 3.0;
/// Distance from the worm centre to the muzzle
pub const MUZZLE_OFFSET: f32 = 25.0;

/// Launch speed for an aim power in 0..=100
pub fn shot_speed(power: f32) -> f32 {
    BASE_SHOT_SPEED + power * SHOT_SPEED_PER_POWER
}

/// Lazy, finite preview of a shot. Clone an unconsumed preview (or build a
/// new one) to replay it from the muzzle.
///
/// The first sample is the muzzle itself. Sampling stops after the first
/// point that would hit terrain or leave the playfield on any side.
#[derive(Debug, Clone)]
pub struct Trajectory<'a> {
    terrain: &'a Terrain,
    position: Vec2,
    velocity: Vec2,
    gravity: f32,
    emitted: usize,
    done: bool,
}

impl<'a> Trajectory<'a> {
    pub fn new(
        terrain: &'a Terrain,
        origin: Vec2,
        direction: Vec2,
        power: f32,
        gravity_scale: f32,
    ) -> Self {
        Self {
            terrain,
            position: origin + direction * MUZZLE_OFFSET,
            velocity: direction * shot_speed(power),
            gravity: PROJECTILE_GRAVITY * gravity_scale,
            emitted: 0,
            done: false,
        }
    }

    fn blocked(&self, point: Vec2) -> bool {
        let (cx, cy) = point.cell();
        self.terrain.is_solid(cx, cy)
    }
}

impl Iterator for Trajectory<'_> {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        if self.done || self.emitted >= PREVIEW_POINTS {
            return None;
        }
        let sample = self.position;
        self.emitted += 1;

        self.velocity =
            PhysicsSystem::apply_gravity(self.velocity, self.gravity, PREVIEW_STEP, None);
        self.position += self.velocity * PREVIEW_STEP;
        if self.blocked(self.position) {
            self.done = true;
        }

        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_field_caps_at_preview_limit() {
        // Weightless shot across a long empty strip
        let terrain = Terrain::empty(2200, 100);
        let origin = Vec2::new(100.0, 50.0);
        let points: Vec<Vec2> =
            Trajectory::new(&terrain, origin, Vec2::new(1.0, 0.0), 0.0, 0.0).collect();
        assert_eq!(points.len(), PREVIEW_POINTS);
        assert_eq!(points[0], Vec2::new(125.0, 50.0));
    }

    #[test]
    fn stops_at_terrain() {
        let mut terrain = Terrain::empty(800, 600);
        for x in 0..800 {
            terrain.fill_column(x, 300);
        }
        let origin = Vec2::new(100.0, 280.0);
        let points: Vec<Vec2> =
            Trajectory::new(&terrain, origin, Vec2::new(1.0, 0.0), 50.0, 1.0).collect();
        assert!(points.len() < PREVIEW_POINTS);
        assert!(points.iter().all(|p| p.y < 300.0));
    }

    #[test]
    fn stops_at_ceiling() {
        let terrain = Terrain::empty(800, 600);
        let origin = Vec2::new(400.0, 100.0);
        let points: Vec<Vec2> =
            Trajectory::new(&terrain, origin, Vec2::new(0.0, -1.0), 100.0, 1.0).collect();
        // 700 u/s straight up from y=75 crosses the top edge on the third step
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.y >= 0.0));
    }

    #[test]
    fn preview_is_restartable_and_pure() {
        let terrain = Terrain::empty(800, 600);
        let preview =
            Trajectory::new(&terrain, Vec2::new(100.0, 300.0), Vec2::new(0.6, -0.8), 40.0, 1.0);
        let first: Vec<Vec2> = preview.clone().collect();
        let second: Vec<Vec2> = preview.collect();
        assert_eq!(first, second);
        assert_eq!(terrain.revision(), 0);
    }

    #[test]
    fn shot_speed_scales_with_power() {
        assert_eq!(shot_speed(0.0), 400.0);
        assert_eq!(shot_speed(100.0), 700.0);
    }
}
