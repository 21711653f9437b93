//! Worm (character) state and per-tick movement

use serde::{Deserialize, Serialize};

use super::physics::{BodyParams, Contact, PhysicsSystem};
use super::terrain::{Terrain, BODY_RADIUS};
use super::{TeamId, GRAVITY};
use crate::util::math::Vec2;

pub const MAX_HEALTH: i32 = 100;
pub const WORM_RADIUS: i32 = BODY_RADIUS;
pub const MAX_FALL_SPEED: f32 = 500.0;
/// Horizontal velocity multiplier applied every tick
pub const HORIZONTAL_DAMPING: f32 = 0.85;
pub const MOVE_IMPULSE: f32 = 100.0;
pub const MAX_WALK_SPEED: f32 = 150.0;
pub const JUMP_POWER: f32 = 280.0;
pub const JUMP_COOLDOWN: f32 = 0.5;
/// Upper bound for the vertical component of a jump direction
pub const MAX_JUMP_DIRECTION_Y: f32 = -0.3;
/// Falling below this line triggers pit recovery
pub const PIT_DEPTH: f32 = 650.0;
pub const PIT_DAMAGE: i32 = 20;
/// Worms are placed this far above the ground surface
pub const SPAWN_CLEARANCE: f32 = 20.0;

const BODY: BodyParams = BodyParams {
    gravity: GRAVITY,
    max_fall_speed: MAX_FALL_SPEED,
    radius: WORM_RADIUS,
};

/// Horizontal walk direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Left,
    Right,
}

impl MoveDirection {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// What happened to a worm during its update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WormStep {
    /// Pit recovery ran this tick
    pub fell_into_pit: bool,
    /// Pit damage killed the worm
    pub died: bool,
}

/// Worm state (authoritative)
#[derive(Debug, Clone)]
pub struct Worm {
    pub position: Vec2,
    pub velocity: Vec2,
    pub team: TeamId,
    health: i32,
    active: bool,
    grounded: bool,
    can_jump: bool,
    jump_cooldown: f32,
    my_turn: bool,
}

impl Worm {
    pub fn new(position: Vec2, team: TeamId) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            team,
            health: MAX_HEALTH,
            active: true,
            grounded: false,
            can_jump: true,
            jump_cooldown: 0.0,
            my_turn: false,
        }
    }

    /// Create a worm standing on the terrain at column `x`
    pub fn spawn_on(terrain: &Terrain, x: f32, team: TeamId) -> Self {
        let ground = terrain.ground_level(x as i32) as f32;
        Self::new(Vec2::new(x, ground - SPAWN_CLEARANCE), team)
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn jump_cooldown(&self) -> f32 {
        self.jump_cooldown
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_turn
    }

    pub(crate) fn set_turn(&mut self, my_turn: bool) {
        self.my_turn = my_turn;
    }

    fn controllable(&self) -> bool {
        self.active && self.my_turn
    }

    /// Advance one tick. Inactive worms are frozen.
    pub fn update(&mut self, dt: f32, terrain: &Terrain) -> WormStep {
        let mut step = WormStep::default();
        if !self.active {
            return step;
        }

        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);

        let body = PhysicsSystem::step_body(self.position, self.velocity, &BODY, dt, terrain);
        self.position = body.position;
        self.velocity = body.velocity;
        match body.contact {
            Contact::Landed => {
                self.grounded = true;
                self.can_jump = true;
                self.jump_cooldown = 0.0;
            }
            Contact::Airborne => self.grounded = false,
            Contact::Blocked => {}
        }

        self.velocity.x *= HORIZONTAL_DAMPING;

        let min_x = WORM_RADIUS as f32;
        let max_x = terrain.width() as f32 - WORM_RADIUS as f32;
        if self.position.x < min_x {
            self.position.x = min_x;
            self.velocity.x = 0.0;
        }
        if self.position.x > max_x {
            self.position.x = max_x;
            self.velocity.x = 0.0;
        }

        if self.position.y > PIT_DEPTH {
            step.fell_into_pit = true;
            step.died = self.take_damage(PIT_DAMAGE);
            let ground = terrain.ground_level(self.position.x as i32) as f32;
            self.position.y = ground - SPAWN_CLEARANCE;
            self.velocity.y = 0.0;
        }

        step
    }

    /// Walk impulse; ignored unless active and on turn
    pub fn walk(&mut self, direction: MoveDirection) {
        if !self.controllable() {
            return;
        }
        let speed = self.velocity.x + direction.sign() * MOVE_IMPULSE;
        self.velocity.x = speed.clamp(-MAX_WALK_SPEED, MAX_WALK_SPEED);
    }

    /// Jump along `direction`. The caller clamps the vertical component to
    /// at most `MAX_JUMP_DIRECTION_Y`. Returns whether the jump happened.
    pub fn jump(&mut self, direction: Vec2) -> bool {
        if !self.controllable() || !self.can_jump || !self.grounded || self.jump_cooldown > 0.0 {
            return false;
        }
        self.velocity.x += direction.x * JUMP_POWER;
        self.velocity.y = direction.y * JUMP_POWER;
        self.can_jump = false;
        self.grounded = false;
        self.jump_cooldown = JUMP_COOLDOWN;
        true
    }

    /// Apply damage, flooring health at zero. Returns true only on the call
    /// that kills the worm.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.active {
            return false;
        }
        self.health = (self.health - amount.max(0)).max(0);
        if self.health == 0 {
            self.active = false;
            self.my_turn = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn flat_terrain(surface: i32) -> Terrain {
        let mut terrain = Terrain::empty(400, 600);
        for x in 0..400 {
            terrain.fill_column(x, surface);
        }
        terrain
    }

    fn settled_worm(terrain: &Terrain) -> Worm {
        let mut worm = Worm::spawn_on(terrain, 200.0, 0);
        worm.set_turn(true);
        for _ in 0..30 {
            worm.update(DT, terrain);
        }
        worm
    }

    #[test]
    fn spawn_sits_above_ground() {
        let terrain = flat_terrain(500);
        let worm = Worm::spawn_on(&terrain, 100.0, 1);
        assert_eq!(worm.position, Vec2::new(100.0, 480.0));
        assert_eq!(worm.health(), MAX_HEALTH);
        assert!(worm.is_active());
    }

    #[test]
    fn worm_settles_and_grounds() {
        let terrain = flat_terrain(500);
        let worm = settled_worm(&terrain);
        assert!(worm.is_grounded());
        assert_eq!(worm.velocity.y, 0.0);
    }

    #[test]
    fn walk_requires_turn_and_clamps_speed() {
        let mut worm = Worm::new(Vec2::new(100.0, 100.0), 0);
        worm.walk(MoveDirection::Right);
        assert_eq!(worm.velocity.x, 0.0);

        worm.set_turn(true);
        worm.walk(MoveDirection::Right);
        worm.walk(MoveDirection::Right);
        assert_eq!(worm.velocity.x, MAX_WALK_SPEED);
        worm.walk(MoveDirection::Left);
        assert_eq!(worm.velocity.x, 50.0);
    }

    #[test]
    fn jump_needs_ground_and_cooldown() {
        let terrain = flat_terrain(500);
        let mut worm = settled_worm(&terrain);
        assert!(worm.jump(Vec2::new(0.0, -1.0)));
        assert_eq!(worm.velocity.y, -JUMP_POWER);
        assert_eq!(worm.jump_cooldown(), JUMP_COOLDOWN);
        assert!(!worm.is_grounded());
        // Airborne and cooling down
        assert!(!worm.jump(Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn jump_ignored_off_turn() {
        let terrain = flat_terrain(500);
        let mut worm = settled_worm(&terrain);
        worm.set_turn(false);
        assert!(!worm.jump(Vec2::new(0.0, -1.0)));
        assert_eq!(worm.velocity.y, 0.0);
    }

    #[test]
    fn damping_applies_every_tick() {
        let terrain = Terrain::empty(400, 600);
        let mut worm = Worm::new(Vec2::new(200.0, 100.0), 0);
        worm.velocity.x = 100.0;
        worm.update(DT, &terrain);
        assert!((worm.velocity.x - 85.0).abs() < 1e-4);
    }

    #[test]
    fn position_clamped_to_playfield() {
        let terrain = Terrain::empty(400, 600);
        // Knocked past the edge: the body is wedged against the out-of-bounds wall
        let mut worm = Worm::new(Vec2::new(5.0, 100.0), 0);
        worm.velocity.x = -50.0;
        worm.update(DT, &terrain);
        assert_eq!(worm.position.x, WORM_RADIUS as f32);
        assert_eq!(worm.velocity.x, 0.0);
    }

    #[test]
    fn health_floors_and_deactivates_once() {
        let mut worm = Worm::new(Vec2::new(0.0, 0.0), 0);
        assert!(!worm.take_damage(60));
        assert!(worm.take_damage(60));
        assert_eq!(worm.health(), 0);
        assert!(!worm.is_active());
        assert!(!worm.take_damage(10));
        assert_eq!(worm.health(), 0);
    }

    #[test]
    fn negative_damage_never_heals() {
        let mut worm = Worm::new(Vec2::new(0.0, 0.0), 0);
        worm.take_damage(30);
        worm.take_damage(-50);
        assert_eq!(worm.health(), 70);
    }

    #[test]
    fn pit_recovery_damages_and_returns_to_surface() {
        let terrain = flat_terrain(500);
        let mut worm = Worm::new(Vec2::new(200.0, 655.0), 0);
        let step = worm.update(DT, &terrain);
        assert!(step.fell_into_pit);
        assert!(!step.died);
        assert_eq!(worm.health(), MAX_HEALTH - PIT_DAMAGE);
        assert_eq!(worm.position.y, 480.0);
        assert_eq!(worm.velocity.y, 0.0);
    }
}
