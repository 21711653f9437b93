//! Match state and turn state machine
//!
//! A [`Match`] owns the terrain, the worm roster and every live projectile.
//! Everything is mutated from two places only: the command entry points
//! (move/jump/aim/fire/restart) and [`Match::advance_tick`].

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::combat::{CombatSystem, WeaponKind};
use super::projectile::{Blast, FlightEvent, ProjectileArena, ProjectileId};
use super::terrain::Terrain;
use super::trajectory::{shot_speed, Trajectory, MUZZLE_OFFSET};
use super::worm::{MoveDirection, Worm, MAX_JUMP_DIRECTION_Y};
use super::{Command, GameEvent, TeamId, ARENA_HEIGHT, ARENA_WIDTH};
use crate::util::math::Vec2;

/// Maximum aim power
pub const MAX_AIM_POWER: f32 = 100.0;
/// Cursor distance per point of aim power
pub const AIM_DISTANCE_PER_POWER: f32 = 3.0;

/// Where a worm starts and which team it plays for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WormSpawn {
    pub x: f32,
    pub team: TeamId,
}

/// Match construction parameters
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Seed for terrain and shrapnel randomness; `None` draws one from entropy
    pub seed: Option<u64>,
    pub width: usize,
    pub height: usize,
    /// Turn order
    pub roster: Vec<WormSpawn>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: None,
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            roster: vec![
                WormSpawn { x: 150.0, team: 0 },
                WormSpawn { x: 650.0, team: 1 },
            ],
        }
    }
}

/// Match construction errors
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("match roster is empty")]
    EmptyRoster,

    #[error("arena must be at least 1x1, got {width}x{height}")]
    InvalidArena { width: usize, height: usize },

    #[error("terrain is {width}x{height}, arena expects {expected_width}x{expected_height}")]
    TerrainMismatch {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("spawn x={x} is outside the {width}-wide arena")]
    SpawnOutOfBounds { x: f32, width: usize },
}

/// Authoritative match state
pub struct Match {
    id: Uuid,
    seed: u64,
    tick: u64,
    config: MatchConfig,
    rng: ChaCha8Rng,
    terrain: Terrain,
    worms: Vec<Worm>,
    projectiles: ProjectileArena,
    current: usize,
    aim_direction: Vec2,
    aim_power: f32,
    weapon: WeaponKind,
    can_fire: bool,
    turn_time: f32,
    ended: bool,
    winner: Option<usize>,
    pending: Vec<GameEvent>,
}

impl Match {
    /// Create a match on procedurally generated terrain
    pub fn new(config: MatchConfig) -> Result<Self, MatchError> {
        Self::validate(&config)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let terrain = Terrain::generate(config.width, config.height, &mut rng);
        Ok(Self::assemble(config, seed, rng, terrain))
    }

    /// Create a match on a prepared terrain. Restarting regenerates terrain
    /// from the match seed.
    pub fn with_terrain(config: MatchConfig, terrain: Terrain) -> Result<Self, MatchError> {
        Self::validate(&config)?;
        if (terrain.width(), terrain.height()) != (config.width, config.height) {
            return Err(MatchError::TerrainMismatch {
                width: terrain.width(),
                height: terrain.height(),
                expected_width: config.width,
                expected_height: config.height,
            });
        }
        let seed = config.seed.unwrap_or_else(rand::random);
        let rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(Self::assemble(config, seed, rng, terrain))
    }

    fn validate(config: &MatchConfig) -> Result<(), MatchError> {
        if config.width == 0 || config.height == 0 {
            return Err(MatchError::InvalidArena {
                width: config.width,
                height: config.height,
            });
        }
        if config.roster.is_empty() {
            return Err(MatchError::EmptyRoster);
        }
        if let Some(spawn) = config
            .roster
            .iter()
            .find(|s| !(0.0..config.width as f32).contains(&s.x))
        {
            return Err(MatchError::SpawnOutOfBounds {
                x: spawn.x,
                width: config.width,
            });
        }
        Ok(())
    }

    fn assemble(config: MatchConfig, seed: u64, rng: ChaCha8Rng, terrain: Terrain) -> Self {
        let worms = Self::spawn_roster(&config.roster, &terrain);
        let mut game = Self {
            id: Uuid::new_v4(),
            seed,
            tick: 0,
            config,
            rng,
            terrain,
            worms,
            projectiles: ProjectileArena::new(),
            current: 0,
            aim_direction: Vec2::new(1.0, 0.0),
            aim_power: 0.0,
            weapon: WeaponKind::default(),
            can_fire: true,
            turn_time: 0.0,
            ended: false,
            winner: None,
            pending: Vec::new(),
        };
        game.worms[0].set_turn(true);

        info!(
            match_id = %game.id,
            seed,
            worms = game.worms.len(),
            "Match created"
        );
        game
    }

    fn spawn_roster(roster: &[WormSpawn], terrain: &Terrain) -> Vec<Worm> {
        roster
            .iter()
            .map(|spawn| Worm::spawn_on(terrain, spawn.x, spawn.team))
            .collect()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }

    pub fn projectiles(&self) -> &ProjectileArena {
        &self.projectiles
    }

    /// Roster index of the worm whose turn it is
    pub fn current_worm(&self) -> usize {
        self.current
    }

    pub fn aim_direction(&self) -> Vec2 {
        self.aim_direction
    }

    pub fn aim_power(&self) -> f32 {
        self.aim_power
    }

    pub fn selected_weapon(&self) -> WeaponKind {
        self.weapon
    }

    pub fn can_fire(&self) -> bool {
        self.can_fire
    }

    /// Seconds since the current turn started
    pub fn turn_time(&self) -> f32 {
        self.turn_time
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Last worm standing; `None` while running or on a draw
    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn active_count(&self) -> usize {
        self.worms.iter().filter(|w| w.is_active()).count()
    }

    fn emit(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    /// The worm on turn, if it may act
    fn actor(&mut self) -> Option<&mut Worm> {
        if self.ended {
            return None;
        }
        let worm = &mut self.worms[self.current];
        (worm.is_active() && worm.is_my_turn()).then_some(worm)
    }

    /// Dispatch an input intent
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Move(direction) => self.request_move(direction),
            Command::Jump { direction } => {
                let direction = direction.unwrap_or(self.aim_direction);
                self.request_jump(direction);
            }
            Command::AimAt(target) => self.set_aim_towards(target),
            Command::SelectWeapon(kind) => self.select_weapon(kind),
            Command::CycleWeapon => self.select_weapon(self.weapon.next()),
            Command::Fire => {
                self.request_fire();
            }
            Command::Restart => self.restart(),
        }
    }

    pub fn request_move(&mut self, direction: MoveDirection) {
        if let Some(worm) = self.actor() {
            worm.walk(direction);
        }
    }

    /// Jump along `direction`, forced to point at least slightly upward
    pub fn request_jump(&mut self, direction: Vec2) {
        let direction = Vec2::new(direction.x, direction.y.min(MAX_JUMP_DIRECTION_Y));
        if let Some(worm) = self.actor() {
            worm.jump(direction);
        }
    }

    /// Point the aim from the current worm towards `target`.
    /// Power grows with the distance, capped at `MAX_AIM_POWER`.
    pub fn set_aim_towards(&mut self, target: Vec2) {
        let Some(worm) = self.actor() else {
            return;
        };
        let offset = target - worm.position;
        let length = offset.length();
        if length > 0.0 {
            self.aim_direction = offset.normalize();
            self.aim_power = (length / AIM_DISTANCE_PER_POWER).min(MAX_AIM_POWER);
        }
    }

    pub fn select_weapon(&mut self, kind: WeaponKind) {
        if self.actor().is_some() {
            self.weapon = kind;
        }
    }

    /// Fire the selected weapon and hand the turn to the next worm.
    /// Returns the new projectile's id, or `None` if firing is not allowed.
    pub fn request_fire(&mut self) -> Option<ProjectileId> {
        if !self.can_fire {
            return None;
        }
        let worm = self.actor()?;
        let origin = worm.position;
        let team = worm.team;
        worm.set_turn(false);

        let muzzle = origin + self.aim_direction * MUZZLE_OFFSET;
        let velocity = self.aim_direction * shot_speed(self.aim_power);
        let projectile = self.projectiles.spawn(self.weapon, team, muzzle, velocity);
        self.can_fire = false;

        debug!(
            match_id = %self.id,
            worm = self.current,
            weapon = ?self.weapon,
            power = self.aim_power,
            "Worm fired"
        );
        self.emit(GameEvent::Fired {
            worm: self.current,
            projectile,
            weapon: self.weapon,
            x: muzzle.x,
            y: muzzle.y,
        });

        self.switch_turn();
        Some(projectile)
    }

    /// Preview of the current aim, or `None` when nobody may fire
    pub fn trajectory(&self) -> Option<Trajectory<'_>> {
        let worm = &self.worms[self.current];
        if self.ended || !worm.is_active() || !worm.is_my_turn() {
            return None;
        }
        Some(Trajectory::new(
            &self.terrain,
            worm.position,
            self.aim_direction,
            self.aim_power,
            self.weapon.stats().gravity_scale,
        ))
    }

    /// Rebuild terrain and roster from the match seed stream
    pub fn restart(&mut self) {
        self.terrain = Terrain::generate(self.config.width, self.config.height, &mut self.rng);
        self.worms = Self::spawn_roster(&self.config.roster, &self.terrain);
        self.projectiles.clear();
        self.current = 0;
        self.worms[0].set_turn(true);
        self.can_fire = true;
        self.turn_time = 0.0;
        self.ended = false;
        self.winner = None;

        info!(match_id = %self.id, "Match restarted");
        self.emit(GameEvent::Restarted);
    }

    /// Run one simulation tick and return everything that happened since the
    /// previous tick, command side effects included.
    pub fn advance_tick(&mut self, dt: f32) -> Vec<GameEvent> {
        if !self.ended {
            self.tick += 1;
            self.turn_time += dt;

            self.update_worms(dt);
            self.update_projectiles(dt);
            self.projectiles.prune();

            if !self.worms[self.current].is_active() && self.active_count() >= 2 {
                self.switch_turn();
            }
            self.check_win_condition();
        }

        std::mem::take(&mut self.pending)
    }

    fn update_worms(&mut self, dt: f32) {
        for idx in 0..self.worms.len() {
            let worm = &mut self.worms[idx];
            let before = worm.health();
            let step = worm.update(dt, &self.terrain);
            let health = worm.health();

            if step.fell_into_pit {
                debug!(match_id = %self.id, worm = idx, "Worm recovered from pit");
                self.emit(GameEvent::FellIntoPit { worm: idx });
                self.emit(GameEvent::Damaged {
                    worm: idx,
                    amount: before - health,
                    health,
                });
            }
            if step.died {
                info!(match_id = %self.id, worm = idx, "Worm killed");
                self.emit(GameEvent::Killed { worm: idx });
            }
        }
    }

    fn update_projectiles(&mut self, dt: f32) {
        // Shrapnel spawned during this pass starts moving next tick
        let count = self.projectiles.len();
        for index in 0..count {
            let Some(projectile) = self.projectiles.get_mut(index) else {
                break;
            };
            let id = projectile.id;

            match projectile.update(dt, &mut self.terrain) {
                FlightEvent::None => {}
                FlightEvent::Penetrated { at, remaining } => {
                    debug!(
                        match_id = %self.id,
                        projectile = id,
                        remaining,
                        "Projectile penetrated terrain"
                    );
                    self.emit(GameEvent::Penetrated {
                        projectile: id,
                        x: at.x,
                        y: at.y,
                        remaining,
                    });
                }
                FlightEvent::Impact => {
                    self.detonate(index);
                    continue;
                }
                FlightEvent::OutOfBounds => {
                    self.emit(GameEvent::ProjectileLost { projectile: id });
                    continue;
                }
            }

            let hit = self
                .projectiles
                .get(index)
                .is_some_and(|p| self.worms.iter().any(|w| p.hits_worm(w)));
            if hit {
                self.detonate(index);
            }
        }
    }

    fn detonate(&mut self, index: usize) {
        let Some(blast) = self
            .projectiles
            .detonate(index, &mut self.terrain, &mut self.rng)
        else {
            return;
        };

        debug!(
            match_id = %self.id,
            projectile = blast.source,
            x = blast.position.x,
            y = blast.position.y,
            radius = blast.radius,
            "Projectile exploded"
        );
        self.emit(GameEvent::Exploded {
            projectile: blast.source,
            x: blast.position.x,
            y: blast.position.y,
            radius: blast.radius,
        });
        if blast.shrapnel > 0 {
            self.emit(GameEvent::ShrapnelSpawned {
                parent: blast.source,
                count: blast.shrapnel,
            });
        }

        self.resolve_blast(&blast);
    }

    /// Apply falloff damage and knockback to every active worm in the blast radius
    fn resolve_blast(&mut self, blast: &Blast) {
        for idx in 0..self.worms.len() {
            let worm = &mut self.worms[idx];
            if !worm.is_active() {
                continue;
            }
            let distance = blast.position.distance(worm.position);
            if distance >= blast.radius as f32 {
                continue;
            }

            let friendly = worm.team == blast.team;
            let damage =
                CombatSystem::explosion_damage(blast.damage, blast.radius, distance, friendly);
            let killed = worm.take_damage(damage);
            worm.velocity += CombatSystem::knockback(blast.position, worm.position);
            let health = worm.health();

            if damage > 0 {
                self.emit(GameEvent::Damaged {
                    worm: idx,
                    amount: damage,
                    health,
                });
            }
            if killed {
                info!(match_id = %self.id, worm = idx, "Worm killed");
                self.emit(GameEvent::Killed { worm: idx });
            }
        }
    }

    /// Pass the turn to the next active worm in roster order, wrapping
    fn switch_turn(&mut self) {
        let count = self.worms.len();
        let active = self.active_count();
        let mut next = self.current;
        loop {
            next = (next + 1) % count;
            if self.worms[next].is_active() || active <= 1 {
                break;
            }
        }

        self.worms[self.current].set_turn(false);
        self.current = next;
        self.worms[next].set_turn(true);
        self.can_fire = true;
        self.turn_time = 0.0;

        info!(match_id = %self.id, worm = next, "Turn changed");
        self.emit(GameEvent::TurnChanged { worm: next });
    }

    fn check_win_condition(&mut self) {
        if self.ended || self.active_count() > 1 {
            return;
        }
        self.ended = true;
        self.winner = self.worms.iter().position(|w| w.is_active());

        info!(match_id = %self.id, winner = ?self.winner, tick = self.tick, "Match ended");
        self.emit(GameEvent::MatchEnded {
            winner: self.winner,
        });
    }
}
