//! Projectiles and the flat projectile arena
//!
//! Shrapnel is stored alongside its parent in the same arena, tagged with a
//! parent id and a generation. Only generation-0 projectiles may fragment.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::combat::{
    WeaponKind, WeaponStats, PENETRATION_CARVE_RADIUS, SHRAPNEL_COUNT, SHRAPNEL_DAMAGE,
    SHRAPNEL_KIND, SHRAPNEL_MAX_SPEED, SHRAPNEL_MIN_SPEED, SHRAPNEL_RADIUS, WORM_HIT_DISTANCE,
};
use super::physics::PhysicsSystem;
use super::terrain::Terrain;
use super::worm::Worm;
use super::{TeamId, PROJECTILE_GRAVITY};
use crate::util::math::Vec2;

pub type ProjectileId = u32;

/// Spawn delay before a projectile starts moving
pub const LAUNCH_DELAY: f32 = 0.2;
/// Trail samples kept per projectile
pub const TRAIL_LENGTH: usize = 15;
/// Deepest generation allowed to exist; shrapnel never fragments again
pub const MAX_GENERATION: u8 = 1;

/// Projectile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectilePhase {
    /// Spawn delay; no motion, no collisions
    Launching,
    Flying,
    /// Detonated (terminal)
    Exploded,
    /// Left the playfield without detonating (terminal)
    Lost,
}

/// Result of one flight update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightEvent {
    None,
    /// Punched through terrain and keeps flying
    Penetrated { at: Vec2, remaining: f32 },
    /// Hit terrain; the caller must detonate it
    Impact,
    OutOfBounds,
}

/// Projectile in flight
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub parent: Option<ProjectileId>,
    pub generation: u8,
    pub kind: WeaponKind,
    pub team: TeamId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: i32,
    pub explosion_radius: i32,
    pub penetration: f32,
    pub launch_timer: f32,
    pub elapsed: f32,
    pub travel_distance: f32,
    pub trail: VecDeque<Vec2>,
    pub phase: ProjectilePhase,
}

impl Projectile {
    pub fn new(
        id: ProjectileId,
        kind: WeaponKind,
        team: TeamId,
        position: Vec2,
        velocity: Vec2,
    ) -> Self {
        let stats = WeaponStats::for_kind(kind);
        Self {
            id,
            parent: None,
            generation: 0,
            kind,
            team,
            position,
            velocity,
            damage: stats.damage,
            explosion_radius: stats.explosion_radius,
            penetration: stats.penetration,
            launch_timer: LAUNCH_DELAY,
            elapsed: 0.0,
            travel_distance: 0.0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            phase: ProjectilePhase::Launching,
        }
    }

    fn shrapnel(id: ProjectileId, parent: &Projectile, velocity: Vec2) -> Self {
        Self {
            parent: Some(parent.id),
            generation: parent.generation + 1,
            damage: SHRAPNEL_DAMAGE,
            explosion_radius: SHRAPNEL_RADIUS,
            penetration: 0.0,
            ..Self::new(id, SHRAPNEL_KIND, parent.team, parent.position, velocity)
        }
    }

    pub fn stats(&self) -> &'static WeaponStats {
        WeaponStats::for_kind(self.kind)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, ProjectilePhase::Launching | ProjectilePhase::Flying)
    }

    pub fn is_launching(&self) -> bool {
        self.phase == ProjectilePhase::Launching
    }

    pub fn can_fragment(&self) -> bool {
        self.stats().spawns_shrapnel && self.generation < MAX_GENERATION
    }

    /// Advance one tick against the terrain.
    ///
    /// Sniper rounds carve a small hole and lose one penetration point per
    /// terrain hit; everything else reports `Impact` on the first hit.
    /// Crossing the top edge is an impact; past the sides or bottom the
    /// projectile is lost.
    pub fn update(&mut self, dt: f32, terrain: &mut Terrain) -> FlightEvent {
        if !self.is_active() {
            return FlightEvent::None;
        }

        self.elapsed += dt;

        if self.is_launching() {
            self.launch_timer -= dt;
            if self.launch_timer <= 0.0 {
                self.phase = ProjectilePhase::Flying;
            }
            return FlightEvent::None;
        }

        let old_position = self.position;
        let gravity = PROJECTILE_GRAVITY * self.stats().gravity_scale;
        self.velocity = PhysicsSystem::apply_gravity(self.velocity, gravity, dt, None);
        self.position += self.velocity * dt;
        self.travel_distance += self.position.distance(old_position);

        self.trail.push_back(self.position);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }

        let (cx, cy) = self.position.cell();
        match terrain.cell(cx, cy) {
            Some(true) => {
                if self.penetration > 0.0 {
                    terrain.carve(cx, cy, PENETRATION_CARVE_RADIUS);
                    self.penetration -= 1.0;
                    if self.penetration > 0.0 {
                        return FlightEvent::Penetrated {
                            at: self.position,
                            remaining: self.penetration,
                        };
                    }
                }
                FlightEvent::Impact
            }
            Some(false) => FlightEvent::None,
            // The ceiling is solid like any other out-of-bounds cell
            None if cy < 0 && cx >= 0 && (cx as usize) < terrain.width() => FlightEvent::Impact,
            None => {
                self.phase = ProjectilePhase::Lost;
                FlightEvent::OutOfBounds
            }
        }
    }

    /// Carve the blast crater and mark the projectile spent
    pub fn explode(&mut self, terrain: &mut Terrain) {
        let (cx, cy) = self.position.cell();
        terrain.carve(cx, cy, self.explosion_radius);
        self.phase = ProjectilePhase::Exploded;
    }

    /// Whether this projectile is close enough to detonate on `worm`
    pub fn hits_worm(&self, worm: &Worm) -> bool {
        if !self.is_active() || self.is_launching() || !worm.is_active() {
            return false;
        }
        if self.travel_distance < self.stats().arming_distance {
            return false;
        }
        self.position.distance(worm.position) < WORM_HIT_DISTANCE
    }
}

/// A detonation to resolve against the worms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blast {
    pub source: ProjectileId,
    pub position: Vec2,
    pub damage: i32,
    pub radius: i32,
    pub team: TeamId,
    pub shrapnel: usize,
}

/// Flat storage for every live projectile, shrapnel included
#[derive(Debug, Clone, Default)]
pub struct ProjectileArena {
    projectiles: Vec<Projectile>,
    next_id: ProjectileId,
}

impl ProjectileArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(
        &mut self,
        kind: WeaponKind,
        team: TeamId,
        position: Vec2,
        velocity: Vec2,
    ) -> ProjectileId {
        let id = self.allocate_id();
        self.projectiles
            .push(Projectile::new(id, kind, team, position, velocity));
        id
    }

    fn allocate_id(&mut self) -> ProjectileId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Projectile> {
        self.projectiles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Projectile> {
        self.projectiles.get_mut(index)
    }

    /// Detonate the projectile at `index`, spawning shrapnel when its weapon fragments.
    /// New pieces are appended and start their own launch delay.
    pub fn detonate<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        terrain: &mut Terrain,
        rng: &mut R,
    ) -> Option<Blast> {
        let projectile = self.projectiles.get_mut(index)?;
        if !projectile.is_active() {
            return None;
        }
        projectile.explode(terrain);
        let source = projectile.clone();

        let shrapnel = if source.can_fragment() {
            for _ in 0..SHRAPNEL_COUNT {
                let angle = rng.gen_range(0.0..TAU);
                let speed = rng.gen_range(SHRAPNEL_MIN_SPEED..SHRAPNEL_MAX_SPEED);
                let velocity = Vec2::new(angle.cos() * speed, angle.sin() * speed);
                let id = self.allocate_id();
                self.projectiles
                    .push(Projectile::shrapnel(id, &source, velocity));
            }
            SHRAPNEL_COUNT
        } else {
            0
        };

        Some(Blast {
            source: source.id,
            position: source.position,
            damage: source.damage,
            radius: source.explosion_radius,
            team: source.team,
            shrapnel,
        })
    }

    /// Drop spent projectiles
    pub fn prune(&mut self) {
        self.projectiles.retain(Projectile::is_active);
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn solid_terrain() -> Terrain {
        let mut terrain = Terrain::empty(400, 300);
        for x in 0..400 {
            terrain.fill_column(x, 0);
        }
        terrain
    }

    fn flying(kind: WeaponKind, position: Vec2, velocity: Vec2) -> Projectile {
        let mut projectile = Projectile::new(0, kind, 0, position, velocity);
        projectile.phase = ProjectilePhase::Flying;
        projectile
    }

    #[test]
    fn launch_phase_ignores_terrain_and_worms() {
        let mut terrain = solid_terrain();
        let mut projectile = Projectile::new(
            0,
            WeaponKind::Heavy,
            0,
            Vec2::new(100.0, 100.0),
            Vec2::new(50.0, 0.0),
        );
        projectile.travel_distance = 1000.0;
        let worm = Worm::new(Vec2::new(100.0, 100.0), 1);

        for _ in 0..10 {
            assert_eq!(projectile.update(DT, &mut terrain), FlightEvent::None);
            assert!(!projectile.hits_worm(&worm));
        }
        assert!(projectile.is_launching());
        assert_eq!(projectile.position, Vec2::new(100.0, 100.0));
        assert_eq!(terrain.revision(), 0);
    }

    #[test]
    fn launch_phase_ends_after_delay() {
        let mut terrain = Terrain::empty(400, 300);
        let mut projectile =
            Projectile::new(0, WeaponKind::Heavy, 0, Vec2::new(100.0, 100.0), Vec2::ZERO);
        projectile.update(0.15, &mut terrain);
        assert!(projectile.is_launching());
        projectile.update(0.15, &mut terrain);
        assert_eq!(projectile.phase, ProjectilePhase::Flying);
    }

    #[test]
    fn sniper_penetrates_three_hits_then_impacts() {
        let mut terrain = solid_terrain();
        let mut projectile =
            flying(WeaponKind::Sniper, Vec2::new(50.0, 150.0), Vec2::new(600.0, 0.0));

        assert!(matches!(
            projectile.update(DT, &mut terrain),
            FlightEvent::Penetrated { remaining, .. } if remaining == 2.0
        ));
        assert!(matches!(
            projectile.update(DT, &mut terrain),
            FlightEvent::Penetrated { remaining, .. } if remaining == 1.0
        ));
        assert_eq!(projectile.update(DT, &mut terrain), FlightEvent::Impact);
        assert_eq!(projectile.penetration, 0.0);
    }

    #[test]
    fn heavy_impacts_on_first_hit() {
        let mut terrain = solid_terrain();
        let mut projectile =
            flying(WeaponKind::Heavy, Vec2::new(50.0, 150.0), Vec2::new(600.0, 0.0));
        assert_eq!(projectile.update(DT, &mut terrain), FlightEvent::Impact);
        assert_eq!(terrain.revision(), 0);
    }

    #[test]
    fn trail_keeps_last_fifteen_samples() {
        let mut terrain = Terrain::empty(800, 600);
        let mut projectile =
            flying(WeaponKind::Sniper, Vec2::new(10.0, 100.0), Vec2::new(100.0, 0.0));
        for _ in 0..40 {
            projectile.update(DT, &mut terrain);
        }
        assert_eq!(projectile.trail.len(), TRAIL_LENGTH);
        assert_eq!(projectile.trail.back().copied(), Some(projectile.position));
        let xs: Vec<f32> = projectile.trail.iter().map(|p| p.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn leaving_bottom_is_lost_without_crater() {
        let mut terrain = Terrain::empty(400, 300);
        let mut projectile =
            flying(WeaponKind::Frag, Vec2::new(200.0, 299.0), Vec2::new(0.0, 300.0));
        assert_eq!(projectile.update(DT, &mut terrain), FlightEvent::OutOfBounds);
        assert_eq!(projectile.phase, ProjectilePhase::Lost);
        assert!(!projectile.is_active());
        assert_eq!(terrain.revision(), 0);
    }

    #[test]
    fn crossing_top_edge_impacts() {
        let mut terrain = Terrain::empty(400, 300);
        let mut projectile =
            flying(WeaponKind::Heavy, Vec2::new(200.0, 1.0), Vec2::new(0.0, -300.0));
        assert_eq!(projectile.update(DT, &mut terrain), FlightEvent::Impact);
        assert!(projectile.position.y < 0.0);
        assert!(terrain.is_solid(200, projectile.position.cell().1));
        // Still live until the match detonates it
        assert!(projectile.is_active());
    }

    #[test]
    fn arming_distance_depends_on_weapon() {
        let worm = Worm::new(Vec2::new(100.0, 100.0), 1);
        let mut sniper = flying(WeaponKind::Sniper, Vec2::new(105.0, 100.0), Vec2::ZERO);
        sniper.travel_distance = 35.0;
        assert!(sniper.hits_worm(&worm));

        let mut heavy = flying(WeaponKind::Heavy, Vec2::new(105.0, 100.0), Vec2::ZERO);
        heavy.travel_distance = 35.0;
        assert!(!heavy.hits_worm(&worm));
        heavy.travel_distance = 50.0;
        assert!(heavy.hits_worm(&worm));

        heavy.position = Vec2::new(120.0, 100.0);
        assert!(!heavy.hits_worm(&worm));
    }

    #[test]
    fn frag_detonation_spawns_eight_shrapnel() {
        let mut terrain = Terrain::empty(400, 300);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut arena = ProjectileArena::new();
        let id = arena.spawn(WeaponKind::Frag, 1, Vec2::new(200.0, 150.0), Vec2::ZERO);

        let blast = arena.detonate(0, &mut terrain, &mut rng).expect("active frag detonates");
        assert_eq!(blast.source, id);
        assert_eq!((blast.damage, blast.radius, blast.shrapnel), (35, 45, SHRAPNEL_COUNT));
        assert_eq!(arena.len(), 1 + SHRAPNEL_COUNT);

        for piece in arena.iter().skip(1) {
            assert_eq!(piece.parent, Some(id));
            assert_eq!(piece.generation, 1);
            assert_eq!(piece.kind, SHRAPNEL_KIND);
            assert_eq!((piece.damage, piece.explosion_radius), (SHRAPNEL_DAMAGE, SHRAPNEL_RADIUS));
            assert_eq!(piece.team, 1);
            assert!(piece.is_launching());
            let speed = piece.velocity.length();
            assert!((SHRAPNEL_MIN_SPEED - 0.01..SHRAPNEL_MAX_SPEED + 0.01).contains(&speed));
        }

        arena.prune();
        assert_eq!(arena.len(), SHRAPNEL_COUNT);
    }

    #[test]
    fn shrapnel_never_fragments() {
        let mut terrain = Terrain::empty(400, 300);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut arena = ProjectileArena::new();
        arena.spawn(WeaponKind::Frag, 0, Vec2::new(200.0, 150.0), Vec2::ZERO);
        arena.detonate(0, &mut terrain, &mut rng);
        arena.prune();

        // Even a frag-kind piece past the generation limit stays inert
        arena.get_mut(0).expect("shrapnel").kind = WeaponKind::Frag;
        let blast = arena.detonate(0, &mut terrain, &mut rng).expect("shrapnel detonates");
        assert_eq!(blast.shrapnel, 0);
        assert_eq!(arena.len(), SHRAPNEL_COUNT);
    }

    #[test]
    fn detonating_spent_projectile_is_noop() {
        let mut terrain = Terrain::empty(400, 300);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut arena = ProjectileArena::new();
        arena.spawn(WeaponKind::Heavy, 0, Vec2::new(200.0, 150.0), Vec2::ZERO);
        assert!(arena.detonate(0, &mut terrain, &mut rng).is_some());
        assert!(arena.detonate(0, &mut terrain, &mut rng).is_none());
        assert!(arena.detonate(5, &mut terrain, &mut rng).is_none());
    }
}
