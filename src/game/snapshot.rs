//! Snapshot building for presentation consumers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::combat::WeaponKind;
use super::projectile::{Projectile, ProjectileId, ProjectilePhase};
use super::terrain::Terrain;
use super::worm::{Worm, WORM_RADIUS};
use super::{GameEvent, Match, TeamId};

/// Full read model of a match at one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: Uuid,
    pub tick: u64,
    /// Bumped whenever terrain cells change
    pub terrain_revision: u64,
    /// Full grid, only present when the revision changed since the last snapshot
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub terrain: Option<TerrainSnapshot>,
    pub current_worm: usize,
    pub aim_x: f32,
    pub aim_y: f32,
    pub aim_power: f32,
    pub weapon: WeaponKind,
    pub can_fire: bool,
    pub turn_time: f32,
    pub ended: bool,
    pub winner: Option<usize>,
    pub worms: Vec<WormSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Events since the previous snapshot
    pub events: Vec<GameEvent>,
}

/// Worm state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WormSnapshot {
    pub team: TeamId,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub radius: i32,
    /// Health (0-100)
    pub health: i32,
    pub alive: bool,
    pub grounded: bool,
    pub my_turn: bool,
}

impl From<&Worm> for WormSnapshot {
    fn from(worm: &Worm) -> Self {
        Self {
            team: worm.team,
            x: worm.position.x,
            y: worm.position.y,
            vel_x: worm.velocity.x,
            vel_y: worm.velocity.y,
            radius: WORM_RADIUS,
            health: worm.health(),
            alive: worm.is_active(),
            grounded: worm.is_grounded(),
            my_turn: worm.is_my_turn(),
        }
    }
}

/// Terrain grid, one run-length encoded row per line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    pub width: usize,
    pub height: usize,
    /// Alternating run lengths per row, starting with an empty run (possibly 0)
    pub rows: Vec<Vec<u32>>,
}

impl From<&Terrain> for TerrainSnapshot {
    fn from(terrain: &Terrain) -> Self {
        let rows = terrain
            .cells()
            .chunks(terrain.width().max(1))
            .map(|row| {
                let mut runs = Vec::new();
                let mut solid = false;
                let mut run = 0;
                for &cell in row {
                    if cell != solid {
                        runs.push(run);
                        solid = cell;
                        run = 0;
                    }
                    run += 1;
                }
                runs.push(run);
                runs
            })
            .collect();

        Self {
            width: terrain.width(),
            height: terrain.height(),
            rows,
        }
    }
}

impl TerrainSnapshot {
    /// Expand back into row-major cells
    pub fn cells(&self) -> Vec<bool> {
        let mut cells = Vec::with_capacity(self.width * self.height);
        for row in &self.rows {
            for (i, &run) in row.iter().enumerate() {
                cells.extend(std::iter::repeat(i % 2 == 1).take(run as usize));
            }
        }
        cells
    }
}

/// Projectile state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: ProjectileId,
    pub parent: Option<ProjectileId>,
    pub kind: WeaponKind,
    pub phase: ProjectilePhase,
    pub x: f32,
    pub y: f32,
    /// Recent positions, oldest first
    pub trail: Vec<[f32; 2]>,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(projectile: &Projectile) -> Self {
        Self {
            id: projectile.id,
            parent: projectile.parent,
            kind: projectile.kind,
            phase: projectile.phase,
            x: projectile.position.x,
            y: projectile.position.y,
            trail: projectile.trail.iter().map(|p| [p.x, p.y]).collect(),
        }
    }
}

/// Paces snapshot emission at a fixed tick interval
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    /// Terrain revision included in the last snapshot
    sent_terrain_revision: Option<u64>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            sent_terrain_revision: None,
        }
    }

    /// Interval for a snapshot rate relative to the tick rate
    pub fn for_rates(tick_rate: u32, snapshot_rate: u32) -> Self {
        Self::new(tick_rate / snapshot_rate.max(1))
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot, attaching the terrain grid when it changed
    pub fn build(&mut self, game: &Match, events: Vec<GameEvent>) -> MatchSnapshot {
        let aim = game.aim_direction();
        let revision = game.terrain().revision();
        let terrain = (self.sent_terrain_revision != Some(revision))
            .then(|| TerrainSnapshot::from(game.terrain()));
        self.sent_terrain_revision = Some(revision);

        MatchSnapshot {
            match_id: game.id(),
            tick: game.tick(),
            terrain_revision: revision,
            terrain,
            current_worm: game.current_worm(),
            aim_x: aim.x,
            aim_y: aim.y,
            aim_power: game.aim_power(),
            weapon: game.selected_weapon(),
            can_fire: game.can_fire(),
            turn_time: game.turn_time(),
            ended: game.is_ended(),
            winner: game.winner(),
            worms: game.worms().iter().map(WormSnapshot::from).collect(),
            projectiles: game
                .projectiles()
                .iter()
                .map(ProjectileSnapshot::from)
                .collect(),
            events,
        }
    }
}
