//! Game simulation modules

pub mod combat;
pub mod r#match;
pub mod physics;
pub mod projectile;
pub mod snapshot;
pub mod terrain;
pub mod trajectory;
pub mod worm;

pub use combat::WeaponKind;
pub use r#match::{Match, MatchConfig, MatchError, WormSpawn};
pub use worm::MoveDirection;

use serde::{Deserialize, Serialize};

use crate::util::math::Vec2;
use projectile::ProjectileId;

/// Playfield width in terrain cells
pub const ARENA_WIDTH: usize = 800;
/// Playfield height in terrain cells
pub const ARENA_HEIGHT: usize = 600;
/// Worm gravity (units/s²)
pub const GRAVITY: f32 = 800.0;
/// Projectile gravity before weapon scaling (units/s²)
pub const PROJECTILE_GRAVITY: f32 = 600.0;

/// Team identifier
pub type TeamId = u32;

/// Discrete intents issued by an input layer for the current turn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Move(MoveDirection),
    /// `None` jumps along the current aim direction
    Jump {
        #[serde(default)]
        direction: Option<Vec2>,
    },
    AimAt(Vec2),
    SelectWeapon(WeaponKind),
    CycleWeapon,
    Fire,
    Restart,
}

/// Things that happened during a tick or command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Fired {
        worm: usize,
        projectile: ProjectileId,
        weapon: WeaponKind,
        x: f32,
        y: f32,
    },
    Penetrated {
        projectile: ProjectileId,
        x: f32,
        y: f32,
        remaining: f32,
    },
    Exploded {
        projectile: ProjectileId,
        x: f32,
        y: f32,
        radius: i32,
    },
    ShrapnelSpawned {
        parent: ProjectileId,
        count: usize,
    },
    ProjectileLost {
        projectile: ProjectileId,
    },
    Damaged {
        worm: usize,
        amount: i32,
        health: i32,
    },
    Killed {
        worm: usize,
    },
    FellIntoPit {
        worm: usize,
    },
    TurnChanged {
        worm: usize,
    },
    MatchEnded {
        winner: Option<usize>,
    },
    Restarted,
}
