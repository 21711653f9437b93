//! Combat system - weapon table, explosion damage and knockback

use serde::{Deserialize, Serialize};

use crate::util::math::Vec2;

/// Weapon kinds available to a worm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Standard bazooka shell
    Heavy,
    /// Low-drop rifle round that punches through terrain
    Sniper,
    /// Grenade that bursts into shrapnel
    Frag,
}

impl Default for WeaponKind {
    fn default() -> Self {
        Self::Heavy
    }
}

impl WeaponKind {
    /// Next weapon in selection order, wrapping
    pub fn next(self) -> Self {
        match self {
            Self::Heavy => Self::Sniper,
            Self::Sniper => Self::Frag,
            Self::Frag => Self::Heavy,
        }
    }

    pub fn stats(self) -> &'static WeaponStats {
        WeaponStats::for_kind(self)
    }
}

/// Static per-weapon configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    /// Damage at the centre of the blast
    pub damage: i32,
    /// Blast radius (damage and crater)
    pub explosion_radius: i32,
    /// Multiplier on projectile gravity
    pub gravity_scale: f32,
    /// Terrain hits absorbed before detonating
    pub penetration: f32,
    /// Bursts into shrapnel on detonation
    pub spawns_shrapnel: bool,
    /// Travel required before the projectile can hit a worm
    pub arming_distance: f32,
}

static HEAVY: WeaponStats = WeaponStats {
    damage: 25,
    explosion_radius: 30,
    gravity_scale: 1.0,
    penetration: 0.0,
    spawns_shrapnel: false,
    arming_distance: 50.0,
};

static SNIPER: WeaponStats = WeaponStats {
    damage: 75,
    explosion_radius: 5,
    gravity_scale: 0.3,
    penetration: 3.0,
    spawns_shrapnel: false,
    arming_distance: 30.0,
};

static FRAG: WeaponStats = WeaponStats {
    damage: 35,
    explosion_radius: 45,
    gravity_scale: 1.0,
    penetration: 0.0,
    spawns_shrapnel: true,
    arming_distance: 50.0,
};

impl WeaponStats {
    pub fn for_kind(kind: WeaponKind) -> &'static WeaponStats {
        match kind {
            WeaponKind::Heavy => &HEAVY,
            WeaponKind::Sniper => &SNIPER,
            WeaponKind::Frag => &FRAG,
        }
    }
}

/// Shrapnel pieces are heavy shells with reduced payload
pub const SHRAPNEL_KIND: WeaponKind = WeaponKind::Heavy;
pub const SHRAPNEL_DAMAGE: i32 = 15;
pub const SHRAPNEL_RADIUS: i32 = 8;
pub const SHRAPNEL_COUNT: usize = 8;
pub const SHRAPNEL_MIN_SPEED: f32 = 150.0;
pub const SHRAPNEL_MAX_SPEED: f32 = 300.0;

/// Crater radius carved by each sniper pass-through
pub const PENETRATION_CARVE_RADIUS: i32 = 3;
/// Distance below which a projectile hits a worm
pub const WORM_HIT_DISTANCE: f32 = 20.0;
/// Velocity impulse pushing worms away from a blast
pub const KNOCKBACK_IMPULSE: f32 = 150.0;
/// Divisor applied to damage dealt to the shooter's own team
pub const FRIENDLY_FIRE_DIVISOR: i32 = 3;

/// Combat system for blast resolution
pub struct CombatSystem;

impl CombatSystem {
    /// Unrounded falloff damage; zero at or beyond the radius
    pub fn falloff(base_damage: i32, radius: i32, distance: f32) -> f32 {
        if radius <= 0 || distance >= radius as f32 {
            return 0.0;
        }
        base_damage as f32 * (1.0 - distance / radius as f32)
    }

    /// Damage dealt by a blast at `distance`.
    /// Falloff is truncated to an integer first, then friendly fire divides it.
    pub fn explosion_damage(base_damage: i32, radius: i32, distance: f32, friendly: bool) -> i32 {
        let damage = Self::falloff(base_damage, radius, distance) as i32;
        if friendly {
            damage / FRIENDLY_FIRE_DIVISOR
        } else {
            damage
        }
    }

    /// Velocity impulse for a worm at `target` from a blast at `origin`
    pub fn knockback(origin: Vec2, target: Vec2) -> Vec2 {
        if origin.distance(target) > 0.0 {
            (target - origin).normalize() * KNOCKBACK_IMPULSE
        } else {
            Vec2::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_table_matches_expected_values() {
        let heavy = WeaponKind::Heavy.stats();
        assert_eq!((heavy.damage, heavy.explosion_radius), (25, 30));
        assert_eq!(heavy.penetration, 0.0);

        let sniper = WeaponKind::Sniper.stats();
        assert_eq!((sniper.damage, sniper.explosion_radius), (75, 5));
        assert_eq!(sniper.gravity_scale, 0.3);
        assert_eq!(sniper.penetration, 3.0);
        assert_eq!(sniper.arming_distance, 30.0);

        let frag = WeaponKind::Frag.stats();
        assert_eq!((frag.damage, frag.explosion_radius), (35, 45));
        assert!(frag.spawns_shrapnel);
        assert!(!heavy.spawns_shrapnel && !sniper.spawns_shrapnel);
    }

    #[test]
    fn enemy_damage_truncates_falloff() {
        assert_eq!(CombatSystem::explosion_damage(25, 30, 10.0, false), 16);
        assert_eq!(CombatSystem::explosion_damage(25, 30, 0.0, false), 25);
    }

    #[test]
    fn friendly_damage_is_a_third_of_truncated() {
        assert_eq!(CombatSystem::explosion_damage(25, 30, 10.0, true), 5);
        assert_eq!(CombatSystem::explosion_damage(25, 30, 0.0, true), 8);
    }

    #[test]
    fn damage_is_zero_at_and_beyond_radius() {
        assert_eq!(CombatSystem::explosion_damage(25, 30, 30.0, false), 0);
        assert_eq!(CombatSystem::explosion_damage(25, 30, 45.0, false), 0);
        assert_eq!(CombatSystem::falloff(25, 30, 30.0), 0.0);
    }

    #[test]
    fn falloff_strictly_decreases_inside_radius() {
        let mut last = f32::INFINITY;
        for step in 0..30 {
            let d = step as f32;
            let f = CombatSystem::falloff(35, 45, d);
            assert!(f < last);
            last = f;
        }
        let mut last_int = i32::MAX;
        for step in 0..=45 {
            let dmg = CombatSystem::explosion_damage(35, 45, step as f32, false);
            assert!(dmg <= last_int);
            last_int = dmg;
        }
    }

    #[test]
    fn knockback_points_away_from_blast() {
        let k = CombatSystem::knockback(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0));
        assert!((k.y - KNOCKBACK_IMPULSE).abs() < 1e-4);
        assert_eq!(CombatSystem::knockback(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)), Vec2::ZERO);
    }

    #[test]
    fn weapon_cycle_wraps() {
        assert_eq!(WeaponKind::Frag.next(), WeaponKind::Heavy);
        assert_eq!(WeaponKind::Heavy.next().next(), WeaponKind::Frag);
    }
}
