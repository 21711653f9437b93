//! Line-oriented command input
//!
//! Accepts short verbs (`left`, `jump 0.5 -1`, `aim 400 120`, `weapon frag`,
//! `fire`) or a JSON-encoded [`Command`].

use crate::game::{Command, MoveDirection, WeaponKind};
use crate::util::math::Vec2;

/// Console input errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{verb} expects {expected}")]
    Arguments {
        verb: &'static str,
        expected: &'static str,
    },

    #[error("unknown weapon: {0}")]
    Weapon(String),

    #[error("invalid JSON command: {0}")]
    Json(String),
}

/// Parse one input line into a command
pub fn parse_command(line: &str) -> Result<Command, CommandParseError> {
    let line = line.trim();
    if line.starts_with('{') || line.starts_with('"') {
        return serde_json::from_str(line).map_err(|e| CommandParseError::Json(e.to_string()));
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(CommandParseError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "left" | "a" => no_args("left", &args, Command::Move(MoveDirection::Left))?,
        "right" | "d" => no_args("right", &args, Command::Move(MoveDirection::Right))?,
        "jump" | "w" => match args.as_slice() {
            [] => Command::Jump { direction: None },
            [x, y] => Command::Jump {
                direction: Some(point("jump", x, y)?),
            },
            _ => return Err(arguments("jump", "no arguments or <dx> <dy>")),
        },
        "aim" => match args.as_slice() {
            [x, y] => Command::AimAt(point("aim", x, y)?),
            _ => return Err(arguments("aim", "<x> <y>")),
        },
        "weapon" => match args.as_slice() {
            [name] => Command::SelectWeapon(weapon(name)?),
            _ => return Err(arguments("weapon", "heavy, sniper or frag")),
        },
        "cycle" | "tab" => no_args("cycle", &args, Command::CycleWeapon)?,
        "fire" | "space" => no_args("fire", &args, Command::Fire)?,
        "restart" | "r" => no_args("restart", &args, Command::Restart)?,
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn arguments(verb: &'static str, expected: &'static str) -> CommandParseError {
    CommandParseError::Arguments { verb, expected }
}

fn no_args(
    verb: &'static str,
    args: &[&str],
    command: Command,
) -> Result<Command, CommandParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(arguments(verb, "no arguments"))
    }
}

fn point(verb: &'static str, x: &str, y: &str) -> Result<Vec2, CommandParseError> {
    let parse = |raw: &str| {
        raw.parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| arguments(verb, "two finite numbers"))
    };
    Ok(Vec2::new(parse(x)?, parse(y)?))
}

fn weapon(name: &str) -> Result<WeaponKind, CommandParseError> {
    match name.to_ascii_lowercase().as_str() {
        "heavy" | "1" => Ok(WeaponKind::Heavy),
        "sniper" | "2" => Ok(WeaponKind::Sniper),
        "frag" | "3" => Ok(WeaponKind::Frag),
        _ => Err(CommandParseError::Weapon(name.to_string())),
    }
}
