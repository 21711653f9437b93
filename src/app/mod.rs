//! Headless driver: console input and the fixed-rate match loop

pub mod console;
pub mod runner;

pub use console::{parse_command, CommandParseError};
pub use runner::MatchRunner;
