//! Worm Arena - turn-based artillery simulation on destructible terrain
//!
//! The simulation core lives in [`game`] and is fully synchronous; [`app`]
//! wraps it in a fixed-rate tokio driver for headless runs.

pub mod app;
pub mod config;
pub mod game;
pub mod util;
