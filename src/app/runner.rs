//! Fixed-rate match driver

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::snapshot::{MatchSnapshot, SnapshotBuilder};
use crate::game::{Command, GameEvent, Match};
use crate::util::time::{tick_delta, Timer, MAX_TPS};

/// Drives one match: drains commands, advances ticks and publishes snapshots
pub struct MatchRunner {
    game: Match,
    tick_rate: u32,
    max_ticks: Option<u64>,
    command_rx: mpsc::Receiver<Command>,
    commands_open: bool,
    snapshot_tx: broadcast::Sender<MatchSnapshot>,
    snapshot_builder: SnapshotBuilder,
    /// Events not yet published
    pending_events: Vec<GameEvent>,
}

impl MatchRunner {
    pub fn new(
        game: Match,
        config: &Config,
        command_rx: mpsc::Receiver<Command>,
        snapshot_tx: broadcast::Sender<MatchSnapshot>,
    ) -> Self {
        let tick_rate = config.tick_rate.clamp(1, MAX_TPS);
        Self {
            game,
            tick_rate,
            max_ticks: config.max_ticks,
            command_rx,
            commands_open: true,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::for_rates(tick_rate, config.snapshot_rate),
            pending_events: Vec::new(),
        }
    }

    /// Run until the tick cap, or until the match is over and no more
    /// commands can arrive. Returns the final match state.
    pub async fn run(mut self) -> Match {
        let match_id = self.game.id();
        info!(match_id = %match_id, tick_rate = self.tick_rate, "Match started");

        let tick_duration = Duration::from_micros(1_000_000 / self.tick_rate as u64);
        let budget_micros = tick_duration.as_micros() as u64;
        let dt = tick_delta(self.tick_rate);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ticks_run: u64 = 0;
        loop {
            tick_interval.tick().await;
            let timer = Timer::new();

            self.process_commands();
            let events = self.game.advance_tick(dt);
            ticks_run += 1;

            if events.iter().any(|e| {
                matches!(
                    e,
                    GameEvent::TurnChanged { .. }
                        | GameEvent::MatchEnded { .. }
                        | GameEvent::Restarted
                )
            }) {
                self.snapshot_builder.force_next();
            }
            self.pending_events.extend(events);

            if self.snapshot_builder.should_send() {
                self.publish();
            }

            let elapsed = timer.elapsed_micros();
            if elapsed > budget_micros {
                warn!(
                    match_id = %match_id,
                    elapsed_micros = elapsed,
                    budget_micros,
                    "Tick overran its budget"
                );
            }

            if self.max_ticks.is_some_and(|max| ticks_run >= max) {
                info!(match_id = %match_id, ticks = ticks_run, "Tick limit reached");
                break;
            }
            if self.game.is_ended() && !self.commands_open {
                info!(
                    match_id = %match_id,
                    winner = ?self.game.winner(),
                    "Match over and input closed"
                );
                break;
            }
        }

        self.publish();
        self.game
    }

    /// Apply every queued command before the tick
    fn process_commands(&mut self) {
        while self.commands_open {
            match self.command_rx.try_recv() {
                Ok(command) => {
                    debug!(match_id = %self.game.id(), ?command, "Applying command");
                    self.game.apply(command);
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    debug!(match_id = %self.game.id(), "Command channel closed");
                    self.commands_open = false;
                }
            }
        }
    }

    fn publish(&mut self) {
        let events = std::mem::take(&mut self.pending_events);
        let snapshot = self.snapshot_builder.build(&self.game, events);
        // No subscribers is fine
        let _ = self.snapshot_tx.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{MatchConfig, WormSpawn};

    fn runner_config(max_ticks: u64) -> Config {
        Config {
            tick_rate: 1000,
            snapshot_rate: 100,
            max_ticks: Some(max_ticks),
            ..Config::default()
        }
    }

    fn seeded(roster: Vec<WormSpawn>) -> Match {
        Match::new(MatchConfig {
            seed: Some(7),
            roster,
            ..MatchConfig::default()
        })
        .expect("valid config")
    }

    #[tokio::test]
    async fn applies_commands_and_stops_at_tick_limit() {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (snapshot_tx, mut snapshot_rx) = broadcast::channel(256);
        let game = seeded(MatchConfig::default().roster);

        command_tx.send(Command::Fire).await.expect("runner owns receiver");
        drop(command_tx);

        let runner = MatchRunner::new(game, &runner_config(25), command_rx, snapshot_tx);
        let game = runner.run().await;

        assert_eq!(game.tick(), 25);
        assert_eq!(game.current_worm(), 1);

        let mut snapshots = Vec::new();
        while let Ok(snapshot) = snapshot_rx.try_recv() {
            snapshots.push(snapshot);
        }
        // Forced on the first tick's turn change, paced after, final on exit
        assert!(snapshots.len() >= 3);
        assert!(snapshots[0]
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::Fired { worm: 0, .. })));
        assert_eq!(snapshots.last().map(|s| s.tick), Some(25));
    }

    #[tokio::test]
    async fn ended_match_with_closed_input_stops_early() {
        let (command_tx, command_rx) = mpsc::channel(1);
        let (snapshot_tx, mut snapshot_rx) = broadcast::channel(16);
        drop(command_tx);

        let game = seeded(vec![WormSpawn { x: 400.0, team: 0 }]);
        let runner = MatchRunner::new(game, &runner_config(10_000), command_rx, snapshot_tx);
        let game = runner.run().await;

        assert!(game.is_ended());
        assert_eq!(game.winner(), Some(0));
        assert_eq!(game.tick(), 1);

        let snapshot = tokio_test::assert_ok!(snapshot_rx.try_recv());
        assert!(snapshot.ended);
        assert!(snapshot
            .events
            .contains(&GameEvent::MatchEnded { winner: Some(0) }));
    }

    #[tokio::test]
    async fn oversized_tick_rate_is_clamped() {
        let (_command_tx, command_rx) = mpsc::channel(1);
        let (snapshot_tx, _snapshot_rx) = broadcast::channel(16);
        let config = Config {
            tick_rate: u32::MAX,
            ..runner_config(3)
        };

        let game = seeded(MatchConfig::default().roster);
        let runner = MatchRunner::new(game, &config, command_rx, snapshot_tx);
        assert_eq!(runner.tick_rate, MAX_TPS);
        let game = runner.run().await;
        assert_eq!(game.tick(), 3);
    }
}
