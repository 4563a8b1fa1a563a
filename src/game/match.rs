//! Match state and the fixed-step tick loop

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::host::protocol::ServerMsg;
use crate::util::time::{tick_duration, unix_millis, Timer};

use super::combat::{ActiveAttack, CombatSystem, HitOutcome};
use super::effects::EffectsTracker;
use super::fighter::{Fighter, PlayerSlot};
use super::input::{InputSnapshot, SharedInput};
use super::physics::Stage;
use super::snapshot::SnapshotBuilder;

/// Match lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// No simulation running
    Menu,
    /// Fixed-step simulation active
    Playing,
    /// A fighter was knocked out; simulation halted
    GameOver,
}

/// Control surface offered to the lifecycle collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleCommand {
    Start,
    Rematch,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {action:?} while the match is {from:?}")]
    InvalidTransition {
        from: MatchPhase,
        action: LifecycleCommand,
    },
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MatchEvent {
    /// An attack connected (landed or blocked)
    Strike {
        attacker: PlayerSlot,
        defender: PlayerSlot,
        outcome: HitOutcome,
    },
    Knockout {
        winner: PlayerSlot,
        loser: PlayerSlot,
    },
}

/// Authoritative state of one match
#[derive(Debug, Clone)]
pub struct MatchState {
    pub id: Uuid,
    pub seed: u64,
    pub phase: MatchPhase,
    pub tick: u64,
    pub stage: Stage,
    pub player1: Fighter,
    pub player2: Fighter,
    pub effects: EffectsTracker,
    pub winner: Option<PlayerSlot>,
    pub rng: ChaCha8Rng,
}

impl MatchState {
    pub fn new(id: Uuid, seed: u64, stage: Stage) -> Self {
        Self {
            id,
            seed,
            phase: MatchPhase::Menu,
            tick: 0,
            stage,
            player1: Fighter::new(PlayerSlot::One, &stage),
            player2: Fighter::new(PlayerSlot::Two, &stage),
            effects: EffectsTracker::new(),
            winner: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn fighter(&self, slot: PlayerSlot) -> &Fighter {
        match slot {
            PlayerSlot::One => &self.player1,
            PlayerSlot::Two => &self.player2,
        }
    }

    /// Leave the menu and begin the first round
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        self.transition(MatchPhase::Menu, LifecycleCommand::Start)
    }

    /// Begin a fresh round after a knockout
    pub fn rematch(&mut self) -> Result<(), LifecycleError> {
        self.transition(MatchPhase::GameOver, LifecycleCommand::Rematch)
    }

    fn transition(
        &mut self,
        required: MatchPhase,
        action: LifecycleCommand,
    ) -> Result<(), LifecycleError> {
        if self.phase != required {
            return Err(LifecycleError::InvalidTransition {
                from: self.phase,
                action,
            });
        }
        self.reset();
        self.phase = MatchPhase::Playing;
        Ok(())
    }

    /// Canonical fighters, no effects, tick zero
    fn reset(&mut self) {
        self.player1 = Fighter::new(PlayerSlot::One, &self.stage);
        self.player2 = Fighter::new(PlayerSlot::Two, &self.stage);
        self.effects.clear();
        self.tick = 0;
        self.winner = None;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Run a single simulation tick. Does nothing outside `Playing`.
    pub fn tick(&mut self, inputs: &[InputSnapshot; 2]) -> Vec<MatchEvent> {
        let mut events = Vec::new();
        if self.phase != MatchPhase::Playing {
            return events;
        }

        self.tick += 1;
        let tick = self.tick;

        self.player1.advance(&inputs[0], tick, &self.stage);
        self.player2.advance(&inputs[1], tick, &self.stage);

        // Both attacks are captured first so a trade lands both ways
        let p1_attack = ActiveAttack::of(&self.player1);
        let p2_attack = ActiveAttack::of(&self.player2);

        if let Some(outcome) = p1_attack.and_then(|attack| {
            CombatSystem::apply(&attack, &mut self.player1, &mut self.player2, tick)
        }) {
            events.push(self.record_strike(PlayerSlot::One, outcome));
        }
        if let Some(outcome) = p2_attack.and_then(|attack| {
            CombatSystem::apply(&attack, &mut self.player2, &mut self.player1, tick)
        }) {
            events.push(self.record_strike(PlayerSlot::Two, outcome));
        }

        self.effects.update();

        if let Some(knockout) = self.check_win_condition() {
            events.push(knockout);
        }

        events
    }

    fn record_strike(&mut self, attacker: PlayerSlot, outcome: HitOutcome) -> MatchEvent {
        let defender = attacker.opponent();
        let defender_top = self.fighter(defender).y;
        self.effects.on_hit(&outcome, defender_top, &mut self.rng);

        match outcome {
            HitOutcome::Landed { damage, combo, .. } => debug!(
                match_id = %self.id,
                tick = self.tick,
                attacker = attacker.label(),
                damage,
                combo,
                "Hit landed"
            ),
            HitOutcome::Blocked { damage, .. } => debug!(
                match_id = %self.id,
                tick = self.tick,
                attacker = attacker.label(),
                damage,
                "Hit blocked"
            ),
        }

        MatchEvent::Strike {
            attacker,
            defender,
            outcome,
        }
    }

    /// Player 1 is checked first, so a double knockout goes to Player 2.
    /// Health is clamped at zero once the round is decided.
    fn check_win_condition(&mut self) -> Option<MatchEvent> {
        let loser = if self.player1.is_knocked_out() {
            PlayerSlot::One
        } else if self.player2.is_knocked_out() {
            PlayerSlot::Two
        } else {
            return None;
        };
        let winner = loser.opponent();

        for fighter in [&mut self.player1, &mut self.player2] {
            fighter.health = fighter.health.max(0.0);
        }
        self.winner = Some(winner);
        self.phase = MatchPhase::GameOver;
        info!(
            match_id = %self.id,
            tick = self.tick,
            winner = winner.label(),
            "Knockout"
        );

        Some(MatchEvent::Knockout { winner, loser })
    }
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub command_tx: mpsc::Sender<LifecycleCommand>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub input: SharedInput,
}

impl MatchHandle {
    /// Send a lifecycle command; false once the runner has stopped
    pub async fn send(&self, command: LifecycleCommand) -> bool {
        self.command_tx.send(command).await.is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.snapshot_tx.subscribe()
    }
}

enum Wake {
    Tick,
    Command(Option<LifecycleCommand>),
}

/// The match runner: owns the state and drives it once per frame
pub struct GameMatch {
    state: MatchState,
    command_rx: mpsc::Receiver<LifecycleCommand>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    input: SharedInput,
    tick_rate: u32,
}

impl GameMatch {
    /// Create a new match runner in the menu phase
    pub fn new(id: Uuid, seed: u64, config: &Config) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (snapshot_tx, _) = broadcast::channel(64);
        let input = SharedInput::new();

        let handle = MatchHandle {
            id,
            command_tx,
            snapshot_tx: snapshot_tx.clone(),
            input: input.clone(),
        };

        let game_match = Self {
            state: MatchState::new(id, seed, config.stage),
            command_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(config.snapshot_every),
            input,
            tick_rate: config.tick_rate,
        };

        (game_match, handle)
    }

    /// Run until `Quit` arrives or every handle is dropped.
    ///
    /// Ticks are only scheduled while playing; in the menu and after a
    /// knockout the runner just waits for the next command.
    pub async fn run(mut self) {
        info!(match_id = %self.state.id, seed = self.state.seed, "Match runner started");

        let period = tick_duration(self.tick_rate);
        let mut tick_interval = interval(period);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let wake = if self.state.phase == MatchPhase::Playing {
                tokio::select! {
                    _ = tick_interval.tick() => Wake::Tick,
                    command = self.command_rx.recv() => Wake::Command(command),
                }
            } else {
                Wake::Command(self.command_rx.recv().await)
            };

            match wake {
                Wake::Tick => self.run_tick(period),
                Wake::Command(None) => {
                    info!(match_id = %self.state.id, "All handles dropped");
                    break;
                }
                Wake::Command(Some(command)) => {
                    let result = match command {
                        LifecycleCommand::Start => self.state.start(),
                        LifecycleCommand::Rematch => self.state.rematch(),
                        LifecycleCommand::Quit => break,
                    };
                    if self.begin_round(command, result) {
                        tick_interval.reset();
                    }
                }
            }
        }

        self.input.clear();
        info!(match_id = %self.state.id, tick = self.state.tick, "Match runner stopped");
    }

    /// Announce the outcome of a start/rematch; returns true when a round began
    fn begin_round(
        &mut self,
        command: LifecycleCommand,
        result: Result<(), LifecycleError>,
    ) -> bool {
        match result {
            Ok(()) => {
                self.input.clear();
                self.snapshot_builder.reset();
                info!(match_id = %self.state.id, command = ?command, "Round started");

                let _ = self.snapshot_tx.send(ServerMsg::MatchStarted {
                    match_id: self.state.id,
                    seed: self.state.seed,
                    server_time: unix_millis(),
                });
                let snapshot = self.snapshot_builder.build(&self.state);
                let _ = self.snapshot_tx.send(ServerMsg::Snapshot(snapshot));
                true
            }
            Err(e) => {
                warn!(match_id = %self.state.id, error = %e, "Rejected lifecycle command");
                let _ = self.snapshot_tx.send(ServerMsg::Error {
                    code: "invalid_transition".to_string(),
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn run_tick(&mut self, budget: std::time::Duration) {
        let timer = Timer::new();

        let inputs = self.input.snapshot();
        let events = self.state.tick(&inputs);
        self.snapshot_builder.record(events);

        let finished = self.state.phase == MatchPhase::GameOver;
        if finished {
            self.snapshot_builder.force_next();
        }

        if self.snapshot_builder.should_send() {
            let snapshot = self.snapshot_builder.build(&self.state);
            // No subscribers is fine; the host may not be listening yet
            let _ = self.snapshot_tx.send(ServerMsg::Snapshot(snapshot));
        }

        if let (true, Some(winner)) = (finished, self.state.winner) {
            self.input.clear();
            let _ = self.snapshot_tx.send(ServerMsg::MatchEnd {
                winner,
                winner_label: winner.label().to_string(),
                tick: self.state.tick,
            });
        }

        if timer.elapsed() > budget {
            warn!(
                match_id = %self.state.id,
                tick = self.state.tick,
                elapsed_us = timer.elapsed_micros(),
                "Tick exceeded frame budget"
            );
        }
    }
}
