//! Logical input actions and per-tick snapshots

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::fighter::{Facing, PlayerSlot};

/// Logical actions a fighter can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Left,
    Right,
    Jump,
    Attack,
    Special,
    Block,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Left,
        Action::Right,
        Action::Jump,
        Action::Attack,
        Action::Special,
        Action::Block,
    ];
}

/// Which actions are currently held by one player.
///
/// Rebuilt from live key state every tick; nothing is buffered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub attack: bool,
    pub special: bool,
    pub block: bool,
}

impl InputSnapshot {
    /// Snapshot with exactly the given actions held
    pub fn holding(actions: &[Action]) -> Self {
        let mut snapshot = Self::default();
        for action in actions {
            snapshot.set(*action, true);
        }
        snapshot
    }

    pub fn is_held(&self, action: Action) -> bool {
        match action {
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Jump => self.jump,
            Action::Attack => self.attack,
            Action::Special => self.special,
            Action::Block => self.block,
        }
    }

    pub fn set(&mut self, action: Action, held: bool) {
        let slot = match action {
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Jump => &mut self.jump,
            Action::Attack => &mut self.attack,
            Action::Special => &mut self.special,
            Action::Block => &mut self.block,
        };
        *slot = held;
    }

    /// Requested walking direction. Left wins when both are held.
    pub fn horizontal(&self) -> Option<Facing> {
        if self.left {
            Some(Facing::Left)
        } else if self.right {
            Some(Facing::Right)
        } else {
            None
        }
    }
}

/// Input state shared between the input collaborator and the tick loop.
///
/// Writers flip single actions; the tick loop copies both snapshots out
/// under one lock so a tick never sees a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    inner: Arc<Mutex<[InputSnapshot; 2]>>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, slot: PlayerSlot, action: Action, held: bool) {
        self.inner.lock()[slot.index()].set(action, held);
    }

    /// Copy of both players' snapshots, taken once per tick
    pub fn snapshot(&self) -> [InputSnapshot; 2] {
        *self.inner.lock()
    }

    /// Release every held action for both players
    pub fn clear(&self) {
        *self.inner.lock() = [InputSnapshot::default(); 2];
    }
}
