//! Raw key names to logical actions

use std::collections::HashMap;

use crate::game::fighter::PlayerSlot;
use crate::game::input::Action;

/// Keyboard layout for both players. Key names are case-insensitive.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, (PlayerSlot, Action)>,
}

impl Keymap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `key` to an action, replacing any previous binding of that key
    pub fn bind(&mut self, key: &str, slot: PlayerSlot, action: Action) {
        self.bindings.insert(key.to_lowercase(), (slot, action));
    }

    pub fn resolve(&self, key: &str) -> Option<(PlayerSlot, Action)> {
        self.bindings.get(&key.to_lowercase()).copied()
    }

    /// Keys bound for one player, sorted by action order
    pub fn keys_for(&self, slot: PlayerSlot) -> Vec<(Action, &str)> {
        let mut keys: Vec<(Action, &str)> = self
            .bindings
            .iter()
            .filter(|(_, (bound, _))| *bound == slot)
            .map(|(key, (_, action))| (*action, key.as_str()))
            .collect();
        keys.sort_by_key(|(action, _)| Action::ALL.iter().position(|a| a == action));
        keys
    }
}

impl Default for Keymap {
    /// P1 on WASD plus Q/E, P2 on the arrows plus Shift/Enter
    fn default() -> Self {
        let mut keymap = Self::empty();
        let layouts = [
            (PlayerSlot::One, ["a", "d", "w", "s", "q", "e"]),
            (
                PlayerSlot::Two,
                ["arrowleft", "arrowright", "arrowup", "arrowdown", "shift", "enter"],
            ),
        ];
        for (slot, keys) in layouts {
            for (action, key) in Action::ALL.into_iter().zip(keys) {
                keymap.bind(key, slot, action);
            }
        }
        keymap
    }
}
