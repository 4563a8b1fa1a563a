//! Line protocol between the host process and its front end.
//! One JSON object per line in each direction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::fighter::PlayerSlot;
use crate::game::snapshot::WorldSnapshot;

/// Messages read from the front end (stdin)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMsg {
    /// A raw key went down
    KeyDown { key: String },
    /// A raw key was released
    KeyUp { key: String },
    /// Leave the menu and start fighting
    Start,
    /// Fight again after a knockout
    Rematch,
    /// Shut the match down
    Quit,
}

/// Messages written to the front end (stdout)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// A round began from canonical positions
    MatchStarted {
        match_id: Uuid,
        /// Seed of the cosmetic particle RNG
        seed: u64,
        server_time: u64,
    },

    /// World state for one frame
    Snapshot(WorldSnapshot),

    /// A fighter was knocked out
    MatchEnd {
        winner: PlayerSlot,
        /// "Player 1" or "Player 2"
        winner_label: String,
        tick: u64,
    },

    /// Error message
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_messages_parse() {
        let down: HostMsg = serde_json::from_str(r#"{"type":"key_down","key":"ArrowLeft"}"#).unwrap();
        assert_eq!(
            down,
            HostMsg::KeyDown {
                key: "ArrowLeft".to_string()
            }
        );
        let start: HostMsg = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert_eq!(start, HostMsg::Start);
    }

    #[test]
    fn test_unknown_message_is_rejected() {
        assert!(serde_json::from_str::<HostMsg>(r#"{"type":"pause"}"#).is_err());
    }

    #[test]
    fn test_match_end_wire_shape() {
        let msg = ServerMsg::MatchEnd {
            winner: PlayerSlot::One,
            winner_label: "Player 1".to_string(),
            tick: 321,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "match_end");
        assert_eq!(value["winner"], "one");
        assert_eq!(value["winner_label"], "Player 1");
    }
}
