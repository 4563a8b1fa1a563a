//! Game simulation modules

pub mod combat;
pub mod effects;
pub mod fighter;
pub mod input;
pub mod r#match;
pub mod physics;
pub mod snapshot;

pub use fighter::{Facing, Fighter, Phase, PlayerSlot};
pub use input::{Action, InputSnapshot, SharedInput};
pub use r#match::{GameMatch, LifecycleCommand, MatchHandle, MatchPhase, MatchState};
pub use snapshot::WorldSnapshot;
