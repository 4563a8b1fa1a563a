//! Ultimate Fighter - simulation core for a two-player fighting game
//!
//! The core advances both fighters once per frame, resolves hits in both
//! directions, ages cosmetic effects and detects the knockout. Hosts feed
//! it live input snapshots and draw the world snapshots it broadcasts.

pub mod config;
pub mod game;
pub mod host;
pub mod util;
