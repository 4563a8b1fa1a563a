//! Stage geometry, gravity integration and collision tests

use serde::{Deserialize, Serialize};

/// Stage dimensions and world constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Canvas width
    pub width: f32,
    /// Canvas height
    pub height: f32,
    /// Fighter top-edge y when standing on the floor
    pub ground_level: f32,
    /// Horizontal clearance kept from each wall
    pub margin: f32,
    /// Downward acceleration per tick
    pub gravity: f32,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            ground_level: 400.0,
            margin: 10.0,
            gravity: 0.8,
        }
    }
}

impl Stage {
    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }
}

/// Axis-aligned rectangle (x, y is the top-left corner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict overlap; rectangles that only share an edge do not touch
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Result of clamping a body against the floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub y: f32,
    pub vel_y: f32,
    pub grounded: bool,
}

/// Physics system for fighter bodies
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Apply gravity, then move by velocity on both axes.
    /// Returns (new_x, new_y, new_vel_y)
    pub fn integrate(x: f32, y: f32, vel_x: f32, vel_y: f32, gravity: f32) -> (f32, f32, f32) {
        let new_vel_y = vel_y + gravity;
        (x + vel_x, y + new_vel_y, new_vel_y)
    }

    /// Snap a body that reached the floor back onto it
    pub fn ground_clamp(y: f32, vel_y: f32, ground_level: f32) -> GroundContact {
        if y >= ground_level {
            GroundContact {
                y: ground_level,
                vel_y: 0.0,
                grounded: true,
            }
        } else {
            GroundContact {
                y,
                vel_y,
                grounded: false,
            }
        }
    }

    /// Keep a body of `width` inside the stage walls
    pub fn clamp_to_stage(x: f32, width: f32, stage: &Stage) -> f32 {
        let max_x = stage.width - width - stage.margin;
        x.min(max_x).max(stage.margin)
    }
}
