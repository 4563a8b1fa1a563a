//! Combatant state and the per-tick state machine

use serde::{Deserialize, Serialize};

use super::input::InputSnapshot;
use super::physics::{PhysicsSystem, Rect, Stage};

/// Basic attack cycle length in ticks
pub const ATTACK_FRAMES: u32 = 20;
/// Special attack cycle length in ticks
pub const SPECIAL_FRAMES: u32 = 30;
/// Charge consumed by one special
pub const SPECIAL_COST: f32 = 30.0;
/// Startup invincibility granted by a special
pub const SPECIAL_INVINCIBILITY: u32 = 10;
/// Passive special regeneration per tick
pub const SPECIAL_REGEN: f32 = 0.2;
/// Horizontal velocity multiplier while blocking
pub const BLOCK_DAMPING: f32 = 0.5;
/// Horizontal velocity multiplier with no direction held
pub const WALK_DAMPING: f32 = 0.85;
/// Below this speed a grounded fighter comes to rest
pub const REST_THRESHOLD: f32 = 0.5;
/// Ticks without a landed hit before the combo counter drops
pub const COMBO_WINDOW: u64 = 120;
/// Distance of each starting position from the stage center
pub const START_OFFSET: f32 = 300.0;

/// The two fixed combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }

    /// Display name used for the winner banner
    pub fn label(self) -> &'static str {
        match self {
            PlayerSlot::One => "Player 1",
            PlayerSlot::Two => "Player 2",
        }
    }
}

/// Direction a fighter looks and attacks toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Combat/movement mode; exactly one is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Jumping,
    Attacking,
    Special,
    Blocking,
    Hit,
}

impl Phase {
    /// Phases in which directional input is honoured
    pub fn accepts_movement(self) -> bool {
        matches!(self, Phase::Idle | Phase::Running | Phase::Jumping)
    }

    /// Phases that own an attack countdown
    pub fn is_attack(self) -> bool {
        matches!(self, Phase::Attacking | Phase::Special)
    }
}

/// Fixed per-fighter constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FighterStats {
    pub width: f32,
    pub height: f32,
    pub max_health: f32,
    pub speed: f32,
    /// Initial upward velocity of a jump (negative is up)
    pub jump_power: f32,
    pub max_special: f32,
}

impl Default for FighterStats {
    fn default() -> Self {
        Self {
            width: 60.0,
            height: 90.0,
            max_health: 100.0,
            speed: 6.0,
            jump_power: -15.0,
            max_special: 100.0,
        }
    }
}

/// One combatant's physical and combat state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub slot: PlayerSlot,
    pub stats: FighterStats,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub facing: Facing,
    pub grounded: bool,

    // Vitals. Health may dip below zero for the tick that ends the match.
    pub health: f32,
    pub special_charge: f32,

    // Combat phase
    pub phase: Phase,
    pub attack_frame: u32,
    pub invincible: u32,
    pub blocking: bool,

    // Combo bookkeeping
    pub combo: u32,
    pub last_hit_tick: u64,
}

impl Fighter {
    /// Canonical starting state. P1 starts left facing right, P2 mirrored.
    pub fn new(slot: PlayerSlot, stage: &Stage) -> Self {
        let stats = FighterStats::default();
        let (x, facing) = match slot {
            PlayerSlot::One => (stage.center_x() - START_OFFSET, Facing::Right),
            PlayerSlot::Two => (stage.center_x() + START_OFFSET, Facing::Left),
        };
        Self::spawn(slot, stats, x, facing)
    }

    fn spawn(slot: PlayerSlot, stats: FighterStats, x: f32, facing: Facing) -> Self {
        Self {
            slot,
            stats,
            x,
            y: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            facing,
            grounded: false,
            health: stats.max_health,
            special_charge: stats.max_special,
            phase: Phase::Idle,
            attack_frame: 0,
            invincible: 0,
            blocking: false,
            combo: 0,
            last_hit_tick: 0,
        }
    }

    /// Hurtbox as stored
    pub fn hurtbox(&self) -> Rect {
        Rect::new(self.x, self.y, self.stats.width, self.stats.height)
    }

    pub fn center(&self) -> (f32, f32) {
        self.hurtbox().center()
    }

    pub fn is_knocked_out(&self) -> bool {
        self.health <= 0.0
    }

    /// Phase to fall back to once an action finishes
    fn resting_phase(&self) -> Phase {
        if self.grounded {
            Phase::Idle
        } else {
            Phase::Jumping
        }
    }

    /// Advance this fighter by one tick.
    ///
    /// Impossible or conflicting input is ignored rather than rejected:
    /// block suppresses jump and attacks, and left beats right.
    pub fn advance(&mut self, input: &InputSnapshot, tick: u64, stage: &Stage) {
        // Invincibility; hit stun lasts as long as the post-hit window
        if self.invincible > 0 {
            self.invincible -= 1;
            if self.invincible == 0 && self.phase == Phase::Hit {
                self.phase = self.resting_phase();
            }
        }

        // Blocking
        if input.block && self.grounded {
            self.blocking = true;
            self.phase = Phase::Blocking;
            self.attack_frame = 0;
            self.vel_x *= BLOCK_DAMPING;
        } else {
            self.blocking = false;
            if self.phase == Phase::Blocking {
                self.phase = self.resting_phase();
            }
        }

        // Movement
        if self.phase.accepts_movement() {
            match input.horizontal() {
                Some(direction) => {
                    self.vel_x = direction.sign() * self.stats.speed;
                    self.facing = direction;
                    if self.grounded {
                        self.phase = Phase::Running;
                    }
                }
                None => {
                    self.vel_x *= WALK_DAMPING;
                    if self.grounded && self.vel_x.abs() < REST_THRESHOLD {
                        self.phase = Phase::Idle;
                        self.vel_x = 0.0;
                    }
                }
            }
        }

        // Jump; an attack in progress keeps its phase and falls back to
        // jumping when its countdown ends
        if input.jump && self.grounded && !self.blocking {
            self.vel_y = self.stats.jump_power;
            self.grounded = false;
            if !self.phase.is_attack() {
                self.phase = Phase::Jumping;
            }
        }

        // Basic attack
        if input.attack && self.attack_frame == 0 && !self.blocking {
            self.phase = Phase::Attacking;
            self.attack_frame = ATTACK_FRAMES;
        }

        // Special attack
        if input.special && self.special_charge >= SPECIAL_COST && !self.blocking {
            self.phase = Phase::Special;
            self.attack_frame = SPECIAL_FRAMES;
            self.special_charge -= SPECIAL_COST;
            self.invincible = SPECIAL_INVINCIBILITY;
        }

        // Attack countdown
        if self.attack_frame > 0 {
            self.attack_frame -= 1;
            if self.attack_frame == 0 && self.phase.is_attack() {
                self.phase = self.resting_phase();
            }
        }

        // Gravity and position
        let (x, y, vel_y) =
            PhysicsSystem::integrate(self.x, self.y, self.vel_x, self.vel_y, stage.gravity);
        self.x = x;

        // Ground collision
        let contact = PhysicsSystem::ground_clamp(y, vel_y, stage.ground_level);
        self.y = contact.y;
        self.vel_y = contact.vel_y;
        self.grounded = contact.grounded;
        if self.grounded && self.phase == Phase::Jumping {
            self.phase = Phase::Idle;
        }

        // Boundaries
        self.x = PhysicsSystem::clamp_to_stage(self.x, self.stats.width, stage);

        // Recharge special
        if self.special_charge < self.stats.max_special {
            self.special_charge = (self.special_charge + SPECIAL_REGEN).min(self.stats.max_special);
        }

        // Combo timeout
        if tick.saturating_sub(self.last_hit_tick) > COMBO_WINDOW {
            self.combo = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::Action;

    fn stage() -> Stage {
        Stage::default()
    }

    /// Fighter already standing on the floor
    fn standing(slot: PlayerSlot) -> Fighter {
        let mut fighter = Fighter::new(slot, &stage());
        fighter.y = stage().ground_level;
        fighter.grounded = true;
        fighter
    }

    fn hold(actions: &[Action]) -> InputSnapshot {
        InputSnapshot::holding(actions)
    }

    #[test]
    fn test_canonical_start_is_mirrored() {
        let p1 = Fighter::new(PlayerSlot::One, &stage());
        let p2 = Fighter::new(PlayerSlot::Two, &stage());
        assert_eq!((p1.x, p1.facing), (100.0, Facing::Right));
        assert_eq!((p2.x, p2.facing), (700.0, Facing::Left));
        for fighter in [&p1, &p2] {
            assert_eq!(fighter.health, 100.0);
            assert_eq!(fighter.special_charge, 100.0);
            assert_eq!(fighter.phase, Phase::Idle);
            assert!(!fighter.grounded);
        }
    }

    #[test]
    fn test_fighter_drops_onto_ground() {
        let mut fighter = Fighter::new(PlayerSlot::One, &stage());
        for tick in 1..=40 {
            fighter.advance(&InputSnapshot::default(), tick, &stage());
        }
        assert!(fighter.grounded);
        assert_eq!(fighter.y, 400.0);
        assert_eq!(fighter.vel_y, 0.0);
    }

    #[test]
    fn test_ground_clamp_is_idempotent() {
        let mut fighter = standing(PlayerSlot::One);
        for tick in 1..=10 {
            fighter.advance(&InputSnapshot::default(), tick, &stage());
            assert_eq!(fighter.y, 400.0);
            assert_eq!(fighter.vel_y, 0.0);
            assert!(fighter.grounded);
        }
    }

    #[test]
    fn test_running_then_coasting_to_rest() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Right]), 1, &stage());
        assert_eq!(fighter.vel_x, 6.0);
        assert_eq!(fighter.facing, Facing::Right);
        assert_eq!(fighter.phase, Phase::Running);
        assert_eq!(fighter.x, 106.0);

        fighter.advance(&InputSnapshot::default(), 2, &stage());
        assert!((fighter.vel_x - 5.1).abs() < 1e-4);
        assert_eq!(fighter.phase, Phase::Running);

        for tick in 3..40 {
            fighter.advance(&InputSnapshot::default(), tick, &stage());
        }
        assert_eq!(fighter.vel_x, 0.0);
        assert_eq!(fighter.phase, Phase::Idle);
    }

    #[test]
    fn test_left_beats_right() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Left, Action::Right]), 1, &stage());
        assert_eq!(fighter.vel_x, -6.0);
        assert_eq!(fighter.facing, Facing::Left);
    }

    #[test]
    fn test_walls_clamp_position() {
        let mut fighter = standing(PlayerSlot::One);
        for tick in 1..100 {
            fighter.advance(&hold(&[Action::Left]), tick, &stage());
        }
        assert_eq!(fighter.x, 10.0);

        let mut fighter = standing(PlayerSlot::Two);
        for tick in 1..100 {
            fighter.advance(&hold(&[Action::Right]), tick, &stage());
        }
        assert_eq!(fighter.x, 730.0);
    }

    #[test]
    fn test_jump_leaves_ground_and_lands_idle() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Jump]), 1, &stage());
        assert_eq!(fighter.phase, Phase::Jumping);
        assert!(!fighter.grounded);
        assert!(fighter.y < 400.0);

        let mut tick = 2;
        while !fighter.grounded {
            fighter.advance(&InputSnapshot::default(), tick, &stage());
            tick += 1;
            assert!(tick < 100, "fighter never landed");
        }
        assert_eq!(fighter.phase, Phase::Idle);
        assert_eq!(fighter.y, 400.0);
    }

    #[test]
    fn test_block_dampens_and_suppresses_actions() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.vel_x = 4.0;
        fighter.advance(
            &hold(&[Action::Block, Action::Jump, Action::Attack, Action::Special, Action::Right]),
            1,
            &stage(),
        );
        assert!(fighter.blocking);
        assert_eq!(fighter.phase, Phase::Blocking);
        assert_eq!(fighter.vel_x, 2.0);
        assert_eq!(fighter.attack_frame, 0);
        assert_eq!(fighter.special_charge, 100.0);
        assert!(fighter.grounded);
    }

    #[test]
    fn test_block_requires_ground() {
        let mut fighter = Fighter::new(PlayerSlot::One, &stage());
        fighter.advance(&hold(&[Action::Block]), 1, &stage());
        assert!(!fighter.blocking);
        assert_ne!(fighter.phase, Phase::Blocking);
    }

    #[test]
    fn test_releasing_block_returns_to_idle() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Block]), 1, &stage());
        fighter.advance(&hold(&[Action::Right]), 2, &stage());
        assert!(!fighter.blocking);
        assert_eq!(fighter.phase, Phase::Running);
    }

    #[test]
    fn test_block_cancels_attack_in_progress() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Attack]), 1, &stage());
        assert_eq!(fighter.attack_frame, 19);
        fighter.advance(&hold(&[Action::Block]), 2, &stage());
        assert_eq!(fighter.attack_frame, 0);
        assert_eq!(fighter.phase, Phase::Blocking);
    }

    #[test]
    fn test_attack_cycle_counts_down_to_idle() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Attack]), 1, &stage());
        assert_eq!(fighter.phase, Phase::Attacking);
        assert_eq!(fighter.attack_frame, ATTACK_FRAMES - 1);

        for tick in 2..=20 {
            fighter.advance(&InputSnapshot::default(), tick, &stage());
            if fighter.attack_frame > 0 {
                assert!(fighter.phase.is_attack());
            }
        }
        assert_eq!(fighter.attack_frame, 0);
        assert_eq!(fighter.phase, Phase::Idle);
    }

    #[test]
    fn test_jump_mid_attack_keeps_attack_phase() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Attack]), 1, &stage());
        fighter.advance(&hold(&[Action::Jump]), 2, &stage());

        assert!(!fighter.grounded);
        assert_eq!(fighter.phase, Phase::Attacking);
        assert_eq!(fighter.attack_frame, ATTACK_FRAMES - 2);

        let mut tick = 3;
        while fighter.attack_frame > 0 {
            fighter.advance(&InputSnapshot::default(), tick, &stage());
            if fighter.attack_frame > 0 {
                assert_eq!(fighter.phase, Phase::Attacking);
            }
            tick += 1;
        }
        // Countdown ran out mid-air
        assert!(!fighter.grounded);
        assert_eq!(fighter.phase, Phase::Jumping);
    }

    #[test]
    fn test_attack_not_restarted_mid_cycle() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Attack]), 1, &stage());
        fighter.advance(&hold(&[Action::Attack]), 2, &stage());
        assert_eq!(fighter.attack_frame, ATTACK_FRAMES - 2);
    }

    #[test]
    fn test_special_spends_charge_then_regenerates() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.advance(&hold(&[Action::Special]), 1, &stage());
        assert_eq!(fighter.phase, Phase::Special);
        assert_eq!(fighter.attack_frame, SPECIAL_FRAMES - 1);
        assert_eq!(fighter.invincible, SPECIAL_INVINCIBILITY);
        assert!((fighter.special_charge - 70.2).abs() < 1e-4);

        fighter.advance(&InputSnapshot::default(), 2, &stage());
        assert!((fighter.special_charge - 70.4).abs() < 1e-4);
    }

    #[test]
    fn test_special_needs_enough_charge() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.special_charge = 29.0;
        fighter.advance(&hold(&[Action::Special]), 1, &stage());
        assert_ne!(fighter.phase, Phase::Special);
        assert_eq!(fighter.attack_frame, 0);
        assert!((fighter.special_charge - 29.2).abs() < 1e-4);
    }

    #[test]
    fn test_special_charge_stays_in_bounds() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.special_charge = 0.0;
        for tick in 1..=1000 {
            let input = if tick % 97 == 0 {
                hold(&[Action::Special])
            } else {
                InputSnapshot::default()
            };
            fighter.advance(&input, tick, &stage());
            assert!(fighter.special_charge >= 0.0);
            assert!(fighter.special_charge <= fighter.stats.max_special);
        }
    }

    #[test]
    fn test_combo_resets_after_window() {
        let mut fighter = standing(PlayerSlot::One);
        fighter.combo = 3;
        fighter.last_hit_tick = 10;

        fighter.advance(&InputSnapshot::default(), 130, &stage());
        assert_eq!(fighter.combo, 3);

        fighter.advance(&InputSnapshot::default(), 131, &stage());
        assert_eq!(fighter.combo, 0);
    }

    #[test]
    fn test_hit_stun_ends_with_invincibility() {
        let mut fighter = standing(PlayerSlot::Two);
        fighter.phase = Phase::Hit;
        fighter.invincible = 2;

        fighter.advance(&hold(&[Action::Left]), 1, &stage());
        assert_eq!(fighter.phase, Phase::Hit);
        assert_eq!(fighter.vel_x, 0.0);

        fighter.advance(&InputSnapshot::default(), 2, &stage());
        assert_eq!(fighter.invincible, 0);
        assert_eq!(fighter.phase, Phase::Idle);
    }
}
