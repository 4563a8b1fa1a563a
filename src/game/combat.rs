//! Combat system - attack windows, hit detection, blocking and knockback

use serde::{Deserialize, Serialize};

use super::fighter::{Facing, Fighter, Phase};
use super::physics::Rect;

/// Fraction of damage that gets through a guarded block
pub const BLOCK_CHIP_RATIO: f32 = 0.3;
/// Horizontal knockback speed of a landed hit
pub const KNOCKBACK_SPEED: f32 = 8.0;
/// Upward pop of a landed hit
pub const KNOCKBACK_LIFT: f32 = -5.0;
/// Invincibility granted to the defender after a landed hit
pub const HIT_INVINCIBILITY: u32 = 20;
/// Number of attack frames after `hit_frame` that are still live
pub const ACTIVE_FRAMES: u32 = 5;

/// Damage, reach and timing of an attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub damage: f32,
    pub range: f32,
    /// Lowest attack frame at which the hitbox is live
    pub hit_frame: u32,
}

impl AttackProfile {
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Attacking => Self {
                damage: 8.0,
                range: 80.0,
                hit_frame: 15,
            },
            Phase::Special => Self {
                damage: 20.0,
                range: 120.0,
                hit_frame: 20,
            },
            Phase::Idle
            | Phase::Running
            | Phase::Jumping
            | Phase::Blocking
            | Phase::Hit => Self {
                damage: 0.0,
                range: 80.0,
                hit_frame: 10,
            },
        }
    }

    /// Active window, inclusive on both ends
    pub fn is_live(&self, attack_frame: u32) -> bool {
        (self.hit_frame..=self.hit_frame + ACTIVE_FRAMES).contains(&attack_frame)
    }

    /// Attack box extending from the attacker toward its facing side
    pub fn hitbox(&self, attacker: &Fighter) -> Rect {
        let x = match attacker.facing {
            Facing::Right => attacker.x + attacker.stats.width,
            Facing::Left => attacker.x - self.range,
        };
        Rect::new(x, attacker.y, self.range, attacker.stats.height)
    }
}

/// What a connecting attack did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitOutcome {
    /// Defender took full damage, knockback and hit stun
    Landed {
        damage: f32,
        /// Attacker's combo count after this hit
        combo: u32,
        impact_x: f32,
        impact_y: f32,
    },
    /// Defender's block covered the attacker's side; chip damage only
    Blocked {
        damage: f32,
        impact_x: f32,
        impact_y: f32,
    },
}

impl HitOutcome {
    pub fn damage(&self) -> f32 {
        match self {
            HitOutcome::Landed { damage, .. } | HitOutcome::Blocked { damage, .. } => *damage,
        }
    }
}

/// An attack whose hitbox is live this tick, captured before any
/// direction of combat is applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveAttack {
    pub profile: AttackProfile,
    pub hitbox: Rect,
    pub facing: Facing,
    pub origin_x: f32,
}

impl ActiveAttack {
    pub fn of(attacker: &Fighter) -> Option<Self> {
        if attacker.attack_frame == 0 {
            return None;
        }

        let profile = AttackProfile::for_phase(attacker.phase);
        if !profile.is_live(attacker.attack_frame) {
            return None;
        }

        Some(Self {
            profile,
            hitbox: profile.hitbox(attacker),
            facing: attacker.facing,
            origin_x: attacker.x,
        })
    }
}

/// Combat system for resolving attacks between the two fighters
pub struct CombatSystem;

impl CombatSystem {
    /// Resolve one direction of combat for this tick.
    ///
    /// Returns `None` when nothing connected. On a connection the defender
    /// (and on a landed hit, the attacker's combo bookkeeping) is updated.
    pub fn resolve(attacker: &mut Fighter, defender: &mut Fighter, tick: u64) -> Option<HitOutcome> {
        let attack = ActiveAttack::of(attacker)?;
        Self::apply(&attack, attacker, defender, tick)
    }

    /// Apply a previously captured attack to the defender
    pub fn apply(
        attack: &ActiveAttack,
        attacker: &mut Fighter,
        defender: &mut Fighter,
        tick: u64,
    ) -> Option<HitOutcome> {
        if defender.invincible > 0 || !attack.hitbox.overlaps(&defender.hurtbox()) {
            return None;
        }

        let (impact_x, impact_y) = defender.center();

        if defender.blocking && Self::guards(defender, attack.origin_x) {
            let damage = Self::calculate_damage(attack.profile.damage, BLOCK_CHIP_RATIO);
            defender.health -= damage;
            return Some(HitOutcome::Blocked {
                damage,
                impact_x,
                impact_y,
            });
        }

        let damage = attack.profile.damage;
        defender.health -= damage;
        defender.vel_x = attack.facing.sign() * KNOCKBACK_SPEED;
        defender.vel_y = KNOCKBACK_LIFT;
        defender.phase = Phase::Hit;
        defender.attack_frame = 0;
        defender.blocking = false;
        defender.invincible = HIT_INVINCIBILITY;

        attacker.combo += 1;
        attacker.last_hit_tick = tick;

        Some(HitOutcome::Landed {
            damage,
            combo: attacker.combo,
            impact_x,
            impact_y,
        })
    }

    /// Whether a block held by `defender` covers an attacker standing at
    /// `attacker_x`: facing right guards the left side, facing left guards
    /// the right side
    pub fn guards(defender: &Fighter, attacker_x: f32) -> bool {
        match defender.facing {
            Facing::Right => attacker_x < defender.x,
            Facing::Left => attacker_x > defender.x,
        }
    }

    /// Scale base damage by a mitigation modifier
    pub fn calculate_damage(base_damage: f32, modifier: f32) -> f32 {
        base_damage * modifier
    }
}
