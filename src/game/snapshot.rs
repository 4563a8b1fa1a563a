//! Snapshot building for the render collaborator

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::effects::{fade, HitEffect, Particle, ParticleColor};
use super::fighter::{Facing, Fighter, Phase, PlayerSlot};
use super::physics::{Rect, Stage};
use super::r#match::{MatchEvent, MatchPhase, MatchState};

/// Health at or below which the bar turns red
pub const LOW_HEALTH: f32 = 30.0;
/// Edge length of a drawn particle
pub const PARTICLE_SIZE: f32 = 4.0;

/// Builds world snapshots at a fixed tick interval
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    /// Events not yet delivered in a snapshot
    pending_events: Vec<MatchEvent>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            pending_events: Vec::new(),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Queue events for the next snapshot
    pub fn record(&mut self, events: Vec<MatchEvent>) {
        self.pending_events.extend(events);
    }

    /// Drop queued events (a new round is starting)
    pub fn reset(&mut self) {
        self.pending_events.clear();
        self.ticks_since_snapshot = 0;
    }

    /// Build a snapshot of the match, draining queued events
    pub fn build(&mut self, state: &MatchState) -> WorldSnapshot {
        WorldSnapshot {
            match_id: state.id,
            tick: state.tick,
            phase: state.phase,
            winner: state.winner,
            stage: state.stage,
            fighters: [
                FighterView::from_fighter(&state.player1),
                FighterView::from_fighter(&state.player2),
            ],
            particles: state
                .effects
                .particles()
                .iter()
                .map(ParticleView::from_particle)
                .collect(),
            hit_effects: state
                .effects
                .hit_effects()
                .iter()
                .map(HitEffectView::from_hit_effect)
                .collect(),
            events: std::mem::take(&mut self.pending_events),
        }
    }
}

/// Read-only view of the whole match for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub match_id: Uuid,
    pub tick: u64,
    pub phase: MatchPhase,
    pub winner: Option<PlayerSlot>,
    pub stage: Stage,
    pub fighters: [FighterView; 2],
    pub particles: Vec<ParticleView>,
    pub hit_effects: Vec<HitEffectView>,
    pub events: Vec<MatchEvent>,
}

impl WorldSnapshot {
    pub fn fighter(&self, slot: PlayerSlot) -> &FighterView {
        &self.fighters[slot.index()]
    }
}

/// Shape of a drawn attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackVisualKind {
    /// Basic attack swipe
    Swipe,
    /// Special attack beam with energy rings
    Beam,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackVisual {
    pub kind: AttackVisualKind,
    pub rect: Rect,
}

/// Fighter state plus derived drawing hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterView {
    pub slot: PlayerSlot,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub facing: Facing,
    pub grounded: bool,
    pub phase: Phase,
    /// Health clamped at zero
    pub health: f32,
    pub max_health: f32,
    /// Health bar fill in [0, 1]
    pub health_ratio: f32,
    pub low_health: bool,
    pub special_charge: f32,
    pub max_special: f32,
    /// Special bar fill in [0, 1]
    pub special_ratio: f32,
    pub attack_frame: u32,
    pub invincible: u32,
    pub blocking: bool,
    pub combo: u32,
    /// Drawn at half opacity this frame
    pub flashing: bool,
    pub combo_banner: Option<String>,
    pub attack_visual: Option<AttackVisual>,
}

impl FighterView {
    pub fn from_fighter(fighter: &Fighter) -> Self {
        let stats = fighter.stats;
        let health = fighter.health.max(0.0);
        let special_charge = fighter.special_charge.clamp(0.0, stats.max_special);

        Self {
            slot: fighter.slot,
            x: fighter.x,
            y: fighter.y,
            width: stats.width,
            height: stats.height,
            vel_x: fighter.vel_x,
            vel_y: fighter.vel_y,
            facing: fighter.facing,
            grounded: fighter.grounded,
            phase: fighter.phase,
            health,
            max_health: stats.max_health,
            health_ratio: ratio(health, stats.max_health),
            low_health: health <= LOW_HEALTH,
            special_charge,
            max_special: stats.max_special,
            special_ratio: ratio(special_charge, stats.max_special),
            attack_frame: fighter.attack_frame,
            invincible: fighter.invincible,
            blocking: fighter.blocking,
            combo: fighter.combo,
            flashing: fighter.invincible > 0 && fighter.invincible % 4 < 2,
            combo_banner: (fighter.combo > 1).then(|| format!("{}x COMBO!", fighter.combo)),
            attack_visual: attack_visual(fighter),
        }
    }
}

fn ratio(value: f32, max: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

fn attack_visual(fighter: &Fighter) -> Option<AttackVisual> {
    let in_front = |reach: f32| match fighter.facing {
        Facing::Right => fighter.x + fighter.stats.width,
        Facing::Left => fighter.x - reach,
    };

    match fighter.phase {
        Phase::Attacking if fighter.attack_frame > 10 => Some(AttackVisual {
            kind: AttackVisualKind::Swipe,
            rect: Rect::new(in_front(80.0), fighter.y + 20.0, 80.0, 40.0),
        }),
        Phase::Special if fighter.attack_frame > 15 => Some(AttackVisual {
            kind: AttackVisualKind::Beam,
            rect: Rect::new(in_front(120.0), fighter.y, 120.0, fighter.stats.height),
        }),
        Phase::Idle
        | Phase::Running
        | Phase::Jumping
        | Phase::Attacking
        | Phase::Special
        | Phase::Blocking
        | Phase::Hit => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleView {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: ParticleColor,
    pub alpha: f32,
}

impl ParticleView {
    fn from_particle(particle: &Particle) -> Self {
        Self {
            x: particle.x,
            y: particle.y,
            size: PARTICLE_SIZE,
            color: particle.color,
            alpha: fade(particle.life),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEffectView {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub alpha: f32,
}

impl HitEffectView {
    fn from_hit_effect(effect: &HitEffect) -> Self {
        Self {
            x: effect.x,
            y: effect.y,
            text: format!("-{}", effect.damage),
            alpha: fade(effect.life),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> Fighter {
        Fighter::new(PlayerSlot::One, &Stage::default())
    }

    #[test]
    fn test_interval_gates_snapshots() {
        let mut builder = SnapshotBuilder::new(3);
        let sent: Vec<bool> = (0..6).map(|_| builder.should_send()).collect();
        assert_eq!(sent, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_force_next_sends_immediately() {
        let mut builder = SnapshotBuilder::new(10);
        builder.should_send();
        builder.force_next();
        assert!(builder.should_send());
    }

    #[test]
    fn test_view_clamps_vitals() {
        let mut f = fighter();
        f.health = -4.0;
        f.special_charge = 100.00001;
        let view = FighterView::from_fighter(&f);
        assert_eq!(view.health, 0.0);
        assert_eq!(view.health_ratio, 0.0);
        assert!(view.low_health);
        assert_eq!(view.special_ratio, 1.0);
    }

    #[test]
    fn test_combo_banner_from_two_hits() {
        let mut f = fighter();
        f.combo = 1;
        assert_eq!(FighterView::from_fighter(&f).combo_banner, None);
        f.combo = 3;
        assert_eq!(
            FighterView::from_fighter(&f).combo_banner.as_deref(),
            Some("3x COMBO!")
        );
    }

    #[test]
    fn test_invincibility_flash_pattern() {
        let mut f = fighter();
        let flashes: Vec<bool> = (0..6)
            .map(|frames| {
                f.invincible = frames;
                FighterView::from_fighter(&f).flashing
            })
            .collect();
        assert_eq!(flashes, vec![false, true, false, false, true, true]);
    }

    #[test]
    fn test_attack_visuals_follow_phase() {
        let mut f = fighter();
        f.phase = Phase::Attacking;
        f.attack_frame = 11;
        let swipe = FighterView::from_fighter(&f).attack_visual.expect("swipe");
        assert_eq!(swipe.kind, AttackVisualKind::Swipe);
        assert_eq!(swipe.rect, Rect::new(160.0, 20.0, 80.0, 40.0));

        f.attack_frame = 10;
        assert!(FighterView::from_fighter(&f).attack_visual.is_none());

        f.phase = Phase::Special;
        f.attack_frame = 20;
        f.facing = Facing::Left;
        let beam = FighterView::from_fighter(&f).attack_visual.expect("beam");
        assert_eq!(beam.kind, AttackVisualKind::Beam);
        assert_eq!(beam.rect, Rect::new(-20.0, 0.0, 120.0, 90.0));
    }

    #[test]
    fn test_hit_effect_text() {
        let view = HitEffectView::from_hit_effect(&HitEffect {
            x: 0.0,
            y: 0.0,
            damage: 8,
            life: 15,
            vel_y: -2.0,
        });
        assert_eq!(view.text, "-8");
        assert_eq!(view.alpha, 0.5);
    }
}
