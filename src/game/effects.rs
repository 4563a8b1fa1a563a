//! Cosmetic particles and floating damage numbers.
//!
//! Nothing in here feeds back into the simulation; the tracker only ages
//! and prunes its collections. Drawing is a separate read-only pass over
//! [`EffectsTracker::particles`] and [`EffectsTracker::hit_effects`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::combat::HitOutcome;

/// Particles spawned per burst
pub const BURST_SIZE: usize = 8;
/// Maximum absolute spawn velocity per axis
pub const BURST_SPEED: f32 = 4.0;
/// Lifetime of particles and damage numbers, in ticks
pub const EFFECT_LIFETIME: u32 = 30;
/// Downward acceleration applied to particles each tick
pub const PARTICLE_GRAVITY: f32 = 0.3;
/// Rising speed of damage numbers
pub const DAMAGE_NUMBER_RISE: f32 = -2.0;
/// Damage numbers spawn this far below the defender's top edge
pub const DAMAGE_NUMBER_DROP: f32 = 20.0;

/// Particle colour, keyed by what produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleColor {
    /// Blocked hit
    Guard,
    /// Landed hit
    Impact,
}

impl ParticleColor {
    pub fn hex(self) -> &'static str {
        match self {
            ParticleColor::Guard => "#4a90e2",
            ParticleColor::Impact => "#ff4444",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub life: u32,
    pub color: ParticleColor,
}

/// Floating damage number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEffect {
    pub x: f32,
    pub y: f32,
    pub damage: u32,
    pub life: u32,
    pub vel_y: f32,
}

/// Fade factor in [0, 1] for an effect with `life` ticks left
pub fn fade(life: u32) -> f32 {
    (life as f32 / EFFECT_LIFETIME as f32).clamp(0.0, 1.0)
}

/// Live cosmetic effects for one match
#[derive(Debug, Clone, Default)]
pub struct EffectsTracker {
    particles: Vec<Particle>,
    hit_effects: Vec<HitEffect>,
}

impl EffectsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn hit_effects(&self) -> &[HitEffect] {
        &self.hit_effects
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.hit_effects.clear();
    }

    /// Spawn the effects for a resolved hit: a burst for every connection,
    /// plus a damage number when the hit landed.
    pub fn on_hit<R: Rng>(&mut self, outcome: &HitOutcome, defender_top: f32, rng: &mut R) {
        match *outcome {
            HitOutcome::Blocked {
                impact_x, impact_y, ..
            } => {
                self.spawn_burst(impact_x, impact_y, ParticleColor::Guard, rng);
            }
            HitOutcome::Landed {
                damage,
                impact_x,
                impact_y,
                ..
            } => {
                self.spawn_burst(impact_x, impact_y, ParticleColor::Impact, rng);
                self.spawn_damage_number(impact_x, defender_top + DAMAGE_NUMBER_DROP, damage);
            }
        }
    }

    pub fn spawn_burst<R: Rng>(&mut self, x: f32, y: f32, color: ParticleColor, rng: &mut R) {
        self.particles.extend((0..BURST_SIZE).map(|_| Particle {
            x,
            y,
            vel_x: rng.gen_range(-BURST_SPEED..BURST_SPEED),
            vel_y: rng.gen_range(-BURST_SPEED..BURST_SPEED),
            life: EFFECT_LIFETIME,
            color,
        }));
    }

    pub fn spawn_damage_number(&mut self, x: f32, y: f32, damage: f32) {
        self.hit_effects.push(HitEffect {
            x,
            y,
            damage: damage.max(0.0).floor() as u32,
            life: EFFECT_LIFETIME,
            vel_y: DAMAGE_NUMBER_RISE,
        });
    }

    /// Age every effect by one tick and drop the expired ones
    pub fn update(&mut self) {
        self.particles.retain_mut(|p| {
            p.x += p.vel_x;
            p.y += p.vel_y;
            p.vel_y += PARTICLE_GRAVITY;
            p.life = p.life.saturating_sub(1);
            p.life > 0
        });

        self.hit_effects.retain_mut(|e| {
            e.y += e.vel_y;
            e.life = e.life.saturating_sub(1);
            e.life > 0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_burst_spawns_eight_bounded_particles() {
        let mut effects = EffectsTracker::new();
        effects.spawn_burst(100.0, 200.0, ParticleColor::Impact, &mut rng());

        assert_eq!(effects.particles().len(), BURST_SIZE);
        for p in effects.particles() {
            assert_eq!((p.x, p.y, p.life), (100.0, 200.0, EFFECT_LIFETIME));
            assert!(p.vel_x.abs() <= BURST_SPEED);
            assert!(p.vel_y.abs() <= BURST_SPEED);
        }
    }

    #[test]
    fn test_landed_hit_spawns_burst_and_number() {
        let mut effects = EffectsTracker::new();
        let outcome = HitOutcome::Landed {
            damage: 8.0,
            combo: 1,
            impact_x: 230.0,
            impact_y: 445.0,
        };
        effects.on_hit(&outcome, 400.0, &mut rng());

        assert_eq!(effects.particles().len(), BURST_SIZE);
        assert!(effects
            .particles()
            .iter()
            .all(|p| p.color == ParticleColor::Impact));
        let number = &effects.hit_effects()[0];
        assert_eq!((number.x, number.y, number.damage), (230.0, 420.0, 8));
    }

    #[test]
    fn test_blocked_hit_spawns_guard_burst_only() {
        let mut effects = EffectsTracker::new();
        let outcome = HitOutcome::Blocked {
            damage: 2.4,
            impact_x: 230.0,
            impact_y: 445.0,
        };
        effects.on_hit(&outcome, 400.0, &mut rng());

        assert_eq!(effects.particles().len(), BURST_SIZE);
        assert!(effects
            .particles()
            .iter()
            .all(|p| p.color == ParticleColor::Guard));
        assert!(effects.hit_effects().is_empty());
    }

    #[test]
    fn test_particle_motion_per_tick() {
        let mut effects = EffectsTracker::new();
        effects.particles.push(Particle {
            x: 0.0,
            y: 0.0,
            vel_x: 2.0,
            vel_y: -1.0,
            life: 5,
            color: ParticleColor::Impact,
        });
        effects.update();

        let p = &effects.particles()[0];
        assert_eq!((p.x, p.y), (2.0, -1.0));
        assert!((p.vel_y - -0.7).abs() < 1e-6);
        assert_eq!(p.life, 4);
    }

    #[test]
    fn test_damage_number_rises() {
        let mut effects = EffectsTracker::new();
        effects.spawn_damage_number(10.0, 100.0, 20.0);
        effects.update();
        assert_eq!(effects.hit_effects()[0].y, 98.0);
        assert_eq!(effects.hit_effects()[0].life, EFFECT_LIFETIME - 1);
    }

    #[test]
    fn test_effects_expire_after_lifetime() {
        let mut effects = EffectsTracker::new();
        effects.spawn_burst(0.0, 0.0, ParticleColor::Guard, &mut rng());
        effects.spawn_damage_number(0.0, 0.0, 8.0);

        for _ in 0..EFFECT_LIFETIME - 1 {
            effects.update();
        }
        assert_eq!(effects.particles().len(), BURST_SIZE);
        assert_eq!(effects.hit_effects().len(), 1);

        effects.update();
        assert!(effects.particles().is_empty());
        assert!(effects.hit_effects().is_empty());
    }

    #[test]
    fn test_fade_scales_with_life() {
        assert_eq!(fade(EFFECT_LIFETIME), 1.0);
        assert_eq!(fade(15), 0.5);
        assert_eq!(fade(0), 0.0);
    }

    #[test]
    fn test_damage_number_floors() {
        let mut effects = EffectsTracker::new();
        effects.spawn_damage_number(0.0, 0.0, 2.4);
        assert_eq!(effects.hit_effects()[0].damage, 2);
    }
}
