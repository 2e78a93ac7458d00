/// Pure catch-game rules.
///
/// Every public function takes an immutable reference to the current
/// `MatchState` (and, where needed, an RNG handle) and returns a brand-new
/// value.  Timers and phase transitions live in the controller; this module
/// only knows arithmetic.

use rand::Rng;

use crate::config::Tuning;
use crate::entities::{
    ColorTag, Effect, ItemKind, MatchState, Millis, Particle, ParticleId, Phase, Playfield,
    PowerUps,
};

// ── Difficulty ramp ──────────────────────────────────────────────────────────

/// Fraction of the match budget already spent, clamped to [0, 1].
/// A time bonus can push `time_remaining` above the budget.
pub fn progress(tuning: &Tuning, time_remaining: u32) -> f32 {
    if tuning.match_secs == 0 {
        return 1.0;
    }
    (1.0 - time_remaining as f32 / tuning.match_secs as f32).clamp(0.0, 1.0)
}

fn ramp(start: Millis, floor: Millis, progress: f32) -> Millis {
    let span = start.saturating_sub(floor) as f32;
    let value = start as f32 - span * progress;
    (value.round() as Millis).max(floor)
}

/// How long a freshly spawned item takes to reach the bottom.
pub fn fall_duration_ms(tuning: &Tuning, time_remaining: u32) -> Millis {
    ramp(
        tuning.fall_start_ms,
        tuning.fall_floor_ms,
        progress(tuning, time_remaining),
    )
}

/// Delay until the next spawn.
pub fn spawn_delay_ms(tuning: &Tuning, time_remaining: u32) -> Millis {
    ramp(
        tuning.spawn_delay_start_ms,
        tuning.spawn_delay_floor_ms,
        progress(tuning, time_remaining),
    )
}

/// Left edge for a new item, keeping the whole item inside the playfield.
pub fn spawn_x(playfield: &Playfield, tuning: &Tuning, rng: &mut impl Rng) -> f32 {
    let max_x = (playfield.width - tuning.item_width).max(0.0);
    if max_x <= 0.0 {
        return 0.0;
    }
    rng.gen_range(0.0..max_x)
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Idle state shown before the first match.
pub fn menu_state(tuning: &Tuning, high_score: u32) -> MatchState {
    MatchState {
        phase: Phase::Menu,
        ..init_state(tuning, high_score)
    }
}

/// Fresh state for a match that is about to start.
pub fn init_state(tuning: &Tuning, high_score: u32) -> MatchState {
    MatchState {
        phase: Phase::Playing,
        score: 0,
        time_remaining: tuning.match_secs,
        combo: 0,
        fever_active: false,
        power_ups: PowerUps::default(),
        consecutive_good_catches: 0,
        high_score,
        items: Vec::new(),
        particles: Vec::new(),
        reward_claimed: false,
    }
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Result of resolving one catch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatchOutcome {
    /// Points actually applied (after the fever multiplier).
    Scored { points: i32 },
    MatchEnded,
    MagnetCharged,
    TimeExtended,
    /// Time bonus already spent this match.
    NoEffect,
}

impl CatchOutcome {
    pub fn color(&self) -> Option<ColorTag> {
        match self {
            CatchOutcome::Scored { points } if *points > 10 => Some(ColorTag::Gold),
            CatchOutcome::Scored { points } if *points > 0 => Some(ColorTag::Pink),
            CatchOutcome::Scored { .. } => Some(ColorTag::Grey),
            CatchOutcome::MatchEnded => Some(ColorTag::Red),
            CatchOutcome::MagnetCharged => Some(ColorTag::Violet),
            CatchOutcome::TimeExtended => Some(ColorTag::Amber),
            CatchOutcome::NoEffect => None,
        }
    }
}

/// `score + delta`, floored at zero.
pub fn apply_points(score: u32, delta: i32) -> u32 {
    (score as i64 + delta as i64).clamp(0, u32::MAX as i64) as u32
}

/// Resolve the scoring effect of catching an item of `kind`.  The fatal
/// kind resets the streaks here; the phase change belongs to the caller.
pub fn score_catch(
    state: &MatchState,
    kind: ItemKind,
    tuning: &Tuning,
) -> (MatchState, CatchOutcome) {
    match kind.effect() {
        Effect::EndMatch => (
            MatchState {
                combo: 0,
                consecutive_good_catches: 0,
                ..state.clone()
            },
            CatchOutcome::MatchEnded,
        ),
        Effect::MagnetCharge => (
            MatchState {
                power_ups: PowerUps {
                    magnet_charges: state.power_ups.magnet_charges + 1,
                    ..state.power_ups.clone()
                },
                consecutive_good_catches: state.consecutive_good_catches + 1,
                ..state.clone()
            },
            CatchOutcome::MagnetCharged,
        ),
        Effect::ExtraTime => {
            if state.power_ups.time_extend_used {
                return (state.clone(), CatchOutcome::NoEffect);
            }
            (
                MatchState {
                    time_remaining: state.time_remaining + tuning.time_bonus_secs,
                    power_ups: PowerUps {
                        time_extend_used: true,
                        ..state.power_ups.clone()
                    },
                    consecutive_good_catches: state.consecutive_good_catches + 1,
                    ..state.clone()
                },
                CatchOutcome::TimeExtended,
            )
        }
        Effect::Points(nominal) => {
            if nominal > 0 {
                let points = if state.fever_active { nominal * 2 } else { nominal };
                (
                    MatchState {
                        score: apply_points(state.score, points),
                        combo: state.combo + 1,
                        consecutive_good_catches: state.consecutive_good_catches + 1,
                        ..state.clone()
                    },
                    CatchOutcome::Scored { points },
                )
            } else {
                (
                    MatchState {
                        score: apply_points(state.score, nominal),
                        combo: 0,
                        consecutive_good_catches: 0,
                        ..state.clone()
                    },
                    CatchOutcome::Scored { points: nominal },
                )
            }
        }
    }
}

// ── Fever ────────────────────────────────────────────────────────────────────

/// True when the streak has reached the trigger and fever is not running.
pub fn fever_due(state: &MatchState, tuning: &Tuning) -> bool {
    !state.fever_active && state.consecutive_good_catches >= tuning.fever_streak
}

pub fn start_fever(state: &MatchState) -> MatchState {
    MatchState {
        fever_active: true,
        ..state.clone()
    }
}

/// Fever window over: multiplier off and the streak starts again from zero.
pub fn end_fever(state: &MatchState) -> MatchState {
    MatchState {
        fever_active: false,
        consecutive_good_catches: 0,
        ..state.clone()
    }
}

// ── Particles ────────────────────────────────────────────────────────────────

/// A ring of particles around `(x, y)`, evenly spaced in angle.
pub fn particle_burst(
    first_id: ParticleId,
    x: f32,
    y: f32,
    color: ColorTag,
    count: u32,
    now: Millis,
) -> Vec<Particle> {
    (0..count)
        .map(|i| Particle {
            id: first_id + i as ParticleId,
            x,
            y,
            angle: i as f32 * 360.0 / count.max(1) as f32,
            color,
            born_at: now,
        })
        .collect()
}

/// Drop particles older than `lifetime`.
pub fn prune_particles(particles: &[Particle], now: Millis, lifetime: Millis) -> Vec<Particle> {
    particles
        .iter()
        .filter(|p| now.saturating_sub(p.born_at) < lifetime)
        .cloned()
        .collect()
}
