use reconquest_games::compute::*;
use reconquest_games::config::Tuning;
use reconquest_games::entities::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn tuning() -> Tuning {
    Tuning::default()
}

fn make_state() -> MatchState {
    init_state(&tuning(), 0)
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_is_a_clean_match() {
    let s = init_state(&tuning(), 0);
    assert_eq!(s.phase, Phase::Playing);
    assert_eq!(s.score, 0);
    assert_eq!(s.time_remaining, 30);
    assert_eq!(s.combo, 0);
    assert!(!s.fever_active);
    assert_eq!(s.power_ups, PowerUps::default());
    assert_eq!(s.consecutive_good_catches, 0);
    assert!(s.items.is_empty());
    assert!(s.particles.is_empty());
    assert!(!s.reward_claimed);
}

#[test]
fn init_state_keeps_high_score() {
    assert_eq!(init_state(&tuning(), 420).high_score, 420);
}

#[test]
fn menu_state_is_idle() {
    let s = menu_state(&tuning(), 7);
    assert_eq!(s.phase, Phase::Menu);
    assert_eq!(s.high_score, 7);
}

// ── Difficulty ramp ──────────────────────────────────────────────────────────

#[test]
fn progress_tracks_time_spent() {
    let t = tuning();
    assert_eq!(progress(&t, 30), 0.0);
    assert_eq!(progress(&t, 15), 0.5);
    assert_eq!(progress(&t, 0), 1.0);
}

#[test]
fn progress_clamps_after_time_bonus() {
    assert_eq!(progress(&tuning(), 35), 0.0);
}

#[test]
fn fall_duration_shrinks_linearly_to_floor() {
    let t = tuning();
    assert_eq!(fall_duration_ms(&t, 30), 4000);
    assert_eq!(fall_duration_ms(&t, 15), 3000);
    assert_eq!(fall_duration_ms(&t, 0), 2000);
    assert_eq!(fall_duration_ms(&t, 35), 4000);
}

#[test]
fn spawn_delay_shrinks_linearly_to_floor() {
    let t = tuning();
    assert_eq!(spawn_delay_ms(&t, 30), 800);
    assert_eq!(spawn_delay_ms(&t, 15), 550);
    assert_eq!(spawn_delay_ms(&t, 0), 300);
}

#[test]
fn ramp_never_goes_below_floor_with_odd_tuning() {
    let t = Tuning {
        fall_start_ms: 1000,
        fall_floor_ms: 2000, // floor above start
        ..tuning()
    };
    assert_eq!(fall_duration_ms(&t, 0), 2000);
    assert_eq!(fall_duration_ms(&t, 30), 2000);
}

#[test]
fn spawn_x_stays_inside_playfield() {
    let t = tuning();
    let pf = Playfield { width: 40.0, height: 20.0 };
    let mut rng = seeded_rng();
    for _ in 0..1000 {
        let x = spawn_x(&pf, &t, &mut rng);
        assert!((0.0..37.0).contains(&x), "x = {x}");
    }
}

#[test]
fn spawn_x_on_narrow_playfield_is_zero() {
    let pf = Playfield { width: 2.0, height: 20.0 };
    assert_eq!(spawn_x(&pf, &tuning(), &mut seeded_rng()), 0.0);
}

// ── apply_points ──────────────────────────────────────────────────────────────

#[test]
fn apply_points_floors_at_zero() {
    assert_eq!(apply_points(5, -10), 0);
    assert_eq!(apply_points(0, -10), 0);
    assert_eq!(apply_points(15, -10), 5);
    assert_eq!(apply_points(15, 20), 35);
}

// ── score_catch ───────────────────────────────────────────────────────────────

#[test]
fn positive_catch_scores_and_extends_streaks() {
    let s = make_state();
    let (s2, outcome) = score_catch(&s, ItemKind::PositiveSmall, &tuning());
    assert_eq!(outcome, CatchOutcome::Scored { points: 5 });
    assert_eq!(s2.score, 5);
    assert_eq!(s2.combo, 1);
    assert_eq!(s2.consecutive_good_catches, 1);
}

#[test]
fn large_catch_is_20_without_fever_and_40_with() {
    let s = make_state();
    let (cold, _) = score_catch(&s, ItemKind::PositiveLarge, &tuning());
    assert_eq!(cold.score, 20);

    let hot = MatchState { fever_active: true, ..make_state() };
    let (hot2, outcome) = score_catch(&hot, ItemKind::PositiveLarge, &tuning());
    assert_eq!(hot2.score, 40);
    assert_eq!(outcome, CatchOutcome::Scored { points: 40 });
}

#[test]
fn fever_does_not_double_penalties() {
    let s = MatchState { fever_active: true, score: 30, ..make_state() };
    let (s2, outcome) = score_catch(&s, ItemKind::Negative, &tuning());
    assert_eq!(outcome, CatchOutcome::Scored { points: -10 });
    assert_eq!(s2.score, 20);
}

#[test]
fn negative_catch_resets_streaks_and_floors_score() {
    let s = MatchState {
        score: 5,
        combo: 3,
        consecutive_good_catches: 3,
        ..make_state()
    };
    let (s2, _) = score_catch(&s, ItemKind::Negative, &tuning());
    assert_eq!(s2.score, 0);
    assert_eq!(s2.combo, 0);
    assert_eq!(s2.consecutive_good_catches, 0);
}

#[test]
fn fatal_catch_resets_streaks_but_keeps_score() {
    let s = MatchState {
        score: 60,
        combo: 4,
        consecutive_good_catches: 4,
        ..make_state()
    };
    let (s2, outcome) = score_catch(&s, ItemKind::Fatal, &tuning());
    assert_eq!(outcome, CatchOutcome::MatchEnded);
    assert_eq!(s2.score, 60);
    assert_eq!(s2.combo, 0);
    assert_eq!(s2.consecutive_good_catches, 0);
}

#[test]
fn magnet_adds_charge_and_good_catch_but_not_combo() {
    let s = MatchState { combo: 2, consecutive_good_catches: 2, ..make_state() };
    let (s2, outcome) = score_catch(&s, ItemKind::Magnet, &tuning());
    assert_eq!(outcome, CatchOutcome::MagnetCharged);
    assert_eq!(s2.power_ups.magnet_charges, 1);
    assert_eq!(s2.consecutive_good_catches, 3);
    assert_eq!(s2.combo, 2);
    assert_eq!(s2.score, 0);
}

#[test]
fn time_bonus_works_once_per_match() {
    let s = make_state();
    let (s2, first) = score_catch(&s, ItemKind::TimeBonus, &tuning());
    assert_eq!(first, CatchOutcome::TimeExtended);
    assert_eq!(s2.time_remaining, 35);
    assert!(s2.power_ups.time_extend_used);
    assert_eq!(s2.consecutive_good_catches, 1);

    let (s3, second) = score_catch(&s2, ItemKind::TimeBonus, &tuning());
    assert_eq!(second, CatchOutcome::NoEffect);
    assert_eq!(s3, s2);
}

#[test]
fn score_catch_does_not_mutate_original() {
    let s = make_state();
    let _ = score_catch(&s, ItemKind::PositiveLarge, &tuning());
    assert_eq!(s.score, 0);
}

#[test]
fn outcome_colors() {
    use ColorTag::*;
    assert_eq!(CatchOutcome::Scored { points: 5 }.color(), Some(Pink));
    assert_eq!(CatchOutcome::Scored { points: 20 }.color(), Some(Gold));
    assert_eq!(CatchOutcome::Scored { points: -10 }.color(), Some(Grey));
    assert_eq!(CatchOutcome::MatchEnded.color(), Some(Red));
    assert_eq!(CatchOutcome::MagnetCharged.color(), Some(Violet));
    assert_eq!(CatchOutcome::TimeExtended.color(), Some(Amber));
    assert_eq!(CatchOutcome::NoEffect.color(), None);
}

// ── Fever ────────────────────────────────────────────────────────────────────

#[test]
fn fever_due_at_streak_of_five() {
    let t = tuning();
    let four = MatchState { consecutive_good_catches: 4, ..make_state() };
    let five = MatchState { consecutive_good_catches: 5, ..make_state() };
    assert!(!fever_due(&four, &t));
    assert!(fever_due(&five, &t));
}

#[test]
fn fever_not_due_while_already_active() {
    let s = MatchState {
        consecutive_good_catches: 9,
        fever_active: true,
        ..make_state()
    };
    assert!(!fever_due(&s, &tuning()));
}

#[test]
fn end_fever_clears_multiplier_and_streak() {
    let s = start_fever(&MatchState { consecutive_good_catches: 7, ..make_state() });
    assert!(s.fever_active);
    let s2 = end_fever(&s);
    assert!(!s2.fever_active);
    assert_eq!(s2.consecutive_good_catches, 0);
}

// ── Particles ────────────────────────────────────────────────────────────────

#[test]
fn particle_burst_is_an_even_ring() {
    let burst = particle_burst(10, 3.0, 4.0, ColorTag::Pink, 8, 500);
    assert_eq!(burst.len(), 8);
    assert_eq!(burst[0].id, 10);
    assert_eq!(burst[7].id, 17);
    assert_eq!(burst[2].angle, 90.0);
    assert!(burst.iter().all(|p| p.born_at == 500 && p.color == ColorTag::Pink));
}

#[test]
fn prune_particles_drops_expired() {
    let mut ps = particle_burst(1, 0.0, 0.0, ColorTag::Red, 2, 0);
    ps.extend(particle_burst(3, 0.0, 0.0, ColorTag::Gold, 2, 600));
    let kept = prune_particles(&ps, 1000, 1000);
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().all(|p| p.born_at == 600));
}
