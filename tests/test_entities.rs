use reconquest_games::compute::init_state;
use reconquest_games::config::Tuning;
use reconquest_games::entities::*;

fn item(spawned_at: Millis, fall_ms: Millis) -> FallingItem {
    FallingItem {
        id: 1,
        kind: ItemKind::PositiveSmall,
        x: 4.0,
        spawned_at,
        fall_ms,
    }
}

#[test]
fn entity_clone_and_eq() {
    assert_eq!(ItemKind::Fatal, ItemKind::Fatal);
    assert_ne!(ItemKind::PositiveSmall, ItemKind::PositiveLarge);
    assert_eq!(Phase::Playing, Phase::Playing);
    assert_ne!(Phase::Playing, Phase::GameOver);
    assert_eq!(Effect::Points(5), Effect::Points(5));
    assert_ne!(Effect::Points(5), Effect::Points(-5));

    let kind = ItemKind::Magnet;
    assert_eq!(kind.clone(), ItemKind::Magnet);
}

#[test]
fn match_state_clone_is_independent() {
    let original = init_state(&Tuning::default(), 0);
    let mut cloned = original.clone();

    cloned.score = 999;
    cloned.items.push(item(0, 4000));
    cloned.power_ups.magnet_charges = 2;

    assert_eq!(original.score, 0);
    assert!(original.items.is_empty());
    assert_eq!(original.power_ups.magnet_charges, 0);
}

// ── FallingItem ───────────────────────────────────────────────────────────────

#[test]
fn fall_progress_is_linear() {
    let it = item(1000, 4000);
    assert_eq!(it.fall_progress(1000), 0.0);
    assert_eq!(it.fall_progress(2000), 0.25);
    assert_eq!(it.fall_progress(3000), 0.5);
    assert_eq!(it.fall_progress(5000), 1.0);
}

#[test]
fn fall_progress_clamps_outside_the_flight() {
    let it = item(1000, 4000);
    assert_eq!(it.fall_progress(0), 0.0); // before spawn
    assert_eq!(it.fall_progress(9000), 1.0);
}

#[test]
fn zero_length_fall_is_already_landed() {
    assert_eq!(item(0, 0).fall_progress(0), 1.0);
}

#[test]
fn lands_at_adds_fall_duration() {
    assert_eq!(item(1500, 2500).lands_at(), 4000);
}
