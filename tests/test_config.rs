use reconquest_games::config::*;

#[test]
fn defaults_match_the_game_rules() {
    let t = Tuning::default();
    assert_eq!(t.match_secs, 30);
    assert_eq!((t.spawn_delay_start_ms, t.spawn_delay_floor_ms), (800, 300));
    assert_eq!((t.fall_start_ms, t.fall_floor_ms), (4000, 2000));
    assert_eq!(t.reward_threshold, 150);
    assert_eq!(t.fever_streak, 5);
    assert_eq!(t.fever_ms, 5000);
    assert_eq!(t.magnet_ms, 3000);
    assert_eq!(t.time_bonus_secs, 5);
    assert_eq!(t.catch_dedup_ms, 2000);
}

#[test]
fn partial_settings_fill_in_defaults() {
    let json = r#"{ "api_base_url": "http://example.test/api", "tuning": { "match_secs": 45 } }"#;
    let s: Settings = serde_json::from_str(json).unwrap();
    assert_eq!(s.api_base_url, "http://example.test/api");
    assert_eq!(s.tuning.match_secs, 45);
    assert_eq!(s.tuning.reward_threshold, 150);
    assert_eq!(s.request_timeout_secs, 5);
    assert_eq!(s.quiz.pass_mark, 3);
    assert_eq!(s.seed, None);
}

#[test]
fn settings_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let s = Settings {
        seed: Some(99),
        ..Settings::default()
    };
    save_settings_atomic(&path, &s).unwrap();
    save_settings_atomic(&path, &s).unwrap(); // overwrite in place
    assert_eq!(load_settings(&path), s);
}

#[test]
fn malformed_or_missing_settings_fall_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    assert_eq!(load_settings(&path), Settings::default());

    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(load_settings(&path), Settings::default());
}

#[test]
fn tuning_validation_rejects_stalling_values() {
    assert_eq!(Tuning::default().validate(), Ok(()));

    let t = Tuning {
        spawn_delay_start_ms: 0,
        spawn_delay_floor_ms: 0,
        ..Tuning::default()
    };
    assert_eq!(
        t.validate(),
        Err(ConfigError::Zero {
            field: "spawn_delay_floor_ms"
        })
    );

    let t = Tuning {
        magnet_sweep_ms: 0,
        ..Tuning::default()
    };
    assert_eq!(t.validate(), Err(ConfigError::Zero { field: "magnet_sweep_ms" }));

    let t = Tuning {
        match_secs: 0,
        ..Tuning::default()
    };
    assert_eq!(t.validate(), Err(ConfigError::Zero { field: "match_secs" }));

    let t = Tuning {
        fever_streak: 0,
        ..Tuning::default()
    };
    assert_eq!(t.validate(), Err(ConfigError::Zero { field: "fever_streak" }));

    let t = Tuning {
        fall_start_ms: 1000,
        ..Tuning::default()
    };
    assert!(matches!(t.validate(), Err(ConfigError::InvertedRamp { .. })));
}

#[test]
fn invalid_tuning_in_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let json = r#"{
        "api_base_url": "http://example.test/api",
        "tuning": { "spawn_delay_start_ms": 0, "spawn_delay_floor_ms": 0 }
    }"#;
    std::fs::write(&path, json).unwrap();

    let s = load_settings(&path);
    assert_eq!(s.api_base_url, "http://example.test/api");
    assert_eq!(s.tuning, Tuning::default());
}
