/// User settings and catch-game tuning, persisted as JSON in the
/// platform data directory.
use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::Millis;
use crate::quiz::QuizRules;

/// Catch-game constants.  Every timing rule of the engine reads from here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub match_secs: u32,
    pub spawn_delay_start_ms: Millis,
    pub spawn_delay_floor_ms: Millis,
    pub fall_start_ms: Millis,
    pub fall_floor_ms: Millis,
    pub reward_threshold: u32,
    pub fever_streak: u32,
    pub fever_ms: Millis,
    pub magnet_ms: Millis,
    pub magnet_sweep_ms: Millis,
    pub time_bonus_secs: u32,
    pub catch_dedup_ms: Millis,
    pub particle_ms: Millis,
    pub particles_per_burst: u32,
    /// Item width in playfield units; spawn positions keep the whole item visible.
    pub item_width: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            match_secs: 30,
            spawn_delay_start_ms: 800,
            spawn_delay_floor_ms: 300,
            fall_start_ms: 4000,
            fall_floor_ms: 2000,
            reward_threshold: 150,
            fever_streak: 5,
            fever_ms: 5000,
            magnet_ms: 3000,
            magnet_sweep_ms: 100,
            time_bonus_secs: 5,
            catch_dedup_ms: 2000,
            particle_ms: 1000,
            particles_per_burst: 8,
            item_width: 3.0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{start} must not be below {floor}")]
    InvertedRamp {
        start: &'static str,
        floor: &'static str,
    },
    #[error("item_width must be a finite, non-negative number")]
    BadItemWidth,
}

impl Tuning {
    /// Reject values that would stall or break the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero: [(&'static str, u64); 6] = [
            ("match_secs", self.match_secs.into()),
            ("spawn_delay_floor_ms", self.spawn_delay_floor_ms),
            ("fall_floor_ms", self.fall_floor_ms),
            ("fever_streak", self.fever_streak.into()),
            ("magnet_sweep_ms", self.magnet_sweep_ms),
            ("catch_dedup_ms", self.catch_dedup_ms),
        ];
        if let Some((field, _)) = nonzero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero { field: *field });
        }
        if self.spawn_delay_start_ms < self.spawn_delay_floor_ms {
            return Err(ConfigError::InvertedRamp {
                start: "spawn_delay_start_ms",
                floor: "spawn_delay_floor_ms",
            });
        }
        if self.fall_start_ms < self.fall_floor_ms {
            return Err(ConfigError::InvertedRamp {
                start: "fall_start_ms",
                floor: "fall_floor_ms",
            });
        }
        if !self.item_width.is_finite() || self.item_width < 0.0 {
            return Err(ConfigError::BadItemWidth);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// JSON question bank replacing the built-in trivia questions.
    pub quiz_bank: Option<PathBuf>,
    pub tuning: Tuning,
    pub quiz: QuizRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 5,
            seed: None,
            quiz_bank: None,
            tuning: Tuning::default(),
            quiz: QuizRules::default(),
        }
    }
}

pub struct Paths {
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "reconquest", "Reconquest")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("reconquest.log"),
    })
}

/// Missing or unreadable settings fall back to defaults, and so does a
/// tuning block that fails [`Tuning::validate`].
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(mut v) => {
                if let Err(e) = v.tuning.validate() {
                    log::warn!("ignoring tuning in {}: {e}", path.display());
                    v.tuning = Tuning::default();
                }
                v
            }
            Err(e) => {
                log::warn!("ignoring malformed settings at {}: {e}", path.display());
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
