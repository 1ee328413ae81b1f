use serde::Deserialize;

use crate::constants::{
    CUE_TIMEOUT_SECS, DEATH_ANIMATION_SECS, EATING_GHOST_FREEZE_SECS, FLOATING_TEXT_SECS,
    INTERMISSION_MIN_SECS, MAX_FRAME_DT_SECS, RESPAWN_GRACE_SECS, STARTING_LIVES,
};
use crate::error::ConfigError;

/// Engine tuning. Everything except the seed defaults to arcade timings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for frightened-ghost wandering. `None` draws one from OS entropy.
    pub seed: Option<u32>,
    pub starting_lives: u32,
    pub death_animation_secs: f32,
    pub respawn_grace_secs: f32,
    pub eating_ghost_freeze_secs: f32,
    pub floating_text_secs: f32,
    /// Lower bound on the level-transition pause, even if the jingle is shorter.
    pub intermission_min_secs: f32,
    /// Awaited cues that have not finished by now are treated as done.
    pub cue_timeout_secs: f32,
    /// Frame delta clamp, so a stalled host does not teleport entities.
    pub max_frame_dt_secs: f32,
    pub muted: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            starting_lives: STARTING_LIVES,
            death_animation_secs: DEATH_ANIMATION_SECS,
            respawn_grace_secs: RESPAWN_GRACE_SECS,
            eating_ghost_freeze_secs: EATING_GHOST_FREEZE_SECS,
            floating_text_secs: FLOATING_TEXT_SECS,
            intermission_min_secs: INTERMISSION_MIN_SECS,
            cue_timeout_secs: CUE_TIMEOUT_SECS,
            max_frame_dt_secs: MAX_FRAME_DT_SECS,
            muted: false,
        }
    }
}

impl EngineConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(seed) = std::env::var("PACMAN_SEED") {
            if let Ok(parsed) = seed.trim().parse::<u32>() {
                config.seed = Some(parsed);
            } else {
                tracing::warn!("Invalid PACMAN_SEED '{}', using entropy", seed);
            }
        }

        if let Ok(lives) = std::env::var("PACMAN_LIVES") {
            match lives.trim().parse::<u32>() {
                Ok(parsed) if parsed > 0 => config.starting_lives = parsed,
                Ok(_) => tracing::warn!("PACMAN_LIVES must be > 0, using default"),
                Err(_) => tracing::warn!("Invalid PACMAN_LIVES '{}', using default", lives),
            }
        }

        if let Ok(muted) = std::env::var("PACMAN_MUTED") {
            match muted.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.muted = true,
                "0" | "false" | "no" | "off" => config.muted = false,
                _ => tracing::warn!("Invalid PACMAN_MUTED '{}', using default", muted),
            }
        }

        if let Ok(max_dt) = std::env::var("PACMAN_MAX_FRAME_DT") {
            match max_dt.trim().parse::<f32>() {
                Ok(parsed) if parsed > 0.0 && parsed <= 1.0 => config.max_frame_dt_secs = parsed,
                Ok(_) => tracing::warn!("PACMAN_MAX_FRAME_DT must be within (0, 1], using default"),
                Err(_) => tracing::warn!("Invalid PACMAN_MAX_FRAME_DT '{}', using default", max_dt),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        for (field, value) in [
            ("death_animation_secs", self.death_animation_secs),
            ("respawn_grace_secs", self.respawn_grace_secs),
            ("eating_ghost_freeze_secs", self.eating_ghost_freeze_secs),
            ("floating_text_secs", self.floating_text_secs),
            ("intermission_min_secs", self.intermission_min_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }
        if !(self.cue_timeout_secs.is_finite() && self.cue_timeout_secs > 0.0) {
            return Err(ConfigError::CueTimeout(self.cue_timeout_secs));
        }
        if !(self.max_frame_dt_secs > 0.0 && self.max_frame_dt_secs <= 1.0) {
            return Err(ConfigError::FrameDelta(self.max_frame_dt_secs));
        }
        Ok(())
    }
}
