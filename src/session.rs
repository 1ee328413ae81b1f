use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::HudStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

/// What the external session service records at start, periodically during
/// play, on pause and at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionReport {
    pub score: u32,
    #[serde(rename = "levelReached")]
    pub level_reached: u32,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "powerUpsUsed")]
    pub power_ups_used: u32,
    pub status: SessionStatus,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "endedAt", skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionReport {
    pub fn from_hud(
        hud: &HudStats,
        status: SessionStatus,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            score: hud.score,
            level_reached: hud.level,
            duration_seconds: hud.time_seconds,
            ghosts_eaten: hud.ghosts_eaten,
            power_ups_used: hud.power_ups_used,
            status,
            started_at,
            ended_at,
        }
    }
}

/// `m:ss`, minutes unpadded.
pub fn format_duration(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
