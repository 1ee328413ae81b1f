use crate::audio::PendingCue;
use crate::types::PhaseKind;

/// Orchestrator state. Timers count down in seconds.
#[derive(Debug)]
pub(super) enum Phase {
    Idle,
    Starting {
        cue: PendingCue,
    },
    Playing,
    Dying {
        timer: f32,
        cue: PendingCue,
        final_life: bool,
    },
    RespawnGrace {
        timer: f32,
    },
    EatingGhost {
        timer: f32,
    },
    Intermission {
        cue: PendingCue,
        elapsed: f32,
    },
    Paused(Box<Phase>),
    GameOver,
}

impl Phase {
    pub(super) fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Starting { .. } => PhaseKind::Starting,
            Phase::Playing => PhaseKind::Playing,
            Phase::Dying { .. } => PhaseKind::Dying,
            Phase::RespawnGrace { .. } => PhaseKind::RespawnGrace,
            Phase::EatingGhost { .. } => PhaseKind::EatingGhost,
            Phase::Intermission { .. } => PhaseKind::Intermission,
            Phase::Paused(_) => PhaseKind::Paused,
            Phase::GameOver => PhaseKind::GameOver,
        }
    }

    /// Phases that keep requesting frames.
    pub(super) fn is_running(&self) -> bool {
        matches!(
            self,
            Phase::Starting { .. }
                | Phase::Playing
                | Phase::Dying { .. }
                | Phase::RespawnGrace { .. }
                | Phase::EatingGhost { .. }
                | Phase::Intermission { .. }
        )
    }

    /// The phase underneath any pause.
    pub(super) fn active(&self) -> &Phase {
        match self {
            Phase::Paused(inner) => inner.active(),
            other => other,
        }
    }
}
