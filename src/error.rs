use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no render surface was provided")]
    MissingSurface,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("starting_lives must be at least 1")]
    NoLives,
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f32 },
    #[error("cue_timeout_secs must be positive (got {0})")]
    CueTimeout(f32),
    #[error("max_frame_dt_secs must be within (0, 1] (got {0})")]
    FrameDelta(f32),
}
