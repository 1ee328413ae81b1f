pub mod audio;
pub mod autopilot;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ghost;
pub mod host;
pub mod input;
pub mod maze;
pub mod player;
pub mod render;
pub mod rng;
pub mod session;
pub mod types;

pub use config::EngineConfig;
pub use engine::GameEngine;
pub use error::{ConfigError, EngineError};
pub use host::{EngineObserver, FrameHost, Host};
