//! Night Rider - a three-lane endless motorcycle runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rider, spawning, collisions, progression)
//! - `runner`: Fixed-timestep frame driver and the renderer/audio seams
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `highscores`: Local leaderboard

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod highscores;
pub mod runner;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use runner::{AudioSink, Renderer, Runner};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Frame times above this (tab switches, breakpoints) are clamped
    pub const MAX_FRAME_DT: f32 = 0.1;
}
