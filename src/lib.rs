//! Tilehop - A fixed-tick tile platformer core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, tile collisions, level state)
//! - `level`: Fixed-step scheduler wiring the simulation to its collaborators
//! - `config`: Data-driven per-level configuration
//! - `audio`: Fire-and-forget audio collaborator interface
//! - `effects`: Decorative particle effects (no gameplay coupling)

pub mod audio;
pub mod config;
pub mod effects;
pub mod level;
pub mod sim;

pub use config::{LevelConfig, PhysicsTuning};
pub use level::{FrameSnapshot, LevelLoop, LevelTransitionListener};

/// Game configuration constants
pub mod consts {
    /// Simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Edge length of one map cell in pixels
    pub const TILE_SIZE: i32 = 32;

    /// Fallback map dimensions (cells)
    pub const DEFAULT_MAP_COLS: usize = 75;
    pub const DEFAULT_MAP_ROWS: usize = 27;

    /// Avatar footprint
    pub const AVATAR_WIDTH: i32 = 28;
    pub const AVATAR_HEIGHT: i32 = 44;

    /// Height of the feet and head hitbox strips
    pub const STRIP_HEIGHT: i32 = 6;
    /// Extra reach of the hazard probe below and beside the feet strip
    pub const HAZARD_PROBE_REACH: i32 = 2;

    /// Walk animation: frames per cycle and ticks per frame
    pub const WALK_FRAMES: u32 = 4;
    pub const TICKS_PER_FRAME: u32 = 6;
}
