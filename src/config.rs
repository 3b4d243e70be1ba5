//! Per-level configuration
//!
//! One `LevelConfig` parameterizes the single level loop: world source, spawn,
//! hazards, entities and physics tuning. Stored as JSON; every field has a
//! default so partial files are accepted.

use std::path::{Path, PathBuf};

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::grid::{TILE_HAZARD, TileCode};
use crate::sim::rect::Rect;
use crate::sim::state::PickupKind;

/// Why a config file could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Avatar physics tunables, in pixels and ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Added to vertical velocity every tick
    pub gravity: i32,
    /// Maximum downward speed
    pub terminal_velocity: i32,
    /// Upward speed set by a jump
    pub jump_impulse: i32,
    /// Horizontal speed while walking
    pub walk_speed: i32,
    /// Horizontal speed while dashing
    pub dash_speed: i32,
    /// Length of a dash
    pub dash_ticks: u32,
    /// Walk speed multiplier granted by the speed boost pickup
    pub speed_boost_multiplier: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 1,
            terminal_velocity: 12,
            jump_impulse: 16,
            walk_speed: 5,
            dash_speed: 14,
            dash_ticks: 10,
            speed_boost_multiplier: 1.5,
        }
    }
}

/// A collectible placed in the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupSpec {
    pub kind: PickupKind,
    /// Top-left corner in pixels
    pub x: i32,
    pub y: i32,
}

/// Everything that distinguishes one level from another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub name: String,
    /// Map file; `None` or an unusable file selects the default map
    pub map_path: Option<PathBuf>,
    /// Avatar spawn point (top-left, pixels)
    pub spawn: IVec2,
    /// Visible area in pixels
    pub viewport: IVec2,
    /// Tile codes that kill on contact
    pub hazard_codes: Vec<TileCode>,
    pub pickups: Vec<PickupSpec>,
    /// Exit trigger area
    pub portal: Option<Rect>,
    pub starting_lives: u8,
    /// Delay between touching the portal and the transition request
    pub portal_countdown_ticks: u32,
    /// How long pickup messages stay on the HUD
    pub message_ticks: u32,
    /// Seed for decorative effects
    pub effect_seed: u64,
    pub physics: PhysicsTuning,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            map_path: None,
            spawn: IVec2::new(64, 64),
            viewport: IVec2::new(800, 600),
            hazard_codes: vec![TILE_HAZARD],
            pickups: Vec::new(),
            portal: None,
            starting_lives: 3,
            portal_countdown_ticks: 120,
            message_ticks: 150,
            effect_seed: 0x5EED,
            physics: PhysicsTuning::default(),
        }
    }
}

impl LevelConfig {
    /// Parse a config from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config file. A relative `map_path` resolves against the
    /// config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        if let (Some(map), Some(dir)) = (config.map_path.as_mut(), path.parent()) {
            if map.is_relative() {
                *map = dir.join(&*map);
            }
        }
        Ok(config)
    }

    /// Read a config file, using defaults if it is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded level config '{}' from {}", config.name, path.display());
                config
            }
            Err(e) => {
                log::warn!("Level config {} unusable ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
