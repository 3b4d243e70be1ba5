//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Integer pixel positions and velocities
//! - Stable iteration order (by entity ID)
//! - No audio, rendering or platform dependencies

pub mod avatar;
pub mod camera;
pub mod collision;
pub mod grid;
pub mod rect;
pub mod state;
pub mod tick;

pub use avatar::{AnimState, Avatar, Capabilities, Hitboxes, ProgressState};
pub use camera::Camera;
pub use collision::{CollisionResolver, Resolution};
pub use grid::{
    CollisionIndex, MapError, TILE_EMPTY, TILE_HAZARD, TILE_OUT_OF_BOUNDS, TILE_SOLID, TileCode,
    TileGrid,
};
pub use rect::Rect;
pub use state::{
    HudMessage, LevelEvent, LevelPhase, LevelState, LevelStats, PICKUP_SIZE, Pickup, PickupKind,
};
pub use tick::{TickInput, complete_death_sequence, tick};
