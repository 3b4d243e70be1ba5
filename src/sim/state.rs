//! Level state and core simulation types
//!
//! Everything a tick reads or writes lives here. The level lifecycle is one
//! tagged enum; its variants double as the one-shot latches for death and
//! portal contact.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::avatar::Avatar;
use super::collision::CollisionResolver;
use super::grid::{CollisionIndex, TileGrid};
use super::rect::Rect;
use crate::config::LevelConfig;

/// Pickup size in pixels (square)
pub const PICKUP_SIZE: i32 = 24;

/// Level lifecycle
///
/// `Running -> DeathSequence -> Running` on hazard contact and respawn;
/// `Running -> PortalWait -> TransitionRequested` on portal contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Normal play
    #[default]
    Running,
    /// Simulation frozen until the death sequence reports completion
    DeathSequence,
    /// Input disabled, counting down to the level transition
    PortalWait { ticks_left: u32 },
    /// Terminal: the transition has been requested
    TransitionRequested,
}

impl LevelPhase {
    /// Whether ticks advance the simulation
    pub fn is_simulating(&self) -> bool {
        matches!(self, LevelPhase::Running | LevelPhase::PortalWait { .. })
    }

    /// Whether player input is applied
    pub fn accepts_input(&self) -> bool {
        matches!(self, LevelPhase::Running)
    }
}

/// One-shot events raised by a tick, drained by the level loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelEvent {
    Jumped,
    Dashed,
    /// Airborne to grounded transition
    Landed,
    PickupCollected { id: u32, kind: PickupKind },
    /// Hazard contact; the level is now frozen
    DeathTriggered,
    Respawned,
    /// First portal contact
    PortalEntered,
    /// Portal countdown finished
    TransitionRequested,
}

/// Collectible kinds and the capability each unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    DoubleJump,
    Dash,
    SpeedBoost,
    ExtraLife,
}

impl PickupKind {
    /// HUD text shown on collection
    pub fn message(&self) -> &'static str {
        match self {
            PickupKind::DoubleJump => "Double jump unlocked!",
            PickupKind::Dash => "Dash unlocked!",
            PickupKind::SpeedBoost => "Speed boost!",
            PickupKind::ExtraLife => "Extra life!",
        }
    }
}

/// A collectible entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub rect: Rect,
    pub collected: bool,
}

/// Timed HUD text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudMessage {
    pub text: String,
    pub ticks_left: u32,
}

/// Per-level counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Ticks simulated; frozen phases do not count
    pub ticks: u64,
    pub deaths: u32,
    pub pickups_collected: u32,
}

/// Complete level state
#[derive(Debug, Clone)]
pub struct LevelState {
    pub config: LevelConfig,
    pub grid: TileGrid,
    pub index: CollisionIndex,
    pub resolver: CollisionResolver,
    pub avatar: Avatar,
    /// Sorted by id for deterministic iteration
    /// Config order, so ids ascend and collection order is stable
    pub pickups: Vec<Pickup>,
    pub portal: Option<Rect>,
    pub phase: LevelPhase,
    pub message: Option<HudMessage>,
    pub stats: LevelStats,
    /// Raised this tick, drained by the owner
    pub events: Vec<LevelEvent>,
}

impl LevelState {
    /// Load a level: the grid falls back to the default map on any
    /// problem, so this never fails
    pub fn new(config: LevelConfig) -> Self {
        let grid = TileGrid::load(config.map_path.as_deref(), crate::consts::TILE_SIZE);
        Self::with_grid(config, grid)
    }

    /// Build a level around an already loaded grid
    pub fn with_grid(config: LevelConfig, grid: TileGrid) -> Self {
        let index = CollisionIndex::build(&grid);
        let world = IVec2::new(grid.width(), grid.height());
        let avatar = Avatar::new(config.spawn, world, config.physics, config.starting_lives);
        let resolver = CollisionResolver::new(config.hazard_codes.clone());

        let pickups = config
            .pickups
            .iter()
            .enumerate()
            .map(|(i, spec)| Pickup {
                id: i as u32 + 1,
                kind: spec.kind,
                rect: Rect::new(spec.x, spec.y, PICKUP_SIZE, PICKUP_SIZE),
                collected: false,
            })
            .collect();

        log::info!(
            "Level '{}' ready: {}x{} px, {} solid tiles, {} pickups",
            config.name,
            world.x,
            world.y,
            index.len(),
            config.pickups.len()
        );

        Self {
            portal: config.portal,
            config,
            grid,
            index,
            resolver,
            avatar,
            pickups,
            phase: LevelPhase::Running,
            message: None,
            stats: LevelStats::default(),
            events: Vec::new(),
        }
    }

    /// World size in pixels
    pub fn world_size(&self) -> IVec2 {
        IVec2::new(self.grid.width(), self.grid.height())
    }

    /// Raise a timed HUD message, replacing any current one
    pub fn show_message(&mut self, text: &str) {
        self.message = Some(HudMessage {
            text: text.to_string(),
            ticks_left: self.config.message_ticks,
        });
    }

    /// Remove and return this tick's events
    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }
}
