//! Collision resolution against static tiles
//!
//! Runs after the avatar integrates a tick, with the pre-tick position for
//! reference. Order inside a tick is fixed: vertical first (head or feet),
//! then the side check, so a single overlap is never corrected on both axes.
//! A corner can bleed one tick horizontally before the side check catches it.
//!
//! Vertical contacts only count on exposed faces: the seam between two
//! stacked wall cells is neither a floor nor a ceiling.

use glam::IVec2;

use super::avatar::Avatar;
use super::grid::{CollisionIndex, TileCode, TileGrid};
use super::rect::Rect;
use crate::consts::HAZARD_PROBE_REACH;

/// What the resolver corrected this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Head hit a ceiling
    pub ceiling: bool,
    /// Feet came to rest on a solid tile
    pub floor: bool,
    /// Body was pushed back out of a wall
    pub wall: bool,
}

/// Per-level collision rules
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    hazard_codes: Vec<TileCode>,
}

impl CollisionResolver {
    pub fn new(hazard_codes: Vec<TileCode>) -> Self {
        Self { hazard_codes }
    }

    pub fn hazard_codes(&self) -> &[TileCode] {
        &self.hazard_codes
    }

    /// Correct the avatar against solid tiles. `previous` is the position
    /// before this tick's integration.
    pub fn resolve(&self, avatar: &mut Avatar, previous: IVec2, index: &CollisionIndex) -> Resolution {
        let mut result = Resolution::default();
        let size = avatar.size();

        if avatar.velocity().y < 0 {
            // Only ceilings whose underside was at or above the head before the move
            let prev_top = previous.y;
            let ceiling = index
                .overlapping(avatar.head())
                .filter(|r| r.bottom() <= prev_top && underside_exposed(index, r))
                .map(|r| r.bottom())
                .max();
            if let Some(ceiling_y) = ceiling {
                avatar.hit_ceiling(ceiling_y);
                result.ceiling = true;
            }
        } else {
            // Only floors whose top was at or below the feet before the move
            let prev_bottom = previous.y + size.y;
            let floor = index
                .overlapping(avatar.feet())
                .filter(|r| r.top() >= prev_bottom && top_exposed(index, r))
                .map(|r| r.top())
                .min();
            if let Some(floor_y) = floor {
                avatar.land(floor_y);
                result.floor = true;
            }
        }

        if index.any_overlapping(avatar.body()) {
            avatar.block_horizontal(previous.x);
            result.wall = true;
            log::trace!("Wall stop at x={}", previous.x);
        }

        result
    }

    /// Probe used for hazards: the feet strip widened sideways and reaching
    /// a little below the feet
    pub fn hazard_probe(avatar: &Avatar) -> Rect {
        let feet = avatar.feet();
        Rect::new(
            feet.x - HAZARD_PROBE_REACH,
            feet.y,
            feet.w + 2 * HAZARD_PROBE_REACH,
            feet.h + HAZARD_PROBE_REACH,
        )
    }

    /// True if any cell under the hazard probe or the body is a hazard.
    /// Pure: repeated calls without movement give the same answer.
    pub fn hazard_contact(&self, avatar: &Avatar, grid: &TileGrid) -> bool {
        grid.any_under(&Self::hazard_probe(avatar), &self.hazard_codes)
            || grid.any_under(&avatar.body(), &self.hazard_codes)
    }
}

/// No solid cell sits directly on top of `cell`
fn top_exposed(index: &CollisionIndex, cell: &Rect) -> bool {
    !index.any_overlapping(Rect::new(cell.x, cell.y - 1, cell.w, 1))
}

/// No solid cell sits directly under `cell`
fn underside_exposed(index: &CollisionIndex, cell: &Rect) -> bool {
    !index.any_overlapping(Rect::new(cell.x, cell.bottom(), cell.w, 1))
}
