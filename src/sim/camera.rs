//! Scroll offset derived from the avatar position
//!
//! Not authoritative state: recomputed every frame from the avatar, the
//! viewport and the world bounds.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// World coordinate of the top-left visible pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
}

impl Camera {
    /// Center on `target`, clamped so the view never leaves the world. A
    /// world smaller than the viewport on an axis pins that axis to 0.
    pub fn follow(target: IVec2, viewport: IVec2, world: IVec2) -> Self {
        let axis = |t: i32, view: i32, extent: i32| (t - view / 2).clamp(0, (extent - view).max(0));
        Self {
            x: axis(target.x, viewport.x, world.x),
            y: axis(target.y, viewport.y, world.y),
        }
    }

    pub fn offset(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    /// Convert a world position to screen space
    pub fn world_to_view(&self, world: IVec2) -> IVec2 {
        world - self.offset()
    }
}
