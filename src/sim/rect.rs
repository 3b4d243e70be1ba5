//! Integer axis-aligned rectangles
//!
//! Everything the simulation collides is an AABB in pixel space:
//! - x, y: top-left corner (y grows downward)
//! - w, h: extent; the right and bottom edges are exclusive

use std::ops::RangeInclusive;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// A rectangle with no area intersects nothing
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Overlap test with half-open edges: touching rectangles do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Grow outward by `dx` on both horizontal sides and `dy` on both vertical sides
    pub fn expand(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.w + 2 * dx, self.h + 2 * dy)
    }

    /// Inclusive ranges of grid cells this rectangle touches, for a square
    /// cell size. Empty rectangles yield empty ranges.
    pub fn cell_span(&self, cell: i32) -> (RangeInclusive<i32>, RangeInclusive<i32>) {
        if self.is_empty() {
            let none = RangeInclusive::new(1, 0);
            return (none.clone(), none);
        }
        let c0 = self.left().div_euclid(cell);
        let c1 = (self.right() - 1).div_euclid(cell);
        let r0 = self.top().div_euclid(cell);
        let r1 = (self.bottom() - 1).div_euclid(cell);
        (c0..=c1, r0..=r1)
    }
}
