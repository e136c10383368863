//! World objects: everything that can be drawn and collided with
//!
//! Objects are immutable once built. Mutable game state (eaten food, snake
//! path) lives in the component that created the object.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Process-unique object identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Allocates object ids shared by every object creator
#[derive(Debug)]
pub struct ObjectIds {
    next: AtomicU64,
}

impl Default for ObjectIds {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate a new id
    pub fn next(&self) -> ObjectId {
        ObjectId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Object type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Segment,
    Food,
    Mine,
    Wall,
}

impl ObjectKind {
    /// Draw layer (lower draws first)
    pub fn layer(self) -> u8 {
        match self {
            ObjectKind::Wall => 0,
            ObjectKind::Food | ObjectKind::Mine => 1,
            ObjectKind::Segment => 2,
        }
    }
}

/// What happens when the snake head touches an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Nothing happens
    Ignore,
    /// Snake eats it
    Eat,
    /// Run ends
    Kill,
}

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Axis-aligned rectangle, `min` inclusive and `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// Square of side `size` with its top-left corner at `origin`
    pub fn square(origin: IVec2, size: i32) -> Self {
        Self::new(origin, origin + IVec2::splat(size))
    }

    /// Interiors intersect. Rectangles sharing only an edge do not overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Chebyshev distance between the two rectangles (0 when touching or overlapping)
    pub fn gap(&self, other: &Bounds) -> i32 {
        let dx = (other.min.x - self.max.x).max(self.min.x - other.max.x).max(0);
        let dy = (other.min.y - self.max.y).max(self.min.y - other.max.y).max(0);
        dx.max(dy)
    }

    /// Shrink every edge inward by `amount`
    pub fn shrunk(&self, amount: i32) -> Bounds {
        Bounds::new(self.min + IVec2::splat(amount), self.max - IVec2::splat(amount))
    }
}

/// An active entity in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub bounds: Bounds,
    pub color: Color,
}

impl WorldObject {
    pub fn new(id: ObjectId, kind: ObjectKind, bounds: Bounds, color: Color) -> Self {
        Self {
            id,
            kind,
            bounds,
            color,
        }
    }

    /// Reaction when the snake head (identified by `head`) touches this object
    pub fn reaction(&self, head: ObjectId) -> Reaction {
        match self.kind {
            ObjectKind::Food => Reaction::Eat,
            ObjectKind::Mine | ObjectKind::Wall => Reaction::Kill,
            ObjectKind::Segment if self.id == head => Reaction::Ignore,
            ObjectKind::Segment => Reaction::Kill,
        }
    }
}
