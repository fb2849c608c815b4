//! Direction and bounding-box primitives shared by the simulation.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// A cardinal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Unit grid step in this direction (screen coordinates: +y is down).
    pub fn to_point(self) -> IVec2 {
        match self {
            Dir::Up => IVec2::new(0, -1),
            Dir::Down => IVec2::new(0, 1),
            Dir::Left => IVec2::new(-1, 0),
            Dir::Right => IVec2::new(1, 0),
        }
    }

    /// The facing direction matching this direction, if it is horizontal.
    pub fn to_facing_dir(self) -> Option<FacingDir> {
        match self {
            Dir::Left => Some(FacingDir::Left),
            Dir::Right => Some(FacingDir::Right),
            _ => None,
        }
    }

}

/// Which way an entity is facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FacingDir {
    Left,
    #[default]
    Right,
}

impl FacingDir {
    pub fn opposite(self) -> Self {
        match self {
            FacingDir::Left => FacingDir::Right,
            FacingDir::Right => FacingDir::Left,
        }
    }

    /// -1 for left, +1 for right
    pub fn mult(self) -> i32 {
        match self {
            FacingDir::Left => -1,
            FacingDir::Right => 1,
        }
    }
}

/// Axis-aligned bounding box in physics units. The box spans the closed
/// intervals `[min_x, max_x]` and `[min_y, max_y]` with `max = min + size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Min corner (top-left; +y is down)
    pub pos: IVec2,
    /// Width and height
    pub size: IVec2,
}

impl Rect {
    pub fn new(pos: IVec2, size: IVec2) -> Self {
        Self { pos, size }
    }

    pub fn min_x(&self) -> i32 {
        self.pos.x
    }

    pub fn max_x(&self) -> i32 {
        self.pos.x + self.size.x
    }

    pub fn mid_x(&self) -> i32 {
        self.pos.x + self.size.x / 2
    }

    pub fn min_y(&self) -> i32 {
        self.pos.y
    }

    pub fn max_y(&self) -> i32 {
        self.pos.y + self.size.y
    }

    pub fn mid_y(&self) -> i32 {
        self.pos.y + self.size.y / 2
    }

    pub fn set_min_x(&mut self, x: i32) {
        self.pos.x = x;
    }

    pub fn set_max_x(&mut self, x: i32) {
        self.pos.x = x - self.size.x;
    }

    pub fn set_mid_x(&mut self, x: i32) {
        self.pos.x = x - self.size.x / 2;
    }

    pub fn set_min_y(&mut self, y: i32) {
        self.pos.y = y;
    }

    pub fn set_max_y(&mut self, y: i32) {
        self.pos.y = y - self.size.y;
    }

    pub fn set_mid_y(&mut self, y: i32) {
        self.pos.y = y - self.size.y / 2;
    }

    pub fn mid(&self) -> IVec2 {
        IVec2::new(self.mid_x(), self.mid_y())
    }

    /// Closed-interval overlap on both axes.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x() <= other.max_x()
            && self.max_x() >= other.min_x()
            && self.min_y() <= other.max_y()
            && self.max_y() >= other.min_y()
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate independent smoothing factor for exponential approach:
/// `value += smoothness(k, dt) * (target - value)`.
#[inline]
pub fn smoothness(k: f32, dt: f32) -> f32 {
    1.0 - (-k * dt).exp()
}
