//! lilguys - A 2D tile platformer runtime
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile layers, physics, entities, levels)
//! - `geom`: Direction and bounding-box primitives
//! - `input`: Frame-scoped input snapshot
//! - `clock`: Fixed timestep accumulator and predicate scheduler
//! - `checkpoint`: Best-effort debug checkpoint of the player position

pub mod checkpoint;
pub mod clock;
pub mod geom;
pub mod input;
pub mod sim;

pub use clock::{Scheduler, SimClock};
pub use input::{Key, Keys};

/// Game configuration constants
pub mod consts {
    /// Multiplier for the fixed-point physics: one display pixel is this
    /// many internal physics units.
    pub const PHYSICS_SCALE: i32 = 16;
    /// Fixed simulation rate
    pub const FPS: i32 = 60;
    /// Fixed simulation timestep (seconds)
    pub const TIME_STEP: f32 = 1.0 / FPS as f32;
    /// Maximum catch-up steps per rendered frame; excess simulated time is
    /// discarded beyond this, trading slowdown for a bounded frame cost.
    pub const MAX_CATCH_UP_STEPS: u32 = 10;

    /// Tile size in display pixels
    pub const TILE_SIZE_PX: i32 = 16;
    /// Tile size in physics units
    pub const TILE_SIZE: i32 = TILE_SIZE_PX * PHYSICS_SCALE;

    /// Nominal game viewport, in display pixels
    pub const GAME_WIDTH_PX: i32 = 200;
    pub const GAME_HEIGHT_PX: i32 = 150;
}

/// Convert display pixels to physics units
#[inline]
pub fn phys_from_px(px: i32) -> i32 {
    px * consts::PHYSICS_SCALE
}

/// Convert physics units to display pixels, flooring toward negative
/// infinity so negative coordinates land in the correct pixel.
#[inline]
pub fn px_from_phys(units: i32) -> i32 {
    units.div_euclid(consts::PHYSICS_SCALE)
}
