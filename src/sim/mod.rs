//! Deterministic game simulation.
//!
//! The tile grid and physics live in [`tile`] and [`body`]; entities and
//! their behaviors in [`entity`] and the per-kind modules; [`level`] owns
//! all of it and runs the fixed-step update loop.

pub mod body;
pub mod bullet;
pub mod camera;
pub mod creature;
pub mod data;
pub mod entity;
pub mod guy;
pub mod level;
pub mod player;
pub mod scenery;
pub mod tile;

pub use entity::{Entity, EntityId, EntityKind, KindTag};
pub use level::{GameEvent, Level, Sfx};
