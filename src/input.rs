//! Frame-scoped input snapshot.
//!
//! The driver owns the real input source and feeds one `Keys` snapshot per
//! fixed step. `was_pressed_this_frame` state is cleared by `reset_frame`
//! once per step, after every entity has seen it.

use std::collections::HashSet;

/// Logical game keys. Bindings to physical keys are the driver's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Shoot,
    SwitchWeapon,
    /// Debug: spawn a companion
    DebugSpawnGuy,
    /// Debug: bring back all known companions
    DebugBringBackGuys,
}

pub const LEFT_KEYS: &[Key] = &[Key::Left];
pub const RIGHT_KEYS: &[Key] = &[Key::Right];
pub const UP_KEYS: &[Key] = &[Key::Up];
pub const DOWN_KEYS: &[Key] = &[Key::Down];
pub const JUMP_KEYS: &[Key] = &[Key::Jump];
pub const SHOOT_KEYS: &[Key] = &[Key::Shoot];
pub const SWITCH_WEAPON_KEYS: &[Key] = &[Key::SwitchWeapon];

/// Snapshot of key state for one simulation step.
#[derive(Debug, Clone, Default)]
pub struct Keys {
    down: HashSet<Key>,
    pressed_this_frame: HashSet<Key>,
}

impl Keys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down transition.
    pub fn press(&mut self, key: Key) {
        if self.down.insert(key) {
            self.pressed_this_frame.insert(key);
        }
    }

    /// Record a key-up transition.
    pub fn release(&mut self, key: Key) {
        self.down.remove(&key);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    pub fn any_is_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.down.contains(k))
    }

    pub fn was_pressed_this_frame(&self, key: Key) -> bool {
        self.pressed_this_frame.contains(&key)
    }

    pub fn any_was_pressed_this_frame(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.pressed_this_frame.contains(k))
    }

    /// Clear the per-frame edge state. Held keys stay held.
    pub fn reset_frame(&mut self) {
        self.pressed_this_frame.clear();
    }
}
