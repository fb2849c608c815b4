//! Smooth-follow camera with a stack of focus targets.
//!
//! The base of the stack is the player; cutscene triggers push temporary
//! targets on top and pop them when they release. The camera eases toward
//! the top target exponentially so cuts between targets glide instead of
//! snapping.

use glam::{IVec2, Vec2};

use crate::geom::{lerp, smoothness};
use crate::sim::entity::EntityId;

/// Exponential-approach constant for the camera glide.
const CAMERA_SMOOTHING: f32 = 3.0;

/// What the camera is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraTarget {
    /// Follow an entity (resolved to its focus point every frame).
    Entity(EntityId),
    /// A fixed point in physics units.
    Point(IVec2),
}

#[derive(Debug, Default)]
pub struct Camera {
    targets: Vec<CameraTarget>,
    pos: Option<Vec2>,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_target(&mut self, target: CameraTarget) {
        self.targets.push(target);
    }

    /// Pop the top target. The last target is never popped; a mismatched
    /// pop is a caller bug, not a reason to leave the camera untargeted.
    pub fn pop_target(&mut self) {
        if self.targets.len() <= 1 {
            log::error!("tried to pop the last camera target");
            return;
        }
        self.targets.pop();
    }

    pub fn target(&self) -> Option<CameraTarget> {
        self.targets.last().copied()
    }

    /// Ease toward the resolved target point. The first step snaps so a
    /// fresh camera never glides in from the origin.
    pub fn step(&mut self, target: Vec2, dt: f32) {
        let Some(pos) = &mut self.pos else {
            self.pos = Some(target);
            return;
        };
        let s = smoothness(CAMERA_SMOOTHING, dt);
        pos.x = lerp(pos.x, target.x, s);
        pos.y = lerp(pos.y, target.y, s);
    }

    /// Current camera position in physics units, if it has ever stepped.
    pub fn pos(&self) -> Option<Vec2> {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_snaps_then_eases() {
        let mut camera = Camera::new();
        camera.push_target(CameraTarget::Point(IVec2::new(100, 0)));
        assert_eq!(camera.pos(), None);

        camera.step(Vec2::new(100.0, 0.0), 1.0 / 60.0);
        assert_eq!(camera.pos(), Some(Vec2::new(100.0, 0.0)));

        // A moved target is approached, not reached, in one step.
        camera.step(Vec2::new(200.0, 0.0), 1.0 / 60.0);
        let p = camera.pos().unwrap();
        assert!(p.x > 100.0 && p.x < 200.0);
    }

    #[test]
    fn test_last_target_is_never_popped() {
        let mut camera = Camera::new();
        camera.push_target(CameraTarget::Point(IVec2::ZERO));
        camera.pop_target();
        assert_eq!(camera.target(), Some(CameraTarget::Point(IVec2::ZERO)));

        camera.push_target(CameraTarget::Point(IVec2::new(5, 5)));
        camera.pop_target();
        assert_eq!(camera.target(), Some(CameraTarget::Point(IVec2::ZERO)));
    }
}
