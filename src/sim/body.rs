//! Kinematic body: the physics and collision core shared by every entity.
//!
//! Positions are integer physics units (rounded after every move so
//! sub-unit drift never accumulates); velocities stay continuous. Motion
//! resolves per axis, X then Y, probing the leading edge of the bounding
//! box against Wall-class tiles and snapping to the tile boundary on a
//! hit. The returned [`Hits`] summary lets entity behaviors layer their
//! own collision responses (bounce, end-of-life, facing flips) on top of
//! the default snap-and-stop.

use glam::{IVec2, Vec2};

use crate::consts::{FPS, PHYSICS_SCALE, TILE_SIZE};
use crate::geom::{Dir, FacingDir, Rect, smoothness};
use crate::sim::tile::{PhysicTile, Tiles};

/// Default gravity, physics units / s^2.
pub const GRAVITY: f32 = 0.13 * (PHYSICS_SCALE * FPS * FPS) as f32;

/// Exponential-approach constant for fall-speed caps.
const FALL_CAP_SMOOTHING: f32 = 20.0;

/// Horizontal inset applied to the standing probe so brushing a wall
/// sideways does not count as standing on it.
const STANDING_INSET: i32 = 1;

const WALL: &[PhysicTile] = &[PhysicTile::Wall];
const PLATFORM: &[PhysicTile] = &[PhysicTile::Platform];
const GROUND: &[PhysicTile] = &[PhysicTile::Wall, PhysicTile::Platform];

/// Which sides collided during one `move_and_slide`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hits {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// The downward hit was the first contact with a one-way platform.
    pub down_platform: bool,
}

impl Hits {
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

/// Axis-aligned kinematic body.
#[derive(Debug, Clone)]
pub struct Body {
    pub rect: Rect,
    /// Velocity, physics units / s
    pub vel: Vec2,
    /// Gravity, physics units / s^2; zero disables gravity entirely
    pub gravity: f32,
    pub facing: FacingDir,
}

impl Body {
    pub fn new(pos: IVec2, size: IVec2) -> Self {
        Self {
            rect: Rect::new(pos, size),
            vel: Vec2::ZERO,
            gravity: GRAVITY,
            facing: FacingDir::default(),
        }
    }

    pub fn apply_gravity(&mut self, dt: f32) {
        if self.gravity != 0.0 {
            self.vel.y += self.gravity * dt;
        }
    }

    /// Approach a downward speed cap smoothly, so the change feels
    /// continuous regardless of frame rate.
    pub fn limit_fall_speed(&mut self, cap: f32, dt: f32) {
        if self.vel.y > cap {
            let diff = self.vel.y - cap;
            self.vel.y -= smoothness(FALL_CAP_SMOOTHING, dt) * diff;
        }
    }

    /// Decay horizontal velocity toward zero by `accel`, frame-rate
    /// independent, never overshooting past zero.
    pub fn damp_x(&mut self, accel: f32, dt: f32) {
        let decay = accel * dt;
        if self.vel.x.abs() <= decay {
            self.vel.x = 0.0;
        } else {
            self.vel.x -= self.vel.x.signum() * decay;
        }
    }

    /// Closed-interval AABB overlap with another body.
    pub fn is_touching(&self, other: &Body) -> bool {
        self.rect.overlaps(&other.rect)
    }

    /// Sample the tiles along the edge of the bounding box facing `dir`,
    /// shifted by `offset` (use one unit of offset for adjacency checks,
    /// zero for overlap checks). True if any sampled tile is in `kinds`.
    pub fn probe_edge(&self, tiles: &Tiles, dir: Dir, offset: IVec2, kinds: &[PhysicTile]) -> bool {
        match dir {
            Dir::Left => self.span_hits(
                tiles,
                kinds,
                self.rect.min_x() + offset.x,
                self.rect.min_y() + offset.y,
                self.rect.max_y() + offset.y,
                true,
            ),
            Dir::Right => self.span_hits(
                tiles,
                kinds,
                self.rect.max_x() + offset.x,
                self.rect.min_y() + offset.y,
                self.rect.max_y() + offset.y,
                true,
            ),
            Dir::Up => self.span_hits(
                tiles,
                kinds,
                self.rect.min_y() + offset.y,
                self.rect.min_x() + offset.x,
                self.rect.max_x() + offset.x,
                false,
            ),
            Dir::Down => self.span_hits(
                tiles,
                kinds,
                self.rect.max_y() + offset.y,
                self.rect.min_x() + offset.x,
                self.rect.max_x() + offset.x,
                false,
            ),
        }
    }

    /// Probe tiles along one edge: `fixed` is the edge coordinate,
    /// `a0..=a1` the span across it, sampled every tile plus the far end.
    fn span_hits(
        &self,
        tiles: &Tiles,
        kinds: &[PhysicTile],
        fixed: i32,
        a0: i32,
        a1: i32,
        vertical: bool,
    ) -> bool {
        let mut a = a0;
        loop {
            let p = if vertical {
                IVec2::new(fixed, a)
            } else {
                IVec2::new(a, fixed)
            };
            if tiles.matches_at_coord(p, kinds) {
                return true;
            }
            if a >= a1 {
                return false;
            }
            a = (a + TILE_SIZE).min(a1);
        }
    }

    /// Standing means the probe one unit below the bottom edge (narrowed
    /// by an inset) hits ground.
    pub fn is_standing(&self, tiles: &Tiles) -> bool {
        self.span_hits(
            tiles,
            GROUND,
            self.rect.max_y() + 1,
            self.rect.min_x() + STANDING_INSET,
            self.rect.max_x() - STANDING_INSET,
            false,
        )
    }

    /// Adjacency check: a wall one unit beyond the left edge.
    pub fn is_against_left_wall(&self, tiles: &Tiles) -> bool {
        self.probe_edge(tiles, Dir::Left, IVec2::new(-1, 0), WALL)
    }

    /// Adjacency check: a wall one unit beyond the right edge.
    pub fn is_against_right_wall(&self, tiles: &Tiles) -> bool {
        self.probe_edge(tiles, Dir::Right, IVec2::new(1, 0), WALL)
    }

    /// Resolve `vel * dt` of motion against the tile grid, X axis first.
    /// Positions advance in at-most-tile-size steps so a fast body cannot
    /// tunnel through a boundary between probes.
    pub fn move_and_slide(&mut self, tiles: &Tiles, dt: f32) -> Hits {
        let mut hits = Hits::default();
        self.move_x(tiles, dt, &mut hits);
        self.move_y(tiles, dt, &mut hits);
        hits
    }

    fn move_x(&mut self, tiles: &Tiles, dt: f32, hits: &mut Hits) {
        if self.vel.x == 0.0 {
            return;
        }
        let target = (self.rect.pos.x as f32 + self.vel.x * dt).round() as i32;

        while self.rect.pos.x != target {
            let step = (target - self.rect.pos.x).clamp(-TILE_SIZE, TILE_SIZE);
            self.rect.pos.x += step;

            if step > 0 {
                if self.probe_edge(tiles, Dir::Right, IVec2::ZERO, WALL) {
                    let tx = self.rect.max_x().div_euclid(TILE_SIZE);
                    self.rect.set_max_x(tx * TILE_SIZE - 1);
                    self.vel.x = 0.0;
                    hits.right = true;
                    return;
                }
            } else if self.probe_edge(tiles, Dir::Left, IVec2::ZERO, WALL) {
                let tx = self.rect.min_x().div_euclid(TILE_SIZE);
                self.rect.set_min_x((tx + 1) * TILE_SIZE);
                self.vel.x = 0.0;
                hits.left = true;
                return;
            }
        }
    }

    fn move_y(&mut self, tiles: &Tiles, dt: f32, hits: &mut Hits) {
        if self.vel.y == 0.0 {
            return;
        }
        // One-way platforms only stop downward motion on the transition
        // into contact. Record the pre-move contact state: overlapping
        // means we are inside one (jumped up through it) and it stays
        // transparent; supported means we are resting exactly on top and
        // get held up again without re-reporting the landing.
        let was_overlapping = self.probe_edge(tiles, Dir::Down, IVec2::ZERO, PLATFORM);
        let was_supported = self.probe_edge(tiles, Dir::Down, IVec2::new(0, 1), PLATFORM);

        let target = (self.rect.pos.y as f32 + self.vel.y * dt).round() as i32;

        while self.rect.pos.y != target {
            let step = (target - self.rect.pos.y).clamp(-TILE_SIZE, TILE_SIZE);
            self.rect.pos.y += step;

            if step > 0 {
                if self.probe_edge(tiles, Dir::Down, IVec2::ZERO, WALL) {
                    let ty = self.rect.max_y().div_euclid(TILE_SIZE);
                    self.rect.set_max_y(ty * TILE_SIZE - 1);
                    self.vel.y = 0.0;
                    hits.down = true;
                    return;
                }
                if !was_overlapping && self.probe_edge(tiles, Dir::Down, IVec2::ZERO, PLATFORM) {
                    let ty = self.rect.max_y().div_euclid(TILE_SIZE);
                    self.rect.set_max_y(ty * TILE_SIZE - 1);
                    self.vel.y = 0.0;
                    if !was_supported {
                        hits.down = true;
                        hits.down_platform = true;
                    }
                    return;
                }
            } else if self.probe_edge(tiles, Dir::Up, IVec2::ZERO, WALL) {
                let ty = self.rect.min_y().div_euclid(TILE_SIZE);
                self.rect.set_min_y((ty + 1) * TILE_SIZE);
                self.vel.y = 0.0;
                hits.up = true;
                return;
            }
        }
    }
}

/// Ground/air running parameters layered on a body by entities that run.
/// Air acceleration is lower than ground acceleration, modeling reduced
/// air control; damping follows the same asymmetry.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Max run speed, physics units / s
    pub run_speed: f32,
    pub ground_accel: f32,
    pub air_accel: f32,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            run_speed: 1.5 * (PHYSICS_SCALE * FPS) as f32,
            ground_accel: 0.25 * (PHYSICS_SCALE * FPS * FPS) as f32 / 2.0,
            air_accel: 0.125 * (PHYSICS_SCALE * FPS * FPS) as f32 / 2.0,
        }
    }
}

impl Runner {
    fn accel(&self, standing: bool) -> f32 {
        if standing { self.ground_accel } else { self.air_accel }
    }

    /// Accelerate left toward max run speed; facing follows intentional
    /// movement.
    pub fn run_left(&self, body: &mut Body, standing: bool, dt: f32) {
        body.vel.x -= self.accel(standing) * dt;
        if body.vel.x < -self.run_speed {
            body.vel.x = -self.run_speed;
        }
        body.facing = FacingDir::Left;
    }

    /// Accelerate right toward max run speed.
    pub fn run_right(&self, body: &mut Body, standing: bool, dt: f32) {
        body.vel.x += self.accel(standing) * dt;
        if body.vel.x > self.run_speed {
            body.vel.x = self.run_speed;
        }
        body.facing = FacingDir::Right;
    }

    /// Damp when not actively accelerating.
    pub fn damp_x(&self, body: &mut Body, standing: bool, dt: f32) {
        body.damp_x(self.accel(standing), dt);
    }
}
