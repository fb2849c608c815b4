//! The lil guys: small companions that follow the player around and get
//! fired out of the gun.
//!
//! A guy is always in one of three phases. `Detached` guys sit where they
//! spawned (hopping in place now and then) until the player touches them.
//! `Following` guys chase the player with deliberately imperfect AI:
//! each guy rolls its own reaction delay and follow distance at spawn so
//! a crowd of them trails the player raggedly instead of stacking on one
//! point. `InFlight` guys are currently riding inside a bullet and are
//! not simulated at all until the bullet ends.

use glam::IVec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::consts::{FPS, PHYSICS_SCALE, TILE_SIZE};
use crate::geom::{FacingDir, lerp};
use crate::phys_from_px;
use crate::sim::body::Runner;
use crate::sim::entity::{Entity, EntityKind};
use crate::sim::level::Level;

pub const GUY_SIZE: IVec2 = IVec2::new(3 * PHYSICS_SCALE, 3 * PHYSICS_SCALE);

const JUMP_SPEED: f32 = 3.0 * (PHYSICS_SCALE * FPS) as f32;
const SMALL_JUMP_SPEED: f32 = 1.0 * (PHYSICS_SCALE * FPS) as f32;
const MAX_FALL_SPEED: f32 = 3.0 * (PHYSICS_SCALE * FPS) as f32;
/// Velocity noise added when teleporting to the player, so a clump of
/// teleported guys scatters.
const SPEED_NOISE: f32 = 0.1 * (PHYSICS_SCALE * FPS) as f32;
/// How long a guy tolerates being too far behind before teleporting.
const MAX_TOO_FAR_SECS: f32 = 1.0;

fn guy_runner() -> Runner {
    Runner {
        run_speed: 1.5 * (PHYSICS_SCALE * FPS) as f32,
        ground_accel: 0.35 * (PHYSICS_SCALE * FPS * FPS) as f32 / 2.0,
        air_accel: 0.125 * (PHYSICS_SCALE * FPS * FPS) as f32 / 2.0,
    }
}

/// Companion kind. Whether a fired guy comes back is per-kind data, not
/// behavior: the unique guy always returns, the rest are spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuyKind {
    Unique,
    Normal,
    Fire,
}

impl GuyKind {
    pub fn respawns_after_firing(self) -> bool {
        matches!(self, GuyKind::Unique)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuyPhase {
    /// Spawned but not yet collected; waits to be touched.
    Detached,
    /// On the player's roster, chasing the player.
    Following,
    /// Consumed as ammo; carried by a live bullet, not simulated.
    InFlight,
}

#[derive(Debug, Clone)]
pub struct Guy {
    pub kind: GuyKind,
    pub phase: GuyPhase,
    runner: Runner,
    /// Reaction delay before this guy starts chasing, seconds.
    reflex_time: f32,
    jump_reflex_time: f32,
    reflex_count: f32,
    jump_count: f32,
    trying_to_jump: bool,
    too_far_count: f32,
    /// Preferred follow distance, physics units.
    closeness: i32,
}

impl Guy {
    pub fn new(kind: GuyKind, phase: GuyPhase, rng: &mut Pcg32) -> Self {
        let reflex_time = lerp(0.0, 0.3, rng.random());
        Self {
            kind,
            phase,
            runner: guy_runner(),
            reflex_time,
            jump_reflex_time: reflex_time + 0.1,
            reflex_count: 0.0,
            jump_count: 0.0,
            trying_to_jump: false,
            too_far_count: 0.0,
            closeness: lerp(phys_from_px(5) as f32, phys_from_px(15) as f32, rng.random()) as i32,
        }
    }
}

/// Knocked loose (e.g. out of a dying creature): pop upward with a
/// random horizontal fling.
pub fn random_knockback(rng: &mut Pcg32) -> (glam::Vec2, FacingDir) {
    let run_speed = guy_runner().run_speed;
    let vel = glam::Vec2::new(lerp(-run_speed, run_speed, rng.random()), -SMALL_JUMP_SPEED);
    let facing = if rng.random::<f32>() < 0.5 {
        FacingDir::Left
    } else {
        FacingDir::Right
    };
    (vel, facing)
}

pub(crate) fn update(ent: &mut Entity, level: &mut Level, dt: f32) {
    let EntityKind::Guy(guy) = &mut ent.kind else {
        return;
    };
    if guy.phase == GuyPhase::InFlight {
        return;
    }

    if guy.jump_count >= 0.0 {
        guy.jump_count -= dt;
    }

    let phase = guy.phase;
    match phase {
        GuyPhase::Detached => wait_for_player(ent, level, dt),
        GuyPhase::Following => follow_player(ent, level, dt),
        GuyPhase::InFlight => unreachable!(),
    }

    ent.body.limit_fall_speed(MAX_FALL_SPEED, dt);
    ent.body.apply_gravity(dt);

    // Guys bounce off walls instead of stopping against them.
    let pre_dx = ent.body.vel.x;
    let hits = ent.body.move_and_slide(&level.tiles, dt);
    if hits.left || hits.right {
        ent.body.vel.x = -pre_dx;
    }
}

fn wait_for_player(ent: &mut Entity, level: &mut Level, dt: f32) {
    let Some(player_id) = level.player else {
        return;
    };
    let touching = level
        .entity(player_id)
        .is_some_and(|player| player.is_touching(ent));

    if touching {
        if let EntityKind::Guy(guy) = &mut ent.kind {
            guy.phase = GuyPhase::Following;
        }
        let (id, kind) = (ent.id, guy_kind(ent));
        if let Some(player) = level.entity_mut(player_id).and_then(Entity::as_player_mut) {
            player.add_guy(id, kind);
        }
        follow_player(ent, level, dt);
    } else {
        let standing = ent.body.is_standing(&level.tiles);
        if let EntityKind::Guy(guy) = &ent.kind {
            guy.runner.clone().damp_x(&mut ent.body, standing, dt);
        }
        maybe_small_jump(ent, level);
    }
}

fn follow_player(ent: &mut Entity, level: &mut Level, dt: f32) {
    let Some(player) = level.player.and_then(|id| level.entity(id)) else {
        return;
    };
    let player_mid_x = player.rect().mid_x();
    let player_max_y = player.rect().max_y();
    let player_vel = player.body.vel;

    let standing = ent.body.is_standing(&level.tiles);
    let mid_x = ent.rect().mid_x();
    let max_y = ent.rect().max_y();

    let EntityKind::Guy(guy) = &mut ent.kind else {
        return;
    };
    let runner = guy.runner.clone();

    // Chase horizontally, but only after the guy's own reaction delay.
    if mid_x < player_mid_x - guy.closeness {
        guy.reflex_count += dt;
        if guy.reflex_count > guy.reflex_time {
            runner.run_right(&mut ent.body, standing, dt);
        }
    } else if mid_x > player_mid_x + guy.closeness {
        guy.reflex_count += dt;
        if guy.reflex_count > guy.reflex_time {
            runner.run_left(&mut ent.body, standing, dt);
        }
    } else {
        guy.reflex_count = 0.0;
        runner.damp_x(&mut ent.body, standing, dt);
    }

    // Left hopelessly behind (much less leniency vertically): give up
    // pathing and teleport onto the player.
    let y_diff = (max_y - player_max_y).abs();
    let x_diff = (mid_x - player_mid_x).abs();
    let too_far = y_diff > 3 * TILE_SIZE / 2 || x_diff > 8 * TILE_SIZE;
    if too_far {
        guy.too_far_count += dt;
        if guy.too_far_count > MAX_TOO_FAR_SECS {
            guy.too_far_count = 0.0;
            ent.body.rect.set_mid_x(player_mid_x);
            ent.body.rect.set_max_y(player_max_y);
            ent.body.vel.x = player_vel.x + lerp(-SPEED_NOISE, SPEED_NOISE, level.rng.random());
            ent.body.vel.y = player_vel.y + lerp(-SPEED_NOISE, SPEED_NOISE, level.rng.random());
            return;
        }
    } else {
        guy.too_far_count = 0.0;
    }

    let player_is_above = player_max_y < max_y - TILE_SIZE;
    if player_is_above {
        if !guy.trying_to_jump {
            guy.trying_to_jump = true;
            guy.jump_count = guy.jump_reflex_time;
        }
    } else {
        guy.trying_to_jump = false;
    }

    if standing {
        if guy.trying_to_jump && guy.jump_count <= 0.0 && player_is_above {
            ent.body.vel.y = -JUMP_SPEED;
            guy.trying_to_jump = false;
            guy.jump_count = 0.0;
        } else {
            maybe_small_jump(ent, level);
        }
    }
}

/// Idle fidgeting: occasionally do a small hop.
fn maybe_small_jump(ent: &mut Entity, level: &mut Level) {
    if level.rng.random::<f32>() < 0.03 {
        ent.body.vel.y = -SMALL_JUMP_SPEED;
    }
}

fn guy_kind(ent: &Entity) -> GuyKind {
    match &ent.kind {
        EntityKind::Guy(g) => g.kind,
        _ => GuyKind::Normal,
    }
}
