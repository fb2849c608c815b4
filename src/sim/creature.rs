//! Creature enemies.
//!
//! Creatures sleep until the player gets close, then run in their facing
//! direction, turning when they hit a wall. The cautious variant also
//! probes the ground one half-body ahead and turns at ledges. A creature
//! killed by a bullet releases a detached lil guy of its own kind.

use glam::IVec2;

use crate::consts::{FPS, PHYSICS_SCALE};
use crate::geom::{Dir, FacingDir};
use crate::sim::body::Runner;
use crate::sim::entity::{Entity, EntityId, EntityKind};
use crate::sim::guy::{self, Guy, GuyKind, GuyPhase};
use crate::sim::level::Level;
use crate::sim::tile::PhysicTile;

pub const CREATURE_SIZE: IVec2 = IVec2::new(13 * PHYSICS_SCALE, 10 * PHYSICS_SCALE);

const HURT_JUMP_SPEED: f32 = 1.5 * (PHYSICS_SCALE * FPS) as f32;
const HURT_X_SPEED: f32 = 1.5 * (PHYSICS_SCALE * FPS) as f32;
const MAX_FALL_SPEED: f32 = 3.0 * (PHYSICS_SCALE * FPS) as f32;
/// How long the hurt flash lasts after taking a hit, seconds.
pub const HURT_FLASH_SECS: f32 = 0.1;
/// The player must be this close on both axes to wake a creature.
const DIST_TO_AWAKEN: i32 = 100 * PHYSICS_SCALE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureBehavior {
    /// Stands in place; knocked back when shot.
    Still,
    Running,
    /// Runs, but turns around at ledges.
    CautiousRunning,
}

#[derive(Debug, Clone)]
pub struct Creature {
    pub behavior: CreatureBehavior,
    started_running: bool,
    health: i32,
    /// Remaining hurt-flash time, seconds; drives the damage flash.
    pub hurt_count: f32,
    /// Kind of the guy released when this creature dies.
    pub guy_kind: GuyKind,
    runner: Runner,
}

impl Creature {
    pub fn new(behavior: CreatureBehavior, fire: bool) -> Self {
        let mut run_speed = match behavior {
            CreatureBehavior::CautiousRunning => 0.7 * (PHYSICS_SCALE * FPS) as f32,
            _ => 1.0 * (PHYSICS_SCALE * FPS) as f32,
        };
        let (guy_kind, health) = if fire {
            run_speed *= 1.2;
            (GuyKind::Fire, 3)
        } else {
            (GuyKind::Normal, 2)
        };
        Self {
            behavior,
            started_running: false,
            health,
            hurt_count: 0.0,
            guy_kind,
            runner: Runner {
                run_speed,
                ..Runner::default()
            },
        }
    }
}

pub(crate) fn update(ent: &mut Entity, level: &mut Level, dt: f32) {
    let EntityKind::Creature(creature) = &mut ent.kind else {
        return;
    };
    if creature.hurt_count > 0.0 {
        creature.hurt_count -= dt;
    }
    let behavior = creature.behavior;

    match behavior {
        CreatureBehavior::Still => {
            let standing = ent.body.is_standing(&level.tiles);
            if let EntityKind::Creature(c) = &ent.kind {
                c.runner.clone().damp_x(&mut ent.body, standing, dt);
            }
        }
        CreatureBehavior::Running => update_running(ent, level, false, dt),
        CreatureBehavior::CautiousRunning => update_running(ent, level, true, dt),
    }

    ent.body.limit_fall_speed(MAX_FALL_SPEED, dt);
    ent.body.apply_gravity(dt);

    let hits = ent.body.move_and_slide(&level.tiles, dt);
    if hits.left {
        ent.body.facing = FacingDir::Right;
    } else if hits.right {
        ent.body.facing = FacingDir::Left;
    }
}

fn update_running(ent: &mut Entity, level: &mut Level, cautious: bool, dt: f32) {
    check_player_dist(ent, level);

    let started = matches!(&ent.kind, EntityKind::Creature(c) if c.started_running);
    let standing = ent.body.is_standing(&level.tiles);
    let runner = match &ent.kind {
        EntityKind::Creature(c) => c.runner.clone(),
        _ => return,
    };

    if !started {
        return;
    }
    if !standing {
        runner.damp_x(&mut ent.body, false, dt);
        return;
    }

    if cautious {
        // Probe the ground half a body ahead; turn before the drop.
        let check = IVec2::new(
            ent.body.rect.mid_x() + ent.body.facing.mult() * ent.body.rect.size.x / 2,
            ent.body.rect.max_y() + 1,
        );
        if level.tiles.physic_tile_at_coord(check) == PhysicTile::Empty {
            ent.body.facing = ent.body.facing.opposite();
        }
    }

    match ent.body.facing {
        FacingDir::Left => runner.run_left(&mut ent.body, true, dt),
        FacingDir::Right => runner.run_right(&mut ent.body, true, dt),
    }
}

fn check_player_dist(ent: &mut Entity, level: &Level) {
    let EntityKind::Creature(creature) = &mut ent.kind else {
        return;
    };
    if creature.started_running {
        return;
    }
    let Some(player) = level.player.and_then(|id| level.entity(id)) else {
        return;
    };
    let diff = player.rect().mid() - ent.body.rect.mid();
    if diff.x.abs() < DIST_TO_AWAKEN && diff.y.abs() < DIST_TO_AWAKEN {
        creature.started_running = true;
    }
}

/// Apply one bullet hit from direction `dir`. A dead creature is marked
/// done and releases a detached guy at its position.
pub fn hurt(level: &mut Level, id: EntityId, dir: Dir) {
    let Some(ent) = level.entity_mut(id) else {
        return;
    };
    let EntityKind::Creature(creature) = &mut ent.kind else {
        return;
    };

    creature.health -= 1;
    creature.hurt_count = HURT_FLASH_SECS;

    if creature.behavior == CreatureBehavior::Still {
        let knockback = dir
            .to_facing_dir()
            .unwrap_or_else(|| ent.body.facing.opposite());
        ent.body.vel.x = knockback.mult() as f32 * HURT_X_SPEED;
        ent.body.vel.y = -HURT_JUMP_SPEED;
    }

    if creature.health > 0 {
        return;
    }
    let mid = ent.body.rect.mid();
    let kind = creature.guy_kind;
    ent.done = true;

    let (vel, facing) = guy::random_knockback(&mut level.rng);
    let guy = Guy::new(kind, GuyPhase::Detached, &mut level.rng);
    let guy_id = level.add_entity(guy::GUY_SIZE, EntityKind::Guy(guy));
    if let Some(guy_ent) = level.entity_mut(guy_id) {
        guy_ent.body.rect.set_mid_x(mid.x);
        guy_ent.body.rect.set_mid_y(mid.y);
        guy_ent.body.vel = vel;
        guy_ent.body.facing = facing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{TILE_SIZE, TIME_STEP};
    use crate::input::Keys;
    use crate::sim::entity::KindTag;
    use crate::sim::level::Level;
    use crate::sim::tile::BaseTile;

    fn still_creature_on_floor() -> (Level, EntityId) {
        let mut level = Level::new(16, 16, 3);
        for x in 0..16 {
            level.tiles.base.set_tile(IVec2::new(x, 10), BaseTile::Wall);
        }
        let creature = Creature::new(CreatureBehavior::Still, false);
        let id = level.add_entity_now(CREATURE_SIZE, EntityKind::Creature(creature));
        if let Some(ent) = level.entity_mut(id) {
            ent.body.rect.set_mid_x(8 * TILE_SIZE);
            ent.body.rect.set_max_y(10 * TILE_SIZE - 1);
        }
        (level, id)
    }

    #[test]
    fn test_hurt_knocks_back_and_death_drops_a_guy() {
        let (mut level, id) = still_creature_on_floor();

        hurt(&mut level, id, Dir::Right);
        {
            let ent = level.entity(id).unwrap();
            assert!(!ent.done);
            // Knocked away from the hit, up and to the right.
            assert!(ent.body.vel.x > 0.0);
            assert!(ent.body.vel.y < 0.0);
            let EntityKind::Creature(c) = &ent.kind else {
                panic!("not a creature");
            };
            assert!(c.hurt_count > 0.0);
        }

        // Second hit kills a 2-health creature.
        hurt(&mut level, id, Dir::Right);
        assert!(level.entity(id).unwrap().done);

        // The sweep removes the creature and attaches the dropped guy.
        level.update(&Keys::new(), TIME_STEP);
        assert!(level.entity(id).is_none());
        let guys = level.ids_of(KindTag::Guy);
        assert_eq!(guys.len(), 1);
        let guy = level.entity(guys[0]).unwrap().as_guy().unwrap();
        assert_eq!(guy.phase, GuyPhase::Detached);
        assert_eq!(guy.kind, GuyKind::Normal);
    }
}
