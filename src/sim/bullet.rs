//! Bullets: a fired lil guy in projectile form.
//!
//! A bullet flies straight (no gravity) until it hits a wall, hits a
//! creature, or times out. Ending the bullet resolves the carried guy:
//! a unique guy lands at the impact point and resumes following, any
//! other kind is spent and leaves the roster for good. Wall impacts also
//! carve terrain: destroyable blocks and invisible walls are flood-filled
//! away at the impact point before the bullet resolves.

use glam::IVec2;

use crate::consts::{FPS, PHYSICS_SCALE};
use crate::geom::Dir;
use crate::phys_from_px;
use crate::sim::body::Hits;
use crate::sim::creature;
use crate::sim::entity::{Entity, EntityId, EntityKind, KindTag};
use crate::sim::guy::GuyPhase;
use crate::sim::level::{GameEvent, Level};
use crate::sim::tile::{BaseTile, ObjectTile};

pub const BULLET_SIZE: IVec2 = IVec2::new(4 * PHYSICS_SCALE, 4 * PHYSICS_SCALE);

const SPEED: f32 = 6.0 * (PHYSICS_SCALE * FPS) as f32;
/// Bullets last 3 seconds.
const LIFETIME_SECS: f32 = 3.0;

#[derive(Debug, Clone)]
pub struct Bullet {
    /// The guy riding this bullet.
    pub guy_id: EntityId,
    pub dir: Dir,
}

impl Bullet {
    pub fn new(guy_id: EntityId, dir: Dir) -> Self {
        Self { guy_id, dir }
    }
}

/// Point the body along `dir`: full speed on that axis, and the hitbox
/// stretched along the travel axis so fast bullets read as a streak.
pub fn set_direction(ent: &mut Entity, dir: Dir) {
    let point = dir.to_point();
    ent.body.vel.x = point.x as f32 * SPEED;
    ent.body.vel.y = point.y as f32 * SPEED;
    if point.x != 0 {
        ent.body.rect.size.x = phys_from_px(16);
    }
    if point.y != 0 {
        ent.body.rect.size.y = phys_from_px(16);
    }
    if let EntityKind::Bullet(b) = &mut ent.kind {
        b.dir = dir;
    }
}

pub(crate) fn update(ent: &mut Entity, level: &mut Level, dt: f32) {
    let hits = ent.body.move_and_slide(&level.tiles, dt);
    if hits.any() {
        carve_terrain(ent, level, &hits);
        end_bullet(ent, level);
    }

    // Tile hits take precedence; only a still-live bullet can hit a
    // creature in the same frame.
    if !ent.done {
        let dir = match &ent.kind {
            EntityKind::Bullet(b) => b.dir,
            _ => return,
        };
        for id in level.ids_of(KindTag::Creature) {
            let touching = level.entity(id).is_some_and(|c| c.is_touching(ent));
            if touching {
                creature::hurt(level, id, dir);
                end_bullet(ent, level);
                break;
            }
        }
    }

    if !ent.done && ent.anim_time > LIFETIME_SECS {
        end_bullet(ent, level);
    }
}

/// Flood-fill away destroyable blocks and invisible walls at the point
/// just past the edge that hit.
fn carve_terrain(ent: &mut Entity, level: &mut Level, hits: &Hits) {
    let rect = ent.body.rect;
    let impact = if hits.right {
        IVec2::new(rect.max_x() + 1, rect.mid_y())
    } else if hits.left {
        IVec2::new(rect.min_x() - 1, rect.mid_y())
    } else if hits.down {
        IVec2::new(rect.mid_x(), rect.max_y() + 1)
    } else {
        IVec2::new(rect.mid_x(), rect.min_y() - 1)
    };

    if level.tiles.object.get_tile_at_coord(impact) == ObjectTile::Destroyable {
        level
            .tiles
            .object
            .flood_fill_at_coord(impact, ObjectTile::Destroyable, ObjectTile::Empty);
        level.events.push(GameEvent::TerrainDestroyed {
            coord: crate::sim::tile::tile_coord(impact),
        });
    }
    if level.tiles.base.get_tile_at_coord(impact) == BaseTile::InvisibleWall {
        level
            .tiles
            .base
            .flood_fill_at_coord(impact, BaseTile::InvisibleWall, BaseTile::Empty);
    }
}

/// End-of-life for the bullet and resolution for the carried guy.
/// Idempotent: tile hit, creature hit, and lifetime expiry may all fire
/// in one frame, and only the first takes effect.
pub fn end_bullet(ent: &mut Entity, level: &mut Level) {
    if ent.done {
        return;
    }
    ent.done = true;

    let EntityKind::Bullet(bullet) = &ent.kind else {
        return;
    };
    let guy_id = bullet.guy_id;
    let mid = ent.body.rect.mid();

    let respawns = {
        let Some(guy_ent) = level.entity_mut(guy_id) else {
            return;
        };
        let Some(guy) = guy_ent.as_guy_mut() else {
            return;
        };
        if guy.kind.respawns_after_firing() {
            guy.phase = GuyPhase::Following;
            guy_ent.body.rect.set_mid_x(mid.x);
            guy_ent.body.rect.set_mid_y(mid.y);
            guy_ent.body.vel = glam::Vec2::ZERO;
            true
        } else {
            guy_ent.done = true;
            false
        }
    };

    let kind = level
        .entity(guy_id)
        .and_then(Entity::as_guy)
        .map(|g| g.kind);
    if let Some(player) = level
        .player
        .and_then(|id| level.entity_mut(id))
        .and_then(Entity::as_player_mut)
    {
        if respawns {
            if let Some(kind) = kind {
                player.add_guy(guy_id, kind);
            }
        } else {
            player.discard_guy(guy_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::guy::{GUY_SIZE, Guy, GuyKind};
    use crate::sim::level::Level;

    fn level_with_inflight_guy(kind: GuyKind) -> (Level, EntityId) {
        let mut level = Level::new(16, 16, 5);
        level.spawn_player();
        let guy = Guy::new(kind, GuyPhase::InFlight, &mut level.rng);
        let guy_id = level.add_entity_now(GUY_SIZE, EntityKind::Guy(guy));
        (level, guy_id)
    }

    #[test]
    fn test_end_bullet_is_idempotent() {
        let (mut level, guy_id) = level_with_inflight_guy(GuyKind::Unique);
        let mut ent = Entity::new(
            EntityId::for_test(99),
            IVec2::new(1000, 1000),
            BULLET_SIZE,
            EntityKind::Bullet(Bullet::new(guy_id, Dir::Right)),
        );

        end_bullet(&mut ent, &mut level);
        assert!(ent.done);
        let guy = level.entity(guy_id).unwrap().as_guy().unwrap();
        assert_eq!(guy.phase, GuyPhase::Following);
        let roster = |level: &Level| {
            let player = level.entity(level.player.unwrap()).unwrap();
            let p = player.as_player().unwrap();
            (p.available_count(), p.known_count())
        };
        assert_eq!(roster(&level), (1, 1));

        // The second resolution must not double-add.
        end_bullet(&mut ent, &mut level);
        assert_eq!(roster(&level), (1, 1));
    }

    #[test]
    fn test_end_bullet_spends_non_unique_guys() {
        let (mut level, guy_id) = level_with_inflight_guy(GuyKind::Fire);
        let mut ent = Entity::new(
            EntityId::for_test(99),
            IVec2::ZERO,
            BULLET_SIZE,
            EntityKind::Bullet(Bullet::new(guy_id, Dir::Left)),
        );

        end_bullet(&mut ent, &mut level);
        assert!(level.entity(guy_id).unwrap().done);
    }
}
