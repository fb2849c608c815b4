//! Non-combat level furniture: respawn torches, cutscene trigger areas,
//! waterfalls, columns, and decorative scatter.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{FPS, PHYSICS_SCALE, TILE_SIZE};
use crate::geom::{Rect, lerp};
use crate::sim::camera::CameraTarget;
use crate::sim::entity::{Entity, EntityId, EntityKind, KindTag};
use crate::sim::guy::GuyPhase;
use crate::sim::level::{GameEvent, Level};
use crate::sim::tile::{BaseTile, tile_coord};

pub const TORCH_SIZE: IVec2 = IVec2::new(16 * PHYSICS_SCALE, 16 * PHYSICS_SCALE);
pub const COLUMN_SIZE: IVec2 = IVec2::new(16 * PHYSICS_SCALE, 32 * PHYSICS_SCALE);
pub const WATERFALL_SIZE: IVec2 = IVec2::new(16 * PHYSICS_SCALE, 16 * PHYSICS_SCALE);

/// How long after contact a torch treats the player as still touching.
const TOUCHING_PLAYER_COOLDOWN: f32 = 0.5;
/// Delay between consecutive guy respawns at a torch.
const SPAWN_COOLDOWN: f32 = 0.1;

/// Checkpoint. Touching it lights it (and snuffs every other torch) and
/// queues the player's known guys to be brought back one at a time.
#[derive(Debug, Clone)]
pub struct Torch {
    pub is_active: bool,
    pub visible: bool,
    touching_player_count: f32,
    bring_back: Vec<EntityId>,
    spawn_count: f32,
}

impl Torch {
    pub fn new(visible: bool) -> Self {
        Self {
            is_active: false,
            visible,
            touching_player_count: 0.0,
            bring_back: Vec::new(),
            spawn_count: 0.0,
        }
    }
}

pub(crate) fn update_torch(ent: &mut Entity, level: &mut Level, dt: f32) {
    let EntityKind::Torch(torch) = &mut ent.kind else {
        return;
    };
    if torch.touching_player_count > 0.0 {
        torch.touching_player_count -= dt;
    }
    if torch.spawn_count > 0.0 {
        torch.spawn_count -= dt;
    }
    if torch.spawn_count <= 0.0 {
        bring_back_a_guy(ent, level);
    }

    ent.body.apply_gravity(dt);
    ent.body.move_and_slide(&level.tiles, dt);

    let Some(player_id) = level.player else {
        return;
    };
    let touching = level
        .entity(player_id)
        .is_some_and(|player| player.is_touching(ent));
    if !touching {
        return;
    }

    let fresh_touch =
        matches!(&ent.kind, EntityKind::Torch(t) if t.touching_player_count <= 0.0);
    if fresh_touch {
        // This torch becomes the active checkpoint; all others go dark.
        for id in level.ids_of(KindTag::Torch) {
            if let Some(EntityKind::Torch(other)) =
                level.entity_mut(id).map(|e| &mut e.kind)
            {
                other.is_active = false;
            }
        }
        let known = level
            .entity(player_id)
            .and_then(Entity::as_player)
            .map(|p| p.known.clone())
            .unwrap_or_default();
        if let EntityKind::Torch(torch) = &mut ent.kind {
            torch.is_active = true;
            torch.bring_back = known;
        }
    }
    if let EntityKind::Torch(torch) = &mut ent.kind {
        torch.touching_player_count = TOUCHING_PLAYER_COOLDOWN;
    }
}

/// Revive the next queued guy at the torch. Stale handles (guys spent
/// for good since the queue was taken) are skipped; guys currently in
/// flight are left to their bullet.
fn bring_back_a_guy(ent: &mut Entity, level: &mut Level) {
    let EntityKind::Torch(torch) = &mut ent.kind else {
        return;
    };
    let Some(guy_id) = torch.bring_back.pop() else {
        return;
    };
    torch.spawn_count = SPAWN_COOLDOWN;
    let mid = ent.body.rect.mid();

    let vel_x = lerp(
        -1.0 * (PHYSICS_SCALE * FPS) as f32,
        1.0 * (PHYSICS_SCALE * FPS) as f32,
        level.rng.random(),
    );
    let vel_y = -1.5 * (PHYSICS_SCALE * FPS) as f32;

    let kind = {
        let Some(guy_ent) = level.entity_mut(guy_id) else {
            return;
        };
        let Some(guy) = guy_ent.as_guy_mut() else {
            return;
        };
        if guy.phase == GuyPhase::InFlight {
            return;
        }
        guy.phase = GuyPhase::Following;
        let kind = guy.kind;
        guy_ent.body.rect.set_mid_x(mid.x);
        guy_ent.body.rect.set_mid_y(mid.y);
        guy_ent.body.vel = glam::Vec2::new(vel_x, vel_y);
        kind
    };

    if let Some(player) = level
        .player
        .and_then(|id| level.entity_mut(id))
        .and_then(Entity::as_player_mut)
    {
        player.add_guy(guy_id, kind);
    }
}

/// Rectangular area that fires once when the player enters and once when
/// they leave. What it does is keyed by name, matching the level data.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: String,
    pub message: Option<String>,
    /// Entering this area retires the trigger entirely.
    pub stop_area: Option<Rect>,
    is_triggered: bool,
}

impl Trigger {
    pub fn new(name: String, message: Option<String>, stop_area: Option<Rect>) -> Self {
        Self {
            name,
            message,
            stop_area,
            is_triggered: false,
        }
    }
}

pub(crate) fn update_trigger(ent: &mut Entity, level: &mut Level) {
    let Some(player_rect) = level
        .player
        .and_then(|id| level.entity(id))
        .map(|p| p.rect())
    else {
        return;
    };
    let in_range = ent.body.rect.overlaps(&player_rect);

    let was_triggered = matches!(&ent.kind, EntityKind::Trigger(t) if t.is_triggered);
    if in_range && !was_triggered {
        fire_trigger(ent, level);
    }
    if !in_range && was_triggered {
        release_trigger(ent, level);
    }
    if let EntityKind::Trigger(trigger) = &mut ent.kind {
        trigger.is_triggered = in_range;
        if let Some(stop) = &trigger.stop_area {
            if stop.overlaps(&player_rect) {
                ent.done = true;
            }
        }
    }
}

fn fire_trigger(ent: &Entity, level: &mut Level) {
    let EntityKind::Trigger(trigger) = &ent.kind else {
        return;
    };
    match trigger.name.as_str() {
        "camera-focus" => {
            level
                .camera
                .push_target(CameraTarget::Point(ent.body.rect.mid()));
        }
        "float" => {
            level.events.push(GameEvent::Notification(
                "The grey creatures' secondary ability lets you glide over gaps \
                 by holding the jump button in the air."
                    .to_string(),
            ));
        }
        "message" | "halfway" => {
            level.events.push(GameEvent::Notification(
                trigger.message.clone().unwrap_or_default(),
            ));
        }
        name => log::warn!("unknown trigger name: {name}"),
    }
}

fn release_trigger(ent: &Entity, level: &mut Level) {
    let EntityKind::Trigger(trigger) = &ent.kind else {
        return;
    };
    match trigger.name.as_str() {
        "halfway" => level.events.push(GameEvent::ClearNotification),
        "camera-focus" => level.camera.pop_target(),
        _ => {}
    }
}

/// Waterfall head. Its length (in tiles, down to the first wall) is
/// probed lazily on the first update and cached.
#[derive(Debug, Clone, Default)]
pub struct Waterfall {
    pub length: Option<i32>,
}

pub(crate) fn update_waterfall(ent: &mut Entity, level: &mut Level) {
    let already_measured = matches!(&ent.kind, EntityKind::Waterfall(w) if w.length.is_some());
    if already_measured {
        return;
    }

    let mid_x = ent.body.rect.mid_x();
    let max_y = ent.body.rect.max_y();
    let bottom = level.tiles.base.max_y();
    let mut length = 1;
    loop {
        let p = IVec2::new(mid_x, max_y + length * TILE_SIZE);
        if level.tiles.base.get_tile_at_coord(p) == BaseTile::Wall {
            break;
        }
        if tile_coord(p).y > bottom {
            // Open bottom; the fall runs off the level.
            break;
        }
        length += 1;
    }
    log::debug!("waterfall length = {length}");
    if let EntityKind::Waterfall(w) = &mut ent.kind {
        w.length = Some(length);
    }
}

/// Decorative sprite pinned to a tile.
#[derive(Debug, Clone)]
pub struct Decor {
    pub frame: u8,
}

/// Scatter decor sprites along wall surfaces. Seeded independently of
/// the gameplay RNG so the same level always decorates the same way.
pub(crate) fn scatter_decor(level: &mut Level) {
    let mut rng = Pcg32::seed_from_u64(0x6a73_6b6c);

    let (min_x, max_x) = (level.tiles.base.min_x(), level.tiles.base.max_x());
    let (min_y, max_y) = (level.tiles.base.min_y(), level.tiles.base.max_y());
    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let at = |dx: i32, dy: i32| level.tiles.base.get_tile(IVec2::new(x + dx, y + dy));
            if at(0, 0) != BaseTile::Empty {
                continue;
            }
            // One frame range per supporting surface orientation.
            let ranges: &[(bool, u8)] = &[
                (at(0, 1) == BaseTile::Wall, 0),
                (at(0, -1) == BaseTile::Wall, 2),
                (at(-1, 0) == BaseTile::Wall, 4),
                (at(1, 0) == BaseTile::Wall, 6),
            ];
            for &(against_wall, frame_base) in ranges {
                if !against_wall || rng.random::<f32>() > 0.2 {
                    continue;
                }
                let frame = frame_base + rng.random_range(0..2);
                let pos = IVec2::new(x, y) * TILE_SIZE;
                let id = level.add_entity_now(
                    IVec2::new(TILE_SIZE, TILE_SIZE),
                    EntityKind::Decor(Decor { frame }),
                );
                if let Some(decor) = level.entity_mut(id) {
                    decor.body.rect.pos = pos;
                    decor.body.gravity = 0.0;
                }
            }
        }
    }
}
