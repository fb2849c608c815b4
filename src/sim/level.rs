//! The level: tile state, the entity arena, and the update loop.
//!
//! Entity lifecycle rules, which exist so entities can spawn and remove
//! each other mid-pass without invalidating the iteration:
//! - Spawns during an update pass are queued and only join the live set
//!   after every entity has updated.
//! - Nothing is removed mid-pass. An entity ends by setting `done`; the
//!   sweep at the end of the pass frees done entities back to the arena,
//!   invalidating their handles.
//! - While an entity updates it is moved out of its arena slot, so it can
//!   freely query and mutate every *other* entity through the level.

use std::collections::HashSet;

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::{GAME_HEIGHT_PX, GAME_WIDTH_PX, TILE_SIZE};
use crate::geom::{FacingDir, Rect};
use crate::input::Keys;
use crate::phys_from_px;
use crate::sim::bullet;
use crate::sim::camera::{Camera, CameraTarget};
use crate::sim::creature::{self, CREATURE_SIZE, Creature, CreatureBehavior};
use crate::sim::data::{self, EntityRecord, LevelData};
use crate::sim::entity::{Arena, Entity, EntityId, EntityKind, KindTag};
use crate::sim::guy::{self, GUY_SIZE, Guy, GuyKind, GuyPhase};
use crate::sim::player::{self, PLAYER_SIZE, Player};
use crate::sim::scenery::{
    self, COLUMN_SIZE, TORCH_SIZE, Torch, Trigger, WATERFALL_SIZE, Waterfall,
};
use crate::sim::tile::{BaseTile, ObjectTile, Tiles};

/// Sound cues raised by the simulation; the driver decides how (and
/// whether) to play them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Jump,
    DoubleJump,
    AirStall,
    Land,
    Hurt,
    ShootUnique,
    ShootNormal,
    ShootFire,
}

/// Observable events of one update pass, drained by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sfx(Sfx),
    Notification(String),
    ClearNotification,
    PlayerDied,
    PlayerRespawned,
    TerrainDestroyed { coord: IVec2 },
}

pub struct Level {
    pub tiles: Tiles,
    arena: Arena,
    /// Live entities in update order.
    order: Vec<EntityId>,
    live: HashSet<EntityId>,
    /// Spawned this pass; joins `order` at the end of the pass.
    pending: Vec<EntityId>,
    pub camera: Camera,
    pub player: Option<EntityId>,
    pub player_start: IVec2,
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
}

impl Level {
    pub fn new(width: i32, height: i32, seed: u64) -> Self {
        Self {
            tiles: Tiles::new(width, height),
            arena: Arena::new(),
            order: Vec::new(),
            live: HashSet::new(),
            pending: Vec::new(),
            camera: Camera::new(),
            player: None,
            player_start: IVec2::ZERO,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Build a level from serialized data. Loading is best-effort:
    /// unknown tile codes and entity kinds log a warning and are skipped.
    pub fn from_data(data: &LevelData, seed: u64) -> Self {
        let mut level = Self::new(data.width, data.height, seed);

        for y in 0..data.height {
            for x in 0..data.width {
                let coord = IVec2::new(x, y);
                match data.code(x, y) {
                    data::CODE_EMPTY => {}
                    data::CODE_WALL => {
                        level.tiles.base.set_tile_no_grow(coord, BaseTile::Wall);
                    }
                    data::CODE_PLATFORM => {
                        level.tiles.object.set_tile_no_grow(coord, ObjectTile::Platform);
                    }
                    data::CODE_DESTROYABLE => {
                        level
                            .tiles
                            .object
                            .set_tile_no_grow(coord, ObjectTile::Destroyable);
                    }
                    data::CODE_INVISIBLE_WALL => {
                        level
                            .tiles
                            .base
                            .set_tile_no_grow(coord, BaseTile::InvisibleWall);
                    }
                    code => log::warn!("unknown tile code {code} at {coord}"),
                }
            }
        }

        for record in &data.entities {
            level.add_record(record);
        }
        level.spawn_player();
        scenery::scatter_decor(&mut level);
        level
    }

    fn add_record(&mut self, record: &EntityRecord) {
        let pos = IVec2::new(phys_from_px(record.px.x), phys_from_px(record.px.y));
        match record.kind.as_str() {
            "Spawn" => {
                self.player_start = IVec2::new(pos.x, phys_from_px(record.px.y - 1));
            }
            "Lilguy" => {
                let guy = Guy::new(GuyKind::Unique, GuyPhase::Detached, &mut self.rng);
                let id = self.add_entity_now(GUY_SIZE, EntityKind::Guy(guy));
                if let Some(ent) = self.entity_mut(id) {
                    ent.body.rect.set_mid_x(pos.x);
                    ent.body.rect.set_max_y(pos.y);
                    ent.body.facing = FacingDir::Left;
                }
            }
            "Torch" | "InvisibleRespawn" => {
                let visible = record.kind == "Torch";
                let id = self.add_entity_now(TORCH_SIZE, EntityKind::Torch(Torch::new(visible)));
                if let Some(ent) = self.entity_mut(id) {
                    ent.body.rect.set_mid_x(pos.x);
                    ent.body.rect.set_max_y(pos.y);
                }
            }
            "CreatureEnemy" => {
                let behavior = match record.behavior.as_deref() {
                    Some("still") => CreatureBehavior::Still,
                    Some("cautious") => CreatureBehavior::CautiousRunning,
                    Some("running") | None => CreatureBehavior::Running,
                    Some(other) => {
                        log::warn!("unknown creature behavior {other:?}, using running");
                        CreatureBehavior::Running
                    }
                };
                let creature = Creature::new(behavior, record.fire);
                let id = self.add_entity_now(CREATURE_SIZE, EntityKind::Creature(creature));
                if let Some(ent) = self.entity_mut(id) {
                    ent.body.rect.set_mid_x(pos.x);
                    ent.body.rect.set_max_y(pos.y - 1);
                    ent.body.facing = if record.facing_left {
                        FacingDir::Left
                    } else {
                        FacingDir::Right
                    };
                }
            }
            "Column" => {
                let id = self.add_entity_now(COLUMN_SIZE, EntityKind::Column);
                if let Some(ent) = self.entity_mut(id) {
                    ent.body.rect.set_mid_x(pos.x);
                    ent.body.rect.set_max_y(pos.y);
                }
            }
            "WaterfallStart" => {
                let id = self
                    .add_entity_now(WATERFALL_SIZE, EntityKind::Waterfall(Waterfall::default()));
                if let Some(ent) = self.entity_mut(id) {
                    ent.body.rect.set_mid_x(pos.x);
                    ent.body.rect.set_mid_y(pos.y);
                    ent.body.gravity = 0.0;
                }
            }
            "TriggerArea" => {
                let size = record.size_px.unwrap_or(IVec2::new(16, 16));
                let size = IVec2::new(phys_from_px(size.x), phys_from_px(size.y));
                let stop_area = record.stop_area_px.as_ref().map(|area| {
                    Rect::new(
                        IVec2::new(phys_from_px(area.px.x), phys_from_px(area.px.y)),
                        IVec2::new(phys_from_px(area.size_px.x), phys_from_px(area.size_px.y)),
                    )
                });
                let trigger = Trigger::new(
                    record.name.clone().unwrap_or_default(),
                    record.message.clone(),
                    stop_area,
                );
                let id = self.add_entity_now(size, EntityKind::Trigger(trigger));
                if let Some(ent) = self.entity_mut(id) {
                    ent.body.rect.pos = pos;
                    ent.body.gravity = 0.0;
                }
            }
            kind => log::warn!("unknown entity kind: {kind}"),
        }
    }

    /// Create the player at the level's start point and aim the camera at
    /// them. Idempotent after the first call in the sense that the newest
    /// player wins the `player` handle.
    pub fn spawn_player(&mut self) {
        let start = self.player_start;
        let id = self.add_entity_now(PLAYER_SIZE, EntityKind::Player(Player::new()));
        if let Some(ent) = self.entity_mut(id) {
            ent.body.rect.set_mid_x(start.x);
            ent.body.rect.set_max_y(start.y);
        }
        self.player = Some(id);
        self.camera.push_target(CameraTarget::Entity(id));
    }

    /// Queue a new entity; it joins the live set at the end of the
    /// current pass (or on the next pass if called between passes).
    /// The returned handle is valid for positioning immediately.
    pub fn add_entity(&mut self, size: IVec2, kind: EntityKind) -> EntityId {
        let id = self
            .arena
            .insert_with(|id| Entity::new(id, IVec2::ZERO, size, kind));
        self.pending.push(id);
        id
    }

    /// Insert an entity into the live set immediately. For level
    /// construction, before the update loop starts.
    pub fn add_entity_now(&mut self, size: IVec2, kind: EntityKind) -> EntityId {
        let id = self
            .arena
            .insert_with(|id| Entity::new(id, IVec2::ZERO, size, kind));
        self.attach(id);
        id
    }

    /// Idempotent join of the live set.
    fn attach(&mut self, id: EntityId) {
        if self.live.insert(id) {
            self.order.push(id);
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id)
    }

    pub fn entity_count(&self) -> usize {
        self.order.len()
    }

    /// Live entities in update order. Skips the entity currently being
    /// updated (its slot is vacated for the duration of its update).
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|&id| self.arena.get(id))
    }

    pub fn ids_of(&self, tag: KindTag) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.arena.get(id).is_some_and(|e| e.kind.tag() == tag))
            .collect()
    }

    pub fn first_of(&self, tag: KindTag) -> Option<EntityId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.arena.get(id).is_some_and(|e| e.kind.tag() == tag))
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// One fixed simulation step.
    pub fn update(&mut self, keys: &Keys, dt: f32) {
        // Snapshot length: entities queued this pass do not update yet.
        let count = self.order.len();
        for i in 0..count {
            let id = self.order[i];
            let Some(mut ent) = self.arena.take(id) else {
                continue;
            };
            if !ent.done {
                ent.anim_time += dt;
                dispatch(&mut ent, self, keys, dt);
            }
            self.arena.restore(ent);
        }

        for id in std::mem::take(&mut self.pending) {
            self.attach(id);
        }

        // Sweep done entities, back to front so indices stay stable.
        let mut i = self.order.len();
        while i > 0 {
            i -= 1;
            let id = self.order[i];
            if self.arena.get(id).is_none_or(|e| e.done) {
                self.order.remove(i);
                self.live.remove(&id);
                self.arena.remove(id);
            }
        }

        self.update_camera(dt);
    }

    fn update_camera(&mut self, dt: f32) {
        let Some(target) = self.camera.target() else {
            return;
        };
        let point = match target {
            CameraTarget::Entity(id) => match self.arena.get(id) {
                // Focus between the feet: (mid x, bottom y).
                Some(ent) => Vec2::new(ent.rect().mid_x() as f32, ent.rect().max_y() as f32),
                None => return,
            },
            CameraTarget::Point(p) => p.as_vec2(),
        };
        self.camera.step(self.clamp_to_viewport(point), dt);
    }

    /// Keep the viewport inside the level: the focus point stays at least
    /// half a screen from the tracked tile bounds. Levels narrower than
    /// the viewport on an axis leave that axis unclamped.
    fn clamp_to_viewport(&self, point: Vec2) -> Vec2 {
        let half_w = phys_from_px(GAME_WIDTH_PX) as f32 / 2.0;
        let half_h = phys_from_px(GAME_HEIGHT_PX) as f32 / 2.0;
        let base = &self.tiles.base;
        let (lo_x, hi_x) = (
            (base.min_x() * TILE_SIZE) as f32 + half_w,
            ((base.max_x() + 1) * TILE_SIZE) as f32 - half_w,
        );
        let (lo_y, hi_y) = (
            (base.min_y() * TILE_SIZE) as f32 + half_h,
            ((base.max_y() + 1) * TILE_SIZE) as f32 - half_h,
        );
        Vec2::new(
            if lo_x <= hi_x { point.x.clamp(lo_x, hi_x) } else { point.x },
            if lo_y <= hi_y { point.y.clamp(lo_y, hi_y) } else { point.y },
        )
    }
}

fn dispatch(ent: &mut Entity, level: &mut Level, keys: &Keys, dt: f32) {
    match ent.kind.tag() {
        KindTag::Player => player::update(ent, level, keys, dt),
        KindTag::Guy => guy::update(ent, level, dt),
        KindTag::Creature => creature::update(ent, level, dt),
        KindTag::Bullet => bullet::update(ent, level, dt),
        KindTag::Torch => scenery::update_torch(ent, level, dt),
        KindTag::Trigger => scenery::update_trigger(ent, level),
        KindTag::Waterfall => scenery::update_waterfall(ent, level),
        KindTag::Column => {
            ent.body.apply_gravity(dt);
            let _ = ent.body.move_and_slide(&level.tiles, dt);
        }
        KindTag::Decor => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{TILE_SIZE, TIME_STEP};
    use crate::input::Key;

    /// A 64x20 level with a floor along tile row 10 and the player
    /// standing on it near the left edge.
    fn floor_level() -> Level {
        let mut level = Level::new(64, 20, 1);
        for x in 0..64 {
            level.tiles.base.set_tile(IVec2::new(x, 10), BaseTile::Wall);
        }
        level.player_start = IVec2::new(2 * TILE_SIZE, 10 * TILE_SIZE - 1);
        level.spawn_player();
        level
    }

    fn add_following_guy(level: &mut Level, kind: GuyKind) -> EntityId {
        let guy = Guy::new(kind, GuyPhase::Following, &mut level.rng);
        let id = level.add_entity_now(GUY_SIZE, EntityKind::Guy(guy));
        let player_id = level.player.unwrap();
        let (mid_x, max_y) = {
            let p = level.entity(player_id).unwrap();
            (p.rect().mid_x(), p.rect().max_y())
        };
        if let Some(ent) = level.entity_mut(id) {
            ent.body.rect.set_mid_x(mid_x);
            ent.body.rect.set_max_y(max_y);
        }
        let player = level
            .entity_mut(player_id)
            .unwrap()
            .as_player_mut()
            .unwrap();
        player.add_guy(id, kind);
        id
    }

    fn step(level: &mut Level, keys: &mut Keys) {
        level.update(keys, TIME_STEP);
        keys.reset_frame();
    }

    fn player_roster(level: &Level) -> (usize, usize) {
        let player = level
            .entity(level.player.unwrap())
            .unwrap()
            .as_player()
            .unwrap();
        (player.available_count(), player.known_count())
    }

    #[test]
    fn test_deferred_add_joins_after_the_pass() {
        let mut level = floor_level();
        let before = level.entity_count();

        let id = level.add_entity(GUY_SIZE, EntityKind::Column);
        // The handle is live in the arena but not yet in the update set.
        assert!(level.entity(id).is_some());
        assert_eq!(level.entity_count(), before);

        let mut keys = Keys::new();
        step(&mut level, &mut keys);
        assert_eq!(level.entity_count(), before + 1);
        assert_eq!(level.first_of(KindTag::Column), Some(id));
    }

    #[test]
    fn test_done_entities_swept_and_handles_invalidated() {
        let mut level = floor_level();
        let id = level.add_entity_now(GUY_SIZE, EntityKind::Column);
        level.entity_mut(id).unwrap().done = true;

        let mut keys = Keys::new();
        step(&mut level, &mut keys);
        assert!(level.entity(id).is_none());
        assert!(level.first_of(KindTag::Column).is_none());
    }

    #[test]
    fn test_detached_guy_collected_on_touch() {
        let mut level = floor_level();
        let player_id = level.player.unwrap();
        let player_rect = level.entity(player_id).unwrap().rect();

        let guy = Guy::new(GuyKind::Unique, GuyPhase::Detached, &mut level.rng);
        let id = level.add_entity_now(GUY_SIZE, EntityKind::Guy(guy));
        if let Some(ent) = level.entity_mut(id) {
            ent.body.rect.set_mid_x(player_rect.mid_x());
            ent.body.rect.set_max_y(player_rect.max_y());
        }

        let mut keys = Keys::new();
        step(&mut level, &mut keys);

        let phase = level.entity(id).unwrap().as_guy().unwrap().phase;
        assert_eq!(phase, GuyPhase::Following);
        assert_eq!(player_roster(&level), (1, 1));
    }

    #[test]
    fn test_bullet_destroys_terrain_and_spends_the_guy() {
        let mut level = floor_level();
        // A destroyable block in the bullet's path, one tile above the
        // floor, a few tiles to the right of the player.
        let block = IVec2::new(6, 9);
        level.tiles.object.set_tile(block, ObjectTile::Destroyable);
        let guy_id = add_following_guy(&mut level, GuyKind::Normal);

        let mut keys = Keys::new();
        keys.press(Key::Shoot);
        step(&mut level, &mut keys);
        keys.release(Key::Shoot);

        // The guy is consumed immediately, the bullet is in flight.
        assert_eq!(player_roster(&level), (0, 1));
        let in_flight = level.entity(guy_id).unwrap().as_guy().unwrap().phase;
        assert_eq!(in_flight, GuyPhase::InFlight);

        for _ in 0..60 {
            step(&mut level, &mut keys);
        }

        // Impact carved the block out and the non-unique guy is gone
        // for good: removed from the level and from both rosters.
        assert_eq!(level.tiles.object.get_tile(block), ObjectTile::Empty);
        assert!(level.entity(guy_id).is_none());
        assert_eq!(player_roster(&level), (0, 0));
        assert!(level.ids_of(KindTag::Bullet).is_empty());
        assert!(
            level
                .drain_events()
                .contains(&GameEvent::TerrainDestroyed { coord: block })
        );
    }

    #[test]
    fn test_unique_guy_returns_after_impact() {
        let mut level = floor_level();
        level
            .tiles
            .object
            .set_tile(IVec2::new(6, 9), ObjectTile::Destroyable);
        let guy_id = add_following_guy(&mut level, GuyKind::Unique);
        let player_id = level.player.unwrap();
        level
            .entity_mut(player_id)
            .unwrap()
            .as_player_mut()
            .unwrap()
            .selected_kind = GuyKind::Unique;

        let mut keys = Keys::new();
        keys.press(Key::Shoot);
        step(&mut level, &mut keys);
        keys.release(Key::Shoot);
        for _ in 0..60 {
            step(&mut level, &mut keys);
        }

        let guy = level.entity(guy_id).unwrap().as_guy().unwrap();
        assert_eq!(guy.phase, GuyPhase::Following);
        assert_eq!(player_roster(&level), (1, 1));
    }

    #[test]
    fn test_firing_three_times_with_two_available() {
        let mut level = floor_level();
        add_following_guy(&mut level, GuyKind::Normal);
        add_following_guy(&mut level, GuyKind::Normal);

        // Hold the shoot key for half a second: two shots fit within the
        // cooldown, the third attempt finds the roster empty.
        let mut keys = Keys::new();
        keys.press(Key::Shoot);
        for _ in 0..30 {
            step(&mut level, &mut keys);
        }

        assert_eq!(level.ids_of(KindTag::Bullet).len(), 2);
        // Both fires popped "available" but not "known".
        assert_eq!(player_roster(&level), (0, 2));
    }

    #[test]
    fn test_player_dies_on_creature_and_respawns_at_torch() {
        let mut level = floor_level();
        let torch_id = level.add_entity_now(TORCH_SIZE, EntityKind::Torch(Torch::new(true)));
        if let Some(ent) = level.entity_mut(torch_id) {
            ent.body.rect.set_mid_x(50 * TILE_SIZE);
            ent.body.rect.set_max_y(10 * TILE_SIZE - 1);
        }

        let player_id = level.player.unwrap();
        let player_rect = level.entity(player_id).unwrap().rect();
        let creature = Creature::new(CreatureBehavior::Still, false);
        let creature_id = level.add_entity_now(CREATURE_SIZE, EntityKind::Creature(creature));
        if let Some(ent) = level.entity_mut(creature_id) {
            ent.body.rect.set_mid_x(player_rect.mid_x());
            ent.body.rect.set_max_y(player_rect.max_y());
        }

        let mut keys = Keys::new();
        step(&mut level, &mut keys);
        let events = level.drain_events();
        assert!(events.contains(&GameEvent::PlayerDied));
        assert!(
            level
                .entity(player_id)
                .unwrap()
                .as_player()
                .unwrap()
                .is_dead
        );

        // Jump respawns at the (only) torch.
        keys.press(Key::Jump);
        step(&mut level, &mut keys);
        let player = level.entity(player_id).unwrap();
        assert!(!player.as_player().unwrap().is_dead);
        assert_eq!(player.rect().mid_x(), 50 * TILE_SIZE);
        assert!(level.drain_events().contains(&GameEvent::PlayerRespawned));
    }

    #[test]
    fn test_camera_focus_trigger_pushes_and_pops() {
        let mut level = floor_level();
        let player_id = level.player.unwrap();
        let player_rect = level.entity(player_id).unwrap().rect();

        let trigger = Trigger::new("camera-focus".to_string(), None, None);
        let size = IVec2::new(2 * TILE_SIZE, 2 * TILE_SIZE);
        let trigger_id = level.add_entity_now(size, EntityKind::Trigger(trigger));
        let focus = {
            let ent = level.entity_mut(trigger_id).unwrap();
            ent.body.gravity = 0.0;
            ent.body.rect.set_mid_x(player_rect.mid_x());
            ent.body.rect.set_mid_y(player_rect.mid_y());
            ent.body.rect.mid()
        };

        let mut keys = Keys::new();
        step(&mut level, &mut keys);
        assert_eq!(level.camera.target(), Some(CameraTarget::Point(focus)));

        // Walking out of the area hands the camera back to the player.
        if let Some(ent) = level.entity_mut(player_id) {
            ent.body.rect.set_mid_x(player_rect.mid_x() + 20 * TILE_SIZE);
        }
        step(&mut level, &mut keys);
        assert_eq!(
            level.camera.target(),
            Some(CameraTarget::Entity(player_id))
        );
    }

    #[test]
    fn test_camera_stays_half_a_viewport_from_the_edge() {
        let mut level = floor_level();
        let mut keys = Keys::new();
        step(&mut level, &mut keys);

        // The player stands near the left edge; the camera stops half a
        // viewport in. Vertically there is room, so y tracks the feet.
        let pos = level.camera.pos().unwrap();
        assert_eq!(pos.x, phys_from_px(GAME_WIDTH_PX) as f32 / 2.0);
        let player_max_y = level
            .entity(level.player.unwrap())
            .unwrap()
            .rect()
            .max_y();
        assert_eq!(pos.y, player_max_y as f32);
    }

    #[test]
    fn test_torch_brings_back_known_guys() {
        let mut level = floor_level();
        let guy_id = add_following_guy(&mut level, GuyKind::Normal);
        // Strand the guy far to the right; its own teleport takes a full
        // second, so any quick return is the torch's doing.
        if let Some(ent) = level.entity_mut(guy_id) {
            ent.body.rect.set_mid_x(60 * TILE_SIZE);
            ent.body.rect.set_max_y(10 * TILE_SIZE - 1);
        }

        let player_rect = level.entity(level.player.unwrap()).unwrap().rect();
        let torch_id = level.add_entity_now(TORCH_SIZE, EntityKind::Torch(Torch::new(true)));
        if let Some(ent) = level.entity_mut(torch_id) {
            ent.body.rect.set_mid_x(player_rect.mid_x());
            ent.body.rect.set_max_y(player_rect.max_y());
        }
        let torch_mid_x = level.entity(torch_id).unwrap().rect().mid_x();

        let mut keys = Keys::new();
        // First step queues the known guys, the second pops one out.
        step(&mut level, &mut keys);
        step(&mut level, &mut keys);

        let guy_ent = level.entity(guy_id).unwrap();
        assert_eq!(guy_ent.rect().mid_x(), torch_mid_x);
        assert!(guy_ent.body.vel.y < 0.0);
        assert_eq!(player_roster(&level), (1, 1));
    }

    #[test]
    fn test_touching_a_torch_activates_it_and_douses_the_rest() {
        let mut level = floor_level();
        let player_rect = level.entity(level.player.unwrap()).unwrap().rect();

        let near = level.add_entity_now(TORCH_SIZE, EntityKind::Torch(Torch::new(true)));
        if let Some(ent) = level.entity_mut(near) {
            ent.body.rect.set_mid_x(player_rect.mid_x());
            ent.body.rect.set_max_y(player_rect.max_y());
        }
        let far = level.add_entity_now(TORCH_SIZE, EntityKind::Torch(Torch::new(true)));
        if let Some(ent) = level.entity_mut(far) {
            ent.body.rect.set_mid_x(40 * TILE_SIZE);
            ent.body.rect.set_max_y(10 * TILE_SIZE - 1);
            if let EntityKind::Torch(t) = &mut ent.kind {
                t.is_active = true;
            }
        }

        let mut keys = Keys::new();
        step(&mut level, &mut keys);

        let is_active = |level: &Level, id| {
            matches!(
                level.entity(id).map(|e| &e.kind),
                Some(EntityKind::Torch(t)) if t.is_active
            )
        };
        assert!(is_active(&level, near));
        assert!(!is_active(&level, far));
    }
}
