//! The player: movement, wall slides, coyote time, and the lil-guy gun.
//!
//! Guys double as ammo and as double jumps. Both consume from the
//! "available" roster; "known" tracks every guy ever collected and only
//! shrinks when a guy is spent for good. Firing with nothing available
//! of the selected kind is a silent no-op.

use std::collections::HashSet;

use glam::IVec2;

use crate::consts::{FPS, PHYSICS_SCALE};
use crate::geom::{Dir, FacingDir};
use crate::input::{
    DOWN_KEYS, JUMP_KEYS, Key, Keys, LEFT_KEYS, RIGHT_KEYS, SHOOT_KEYS, SWITCH_WEAPON_KEYS,
    UP_KEYS,
};
use crate::phys_from_px;
use crate::sim::body::Runner;
use crate::sim::bullet::{self, BULLET_SIZE, Bullet};
use crate::sim::entity::{Entity, EntityId, EntityKind, KindTag};
use crate::sim::guy::{self, Guy, GuyKind, GuyPhase};
use crate::sim::level::{GameEvent, Level, Sfx};

pub const PLAYER_SIZE: IVec2 = IVec2::new(6 * PHYSICS_SCALE, 16 * PHYSICS_SCALE);

const JUMP_SPEED: f32 = 3.1 * (PHYSICS_SCALE * FPS) as f32;
const WALL_SLIDE_SPEED: f32 = 1.0 * (PHYSICS_SCALE * FPS) as f32;
const MAX_FALL_SPEED: f32 = 3.0 * (PHYSICS_SCALE * FPS) as f32;

// How long the player gets to jump after falling off a platform.
// 0.1 seems a little too lenient, but whatever :)
const COYOTE_TIME_SECS: f32 = 0.1;
const BULLET_COOLDOWN: f32 = 0.15;

#[derive(Debug, Clone)]
pub struct Player {
    runner: Runner,
    /// Coyote-time countdown: positive while a jump is still allowed.
    on_ground_count: f32,
    need_to_release_jump: bool,
    bullet_cooldown_count: f32,
    pub looking_up: bool,
    pub looking_down: bool,
    /// Guys that can be consumed right now.
    pub available: Vec<EntityId>,
    available_set: HashSet<EntityId>,
    /// Every guy ever collected; shrinks only on permanent discard.
    pub known: Vec<EntityId>,
    known_set: HashSet<EntityId>,
    /// Kinds ever collected, in discovery order; drives weapon cycling.
    pub found_kinds: Vec<GuyKind>,
    pub selected_kind: GuyKind,
    pub is_dead: bool,
}

impl Player {
    pub fn new() -> Self {
        Self {
            runner: Runner::default(),
            on_ground_count: 0.0,
            need_to_release_jump: true,
            bullet_cooldown_count: 0.0,
            looking_up: false,
            looking_down: false,
            available: Vec::new(),
            available_set: HashSet::new(),
            known: Vec::new(),
            known_set: HashSet::new(),
            found_kinds: vec![GuyKind::Normal],
            selected_kind: GuyKind::Normal,
            is_dead: false,
        }
    }

    /// Add a guy to the roster. Returns (newly available, newly known);
    /// duplicate adds are no-ops on both lists.
    pub fn add_guy(&mut self, id: EntityId, kind: GuyKind) -> (bool, bool) {
        let newly_available = self.available_set.insert(id);
        if newly_available {
            self.available.push(id);
        }
        let newly_known = self.known_set.insert(id);
        if newly_known {
            self.known.push(id);
        }
        if !self.found_kinds.contains(&kind) {
            self.found_kinds.push(kind);
        }
        (newly_available, newly_known)
    }

    /// Permanently remove a spent guy from both rosters.
    pub fn discard_guy(&mut self, id: EntityId) {
        if self.available_set.remove(&id) {
            self.available.retain(|&g| g != id);
        }
        if self.known_set.remove(&id) {
            self.known.retain(|&g| g != id);
        }
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn update(ent: &mut Entity, level: &mut Level, keys: &Keys, dt: f32) {
    {
        let EntityKind::Player(player) = &mut ent.kind else {
            return;
        };
        if player.on_ground_count > 0.0 {
            player.on_ground_count -= dt;
        }
        if player.bullet_cooldown_count > 0.0 {
            player.bullet_cooldown_count -= dt;
        }
    }
    if ent.body.is_standing(&level.tiles) {
        if let EntityKind::Player(player) = &mut ent.kind {
            player.on_ground_count = COYOTE_TIME_SECS;
        }
    }

    check_enemy_collision(ent, level);

    handle_pre_movement_input(ent, level, keys, dt);

    limit_fall_speed(ent, level, dt);
    ent.body.apply_gravity(dt);

    let falling_speed = ent.body.vel.y;
    let hits = ent.body.move_and_slide(&level.tiles, dt);
    if hits.down && falling_speed > 0.5 * JUMP_SPEED {
        level.events.push(GameEvent::Sfx(Sfx::Land));
    }

    handle_post_movement_input(ent, level, keys);
}

fn handle_pre_movement_input(ent: &mut Entity, level: &mut Level, keys: &Keys, dt: f32) {
    // Switching is allowed even while dead.
    if keys.any_was_pressed_this_frame(SWITCH_WEAPON_KEYS) {
        switch_kind(ent, level);
    }

    let standing = ent.body.is_standing(&level.tiles);
    let is_dead = matches!(&ent.kind, EntityKind::Player(p) if p.is_dead);
    if is_dead {
        if let EntityKind::Player(p) = &ent.kind {
            p.runner.clone().damp_x(&mut ent.body, standing, dt);
        }
        return;
    }

    let up_pressed = keys.any_is_pressed(UP_KEYS);
    let down_pressed = keys.any_is_pressed(DOWN_KEYS);
    let jump_held = keys.any_is_pressed(JUMP_KEYS);
    let jump_edge = keys.any_was_pressed_this_frame(JUMP_KEYS);

    let (can_coyote_jump, can_double_jump) = {
        let EntityKind::Player(player) = &mut ent.kind else {
            return;
        };
        player.looking_up = up_pressed && !down_pressed;
        player.looking_down = down_pressed && !up_pressed;

        // The jump key must be released between a jump and a double jump.
        if player.on_ground_count > 0.0 {
            player.need_to_release_jump = true;
        } else if !jump_held {
            player.need_to_release_jump = false;
        }

        (
            player.on_ground_count > 0.0,
            !player.need_to_release_jump && player.bullet_cooldown_count <= 0.0,
        )
    };

    if jump_edge && can_coyote_jump {
        level.events.push(GameEvent::Sfx(Sfx::Jump));
        jump(ent);
    } else if jump_held && can_double_jump {
        bullet_double_jump(ent, level);
    }

    let left = keys.any_is_pressed(LEFT_KEYS);
    let right = keys.any_is_pressed(RIGHT_KEYS);
    let runner = match &ent.kind {
        EntityKind::Player(p) => p.runner.clone(),
        _ => return,
    };
    if left && !right {
        runner.run_left(&mut ent.body, standing, dt);
    } else if right && !left {
        runner.run_right(&mut ent.body, standing, dt);
    } else {
        runner.damp_x(&mut ent.body, standing, dt);
    }
}

fn handle_post_movement_input(ent: &mut Entity, level: &mut Level, keys: &Keys) {
    if keys.was_pressed_this_frame(Key::DebugSpawnGuy) {
        spawn_debug_guy(ent, level);
    }
    if keys.was_pressed_this_frame(Key::DebugBringBackGuys) {
        bring_back_all_guys(ent, level);
    }

    let is_dead = matches!(&ent.kind, EntityKind::Player(p) if p.is_dead);
    if is_dead {
        if keys.any_was_pressed_this_frame(JUMP_KEYS) {
            respawn(ent, level);
        }
        return;
    }

    // After moving, so the bullet uses the updated facing direction.
    let can_fire = matches!(&ent.kind, EntityKind::Player(p) if p.bullet_cooldown_count <= 0.0);
    if keys.any_is_pressed(SHOOT_KEYS) && can_fire {
        fire_bullet(ent, level);
    }
}

fn jump(ent: &mut Entity) {
    ent.body.vel.y = -JUMP_SPEED;
    if let EntityKind::Player(player) = &mut ent.kind {
        player.need_to_release_jump = true;
        player.on_ground_count = 0.0;
    }
}

fn check_enemy_collision(ent: &mut Entity, level: &mut Level) {
    for id in level.ids_of(KindTag::Creature) {
        let touching = level.entity(id).is_some_and(|c| c.is_touching(ent));
        if touching {
            hurt(ent, level);
            break;
        }
    }
}

fn hurt(ent: &mut Entity, level: &mut Level) {
    let EntityKind::Player(player) = &mut ent.kind else {
        return;
    };
    if player.is_dead {
        return;
    }
    player.is_dead = true;
    ent.anim_time = 0.0;
    level.events.push(GameEvent::Sfx(Sfx::Hurt));
    level.events.push(GameEvent::PlayerDied);
}

/// Respawn at the lit torch, or the first torch if none is lit.
fn respawn(ent: &mut Entity, level: &mut Level) {
    let torches = level.ids_of(KindTag::Torch);
    let active = torches
        .iter()
        .find(|&&id| {
            matches!(
                level.entity(id).map(|e| &e.kind),
                Some(EntityKind::Torch(t)) if t.is_active
            )
        })
        .or_else(|| torches.first());
    let Some(spot) = active.and_then(|&id| level.entity(id)).map(|t| t.rect()) else {
        return;
    };

    ent.body.rect.set_mid_x(spot.mid_x());
    ent.body.rect.set_max_y(spot.max_y());
    ent.body.vel = glam::Vec2::ZERO;
    if let EntityKind::Player(player) = &mut ent.kind {
        player.is_dead = false;
    }
    level.events.push(GameEvent::PlayerRespawned);
}

/// Fall caps: slow wall slide while pressed against a wall (facing away
/// from it), normal terminal velocity otherwise.
fn limit_fall_speed(ent: &mut Entity, level: &Level, dt: f32) {
    let left_wall = ent.body.is_against_left_wall(&level.tiles);
    let right_wall = ent.body.is_against_right_wall(&level.tiles);
    if left_wall || right_wall {
        ent.body.limit_fall_speed(WALL_SLIDE_SPEED, dt);
        if ent.body.vel.y > 0.0 {
            ent.body.facing = if left_wall {
                FacingDir::Right
            } else {
                FacingDir::Left
            };
        }
    } else {
        ent.body.limit_fall_speed(MAX_FALL_SPEED, dt);
    }
}

/// Cycle the selected kind to the next found kind with an available guy;
/// fall back to Normal.
fn switch_kind(ent: &mut Entity, level: &Level) {
    let EntityKind::Player(player) = &mut ent.kind else {
        return;
    };
    let mut new_kind = GuyKind::Normal;
    if let Some(cur) = player
        .found_kinds
        .iter()
        .position(|&k| k == player.selected_kind)
    {
        for step in 1..=player.found_kinds.len() {
            let candidate = player.found_kinds[(cur + step) % player.found_kinds.len()];
            let has_available = player.available.iter().any(|&id| {
                level.entity(id).and_then(Entity::as_guy).map(|g| g.kind) == Some(candidate)
            });
            if has_available {
                new_kind = candidate;
                break;
            }
        }
    }
    player.selected_kind = new_kind;
    log::info!("selected guy kind: {:?}", player.selected_kind);
}

/// Pop the first available guy of the selected kind, switching kinds if
/// that exhausted the current one. `None` (and no side effects) if no
/// guy of the selected kind is available.
fn pop_available_guy(ent: &mut Entity, level: &Level) -> Option<EntityId> {
    let id = {
        let EntityKind::Player(player) = &mut ent.kind else {
            return None;
        };
        let index = player.available.iter().position(|&id| {
            level.entity(id).and_then(Entity::as_guy).map(|g| g.kind)
                == Some(player.selected_kind)
        })?;
        let id = player.available.remove(index);
        player.available_set.remove(&id);

        let selected = player.selected_kind;
        let any_left = player.available.iter().any(|&id| {
            level.entity(id).and_then(Entity::as_guy).map(|g| g.kind) == Some(selected)
        });
        if any_left {
            return Some(id);
        }
        id
    };
    switch_kind(ent, level);
    Some(id)
}

fn fire_bullet(ent: &mut Entity, level: &mut Level) {
    let Some(guy_id) = pop_available_guy(ent, level) else {
        // Can't fire without a guy!
        return;
    };

    let kind = level
        .entity_mut(guy_id)
        .and_then(Entity::as_guy_mut)
        .map(|guy| {
            guy.phase = GuyPhase::InFlight;
            guy.kind
        })
        .unwrap_or(GuyKind::Normal);

    let (looking_up, looking_down) = match &ent.kind {
        EntityKind::Player(p) => (p.looking_up, p.looking_down),
        _ => return,
    };
    let facing_mult = ent.body.facing.mult();
    let mid = ent.body.rect.mid();

    let (dir, bullet_mid) = if looking_up {
        (
            Dir::Up,
            IVec2::new(mid.x + facing_mult * phys_from_px(5), mid.y - phys_from_px(18)),
        )
    } else if looking_down {
        (
            Dir::Down,
            IVec2::new(mid.x + facing_mult * phys_from_px(5), mid.y + phys_from_px(3)),
        )
    } else {
        let dir = match ent.body.facing {
            FacingDir::Right => Dir::Right,
            FacingDir::Left => Dir::Left,
        };
        (
            dir,
            IVec2::new(mid.x + facing_mult * phys_from_px(12), mid.y + phys_from_px(1)),
        )
    };

    let bullet_id = level.add_entity(BULLET_SIZE, EntityKind::Bullet(Bullet::new(guy_id, dir)));
    if let Some(bullet_ent) = level.entity_mut(bullet_id) {
        bullet_ent.body.gravity = 0.0;
        bullet::set_direction(bullet_ent, dir);
        bullet_ent.body.rect.set_mid_x(bullet_mid.x);
        bullet_ent.body.rect.set_mid_y(bullet_mid.y);
    }

    level.events.push(GameEvent::Sfx(match kind {
        GuyKind::Unique => Sfx::ShootUnique,
        GuyKind::Normal => Sfx::ShootNormal,
        GuyKind::Fire => Sfx::ShootFire,
    }));

    if let EntityKind::Player(player) = &mut ent.kind {
        player.bullet_cooldown_count = BULLET_COOLDOWN;
    }
}

/// Spend a guy in mid-air for a double jump instead of a shot. A unique
/// guy is pushed away (and will chase the player down again); others are
/// spent for good.
fn bullet_double_jump(ent: &mut Entity, level: &mut Level) {
    let Some(guy_id) = pop_available_guy(ent, level) else {
        return;
    };

    let mid = ent.body.rect.mid();
    let player_vel = ent.body.vel;
    let kind = {
        let Some(guy_ent) = level.entity_mut(guy_id) else {
            return;
        };
        let Some(guy) = guy_ent.as_guy_mut() else {
            return;
        };
        let kind = guy.kind;
        if kind.respawns_after_firing() {
            guy.phase = GuyPhase::Detached;
            guy_ent.body.rect.set_mid_x(mid.x);
            guy_ent.body.rect.set_max_y(mid.y + 1);
            guy_ent.body.vel.x = player_vel.x;
            guy_ent.body.vel.y = 0.5 * JUMP_SPEED;
        } else {
            // Spent. Sorry!
            guy_ent.done = true;
        }
        kind
    };
    if !kind.respawns_after_firing() {
        if let Some(player) = ent.as_player_mut() {
            player.discard_guy(guy_id);
        }
    }

    match kind {
        GuyKind::Fire => {
            // Straight up double jump.
            level.events.push(GameEvent::Sfx(Sfx::DoubleJump));
            jump(ent);
        }
        GuyKind::Normal => {
            // Air stall with a very small boost.
            if ent.body.vel.y > 0.0 {
                ent.body.vel.y = 0.0;
            }
            ent.body.vel.y -= 0.1 * (PHYSICS_SCALE * FPS) as f32;
            level.events.push(GameEvent::Sfx(Sfx::AirStall));
        }
        // The unique guy is only pushed away; no jump effect.
        GuyKind::Unique => {}
    }

    if let EntityKind::Player(player) = &mut ent.kind {
        if player.selected_kind == GuyKind::Fire {
            player.need_to_release_jump = true;
        }
        player.bullet_cooldown_count = BULLET_COOLDOWN;
    }
}

/// Debug helper: conjure a guy above the player's head. The first guy is
/// the unique one, the next few are normal, the rest fire.
fn spawn_debug_guy(ent: &mut Entity, level: &mut Level) {
    let known = match &ent.kind {
        EntityKind::Player(p) => p.known_count(),
        _ => return,
    };
    let kind = if known == 0 {
        GuyKind::Unique
    } else if known < 10 {
        GuyKind::Normal
    } else {
        GuyKind::Fire
    };
    let mid_x = ent.body.rect.mid_x();
    let min_y = ent.body.rect.min_y();

    let guy = Guy::new(kind, GuyPhase::Detached, &mut level.rng);
    let id = level.add_entity(guy::GUY_SIZE, EntityKind::Guy(guy));
    if let Some(guy_ent) = level.entity_mut(id) {
        guy_ent.body.rect.set_mid_x(mid_x);
        guy_ent.body.rect.set_max_y(min_y);
    }
}

/// Debug helper: recall every known guy to the player's feet.
fn bring_back_all_guys(ent: &mut Entity, level: &mut Level) {
    let known = match &ent.kind {
        EntityKind::Player(p) => p.known.clone(),
        _ => return,
    };
    let mid_x = ent.body.rect.mid_x();
    let max_y = ent.body.rect.max_y();

    for id in known {
        let kind = {
            let Some(guy_ent) = level.entity_mut(id) else {
                continue;
            };
            let Some(guy) = guy_ent.as_guy_mut() else {
                continue;
            };
            if guy.phase == GuyPhase::InFlight {
                continue;
            }
            guy.phase = GuyPhase::Following;
            let kind = guy.kind;
            guy_ent.body.rect.set_mid_x(mid_x);
            guy_ent.body.rect.set_max_y(max_y);
            guy_ent.body.vel = glam::Vec2::ZERO;
            kind
        };
        if let Some(player) = ent.as_player_mut() {
            player.add_guy(id, kind);
        }
    }
}
