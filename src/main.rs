//! Headless demo driver.
//!
//! Builds a small demo level and runs a scripted session at the fixed
//! simulation rate, logging the events the level raises. Each frame runs
//! behind a panic guard so one bad frame is logged instead of taking the
//! whole session down; the guard is a last resort, not a correctness
//! mechanism.

use std::panic::{self, AssertUnwindSafe};

use glam::IVec2;

use lilguys::consts::TIME_STEP;
use lilguys::sim::data::{
    CODE_DESTROYABLE, CODE_PLATFORM, CODE_WALL, EntityRecord, LevelData,
};
use lilguys::sim::{EntityKind, GameEvent, Level};
use lilguys::{Key, Keys, Scheduler, SimClock, checkpoint};

const DEMO_SECONDS: f32 = 20.0;
const CHECKPOINT_FILE: &str = "lilguys-checkpoint.json";

/// A strip of ground with a guy to collect, a torch, a destroyable wall,
/// and a creature patrolling behind it.
fn demo_level() -> LevelData {
    let mut data = LevelData::new(48, 16);
    for x in 0..48 {
        data.set_code(x, 12, CODE_WALL);
    }
    for y in 0..12 {
        data.set_code(0, y, CODE_WALL);
        data.set_code(47, y, CODE_WALL);
    }
    for x in 8..12 {
        data.set_code(x, 9, CODE_PLATFORM);
    }
    for y in 9..12 {
        data.set_code(24, y, CODE_DESTROYABLE);
    }

    data.entities.push(EntityRecord::new("Spawn", IVec2::new(40, 192)));
    data.entities.push(EntityRecord::new("Lilguy", IVec2::new(72, 191)));
    data.entities.push(EntityRecord::new("Torch", IVec2::new(120, 191)));
    let mut creature = EntityRecord::new("CreatureEnemy", IVec2::new(560, 192));
    creature.behavior = Some("cautious".to_string());
    creature.facing_left = true;
    data.entities.push(creature);
    data.entities.push(EntityRecord::new("WaterfallStart", IVec2::new(424, 40)));
    data
}

/// Scripted input: run right, hop now and then, and fire once the guy
/// should have been collected.
fn script_keys(keys: &mut Keys, frame: u32) {
    keys.press(Key::Right);
    match frame % 90 {
        0 => keys.press(Key::Jump),
        20 => keys.release(Key::Jump),
        _ => {}
    }
    if frame == 300 {
        keys.press(Key::Shoot);
    }
    if frame == 310 {
        keys.release(Key::Shoot);
    }
}

fn handle_event(event: GameEvent) {
    match event {
        GameEvent::Sfx(sfx) => log::debug!("sfx: {sfx:?}"),
        GameEvent::Notification(text) => log::info!("notification: {text}"),
        GameEvent::ClearNotification => log::info!("notification cleared"),
        GameEvent::PlayerDied => log::info!("player died"),
        GameEvent::PlayerRespawned => log::info!("player respawned"),
        GameEvent::TerrainDestroyed { coord } => {
            log::info!("terrain destroyed at {coord}");
        }
    }
}

fn main() {
    env_logger::init();

    let data = demo_level();
    let mut level = Level::from_data(&data, 0xbeef);
    checkpoint::load_player_position(&mut level, CHECKPOINT_FILE.as_ref());
    log::info!(
        "demo level: {} entities, player at {:?}",
        level.entity_count(),
        level.player.and_then(|id| level.entity(id)).map(|p| p.rect().pos),
    );

    let mut clock = SimClock::new();
    let mut keys = Keys::new();
    let mut frame: u32 = 0;
    let total_frames = (DEMO_SECONDS / TIME_STEP) as u32;

    // Session milestones, polled against the sim each step.
    let mut sched: Scheduler<Level> = Scheduler::new();
    let halfway = sched.wait_secs(DEMO_SECONDS / 2.0);
    let torch_lit = sched.wait_until(|level: &Level| {
        level
            .entities()
            .any(|e| matches!(&e.kind, EntityKind::Torch(t) if t.is_active))
    });
    let mut announced_halfway = false;
    let mut announced_torch = false;

    while frame < total_frames {
        // Headless: pretend exactly one frame of wall time elapsed.
        let steps = clock.advance(TIME_STEP);
        for _ in 0..steps {
            script_keys(&mut keys, frame);
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                level.update(&keys, TIME_STEP);
            }));
            if let Err(err) = result {
                log::error!("update panicked on frame {frame}: {err:?}");
            }
            keys.reset_frame();
            for event in level.drain_events() {
                handle_event(event);
            }

            sched.poll(&level, TIME_STEP);
            if !announced_halfway && sched.is_done(halfway) {
                log::info!("halfway through the demo session");
                announced_halfway = true;
            }
            if !announced_torch && sched.is_done(torch_lit) {
                log::info!("checkpoint torch lit on frame {frame}");
                announced_torch = true;
            }
            frame += 1;
        }
    }

    checkpoint::save_player_position(&level, CHECKPOINT_FILE.as_ref());
    if let Some(player) = level.player.and_then(|id| level.entity(id)) {
        let roster = player.as_player().map(|p| (p.available_count(), p.known_count()));
        log::info!(
            "session over: player at {:?}, roster {roster:?}",
            player.rect().pos
        );
    }
}
