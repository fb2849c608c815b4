//! Best-effort persistence of the player's position, used to resume a
//! play-testing session where it left off. Failures are logged and
//! otherwise ignored; a missing or corrupt checkpoint never blocks play.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PlayerCheckpoint {
    mid_x: i32,
    max_y: i32,
}

pub fn save_player_position(level: &Level, path: &Path) {
    let Some(player) = level.player.and_then(|id| level.entity(id)) else {
        return;
    };
    let checkpoint = PlayerCheckpoint {
        mid_x: player.rect().mid_x(),
        max_y: player.rect().max_y(),
    };
    let json = match serde_json::to_string(&checkpoint) {
        Ok(json) => json,
        Err(err) => {
            log::debug!("failed to serialize checkpoint: {err}");
            return;
        }
    };
    if let Err(err) = fs::write(path, json) {
        log::debug!("failed to write checkpoint {}: {err}", path.display());
    }
}

pub fn load_player_position(level: &mut Level, path: &Path) {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            log::debug!("no checkpoint at {}: {err}", path.display());
            return;
        }
    };
    let checkpoint: PlayerCheckpoint = match serde_json::from_str(&json) {
        Ok(checkpoint) => checkpoint,
        Err(err) => {
            log::debug!("ignoring corrupt checkpoint {}: {err}", path.display());
            return;
        }
    };
    let Some(player) = level.player.and_then(|id| level.entity_mut(id)) else {
        return;
    };
    player.body.rect.set_mid_x(checkpoint.mid_x);
    player.body.rect.set_max_y(checkpoint.max_y);
}
