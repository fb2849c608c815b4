//! Serialized level description.
//!
//! A level is an integer tile grid plus a flat list of entity records.
//! Loading is best-effort: unknown tile codes and entity kinds are
//! logged and skipped rather than failing the whole level.

use glam::IVec2;
use serde::{Deserialize, Serialize};

pub const CODE_EMPTY: u8 = 0;
pub const CODE_WALL: u8 = 1;
pub const CODE_PLATFORM: u8 = 2;
pub const CODE_DESTROYABLE: u8 = 3;
pub const CODE_INVISIBLE_WALL: u8 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    pub width: i32,
    pub height: i32,
    /// Row-major tile codes, `width * height` entries.
    pub int_grid: Vec<u8>,
    pub entities: Vec<EntityRecord>,
}

impl LevelData {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            int_grid: vec![CODE_EMPTY; (width * height).max(0) as usize],
            entities: Vec::new(),
        }
    }

    pub fn set_code(&mut self, x: i32, y: i32, code: u8) {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return;
        }
        self.int_grid[(y * self.width + x) as usize] = code;
    }

    pub fn code(&self, x: i32, y: i32) -> u8 {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return CODE_EMPTY;
        }
        self.int_grid[(y * self.width + x) as usize]
    }
}

/// One placed entity. `kind` selects the entity type; the optional
/// fields only apply to some kinds and default to absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub kind: String,
    /// Anchor position in display pixels.
    pub px: IVec2,
    #[serde(default)]
    pub facing_left: bool,
    /// Creature behavior: "still", "running", or "cautious".
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub fire: bool,
    /// Trigger name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Area size in display pixels (trigger areas).
    #[serde(default)]
    pub size_px: Option<IVec2>,
    #[serde(default)]
    pub stop_area_px: Option<AreaRecord>,
}

impl EntityRecord {
    pub fn new(kind: &str, px: IVec2) -> Self {
        Self {
            kind: kind.to_string(),
            px,
            facing_left: false,
            behavior: None,
            fire: false,
            name: None,
            message: None,
            size_px: None,
            stop_area_px: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaRecord {
    pub px: IVec2,
    pub size_px: IVec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_deserializes_with_defaults() {
        let json = r#"{ "kind": "Torch", "px": [32, 48] }"#;
        let record: EntityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, "Torch");
        assert_eq!(record.px, IVec2::new(32, 48));
        assert!(!record.fire);
        assert!(record.behavior.is_none());
        assert!(record.stop_area_px.is_none());
    }

    #[test]
    fn test_level_data_round_trips() {
        let mut data = LevelData::new(4, 3);
        data.set_code(1, 2, CODE_WALL);
        data.set_code(2, 0, CODE_DESTROYABLE);
        data.entities.push(EntityRecord::new("Spawn", IVec2::new(16, 16)));

        let json = serde_json::to_string(&data).unwrap();
        let back: LevelData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code(1, 2), CODE_WALL);
        assert_eq!(back.code(2, 0), CODE_DESTROYABLE);
        assert_eq!(back.entities.len(), 1);
    }

    #[test]
    fn test_out_of_range_codes_read_empty() {
        let data = LevelData::new(2, 2);
        assert_eq!(data.code(-1, 0), CODE_EMPTY);
        assert_eq!(data.code(0, 5), CODE_EMPTY);
    }
}
