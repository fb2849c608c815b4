//! Tile layers: the level's grid state.
//!
//! A level composes two layers: the base layer (walls, including invisible
//! ones) and the object layer (platforms, destroyable blocks, markers).
//! Physics only ever sees the combined [`PhysicTile`] view.
//!
//! Layers track a dynamic bounding box that grows to cover every coordinate
//! ever written. Reads outside the tracked bounds return the layer's Empty
//! value; nothing in here panics on a bad coordinate.

use std::collections::{HashMap, VecDeque};

use glam::IVec2;

use crate::consts::TILE_SIZE;

/// A tile value stored in a layer.
pub trait Tile: Copy + Eq + std::fmt::Debug {
    const EMPTY: Self;
}

/// Base layer: structural terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseTile {
    #[default]
    Empty,
    Wall,
    /// Used temporarily while constructing a level; filled in afterwards.
    Unknown,
    /// Blocks movement but is drawn as ordinary terrain (or not at all).
    InvisibleWall,
}

impl Tile for BaseTile {
    const EMPTY: Self = BaseTile::Empty;
}

/// Object layer: interactive tiles and markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectTile {
    #[default]
    Empty,
    Spawn,
    Goal,
    /// One-way platform: stops downward motion only, and only on first contact.
    Platform,
    /// Destroyed (flood-filled to Empty) when hit by a bullet.
    Destroyable,
}

impl Tile for ObjectTile {
    const EMPTY: Self = ObjectTile::Empty;
}

/// The combined view the physics cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhysicTile {
    #[default]
    Empty,
    Wall,
    Platform,
}

impl Tile for PhysicTile {
    const EMPTY: Self = PhysicTile::Empty;
}

/// A 2D grid of tile values with a dynamic bounding box.
#[derive(Debug, Clone)]
pub struct TileLayer<T: Tile> {
    tiles: HashMap<IVec2, T>,
    min: IVec2,
    max: IVec2,
    has_bounds: bool,
}

/// Grid coordinate containing a physics-unit point.
#[inline]
pub fn tile_coord(p: IVec2) -> IVec2 {
    IVec2::new(p.x.div_euclid(TILE_SIZE), p.y.div_euclid(TILE_SIZE))
}

impl<T: Tile> TileLayer<T> {
    /// A layer whose initial bounds cover `0..w` x `0..h` tiles. Width or
    /// height of zero gives a layer with no tracked bounds at all.
    pub fn new(w: i32, h: i32) -> Self {
        let has_bounds = w > 0 && h > 0;
        Self {
            tiles: HashMap::new(),
            min: IVec2::ZERO,
            max: if has_bounds {
                IVec2::new(w - 1, h - 1)
            } else {
                IVec2::ZERO
            },
            has_bounds,
        }
    }

    pub fn min_x(&self) -> i32 {
        self.min.x
    }

    pub fn max_x(&self) -> i32 {
        self.max.x
    }

    pub fn min_y(&self) -> i32 {
        self.min.y
    }

    pub fn max_y(&self) -> i32 {
        self.max.y
    }

    pub fn in_bounds(&self, coord: IVec2) -> bool {
        self.has_bounds
            && coord.x >= self.min.x
            && coord.x <= self.max.x
            && coord.y >= self.min.y
            && coord.y <= self.max.y
    }

    /// Tile at a grid coordinate. Outside the tracked bounds this is the
    /// layer's Empty value; never an error.
    pub fn get_tile(&self, coord: IVec2) -> T {
        self.tiles.get(&coord).copied().unwrap_or(T::EMPTY)
    }

    /// Tile at a physics-unit point.
    pub fn get_tile_at_coord(&self, p: IVec2) -> T {
        self.get_tile(tile_coord(p))
    }

    /// Write a tile, growing the bounds to include the coordinate.
    pub fn set_tile(&mut self, coord: IVec2, value: T) {
        self.grow_to(coord);
        self.store(coord, value);
    }

    /// Write a tile only if the coordinate is inside the current bounds;
    /// writes outside are silently dropped. Used during fixed-size level
    /// construction, where growth would be a bug.
    pub fn set_tile_no_grow(&mut self, coord: IVec2, value: T) {
        if !self.in_bounds(coord) {
            return;
        }
        self.store(coord, value);
    }

    fn store(&mut self, coord: IVec2, value: T) {
        if value == T::EMPTY {
            self.tiles.remove(&coord);
        } else {
            self.tiles.insert(coord, value);
        }
    }

    fn grow_to(&mut self, coord: IVec2) {
        if !self.has_bounds {
            self.min = coord;
            self.max = coord;
            self.has_bounds = true;
            return;
        }
        self.min = self.min.min(coord);
        self.max = self.max.max(coord);
    }

    /// 4-directional flood fill: starting at `coord`, replace every
    /// reachable tile equal to `match_value` with `replace_value`.
    /// Bounded by the tracked bounds; the replacement itself is the
    /// visitation guard (replaced tiles no longer match).
    pub fn flood_fill_at(&mut self, coord: IVec2, match_value: T, replace_value: T) {
        if match_value == replace_value {
            return;
        }
        if !self.in_bounds(coord) || self.get_tile(coord) != match_value {
            return;
        }

        let mut queue = VecDeque::new();
        self.store(coord, replace_value);
        queue.push_back(coord);

        while let Some(c) = queue.pop_front() {
            for step in [
                IVec2::new(0, -1),
                IVec2::new(0, 1),
                IVec2::new(-1, 0),
                IVec2::new(1, 0),
            ] {
                let n = c + step;
                if self.in_bounds(n) && self.get_tile(n) == match_value {
                    self.store(n, replace_value);
                    queue.push_back(n);
                }
            }
        }
    }

    /// Flood fill starting at the tile containing a physics-unit point.
    pub fn flood_fill_at_coord(&mut self, p: IVec2, match_value: T, replace_value: T) {
        self.flood_fill_at(tile_coord(p), match_value, replace_value);
    }
}

/// One quarter of a wall tile, with the sprite variant chosen from the
/// solidity of the neighboring tiles (auto-tiling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterTile {
    /// Which quarter of the cell: (0|1, 0|1).
    pub corner: IVec2,
    /// Variant position in the quarter-tile sheet.
    pub variant: IVec2,
}

impl TileLayer<BaseTile> {
    /// Replace every Unknown tile left over from level construction.
    /// The horizontal neighbors are consulted so the hook can pick a
    /// matching fill; the current scheme always resolves to Empty.
    pub fn fill_in_unknown_tiles(&mut self) {
        for y in self.min.y..=self.max.y {
            for x in self.min.x..=self.max.x {
                let coord = IVec2::new(x, y);
                if self.get_tile(coord) == BaseTile::Unknown {
                    let neighbors = [
                        self.get_tile(coord + IVec2::new(-1, 0)),
                        self.get_tile(coord + IVec2::new(1, 0)),
                    ];
                    let fill = Self::pick_tile_to_fill_unknown(neighbors);
                    self.set_tile(coord, fill);
                }
            }
        }
    }

    fn pick_tile_to_fill_unknown(_horizontal_neighbors: [BaseTile; 2]) -> BaseTile {
        BaseTile::Empty
    }

    /// Auto-tiling contract for a Wall cell: each of the four quarter
    /// tiles picks a variant by sampling the axis and diagonal neighbors
    /// on its side. Returns `None` for non-wall cells.
    pub fn wall_quarter_variants(&self, coord: IVec2) -> Option<[QuarterTile; 4]> {
        if self.get_tile(coord) != BaseTile::Wall {
            return None;
        }

        let is_wall = |c: IVec2| self.get_tile(c) == BaseTile::Wall;

        let mut quarters = [QuarterTile {
            corner: IVec2::ZERO,
            variant: IVec2::ZERO,
        }; 4];
        let mut i = 0;
        for dx in [-1, 1] {
            let dx_wall = is_wall(coord + IVec2::new(dx, 0));
            for dy in [-1, 1] {
                let dy_wall = is_wall(coord + IVec2::new(0, dy));
                let diag_wall = is_wall(coord + IVec2::new(dx, dy));

                let mut variant = IVec2::ZERO;
                if !dx_wall {
                    variant.x += 1;
                }
                if !dy_wall {
                    variant.y += 1;
                }
                // Inner corner piece: solid on both axes but not diagonally.
                if dx_wall && dy_wall && !diag_wall {
                    variant.y += 2;
                }

                quarters[i] = QuarterTile {
                    corner: IVec2::new(if dx < 0 { 0 } else { 1 }, if dy < 0 { 0 } else { 1 }),
                    variant,
                };
                i += 1;
            }
        }
        Some(quarters)
    }
}

/// The two tile layers making up a level's grid state.
#[derive(Debug, Clone)]
pub struct Tiles {
    pub base: TileLayer<BaseTile>,
    pub object: TileLayer<ObjectTile>,
}

impl Tiles {
    pub fn new(w: i32, h: i32) -> Self {
        Self {
            base: TileLayer::new(w, h),
            object: TileLayer::new(w, h),
        }
    }

    /// Physics view of a grid coordinate: base walls win, then one-way
    /// platforms from the object layer.
    pub fn physic_tile(&self, coord: IVec2) -> PhysicTile {
        match self.base.get_tile(coord) {
            BaseTile::Wall | BaseTile::InvisibleWall => return PhysicTile::Wall,
            _ => {}
        }
        match self.object.get_tile(coord) {
            ObjectTile::Platform => PhysicTile::Platform,
            ObjectTile::Destroyable => PhysicTile::Wall,
            _ => PhysicTile::Empty,
        }
    }

    /// Physics view at a physics-unit point.
    pub fn physic_tile_at_coord(&self, p: IVec2) -> PhysicTile {
        self.physic_tile(tile_coord(p))
    }

    /// Is the tile under a physics-unit point one of the given kinds?
    pub fn matches_at_coord(&self, p: IVec2, kinds: &[PhysicTile]) -> bool {
        kinds.contains(&self.physic_tile_at_coord(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_layer_reads_empty_everywhere() {
        let layer: TileLayer<BaseTile> = TileLayer::new(10, 10);
        assert_eq!(layer.get_tile(IVec2::new(0, 0)), BaseTile::Empty);
        assert_eq!(layer.get_tile(IVec2::new(-100, 50)), BaseTile::Empty);
        assert_eq!(layer.get_tile(IVec2::new(9999, -9999)), BaseTile::Empty);
    }

    #[test]
    fn test_writes_elsewhere_leave_coordinate_empty() {
        let mut layer: TileLayer<BaseTile> = TileLayer::new(10, 10);
        layer.set_tile(IVec2::new(3, 3), BaseTile::Wall);
        assert_eq!(layer.get_tile(IVec2::new(4, 3)), BaseTile::Empty);
        assert_eq!(layer.get_tile(IVec2::new(3, 3)), BaseTile::Wall);
    }

    #[test]
    fn test_no_grow_drops_out_of_bounds_writes() {
        let mut layer: TileLayer<BaseTile> = TileLayer::new(0, 0);
        let far = IVec2::new(50, 50);

        layer.set_tile_no_grow(far, BaseTile::Wall);
        assert_eq!(layer.get_tile(far), BaseTile::Empty);
        assert!(!layer.in_bounds(far));

        layer.set_tile(far, BaseTile::Wall);
        assert_eq!(layer.get_tile(far), BaseTile::Wall);
        assert!(layer.in_bounds(far));
    }

    #[test]
    fn test_grow_expands_bounds_to_include_coordinate() {
        let mut layer: TileLayer<BaseTile> = TileLayer::new(4, 4);
        assert_eq!((layer.max_x(), layer.max_y()), (3, 3));

        layer.set_tile(IVec2::new(-2, 10), BaseTile::Wall);
        assert_eq!(layer.min_x(), -2);
        assert_eq!(layer.max_y(), 10);
        // Bounds never shrink.
        layer.set_tile(IVec2::new(0, 0), BaseTile::Empty);
        assert_eq!(layer.min_x(), -2);
    }

    #[test]
    fn test_no_grow_within_initial_bounds_stores() {
        let mut layer: TileLayer<ObjectTile> = TileLayer::new(8, 8);
        layer.set_tile_no_grow(IVec2::new(7, 7), ObjectTile::Platform);
        assert_eq!(layer.get_tile(IVec2::new(7, 7)), ObjectTile::Platform);
        layer.set_tile_no_grow(IVec2::new(8, 7), ObjectTile::Platform);
        assert_eq!(layer.get_tile(IVec2::new(8, 7)), ObjectTile::Empty);
    }

    #[test]
    fn test_flood_fill_confined_by_wall_ring() {
        // 5x5 block of Destroyable surrounded by a ring of... the object
        // layer has no walls, so build the ring from Destroyable-adjacent
        // Spawn tiles to show the fill stops at non-matching tiles.
        let mut layer: TileLayer<ObjectTile> = TileLayer::new(7, 7);
        for y in 0..7 {
            for x in 0..7 {
                let edge = x == 0 || x == 6 || y == 0 || y == 6;
                let v = if edge {
                    ObjectTile::Goal
                } else {
                    ObjectTile::Destroyable
                };
                layer.set_tile(IVec2::new(x, y), v);
            }
        }

        layer.flood_fill_at(IVec2::new(3, 3), ObjectTile::Destroyable, ObjectTile::Empty);

        for y in 0..7 {
            for x in 0..7 {
                let edge = x == 0 || x == 6 || y == 0 || y == 6;
                let expected = if edge { ObjectTile::Goal } else { ObjectTile::Empty };
                assert_eq!(layer.get_tile(IVec2::new(x, y)), expected, "at {x},{y}");
            }
        }
    }

    #[test]
    fn test_flood_fill_non_matching_seed_is_noop() {
        let mut layer: TileLayer<ObjectTile> = TileLayer::new(4, 4);
        layer.set_tile(IVec2::new(1, 1), ObjectTile::Platform);
        layer.flood_fill_at(IVec2::new(1, 1), ObjectTile::Destroyable, ObjectTile::Empty);
        assert_eq!(layer.get_tile(IVec2::new(1, 1)), ObjectTile::Platform);
    }

    #[test]
    fn test_flood_fill_same_match_and_replace_terminates() {
        let mut layer: TileLayer<ObjectTile> = TileLayer::new(4, 4);
        layer.set_tile(IVec2::new(1, 1), ObjectTile::Destroyable);
        layer.flood_fill_at(
            IVec2::new(1, 1),
            ObjectTile::Destroyable,
            ObjectTile::Destroyable,
        );
        assert_eq!(layer.get_tile(IVec2::new(1, 1)), ObjectTile::Destroyable);
    }

    #[test]
    fn test_tile_coord_floors_negatives() {
        assert_eq!(tile_coord(IVec2::new(0, 0)), IVec2::new(0, 0));
        assert_eq!(tile_coord(IVec2::new(TILE_SIZE - 1, TILE_SIZE)), IVec2::new(0, 1));
        assert_eq!(tile_coord(IVec2::new(-1, -TILE_SIZE)), IVec2::new(-1, -1));
    }

    #[test]
    fn test_physic_view_combines_layers() {
        let mut tiles = Tiles::new(4, 4);
        tiles.base.set_tile(IVec2::new(0, 0), BaseTile::Wall);
        tiles.base.set_tile(IVec2::new(1, 0), BaseTile::InvisibleWall);
        tiles.object.set_tile(IVec2::new(2, 0), ObjectTile::Platform);
        tiles.object.set_tile(IVec2::new(3, 0), ObjectTile::Destroyable);

        assert_eq!(tiles.physic_tile(IVec2::new(0, 0)), PhysicTile::Wall);
        assert_eq!(tiles.physic_tile(IVec2::new(1, 0)), PhysicTile::Wall);
        assert_eq!(tiles.physic_tile(IVec2::new(2, 0)), PhysicTile::Platform);
        // Destroyable blocks are solid until carved out.
        assert_eq!(tiles.physic_tile(IVec2::new(3, 0)), PhysicTile::Wall);

        assert!(tiles.matches_at_coord(IVec2::new(8, 8), &[PhysicTile::Wall]));
        assert!(!tiles.matches_at_coord(IVec2::new(8, 8), &[PhysicTile::Platform]));
    }

    #[test]
    fn test_fill_in_unknown_tiles() {
        let mut layer: TileLayer<BaseTile> = TileLayer::new(3, 1);
        layer.set_tile(IVec2::new(0, 0), BaseTile::Wall);
        layer.set_tile(IVec2::new(1, 0), BaseTile::Unknown);
        layer.fill_in_unknown_tiles();
        assert_eq!(layer.get_tile(IVec2::new(1, 0)), BaseTile::Empty);
        assert_eq!(layer.get_tile(IVec2::new(0, 0)), BaseTile::Wall);
    }

    #[test]
    fn test_wall_quarter_variants_freestanding_block() {
        let mut layer: TileLayer<BaseTile> = TileLayer::new(3, 3);
        layer.set_tile(IVec2::new(1, 1), BaseTile::Wall);

        let quarters = layer.wall_quarter_variants(IVec2::new(1, 1)).unwrap();
        // No solid neighbors at all: every quarter is the fully-exposed
        // (1, 1) variant.
        for q in quarters {
            assert_eq!(q.variant, IVec2::new(1, 1));
        }

        assert!(layer.wall_quarter_variants(IVec2::new(0, 0)).is_none());
    }

    #[test]
    fn test_wall_quarter_variants_inner_corner() {
        // L-shaped block: the quarter of (1, 1) facing into the notch sees
        // solid on both axes but an empty diagonal, which is the
        // inner-corner variant.
        let mut layer: TileLayer<BaseTile> = TileLayer::new(4, 4);
        for c in [IVec2::new(1, 1), IVec2::new(2, 1), IVec2::new(1, 2)] {
            layer.set_tile(c, BaseTile::Wall);
        }

        let quarters = layer.wall_quarter_variants(IVec2::new(1, 1)).unwrap();
        let inner = quarters
            .iter()
            .find(|q| q.corner == IVec2::new(1, 1))
            .unwrap();
        assert_eq!(inner.variant, IVec2::new(0, 2));
        let outer = quarters
            .iter()
            .find(|q| q.corner == IVec2::new(0, 0))
            .unwrap();
        assert_eq!(outer.variant, IVec2::new(1, 1));
    }
}
