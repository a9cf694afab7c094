//! Quadtree tile addressing and the cached tile rendering engine.

pub mod engine;

use std::sync::Arc;
use std::time::Duration;

use tiny_skia::Pixmap;

use crate::cache::ttl::DEFAULT_TTL;

pub use engine::TileEngine;

/// One cell of the implicit quadtree over the unit square: level `l` splits
/// the map into `2^l x 2^l` tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub level: u8,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    pub fn new(level: u8, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    pub fn tiles_across(level: u8) -> u32 {
        1u32 << level
    }

    pub fn is_valid(&self) -> bool {
        self.level < 32
            && self.x < Self::tiles_across(self.level)
            && self.y < Self::tiles_across(self.level)
    }

    /// The enclosing tile one level coarser, or `None` at the root.
    pub fn parent(&self) -> Option<TileAddress> {
        if self.level == 0 {
            return None;
        }
        Some(TileAddress::new(self.level - 1, self.x >> 1, self.y >> 1))
    }

    /// World coordinates of this tile's top-left corner.
    pub fn world_origin(&self) -> (f64, f64) {
        let n = Self::tiles_across(self.level) as f64;
        (self.x as f64 / n, self.y as f64 / n)
    }

    /// Side length of this tile in world units.
    pub fn world_extent(&self) -> f64 {
        1.0 / Self::tiles_across(self.level) as f64
    }
}

/// Cache identity of one rendered bitmap. Layer and style epoch are part of
/// the key so a restyle renders fresh tiles instead of mutating cached
/// ones, and distinct layers never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub layer: Arc<str>,
    pub epoch: Arc<str>,
    pub size: u32,
    pub addr: TileAddress,
}

/// An immutable rasterized tile. Shared by reference between the cache and
/// any frame currently blitting it.
pub struct RenderedTile {
    pub pixmap: Pixmap,
}

/// Construction parameters for a [`TileEngine`].
#[derive(Debug, Clone)]
pub struct TileEngineOptions {
    /// Layer name, used in cache keys and log lines.
    pub name: String,
    /// Tile bitmap side length in pixels.
    pub tile_size: u32,
    /// Retention of rendered bitmaps after their last use.
    pub ttl: Duration,
}

impl Default for TileEngineOptions {
    fn default() -> Self {
        Self {
            name: "tiles".to_string(),
            tile_size: 256,
            ttl: DEFAULT_TTL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_chain_reaches_root() {
        let mut addr = TileAddress::new(5, 21, 9);
        let mut levels = 0;
        while let Some(parent) = addr.parent() {
            assert_eq!(parent.level, addr.level - 1);
            assert_eq!(parent.x, addr.x >> 1);
            assert_eq!(parent.y, addr.y >> 1);
            addr = parent;
            levels += 1;
        }
        assert_eq!(levels, 5);
        assert_eq!(addr, TileAddress::new(0, 0, 0));
    }

    #[test]
    fn test_world_origin_and_extent() {
        let addr = TileAddress::new(2, 3, 1);
        let (wx, wy) = addr.world_origin();
        assert_eq!((wx, wy), (0.75, 0.25));
        assert_eq!(addr.world_extent(), 0.25);
    }

    #[test]
    fn test_validity() {
        assert!(TileAddress::new(0, 0, 0).is_valid());
        assert!(TileAddress::new(3, 7, 7).is_valid());
        assert!(!TileAddress::new(3, 8, 0).is_valid());
        assert!(!TileAddress::new(3, 0, 8).is_valid());
    }
}
