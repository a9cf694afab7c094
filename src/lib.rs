//! # aeromap
//!
//! A tiled vector airspace map renderer.
//!
//! The crate renders a pannable, zoomable, rotatable 2D map from tiled
//! vector data (ground geometry, labels, live aircraft tracks) onto a
//! raster surface, re-rendering every frame. Tiles are rasterized lazily
//! into a TTL-cached quadtree; when a tile at the exact resolution is not
//! ready yet, a coarser ancestor is blitted in its place so the frame loop
//! never blocks on data arrival.

pub mod cache;
pub mod core;
pub mod layers;
pub mod map;
pub mod prelude;
pub mod render;
pub mod section;
pub mod tiles;

// Re-export public API
pub use crate::core::{
    bounds::Aabb, coords::geo2map, transform::Transform, viewport::ViewTransform,
};

pub use crate::cache::{clock::Clock, memo::MemoCache, ttl::TtlCache};

pub use crate::layers::Layer;
pub use crate::map::{MapRenderer, ViewUpdate};
pub use crate::render::{context::RenderContext, style::StyleContext};
pub use crate::section::{Section, SectionSource};
pub use crate::tiles::{TileAddress, TileEngine};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("invalid tile address: {0}")]
    InvalidTile(String),
}

/// Error type alias for convenience
pub type Error = MapError;
