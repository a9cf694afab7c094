//! Prelude module for common aeromap types and traits
//!
//! Re-exports the most commonly used types for easy importing with
//! `use aeromap::prelude::*;`

pub use crate::core::{
    bounds::Aabb,
    coords::{geo2map, DEG2RAD, RAD2DEG},
    transform::Transform,
    viewport::ViewTransform,
};

pub use crate::cache::{
    clock::{Clock, ManualClock, SystemClock},
    memo::MemoCache,
    ttl::TtlCache,
};

pub use crate::section::{
    source::{SectionFetcher, SectionProvider},
    Section, SectionSource,
};

pub use crate::tiles::{TileAddress, TileEngine, TileEngineOptions};

pub use crate::render::{
    context::RenderContext,
    style::{StyleConfig, StyleContext},
};

pub use crate::layers::{
    ground::ground_layer,
    labels::labels_layer,
    pilots::{Pilot, PilotSnapshot, PilotsLayer},
    Layer,
};

pub use crate::map::{MapRenderer, ViewUpdate};

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Future;
