pub mod context;
pub mod style;
pub mod text;

pub use context::RenderContext;
pub use style::{StyleConfig, StyleContext};
