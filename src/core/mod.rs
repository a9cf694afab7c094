pub mod bounds;
pub mod coords;
pub mod transform;
pub mod viewport;
