pub mod clock;
pub mod memo;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memo::MemoCache;
pub use ttl::TtlCache;
