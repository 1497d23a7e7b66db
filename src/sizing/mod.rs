//! Streak-based position sizing: daily reset policy and quantity engine.

pub mod clock;
pub mod engine;
pub mod reset;

pub use clock::{Clock, FixedClock, LocalClock};
pub use engine::compute_quantity;
pub use reset::ResetPolicy;
