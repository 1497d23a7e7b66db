pub mod order;
pub mod signal;
pub mod state;

pub use order::*;
pub use signal::*;
pub use state::*;
