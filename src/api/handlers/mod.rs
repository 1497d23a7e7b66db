pub mod system;
pub mod webhook;

pub use system::*;
pub use webhook::*;
