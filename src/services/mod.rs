pub mod signal_processor;

pub use signal_processor::{SignalOutcome, SignalProcessor};
