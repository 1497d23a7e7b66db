//! Persistence for the sizing state record.

pub mod state_store;

pub use state_store::{JsonStateStore, MemoryStateStore, StateStore};
