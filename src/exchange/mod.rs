pub mod traits;

pub use traits::{BrokerResponse, OrderDispatcher};

#[cfg(test)]
pub use traits::MockOrderDispatcher;
