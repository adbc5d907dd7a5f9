//! Persistence boundary — history lookups and output storage.

pub mod memory;
pub mod traits;

pub use memory::InMemoryStore;
pub use traits::{HealthStore, HistoryProvider, window_start};
