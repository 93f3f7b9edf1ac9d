//! Dataset loading.
//!
//! This module reads the bike-sharing CSV export into an immutable
//! [`Dataset`] that the aggregation pipeline borrows.

pub mod dataset;
pub mod loader;

pub use dataset::Dataset;
pub use loader::{load_dataset, LoadOptions};
