//! Infrastructure layer providing external service integrations.
//!
//! Blob storage on disk or in memory, position lookup, and CSV export.

pub mod persistence;
pub mod geolocation;
pub mod export;

pub use persistence::*;
pub use geolocation::*;
pub use export::*;
