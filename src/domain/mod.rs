pub mod models;
pub mod markers;
pub mod store;
pub mod validation;
pub mod errors;

pub use models::*;
pub use markers::*;
pub use store::*;
pub use validation::*;
pub use errors::*;
