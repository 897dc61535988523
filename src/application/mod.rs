//! Application layer coordinating workouts, markers and the map.
//!
//! The session controller applies user intents to the workout store and the
//! marker registry, and drives the collaborators declared in `ports`.

pub mod ports;
pub mod state;

pub use ports::*;
pub use state::*;
