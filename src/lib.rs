//! Trailmark - terminal workout map
//!
//! Log runs and rides by picking a spot on a map, keep them in a local
//! JSON file, and browse, sort, locate and delete them from the list.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
pub mod cli;
pub mod logging;

pub use domain::*;
pub use application::*;
