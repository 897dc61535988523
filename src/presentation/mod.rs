//! Terminal front end: map widget, list and form rendering, and key and
//! mouse handling on top of the session controller.

pub mod ui;
pub mod input;
pub mod map_view;
pub mod confirm;

pub use ui::*;
pub use input::*;
pub use map_view::MapView;
pub use confirm::TerminalConfirmer;
