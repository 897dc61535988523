//! Collaborators the session controller drives but does not own.

use crate::domain::{ActivityKind, Coords, DomainResult, MarkerHandle};

/// Base map imagery, as a tile URL template plus its credit line.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url: String,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url: "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
        }
    }
}

/// Popup bound to a marker. `kind` selects the popup style.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub content: String,
    pub kind: ActivityKind,
}

/// The map the workouts are pinned to.
pub trait MapSurface {
    fn init_view(&mut self, center: Coords, zoom: u8);
    fn add_tile_layer(&mut self, layer: &TileLayer);
    fn place_marker(&mut self, handle: MarkerHandle, coords: Coords, popup: &Popup);
    /// Removing a marker that is not on the map does nothing.
    fn remove_marker(&mut self, handle: MarkerHandle);
    /// Re-centers the view, with a smooth transition when `animate` is set.
    fn set_view(&mut self, center: Coords, zoom: u8, animate: bool);
}

/// Blocking yes/no prompt shown before destructive operations.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// One-shot source of the user's current position.
///
/// Failures are reported as `DomainError::GeolocationUnavailable`.
pub trait Geolocator {
    fn current_position(&self) -> DomainResult<Coords>;
}
