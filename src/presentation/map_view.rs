//! Terminal map: the `MapSurface` the session draws pins on.

use crate::application::{MapSurface, Popup, TileLayer};
use crate::domain::{Coords, MarkerHandle};
use std::collections::BTreeMap;

pub const MIN_ZOOM: u8 = 2;
pub const MAX_ZOOM: u8 = 18;

/// Terminal columns per 256-pixel map tile.
const COLUMNS_PER_TILE: f64 = 32.0;
/// Frames a smooth pan takes.
const TRANSITION_STEPS: u8 = 10;
/// Columns moved by one keyboard pan.
const PAN_COLUMNS: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub coords: Coords,
    pub popup: Popup,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: Coords,
    to: Coords,
    step: u8,
}

/// Geographic extent of the map widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Bounds {
    /// Position under the middle of cell (`col`, `row`) of a
    /// `width` x `height` widget.
    pub fn coords_at(&self, col: u16, row: u16, width: u16, height: u16) -> Coords {
        let x = (f64::from(col) + 0.5) / f64::from(width.max(1));
        let y = (f64::from(row) + 0.5) / f64::from(height.max(1));
        let lng = self.west + x * (self.east - self.west);
        let lat = self.north - y * (self.north - self.south);
        Coords::new(lat.clamp(-85.0, 85.0), wrap_lng(lng))
    }

    pub fn contains(&self, coords: Coords) -> bool {
        (self.south..=self.north).contains(&coords.lat)
            && (self.west..=self.east).contains(&coords.lng)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapView {
    center: Option<Coords>,
    zoom: u8,
    attribution: Option<String>,
    pins: BTreeMap<MarkerHandle, Pin>,
    transition: Option<Transition>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the view has been initialized.
    pub fn center(&self) -> Option<Coords> {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub fn pin(&self, handle: MarkerHandle) -> Option<&Pin> {
        self.pins.get(&handle)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    fn degrees_per_column(&self) -> f64 {
        360.0 / (2f64.powi(i32::from(self.zoom)) * COLUMNS_PER_TILE)
    }

    /// Extent covered by a `width` x `height` cell widget. Rows are about
    /// twice as tall as columns are wide.
    pub fn bounds(&self, width: u16, height: u16) -> Option<Bounds> {
        let center = self.center?;
        let per_col = self.degrees_per_column();
        let half_w = f64::from(width) * per_col / 2.0;
        let half_h = f64::from(height) * per_col;
        Some(Bounds {
            west: center.lng - half_w,
            east: center.lng + half_w,
            south: center.lat - half_h,
            north: center.lat + half_h,
        })
    }

    /// Moves the view by whole pan steps; positive `east`/`north` go
    /// right/up. Cancels any running transition.
    pub fn pan(&mut self, east: i8, north: i8) {
        let Some(center) = self.center else {
            return;
        };
        let step = self.degrees_per_column() * PAN_COLUMNS;
        self.transition = None;
        self.center = Some(Coords::new(
            (center.lat + f64::from(north) * step * 2.0).clamp(-85.0, 85.0),
            wrap_lng(center.lng + f64::from(east) * step),
        ));
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Advances a running transition by one frame. Returns whether one is
    /// still running.
    pub fn tick(&mut self) -> bool {
        let Some(mut transition) = self.transition else {
            return false;
        };
        transition.step += 1;
        let t = f64::from(transition.step) / f64::from(TRANSITION_STEPS);
        let eased = 1.0 - (1.0 - t).powi(2);
        self.center = Some(Coords::new(
            lerp(transition.from.lat, transition.to.lat, eased),
            lerp(transition.from.lng, transition.to.lng, eased),
        ));

        if transition.step >= TRANSITION_STEPS {
            self.center = Some(transition.to);
            self.transition = None;
            false
        } else {
            self.transition = Some(transition);
            true
        }
    }
}

impl MapSurface for MapView {
    fn init_view(&mut self, center: Coords, zoom: u8) {
        self.center = Some(center);
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.transition = None;
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        tracing::debug!(url = %layer.url, "tile layer added");
        self.attribution = Some(layer.attribution.clone());
    }

    fn place_marker(&mut self, handle: MarkerHandle, coords: Coords, popup: &Popup) {
        self.pins.insert(
            handle,
            Pin {
                coords,
                popup: popup.clone(),
            },
        );
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.pins.remove(&handle);
    }

    fn set_view(&mut self, center: Coords, zoom: u8, animate: bool) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        match self.center {
            Some(from) if animate => {
                self.transition = Some(Transition {
                    from,
                    to: center,
                    step: 0,
                });
            }
            _ => {
                self.center = Some(center);
                self.transition = None;
            }
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
