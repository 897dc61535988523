//! Registry of map markers, one per live workout.

use super::models::{Coords, WorkoutId};

/// Handle to a registered marker. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub handle: MarkerHandle,
    pub workout_id: WorkoutId,
    pub coords: Coords,
}

/// Owns marker entries in creation order.
///
/// Lookups report absence as `None`; nothing here can fail.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    markers: Vec<Marker>,
    next_handle: u64,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, workout_id: WorkoutId, coords: Coords) -> MarkerHandle {
        let handle = MarkerHandle(self.next_handle);
        self.next_handle += 1;
        self.markers.push(Marker {
            handle,
            workout_id,
            coords,
        });
        handle
    }

    /// First marker placed at exactly these coordinates.
    ///
    /// Exact float comparison: two workouts logged at the same spot are
    /// indistinguishable here. Prefer [`MarkerRegistry::find_by_workout`].
    pub fn find_by_coords(&self, coords: Coords) -> Option<MarkerHandle> {
        self.markers
            .iter()
            .find(|m| m.coords.lat == coords.lat && m.coords.lng == coords.lng)
            .map(|m| m.handle)
    }

    pub fn find_by_workout(&self, workout_id: &WorkoutId) -> Option<MarkerHandle> {
        self.markers
            .iter()
            .find(|m| &m.workout_id == workout_id)
            .map(|m| m.handle)
    }

    pub fn get(&self, handle: MarkerHandle) -> Option<&Marker> {
        self.markers.iter().find(|m| m.handle == handle)
    }

    /// Removes the entry; returns it if it was present.
    pub fn remove(&mut self, handle: MarkerHandle) -> Option<Marker> {
        let index = self.markers.iter().position(|m| m.handle == handle)?;
        Some(self.markers.remove(index))
    }

    /// Clears the registry, returning what was removed.
    pub fn remove_all(&mut self) -> Vec<Marker> {
        std::mem::take(&mut self.markers)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> WorkoutId {
        WorkoutId::new(value)
    }

    #[test]
    fn test_create_and_find() {
        let mut registry = MarkerRegistry::new();
        let a = registry.create(id("a"), Coords::new(51.5, -0.1));
        let b = registry.create(id("b"), Coords::new(48.85, 2.35));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find_by_coords(Coords::new(48.85, 2.35)), Some(b));
        assert_eq!(registry.find_by_workout(&id("a")), Some(a));
        assert_eq!(registry.get(b).unwrap().workout_id, id("b"));
    }

    #[test]
    fn test_find_by_coords_is_exact() {
        let mut registry = MarkerRegistry::new();
        registry.create(id("a"), Coords::new(0.1 + 0.2, 1.0));

        assert_eq!(registry.find_by_coords(Coords::new(0.3, 1.0)), None);
        assert!(registry.find_by_coords(Coords::new(0.1 + 0.2, 1.0)).is_some());
    }

    #[test]
    fn test_coincident_coords_resolved_by_workout_id() {
        let mut registry = MarkerRegistry::new();
        let spot = Coords::new(10.0, 10.0);
        let first = registry.create(id("first"), spot);
        let second = registry.create(id("second"), spot);

        assert_eq!(registry.find_by_coords(spot), Some(first));
        assert_eq!(registry.find_by_workout(&id("second")), Some(second));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = MarkerRegistry::new();
        let a = registry.create(id("a"), Coords::new(1.0, 1.0));
        let b = registry.create(id("b"), Coords::new(2.0, 2.0));

        assert!(registry.remove(a).is_some());
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(b).is_some());
    }

    #[test]
    fn test_remove_all() {
        let mut registry = MarkerRegistry::new();
        registry.create(id("a"), Coords::new(1.0, 1.0));
        registry.create(id("b"), Coords::new(2.0, 2.0));

        let removed = registry.remove_all();
        assert_eq!(removed.len(), 2);
        assert!(registry.is_empty());

        // handles keep counting after a clear
        let c = registry.create(id("c"), Coords::new(3.0, 3.0));
        assert_eq!(c.get(), 2);
    }
}
