//! The authoritative workout collection and its persistence round-trip.

use std::collections::HashSet;

use chrono::Utc;

use super::errors::{DomainError, DomainResult};
use super::models::{Workout, WorkoutId, WorkoutRecord};

/// Name of the blob the workout list is stored under.
pub const WORKOUTS_KEY: &str = "workouts";

/// Named-blob persistence, the shape of browser local storage.
///
/// Writes overwrite the whole blob. Reading a key that was never written
/// yields `Ok(None)`.
pub trait BlobStorage {
    fn read(&self, key: &str) -> DomainResult<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> DomainResult<()>;
    fn remove(&mut self, key: &str) -> DomainResult<()>;
}

/// Workouts in insertion order, persisted after every mutation.
///
/// When a write fails the in-memory change is kept and the error is
/// returned, so the session can report that the change was not saved.
pub struct WorkoutStore<S: BlobStorage> {
    workouts: Vec<Workout>,
    storage: S,
    key: String,
}

impl<S: BlobStorage> WorkoutStore<S> {
    /// Opens the store and loads whatever `storage` holds under `key`.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let mut store = Self {
            workouts: Vec::new(),
            storage,
            key: key.into(),
        };
        store.workouts = store.load();
        store
    }

    pub fn add(&mut self, workout: Workout) -> DomainResult<()> {
        self.workouts.push(workout);
        self.save()
    }

    pub fn remove(&mut self, id: &WorkoutId) -> DomainResult<Workout> {
        let index = self
            .workouts
            .iter()
            .position(|w| w.id() == id)
            .ok_or_else(|| DomainError::NotFound(id.clone()))?;
        let removed = self.workouts.remove(index);
        self.save()?;
        Ok(removed)
    }

    pub fn remove_all(&mut self) -> DomainResult<()> {
        self.workouts.clear();
        self.save()
    }

    /// Insertion order, or ascending distance when `sorted`.
    ///
    /// Sorting is stable and leaves the stored order untouched.
    pub fn list(&self, sorted: bool) -> Vec<&Workout> {
        let mut view: Vec<&Workout> = self.workouts.iter().collect();
        if sorted {
            view.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
        }
        view
    }

    pub fn get(&self, id: &WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn contains(&self, id: &WorkoutId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes the full collection as one JSON array.
    pub fn save(&mut self) -> DomainResult<()> {
        let blob = serde_json::to_string(&self.workouts)?;
        self.storage.write(&self.key, &blob)?;
        tracing::debug!(key = %self.key, count = self.workouts.len(), "saved workouts");
        Ok(())
    }

    /// Reads the stored collection.
    ///
    /// A missing, unreadable or non-array blob yields an empty list.
    /// Records that cannot be read, break workout invariants, or repeat an
    /// id already seen are skipped one by one.
    pub fn load(&self) -> Vec<Workout> {
        let blob = match self.storage.read(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, err = %e, "could not read stored workouts");
                return Vec::new();
            }
        };

        let records = match decode(&blob) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key = %self.key, err = %e, "ignoring stored workouts");
                return Vec::new();
            }
        };

        let loaded_at = Utc::now();
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(records.len());
        for (index, value) in records.into_iter().enumerate() {
            let workout = match serde_json::from_value::<WorkoutRecord>(value) {
                Ok(record) => record.into_workout(loaded_at),
                Err(e) => {
                    tracing::warn!(index, err = %e, "dropping unreadable stored workout");
                    continue;
                }
            };
            if let Err(e) = workout.check_invariants() {
                tracing::warn!(id = %workout.id(), err = %e, "dropping invalid stored workout");
                continue;
            }
            if !seen.insert(workout.id().clone()) {
                tracing::warn!(id = %workout.id(), "dropping duplicate stored workout");
                continue;
            }
            out.push(workout);
        }

        tracing::debug!(key = %self.key, count = out.len(), "loaded workouts");
        out
    }
}

/// `null` is what the browser app wrote after clearing; treat it as empty.
fn decode(blob: &str) -> DomainResult<Vec<serde_json::Value>> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Option<Vec<serde_json::Value>>>(blob)
        .map(Option::unwrap_or_default)
        .map_err(|e| DomainError::PersistenceCorrupt(e.to_string()))
}
