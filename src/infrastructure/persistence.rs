use crate::domain::{BlobStorage, DomainResult};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each named blob as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStorage for FileStorage {
    fn read(&self, key: &str) -> DomainResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> DomainResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> DomainResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process blob storage. Counts writes so callers can check that a
/// mutation was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, value: &str) -> Self {
        let mut storage = Self::default();
        storage.blobs.insert(key.to_string(), value.to_string());
        storage
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl BlobStorage for MemoryStorage {
    fn read(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> DomainResult<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> DomainResult<()> {
        self.blobs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coords, WORKOUTS_KEY, Workout, WorkoutId, WorkoutStore};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_missing_blob_reads_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.read("workouts").unwrap(), None);
    }

    #[test]
    fn test_write_read_remove() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));

        storage.write("workouts", "[]").unwrap();
        assert!(storage.path_for("workouts").is_file());
        assert_eq!(storage.read("workouts").unwrap().as_deref(), Some("[]"));

        storage.write("workouts", "[1]").unwrap();
        assert_eq!(storage.read("workouts").unwrap().as_deref(), Some("[1]"));

        storage.remove("workouts").unwrap();
        storage.remove("workouts").unwrap();
        assert_eq!(storage.read("workouts").unwrap(), None);
    }

    #[test]
    fn test_store_survives_restart_on_disk() {
        let dir = tempdir().unwrap();
        let workout = Workout::running(
            WorkoutId::new("0000000001"),
            Utc.with_ymd_and_hms(2024, 5, 4, 7, 30, 0).unwrap(),
            Coords::new(51.5, -0.1),
            5.0,
            25.0,
            180.0,
        );

        {
            let mut store = WorkoutStore::open(FileStorage::new(dir.path()), WORKOUTS_KEY);
            store.add(workout.clone()).unwrap();
        }

        let store = WorkoutStore::open(FileStorage::new(dir.path()), WORKOUTS_KEY);
        assert_eq!(store.list(false), vec![&workout]);
    }

    #[test]
    fn test_memory_storage_counts_writes() {
        let mut storage = MemoryStorage::new();
        storage.write("k", "a").unwrap();
        storage.write("k", "b").unwrap();
        assert_eq!(storage.writes(), 2);
        assert_eq!(storage.get("k"), Some("b"));
    }
}
