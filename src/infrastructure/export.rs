use crate::domain::{Activity, DomainError, DomainResult, Workout};
use std::path::Path;

const HEADER: [&str; 12] = [
    "id",
    "type",
    "date",
    "lat",
    "lng",
    "distance_km",
    "duration_min",
    "cadence_spm",
    "pace_min_per_km",
    "elevation_gain_m",
    "speed_kmh",
    "description",
];

pub struct CsvExporter;

impl CsvExporter {
    /// Writes one row per workout, in the order given. Returns the row count.
    ///
    /// Columns that do not apply to a workout's type are left empty.
    pub fn export_workouts(workouts: &[&Workout], path: &Path) -> DomainResult<usize> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        writer.write_record(HEADER).map_err(csv_error)?;

        for workout in workouts {
            let coords = workout.coords();
            let (cadence, pace, elevation, speed) = match *workout.activity() {
                Activity::Running { cadence, pace } => {
                    (cadence.to_string(), format!("{pace:.2}"), String::new(), String::new())
                }
                Activity::Cycling {
                    elevation_gain,
                    speed,
                } => (
                    String::new(),
                    String::new(),
                    elevation_gain.to_string(),
                    format!("{speed:.2}"),
                ),
            };

            writer
                .write_record([
                    workout.id().to_string(),
                    workout.kind().as_str().to_string(),
                    workout.created_at().to_rfc3339(),
                    coords.lat.to_string(),
                    coords.lng.to_string(),
                    workout.distance().to_string(),
                    workout.duration().to_string(),
                    cadence,
                    pace,
                    elevation,
                    speed,
                    workout.description().to_string(),
                ])
                .map_err(csv_error)?;
        }

        writer.flush()?;
        tracing::info!(path = %path.display(), rows = workouts.len(), "exported workouts");
        Ok(workouts.len())
    }
}

fn csv_error(e: csv::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coords, WorkoutId};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_export_rows() {
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();
        let run = Workout::running(WorkoutId::new("1"), at, Coords::new(51.5, -0.1), 5.0, 27.0, 180.0);
        let ride = Workout::cycling(WorkoutId::new("2"), at, Coords::new(48.8, 2.3), 20.0, 60.0, 150.0);

        let dir = tempdir().unwrap();
        let path = dir.path().join("workouts.csv");
        let rows = CsvExporter::export_workouts(&[&run, &ride], &path).unwrap();
        assert_eq!(rows, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), HEADER.len());
        assert_eq!(&headers[0], "id");

        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);

        assert_eq!(&records[0][1], "running");
        assert_eq!(&records[0][7], "180");
        assert_eq!(&records[0][8], "5.40");
        assert_eq!(&records[0][9], "");

        assert_eq!(&records[1][1], "cycling");
        assert_eq!(&records[1][7], "");
        assert_eq!(&records[1][9], "150");
        assert_eq!(&records[1][10], "20.00");
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("workouts.csv");
        let err = CsvExporter::export_workouts(&[], &path).unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
