use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{Field, ValidationError};
use super::validation::{WorkoutDraft, require_finite, require_positive};

/// A (latitude, longitude) pair, persisted as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(coords: Coords) -> Self {
        [coords.lat, coords.lng]
    }
}

impl std::fmt::Display for Coords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Opaque workout identifier.
///
/// Links a workout to its list entry and its map marker. Never reused
/// while the workout it names is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ids are the last ten digits of the creation time in milliseconds.
const ID_DIGITS: usize = 10;
const ID_MODULUS: u64 = 10_000_000_000;

/// Issues time-derived workout ids.
///
/// Two ids requested within the same millisecond would truncate to the same
/// value, so the generator never hands out a value at or below the last one
/// it issued. Ids loaded from storage are not known here; callers that need
/// uniqueness against stored data check the store as well.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Option<u64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, now: DateTime<Utc>) -> WorkoutId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default() % ID_MODULUS;
        let value = match self.last {
            Some(last) if millis <= last => (last + 1) % ID_MODULUS,
            _ => millis,
        };
        self.last = Some(value);
        WorkoutId(format!("{value:0width$}", width = ID_DIGITS))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Running,
    Cycling,
}

impl ActivityKind {
    /// Persisted discriminant, e.g. `"running"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Running => "running",
            ActivityKind::Cycling => "cycling",
        }
    }

    /// Capitalized label used in descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Running => "Running",
            ActivityKind::Cycling => "Cycling",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActivityKind::Running => "🏃",
            ActivityKind::Cycling => "🚴",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ActivityKind::Running => ActivityKind::Cycling,
            ActivityKind::Cycling => ActivityKind::Running,
        }
    }
}

/// Variant payload of a workout, tagged by `type` when persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Running {
        /// steps/min
        cadence: f64,
        /// min per distance unit
        pace: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain")]
        elevation_gain: f64,
        /// distance units per hour
        speed: f64,
    },
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Activity::Running { .. } => ActivityKind::Running,
            Activity::Cycling { .. } => ActivityKind::Cycling,
        }
    }
}

pub fn pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

pub fn speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// A recorded activity.
///
/// All fields are fixed at construction. Derived metrics and the
/// description are computed once there and never touched again.
/// Stored workouts come back through [`WorkoutRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workout {
    id: WorkoutId,
    #[serde(rename = "date")]
    created_at: DateTime<Utc>,
    coords: Coords,
    distance: f64,
    duration: f64,
    description: String,
    #[serde(flatten)]
    activity: Activity,
}

impl Workout {
    pub fn running(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: f64,
    ) -> Self {
        let activity = Activity::Running {
            cadence,
            pace: pace(distance, duration),
        };
        Self::build(id, created_at, coords, distance, duration, activity)
    }

    pub fn cycling(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    ) -> Self {
        let activity = Activity::Cycling {
            elevation_gain,
            speed: speed(distance, duration),
        };
        Self::build(id, created_at, coords, distance, duration, activity)
    }

    /// Builds the workout a validated form describes.
    pub fn from_draft(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        draft: &WorkoutDraft,
    ) -> Self {
        match *draft {
            WorkoutDraft::Running {
                distance,
                duration,
                cadence,
            } => Self::running(id, created_at, coords, distance, duration, cadence),
            WorkoutDraft::Cycling {
                distance,
                duration,
                elevation_gain,
            } => Self::cycling(id, created_at, coords, distance, duration, elevation_gain),
        }
    }

    fn build(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        activity: Activity,
    ) -> Self {
        let description = describe(activity.kind(), created_at);
        Self {
            id,
            created_at,
            coords,
            distance,
            duration,
            description,
            activity,
        }
    }

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn kind(&self) -> ActivityKind {
        self.activity.kind()
    }

    pub fn pace(&self) -> Option<f64> {
        match self.activity {
            Activity::Running { pace, .. } => Some(pace),
            Activity::Cycling { .. } => None,
        }
    }

    pub fn speed(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { speed, .. } => Some(speed),
            Activity::Running { .. } => None,
        }
    }

    /// Text shown in the marker popup: icon followed by the description.
    pub fn popup_content(&self) -> String {
        format!("{} {}", self.kind().icon(), self.description)
    }

    /// Re-checks the invariants a freshly built workout satisfies.
    ///
    /// Used on reload, where records come from outside the process.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        require_finite(Field::Distance, self.distance)?;
        require_finite(Field::Duration, self.duration)?;
        require_positive(Field::Distance, self.distance)?;
        require_positive(Field::Duration, self.duration)?;
        match self.activity {
            Activity::Running { cadence, .. } => {
                require_finite(Field::Cadence, cadence)?;
                require_positive(Field::Cadence, cadence)?;
            }
            Activity::Cycling { elevation_gain, .. } => {
                require_finite(Field::ElevationGain, elevation_gain)?;
            }
        }
        Ok(())
    }
}

/// A workout as read back from storage.
///
/// Only the measured values are taken from the record; `pace` and `speed`
/// are ignored and recomputed. `date` and `description` may be missing.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutRecord {
    id: WorkoutId,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
    coords: Coords,
    distance: f64,
    duration: f64,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    activity: RecordActivity,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordActivity {
    Running {
        cadence: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain")]
        elevation_gain: f64,
    },
}

impl WorkoutRecord {
    /// Rebuilds the typed workout. A record without a date is dated
    /// `loaded_at`.
    pub fn into_workout(self, loaded_at: DateTime<Utc>) -> Workout {
        let created_at = self.date.unwrap_or(loaded_at);
        let mut workout = match self.activity {
            RecordActivity::Running { cadence } => Workout::running(
                self.id,
                created_at,
                self.coords,
                self.distance,
                self.duration,
                cadence,
            ),
            RecordActivity::Cycling { elevation_gain } => Workout::cycling(
                self.id,
                created_at,
                self.coords,
                self.distance,
                self.duration,
                elevation_gain,
            ),
        };
        if let Some(description) = self.description {
            workout.description = description;
        }
        workout
    }
}

/// `"<Label> on <Month> <day>"` in local time.
fn describe(kind: ActivityKind, created_at: DateTime<Utc>) -> String {
    let local = created_at.with_timezone(&Local);
    format!("{} on {}", kind.label(), local.format("%B %-d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn id(value: &str) -> WorkoutId {
        WorkoutId::new(value)
    }

    #[test]
    fn test_running_pace() {
        let w = Workout::running(id("1"), noon(), Coords::new(51.5, -0.1), 5.0, 25.0, 180.0);
        assert_eq!(w.pace(), Some(5.0));
        assert_eq!(w.speed(), None);
        assert_eq!(w.kind(), ActivityKind::Running);
    }

    #[test]
    fn test_pace_formula_for_many_inputs() {
        for (distance, duration) in [(1.0, 1.0), (3.2, 17.5), (42.195, 190.0), (0.4, 2.25)] {
            let w = Workout::running(id("1"), noon(), Coords::new(0.0, 0.0), distance, duration, 170.0);
            let expected = duration / distance;
            assert!((w.pace().unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cycling_speed() {
        let w = Workout::cycling(id("2"), noon(), Coords::new(0.0, 0.0), 20.0, 60.0, 150.0);
        assert_eq!(w.speed(), Some(20.0));
        assert_eq!(w.pace(), None);

        let w = Workout::cycling(id("3"), noon(), Coords::new(0.0, 0.0), 27.0, 45.0, -12.0);
        assert!((w.speed().unwrap() - 36.0).abs() < 1e-12);
    }

    fn local_day(at: DateTime<Utc>) -> String {
        at.with_timezone(&Local).format("%B %-d").to_string()
    }

    #[test]
    fn test_description_uses_label_and_local_date() {
        let day = local_day(noon());

        let running = Workout::running(id("1"), noon(), Coords::new(0.0, 0.0), 5.0, 25.0, 180.0);
        assert_eq!(running.description(), format!("Running on {day}"));

        let cycling = Workout::cycling(id("2"), noon(), Coords::new(0.0, 0.0), 5.0, 25.0, 0.0);
        assert_eq!(cycling.description(), format!("Cycling on {day}"));
        assert_eq!(cycling.popup_content(), format!("🚴 Cycling on {day}"));
    }

    #[test]
    fn test_id_generator_is_ten_digits_and_monotonic() {
        let mut ids = IdGenerator::new();
        let now = Utc.timestamp_millis_opt(1_718_000_123_456).unwrap();

        let first = ids.next_id(now);
        let second = ids.next_id(now);
        let third = ids.next_id(now);

        assert_eq!(first.as_str(), "8000123456");
        assert_eq!(second.as_str(), "8000123457");
        assert_eq!(third.as_str(), "8000123458");
    }

    #[test]
    fn test_id_generator_pads_small_values() {
        let mut ids = IdGenerator::new();
        let now = Utc.timestamp_millis_opt(42).unwrap();
        assert_eq!(ids.next_id(now).as_str(), "0000000042");
    }

    #[test]
    fn test_serialized_record_shape() {
        let w = Workout::cycling(id("0000000007"), noon(), Coords::new(51.5, -0.1), 20.0, 60.0, 150.0);
        let json = serde_json::to_value(&w).unwrap();

        assert_eq!(json["id"], "0000000007");
        assert_eq!(json["type"], "cycling");
        assert_eq!(json["coords"], serde_json::json!([51.5, -0.1]));
        assert_eq!(json["elevationGain"], 150.0);
        assert_eq!(json["speed"], 20.0);
        assert_eq!(json["description"], w.description());
        assert!(json.get("cadence").is_none());
    }

    #[test]
    fn test_deserializes_record_written_by_browser_app() {
        let raw = r#"{
            "date": "2024-03-15T12:00:00.000Z",
            "id": "0501234567",
            "coords": [51.5, -0.1],
            "distance": 5,
            "duration": 25,
            "type": "running",
            "cadence": 180,
            "pace": 5,
            "description": "Running on March 15"
        }"#;

        let record: WorkoutRecord = serde_json::from_str(raw).unwrap();
        let w = record.into_workout(Utc::now());
        assert_eq!(w.id().as_str(), "0501234567");
        assert_eq!(w.kind(), ActivityKind::Running);
        assert_eq!(w.coords(), Coords::new(51.5, -0.1));
        assert_eq!(w.pace(), Some(5.0));
        assert_eq!(w.created_at(), noon());
        assert_eq!(w.description(), "Running on March 15");
    }

    #[test]
    fn test_stored_pace_and_speed_are_recomputed() {
        let raw = r#"[
            {"id":"1","date":"2024-03-15T12:00:00Z","coords":[0,0],"distance":5,"duration":25,
             "type":"running","cadence":180,"pace":999,"description":"Running on March 15"},
            {"id":"2","date":"2024-03-15T12:00:00Z","coords":[0,0],"distance":20,"duration":60,
             "type":"cycling","elevationGain":10,"speed":1,"description":"Cycling on March 15"}
        ]"#;
        let records: Vec<WorkoutRecord> = serde_json::from_str(raw).unwrap();
        let workouts: Vec<Workout> = records.into_iter().map(|r| r.into_workout(noon())).collect();

        assert_eq!(workouts[0].pace(), Some(5.0));
        assert_eq!(workouts[1].speed(), Some(20.0));
    }

    #[test]
    fn test_record_without_date_or_description() {
        let raw = r#"{"id":"7","coords":[1,2],"distance":8,"duration":40,
            "type":"running","cadence":165}"#;
        let record: WorkoutRecord = serde_json::from_str(raw).unwrap();
        let w = record.into_workout(noon());

        assert_eq!(w.created_at(), noon());
        assert_eq!(w.description(), format!("Running on {}", local_day(noon())));
        assert_eq!(w.pace(), Some(5.0));
    }

    #[test]
    fn test_saved_workout_reads_back_equal() {
        let w = Workout::cycling(id("0000000009"), noon(), Coords::new(51.5, -0.1), 20.0, 60.0, 150.0);
        let json = serde_json::to_string(&w).unwrap();
        let record: WorkoutRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.into_workout(Utc::now()), w);
    }

    #[test]
    fn test_check_invariants() {
        let ok = Workout::cycling(id("1"), noon(), Coords::new(0.0, 0.0), 10.0, 30.0, -5.0);
        assert!(ok.check_invariants().is_ok());

        let bad = Workout::running(id("2"), noon(), Coords::new(0.0, 0.0), 10.0, 30.0, 0.0);
        assert_eq!(
            bad.check_invariants(),
            Err(ValidationError::NotPositive(Field::Cadence))
        );

        let bad = Workout::cycling(id("3"), noon(), Coords::new(0.0, 0.0), 10.0, 30.0, f64::NAN);
        assert_eq!(
            bad.check_invariants(),
            Err(ValidationError::NotFinite(Field::ElevationGain))
        );
    }
}
