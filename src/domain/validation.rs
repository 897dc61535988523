//! Form input and the rules that gate workout creation.

use super::errors::{Field, ValidationError};
use super::models::ActivityKind;

/// Raw form contents, exactly as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutForm {
    pub kind: ActivityKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        Self {
            kind: ActivityKind::Running,
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
        }
    }
}

/// Numbers that passed validation, ready to become a workout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDraft {
    Running {
        distance: f64,
        duration: f64,
        cadence: f64,
    },
    Cycling {
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    },
}

impl WorkoutDraft {
    pub fn kind(&self) -> ActivityKind {
        match self {
            WorkoutDraft::Running { .. } => ActivityKind::Running,
            WorkoutDraft::Cycling { .. } => ActivityKind::Cycling,
        }
    }
}

impl WorkoutForm {
    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::Distance => &self.distance,
            Field::Duration => &self.duration,
            Field::Cadence => &self.cadence,
            Field::ElevationGain => &self.elevation,
        }
    }

    pub fn text_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Distance => &mut self.distance,
            Field::Duration => &mut self.duration,
            Field::Cadence => &mut self.cadence,
            Field::ElevationGain => &mut self.elevation,
        }
    }

    /// The field that only applies to the selected activity type.
    pub fn variant_field(&self) -> Field {
        match self.kind {
            ActivityKind::Running => Field::Cadence,
            ActivityKind::Cycling => Field::ElevationGain,
        }
    }

    pub fn toggle_kind(&mut self) {
        self.kind = self.kind.toggled();
    }

    /// Checks the fields for the selected activity type.
    ///
    /// Every field must hold a finite number. Distance and duration must be
    /// positive, and so must cadence for a run. Elevation gain may be zero or
    /// negative.
    pub fn validate(&self) -> Result<WorkoutDraft, ValidationError> {
        let distance = number(&self.distance);
        let duration = number(&self.duration);

        match self.kind {
            ActivityKind::Running => {
                let cadence = number(&self.cadence);
                let distance = require_finite(Field::Distance, distance)?;
                let duration = require_finite(Field::Duration, duration)?;
                let cadence = require_finite(Field::Cadence, cadence)?;
                Ok(WorkoutDraft::Running {
                    distance: require_positive(Field::Distance, distance)?,
                    duration: require_positive(Field::Duration, duration)?,
                    cadence: require_positive(Field::Cadence, cadence)?,
                })
            }
            ActivityKind::Cycling => {
                let elevation_gain = number(&self.elevation);
                let distance = require_finite(Field::Distance, distance)?;
                let duration = require_finite(Field::Duration, duration)?;
                let elevation_gain = require_finite(Field::ElevationGain, elevation_gain)?;
                Ok(WorkoutDraft::Cycling {
                    distance: require_positive(Field::Distance, distance)?,
                    duration: require_positive(Field::Duration, duration)?,
                    elevation_gain,
                })
            }
        }
    }
}

/// Parses a field; blank or malformed input becomes NaN so the finiteness
/// check rejects it.
fn number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

pub fn require_finite(field: Field, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite(field))
    }
}

pub fn require_positive(field: Field, value: f64) -> Result<f64, ValidationError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive(field))
    }
}
