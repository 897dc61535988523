use super::models::WorkoutId;

/// A form field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    ElevationGain,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Distance => "distance",
            Field::Duration => "duration",
            Field::Cadence => "cadence",
            Field::ElevationGain => "elevation gain",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must be a number")]
    NotFinite(Field),

    #[error("{0} must be greater than zero")]
    NotPositive(Field),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::NotFinite(field) | ValidationError::NotPositive(field) => *field,
        }
    }
}

/// Errors raised by the workout domain.
///
/// None of these are fatal: the session controller turns each one into a
/// status message and keeps running.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Rejected form input
    #[error("Invalid values: {0}")]
    Validation(#[from] ValidationError),

    /// No workout with this id is stored
    #[error("Workout not found: {0}")]
    NotFound(WorkoutId),

    /// Stored blob exists but could not be parsed
    #[error("Stored workouts are unreadable: {0}")]
    PersistenceCorrupt(String),

    /// No position could be obtained
    #[error("Unable to get your position: {0}")]
    GeolocationUnavailable(String),

    /// Backend refused a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = DomainError::from(ValidationError::NotPositive(Field::Distance));
        assert_eq!(err.to_string(), "Invalid values: distance must be greater than zero");
    }

    #[test]
    fn test_validation_error_field() {
        assert_eq!(ValidationError::NotFinite(Field::Cadence).field(), Field::Cadence);
        assert_eq!(
            ValidationError::NotPositive(Field::Duration).field(),
            Field::Duration
        );
    }
}
