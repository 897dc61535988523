//! Session state for the workout map.
//!
//! `SessionController` owns the workout store and the marker registry and
//! keeps them in step: every stored workout has exactly one registry entry,
//! and every mutation is validated before anything is touched.

use chrono::{DateTime, Utc};
use std::sync::mpsc::{Receiver, TryRecvError};

use super::ports::{Confirmer, MapSurface, Popup, TileLayer};
use crate::domain::{
    BlobStorage, Coords, DomainError, DomainResult, IdGenerator, MarkerRegistry, ValidationError,
    WORKOUTS_KEY, Workout, WorkoutForm, WorkoutId, WorkoutStore,
};

pub const DEFAULT_ZOOM: u8 = 13;

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Zoom used for the initial view and when locating a workout
    pub zoom: u8,
    /// Blob name the workout list is persisted under
    pub storage_key: String,
    pub tile_layer: TileLayer,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            storage_key: WORKOUTS_KEY.to_string(),
            tile_layer: TileLayer::default(),
        }
    }
}

/// Visibility of the new-workout form.
///
/// A map click opens the form at the clicked position. A valid submit or a
/// cancel closes it; an invalid submit leaves it open with its fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormState {
    #[default]
    Hidden,
    Visible {
        position: Coords,
        form: WorkoutForm,
    },
}

/// Whether the map can take clicks yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapStatus {
    /// Waiting for the first position
    Locating,
    Ready { center: Coords },
    /// No position could be obtained; workouts cannot be created
    Unavailable,
}

/// Entry point: opens the store and registers a marker for every
/// workout already persisted.
///
/// Markers are only drawn once a position arrives through
/// [`SessionController::on_position`].
pub fn initialize<S, M, C>(
    config: SessionConfig,
    storage: S,
    map: M,
    confirmer: C,
) -> SessionController<S, M, C>
where
    S: BlobStorage,
    M: MapSurface,
    C: Confirmer,
{
    let store = WorkoutStore::open(storage, config.storage_key.clone());
    let mut markers = MarkerRegistry::new();
    for workout in store.list(false) {
        markers.create(workout.id().clone(), workout.coords());
    }
    tracing::info!(workouts = store.len(), "session initialized");

    SessionController {
        store,
        markers,
        map,
        confirmer,
        ids: IdGenerator::new(),
        clock: Utc::now,
        config,
        form: FormState::Hidden,
        sorted: false,
        map_status: MapStatus::Locating,
        status_message: None,
    }
}

pub struct SessionController<S: BlobStorage, M: MapSurface, C: Confirmer> {
    store: WorkoutStore<S>,
    markers: MarkerRegistry,
    map: M,
    confirmer: C,
    ids: IdGenerator,
    clock: fn() -> DateTime<Utc>,
    config: SessionConfig,
    form: FormState,
    sorted: bool,
    map_status: MapStatus,
    /// Temporary message for the user; cleared on the next action
    status_message: Option<String>,
}

impl<S: BlobStorage, M: MapSurface, C: Confirmer> SessionController<S, M, C> {
    /// Replaces the creation-time source.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Handles the outcome of the one position request.
    ///
    /// On success the map is set up and every registered marker is drawn.
    /// On failure the map stays unavailable for the rest of the session.
    pub fn on_position(&mut self, position: DomainResult<Coords>) {
        if !matches!(self.map_status, MapStatus::Locating) {
            tracing::debug!("ignoring repeated position result");
            return;
        }

        match position {
            Ok(center) => {
                self.map.init_view(center, self.config.zoom);
                self.map.add_tile_layer(&self.config.tile_layer);
                for marker in self.markers.iter() {
                    if let Some(workout) = self.store.get(&marker.workout_id) {
                        self.map
                            .place_marker(marker.handle, marker.coords, &popup_for(workout));
                    }
                }
                self.map_status = MapStatus::Ready { center };
                tracing::info!(%center, markers = self.markers.len(), "map ready");
            }
            Err(e) => {
                tracing::warn!(err = %e, "map unavailable");
                self.map_status = MapStatus::Unavailable;
                self.status_message = Some(match e {
                    DomainError::GeolocationUnavailable(_) => e.to_string(),
                    other => format!("Unable to get your position: {other}"),
                });
            }
        }
    }

    /// Takes the lookup result off `positions` once it has arrived. A
    /// sender that hung up without answering counts as a failed lookup.
    pub fn poll_position(&mut self, positions: &Receiver<DomainResult<Coords>>) {
        if !matches!(self.map_status, MapStatus::Locating) {
            return;
        }
        match positions.try_recv() {
            Ok(position) => self.on_position(position),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.on_position(Err(
                DomainError::GeolocationUnavailable("position lookup stopped".to_string()),
            )),
        }
    }

    /// A click on the map opens the form at `position`.
    ///
    /// Clicking again while the form is open moves the pending position and
    /// keeps what was typed.
    pub fn click_map(&mut self, position: Coords) {
        if !matches!(self.map_status, MapStatus::Ready { .. }) {
            self.status_message = Some("The map is not available yet".to_string());
            return;
        }

        self.status_message = None;
        self.form = match std::mem::take(&mut self.form) {
            FormState::Hidden => FormState::Visible {
                position,
                form: WorkoutForm::default(),
            },
            FormState::Visible { form, .. } => FormState::Visible { position, form },
        };
    }

    /// Closes the form and discards its fields.
    pub fn cancel_form(&mut self) {
        self.form = FormState::Hidden;
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> Option<&mut WorkoutForm> {
        match &mut self.form {
            FormState::Visible { form, .. } => Some(form),
            FormState::Hidden => None,
        }
    }

    /// Validates the open form and, if it passes, records the workout.
    ///
    /// Returns `Ok(None)` when no form is open. On a validation error
    /// nothing changes and the form stays open.
    pub fn submit_form(&mut self) -> Result<Option<WorkoutId>, ValidationError> {
        let FormState::Visible { position, form } = &self.form else {
            return Ok(None);
        };
        let position = *position;

        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(e) => {
                tracing::debug!(err = %e, "form rejected");
                self.status_message = Some(DomainError::from(e).to_string());
                return Err(e);
            }
        };

        let id = self.fresh_id();
        let workout = Workout::from_draft(id.clone(), (self.clock)(), position, &draft);
        let popup = popup_for(&workout);
        tracing::info!(id = %id, kind = workout.kind().as_str(), %position, "workout created");

        self.status_message = None;
        if let Err(e) = self.store.add(workout) {
            self.report_unsaved(&e);
        }
        let handle = self.markers.create(id.clone(), position);
        self.map.place_marker(handle, position, &popup);
        self.form = FormState::Hidden;

        Ok(Some(id))
    }

    /// Deletes one workout and its marker after the user confirms.
    ///
    /// Returns whether anything was deleted. An unknown id is stale UI
    /// state and is ignored without prompting.
    pub fn delete_workout(&mut self, id: &WorkoutId) -> bool {
        if !self.store.contains(id) {
            tracing::debug!(id = %id, "delete requested for unknown workout");
            return false;
        }
        if !self
            .confirmer
            .confirm("Are you sure you want to delete this workout?")
        {
            return false;
        }

        self.status_message = None;
        match self.store.remove(id) {
            Ok(_) => {}
            Err(DomainError::NotFound(_)) => return false,
            Err(e) => self.report_unsaved(&e),
        }
        if let Some(handle) = self.markers.find_by_workout(id) {
            self.markers.remove(handle);
            self.map.remove_marker(handle);
        }
        tracing::info!(id = %id, remaining = self.store.len(), "workout deleted");
        true
    }

    /// Deletes every workout and marker after the user confirms.
    ///
    /// Does nothing, and asks nothing, when there are no workouts.
    pub fn delete_all(&mut self) -> bool {
        if self.store.is_empty() {
            return false;
        }
        if !self
            .confirmer
            .confirm("Are you sure you want to delete all workouts?")
        {
            return false;
        }

        self.status_message = None;
        let count = self.store.len();
        if let Err(e) = self.store.remove_all() {
            self.report_unsaved(&e);
        }
        for marker in self.markers.remove_all() {
            self.map.remove_marker(marker.handle);
        }
        tracing::info!(count, "all workouts deleted");
        true
    }

    /// Flips between insertion order and ascending distance.
    ///
    /// Has no effect on an empty list. Returns the new setting.
    pub fn toggle_sort(&mut self) -> bool {
        if !self.store.is_empty() {
            self.sorted = !self.sorted;
        }
        self.sorted
    }

    /// Pans the map to a workout. Nothing is mutated.
    pub fn locate(&mut self, id: &WorkoutId) -> bool {
        let Some(workout) = self.store.get(id) else {
            return false;
        };
        if !matches!(self.map_status, MapStatus::Ready { .. }) {
            return false;
        }
        self.map.set_view(workout.coords(), self.config.zoom, true);
        true
    }

    /// The list as it should be displayed.
    pub fn visible_workouts(&self) -> Vec<&Workout> {
        self.store.list(self.sorted)
    }

    /// True when the "no workouts" message should be shown.
    pub fn is_empty_state(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn map_status(&self) -> MapStatus {
        self.map_status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &WorkoutStore<S> {
        &self.store
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn confirmer_mut(&mut self) -> &mut C {
        &mut self.confirmer
    }

    /// Next generated id not already taken by a stored workout.
    fn fresh_id(&mut self) -> WorkoutId {
        loop {
            let id = self.ids.next_id((self.clock)());
            if !self.store.contains(&id) {
                return id;
            }
        }
    }

    fn report_unsaved(&mut self, e: &DomainError) {
        tracing::error!(err = %e, "could not persist workouts");
        self.status_message = Some(format!("Change kept for this session only: {e}"));
    }
}

fn popup_for(workout: &Workout) -> Popup {
    Popup {
        content: workout.popup_content(),
        kind: workout.kind(),
    }
}
