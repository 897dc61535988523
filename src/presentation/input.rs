use super::map_view::MapView;
use super::ui::{layout_areas, map_inner};
use crate::application::{Confirmer, FormState, SessionController};
use crate::domain::{BlobStorage, Field, WorkoutId};
use crate::infrastructure::CsvExporter;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use ratatui::widgets::ListState;
use std::path::PathBuf;

/// Which panel takes keys while the form is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Map,
    List,
}

/// Focused row of the new-workout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormFocus {
    Type,
    #[default]
    Distance,
    Duration,
    /// Cadence or elevation gain, depending on the activity type
    Variant,
}

impl FormFocus {
    fn next(self) -> Self {
        match self {
            FormFocus::Type => FormFocus::Distance,
            FormFocus::Distance => FormFocus::Duration,
            FormFocus::Duration => FormFocus::Variant,
            FormFocus::Variant => FormFocus::Type,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormFocus::Type => FormFocus::Variant,
            FormFocus::Distance => FormFocus::Type,
            FormFocus::Duration => FormFocus::Distance,
            FormFocus::Variant => FormFocus::Duration,
        }
    }

    fn for_field(field: Field) -> Self {
        match field {
            Field::Distance => FormFocus::Distance,
            Field::Duration => FormFocus::Duration,
            Field::Cadence | Field::ElevationGain => FormFocus::Variant,
        }
    }
}

/// UI-only state: nothing here is persisted or seen by the session.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub focus: Focus,
    /// Index into the displayed list
    pub selected: usize,
    pub form_focus: FormFocus,
    /// Scroll position of the rendered list
    pub list: ListState,
    /// Where `e` writes the CSV export
    pub export_path: PathBuf,
    pub quit: bool,
}

impl ViewState {
    pub fn new(export_path: impl Into<PathBuf>) -> Self {
        Self {
            export_path: export_path.into(),
            ..Self::default()
        }
    }

    fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

pub type TuiSession<S, C> = SessionController<S, MapView, C>;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event<S: BlobStorage, C: Confirmer>(
        session: &mut TuiSession<S, C>,
        view: &mut ViewState,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            view.quit = true;
            return;
        }

        if matches!(session.form(), FormState::Visible { .. }) {
            Self::handle_form_mode(session, view, key);
        } else {
            Self::handle_normal_mode(session, view, key);
        }
    }

    fn handle_normal_mode<S: BlobStorage, C: Confirmer>(
        session: &mut TuiSession<S, C>,
        view: &mut ViewState,
        key: KeyCode,
    ) {
        session.clear_status();

        match key {
            KeyCode::Char('q') => view.quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                view.focus = match view.focus {
                    Focus::Map => Focus::List,
                    Focus::List => Focus::Map,
                };
                view.clamp_selection(session.store().len());
            }
            KeyCode::Char('s') => {
                let sorted = session.toggle_sort();
                view.selected = 0;
                if !session.is_empty_state() {
                    session.set_status(if sorted {
                        "Sorted by distance"
                    } else {
                        "Showing workouts as logged"
                    });
                }
            }
            KeyCode::Char('D') => {
                if session.delete_all() {
                    view.selected = 0;
                    session.set_status("All workouts deleted");
                }
            }
            KeyCode::Char('e') => Self::export(session, view),
            KeyCode::Char('+') | KeyCode::Char('=') => session.map_mut().zoom_in(),
            KeyCode::Char('-') => session.map_mut().zoom_out(),
            _ => match view.focus {
                Focus::Map => Self::handle_map_keys(session, key),
                Focus::List => Self::handle_list_keys(session, view, key),
            },
        }
    }

    fn handle_map_keys<S: BlobStorage, C: Confirmer>(session: &mut TuiSession<S, C>, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => session.map_mut().pan(0, 1),
            KeyCode::Down | KeyCode::Char('j') => session.map_mut().pan(0, -1),
            KeyCode::Left | KeyCode::Char('h') => session.map_mut().pan(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => session.map_mut().pan(1, 0),
            KeyCode::Enter | KeyCode::Char(' ') => match session.map().center() {
                Some(center) => session.click_map(center),
                None => session.set_status("The map is not available yet"),
            },
            _ => {}
        }
    }

    fn handle_list_keys<S: BlobStorage, C: Confirmer>(
        session: &mut TuiSession<S, C>,
        view: &mut ViewState,
        key: KeyCode,
    ) {
        let len = session.store().len();
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                view.selected = view.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if view.selected + 1 < len {
                    view.selected += 1;
                }
            }
            KeyCode::Home => view.selected = 0,
            KeyCode::End => view.selected = len.saturating_sub(1),
            KeyCode::Enter => {
                if let Some(id) = Self::selected_id(session, view) {
                    session.locate(&id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = Self::selected_id(session, view)
                    && session.delete_workout(&id)
                {
                    view.clamp_selection(session.store().len());
                    if session.is_empty_state() {
                        view.focus = Focus::Map;
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_form_mode<S: BlobStorage, C: Confirmer>(
        session: &mut TuiSession<S, C>,
        view: &mut ViewState,
        key: KeyCode,
    ) {
        match key {
            KeyCode::Esc => {
                session.cancel_form();
                session.clear_status();
                view.form_focus = FormFocus::default();
            }
            KeyCode::Enter => match session.submit_form() {
                Ok(Some(_)) => {
                    view.form_focus = FormFocus::default();
                }
                Ok(None) => {}
                Err(e) => view.form_focus = FormFocus::for_field(e.field()),
            },
            KeyCode::Tab | KeyCode::Down => view.form_focus = view.form_focus.next(),
            KeyCode::BackTab | KeyCode::Up => view.form_focus = view.form_focus.previous(),
            _ => {
                let Some(form) = session.form_mut() else {
                    return;
                };
                let field = match view.form_focus {
                    FormFocus::Type => {
                        if matches!(key, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                            form.toggle_kind();
                        }
                        return;
                    }
                    FormFocus::Distance => Field::Distance,
                    FormFocus::Duration => Field::Duration,
                    FormFocus::Variant => form.variant_field(),
                };
                let text = form.text_mut(field);
                match key {
                    KeyCode::Backspace => {
                        text.pop();
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => text.push(c),
                    _ => {}
                }
            }
        }
    }

    /// Left click: on the map opens or moves the form; on a list entry
    /// selects and locates it; anywhere else closes an open form.
    pub fn handle_mouse_event<S: BlobStorage, C: Confirmer>(
        session: &mut TuiSession<S, C>,
        view: &mut ViewState,
        mouse: MouseEvent,
        screen: Rect,
    ) {
        let form_visible = matches!(session.form(), FormState::Visible { .. });
        let areas = layout_areas(screen, form_visible);
        let inner = map_inner(areas.map);
        let at = Position::new(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::ScrollUp if inner.contains(at) => session.map_mut().zoom_in(),
            MouseEventKind::ScrollDown if inner.contains(at) => session.map_mut().zoom_out(),
            MouseEventKind::Down(MouseButton::Left) => {
                if inner.contains(at) {
                    view.focus = Focus::Map;
                    let bounds = session.map().bounds(inner.width, inner.height);
                    match bounds {
                        Some(bounds) => session.click_map(bounds.coords_at(
                            mouse.column - inner.x,
                            mouse.row - inner.y,
                            inner.width,
                            inner.height,
                        )),
                        None => session.set_status("The map is not available yet"),
                    }
                } else if areas.form.is_some_and(|form| form.contains(at)) {
                    // clicks inside the form keep it open
                } else if form_visible {
                    session.cancel_form();
                    view.form_focus = FormFocus::default();
                } else if areas.list.contains(at) && !session.is_empty_state() {
                    // each entry is two rows below the top border
                    let row = usize::from(mouse.row.saturating_sub(areas.list.y + 1) / 2);
                    let index = view.list.offset() + row;
                    if mouse.row > areas.list.y && index < session.store().len() {
                        view.focus = Focus::List;
                        view.selected = index;
                        if let Some(id) = Self::selected_id(session, view) {
                            session.locate(&id);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn selected_id<S: BlobStorage, C: Confirmer>(
        session: &TuiSession<S, C>,
        view: &ViewState,
    ) -> Option<WorkoutId> {
        session
            .visible_workouts()
            .get(view.selected)
            .map(|w| w.id().clone())
    }

    fn export<S: BlobStorage, C: Confirmer>(session: &mut TuiSession<S, C>, view: &ViewState) {
        let result = CsvExporter::export_workouts(&session.visible_workouts(), &view.export_path);
        match result {
            Ok(rows) => session.set_status(format!(
                "Exported {rows} workouts to {}",
                view.export_path.display()
            )),
            Err(e) => session.set_status(format!("Export failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{SessionConfig, initialize};
    use crate::domain::{ActivityKind, Coords};
    use crate::infrastructure::MemoryStorage;

    struct Always(bool);

    impl Confirmer for Always {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.0
        }
    }

    type Session = TuiSession<MemoryStorage, Always>;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 100,
        height: 40,
    };

    fn session() -> Session {
        let mut session = initialize(SessionConfig::default(), MemoryStorage::new(), MapView::new(), Always(true));
        session.on_position(Ok(Coords::new(51.5, -0.1)));
        session
    }

    fn press(session: &mut Session, view: &mut ViewState, key: KeyCode) {
        InputHandler::handle_key_event(session, view, key, KeyModifiers::NONE);
    }

    fn type_text(session: &mut Session, view: &mut ViewState, text: &str) {
        for c in text.chars() {
            press(session, view, KeyCode::Char(c));
        }
    }

    fn log_run(session: &mut Session, view: &mut ViewState, distance: &str) {
        press(session, view, KeyCode::Enter);
        type_text(session, view, distance);
        press(session, view, KeyCode::Tab);
        type_text(session, view, "30");
        press(session, view, KeyCode::Tab);
        type_text(session, view, "170");
        press(session, view, KeyCode::Enter);
    }

    fn click(session: &mut Session, view: &mut ViewState, column: u16, row: u16) {
        let mouse = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        InputHandler::handle_mouse_event(session, view, mouse, SCREEN);
    }

    #[test]
    fn test_keyboard_workout_creation() {
        let mut session = session();
        let mut view = ViewState::default();

        press(&mut session, &mut view, KeyCode::Enter);
        assert!(matches!(session.form(), FormState::Visible { .. }));
        assert_eq!(view.form_focus, FormFocus::Distance);

        type_text(&mut session, &mut view, "5x");
        press(&mut session, &mut view, KeyCode::Tab);
        type_text(&mut session, &mut view, "25");
        press(&mut session, &mut view, KeyCode::Tab);
        type_text(&mut session, &mut view, "180");
        press(&mut session, &mut view, KeyCode::Enter);

        assert_eq!(*session.form(), FormState::Hidden);
        let workouts = session.visible_workouts();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].pace(), Some(5.0));
        assert_eq!(workouts[0].coords(), Coords::new(51.5, -0.1));
    }

    #[test]
    fn test_type_toggle_switches_to_cycling() {
        let mut session = session();
        let mut view = ViewState::default();

        press(&mut session, &mut view, KeyCode::Enter);
        press(&mut session, &mut view, KeyCode::BackTab);
        assert_eq!(view.form_focus, FormFocus::Type);
        press(&mut session, &mut view, KeyCode::Right);

        press(&mut session, &mut view, KeyCode::Tab);
        type_text(&mut session, &mut view, "20");
        press(&mut session, &mut view, KeyCode::Tab);
        type_text(&mut session, &mut view, "60");
        press(&mut session, &mut view, KeyCode::Tab);
        type_text(&mut session, &mut view, "-15");
        press(&mut session, &mut view, KeyCode::Enter);

        let workouts = session.visible_workouts();
        assert_eq!(workouts[0].kind(), ActivityKind::Cycling);
        assert_eq!(workouts[0].speed(), Some(20.0));
    }

    #[test]
    fn test_invalid_submit_focuses_bad_field() {
        let mut session = session();
        let mut view = ViewState::default();

        press(&mut session, &mut view, KeyCode::Enter);
        type_text(&mut session, &mut view, "5");
        press(&mut session, &mut view, KeyCode::Tab);
        type_text(&mut session, &mut view, "25");
        press(&mut session, &mut view, KeyCode::Enter);

        assert_eq!(view.form_focus, FormFocus::Variant);
        assert!(matches!(session.form(), FormState::Visible { .. }));
        assert!(session.is_empty_state());

        press(&mut session, &mut view, KeyCode::Esc);
        assert_eq!(*session.form(), FormState::Hidden);
        assert!(session.status_message().is_none());
    }

    #[test]
    fn test_backspace_edits_focused_field() {
        let mut session = session();
        let mut view = ViewState::default();
        press(&mut session, &mut view, KeyCode::Enter);
        type_text(&mut session, &mut view, "12");
        press(&mut session, &mut view, KeyCode::Backspace);
        assert_eq!(session.form_mut().unwrap().distance, "1");
    }

    #[test]
    fn test_list_delete_and_locate() {
        let mut session = session();
        let mut view = ViewState::default();
        log_run(&mut session, &mut view, "5");
        session.map_mut().pan(3, 3);
        log_run(&mut session, &mut view, "8");

        press(&mut session, &mut view, KeyCode::Tab);
        assert_eq!(view.focus, Focus::List);
        press(&mut session, &mut view, KeyCode::Down);
        assert_eq!(view.selected, 1);

        let second = session.visible_workouts()[1].coords();
        press(&mut session, &mut view, KeyCode::Enter);
        while session.map_mut().tick() {}
        assert_eq!(session.map().center(), Some(second));

        press(&mut session, &mut view, KeyCode::Char('d'));
        assert_eq!(session.store().len(), 1);
        assert_eq!(view.selected, 0);

        press(&mut session, &mut view, KeyCode::Char('d'));
        assert!(session.is_empty_state());
        assert_eq!(view.focus, Focus::Map);
    }

    #[test]
    fn test_sort_and_delete_all_keys() {
        let mut session = session();
        let mut view = ViewState::default();
        log_run(&mut session, &mut view, "9");
        log_run(&mut session, &mut view, "4");

        press(&mut session, &mut view, KeyCode::Char('s'));
        assert!(session.is_sorted());
        assert_eq!(session.visible_workouts()[0].distance(), 4.0);

        press(&mut session, &mut view, KeyCode::Char('D'));
        assert!(session.is_empty_state());
        assert!(session.markers().is_empty());
        assert_eq!(session.map().pins().count(), 0);
    }

    #[test]
    fn test_quit_keys() {
        let mut session = session();
        let mut view = ViewState::default();
        press(&mut session, &mut view, KeyCode::Char('q'));
        assert!(view.quit);

        let mut view = ViewState::default();
        InputHandler::handle_key_event(&mut session, &mut view, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(view.quit);
    }

    #[test]
    fn test_q_in_form_is_not_quit() {
        let mut session = session();
        let mut view = ViewState::default();
        press(&mut session, &mut view, KeyCode::Enter);
        press(&mut session, &mut view, KeyCode::Char('q'));
        assert!(!view.quit);
    }

    #[test]
    fn test_mouse_click_on_map_opens_form_and_outside_click_cancels() {
        let mut session = session();
        let mut view = ViewState::default();
        let areas = layout_areas(SCREEN, false);
        let inner = map_inner(areas.map);

        click(&mut session, &mut view, inner.x + inner.width / 2, inner.y + inner.height / 2);
        let FormState::Visible { position, .. } = session.form().clone() else {
            panic!("form should be open");
        };
        assert!((position.lat - 51.5).abs() < 0.05);
        assert!((position.lng - -0.1).abs() < 0.05);

        // a click in the sidebar below the form closes it
        let shown = layout_areas(SCREEN, true);
        click(&mut session, &mut view, shown.list.x + 2, shown.list.y + 2);
        assert_eq!(*session.form(), FormState::Hidden);
    }

    #[test]
    fn test_mouse_click_on_list_entry_selects() {
        let mut session = session();
        let mut view = ViewState::default();
        log_run(&mut session, &mut view, "5");
        log_run(&mut session, &mut view, "6");

        let areas = layout_areas(SCREEN, false);
        click(&mut session, &mut view, areas.list.x + 3, areas.list.y + 3);
        assert_eq!(view.focus, Focus::List);
        assert_eq!(view.selected, 1);
    }

    #[test]
    fn test_mouse_click_on_scrolled_list() {
        use super::super::ui::render_ui;
        use ratatui::{Terminal, backend::TestBackend};

        let mut session = session();
        let mut view = ViewState::default();
        for distance in 1..=25 {
            log_run(&mut session, &mut view, &distance.to_string());
        }
        press(&mut session, &mut view, KeyCode::Tab);
        press(&mut session, &mut view, KeyCode::End);

        let mut terminal = Terminal::new(TestBackend::new(SCREEN.width, SCREEN.height)).unwrap();
        terminal.draw(|f| render_ui(f, &session, &mut view)).unwrap();
        let offset = view.list.offset();
        assert!(offset > 0);

        let areas = layout_areas(SCREEN, false);
        click(&mut session, &mut view, areas.list.x + 3, areas.list.y + 1);
        assert_eq!(view.selected, offset);
        let expected = session.visible_workouts()[offset].coords();
        while session.map_mut().tick() {}
        assert_eq!(session.map().center(), Some(expected));
    }

    #[test]
    fn test_mouse_click_before_position_reports() {
        let mut session = initialize(SessionConfig::default(), MemoryStorage::new(), MapView::new(), Always(true));
        let mut view = ViewState::default();
        let inner = map_inner(layout_areas(SCREEN, false).map);
        click(&mut session, &mut view, inner.x + 1, inner.y + 1);
        assert_eq!(*session.form(), FormState::Hidden);
        assert!(session.status_message().is_some());
    }

    #[test]
    fn test_export_key_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session();
        let mut view = ViewState::new(dir.path().join("workouts.csv"));
        log_run(&mut session, &mut view, "5");

        press(&mut session, &mut view, KeyCode::Char('e'));
        assert!(view.export_path.is_file());
        assert!(session.status_message().unwrap().starts_with("Exported 1 workouts"));
    }

    #[test]
    fn test_zoom_keys() {
        let mut session = session();
        let mut view = ViewState::default();
        let zoom = session.map().zoom();
        press(&mut session, &mut view, KeyCode::Char('+'));
        assert_eq!(session.map().zoom(), zoom + 1);
        press(&mut session, &mut view, KeyCode::Char('-'));
        assert_eq!(session.map().zoom(), zoom);
    }
}
