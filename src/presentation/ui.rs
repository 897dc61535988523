use super::input::{Focus, FormFocus, ViewState};
use super::map_view::MapView;
use crate::application::{Confirmer, FormState, MapStatus, SessionController};
use crate::domain::{Activity, ActivityKind, BlobStorage, Workout, WorkoutForm};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Wrap,
        canvas::{Canvas, Map, MapResolution},
    },
};

/// Height of the new-workout form, borders included.
pub const FORM_HEIGHT: u16 = 7;

/// Screen regions, shared by rendering and mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub sidebar: Rect,
    pub form: Option<Rect>,
    pub list: Rect,
    pub map: Rect,
    pub status: Rect,
}

pub fn layout_areas(area: Rect, form_visible: bool) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    let (form, list) = if form_visible {
        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(FORM_HEIGHT), Constraint::Min(0)])
            .split(body[0]);
        (Some(sidebar[0]), sidebar[1])
    } else {
        (None, body[0])
    };

    Areas {
        header: rows[0],
        sidebar: body[0],
        form,
        list,
        map: body[1],
        status: rows[2],
    }
}

/// Drawable part of the map panel.
pub fn map_inner(map: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(map)
}

pub fn render_ui<S: BlobStorage, C: Confirmer>(
    f: &mut Frame,
    session: &SessionController<S, MapView, C>,
    view: &mut ViewState,
) {
    let form_visible = matches!(session.form(), FormState::Visible { .. });
    let areas = layout_areas(f.area(), form_visible);

    render_header(f, session, areas.header);
    render_workouts(f, session, view, areas.list);
    if let (Some(area), FormState::Visible { position, form }) = (areas.form, session.form()) {
        render_form(f, form, view.form_focus, &position.to_string(), area);
    }
    render_map(f, session, view, areas.map);
    render_status_bar(f, session, view, areas.status);
}

fn render_header<S: BlobStorage, C: Confirmer>(
    f: &mut Frame,
    session: &SessionController<S, MapView, C>,
    area: Rect,
) {
    let count = session.store().len();
    let order = if session.is_sorted() { "by distance" } else { "as logged" };
    let header = Paragraph::new(format!(
        "trailmark - workout map | {count} workout{} | {order}",
        if count == 1 { "" } else { "s" }
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn kind_color(kind: ActivityKind) -> Color {
    match kind {
        ActivityKind::Running => Color::Green,
        ActivityKind::Cycling => Color::Yellow,
    }
}

/// Second line of a list entry: distance, duration and the variant metrics.
pub fn workout_details(workout: &Workout) -> String {
    let common = format!(
        "{} km  ⏱ {} min",
        workout.distance(),
        workout.duration()
    );
    match *workout.activity() {
        Activity::Running { cadence, pace } => {
            format!("{common}  ⚡ {pace:.1} min/km  🦶 {cadence} spm")
        }
        Activity::Cycling {
            elevation_gain,
            speed,
        } => format!("{common}  ⚡ {speed:.1} km/h  ⛰ {elevation_gain} m"),
    }
}

fn render_workouts<S: BlobStorage, C: Confirmer>(
    f: &mut Frame,
    session: &SessionController<S, MapView, C>,
    view: &mut ViewState,
    area: Rect,
) {
    let title = if session.is_sorted() {
        "Workouts (by distance)"
    } else {
        "Workouts"
    };
    let border_style = if view.focus == Focus::List {
        Style::default().fg(Color::LightBlue)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style);

    if session.is_empty_state() {
        let message = Paragraph::new("No workouts yet. Pick a spot on the map and press Enter to log one.")
            .block(block)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(message, area);
        return;
    }

    let items: Vec<ListItem> = session
        .visible_workouts()
        .into_iter()
        .map(|w| {
            let color = kind_color(w.kind());
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!("{} {}", w.kind().icon(), w.description()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("   {}", workout_details(w))),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    // the offset ratatui settles on is kept for mouse hit-testing
    view.list.select((view.focus == Focus::List).then_some(view.selected));
    f.render_stateful_widget(list, area, &mut view.list);
}

fn render_form(f: &mut Frame, form: &WorkoutForm, focus: FormFocus, position: &str, area: Rect) {
    let variant_label = match form.kind {
        ActivityKind::Running => "Cadence  ",
        ActivityKind::Cycling => "Elev Gain",
    };
    let variant_unit = match form.kind {
        ActivityKind::Running => "step/min",
        ActivityKind::Cycling => "meters",
    };

    let row = |slot: FormFocus, label: &str, value: String, unit: &str| {
        let style = if slot == focus {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("{label}  ")),
            Span::styled(format!("{value:<10}"), style),
            Span::styled(format!(" {unit}"), Style::default().fg(Color::DarkGray)),
        ])
    };

    let lines = vec![
        row(FormFocus::Type, "Type     ", format!("‹ {} ›", form.kind.label()), ""),
        row(FormFocus::Distance, "Distance ", form.distance.clone(), "km"),
        row(FormFocus::Duration, "Duration ", form.duration.clone(), "min"),
        row(
            FormFocus::Variant,
            variant_label,
            form.text(form.variant_field()).to_string(),
            variant_unit,
        ),
        Line::from(Span::styled(
            "Enter: save  Esc: cancel  Tab: next field",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("New workout at {position}"))
            .border_style(Style::default().fg(kind_color(form.kind))),
    );
    f.render_widget(widget, area);
}

fn render_map<S: BlobStorage, C: Confirmer>(
    f: &mut Frame,
    session: &SessionController<S, MapView, C>,
    view: &ViewState,
    area: Rect,
) {
    let map = session.map();
    let border_style = if view.focus == Focus::Map {
        Style::default().fg(Color::LightBlue)
    } else {
        Style::default()
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Map (zoom {})", map.zoom()))
        .border_style(border_style);
    if let Some(attribution) = map.attribution() {
        block = block.title_bottom(Line::from(attribution.to_string()).right_aligned());
    }

    let inner = map_inner(area);
    let bounds = match (session.map_status(), map.bounds(inner.width, inner.height)) {
        (MapStatus::Ready { .. }, Some(bounds)) => bounds,
        (status, _) => {
            let text = match status {
                MapStatus::Locating => "Locating you...",
                _ => "Map unavailable: no position could be obtained.",
            };
            let placeholder = Paragraph::new(text)
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(placeholder, area);
            return;
        }
    };

    let pending = match session.form() {
        FormState::Visible { position, .. } => Some(*position),
        FormState::Hidden => None,
    };
    let crosshair = map.center().filter(|_| pending.is_none() && view.focus == Focus::Map);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([bounds.west, bounds.east])
        .y_bounds([bounds.south, bounds.north])
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();
            for pin in map.pins() {
                if !bounds.contains(pin.coords) {
                    continue;
                }
                ctx.print(
                    pin.coords.lng,
                    pin.coords.lat,
                    Span::styled(
                        format!("◉ {}", pin.popup.content),
                        Style::default().fg(kind_color(pin.popup.kind)),
                    ),
                );
            }
            if let Some(position) = pending {
                ctx.print(
                    position.lng,
                    position.lat,
                    Span::styled("◌", Style::default().fg(Color::Magenta)),
                );
            }
            if let Some(center) = crosshair {
                ctx.print(
                    center.lng,
                    center.lat,
                    Span::styled("✛", Style::default().fg(Color::LightRed)),
                );
            }
        });
    f.render_widget(canvas, area);
}

fn render_status_bar<S: BlobStorage, C: Confirmer>(
    f: &mut Frame,
    session: &SessionController<S, MapView, C>,
    view: &ViewState,
    area: Rect,
) {
    let form_visible = matches!(session.form(), FormState::Visible { .. });
    let text = if let Some(status) = session.status_message() {
        status.to_string()
    } else if form_visible {
        "Type values | Tab/↑↓: field | ←→/Space on Type: running/cycling | Enter: save | Esc: cancel"
            .to_string()
    } else {
        match view.focus {
            Focus::Map => "Arrows/hjkl: pan | +/-: zoom | Enter: new workout here | Tab: list | s: sort | D: delete all | e: export CSV | q: quit".to_string(),
            Focus::List => "↑↓/jk: select | Enter: show on map | d: delete | Tab: map | s: sort | D: delete all | e: export CSV | q: quit".to_string(),
        }
    };

    let style = if session.status_message().is_some() {
        Style::default().fg(Color::Yellow)
    } else if form_visible {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}
