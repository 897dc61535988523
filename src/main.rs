//! Trailmark - terminal workout map
//!
//! Opens the saved workouts, looks up the current position in the
//! background and runs the map/list UI until the user quits.

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    layout::Rect,
};
use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use trailmark::{
    Coords, DomainResult, Geolocator,
    cli::Cli,
    infrastructure::FileStorage,
    initialize,
    logging::init_logging,
    presentation::{InputHandler, MapView, TerminalConfirmer, TuiSession, ViewState, render_ui},
};

type Session = TuiSession<FileStorage, TerminalConfirmer>;

/// Poll timeout while the map is idle.
const IDLE_TICK: Duration = Duration::from_millis(250);
/// Poll timeout while a pan animation runs.
const FRAME_TICK: Duration = Duration::from_millis(30);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, &cli.log_path())
        .with_context(|| format!("opening log file {}", cli.log_path().display()))?;
    tracing::info!(data_dir = %cli.data_dir.display(), "starting");

    let storage = cli.open_storage().context("resetting saved workouts")?;
    let mut session = initialize(cli.session_config(), storage, MapView::new(), TerminalConfirmer::new());
    let mut view = ViewState::new(cli.export_path());

    let (tx, positions) = mpsc::channel();
    let geolocator = cli.geolocator();
    thread::spawn(move || {
        // the receiver may be gone if the user already quit
        let _ = tx.send(geolocator.current_position());
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut session, &mut view, &positions);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(%err, "terminal error");
    }
    tracing::info!(workouts = session.store().len(), "exiting");
    res.context("terminal UI failed")
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
    view: &mut ViewState,
    positions: &Receiver<DomainResult<Coords>>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, session, view))?;

        let timeout = if session.map().is_animating() {
            FRAME_TICK
        } else {
            IDLE_TICK
        };

        if event::poll(timeout)? {
            let size = terminal.size()?;
            let screen = Rect::new(0, 0, size.width, size.height);
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    InputHandler::handle_key_event(session, view, key.code, key.modifiers);
                }
                Event::Mouse(mouse) => {
                    InputHandler::handle_mouse_event(session, view, mouse, screen);
                }
                _ => {}
            }
        }

        if view.quit {
            return Ok(());
        }

        session.poll_position(positions);

        session.map_mut().tick();

        if session.confirmer_mut().take_redraw() {
            terminal.clear()?;
        }
    }
}
