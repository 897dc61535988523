use crate::application::Confirmer;
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEventKind},
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};

/// Asks on the bottom terminal line and blocks until y/n.
///
/// The prompt is drawn behind the UI's back, so the caller must repaint the
/// whole screen afterwards; see [`TerminalConfirmer::take_redraw`].
#[derive(Debug, Default)]
pub struct TerminalConfirmer {
    needs_redraw: bool,
}

impl TerminalConfirmer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once after every prompt.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    fn ask(&mut self, prompt: &str) -> io::Result<bool> {
        let (_, rows) = terminal::size()?;
        let mut out = io::stdout();
        queue!(
            out,
            MoveTo(0, rows.saturating_sub(1)),
            Clear(ClearType::CurrentLine),
            SetBackgroundColor(Color::Red),
            SetForegroundColor(Color::White),
            SetAttribute(Attribute::Bold),
            Print(format!(" {prompt} [y/N] ")),
            SetAttribute(Attribute::Reset),
            ResetColor,
        )?;
        out.flush()?;
        self.needs_redraw = true;

        loop {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                return Ok(answer(key.code));
            }
        }
    }
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&mut self, prompt: &str) -> bool {
        match self.ask(prompt) {
            Ok(yes) => yes,
            Err(e) => {
                tracing::warn!(err = %e, "confirmation prompt failed; treating as no");
                false
            }
        }
    }
}

/// Anything but an explicit yes is a no.
fn answer(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('y') | KeyCode::Char('Y'))
}
