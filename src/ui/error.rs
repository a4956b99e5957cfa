//! Full-screen error display for failures that end a player session.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BG: Color = Color::Rgb(160, 24, 40);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

/// Lines shown on the error screen: the message, its causes, a dismiss hint.
fn error_lines(error: &anyhow::Error) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        error.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for cause in error.chain().skip(1) {
        lines.push(Line::raw(format!("caused by: {cause}")));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "press any key",
        Style::default().add_modifier(Modifier::DIM),
    )));
    lines
}

/// Renders the error centred on a red background.
pub fn draw_error(frame: &mut Frame, error: &anyhow::Error) {
    let area = frame.area();
    let style = Style::default().fg(ERROR_FG).bg(ERROR_BG);

    frame.render_widget(Paragraph::new("").style(style), area);

    let lines = error_lines(error);
    let text_width = (area.width * 80) / 100;
    let height = (lines.len() as u16).min(area.height);
    let centered = Rect {
        x: area.x + (area.width - text_width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: text_width,
        height: area.height - area.height.saturating_sub(height) / 2,
    };

    let paragraph = Paragraph::new(lines)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, centered);
}

/// Error screen owning the terminal until dismissed.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Creates a new error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(ErrorScreen { terminal })
    }

    /// Shows `error` until any key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show(&mut self, error: &anyhow::Error) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| draw_error(frame, error))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_error_screen_lists_causes() {
        let error = Err::<(), _>(anyhow::anyhow!("unsupported sample format"))
            .context("Failed to load track.wav")
            .unwrap_err();

        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|frame| draw_error(frame, &error)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Failed to load track.wav"));
        assert!(text.contains("caused by: unsupported sample format"));
        assert!(terminal.backend().buffer()[(0, 0)].bg == ERROR_BG);
    }
}
