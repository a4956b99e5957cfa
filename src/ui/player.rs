//! Terminal user interface for playback with waveform visualization.
//!
//! The waveform raster is shown with half-block characters: every terminal
//! cell carries two vertical pixels, the upper one as foreground and the
//! lower one as background colour. A footer shows the transport state and,
//! in calibration mode, a side panel lists the vocal filter parameters.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use crate::calibration::CalibrationPanel;
use crate::visualization::{Channel, RasterSurface, SnapshotStats, Surface};

/// Seek distance of the arrow keys, in seconds.
pub const SEEK_SECONDS: f64 = 5.0;

const PANEL_WIDTH: u16 = 46;
const FOOTER_HEIGHT: u16 = 1;

const BACKGROUND: Color = Color::Rgb(0, 0, 0);
const FOOTER_FG: Color = Color::Rgb(185, 207, 212);

/// User input command during playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// No key, or a key without a binding
    Continue,
    Quit,
    TogglePlay,
    NextTrack,
    /// Relative seek in seconds
    Seek(f64),
    SelectPrev,
    SelectNext,
    Nudge { steps: i32, coarse: bool },
    CopyReport,
    SaveFilters,
    ResetFilters,
}

/// Maps a key press to a command. Calibration keys only apply while the
/// calibration panel is open.
pub fn map_key(key: KeyEvent, calibrating: bool) -> PlayerCommand {
    if key.kind == KeyEventKind::Release {
        return PlayerCommand::Continue;
    }
    let coarse = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => PlayerCommand::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => PlayerCommand::Quit,
        KeyCode::Char(' ') => PlayerCommand::TogglePlay,
        KeyCode::Char('n') => PlayerCommand::NextTrack,
        KeyCode::Left => PlayerCommand::Seek(-SEEK_SECONDS),
        KeyCode::Right => PlayerCommand::Seek(SEEK_SECONDS),
        KeyCode::Up if calibrating => PlayerCommand::SelectPrev,
        KeyCode::Down if calibrating => PlayerCommand::SelectNext,
        // Shift+'=' arrives as '+' on most layouts.
        KeyCode::Char('+') | KeyCode::Char('=') if calibrating => {
            PlayerCommand::Nudge { steps: 1, coarse }
        }
        KeyCode::Char('-') | KeyCode::Char('_') if calibrating => PlayerCommand::Nudge {
            steps: -1,
            coarse: coarse || key.code == KeyCode::Char('_'),
        },
        KeyCode::Char('c') if calibrating => PlayerCommand::CopyReport,
        KeyCode::Char('s') if calibrating => PlayerCommand::SaveFilters,
        KeyCode::Char('r') if calibrating => PlayerCommand::ResetFilters,
        _ => PlayerCommand::Continue,
    }
}

/// Transport state shown in the footer.
#[derive(Debug, Clone, Default)]
pub struct PlayerStatus {
    pub title: String,
    pub position: Duration,
    pub duration: Duration,
    pub playing: bool,
    /// 1-based index into the playlist
    pub track: usize,
    pub tracks: usize,
    /// Why the waveform area is empty, if it is
    pub notice: Option<String>,
}

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLayout {
    pub waveform: Rect,
    pub panel: Option<Rect>,
    pub footer: Rect,
}

impl PlayerLayout {
    pub fn new(area: Rect, calibrating: bool) -> Self {
        let content_height = area.height.saturating_sub(FOOTER_HEIGHT);
        let footer = Rect {
            x: area.x,
            y: area.y + content_height,
            width: area.width,
            height: area.height.min(FOOTER_HEIGHT),
        };

        let panel_width = if calibrating {
            PANEL_WIDTH.min(area.width / 2)
        } else {
            0
        };
        let waveform = Rect {
            x: area.x,
            y: area.y,
            width: area.width - panel_width,
            height: content_height,
        };
        let panel = (panel_width > 0).then_some(Rect {
            x: area.x + waveform.width,
            y: area.y,
            width: panel_width,
            height: content_height,
        });

        Self {
            waveform,
            panel,
            footer,
        }
    }

    /// Raster size that fills the waveform region, two pixels per cell row.
    pub fn raster_size(&self) -> (u32, u32) {
        (self.waveform.width as u32, self.waveform.height as u32 * 2)
    }
}

/// Paints a raster surface with half-block cells.
pub struct RasterView<'a> {
    raster: &'a RasterSurface,
}

impl<'a> RasterView<'a> {
    pub fn new(raster: &'a RasterSurface) -> Self {
        Self { raster }
    }
}

impl Widget for RasterView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (area.width as u32).min(self.raster.width());
        let rows = (area.height as u32).min(self.raster.height().div_ceil(2));

        for row in 0..rows {
            for col in 0..width {
                let (tr, tg, tb) = self.raster.rgb_at(col, row * 2);
                let (br, bg, bb) = self.raster.rgb_at(col, row * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.x + col as u16, area.y + row as u16)) {
                    cell.set_char('▀')
                        .set_fg(Color::Rgb(tr, tg, tb))
                        .set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }
    }
}

fn format_time(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn footer_line(status: &PlayerStatus, calibrating: bool) -> Line<'static> {
    let indicator = if status.playing {
        Span::styled("▶ ", Style::default().fg(Color::Green))
    } else {
        Span::styled("⏸ ", Style::default().fg(Color::Yellow))
    };

    let mut spans = vec![
        indicator,
        Span::raw(format!(
            "{} / {}",
            format_time(status.position),
            format_time(status.duration)
        )),
        Span::raw(format!("  [{}/{}] ", status.track, status.tracks)),
        Span::styled(status.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ];

    if let Some(notice) = &status.notice {
        spans.push(Span::styled(
            format!("  {notice}"),
            Style::default().fg(Color::Red),
        ));
    }

    let keys = if calibrating {
        "  space play · n next · ←/→ seek · ↑/↓ select · +/- adjust · c copy · s save · r reset · q quit"
    } else {
        "  space play · n next · ←/→ seek · q quit"
    };
    spans.push(Span::styled(keys, Style::default().fg(Color::DarkGray)));

    Line::from(spans)
}

fn channel_color(channel: Channel) -> Color {
    let (r, g, b) = channel.color();
    Color::Rgb(r, g, b)
}

fn panel_lines(panel: &CalibrationPanel, levels: &[Option<SnapshotStats>; 3]) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = panel
        .rows()
        .into_iter()
        .map(|(param, value, selected)| {
            let style = if selected {
                Style::default().fg(Color::Black).bg(FOOTER_FG)
            } else {
                Style::default().fg(FOOTER_FG)
            };
            let marker = if selected { "›" } else { " " };
            Line::from(Span::styled(
                format!("{marker} {:<22}{:>12}", param.label(), value),
                style,
            ))
        })
        .collect();

    lines.push(Line::raw(""));
    for channel in Channel::ALL {
        let volume = levels[channel.index()].map(|s| s.volume).unwrap_or(0.0);
        lines.push(Line::from(Span::styled(
            format!("  {:<8} vol {:>6.1}", channel.label(), volume),
            Style::default().fg(channel_color(channel)),
        )));
    }

    if let Some(status) = panel.status() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::Green),
        )));
    }
    lines
}

/// Draws one complete player frame into `frame`.
pub fn draw_player(
    frame: &mut Frame,
    raster: Option<&RasterSurface>,
    status: &PlayerStatus,
    panel: Option<(&CalibrationPanel, &[Option<SnapshotStats>; 3])>,
) {
    let layout = PlayerLayout::new(frame.area(), panel.is_some());

    frame.render_widget(
        Block::default().style(Style::default().bg(BACKGROUND)),
        layout.waveform,
    );
    if let Some(raster) = raster {
        frame.render_widget(RasterView::new(raster), layout.waveform);
    }

    if let (Some(area), Some((panel, levels))) = (layout.panel, panel) {
        let widget = Paragraph::new(panel_lines(panel, levels)).block(
            Block::default()
                .borders(Borders::LEFT)
                .title(" Vocal filter ")
                .style(Style::default().bg(BACKGROUND)),
        );
        frame.render_widget(widget, area);
    }

    let footer = Paragraph::new(footer_line(status, panel.is_some()))
        .style(Style::default().fg(FOOTER_FG).bg(BACKGROUND));
    frame.render_widget(footer, layout.footer);
}

/// Terminal UI for the player.
pub struct PlayerTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl PlayerTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    /// - If terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    /// Current screen layout.
    pub fn layout(&self, calibrating: bool) -> anyhow::Result<PlayerLayout> {
        let size = self.terminal.size()?;
        Ok(PlayerLayout::new(
            Rect::new(0, 0, size.width, size.height),
            calibrating,
        ))
    }

    /// Renders the waveform raster, footer and optional calibration panel.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(
        &mut self,
        raster: Option<&RasterSurface>,
        status: &PlayerStatus,
        panel: Option<(&CalibrationPanel, &[Option<SnapshotStats>; 3])>,
    ) -> anyhow::Result<()> {
        self.terminal
            .draw(|frame| draw_player(frame, raster, status, panel))?;
        Ok(())
    }

    /// Waits up to `timeout` for a key press and maps it to a command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(
        &mut self,
        timeout: Duration,
        calibrating: bool,
    ) -> anyhow::Result<PlayerCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let command = map_key(key, calibrating);
                if command != PlayerCommand::Continue {
                    tracing::debug!("Key {:?} -> {:?}", key.code, command);
                }
                return Ok(command);
            }
        }
        Ok(PlayerCommand::Continue)
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

impl Drop for PlayerTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
