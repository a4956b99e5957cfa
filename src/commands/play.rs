//! Audio playback with live waveform visualization.
//!
//! Plays a list of WAV files through the configured output device and draws
//! the left, right and isolated vocal waveforms in the terminal. Supports an
//! external play/pause trigger via SIGUSR1.

use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::calibration::{self, CalibrationPanel};
use crate::clipboard::copy_to_clipboard;
use crate::config::{self, VizConfig};
use crate::graph::{GraphRegistry, SharedGraph};
use crate::playback::{ElementEvent, MediaElement, Playlist, Track};
use crate::ui::{ErrorScreen, PlayerCommand, PlayerStatus, PlayerTui};
use crate::visualization::{Channel, Diagnostics, RasterSurface, VisualSession, WaveformRenderer};

/// Input poll timeout; sets the display refresh rate (~60Hz).
const TICK: Duration = Duration::from_millis(16);

type Session = VisualSession<SharedGraph, RasterSurface>;

/// Handles the `play` command.
///
/// # Errors
/// - If no files are given
/// - If the configuration cannot be loaded
/// - If the output device cannot be opened
/// - If none of the files can be decoded
pub fn handle_play(files: Vec<PathBuf>, shuffle: bool, calibrate: bool) -> anyhow::Result<()> {
    tracing::info!("=== vocalviz player started ===");

    if files.is_empty() {
        return Err(anyhow!("No audio files given. Usage: vocalviz play FILE..."));
    }

    let config = match VizConfig::load_or_default() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            let err = err.context("Configuration error; check ~/.config/vocalviz/vocalviz.toml");
            show_error(&err)?;
            return Err(err);
        }
    };
    tracing::info!(
        "Configuration loaded: device={}, visualization={}",
        config.audio.device,
        config.visualization.enabled
    );

    let element = match MediaElement::open(&config.audio.device) {
        Ok(element) => element,
        Err(err) => {
            tracing::error!("Failed to open output device: {err:#}");
            let err = err.context(format!("Cannot play on device '{}'", config.audio.device));
            show_error(&err)?;
            return Err(err);
        }
    };

    let mut player = Player::new(element, Playlist::new(files, shuffle), &config, calibrate);
    if let Err(err) = player.load_current() {
        show_error(&err)?;
        return Err(err);
    }

    let mut tui = PlayerTui::new().context("Failed to initialize UI")?;
    if let Some(session) = player.visual.as_mut() {
        let (width, height) = tui.layout(calibrate)?.raster_size();
        session.surface_mut().resize(width, height);
    }

    let toggle_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&toggle_requested))
        .map_err(|e| anyhow!("Failed to register signal handler: {e}"))?;

    player.element.play();
    let result = player.run(&mut tui, &toggle_requested);

    player.shutdown();
    tui.cleanup().context("Cleanup failed")?;

    if let Err(err) = &result {
        tracing::error!("Player stopped: {err:#}");
    } else {
        tracing::info!("=== vocalviz player exited ===");
    }
    result
}

fn show_error(err: &anyhow::Error) -> anyhow::Result<()> {
    let mut screen = ErrorScreen::new()?;
    screen.show(err)?;
    screen.cleanup()
}

/// Everything one playback session owns.
struct Player {
    element: MediaElement,
    playlist: Playlist,
    registry: GraphRegistry,
    visual: Option<Session>,
    panel: Option<CalibrationPanel>,
    notice: Option<String>,
}

impl Player {
    fn new(element: MediaElement, playlist: Playlist, config: &VizConfig, calibrate: bool) -> Self {
        let mut registry = GraphRegistry::new(calibration::clamped(config.filters));
        let mut notice = None;

        // The vocal chain only feeds the waveform, so calibrating implies drawing.
        let visual = if config.visualization.enabled || calibrate {
            match registry.get_or_create(&element) {
                Ok(graph) => Some(VisualSession::new(
                    graph,
                    RasterSurface::new(1, 1),
                    WaveformRenderer::new(Diagnostics::from_env()),
                )),
                Err(err) => {
                    tracing::warn!("Visualization unavailable, playing without it: {err}");
                    notice = Some(format!("no visualization: {err}"));
                    None
                }
            }
        } else {
            None
        };

        let panel = match (&visual, calibrate) {
            (Some(session), true) => Some(CalibrationPanel::new(
                session
                    .source()
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .filters()
                    .clone(),
            )),
            _ => None,
        };

        Self {
            element,
            playlist,
            registry,
            visual,
            panel,
            notice,
        }
    }

    /// Loads the current playlist entry, skipping entries that fail to decode.
    fn load_current(&mut self) -> anyhow::Result<()> {
        for _ in 0..self.playlist.len() {
            let Some(path) = self.playlist.current() else {
                break;
            };
            match Track::load(path) {
                Ok(track) => {
                    self.element.load(Arc::new(track));
                    if let Some(session) = self.visual.as_mut() {
                        session.reset_smoothing();
                    }
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!("Skipping {}: {err:#}", path.display());
                    self.playlist.advance();
                }
            }
        }
        Err(anyhow!("None of the {} file(s) could be played", self.playlist.len()))
    }

    fn next_track(&mut self) -> anyhow::Result<()> {
        self.playlist.advance();
        self.load_current()?;
        self.element.play();
        Ok(())
    }

    fn calibrating(&self) -> bool {
        self.panel.is_some()
    }

    fn run(&mut self, tui: &mut PlayerTui, toggle_requested: &AtomicBool) -> anyhow::Result<()> {
        let mut frame_count = 0u64;

        loop {
            if toggle_requested.swap(false, Ordering::Relaxed) {
                tracing::info!("Received SIGUSR1: toggling playback");
                self.element.toggle();
            }

            let command = tui.handle_input(TICK, self.calibrating())?;
            if command == PlayerCommand::Quit {
                tracing::debug!("Quit requested");
                return Ok(());
            }
            self.apply(command)?;
            self.pump_events()?;

            let layout = tui.layout(self.calibrating())?;
            if let Some(session) = self.visual.as_mut() {
                let (width, height) = layout.raster_size();
                session.surface_mut().resize(width, height);
                session.tick(Instant::now());
            }

            frame_count += 1;
            if frame_count % 600 == 0 {
                tracing::debug!(
                    "Playing {:?}, {} frames drawn",
                    self.element.position(),
                    self.visual.as_ref().map_or(0, |s| s.frames_rendered())
                );
            }

            self.draw(tui)?;
        }
    }

    fn apply(&mut self, command: PlayerCommand) -> anyhow::Result<()> {
        match command {
            PlayerCommand::Continue | PlayerCommand::Quit => {}
            PlayerCommand::TogglePlay => self.element.toggle(),
            PlayerCommand::NextTrack => self.next_track()?,
            PlayerCommand::Seek(seconds) => self.element.seek_by(seconds),
            PlayerCommand::SelectPrev => self.with_panel(CalibrationPanel::select_prev),
            PlayerCommand::SelectNext => self.with_panel(CalibrationPanel::select_next),
            PlayerCommand::Nudge { steps, coarse } => {
                self.with_panel(|panel| panel.nudge(steps, coarse))
            }
            PlayerCommand::ResetFilters => self.with_panel(CalibrationPanel::reset),
            PlayerCommand::CopyReport => self.with_panel(|panel| {
                let message = match copy_to_clipboard(&panel.report()) {
                    Ok(Some(tool)) => format!("Copied via {tool}"),
                    Ok(None) => "No clipboard tool found".to_string(),
                    Err(err) => format!("Copy failed: {err}"),
                };
                panel.set_status(message);
            }),
            PlayerCommand::SaveFilters => self.with_panel(|panel| {
                let message = match config::save_filters(panel.params()) {
                    Ok(()) => "Saved to config".to_string(),
                    Err(err) => {
                        tracing::error!("Failed to save filter parameters: {err:#}");
                        format!("Save failed: {err}")
                    }
                };
                panel.set_status(message);
            }),
        }
        Ok(())
    }

    fn with_panel(&mut self, f: impl FnOnce(&mut CalibrationPanel)) {
        if let Some(panel) = self.panel.as_mut() {
            f(panel);
        }
    }

    fn pump_events(&mut self) -> anyhow::Result<()> {
        for event in self.element.poll_events() {
            tracing::debug!("Element event: {:?}", event);
            if let Some(session) = self.visual.as_mut() {
                session.handle_event(&event);
            }
            if event == ElementEvent::Ended {
                self.next_track()?;
            }
        }
        Ok(())
    }

    fn status(&self) -> PlayerStatus {
        let track = self.element.current_track();
        PlayerStatus {
            title: track.as_ref().map(|t| t.title.clone()).unwrap_or_default(),
            position: self.element.position(),
            duration: track.map(|t| t.duration()).unwrap_or_default(),
            playing: self.element.is_playing(),
            track: self.playlist.position(),
            tracks: self.playlist.len(),
            notice: self.notice.clone(),
        }
    }

    fn draw(&self, tui: &mut PlayerTui) -> anyhow::Result<()> {
        let status = self.status();
        let raster = self.visual.as_ref().map(|s| s.surface());
        let levels = match &self.visual {
            Some(session) => Channel::ALL.map(|c| session.last_stats(c)),
            None => [None; Channel::COUNT],
        };
        let panel = self.panel.as_ref().map(|panel| (panel, &levels));
        tui.draw(raster, &status, panel)
    }

    /// Tears the visualization down before the element goes away.
    fn shutdown(&mut self) {
        if let Some(mut session) = self.visual.take() {
            session.teardown();
        }
        self.registry.release(self.element.id());
        self.element.pause();
    }
}
