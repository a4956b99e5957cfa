//! A visualization session: one element's graph drawn onto one surface.
//!
//! The session translates element events into scheduler events and carries
//! out the resulting actions. It is driven from the terminal loop: call
//! [`VisualSession::handle_event`] for every element event and
//! [`VisualSession::tick`] once per display refresh.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use super::channel::Channel;
use super::renderer::{SnapshotStats, WaveformRenderer};
use super::scheduler::{
    Action, FrameOutcome, FrameRequest, Scheduler, SchedulerEvent, SchedulerState,
};
use super::smoother::SignalSmoother;
use super::surface::Surface;
use crate::graph::{AudioGraph, ChannelSnapshot, ContextState, SharedGraph};
use crate::playback::ElementEvent;

/// Where a session gets its raw snapshots from.
pub trait SnapshotSource {
    /// Resumes processing if it is suspended.
    fn resume(&mut self);
    fn sample(&mut self, channel: Channel) -> ChannelSnapshot;
    /// Called once when the session is torn down.
    fn detach(&mut self) {}
}

fn lock_graph(graph: &Mutex<AudioGraph>) -> MutexGuard<'_, AudioGraph> {
    graph.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SnapshotSource for SharedGraph {
    fn resume(&mut self) {
        let graph = lock_graph(self);
        if graph.context().state() == ContextState::Suspended {
            graph.context().resume();
        }
    }

    fn sample(&mut self, channel: Channel) -> ChannelSnapshot {
        lock_graph(self).sample(channel)
    }

    fn detach(&mut self) {
        lock_graph(self).context().suspend();
    }
}

pub struct VisualSession<G, S> {
    scheduler: Scheduler,
    source: G,
    surface: S,
    smoother: SignalSmoother,
    renderer: WaveformRenderer,
    pending: Option<FrameRequest>,
    frame_index: u64,
    last_stats: [Option<SnapshotStats>; Channel::COUNT],
}

impl<G: SnapshotSource, S: Surface> VisualSession<G, S> {
    pub fn new(source: G, surface: S, renderer: WaveformRenderer) -> Self {
        Self::with_scheduler(source, surface, renderer, Scheduler::new())
    }

    pub fn with_scheduler(
        source: G,
        surface: S,
        renderer: WaveformRenderer,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            scheduler,
            source,
            surface,
            smoother: SignalSmoother::new(),
            renderer,
            pending: None,
            frame_index: 0,
            last_stats: [None; Channel::COUNT],
        }
    }

    /// Feeds one element event through the scheduler.
    pub fn handle_event(&mut self, event: &ElementEvent) {
        let event = match event {
            ElementEvent::Play => SchedulerEvent::Play,
            ElementEvent::Pause | ElementEvent::Ended => SchedulerEvent::Pause,
        };
        self.apply(event);
    }

    /// Delivers the pending frame request, if any.
    pub fn tick(&mut self, now: Instant) -> FrameOutcome {
        let Some(request) = self.pending.take() else {
            return FrameOutcome::Idle;
        };
        self.apply(SchedulerEvent::Frame { request, now })
    }

    /// Stops the session for good and clears the surface.
    pub fn teardown(&mut self) {
        self.apply(SchedulerEvent::Teardown);
    }

    /// Forgets smoothing history, e.g. when the track changes.
    pub fn reset_smoothing(&mut self) {
        self.smoother.reset();
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    /// Statistics of the channel's band in the most recent frame.
    pub fn last_stats(&self, channel: Channel) -> Option<SnapshotStats> {
        self.last_stats[channel.index()]
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn source(&self) -> &G {
        &self.source
    }

    fn apply(&mut self, event: SchedulerEvent) -> FrameOutcome {
        let mut outcome = FrameOutcome::Idle;

        for action in self.scheduler.transition(event) {
            match action {
                Action::ResumeContext => self.source.resume(),
                Action::RequestFrame(request) => self.pending = Some(request),
                Action::CancelFrame(_) => self.pending = None,
                Action::RunFrame => {
                    self.run_frame();
                    outcome = FrameOutcome::Rendered;
                }
                Action::SkipFrame => outcome = FrameOutcome::Skipped,
                Action::ClearSurface => self.surface.clear(),
                Action::Detach => {
                    self.pending = None;
                    self.source.detach();
                }
            }
        }

        outcome
    }

    fn run_frame(&mut self) {
        self.surface.clear();
        for channel in Channel::ALL {
            let raw = self.source.sample(channel);
            let smoothed = self.smoother.smooth(channel, &raw);
            let frame = self
                .renderer
                .render(&mut self.surface, self.frame_index, &smoothed, channel);
            self.last_stats[channel.index()] = Some(frame.stats);
        }
        self.frame_index += 1;
    }
}
