//! Playback-synchronized frame scheduling.
//!
//! The scheduler is a small state machine driven by element events and frame
//! callbacks. It never touches the graph or the surface itself; every
//! transition returns the actions the caller must carry out, in order.

use std::time::{Duration, Instant};

/// Minimum spacing between rendered frames (1000/30 ms).
pub const FRAME_INTERVAL: Duration = Duration::from_micros(33_333);

/// Token identifying one armed frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not drawing: nothing played yet, or paused
    Idle,
    Running,
    /// Torn down; no event has any effect
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    Play,
    Pause,
    Teardown,
    /// A previously requested frame is due.
    Frame { request: FrameRequest, now: Instant },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Resume the processing context if it is suspended.
    ResumeContext,
    /// Deliver `Frame { request, .. }` on the next display tick.
    RequestFrame(FrameRequest),
    CancelFrame(FrameRequest),
    /// Sample, smooth and draw all channels.
    RunFrame,
    /// The frame came too early and is dropped.
    SkipFrame,
    ClearSurface,
    /// Stop listening to the element.
    Detach,
}

/// Result of one display tick, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Throttled; not an error
    Skipped,
    /// No frame was pending
    Idle,
}

#[derive(Debug)]
pub struct Scheduler {
    state: SchedulerState,
    armed: Option<FrameRequest>,
    next_token: u64,
    last_accepted: Option<Instant>,
    interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_interval(FRAME_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            armed: None,
            next_token: 0,
            last_accepted: None,
            interval,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The request currently awaiting delivery.
    pub fn armed(&self) -> Option<FrameRequest> {
        self.armed
    }

    pub fn transition(&mut self, event: SchedulerEvent) -> Vec<Action> {
        use SchedulerEvent as E;
        use SchedulerState as S;

        match (self.state, event) {
            (S::Detached, _) => Vec::new(),

            (_, E::Teardown) => {
                let mut actions = self.cancel();
                actions.push(Action::ClearSurface);
                actions.push(Action::Detach);
                self.state = S::Detached;
                tracing::debug!("Scheduler detached");
                actions
            }

            (S::Idle, E::Play) => {
                self.state = S::Running;
                // Each resume starts its own loop; its first frame is due.
                self.last_accepted = None;
                vec![Action::ResumeContext, Action::RequestFrame(self.arm())]
            }
            (S::Running, E::Play) => Vec::new(),

            (S::Running, E::Pause) => {
                let mut actions = self.cancel();
                actions.push(Action::ClearSurface);
                self.state = S::Idle;
                actions
            }
            (S::Idle, E::Pause) => Vec::new(),

            (S::Running, E::Frame { request, now }) if self.armed == Some(request) => {
                let next = Action::RequestFrame(self.arm());
                let due = self
                    .last_accepted
                    .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
                if due {
                    self.last_accepted = Some(now);
                    vec![next, Action::RunFrame]
                } else {
                    vec![next, Action::SkipFrame]
                }
            }
            // Stale, cancelled or unsolicited.
            (_, E::Frame { .. }) => Vec::new(),
        }
    }

    fn arm(&mut self) -> FrameRequest {
        self.next_token += 1;
        let request = FrameRequest(self.next_token);
        self.armed = Some(request);
        request
    }

    fn cancel(&mut self) -> Vec<Action> {
        self.armed.take().map(Action::CancelFrame).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_request(actions: &[Action]) -> FrameRequest {
        actions
            .iter()
            .find_map(|a| match a {
                Action::RequestFrame(r) => Some(*r),
                _ => None,
            })
            .expect("no frame requested")
    }

    #[test]
    fn test_play_resumes_and_arms() {
        let mut scheduler = Scheduler::new();
        let actions = scheduler.transition(SchedulerEvent::Play);
        assert_eq!(actions[0], Action::ResumeContext);
        assert_eq!(scheduler.armed(), Some(armed_request(&actions)));
        assert_eq!(scheduler.state(), SchedulerState::Running);
    }

    #[test]
    fn test_repeated_play_starts_one_loop() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.transition(SchedulerEvent::Play);
        assert!(scheduler.transition(SchedulerEvent::Play).is_empty());
        assert_eq!(scheduler.armed(), Some(armed_request(&first)));
    }

    #[test]
    fn test_pause_cancels_and_clears() {
        let mut scheduler = Scheduler::new();
        let request = armed_request(&scheduler.transition(SchedulerEvent::Play));

        let actions = scheduler.transition(SchedulerEvent::Pause);
        assert_eq!(
            actions,
            vec![Action::CancelFrame(request), Action::ClearSurface]
        );
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let late = scheduler.transition(SchedulerEvent::Frame {
            request,
            now: Instant::now(),
        });
        assert!(late.is_empty());
    }

    #[test]
    fn test_stale_request_is_ignored() {
        let mut scheduler = Scheduler::new();
        let old = armed_request(&scheduler.transition(SchedulerEvent::Play));
        scheduler.transition(SchedulerEvent::Pause);
        scheduler.transition(SchedulerEvent::Play);

        let now = Instant::now();
        assert!(scheduler
            .transition(SchedulerEvent::Frame { request: old, now })
            .is_empty());
    }

    #[test]
    fn test_early_frame_is_skipped() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let r1 = armed_request(&scheduler.transition(SchedulerEvent::Play));

        let a1 = scheduler.transition(SchedulerEvent::Frame { request: r1, now: start });
        assert!(a1.contains(&Action::RunFrame));

        let r2 = armed_request(&a1);
        let a2 = scheduler.transition(SchedulerEvent::Frame {
            request: r2,
            now: start + Duration::from_millis(10),
        });
        assert!(a2.contains(&Action::SkipFrame));
        assert!(!a2.contains(&Action::RunFrame));

        let r3 = armed_request(&a2);
        let a3 = scheduler.transition(SchedulerEvent::Frame {
            request: r3,
            now: start + Duration::from_millis(34),
        });
        assert!(a3.contains(&Action::RunFrame));
    }

    #[test]
    fn test_first_frame_after_resume_runs() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let r1 = armed_request(&scheduler.transition(SchedulerEvent::Play));
        let a1 = scheduler.transition(SchedulerEvent::Frame { request: r1, now: start });
        assert!(a1.contains(&Action::RunFrame));

        scheduler.transition(SchedulerEvent::Pause);
        let r2 = armed_request(&scheduler.transition(SchedulerEvent::Play));
        let a2 = scheduler.transition(SchedulerEvent::Frame {
            request: r2,
            now: start + Duration::from_millis(10),
        });
        assert!(a2.contains(&Action::RunFrame));
        assert!(!a2.contains(&Action::SkipFrame));
    }

    #[test]
    fn test_throttle_bounds_accepted_frames() {
        let window = Duration::from_secs(2);
        let bound = (window.as_secs_f64() / FRAME_INTERVAL.as_secs_f64()) as usize + 1;

        for hz in [60.0, 120.0, 240.0] {
            let mut scheduler = Scheduler::new();
            let start = Instant::now();
            let tick = Duration::from_secs_f64(1.0 / hz);
            let mut request = armed_request(&scheduler.transition(SchedulerEvent::Play));
            let mut accepted = 0;
            let mut elapsed = Duration::ZERO;

            while elapsed < window {
                let actions = scheduler.transition(SchedulerEvent::Frame {
                    request,
                    now: start + elapsed,
                });
                if actions.contains(&Action::RunFrame) {
                    accepted += 1;
                }
                request = armed_request(&actions);
                elapsed += tick;
            }

            assert!(accepted <= bound, "{hz}Hz accepted {accepted} > {bound}");
            assert!(accepted >= bound / 2, "{hz}Hz accepted only {accepted}");
        }
    }

    #[test]
    fn test_teardown_is_terminal() {
        let mut scheduler = Scheduler::new();
        let request = armed_request(&scheduler.transition(SchedulerEvent::Play));

        let actions = scheduler.transition(SchedulerEvent::Teardown);
        assert_eq!(
            actions,
            vec![
                Action::CancelFrame(request),
                Action::ClearSurface,
                Action::Detach
            ]
        );

        assert!(scheduler.transition(SchedulerEvent::Play).is_empty());
        assert!(scheduler.transition(SchedulerEvent::Teardown).is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Detached);
    }
}
