//! Waveform visualization: smoothing, rendering and frame scheduling.

pub mod channel;
pub mod diagnostics;
pub mod renderer;
pub mod scheduler;
pub mod session;
pub mod smoother;
pub mod surface;

pub use channel::Channel;
pub use diagnostics::Diagnostics;
pub use renderer::{compute_frame, RenderFrame, SnapshotStats, WaveformRenderer};
pub use scheduler::{FrameOutcome, Scheduler, SchedulerState};
pub use session::{SnapshotSource, VisualSession};
pub use smoother::{SignalSmoother, SmoothedSnapshot};
pub use surface::{RasterSurface, Surface};
