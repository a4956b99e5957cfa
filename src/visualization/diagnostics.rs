//! Opt-in waveform diagnostics.
//!
//! With `VOCALVIZ_WAVEFORM_DEBUG` set, a random ~3% of rendered bands log
//! their statistics at debug level. Nothing here affects what is drawn.

use rand::Rng;

use super::renderer::RenderFrame;

/// Environment variable that enables diagnostics.
pub const ENV_FLAG: &str = "VOCALVIZ_WAVEFORM_DEBUG";

/// Fraction of bands that get logged.
pub const SAMPLE_PROBABILITY: f64 = 0.03;

/// Average this close to the centre reads as silence.
const CENTRED_SILENCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn from_env() -> Self {
        let enabled = flag_enabled(std::env::var(ENV_FLAG).ok().as_deref());
        if enabled {
            tracing::info!("Waveform diagnostics enabled");
        }
        Self { enabled }
    }

    pub fn enabled(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs `frame` with probability [`SAMPLE_PROBABILITY`].
    pub fn observe(&self, frame_index: u64, frame: &RenderFrame) {
        if !self.enabled || !rand::rng().random_bool(SAMPLE_PROBABILITY) {
            return;
        }
        let stats = &frame.stats;
        tracing::debug!(
            frame = frame_index,
            channel = frame.channel.label(),
            min = stats.min,
            max = stats.max,
            avg = stats.avg,
            range = stats.range,
            volume = stats.volume,
            glow = frame.glow,
            near_flat = frame.near_silent,
            centred_silence = (stats.avg - 128.0).abs() < CENTRED_SILENCE,
            "Waveform band"
        );
    }
}

fn flag_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ChannelSnapshot;
    use crate::visualization::channel::Channel;
    use crate::visualization::renderer::{compute_frame, WaveformRenderer};
    use crate::visualization::smoother::SmoothedSnapshot;
    use crate::visualization::surface::RecordingSurface;

    #[test]
    fn test_flag_values() {
        assert!(!flag_enabled(None));
        assert!(!flag_enabled(Some("")));
        assert!(!flag_enabled(Some("0")));
        assert!(!flag_enabled(Some("FALSE")));
        assert!(flag_enabled(Some("1")));
        assert!(flag_enabled(Some("yes")));
    }

    #[test]
    fn test_observe_leaves_frame_untouched() {
        let flat = SmoothedSnapshot::from(&ChannelSnapshot::filled(129));
        let expected = compute_frame(Channel::Vocal, &flat, 120, 40);
        assert!(expected.near_silent);

        for diagnostics in [Diagnostics::enabled(true), Diagnostics::enabled(false)] {
            let renderer = WaveformRenderer::new(diagnostics);
            let mut surface = RecordingSurface::new(120, 40);
            // Enough frames that the sampled log line fires at least once.
            for frame_index in 0..500 {
                let frame = renderer.render(&mut surface, frame_index, &flat, Channel::Vocal);
                assert_eq!(frame, expected);
                diagnostics.observe(frame_index, &frame);
                assert_eq!(frame, expected);
            }
            assert_eq!(surface.ops().len(), 500);
        }
    }
}
