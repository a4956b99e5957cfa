//! Waveform band rendering.
//!
//! A smoothed snapshot becomes one filled band: the samples are averaged in
//! overlapping windows, normalized against the snapshot's own range, squared
//! for contrast and traced as a chain of quadratic curves around the vertical
//! centre. Loudness drives the band's opacity and glow.

use super::channel::Channel;
use super::diagnostics::Diagnostics;
use super::smoother::SmoothedSnapshot;
use super::surface::{BandPath, BandStyle, Surface};
use crate::graph::CENTER;

/// Distance between consecutive averaging windows, in samples.
pub const STEP: usize = 16;

/// Width of each averaging window, in samples.
pub const WINDOW: usize = 256;

/// Below this peak-to-peak range a snapshot is drawn flat.
pub const NEAR_SILENT_RANGE: f32 = 5.0;

/// Band amplitude as a fraction of surface height, before the channel multiplier.
pub const AMPLITUDE_RATIO: f32 = 0.15;

pub const MIN_ALPHA: f32 = 0.05;
pub const MAX_ALPHA: f32 = 0.45;

/// Glow radius at full glow, in pixels.
pub const MAX_GLOW_RADIUS: f32 = 6.0;

/// Summary statistics of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotStats {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
    /// `max - min`, at least 1
    pub range: f32,
    /// Mean of `|x - 128|` raised to the channel's volume exponent
    pub volume: f32,
}

impl SnapshotStats {
    pub fn measure(channel: Channel, samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self {
                min: CENTER as f32,
                max: CENTER as f32,
                avg: CENTER as f32,
                range: 1.0,
                volume: 0.0,
            };
        }

        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0;
        let mut volume = 0.0;
        let exponent = channel.volume_exponent();
        let center = CENTER as f32;

        for &s in samples {
            min = min.min(s);
            max = max.max(s);
            sum += s;
            volume += (s - center).abs().powf(exponent);
        }

        let n = samples.len() as f32;
        Self {
            min,
            max,
            avg: sum / n,
            range: (max - min).max(1.0),
            volume: volume / n,
        }
    }
}

/// Everything needed to draw one band, computed without touching a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub channel: Channel,
    pub stats: SnapshotStats,
    pub near_silent: bool,
    /// Loudness in `[0, 1]`
    pub glow: f32,
    pub baseline: f32,
    pub path: BandPath,
    pub style: BandStyle,
}

/// Lays out the band for `channel` on a `width` x `height` surface.
pub fn compute_frame(
    channel: Channel,
    smoothed: &SmoothedSnapshot,
    width: u32,
    height: u32,
) -> RenderFrame {
    let samples = smoothed.as_slice();
    let stats = SnapshotStats::measure(channel, samples);
    let near_silent = stats.range < NEAR_SILENT_RANGE;

    let (width, height) = (width as f32, height as f32);
    let baseline = height / 2.0;
    let amplitude = height * AMPLITUDE_RATIO * channel.amplitude_multiplier();

    let points = band_points(samples, &stats, near_silent, width, baseline, amplitude);
    let path = trace_band(&points, width, baseline);

    let glow = (stats.volume / channel.glow_divisor()).clamp(0.0, 1.0);
    let style = BandStyle {
        color: channel.color(),
        alpha: (MIN_ALPHA + (MAX_ALPHA - MIN_ALPHA) * glow).min(MAX_ALPHA),
        blur: glow * MAX_GLOW_RADIUS,
    };

    RenderFrame {
        channel,
        stats,
        near_silent,
        glow,
        baseline,
        path,
        style,
    }
}

fn band_points(
    samples: &[f32],
    stats: &SnapshotStats,
    near_silent: bool,
    width: f32,
    baseline: f32,
    amplitude: f32,
) -> Vec<(f32, f32)> {
    if samples.len() < WINDOW {
        return Vec::new();
    }
    let span = (samples.len() - WINDOW) as f32;
    let dx = if span > 0.0 {
        width / span * STEP as f32
    } else {
        width
    };

    (0..=samples.len() - WINDOW)
        .step_by(STEP)
        .enumerate()
        .map(|(k, start)| {
            let x = k as f32 * dx;
            if near_silent {
                return (x, baseline);
            }
            let block = samples[start..start + WINDOW].iter().sum::<f32>() / WINDOW as f32;
            let v = ((block - stats.min) / stats.range) * 2.0 - 1.0;
            let amplified = v.signum() * v.abs().powi(2);
            (x, baseline - amplified * amplitude)
        })
        .collect()
}

/// Closed outline: curves through the midpoints of consecutive points, then
/// back along the baseline.
fn trace_band(points: &[(f32, f32)], width: f32, baseline: f32) -> BandPath {
    let mut path = BandPath::new();
    path.move_to(0.0, baseline);

    let mut prev = match points.first() {
        Some(&(_, y)) => (0.0, y),
        None => (0.0, baseline),
    };
    for &(x, y) in points.iter().skip(1) {
        let mid = ((prev.0 + x) / 2.0, (prev.1 + y) / 2.0);
        path.quad_to(prev.0, prev.1, mid.0, mid.1);
        prev = (x, y);
    }

    path.line_to(width, baseline);
    path.line_to(0.0, baseline);
    path.close();
    path
}

/// Draws bands onto a surface and feeds the diagnostics hook.
#[derive(Debug, Default)]
pub struct WaveformRenderer {
    diagnostics: Diagnostics,
}

impl WaveformRenderer {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        frame_index: u64,
        smoothed: &SmoothedSnapshot,
        channel: Channel,
    ) -> RenderFrame {
        let frame = compute_frame(channel, smoothed, surface.width(), surface.height());
        self.diagnostics.observe(frame_index, &frame);
        surface.fill_band(&frame.path, &frame.style);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ChannelSnapshot, SNAPSHOT_LEN};
    use crate::visualization::smoother::SignalSmoother;
    use crate::visualization::surface::{PathCommand, RecordingSurface, SurfaceOp};

    fn smoothed(raw: ChannelSnapshot) -> SmoothedSnapshot {
        SmoothedSnapshot::from(&raw)
    }

    fn wave(depth: f32) -> SmoothedSnapshot {
        smoothed(ChannelSnapshot::from_fn(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / 1024.0;
            (128.0 + depth * phase.sin()).round() as u8
        }))
    }

    fn ys(path: &BandPath) -> Vec<f32> {
        path.commands()
            .iter()
            .flat_map(|c| match *c {
                PathCommand::MoveTo(_, y) | PathCommand::LineTo(_, y) => vec![y],
                PathCommand::QuadTo { cy, y, .. } => vec![cy, y],
                PathCommand::Close => vec![],
            })
            .collect()
    }

    #[test]
    fn test_centred_silence_is_flat_band() {
        let frame = compute_frame(Channel::Left, &smoothed(ChannelSnapshot::silent()), 200, 100);
        assert!(frame.near_silent);
        assert_eq!(frame.stats.range, 1.0);
        assert_eq!(frame.glow, 0.0);
        assert!((frame.style.alpha - MIN_ALPHA).abs() < 1e-6);
        assert!(ys(&frame.path).iter().all(|&y| y == 50.0));
    }

    #[test]
    fn test_small_range_is_flat_band() {
        let frame = compute_frame(Channel::Vocal, &wave(2.0), 200, 100);
        assert!(frame.near_silent);
        assert!(ys(&frame.path).iter().all(|&y| y == frame.baseline));
    }

    #[test]
    fn test_point_count_and_extent() {
        let frame = compute_frame(Channel::Right, &wave(60.0), 300, 80);
        let quads = frame
            .path
            .commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::QuadTo { .. }))
            .count();
        assert_eq!(quads, (SNAPSHOT_LEN - WINDOW) / STEP);

        let last_control_x = frame.path.commands().iter().rev().find_map(|c| match *c {
            PathCommand::QuadTo { x, .. } => Some(x),
            _ => None,
        });
        assert!(last_control_x.is_some_and(|x| x <= 300.0));
        assert_eq!(frame.path.commands().last(), Some(&PathCommand::Close));
    }

    #[test]
    fn test_band_stays_within_amplitude() {
        let frame = compute_frame(Channel::Left, &wave(100.0), 200, 100);
        let limit = 100.0 * AMPLITUDE_RATIO;
        assert!(!frame.near_silent);
        assert!(ys(&frame.path)
            .iter()
            .all(|&y| (y - frame.baseline).abs() <= limit + 1e-3));
        assert!(ys(&frame.path)
            .iter()
            .any(|&y| (y - frame.baseline).abs() > limit * 0.5));
    }

    #[test]
    fn test_vocal_band_is_taller() {
        let left = compute_frame(Channel::Left, &wave(100.0), 200, 100);
        let vocal = compute_frame(Channel::Vocal, &wave(100.0), 200, 100);
        let peak = |f: &RenderFrame| {
            ys(&f.path)
                .iter()
                .map(|y| (y - f.baseline).abs())
                .fold(0.0, f32::max)
        };
        assert!((peak(&vocal) - 3.0 * peak(&left)).abs() < 1e-2);
    }

    #[test]
    fn test_loud_left_reaches_full_glow() {
        let mut smoother = SignalSmoother::new();
        let input = smoother.smooth(Channel::Left, &ChannelSnapshot::filled(200));
        let frame = compute_frame(Channel::Left, &input, 200, 100);
        assert_eq!(frame.glow, 1.0);
        assert!((frame.style.alpha - MAX_ALPHA).abs() < 1e-6);
        assert!((frame.style.blur - MAX_GLOW_RADIUS).abs() < 1e-6);
    }

    #[test]
    fn test_vocal_glow_uses_its_own_divisor() {
        let mut smoother = SignalSmoother::new();
        let raw = ChannelSnapshot::filled(131);

        let vocal_input = smoother.smooth(Channel::Vocal, &raw);
        let vocal = compute_frame(Channel::Vocal, &vocal_input, 200, 100);
        assert_eq!(vocal.glow, 1.0);

        let left_input = smoother.smooth(Channel::Left, &raw);
        let left = compute_frame(Channel::Left, &left_input, 200, 100);
        assert!((left.glow - 3.0 / 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_render_fills_once_per_call() {
        let renderer = WaveformRenderer::default();
        let mut surface = RecordingSurface::new(120, 40);
        let frame = renderer.render(&mut surface, 7, &wave(50.0), Channel::Right);
        assert_eq!(
            surface.ops(),
            &[SurfaceOp::Fill {
                path: frame.path.clone(),
                style: frame.style
            }]
        );
        assert_eq!(frame.style.color, Channel::Right.color());
    }

    #[test]
    fn test_zero_sized_surface_does_not_panic() {
        let frame = compute_frame(Channel::Vocal, &wave(80.0), 0, 0);
        assert_eq!(frame.baseline, 0.0);
    }
}
