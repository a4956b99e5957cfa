//! Decoded audio tracks.
//!
//! Tracks are decoded up front into interleaved stereo `f32` frames. Mono
//! files are duplicated to both channels; files with more than two channels
//! are rejected.

use anyhow::{anyhow, bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A decoded, in-memory stereo track.
#[derive(Debug, Clone)]
pub struct Track {
    /// Display title (file stem)
    pub title: String,
    /// Where the track was loaded from, if anywhere
    pub path: Option<PathBuf>,
    sample_rate: u32,
    frames: Vec<[f32; 2]>,
}

impl Track {
    /// Builds a track from already-decoded frames.
    pub fn from_frames(title: impl Into<String>, sample_rate: u32, frames: Vec<[f32; 2]>) -> Self {
        Self {
            title: title.into(),
            path: None,
            sample_rate,
            frames,
        }
    }

    /// Decodes a WAV file.
    ///
    /// # Errors
    /// - If the file cannot be opened or is not a valid WAV file
    /// - If the file has more than two channels
    /// - If the sample format is not supported
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = WavReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let spec = reader.spec();

        tracing::debug!(
            "Decoding {}: {}Hz, {} channels, {} bits {:?}",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        );

        let channels = spec.channels as usize;
        if !(1..=2).contains(&channels) {
            bail!(
                "{} has {} channels; only mono and stereo files are supported",
                path.display(),
                channels
            );
        }

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| anyhow!("Failed to decode {}: {e}", path.display()))?,
            SampleFormat::Int => {
                if !(8..=32).contains(&spec.bits_per_sample) {
                    bail!(
                        "{} uses unsupported {}-bit samples",
                        path.display(),
                        spec.bits_per_sample
                    );
                }
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| anyhow!("Failed to decode {}: {e}", path.display()))?
            }
        };

        let frames: Vec<[f32; 2]> = if channels == 1 {
            samples.iter().map(|&s| [s, s]).collect()
        } else {
            samples.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
        };

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let track = Self {
            title,
            path: Some(path.to_path_buf()),
            sample_rate: spec.sample_rate,
            frames,
        };

        tracing::info!(
            "Loaded '{}' ({:.1}s at {}Hz)",
            track.title,
            track.duration().as_secs_f32(),
            track.sample_rate
        );

        Ok(track)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames.len() as f64 / self.sample_rate as f64)
    }

    /// Linearly interpolated frame at a fractional position.
    ///
    /// Positions past the end return silence.
    #[inline]
    pub fn frame_at(&self, position: f64) -> [f32; 2] {
        let index = position.floor() as usize;
        let Some(&a) = self.frames.get(index) else {
            return [0.0, 0.0];
        };
        let b = self.frames.get(index + 1).copied().unwrap_or(a);
        let t = (position - index as f64) as f32;
        [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
    }
}
