//! The media element: one output stream that plays whatever track is loaded.
//!
//! The element owns the cpal output stream for its whole lifetime; tracks are
//! swapped in and out of it. Every output callback renders the next block of
//! the loaded track straight into the device buffer first, then hands the same
//! stereo block to the attached tap (if any). A tap can therefore never
//! silence playback: a panic inside it only disables the tap.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::device::{find_output_device, suppress_alsa_warnings};
use super::track::Track;
use crate::error::VizError;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a media element, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Format of the element's output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Lifecycle events emitted by the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEvent {
    Play,
    Pause,
    /// The loaded track reached its end (always preceded by `Pause`)
    Ended,
}

/// Consumer of the element's rendered stereo blocks.
pub trait FrameTap: Send {
    /// Receives one block of interleaved stereo frames at the output rate.
    fn process(&mut self, frames: &[f32]);
}

/// Playback state shared between the element and its output callback.
struct Transport {
    track: Option<Arc<Track>>,
    /// Position in track frames
    position: f64,
    /// Track frames advanced per output frame
    step: f64,
    output_rate: u32,
    playing: bool,
    tap: Option<Box<dyn FrameTap>>,
    tap_bound: bool,
    scratch: Vec<f32>,
    events: Sender<ElementEvent>,
}

impl Transport {
    fn new(output_rate: u32, events: Sender<ElementEvent>) -> Self {
        Self {
            track: None,
            position: 0.0,
            step: 1.0,
            output_rate,
            playing: false,
            tap: None,
            tap_bound: false,
            scratch: Vec::new(),
            events,
        }
    }

    fn emit(&self, event: ElementEvent) {
        // The receiver lives as long as the element; a closed channel only
        // means the element is being dropped.
        let _ = self.events.send(event);
    }

    /// Renders `out.len() / channels` frames into `out`.
    fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frame_count = out.len() / channels;
        self.scratch.clear();

        for frame in out.chunks_exact_mut(channels).take(frame_count) {
            let [left, right] = self.next_frame();
            self.scratch.push(left);
            self.scratch.push(right);

            match frame {
                [mono] => *mono = (left + right) * 0.5,
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }

        self.feed_tap();
    }

    fn next_frame(&mut self) -> [f32; 2] {
        if !self.playing {
            return [0.0, 0.0];
        }
        let Some(track) = self.track.as_ref() else {
            return [0.0, 0.0];
        };

        if self.position >= track.len_frames() as f64 {
            self.playing = false;
            self.emit(ElementEvent::Pause);
            self.emit(ElementEvent::Ended);
            return [0.0, 0.0];
        }

        let frame = track.frame_at(self.position);
        self.position += self.step;
        frame
    }

    fn feed_tap(&mut self) {
        let Some(tap) = self.tap.as_mut() else {
            return;
        };
        let frames = &self.scratch;

        if panic::catch_unwind(AssertUnwindSafe(|| tap.process(frames))).is_err() {
            tracing::error!("Audio tap panicked; visualization disabled, playback continues");
            self.tap = None;
        }
    }
}

/// A playable audio element bound to one output device.
pub struct MediaElement {
    id: SourceId,
    format: Option<OutputFormat>,
    transport: Arc<Mutex<Transport>>,
    events: Receiver<ElementEvent>,
    stream: Option<cpal::Stream>,
}

impl MediaElement {
    /// Opens an element on the given output device.
    ///
    /// # Errors
    /// - If the device cannot be found or configured
    /// - If the output stream cannot be built or started
    pub fn open(device_name: &str) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            find_output_device(&host, device_name)
        })?;

        let device_label = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Output device: {}", device_label);

        let supported = device.default_output_config()?;
        let format = OutputFormat {
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
        };
        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            format.sample_rate,
            format.channels,
            supported.sample_format()
        );

        let mut element = Self::detached(Some(format));
        let config: cpal::StreamConfig = supported.config();
        let transport = Arc::clone(&element.transport);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, transport)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, transport)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, transport)?,
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, transport)?,
            other => return Err(anyhow!("Unsupported output sample format: {other:?}")),
        };
        stream.play()?;
        element.stream = Some(stream);

        tracing::debug!("Output stream started for element {}", element.id);
        Ok(element)
    }

    /// Creates an element without an output stream.
    ///
    /// Blocks are produced only through [`MediaElement::render`]. `format` is
    /// the format the element pretends to render at; `None` models an element
    /// whose host has no audio output at all.
    pub fn detached(format: Option<OutputFormat>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let output_rate = format.map(|f| f.sample_rate).unwrap_or(48_000);

        Self {
            id: SourceId::next(),
            format,
            transport: Arc::new(Mutex::new(Transport::new(output_rate, sender))),
            events: receiver,
            stream: None,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn has_output_stream(&self) -> bool {
        self.stream.is_some()
    }

    fn transport(&self) -> MutexGuard<'_, Transport> {
        lock_transport(&self.transport)
    }

    /// Loads a track, rewinding to the start. Playback state is kept.
    pub fn load(&self, track: Arc<Track>) {
        let mut transport = self.transport();
        transport.step = track.sample_rate() as f64 / transport.output_rate as f64;
        transport.position = 0.0;
        tracing::info!("Now playing: {}", track.title);
        transport.track = Some(track);
    }

    pub fn current_track(&self) -> Option<Arc<Track>> {
        self.transport().track.clone()
    }

    pub fn play(&self) {
        let mut transport = self.transport();
        if transport.playing || transport.track.is_none() {
            return;
        }
        transport.playing = true;
        transport.emit(ElementEvent::Play);
    }

    pub fn pause(&self) {
        let mut transport = self.transport();
        if !transport.playing {
            return;
        }
        transport.playing = false;
        transport.emit(ElementEvent::Pause);
    }

    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.transport().playing
    }

    /// Moves the playhead by `seconds` (negative rewinds), clamped to the track.
    pub fn seek_by(&self, seconds: f64) {
        let mut transport = self.transport();
        let Some(track) = transport.track.as_ref() else {
            return;
        };
        let limit = track.len_frames().saturating_sub(1) as f64;
        let delta = seconds * track.sample_rate() as f64;
        transport.position = (transport.position + delta).clamp(0.0, limit.max(0.0));
    }

    /// Elapsed playback time of the loaded track.
    pub fn position(&self) -> Duration {
        let transport = self.transport();
        match transport.track.as_ref() {
            Some(track) if track.sample_rate() > 0 => Duration::from_secs_f64(
                transport.position.min(track.len_frames() as f64) / track.sample_rate() as f64,
            ),
            _ => Duration::ZERO,
        }
    }

    /// Attaches the element's single tap.
    ///
    /// # Errors
    /// - `GraphAlreadyBound` if a tap was attached before
    pub fn attach_tap(&self, tap: Box<dyn FrameTap>) -> Result<(), VizError> {
        let mut transport = self.transport();
        if transport.tap_bound {
            return Err(VizError::GraphAlreadyBound(self.id));
        }
        transport.tap = Some(tap);
        transport.tap_bound = true;
        tracing::debug!("Tap attached to element {}", self.id);
        Ok(())
    }

    /// Renders one block by hand (for elements without an output stream).
    pub fn render(&self, out: &mut [f32], channels: usize) {
        self.transport().render(out, channels);
    }

    /// Drains pending lifecycle events.
    pub fn poll_events(&self) -> Vec<ElementEvent> {
        self.events.try_iter().collect()
    }
}

impl Drop for MediaElement {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::debug!("Failed to pause output stream on drop: {}", e);
            }
        }
        tracing::debug!("Media element {} destroyed", self.id);
    }
}

fn lock_transport(transport: &Mutex<Transport>) -> MutexGuard<'_, Transport> {
    transport.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    transport: Arc<Mutex<Transport>>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut mix: Vec<f32> = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            mix.resize(data.len(), 0.0);
            lock_transport(&transport).render(&mut mix, channels);
            for (out, &sample) in data.iter_mut().zip(mix.iter()) {
                *out = T::from_sample(sample);
            }
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element() -> MediaElement {
        MediaElement::detached(Some(OutputFormat {
            sample_rate: 100,
            channels: 2,
        }))
    }

    fn ramp_track(frames: usize, rate: u32) -> Arc<Track> {
        let data = (0..frames).map(|i| [i as f32 / 100.0, -(i as f32) / 100.0]).collect();
        Arc::new(Track::from_frames("ramp", rate, data))
    }

    struct Recorder(Arc<Mutex<Vec<f32>>>);

    impl FrameTap for Recorder {
        fn process(&mut self, frames: &[f32]) {
            self.0.lock().unwrap().extend_from_slice(frames);
        }
    }

    struct Exploding;

    impl FrameTap for Exploding {
        fn process(&mut self, _frames: &[f32]) {
            panic!("tap failure");
        }
    }

    #[test]
    fn test_paused_element_renders_silence() {
        let el = element();
        el.load(ramp_track(10, 100));
        let mut out = vec![1.0; 8];
        el.render(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_play_renders_track_and_emits_events() {
        let el = element();
        el.load(ramp_track(3, 100));
        el.play();
        el.play();

        let mut out = vec![0.0; 8];
        el.render(&mut out, 2);

        assert_eq!(&out[..6], &[0.0, -0.0, 0.01, -0.01, 0.02, -0.02]);
        assert_eq!(&out[6..], &[0.0, 0.0]);
        assert_eq!(
            el.poll_events(),
            vec![ElementEvent::Play, ElementEvent::Pause, ElementEvent::Ended]
        );
        assert!(!el.is_playing());
    }

    #[test]
    fn test_rate_conversion_steps_through_track() {
        let el = element();
        el.load(ramp_track(10, 200));
        el.play();
        let mut out = vec![0.0; 4];
        el.render(&mut out, 2);
        assert!((out[2] - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_mono_output_downmixes() {
        let el = element();
        el.load(Arc::new(Track::from_frames("m", 100, vec![[0.4, 0.2]])));
        el.play();
        let mut out = vec![0.0; 1];
        el.render(&mut out, 1);
        assert!((out[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_tap_receives_stereo_block() {
        let el = element();
        let seen = Arc::new(Mutex::new(Vec::new()));
        el.attach_tap(Box::new(Recorder(Arc::clone(&seen)))).unwrap();
        el.load(ramp_track(2, 100));
        el.play();

        let mut out = vec![0.0; 4];
        el.render(&mut out, 2);
        assert_eq!(*seen.lock().unwrap(), out);
    }

    #[test]
    fn test_second_tap_is_rejected() {
        let el = element();
        el.attach_tap(Box::new(Exploding)).unwrap();
        let err = el.attach_tap(Box::new(Exploding)).unwrap_err();
        assert_eq!(err, VizError::GraphAlreadyBound(el.id()));
    }

    #[test]
    fn test_panicking_tap_does_not_silence_audio() {
        let el = element();
        el.attach_tap(Box::new(Exploding)).unwrap();
        el.load(ramp_track(10, 100));
        el.play();

        let mut out = vec![0.0; 4];
        el.render(&mut out, 2);
        assert_eq!(out[2], 0.01);

        // The tap is gone but the element keeps rendering.
        el.render(&mut out, 2);
        assert_eq!(out[0], 0.02);
        assert!(matches!(
            el.attach_tap(Box::new(Exploding)),
            Err(VizError::GraphAlreadyBound(_))
        ));
    }

    #[test]
    fn test_seek_clamps_to_track() {
        let el = element();
        el.load(ramp_track(500, 100));
        el.seek_by(2.0);
        assert_eq!(el.position(), Duration::from_secs(2));
        el.seek_by(-10.0);
        assert_eq!(el.position(), Duration::ZERO);
        el.seek_by(100.0);
        assert_eq!(el.position(), Duration::from_secs_f64(4.99));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(element().id(), element().id());
    }
}
