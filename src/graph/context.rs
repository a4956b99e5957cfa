//! Real-time processing context for a media element.
//!
//! The context carries the sample rate the graph runs at and a power state.
//! A fresh context starts suspended; the scheduler resumes it on the first
//! play event. While suspended the taps keep their last published block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, VizError};
use crate::playback::OutputFormat;

/// Lowest sample rate the filter graph supports.
pub const MIN_SAMPLE_RATE: u32 = 3_000;

/// Highest sample rate the filter graph supports.
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Power state of a processing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
}

/// Handle to a processing context; clones share the same state.
#[derive(Debug, Clone)]
pub struct ProcessingContext {
    sample_rate: u32,
    running: Arc<AtomicBool>,
}

impl ProcessingContext {
    /// Opens a context for an element with the given output format.
    ///
    /// # Errors
    /// - `CapabilityUnavailable` if the element has no output stream
    /// - `CapabilityUnavailable` if the sample rate is outside the supported range
    pub fn open(format: Option<OutputFormat>) -> Result<Self> {
        let format = format.ok_or_else(|| {
            VizError::CapabilityUnavailable("media element has no audio output".to_string())
        })?;

        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&format.sample_rate) {
            return Err(VizError::CapabilityUnavailable(format!(
                "sample rate {}Hz is outside {}-{}Hz",
                format.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }

        if format.channels == 0 {
            return Err(VizError::CapabilityUnavailable(
                "output device reports zero channels".to_string(),
            ));
        }

        Ok(Self {
            sample_rate: format.sample_rate,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn state(&self) -> ContextState {
        if self.is_running() {
            ContextState::Running
        } else {
            ContextState::Suspended
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn resume(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            tracing::debug!("Processing context resumed");
        }
    }

    pub fn suspend(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!("Processing context suspended");
        }
    }
}
