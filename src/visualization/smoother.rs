//! Temporal smoothing of channel snapshots.
//!
//! Each channel keeps its previous smoothed snapshot and blends every new raw
//! snapshot into it sample by sample. This is an exponential low-pass across
//! frames: it trades responsiveness for a steadier picture.

use std::fmt;

use super::channel::Channel;
use crate::graph::{ChannelSnapshot, SNAPSHOT_LEN};

/// Weight of the newest raw snapshot in the blend.
pub const BLEND_FACTOR: f32 = 0.15;

/// A smoothed snapshot. Values stay within the 8-bit range `[0, 255]`.
#[derive(Clone, PartialEq)]
pub struct SmoothedSnapshot(Box<[f32; SNAPSHOT_LEN]>);

impl SmoothedSnapshot {
    fn from_raw(raw: &ChannelSnapshot) -> Self {
        let mut values = Box::new([0.0; SNAPSHOT_LEN]);
        for (dst, &src) in values.iter_mut().zip(raw.iter()) {
            *dst = src as f32;
        }
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0[..]
    }
}

impl From<&ChannelSnapshot> for SmoothedSnapshot {
    fn from(raw: &ChannelSnapshot) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Debug for SmoothedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SmoothedSnapshot {{ len: {} }}", self.0.len())
    }
}

/// Per-channel smoothing state.
#[derive(Debug, Default)]
pub struct SignalSmoother {
    prior: [Option<SmoothedSnapshot>; Channel::COUNT],
}

impl SignalSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blends `raw` into the channel's state and returns the result.
    ///
    /// The first snapshot seen for a channel is returned unchanged.
    pub fn smooth(&mut self, channel: Channel, raw: &ChannelSnapshot) -> SmoothedSnapshot {
        let slot = &mut self.prior[channel.index()];

        let next = match slot.take() {
            None => SmoothedSnapshot::from_raw(raw),
            Some(mut prior) => {
                for (p, &r) in prior.0.iter_mut().zip(raw.iter()) {
                    *p = *p * (1.0 - BLEND_FACTOR) + r as f32 * BLEND_FACTOR;
                }
                prior
            }
        };

        *slot = Some(next.clone());
        next
    }

    /// Drops all state; the next snapshot per channel starts fresh.
    pub fn reset(&mut self) {
        self.prior = Default::default();
        tracing::debug!("Smoothing state reset");
    }

    pub fn is_primed(&self, channel: Channel) -> bool {
        self.prior[channel.index()].is_some()
    }
}
