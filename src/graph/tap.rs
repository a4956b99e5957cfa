//! Time-domain tap points.
//!
//! A tap keeps the most recent [`SNAPSHOT_LEN`] samples of a signal as 8-bit
//! unsigned amplitudes (128 = centre). The audio thread pushes samples into a
//! [`TapWriter`] and publishes a block at the end of every callback; the UI
//! thread reads the latest published block through a [`Sampler`]. The hand-off
//! is a triple buffer, so a read never blocks and never sees a torn block.

use std::fmt;
use std::ops::Deref;
use triple_buffer::TripleBuffer;

/// Samples per snapshot.
pub const SNAPSHOT_LEN: usize = 2048;

/// Byte value of a zero-amplitude sample.
pub const CENTER: u8 = 128;

type Block = [u8; SNAPSHOT_LEN];

/// One fixed-size block of 8-bit amplitudes.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelSnapshot(Box<Block>);

impl ChannelSnapshot {
    /// A snapshot of centred silence.
    pub fn silent() -> Self {
        Self::filled(CENTER)
    }

    /// A snapshot with every sample set to `value`.
    pub fn filled(value: u8) -> Self {
        Self(Box::new([value; SNAPSHOT_LEN]))
    }

    /// Builds a snapshot from a generator over sample indices.
    pub fn from_fn(mut f: impl FnMut(usize) -> u8) -> Self {
        let mut block = Box::new([CENTER; SNAPSHOT_LEN]);
        for (i, value) in block.iter_mut().enumerate() {
            *value = f(i);
        }
        Self(block)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Deref for ChannelSnapshot {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for ChannelSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = self.0.iter().min().copied().unwrap_or(CENTER);
        let max = self.0.iter().max().copied().unwrap_or(CENTER);
        write!(f, "ChannelSnapshot {{ len: {SNAPSHOT_LEN}, min: {min}, max: {max} }}")
    }
}

/// Converts a float sample in `[-1, 1]` to the 8-bit tap representation.
#[inline]
pub fn to_byte(sample: f32) -> u8 {
    (128.0 * (sample + 1.0)).floor().clamp(0.0, 255.0) as u8
}

/// Creates a connected writer/reader pair, initialised to silence.
pub fn tap() -> (TapWriter, Sampler) {
    let (input, output) = TripleBuffer::new(&[CENTER; SNAPSHOT_LEN]).split();

    let writer = TapWriter {
        ring: Box::new([CENTER; SNAPSHOT_LEN]),
        write_pos: 0,
        input,
    };
    let sampler = Sampler { output, reads: 0 };

    (writer, sampler)
}

/// Audio-thread end of a tap.
pub struct TapWriter {
    ring: Box<Block>,
    write_pos: usize,
    input: triple_buffer::Input<Block>,
}

impl TapWriter {
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.ring[self.write_pos] = to_byte(sample);
        self.write_pos = (self.write_pos + 1) % SNAPSHOT_LEN;
    }

    /// Publishes the ring, oldest sample first.
    pub fn publish(&mut self) {
        let mut block = [CENTER; SNAPSHOT_LEN];
        let (newest, oldest) = self.ring.split_at(self.write_pos);
        block[..oldest.len()].copy_from_slice(oldest);
        block[oldest.len()..].copy_from_slice(newest);
        self.input.write(block);
    }
}

/// UI-thread end of a tap.
pub struct Sampler {
    output: triple_buffer::Output<Block>,
    reads: u64,
}

impl Sampler {
    /// Returns the latest published block (silence before warm-up).
    pub fn sample(&mut self) -> ChannelSnapshot {
        self.reads += 1;
        ChannelSnapshot(Box::new(*self.output.read()))
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}
