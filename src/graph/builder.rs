//! Audio graph construction.
//!
//! A graph taps a media element three ways: the left and right channels go
//! straight to their samplers, and the mono mix runs through the vocal filter
//! chain into the third sampler. The element keeps writing to the output
//! device regardless; the graph only listens.
//!
//! An element can be tapped once in its lifetime, so graphs are handed out by
//! a [`GraphRegistry`] keyed on the element's identity.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::context::ProcessingContext;
use super::filter_chain::{FilterChain, FilterParameters, VocalChain};
use super::tap::{tap, ChannelSnapshot, Sampler, TapWriter};
use crate::error::Result;
use crate::playback::{FrameTap, MediaElement, SourceId};
use crate::visualization::Channel;

/// A graph shared between the registry and the visualization session.
pub type SharedGraph = Arc<Mutex<AudioGraph>>;

/// The three taps of one media element plus the controls that shape them.
pub struct AudioGraph {
    source: SourceId,
    context: ProcessingContext,
    filters: FilterChain,
    samplers: [Sampler; Channel::COUNT],
}

impl AudioGraph {
    fn build(element: &MediaElement, params: FilterParameters) -> Result<Self> {
        let context = ProcessingContext::open(element.output_format())?;
        let (filters, chain) = FilterChain::build(params, context.sample_rate());

        let (left_writer, left) = tap();
        let (right_writer, right) = tap();
        let (vocal_writer, vocal) = tap();

        let processor = GraphProcessor {
            context: context.clone(),
            chain,
            left: left_writer,
            right: right_writer,
            vocal: vocal_writer,
        };
        element.attach_tap(Box::new(processor))?;

        tracing::info!(
            "Audio graph built for element {} at {}Hz",
            element.id(),
            context.sample_rate()
        );

        Ok(Self {
            source: element.id(),
            context,
            filters,
            samplers: [left, right, vocal],
        })
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn context(&self) -> &ProcessingContext {
        &self.context
    }

    /// Handle for retuning the vocal chain in place.
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Reads the latest snapshot of one channel.
    pub fn sample(&mut self, channel: Channel) -> ChannelSnapshot {
        self.samplers[channel.index()].sample()
    }

    /// Total sampler reads across all channels.
    pub fn reads(&self) -> u64 {
        self.samplers.iter().map(Sampler::reads).sum()
    }
}

/// Audio-thread side of a graph, attached to the element as its tap.
struct GraphProcessor {
    context: ProcessingContext,
    chain: VocalChain,
    left: TapWriter,
    right: TapWriter,
    vocal: TapWriter,
}

impl FrameTap for GraphProcessor {
    fn process(&mut self, frames: &[f32]) {
        if !self.context.is_running() {
            return;
        }
        self.chain.refresh();

        for frame in frames.chunks_exact(2) {
            let (l, r) = (frame[0], frame[1]);
            self.left.push(l);
            self.right.push(r);
            self.vocal.push(self.chain.process((l + r) * 0.5));
        }

        self.left.publish();
        self.right.publish();
        self.vocal.publish();
    }
}

/// Hands out at most one graph per media element.
pub struct GraphRegistry {
    graphs: HashMap<SourceId, SharedGraph>,
    params: FilterParameters,
}

impl GraphRegistry {
    /// Creates a registry; new graphs start with `params`.
    pub fn new(params: FilterParameters) -> Self {
        Self {
            graphs: HashMap::new(),
            params,
        }
    }

    /// Returns the element's graph, building it on first use.
    ///
    /// # Errors
    /// - `CapabilityUnavailable` if the element cannot host a processing context
    /// - `GraphAlreadyBound` if the element was tapped outside this registry
    pub fn get_or_create(&mut self, element: &MediaElement) -> Result<SharedGraph> {
        match self.graphs.entry(element.id()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let graph = AudioGraph::build(element, self.params)?;
                Ok(Arc::clone(entry.insert(Arc::new(Mutex::new(graph)))))
            }
        }
    }

    pub fn get(&self, source: SourceId) -> Option<SharedGraph> {
        self.graphs.get(&source).cloned()
    }

    /// Forgets the graph of a destroyed element.
    pub fn release(&mut self, source: SourceId) -> Option<SharedGraph> {
        let released = self.graphs.remove(&source);
        if released.is_some() {
            tracing::debug!("Audio graph for element {} released", source);
        }
        released
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}
