//! Audio graph: taps, the vocal filter chain and their construction.

pub mod biquad;
pub mod builder;
pub mod context;
pub mod filter_chain;
pub mod tap;

pub use builder::{AudioGraph, GraphRegistry, SharedGraph};
pub use context::{ContextState, ProcessingContext};
pub use filter_chain::{FilterChain, FilterParameters};
pub use tap::{ChannelSnapshot, Sampler, CENTER, SNAPSHOT_LEN};
