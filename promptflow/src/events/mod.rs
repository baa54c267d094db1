//! Progress event sinks.
//!
//! A run reports its progress through an [`EventSink`]. The sink handed to a
//! live run is a [`ChannelEventSink`], whose receiving end becomes the run's
//! notification sequence.

mod sink;

pub use sink::{ChannelEventSink, CollectingEventSink, EventSink};
