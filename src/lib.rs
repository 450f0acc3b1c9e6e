//! Endless Road: procedural road streaming and sanity-driven horror events.
//!
//! Keeps a rolling window of pooled road segments chained ahead of a moving
//! observer, and decides on every segment entry whether an event fires, how
//! hard it is, and when it ends. Rendering, physics and audio stay with the
//! host behind the [`core::host`] traits.

pub mod core;
pub mod schema;

pub use crate::core::catalog::{CatalogError, EventCatalog, SegmentCatalog};
pub use crate::core::config::{ConfigError, DirectorConfig, RoadConfig, StreamerConfig};
pub use crate::core::director::{DirectorEvent, EventDirector};
pub use crate::core::host::{HeadlessHost, PayloadHandle, PayloadHost, SanityMeter, SanityProvider};
pub use crate::core::session::{RoadNotification, RoadSession, SessionError};
pub use crate::core::streamer::{SegmentStreamer, StreamEvent};
