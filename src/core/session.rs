/// A road session: the streamer and the director wired together.
///
/// Every `Entered` notification from the streamer is handed to the director
/// before the director's lifetime sweep runs, and both notification streams
/// come back to the host as one ordered list.

use log::{info, warn};
use std::path::Path;
use thiserror::Error;

use crate::core::catalog::{CatalogError, EventCatalog, SegmentCatalog};
use crate::core::config::{ConfigError, DirectorConfig, RoadConfig, StreamerConfig};
use crate::core::director::{DirectorEvent, EventDirector};
use crate::core::host::{PayloadHost, SanityProvider};
use crate::core::streamer::{SegmentStreamer, StreamEvent};
use crate::schema::event::EventId;
use crate::schema::geometry::{Pose, Vec3};

/// Mixed into the session seed so the two components draw different streams.
const DIRECTOR_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadNotification {
    Stream(StreamEvent),
    Director(DirectorEvent),
}

/// Built via `RoadSession::builder()`.
pub struct RoadSession {
    streamer: SegmentStreamer,
    director: EventDirector,
}

/// Builder for constructing a `RoadSession`.
pub struct RoadSessionBuilder {
    config_path: Option<String>,
    segments_path: Option<String>,
    events_path: Option<String>,
    seed: Option<u64>,
    streamer_config: Option<StreamerConfig>,
    director_config: Option<DirectorConfig>,
    /// Directly provided segments (for testing without files).
    segments: Option<SegmentCatalog>,
    /// Directly provided events (for testing without files).
    events: Option<EventCatalog>,
}

impl RoadSession {
    pub fn builder() -> RoadSessionBuilder {
        RoadSessionBuilder {
            config_path: None,
            segments_path: None,
            events_path: None,
            seed: None,
            streamer_config: None,
            director_config: None,
            segments: None,
            events: None,
        }
    }

    /// Seeds the road at `pose`.
    pub fn start(&mut self, pose: Pose) -> Vec<RoadNotification> {
        self.streamer
            .initialize(pose)
            .into_iter()
            .map(RoadNotification::Stream)
            .collect()
    }

    /// Suggested observer start after [`RoadSession::start`].
    pub fn start_pose(&self) -> Pose {
        self.streamer.start_pose()
    }

    /// One frame: window maintenance, event rolls for entered segments, then
    /// the event lifetime sweep.
    pub fn tick(
        &mut self,
        now: f64,
        observer: Vec3,
        sanity: &mut dyn SanityProvider,
        host: &mut dyn PayloadHost,
    ) -> Vec<RoadNotification> {
        let mut out = Vec::new();
        for event in self.streamer.tick(now, observer) {
            out.push(RoadNotification::Stream(event));
            if let StreamEvent::Entered(id) = event {
                if let Some(segment) = self.streamer.segment_mut(id) {
                    out.extend(
                        self.director
                            .on_segment_entered(segment, now, sanity, host)
                            .into_iter()
                            .map(RoadNotification::Director),
                    );
                }
            }
        }
        out.extend(
            self.director
                .tick(now, host)
                .into_iter()
                .map(RoadNotification::Director),
        );
        out
    }

    /// Fires `definition` on the observer's current segment, ignoring the
    /// cooldown, roll and cap.
    pub fn force_trigger(
        &mut self,
        definition: EventId,
        now: f64,
        sanity: &mut dyn SanityProvider,
        host: &mut dyn PayloadHost,
    ) -> Vec<RoadNotification> {
        let Some(id) = self.streamer.current_id() else {
            warn!("force_trigger before the observer entered any segment");
            return Vec::new();
        };
        let Some(segment) = self.streamer.segment_mut(id) else {
            return Vec::new();
        };
        self.director
            .force_trigger(definition, segment, now, sanity, host)
            .into_iter()
            .map(RoadNotification::Director)
            .collect()
    }

    /// Ends every event, then recycles the whole road.
    pub fn shutdown(&mut self, host: &mut dyn PayloadHost) -> Vec<RoadNotification> {
        let mut out: Vec<RoadNotification> = self
            .director
            .clear_all(host)
            .into_iter()
            .map(RoadNotification::Director)
            .collect();
        out.extend(
            self.streamer
                .shutdown()
                .into_iter()
                .map(RoadNotification::Stream),
        );
        out
    }

    pub fn streamer(&self) -> &SegmentStreamer {
        &self.streamer
    }

    pub fn director(&self) -> &EventDirector {
        &self.director
    }
}

impl RoadSessionBuilder {
    /// A `RoadConfig` RON file. Explicit configs set on the builder win.
    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn segments_file(mut self, path: &str) -> Self {
        self.segments_path = Some(path.to_string());
        self
    }

    pub fn events_file(mut self, path: &str) -> Self {
        self.events_path = Some(path.to_string());
        self
    }

    /// Overrides both component seeds.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn streamer_config(mut self, config: StreamerConfig) -> Self {
        self.streamer_config = Some(config);
        self
    }

    pub fn director_config(mut self, config: DirectorConfig) -> Self {
        self.director_config = Some(config);
        self
    }

    /// Provide segment templates directly (for testing without files).
    pub fn with_segments(mut self, segments: SegmentCatalog) -> Self {
        self.segments = Some(segments);
        self
    }

    /// Provide event definitions directly (for testing without files).
    pub fn with_events(mut self, events: EventCatalog) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<RoadSession, SessionError> {
        let mut config = match self.config_path {
            Some(ref path) if Path::new(path).exists() => RoadConfig::load_from_ron(Path::new(path))?,
            Some(ref path) => {
                warn!("config file {} not found, using defaults", path);
                RoadConfig::default()
            }
            None => RoadConfig::default(),
        };
        if let Some(streamer) = self.streamer_config {
            config.streamer = streamer;
        }
        if let Some(director) = self.director_config {
            config.director = director;
        }
        if let Some(seed) = self.seed {
            config.streamer.seed = seed;
            config.director.seed = seed ^ DIRECTOR_SEED_SALT;
        }
        config.streamer.validate()?;

        // File content is appended to anything provided directly.
        let mut segments = self.segments.unwrap_or_default();
        if let Some(ref path) = self.segments_path {
            if Path::new(path).exists() {
                segments.merge(SegmentCatalog::load_from_ron(Path::new(path))?);
            } else {
                warn!("segment catalog {} not found", path);
            }
        }

        let mut events = self.events.unwrap_or_default();
        if let Some(ref path) = self.events_path {
            if Path::new(path).exists() {
                let loaded = EventCatalog::load_from_ron(Path::new(path))?;
                if events.is_empty() {
                    events = loaded;
                } else {
                    events.merge(loaded);
                }
            } else {
                warn!("event catalog {} not found", path);
            }
        }

        info!(
            "road session: {} segment templates, {} events",
            segments.len(),
            events.len()
        );

        Ok(RoadSession {
            streamer: SegmentStreamer::new(config.streamer, segments),
            director: EventDirector::new(config.director, events),
        })
    }
}
