/// Endless road streaming: keeps a window of pooled segments chained
/// around a moving observer.
///
/// The streamer is polled: the host calls [`SegmentStreamer::tick`] every
/// frame and the streamer does real work at most once per `check_interval`.

use log::{debug, error, info};
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::core::catalog::SegmentCatalog;
use crate::core::config::StreamerConfig;
use crate::core::pool::SegmentPool;
use crate::core::window::ActiveWindow;
use crate::schema::geometry::{Pose, Vec3};
use crate::schema::segment::{Segment, SegmentId, SegmentType};

/// Distance past the first entry marker where the observer should start.
const START_INSET: f32 = 1.0;

/// A change to the window or to the observer's current segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    Spawned {
        id: SegmentId,
        segment_type: SegmentType,
    },
    Despawned {
        id: SegmentId,
        segment_type: SegmentType,
    },
    /// The observer left this segment. Always precedes the matching `Entered`.
    Exited(SegmentId),
    Entered(SegmentId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamerStats {
    pub active: usize,
    pub pooled: usize,
    pub current: Option<SegmentId>,
    pub spawned_total: u64,
    pub despawned_total: u64,
    pub instances_created: u64,
    pub maintenance_passes: u64,
}

pub struct SegmentStreamer {
    config: StreamerConfig,
    catalog: SegmentCatalog,
    pool: SegmentPool,
    window: ActiveWindow,
    rng: StdRng,
    next_index: u64,
    current: Option<SegmentId>,
    last_check: Option<f64>,
    anchor: Pose,
    spawned_total: u64,
    despawned_total: u64,
    passes: u64,
}

impl SegmentStreamer {
    pub fn new(config: StreamerConfig, catalog: SegmentCatalog) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            catalog,
            pool: SegmentPool::new(),
            window: ActiveWindow::new(),
            rng,
            next_index: 0,
            current: None,
            last_check: None,
            anchor: Pose::IDENTITY,
            spawned_total: 0,
            despawned_total: 0,
            passes: 0,
        }
    }

    /// Seeds the window with `segments_ahead + segments_behind` segments
    /// chained from `pose`. Any previous window is recycled first.
    pub fn initialize(&mut self, pose: Pose) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(ev) = self.despawn_oldest() {
            events.push(ev);
        }
        self.current = None;
        self.last_check = None;
        self.anchor = pose;

        if self.pool.created() == 0 && self.config.prewarm_per_type > 0 {
            let types: Vec<SegmentType> = self.catalog.types().collect();
            for ty in types {
                if let Some(template) = self.catalog.get(ty) {
                    self.pool.prewarm(template, self.config.prewarm_per_type);
                }
            }
            debug!(
                "prewarmed {} pooled segments",
                self.pool.total_available()
            );
        }

        let target = self.config.segments_ahead + self.config.segments_behind;
        for _ in 0..target {
            match self.spawn_next() {
                Some(ev) => events.push(ev),
                None => break,
            }
        }

        info!(
            "road initialized with {}/{} segments",
            self.window.len(),
            target
        );
        events
    }

    /// Suggested observer start: just inside the first segment's entry.
    pub fn start_pose(&self) -> Pose {
        match self.window.front() {
            Some(first) => {
                let inset = START_INSET.min(first.length() * 0.5);
                first.entry().compose(&Pose::at(Vec3::new(0.0, 0.0, inset)))
            }
            None => self.anchor,
        }
    }

    /// Runs one maintenance pass if `check_interval` has elapsed since the
    /// last one. `now` is host time in seconds.
    pub fn tick(&mut self, now: f64, observer: Vec3) -> Vec<StreamEvent> {
        if self.window.is_empty() {
            return Vec::new();
        }
        if let Some(last) = self.last_check {
            if now - last < f64::from(self.config.check_interval) {
                return Vec::new();
            }
        }
        self.last_check = Some(now);
        self.passes += 1;

        let mut events = Vec::new();

        let Some(located) = self.locate(observer) else {
            return events;
        };
        if self.current != Some(located) {
            if let Some(old) = self.current {
                events.push(StreamEvent::Exited(old));
            }
            if let Some(segment) = self.window.get_mut(located) {
                segment.mark_visited();
            }
            events.push(StreamEvent::Entered(located));
            self.current = Some(located);
        }

        let index = self.window.position(located).unwrap_or(0);

        let mut ahead = self.window.len() - index - 1;
        while ahead < self.config.segments_ahead {
            match self.spawn_next() {
                Some(ev) => {
                    events.push(ev);
                    ahead += 1;
                }
                None => break,
            }
        }

        let mut behind = index;
        while behind > self.config.segments_behind {
            match self.despawn_oldest() {
                Some(ev) => {
                    events.push(ev);
                    behind -= 1;
                }
                None => break,
            }
        }

        events
    }

    /// First active segment containing the observer, else the oldest one.
    fn locate(&self, observer: Vec3) -> Option<SegmentId> {
        self.window
            .iter()
            .find(|s| s.contains(observer))
            .or_else(|| self.window.front())
            .map(Segment::id)
    }

    /// Draws the next segment type from the straight/curve/special buckets.
    pub fn choose_next_type(&mut self) -> SegmentType {
        let weights = [
            self.config.straight_weight.max(0.0),
            self.config.curve_weight.max(0.0),
            self.config.special_weight.max(0.0),
        ];
        let bucket = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => 0,
        };

        match bucket {
            1 => {
                if self.rng.gen_bool(0.5) {
                    SegmentType::SlightLeft
                } else {
                    SegmentType::SlightRight
                }
            }
            2 => {
                let special = SegmentType::SPECIAL
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(SegmentType::Straight);
                if self.catalog.contains(special) {
                    special
                } else {
                    debug!("no {} template, using straight", special.name());
                    SegmentType::Straight
                }
            }
            _ => SegmentType::Straight,
        }
    }

    /// Spawns a segment of a drawn type with its entry on `pose`.
    pub fn spawn_at(&mut self, pose: Pose) -> Option<StreamEvent> {
        let segment_type = self.choose_next_type();
        self.spawn_type_at(segment_type, pose)
    }

    /// Spawns a segment of `segment_type` (or its fallback) with its entry
    /// on `pose` and appends it to the window.
    pub fn spawn_type_at(&mut self, segment_type: SegmentType, pose: Pose) -> Option<StreamEvent> {
        let Some(variants) = self.catalog.resolve(segment_type) else {
            error!(
                "cannot spawn {}: no straight template to fall back on",
                segment_type.name()
            );
            return None;
        };
        let template = variants.choose(&mut self.rng)?;
        let mut segment = self.pool.acquire(template);

        let id = SegmentId(self.next_index);
        self.next_index += 1;
        let previous = self.window.back().map(Segment::id);
        segment.place(id, pose, previous);

        let spawned_type = segment.segment_type();
        self.window.push_back(segment);
        self.spawned_total += 1;
        debug!("spawned segment {} ({})", id.0, spawned_type.name());

        Some(StreamEvent::Spawned {
            id,
            segment_type: spawned_type,
        })
    }

    /// Spawns a drawn type chained to the tail's exit.
    fn spawn_next(&mut self) -> Option<StreamEvent> {
        let pose = self.window.back().map_or(self.anchor, Segment::exit);
        self.spawn_at(pose)
    }

    /// Removes the oldest segment and returns it to its pool.
    pub fn despawn_oldest(&mut self) -> Option<StreamEvent> {
        let segment = self.window.pop_front()?;
        let id = segment.id();
        let segment_type = segment.segment_type();
        if self.current == Some(id) {
            self.current = None;
        }
        self.pool.release(segment);
        self.despawned_total += 1;
        debug!("despawned segment {} ({})", id.0, segment_type.name());
        Some(StreamEvent::Despawned { id, segment_type })
    }

    /// Recycles the whole window and drops every pooled instance.
    pub fn shutdown(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(ev) = self.despawn_oldest() {
            events.push(ev);
        }
        self.pool.clear();
        self.current = None;
        self.last_check = None;
        events
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.current.and_then(|id| self.window.get(id))
    }

    pub fn current_id(&self) -> Option<SegmentId> {
        self.current
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.window.get(id)
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.window.get_mut(id)
    }

    /// Active segments, oldest first.
    pub fn active_segments(&self) -> impl Iterator<Item = &Segment> {
        self.window.iter()
    }

    /// The segment spawned right after `id`, if still active.
    pub fn next_after(&self, id: SegmentId) -> Option<&Segment> {
        let index = self.window.position(id)?;
        self.window.at(index + 1)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Segments strictly ahead of the current one.
    pub fn ahead_count(&self) -> usize {
        match self.current.and_then(|id| self.window.position(id)) {
            Some(index) => self.window.len() - index - 1,
            None => self.window.len(),
        }
    }

    /// Segments strictly behind the current one.
    pub fn behind_count(&self) -> usize {
        self.current
            .and_then(|id| self.window.position(id))
            .unwrap_or(0)
    }

    pub fn pooled_count(&self, segment_type: SegmentType) -> usize {
        self.pool.available(segment_type)
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        &self.catalog
    }

    pub fn stats(&self) -> StreamerStats {
        StreamerStats {
            active: self.window.len(),
            pooled: self.pool.total_available(),
            current: self.current,
            spawned_total: self.spawned_total,
            despawned_total: self.despawned_total,
            instances_created: self.pool.created(),
            maintenance_passes: self.passes,
        }
    }
}
