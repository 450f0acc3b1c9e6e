/// Event direction: decides, once per entered segment, whether and which
/// horror events fire, weighting both by the player's sanity.
///
/// Lower sanity raises the trigger chance, unlocks harsher difficulty bands,
/// skews the pick toward harder events within a band, and makes a secondary
/// (non-atmospheric) event more likely.

use log::{debug, info, warn};
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::core::catalog::EventCatalog;
use crate::core::config::DirectorConfig;
use crate::core::host::{PayloadHandle, PayloadHost, SanityProvider};
use crate::schema::event::{EndPolicy, EventCategory, EventDifficulty, EventId};
use crate::schema::geometry::Pose;
use crate::schema::segment::{Segment, SegmentId, SpawnPointKind};

/// Secondary-category probability at zero sanity.
const SECONDARY_CHANCE_AT_ZERO_SANITY: f32 = 0.5;
/// Weight added per difficulty level at zero sanity.
const DIFFICULTY_WEIGHT_SCALE: f32 = 2.0;

/// Hardest difficulty allowed at a given sanity percent.
pub fn max_difficulty_for(sanity_percent: f32) -> EventDifficulty {
    if sanity_percent > 0.75 {
        EventDifficulty::Unsettling
    } else if sanity_percent > 0.50 {
        EventDifficulty::Dangerous
    } else if sanity_percent > 0.25 {
        EventDifficulty::Terrifying
    } else {
        EventDifficulty::Nightmare
    }
}

/// Selection weight of a candidate: `1 + level × (1 − sanity) × 2`.
pub fn candidate_weight(difficulty: EventDifficulty, sanity_percent: f32) -> f32 {
    1.0 + f32::from(difficulty.level()) * (1.0 - sanity_percent) * DIFFICULTY_WEIGHT_SCALE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventInstanceId(pub u64);

/// A triggered event the director is tracking.
#[derive(Debug, Clone)]
pub struct ActiveEvent {
    pub id: EventInstanceId,
    pub definition: EventId,
    pub category: EventCategory,
    pub payload: Option<PayloadHandle>,
    pub spawned_at: f64,
    pub segment: SegmentId,
    pub position: Pose,
    pub end_policy: EndPolicy,
}

impl ActiveEvent {
    fn should_end(&self, now: f64, host: &dyn PayloadHost) -> bool {
        match self.end_policy {
            EndPolicy::Immediate => true,
            EndPolicy::WhenPayloadGone => self.payload.map_or(true, |h| !host.is_alive(h)),
            EndPolicy::AfterDuration(duration) => now - self.spawned_at >= f64::from(duration),
        }
    }

    fn end(&mut self, host: &mut dyn PayloadHost) -> DirectorEvent {
        if let Some(handle) = self.payload.take() {
            if host.is_alive(handle) {
                host.destroy(handle);
            }
        }
        DirectorEvent::Ended {
            instance: self.id,
            definition: self.definition,
        }
    }
}

/// Notifications produced by the director, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorEvent {
    Triggered {
        instance: EventInstanceId,
        definition: EventId,
        segment: SegmentId,
    },
    Ended {
        instance: EventInstanceId,
        definition: EventId,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorStats {
    pub triggered: u64,
    pub ended: u64,
    pub skipped_disallowed: u64,
    pub skipped_cooldown: u64,
    pub skipped_already_triggered: u64,
    pub rolls_failed: u64,
    pub skipped_invalid_sanity: u64,
    pub capped: u64,
    pub empty_category: u64,
}

pub struct EventDirector {
    config: DirectorConfig,
    catalog: EventCatalog,
    rng: StdRng,
    active: FxHashMap<EventCategory, Vec<ActiveEvent>>,
    segments_since_last_event: u32,
    next_instance: u64,
    stats: DirectorStats,
}

impl EventDirector {
    /// Takes ownership of the catalog and builds its indices.
    pub fn new(config: DirectorConfig, mut catalog: EventCatalog) -> Self {
        catalog.build();
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            catalog,
            rng,
            active: FxHashMap::default(),
            segments_since_last_event: 0,
            next_instance: 0,
            stats: DirectorStats::default(),
        }
    }

    /// Chance that an eligible segment triggers: the segment override if it
    /// has one, else `base + (1 − sanity) × bonus`, clamped to [0, 1].
    /// Non-finite sanity counts as full sanity; a non-finite chance is 0.
    pub fn trigger_chance(&self, segment_override: Option<f32>, sanity_percent: f32) -> f32 {
        let sanity_percent = if sanity_percent.is_finite() {
            sanity_percent.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let chance = match segment_override {
            Some(chance) => chance,
            None => self.catalog.base_chance + (1.0 - sanity_percent) * self.catalog.sanity_bonus,
        };
        if chance.is_finite() {
            chance.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Reacts to the observer entering `segment`. Rolls at most once per
    /// segment and honours the cooldown.
    pub fn on_segment_entered(
        &mut self,
        segment: &mut Segment,
        now: f64,
        sanity: &mut dyn SanityProvider,
        host: &mut dyn PayloadHost,
    ) -> Vec<DirectorEvent> {
        self.segments_since_last_event = self.segments_since_last_event.saturating_add(1);

        if !segment.allows_events() {
            debug!("segment {} does not allow events", segment.id().0);
            self.stats.skipped_disallowed += 1;
            return Vec::new();
        }
        if self.segments_since_last_event < self.config.min_segments_between_events {
            debug!(
                "cooldown: {}/{} segments since last event",
                self.segments_since_last_event, self.config.min_segments_between_events
            );
            self.stats.skipped_cooldown += 1;
            return Vec::new();
        }
        if segment.is_event_triggered() {
            debug!("segment {} already triggered", segment.id().0);
            self.stats.skipped_already_triggered += 1;
            return Vec::new();
        }

        let raw_sanity = sanity.sanity_percent();
        if !raw_sanity.is_finite() {
            warn!("sanity provider returned {}, skipping segment {}", raw_sanity, segment.id().0);
            self.stats.skipped_invalid_sanity += 1;
            return Vec::new();
        }
        let sanity_percent = raw_sanity.clamp(0.0, 1.0);
        let chance = self.trigger_chance(segment.trigger_chance_override(), sanity_percent);
        let roll: f32 = self.rng.gen();
        if roll >= chance {
            debug!("roll {:.3} missed chance {:.3}", roll, chance);
            self.stats.rolls_failed += 1;
            return Vec::new();
        }

        segment.mark_event_triggered();
        self.segments_since_last_event = 0;

        let mut events = Vec::new();
        self.select_and_trigger(segment, now, sanity_percent, sanity, host, &mut events);
        events
    }

    /// Atmospheric first, then maybe one secondary category.
    fn select_and_trigger(
        &mut self,
        segment: &Segment,
        now: f64,
        sanity_percent: f32,
        sanity: &mut dyn SanityProvider,
        host: &mut dyn PayloadHost,
        events: &mut Vec<DirectorEvent>,
    ) {
        let produced = self.try_category(
            EventCategory::Atmospheric,
            segment,
            now,
            sanity_percent,
            sanity,
            host,
            events,
        );

        let secondary_chance = (1.0 - sanity_percent) * SECONDARY_CHANCE_AT_ZERO_SANITY;
        if produced && self.rng.gen::<f32>() >= secondary_chance {
            return;
        }
        if let Some(&category) = EventCategory::SECONDARY.choose(&mut self.rng) {
            self.try_category(category, segment, now, sanity_percent, sanity, host, events);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_category(
        &mut self,
        category: EventCategory,
        segment: &Segment,
        now: f64,
        sanity_percent: f32,
        sanity: &mut dyn SanityProvider,
        host: &mut dyn PayloadHost,
        events: &mut Vec<DirectorEvent>,
    ) -> bool {
        if self.active_count(category) >= self.config.max_events_per_category {
            debug!("{} events at capacity", category.name());
            self.stats.capped += 1;
            return false;
        }
        let Some(definition) = self.pick_definition(category, sanity_percent) else {
            info!("no {} events in catalog", category.name());
            self.stats.empty_category += 1;
            return false;
        };
        self.spawn_event(definition, segment, now, sanity, host, events);
        true
    }

    /// Weighted pick among the category's definitions allowed at this
    /// sanity; uniform over the whole category if none are allowed.
    fn pick_definition(&mut self, category: EventCategory, sanity_percent: f32) -> Option<EventId> {
        let ids = self.catalog.by_category(category);
        if ids.is_empty() {
            return None;
        }

        let max = max_difficulty_for(sanity_percent);
        let eligible: Vec<(EventId, f32)> = ids
            .iter()
            .filter_map(|&id| {
                let def = self.catalog.get(id)?;
                (def.difficulty <= max)
                    .then(|| (id, candidate_weight(def.difficulty, sanity_percent)))
            })
            .collect();

        if eligible.is_empty() {
            debug!(
                "no {} event at or below {:?}, picking from the whole category",
                category.name(),
                max
            );
            return ids.choose(&mut self.rng).copied();
        }

        let weights: Vec<f32> = eligible.iter().map(|(_, w)| *w).collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => Some(eligible[dist.sample(&mut self.rng)].0),
            Err(_) => eligible.choose(&mut self.rng).map(|(id, _)| *id),
        }
    }

    fn spawn_event(
        &mut self,
        definition: EventId,
        segment: &Segment,
        now: f64,
        sanity: &mut dyn SanityProvider,
        host: &mut dyn PayloadHost,
        events: &mut Vec<DirectorEvent>,
    ) {
        let Some(def) = self.catalog.get(definition).cloned() else {
            return;
        };

        let position = if def.use_spawn_point {
            segment
                .spawn_poses(SpawnPointKind::Event)
                .choose(&mut self.rng)
                .copied()
                .unwrap_or_else(|| segment.origin())
        } else {
            segment.origin()
        };

        let wants_payload = def.payload.is_some();
        let payload = def.payload.as_deref().and_then(|key| {
            let handle = host.instantiate(key, position);
            if handle.is_none() {
                warn!("host could not spawn payload '{}' for '{}'", key, def.name);
            }
            handle
        });
        if def.sanity_impact != 0.0 {
            sanity.reduce_sanity(def.sanity_impact);
        }
        if let Some(sound) = &def.sound {
            host.play_sound(sound, position);
        }

        let id = EventInstanceId(self.next_instance);
        self.next_instance += 1;
        info!(
            "event '{}' ({:?}) triggered on segment {}",
            def.name,
            def.difficulty,
            segment.id().0
        );
        events.push(DirectorEvent::Triggered {
            instance: id,
            definition,
            segment: segment.id(),
        });
        self.stats.triggered += 1;

        // A payload the host failed to spawn leaves nothing to wait on.
        let end_policy = if wants_payload && payload.is_none() {
            EndPolicy::Immediate
        } else {
            def.end_policy()
        };
        let mut instance = ActiveEvent {
            id,
            definition,
            category: def.category,
            payload,
            spawned_at: now,
            segment: segment.id(),
            position,
            end_policy,
        };

        if instance.end_policy == EndPolicy::Immediate {
            events.push(instance.end(host));
            self.stats.ended += 1;
        } else {
            self.active.entry(def.category).or_default().push(instance);
        }
    }

    /// Ends every active event whose lifetime condition is met.
    pub fn tick(&mut self, now: f64, host: &mut dyn PayloadHost) -> Vec<DirectorEvent> {
        let mut events = Vec::new();
        for category in EventCategory::ALL {
            let Some(list) = self.active.get_mut(&category) else {
                continue;
            };
            list.retain_mut(|event| {
                if event.should_end(now, host) {
                    events.push(event.end(host));
                    false
                } else {
                    true
                }
            });
        }
        self.stats.ended += events.len() as u64;
        events
    }

    /// Triggers `definition` on `segment` regardless of cooldown, roll or cap.
    pub fn force_trigger(
        &mut self,
        definition: EventId,
        segment: &mut Segment,
        now: f64,
        sanity: &mut dyn SanityProvider,
        host: &mut dyn PayloadHost,
    ) -> Vec<DirectorEvent> {
        if self.catalog.get(definition).is_none() {
            warn!("force_trigger: unknown event {:?}", definition);
            return Vec::new();
        }
        segment.mark_event_triggered();
        let mut events = Vec::new();
        self.spawn_event(definition, segment, now, sanity, host, &mut events);
        events
    }

    /// Ends every active event immediately.
    pub fn clear_all(&mut self, host: &mut dyn PayloadHost) -> Vec<DirectorEvent> {
        let mut events = Vec::new();
        for category in EventCategory::ALL {
            if let Some(list) = self.active.get_mut(&category) {
                for mut event in list.drain(..) {
                    events.push(event.end(host));
                }
            }
        }
        self.stats.ended += events.len() as u64;
        events
    }

    pub fn active_count(&self, category: EventCategory) -> usize {
        self.active.get(&category).map_or(0, Vec::len)
    }

    pub fn total_active(&self) -> usize {
        self.active.values().map(Vec::len).sum()
    }

    /// Active events, grouped by category in declaration order.
    pub fn active_events(&self) -> impl Iterator<Item = &ActiveEvent> {
        EventCategory::ALL
            .into_iter()
            .filter_map(|c| self.active.get(&c))
            .flatten()
    }

    pub fn segments_since_last_event(&self) -> u32 {
        self.segments_since_last_event
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn stats(&self) -> &DirectorStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::{HeadlessHost, SanityMeter};
    use crate::schema::event::EventDefinition;
    use crate::schema::segment::SegmentTemplate;

    /// Host that refuses every payload.
    #[derive(Default)]
    struct RefusingHost {
        attempts: usize,
    }

    impl PayloadHost for RefusingHost {
        fn instantiate(&mut self, _payload: &str, _at: Pose) -> Option<PayloadHandle> {
            self.attempts += 1;
            None
        }

        fn is_alive(&self, _handle: PayloadHandle) -> bool {
            false
        }

        fn destroy(&mut self, _handle: PayloadHandle) {}
    }

    /// Sanity source that reports a fixed, possibly bogus, percent.
    struct FixedSanity(f32);

    impl SanityProvider for FixedSanity {
        fn sanity_percent(&self) -> f32 {
            self.0
        }

        fn reduce_sanity(&mut self, _amount: f32) {}
    }

    fn segment(id: u64) -> Segment {
        let mut seg = Segment::from_template(&SegmentTemplate::straight(10.0), id);
        seg.place(SegmentId(id), Pose::IDENTITY, None);
        seg
    }

    fn always(min_between: u32, cap: usize) -> DirectorConfig {
        DirectorConfig {
            min_segments_between_events: min_between,
            max_events_per_category: cap,
            seed: 7,
        }
    }

    fn certain(catalog: EventCatalog) -> EventCatalog {
        let mut catalog = catalog;
        catalog.base_chance = 1.0;
        catalog
    }

    #[test]
    fn difficulty_bands() {
        assert_eq!(max_difficulty_for(1.0), EventDifficulty::Unsettling);
        assert_eq!(max_difficulty_for(0.76), EventDifficulty::Unsettling);
        assert_eq!(max_difficulty_for(0.75), EventDifficulty::Dangerous);
        assert_eq!(max_difficulty_for(0.51), EventDifficulty::Dangerous);
        assert_eq!(max_difficulty_for(0.5), EventDifficulty::Terrifying);
        assert_eq!(max_difficulty_for(0.25), EventDifficulty::Nightmare);
        assert_eq!(max_difficulty_for(0.0), EventDifficulty::Nightmare);
    }

    #[test]
    fn weights_scale_with_insanity() {
        assert_eq!(candidate_weight(EventDifficulty::Nightmare, 1.0), 1.0);
        assert_eq!(candidate_weight(EventDifficulty::Harmless, 0.0), 1.0);
        assert_eq!(candidate_weight(EventDifficulty::Nightmare, 0.0), 9.0);
        assert_eq!(candidate_weight(EventDifficulty::Dangerous, 0.5), 3.0);
    }

    #[test]
    fn trigger_chance_formula_and_clamp() {
        let director = EventDirector::new(always(0, 1), EventCatalog::new(0.2, 0.5));
        assert!((director.trigger_chance(None, 1.0) - 0.2).abs() < 1e-6);
        assert!((director.trigger_chance(None, 0.0) - 0.7).abs() < 1e-6);
        assert_eq!(director.trigger_chance(Some(0.05), 0.0), 0.05);
        assert_eq!(director.trigger_chance(Some(3.0), 1.0), 1.0);

        let hot = EventDirector::new(always(0, 1), EventCatalog::new(0.9, 0.9));
        assert_eq!(hot.trigger_chance(None, 0.0), 1.0);
    }

    #[test]
    fn instant_event_ends_in_same_call() {
        let catalog = certain(EventCatalog::default().with(
            EventDefinition::new("whisper", EventCategory::Atmospheric, EventDifficulty::Harmless)
                .with_sound("whisper_01")
                .with_sanity_impact(2.0),
        ));
        let mut director = EventDirector::new(always(0, 1), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::new(100.0);
        let mut seg = segment(0);

        let events = director.on_segment_entered(&mut seg, 0.0, &mut sanity, &mut host);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DirectorEvent::Triggered { .. }));
        assert!(matches!(events[1], DirectorEvent::Ended { .. }));
        assert_eq!(director.total_active(), 0);
        assert_eq!(sanity.current, 98.0);
        assert_eq!(host.sounds, vec!["whisper_01".to_string()]);
        assert!(seg.is_event_triggered());
    }

    #[test]
    fn timed_event_ends_after_duration() {
        let catalog = certain(EventCatalog::default().with(
            EventDefinition::new("fog", EventCategory::Atmospheric, EventDifficulty::Harmless)
                .with_payload("fog_bank")
                .with_duration(5.0),
        ));
        let mut director = EventDirector::new(always(0, 1), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();

        director.on_segment_entered(&mut segment(0), 10.0, &mut sanity, &mut host);
        assert_eq!(director.active_count(EventCategory::Atmospheric), 1);
        assert_eq!(host.live_count(), 1);

        assert!(director.tick(14.9, &mut host).is_empty());
        let ended = director.tick(15.0, &mut host);
        assert_eq!(ended.len(), 1);
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.destroyed, 1);
        assert_eq!(director.total_active(), 0);
    }

    #[test]
    fn self_managed_event_waits_for_payload() {
        let catalog = certain(EventCatalog::default().with(
            EventDefinition::new("crow", EventCategory::Atmospheric, EventDifficulty::Harmless)
                .with_payload("crow_flock")
                .with_duration(1.0)
                .self_managed(),
        ));
        let mut director = EventDirector::new(always(0, 1), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();

        director.on_segment_entered(&mut segment(0), 0.0, &mut sanity, &mut host);
        assert!(director.tick(100.0, &mut host).is_empty());

        host.expire_all();
        assert_eq!(director.tick(100.1, &mut host).len(), 1);
        assert_eq!(host.destroyed, 0);
    }

    #[test]
    fn cooldown_counts_segment_entries() {
        let catalog = certain(EventCatalog::default().with(EventDefinition::new(
            "hum",
            EventCategory::Atmospheric,
            EventDifficulty::Harmless,
        )));
        let mut director = EventDirector::new(always(3, 5), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();

        let mut fired = Vec::new();
        for i in 0..10 {
            let events = director.on_segment_entered(&mut segment(i), 0.0, &mut sanity, &mut host);
            if !events.is_empty() {
                fired.push(i);
            }
        }
        assert_eq!(fired, vec![2, 5, 8]);
        assert_eq!(director.stats().skipped_cooldown, 7);
    }

    #[test]
    fn failed_roll_keeps_cooldown_counter() {
        let catalog = EventCatalog::new(0.0, 0.0).with(EventDefinition::new(
            "hum",
            EventCategory::Atmospheric,
            EventDifficulty::Harmless,
        ));
        let mut director = EventDirector::new(always(1, 1), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();
        for i in 0..4 {
            assert!(director
                .on_segment_entered(&mut segment(i), 0.0, &mut sanity, &mut host)
                .is_empty());
        }
        assert_eq!(director.segments_since_last_event(), 4);
        assert_eq!(director.stats().rolls_failed, 4);
    }

    #[test]
    fn disallowed_and_triggered_segments_are_skipped() {
        let catalog = certain(EventCatalog::default().with(EventDefinition::new(
            "hum",
            EventCategory::Atmospheric,
            EventDifficulty::Harmless,
        )));
        let mut director = EventDirector::new(always(0, 5), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();

        let mut rest = segment(0);
        rest.allow_events = false;
        assert!(director.on_segment_entered(&mut rest, 0.0, &mut sanity, &mut host).is_empty());

        let mut seg = segment(1);
        assert!(!director.on_segment_entered(&mut seg, 0.0, &mut sanity, &mut host).is_empty());
        assert!(director.on_segment_entered(&mut seg, 0.0, &mut sanity, &mut host).is_empty());
        assert_eq!(director.stats().skipped_disallowed, 1);
        assert_eq!(director.stats().skipped_already_triggered, 1);
    }

    #[test]
    fn segment_override_replaces_catalog_chance() {
        let catalog = certain(EventCatalog::default().with(EventDefinition::new(
            "hum",
            EventCategory::Atmospheric,
            EventDifficulty::Harmless,
        )));
        let mut director = EventDirector::new(always(0, 5), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::at_percent(0.0);
        for i in 0..50 {
            let mut seg = segment(i);
            seg.trigger_chance = Some(0.0);
            assert!(director.on_segment_entered(&mut seg, 0.0, &mut sanity, &mut host).is_empty());
        }
    }

    #[test]
    fn empty_atmospheric_forces_secondary() {
        let catalog = certain(EventCatalog::default().with(EventDefinition::new(
            "deer",
            EventCategory::Obstacle,
            EventDifficulty::Harmless,
        )));
        let mut director = EventDirector::new(always(0, 5), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();

        let mut obstacle_hits = 0;
        for i in 0..60 {
            let events = director.on_segment_entered(&mut segment(i), 0.0, &mut sanity, &mut host);
            if !events.is_empty() {
                obstacle_hits += 1;
            }
        }
        // One in three secondary draws lands on Obstacle.
        assert!(obstacle_hits > 5 && obstacle_hits < 45, "got {}", obstacle_hits);
        assert!(director.stats().empty_category > 0);
    }

    #[test]
    fn gated_category_falls_back_to_any_difficulty() {
        let catalog = certain(EventCatalog::default().with(
            EventDefinition::new("thing", EventCategory::Atmospheric, EventDifficulty::Nightmare)
                .with_payload("thing")
                .with_duration(1.0),
        ));
        let mut director = EventDirector::new(always(0, 5), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();
        let events = director.on_segment_entered(&mut segment(0), 0.0, &mut sanity, &mut host);
        assert!(matches!(
            events[0],
            DirectorEvent::Triggered { definition: EventId(0), .. }
        ));
    }

    #[test]
    fn cap_blocks_second_instance() {
        let catalog = certain(EventCatalog::default().with(
            EventDefinition::new("fog", EventCategory::Atmospheric, EventDifficulty::Harmless)
                .with_payload("fog")
                .with_duration(30.0),
        ));
        let mut director = EventDirector::new(always(0, 1), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();

        director.on_segment_entered(&mut segment(0), 0.0, &mut sanity, &mut host);
        director.on_segment_entered(&mut segment(1), 1.0, &mut sanity, &mut host);
        assert_eq!(director.active_count(EventCategory::Atmospheric), 1);
        assert!(director.stats().capped >= 1);
    }

    #[test]
    fn spawn_point_used_when_requested() {
        let catalog = certain(EventCatalog::default().with(
            EventDefinition::new("figure", EventCategory::Atmospheric, EventDifficulty::Harmless)
                .with_payload("figure")
                .with_duration(3.0)
                .at_spawn_point(),
        ));
        let mut template = SegmentTemplate::straight(10.0);
        template.spawn_points.push(crate::schema::segment::SpawnPoint {
            kind: SpawnPointKind::Event,
            local: Pose::at(crate::schema::geometry::Vec3::new(4.0, 0.0, 6.0)),
        });
        let mut seg = Segment::from_template(&template, 0);
        seg.place(SegmentId(0), Pose::IDENTITY, None);

        let mut director = EventDirector::new(always(0, 1), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();
        director.on_segment_entered(&mut seg, 0.0, &mut sanity, &mut host);

        let active = director.active_events().next().unwrap();
        assert_eq!(
            active.position.position,
            crate::schema::geometry::Vec3::new(4.0, 0.0, 6.0)
        );
    }

    #[test]
    fn force_trigger_bypasses_cap_and_cooldown() {
        let catalog = EventCatalog::new(0.0, 0.0).with(
            EventDefinition::new("stalker", EventCategory::Creature, EventDifficulty::Nightmare)
                .with_payload("stalker")
                .self_managed(),
        );
        let mut director = EventDirector::new(always(10, 1), catalog);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::default();

        director.force_trigger(EventId(0), &mut segment(0), 0.0, &mut sanity, &mut host);
        director.force_trigger(EventId(0), &mut segment(1), 0.0, &mut sanity, &mut host);
        assert_eq!(director.active_count(EventCategory::Creature), 2);

        let none = director.force_trigger(EventId(9), &mut segment(2), 0.0, &mut sanity, &mut host);
        assert!(none.is_empty());

        let ended = director.clear_all(&mut host);
        assert_eq!(ended.len(), 2);
        assert_eq!(host.live_count(), 0);
        assert_eq!(director.total_active(), 0);
    }

    #[test]
    fn unspawned_payload_ends_at_once_and_frees_the_slot() {
        let catalog = certain(EventCatalog::default().with(
            EventDefinition::new("fog", EventCategory::Atmospheric, EventDifficulty::Harmless)
                .with_payload("fog")
                .with_duration(30.0),
        ));
        let mut director = EventDirector::new(always(0, 1), catalog);
        let mut host = RefusingHost::default();
        let mut sanity = SanityMeter::default();

        let first = director.on_segment_entered(&mut segment(0), 0.0, &mut sanity, &mut host);
        assert_eq!(first.len(), 2);
        assert!(matches!(first[0], DirectorEvent::Triggered { .. }));
        assert!(matches!(first[1], DirectorEvent::Ended { .. }));
        assert_eq!(director.active_count(EventCategory::Atmospheric), 0);

        let second = director.on_segment_entered(&mut segment(1), 1.0, &mut sanity, &mut host);
        assert!(matches!(second[0], DirectorEvent::Triggered { .. }));
        assert_eq!(director.stats().capped, 0);
        assert_eq!(host.attempts, 2);
    }

    #[test]
    fn non_finite_sanity_skips_the_roll() {
        let catalog = EventCatalog::new(0.0, 0.0).with(EventDefinition::new(
            "thing",
            EventCategory::Atmospheric,
            EventDifficulty::Nightmare,
        ));
        let mut director = EventDirector::new(always(0, 1), catalog);
        let mut host = HeadlessHost::new();

        assert_eq!(director.trigger_chance(None, f32::NAN), 0.0);
        assert_eq!(director.trigger_chance(Some(f32::NAN), 0.5), 0.0);

        for (i, bogus) in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY].into_iter().enumerate() {
            let mut seg = segment(i as u64);
            let events =
                director.on_segment_entered(&mut seg, 0.0, &mut FixedSanity(bogus), &mut host);
            assert!(events.is_empty());
            assert!(!seg.is_event_triggered());
        }
        assert_eq!(director.stats().skipped_invalid_sanity, 3);
        assert_eq!(director.stats().triggered, 0);
    }
}
