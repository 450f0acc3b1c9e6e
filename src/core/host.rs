/// Seams to the embedding game: sanity state and payload lifecycle.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::schema::event::TriggerSound;
use crate::schema::geometry::Pose;

/// Source of the player's normalized sanity.
pub trait SanityProvider {
    /// Sanity in 0–1; 1.0 is fully sane.
    fn sanity_percent(&self) -> f32;

    /// Applies an event's sanity impact.
    fn reduce_sanity(&mut self, amount: f32);
}

/// A simple bounded sanity stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityMeter {
    pub current: f32,
    pub max: f32,
}

impl SanityMeter {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// A meter with `max` 1.0 starting at `percent`.
    pub fn at_percent(percent: f32) -> Self {
        Self {
            current: percent.clamp(0.0, 1.0),
            max: 1.0,
        }
    }

    pub fn restore(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
    }

    pub fn set_percent(&mut self, percent: f32) {
        self.current = percent.clamp(0.0, 1.0) * self.max;
    }
}

impl Default for SanityMeter {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl SanityProvider for SanityMeter {
    fn sanity_percent(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    fn reduce_sanity(&mut self, amount: f32) {
        self.current = (self.current - amount).clamp(0.0, self.max);
    }
}

/// Opaque reference to something the host spawned for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadHandle(pub u64);

/// Object lifecycle owned by the host (rendering, physics, audio).
///
/// The director never looks inside a payload; it only spawns it, asks
/// whether it still exists, and destroys it.
pub trait PayloadHost {
    /// Spawns `payload` at `at`. `None` means the host could not spawn it.
    fn instantiate(&mut self, payload: &str, at: Pose) -> Option<PayloadHandle>;

    fn is_alive(&self, handle: PayloadHandle) -> bool;

    fn destroy(&mut self, handle: PayloadHandle);

    fn play_sound(&mut self, _sound: &TriggerSound, _at: Pose) {}
}

/// In-memory host for tools and tests: payloads are just handles in a set.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    live: FxHashSet<PayloadHandle>,
    next_handle: u64,
    /// Payload keys in spawn order.
    pub spawned: Vec<String>,
    /// Sound clips in the order they were played.
    pub sounds: Vec<String>,
    pub destroyed: usize,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a payload destroying itself.
    pub fn expire(&mut self, handle: PayloadHandle) {
        self.live.remove(&handle);
    }

    /// Simulates every live payload destroying itself.
    pub fn expire_all(&mut self) {
        self.live.clear();
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_handles(&self) -> impl Iterator<Item = PayloadHandle> + '_ {
        self.live.iter().copied()
    }
}

impl PayloadHost for HeadlessHost {
    fn instantiate(&mut self, payload: &str, _at: Pose) -> Option<PayloadHandle> {
        let handle = PayloadHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle);
        self.spawned.push(payload.to_string());
        Some(handle)
    }

    fn is_alive(&self, handle: PayloadHandle) -> bool {
        self.live.contains(&handle)
    }

    fn destroy(&mut self, handle: PayloadHandle) {
        if self.live.remove(&handle) {
            self.destroyed += 1;
        }
    }

    fn play_sound(&mut self, sound: &TriggerSound, _at: Pose) {
        self.sounds.push(sound.clip.clone());
    }
}
