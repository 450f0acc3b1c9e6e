use serde::{Deserialize, Serialize};

/// Broad kind of an event. Categories are tracked separately, so an
/// atmospheric cue can run alongside a creature encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Atmospheric,
    Creature,
    Obstacle,
    Apparition,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        Self::Atmospheric,
        Self::Creature,
        Self::Obstacle,
        Self::Apparition,
    ];

    /// Categories eligible for the secondary draw after the atmospheric one.
    pub const SECONDARY: [EventCategory; 3] = [Self::Creature, Self::Obstacle, Self::Apparition];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Atmospheric => "atmospheric",
            Self::Creature => "creature",
            Self::Obstacle => "obstacle",
            Self::Apparition => "apparition",
        }
    }
}

/// How severe an event is. Ordered from mildest to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventDifficulty {
    Harmless,
    Unsettling,
    Dangerous,
    Terrifying,
    Nightmare,
}

impl EventDifficulty {
    pub const ALL: [EventDifficulty; 5] = [
        Self::Harmless,
        Self::Unsettling,
        Self::Dangerous,
        Self::Terrifying,
        Self::Nightmare,
    ];

    /// Numeric level 0–4 used for weighting.
    pub fn level(&self) -> u8 {
        match self {
            Self::Harmless => 0,
            Self::Unsettling => 1,
            Self::Dangerous => 2,
            Self::Terrifying => 3,
            Self::Nightmare => 4,
        }
    }
}

/// Index of a definition inside its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub usize);

/// Sound cue fired once when an event triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSound {
    pub clip: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Played at the event position rather than on the listener.
    #[serde(default)]
    pub spatial: bool,
}

fn default_volume() -> f32 {
    1.0
}

/// Static description of an event the director may trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    pub category: EventCategory,
    pub difficulty: EventDifficulty,
    /// Opaque key the host instantiates. `None` means a pure signal/sound.
    #[serde(default)]
    pub payload: Option<String>,
    /// Spawn at a random event spawn point instead of the segment origin.
    #[serde(default)]
    pub use_spawn_point: bool,
    /// Sanity removed once when the event triggers.
    #[serde(default)]
    pub sanity_impact: f32,
    /// Seconds; 0 means instantaneous or self-terminating.
    #[serde(default)]
    pub duration: f32,
    /// The payload ends the event by destroying itself.
    #[serde(default)]
    pub self_managed: bool,
    #[serde(default)]
    pub sound: Option<TriggerSound>,
}

impl EventDefinition {
    pub fn new(name: &str, category: EventCategory, difficulty: EventDifficulty) -> Self {
        Self {
            name: name.to_string(),
            category,
            difficulty,
            payload: None,
            use_spawn_point: false,
            sanity_impact: 0.0,
            duration: 0.0,
            self_managed: false,
            sound: None,
        }
    }

    pub fn with_payload(mut self, payload: &str) -> Self {
        self.payload = Some(payload.to_string());
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = seconds;
        self
    }

    pub fn self_managed(mut self) -> Self {
        self.self_managed = true;
        self
    }

    pub fn with_sanity_impact(mut self, impact: f32) -> Self {
        self.sanity_impact = impact;
        self
    }

    pub fn at_spawn_point(mut self) -> Self {
        self.use_spawn_point = true;
        self
    }

    pub fn with_sound(mut self, clip: &str) -> Self {
        self.sound = Some(TriggerSound {
            clip: clip.to_string(),
            volume: 1.0,
            spatial: true,
        });
        self
    }

    /// How an instance of this definition reaches its end.
    pub fn end_policy(&self) -> EndPolicy {
        if self.payload.is_none() {
            EndPolicy::Immediate
        } else if self.self_managed || self.duration <= 0.0 {
            EndPolicy::WhenPayloadGone
        } else {
            EndPolicy::AfterDuration(self.duration)
        }
    }
}

/// Lifetime rule for an active event instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndPolicy {
    /// Nothing was spawned; the event ends as soon as it starts.
    Immediate,
    /// Ends once the host reports the payload destroyed.
    WhenPayloadGone,
    /// Ends when `now - spawned_at >= duration`.
    AfterDuration(f32),
}
