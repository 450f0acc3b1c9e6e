/// Content catalogs: segment templates and event definitions, loaded once
/// at startup from RON or assembled in code.

use log::warn;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::schema::event::{EventCategory, EventDefinition, EventDifficulty, EventId};
use crate::schema::segment::{SegmentTemplate, SegmentType};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid catalog entry: {0}")]
    Invalid(String),
}

/// Registered segment templates keyed by type. A type may carry several
/// variants; they share one pool.
#[derive(Debug, Clone, Default)]
pub struct SegmentCatalog {
    templates: FxHashMap<SegmentType, Vec<SegmentTemplate>>,
}

impl SegmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template as another variant of its type.
    pub fn register(&mut self, template: SegmentTemplate) {
        self.templates
            .entry(template.segment_type)
            .or_default()
            .push(template);
    }

    pub fn with(mut self, template: SegmentTemplate) -> Self {
        self.register(template);
        self
    }

    /// First registered variant of a type.
    pub fn get(&self, segment_type: SegmentType) -> Option<&SegmentTemplate> {
        self.variants(segment_type).first()
    }

    pub fn variants(&self, segment_type: SegmentType) -> &[SegmentTemplate] {
        self.templates
            .get(&segment_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, segment_type: SegmentType) -> bool {
        !self.variants(segment_type).is_empty()
    }

    /// Number of registered templates across all types.
    pub fn len(&self) -> usize {
        self.templates.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn types(&self) -> impl Iterator<Item = SegmentType> + '_ {
        SegmentType::ALL
            .into_iter()
            .filter(move |t| self.contains(*t))
    }

    pub fn templates(&self) -> impl Iterator<Item = &SegmentTemplate> {
        self.templates.values().flatten()
    }

    /// Variants for `segment_type`, substituting Straight when the type has
    /// none. Returns `None` only if Straight is missing too.
    pub fn resolve(&self, segment_type: SegmentType) -> Option<&[SegmentTemplate]> {
        if self.contains(segment_type) {
            return Some(self.variants(segment_type));
        }
        if segment_type != SegmentType::Straight {
            warn!(
                "no template registered for {}, falling back to straight",
                segment_type.name()
            );
        }
        Some(self.variants(SegmentType::Straight)).filter(|v| !v.is_empty())
    }

    /// Appends every template of `other` as further variants.
    pub fn merge(&mut self, other: SegmentCatalog) {
        for (_, variants) in other.templates {
            for template in variants {
                self.register(template);
            }
        }
    }

    /// Load a segment catalog from a RON file containing a list of templates.
    pub fn load_from_ron(path: &Path) -> Result<SegmentCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a segment catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<SegmentCatalog, CatalogError> {
        let templates: Vec<SegmentTemplate> = ron::from_str(input)?;
        let mut catalog = SegmentCatalog::new();
        for template in templates {
            if !(template.length > 0.0) {
                return Err(CatalogError::Invalid(format!(
                    "{} template has non-positive length {}",
                    template.segment_type.name(),
                    template.length
                )));
            }
            if let Some(chance) = template.trigger_chance {
                if !(0.0..=1.0).contains(&chance) {
                    return Err(CatalogError::Invalid(format!(
                        "{} trigger chance {} outside [0, 1]",
                        template.segment_type.name(),
                        chance
                    )));
                }
            }
            catalog.register(template);
        }
        Ok(catalog)
    }
}

/// Event definitions plus the catalog-wide trigger parameters.
///
/// The by-category and by-difficulty indices are built by [`EventCatalog::build`]
/// once every definition is registered. Registering invalidates them.
#[derive(Debug, Clone)]
pub struct EventCatalog {
    definitions: Vec<EventDefinition>,
    /// Chance (0–1) of an event on an eligible segment at full sanity.
    pub base_chance: f32,
    /// Extra chance added at zero sanity, scaled linearly in between.
    pub sanity_bonus: f32,
    by_category: FxHashMap<EventCategory, Vec<EventId>>,
    by_difficulty: FxHashMap<EventDifficulty, Vec<EventId>>,
    built: bool,
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::new(0.3, 0.4)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "EventCatalog")]
struct RonEventCatalog {
    #[serde(default = "default_base_chance")]
    base_chance: f32,
    #[serde(default = "default_sanity_bonus")]
    sanity_bonus: f32,
    events: Vec<EventDefinition>,
}

fn default_base_chance() -> f32 {
    0.3
}

fn default_sanity_bonus() -> f32 {
    0.4
}

impl EventCatalog {
    pub fn new(base_chance: f32, sanity_bonus: f32) -> Self {
        Self {
            definitions: Vec::new(),
            base_chance,
            sanity_bonus,
            by_category: FxHashMap::default(),
            by_difficulty: FxHashMap::default(),
            built: false,
        }
    }

    pub fn register(&mut self, definition: EventDefinition) -> EventId {
        let id = EventId(self.definitions.len());
        self.definitions.push(definition);
        self.built = false;
        id
    }

    pub fn with(mut self, definition: EventDefinition) -> Self {
        self.register(definition);
        self
    }

    /// Builds the lookup indices. Cheap to call again; a no-op when current.
    pub fn build(&mut self) {
        if self.built {
            return;
        }
        self.by_category.clear();
        self.by_difficulty.clear();
        for (i, def) in self.definitions.iter().enumerate() {
            self.by_category.entry(def.category).or_default().push(EventId(i));
            self.by_difficulty
                .entry(def.difficulty)
                .or_default()
                .push(EventId(i));
        }
        self.built = true;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn get(&self, id: EventId) -> Option<&EventDefinition> {
        self.definitions.get(id.0)
    }

    /// Finds a definition by display name.
    pub fn find(&self, name: &str) -> Option<EventId> {
        self.definitions
            .iter()
            .position(|d| d.name == name)
            .map(EventId)
    }

    pub fn definitions(&self) -> &[EventDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in `category`. Empty until [`EventCatalog::build`] runs.
    pub fn by_category(&self, category: EventCategory) -> &[EventId] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Definitions at exactly `difficulty`. Empty until built.
    pub fn by_difficulty(&self, difficulty: EventDifficulty) -> &[EventId] {
        self.by_difficulty
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Load an event catalog from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<EventCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse an event catalog from a RON string. The result is already built.
    pub fn parse_ron(input: &str) -> Result<EventCatalog, CatalogError> {
        let raw: RonEventCatalog = ron::from_str(input)?;
        for (name, value) in [("base_chance", raw.base_chance), ("sanity_bonus", raw.sanity_bonus)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CatalogError::Invalid(format!(
                    "{} {} outside [0, 1]",
                    name, value
                )));
            }
        }

        let mut catalog = EventCatalog::new(raw.base_chance, raw.sanity_bonus);
        for def in raw.events {
            if def.duration < 0.0 {
                return Err(CatalogError::Invalid(format!(
                    "event '{}' has negative duration",
                    def.name
                )));
            }
            catalog.register(def);
        }
        catalog.build();
        Ok(catalog)
    }

    /// Merge another catalog's definitions into this one. Trigger parameters
    /// of `self` are kept.
    pub fn merge(&mut self, other: EventCatalog) {
        for def in other.definitions {
            self.register(def);
        }
    }
}
