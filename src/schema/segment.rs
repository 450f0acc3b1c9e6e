use serde::{Deserialize, Serialize};

use super::geometry::{Pose, Vec3};

/// The kind of road piece. Each type has its own template and pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    Straight,
    SlightLeft,
    SlightRight,
    Overpass,
    Underpass,
    Bridge,
    Tunnel,
    RestStop,
    Intersection,
}

impl SegmentType {
    pub const ALL: [SegmentType; 9] = [
        Self::Straight,
        Self::SlightLeft,
        Self::SlightRight,
        Self::Overpass,
        Self::Underpass,
        Self::Bridge,
        Self::Tunnel,
        Self::RestStop,
        Self::Intersection,
    ];

    /// Types drawn by the special bucket of the spawn-type roll.
    pub const SPECIAL: [SegmentType; 6] = [
        Self::Overpass,
        Self::Underpass,
        Self::Bridge,
        Self::Tunnel,
        Self::RestStop,
        Self::Intersection,
    ];

    pub fn is_curve(&self) -> bool {
        matches!(self, Self::SlightLeft | Self::SlightRight)
    }

    pub fn is_special(&self) -> bool {
        !self.is_curve() && *self != Self::Straight
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::SlightLeft => "slight_left",
            Self::SlightRight => "slight_right",
            Self::Overpass => "overpass",
            Self::Underpass => "underpass",
            Self::Bridge => "bridge",
            Self::Tunnel => "tunnel",
            Self::RestStop => "rest_stop",
            Self::Intersection => "intersection",
        }
    }
}

/// Runtime index of a placed segment, assigned in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// What a spawn point is meant to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnPointKind {
    Prop,
    Event,
    Item,
}

/// A designated placement marker, local to the segment origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub kind: SpawnPointKind,
    pub local: Pose,
}

/// Authoring-time description of one segment type: its length, the local
/// poses of its entry and exit markers, and its spawn-point layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    pub segment_type: SegmentType,
    pub length: f32,
    /// Entry marker relative to the instance origin.
    #[serde(default)]
    pub entry: Pose,
    /// Exit marker relative to the instance origin.
    pub exit: Pose,
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
    #[serde(default = "default_allow_events")]
    pub allow_events: bool,
    /// Replaces the catalog-wide trigger chance for this segment type.
    #[serde(default)]
    pub trigger_chance: Option<f32>,
}

fn default_allow_events() -> bool {
    true
}

impl SegmentTemplate {
    /// A straight piece of the given length with its entry at the origin.
    pub fn straight(length: f32) -> Self {
        Self {
            segment_type: SegmentType::Straight,
            length,
            entry: Pose::IDENTITY,
            exit: Pose::at(Vec3::new(0.0, 0.0, length)),
            spawn_points: Vec::new(),
            allow_events: true,
            trigger_chance: None,
        }
    }
}

/// A placed (or pooled) road segment instance.
#[derive(Debug, Clone)]
pub struct Segment {
    pub(crate) id: SegmentId,
    pub(crate) instance_id: u64,
    pub(crate) segment_type: SegmentType,
    pub(crate) length: f32,
    pub(crate) local_entry: Pose,
    pub(crate) local_exit: Pose,
    pub(crate) origin: Pose,
    pub(crate) entry: Pose,
    pub(crate) exit: Pose,
    pub(crate) spawn_points: Vec<SpawnPoint>,
    pub(crate) previous: Option<SegmentId>,
    pub(crate) visited: bool,
    pub(crate) event_triggered: bool,
    pub(crate) allow_events: bool,
    pub(crate) trigger_chance: Option<f32>,
}

impl Segment {
    /// Builds a fresh, unplaced instance from a template.
    pub(crate) fn from_template(template: &SegmentTemplate, instance_id: u64) -> Self {
        Self {
            id: SegmentId(0),
            instance_id,
            segment_type: template.segment_type,
            length: template.length,
            local_entry: template.entry,
            local_exit: template.exit,
            origin: Pose::IDENTITY,
            entry: template.entry,
            exit: template.exit,
            spawn_points: template.spawn_points.clone(),
            previous: None,
            visited: false,
            event_triggered: false,
            allow_events: template.allow_events,
            trigger_chance: template.trigger_chance,
        }
    }

    /// Re-shapes a pooled instance to another variant of its type.
    pub(crate) fn configure(&mut self, template: &SegmentTemplate) {
        self.segment_type = template.segment_type;
        self.length = template.length;
        self.local_entry = template.entry;
        self.local_exit = template.exit;
        self.spawn_points.clone_from(&template.spawn_points);
        self.allow_events = template.allow_events;
        self.trigger_chance = template.trigger_chance;
    }

    /// Moves the instance so its entry marker sits exactly on `entry`.
    pub(crate) fn place(&mut self, id: SegmentId, entry: Pose, previous: Option<SegmentId>) {
        self.id = id;
        self.origin = entry.compose(&self.local_entry.inverse());
        self.entry = entry;
        self.exit = self.origin.compose(&self.local_exit);
        self.previous = previous;
        self.visited = false;
        self.event_triggered = false;
    }

    /// Clears per-visit state and detaches the instance from the chain.
    pub(crate) fn reset(&mut self) {
        self.previous = None;
        self.visited = false;
        self.event_triggered = false;
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Identity of the underlying pooled instance; survives recycling.
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn origin(&self) -> Pose {
        self.origin
    }

    pub fn entry(&self) -> Pose {
        self.entry
    }

    pub fn exit(&self) -> Pose {
        self.exit
    }

    pub fn previous(&self) -> Option<SegmentId> {
        self.previous
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn is_event_triggered(&self) -> bool {
        self.event_triggered
    }

    pub fn allows_events(&self) -> bool {
        self.allow_events
    }

    pub fn trigger_chance_override(&self) -> Option<f32> {
        self.trigger_chance
    }

    pub(crate) fn mark_visited(&mut self) {
        self.visited = true;
    }

    pub(crate) fn mark_event_triggered(&mut self) {
        self.event_triggered = true;
    }

    /// Distance of `point` along the entry marker's forward axis.
    pub fn distance_along(&self, point: Vec3) -> f32 {
        self.entry.inverse_transform_point(point).z
    }

    /// True when `point` projects into `[0, length]` along the entry forward axis.
    pub fn contains(&self, point: Vec3) -> bool {
        let d = self.distance_along(point);
        (0.0..=self.length).contains(&d)
    }

    /// World-space pose of a spawn point.
    pub fn spawn_point_pose(&self, point: &SpawnPoint) -> Pose {
        self.origin.compose(&point.local)
    }

    /// World-space poses of every spawn point of the given kind.
    pub fn spawn_poses(&self, kind: SpawnPointKind) -> Vec<Pose> {
        self.spawn_points
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| self.spawn_point_pose(p))
            .collect()
    }
}
