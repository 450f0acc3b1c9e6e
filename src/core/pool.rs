/// Recycling pool for segment instances, one free list per segment type.

use rustc_hash::FxHashMap;

use crate::schema::segment::{Segment, SegmentTemplate, SegmentType};

/// Free lists of inactive segment instances keyed by type.
///
/// Capacity is unbounded and nothing is evicted; reuse is LIFO so the most
/// recently released instance of a type comes back first.
#[derive(Debug, Default)]
pub struct SegmentPool {
    free: FxHashMap<SegmentType, Vec<Segment>>,
    next_instance: u64,
    created: u64,
    reused: u64,
}

impl SegmentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes an instance of the template's type, creating one if the free
    /// list is empty. A reused instance is re-shaped to `template`.
    pub fn acquire(&mut self, template: &SegmentTemplate) -> Segment {
        if let Some(mut segment) = self
            .free
            .get_mut(&template.segment_type)
            .and_then(Vec::pop)
        {
            segment.configure(template);
            self.reused += 1;
            return segment;
        }
        self.instantiate(template)
    }

    /// Returns an instance to its type's free list, clearing per-visit state.
    pub fn release(&mut self, mut segment: Segment) {
        segment.reset();
        self.free
            .entry(segment.segment_type())
            .or_default()
            .push(segment);
    }

    /// Creates `count` instances of the template straight into the free list.
    pub fn prewarm(&mut self, template: &SegmentTemplate, count: usize) {
        for _ in 0..count {
            let segment = self.instantiate(template);
            self.release(segment);
        }
    }

    /// Number of inactive instances waiting for reuse.
    pub fn available(&self, segment_type: SegmentType) -> usize {
        self.free.get(&segment_type).map_or(0, Vec::len)
    }

    pub fn total_available(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Instances ever created by this pool.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Acquisitions served from a free list.
    pub fn reused(&self) -> u64 {
        self.reused
    }

    /// Drops every pooled instance.
    pub fn clear(&mut self) {
        self.free.clear();
    }

    fn instantiate(&mut self, template: &SegmentTemplate) -> Segment {
        let segment = Segment::from_template(template, self.next_instance);
        self.next_instance += 1;
        self.created += 1;
        segment
    }
}
