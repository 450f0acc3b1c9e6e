/// Ordered window of active segments, oldest at the head.

use std::collections::VecDeque;

use crate::schema::segment::{Segment, SegmentId};

/// Active segments in spawn order. Appends at the tail and removals at the
/// head are O(1).
#[derive(Debug, Default)]
pub struct ActiveWindow {
    segments: VecDeque<Segment>,
}

impl ActiveWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, segment: Segment) {
        self.segments.push_back(segment);
    }

    pub fn pop_front(&mut self) -> Option<Segment> {
        self.segments.pop_front()
    }

    pub fn front(&self) -> Option<&Segment> {
        self.segments.front()
    }

    pub fn back(&self) -> Option<&Segment> {
        self.segments.back()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Position of a segment within the window.
    ///
    /// Ids are assigned in spawn order, so the window is sorted by id.
    pub fn position(&self, id: SegmentId) -> Option<usize> {
        self.segments.binary_search_by_key(&id, |s| s.id()).ok()
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.position(id).map(|i| &self.segments[i])
    }

    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.position(id).map(move |i| &mut self.segments[i])
    }

    pub fn at(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }
}
