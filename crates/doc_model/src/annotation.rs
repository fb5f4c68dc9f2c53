//! Inline annotations over line content
//!
//! Annotations are char ranges carried along with the text they cover while
//! lines are edited, wrapped and split.

use serde::{Deserialize, Serialize};

/// Kind of inline formatting an annotation applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    Bold,
    Italic,
    Underline,
    /// Arbitrary CSS class
    Class(String),
}

/// A half-open char range `[start, end)` carrying an annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(start: usize, end: usize, kind: AnnotationKind) -> Self {
        Self { start, end, kind }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Adjust for `count` chars inserted at `offset`.
    ///
    /// Insertion strictly inside the range extends it; insertion at or before
    /// the start shifts it.
    pub fn shift_for_insert(&mut self, offset: usize, count: usize) {
        if offset <= self.start {
            self.start += count;
            self.end += count;
        } else if offset < self.end {
            self.end += count;
        }
    }

    /// Adjust for the removal of `[start, end)`
    pub fn shift_for_remove(&mut self, start: usize, end: usize) {
        let removed = end - start;
        let map = |x: usize| {
            if x <= start {
                x
            } else if x >= end {
                x - removed
            } else {
                start
            }
        };
        self.start = map(self.start);
        self.end = map(self.end);
    }

    /// The part of this annotation inside `[start, end)`, relative to `start`
    pub fn clip(&self, start: usize, end: usize) -> Option<Annotation> {
        let s = self.start.max(start);
        let e = self.end.min(end);
        if s >= e {
            return None;
        }
        Some(Annotation::new(s - start, e - start, self.kind.clone()))
    }
}
