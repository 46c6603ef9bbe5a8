// Composite sequences: decay segments concatenated end to end

use std::collections::VecDeque;
use std::iter::{Repeat, Take};

use super::decay::{DivDecay, LinearDecay};

/// One piece of a composite sequence
#[derive(Debug, Clone)]
pub enum Segment {
    Linear(LinearDecay),
    Div(DivDecay),
    Constant(Take<Repeat<f64>>),
}

impl Segment {
    fn len(&self) -> usize {
        match self {
            Segment::Linear(s) => s.len(),
            Segment::Div(s) => s.len(),
            Segment::Constant(s) => s.len(),
        }
    }
}

impl Iterator for Segment {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        match self {
            Segment::Linear(s) => s.next(),
            Segment::Div(s) => s.next(),
            Segment::Constant(s) => s.next(),
        }
    }
}

impl From<LinearDecay> for Segment {
    fn from(segment: LinearDecay) -> Self {
        Segment::Linear(segment)
    }
}

impl From<DivDecay> for Segment {
    fn from(segment: DivDecay) -> Self {
        Segment::Div(segment)
    }
}

impl From<Take<Repeat<f64>>> for Segment {
    fn from(segment: Take<Repeat<f64>>) -> Self {
        Segment::Constant(segment)
    }
}

/// Flat sequence over several segments
///
/// Its length is the sum of the segment lengths. Nothing checks that this
/// matches the number of epochs; a shorter sequence simply runs out early.
#[derive(Debug, Clone, Default)]
pub struct Composite {
    segments: VecDeque<Segment>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment (builder style)
    pub fn then(mut self, segment: impl Into<Segment>) -> Self {
        self.segments.push_back(segment.into());
        self
    }
}

impl Iterator for Composite {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        while let Some(front) = self.segments.front_mut() {
            if let Some(value) = front.next() {
                return Some(value);
            }
            self.segments.pop_front();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.segments.iter().map(Segment::len).sum();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Composite {}
