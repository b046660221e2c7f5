use crate::Fraction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a span of time from begin to end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: Fraction,
    pub end: Fraction,
}

impl TimeSpan {
    /// Create a new timespan
    pub fn new(begin: Fraction, end: Fraction) -> Self {
        TimeSpan { begin, end }
    }

    /// Create a timespan from two integers (whole numbers)
    pub fn from_ints(begin: i64, end: i64) -> Self {
        TimeSpan {
            begin: Fraction::from_int(begin),
            end: Fraction::from_int(end),
        }
    }

    /// Create a timespan from two floats
    pub fn from_floats(begin: f64, end: f64) -> Self {
        TimeSpan {
            begin: Fraction::from_float(begin),
            end: Fraction::from_float(end),
        }
    }

    /// Get the duration of this timespan
    pub fn duration(&self) -> Fraction {
        self.end - self.begin
    }

    /// Check if this timespan contains a point in time
    pub fn contains(&self, time: Fraction) -> bool {
        time >= self.begin && time < self.end
    }

    /// Check if two timespans overlap
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Get the intersection of two timespans, if any
    pub fn intersection(&self, other: &TimeSpan) -> Option<TimeSpan> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeSpan::new(
            self.begin.max(other.begin),
            self.end.min(other.end),
        ))
    }

    /// Get the midpoint of the timespan
    pub fn midpoint(&self) -> Fraction {
        (self.begin + self.end) * Fraction::new(1, 2)
    }

    /// Check if the timespan is empty (begin == end)
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Shift the timespan by an offset
    pub fn shift(&self, offset: Fraction) -> TimeSpan {
        TimeSpan::new(self.begin + offset, self.end + offset)
    }

    /// Scale the timespan by a factor
    pub fn scale(&self, factor: Fraction) -> TimeSpan {
        TimeSpan::new(self.begin * factor, self.end * factor)
    }

    /// True if `begin` falls exactly on an integer cycle boundary.
    pub fn is_cycle_aligned(&self) -> bool {
        self.begin == self.begin.floor()
    }

    /// Split this span at every integer cycle boundary it crosses,
    /// yielding one sub-span per cycle it touches.
    ///
    /// `span_cycles((0.5, 2.5))` yields `[(0.5,1), (1,2), (2,2.5)]`.
    pub fn span_cycles(&self) -> Vec<TimeSpan> {
        if self.begin >= self.end {
            return if self.begin == self.end {
                vec![*self]
            } else {
                Vec::new()
            };
        }

        let mut spans = Vec::new();
        let mut begin = self.begin;
        while begin < self.end {
            let next_cycle = begin.floor() + Fraction::from_int(1);
            let end = next_cycle.min(self.end);
            spans.push(TimeSpan::new(begin, end));
            begin = end;
        }
        spans
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.begin, self.end)
    }
}
