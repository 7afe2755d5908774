//! Half-open query window and interval clipping.
//!
//! Every duration-based KPI reduces to clipping stored intervals against a
//! `[T0, T1)` window; the correctness of [`Window::clip`] defines the
//! correctness of the whole analytics layer.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Window end precedes its start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("window end {end} precedes start {start}")]
pub struct InvalidWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Window {
    /// Build a window. Zero-length windows are allowed; `end < start` is not.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, InvalidWindow> {
        if end < start {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Window length [s].
    #[inline]
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// Whether `t` lies inside the window (start-inclusive, end-exclusive).
    ///
    /// This is the test behind start-based incident counting: an interval
    /// belongs to the window iff its start does.
    #[inline]
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    /// Effective duration [s] of `[start, end)` clipped to this window:
    /// `max(0, min(end, T1) − max(start, T0))`.
    ///
    /// Disjoint intervals yield zero.
    #[inline]
    pub fn clip(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        (hi - lo).num_seconds().max(0)
    }
}
