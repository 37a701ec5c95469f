//! Reading history retained for charting
//!
//! An insertion-ordered sequence of valid readings, optionally capped to a
//! fixed window with FIFO eviction. Ordering is completion order: requests
//! are asynchronous, so it is not necessarily monotonic with capture time.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// One parsed numeric observation
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Wall-clock time the inference completed
    pub timestamp: DateTime<Local>,
    /// Trimmed response text the value was extracted from
    pub raw_text: String,
    /// Parsed numeric value
    pub value: f64,
    /// Optional one-letter unit indicator
    pub unit: Option<char>,
}

/// Ordered history of readings with an optional entry cap
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Reading>,
    /// Maximum retained entries; `None` keeps everything
    max_entries: Option<usize>,
}

impl History {
    /// Create a history with the given cap (`None` = unbounded)
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Append a reading in completion order, evicting the oldest entries
    /// once the cap is exceeded.
    pub fn record(&mut self, reading: Reading) {
        self.entries.push_back(reading);
        if let Some(cap) = self.max_entries {
            while self.entries.len() > cap {
                self.entries.pop_front();
            }
        }
    }

    /// Point-in-time copy for rendering, so the chart never walks the live
    /// sequence while a completion is appending to it.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained readings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no readings have been retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unit letter of the most recent reading that carried one
    pub fn latest_unit(&self) -> Option<char> {
        self.entries.iter().rev().find_map(|r| r.unit)
    }
}
