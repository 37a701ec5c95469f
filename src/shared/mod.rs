//! Session state shared between the UI tick and background readings
//!
//! Everything a background inference task touches lives in [`SessionState`]
//! behind one `parking_lot::Mutex`. Every access, including single-field
//! reads, goes through the guard; critical sections contain no I/O so the
//! render path is never stalled behind a lock holder.

pub mod history;

use std::time::Instant;

pub use history::{History, Reading};

/// Display text shown before the first reading completes
pub const NO_READING_TEXT: &str = "No reading";

/// Mutable session fields shared with background reading tasks.
///
/// - `display_text` and `last_read_time` are written by the completion path
///   and read by the render path.
/// - `reading_in_progress` gates dispatch: at most one inference call is in
///   flight, and an attempt while busy is silently skipped.
#[derive(Debug)]
pub struct SessionState {
    /// Latest reading formatted for display, or a sentinel string
    pub display_text: String,
    /// When the last reading completed; dispatch is scheduled from this
    pub last_read_time: Instant,
    /// Whether a background inference task is outstanding
    pub reading_in_progress: bool,
    /// Retained valid readings, in completion order
    pub history: History,
}

impl SessionState {
    /// Create session state that is immediately eligible for a first
    /// reading: `last_read_time` is backdated by the given interval.
    pub fn new(max_history: Option<usize>, interval: std::time::Duration) -> Self {
        Self {
            display_text: NO_READING_TEXT.to_string(),
            last_read_time: Instant::now()
                .checked_sub(interval)
                .unwrap_or_else(Instant::now),
            reading_in_progress: false,
            history: History::new(max_history),
        }
    }
}
