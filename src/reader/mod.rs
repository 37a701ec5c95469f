//! Reading scheduler
//!
//! Drives the periodic inference cycle: decides on each tick whether a
//! reading is due, dispatches at most one background task at a time, and
//! applies the completed result to the shared session state, history, and
//! the on-disk run log.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::capture::CapturedFrame;
use crate::shared::{Reading, SessionState};
use crate::storage::RunLog;
use crate::vision::client::encode_jpeg;
use crate::vision::{parse_reading, VisionBackend, VisionError};

/// Sentinel display text when no credential is configured
pub const NOT_CONFIGURED_TEXT: &str = "API key not set";

/// Maximum characters of an error message surfaced in the display text
const ERROR_DISPLAY_CHARS: usize = 30;

/// Periodic reading dispatcher.
///
/// At most one inference call is in flight at a time, gated by
/// `reading_in_progress` under the session guard. A dispatch attempt while
/// busy is silently skipped, never queued.
pub struct ReadingScheduler {
    session: Arc<Mutex<SessionState>>,
    backend: Arc<dyn VisionBackend>,
    run_log: Arc<RunLog>,
    interval: Duration,
}

impl ReadingScheduler {
    /// Create a scheduler over the given session state and backend
    pub fn new(
        session: Arc<Mutex<SessionState>>,
        backend: Arc<dyn VisionBackend>,
        run_log: Arc<RunLog>,
        interval: Duration,
    ) -> Self {
        Self {
            session,
            backend,
            run_log,
            interval,
        }
    }

    /// Shared session state handle
    pub fn session(&self) -> Arc<Mutex<SessionState>> {
        Arc::clone(&self.session)
    }

    /// Whether a dispatch attempt at `now` could go ahead. Lets the caller
    /// avoid cropping a region on ticks where nothing would be sent; only
    /// the main thread dispatches, so check-then-act is not a race.
    pub fn due(&self, now: Instant) -> bool {
        let session = self.session.lock();
        !session.reading_in_progress
            && now.saturating_duration_since(session.last_read_time) >= self.interval
    }

    /// Consider dispatching a reading of `region` at tick time `now`.
    ///
    /// Dispatches iff the interval has elapsed since the last reading and no
    /// reading is in flight. Returns whether a background task was started.
    /// Without a credential no task ever starts; the display degrades to the
    /// "not configured" sentinel instead.
    pub fn maybe_read(&self, region: &CapturedFrame, now: Instant) -> bool {
        {
            let mut session = self.session.lock();
            if session.reading_in_progress {
                return false;
            }
            if now.saturating_duration_since(session.last_read_time) < self.interval {
                return false;
            }
            if !self.backend.is_configured() {
                session.display_text = NOT_CONFIGURED_TEXT.to_string();
                return false;
            }
            session.reading_in_progress = true;
        }

        // Encoding happens outside the guard; it touches pixel data only.
        let jpeg = match encode_jpeg(region) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!("Skipping reading, region could not be encoded: {}", e);
                self.session.lock().reading_in_progress = false;
                return false;
            }
        };

        self.spawn_read(jpeg, now);
        true
    }

    /// Run one reading in a short-lived background task so the remote call's
    /// latency never stalls the render loop.
    fn spawn_read(&self, jpeg: Vec<u8>, dispatched_at: Instant) {
        let session = Arc::clone(&self.session);
        let backend = Arc::clone(&self.backend);
        let run_log = Arc::clone(&self.run_log);

        std::thread::spawn(move || {
            // Dropped last, so the flag is cleared on every exit path and
            // the next scheduled attempt is never blocked.
            let _busy = BusyClear(Arc::clone(&session));

            let outcome = backend.read_value(&jpeg);
            apply_outcome(&session, &run_log, outcome, dispatched_at);
        });
    }
}

/// Clears `reading_in_progress` when dropped
struct BusyClear(Arc<Mutex<SessionState>>);

impl Drop for BusyClear {
    fn drop(&mut self) {
        self.0.lock().reading_in_progress = false;
    }
}

/// Apply a completed inference outcome to the session state.
///
/// A parsed value updates the display, the in-memory history, and the run
/// log (the disk append happens outside the guard). A response with no
/// recognizable numeral is shown verbatim and recorded nowhere. An error
/// becomes a truncated display summary and leaves the schedule untouched,
/// so the next tick retries.
fn apply_outcome(
    session: &Mutex<SessionState>,
    run_log: &RunLog,
    outcome: Result<String, VisionError>,
    dispatched_at: Instant,
) {
    match outcome {
        Ok(raw) => {
            let parsed = parse_reading(&raw);
            let timestamp = Local::now();

            if let Some(value) = parsed.value {
                {
                    let mut state = session.lock();
                    state.display_text = format!("{} {}", value, parsed.unit.unwrap_or('C'));
                    state.last_read_time = dispatched_at;
                    state.history.record(Reading {
                        timestamp,
                        raw_text: raw.clone(),
                        value,
                        unit: parsed.unit,
                    });
                }

                if let Err(e) = run_log.append(timestamp, value, parsed.unit) {
                    warn!("Failed to log reading: {}", e);
                }
                info!("Reading: {}", raw);
            } else {
                // No numeral recognized. A normal outcome: show the raw
                // text, keep it out of history and the log.
                {
                    let mut state = session.lock();
                    state.display_text = raw.clone();
                    state.last_read_time = dispatched_at;
                }
                info!("No numeric reading recognized: {:?}", raw);
            }
        }
        Err(e) => {
            let summary: String = e.to_string().chars().take(ERROR_DISPLAY_CHARS).collect();
            session.lock().display_text = format!("Error: {}", summary);
            warn!("Reading failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex as StdMutex;

    /// Backend returning a fixed response
    struct FixedBackend(&'static str);

    impl VisionBackend for FixedBackend {
        fn is_configured(&self) -> bool {
            true
        }

        fn read_value(&self, _jpeg: &[u8]) -> Result<String, VisionError> {
            Ok(self.0.to_string())
        }
    }

    /// Backend with no credential
    struct UnconfiguredBackend;

    impl VisionBackend for UnconfiguredBackend {
        fn is_configured(&self) -> bool {
            false
        }

        fn read_value(&self, _jpeg: &[u8]) -> Result<String, VisionError> {
            Err(VisionError::MissingCredential)
        }
    }

    /// Backend that always fails
    struct FailingBackend;

    impl VisionBackend for FailingBackend {
        fn is_configured(&self) -> bool {
            true
        }

        fn read_value(&self, _jpeg: &[u8]) -> Result<String, VisionError> {
            Err(VisionError::Service(
                "HTTP 500: upstream exploded in a very long message".to_string(),
            ))
        }
    }

    /// Backend that blocks until released, to hold the busy flag
    struct BlockingBackend {
        release: StdMutex<mpsc::Receiver<()>>,
    }

    impl VisionBackend for BlockingBackend {
        fn is_configured(&self) -> bool {
            true
        }

        fn read_value(&self, _jpeg: &[u8]) -> Result<String, VisionError> {
            let _ = self.release.lock().unwrap().recv();
            Ok("22.5 C".to_string())
        }
    }

    fn test_region() -> CapturedFrame {
        CapturedFrame::new(vec![100; 16 * 16 * 3], 16, 16)
    }

    fn scheduler_with(
        backend: Arc<dyn VisionBackend>,
        interval: Duration,
        max_history: Option<usize>,
    ) -> (ReadingScheduler, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let run_log = Arc::new(RunLog::create(dir.path()).unwrap());
        let session = Arc::new(Mutex::new(SessionState::new(max_history, interval)));
        (
            ReadingScheduler::new(session, backend, run_log, interval),
            dir,
        )
    }

    /// Poll until the in-flight reading completes
    fn wait_idle(session: &Mutex<SessionState>) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while session.lock().reading_in_progress {
            assert!(Instant::now() < deadline, "reading never completed");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_ten_ticks_five_second_interval_yields_two_readings() {
        let (scheduler, dir) = scheduler_with(
            Arc::new(FixedBackend("22.5 C")),
            Duration::from_secs(5),
            None,
        );
        let session = scheduler.session();

        // 10 frames at 1 tick/second of simulated time
        let base = Instant::now();
        let region = test_region();
        let mut dispatched = 0;
        for i in 0..10u64 {
            if scheduler.maybe_read(&region, base + Duration::from_secs(i)) {
                dispatched += 1;
            }
            wait_idle(&session);
        }

        assert_eq!(dispatched, 2);
        let state = session.lock();
        let snap = state.history.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().all(|r| r.value == 22.5));
        assert_eq!(state.display_text, "22.5 C");
        drop(state);

        // One CSV row per reading plus the header
        let log = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let content = std::fs::read_to_string(log).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_unreadable_response_shows_sentinel_and_records_nothing() {
        let (scheduler, dir) = scheduler_with(
            Arc::new(FixedBackend("Unable to read")),
            Duration::from_secs(5),
            None,
        );
        let session = scheduler.session();

        let base = Instant::now();
        let region = test_region();
        for i in 0..10u64 {
            scheduler.maybe_read(&region, base + Duration::from_secs(i));
            wait_idle(&session);
        }

        let state = session.lock();
        assert_eq!(state.display_text, "Unable to read");
        assert!(state.history.is_empty());
        drop(state);

        let log = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let content = std::fs::read_to_string(log).unwrap();
        assert_eq!(content, "time,value,unit\n");
    }

    #[test]
    fn test_dispatch_while_busy_is_a_no_op() {
        let (tx, rx) = mpsc::channel();
        let backend = Arc::new(BlockingBackend {
            release: StdMutex::new(rx),
        });
        let (scheduler, _dir) = scheduler_with(backend, Duration::from_secs(5), None);
        let session = scheduler.session();

        let base = Instant::now();
        let region = test_region();
        assert!(scheduler.maybe_read(&region, base));
        assert!(session.lock().reading_in_progress);

        // Second attempt while the first is in flight: skipped, flag untouched
        assert!(!scheduler.maybe_read(&region, base + Duration::from_secs(60)));
        assert!(session.lock().reading_in_progress);

        tx.send(()).unwrap();
        wait_idle(&session);
        assert_eq!(session.lock().history.len(), 1);
    }

    #[test]
    fn test_missing_credential_degrades_to_sentinel() {
        let (scheduler, dir) =
            scheduler_with(Arc::new(UnconfiguredBackend), Duration::from_secs(5), None);
        let session = scheduler.session();

        assert!(!scheduler.maybe_read(&test_region(), Instant::now()));

        let state = session.lock();
        assert_eq!(state.display_text, NOT_CONFIGURED_TEXT);
        assert!(!state.reading_in_progress);
        assert!(state.history.is_empty());
        drop(state);

        let log = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        assert_eq!(std::fs::read_to_string(log).unwrap(), "time,value,unit\n");
    }

    #[test]
    fn test_error_shows_truncated_summary_and_clears_flag() {
        let (scheduler, _dir) =
            scheduler_with(Arc::new(FailingBackend), Duration::from_secs(5), None);
        let session = scheduler.session();

        assert!(scheduler.maybe_read(&test_region(), Instant::now()));
        wait_idle(&session);

        let state = session.lock();
        assert!(state.display_text.starts_with("Error: "));
        assert!(state.display_text.len() <= "Error: ".len() + ERROR_DISPLAY_CHARS);
        assert!(state.history.is_empty());
        assert!(!state.reading_in_progress);
    }

    #[test]
    fn test_history_cap_applies_through_scheduler() {
        let (scheduler, _dir) = scheduler_with(
            Arc::new(FixedBackend("30.0 C")),
            Duration::from_millis(0),
            Some(3),
        );
        let session = scheduler.session();

        let base = Instant::now();
        for i in 0..5u64 {
            assert!(scheduler.maybe_read(&test_region(), base + Duration::from_secs(i)));
            wait_idle(&session);
        }

        assert_eq!(session.lock().history.len(), 3);
    }

    #[test]
    fn test_interval_not_elapsed_skips_dispatch() {
        let (scheduler, _dir) = scheduler_with(
            Arc::new(FixedBackend("22.5 C")),
            Duration::from_secs(5),
            None,
        );
        let session = scheduler.session();

        let base = Instant::now();
        assert!(scheduler.maybe_read(&test_region(), base));
        wait_idle(&session);

        // 3 seconds later: not due yet
        assert!(!scheduler.maybe_read(&test_region(), base + Duration::from_secs(3)));
        assert_eq!(session.lock().history.len(), 1);
    }
}
