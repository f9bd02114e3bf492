//! Monitoring sessions.
//!
//! A session repeats the capture/OCR pipeline on a timer and keeps the last
//! few results. Each session is one tokio task with its own history; the
//! `SessionManager` only maps session ids to their handles.
//!
//! Ticks within a session never overlap: a slow recognition delays the next
//! tick and intervals missed in the meantime are skipped. Stopping a session
//! cancels future ticks; an in-flight tick finishes but its result is dropped.

pub mod csv_writer;
pub mod session;

pub use session::{HISTORY_CAPACITY, History, HistoryEntry, SessionEvent};

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};
use crate::pipeline::{CaptureRequest, Pipeline};

pub const MIN_INTERVAL_MS: u64 = 1_000;
pub const MAX_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_INTERVAL_MS: u64 = 5_000;

/// Upper bound on a single tick, so a hung recognizer cannot stall a session.
const TICK_TIMEOUT: Duration = Duration::from_secs(120);

/// Buffered session events per subscriber before old ones are dropped.
const EVENT_BUFFER: usize = 64;

/// Checks that a monitoring interval is within [1000, 60000] ms.
pub fn validate_interval(interval_ms: u64) -> Result<Duration> {
    if (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&interval_ms) {
        Ok(Duration::from_millis(interval_ms))
    } else {
        Err(PipelineError::InvalidInterval(interval_ms))
    }
}

/// Handle to a running session, owned by the manager.
struct SessionHandle {
    interval: Duration,
    cancel: CancellationToken,
    history: Arc<Mutex<History>>,
    // Detached on stop: the task exits on its own once cancelled
    _task: JoinHandle<()>,
}

/// State moved into a session's task.
struct SessionWorker {
    session_id: String,
    interval: Duration,
    request: CaptureRequest,
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
    history: Arc<Mutex<History>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Owns every monitoring session's timer and history.
pub struct SessionManager {
    pipeline: Arc<Pipeline>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            pipeline,
            sessions: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Starts (or restarts) a session.
    ///
    /// An already-active session with the same id is cancelled first and its
    /// history discarded. The first tick runs immediately, then one per
    /// interval. Must be called from within a tokio runtime.
    pub fn start(
        &self,
        session_id: impl Into<String>,
        interval_ms: u64,
        request: CaptureRequest,
    ) -> Result<()> {
        let interval = validate_interval(interval_ms)?;
        let session_id = session_id.into();

        let mut sessions = self.lock_sessions();
        if let Some(previous) = sessions.remove(&session_id) {
            info!("Session {}: restarting, cancelling previous timer", session_id);
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let history = Arc::new(Mutex::new(History::default()));
        let worker = SessionWorker {
            session_id: session_id.clone(),
            interval,
            request,
            pipeline: Arc::clone(&self.pipeline),
            cancel: cancel.clone(),
            history: Arc::clone(&history),
            events: self.events.clone(),
        };

        info!(
            "Session {}: monitoring {} every {}ms",
            session_id,
            worker.request.source.describe(),
            interval.as_millis()
        );
        let task = tokio::spawn(worker.run());

        sessions.insert(
            session_id,
            SessionHandle {
                interval,
                cancel,
                history,
                _task: task,
            },
        );
        Ok(())
    }

    /// Stops a session. Returns false if it was not active.
    pub fn stop(&self, session_id: &str) -> bool {
        match self.lock_sessions().remove(session_id) {
            Some(handle) => {
                handle.cancel.cancel();
                info!("Session {}: stopped", session_id);
                true
            }
            None => {
                debug!("Session {}: stop requested but not active", session_id);
                false
            }
        }
    }

    /// Stops every session.
    pub fn stop_all(&self) {
        let mut sessions = self.lock_sessions();
        for (session_id, handle) in sessions.drain() {
            handle.cancel.cancel();
            info!("Session {}: stopped", session_id);
        }
    }

    /// Ids of the active sessions, sorted.
    pub fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock_sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.lock_sessions().contains_key(session_id)
    }

    pub fn interval(&self, session_id: &str) -> Option<Duration> {
        self.lock_sessions().get(session_id).map(|h| h.interval)
    }

    /// Snapshot of a session's history, oldest first.
    pub fn history(&self, session_id: &str) -> Option<Vec<HistoryEntry>> {
        self.lock_sessions()
            .get(session_id)
            .map(|h| lock(&h.history).snapshot())
    }

    /// Receives an event for every successful tick of every session.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, SessionHandle>> {
        lock(&self.sessions)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionWorker {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Session {}: timer loop exiting", self.session_id);
                    break;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// Runs the pipeline once. Failures are logged and the session continues.
    async fn tick(&self) {
        let analysis =
            match tokio::time::timeout(TICK_TIMEOUT, self.pipeline.analyze(&self.request)).await {
                Ok(Ok(analysis)) => analysis,
                Ok(Err(e)) => {
                    warn!("Session {}: tick failed: {}", self.session_id, e);
                    return;
                }
                Err(_) => {
                    warn!(
                        "Session {}: tick timed out after {}s",
                        self.session_id,
                        TICK_TIMEOUT.as_secs()
                    );
                    return;
                }
            };

        if self.cancel.is_cancelled() {
            debug!(
                "Session {}: discarding result of tick that finished after stop",
                self.session_id
            );
            return;
        }

        let entry = HistoryEntry {
            fields: analysis.fields,
            raw_text: analysis.text,
            timestamp: analysis.captured_at,
        };
        info!(
            "Session {}: total={:?} percentage={:?}",
            self.session_id, entry.fields.total, entry.fields.percentage
        );

        lock(&self.history).push(entry.clone());
        // No subscribers is fine
        let _ = self.events.send(SessionEvent {
            session_id: self.session_id.clone(),
            entry,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ImageSource;
    use crate::pipeline::AnalysisSettings;
    use crate::test_support::{FakeRecognizer, FakeScreen};

    fn manager(recognizer: Arc<FakeRecognizer>) -> SessionManager {
        let settings = AnalysisSettings {
            default_crop: None,
            upscale: 1,
            threshold: None,
        };
        let pipeline = Pipeline::new(Arc::new(FakeScreen::new(32, 24)), recognizer, settings);
        SessionManager::new(Arc::new(pipeline))
    }

    fn request() -> CaptureRequest {
        CaptureRequest::new(ImageSource::display(None))
    }

    fn totals(entries: &[HistoryEntry]) -> Vec<u64> {
        entries.iter().filter_map(|e| e.fields.total).collect()
    }

    #[test]
    fn test_validate_interval() {
        assert!(matches!(validate_interval(500), Err(PipelineError::InvalidInterval(500))));
        assert!(matches!(validate_interval(60_001), Err(PipelineError::InvalidInterval(_))));
        assert_eq!(validate_interval(1_000).unwrap(), Duration::from_secs(1));
        assert_eq!(validate_interval(5_000).unwrap(), Duration::from_secs(5));
        assert_eq!(validate_interval(60_000).unwrap(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejects_bad_interval() {
        let recognizer = Arc::new(FakeRecognizer::new("1 [ 1 %"));
        let manager = manager(recognizer.clone());

        let err = manager.start("exp", 500, request()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInterval(500)));
        assert!(manager.active_sessions().is_empty());

        manager.start("exp", 5_000, request()).unwrap();
        assert_eq!(manager.active_sessions(), vec!["exp".to_string()]);
        assert_eq!(manager.interval("exp"), Some(Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let recognizer = Arc::new(FakeRecognizer::new("7 [ 7 %"));
        let manager = manager(recognizer.clone());

        manager.start("exp", 60_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(recognizer.calls(), 1);
        assert_eq!(totals(&manager.history("exp").unwrap()), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_keeps_latest_ten_after_fifteen_ticks() {
        let recognizer = Arc::new(FakeRecognizer::new("{n} [ 50 %"));
        let manager = manager(recognizer.clone());

        manager.start("exp", 1_000, request()).unwrap();
        // Ticks at 0s, 1s, ..., 14s
        tokio::time::sleep(Duration::from_millis(14_500)).await;

        assert_eq!(recognizer.calls(), 15);
        let history = manager.history("exp").unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(totals(&history), (5..15).collect::<Vec<_>>());
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_leaves_single_timer() {
        let recognizer = Arc::new(FakeRecognizer::new("{n} [ 50 %"));
        let manager = manager(recognizer.clone());

        manager.start("exp", 1_000, request()).unwrap();
        manager.start("exp", 1_000, request()).unwrap();
        assert_eq!(manager.active_sessions(), vec!["exp".to_string()]);

        // One timer ticks at 0s, 1s, 2s, 3s; a duplicate would double the calls
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(recognizer.calls(), 4);
        assert_eq!(manager.history("exp").unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_clears_history() {
        let recognizer = Arc::new(FakeRecognizer::new("{n} [ 50 %"));
        let manager = manager(recognizer.clone());

        manager.start("exp", 1_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(manager.history("exp").unwrap().len(), 3);

        manager.start("exp", 5_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let history = manager.history("exp").unwrap();
        assert_eq!(totals(&history), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_keeps_session_running() {
        let recognizer = Arc::new(FakeRecognizer::with_script(
            "",
            vec![
                Ok("1 [ 1 %".to_string()),
                Err(PipelineError::RecognitionFailed("engine crashed".to_string())),
                Ok("3 [ 3 %".to_string()),
            ],
        ));
        let manager = manager(recognizer.clone());

        manager.start("exp", 1_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        // Second tick has failed by now
        assert_eq!(recognizer.calls(), 2);
        assert!(manager.is_active("exp"));

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(manager.is_active("exp"));
        assert_eq!(totals(&manager.history("exp").unwrap()), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_failure_keeps_session_running() {
        let recognizer = Arc::new(FakeRecognizer::new("1 [ 1 %"));
        let pipeline = Pipeline::new(
            Arc::new(FakeScreen::failing()),
            recognizer.clone(),
            AnalysisSettings::default(),
        );
        let manager = SessionManager::new(Arc::new(pipeline));

        manager.start("exp", 1_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert!(manager.is_active("exp"));
        assert!(manager.history("exp").unwrap().is_empty());
        assert_eq!(recognizer.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_halts_ticks() {
        let recognizer = Arc::new(FakeRecognizer::new("{n} [ 50 %"));
        let manager = manager(recognizer.clone());

        assert!(!manager.stop("missing"));

        manager.start("exp", 1_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(recognizer.calls(), 2);

        assert!(manager.stop("exp"));
        assert!(!manager.stop("exp"));
        assert!(manager.active_sessions().is_empty());
        assert!(manager.history("exp").is_none());

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(recognizer.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_discarded_after_stop() {
        let recognizer =
            Arc::new(FakeRecognizer::new("9 [ 9 %").with_delay(Duration::from_millis(3_000)));
        let manager = manager(recognizer.clone());
        let mut events = manager.subscribe();

        manager.start("exp", 1_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(recognizer.calls(), 1);

        manager.stop("exp");
        tokio::time::sleep(Duration::from_millis(5_000)).await;

        // The in-flight recognition completed but produced no event
        assert_eq!(recognizer.calls(), 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_recognition_does_not_overlap_ticks() {
        let recognizer =
            Arc::new(FakeRecognizer::new("{n} [ 50 %").with_delay(Duration::from_millis(2_500)));
        let manager = manager(recognizer.clone());

        manager.start("exp", 1_000, request()).unwrap();
        // Back-to-back ticks start at 0s, 2.5s, 5s, 7.5s
        tokio::time::sleep(Duration::from_millis(9_000)).await;

        assert_eq!(recognizer.calls(), 4);
        assert_eq!(recognizer.max_in_flight(), 1);
        assert_eq!(totals(&manager.history("exp").unwrap()), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_are_independent() {
        let recognizer = Arc::new(FakeRecognizer::new("{n} [ 50 %"));
        let manager = manager(recognizer.clone());
        let mut events = manager.subscribe();

        manager.start("fast", 1_000, request()).unwrap();
        manager
            .start("slow", 5_000, CaptureRequest::new(ImageSource::window(4)))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert_eq!(manager.active_sessions(), vec!["fast".to_string(), "slow".to_string()]);
        assert_eq!(manager.history("fast").unwrap().len(), 3);
        assert_eq!(manager.history("slow").unwrap().len(), 1);

        manager.stop("fast");
        assert!(manager.is_active("slow"));

        let mut received = 0;
        while let Ok(event) = events.try_recv() {
            assert!(event.session_id == "fast" || event.session_id == "slow");
            received += 1;
        }
        assert_eq!(received, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_sessions() {
        let recognizer = Arc::new(FakeRecognizer::new("1 [ 1 %"));
        let manager = manager(recognizer.clone());

        manager.start("exp", 1_000, request()).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(manager);

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(recognizer.calls(), 1);
    }
}
