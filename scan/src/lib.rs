//! Scan coordination for the media backend.
//!
//! A scan is a backend-side discovery run of unknown duration. The coordinator
//! triggers it, then polls the media list on a fixed interval until the scan
//! budget elapses, the caller cancels, or polling keeps failing.

use api_client::{ApiClientError, GalleryBackend, MediaItem, ScanAck};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Duration, Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_POLL_FAILURES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub poll_interval: Duration,
    pub scan_timeout: Duration,
    /// Consecutive failed polls tolerated before the loop gives up. Zero is treated as one.
    pub max_consecutive_failures: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            max_consecutive_failures: DEFAULT_MAX_POLL_FAILURES,
        }
    }
}

/// Monotonic numbering for media-list requests.
///
/// Every list fetch takes a number when it is issued, so whoever applies the
/// results can drop a response that was overtaken by a newer request.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence(Arc<AtomicU64>);

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStop {
    TimedOut,
    Cancelled,
    Aborted { failures: u32 },
}

#[derive(Debug, Clone)]
pub enum ScanEvent {
    Triggered(ScanAck),
    /// A poll returned a non-empty list. Empty polls are not reported.
    Polled { seq: u64, items: Vec<MediaItem> },
    PollFailed { consecutive: u32, error: String },
    Finished(ScanStop),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    #[error("A scan is already running")]
    AlreadyRunning,
    #[error("Scan failed to start: {0}")]
    Trigger(#[from] ApiClientError),
}

struct ScanningGuard(Arc<AtomicBool>);

impl Drop for ScanningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to a running poll loop.
///
/// All clones share one stop signal. Cancelling through any clone, or dropping
/// the last clone, ends the loop.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    stop: Arc<watch::Sender<bool>>,
    outcome: watch::Receiver<Option<ScanStop>>,
}

impl ScanHandle {
    pub fn cancel(&self) {
        // Fails only once the loop is gone, which is what we want anyway.
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Wait until the loop ends and report why. `None` if the task died without reporting.
    pub async fn wait(&self) -> Option<ScanStop> {
        let mut outcome = self.outcome.clone();
        let stop = match outcome.wait_for(|o| o.is_some()).await {
            Ok(stop) => (*stop).clone(),
            Err(_) => None,
        };
        stop
    }
}

pub struct ScanCoordinator {
    backend: Arc<dyn GalleryBackend>,
    settings: ScanSettings,
    sequence: RequestSequence,
    scanning: Arc<AtomicBool>,
}

impl ScanCoordinator {
    pub fn new(backend: Arc<dyn GalleryBackend>, settings: ScanSettings) -> Self {
        Self {
            backend,
            settings,
            sequence: RequestSequence::new(),
            scanning: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a request sequence with other media-list fetchers.
    pub fn with_sequence(mut self, sequence: RequestSequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn sequence(&self) -> &RequestSequence {
        &self.sequence
    }

    pub fn settings(&self) -> ScanSettings {
        self.settings
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Trigger a backend scan and spawn the poll loop.
    ///
    /// If the trigger request fails, no loop is started and the scanning flag
    /// is already clear when this returns.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, events)))]
    pub async fn start(
        &self,
        events: mpsc::UnboundedSender<ScanEvent>,
    ) -> Result<ScanHandle, ScanError> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ScanError::AlreadyRunning);
        }
        let guard = ScanningGuard(self.scanning.clone());

        tracing::info!("Triggering backend scan...");
        let ack = match self.backend.trigger_scan().await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::error!(error = %e, "Scan trigger failed");
                return Err(ScanError::Trigger(e));
            }
        };
        tracing::info!(status = ?ack.status, message = ?ack.message, "Scan started");
        if let Err(e) = events.send(ScanEvent::Triggered(ack)) {
            tracing::debug!("Scan event receiver gone: {}", e);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (outcome_tx, outcome_rx) = watch::channel(None);
        tokio::spawn(poll_loop(
            self.backend.clone(),
            self.settings,
            self.sequence.clone(),
            events,
            stop_rx,
            outcome_tx,
            guard,
        ));

        Ok(ScanHandle {
            stop: Arc::new(stop_tx),
            outcome: outcome_rx,
        })
    }
}

async fn poll_loop(
    backend: Arc<dyn GalleryBackend>,
    settings: ScanSettings,
    sequence: RequestSequence,
    events: mpsc::UnboundedSender<ScanEvent>,
    mut stop_rx: watch::Receiver<bool>,
    outcome_tx: watch::Sender<Option<ScanStop>>,
    guard: ScanningGuard,
) {
    let max_failures = settings.max_consecutive_failures.max(1);
    let mut ticker = interval_at(
        Instant::now() + settings.poll_interval,
        settings.poll_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = sleep(settings.scan_timeout);
    tokio::pin!(deadline);

    let mut failures = 0u32;
    let mut polls = 0u64;

    // A closed stop channel means every handle was dropped; that is a cancel too.
    let stop = loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break ScanStop::Cancelled,
            _ = &mut deadline => break ScanStop::TimedOut,
            _ = ticker.tick() => {}
        }

        let seq = sequence.next();
        polls += 1;
        let result = tokio::select! {
            biased;
            _ = stop_rx.changed() => break ScanStop::Cancelled,
            _ = &mut deadline => break ScanStop::TimedOut,
            result = backend.list_media() => result,
        };

        match result {
            Ok(items) => {
                failures = 0;
                if items.is_empty() {
                    tracing::debug!(seq, "Poll returned no media yet");
                    continue;
                }
                tracing::debug!(seq, count = items.len(), "Poll returned media");
                if events.send(ScanEvent::Polled { seq, items }).is_err() {
                    tracing::debug!("Scan event receiver gone");
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(error = %e, consecutive = failures, "Poll failed");
                let _ = events.send(ScanEvent::PollFailed {
                    consecutive: failures,
                    error: e.to_string(),
                });
                if failures >= max_failures {
                    break ScanStop::Aborted { failures };
                }
            }
        }
    };

    drop(guard);
    tracing::info!(?stop, polls, "Scan polling stopped");
    outcome_tx.send_replace(Some(stop.clone()));
    let _ = events.send(ScanEvent::Finished(stop));
}
