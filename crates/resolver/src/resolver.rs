//! Resolver lifecycle: debounced scan passes on a dedicated thread.

use crate::optical::{OpticalEngine, OpticalGate};
use crate::scanner::CandidateScanner;
use crate::selectors::host_prefers_optical;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sublens_events::SubtitleObservation;
use sublens_surface::SurfaceProvider;

/// Coalescing window: a burst of change notifications triggers one scan.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(150);

/// Consecutive structural misses after which the optical fallback is
/// forced regardless of allowlist or rejected-candidate hints.
pub const OPTICAL_MISS_THRESHOLD: u32 = 2;

/// How often the scan thread re-checks the running flag while idle.
const IDLE_POLL: Duration = Duration::from_millis(200);

/// Callback type for resolved-line events.
pub type ObservationCallback = Arc<dyn Fn(SubtitleObservation) + Send + Sync + 'static>;

type ListenerList = Arc<Mutex<Vec<ObservationCallback>>>;

/// Cloneable entry point for change notifications.
///
/// Whatever watches the surface for structural mutations pumps them in
/// here; the resolver debounces and scans. A notification arriving while
/// the queue is full is dropped (the pending scan will see the same
/// surface state anyway).
#[derive(Clone)]
pub struct ResolverHandle {
    tx: Sender<()>,
}

impl ResolverHandle {
    pub fn notify_change(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Resolves the current subtitle line on a dedicated thread.
pub struct SubtitleResolver {
    listeners: ListenerList,
    running: Arc<AtomicBool>,
    tx: Sender<()>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl SubtitleResolver {
    /// Begin observing. Scan passes are strictly sequential; the debounce
    /// window prevents overlap.
    pub fn start(provider: Arc<dyn SurfaceProvider>, engine: Arc<dyn OpticalEngine>) -> Self {
        let (tx, rx) = bounded::<()>(64);
        let running = Arc::new(AtomicBool::new(true));
        let listeners: ListenerList = Arc::new(Mutex::new(Vec::new()));

        let thread_running = Arc::clone(&running);
        let thread_listeners = Arc::clone(&listeners);
        let handle = std::thread::spawn(move || {
            tracing::info!("subtitle resolver started");
            let scanner = CandidateScanner::new(provider);
            run_loop(rx, thread_running, scanner, engine, thread_listeners);
            tracing::info!("subtitle resolver stopped");
        });

        Self {
            listeners,
            running,
            tx,
            handle: Some(handle),
        }
    }

    /// Register a callback invoked whenever the resolved line changes.
    /// Listeners registered after observations began miss the earlier ones.
    pub fn on_observation(&self, listener: ObservationCallback) {
        self.listeners
            .lock()
            .expect("resolver listener mutex poisoned")
            .push(listener);
    }

    /// Handle for delivering change notifications.
    pub fn handle(&self) -> ResolverHandle {
        ResolverHandle {
            tx: self.tx.clone(),
        }
    }

    /// Tear down the scan thread and cooldown state.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && self.handle.is_some()
    }
}

impl Drop for SubtitleResolver {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ScanState {
    last_emitted: Option<String>,
    misses: u32,
    gate: OpticalGate,
}

fn run_loop(
    rx: Receiver<()>,
    running: Arc<AtomicBool>,
    scanner: CandidateScanner,
    engine: Arc<dyn OpticalEngine>,
    listeners: ListenerList,
) {
    let mut state = ScanState {
        last_emitted: None,
        misses: 0,
        gate: OpticalGate::new(),
    };

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(()) => {
                // Coalesce the burst: keep absorbing notifications until
                // the surface has been quiet for one debounce window.
                while rx.recv_timeout(DEBOUNCE_WINDOW).is_ok() {}
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                scan_pass(&scanner, engine.as_ref(), &mut state, &listeners);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// One pass over the fallback chain.
fn scan_pass(
    scanner: &CandidateScanner,
    engine: &dyn OpticalEngine,
    state: &mut ScanState,
    listeners: &ListenerList,
) {
    let scan = scanner.scan();

    if let Some(best) = scan.best {
        state.misses = 0;
        let surrounding: Vec<String> = scan
            .runners_up
            .iter()
            .take(2)
            .map(|candidate| candidate.text.clone())
            .collect();
        let surrounding = (!surrounding.is_empty()).then(|| surrounding.join(" / "));
        emit(state, listeners, &best.text, surrounding, Some(best.rect));
        return;
    }

    state.misses += 1;
    tracing::debug!(misses = state.misses, "structural scan missed");

    if let Some(cue) = scanner.cue_text() {
        emit(state, listeners, &cue, None, None);
        return;
    }

    if let Some(announcement) = scanner.live_region_text() {
        emit(state, listeners, &announcement, None, None);
        return;
    }

    let forced = state.misses > OPTICAL_MISS_THRESHOLD;
    let provider = scanner.provider();
    if forced
        || host_prefers_optical(provider.host().as_deref())
        || scan.best_rejected_score > 0.0
    {
        if let Some(text) = state.gate.try_recognize(provider.as_ref(), engine, forced) {
            emit(state, listeners, &text, None, None);
        }
    }
}

/// Emit an observation unless it duplicates the last emitted line.
fn emit(
    state: &mut ScanState,
    listeners: &ListenerList,
    text: &str,
    surrounding_context: Option<String>,
    bounding_rect: Option<sublens_surface::Rect>,
) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    if state.last_emitted.as_deref() == Some(trimmed) {
        return;
    }
    state.last_emitted = Some(trimmed.to_string());

    tracing::debug!(text = trimmed, "subtitle observed");
    let observation = SubtitleObservation {
        text: trimmed.to_string(),
        surrounding_context,
        bounding_rect,
    };
    let listeners = listeners
        .lock()
        .expect("resolver listener mutex poisoned")
        .clone();
    for listener in listeners {
        listener(observation.clone());
    }
}
