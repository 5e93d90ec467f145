use std::{
    collections::{BTreeSet, HashMap},
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc},
    thread::{self, JoinHandle},
};

use log::{debug, warn};

use super::achievement::Achievement;

/// Failures reported by a [`SaveStore`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("store I/O failed: {_0}")]
    Io(io::Error),
    #[display("store record could not be encoded: {_0}")]
    Encoding(serde_json::Error),
    #[display("store unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err)
    }
}

/// The external save collaborator: a blob store keyed by principal.
pub trait SaveStore: Send + 'static {
    /// Stores `blob` for `principal`, replacing any previous save.
    fn save(&mut self, principal: &str, blob: &str) -> Result<(), StoreError>;

    /// Returns the most recent save for `principal`, or `None` if there is
    /// none.
    fn load(&mut self, principal: &str) -> Result<Option<String>, StoreError>;

    /// Records an achievement code for `principal`. Unlocking twice is not
    /// an error.
    fn unlock_achievement(&mut self, principal: &str, code: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    saves: HashMap<String, String>,
    achievements: HashMap<String, BTreeSet<String>>,
    unavailable: bool,
}

/// In-process [`SaveStore`]. Clones share the same contents, so a test can
/// keep one handle while the bridge's worker owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn saved(&self, principal: &str) -> Option<String> {
        self.lock().saves.get(principal).cloned()
    }

    #[must_use]
    pub fn achievements(&self, principal: &str) -> BTreeSet<String> {
        self.lock()
            .achievements
            .get(principal)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every following request fail, or succeed again.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn check_available(inner: &MemoryStoreInner) -> Result<(), StoreError> {
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_owned()));
        }
        Ok(())
    }
}

impl SaveStore for MemoryStore {
    fn save(&mut self, principal: &str, blob: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;
        inner.saves.insert(principal.to_owned(), blob.to_owned());
        Ok(())
    }

    fn load(&mut self, principal: &str) -> Result<Option<String>, StoreError> {
        let inner = self.lock();
        Self::check_available(&inner)?;
        Ok(inner.saves.get(principal).cloned())
    }

    fn unlock_achievement(&mut self, principal: &str, code: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;
        inner
            .achievements
            .entry(principal.to_owned())
            .or_default()
            .insert(code.to_owned());
        Ok(())
    }
}

#[derive(Debug)]
enum Request {
    Save(String),
    Load,
    Unlock(Achievement),
}

/// Completion of a request, as seen by the frame callback.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum BridgeEvent {
    Saved,
    SaveFailed,
    /// The store answered a load; `None` means nothing was saved yet.
    Loaded(Option<String>),
    LoadFailed,
}

/// Sends save, load and achievement requests to a [`SaveStore`] running on
/// a worker thread.
///
/// Nothing here blocks the caller: requests are queued, and completions are
/// collected with [`poll`](Self::poll) from the frame callback. At most one
/// save is outstanding at a time.
#[derive(Debug)]
pub struct PersistenceBridge {
    principal: String,
    tx: Option<mpsc::Sender<Request>>,
    rx: mpsc::Receiver<BridgeEvent>,
    worker: Option<JoinHandle<()>>,
    save_in_flight: bool,
}

impl PersistenceBridge {
    /// Starts the worker thread for `principal`.
    pub fn spawn<S>(principal: impl Into<String>, store: S) -> io::Result<Self>
    where
        S: SaveStore,
    {
        let principal = principal.into();
        let (tx_request, rx_request) = mpsc::channel();
        let (tx_event, rx_event) = mpsc::channel();
        let worker = thread::Builder::new().name("lcdtris-store".to_owned()).spawn({
            let principal = principal.clone();
            move || store_thread(store, &principal, &rx_request, &tx_event)
        })?;
        Ok(Self {
            principal,
            tx: Some(tx_request),
            rx: rx_event,
            worker: Some(worker),
            save_in_flight: false,
        })
    }

    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    #[must_use]
    pub fn is_save_in_flight(&self) -> bool {
        self.save_in_flight
    }

    /// Queues a save of `blob`. Returns `false` without queueing anything
    /// when a previous save has not completed yet.
    pub fn request_save(&mut self, blob: String) -> bool {
        if self.save_in_flight {
            debug!("save skipped: previous save still in flight");
            return false;
        }
        self.save_in_flight = self.send(Request::Save(blob));
        self.save_in_flight
    }

    pub fn request_load(&mut self) {
        self.send(Request::Load);
    }

    /// Fire-and-forget; no completion is reported.
    pub fn notify_achievement(&mut self, achievement: Achievement) {
        self.send(Request::Unlock(achievement));
    }

    /// Drains completions that arrived since the last call.
    pub fn poll(&mut self) -> Vec<BridgeEvent> {
        let events: Vec<_> = self.rx.try_iter().collect();
        if events
            .iter()
            .any(|event| event.is_saved() || event.is_save_failed())
        {
            self.save_in_flight = false;
        }
        events
    }

    /// Queues a final save regardless of any save in flight, then waits for
    /// the worker to drain its queue.
    pub fn close_with_save(mut self, blob: String) {
        self.send(Request::Save(blob));
        self.close();
    }

    /// Waits for the worker to finish every queued request.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.tx = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("store worker panicked");
        }
    }

    fn send(&mut self, request: Request) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        if tx.send(request).is_err() {
            warn!("store worker is gone; request dropped");
            return false;
        }
        true
    }
}

impl Drop for PersistenceBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn store_thread<S>(
    mut store: S,
    principal: &str,
    rx: &mpsc::Receiver<Request>,
    tx: &mpsc::Sender<BridgeEvent>,
) where
    S: SaveStore,
{
    for request in rx {
        let event = match request {
            Request::Save(blob) => match store.save(principal, &blob) {
                Ok(()) => {
                    debug!("saved game for {principal}");
                    BridgeEvent::Saved
                }
                Err(err) => {
                    warn!("save failed for {principal}: {err}");
                    BridgeEvent::SaveFailed
                }
            },
            Request::Load => match store.load(principal) {
                Ok(blob) => BridgeEvent::Loaded(blob),
                Err(err) => {
                    warn!("load failed for {principal}: {err}");
                    BridgeEvent::LoadFailed
                }
            },
            Request::Unlock(achievement) => {
                match store.unlock_achievement(principal, achievement.code()) {
                    Ok(()) => debug!("achievement {} unlocked for {principal}", achievement.code()),
                    Err(err) => warn!("achievement {} failed for {principal}: {err}", achievement.code()),
                }
                continue;
            }
        };
        // The receiving side may already be gone during shutdown.
        _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn wait_for_events(bridge: &mut PersistenceBridge, count: usize) -> Vec<BridgeEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = vec![];
        while events.len() < count && Instant::now() < deadline {
            events.extend(bridge.poll());
            thread::sleep(Duration::from_millis(1));
        }
        events
    }

    #[test]
    fn test_load_without_save_is_empty() {
        let mut bridge = PersistenceBridge::spawn("ann", MemoryStore::new()).unwrap();
        bridge.request_load();
        assert_eq!(wait_for_events(&mut bridge, 1), vec![BridgeEvent::Loaded(None)]);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let mut bridge = PersistenceBridge::spawn("ann", store.clone()).unwrap();
        assert!(bridge.request_save("blob-1".to_owned()));
        assert!(bridge.is_save_in_flight());
        assert!(!bridge.request_save("blob-2".to_owned()));

        assert_eq!(wait_for_events(&mut bridge, 1), vec![BridgeEvent::Saved]);
        assert!(!bridge.is_save_in_flight());
        assert_eq!(store.saved("ann").as_deref(), Some("blob-1"));

        bridge.request_load();
        assert_eq!(
            wait_for_events(&mut bridge, 1),
            vec![BridgeEvent::Loaded(Some("blob-1".to_owned()))]
        );
    }

    #[test]
    fn test_failures_clear_in_flight_guard() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let mut bridge = PersistenceBridge::spawn("ann", store.clone()).unwrap();
        assert!(bridge.request_save("blob".to_owned()));
        bridge.request_load();
        assert_eq!(
            wait_for_events(&mut bridge, 2),
            vec![BridgeEvent::SaveFailed, BridgeEvent::LoadFailed]
        );
        assert!(!bridge.is_save_in_flight());
        assert_eq!(store.saved("ann"), None);
    }

    #[test]
    fn test_close_flushes_queued_requests() {
        let store = MemoryStore::new();
        let mut bridge = PersistenceBridge::spawn("bob", store.clone()).unwrap();
        bridge.notify_achievement(Achievement::Tetris);
        bridge.notify_achievement(Achievement::Tetris);
        assert!(bridge.request_save("early".to_owned()));
        bridge.close_with_save("final".to_owned());

        assert_eq!(store.saved("bob").as_deref(), Some("final"));
        assert_eq!(
            store.achievements("bob").into_iter().collect::<Vec<_>>(),
            vec!["TETRIS".to_owned()]
        );
    }
}
