use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use bus::{Subject, Subscription};
use core_types::{LoadingStatus, RequestId};
use net::{FetchConfig, Fetcher, HttpFetcher, NetError, decode_text};
use url::Url;

use crate::pending::{PendingGuard, PendingRequests};
use crate::result::FetchResult;

/// What to do with a body that is not valid UTF-8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Publish `Failure(NetError::Decode)`.
    #[default]
    Surface,
    /// Publish no result for that fetch. Status still returns to idle.
    Ignore,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerConfig {
    pub decode_policy: DecodePolicy,
    /// Drop completions of every request but the most recent one.
    ///
    /// Off by default: every completion publishes and the last one to finish
    /// wins, even if it was started earlier.
    pub supersede_stale: bool,
}

struct Shared {
    fetcher: Arc<dyn Fetcher>,
    config: ManagerConfig,
    status: Subject<LoadingStatus>,
    result: Subject<FetchResult>,
    pending: PendingRequests,
    next_id: AtomicU64,
    latest: AtomicU64,
}

/// Fetches pages and publishes a loading flag and the latest outcome.
///
/// `refresh` returns immediately. The GET runs on its own worker thread, and
/// the completion publishes from that thread: subscribers that care about
/// which thread they run on must dispatch themselves.
///
/// Workers only hold a weak reference to the manager. Once it is dropped,
/// in-flight fetches still run to the end but publish nothing.
pub struct FetchManager {
    shared: Arc<Shared>,
}

impl FetchManager {
    pub fn new(fetcher: impl Fetcher) -> Self {
        Self::with_config(fetcher, ManagerConfig::default())
    }

    pub fn with_config(fetcher: impl Fetcher, config: ManagerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher: Arc::new(fetcher),
                config,
                status: Subject::new(LoadingStatus::Idle),
                result: Subject::new(FetchResult::Empty),
                pending: PendingRequests::new(),
                next_id: AtomicU64::new(1),
                latest: AtomicU64::new(0),
            }),
        }
    }

    /// Manager over a real HTTP client.
    pub fn http(fetch: FetchConfig, config: ManagerConfig) -> Result<Self, NetError> {
        Ok(Self::with_config(HttpFetcher::new(fetch)?, config))
    }

    pub fn config(&self) -> ManagerConfig {
        self.shared.config
    }

    pub fn status(&self) -> LoadingStatus {
        self.shared.status.current()
    }

    pub fn subscribe_status(&self) -> Subscription<LoadingStatus> {
        self.shared.status.subscribe()
    }

    pub fn result(&self) -> FetchResult {
        self.shared.result.current()
    }

    pub fn subscribe_result(&self) -> Subscription<FetchResult> {
        self.shared.result.subscribe()
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.shared.pending
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }

    /// Start fetching `url`. Status is `Loading` by the time this returns.
    ///
    /// Failures never come back from here; they arrive on the result stream.
    pub fn refresh(&self, url: Url) -> RequestId {
        let shared = &self.shared;
        shared.status.publish(LoadingStatus::Loading);

        let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
        shared.latest.fetch_max(id, Ordering::AcqRel);
        let guard = shared.pending.register(id, url.clone());
        log::debug!(target: "runtime_net", "refresh #{id}: {url}");

        let weak = Arc::downgrade(shared);
        let fetcher = Arc::clone(&shared.fetcher);
        let worker_url = url.clone();
        let spawned = thread::Builder::new()
            .name(format!("fetch-{id}"))
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| fetcher.get(&worker_url)))
                    .unwrap_or_else(|_| Err(NetError::Aborted("fetch worker panicked".into())));
                complete(&weak, guard, worker_url, outcome);
            });

        if let Err(e) = spawned {
            // The closure, and the guard with it, is already gone.
            log::warn!(target: "runtime_net", "refresh #{id}: cannot spawn worker: {e}");
            shared.finish(id, url, Err(NetError::Aborted(format!("cannot spawn worker: {e}"))));
        }
        id
    }
}

fn complete(
    weak: &Weak<Shared>,
    guard: PendingGuard,
    url: Url,
    outcome: Result<Vec<u8>, NetError>,
) {
    let id = guard.id();
    let outcome = outcome.and_then(decode_text);
    // Gone from the pending map before anyone can observe the outcome.
    if let Some(entry) = guard.release() {
        log::debug!(
            target: "runtime_net",
            "request #{id} done after {} ms",
            entry.started.elapsed().as_millis()
        );
    }
    match weak.upgrade() {
        Some(shared) => shared.finish(id, url, outcome),
        None => log::debug!(target: "runtime_net", "request #{id}: manager dropped, discarding"),
    }
}

impl Shared {
    fn finish(&self, id: RequestId, url: Url, outcome: Result<String, NetError>) {
        if self.config.supersede_stale && self.latest.load(Ordering::Acquire) != id {
            log::debug!(target: "runtime_net", "request #{id}: superseded, discarding");
            return;
        }

        match outcome {
            Ok(text) => self.result.publish(FetchResult::Success { text, url }),
            Err(err) if err.is_decode() && self.config.decode_policy == DecodePolicy::Ignore => {
                log::debug!(target: "runtime_net", "request #{id}: ignoring undecodable body from {url}");
            }
            Err(err) => {
                log::warn!(target: "runtime_net", "request #{id}: {url}: {err}");
                self.result.publish(FetchResult::Failure(err));
            }
        }
        // Idle goes out last so a status subscriber can read the new result.
        self.status.publish(LoadingStatus::Idle);
    }
}
