use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use core_types::RequestId;
use url::Url;

/// Bookkeeping for one in-flight fetch.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    pub url: Url,
    pub started: Instant,
}

type Map = HashMap<RequestId, PendingRequest>;

fn lock(map: &Mutex<Map>) -> MutexGuard<'_, Map> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Every fetch that has been started and not yet completed, keyed by id.
///
/// Entries only come in through [`register`](Self::register) and only leave
/// through the returned [`PendingGuard`], so an entry can never be removed by
/// another request's completion.
#[derive(Clone, Debug, Default)]
pub struct PendingRequests {
    map: Arc<Mutex<Map>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: RequestId, url: Url) -> PendingGuard {
        let mut map = lock(&self.map);
        let prev = map.insert(
            id,
            PendingRequest {
                url,
                started: Instant::now(),
            },
        );
        debug_assert!(prev.is_none(), "request id {id} registered twice");
        log::trace!(target: "runtime_net", "pending +{id} ({} in flight)", map.len());
        PendingGuard {
            id,
            map: Arc::clone(&self.map),
            released: false,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.map).is_empty()
    }

    pub fn contains(&self, id: RequestId) -> bool {
        lock(&self.map).contains_key(&id)
    }

    pub fn get(&self, id: RequestId) -> Option<PendingRequest> {
        lock(&self.map).get(&id).cloned()
    }

    /// Ids of in-flight requests, oldest first.
    pub fn ids(&self) -> Vec<RequestId> {
        let mut ids: Vec<_> = lock(&self.map).keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Owns one entry of [`PendingRequests`]; the entry goes away when this does.
#[must_use = "dropping the guard immediately forgets the request"]
#[derive(Debug)]
pub struct PendingGuard {
    id: RequestId,
    map: Arc<Mutex<Map>>,
    released: bool,
}

impl PendingGuard {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Remove the entry now and hand it back.
    pub fn release(mut self) -> Option<PendingRequest> {
        self.released = true;
        self.remove()
    }

    fn remove(&self) -> Option<PendingRequest> {
        let mut map = lock(&self.map);
        let entry = map.remove(&self.id);
        log::trace!(target: "runtime_net", "pending -{} ({} in flight)", self.id, map.len());
        entry
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.released {
            self.remove();
        }
    }
}
