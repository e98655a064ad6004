//! Observable values for the fetch runtime.
//!
//! A [`Subject`] is owned by whoever produces the values. Anyone can
//! [`subscribe`](Subject::subscribe) and gets a [`Subscription`], which is the
//! receiving end of its own `mpsc` channel. Publishing never blocks and may
//! happen from any thread; a subscriber that needs a particular thread or loop
//! drains its subscription there.

use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryIter, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

type SubscriberId = u64;

struct Inner<T> {
    current: T,
    next_id: SubscriberId,
    subscribers: Vec<(SubscriberId, Sender<T>)>,
}

fn lock<T>(m: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    // A panicking subscriber cannot leave `Inner` half-updated, so keep going.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A current value plus the list of everyone listening for the next ones.
///
/// Subscribers do not get the current value replayed; they see exactly the
/// values published after they subscribed, in publish order. All subscribers
/// observe the same order, even when several threads publish concurrently.
pub struct Subject<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Clone + Send + 'static> Subject<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                current: initial,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Store `value` as current and deliver it to every live subscriber.
    pub fn publish(&self, value: T) {
        let mut inner = lock(&self.inner);
        // Send under the lock so concurrent publishers cannot interleave per subscriber.
        inner.subscribers.retain(|(id, tx)| match tx.send(value.clone()) {
            Ok(()) => true,
            Err(_) => {
                log::trace!(target: "bus", "dropping disconnected subscriber {id}");
                false
            }
        });
        inner.current = value;
    }

    pub fn current(&self) -> T {
        lock(&self.inner).current.clone()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::channel();
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        Subscription {
            id,
            rx,
            subject: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

impl<T: Clone + Send + Default + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Receiving end of one subscription. Dropping it unsubscribes.
///
/// Once the [`Subject`] is gone, buffered values can still be drained and then
/// `recv` reports disconnection.
pub struct Subscription<T> {
    id: SubscriberId,
    rx: Receiver<T>,
    subject: Weak<Mutex<Inner<T>>>,
}

impl<T> Subscription<T> {
    pub fn recv(&self) -> Result<T, RecvError> {
        self.rx.recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.rx.try_recv()
    }

    /// Everything already delivered, without waiting.
    pub fn try_iter(&self) -> TryIter<'_, T> {
        self.rx.try_iter()
    }

    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(subject) = self.subject.upgrade() {
            let mut inner = lock(&subject);
            inner.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}
