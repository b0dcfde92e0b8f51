use crate::{Error, Result};
use futures::future::{join_all, select_all};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// How a multi-key wait resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Resolve as soon as one key has triggered.
    #[default]
    Any,
    /// Resolve once every key has triggered.
    All,
}

#[derive(Debug, Clone)]
enum Latch<T> {
    Pending,
    Triggered(T),
    Aborted,
}

impl<T> Latch<T> {
    const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// One-shot latches keyed by name.
///
/// `trigger` flips a latch exactly once and never blocks; every current and
/// future waiter on that key sees the stored value. `shutdown` releases all
/// pending waiters with [`Error::ConnectionClosed`].
pub struct EventWaiter<T> {
    latches: Mutex<HashMap<String, watch::Sender<Latch<T>>>>,
    shut_down: AtomicBool,
}

impl<T> Default for EventWaiter<T> {
    fn default() -> Self {
        Self {
            latches: Mutex::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }
}

impl<T> std::fmt::Debug for EventWaiter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventWaiter")
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl<T> EventWaiter<T> {
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl<T: Clone + Send + Sync + 'static> EventWaiter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on the latch for `key`, creating it on first use. Latches live
    /// as long as the waiter; after shutdown unseen keys get a released latch
    /// that is not stored.
    fn with_latch<R>(&self, key: &str, f: impl FnOnce(&watch::Sender<Latch<T>>) -> R) -> R {
        let mut latches = self.latches.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = latches.get(key) {
            return f(sender);
        }
        if self.is_shut_down() {
            return f(&watch::channel(Latch::Aborted).0);
        }
        f(latches
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(Latch::Pending).0))
    }

    /// Record that `key` fired. Returns `false` if it had already fired.
    pub fn trigger(&self, key: &str, value: T) -> bool {
        self.with_latch(key, |sender| {
            sender.send_if_modified(|latch| {
                if latch.is_pending() {
                    *latch = Latch::Triggered(value);
                    true
                } else {
                    false
                }
            })
        })
    }

    #[must_use]
    pub fn is_triggered(&self, key: &str) -> bool {
        let latches = self.latches.lock().unwrap_or_else(PoisonError::into_inner);
        latches
            .get(key)
            .is_some_and(|sender| matches!(*sender.borrow(), Latch::Triggered(_)))
    }

    /// Release every pending waiter. Keys first seen later start released.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        let latches = self.latches.lock().unwrap_or_else(PoisonError::into_inner);
        for sender in latches.values() {
            sender.send_if_modified(|latch| {
                if latch.is_pending() {
                    *latch = Latch::Aborted;
                    true
                } else {
                    false
                }
            });
        }
    }

    /// Wait for `keys` according to `mode`.
    ///
    /// `Any` yields the value of a key that triggered; `All` yields the value of
    /// the last listed key. Keys that already fired resolve immediately.
    ///
    /// # Errors
    /// Returns [`Error::ConnectionClosed`] if the waiter was shut down before the
    /// wait could be satisfied, or [`Error::InvalidWait`] if `keys` is empty.
    pub async fn wait<I, S>(&self, keys: I, mode: WaitMode) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut receivers: Vec<_> = keys
            .into_iter()
            .map(|key| self.with_latch(key.as_ref(), watch::Sender::subscribe))
            .collect();

        match (receivers.len(), mode) {
            (0, _) => Err(Error::InvalidWait("no event types to wait for")),
            (1, _) => into_result(resolve(&mut receivers[0]).await),
            (_, WaitMode::Any) => {
                let (first, _, rest) =
                    select_all(receivers.iter_mut().map(|rx| Box::pin(resolve(rx)))).await;
                drop(rest);
                if let Latch::Triggered(value) = first {
                    return Ok(value);
                }
                receivers
                    .iter()
                    .find_map(|rx| match &*rx.borrow() {
                        Latch::Triggered(value) => Some(value.clone()),
                        _ => None,
                    })
                    .ok_or(Error::ConnectionClosed)
            }
            (_, WaitMode::All) => {
                let latches = join_all(receivers.iter_mut().map(resolve)).await;
                latches
                    .into_iter()
                    .map(into_result)
                    .reduce(|acc, next| acc.and(next))
                    .unwrap_or(Err(Error::ConnectionClosed))
            }
        }
    }

    /// [`wait`](Self::wait) bounded by `timeout`.
    ///
    /// # Errors
    /// Returns [`Error::WaitTimeout`] if the wait did not resolve in time.
    pub async fn wait_timeout<I, S>(&self, keys: I, mode: WaitMode, timeout: Duration) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokio::time::timeout(timeout, self.wait(keys, mode))
            .await
            .map_err(|_| Error::WaitTimeout(timeout))?
    }

    /// [`wait`](Self::wait) abandoned when `cancel` completes.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if `cancel` finished first.
    pub async fn wait_until<I, S, C>(&self, keys: I, mode: WaitMode, cancel: C) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            result = self.wait(keys, mode) => result,
            () = cancel => Err(Error::Cancelled),
        }
    }
}

async fn resolve<T: Clone>(rx: &mut watch::Receiver<Latch<T>>) -> Latch<T> {
    match rx.wait_for(|latch| !latch.is_pending()).await {
        Ok(latch) => latch.clone(),
        Err(_) => Latch::Aborted,
    }
}

fn into_result<T>(latch: Latch<T>) -> Result<T> {
    match latch {
        Latch::Triggered(value) => Ok(value),
        Latch::Pending | Latch::Aborted => Err(Error::ConnectionClosed),
    }
}
