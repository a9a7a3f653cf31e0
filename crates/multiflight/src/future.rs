// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Load handles and the single-assignment promises that complete them.

use std::{
    fmt::Debug,
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
};

use futures::{
    FutureExt,
    channel::oneshot,
    future::{BoxFuture, Shared},
};

use crate::Error;

/// The future returned by [`DataLoader::dispatch`](crate::DataLoader::dispatch).
///
/// Resolves to one result per drained load, in queue order.
pub type DispatchFuture<V> = BoxFuture<'static, Vec<Result<V, Error>>>;

/// The future returned by [`DataLoader::load_many`](crate::DataLoader::load_many).
pub type LoadManyFuture<V> = BoxFuture<'static, Result<Vec<V>, Error>>;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A handle to a pending or completed load.
///
/// Handles are cheap to clone and every clone resolves to the same result.
/// While caching is enabled, every [`load`](crate::DataLoader::load) of the
/// same cache identity returns a clone of the same handle until it is cleared;
/// [`same_as`](Self::same_as) tells whether two handles are clones.
///
/// Dropping a handle does not cancel the load.
pub struct LoadFuture<V> {
    id: u64,
    inner: Shared<BoxFuture<'static, Result<V, Error>>>,
}

impl<V> LoadFuture<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Returns `true` if both handles belong to the same load.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Returns the result if the load has already completed.
    #[must_use]
    pub fn peek(&self) -> Option<&Result<V, Error>> {
        self.inner.peek()
    }

    /// A handle that is already complete.
    pub(crate) fn ready(result: Result<V, Error>) -> Self {
        Self::from_future(next_id(), futures::future::ready(result))
    }

    /// A handle completed by the returned promise.
    pub(crate) fn pending() -> (Promise<V>, Self) {
        let id = next_id();
        let (sender, receiver) = oneshot::channel();
        let future = receiver.map(|received| received.unwrap_or_else(|_canceled| Err(Error::abandoned())));
        (
            Promise {
                id,
                sender: Some(sender),
            },
            Self::from_future(id, future),
        )
    }

    /// A handle that runs `future` on first poll. The promise it pairs with
    /// is detached: the caller's future produces the result itself.
    pub(crate) fn deferred<F>(future: impl FnOnce(Promise<V>) -> F) -> Self
    where
        F: Future<Output = Result<V, Error>> + Send + 'static,
    {
        let id = next_id();
        Self::from_future(id, future(Promise { id, sender: None }))
    }

    fn from_future<F>(id: u64, future: F) -> Self
    where
        F: Future<Output = Result<V, Error>> + Send + 'static,
    {
        Self {
            id,
            inner: future.boxed().shared(),
        }
    }
}

impl<V> LoadFuture<V> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

impl<V> Clone for LoadFuture<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

impl<V> Debug for LoadFuture<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadFuture").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<V> Future for LoadFuture<V>
where
    V: Clone,
{
    type Output = Result<V, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

/// The write side of a pending [`LoadFuture`]. Completes it exactly once.
pub(crate) struct Promise<V> {
    id: u64,
    sender: Option<oneshot::Sender<Result<V, Error>>>,
}

impl<V> Promise<V> {
    /// The id shared with the handle this promise completes.
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn complete(self, result: Result<V, Error>) {
        if let Some(sender) = self.sender {
            // Every handle may already be gone; nobody is left to tell.
            let _ = sender.send(result);
        }
    }
}

impl<V> Debug for Promise<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise").field("id", &self.id).finish_non_exhaustive()
    }
}
