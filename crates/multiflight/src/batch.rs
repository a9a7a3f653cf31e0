// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The batch function a loader fetches through, and adapters for closures.

use std::{collections::HashMap, fmt::Debug, hash::Hash};

use crate::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fetches the values for an ordered list of keys in one call.
///
/// The outer `Result` fails the whole batch: every key of the call fails
/// with that error. On success the returned list must have exactly one entry
/// per key, in key order; each entry succeeds or fails independently.
/// Returning a list of any other length fails every key of the batch with
/// [`ErrorKind::ResultLengthMismatch`](crate::ErrorKind::ResultLengthMismatch).
///
/// Most callers use one of the closure adapters instead of implementing this
/// trait: [`batch_fn`], [`try_batch_fn`] or [`mapped_batch_fn`].
///
/// # Examples
///
/// ```
/// use multiflight::{BatchLoader, Error};
///
/// struct Users;
///
/// impl BatchLoader<u64, String> for Users {
///     async fn load(&self, ids: Vec<u64>) -> Result<Vec<Result<String, Error>>, Error> {
///         Ok(ids.into_iter().map(|id| Ok(format!("user-{id}"))).collect())
///     }
/// }
/// ```
pub trait BatchLoader<K, V>: Send + Sync {
    /// Loads the values for `keys`, positionally aligned.
    fn load(&self, keys: Vec<K>) -> impl Future<Output = Result<Vec<Result<V, Error>>, Error>> + Send;
}

/// A batch function returning one value per key.
///
/// Created by [`batch_fn`].
#[derive(Clone)]
pub struct BatchFn<F>(F);

/// A batch function returning one `Result` per key.
///
/// Created by [`try_batch_fn`].
#[derive(Clone)]
pub struct TryBatchFn<F>(F);

/// A batch function returning a map from key to value.
///
/// Created by [`mapped_batch_fn`].
#[derive(Clone)]
pub struct MappedBatchFn<F>(F);

/// Adapts a closure that returns one value per key, in key order.
///
/// A failure of the returned future fails the whole batch with
/// [`ErrorKind::BatchFailed`](crate::ErrorKind::BatchFailed).
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use multiflight::{DataLoader, batch_fn};
///
/// let loader: DataLoader<String, String, _> = DataLoader::new(batch_fn(|keys: Vec<String>| async move {
///     Ok::<_, Infallible>(keys.iter().map(|k| k.to_uppercase()).collect::<Vec<_>>())
/// }));
///
/// let a = loader.load("a".to_string());
/// let b = loader.load("b".to_string());
/// loader.dispatch_and_join();
///
/// futures::executor::block_on(async {
///     assert_eq!(a.await.unwrap(), "A");
///     assert_eq!(b.await.unwrap(), "B");
/// });
/// ```
pub fn batch_fn<F>(f: F) -> BatchFn<F> {
    BatchFn(f)
}

/// Adapts a closure that returns one `Result` per key, in key order.
///
/// Per-key failures fail only that key, with
/// [`ErrorKind::KeyFailed`](crate::ErrorKind::KeyFailed).
pub fn try_batch_fn<F>(f: F) -> TryBatchFn<F> {
    TryBatchFn(f)
}

/// Adapts a closure that returns a map from key to value.
///
/// Keys absent from the map fail with
/// [`ErrorKind::MissingValue`](crate::ErrorKind::MissingValue).
pub fn mapped_batch_fn<F>(f: F) -> MappedBatchFn<F> {
    MappedBatchFn(f)
}

impl<K, V, E, F, Fut> BatchLoader<K, V> for BatchFn<F>
where
    K: Send,
    V: Send,
    E: Into<BoxError>,
    F: Fn(Vec<K>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<V>, E>> + Send,
{
    async fn load(&self, keys: Vec<K>) -> Result<Vec<Result<V, Error>>, Error> {
        let values = (self.0)(keys).await.map_err(Error::batch_failed)?;
        Ok(values.into_iter().map(Ok).collect())
    }
}

impl<K, V, E, KE, F, Fut> BatchLoader<K, V> for TryBatchFn<F>
where
    K: Send,
    V: Send,
    E: Into<BoxError>,
    KE: Into<BoxError>,
    F: Fn(Vec<K>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Result<V, KE>>, E>> + Send,
{
    async fn load(&self, keys: Vec<K>) -> Result<Vec<Result<V, Error>>, Error> {
        let results = (self.0)(keys).await.map_err(Error::batch_failed)?;
        Ok(results.into_iter().map(|r| r.map_err(Error::key_failed)).collect())
    }
}

impl<K, V, E, F, Fut> BatchLoader<K, V> for MappedBatchFn<F>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send,
    E: Into<BoxError>,
    F: Fn(Vec<K>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HashMap<K, V>, E>> + Send,
{
    async fn load(&self, keys: Vec<K>) -> Result<Vec<Result<V, Error>>, Error> {
        let order = keys.clone();
        let values = (self.0)(keys).await.map_err(Error::batch_failed)?;
        Ok(order
            .iter()
            .map(|key| values.get(key).cloned().ok_or_else(Error::missing_value))
            .collect())
    }
}

impl<F> Debug for BatchFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFn").finish_non_exhaustive()
    }
}

impl<F> Debug for TryBatchFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryBatchFn").finish_non_exhaustive()
    }
}

impl<F> Debug for MappedBatchFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBatchFn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::executor::block_on;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn batch_fn_wraps_each_value() {
        let loader = batch_fn(|keys: Vec<u32>| async move { Ok::<_, Infallible>(keys.iter().map(|k| k * 10).collect::<Vec<_>>()) });

        let results = block_on(BatchLoader::<u32, u32>::load(&loader, vec![1, 2])).expect("batch should succeed");

        let values: Vec<u32> = results.into_iter().map(|r| r.expect("key should succeed")).collect();
        assert_eq!(values, vec![10, 20]);
    }

    #[test]
    fn batch_fn_failure_fails_whole_batch() {
        let loader = batch_fn(|_keys: Vec<u32>| async move { Err::<Vec<u32>, _>("backend down") });

        let error = block_on(BatchLoader::<u32, u32>::load(&loader, vec![1])).expect_err("batch should fail");

        assert_eq!(error.kind(), ErrorKind::BatchFailed);
        assert!(error.to_string().contains("backend down"));
    }

    #[test]
    fn try_batch_fn_fails_individual_keys() {
        let loader = try_batch_fn(|keys: Vec<u32>| async move {
            Ok::<_, Infallible>(
                keys.into_iter()
                    .map(|k| if k % 2 == 0 { Ok(k) } else { Err(format!("odd key {k}")) })
                    .collect::<Vec<_>>(),
            )
        });

        let results = block_on(BatchLoader::<u32, u32>::load(&loader, vec![2, 3])).expect("batch should succeed");

        assert_eq!(*results[0].as_ref().expect("even key should succeed"), 2);
        let error = results[1].as_ref().expect_err("odd key should fail");
        assert_eq!(error.kind(), ErrorKind::KeyFailed);
        assert!(error.to_string().contains("odd key 3"));
    }

    #[test]
    fn mapped_batch_fn_realigns_to_key_order() {
        let loader = mapped_batch_fn(|keys: Vec<&'static str>| async move {
            Ok::<_, Infallible>(
                keys.into_iter()
                    .filter(|k| *k != "missing")
                    .map(|k| (k, k.len()))
                    .collect::<HashMap<_, _>>(),
            )
        });

        let results = block_on(BatchLoader::<&str, usize>::load(&loader, vec!["ccc", "missing", "a", "ccc"])).expect("batch should succeed");

        assert_eq!(*results[0].as_ref().expect("present"), 3);
        assert_eq!(results[1].as_ref().expect_err("absent").kind(), ErrorKind::MissingValue);
        assert_eq!(*results[2].as_ref().expect("present"), 1);
        assert_eq!(*results[3].as_ref().expect("duplicate keys share a value"), 3);
    }
}
