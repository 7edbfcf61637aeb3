use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicUsize, Ordering},
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use log::{info, warn};
use model::{ModelErr, NetworkModel};
use parking_lot::Mutex;
use tokio::task;

use crate::{LoadErr, WeightSource};

/// The outcome of a load, cheap to clone so every waiter can get a copy.
pub type LoadResult = Result<Arc<NetworkModel>, Arc<LoadErr>>;

type InflightLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Write-once, single-flight holder of the network.
///
/// The first successful load is kept for the lifetime of the cache. While a load is in
/// flight every caller awaits that same load, so at most one fetch-and-parse runs at a
/// time. A failed load is handed to all of its waiters and forgotten: the next call starts a
/// fresh one.
pub struct ModelCache<S> {
    source: Arc<S>,
    topology: (usize, usize),
    model: OnceLock<Arc<NetworkModel>>,
    inflight: Mutex<Option<InflightLoad>>,
    attempts: AtomicUsize,
}

impl<S> ModelCache<S>
where
    S: WeightSource + Sync + 'static,
{
    /// Creates a new, empty `ModelCache`.
    ///
    /// # Arguments
    /// * `source` - Where the weights are fetched from.
    /// * `topology` - The `(inputs, classes)` the loaded network must have.
    ///
    /// # Returns
    /// A new `ModelCache` instance. Nothing is fetched until the first `get`.
    pub fn new(source: S, topology: (usize, usize)) -> Self {
        Self {
            source: Arc::new(source),
            topology,
            model: OnceLock::new(),
            inflight: Mutex::new(None),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Returns the cached network if it has already been loaded.
    pub fn loaded(&self) -> Option<Arc<NetworkModel>> {
        self.model.get().cloned()
    }

    /// The number of loads started so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns the network, loading it first if needed.
    ///
    /// # Returns
    /// The shared network or the error of the load this call awaited.
    pub async fn get(&self) -> LoadResult {
        if let Some(model) = self.loaded() {
            return Ok(model);
        }

        let load = {
            let mut inflight = self.inflight.lock();

            // Re-check under the lock, a load may have finished in the meantime.
            if let Some(model) = self.loaded() {
                return Ok(model);
            }

            inflight.get_or_insert_with(|| self.start_load()).clone()
        };

        let result = load.clone().await;

        let mut inflight = self.inflight.lock();
        if let Ok(model) = &result {
            // Only ever reached by one load, the slot is never refilled after a success.
            let _ = self.model.set(Arc::clone(model));
        }

        if inflight.as_ref().is_some_and(|current| current.ptr_eq(&load)) {
            *inflight = None;
        }

        result
    }

    fn start_load(&self) -> InflightLoad {
        let source = Arc::clone(&self.source);
        let topology = self.topology;
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;

        async move {
            info!(attempt = attempt; "loading network weights");

            match load(source.as_ref(), topology).await {
                Ok(model) => {
                    info!(
                        attempt = attempt,
                        hidden = model.hidden_size();
                        "network weights loaded"
                    );
                    Ok(Arc::new(model))
                }
                Err(e) => {
                    warn!(attempt = attempt; "failed to load network weights: {e}");
                    Err(Arc::new(e))
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn load<S: WeightSource>(
    source: &S,
    (inputs, classes): (usize, usize),
) -> Result<NetworkModel, LoadErr> {
    let bytes = source.fetch().await?;

    let parsed = task::spawn_blocking(move || {
        let model = NetworkModel::from_json(&bytes)?;
        model.check_topology(inputs, classes)?;
        Ok::<_, ModelErr>(model)
    })
    .await
    .map_err(|e| LoadErr::Interrupted(e.to_string()))?;

    Ok(parsed?)
}
