//! Asset Loader
//!
//! Single-flight loading: concurrent requests for the same path share one
//! transport request. Each load runs as its own task; the task's table entry is
//! removed before any waiter is told the result, so a caller that reacts to a
//! completion by loading again starts a fresh request.

use crate::error::{LoadCause, LoadError};
use crate::resource::asset::{Asset, AssetKind};
use crate::resource::transport::AssetTransport;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error};

type LoadWaiter = oneshot::Sender<Result<Asset, LoadError>>;

struct LoadTask {
    task_id: u64,
    kind: AssetKind,
    waiters: Vec<LoadWaiter>,
    handle: Option<JoinHandle<()>>,
}

pub struct AssetLoader {
    transport: Arc<dyn AssetTransport>,
    tasks: Arc<Mutex<HashMap<String, LoadTask>>>,
    next_task_id: AtomicU64,
}

impl AssetLoader {
    pub fn new(transport: Arc<dyn AssetTransport>) -> Self {
        Self {
            transport,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_task_id: AtomicU64::new(1),
        }
    }

    /// Load `path`, joining an in-flight load for the same path if there is one.
    pub async fn load_async(&self, path: &str, kind: AssetKind) -> Result<Asset, LoadError> {
        let rx = self.attach(path, kind)?;
        settle(path, rx).await
    }

    /// Callback form of [`AssetLoader::load_async`]. Argument errors are
    /// reported through the callback before this returns; everything else is
    /// delivered from a spawned task.
    pub fn load<F>(&self, path: &str, kind: AssetKind, callback: F)
    where
        F: FnOnce(Result<Asset, LoadError>) + Send + 'static,
    {
        match self.attach(path, kind) {
            Ok(rx) => {
                let path = path.to_string();
                tokio::spawn(async move {
                    callback(settle(&path, rx).await);
                });
            }
            Err(err) => callback(Err(err)),
        }
    }

    pub fn in_flight(&self, path: &str) -> bool {
        self.tasks.lock().contains_key(path)
    }

    pub fn in_flight_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Abort every in-flight load. Waiters settle with `LoadCause::Cancelled`.
    pub fn cancel_all(&self) {
        let drained: Vec<(String, LoadTask)> = self.tasks.lock().drain().collect();
        if drained.is_empty() {
            return;
        }
        debug!(count = drained.len(), "Cancelling in-flight loads");
        for (path, task) in drained {
            if let Some(handle) = task.handle {
                handle.abort();
            }
            for tx in task.waiters {
                let _ = tx.send(Err(LoadError::new(path.clone(), LoadCause::Cancelled)));
            }
        }
    }

    fn attach(
        &self,
        path: &str,
        kind: AssetKind,
    ) -> Result<oneshot::Receiver<Result<Asset, LoadError>>, LoadError> {
        if path.trim().is_empty() {
            error!(kind = %kind, "Asset load requested with empty path");
            return Err(LoadError::new(path, LoadCause::MissingPath));
        }

        let (tx, rx) = oneshot::channel();
        let mut tasks = self.tasks.lock();

        if let Some(task) = tasks.get_mut(path) {
            task.waiters.push(tx);
            debug!(
                path,
                kind = %task.kind,
                waiters = task.waiters.len(),
                "Joined in-flight load"
            );
            return Ok(rx);
        }

        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(run_load(
            Arc::clone(&self.transport),
            Arc::clone(&self.tasks),
            path.to_string(),
            kind,
            task_id,
        ));
        tasks.insert(
            path.to_string(),
            LoadTask {
                task_id,
                kind,
                waiters: vec![tx],
                handle: Some(handle),
            },
        );
        debug!(path, kind = %kind, "Started load");
        Ok(rx)
    }
}

async fn settle(
    path: &str,
    rx: oneshot::Receiver<Result<Asset, LoadError>>,
) -> Result<Asset, LoadError> {
    rx.await
        .unwrap_or_else(|_| Err(LoadError::new(path, LoadCause::Cancelled)))
}

async fn run_load(
    transport: Arc<dyn AssetTransport>,
    tasks: Arc<Mutex<HashMap<String, LoadTask>>>,
    path: String,
    kind: AssetKind,
    task_id: u64,
) {
    let result = transport
        .request_load(&path, kind)
        .await
        .map_err(|e| LoadError::new(path.clone(), LoadCause::Transport(e.0)));

    // Only remove our own entry; a cancelled-and-restarted path belongs to a newer task.
    let waiters = {
        let mut tasks = tasks.lock();
        match tasks.get(&path) {
            Some(task) if task.task_id == task_id => tasks
                .remove(&path)
                .map(|task| task.waiters)
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    };

    match &result {
        Ok(_) => debug!(path = %path, waiters = waiters.len(), "Load completed"),
        Err(err) => error!(path = %path, error = %err, "Load failed"),
    }

    for tx in waiters {
        let _ = tx.send(result.clone());
    }
}
