//! Single-flight lock table.
//!
//! Concurrent calls for the same key share one execution: the first caller
//! (the leader) runs the work, later callers wait for the leader's result. The
//! key is removed from the table before anyone is told the result, and also
//! when the leader is dropped mid-flight, in which case waiters settle with
//! `ViewError::Abandoned`.

use crate::error::ViewError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::oneshot;
use tracing::debug;

type Waiter<T> = oneshot::Sender<Result<T, ViewError>>;

struct Flight<T> {
    waiters: Vec<Waiter<T>>,
    observers: Vec<oneshot::Sender<()>>,
}

impl<T> Flight<T> {
    fn new() -> Self {
        Self {
            waiters: Vec::new(),
            observers: Vec::new(),
        }
    }
}

pub struct SingleFlight<T> {
    label: &'static str,
    flights: Mutex<HashMap<String, Flight<T>>>,
}

impl<T: Clone> SingleFlight<T> {
    /// `label` names the table in logs (e.g. "open", "close").
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key`, or wait for the flight already running it.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T, ViewError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ViewError>>,
    {
        let follower = {
            let mut flights = self.flights.lock();
            match flights.get_mut(key) {
                Some(flight) => {
                    let (tx, rx) = oneshot::channel();
                    flight.waiters.push(tx);
                    Some(rx)
                }
                None => {
                    flights.insert(key.to_string(), Flight::new());
                    None
                }
            }
        };

        if let Some(rx) = follower {
            debug!(table = self.label, key, "Joined in-flight call");
            return rx
                .await
                .unwrap_or_else(|_| Err(ViewError::Abandoned(key.to_string())));
        }

        let mut guard = FlightGuard {
            table: self,
            key,
            armed: true,
        };
        let result = work().await;
        guard.settle(&result);
        result
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.flights.lock().contains_key(key)
    }

    /// Receiver that fires once the current flight for `key` settles.
    /// `None` when nothing is in flight.
    pub fn settled(&self, key: &str) -> Option<oneshot::Receiver<()>> {
        let mut flights = self.flights.lock();
        let flight = flights.get_mut(key)?;
        let (tx, rx) = oneshot::channel();
        flight.observers.push(tx);
        Some(rx)
    }

    pub fn len(&self) -> usize {
        self.flights.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.flights.lock().keys().cloned().collect()
    }
}

struct FlightGuard<'a, T: Clone> {
    table: &'a SingleFlight<T>,
    key: &'a str,
    armed: bool,
}

impl<T: Clone> FlightGuard<'_, T> {
    fn settle(&mut self, result: &Result<T, ViewError>) {
        self.armed = false;
        let flight = self.table.flights.lock().remove(self.key);
        if let Some(flight) = flight {
            for tx in flight.waiters {
                let _ = tx.send(result.clone());
            }
            for tx in flight.observers {
                let _ = tx.send(());
            }
        }
    }
}

impl<T: Clone> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            debug!(table = self.table.label, key = self.key, "Flight abandoned");
            // Dropping the senders settles waiters with Abandoned.
            self.table.flights.lock().remove(self.key);
        }
    }
}
