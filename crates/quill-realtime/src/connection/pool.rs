//! Connection pool: tracks all active connections of one channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quill_core::types::ConnectionId;

use super::handle::ConnectionHandle;

/// Thread-safe pool of active connections, indexed by connection ID.
#[derive(Debug)]
pub struct ConnectionPool<F, M> {
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle<F, M>>>,
    next_seq: AtomicU64,
    buffer_size: usize,
}

impl<F, M> ConnectionPool<F, M> {
    /// Creates a new empty pool whose connections get `buffer_size`-deep
    /// outbound queues.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            by_id: DashMap::new(),
            next_seq: AtomicU64::new(0),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Creates a handle (not yet added) and the receiver its socket writer drains.
    pub fn open(
        &self,
        meta: M,
        cancel: CancellationToken,
    ) -> (Arc<ConnectionHandle<F, M>>, mpsc::Receiver<F>) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        (Arc::new(ConnectionHandle::new(seq, meta, tx, cancel)), rx)
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle<F, M>>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle<F, M>>> {
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle<F, M>>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns all connections in registration order.
    pub fn all_in_order(&self) -> Vec<Arc<ConnectionHandle<F, M>>> {
        let mut all: Vec<_> = self
            .by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|handle| handle.seq);
        all
    }

    /// Returns connections matching a predicate, e.g. stale or dead ones.
    pub fn filter<P>(&self, predicate: P) -> Vec<Arc<ConnectionHandle<F, M>>>
    where
        P: Fn(&ConnectionHandle<F, M>) -> bool,
    {
        self.by_id
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns total number of active connections.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
