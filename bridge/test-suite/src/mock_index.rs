use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use nevm_bridge_indexer::{BlockConnect, IndexError, NevmBlock, NevmIndex};
use parking_lot::Mutex;

/// A scripted indexer double.
///
/// `add_block` and `delete_block` succeed unless a rejection was queued;
/// `create_block` pops from a queued script and answers "not ready" once the
/// script runs dry. Every call is recorded for inspection.
#[derive(Default)]
pub struct MockIndex {
    add_rejections: Mutex<VecDeque<IndexError>>,
    delete_rejections: Mutex<VecDeque<IndexError>>,
    create_script: Mutex<VecDeque<Option<NevmBlock>>>,
    added: Mutex<Vec<BlockConnect>>,
    deleted: Mutex<Vec<Vec<u8>>>,
    create_calls: AtomicU64,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a rejection for the next `add_block` call.
    pub fn reject_next_add(&self, reason: &str) {
        self.add_rejections.lock().push_back(IndexError::new(reason));
    }

    /// Queues a rejection for the next `delete_block` call.
    pub fn reject_next_delete(&self, reason: &str) {
        self.delete_rejections.lock().push_back(IndexError::new(reason));
    }

    /// Queues the result of the next `create_block` call.
    pub fn push_create(&self, result: Option<NevmBlock>) {
        self.create_script.lock().push_back(result);
    }

    /// Connect events the bridge delivered, in order.
    pub fn added(&self) -> Vec<BlockConnect> {
        self.added.lock().clone()
    }

    /// Host block identifiers the bridge asked to roll back, in order.
    pub fn deleted(&self) -> Vec<Vec<u8>> {
        self.deleted.lock().clone()
    }

    /// Number of `create_block` attempts observed.
    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::Acquire)
    }
}

#[async_trait]
impl NevmIndex for MockIndex {
    type Node = ();

    async fn add_block(&self, connect: BlockConnect, _node: &()) -> Result<(), IndexError> {
        self.added.lock().push(connect);
        match self.add_rejections.lock().pop_front() {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }

    async fn delete_block(&self, host_block: &[u8], _node: &()) -> Result<(), IndexError> {
        self.deleted.lock().push(host_block.to_vec());
        match self.delete_rejections.lock().pop_front() {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }

    async fn create_block(&self, _node: &()) -> Option<NevmBlock> {
        self.create_calls.fetch_add(1, Ordering::AcqRel);
        self.create_script.lock().pop_front().flatten()
    }
}
