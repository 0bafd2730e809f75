//! Mock execution context for use in tests.
use crate::{
    context::Context,
    event::{Event, RawEvent},
    storage::MemStore,
};

/// Mock execution context factory.
pub struct Mock {
    pub block_height: u64,
    pub tx_bytes: Vec<u8>,
}

impl Mock {
    /// Create a new mock execution context.
    pub fn create_ctx(&self) -> MockContext {
        MockContext {
            block_height: self.block_height,
            tx_bytes: self.tx_bytes.clone(),
            events: Vec::new(),
        }
    }
}

impl Default for Mock {
    fn default() -> Self {
        Self {
            block_height: 1,
            tx_bytes: b"mock transaction".to_vec(),
        }
    }
}

/// A mock execution context.
pub struct MockContext {
    block_height: u64,
    tx_bytes: Vec<u8>,
    /// Events emitted through this context, in emission order.
    pub events: Vec<RawEvent>,
}

impl Context for MockContext {
    fn block_height(&self) -> u64 {
        self.block_height
    }

    fn tx_bytes(&self) -> &[u8] {
        &self.tx_bytes
    }

    fn emit_event<E: Event>(&mut self, event: E) {
        self.events.push(event.into_raw());
    }
}

/// Create an empty in-memory store.
pub fn empty_store() -> MemStore {
    MemStore::new()
}
