//! Execution context.
use crate::event::Event;

/// Host execution context for a single state transition.
///
/// The surrounding ledger runtime supplies the block data and the raw bytes
/// of the transaction being executed, and collects events emitted during
/// execution. State transitions are serialized by the host, so a context is
/// never shared between concurrently executing transactions.
pub trait Context {
    /// Height of the block the current transaction executes in.
    fn block_height(&self) -> u64;

    /// Raw bytes of the transaction being executed.
    fn tx_bytes(&self) -> &[u8];

    /// Emit an event.
    fn emit_event<E: Event>(&mut self, event: E);
}
