//! Oracle module types.
use crate::storage::{PageRequest, PageResponse};

use super::report::Observation;

/// A raw feed submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct MsgFeedData {
    /// Feed the submission is for.
    pub feed_id: String,
    /// Address of the submitting transmitter, opaque to the store.
    pub submitter: Vec<u8>,
    /// Raw observation chunks, in report order.
    pub feed_data: Vec<Vec<u8>>,
    /// Raw signatures accompanying the submission, opaque to the store.
    pub signatures: Vec<Vec<u8>>,
}

/// Placeholder decode of a submission: one observation per raw chunk.
///
/// The store does not interpret submissions; callers that need verified
/// report semantics must route the transmit payload through the ABI codec.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct DeserializedReport {
    pub observations: Vec<Observation>,
}

/// A persisted feed record. Immutable once written.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct OcrFeedDataInStore {
    pub feed_data: MsgFeedData,
    pub deserialized_report: DeserializedReport,
    pub round_id: u64,
}

/// Receipt for a stored feed submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct FeedDataReceipt {
    /// Height of the block the submission executed in.
    pub height: u64,
    /// Keccak-256 digest of the surrounding transaction, for the caller's
    /// own bookkeeping.
    pub tx_hash: Vec<u8>,
}

/// Query for the feed records of a specific round.
#[derive(Clone, Debug, Default, cbor::Encode, cbor::Decode)]
pub struct RoundFeedDataQuery {
    /// Feed to filter by; an empty identifier matches every feed.
    pub feed_id: String,
    pub round_id: u64,
    pub page: PageRequest,
}

/// Query for the feed records of a feed's latest round.
#[derive(Clone, Debug, Default, cbor::Encode, cbor::Decode)]
pub struct LatestRoundFeedDataQuery {
    pub feed_id: String,
    pub page: PageRequest,
}

/// Paginated feed records.
#[derive(Clone, Debug, Default, cbor::Encode, cbor::Decode)]
pub struct RoundFeedDataResponse {
    pub feed_data: Vec<OcrFeedDataInStore>,
    pub page: PageResponse,
}
