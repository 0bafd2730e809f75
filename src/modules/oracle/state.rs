//! Oracle module state.
use byteorder::{ByteOrder, LittleEndian};

use crate::storage::{self, PageRequest, PageResponse, PrefixStore, Store, TypedStore};

use super::{types::OcrFeedDataInStore, MODULE_NAME};

/// Per-feed round counters.
const ROUND_ID: &[u8] = &[0x01];
/// Stored feed data records.
const FEED_DATA: &[u8] = &[0x02];

fn round_ids<S: Store>(store: S) -> impl Store {
    PrefixStore::new(PrefixStore::new(store, &MODULE_NAME), &ROUND_ID)
}

fn feed_records<S: Store>(store: S) -> impl Store {
    PrefixStore::new(PrefixStore::new(store, &MODULE_NAME), &FEED_DATA)
}

/// Little-endian fixed 8-byte encoding of a round counter.
pub fn encode_round_id(round_id: u64) -> [u8; 8] {
    let mut raw = [0u8; 8];
    LittleEndian::write_u64(&mut raw, round_id);
    raw
}

/// Exact inverse of [`encode_round_id`]. Counters are system-written, so a
/// wrong-size value is corrupted state and panics.
pub fn decode_round_id(raw: &[u8]) -> u64 {
    LittleEndian::read_u64(raw)
}

/// Fetch the current round counter for a feed.
pub fn get_round_id<S: Store>(store: S, feed_id: &str) -> Option<u64> {
    round_ids(store)
        .get(feed_id.as_bytes())
        .map(|raw| decode_round_id(&raw))
}

/// Persist the round counter for a feed.
pub fn set_round_id<S: Store>(store: S, feed_id: &str, round_id: u64) {
    let mut store = round_ids(store);
    store.insert(feed_id.as_bytes(), &encode_round_id(round_id));
}

/// Storage key of a feed record: length-prefixed feed identifier followed by
/// the big-endian round number, so feeds whose identifiers are prefixes of
/// one another cannot collide.
fn record_key(feed_id: &str, round_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(4 + feed_id.len() + 8);
    key.extend_from_slice(&(feed_id.len() as u32).to_be_bytes());
    key.extend_from_slice(feed_id.as_bytes());
    key.extend_from_slice(&round_id.to_be_bytes());
    key
}

/// Persist a feed record under its (feed, round) key.
pub fn set_feed_record<S: Store>(store: S, record: OcrFeedDataInStore) {
    let key = record_key(&record.feed_data.feed_id, record.round_id);
    let mut records = TypedStore::new(feed_records(store));
    records.insert(key, record);
}

/// Fetch the feed record for a specific (feed, round) pair.
pub fn get_feed_record<S: Store>(
    store: S,
    feed_id: &str,
    round_id: u64,
) -> Option<OcrFeedDataInStore> {
    TypedStore::new(feed_records(store)).get(record_key(feed_id, round_id))
}

/// Paginated linear scan over all stored feed records, keeping those for
/// which `pred` holds.
pub fn feed_records_by_filter<S, F>(
    store: S,
    page: &PageRequest,
    mut pred: F,
) -> (Vec<OcrFeedDataInStore>, PageResponse)
where
    S: Store,
    F: FnMut(&OcrFeedDataInStore) -> bool,
{
    storage::paginate_filtered(feed_records(store), page, |_key, value| {
        let record: OcrFeedDataInStore = cbor::from_slice(value).unwrap();
        pred(&record).then_some(record)
    })
}
