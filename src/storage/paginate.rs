//! Pagination over store scans.
use super::Store;

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_LIMIT: u64 = 1000;

/// Page window for a paginated scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct PageRequest {
    /// Number of matching records to skip.
    pub offset: u64,
    /// Maximum number of records to return; 0 means the default page size.
    pub limit: u64,
    /// Count every match instead of stopping once the page is full.
    pub count_total: bool,
}

impl PageRequest {
    /// Effective page size, clamped to `[1, MAX_PAGE_LIMIT]`.
    pub fn effective_limit(&self) -> u64 {
        if self.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit.min(MAX_PAGE_LIMIT)
        }
    }
}

/// Scan outcome metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, cbor::Encode, cbor::Decode)]
pub struct PageResponse {
    /// Offset of the next page, absent when the scan is exhausted.
    pub next_offset: Option<u64>,
    /// Total number of matches, present iff `count_total` was requested.
    pub total: Option<u64>,
}

/// Linear scan over all entries of `store`, in key order.
///
/// `visit` maps an entry to a record, or `None` to drop it from the result.
/// Matches before `page.offset` are skipped and at most the effective page
/// limit are returned. Without `count_total` the scan stops at the first
/// match beyond the page, which is enough to know whether a next page exists.
pub fn paginate_filtered<S, T, F>(store: S, page: &PageRequest, mut visit: F) -> (Vec<T>, PageResponse)
where
    S: Store,
    F: FnMut(&[u8], &[u8]) -> Option<T>,
{
    let limit = page.effective_limit();
    let mut matched = 0u64;
    let mut records = Vec::new();
    for (key, value) in store.iter() {
        let Some(record) = visit(&key, &value) else {
            continue;
        };
        let in_page = matched >= page.offset && (records.len() as u64) < limit;
        if in_page {
            records.push(record);
        }
        matched += 1;
        if !page.count_total && !in_page && matched > page.offset {
            break;
        }
    }

    let consumed = page.offset + records.len() as u64;
    (
        records,
        PageResponse {
            next_offset: (matched > consumed).then_some(consumed),
            total: page.count_total.then_some(matched),
        },
    )
}
