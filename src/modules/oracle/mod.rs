//! Oracle feed reporting module.
//!
//! Persists transmitted feed data keyed by feed and a monotonically
//! increasing round number, and answers round and latest-round queries. The
//! report wire format lives in [`abi`], report assembly and signature
//! verification in [`report`].
use sha3::{Digest as _, Keccak256};
use thiserror::Error;

use crate::{context::Context, crypto::signature, logger, storage::Store};

pub mod abi;
pub mod report;
pub mod state;
pub mod types;

/// Unique module name.
const MODULE_NAME: &str = "oracle";

/// Errors emitted by the oracle module.
#[derive(Error, Debug)]
pub enum Error {
    #[error("codec: {0}")]
    Encode(#[from] abi::EncodeError),

    #[error("codec: {0}")]
    Decode(#[from] abi::DecodeError),

    #[error("signature: {0}")]
    Signature(#[from] signature::Error),

    #[error("signer not authorized: {0}")]
    UnauthorizedSigner(signature::OnChainAddress),

    #[error("duplicate signer for oracle {0}")]
    DuplicateSigner(u8),

    #[error("observer identifier 0 is reserved for empty slots")]
    InvalidObserverId,

    #[error("no round associated with feed {0}")]
    NoRoundAssociated(String),
}

/// Events emitted by the oracle module.
#[derive(Clone, Debug, PartialEq, Eq, cbor::Encode)]
#[cbor(untagged)]
pub enum Event {
    FeedDataSubmitted { feed_id: String, round_id: u64 },
}

impl crate::event::Event for Event {
    fn module_name() -> &'static str {
        MODULE_NAME
    }

    fn code(&self) -> u32 {
        match self {
            Event::FeedDataSubmitted { .. } => 1,
        }
    }
}

/// Oracle module.
pub struct Module;

/// Interface that can be called from host transaction and query handlers.
pub trait API {
    /// Persist a feed submission under the feed's next round number.
    ///
    /// The round counter is read, advanced and written back before the
    /// record itself is stored; within the host's serialized execution
    /// context this keeps per-feed round numbers monotonic and gapless.
    fn set_feed_data<C: Context, S: Store>(
        ctx: &mut C,
        store: S,
        msg: types::MsgFeedData,
    ) -> Result<types::FeedDataReceipt, Error>;

    /// Paginated scan for the records of a specific round, optionally
    /// constrained to one feed.
    fn get_round_feed_data<S: Store>(
        store: S,
        query: types::RoundFeedDataQuery,
    ) -> Result<types::RoundFeedDataResponse, Error>;

    /// Paginated scan for the records of a feed's latest round. Fails if the
    /// feed has never been written to.
    fn get_latest_round_feed_data<S: Store>(
        store: S,
        query: types::LatestRoundFeedDataQuery,
    ) -> Result<types::RoundFeedDataResponse, Error>;
}

impl API for Module {
    fn set_feed_data<C: Context, S: Store>(
        ctx: &mut C,
        mut store: S,
        msg: types::MsgFeedData,
    ) -> Result<types::FeedDataReceipt, Error> {
        let logger = logger::get_logger(MODULE_NAME);

        // Advance the feed's round counter before anything else is stored.
        let round_id = state::get_round_id(&mut store, &msg.feed_id).map_or(1, |id| id + 1);
        state::set_round_id(&mut store, &msg.feed_id, round_id);

        let deserialized_report = types::DeserializedReport {
            observations: msg
                .feed_data
                .iter()
                .map(|chunk| report::Observation::from_bytes(chunk))
                .collect(),
        };

        let feed_id = msg.feed_id.clone();
        state::set_feed_record(
            &mut store,
            types::OcrFeedDataInStore {
                feed_data: msg,
                deserialized_report,
                round_id,
            },
        );

        slog::debug!(logger, "stored feed data";
            "feed_id" => feed_id.as_str(),
            "round_id" => round_id
        );
        ctx.emit_event(Event::FeedDataSubmitted { feed_id, round_id });

        Ok(types::FeedDataReceipt {
            height: ctx.block_height(),
            tx_hash: Keccak256::digest(ctx.tx_bytes()).to_vec(),
        })
    }

    fn get_round_feed_data<S: Store>(
        store: S,
        query: types::RoundFeedDataQuery,
    ) -> Result<types::RoundFeedDataResponse, Error> {
        let (feed_data, page) = state::feed_records_by_filter(store, &query.page, |record| {
            record.round_id == query.round_id
                && (query.feed_id.is_empty() || record.feed_data.feed_id == query.feed_id)
        });
        Ok(types::RoundFeedDataResponse { feed_data, page })
    }

    fn get_latest_round_feed_data<S: Store>(
        mut store: S,
        query: types::LatestRoundFeedDataQuery,
    ) -> Result<types::RoundFeedDataResponse, Error> {
        let round_id = state::get_round_id(&mut store, &query.feed_id)
            .ok_or_else(|| Error::NoRoundAssociated(query.feed_id.clone()))?;

        let (feed_data, page) = state::feed_records_by_filter(store, &query.page, |record| {
            record.round_id == round_id && record.feed_data.feed_id == query.feed_id
        });
        Ok(types::RoundFeedDataResponse { feed_data, page })
    }
}
