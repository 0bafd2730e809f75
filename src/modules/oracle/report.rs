//! Off-chain report types, assembly and on-chain verification.
use std::{collections::BTreeMap, fmt, num::NonZeroU8};

use ethabi::ethereum_types::U256;

use crate::crypto::signature::{self, secp256k1, OnChainAddress, Signature};

use super::{abi, Error};

/// Identifies a configuration epoch. Equality is byte-exact.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigDigest([u8; 16]);

impl ConfigDigest {
    /// Size of a config digest in bytes.
    pub const SIZE: usize = 16;

    /// Create a config digest from raw bytes.
    pub fn new(raw: [u8; Self::SIZE]) -> Self {
        Self(raw)
    }

    /// Return a byte representation of this digest.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ConfigDigest::SIZE]> for ConfigDigest {
    fn from(raw: [u8; ConfigDigest::SIZE]) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigDigest(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Binds a report to a configuration epoch, a reporting epoch and a round
/// within that epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportContext {
    pub config_digest: ConfigDigest,
    pub epoch: u32,
    pub round: u8,
}

impl ReportContext {
    /// The 32-byte domain separation tag for this context: 11 zero bytes,
    /// the config digest (16), the epoch (4, big-endian) and the round (1).
    ///
    /// A pure function of the context; signatures over a tagged message
    /// cannot be replayed under a different configuration, epoch or round.
    pub fn domain_separation_tag(&self) -> [u8; 32] {
        let mut tag = [0u8; 32];
        tag[11..27].copy_from_slice(&self.config_digest.0);
        tag[27..31].copy_from_slice(&self.epoch.to_be_bytes());
        tag[31] = self.round;
        tag
    }

    /// Reconstruct a context from a 32-byte domain separation tag. Exact
    /// inverse of [`Self::domain_separation_tag`]; the leading 11 bytes are
    /// ignored.
    pub fn from_tag_bytes(raw: &[u8; 32]) -> Self {
        let mut config_digest = [0u8; ConfigDigest::SIZE];
        config_digest.copy_from_slice(&raw[11..27]);
        let mut epoch = [0u8; 4];
        epoch.copy_from_slice(&raw[27..31]);
        Self {
            config_digest: ConfigDigest(config_digest),
            epoch: u32::from_be_bytes(epoch),
            round: raw[31],
        }
    }
}

/// A single numeric reading: the minimal big-endian magnitude of a
/// non-negative integer. Zero is the empty byte string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Observation(Vec<u8>);

impl Observation {
    /// Construct an observation from a big-endian magnitude, trimming
    /// leading zero bytes so the encoding is minimal.
    pub fn from_bytes(raw: &[u8]) -> Self {
        let start = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
        Self(raw[start..].to_vec())
    }

    /// Construct an observation from a 256-bit integer.
    pub fn from_u256(value: U256) -> Self {
        let mut raw = [0u8; 32];
        value.to_big_endian(&mut raw);
        Self::from_bytes(&raw)
    }

    /// The value as a 256-bit integer. Magnitudes beyond 32 bytes do not fit
    /// and must be bound-checked by the caller first.
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Return a byte representation of this observation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<u64> for Observation {
    fn from(value: u64) -> Self {
        Self::from_u256(value.into())
    }
}

impl From<u128> for Observation {
    fn from(value: u128) -> Self {
        Self::from_u256(value.into())
    }
}

impl fmt::Debug for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observation(0x{})", hex::encode(&self.0))
    }
}

impl cbor::Encode for Observation {
    fn into_cbor_value(self) -> cbor::Value {
        cbor::Value::ByteString(self.0)
    }
}

impl cbor::Decode for Observation {
    fn try_from_cbor_value(value: cbor::Value) -> Result<Self, cbor::DecodeError> {
        match value {
            cbor::Value::ByteString(data) => Ok(Self(data)),
            _ => Err(cbor::DecodeError::UnexpectedType),
        }
    }
}

/// Identifies the oracle that produced an observation within a report.
///
/// Zero marks an empty slot in the packed observer vector and is never a
/// valid identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(NonZeroU8);

impl ObserverId {
    /// Construct an observer identifier; `None` for the reserved value 0.
    pub fn new(id: u8) -> Option<Self> {
        NonZeroU8::new(id).map(Self)
    }

    /// The identifier as a byte.
    pub fn get(self) -> u8 {
        self.0.get()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An observation tagged with the oracle that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributedObservation {
    pub observation: Observation,
    pub observer: ObserverId,
}

impl AttributedObservation {
    /// Attribute an observation to the oracle with the given identifier.
    pub fn new(observation: Observation, observer: u8) -> Result<Self, Error> {
        Ok(Self {
            observation,
            observer: ObserverId::new(observer).ok_or(Error::InvalidObserverId)?,
        })
    }
}

/// A single oracle's attestation over a shared observation set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestedReportOne {
    pub observations: Vec<AttributedObservation>,
    pub signature: Signature,
}

/// A report carrying one signature per contributing oracle.
///
/// Aggregation is the caller's concern: signatures are collected in an
/// externally agreed order and never reordered by the codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestedReportMany {
    pub observations: Vec<AttributedObservation>,
    pub signatures: Vec<Signature>,
}

impl AttestedReportMany {
    /// Verify every signature against the canonical report encoding for
    /// `context`, returning the recovered oracle identifiers in signature
    /// order. Fails on the first signature that does not recover, is not
    /// whitelisted, or repeats an already-seen signer.
    pub fn verify_signatures(
        &self,
        context: &ReportContext,
        whitelist: &Whitelist,
    ) -> Result<Vec<ObserverId>, Error> {
        let message = abi::encode_report(context, &self.observations)?;
        let mut observers = Vec::with_capacity(self.signatures.len());
        for signature in &self.signatures {
            let observer = whitelist.authorize(&message, signature)?;
            if observers.contains(&observer) {
                return Err(Error::DuplicateSigner(observer.get()));
            }
            observers.push(observer);
        }
        Ok(observers)
    }
}

/// A decoded transmit payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffchainReport {
    pub context: ReportContext,
    pub report: AttestedReportMany,
}

impl OffchainReport {
    /// See [`AttestedReportMany::verify_signatures`].
    pub fn verify_signatures(&self, whitelist: &Whitelist) -> Result<Vec<ObserverId>, Error> {
        self.report.verify_signatures(&self.context, whitelist)
    }
}

/// Sign one oracle's attestation over the canonical encoding of
/// (context, observations).
///
/// Fails iff the signing function fails, e.g. on an unavailable key.
pub fn attest_report_one<F>(
    observations: Vec<AttributedObservation>,
    context: &ReportContext,
    sign: F,
) -> Result<AttestedReportOne, Error>
where
    F: FnOnce(&[u8]) -> Result<Signature, signature::Error>,
{
    let message = abi::encode_report(context, &observations)?;
    let signature = sign(&message)?;
    Ok(AttestedReportOne {
        observations,
        signature,
    })
}

/// The authorized signer set for a configuration epoch. Immutable for the
/// duration of a verification call.
#[derive(Clone, Debug, Default)]
pub struct Whitelist(BTreeMap<OnChainAddress, ObserverId>);

impl Whitelist {
    /// Create an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize the given address as the given oracle.
    pub fn insert(&mut self, address: OnChainAddress, observer: ObserverId) {
        self.0.insert(address, observer);
    }

    /// Look up the oracle identifier for an address.
    pub fn lookup(&self, address: &OnChainAddress) -> Option<ObserverId> {
        self.0.get(address).copied()
    }

    /// Number of authorized signers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the whitelist authorizes no signers at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recover the signer of `message` and require whitelist membership,
    /// returning the signer's oracle identifier.
    pub fn authorize(&self, message: &[u8], signature: &Signature) -> Result<ObserverId, Error> {
        let address = secp256k1::recover_signer(message, signature)?;
        self.lookup(&address)
            .ok_or(Error::UnauthorizedSigner(address))
    }
}

impl FromIterator<(OnChainAddress, ObserverId)> for Whitelist {
    fn from_iter<I: IntoIterator<Item = (OnChainAddress, ObserverId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
