//! Recoverable signatures for on-chain report attestation.
use std::fmt;

use thiserror::Error;

pub mod secp256k1;

pub use secp256k1::{KeyBundle, OnChainAddress};

/// Signature-related errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("malformed private key")]
    MalformedPrivateKey,
    #[error("malformed address")]
    MalformedAddress,
    #[error("malformed signature")]
    MalformedSignature,
    #[error("signature recovery failed")]
    RecoveryFailed,
    #[error("signing failed")]
    SigningFailed,
}

/// A recoverable ECDSA signature in `r || s || v` form, where `v` is the
/// recovery identifier (0 or 1).
#[derive(Clone, PartialEq, Eq)]
pub struct Signature([u8; 65]);

impl Signature {
    /// Size of a serialized signature in bytes.
    pub const SIZE: usize = 65;

    /// Assemble a signature from its scalar components and recovery id.
    pub fn from_parts(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        let mut raw = [0u8; Self::SIZE];
        raw[..32].copy_from_slice(&r);
        raw[32..64].copy_from_slice(&s);
        raw[64] = v;
        Self(raw)
    }

    /// Construct a signature from a 65-byte slice.
    pub fn from_slice(raw: &[u8]) -> Result<Self, Error> {
        let raw: [u8; Self::SIZE] = raw.try_into().map_err(|_| Error::MalformedSignature)?;
        Ok(Self(raw))
    }

    /// The 32-byte `r` component.
    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    /// The 32-byte `s` component.
    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    /// The recovery identifier.
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// Return a byte representation of this signature.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parts_roundtrip() {
        let sig = Signature::from_parts([1u8; 32], [2u8; 32], 1);
        assert_eq!(sig.r(), &[1u8; 32]);
        assert_eq!(sig.s(), &[2u8; 32]);
        assert_eq!(sig.v(), 1);

        let reassembled = Signature::from_slice(sig.as_bytes()).unwrap();
        assert_eq!(reassembled, sig);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert_eq!(
            Signature::from_slice(&[0u8; 64]),
            Err(Error::MalformedSignature),
        );
        assert_eq!(
            Signature::from_slice(&[0u8; 66]),
            Err(Error::MalformedSignature),
        );
    }
}
