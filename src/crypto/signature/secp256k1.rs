//! Secp256k1 key bundles and signer recovery.
use std::fmt;

use k256::ecdsa::{self, RecoveryId, SigningKey, VerifyingKey};
use rand_core::OsRng;
use sha3::{Digest as _, Keccak256};

use super::{Error, Signature};

/// A 20-byte on-chain signing address: the trailing 20 bytes of the
/// Keccak-256 digest of the uncompressed public key, the same derivation the
/// target verifier uses for its addresses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OnChainAddress([u8; 20]);

impl OnChainAddress {
    /// Size of an address in bytes.
    pub const SIZE: usize = 20;

    /// Derive the address of the given public key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Skip the 0x04 tag byte of the uncompressed encoding.
        let digest = Keccak256::digest(&point.as_bytes()[1..]);
        let mut raw = [0u8; Self::SIZE];
        raw.copy_from_slice(&digest[12..]);
        Self(raw)
    }

    /// Construct an address from a 20-byte slice.
    pub fn from_slice(raw: &[u8]) -> Result<Self, Error> {
        let raw: [u8; Self::SIZE] = raw.try_into().map_err(|_| Error::MalformedAddress)?;
        Ok(Self(raw))
    }

    /// Return a byte representation of this address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for OnChainAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for OnChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OnChainAddress(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for OnChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// An on-chain key bundle, held exclusively by a single oracle process.
#[derive(Clone)]
pub struct KeyBundle {
    signing_key: SigningKey,
}

impl KeyBundle {
    /// Generate a new key bundle from OS randomness.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Construct a key bundle from a 32-byte private scalar.
    pub fn from_slice(raw: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            signing_key: SigningKey::from_slice(raw).map_err(|_| Error::MalformedPrivateKey)?,
        })
    }

    /// The on-chain signing address of this bundle's public key.
    pub fn address(&self) -> OnChainAddress {
        OnChainAddress::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign the Keccak-256 digest of `message`, returning a recoverable
    /// signature.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, Error> {
        let digest: [u8; 32] = Keccak256::digest(message).into();
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|_| Error::SigningFailed)?;
        let raw = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&raw[..32]);
        s.copy_from_slice(&raw[32..]);
        Ok(Signature::from_parts(r, s, recovery_id.to_byte()))
    }
}

/// Recover the on-chain address that signed the Keccak-256 digest of
/// `message`.
///
/// A signature whose components cannot be parsed yields
/// [`Error::MalformedSignature`]; one that parses but does not resolve to a
/// public key yields [`Error::RecoveryFailed`]. Neither implies anything
/// about signer authorization, which is the caller's concern.
pub fn recover_signer(message: &[u8], signature: &Signature) -> Result<OnChainAddress, Error> {
    let recovery_id = RecoveryId::from_byte(signature.v()).ok_or(Error::MalformedSignature)?;
    let sig = ecdsa::Signature::from_slice(&signature.as_bytes()[..64])
        .map_err(|_| Error::MalformedSignature)?;
    let digest: [u8; 32] = Keccak256::digest(message).into();
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| Error::RecoveryFailed)?;
    Ok(OnChainAddress::from_verifying_key(&key))
}
