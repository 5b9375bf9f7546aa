//! Keccak-256 hashing and hex helpers.
//!
//! The digest is legacy Keccak-256 (the Ethereum variant), not NIST
//! SHA3-256. Claim identifiers and selection seeds are recomputed by
//! on-chain verifiers and other clients, so the hash function is part of the
//! wire format.

use crate::error::{BeaconError, Result};
use sha3::{Digest, Keccak256};

/// Length in bytes of a Keccak-256 digest.
pub const DIGEST_LEN: usize = 32;

/// Raw Keccak-256 digest.
pub type Digest32 = [u8; DIGEST_LEN];

/// Hashes `data` with Keccak-256.
pub fn keccak256(data: &[u8]) -> Digest32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lower-case hex without a prefix.
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Lower-case hex with a `0x` prefix.
pub fn to_prefixed_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Strips an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Decodes a hex string, with or without `0x`, in either case.
pub fn from_hex(input: &str) -> Result<Vec<u8>> {
    let raw = strip_hex_prefix(input.trim());
    hex::decode(raw).map_err(|err| BeaconError::Decode(format!("invalid hex {input:?}: {err}")))
}
