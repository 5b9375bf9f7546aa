//! Selection seed derivation.
//!
//! The seed is the raw Keccak-256 digest of
//! `identifier \n epoch \n required_count \n timestamp_s`, numbers rendered
//! in base 10. The identifier is taken verbatim, prefix included.

use crate::codec::{self, Digest32};
use std::fmt;

/// Deterministic 32-byte seed driving witness sampling.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionSeed(Digest32);

impl SelectionSeed {
    /// Wraps raw seed bytes.
    pub const fn from_bytes(bytes: Digest32) -> Self {
        Self(bytes)
    }

    /// Seed bytes as consumed by the sampler.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lower-case hex without prefix.
    pub fn to_hex(&self) -> String {
        codec::to_hex(self.0)
    }
}

impl AsRef<[u8]> for SelectionSeed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SelectionSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SelectionSeed({})", self.to_hex())
    }
}

/// Derives the selection seed for a claim in a given epoch.
pub fn derive_seed(
    identifier: &str,
    epoch: u64,
    required_count: usize,
    timestamp_s: u64,
) -> SelectionSeed {
    let preimage = format!("{identifier}\n{epoch}\n{required_count}\n{timestamp_s}");
    SelectionSeed(codec::keccak256(preimage.as_bytes()))
}
