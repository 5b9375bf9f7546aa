//! Deterministic sampling without replacement.
//!
//! Each draw reads the next big-endian `u32` from the seed, reduces it modulo
//! the number of remaining candidates and swap-removes the chosen candidate
//! (the last candidate takes its slot). The byte cursor advances by four and
//! wraps modulo the seed length, so a 32-byte seed supplies eight draws
//! before repeating its words against a smaller candidate set.

use crate::error::{BeaconError, Result};
use serde::{Deserialize, Serialize};

/// Bytes consumed from the seed per draw.
pub const CHUNK_LEN: usize = 4;

/// Identity and network address of a witness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WitnessMeta {
    /// Witness id, unique within a pool.
    pub id: String,
    /// Endpoint the witness is reachable at.
    pub url: String,
}

impl WitnessMeta {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Selects `required_count` distinct entries of `pool`, in draw order.
///
/// The pool is copied; the caller's slice is never reordered.
///
/// # Errors
///
/// * [`BeaconError::InsufficientWitnesses`] when `required_count` exceeds the
///   pool size.
/// * [`BeaconError::InvalidSeedLength`] when the seed is shorter than one
///   chunk, or when a draw would read past its end (a seed whose length is
///   not a multiple of four).
///
/// # Examples
///
/// ```
/// use witness_beacon::{derive_seed, select_witnesses};
///
/// let pool = ["w1", "w2", "w3"];
/// let seed = derive_seed("claim1", 5, 2, 1_700_000_000);
/// let picked = select_witnesses(&pool, 2, seed.as_bytes()).unwrap();
/// assert_eq!(picked, vec!["w2", "w3"]);
/// ```
pub fn select_witnesses<T: Clone>(pool: &[T], required_count: usize, seed: &[u8]) -> Result<Vec<T>> {
    if required_count > pool.len() {
        return Err(BeaconError::InsufficientWitnesses {
            required: required_count,
            available: pool.len(),
        });
    }
    if seed.len() < CHUNK_LEN {
        return Err(BeaconError::InvalidSeedLength { len: seed.len() });
    }

    let mut avail = pool.to_vec();
    let mut selected = Vec::with_capacity(required_count);
    let mut offset = 0usize;
    for _ in 0..required_count {
        let draw = read_u32_be(seed, offset)?;
        let index = (draw as usize) % avail.len();
        selected.push(avail.swap_remove(index));
        offset = (offset + CHUNK_LEN) % seed.len();
    }
    Ok(selected)
}

fn read_u32_be(seed: &[u8], offset: usize) -> Result<u32> {
    let chunk: [u8; CHUNK_LEN] = seed
        .get(offset..offset + CHUNK_LEN)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(BeaconError::InvalidSeedLength { len: seed.len() })?;
    Ok(u32::from_be_bytes(chunk))
}
