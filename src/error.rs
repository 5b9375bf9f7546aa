//! Error taxonomy shared by claim hashing, witness selection and signature
//! collection.
//!
//! Every variant carries the offending input (witness id, requested count,
//! seed length) so a failed selection can be diagnosed without re-running it.

use thiserror::Error;

/// Errors raised by the witness beacon pipeline.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// Claim fields could not be serialized into their canonical form.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A hex string or JSON document could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// More witnesses were requested than the pool contains.
    #[error("insufficient witnesses: need {required}, have {available}")]
    InsufficientWitnesses {
        /// Number of witnesses requested for the claim.
        required: usize,
        /// Number of witnesses present in the pool.
        available: usize,
    },

    /// Seed buffer too short to yield the next 4-byte sampling chunk.
    #[error("invalid seed length: {len} bytes")]
    InvalidSeedLength {
        /// Length of the seed that was supplied.
        len: usize,
    },

    /// A witness id appears more than once in a pool.
    #[error("duplicate witness id {id}")]
    DuplicateWitness {
        /// The repeated id.
        id: String,
    },

    /// A witness record is malformed.
    #[error("invalid witness: {reason}")]
    InvalidWitness {
        /// What is wrong with the record.
        reason: String,
    },

    /// A selected witness id has no matching signer record.
    #[error("unknown witness {id}")]
    UnknownWitness {
        /// The id that could not be resolved.
        id: String,
    },

    /// A selected witness failed to produce a signature.
    #[error("witness {witness_id} failed to sign: {reason}")]
    Signing {
        /// Id of the failing witness.
        witness_id: String,
        /// Error reported by the signer.
        reason: String,
    },

    /// A selected witness did not answer within the configured bound.
    #[error("witness {witness_id} timed out after {timeout_ms}ms")]
    SigningTimeout {
        /// Id of the witness that timed out.
        witness_id: String,
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// Filesystem failure while loading an input document.
    #[error("io error: {0}")]
    Io(String),
}

impl BeaconError {
    /// Builds a [`BeaconError::Signing`] for `witness_id`.
    pub fn signing(witness_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Signing {
            witness_id: witness_id.into(),
            reason: reason.into(),
        }
    }

    /// Builds a [`BeaconError::InvalidWitness`].
    pub fn invalid_witness(reason: impl Into<String>) -> Self {
        Self::InvalidWitness {
            reason: reason.into(),
        }
    }

    /// Returns true when the error stems from caller-supplied input rather
    /// than from a signer.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Encoding(_)
            | Self::Decode(_)
            | Self::InsufficientWitnesses { .. }
            | Self::InvalidSeedLength { .. }
            | Self::DuplicateWitness { .. }
            | Self::InvalidWitness { .. }
            | Self::UnknownWitness { .. }
            | Self::Io(_) => true,

            Self::Signing { .. } | Self::SigningTimeout { .. } => false,
        }
    }

    /// Id of the witness this error is about, if any.
    pub fn witness_id(&self) -> Option<&str> {
        match self {
            Self::Signing { witness_id, .. } | Self::SigningTimeout { witness_id, .. } => {
                Some(witness_id)
            }
            Self::DuplicateWitness { id } | Self::UnknownWitness { id } => Some(id),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BeaconError>;
