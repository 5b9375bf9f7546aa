//! In-process secp256k1 witness signer.
//!
//! [`LocalWallet`] produces Ethereum personal-message signatures
//! (`personal_sign` / EIP-191): the message is prefixed with
//! `"\x19Ethereum Signed Message:\n" + len`, hashed with Keccak-256 and signed
//! with RFC 6979 deterministic ECDSA. The 65-byte output is `r || s || v` with
//! `v = 27 + recovery id`, the layout on-chain verifiers expect.

use crate::codec::{self, Digest32};
use crate::collector::{SignerCapability, SignerError};
use crate::error::{BeaconError, Result};
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use std::fmt;

/// Length of an encoded recoverable signature.
pub const SIGNATURE_LEN: usize = 65;

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// A secp256k1 key held in memory.
#[derive(Clone)]
pub struct LocalWallet {
    signing: SigningKey,
    address: String,
}

impl LocalWallet {
    /// Builds a wallet from a 32-byte secret given as hex.
    pub fn from_secret_hex(secret: &str) -> Result<Self> {
        let bytes = codec::from_hex(secret)?;
        Self::from_secret_bytes(&bytes)
    }

    /// Derives a wallet whose secret is the Keccak-256 digest of `passphrase`.
    ///
    /// Intended for tests and local demos only.
    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        Self::from_secret_bytes(&codec::keccak256(passphrase.as_bytes()))
    }

    fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let signing = SigningKey::from_slice(bytes)
            .map_err(|err| BeaconError::Decode(format!("invalid secp256k1 secret: {err}")))?;
        let address = address_of(&signing);
        Ok(Self { signing, address })
    }

    /// Lower-case `0x` address derived from the public key.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Signs `message` as an Ethereum personal message.
    pub fn sign_message(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
        let digest = personal_message_hash(message);
        let (signature, recovery_id) = self
            .signing
            .sign_prehash_recoverable(&digest)
            .map_err(|err| BeaconError::signing(&self.address, err.to_string()))?;
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SignerCapability for LocalWallet {
    async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
        Ok(self.sign_message(message)?.to_vec())
    }
}

/// Keccak-256 of the EIP-191 personal-message encoding of `message`.
pub fn personal_message_hash(message: &[u8]) -> Digest32 {
    let len = message.len().to_string();
    let mut payload =
        Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + len.len() + message.len());
    payload.extend_from_slice(PERSONAL_MESSAGE_PREFIX);
    payload.extend_from_slice(len.as_bytes());
    payload.extend_from_slice(message);
    codec::keccak256(&payload)
}

/// Returns true for `0x` followed by exactly 40 hex digits.
pub fn is_valid_evm_address(value: &str) -> bool {
    let Some(raw) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) else {
        return false;
    };
    raw.len() == 40 && raw.chars().all(|c| c.is_ascii_hexdigit())
}

fn address_of(signing: &SigningKey) -> String {
    let point = signing.verifying_key().to_encoded_point(false);
    let digest = codec::keccak256(&point.as_bytes()[1..]);
    codec::to_prefixed_hex(&digest[12..])
}
