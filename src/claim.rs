//! Canonical claim identifiers.
//!
//! A claim is identified by the Keccak-256 digest of a newline-joined
//! pre-image:
//!
//! ```text
//! <provider>\n<parameters>\n{"contextAddress":"<address>","contextMessage":"<message>"}
//! ```
//!
//! The context object is compact JSON with exactly those two keys in that
//! order. Any whitespace or key-order difference changes the identifier, so
//! the pre-image is produced by a field-ordered serde struct rather than a
//! map.

use crate::codec::{self, Digest32, DIGEST_LEN};
use crate::error::{BeaconError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metadata describing a claim, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInfo {
    /// Provider name, e.g. `"github"`.
    pub provider: String,
    /// Provider-specific parameters, usually a JSON string.
    pub parameters: String,
    /// Address the claim is bound to, in its string form.
    pub context_address: String,
    /// Free-form context message.
    pub context_message: String,
}

#[derive(Serialize)]
struct SerializedContext<'a> {
    #[serde(rename = "contextAddress")]
    context_address: &'a str,
    #[serde(rename = "contextMessage")]
    context_message: &'a str,
}

impl ClaimInfo {
    /// Convenience constructor.
    pub fn new(
        provider: impl Into<String>,
        parameters: impl Into<String>,
        context_address: impl Into<String>,
        context_message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            parameters: parameters.into(),
            context_address: context_address.into(),
            context_message: context_message.into(),
        }
    }

    /// Returns the exact string whose Keccak-256 digest is the claim id.
    pub fn canonical_string(&self) -> Result<String> {
        let context = serde_json::to_string(&SerializedContext {
            context_address: &self.context_address,
            context_message: &self.context_message,
        })
        .map_err(|err| BeaconError::Encoding(format!("claim context: {err}")))?;
        Ok([self.provider.as_str(), self.parameters.as_str(), context.as_str()].join("\n"))
    }
}

/// Hashes claim metadata into its [`ClaimId`].
pub fn hash_claim_info(info: &ClaimInfo) -> Result<ClaimId> {
    let preimage = info.canonical_string()?;
    Ok(ClaimId(codec::keccak256(preimage.as_bytes())))
}

/// 32-byte claim identifier.
///
/// Displays as `0x`-prefixed lower-case hex; that string is what seed
/// derivation consumes when a selection is requested for a [`ClaimInfo`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimId(Digest32);

impl ClaimId {
    /// Wraps a raw digest.
    pub const fn from_bytes(bytes: Digest32) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &Digest32 {
        &self.0
    }

    /// Lower-case hex without prefix.
    pub fn to_hex(&self) -> String {
        codec::to_hex(self.0)
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimId({self})")
    }
}

impl FromStr for ClaimId {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = codec::from_hex(s)?;
        let digest: Digest32 = bytes.as_slice().try_into().map_err(|_| {
            BeaconError::Decode(format!(
                "claim id must be {DIGEST_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(digest))
    }
}

impl TryFrom<String> for ClaimId {
    type Error = BeaconError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLDEN_CLAIM_ID: &str =
        "0x9570408f0e81d5f4fdb31bfa1319da73eb69d2d22523fe2a7074ff62c6d91973";

    fn github_claim() -> ClaimInfo {
        ClaimInfo::new("github", r#"{"userId":"42"}"#, "0xabc", "hello")
    }

    #[test]
    fn canonical_string_layout() {
        assert_eq!(
            github_claim().canonical_string().unwrap(),
            "github\n{\"userId\":\"42\"}\n{\"contextAddress\":\"0xabc\",\"contextMessage\":\"hello\"}"
        );
    }

    #[test]
    fn golden_claim_id() {
        let id = hash_claim_info(&github_claim()).unwrap();
        assert_eq!(id.to_string(), GOLDEN_CLAIM_ID);
        assert_eq!(id.to_hex(), &GOLDEN_CLAIM_ID[2..]);
    }

    #[test]
    fn every_field_feeds_the_identifier() {
        let base = hash_claim_info(&github_claim()).unwrap();
        let mut changed = github_claim();
        changed.context_message = "hello ".to_string();
        assert_ne!(hash_claim_info(&changed).unwrap(), base);
        let mut changed = github_claim();
        changed.provider = "google".to_string();
        assert_ne!(hash_claim_info(&changed).unwrap(), base);
        let mut changed = github_claim();
        changed.context_address = "0xABC".to_string();
        assert_ne!(hash_claim_info(&changed).unwrap(), base);
    }

    #[test]
    fn context_escaping_matches_json_stringify() {
        let info = ClaimInfo::new("p", "", "0x1", "line\n\"quoted\" é\t\u{1}");
        assert_eq!(
            info.canonical_string().unwrap(),
            "p\n\n{\"contextAddress\":\"0x1\",\"contextMessage\":\"line\\n\\\"quoted\\\" é\\t\\u0001\"}"
        );
    }

    #[test]
    fn claim_id_parses_with_or_without_prefix() {
        let id: ClaimId = GOLDEN_CLAIM_ID.parse().unwrap();
        let bare: ClaimId = GOLDEN_CLAIM_ID[2..].to_uppercase().parse().unwrap();
        assert_eq!(id, bare);
        assert!(matches!(
            "0xabcd".parse::<ClaimId>(),
            Err(BeaconError::Decode(_))
        ));
    }

    #[test]
    fn claim_id_serde_uses_display_form() {
        let id: ClaimId = GOLDEN_CLAIM_ID.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{GOLDEN_CLAIM_ID}\""));
        let back: ClaimId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn claim_info_json_uses_camel_case() {
        let json = serde_json::to_value(github_claim()).unwrap();
        assert_eq!(json["contextAddress"], "0xabc");
        assert_eq!(json["contextMessage"], "hello");
    }
}
