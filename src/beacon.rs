//! Beacon state and the claim → witness list pipeline.
//!
//! [`BeaconState`] is a read-only snapshot of the witness pool published for
//! an epoch. [`fetch_witness_list_for_claim`] chains claim hashing, seed
//! derivation and sampling into the one call that servers, clients and
//! auditors run independently and must agree on.

use crate::claim::{hash_claim_info, ClaimId, ClaimInfo};
use crate::error::{BeaconError, Result};
use crate::sampler::{select_witnesses, WitnessMeta};
use crate::seed::derive_seed;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Witness pool and selection parameters for the current epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconState {
    /// Ordered witness pool. Order matters: it is the sampler's input order.
    pub witnesses: Vec<WitnessMeta>,
    /// Number of witnesses that must attest each claim.
    pub witnesses_required_for_claim: usize,
    /// Current epoch index.
    pub epoch: u64,
    /// Unix timestamp (seconds) at which the next epoch starts.
    #[serde(default)]
    pub next_epoch_timestamp_s: u64,
}

impl BeaconState {
    /// Parses a state document.
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .map_err(|err| BeaconError::Decode(format!("invalid beacon state: {err}")))
    }

    /// Loads a state document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| BeaconError::Io(format!("failed to read {}: {err}", path.display())))?;
        Self::from_json_str(&contents)
    }

    /// Checks the pool for empty or repeated ids and an unsatisfiable
    /// required count.
    pub fn validate(&self) -> Result<()> {
        ensure_unique_ids(self.witnesses.iter().map(|w| w.id.as_str()))?;
        if self.witnesses_required_for_claim > self.witnesses.len() {
            return Err(BeaconError::InsufficientWitnesses {
                required: self.witnesses_required_for_claim,
                available: self.witnesses.len(),
            });
        }
        Ok(())
    }

    /// Looks a witness up by id.
    pub fn witness(&self, id: &str) -> Option<&WitnessMeta> {
        self.witnesses.iter().find(|w| w.id == id)
    }
}

/// Rejects empty and duplicate witness ids.
pub(crate) fn ensure_unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(BeaconError::invalid_witness("witness id must not be empty"));
        }
        if !seen.insert(id) {
            return Err(BeaconError::DuplicateWitness { id: id.to_string() });
        }
    }
    Ok(())
}

/// What a selection is computed for.
#[derive(Debug, Clone, Copy)]
pub enum ClaimSource<'a> {
    /// Identifier string used verbatim as the seed input.
    Identifier(&'a str),
    /// Claim metadata; hashed first, its `0x` form becomes the identifier.
    Claim(&'a ClaimInfo),
}

impl<'a> From<&'a str> for ClaimSource<'a> {
    fn from(identifier: &'a str) -> Self {
        Self::Identifier(identifier)
    }
}

impl<'a> From<&'a String> for ClaimSource<'a> {
    fn from(identifier: &'a String) -> Self {
        Self::Identifier(identifier.as_str())
    }
}

impl<'a> From<&'a ClaimInfo> for ClaimSource<'a> {
    fn from(info: &'a ClaimInfo) -> Self {
        Self::Claim(info)
    }
}

impl ClaimSource<'_> {
    /// Resolves the identifier string fed to seed derivation.
    pub fn identifier(&self) -> Result<String> {
        match self {
            Self::Identifier(id) => Ok((*id).to_string()),
            Self::Claim(info) => hash_claim_info(info).map(|id: ClaimId| id.to_string()),
        }
    }
}

/// Computes the witnesses that must attest a claim at `timestamp_s`.
///
/// The result is in selection order, not pool order.
pub fn fetch_witness_list_for_claim<'a>(
    state: &BeaconState,
    source: impl Into<ClaimSource<'a>>,
    timestamp_s: u64,
) -> Result<Vec<WitnessMeta>> {
    let identifier = source.into().identifier()?;
    let seed = derive_seed(
        &identifier,
        state.epoch,
        state.witnesses_required_for_claim,
        timestamp_s,
    );
    select_witnesses(
        &state.witnesses,
        state.witnesses_required_for_claim,
        seed.as_bytes(),
    )
}
