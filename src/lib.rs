#![deny(missing_docs)]

//! # witness_beacon
//!
//! **witness_beacon** computes who must attest a claim. Servers, clients and
//! auditors each run the same pure pipeline over public inputs and arrive at
//! the same ordered witness subset without talking to one another:
//!
//! 1. [`hash_claim_info`] turns claim metadata into a Keccak-256 [`ClaimId`].
//! 2. [`derive_seed`] hashes `(identifier, epoch, required count, timestamp)`
//!    into a 32-byte [`SelectionSeed`].
//! 3. [`select_witnesses`] draws the required number of witnesses from the
//!    pool without replacement, four seed bytes per draw.
//! 4. [`SignatureCollector`] asks only the selected witnesses to sign, all at
//!    once, and returns their signatures in selection order.
//!
//! Steps 1–3 are synchronous and side-effect free. The hash function is part
//! of the wire format: every implementation and every on-chain verifier must
//! use Keccak-256.
//!
//! ```rust
//! use witness_beacon::{fetch_witness_list_for_claim, BeaconState, ClaimInfo, WitnessMeta};
//!
//! let state = BeaconState {
//!     witnesses: vec![
//!         WitnessMeta::new("w1", "wss://w1.example"),
//!         WitnessMeta::new("w2", "wss://w2.example"),
//!         WitnessMeta::new("w3", "wss://w3.example"),
//!     ],
//!     witnesses_required_for_claim: 2,
//!     epoch: 5,
//!     next_epoch_timestamp_s: 0,
//! };
//! let claim = ClaimInfo::new("github", r#"{"userId":"42"}"#, "0xabc", "hello");
//! let selected = fetch_witness_list_for_claim(&state, &claim, 1_700_000_000).unwrap();
//! assert_eq!(selected.len(), 2);
//!
//! // The same pipeline, step by step.
//! let id = witness_beacon::claim::hash_claim_info(&claim).unwrap().to_string();
//! let seed = witness_beacon::seed::derive_seed(&id, 5, 2, 1_700_000_000);
//! let again = witness_beacon::sampler::select_witnesses(&state.witnesses, 2, seed.as_bytes()).unwrap();
//! assert_eq!(again, selected);
//! ```

pub mod beacon;
pub mod claim;
pub mod codec;
pub mod collector;
pub mod config;
pub mod error;
pub mod sampler;
pub mod seed;
pub mod wallet;

pub use beacon::{fetch_witness_list_for_claim, BeaconState, ClaimSource};
pub use claim::{hash_claim_info, ClaimId, ClaimInfo};
pub use collector::{
    SignatureCollector, SignerCapability, SignerError, WitnessSignature, WitnessSigner,
};
pub use config::CollectorConfig;
pub use error::{BeaconError, Result};
pub use sampler::{select_witnesses, WitnessMeta, CHUNK_LEN};
pub use seed::{derive_seed, SelectionSeed};
pub use wallet::LocalWallet;
