//! Signature collection from the witnesses selected for a claim.
//!
//! Only the witnesses picked by [`fetch_witness_list_for_claim`] are asked to
//! sign. Requests are issued concurrently and joined; the output follows
//! selection order. The first failure or timeout aborts the collection and
//! drops every request still in flight, so callers never see a partial set.

use crate::beacon::{ensure_unique_ids, fetch_witness_list_for_claim, BeaconState, ClaimSource};
use crate::codec;
use crate::config::CollectorConfig;
use crate::error::{BeaconError, Result};
use crate::sampler::WitnessMeta;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Error type returned by signer implementations.
pub type SignerError = Box<dyn std::error::Error + Send + Sync>;

/// Something that can sign on behalf of a witness (key, device, remote
/// service).
#[async_trait]
pub trait SignerCapability: Send + Sync {
    /// Signs `message`, returning the encoded signature.
    async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignerError>;
}

/// A witness together with its signing handle.
#[derive(Clone)]
pub struct WitnessSigner {
    /// Witness id, unique within the pool.
    pub id: String,
    /// Endpoint the witness is reachable at.
    pub url: String,
    /// Signing handle.
    pub signer: Arc<dyn SignerCapability>,
}

impl WitnessSigner {
    /// Convenience constructor.
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        signer: Arc<dyn SignerCapability>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            signer,
        }
    }

    /// Identity/address view used for selection.
    pub fn meta(&self) -> WitnessMeta {
        WitnessMeta::new(self.id.clone(), self.url.clone())
    }
}

impl fmt::Debug for WitnessSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WitnessSigner")
            .field("id", &self.id)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Signature produced by one selected witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessSignature {
    /// Id of the signing witness.
    pub witness_id: String,
    /// Signature bytes as returned by the signer.
    pub signature: Vec<u8>,
}

impl WitnessSignature {
    /// `0x`-prefixed lower-case hex of the signature.
    pub fn to_hex(&self) -> String {
        codec::to_prefixed_hex(&self.signature)
    }
}

/// Selects witnesses for a claim and gathers their signatures.
#[derive(Debug, Clone, Default)]
pub struct SignatureCollector {
    config: CollectorConfig,
}

impl SignatureCollector {
    /// Creates a collector with the given configuration.
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Asks the witnesses selected for `source` to sign `message`.
    ///
    /// Selection runs over `witnesses` in the order given, exactly as
    /// [`fetch_witness_list_for_claim`] would for a beacon state holding the
    /// same pool. Signatures come back in selection order.
    ///
    /// # Panics
    ///
    /// When [`CollectorConfig::sign_timeout`] is set (the default), the
    /// timeout is driven by `tokio::time`, so polling this future outside a
    /// Tokio runtime panics. Use [`CollectorConfig::unbounded`] to collect on
    /// another executor.
    pub async fn collect<'a>(
        &self,
        witnesses: &[WitnessSigner],
        message: &[u8],
        epoch: u64,
        timestamp_s: u64,
        required_count: usize,
        source: impl Into<ClaimSource<'a>>,
    ) -> Result<Vec<WitnessSignature>> {
        ensure_unique_ids(witnesses.iter().map(|w| w.id.as_str()))?;
        let state = BeaconState {
            witnesses: witnesses.iter().map(WitnessSigner::meta).collect(),
            witnesses_required_for_claim: required_count,
            epoch,
            next_epoch_timestamp_s: 0,
        };
        let selected = fetch_witness_list_for_claim(&state, source, timestamp_s)?;
        let selected_ids: Vec<&str> = selected.iter().map(|w| w.id.as_str()).collect();
        debug!(
            epoch,
            timestamp_s,
            required_count,
            selected = ?selected_ids,
            "witnesses selected for signing"
        );

        let signers = selected
            .iter()
            .map(|meta| {
                witnesses
                    .iter()
                    .find(|w| w.id == meta.id)
                    .ok_or_else(|| BeaconError::UnknownWitness {
                        id: meta.id.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        try_join_all(signers.into_iter().map(|w| self.sign_one(w, message))).await
    }

    async fn sign_one(&self, witness: &WitnessSigner, message: &[u8]) -> Result<WitnessSignature> {
        let request = witness.signer.sign(message);
        let outcome = match self.config.sign_timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    warn!(witness = %witness.id, timeout_ms, "witness signing timed out");
                    return Err(BeaconError::SigningTimeout {
                        witness_id: witness.id.clone(),
                        timeout_ms,
                    });
                }
            },
            None => request.await,
        };
        match outcome {
            Ok(signature) => Ok(WitnessSignature {
                witness_id: witness.id.clone(),
                signature,
            }),
            Err(err) => {
                warn!(witness = %witness.id, error = %err, "witness signing failed");
                Err(BeaconError::signing(&witness.id, err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{hash_claim_info, ClaimInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct EchoSigner {
        tag: &'static str,
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl SignerCapability for EchoSigner {
        async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut out = self.tag.as_bytes().to_vec();
            out.push(b':');
            out.extend_from_slice(message);
            Ok(out)
        }
    }

    struct BrokenSigner;

    #[async_trait]
    impl SignerCapability for BrokenSigner {
        async fn sign(&self, _message: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
            Err("hardware key unavailable".into())
        }
    }

    fn echo(tag: &'static str, calls: &Arc<AtomicUsize>, delay: Duration) -> Arc<dyn SignerCapability> {
        Arc::new(EchoSigner {
            tag,
            calls: Arc::clone(calls),
            delay,
        })
    }

    fn pool(calls: &Arc<AtomicUsize>) -> Vec<WitnessSigner> {
        ["w1", "w2", "w3"]
            .into_iter()
            .map(|id| WitnessSigner::new(id, format!("wss://{id}.example"), echo(id, calls, Duration::ZERO)))
            .collect()
    }

    fn ids(signatures: &[WitnessSignature]) -> Vec<&str> {
        signatures.iter().map(|s| s.witness_id.as_str()).collect()
    }

    #[tokio::test]
    async fn only_selected_witnesses_sign() {
        let calls = Arc::new(AtomicUsize::new(0));
        let collector = SignatureCollector::default();
        let signatures = collector
            .collect(&pool(&calls), b"attest", 5, 1_700_000_000, 2, "claim1")
            .await
            .unwrap();
        assert_eq!(ids(&signatures), ["w2", "w3"]);
        assert_eq!(signatures[0].signature, b"w2:attest");
        assert_eq!(signatures[1].signature, b"w3:attest");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn signatures_follow_selection_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let signatures = SignatureCollector::default()
            .collect(&pool(&calls), b"m", 5, 1_700_000_005, 2, "claim-order")
            .await
            .unwrap();
        assert_eq!(ids(&signatures), ["w3", "w2"]);
    }

    #[tokio::test]
    async fn slow_signers_do_not_reorder_output() {
        let calls = Arc::new(AtomicUsize::new(0));
        let witnesses = vec![
            WitnessSigner::new("w1", "wss://w1", echo("w1", &calls, Duration::ZERO)),
            WitnessSigner::new("w2", "wss://w2", echo("w2", &calls, Duration::from_millis(40))),
            WitnessSigner::new("w3", "wss://w3", echo("w3", &calls, Duration::ZERO)),
        ];
        let signatures = SignatureCollector::default()
            .collect(&witnesses, b"m", 5, 1_700_000_000, 2, "claim1")
            .await
            .unwrap();
        assert_eq!(ids(&signatures), ["w2", "w3"]);
    }

    #[tokio::test]
    async fn claim_info_source_matches_its_identifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let info = ClaimInfo::new("github", r#"{"userId":"42"}"#, "0xabc", "hello");
        let id = hash_claim_info(&info).unwrap().to_string();
        let collector = SignatureCollector::default();
        let via_info = collector
            .collect(&pool(&calls), b"m", 5, 1_700_000_000, 2, &info)
            .await
            .unwrap();
        let via_id = collector
            .collect(&pool(&calls), b"m", 5, 1_700_000_000, 2, &id)
            .await
            .unwrap();
        assert_eq!(via_info, via_id);
    }

    #[tokio::test]
    async fn failing_selected_witness_aborts_collection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut witnesses = pool(&calls);
        witnesses[2].signer = Arc::new(BrokenSigner);
        let err = SignatureCollector::default()
            .collect(&witnesses, b"m", 5, 1_700_000_000, 2, "claim1")
            .await
            .unwrap_err();
        match err {
            BeaconError::Signing { witness_id, reason } => {
                assert_eq!(witness_id, "w3");
                assert!(reason.contains("hardware key unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_selected_witness_failure_aborts_collection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let witnesses = vec![
            WitnessSigner::new("w1", "wss://w1", echo("w1", &calls, Duration::ZERO)),
            WitnessSigner::new("w2", "wss://w2", Arc::new(BrokenSigner)),
            WitnessSigner::new("w3", "wss://w3", echo("w3", &calls, Duration::from_millis(20))),
        ];
        let err = SignatureCollector::default()
            .collect(&witnesses, b"m", 5, 1_700_000_000, 2, "claim1")
            .await
            .unwrap_err();
        assert!(matches!(err, BeaconError::Signing { ref witness_id, .. } if witness_id == "w2"));
    }

    #[tokio::test]
    async fn unselected_failing_witness_is_never_asked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut witnesses = pool(&calls);
        witnesses[0].signer = Arc::new(BrokenSigner);
        let signatures = SignatureCollector::default()
            .collect(&witnesses, b"m", 5, 1_700_000_000, 2, "claim1")
            .await
            .unwrap();
        assert_eq!(ids(&signatures), ["w2", "w3"]);
    }

    #[tokio::test]
    async fn first_failure_does_not_wait_for_stragglers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let witnesses = vec![
            WitnessSigner::new("w1", "wss://w1", echo("w1", &calls, Duration::ZERO)),
            WitnessSigner::new("w2", "wss://w2", echo("w2", &calls, Duration::from_secs(60))),
            WitnessSigner::new("w3", "wss://w3", Arc::new(BrokenSigner)),
        ];
        let collector = SignatureCollector::new(CollectorConfig::unbounded());
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            collector.collect(&witnesses, b"m", 5, 1_700_000_000, 2, "claim1"),
        )
        .await
        .expect("collection should fail fast");
        assert!(matches!(outcome, Err(BeaconError::Signing { ref witness_id, .. }) if witness_id == "w3"));
    }

    #[tokio::test]
    async fn slow_witness_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut witnesses = pool(&calls);
        witnesses[1].signer = echo("w2", &calls, Duration::from_secs(30));
        let collector = SignatureCollector::new(CollectorConfig::with_timeout(Duration::from_millis(50)));
        let err = collector
            .collect(&witnesses, b"m", 5, 1_700_000_000, 2, "claim1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BeaconError::SigningTimeout { ref witness_id, timeout_ms: 50 } if witness_id == "w2"
        ));
    }

    #[tokio::test]
    async fn input_errors_surface_before_signing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let collector = SignatureCollector::default();

        let err = collector
            .collect(&pool(&calls), b"m", 5, 1, 4, "claim1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BeaconError::InsufficientWitnesses {
                required: 4,
                available: 3
            }
        ));

        let mut witnesses = pool(&calls);
        witnesses[2].id = "w1".to_string();
        let err = collector
            .collect(&witnesses, b"m", 5, 1, 1, "claim1")
            .await
            .unwrap_err();
        assert!(matches!(err, BeaconError::DuplicateWitness { ref id } if id == "w1"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_required_collects_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let signatures = SignatureCollector::default()
            .collect(&pool(&calls), b"m", 5, 1, 0, "claim1")
            .await
            .unwrap();
        assert!(signatures.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn signature_hex_is_prefixed() {
        let sig = WitnessSignature {
            witness_id: "w1".into(),
            signature: vec![0xde, 0xad],
        };
        assert_eq!(sig.to_hex(), "0xdead");
    }
}
