//! Command-line front end for the witness beacon pipeline.
//!
//! Computes claim identifiers, selection seeds and witness selections from
//! local JSON documents so operators can check what a node or client should
//! have chosen. Results go to stdout as plain values or JSON documents;
//! `QSYS|...` status lines and errors go to stderr.

use std::{collections::HashMap, env, fs, path::Path, sync::Arc};
use witness_beacon::{
    derive_seed, fetch_witness_list_for_claim, hash_claim_info, BeaconState, ClaimInfo,
    ClaimSource, CollectorConfig, LocalWallet, SignatureCollector, WitnessSignature,
    WitnessSigner,
};

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_help() {
    println!("Usage: beacon <hash-claim|seed|select|sign> ...");
    println!("  hash-claim --provider <p> --parameters <json> --context-address <addr> --context-message <msg>");
    println!("  seed --identifier <id> --epoch <N> --required <K> --timestamp <secs>");
    println!("  select --state <state.json> (--identifier <id> | --claim <claim.json>) --timestamp <secs>");
    println!("  sign --state <state.json> --keys <keys.json> (--identifier <id> | --claim <claim.json>)");
    println!("       --timestamp <secs> --message <text>");
    println!("  (WB_SIGN_TIMEOUT_MS bounds each witness signature, 0 disables)");
}

fn main() {
    let mut args = env::args().skip(1);
    let command = args.next();
    match command.as_deref() {
        Some("hash-claim") => cmd_hash_claim(args.collect()),
        Some("seed") => cmd_seed(args.collect()),
        Some("select") => cmd_select(args.collect()),
        Some("sign") => cmd_sign(args.collect()),
        Some("-h") | Some("--help") => print_help(),
        _ => {
            eprintln!("Usage: beacon <hash-claim|seed|select|sign> ...");
            std::process::exit(1);
        }
    }
}

fn next_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> String {
    iter.next()
        .unwrap_or_else(|| fatal(&format!("{flag} expects a value")))
}

fn parse_number<T: std::str::FromStr>(raw: &str, flag: &str) -> T {
    raw.parse::<T>()
        .unwrap_or_else(|_| fatal(&format!("invalid {flag}")))
}

fn load_state(path: &str) -> BeaconState {
    let state = BeaconState::load(Path::new(path))
        .unwrap_or_else(|err| fatal(&format!("failed to load state: {err}")));
    if let Err(err) = state.validate() {
        fatal(&format!("invalid state {path}: {err}"));
    }
    state
}

fn load_claim(path: &str) -> ClaimInfo {
    let raw = fs::read_to_string(path)
        .unwrap_or_else(|err| fatal(&format!("failed to read {path}: {err}")));
    serde_json::from_str::<ClaimInfo>(&raw)
        .unwrap_or_else(|err| fatal(&format!("invalid claim JSON {path}: {err}")))
}

fn claim_source<'a>(
    identifier: Option<&'a str>,
    claim: Option<&'a ClaimInfo>,
) -> Result<ClaimSource<'a>, String> {
    match (identifier, claim) {
        (Some(id), None) => Ok(ClaimSource::Identifier(id)),
        (None, Some(info)) => Ok(ClaimSource::Claim(info)),
        _ => Err("exactly one of --identifier or --claim is required".to_string()),
    }
}

/// Builds one in-memory signer per pool witness, in pool order.
fn signers_from_keys(
    state: &BeaconState,
    keys: &HashMap<String, String>,
) -> Result<Vec<WitnessSigner>, String> {
    state
        .witnesses
        .iter()
        .map(|w| -> Result<WitnessSigner, String> {
            let secret = keys
                .get(&w.id)
                .ok_or_else(|| format!("no key for witness {}", w.id))?;
            let wallet = LocalWallet::from_secret_hex(secret)
                .map_err(|err| format!("bad key for witness {}: {err}", w.id))?;
            Ok(WitnessSigner::new(w.id.clone(), w.url.clone(), Arc::new(wallet)))
        })
        .collect()
}

fn signatures_json(signatures: &[WitnessSignature]) -> serde_json::Value {
    signatures
        .iter()
        .map(|sig| {
            serde_json::json!({
                "witness": sig.witness_id,
                "signature": sig.to_hex(),
            })
        })
        .collect()
}

fn cmd_hash_claim(args: Vec<String>) {
    let mut provider: Option<String> = None;
    let mut parameters: Option<String> = None;
    let mut context_address: Option<String> = None;
    let mut context_message: Option<String> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--provider" => provider = Some(next_value(&mut iter, "--provider")),
            "--parameters" => parameters = Some(next_value(&mut iter, "--parameters")),
            "--context-address" => {
                context_address = Some(next_value(&mut iter, "--context-address"))
            }
            "--context-message" => {
                context_message = Some(next_value(&mut iter, "--context-message"))
            }
            other => fatal(&format!("unknown argument: {other}")),
        }
    }

    let info = ClaimInfo::new(
        provider.unwrap_or_else(|| fatal("--provider is required")),
        parameters.unwrap_or_default(),
        context_address.unwrap_or_default(),
        context_message.unwrap_or_default(),
    );
    match hash_claim_info(&info) {
        Ok(id) => println!("{id}"),
        Err(err) => fatal(&format!("hash-claim failed: {err}")),
    }
}

fn cmd_seed(args: Vec<String>) {
    let mut identifier: Option<String> = None;
    let mut epoch: Option<u64> = None;
    let mut required: Option<usize> = None;
    let mut timestamp: Option<u64> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--identifier" => identifier = Some(next_value(&mut iter, "--identifier")),
            "--epoch" => epoch = Some(parse_number(&next_value(&mut iter, "--epoch"), "--epoch")),
            "--required" => {
                required = Some(parse_number(
                    &next_value(&mut iter, "--required"),
                    "--required",
                ))
            }
            "--timestamp" => {
                timestamp = Some(parse_number(
                    &next_value(&mut iter, "--timestamp"),
                    "--timestamp",
                ))
            }
            other => fatal(&format!("unknown argument: {other}")),
        }
    }

    let identifier = identifier.unwrap_or_else(|| fatal("--identifier is required"));
    let epoch = epoch.unwrap_or_else(|| fatal("--epoch is required"));
    let required = required.unwrap_or_else(|| fatal("--required is required"));
    let timestamp = timestamp.unwrap_or_else(|| fatal("--timestamp is required"));
    println!("{}", derive_seed(&identifier, epoch, required, timestamp).to_hex());
}

fn cmd_select(args: Vec<String>) {
    let mut state_path: Option<String> = None;
    let mut identifier: Option<String> = None;
    let mut claim_path: Option<String> = None;
    let mut timestamp: Option<u64> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--state" => state_path = Some(next_value(&mut iter, "--state")),
            "--identifier" => identifier = Some(next_value(&mut iter, "--identifier")),
            "--claim" => claim_path = Some(next_value(&mut iter, "--claim")),
            "--timestamp" => {
                timestamp = Some(parse_number(
                    &next_value(&mut iter, "--timestamp"),
                    "--timestamp",
                ))
            }
            other => fatal(&format!("unknown argument: {other}")),
        }
    }

    let state_path = state_path.unwrap_or_else(|| fatal("--state is required"));
    let timestamp = timestamp.unwrap_or_else(|| fatal("--timestamp is required"));
    let state = load_state(&state_path);
    let claim = claim_path.as_deref().map(load_claim);
    let source =
        claim_source(identifier.as_deref(), claim.as_ref()).unwrap_or_else(|err| fatal(&err));
    let resolved = source
        .identifier()
        .unwrap_or_else(|err| fatal(&format!("failed to hash claim: {err}")));

    let selected = fetch_witness_list_for_claim(&state, source, timestamp)
        .unwrap_or_else(|err| fatal(&format!("selection failed: {err}")));
    eprintln!(
        "QSYS|mod=BEACON|evt=SELECT|id={resolved}|epoch={}|required={}|ts={timestamp}|picked={}",
        state.epoch,
        state.witnesses_required_for_claim,
        selected
            .iter()
            .map(|w| w.id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );
    match serde_json::to_string_pretty(&selected) {
        Ok(json) => println!("{json}"),
        Err(err) => fatal(&format!("failed to encode selection: {err}")),
    }
}

fn cmd_sign(args: Vec<String>) {
    let mut state_path: Option<String> = None;
    let mut keys_path: Option<String> = None;
    let mut identifier: Option<String> = None;
    let mut claim_path: Option<String> = None;
    let mut timestamp: Option<u64> = None;
    let mut message: Option<String> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--state" => state_path = Some(next_value(&mut iter, "--state")),
            "--keys" => keys_path = Some(next_value(&mut iter, "--keys")),
            "--identifier" => identifier = Some(next_value(&mut iter, "--identifier")),
            "--claim" => claim_path = Some(next_value(&mut iter, "--claim")),
            "--timestamp" => {
                timestamp = Some(parse_number(
                    &next_value(&mut iter, "--timestamp"),
                    "--timestamp",
                ))
            }
            "--message" => message = Some(next_value(&mut iter, "--message")),
            other => fatal(&format!("unknown argument: {other}")),
        }
    }

    let state = load_state(&state_path.unwrap_or_else(|| fatal("--state is required")));
    let keys_path = keys_path.unwrap_or_else(|| fatal("--keys is required"));
    let timestamp = timestamp.unwrap_or_else(|| fatal("--timestamp is required"));
    let message = message.unwrap_or_else(|| fatal("--message is required"));
    let claim = claim_path.as_deref().map(load_claim);
    let source =
        claim_source(identifier.as_deref(), claim.as_ref()).unwrap_or_else(|err| fatal(&err));

    let raw_keys = fs::read_to_string(&keys_path)
        .unwrap_or_else(|err| fatal(&format!("failed to read {keys_path}: {err}")));
    let keys: HashMap<String, String> = serde_json::from_str(&raw_keys)
        .unwrap_or_else(|err| fatal(&format!("invalid keys JSON {keys_path}: {err}")));
    let signers = signers_from_keys(&state, &keys).unwrap_or_else(|err| fatal(&err));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| fatal(&format!("failed to start runtime: {err}")));
    let collector = SignatureCollector::new(CollectorConfig::from_env());
    let signatures = runtime
        .block_on(collector.collect(
            &signers,
            message.as_bytes(),
            state.epoch,
            timestamp,
            state.witnesses_required_for_claim,
            source,
        ))
        .unwrap_or_else(|err| fatal(&format!("signing failed: {err}")));

    eprintln!(
        "QSYS|mod=BEACON|evt=SIGN|epoch={}|ts={timestamp}|signatures={}",
        state.epoch,
        signatures.len()
    );
    match serde_json::to_string_pretty(&signatures_json(&signatures)) {
        Ok(json) => println!("{json}"),
        Err(err) => fatal(&format!("failed to encode signatures: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use witness_beacon::WitnessMeta;

    fn state() -> BeaconState {
        BeaconState {
            witnesses: vec![
                WitnessMeta::new("w1", "wss://w1"),
                WitnessMeta::new("w2", "wss://w2"),
            ],
            witnesses_required_for_claim: 1,
            epoch: 5,
            next_epoch_timestamp_s: 0,
        }
    }

    fn keys(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(id, secret)| (id.to_string(), secret.to_string()))
            .collect()
    }

    const K1: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const K2: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn identifier_and_claim_are_mutually_exclusive() {
        let info = ClaimInfo::new("github", "{}", "0xabc", "hello");
        assert!(matches!(
            claim_source(Some("claim1"), None),
            Ok(ClaimSource::Identifier("claim1"))
        ));
        assert!(matches!(
            claim_source(None, Some(&info)),
            Ok(ClaimSource::Claim(_))
        ));
        assert!(claim_source(Some("claim1"), Some(&info)).is_err());
        assert!(claim_source(None, None).is_err());
    }

    #[test]
    fn every_witness_needs_a_key() {
        let signers = signers_from_keys(&state(), &keys(&[("w1", K1), ("w2", K2)])).unwrap();
        let ids: Vec<&str> = signers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["w1", "w2"]);

        let err = signers_from_keys(&state(), &keys(&[("w1", K1)])).unwrap_err();
        assert_eq!(err, "no key for witness w2");

        let err = signers_from_keys(&state(), &keys(&[("w1", K1), ("w2", "0x00")])).unwrap_err();
        assert!(err.starts_with("bad key for witness w2"));
    }

    #[test]
    fn signature_document_shape() {
        let doc = signatures_json(&[WitnessSignature {
            witness_id: "w2".into(),
            signature: vec![0xab, 0xcd],
        }]);
        assert_eq!(doc, serde_json::json!([{ "witness": "w2", "signature": "0xabcd" }]));
    }
}
