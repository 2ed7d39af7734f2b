//! Ties request parsing, approval validation, and nonce consumption into
//! the single call sites the child device actually needs.

use crate::approval::validate_approval_code;
use crate::request::{parse, VoiceRequest, VoiceRequestType};
use allow2_core::{Allow2Config, Allow2Error, ChildId, Result};
use allow2_crypto::CryptoProvider;
use allow2_deficit::DeficitLedger;
use allow2_grant::NonceLedger;
use chrono::{DateTime, Utc};
use std::time::Duration as StdDuration;

/// Parse and validate a set of request codes against a supplied approval
/// code, consuming their embedded nonces on success. Returns the parsed
/// requests in the order given.
///
/// Reserved multi-code type digits (7–9) fail the whole batch with
/// `Unsupported` rather than partially applying, since the source
/// interface declares the combining rule but never specifies it.
///
/// `child_id` identifies whose `DeficitLedger` entry governs this batch —
/// the six-digit wire format carries no child identity of its own, so the
/// caller (the device already knows which child it belongs to) supplies
/// it. Per §4.5, any `VoiceRequestType::Extend` request is refused with
/// `DeficitExceeded` while that child's deficit is at or past the ceiling,
/// even if the approval code itself validates.
#[allow(clippy::too_many_arguments)]
pub fn validate_and_consume(
    provider: &dyn CryptoProvider,
    ledger: &mut NonceLedger,
    deficit: &DeficitLedger,
    config: &Allow2Config,
    child_id: ChildId,
    request_strs: &[&str],
    approval_code: &str,
    key: &[u8; 32],
    now: DateTime<Utc>,
) -> Result<Vec<VoiceRequest>> {
    let requests: Vec<VoiceRequest> = request_strs
        .iter()
        .map(|s| parse(config, s))
        .collect::<Result<_>>()?;

    if let Some(req) = requests
        .iter()
        .find(|r| matches!(r.request_type, VoiceRequestType::MultiCode(_)))
    {
        return Err(Allow2Error::unsupported(format!(
            "multi-code request type {:?} has no combining rule yet",
            req.request_type
        )));
    }

    let codes: Vec<String> = requests.iter().map(|r| r.code.clone()).collect();
    validate_approval_code(
        provider,
        key,
        &codes,
        approval_code,
        now.timestamp(),
        config.voice_bucket_sec,
        config.voice_drift_buckets,
    )?;

    let requests_extend_time = requests
        .iter()
        .any(|r| matches!(r.request_type, VoiceRequestType::Extend));
    if requests_extend_time && deficit.is_exceeded(config, child_id) {
        return Err(Allow2Error::DeficitExceeded);
    }

    for req in &requests {
        if ledger.contains(&req.code) {
            return Err(Allow2Error::Replay {
                nonce: req.code.clone(),
            });
        }
    }
    for req in &requests {
        ledger.record(req.code.clone(), now, config, StdDuration::ZERO);
    }

    tracing::debug!(count = requests.len(), "voice code batch approved");
    Ok(requests)
}
