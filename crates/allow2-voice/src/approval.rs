//! Approval code: a six-digit HMAC over a time-bucketed, sorted set of
//! request codes (§4.4).
//!
//! The canonicalization of the HMAC message is pinned here per the design
//! note flagging it as unspecified in the source header:
//! `"v1|" + sorted(request_codes).join("|") + "|" + bucket`.

use allow2_core::Allow2Error;
use allow2_crypto::{constant_time_eq, CryptoProvider};

/// Compute the 30-second time bucket for `now_unix`.
pub fn bucket_for(now_unix: i64, bucket_sec: i64) -> i64 {
    now_unix.div_euclid(bucket_sec)
}

fn canonical_message(request_codes: &[String], bucket: i64) -> String {
    let mut sorted = request_codes.to_vec();
    sorted.sort();
    format!("v1|{}|{}", sorted.join("|"), bucket)
}

fn code_for_bucket(
    provider: &dyn CryptoProvider,
    key: &[u8; 32],
    request_codes: &[String],
    bucket: i64,
) -> String {
    let message = canonical_message(request_codes, bucket);
    let tag = provider.hmac_sha256(key, message.as_bytes());
    let n = u32::from_be_bytes([tag[0], tag[1], tag[2], tag[3]]) % 1_000_000;
    format!("{n:06}")
}

/// Generate the approval code for `request_codes` at `now_unix`, under the
/// shared voice-code key.
pub fn generate_approval_code(
    provider: &dyn CryptoProvider,
    key: &[u8; 32],
    request_codes: &[String],
    now_unix: i64,
    bucket_sec: i64,
) -> String {
    let bucket = bucket_for(now_unix, bucket_sec);
    code_for_bucket(provider, key, request_codes, bucket)
}

/// Validate `supplied` against the approval code computed for
/// `request_codes` within `drift_buckets` either side of the bucket
/// containing `now_unix`. Tested in constant time.
pub fn validate_approval_code(
    provider: &dyn CryptoProvider,
    key: &[u8; 32],
    request_codes: &[String],
    supplied: &str,
    now_unix: i64,
    bucket_sec: i64,
    drift_buckets: i64,
) -> allow2_core::Result<()> {
    if supplied.len() != 6 || !supplied.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Allow2Error::malformed(
            "approval code must be six decimal digits",
        ));
    }

    let bucket = bucket_for(now_unix, bucket_sec);
    let mut any_match = false;
    for delta in -drift_buckets..=drift_buckets {
        let candidate = code_for_bucket(provider, key, request_codes, bucket + delta);
        any_match |= constant_time_eq(candidate.as_bytes(), supplied.as_bytes());
    }

    if any_match {
        Ok(())
    } else {
        Err(Allow2Error::BadSignature)
    }
}
