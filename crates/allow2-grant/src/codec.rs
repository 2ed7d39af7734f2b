//! QR grant token wire format: `HEADER.PAYLOAD.SIGNATURE`, base64url
//! segments over canonical JSON, Ed25519-signed (§4.2).

use crate::grant::{Grant, GrantType};
use allow2_core::{Allow2Config, Allow2Error, Result};
use allow2_crypto::{CryptoProvider, Signature, SigningKey, VerifyingKey};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::DateTime;
use serde_json::{Map, Value};

const ALG: &str = "EdDSA";

fn canonical_header(key_id: &str) -> String {
    let mut map = Map::new();
    map.insert("alg".to_string(), Value::String(ALG.to_string()));
    map.insert("kid".to_string(), Value::String(key_id.to_string()));
    // serde_json's Map is BTreeMap-backed (the `preserve_order` feature is
    // not enabled), so this emits keys in sorted order: "alg" before "kid".
    serde_json::to_string(&Value::Object(map)).expect("map of strings always serializes")
}

fn canonical_payload(grant: &Grant) -> String {
    let mut map = Map::new();
    map.insert(
        "activity_id".to_string(),
        Value::Number(grant.activity_id.into()),
    );
    map.insert(
        "child_id".to_string(),
        Value::Number(grant.child_id.into()),
    );
    map.insert("dev".to_string(), Value::String(grant.device_id.clone()));
    map.insert(
        "exp".to_string(),
        Value::Number(grant.expires_at.timestamp().into()),
    );
    map.insert(
        "iat".to_string(),
        Value::Number(grant.issued_at.timestamp().into()),
    );
    map.insert(
        "minutes".to_string(),
        Value::Number(grant.minutes.into()),
    );
    map.insert("nonce".to_string(), Value::String(grant.nonce.clone()));
    map.insert(
        "type".to_string(),
        Value::String(grant.grant_type.as_wire_str().to_string()),
    );
    serde_json::to_string(&Value::Object(map)).expect("map of scalars always serializes")
}

/// Issue a signed token for `grant`. Fails with `Invalid` if
/// `minutes > config.grant_max_minutes` or `expires_at <= issued_at`.
pub fn generate(
    provider: &dyn CryptoProvider,
    config: &Allow2Config,
    grant: &Grant,
    signing_key: &SigningKey,
    key_id: &str,
) -> Result<String> {
    if grant.minutes > config.grant_max_minutes {
        return Err(Allow2Error::invalid(format!(
            "minutes {} exceeds the {} ceiling",
            grant.minutes, config.grant_max_minutes
        )));
    }
    if grant.expires_at <= grant.issued_at {
        return Err(Allow2Error::invalid(
            "expires_at must be strictly after issued_at",
        ));
    }

    let header_b64 = URL_SAFE_NO_PAD.encode(canonical_header(key_id));
    let payload_b64 = URL_SAFE_NO_PAD.encode(canonical_payload(grant));
    let signing_input = format!("{header_b64}.{payload_b64}");
    let sig = provider.sign(signing_key, signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(sig.to_bytes());

    Ok(format!("{signing_input}.{sig_b64}"))
}

/// Parse and verify `token` against `verifying_key`. Does **not** check
/// expiry or nonce consumption — callers apply `Grant::is_expired`,
/// `Grant::matches_device`, `Grant::matches_child`, and the nonce ledger
/// themselves. Does enforce `config.grant_max_minutes` against the decoded
/// payload, the same ceiling `generate` applies on the way out.
pub fn parse_and_verify(
    provider: &dyn CryptoProvider,
    config: &Allow2Config,
    token: &str,
    verifying_key: &VerifyingKey,
) -> Result<Grant> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, sig_b64] = parts.as_slice() else {
        return Err(Allow2Error::malformed(
            "token must have exactly three dot-separated segments",
        ));
    };

    let header_json = URL_SAFE_NO_PAD.decode(header_b64)?;
    let header: Value = serde_json::from_slice(&header_json)?;
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| Allow2Error::malformed("header missing alg"))?;
    if alg != ALG {
        return Err(Allow2Error::unsupported(format!("alg {alg}")));
    }
    let key_id = header
        .get("kid")
        .and_then(Value::as_str)
        .ok_or_else(|| Allow2Error::malformed("header missing kid"))?
        .to_string();

    let payload_json = URL_SAFE_NO_PAD.decode(payload_b64)?;
    let payload: Value = serde_json::from_slice(&payload_json)?;

    let sig_bytes = URL_SAFE_NO_PAD.decode(sig_b64)?;
    let sig_bytes: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| Allow2Error::malformed("signature must be 64 bytes"))?;
    let signature = Signature::from_bytes(&sig_bytes);

    let signing_input = format!("{header_b64}.{payload_b64}");
    provider.verify(verifying_key, signing_input.as_bytes(), &signature)?;

    let grant_type = payload
        .get("type")
        .and_then(Value::as_str)
        .and_then(GrantType::from_wire_str)
        .ok_or_else(|| Allow2Error::malformed("payload has unknown or missing type"))?;
    let child_id = payload
        .get("child_id")
        .and_then(Value::as_u64)
        .ok_or_else(|| Allow2Error::malformed("payload missing child_id"))?;
    let activity_id = payload
        .get("activity_id")
        .and_then(Value::as_u64)
        .ok_or_else(|| Allow2Error::malformed("payload missing activity_id"))?;
    let minutes = payload
        .get("minutes")
        .and_then(Value::as_u64)
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| Allow2Error::malformed("payload missing or invalid minutes"))?;
    if minutes > config.grant_max_minutes {
        return Err(Allow2Error::invalid(format!(
            "minutes {} exceeds the {} ceiling",
            minutes, config.grant_max_minutes
        )));
    }
    let iat = payload
        .get("iat")
        .and_then(Value::as_i64)
        .ok_or_else(|| Allow2Error::malformed("payload missing iat"))?;
    let exp = payload
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or_else(|| Allow2Error::malformed("payload missing exp"))?;
    let nonce = payload
        .get("nonce")
        .and_then(Value::as_str)
        .ok_or_else(|| Allow2Error::malformed("payload missing nonce"))?
        .to_string();
    let device_id = payload
        .get("dev")
        .and_then(Value::as_str)
        .ok_or_else(|| Allow2Error::malformed("payload missing dev"))?
        .to_string();

    Ok(Grant {
        grant_type,
        child_id,
        activity_id,
        minutes,
        issued_at: DateTime::from_timestamp(iat, 0)
            .ok_or_else(|| Allow2Error::malformed("iat out of range"))?,
        expires_at: DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| Allow2Error::malformed("exp out of range"))?,
        nonce,
        device_id,
        key_id,
    })
}
