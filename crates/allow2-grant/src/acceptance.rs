//! Grant acceptance policy (§4.3): verify, check expiry, check replay, and
//! record the nonce atomically with respect to any side effect.

use crate::grant::Grant;
use crate::nonce_ledger::NonceLedger;
use allow2_core::{ActivityId, Allow2Config, Allow2Error, ChildId, Result};
use allow2_crypto::{CryptoProvider, VerifyingKey};
use chrono::{DateTime, Utc};
use std::time::Duration as StdDuration;

/// Parse, verify, and accept a QR grant token for `child_id` on
/// `device_id`. On success the nonce is recorded in `ledger` before this
/// function returns, so callers may safely apply the grant's side effect
/// immediately afterward without a further replay window.
#[allow(clippy::too_many_arguments)]
pub fn accept_grant(
    provider: &dyn CryptoProvider,
    ledger: &mut NonceLedger,
    config: &Allow2Config,
    token: &str,
    verifying_key: &VerifyingKey,
    child_id: ChildId,
    device_id: &str,
    now: DateTime<Utc>,
) -> Result<Grant> {
    let grant = crate::codec::parse_and_verify(provider, config, token, verifying_key)?;

    if grant.is_expired(now) {
        return Err(Allow2Error::Expired);
    }
    if !grant.matches_child(child_id) {
        return Err(Allow2Error::WrongChild);
    }
    if !grant.matches_device(device_id) {
        return Err(Allow2Error::WrongDevice);
    }
    if ledger.contains(&grant.nonce) {
        return Err(Allow2Error::Replay {
            nonce: grant.nonce.clone(),
        });
    }

    let grant_ttl = (grant.expires_at - grant.issued_at)
        .to_std()
        .unwrap_or(StdDuration::ZERO);
    ledger.record(grant.nonce.clone(), now, config, grant_ttl);
    tracing::debug!(nonce = %grant.nonce, child_id, "grant accepted");
    Ok(grant)
}

/// `_activity_id` is part of the acceptance contract callers typically also
/// check (a grant scoped to one activity should not unlock another); this
/// crate leaves that check to the caller since `Grant::activity_id` is a
/// plain public field, same as `matches_child`/`matches_device` expose.
pub fn matches_activity(grant: &Grant, activity_id: ActivityId) -> bool {
    grant.activity_id == activity_id
}
