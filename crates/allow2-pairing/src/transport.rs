//! The external pairing RPC surface (§6), expressed as a trait so the
//! core never implements HTTP itself.

use allow2_core::{ChildId, Result};

/// QR or PIN pairing, chosen by the caller at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingMode {
    /// Parent scans a QR code shown on the child device.
    Qr,
    /// Parent enters a short PIN shown on the child device.
    Pin,
}

impl PairingMode {
    /// The wire value sent as `mode` in `POST /pair/init`.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Pin => "pin",
        }
    }
}

/// A managed child profile as reported by `GET /pair/status`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChildSummary {
    /// The child's identifier.
    pub id: ChildId,
    /// Display name.
    pub name: String,
}

/// `POST /pair/init` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResponse {
    /// Opaque identifier for this pairing attempt.
    pub session_id: String,
    /// Seconds until the session expires if not completed.
    pub expires_in_secs: u64,
    /// QR-mode payload to render as a code, if `mode == Qr`.
    pub qr_payload: Option<String>,
    /// PIN-mode code to display, if `mode == Pin`.
    pub pin_code: Option<String>,
}

/// `GET /pair/status` response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusResponse {
    /// The session has reached a terminal outcome.
    pub completed: bool,
    /// Only meaningful when `completed`: whether it succeeded.
    pub success: bool,
    /// QR mode only: whether the code has been scanned.
    pub scanned: Option<bool>,
    /// Present once the parent has authenticated.
    pub user_id: Option<String>,
    /// Present on success.
    pub pair_id: Option<String>,
    /// Present on success.
    pub pair_token: Option<String>,
    /// Present on success.
    pub children: Vec<ChildSummary>,
    /// Present when `completed && !success`; routes to `Expired` /
    /// `Declined` / `Failed` by substring match.
    pub error: Option<String>,
}

/// Abstract request/response interface standing in for the pairing
/// server. Implementations may suspend (network I/O); the core never
/// assumes synchronous completion.
#[async_trait::async_trait]
pub trait PairingTransport: Send + Sync {
    /// `POST /pair/init`.
    async fn init(
        &self,
        device_token: &str,
        device_name: &str,
        mode: PairingMode,
    ) -> Result<InitResponse>;

    /// `GET /pair/status?session=...`.
    async fn status(&self, session_id: &str) -> Result<StatusResponse>;

    /// `POST /pair/cancel`. Best-effort: callers do not fail the local
    /// state transition on an error from this call.
    async fn cancel(&self, session_id: &str) -> Result<()>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    //! A scriptable [`PairingTransport`] fake driven by a queued sequence
    //! of status responses, for exercising [`crate::PairingSession`]
    //! without a real RPC client.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A fake transport whose `init` always succeeds with a fixed
    /// response and whose `status` replies are drawn from a queue,
    /// repeating the last queued response once exhausted.
    pub struct FakeTransport {
        init_response: InitResponse,
        statuses: Mutex<VecDeque<StatusResponse>>,
        cancelled: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        /// Build a fake that answers `init` with `init_response` and
        /// `status` with each of `statuses` in turn.
        pub fn new(init_response: InitResponse, statuses: Vec<StatusResponse>) -> Self {
            Self {
                init_response,
                statuses: Mutex::new(statuses.into()),
                cancelled: Mutex::new(Vec::new()),
            }
        }

        /// Session ids that `cancel` was called with, in order.
        pub fn cancelled_sessions(&self) -> Vec<String> {
            self.cancelled.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PairingTransport for FakeTransport {
        async fn init(
            &self,
            _device_token: &str,
            _device_name: &str,
            _mode: PairingMode,
        ) -> Result<InitResponse> {
            Ok(self.init_response.clone())
        }

        async fn status(&self, _session_id: &str) -> Result<StatusResponse> {
            let mut queue = self.statuses.lock().unwrap();
            match queue.pop_front() {
                Some(next) => {
                    if queue.is_empty() {
                        queue.push_back(next.clone());
                    }
                    Ok(next)
                }
                None => Ok(StatusResponse::default()),
            }
        }

        async fn cancel(&self, session_id: &str) -> Result<()> {
            self.cancelled.lock().unwrap().push(session_id.to_string());
            Ok(())
        }
    }
}
