//! The `PairingSession` state machine (§4.6).

use crate::credentials::Credentials;
use crate::device_token;
use crate::transport::{ChildSummary, PairingMode, PairingTransport, StatusResponse};
use allow2_core::secret_store::keys;
use allow2_core::{Allow2Config, Result, SecretStore};
use allow2_crypto::{derive_voice_key, CryptoProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::sleep;

/// Lifecycle state of a [`PairingSession`].
///
/// `Scanned` is reachable only in [`PairingMode::Qr`]; `PIN` mode moves
/// `Waiting -> Authenticating` directly. `Completed`, `Expired`,
/// `Declined`, and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum PairingState {
    /// No pairing attempt in progress.
    Idle,
    /// `start()` called; the init RPC is in flight.
    Initializing,
    /// Init succeeded; polling for the parent to scan/authenticate.
    Waiting {
        /// Opaque session identifier from `init`.
        session_id: String,
        /// QR-mode payload, if any.
        qr_payload: Option<String>,
        /// PIN-mode code, if any.
        pin_code: Option<String>,
    },
    /// QR mode only: the code has been scanned.
    Scanned {
        /// Opaque session identifier from `init`.
        session_id: String,
    },
    /// The parent is authenticating server-side.
    Authenticating {
        /// Opaque session identifier from `init`.
        session_id: String,
    },
    /// Pairing succeeded and credentials are durably persisted.
    Completed {
        /// The persisted credentials.
        credentials: Credentials,
        /// Managed children returned by the server.
        children: Vec<ChildSummary>,
    },
    /// The session reached `expires_in` without completing.
    Expired,
    /// The parent declined the pairing request.
    Declined,
    /// An unrecoverable error, not otherwise classified.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl PairingState {
    /// `true` for the four states that never transition except via a
    /// fresh `start()`/`Retry`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Expired | Self::Declined | Self::Failed { .. }
        )
    }
}

/// Map a non-success completion's `error` string to the terminal state
/// it routes to: `"expired"` substring -> `Expired`, `"declined"` -> `Declined`,
/// anything else -> `Failed`.
fn classify_failure(error: Option<String>) -> PairingState {
    let reason = error.unwrap_or_default();
    if reason.contains("expired") {
        PairingState::Expired
    } else if reason.contains("declined") {
        PairingState::Declined
    } else {
        PairingState::Failed { reason }
    }
}

struct Inner {
    state: PairingState,
    generation: u64,
    mode: PairingMode,
}

/// Drives one device's pairing attempt: the init/poll/expiry RPC
/// lifecycle, credential persistence, and observer notification.
///
/// Cheap to clone — all fields are `Arc`s sharing one underlying session.
/// Every background task captures the `generation` it was spawned under
/// and silently drops its result if the session has since moved to a new
/// generation (via `start` or `cancel`), matching the "late completions
/// are dropped" cancellation rule.
#[derive(Clone)]
pub struct PairingSession {
    inner: Arc<AsyncMutex<Inner>>,
    transport: Arc<dyn PairingTransport>,
    store: Arc<dyn SecretStore>,
    crypto: Arc<dyn CryptoProvider>,
    config: Allow2Config,
    observers: Arc<std::sync::Mutex<Vec<Box<dyn Fn(PairingState) + Send>>>>,
}

impl PairingSession {
    /// Build an idle session bound to one transport/store/crypto triple.
    pub fn new(
        transport: Arc<dyn PairingTransport>,
        store: Arc<dyn SecretStore>,
        crypto: Arc<dyn CryptoProvider>,
        config: Allow2Config,
    ) -> Self {
        Self {
            inner: Arc::new(AsyncMutex::new(Inner {
                state: PairingState::Idle,
                generation: 0,
                mode: PairingMode::Qr,
            })),
            transport,
            store,
            crypto,
            config,
            observers: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Register a sink invoked, in registration order, on every state
    /// transition.
    pub fn on_event(&self, observer: Box<dyn Fn(PairingState) + Send>) {
        self.observers.lock().unwrap().push(observer);
    }

    /// The current state.
    pub async fn state(&self) -> PairingState {
        self.inner.lock().await.state.clone()
    }

    fn notify(&self, state: &PairingState) {
        for observer in self.observers.lock().unwrap().iter() {
            observer(state.clone());
        }
    }

    /// Apply `state` iff the session is still on `generation` and not
    /// already in a terminal state. Returns whether it was applied.
    async fn transition(&self, generation: u64, state: PairingState) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation || inner.state.is_terminal() {
            return false;
        }
        inner.state = state.clone();
        drop(inner);
        self.notify(&state);
        true
    }

    /// Begin a pairing attempt. If a session is already non-idle, it is
    /// implicitly cancelled first (§4.6 Concurrency).
    pub async fn start(&self, mode: PairingMode, device_name: &str) -> Result<()> {
        let already_idle = matches!(self.inner.lock().await.state, PairingState::Idle);
        if !already_idle {
            self.cancel().await?;
        }

        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.mode = mode;
            inner.state = PairingState::Initializing;
            inner.generation
        };
        self.notify(&PairingState::Initializing);

        let device_token = device_token::get_or_create(self.store.as_ref(), self.crypto.as_ref())?;

        let init = match self.transport.init(&device_token, device_name, mode).await {
            Ok(init) => init,
            Err(err) => {
                self.transition(
                    generation,
                    PairingState::Failed {
                        reason: err.to_string(),
                    },
                )
                .await;
                return Err(err);
            }
        };

        let waiting = PairingState::Waiting {
            session_id: init.session_id.clone(),
            qr_payload: init.qr_payload.clone(),
            pin_code: init.pin_code.clone(),
        };
        if !self.transition(generation, waiting).await {
            return Ok(());
        }

        self.spawn_expiry_timer(generation, init.expires_in_secs);
        self.spawn_poll_loop(generation, mode, init.session_id);

        Ok(())
    }

    /// Best-effort cancel RPC, then return to `Idle`. Invalidates every
    /// in-flight poll/expiry task spawned under the prior generation.
    pub async fn cancel(&self) -> Result<()> {
        let session_id = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            let session_id = match &inner.state {
                PairingState::Waiting { session_id, .. }
                | PairingState::Scanned { session_id }
                | PairingState::Authenticating { session_id } => Some(session_id.clone()),
                _ => None,
            };
            inner.state = PairingState::Idle;
            session_id
        };
        self.notify(&PairingState::Idle);

        if let Some(session_id) = session_id {
            if let Err(err) = self.transport.cancel(&session_id).await {
                tracing::debug!(error = %err, "pairing cancel RPC failed, proceeding locally anyway");
            }
        }
        Ok(())
    }

    fn spawn_expiry_timer(&self, generation: u64, expires_in_secs: u64) {
        let this = self.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(expires_in_secs)).await;
            this.transition(generation, PairingState::Expired).await;
        });
    }

    fn spawn_poll_loop(&self, generation: u64, mode: PairingMode, session_id: String) {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                sleep(this.config.pairing_poll_interval).await;

                {
                    let inner = this.inner.lock().await;
                    if inner.generation != generation || inner.state.is_terminal() {
                        return;
                    }
                }

                let status = match this.transport.status(&session_id).await {
                    Ok(status) => status,
                    Err(err) => {
                        tracing::warn!(error = %err, "pairing status poll failed, retrying");
                        continue;
                    }
                };

                if this.handle_status(generation, mode, &session_id, status).await {
                    return;
                }
            }
        });
    }

    /// Apply one `status` response. Returns `true` once this session's
    /// polling should stop (a terminal state was reached).
    async fn handle_status(
        &self,
        generation: u64,
        mode: PairingMode,
        session_id: &str,
        status: StatusResponse,
    ) -> bool {
        if status.completed {
            if status.success {
                self.complete(generation, status).await;
            } else {
                self.transition(generation, classify_failure(status.error))
                    .await;
            }
            return true;
        }

        let current = self.inner.lock().await.state.clone();
        let authenticating = status.user_id.is_some();
        let next = match (&current, mode, status.scanned, authenticating) {
            (PairingState::Waiting { .. }, PairingMode::Qr, Some(true), _) => {
                Some(PairingState::Scanned {
                    session_id: session_id.to_string(),
                })
            }
            (PairingState::Waiting { .. }, PairingMode::Pin, _, true) => {
                Some(PairingState::Authenticating {
                    session_id: session_id.to_string(),
                })
            }
            (PairingState::Scanned { .. }, _, _, true) => Some(PairingState::Authenticating {
                session_id: session_id.to_string(),
            }),
            _ => None,
        };
        if let Some(next) = next {
            self.transition(generation, next).await;
        }
        false
    }

    async fn complete(&self, generation: u64, status: StatusResponse) {
        let (Some(user_id), Some(pair_id), Some(pair_token)) =
            (status.user_id, status.pair_id, status.pair_token)
        else {
            self.transition(
                generation,
                PairingState::Failed {
                    reason: "server reported success without credentials".into(),
                },
            )
            .await;
            return;
        };

        let credentials = Credentials {
            user_id,
            pair_id: pair_id.clone(),
            pair_token: pair_token.clone(),
        };

        let persisted = credentials.save_to(self.store.as_ref()).and_then(|()| {
            let voice_key =
                derive_voice_key(self.crypto.as_ref(), pair_token.as_bytes(), pair_id.as_bytes())?;
            self.store.put(keys::VOICE_KEY, &voice_key)
        });

        match persisted {
            Ok(()) => {
                self.transition(
                    generation,
                    PairingState::Completed {
                        credentials,
                        children: status.children,
                    },
                )
                .await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist pairing credentials");
                self.transition(
                    generation,
                    PairingState::Failed {
                        reason: err.to_string(),
                    },
                )
                .await;
            }
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl PairingSession {
    /// Drive one status response through the same logic the background
    /// poll loop uses, without waiting on real timers. Exposed so
    /// integration tests in other crates can exercise completion without
    /// a scriptable clock.
    pub async fn handle_status_for_test(
        &self,
        mode: PairingMode,
        session_id: &str,
        status: StatusResponse,
    ) -> bool {
        let generation = self.inner.lock().await.generation;
        self.handle_status(generation, mode, session_id, status).await
    }
}
