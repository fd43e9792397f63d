//! # agora-auth
//!
//! Stateless authentication of signed HTTP requests.
//!
//! Clients send four headers — `X-Pubkey` (64 lowercase hex), `X-Signature`
//! (128 lowercase hex), `X-Timestamp` (decimal epoch milliseconds), and
//! `X-Nonce` (opaque token, unique per signed request, no `|`) — which,
//! together with the method, path, and raw body, fully determine the
//! canonical message. The authenticator rebuilds that message, verifies the
//! Ed25519 signature, enforces a narrow freshness window, and (for requests
//! without idempotency semantics) consumes the nonce.
//!
//! Downstream handlers receive an [`AuthenticatedIdentity`] and never touch
//! cryptography again; in particular the ledger engine trusts the pubkey it
//! is handed.

use std::time::{SystemTime, UNIX_EPOCH};

use agora_crypto::canonical::canonical_message_v1;
use agora_crypto::ed25519::{Signature, VerifyingKey};
use agora_replay::{ConditionalStore, NonceOutcome, NonceRegistry};
use agora_types::{AuthenticatedIdentity, FRESHNESS_WINDOW_MS};

/// Authentication error types.
///
/// Everything that makes a signature unverifiable — garbled headers, a stale
/// timestamp, a forged or mismatched signature — collapses into
/// [`AuthError::InvalidSignature`]: the caller learns nothing about *why*
/// verification failed. A valid signature with a reused nonce is the one
/// distinct case, because clients handle it differently (conflict, not
/// re-sign).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("nonce already used")]
    NonceReplay,
}

impl AuthError {
    /// Stable machine-readable error code for the HTTP boundary.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::NonceReplay => "NONCE_REPLAY",
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// An inbound request as seen by the routing layer: signing headers plus
/// method, path, and the body bytes exactly as transmitted.
#[derive(Debug)]
pub struct SignedRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// `X-Pubkey` header.
    pub pubkey_hex: &'a str,
    /// `X-Signature` header.
    pub signature_hex: &'a str,
    /// `X-Timestamp` header, parsed.
    pub timestamp_ms: u64,
    /// `X-Nonce` header.
    pub nonce: &'a str,
    /// Raw body bytes as transmitted, `None` for bodyless requests.
    pub body: Option<&'a [u8]>,
}

/// Parse the `X-Timestamp` header (decimal epoch milliseconds as a string).
pub fn parse_timestamp_header(value: &str) -> Result<u64> {
    value.parse().map_err(|_| AuthError::InvalidSignature)
}

/// Authenticator tunables. The defaults are the protocol values; tests
/// shrink the window to exercise expiry.
#[derive(Clone, Copy, Debug)]
pub struct AuthConfig {
    /// Maximum |now - timestamp| in milliseconds, applied symmetrically to
    /// tolerate clock skew in both directions.
    pub freshness_window_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: FRESHNESS_WINDOW_MS,
        }
    }
}

/// Verifies signed requests and tracks consumed nonces.
pub struct Authenticator<S> {
    nonces: NonceRegistry<S>,
    config: AuthConfig,
}

impl<S: ConditionalStore> Authenticator<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, AuthConfig::default())
    }

    pub fn with_config(store: S, config: AuthConfig) -> Self {
        Self {
            nonces: NonceRegistry::new(store),
            config,
        }
    }

    /// Verify signature and freshness against the current system clock.
    pub fn authenticate(
        &self,
        request: &SignedRequest<'_>,
        topic_id: &str,
    ) -> Result<AuthenticatedIdentity> {
        self.authenticate_at(request, topic_id, now_ms())
    }

    /// Verify signature and freshness against an explicit clock reading.
    ///
    /// Does *not* consume the nonce: vote-set requests leave replay
    /// sequencing to the ledger engine, which must consult its idempotency
    /// cache first to tell a benign retry from a true replay.
    pub fn authenticate_at(
        &self,
        request: &SignedRequest<'_>,
        topic_id: &str,
        now_ms: u64,
    ) -> Result<AuthenticatedIdentity> {
        self.verify_signature(request)?;

        if now_ms.abs_diff(request.timestamp_ms) > self.config.freshness_window_ms {
            tracing::debug!(
                timestamp = request.timestamp_ms,
                now = now_ms,
                "signed request outside freshness window"
            );
            return Err(AuthError::InvalidSignature);
        }

        Ok(AuthenticatedIdentity::new(topic_id, request.pubkey_hex))
    }

    /// [`Self::authenticate_at`] plus atomic nonce consumption, for requests
    /// with no idempotency-cached response (reads, argument submission).
    pub fn authenticate_and_consume(
        &self,
        request: &SignedRequest<'_>,
        topic_id: &str,
        now_ms: u64,
    ) -> Result<AuthenticatedIdentity> {
        let identity = self.authenticate_at(request, topic_id, now_ms)?;
        match self.nonces.consume(request.pubkey_hex, request.nonce) {
            NonceOutcome::FirstUse => Ok(identity),
            NonceOutcome::AlreadyConsumed => Err(AuthError::NonceReplay),
        }
    }

    /// The nonce registry, shared with the ledger engine so both layers see
    /// one consumption record per `(pubkey, nonce)`.
    pub fn nonces(&self) -> &NonceRegistry<S> {
        &self.nonces
    }

    fn verify_signature(&self, request: &SignedRequest<'_>) -> Result<()> {
        let message = canonical_message_v1(
            request.method,
            request.path,
            request.timestamp_ms,
            request.nonce,
            request.body,
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "canonical message rejected");
            AuthError::InvalidSignature
        })?;

        let pubkey =
            VerifyingKey::from_hex(request.pubkey_hex).map_err(|_| AuthError::InvalidSignature)?;
        let signature =
            Signature::from_hex(request.signature_hex).map_err(|_| AuthError::InvalidSignature)?;

        pubkey
            .verify(message.as_bytes(), &signature)
            .map_err(|_| AuthError::InvalidSignature)
    }
}

/// Current Unix time in milliseconds.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
