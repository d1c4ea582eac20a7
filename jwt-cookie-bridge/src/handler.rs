/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! SSO login/logout event handling.
//!
//! A login event walks a fixed sequence of checks:
//!
//! ```text
//! Start -> InputValidated -> StructureValidated -> ClaimsValidated -> DomainApproved -> CookieSet
//! ```
//!
//! Any failed check ends the event in [`LoginState::Rejected`]. Nothing is
//! returned to the caller as an error: every rejection is logged and reported
//! in the [`LoginOutcome`].

use std::sync::Arc;

use chrono::Utc;
use jwt_cookie_bridge_types::{Identity, TokenStatus};
use serde_json::Value;

use crate::config::BridgeSettings;
use crate::cookie::{ClearReport, CookieBridge, CookieContext, CookieError, CookiePolicy};
use crate::domain::{DomainError, DomainValidator};
use crate::refresh::{hash_refresh_token, RefreshTokenStore};
use crate::status::StatusStore;
use crate::token::{SignatureVerifier, TokenError, TokenValidator};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("no user identity supplied")]
    MissingIdentity,
    #[error("token payload is not an object")]
    PayloadNotObject,
    #[error("access token missing from token data")]
    MissingAccessToken,
    #[error("access token is not a string")]
    AccessTokenNotString,
}

/// Why a login event did not produce a cookie.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("missing input: {0}")]
    MissingInput(InputError),
    #[error("bad token structure: {0}")]
    BadStructure(TokenError),
    #[error("bad token claims: {0}")]
    BadClaims(TokenError),
    #[error("bad cookie domain: {0}")]
    BadDomain(DomainError),
    #[error("cookie write failed: {0}")]
    WriteFailed(CookieError),
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "missing-input",
            Self::BadStructure(_) => "bad-structure",
            Self::BadClaims(_) => "bad-claims",
            Self::BadDomain(_) => "bad-domain",
            Self::WriteFailed(_) => "write-failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Start,
    InputValidated,
    StructureValidated,
    ClaimsValidated,
    DomainApproved,
    CookieSet,
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Terminal state: `CookieSet` or `Rejected`.
    pub state: LoginState,
    pub refresh_token_stored: bool,
}

impl LoginOutcome {
    pub fn cookie_set(&self) -> bool {
        self.state == LoginState::CookieSet
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.state {
            LoginState::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutOutcome {
    /// `None` when the clear itself failed (headers already sent).
    pub clear_report: Option<ClearReport>,
    pub refresh_token_deleted: bool,
}

/// Progress of a single login event. Keeps the state machine and the
/// diagnostic snapshot in step.
struct LoginRun {
    state: LoginState,
    status: TokenStatus,
}

impl LoginRun {
    fn new(now: i64) -> Self {
        Self {
            state: LoginState::Start,
            status: TokenStatus::started(now),
        }
    }

    fn advance(&mut self, next: LoginState) {
        match next {
            LoginState::InputValidated => {
                self.status.user_valid = true;
                self.status.token_received = true;
            }
            LoginState::ClaimsValidated => self.status.token_valid = true,
            LoginState::CookieSet => self.status.cookie_set = true,
            _ => {}
        }
        tracing::debug!("Login event {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Entry point for identity events and token queries.
pub struct SsoEventHandler {
    debug_mode: bool,
    validator: TokenValidator,
    domains: DomainValidator,
    bridge: CookieBridge,
    status: StatusStore,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
}

impl SsoEventHandler {
    pub fn new(settings: &BridgeSettings, refresh_tokens: Arc<dyn RefreshTokenStore>) -> Self {
        let verifier = settings
            .verify_secret
            .as_deref()
            .map(SignatureVerifier::from_secret);
        Self {
            debug_mode: settings.debug_mode,
            validator: TokenValidator::new(verifier),
            domains: DomainValidator::new(&settings.allowed_domains),
            bridge: CookieBridge::new(CookiePolicy::from_settings(settings)),
            status: StatusStore::default(),
            refresh_tokens,
        }
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn policy(&self) -> &CookiePolicy {
        self.bridge.policy()
    }

    pub fn domains(&self) -> &DomainValidator {
        &self.domains
    }

    pub fn verifies_signatures(&self) -> bool {
        self.validator.verifies_signatures()
    }

    /// Handle a successful third-party login.
    pub async fn on_login(
        &self,
        identity: Option<&Identity>,
        payload: &Value,
        cookies: &mut CookieContext,
    ) -> LoginOutcome {
        let now = Utc::now().timestamp();
        let mut run = LoginRun::new(now);

        let result = self.bridge_token(&mut run, identity, payload, cookies, now);

        let mut refresh_token_stored = false;
        match result {
            Ok(()) => {
                tracing::info!(
                    "Token bridged to cookie {:?} for user {}",
                    self.policy().name,
                    identity.map_or("<unknown>", |i| i.user_id.as_str())
                );
                if let (Some(identity), Some(refresh)) = (identity, refresh_token_of(payload)) {
                    refresh_token_stored = self.store_refresh_token(identity, refresh).await;
                }
            }
            Err(rejection) => {
                tracing::warn!(
                    reason = rejection.reason(),
                    "SSO login rejected: {rejection}"
                );
                run.advance(LoginState::Rejected(rejection));
            }
        }

        if self.debug_mode {
            self.status.record(run.status).await;
        }

        LoginOutcome {
            state: run.state,
            refresh_token_stored,
        }
    }

    fn bridge_token(
        &self,
        run: &mut LoginRun,
        identity: Option<&Identity>,
        payload: &Value,
        cookies: &mut CookieContext,
        now: i64,
    ) -> Result<(), Rejection> {
        let access_token = validate_input(identity, payload).map_err(Rejection::MissingInput)?;
        run.advance(LoginState::InputValidated);

        self.validator
            .check_structure(access_token)
            .map_err(Rejection::BadStructure)?;
        run.advance(LoginState::StructureValidated);

        self.validator
            .check_claims(access_token, now)
            .map_err(Rejection::BadClaims)?;
        run.advance(LoginState::ClaimsValidated);

        self.domains
            .check(&self.policy().domain)
            .map_err(Rejection::BadDomain)?;
        run.advance(LoginState::DomainApproved);

        self.bridge
            .set(cookies, access_token)
            .map_err(Rejection::WriteFailed)?;
        run.advance(LoginState::CookieSet);

        Ok(())
    }

    async fn store_refresh_token(&self, identity: &Identity, refresh_token: &str) -> bool {
        let hash = match hash_refresh_token(refresh_token) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!("Failed to hash refresh token for {}: {e}", identity.user_id);
                return false;
            }
        };
        match self.refresh_tokens.store(&identity.user_id, &hash).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to store refresh token for {}: {e}", identity.user_id);
                false
            }
        }
    }

    /// Handle session termination. Always clears the cookie; clearing an
    /// absent cookie is a successful no-op.
    pub async fn on_logout(
        &self,
        identity: Option<&Identity>,
        cookies: &mut CookieContext,
    ) -> LogoutOutcome {
        let clear_report = match self.bridge.clear(cookies) {
            Ok(report) => {
                if report.is_complete() {
                    tracing::info!("Token cleared on logout");
                } else {
                    tracing::warn!("Token cookie not cleared for paths {:?}", report.failed);
                }
                Some(report)
            }
            Err(e) => {
                tracing::warn!("Logout could not clear token cookie: {e}");
                None
            }
        };

        let refresh_token_deleted = match identity {
            Some(identity) => match self.refresh_tokens.delete(&identity.user_id).await {
                Ok(deleted) => deleted,
                Err(e) => {
                    tracing::error!(
                        "Failed to delete refresh token for {}: {e}",
                        identity.user_id
                    );
                    false
                }
            },
            None => false,
        };

        LogoutOutcome {
            clear_report,
            refresh_token_deleted,
        }
    }

    /// The bridged token for the current request, if present and well-formed.
    pub fn get_current_token(&self, cookies: &mut CookieContext) -> Option<String> {
        self.bridge.get(cookies)
    }

    /// The last recorded diagnostic snapshot, if any is still retained.
    pub async fn get_last_status(&self) -> Option<TokenStatus> {
        self.status.last().await
    }

    /// Clear the token cookie and the stored status.
    pub async fn reset(&self, cookies: &mut CookieContext) -> Result<ClearReport, CookieError> {
        let report = self.bridge.clear(cookies);
        self.status.clear().await;
        report
    }
}

fn validate_input<'a>(
    identity: Option<&Identity>,
    payload: &'a Value,
) -> Result<&'a str, InputError> {
    if identity.is_none() {
        return Err(InputError::MissingIdentity);
    }
    let token = payload.as_object().ok_or(InputError::PayloadNotObject)?;
    match token.get("access_token") {
        None | Some(Value::Null) => Err(InputError::MissingAccessToken),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(InputError::AccessTokenNotString),
    }
}

fn refresh_token_of(payload: &Value) -> Option<&str> {
    payload
        .get("refresh_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}
