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

//! Writing, reading and clearing the bridged token cookie.
//!
//! [`CookieContext`] is the request-scoped buffer: the cookies the browser
//! sent plus the `Set-Cookie` headers queued for the response. Once the
//! response headers are committed the context refuses further writes.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use chrono::{DateTime, Duration, Utc};

use crate::config::BridgeSettings;
use crate::token;

/// Paths the cookie is expired under on clear, covering cookies written by
/// older deployments under narrower paths. `""` omits the `Path` attribute.
pub const CLEAR_PATHS: [&str; 4] = ["/", "/admin", "/content", ""];

const EPOCH_PLUS_ONE: &str = "Thu, 01 Jan 1970 00:00:01 GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    /// Case-insensitive; unknown values fall back to `Lax`.
    pub fn parse_or_lax(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Self::Strict,
            "none" => Self::None,
            "lax" => Self::Lax,
            other => {
                tracing::warn!("Unknown SameSite policy {other:?}, using Lax");
                Self::Lax
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CookieError {
    #[error("response headers already sent")]
    HeadersAlreadySent,
    #[error("refusing to store invalid token: {0}")]
    InvalidToken(#[from] token::TokenError),
    #[error("failed to write cookie: {0}")]
    WriteFailed(String),
}

/// Attributes of the token cookie. `Secure` is always emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub name: String,
    pub duration_secs: u64,
    pub domain: String,
    pub path: String,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl CookiePolicy {
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        Self {
            name: settings.cookie_name.clone(),
            duration_secs: settings.cookie_duration_secs,
            domain: settings.cookie_domain.clone(),
            path: "/".to_string(),
            http_only: settings.http_only,
            same_site: settings.same_site,
        }
    }

    /// The `Domain` attribute value, or `None` when the browser should scope
    /// the cookie to the request host (empty domain or `localhost`).
    pub fn domain_attribute(&self) -> Option<String> {
        let bare = self.domain.trim_start_matches('.');
        if bare.is_empty() || bare.eq_ignore_ascii_case("localhost") {
            None
        } else {
            Some(format!(".{bare}"))
        }
    }

    /// `Set-Cookie` value that stores `value` until `now + duration`.
    fn set_header(&self, value: &str) -> String {
        let max_age = i64::try_from(self.duration_secs).unwrap_or(i64::MAX);
        let expires = Duration::try_seconds(max_age)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut cookie = format!(
            "{}={value}; Expires={}; Max-Age={max_age}",
            self.name,
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        );
        self.push_common(&mut cookie, Some(&self.path));
        cookie
    }

    /// `Set-Cookie` value that expires the cookie under `path`.
    fn clear_header(&self, path: &str) -> String {
        let mut cookie = format!("{}=; Expires={EPOCH_PLUS_ONE}; Max-Age=0", self.name);
        self.push_common(&mut cookie, Some(path).filter(|p| !p.is_empty()));
        cookie
    }

    fn push_common(&self, cookie: &mut String, path: Option<&str>) {
        if let Some(p) = path {
            cookie.push_str(&format!("; Path={p}"));
        }
        if let Some(d) = self.domain_attribute() {
            cookie.push_str(&format!("; Domain={d}"));
        }
        cookie.push_str("; Secure");
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site));
    }
}

/// RFC 6265 `token`: visible ASCII without separators.
pub fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}

/// Request-scoped cookie state: what the browser sent, what the response
/// will set, and whether headers have been committed.
#[derive(Debug, Default)]
pub struct CookieContext {
    request: HashMap<String, String>,
    pending: Vec<HeaderValue>,
    headers_sent: bool,
}

impl CookieContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `Cookie` header. The first occurrence of a name wins.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut request = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    request
                        .entry(name.trim().to_string())
                        .or_insert_with(|| value.trim().to_string());
                }
            }
        }
        Self {
            request,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.request.insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.request.get(name).map(String::as_str)
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Commit the response headers; later writes fail with
    /// [`CookieError::HeadersAlreadySent`].
    pub fn mark_headers_sent(&mut self) {
        self.headers_sent = true;
    }

    /// Queued `Set-Cookie` values, in order.
    pub fn set_cookie_headers(&self) -> &[HeaderValue] {
        &self.pending
    }

    fn queue(&mut self, set_cookie: &str) -> Result<(), CookieError> {
        if self.headers_sent {
            return Err(CookieError::HeadersAlreadySent);
        }
        let value =
            HeaderValue::from_str(set_cookie).map_err(|e| CookieError::WriteFailed(e.to_string()))?;
        self.pending.push(value);
        Ok(())
    }
}

impl IntoResponseParts for CookieContext {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for value in self.pending {
            res.headers_mut().append(header::SET_COOKIE, value);
        }
        Ok(res)
    }
}

/// Outcome of [`CookieBridge::clear`]; failures on some paths are not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub cleared: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl ClearReport {
    /// Report for a clear that could not queue anything.
    pub fn all_failed() -> Self {
        Self {
            cleared: Vec::new(),
            failed: CLEAR_PATHS.to_vec(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stores the access token in the configured cookie.
#[derive(Debug, Clone)]
pub struct CookieBridge {
    policy: CookiePolicy,
}

impl CookieBridge {
    pub fn new(policy: CookiePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }

    /// Queue a `Set-Cookie` for `token` and make it visible to later reads in
    /// this request.
    pub fn set(&self, cookies: &mut CookieContext, token: &str) -> Result<(), CookieError> {
        token::validate_structure(token)?;

        if cookies.headers_sent() {
            return Err(CookieError::HeadersAlreadySent);
        }
        if !is_valid_cookie_name(&self.policy.name) {
            return Err(CookieError::WriteFailed(format!(
                "invalid cookie name {:?}",
                self.policy.name
            )));
        }

        cookies.queue(&self.policy.set_header(token))?;
        cookies
            .request
            .insert(self.policy.name.clone(), token.to_string());
        Ok(())
    }

    /// The token cookie from the current request. A structurally invalid
    /// value is treated as absent and cleared.
    pub fn get(&self, cookies: &mut CookieContext) -> Option<String> {
        let value = cookies.value(&self.policy.name)?.to_string();

        match token::validate_structure(&value) {
            Ok(()) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding malformed token cookie: {e}");
                if let Err(e) = self.clear(cookies) {
                    tracing::warn!("Could not clear malformed token cookie: {e}");
                }
                None
            }
        }
    }

    /// Drop the in-memory value and expire the cookie under every path in
    /// [`CLEAR_PATHS`]. Clearing a cookie that was never set succeeds.
    pub fn clear(&self, cookies: &mut CookieContext) -> Result<ClearReport, CookieError> {
        cookies.request.remove(&self.policy.name);

        if cookies.headers_sent() {
            return Err(CookieError::HeadersAlreadySent);
        }

        let mut report = ClearReport::default();
        for path in CLEAR_PATHS {
            match cookies.queue(&self.policy.clear_header(path)) {
                Ok(()) => report.cleared.push(path),
                Err(e) => {
                    tracing::debug!("Clearing cookie under path {path:?} failed: {e}");
                    report.failed.push(path);
                }
            }
        }

        tracing::debug!(
            "Cookie clear attempted for paths: {}",
            CLEAR_PATHS.join(", ")
        );
        Ok(report)
    }
}
