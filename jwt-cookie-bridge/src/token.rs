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

//! Access token validation: shape, payload decoding, and time claims.
//!
//! The token reaches the bridge through a server-side login callback, so by
//! default only its structure and `exp`/`nbf` claims are checked. When a
//! shared secret is configured, [`SignatureVerifier`] additionally verifies
//! the HMAC signature before any claim is trusted.

use std::sync::LazyLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use regex::Regex;
use serde_json::{Map, Value};

/// Tokens shorter than this are rejected before any parsing.
pub const MIN_TOKEN_LENGTH: usize = 32;

/// Clock-skew tolerance applied to `exp` and `nbf`, in seconds.
pub const TOKEN_LEEWAY_SECS: i64 = 60;

static SEGMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token length below minimum of {MIN_TOKEN_LENGTH} characters")]
    TooShort,
    #[error("token must have exactly 3 segments, found {0}")]
    WrongSegmentCount(usize),
    #[error("token contains characters outside the base64url alphabet")]
    InvalidCharset,
    #[error("failed to decode token payload")]
    DecodeFailure,
    #[error("token payload is not a JSON object")]
    MalformedPayload,
    #[error("token missing expiration claim")]
    MissingExpiry,
    #[error("token has expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("claim `{0}` is not a numeric timestamp")]
    InvalidClaim(&'static str),
    #[error("token signature rejected: {0}")]
    BadSignature(String),
}

/// Decoded token payload: claim name to JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    /// The `exp` claim in Unix seconds, if present.
    pub fn exp(&self) -> Result<Option<i64>, TokenError> {
        self.timestamp("exp")
    }

    /// The `nbf` claim in Unix seconds, if present.
    pub fn nbf(&self) -> Result<Option<i64>, TokenError> {
        self.timestamp("nbf")
    }

    fn timestamp(&self, claim: &'static str) -> Result<Option<i64>, TokenError> {
        match self.0.get(claim) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Some)
                .ok_or(TokenError::InvalidClaim(claim)),
            Some(_) => Err(TokenError::InvalidClaim(claim)),
        }
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Check that `token` looks like a compact JWT.
///
/// Rules are applied in order: minimum length, exactly three `.`-separated
/// segments, and each segment non-empty and made of `[A-Za-z0-9_-]`.
pub fn validate_structure(token: &str) -> Result<(), TokenError> {
    if token.len() < MIN_TOKEN_LENGTH {
        return Err(TokenError::TooShort);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::WrongSegmentCount(segments.len()));
    }

    if segments.iter().all(|s| SEGMENT_PATTERN.is_match(s)) {
        Ok(())
    } else {
        Err(TokenError::InvalidCharset)
    }
}

/// Base64url-decode the payload segment and parse it as a JSON object.
///
/// No signature verification happens here.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let payload_b64 = token.split('.').nth(1).ok_or(TokenError::DecodeFailure)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.trim_end_matches('='))
        .map_err(|_| TokenError::DecodeFailure)?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(Claims(map)),
        _ => Err(TokenError::MalformedPayload),
    }
}

/// Check `exp` (required) and `nbf` (optional) against `now`, both with
/// [`TOKEN_LEEWAY_SECS`] of tolerance.
pub fn validate_claims(claims: &Claims, now: i64) -> Result<(), TokenError> {
    let exp = claims.exp()?.ok_or(TokenError::MissingExpiry)?;
    if exp <= now - TOKEN_LEEWAY_SECS {
        return Err(TokenError::Expired);
    }

    if let Some(nbf) = claims.nbf()? {
        if nbf > now + TOKEN_LEEWAY_SECS {
            return Err(TokenError::NotYetValid);
        }
    }

    Ok(())
}

/// HMAC signature check for deployments that share a secret with the
/// identity provider.
#[derive(Clone)]
pub struct SignatureVerifier {
    key: DecodingKey,
}

impl SignatureVerifier {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verify the signature only. Time claims are left to [`validate_claims`]
    /// so that the leeway rules stay in one place.
    pub fn verify(&self, token: &str) -> Result<(), TokenError> {
        let header = decode_header(token).map_err(|e| TokenError::BadSignature(e.to_string()))?;

        if !matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::BadSignature(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Value>(token, &self.key, &validation)
            .map(|_| ())
            .map_err(|e| TokenError::BadSignature(e.to_string()))
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SignatureVerifier { .. }")
    }
}

/// Structure, optional signature, then claims.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator {
    verifier: Option<SignatureVerifier>,
}

impl TokenValidator {
    pub fn new(verifier: Option<SignatureVerifier>) -> Self {
        Self { verifier }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.verifier.is_some()
    }

    /// Structural checks plus the signature check when one is configured.
    pub fn check_structure(&self, token: &str) -> Result<(), TokenError> {
        validate_structure(token)?;
        if let Some(verifier) = &self.verifier {
            verifier.verify(token)?;
        }
        Ok(())
    }

    /// Decode and check time claims. Assumes [`Self::check_structure`] passed.
    pub fn check_claims(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode_claims(token)?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }

    pub fn validate(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        self.check_structure(token)?;
        self.check_claims(token, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const TEST_SECRET: &str = "shared-idp-secret";

    fn sign(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .expect("should sign")
    }

    fn unsigned(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJlLXBsYWNlaG9sZGVy",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn short_token_is_rejected_first() {
        assert_eq!(validate_structure("a.b.c"), Err(TokenError::TooShort));
        assert_eq!(validate_structure(""), Err(TokenError::TooShort));
    }

    #[test]
    fn segment_count_must_be_three() {
        let two = format!("{}.{}", "a".repeat(20), "b".repeat(20));
        let four = format!("{0}.{0}.{0}.{0}", "a".repeat(10));
        assert_eq!(validate_structure(&two), Err(TokenError::WrongSegmentCount(2)));
        assert_eq!(validate_structure(&four), Err(TokenError::WrongSegmentCount(4)));
    }

    #[test]
    fn charset_outside_base64url_is_rejected() {
        let plus = format!("{0}.{0}+x.{0}", "a".repeat(12));
        let pad = format!("{0}.{0}=.{0}", "a".repeat(12));
        let empty = format!("{0}..{0}", "a".repeat(20));
        assert_eq!(validate_structure(&plus), Err(TokenError::InvalidCharset));
        assert_eq!(validate_structure(&pad), Err(TokenError::InvalidCharset));
        assert_eq!(validate_structure(&empty), Err(TokenError::InvalidCharset));
    }

    #[test]
    fn well_formed_token_passes_structure() {
        let token = sign(&json!({ "sub": "alice", "exp": 1 }));
        assert_eq!(validate_structure(&token), Ok(()));
    }

    #[test]
    fn decode_reads_payload_object() {
        let token = unsigned(r#"{"sub":"alice","exp":1700000000}"#);
        let claims = decode_claims(&token).expect("should decode");
        assert_eq!(claims.get("sub"), Some(&json!("alice")));
        assert_eq!(claims.exp(), Ok(Some(1_700_000_000)));
    }

    #[test]
    fn decode_rejects_non_object_payload() {
        assert_eq!(
            decode_claims(&unsigned("[1,2,3]")),
            Err(TokenError::MalformedPayload)
        );
        assert_eq!(
            decode_claims(&unsigned("not json at all")),
            Err(TokenError::MalformedPayload)
        );
    }

    #[test]
    fn decode_rejects_bad_base64() {
        assert_eq!(
            decode_claims("header.@@@.signature"),
            Err(TokenError::DecodeFailure)
        );
    }

    #[test]
    fn missing_exp_is_reported() {
        let claims = decode_claims(&unsigned(r#"{"sub":"alice"}"#)).unwrap();
        assert_eq!(
            validate_claims(&claims, 1_000),
            Err(TokenError::MissingExpiry)
        );
    }

    #[test]
    fn exp_boundary_uses_leeway() {
        let now = 10_000;
        let at_edge = decode_claims(&unsigned(&format!(r#"{{"exp":{}}}"#, now - 60))).unwrap();
        let inside = decode_claims(&unsigned(&format!(r#"{{"exp":{}}}"#, now - 59))).unwrap();
        assert_eq!(validate_claims(&at_edge, now), Err(TokenError::Expired));
        assert_eq!(validate_claims(&inside, now), Ok(()));
    }

    #[test]
    fn nbf_in_future_beyond_leeway_is_rejected() {
        let now = 10_000;
        let late = decode_claims(&unsigned(&format!(
            r#"{{"exp":{},"nbf":{}}}"#,
            now + 3600,
            now + 61
        )))
        .unwrap();
        let skewed = decode_claims(&unsigned(&format!(
            r#"{{"exp":{},"nbf":{}}}"#,
            now + 3600,
            now + 60
        )))
        .unwrap();
        assert_eq!(validate_claims(&late, now), Err(TokenError::NotYetValid));
        assert_eq!(validate_claims(&skewed, now), Ok(()));
    }

    #[test]
    fn non_numeric_exp_is_invalid() {
        let claims = decode_claims(&unsigned(r#"{"exp":"tomorrow"}"#)).unwrap();
        assert_eq!(
            validate_claims(&claims, 0),
            Err(TokenError::InvalidClaim("exp"))
        );
    }

    #[test]
    fn fractional_exp_is_truncated() {
        let claims = decode_claims(&unsigned(r#"{"exp":1700000000.9}"#)).unwrap();
        assert_eq!(claims.exp(), Ok(Some(1_700_000_000)));
    }

    #[test]
    fn validator_without_secret_skips_signature() {
        let now = Utc::now().timestamp();
        let token = unsigned(&format!(r#"{{"sub":"alice","exp":{}}}"#, now + 3600));
        let claims = TokenValidator::default()
            .validate(&token, now)
            .expect("unsigned token accepted without a verifier");
        assert_eq!(claims.get("sub"), Some(&json!("alice")));
    }

    #[test]
    fn verifier_accepts_matching_secret() {
        let now = Utc::now().timestamp();
        let token = sign(&json!({ "sub": "alice", "exp": now + 3600 }));
        let validator = TokenValidator::new(Some(SignatureVerifier::from_secret(TEST_SECRET)));
        assert!(validator.verifies_signatures());
        assert!(validator.validate(&token, now).is_ok());
    }

    #[test]
    fn verifier_rejects_wrong_secret() {
        let now = Utc::now().timestamp();
        let token = sign(&json!({ "sub": "alice", "exp": now + 3600 }));
        let validator =
            TokenValidator::new(Some(SignatureVerifier::from_secret("some-other-secret")));
        assert!(matches!(
            validator.validate(&token, now),
            Err(TokenError::BadSignature(_))
        ));
    }

    #[test]
    fn verifier_leaves_expiry_to_claims_check() {
        let now = Utc::now().timestamp();
        let token = sign(&json!({ "sub": "alice", "exp": now - 3600 }));
        let validator = TokenValidator::new(Some(SignatureVerifier::from_secret(TEST_SECRET)));
        assert_eq!(validator.check_structure(&token), Ok(()));
        assert_eq!(validator.check_claims(&token, now), Err(TokenError::Expired));
    }
}
