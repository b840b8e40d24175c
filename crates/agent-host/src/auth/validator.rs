//! Token validation against the cached key set.
//!
//! Validates incoming bearer tokens: looks up the signing key by `kid`,
//! verifies the RS256 signature, and checks the `exp`, `aud` and `iss`
//! claims.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only the RS256 algorithm is accepted; there is no algorithm
//!   negotiation, which rules out substitution attacks
//! - Every rejection is logged with its specific cause but collapses to a
//!   plain "rejected" result for the caller, so probes cannot distinguish
//!   which check failed

use crate::auth::claims::Claims;
use crate::auth::keyset::{Jwk, KeySetCache, KeySetError};
use common::jwt::extract_kid;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Why a token was rejected. Closed enumeration: anything that does not fit
/// a specific variant lands in `Malformed` rather than being swallowed.
///
/// Logged internally only; callers observe rejection without a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCause {
    /// Header carries no usable `kid` (or the token is oversized/malformed
    /// at the framing level).
    MissingKid,

    /// Token references a `kid` absent from the key set, even after one
    /// refresh. Key rotation lag or a forged `kid`.
    SigningKeyNotFound,

    /// Matched key is not an RSA signing key.
    WrongKeyType,

    /// Matched key advertises an algorithm other than RS256.
    WrongAlgorithm,

    /// Key record is missing or carries undecodable public key material.
    BadKeyMaterial,

    /// Signature did not verify.
    InvalidSignature,

    /// `exp` is in the past.
    Expired,

    /// `aud` does not equal the configured audience.
    InvalidAudience,

    /// `iss` does not equal the expected issuer.
    InvalidIssuer,

    /// Any other malformed-token condition.
    Malformed,
}

/// Validator for RS256 bearer tokens.
pub struct TokenValidator {
    /// Cache over the authority's published key set.
    keyset: Arc<KeySetCache>,

    /// Expected `aud` claim.
    audience: String,

    /// Expected `iss` claim (`https://{auth_domain}/`).
    issuer: String,
}

impl TokenValidator {
    /// Create a new validator.
    #[must_use]
    pub fn new(keyset: Arc<KeySetCache>, audience: String, issuer: String) -> Self {
        Self {
            keyset,
            audience,
            issuer,
        }
    }

    /// Validate a token.
    ///
    /// Returns `Ok(Some(claims))` on success and `Ok(None)` for every
    /// rejection; the specific cause is logged but deliberately not exposed.
    ///
    /// When the `kid` is not in the cached key set the cache is cleared and
    /// re-fetched exactly once before rejecting, so a freshly rotated key is
    /// picked up without a TTL.
    ///
    /// # Errors
    ///
    /// Returns `Err(KeySetError)` only when the key set cannot be fetched.
    /// That is an operational failure distinct from "token invalid" and must
    /// not be treated as a rejection.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Option<Claims>, KeySetError> {
        let kid = match extract_kid(token) {
            Ok(kid) => kid,
            Err(e) => {
                tracing::debug!(
                    target: "agent.auth.jwt",
                    error = ?e,
                    cause = ?RejectionCause::MissingKid,
                    "Token kid extraction failed"
                );
                return Ok(None);
            }
        };

        let jwk = match self.find_key(&kid).await? {
            Some(jwk) => jwk,
            None => {
                tracing::warn!(
                    target: "agent.auth.jwt",
                    kid = %kid,
                    cause = ?RejectionCause::SigningKeyNotFound,
                    "Signing key not found in key set"
                );
                return Ok(None);
            }
        };

        match verify_token(token, &jwk, &self.audience, &self.issuer) {
            Ok(claims) => {
                tracing::debug!(target: "agent.auth.jwt", "Token validated successfully");
                Ok(Some(claims))
            }
            Err(cause) => {
                tracing::debug!(target: "agent.auth.jwt", cause = ?cause, "Token rejected");
                Ok(None)
            }
        }
    }

    /// Look up `kid`, refreshing the cache once on a miss to cover key
    /// rotation lag.
    async fn find_key(&self, kid: &str) -> Result<Option<Jwk>, KeySetError> {
        let keys = self.keyset.get().await?;
        if let Some(jwk) = keys.find(kid) {
            return Ok(Some(jwk.clone()));
        }

        tracing::debug!(
            target: "agent.auth.jwt",
            kid = %kid,
            "Key not found in cached key set, refreshing once"
        );
        self.keyset.clear().await;

        let keys = self.keyset.get().await?;
        Ok(keys.find(kid).cloned())
    }
}

/// Verify the token's signature and claims against a single key.
///
/// Uses RS256 exclusively; `exp`, `aud` and `iss` are all enforced.
fn verify_token(
    token: &str,
    jwk: &Jwk,
    audience: &str,
    issuer: &str,
) -> Result<Claims, RejectionCause> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "agent.auth.jwt", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(RejectionCause::WrongKeyType);
    }
    if let Some(alg) = &jwk.alg {
        if alg != "RS256" {
            tracing::warn!(target: "agent.auth.jwt", alg = %alg, "Unexpected JWK algorithm");
            return Err(RejectionCause::WrongAlgorithm);
        }
    }

    let (n, e) = match (&jwk.n, &jwk.e) {
        (Some(n), Some(e)) => (n, e),
        _ => {
            tracing::error!(target: "agent.auth.jwt", kid = %jwk.kid, "JWK missing RSA components");
            return Err(RejectionCause::BadKeyMaterial);
        }
    };

    let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|err| {
        tracing::error!(target: "agent.auth.jwt", kid = %jwk.kid, error = %err, "Invalid RSA key material");
        RejectionCause::BadKeyMaterial
    })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);
    validation.set_issuer(&[issuer]);
    validation.validate_exp = true;

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(classify_decode_error)?;

    Ok(token_data.claims)
}

/// Map jsonwebtoken's error kinds onto the closed rejection enumeration.
fn classify_decode_error(err: jsonwebtoken::errors::Error) -> RejectionCause {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => RejectionCause::Expired,
        ErrorKind::InvalidAudience => RejectionCause::InvalidAudience,
        ErrorKind::InvalidIssuer => RejectionCause::InvalidIssuer,
        ErrorKind::InvalidSignature => RejectionCause::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            RejectionCause::WrongAlgorithm
        }
        _ => RejectionCause::Malformed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use std::time::Duration;

    const AUDIENCE: &str = "agent-api";
    const ISSUER: &str = "https://auth.example.com/";

    fn fake_token() -> String {
        let header = r#"{"alg":"RS256","typ":"JWT","kid":"test-key"}"#;
        let payload = r#"{"sub":"test","exp":9999999999,"aud":"agent-api","iss":"https://auth.example.com/"}"#;
        format!(
            "{}.{}.fake_signature",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn rsa_jwk() -> Jwk {
        serde_json::from_str(
            r#"{
                "kty": "RSA",
                "kid": "test-key",
                "n": "z2V03EmvzqVtly7urraBRg",
                "e": "AQAB",
                "alg": "RS256",
                "use": "sig"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_verify_token_rejects_non_rsa_key_type() {
        let mut jwk = rsa_jwk();
        jwk.kty = "OKP".to_string();

        let result = verify_token(&fake_token(), &jwk, AUDIENCE, ISSUER);
        assert_eq!(result.unwrap_err(), RejectionCause::WrongKeyType);
    }

    #[test]
    fn test_verify_token_rejects_non_rs256_algorithm() {
        let mut jwk = rsa_jwk();
        jwk.alg = Some("ES256".to_string());

        let result = verify_token(&fake_token(), &jwk, AUDIENCE, ISSUER);
        assert_eq!(result.unwrap_err(), RejectionCause::WrongAlgorithm);
    }

    #[test]
    fn test_verify_token_rejects_missing_modulus() {
        let mut jwk = rsa_jwk();
        jwk.n = None;

        let result = verify_token(&fake_token(), &jwk, AUDIENCE, ISSUER);
        assert_eq!(result.unwrap_err(), RejectionCause::BadKeyMaterial);
    }

    #[test]
    fn test_verify_token_rejects_missing_exponent() {
        let mut jwk = rsa_jwk();
        jwk.e = None;

        let result = verify_token(&fake_token(), &jwk, AUDIENCE, ISSUER);
        assert_eq!(result.unwrap_err(), RejectionCause::BadKeyMaterial);
    }

    #[test]
    fn test_verify_token_rejects_undecodable_key_material() {
        let mut jwk = rsa_jwk();
        jwk.n = Some("!!!not-base64url!!!".to_string());

        let result = verify_token(&fake_token(), &jwk, AUDIENCE, ISSUER);
        assert_eq!(result.unwrap_err(), RejectionCause::BadKeyMaterial);
    }

    #[test]
    fn test_verify_token_accepts_jwk_without_alg_field() {
        // alg is optional in a JWK; verification proceeds and fails at the
        // signature instead of at key validation
        let mut jwk = rsa_jwk();
        jwk.alg = None;

        let result = verify_token(&fake_token(), &jwk, AUDIENCE, ISSUER);
        assert!(matches!(
            result,
            Err(RejectionCause::InvalidSignature | RejectionCause::Malformed)
        ));
    }

    #[test]
    fn test_classify_expired() {
        let err = jsonwebtoken::errors::ErrorKind::ExpiredSignature.into();
        assert_eq!(classify_decode_error(err), RejectionCause::Expired);
    }

    #[test]
    fn test_classify_audience_and_issuer() {
        let err = jsonwebtoken::errors::ErrorKind::InvalidAudience.into();
        assert_eq!(classify_decode_error(err), RejectionCause::InvalidAudience);

        let err = jsonwebtoken::errors::ErrorKind::InvalidIssuer.into();
        assert_eq!(classify_decode_error(err), RejectionCause::InvalidIssuer);
    }

    #[test]
    fn test_validator_creation() {
        let keyset = Arc::new(KeySetCache::new(
            "http://localhost:8082/.well-known/jwks.json".to_string(),
            Duration::from_secs(10),
        ));
        let validator = TokenValidator::new(keyset, AUDIENCE.to_string(), ISSUER.to_string());

        assert_eq!(validator.audience, AUDIENCE);
        assert_eq!(validator.issuer, ISSUER);
    }
}
