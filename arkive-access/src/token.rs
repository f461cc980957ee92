//! Session token issuance, validation and revocation

use std::collections::HashSet;
use std::sync::RwLock;

use arkive_core::{ArkiveError, ArkiveResult, UserId};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session tokens expire seven days after issuance.
const SESSION_TTL_DAYS: i64 = 7;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username at issuance
    pub username: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    fn new(user_id: &str, username: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Expired means any instant at or past the expiry claim.
    fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// The caller identity established from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

/// Issues, validates and revokes session tokens.
///
/// Holds the signing keys and the process-wide revocation set; owned by
/// application state rather than living in a global. The revocation set
/// only grows for the lifetime of the process and is consulted before
/// signature verification, so a logged-out token stays dead even while
/// cryptographically valid.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    revoked: RwLock<HashSet<String>>,
}

impl TokenAuthority {
    pub fn new(secret: &[u8]) -> Self {
        // HS256 is the only accepted algorithm; a token header naming
        // anything else fails validation outright.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            revoked: RwLock::new(HashSet::new()),
        }
    }

    /// Issue a session token for `user_id`, valid for seven days.
    pub fn issue(&self, user_id: &str, username: &str) -> ArkiveResult<String> {
        self.issue_with_ttl(user_id, username, Duration::days(SESSION_TTL_DAYS))
    }

    /// Issue a session token with an explicit lifetime.
    pub fn issue_with_ttl(
        &self,
        user_id: &str,
        username: &str,
        ttl: Duration,
    ) -> ArkiveResult<String> {
        let claims = Claims::new(user_id, username, ttl);
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ArkiveError::dependency_with("failed to sign session token", e))
    }

    /// Validate the raw value of an authorization header and extract the
    /// caller identity.
    ///
    /// A `Bearer ` prefix is stripped when present. Checks run in a fixed
    /// order: revocation, signature and algorithm, expiry, subject claim.
    /// Every failure maps to the same `Unauthenticated` error; the
    /// specific reason is only logged.
    pub fn authenticate(&self, header_value: &str) -> ArkiveResult<Identity> {
        let token = strip_bearer(header_value);
        if token.is_empty() {
            return Err(ArkiveError::Unauthenticated);
        }

        if self.is_revoked(token) {
            debug!("rejected invalidated token");
            return Err(ArkiveError::Unauthenticated);
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("token validation failed: {}", e);
            ArkiveError::Unauthenticated
        })?;

        let claims = data.claims;
        if claims.is_expired() {
            debug!("rejected expired token for {}", claims.sub);
            return Err(ArkiveError::Unauthenticated);
        }
        if claims.sub.is_empty() {
            debug!("rejected token without a subject claim");
            return Err(ArkiveError::Unauthenticated);
        }

        Ok(Identity {
            user_id: claims.sub,
            username: claims.username,
        })
    }

    /// Add `token` to the revocation set. Idempotent; the set never
    /// shrinks within the process lifetime.
    pub fn revoke(&self, token: &str) {
        let token = strip_bearer(token);
        if token.is_empty() {
            return;
        }
        self.revoked.write().unwrap().insert(token.to_string());
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.revoked.read().unwrap().contains(token)
    }
}

fn strip_bearer(value: &str) -> &str {
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> TokenAuthority {
        TokenAuthority::new(b"unit-test-secret")
    }

    #[test]
    fn issue_then_authenticate_roundtrip() {
        let authority = authority();
        let token = authority.issue("u1", "alice").unwrap();

        let identity = authority.authenticate(&token).unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let authority = authority();
        let token = authority.issue("u1", "alice").unwrap();

        let identity = authority
            .authenticate(&format!("Bearer {}", token))
            .unwrap();
        assert_eq!(identity.user_id, "u1");
    }

    #[test]
    fn empty_header_is_rejected() {
        let authority = authority();
        assert!(matches!(
            authority.authenticate(""),
            Err(ArkiveError::Unauthenticated)
        ));
        assert!(matches!(
            authority.authenticate("Bearer "),
            Err(ArkiveError::Unauthenticated)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let authority = authority();
        assert!(matches!(
            authority.authenticate("not-a-token"),
            Err(ArkiveError::Unauthenticated)
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let issuer = TokenAuthority::new(b"some-other-secret");
        let token = issuer.issue("u1", "alice").unwrap();

        assert!(matches!(
            authority().authenticate(&token),
            Err(ArkiveError::Unauthenticated)
        ));
    }

    #[test]
    fn wrong_algorithm_is_rejected() {
        // Same secret, but signed with HS384; the algorithm check alone
        // must fail it.
        let claims = Claims::new("u1", "alice", Duration::days(1));
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        assert!(matches!(
            authority().authenticate(&token),
            Err(ArkiveError::Unauthenticated)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let authority = authority();
        let token = authority
            .issue_with_ttl("u1", "alice", Duration::seconds(-60))
            .unwrap();

        assert!(matches!(
            authority.authenticate(&token),
            Err(ArkiveError::Unauthenticated)
        ));
    }

    #[test]
    fn revocation_outlives_signature_validity() {
        let authority = authority();
        let token = authority.issue("u1", "alice").unwrap();
        assert!(authority.authenticate(&token).is_ok());

        authority.revoke(&token);
        // Still structurally valid and unexpired, yet dead on every
        // subsequent call.
        for _ in 0..3 {
            assert!(matches!(
                authority.authenticate(&token),
                Err(ArkiveError::Unauthenticated)
            ));
        }
        // Revoking again changes nothing.
        authority.revoke(&token);
        assert!(authority.authenticate(&token).is_err());
    }

    #[test]
    fn revoking_with_bearer_prefix_matches_bare_token() {
        let authority = authority();
        let token = authority.issue("u1", "alice").unwrap();

        authority.revoke(&format!("Bearer {}", token));
        assert!(authority.authenticate(&token).is_err());
    }
}
