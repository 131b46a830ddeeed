//! HS256 JSON Web Token adapter for the `CredentialCodec` port.
//!
//! Expiry is checked against the injected clock rather than the system time,
//! with zero leeway, so tests can mint tokens that are already stale.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{CredentialCodec, CredentialError, IssuedCredential};
use crate::domain::{EmailAddress, Identity, Role, UserId};

/// Claims carried by every issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Signing and verification keys derived from one shared secret.
pub struct JwtCredentialCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl JwtCredentialCodec {
    /// Build a codec signing with `secret` and issuing tokens valid for `ttl`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use chrono::TimeDelta;
    /// use mockable::DefaultClock;
    /// use warden::outbound::credentials::JwtCredentialCodec;
    /// use zeroize::Zeroizing;
    ///
    /// let secret = Zeroizing::new(b"0123456789abcdef0123456789abcdef".to_vec());
    /// let _codec = JwtCredentialCodec::new(&secret, TimeDelta::hours(1), Arc::new(DefaultClock));
    /// ```
    pub fn new(secret: &Zeroizing<Vec<u8>>, ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        }
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    fn identity_from(claims: Claims) -> Result<Identity, CredentialError> {
        let id = claims
            .sub
            .parse::<i64>()
            .ok()
            .and_then(|raw| UserId::new(raw).ok())
            .ok_or_else(|| CredentialError::malformed("subject is not a user id"))?;
        let email = EmailAddress::new(&claims.email)
            .map_err(|_| CredentialError::malformed("email claim invalid"))?;
        let role = claims
            .role
            .parse::<Role>()
            .ok()
            .filter(|role| role.is_assignable())
            .ok_or_else(|| CredentialError::malformed("role claim invalid"))?;
        Ok(Identity::new(id, email, role))
    }
}

fn map_decode_error(err: &jsonwebtoken::errors::Error) -> CredentialError {
    match err.kind() {
        ErrorKind::InvalidSignature => CredentialError::invalid_signature(),
        ErrorKind::ExpiredSignature => CredentialError::expired(),
        other => CredentialError::malformed(format!("{other:?}")),
    }
}

impl CredentialCodec for JwtCredentialCodec {
    fn issue(&self, identity: &Identity) -> Result<IssuedCredential, CredentialError> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: identity.id().to_string(),
            email: identity.email().as_ref().to_owned(),
            role: identity.role().as_str().to_owned(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| CredentialError::signing(err.to_string()))?;
        Ok(IssuedCredential { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<Identity, CredentialError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            let mapped = map_decode_error(&err);
            debug!(error = %mapped, "token rejected");
            mapped
        })?;
        let expires_at = DateTime::<Utc>::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| CredentialError::malformed("expiry out of range"))?;
        if expires_at <= self.clock.utc() {
            return Err(CredentialError::expired());
        }
        Self::identity_from(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn codec_at(secret: &[u8], clock: Arc<dyn Clock>) -> JwtCredentialCodec {
        JwtCredentialCodec::new(&Zeroizing::new(secret.to_vec()), TimeDelta::hours(1), clock)
    }

    #[fixture]
    fn codec() -> JwtCredentialCodec {
        codec_at(SECRET, Arc::new(DefaultClock))
    }

    #[fixture]
    fn identity() -> Identity {
        Identity::new(
            UserId::new(42).expect("valid id"),
            EmailAddress::new("ann@x.com").expect("valid email"),
            Role::User,
        )
    }

    #[rstest]
    fn issued_token_verifies_to_same_identity(codec: JwtCredentialCodec, identity: Identity) {
        let issued = codec.issue(&identity).expect("issue");
        assert!(issued.expires_at > Utc::now());
        assert_eq!(codec.verify(&issued.token).expect("verify"), identity);
    }

    #[rstest]
    fn stale_token_is_expired(codec: JwtCredentialCodec, identity: Identity) {
        let past = Utc::now() - TimeDelta::hours(2);
        let minted = codec_at(SECRET, Arc::new(FixedClock(past)));
        let token = minted.issue(&identity).expect("issue").token;
        assert_eq!(codec.verify(&token), Err(CredentialError::expired()));
    }

    #[rstest]
    fn foreign_secret_fails_signature(codec: JwtCredentialCodec, identity: Identity) {
        let other = codec_at(b"another-secret-another-secret-another", Arc::new(DefaultClock));
        let token = other.issue(&identity).expect("issue").token;
        assert_eq!(codec.verify(&token), Err(CredentialError::invalid_signature()));
    }

    #[rstest]
    fn tampered_payload_is_rejected(codec: JwtCredentialCodec, identity: Identity) {
        let token = codec.issue(&identity).expect("issue").token;
        let admin = Identity::new(identity.id(), identity.email().clone(), Role::Admin);
        let forged_payload = codec.issue(&admin).expect("issue").token;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged: Vec<&str> = forged_payload.split('.').collect();
        parts[1] = forged[1];
        let spliced = parts.join(".");
        assert!(codec.verify(&spliced).is_err());
    }

    #[rstest]
    #[case("")]
    #[case("not-a-token")]
    #[case("a.b.c")]
    fn garbage_is_malformed(codec: JwtCredentialCodec, #[case] token: &str) {
        let err = codec.verify(token).expect_err("garbage must fail");
        assert!(err.is_invalid_credential());
    }
}
