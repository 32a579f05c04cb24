use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::debug;

use super::claims::{IdentityClaims, VerifiedIdentity};
use crate::config::IdentityConfig;

/// Turns a bearer token into a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> anyhow::Result<VerifiedIdentity>;
}

/// HS256 identity tokens checked against issuer and audience.
#[derive(Clone)]
pub struct JwtIdentity {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(cfg: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&cfg.audience));
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentity {
    async fn verify(&self, token: &str) -> anyhow::Result<VerifiedIdentity> {
        let data = decode::<IdentityClaims>(token, &self.decoding, &self.validation)?;
        debug!(sub = %data.claims.sub, "identity token verified");
        Ok(data.claims.into())
    }
}

#[cfg(test)]
pub(crate) fn sign_for_tests(cfg: &IdentityConfig, email: &str, email_verified: bool) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};

    let now = OffsetDateTime::now_utc();
    let claims = IdentityClaims {
        sub: format!("uid-{email}"),
        email: email.into(),
        email_verified,
        iat: now.unix_timestamp() as usize,
        exp: (now + Duration::minutes(5)).unix_timestamp() as usize,
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
    .expect("sign test token")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(issuer: &str, audience: &str) -> IdentityConfig {
        IdentityConfig {
            secret: "dev-secret".into(),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    #[tokio::test]
    async fn verifies_token_and_normalises_email() {
        let cfg = cfg("iss", "aud");
        let token = sign_for_tests(&cfg, "Rider@Example.com", true);
        let identity = JwtIdentity::new(&cfg).verify(&token).await.unwrap();
        assert_eq!(identity.email, "rider@example.com");
        assert!(identity.email_verified);
    }

    #[tokio::test]
    async fn rejects_wrong_issuer_or_audience() {
        let token = sign_for_tests(&cfg("good-iss", "good-aud"), "a@x.com", true);
        assert!(JwtIdentity::new(&cfg("bad-iss", "good-aud"))
            .verify(&token)
            .await
            .is_err());
        assert!(JwtIdentity::new(&cfg("good-iss", "bad-aud"))
            .verify(&token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        assert!(JwtIdentity::new(&cfg("iss", "aud"))
            .verify("not-a-token")
            .await
            .is_err());
    }
}
