use serde::{Deserialize, Serialize};

/// Payload of an identity token issued by the sign-in provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,    // provider user id
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// What the rest of the service learns from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub email_verified: bool,
}

impl From<IdentityClaims> for VerifiedIdentity {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            email: claims.email.trim().to_lowercase(),
            email_verified: claims.email_verified,
        }
    }
}
