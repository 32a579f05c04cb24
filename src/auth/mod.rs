mod claims;
pub(crate) mod extractors;
pub mod jwt;

pub use extractors::{AdminUser, RiderOrAdmin, VerifiedUser};
pub use jwt::{IdentityVerifier, JwtIdentity};
