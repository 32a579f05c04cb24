use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentGatewayConfig {
    pub base_url: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub identity: IdentityConfig,
    pub payments: PaymentGatewayConfig,
    /// Whether a delivered parcel may be toggled back to in-transit.
    pub allow_redelivery: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let identity = IdentityConfig {
            secret: std::env::var("IDENTITY_SECRET").context("IDENTITY_SECRET is not set")?,
            issuer: std::env::var("IDENTITY_ISSUER").unwrap_or_else(|_| "zapshift".into()),
            audience: std::env::var("IDENTITY_AUDIENCE").unwrap_or_else(|_| "zapshift-web".into()),
        };
        let payments = PaymentGatewayConfig {
            base_url: std::env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".into()),
            secret_key: std::env::var("PAYMENT_GATEWAY_KEY")
                .context("PAYMENT_GATEWAY_KEY is not set")?,
        };
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let allow_redelivery = std::env::var("ALLOW_REDELIVERY")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Self {
            database_url,
            max_connections,
            identity,
            payments,
            allow_redelivery,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
