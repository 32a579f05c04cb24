mod dto;
pub mod gateway;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub use gateway::{PaymentGateway, StripeGateway};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::payment_routes())
}
