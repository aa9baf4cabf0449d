//! The hosted-functions half: an axum server exposing the token minter
//!
//! - `POST /mint-payment-token` (plus CORS preflight)
//! - `GET /health`, `GET /healthz`

pub mod builder;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use host::ServerHost;
