//! The token minting function
//!
//! Stateless: each request reads one invoice, derives a token and returns a
//! payment URL. See [`token`] for the derivation and [`handler`] for HTTP.

pub mod handler;
pub mod token;

pub use handler::{MintFailure, MintState, mint_payment_token, preflight};
pub use token::{LinkMinter, TokenPayload};
