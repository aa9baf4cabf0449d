//! Server host holding everything a function invocation needs
//!
//! The host is immutable once built; each request only reads from it.

use crate::config::PaylinkConfig;
use crate::core::auth::AuthProvider;
use crate::core::store::InvoiceStore;
use crate::mint::{LinkMinter, MintState};
use anyhow::Result;
use std::sync::Arc;

pub struct ServerHost {
    pub config: Arc<PaylinkConfig>,
    pub store: Arc<dyn InvoiceStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub minter: Arc<LinkMinter>,
}

impl ServerHost {
    /// Build the host from builder components
    ///
    /// Fails if the configuration does not validate.
    pub fn from_builder_components(
        config: PaylinkConfig,
        store: Arc<dyn InvoiceStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let minter = Arc::new(LinkMinter::from_config(&config.minter)?);

        Ok(Self {
            config: Arc::new(config),
            store,
            auth,
            minter,
        })
    }

    /// State for the mint handler
    pub fn mint_state(&self) -> MintState {
        MintState {
            store: self.store.clone(),
            auth: self.auth.clone(),
            minter: self.minter.clone(),
        }
    }
}
