//! JSON-RPC backend
//!
//! Only the two read calls the diagnostics need: `eth_accounts` and
//! `eth_getBalance`. Requests are sent one at a time and never retried.

use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, U256};
use reqwest::{Client, Url};
use tracing::debug;

use crate::chain::{AccountBackend, ChainError};

#[derive(Debug, Clone)]
enum AccountSet {
    /// Derived from configured private keys or a mnemonic
    Local(Vec<Address>),
    /// Enumerated by the node via `eth_accounts`
    Remote,
}

/// Backend for any profile with an RPC endpoint
#[derive(Debug, Clone)]
pub struct ProviderChain {
    provider: Provider<Http>,
    accounts: AccountSet,
}

impl ProviderChain {
    /// Connects to `url`, enumerating the node's own accounts until
    /// [`ProviderChain::local`] says otherwise. The URL is parsed here, so an
    /// endpoint built from a missing RPC variable fails at this point.
    pub fn connect(url: &str, timeout: Option<Duration>) -> Result<Self, ChainError> {
        let parsed = Url::parse(url).map_err(|e| ChainError::InvalidEndpoint {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = Http::new_with_client(parsed, builder.build()?);

        Ok(Self {
            provider: Provider::new(http),
            accounts: AccountSet::Remote,
        })
    }

    /// Serve a fixed account list instead of asking the node.
    pub fn local(self, accounts: Vec<Address>) -> Self {
        Self {
            accounts: AccountSet::Local(accounts),
            ..self
        }
    }
}

#[async_trait]
impl AccountBackend for ProviderChain {
    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        match &self.accounts {
            AccountSet::Local(accounts) => Ok(accounts.clone()),
            AccountSet::Remote => {
                debug!("eth_accounts");
                Ok(self.provider.get_accounts().await?)
            }
        }
    }

    async fn balance(&self, address: &Address) -> Result<U256, ChainError> {
        debug!(%address, "eth_getBalance");
        Ok(self.provider.get_balance(*address, None).await?)
    }
}
