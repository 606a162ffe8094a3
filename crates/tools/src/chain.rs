//! Account backends
//!
//! A backend turns a profile's credential source into the ordered list of
//! accounts the diagnostics report on, and answers balance lookups for them.
//! The simulation profile is served entirely in memory from its seed list;
//! every other profile talks JSON-RPC to its endpoint (see [`crate::rpc`]).

use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::ProviderError;
use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};
use ethers::types::{Address, U256};
use thiserror::Error;
use tracing::debug;

use crate::network::{CredentialSource, NetworkProfile, SeededAccount};
use crate::rpc::ProviderChain;
use crate::units;

/// Accounts derived from a mnemonic, matching the usual dev toolchain default
pub const MNEMONIC_ACCOUNT_COUNT: u32 = 20;

/// BIP-44 path for Ethereum accounts; the account index is appended
pub const DERIVATION_BASE_PATH: &str = "m/44'/60'/0'/0";

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid mnemonic for network {network}: {reason}")]
    InvalidMnemonic { network: String, reason: String },

    #[error(transparent)]
    Units(#[from] units::UnitsError),

    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Source of accounts and balances for one selected profile
#[async_trait]
pub trait AccountBackend: Send + Sync {
    /// Accounts in the order the signer enumerates them
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// Balance in wei
    async fn balance(&self, address: &Address) -> Result<U256, ChainError>;
}

/// Address controlled by a hex encoded private key, with or without `0x`.
pub fn address_from_key(key: &str) -> Result<Address, ChainError> {
    let wallet = key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))?;
    Ok(wallet.address())
}

/// Derive the first `count` accounts of a seed phrase.
pub fn addresses_from_mnemonic(
    network: &str,
    phrase: &str,
    count: u32,
) -> Result<Vec<Address>, ChainError> {
    let invalid = |reason: String| ChainError::InvalidMnemonic {
        network: network.to_string(),
        reason,
    };

    (0..count)
        .map(|index| {
            let wallet = MnemonicBuilder::<English>::default()
                .phrase(phrase)
                .derivation_path(&format!("{DERIVATION_BASE_PATH}/{index}"))
                .map_err(|e| invalid(e.to_string()))?
                .build()
                .map_err(|e| invalid(e.to_string()))?;
            Ok(wallet.address())
        })
        .collect()
}

/// In-memory chain backed by the simulation seed list
#[derive(Debug, Clone, Default)]
pub struct SimulatedChain {
    accounts: Vec<(Address, U256)>,
}

impl SimulatedChain {
    pub fn from_seeds(seeds: &[SeededAccount]) -> Result<Self, ChainError> {
        let accounts = seeds
            .iter()
            .map(|seed| -> Result<(Address, U256), ChainError> {
                Ok((
                    address_from_key(&seed.private_key)?,
                    units::parse_amount(&seed.balance)?,
                ))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { accounts })
    }
}

#[async_trait]
impl AccountBackend for SimulatedChain {
    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.accounts.iter().map(|(address, _)| *address).collect())
    }

    async fn balance(&self, address: &Address) -> Result<U256, ChainError> {
        Ok(self
            .accounts
            .iter()
            .find(|(candidate, _)| candidate == address)
            .map(|(_, balance)| *balance)
            .unwrap_or_default())
    }
}

/// Build the backend for a profile.
///
/// This is the first point where credentials and endpoints are actually
/// used, so malformed keys, phrases and URLs are reported here rather than
/// when the registry is built.
pub fn backend_for(profile: &NetworkProfile) -> Result<Box<dyn AccountBackend>, ChainError> {
    let connect = || {
        let url = profile.endpoint_url().unwrap_or_default();
        let timeout = profile.timeout_ms.map(Duration::from_millis);
        ProviderChain::connect(&url, timeout)
    };

    match &profile.credential_source {
        CredentialSource::InlineBalanceSeedList(seeds) => {
            debug!(network = %profile.name, accounts = seeds.len(), "using simulated chain");
            Ok(Box::new(SimulatedChain::from_seeds(seeds)?))
        }
        CredentialSource::PrivateKeyList(keys) if keys.is_empty() => {
            debug!(network = %profile.name, "no keys configured, using node accounts");
            Ok(Box::new(connect()?))
        }
        CredentialSource::PrivateKeyList(keys) => {
            let chain = connect()?;
            let accounts = keys
                .iter()
                .map(|key| address_from_key(key))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(network = %profile.name, accounts = accounts.len(), "using local keys");
            Ok(Box::new(chain.local(accounts)))
        }
        CredentialSource::Mnemonic(phrase) => {
            let chain = connect()?;
            let accounts =
                addresses_from_mnemonic(&profile.name, phrase, MNEMONIC_ACCOUNT_COUNT)?;
            debug!(network = %profile.name, accounts = accounts.len(), "using mnemonic accounts");
            Ok(Box::new(chain.local(accounts)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{vars, EnvInput};
    use crate::network::{resolve_profiles, ONE_MILLION_ETH};
    use crate::wallet::{WalletKeys, PRIVATE_KEYS};
    use ethers::utils::to_checksum;

    const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";
    const DEV_KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const DEV_KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const DEV_ADDRESS_1: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn checksums(accounts: &[Address]) -> Vec<String> {
        accounts.iter().map(|a| to_checksum(a, None)).collect()
    }

    #[test]
    fn test_address_from_key() {
        assert_eq!(to_checksum(&address_from_key(DEV_KEY_0).unwrap(), None), DEV_ADDRESS_0);
        // Prefix is optional
        assert_eq!(to_checksum(&address_from_key(DEV_KEY_1).unwrap(), None), DEV_ADDRESS_1);
    }

    #[test]
    fn test_address_rejects_bad_keys() {
        let zero = format!("0x{}", "00".repeat(32));
        for key in ["", "0x", "0xnothex", "0x01", zero.as_str()] {
            assert!(
                matches!(address_from_key(key), Err(ChainError::InvalidPrivateKey(_))),
                "{key:?}"
            );
        }
    }

    #[test]
    fn test_mnemonic_derivation_follows_bip44() {
        let accounts = addresses_from_mnemonic("mainnet", DEV_MNEMONIC, 2).unwrap();
        assert_eq!(checksums(&accounts), vec![DEV_ADDRESS_0, DEV_ADDRESS_1]);
    }

    #[test]
    fn test_empty_mnemonic_is_rejected() {
        assert!(matches!(
            addresses_from_mnemonic("ropsten", "", 1),
            Err(ChainError::InvalidMnemonic { network, .. }) if network == "ropsten"
        ));
    }

    #[tokio::test]
    async fn test_simulated_chain_reports_seeded_balances() {
        let seeds: Vec<_> = PRIVATE_KEYS
            .iter()
            .map(|key| SeededAccount {
                private_key: key.to_string(),
                balance: ONE_MILLION_ETH.to_string(),
            })
            .collect();
        let chain = SimulatedChain::from_seeds(&seeds).unwrap();

        let accounts = chain.accounts().await.unwrap();
        assert_eq!(accounts.len(), PRIVATE_KEYS.len());
        assert_eq!(checksums(&accounts[..2]), vec![DEV_ADDRESS_0, DEV_ADDRESS_1]);

        let balance = chain.balance(&accounts[2]).await.unwrap();
        assert_eq!(units::format_ether(balance), "1000000");

        let stranger = Address::repeat_byte(7);
        assert!(chain.balance(&stranger).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_backend_for_simulation_profile() {
        let registry = resolve_profiles(&EnvInput::default(), &WalletKeys::embedded());
        let backend = backend_for(registry.simulation().unwrap()).unwrap();
        assert_eq!(backend.accounts().await.unwrap().len(), PRIVATE_KEYS.len());
    }

    #[tokio::test]
    async fn test_backend_for_mnemonic_profile_derives_accounts() {
        let env: EnvInput = [(vars::MAINNET_DEPLOY_MNEMONIC, DEV_MNEMONIC)]
            .into_iter()
            .collect();
        let registry = resolve_profiles(&env, &WalletKeys::embedded());

        let backend = backend_for(registry.get("mainnet").unwrap()).unwrap();
        let accounts = backend.accounts().await.unwrap();

        assert_eq!(accounts.len(), MNEMONIC_ACCOUNT_COUNT as usize);
        assert_eq!(checksums(&accounts[..2]), vec![DEV_ADDRESS_0, DEV_ADDRESS_1]);
    }

    #[tokio::test]
    async fn test_backend_for_missing_secrets_fails_late() {
        let registry = resolve_profiles(&EnvInput::default(), &WalletKeys::embedded());

        // "0x" + unset key
        assert!(matches!(
            backend_for(registry.get("kovan_privKey").unwrap()),
            Err(ChainError::InvalidPrivateKey(_))
        ));
        // Unset mnemonic
        assert!(matches!(
            backend_for(registry.get("ropsten").unwrap()),
            Err(ChainError::InvalidMnemonic { .. })
        ));
    }

    #[tokio::test]
    async fn test_backend_for_local_keys() {
        let env: EnvInput = [(vars::PRIVATE_KEYS, format!("{DEV_KEY_0},0x{DEV_KEY_1}"))]
            .into_iter()
            .collect();
        let registry = resolve_profiles(&env, &WalletKeys::embedded());

        let backend = backend_for(registry.get("localhost").unwrap()).unwrap();
        let accounts = backend.accounts().await.unwrap();
        assert_eq!(checksums(&accounts), vec![DEV_ADDRESS_0, DEV_ADDRESS_1]);
        assert!(backend_for(registry.get("rinkeby").unwrap()).is_ok());
    }
}
