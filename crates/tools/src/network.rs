//! Network profile registry
//!
//! Every network the toolkit can target is described by one
//! [`NetworkProfile`]. [`resolve_profiles`] builds the full set from an
//! [`EnvInput`] snapshot and the embedded wallet keys. The build never
//! fails: a missing token or key flows through as an empty string and only
//! surfaces when something actually connects. [`ProfileRegistry::validate`]
//! is available for callers that want to find those problems up front.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{vars, ConfigError, EnvInput, REDACTED};
use crate::wallet::WalletKeys;

/// Balance given to every seeded simulation account (one million ether, in wei)
pub const ONE_MILLION_ETH: &str = "1000000000000000000000000";

/// Loopback node used by `localhost` and the fork profiles
pub const LOCAL_NODE_URL: &str = "http://127.0.0.1:8545";

/// Name of the in-process simulation profile
pub const SIMULATION_NETWORK: &str = "hardhat";

const GWEI: u64 = 1_000_000_000;

fn infura_base(network: &str) -> String {
    format!("https://{network}.infura.io/v3/")
}

/// Where a profile's chain lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    /// Ephemeral in-process chain
    Simulation,
    /// Node on the loopback interface, including forks of public chains
    Local,
    /// Remote test or main network
    Public,
}

impl NetworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Simulation => "simulation",
            NetworkKind::Local => "local",
            NetworkKind::Public => "public",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A simulation account and its starting balance in wei (base 10)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededAccount {
    pub private_key: String,
    pub balance: String,
}

/// Where a profile's signing accounts come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Deterministic test keys with preset balances
    InlineBalanceSeedList(Vec<SeededAccount>),
    /// Raw hex private keys; an empty list defers to the node's own accounts
    PrivateKeyList(Vec<String>),
    /// Seed phrase, derived by the external wallet
    Mnemonic(String),
}

impl CredentialSource {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialSource::InlineBalanceSeedList(_) => "seeded",
            CredentialSource::PrivateKeyList(_) => "private-keys",
            CredentialSource::Mnemonic(_) => "mnemonic",
        }
    }

    /// Human readable description that never includes secret material
    pub fn describe(&self) -> String {
        match self {
            CredentialSource::InlineBalanceSeedList(seeds) => {
                format!("{} seeded accounts", seeds.len())
            }
            CredentialSource::PrivateKeyList(keys) if keys.is_empty() => {
                "node accounts (eth_accounts)".to_string()
            }
            CredentialSource::PrivateKeyList(keys) => format!("{} private keys", keys.len()),
            CredentialSource::Mnemonic(_) => "mnemonic".to_string(),
        }
    }
}

/// RPC endpoint, kept as base path plus optional access token so the token
/// can be redacted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
    token: Option<String>,
}

impl Endpoint {
    pub fn fixed(url: impl Into<String>) -> Self {
        Self {
            base: url.into(),
            token: None,
        }
    }

    pub fn with_token(base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Full connection string
    pub fn url(&self) -> String {
        match &self.token {
            Some(token) => format!("{}{}", self.base, token),
            None => self.base.clone(),
        }
    }

    /// Display form: the token is masked, and a fixed URL keeps only its
    /// origin when it has a path or query (provider keys often live there).
    pub fn redacted(&self) -> String {
        match &self.token {
            Some(token) if !token.is_empty() => format!("{}{}", self.base, REDACTED),
            Some(_) => self.base.clone(),
            None => redact_url(&self.base),
        }
    }
}

fn redact_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    match Url::parse(url) {
        Ok(parsed) if parsed.host_str().is_some() => {
            let origin = parsed.origin().ascii_serialization();
            if matches!(parsed.path(), "" | "/") && parsed.query().is_none() {
                origin
            } else {
                format!("{origin}/{REDACTED}")
            }
        }
        _ => REDACTED.to_string(),
    }
}

/// Resolved settings for one target network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub name: String,
    pub kind: NetworkKind,
    pub chain_id: Option<u64>,
    pub endpoint: Option<Endpoint>,
    pub credential_source: CredentialSource,
    /// Whether the external deployment writer persists artifacts
    pub persist_deployments: bool,
    pub verbose_logging: bool,
    /// Fixed gas price in wei
    pub gas_price_override: Option<u64>,
    pub tags: BTreeSet<String>,
    pub live: bool,
    /// RPC request timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

impl NetworkProfile {
    fn new(name: &str, kind: NetworkKind, toggles: Toggles) -> Self {
        Self {
            name: name.to_string(),
            kind,
            chain_id: None,
            endpoint: None,
            credential_source: CredentialSource::PrivateKeyList(Vec::new()),
            persist_deployments: toggles.persist_deployments,
            verbose_logging: toggles.verbose_logging,
            gas_price_override: None,
            tags: BTreeSet::from([name.to_string()]),
            live: true,
            timeout_ms: None,
        }
    }

    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint.as_ref().map(Endpoint::url)
    }

    pub fn is_public(&self) -> bool {
        self.kind == NetworkKind::Public
    }

    /// Display-safe view of the profile
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            name: self.name.clone(),
            kind: self.kind,
            chain_id: self.chain_id,
            endpoint: self.endpoint.as_ref().map(Endpoint::redacted),
            credentials: self.credential_source.describe(),
            persist_deployments: self.persist_deployments,
            verbose_logging: self.verbose_logging,
            gas_price_override: self.gas_price_override,
            tags: self.tags.iter().cloned().collect(),
            live: self.live,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub name: String,
    pub kind: NetworkKind,
    pub chain_id: Option<u64>,
    pub endpoint: Option<String>,
    pub credentials: String,
    pub persist_deployments: bool,
    pub verbose_logging: bool,
    pub gas_price_override: Option<u64>,
    pub tags: Vec<String>,
    pub live: bool,
}

#[derive(Debug, Clone, Copy)]
struct Toggles {
    persist_deployments: bool,
    verbose_logging: bool,
}

/// Build every network profile from the environment and the static keys.
///
/// Pure: the same inputs always produce the same registry.
pub fn resolve_profiles(env: &EnvInput, keys: &WalletKeys) -> ProfileRegistry {
    use NetworkKind::{Local, Public, Simulation};

    let toggles = Toggles {
        persist_deployments: env.toggle(vars::SAVE_DEPLOYMENT),
        verbose_logging: env.toggle(vars::LOGGING),
    };
    let infura_token = env.text(vars::INFURA_TOKEN);
    let infura = |network: &str| Some(Endpoint::with_token(infura_base(network), &infura_token));
    let loopback = || Some(Endpoint::fixed(LOCAL_NODE_URL));
    let private_keys = || CredentialSource::PrivateKeyList(env.key_list(vars::PRIVATE_KEYS));
    let keys_from = |names: &[&str], prefix: &str| {
        CredentialSource::PrivateKeyList(
            names
                .iter()
                .map(|name| format!("{prefix}{}", env.text(name)))
                .collect(),
        )
    };

    let seeded = keys
        .general
        .iter()
        .map(|key| SeededAccount {
            private_key: key.clone(),
            balance: ONE_MILLION_ETH.to_string(),
        })
        .collect();

    let profiles = vec![
        NetworkProfile {
            credential_source: CredentialSource::InlineBalanceSeedList(seeded),
            live: true,
            ..NetworkProfile::new(SIMULATION_NETWORK, Simulation, toggles)
        },
        NetworkProfile {
            endpoint: loopback(),
            credential_source: private_keys(),
            live: false,
            timeout_ms: Some(100_000),
            ..NetworkProfile::new("localhost", Local, toggles)
        },
        NetworkProfile {
            chain_id: Some(42),
            endpoint: infura("kovan"),
            credential_source: private_keys(),
            gas_price_override: Some(3 * GWEI),
            ..NetworkProfile::new("kovan", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(42),
            endpoint: infura("kovan"),
            credential_source: keys_from(&[vars::KOVAN_DEPLOY_PRIVATE_KEY], "0x"),
            ..NetworkProfile::new("kovan_privKey", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(42),
            endpoint: infura("kovan"),
            credential_source: CredentialSource::PrivateKeyList(keys.kovan.clone()),
            ..NetworkProfile::new("kovan_custom_accounts", Public, toggles)
        },
        NetworkProfile {
            endpoint: loopback(),
            credential_source: private_keys(),
            gas_price_override: Some(GWEI),
            ..NetworkProfile::new("kovan_fork", Local, toggles)
        },
        NetworkProfile {
            chain_id: Some(3),
            endpoint: infura("ropsten"),
            credential_source: CredentialSource::Mnemonic(env.text(vars::ROPSTEN_DEPLOY_MNEMONIC)),
            ..NetworkProfile::new("ropsten", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(3),
            endpoint: infura("ropsten"),
            credential_source: keys_from(&[vars::ROPSTEN_DEPLOY_PRIVATE_KEY], "0x"),
            ..NetworkProfile::new("ropsten_privKey", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(3),
            endpoint: loopback(),
            ..NetworkProfile::new("ropsten_fork", Local, toggles)
        },
        NetworkProfile {
            chain_id: Some(1),
            endpoint: infura("mainnet"),
            credential_source: CredentialSource::Mnemonic(env.text(vars::MAINNET_DEPLOY_MNEMONIC)),
            ..NetworkProfile::new("mainnet", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(1),
            endpoint: infura("mainnet"),
            credential_source: keys_from(
                &[vars::MAINNET_PRIVATE_KEYS, vars::MAINNET_PRIVATE_KEYS2],
                "0x",
            ),
            ..NetworkProfile::new("mainnet_privKey", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(1),
            endpoint: loopback(),
            ..NetworkProfile::new("mainnet_fork", Local, toggles)
        },
        NetworkProfile {
            chain_id: Some(5),
            endpoint: infura("goerli"),
            credential_source: keys_from(
                &[vars::GOERLI_PRIVATE_KEY, vars::GOERLI_PRIVATE_KEY_2],
                "",
            ),
            ..NetworkProfile::new("goerli", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(4),
            endpoint: infura("rinkeby"),
            ..NetworkProfile::new("rinkeby", Public, toggles)
        },
        NetworkProfile {
            chain_id: Some(80001),
            endpoint: match env.get(vars::MATIC_RPC) {
                Some(url) if !url.is_empty() => Some(Endpoint::fixed(url)),
                _ => infura("polygon-mumbai"),
            },
            credential_source: keys_from(
                &[
                    vars::MATIC_MUMAI_PRIVATE_KEY,
                    vars::MATIC_MUMAI_PRIVATE_KEY_2,
                    vars::MATIC_MUMAI_PRIVATE_KEY_3,
                ],
                "",
            ),
            gas_price_override: Some(GWEI),
            ..NetworkProfile::new("matic_mumbai", Public, toggles)
        },
    ];

    ProfileRegistry {
        profiles: profiles
            .into_iter()
            .map(|profile| (profile.name.clone(), profile))
            .collect(),
    }
}

/// Immutable name → profile mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, NetworkProfile>,
}

impl ProfileRegistry {
    pub fn get(&self, name: &str) -> Option<&NetworkProfile> {
        self.profiles.get(name)
    }

    pub fn select(&self, name: &str) -> Result<&NetworkProfile, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }

    /// The in-process simulation profile, which is always registered
    pub fn simulation(&self) -> Option<&NetworkProfile> {
        self.get(SIMULATION_NETWORK)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Profiles in name order
    pub fn iter(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Eagerly check every profile for problems that would otherwise only
    /// show up on first connection.
    pub fn validate(&self) -> Vec<ProfileIssue> {
        self.iter().flat_map(validate_profile).collect()
    }
}

/// A configuration problem found by eager validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileIssue {
    pub network: String,
    pub problem: IssueKind,
}

impl fmt::Display for ProfileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.network, self.problem)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    #[error("public network has no chain id")]
    MissingChainId,

    #[error("endpoint URL is empty")]
    EmptyEndpoint,

    #[error("access token is missing from the endpoint URL")]
    MissingAccessToken,

    #[error("endpoint URL must start with http:// or https://: {0}")]
    InvalidEndpointScheme(String),

    #[error("private key #{0} is empty")]
    EmptyPrivateKey(usize),

    #[error("mnemonic is empty")]
    EmptyMnemonic,
}

/// Validate a single profile. Returns every issue found, not just the first.
pub fn validate_profile(profile: &NetworkProfile) -> Vec<ProfileIssue> {
    let mut problems = Vec::new();

    if profile.is_public() && profile.chain_id.is_none() {
        problems.push(IssueKind::MissingChainId);
    }

    match &profile.endpoint {
        Some(endpoint) => {
            let url = endpoint.url();
            if url.is_empty() {
                problems.push(IssueKind::EmptyEndpoint);
            } else if !url.starts_with("http://") && !url.starts_with("https://") {
                problems.push(IssueKind::InvalidEndpointScheme(endpoint.redacted()));
            }
            if endpoint.token().is_some_and(str::is_empty) {
                problems.push(IssueKind::MissingAccessToken);
            }
        }
        None if profile.kind != NetworkKind::Simulation => {
            problems.push(IssueKind::EmptyEndpoint);
        }
        None => {}
    }

    match &profile.credential_source {
        CredentialSource::InlineBalanceSeedList(_) => {}
        CredentialSource::PrivateKeyList(keys) => {
            for (index, key) in keys.iter().enumerate() {
                let key = key.trim();
                if key.is_empty() || key == "0x" {
                    problems.push(IssueKind::EmptyPrivateKey(index));
                }
            }
        }
        CredentialSource::Mnemonic(phrase) => {
            if phrase.trim().is_empty() {
                problems.push(IssueKind::EmptyMnemonic);
            }
        }
    }

    problems
        .into_iter()
        .map(|problem| ProfileIssue {
            network: profile.name.clone(),
            problem,
        })
        .collect()
}
