//! Environment input and toolchain configuration
//!
//! The process environment is captured exactly once into an [`EnvInput`]
//! snapshot and passed explicitly to everything that needs it. Resolution
//! order for the pass-through toolchain settings is:
//!
//! 1. Built-in defaults
//! 2. `contractkit.toml` in the working directory (or `--config PATH`)
//! 3. Environment overlays (`ETHERSCAN`, `COINMARKETCAP`)
//!
//! # Examples
//!
//! ```rust,no_run
//! use contractkit_tools::config::{Config, EnvInput, ToolkitSettings};
//! use contractkit_tools::wallet::WalletKeys;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let env = EnvInput::from_process();
//! let settings = ToolkitSettings::load(None)?;
//! let config = Config::resolve(&env, settings, &WalletKeys::embedded())?;
//! let profile = config.select(None)?;
//! println!("Network: {}", profile.name);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::network::{resolve_profiles, NetworkProfile, ProfileRegistry, SIMULATION_NETWORK};
use crate::wallet::WalletKeys;

/// Default settings file, looked up in the working directory
pub const SETTINGS_FILE: &str = "contractkit.toml";

/// Names of every environment variable the toolkit reads.
pub mod vars {
    pub const SAVE_DEPLOYMENT: &str = "SAVE_DEPLOYMENT";
    pub const LOGGING: &str = "LOGGING";
    pub const PRIVATE_KEYS: &str = "PRIVATE_KEYS";
    pub const INFURA_TOKEN: &str = "INFURA_TOKEN";
    pub const MATIC_RPC: &str = "MATIC_RPC";

    pub const KOVAN_DEPLOY_PRIVATE_KEY: &str = "KOVAN_DEPLOY_PRIVATE_KEY";
    pub const ROPSTEN_DEPLOY_PRIVATE_KEY: &str = "ROPSTEN_DEPLOY_PRIVATE_KEY";
    pub const ROPSTEN_DEPLOY_MNEMONIC: &str = "ROPSTEN_DEPLOY_MNEMONIC";
    pub const MAINNET_DEPLOY_MNEMONIC: &str = "MAINNET_DEPLOY_MNEMONIC";
    pub const MAINNET_PRIVATE_KEYS: &str = "MAINNET_PRIVATE_KEYS";
    pub const MAINNET_PRIVATE_KEYS2: &str = "MAINNET_PRIVATE_KEYS2";
    pub const GOERLI_PRIVATE_KEY: &str = "GOERLI_PRIVATE_KEY";
    pub const GOERLI_PRIVATE_KEY_2: &str = "GOERLI_PRIVATE_KEY_2";
    pub const MATIC_MUMAI_PRIVATE_KEY: &str = "MATIC_MUMAI_PRIVATE_KEY";
    pub const MATIC_MUMAI_PRIVATE_KEY_2: &str = "MATIC_MUMAI_PRIVATE_KEY_2";
    pub const MATIC_MUMAI_PRIVATE_KEY_3: &str = "MATIC_MUMAI_PRIVATE_KEY_3";

    pub const ETHERSCAN: &str = "ETHERSCAN";
    pub const COINMARKETCAP: &str = "COINMARKETCAP";
}

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Settings file not found: {0}")]
    MissingSettingsFile(String),

    #[error("Unknown network: {0}. Run `contractkit networks` to list the configured profiles")]
    UnknownNetwork(String),
}

/// Snapshot of the process environment.
///
/// Lookups never fail: an absent variable is simply `None`, and the typed
/// accessors turn that into `false`, an empty list or an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvInput {
    vars: BTreeMap<String, String>,
    skipped: Vec<String>,
}

impl EnvInput {
    /// Capture the current process environment, loading `.env` first.
    ///
    /// Variables already set in the process take precedence over `.env`.
    pub fn from_process() -> Self {
        // Load .env file if it exists (non-fatal)
        let _ = dotenvy::dotenv();

        Self::from_os_vars(std::env::vars_os())
    }

    /// Build from raw OS pairs. Pairs that are not valid UTF-8 are left out
    /// and their names kept for [`EnvInput::warn_skipped`].
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut env = Self::default();
        for (key, value) in vars {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => {
                    env.vars.insert(key, value);
                }
                (Ok(key), Err(_)) => env.skipped.push(key),
                (Err(key), _) => env.skipped.push(key.to_string_lossy().into_owned()),
            }
        }
        env
    }

    /// Names of variables dropped because they were not valid UTF-8
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Log every skipped variable. Call once the subscriber is installed.
    pub fn warn_skipped(&self) {
        for key in &self.skipped {
            warn!(%key, "ignoring environment variable that is not valid UTF-8");
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Raw value, or the empty string when unset
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// `true` only when the variable is set and equals "true" ignoring case.
    pub fn toggle(&self, key: &str) -> bool {
        self.get(key).map(parse_toggle).unwrap_or(false)
    }

    /// Comma separated list; unset or empty yields no entries.
    pub fn key_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(parse_key_list).unwrap_or_default()
    }
}

impl<K, V> FromIterator<(K, V)> for EnvInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            skipped: Vec::new(),
        }
    }
}

/// Boolean toggle rule shared by every profile.
pub fn parse_toggle(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Split a comma separated key list. Entries are kept verbatim, in order.
pub fn parse_key_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerSettings {
    pub enabled: bool,
    pub runs: u32,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            runs: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoliditySettings {
    pub version: String,
    pub optimizer: OptimizerSettings,
}

impl Default for SoliditySettings {
    fn default() -> Self {
        Self {
            version: "0.8.7".to_string(),
            optimizer: OptimizerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MochaSettings {
    /// Test timeout in milliseconds
    pub timeout: u64,
}

impl Default for MochaSettings {
    fn default() -> Self {
        Self { timeout: 20_000_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypechainSettings {
    pub out_dir: String,
    pub target: String,
}

impl Default for TypechainSettings {
    fn default() -> Self {
        Self {
            out_dir: "typechain".to_string(),
            target: "ethers-v5".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EtherscanSettings {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GasReporterSettings {
    /// Gas price in gwei used for cost estimates
    pub gas_price: u64,
    pub enabled: bool,
    pub currency: String,
    pub coinmarketcap: Option<String>,
    pub output_file: String,
    pub no_colors: bool,
}

impl Default for GasReporterSettings {
    fn default() -> Self {
        Self {
            gas_price: 30,
            enabled: true,
            currency: "USD".to_string(),
            coinmarketcap: None,
            output_file: "gasReport.md".to_string(),
            no_colors: true,
        }
    }
}

/// Pass-through settings for the external compiler, test runner and plugins.
///
/// None of these values drive any logic here; they are surfaced by
/// `contractkit config` for the tooling that consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolkitSettings {
    pub default_network: String,
    pub solidity: SoliditySettings,
    pub mocha: MochaSettings,
    pub typechain: TypechainSettings,
    pub etherscan: EtherscanSettings,
    pub gas_reporter: GasReporterSettings,
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self {
            default_network: SIMULATION_NETWORK.to_string(),
            solidity: SoliditySettings::default(),
            mocha: MochaSettings::default(),
            typechain: TypechainSettings::default(),
            etherscan: EtherscanSettings::default(),
            gas_reporter: GasReporterSettings::default(),
        }
    }
}

impl ToolkitSettings {
    /// Load settings from an explicit path, or from `contractkit.toml` in the
    /// working directory when present. A missing default file is not an
    /// error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::MissingSettingsFile(path.display().to_string()));
                }
                Self::from_file(path)
            }
            None => {
                let default = Path::new(SETTINGS_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::TomlError)
    }

    /// Apply secrets that only ever come from the environment.
    fn overlay_env(mut self, env: &EnvInput) -> Self {
        if let Some(key) = env.get(vars::ETHERSCAN) {
            self.etherscan.api_key = Some(key.to_string());
        }
        if let Some(key) = env.get(vars::COINMARKETCAP) {
            self.gas_reporter.coinmarketcap = Some(key.to_string());
        }
        self
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: ToolkitSettings,
    pub profiles: ProfileRegistry,
}

impl Config {
    /// Build the complete configuration from already-captured inputs.
    ///
    /// Fails only when the settings name a default network that has no
    /// profile. Missing secrets never fail resolution.
    pub fn resolve(
        env: &EnvInput,
        settings: ToolkitSettings,
        keys: &WalletKeys,
    ) -> Result<Self, ConfigError> {
        let settings = settings.overlay_env(env);
        let profiles = resolve_profiles(env, keys);

        if profiles.get(&settings.default_network).is_none() {
            return Err(ConfigError::UnknownNetwork(settings.default_network));
        }

        Ok(Config { settings, profiles })
    }

    /// Select a profile by name, falling back to the default network.
    pub fn select(&self, name: Option<&str>) -> Result<&NetworkProfile, ConfigError> {
        self.profiles
            .select(name.unwrap_or(&self.settings.default_network))
    }

    /// Print the resolved configuration
    pub fn print_summary(&self, profile: &NetworkProfile) {
        let solidity = &self.settings.solidity;
        println!("╔════════════════════════════════════════════════════════════════╗");
        println!("║         CONTRACTKIT CONFIGURATION RESOLVED                     ║");
        println!("╚════════════════════════════════════════════════════════════════╝");
        println!("  Default Network:     {}", self.settings.default_network);
        println!("  Active Network:      {}", profile.name);

        match profile.chain_id {
            Some(chain_id) => println!("  Chain ID:            {}", chain_id),
            None => println!("  Chain ID:            (none)"),
        }

        match &profile.endpoint {
            Some(endpoint) => println!("  RPC URL:             {}", endpoint.redacted()),
            None => println!("  RPC URL:             (in-process simulation)"),
        }

        println!("  Credentials:         {}", profile.credential_source.describe());
        println!("  Save Deployments:    {}", profile.persist_deployments);

        if profile.verbose_logging {
            println!("  Logging:             ENABLED");
        }

        println!(
            "  Solidity:            {} (optimizer: {}, runs: {})",
            solidity.version, solidity.optimizer.enabled, solidity.optimizer.runs
        );
        println!("  Test Timeout:        {}ms", self.settings.mocha.timeout);
        println!(
            "  Typechain:           {} -> {}",
            self.settings.typechain.target, self.settings.typechain.out_dir
        );

        if self.settings.etherscan.api_key.is_some() {
            println!("  Etherscan:           configured");
        } else {
            println!("  Etherscan:           (not configured)");
        }

        println!("╚════════════════════════════════════════════════════════════════╝");
    }

    /// Get the configuration as JSON, with secrets redacted
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut settings = self.settings.clone();
        settings.etherscan.api_key = settings.etherscan.api_key.map(|_| REDACTED.to_string());
        settings.gas_reporter.coinmarketcap =
            settings.gas_reporter.coinmarketcap.map(|_| REDACTED.to_string());

        let networks: Vec<_> = self.profiles.iter().map(NetworkProfile::summary).collect();

        serde_json::to_string_pretty(&serde_json::json!({
            "settings": settings,
            "networks": networks,
        }))
    }
}

pub(crate) const REDACTED: &str = "***";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> EnvInput {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_toggle_accepts_true_in_any_case() {
        for value in ["true", "True", "TRUE", "tRuE"] {
            assert!(parse_toggle(value), "{value}");
        }
    }

    #[test]
    fn test_toggle_rejects_everything_else() {
        for value in ["false", "", "1", "yes", " true", "true "] {
            assert!(!parse_toggle(value), "{value:?}");
        }
        assert!(!EnvInput::default().toggle(vars::SAVE_DEPLOYMENT));
    }

    #[test]
    fn test_key_list_parsing() {
        assert_eq!(parse_key_list("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_key_list("single"), vec!["single"]);
        assert!(parse_key_list("").is_empty());
        assert!(EnvInput::default().key_list(vars::PRIVATE_KEYS).is_empty());
    }

    #[test]
    fn test_env_text_defaults_to_empty() {
        let env = env(&[(vars::INFURA_TOKEN, "abc")]);
        assert_eq!(env.text(vars::INFURA_TOKEN), "abc");
        assert_eq!(env.text(vars::MATIC_RPC), "");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ToolkitSettings::default();
        assert_eq!(settings.default_network, "hardhat");
        assert_eq!(settings.solidity.version, "0.8.7");
        assert!(settings.solidity.optimizer.enabled);
        assert_eq!(settings.solidity.optimizer.runs, 200);
        assert_eq!(settings.mocha.timeout, 20_000_000);
        assert_eq!(settings.typechain.out_dir, "typechain");
        assert_eq!(settings.gas_reporter.output_file, "gasReport.md");
    }

    #[test]
    fn test_settings_partial_toml_keeps_defaults() {
        let settings = ToolkitSettings::from_toml(
            r#"
            defaultNetwork = "localhost"

            [solidity.optimizer]
            runs = 1000
            "#,
        )
        .unwrap();

        assert_eq!(settings.default_network, "localhost");
        assert_eq!(settings.solidity.optimizer.runs, 1000);
        assert!(settings.solidity.optimizer.enabled);
        assert_eq!(settings.solidity.version, "0.8.7");
    }

    #[test]
    fn test_settings_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[mocha]\ntimeout = 5000").unwrap();

        let settings = ToolkitSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.mocha.timeout, 5000);
    }

    #[test]
    fn test_settings_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ToolkitSettings::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::MissingSettingsFile(_))));
    }

    #[test]
    fn test_settings_invalid_toml() {
        let result = ToolkitSettings::from_toml("solidity = 3");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_resolve_overlays_secrets_from_env() {
        let env = env(&[(vars::ETHERSCAN, "scan-key"), (vars::COINMARKETCAP, "cmc")]);
        let config =
            Config::resolve(&env, ToolkitSettings::default(), &WalletKeys::embedded()).unwrap();
        assert_eq!(config.settings.etherscan.api_key.as_deref(), Some("scan-key"));
        assert_eq!(config.settings.gas_reporter.coinmarketcap.as_deref(), Some("cmc"));

        let json = config.to_json().unwrap();
        assert!(!json.contains("scan-key"));
        assert!(!json.contains("cmc\""));
    }

    #[test]
    fn test_resolve_rejects_unknown_default_network() {
        let settings = ToolkitSettings {
            default_network: "nowhere".to_string(),
            ..ToolkitSettings::default()
        };
        let result = Config::resolve(&EnvInput::default(), settings, &WalletKeys::embedded());
        assert!(matches!(result, Err(ConfigError::UnknownNetwork(name)) if name == "nowhere"));
    }

    #[test]
    fn test_select_falls_back_to_default_network() {
        let config = Config::resolve(
            &EnvInput::default(),
            ToolkitSettings::default(),
            &WalletKeys::embedded(),
        )
        .unwrap();

        assert_eq!(config.select(None).unwrap().name, "hardhat");
        assert_eq!(config.select(Some("goerli")).unwrap().name, "goerli");
        assert!(config.select(Some("GOERLI")).is_err());
    }

    #[test]
    fn test_json_redacts_private_keys() {
        let env = env(&[(vars::PRIVATE_KEYS, "0xdeadbeef")]);
        let config =
            Config::resolve(&env, ToolkitSettings::default(), &WalletKeys::embedded()).unwrap();
        let json = config.to_json().unwrap();
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("\"localhost\""));
    }

    #[test]
    fn test_json_redacts_keyed_rpc_url() {
        let env = env(&[(vars::MATIC_RPC, "https://polygon-mumbai.g.alchemy.com/v2/secretkey")]);
        let config =
            Config::resolve(&env, ToolkitSettings::default(), &WalletKeys::embedded()).unwrap();
        let json = config.to_json().unwrap();
        assert!(!json.contains("secretkey"));
        assert!(json.contains("https://polygon-mumbai.g.alchemy.com/***"));
    }

    #[test]
    fn test_os_vars_keep_utf8_pairs() {
        let env = EnvInput::from_os_vars([
            (OsString::from(vars::LOGGING), OsString::from("true")),
            (OsString::from(vars::INFURA_TOKEN), OsString::from("tok")),
        ]);
        assert!(env.toggle(vars::LOGGING));
        assert_eq!(env.text(vars::INFURA_TOKEN), "tok");
        assert!(env.skipped().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_os_vars_record_non_utf8_names() {
        use std::os::unix::ffi::OsStringExt;

        let env = EnvInput::from_os_vars([
            (OsString::from(vars::MATIC_RPC), OsString::from_vec(vec![0x68, 0xff])),
            (OsString::from_vec(vec![0x4b, 0xff]), OsString::from("value")),
            (OsString::from(vars::LOGGING), OsString::from("true")),
        ]);
        assert_eq!(env.get(vars::MATIC_RPC), None);
        assert!(env.toggle(vars::LOGGING));
        assert_eq!(env.skipped().len(), 2);
        assert_eq!(env.skipped()[0], vars::MATIC_RPC);
        assert!(env.skipped()[1].starts_with('K'));
        env.warn_skipped();
    }
}
