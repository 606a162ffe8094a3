//! Contractkit Tools Library
//!
//! Network profile resolution and account diagnostics for Ethereum contract
//! development.

pub mod chain;
pub mod commands;
pub mod config;
pub mod network;
pub mod rpc;
pub mod units;
pub mod wallet;

pub use chain::{backend_for, AccountBackend, ChainError};
pub use config::{Config, ConfigError, EnvInput, ToolkitSettings};
pub use network::{resolve_profiles, CredentialSource, NetworkKind, NetworkProfile, ProfileRegistry};
pub use wallet::WalletKeys;

pub use ethers::types::Address;
