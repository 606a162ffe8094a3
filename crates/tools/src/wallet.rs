//! Statically embedded wallet keys
//!
//! These are well-known development keys (the standard `test test ... junk`
//! dev accounts). They hold no value on any public network and must never be
//! used for anything but local simulation and throwaway test deployments.

/// General-purpose keys. Seeded into the simulation profile.
pub const PRIVATE_KEYS: &[&str] = &[
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    "0x47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
];

/// Keys reserved for the `kovan_custom_accounts` profile.
pub const KOVAN_PRIVATE_KEYS: &[&str] = &[
    "0x8b3a350cf5c34c9194ca85829a2df0ec3153be0318b5e2d3348e872092edffba",
    "0x92db14e403b83dfe3df233f83dfa3a0d7096f21ca9b0d6d6b8d88b2b4ec1564e",
];

/// The two key lists consumed by profile resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletKeys {
    pub general: Vec<String>,
    pub kovan: Vec<String>,
}

impl WalletKeys {
    pub fn new(general: Vec<String>, kovan: Vec<String>) -> Self {
        Self { general, kovan }
    }

    /// Keys compiled into the binary
    pub fn embedded() -> Self {
        Self {
            general: PRIVATE_KEYS.iter().map(|k| k.to_string()).collect(),
            kovan: KOVAN_PRIVATE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for WalletKeys {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::LocalWallet;

    #[test]
    fn test_embedded_keys_are_valid_signing_keys() {
        let keys = WalletKeys::embedded();
        assert_eq!(keys.general.len(), PRIVATE_KEYS.len());
        assert_eq!(keys.kovan.len(), KOVAN_PRIVATE_KEYS.len());
        for key in keys.general.iter().chain(keys.kovan.iter()) {
            assert!(key.starts_with("0x") && key.len() == 66, "{key}");
            assert!(key.parse::<LocalWallet>().is_ok(), "{key}");
        }
    }
}
