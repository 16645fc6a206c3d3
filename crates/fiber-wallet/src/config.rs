//! Registry configuration.
//!
//! Provides [`RegistryConfig`] with defaults for the wallet directory, key
//! derivation cost and the supported coin table.

use std::path::PathBuf;

use fiber_core::coin::CoinConfig;

use crate::encryption::KdfParams;

/// Name of the default wallet directory under the home directory.
pub const DEFAULT_WALLET_DIR: &str = ".wallet-family";

/// Configuration for a [`WalletRegistry`](crate::registry::WalletRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory holding one `.wlt` file per wallet.
    pub wallet_dir: PathBuf,
    /// Argon2id cost used when (re-)encrypting wallets.
    pub kdf: KdfParams,
    /// Networks wallets may be created for.
    pub coins: Vec<CoinConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let wallet_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_WALLET_DIR);

        Self {
            wallet_dir,
            kdf: KdfParams::default(),
            coins: CoinConfig::builtin(),
        }
    }
}

impl RegistryConfig {
    /// Default settings rooted at `wallet_dir`.
    pub fn with_dir(wallet_dir: impl Into<PathBuf>) -> Self {
        Self {
            wallet_dir: wallet_dir.into(),
            ..Self::default()
        }
    }

    /// Look up a configured network.
    pub fn coin(&self, coin_type: &str) -> Option<&CoinConfig> {
        self.coins.iter().find(|c| c.name == coin_type)
    }
}
