//! The process-wide wallet registry.
//!
//! One mutex guards the wallet map and every write to the wallet directory.
//! Critical sections are short: password checks, key derivation and
//! encryption run on a cloned wallet outside the lock, and only the final
//! persist-then-insert step runs under it. Gateways live in a separate map
//! so node lookups never contend with wallet operations.
//!
//! All wallets in a directory share one password, fixed when the registry is
//! opened. `init` encrypts a constant under it and keeps only the ciphertext;
//! later password checks decrypt that value, so a password is never compared
//! or stored in the clear.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use zeroize::Zeroizing;

use fiber_core::address::Address;
use fiber_core::crypto::KeyPair;
use fiber_core::traits::Gateway;
use fiber_gateway::{GatewayConfig, HttpGateway};

use crate::config::RegistryConfig;
use crate::encryption;
use crate::error::WalletError;
use crate::mnemonic;
use crate::store;
use crate::wallet::{make_wallet_id, Wallet};

/// Plaintext of the in-memory password check.
const PASSWORD_CHECK: &[u8] = b"fiber wallet store";

/// Loaded wallets and registered gateways.
///
/// Share it between collaborators with an [`Arc`].
pub struct WalletRegistry {
    config: RegistryConfig,
    /// [`PASSWORD_CHECK`] encrypted under the store password.
    password_check: Vec<u8>,
    wallets: Mutex<HashMap<String, Wallet>>,
    gateways: RwLock<HashMap<String, Arc<dyn Gateway>>>,
}

impl WalletRegistry {
    /// Open the wallet directory and load every wallet in it.
    ///
    /// Creates the directory if needed. Every wallet must decrypt with
    /// `password`; if any fails, nothing is loaded and the error is returned.
    /// The registry then accepts only `password`, even when the directory
    /// was empty.
    pub fn init(config: RegistryConfig, password: &str) -> Result<Self, WalletError> {
        if password.is_empty() {
            return Err(WalletError::WrongPassword);
        }
        let dir = config.wallet_dir.clone();
        create_wallet_dir(&dir)?;

        let mut wallets = HashMap::new();
        for path in store::list_wallet_files(&dir)? {
            let mut wallet = store::load(&path)?;
            if config.coin(wallet.coin_type()).is_none() {
                return Err(WalletError::UnsupportedCoinType(wallet.coin_type().to_string()));
            }
            if store::wallet_path(&dir, wallet.id()) != path {
                return Err(WalletError::CorruptedFile(format!(
                    "{} holds wallet {}",
                    path.display(),
                    wallet.id()
                )));
            }
            wallet.unlock(password)?;
            wallets.insert(wallet.id().to_string(), wallet);
        }

        let password_check = encryption::encrypt(PASSWORD_CHECK, password.as_bytes(), &config.kdf)?;
        tracing::info!(dir = %dir.display(), wallets = wallets.len(), "wallet registry loaded");
        Ok(Self {
            config,
            password_check,
            wallets: Mutex::new(wallets),
            gateways: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn wallet_dir(&self) -> &Path {
        &self.config.wallet_dir
    }

    // ── Coin gateways ────────────────────────────────────────────────────────

    /// Register the HTTP gateway for a configured coin type at `host:port`.
    pub fn register_coin(&self, coin_type: &str, node_addr: &str) -> Result<(), WalletError> {
        let coin = self
            .config
            .coin(coin_type)
            .cloned()
            .ok_or_else(|| WalletError::UnsupportedCoinType(coin_type.to_string()))?;
        if self.gateways.read().contains_key(coin_type) {
            return Err(WalletError::CoinAlreadyRegistered(coin_type.to_string()));
        }
        let gateway = HttpGateway::new(GatewayConfig::new(node_addr, coin))?;
        self.register_gateway(Arc::new(gateway))?;
        tracing::info!(coin = coin_type, node = node_addr, "coin registered");
        Ok(())
    }

    /// Register any [`Gateway`] implementation for the coin type it reports.
    pub fn register_gateway(&self, gateway: Arc<dyn Gateway>) -> Result<(), WalletError> {
        let name = gateway.coin().name.clone();
        if self.config.coin(&name).is_none() {
            return Err(WalletError::UnsupportedCoinType(name));
        }
        let mut gateways = self.gateways.write();
        if gateways.contains_key(&name) {
            return Err(WalletError::CoinAlreadyRegistered(name));
        }
        gateways.insert(name, gateway);
        Ok(())
    }

    /// The gateway registered for `coin_type`.
    pub fn gateway(&self, coin_type: &str) -> Result<Arc<dyn Gateway>, WalletError> {
        self.gateways
            .read()
            .get(coin_type)
            .cloned()
            .ok_or_else(|| WalletError::CoinTypeNotRegistered(coin_type.to_string()))
    }

    /// Registered coin types, in coin table order.
    pub fn supported_coin_types(&self) -> Vec<String> {
        let gateways = self.gateways.read();
        self.config
            .coins
            .iter()
            .filter(|c| gateways.contains_key(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    // ── Wallet lifecycle ─────────────────────────────────────────────────────

    /// Create, persist and register a wallet. Returns its id.
    ///
    /// A fresh 12-word seed is generated when `seed` is `None` or empty.
    pub fn create_wallet(
        &self,
        coin_type: &str,
        label: &str,
        seed: Option<&str>,
        password: &str,
    ) -> Result<String, WalletError> {
        if self.config.coin(coin_type).is_none() {
            return Err(WalletError::UnsupportedCoinType(coin_type.to_string()));
        }
        let seed = match seed.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Zeroizing::new(s.to_string()),
            None => mnemonic::new_seed()?,
        };
        let id = make_wallet_id(coin_type, &seed);
        if self.is_exist(&id) {
            return Err(WalletError::DuplicateWallet(id));
        }

        let wallet = Wallet::new(coin_type, label, &seed)?;
        self.add(wallet, password)?;
        tracing::info!(wallet = %id, coin = coin_type, "wallet created");
        Ok(id)
    }

    /// Persist and register a wallet.
    ///
    /// An unlocked wallet is encrypted under `password`; a locked one must
    /// already decrypt with it. The wallet becomes visible only after its
    /// file is in place.
    pub fn add(&self, mut wallet: Wallet, password: &str) -> Result<(), WalletError> {
        self.verify_password(password)?;
        if self.config.coin(wallet.coin_type()).is_none() {
            return Err(WalletError::UnsupportedCoinType(wallet.coin_type().to_string()));
        }
        if wallet.is_locked() {
            wallet.unlock(password)?;
        } else {
            wallet.encrypt(password, &self.config.kdf)?;
        }
        wallet.validate()?;

        let mut wallets = self.wallets.lock();
        if wallets.contains_key(wallet.id()) {
            return Err(WalletError::DuplicateWallet(wallet.id().to_string()));
        }
        store::save(self.wallet_dir(), &wallet)?;
        wallets.insert(wallet.id().to_string(), wallet);
        Ok(())
    }

    /// Derive `n` more addresses on a wallet and persist it.
    pub fn new_addresses(&self, id: &str, n: usize, password: &str) -> Result<Vec<Address>, WalletError> {
        loop {
            let mut updated = self.wallet(id)?;
            let base_secrets = updated.secrets().map(str::to_string);
            let addresses = {
                let mut unlocked = updated.unlock(password)?;
                let addresses = unlocked.derive_addresses(n)?;
                unlocked.encrypt(password, &self.config.kdf)?;
                addresses
            };

            let mut wallets = self.wallets.lock();
            let current = wallets
                .get(id)
                .ok_or_else(|| WalletError::WalletNotFound(id.to_string()))?;
            if current.secrets() != base_secrets.as_deref() {
                // Another derivation landed first; redo from its state.
                continue;
            }
            updated.set_label(current.label());
            store::save(self.wallet_dir(), &updated)?;
            wallets.insert(id.to_string(), updated);
            tracing::info!(wallet = id, count = n, "new addresses derived");
            return Ok(addresses);
        }
    }

    /// Delete a wallet's file and forget it. Missing wallets are not an error.
    pub fn remove(&self, id: &str) -> Result<(), WalletError> {
        let mut wallets = self.wallets.lock();
        store::remove(self.wallet_dir(), id)?;
        if wallets.remove(id).is_some() {
            tracing::info!(wallet = id, "wallet removed");
        }
        Ok(())
    }

    /// Change a wallet's label and persist it.
    pub fn update_label(&self, id: &str, label: &str) -> Result<(), WalletError> {
        let mut wallets = self.wallets.lock();
        let mut updated = wallets
            .get(id)
            .cloned()
            .ok_or_else(|| WalletError::WalletNotFound(id.to_string()))?;
        updated.set_label(label);
        store::save(self.wallet_dir(), &updated)?;
        wallets.insert(id.to_string(), updated);
        Ok(())
    }

    // ── Read accessors ───────────────────────────────────────────────────────

    /// A locked copy of a wallet.
    pub fn wallet(&self, id: &str) -> Result<Wallet, WalletError> {
        self.wallets
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| WalletError::WalletNotFound(id.to_string()))
    }

    pub fn is_exist(&self, id: &str) -> bool {
        self.wallets.lock().contains_key(id)
    }

    /// Sorted ids of all loaded wallets.
    pub fn wallet_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.wallets.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Addresses of a wallet in derivation order.
    pub fn get_addresses(&self, id: &str) -> Result<Vec<Address>, WalletError> {
        self.wallets
            .lock()
            .get(id)
            .map(Wallet::addresses)
            .ok_or_else(|| WalletError::WalletNotFound(id.to_string()))
    }

    /// Whether every address in `addresses` belongs to the wallet.
    pub fn is_contain(&self, id: &str, addresses: &[Address]) -> Result<bool, WalletError> {
        let wallets = self.wallets.lock();
        let wallet = wallets
            .get(id)
            .ok_or_else(|| WalletError::WalletNotFound(id.to_string()))?;
        Ok(addresses.iter().all(|a| wallet.contains(a)))
    }

    /// The keypair owning `address`.
    pub fn get_keypair(&self, id: &str, address: &Address, password: &str) -> Result<KeyPair, WalletError> {
        let mut wallet = self.wallet(id)?;
        let unlocked = wallet.unlock(password)?;
        unlocked.keypair(address)
    }

    /// Keypairs for several addresses with one decryption, in the given order.
    pub fn keypairs_for(
        &self,
        id: &str,
        addresses: &[Address],
        password: &str,
    ) -> Result<Vec<KeyPair>, WalletError> {
        let mut wallet = self.wallet(id)?;
        let unlocked = wallet.unlock(password)?;
        addresses.iter().map(|a| unlocked.keypair(a)).collect()
    }

    /// The wallet's recovery seed.
    pub fn get_seed(&self, id: &str, password: &str) -> Result<Zeroizing<String>, WalletError> {
        let mut wallet = self.wallet(id)?;
        let unlocked = wallet.unlock(password)?;
        unlocked.seed()
    }

    /// Check `password` against one wallet without keeping any secrets.
    pub fn verify_wallet_password(&self, id: &str, password: &str) -> Result<(), WalletError> {
        let mut wallet = self.wallet(id)?;
        wallet.unlock(password).map(|_| ())
    }

    /// Check `password` against the one the registry was opened with.
    pub fn verify_password(&self, password: &str) -> Result<(), WalletError> {
        let plain = encryption::decrypt(&self.password_check, password.as_bytes())?;
        if plain.as_slice() != PASSWORD_CHECK {
            return Err(WalletError::WrongPassword);
        }
        Ok(())
    }
}

impl std::fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRegistry")
            .field("wallet_dir", &self.config.wallet_dir)
            .field("wallets", &self.wallets.lock().len())
            .field("coins", &self.supported_coin_types())
            .finish()
    }
}

fn create_wallet_dir(dir: &Path) -> Result<(), WalletError> {
    fs::create_dir_all(dir).map_err(|e| WalletError::Io(format!("create {}: {e}", dir.display())))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| WalletError::Io(format!("chmod {}: {e}", dir.display())))?;
    }
    Ok(())
}
