//! A single deterministic wallet and its file format.
//!
//! Public data (id, label, coin type, address list) is kept in cleartext.
//! Secret material (the recovery seed, the current chain state and every
//! address's secret key) is encrypted together into one opaque field.
//!
//! Secrets are present in memory only between [`Wallet::decrypt`] and the
//! next [`Wallet::erase`]. [`Wallet::unlock`] wraps that window in a guard
//! that erases when dropped.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use fiber_core::address::Address;
use fiber_core::crypto::{KeyPair, PublicKey, SecretKey};

use crate::encryption::{self, KdfParams};
use crate::error::WalletError;
use crate::keys::ChainSeed;

/// Current wallet file format version.
pub const WALLET_VERSION: &str = "0.2";

/// Marker identifying a sequential deterministic wallet.
pub const WALLET_TYPE: &str = "deterministic";

/// Wallet file extension.
pub const WALLET_EXT: &str = "wlt";

/// Most addresses one derivation call may add.
pub const MAX_DERIVE_BATCH: usize = 1000;

/// Secret-map key holding the current chain state.
const SEED_KEY: &str = "seed";

/// Secret-map key holding the recovery seed.
const INIT_SEED_KEY: &str = "init_seed";

/// Wallet id for a coin type and recovery seed: `{coin}_{hex(BLAKE3(seed)[..12])}`.
pub fn make_wallet_id(coin_type: &str, seed: &str) -> String {
    let digest = blake3::hash(seed.as_bytes());
    format!("{coin_type}_{}", hex::encode(&digest.as_bytes()[..12]))
}

/// One derived address.
#[derive(Clone)]
pub struct AddressEntry {
    pub address: Address,
    pub public_key: PublicKey,
    /// `None` while the wallet is locked.
    pub secret_key: Option<SecretKey>,
}

impl AddressEntry {
    fn from_keypair(kp: &KeyPair) -> Self {
        let public_key = kp.public_key();
        Self {
            address: Address::from_public_key(&public_key),
            public_key,
            secret_key: Some(kp.secret_key()),
        }
    }
}

impl fmt::Debug for AddressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressEntry")
            .field("address", &self.address.to_string())
            .field("public_key", &self.public_key.to_hex())
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Plaintext secret map: `seed`, `init_seed`, and one entry per address.
///
/// Values are overwritten on drop.
#[derive(Default, Serialize, Deserialize)]
#[serde(transparent)]
struct SecretMap(BTreeMap<String, String>);

impl Drop for SecretMap {
    fn drop(&mut self) {
        for value in self.0.values_mut() {
            value.zeroize();
        }
    }
}

/// Cleartext metadata plus encrypted secrets.
#[derive(Clone)]
pub struct Wallet {
    id: String,
    label: String,
    coin_type: String,
    created_at: i64,
    version: String,
    wallet_type: String,
    entries: Vec<AddressEntry>,
    /// Hex-encoded encrypted [`SecretMap`]. `None` until first encrypted.
    secrets: Option<String>,
    init_seed: Option<Zeroizing<String>>,
    seed_chain: Option<ChainSeed>,
}

impl Wallet {
    /// Create an unlocked wallet from a recovery seed and derive its first address.
    pub fn new(coin_type: &str, label: &str, seed: &str) -> Result<Self, WalletError> {
        if coin_type.is_empty() {
            return Err(WalletError::UnsupportedCoinType(String::new()));
        }
        if seed.trim().is_empty() {
            return Err(WalletError::InvalidSeed("empty seed".into()));
        }
        let mut wallet = Self {
            id: make_wallet_id(coin_type, seed),
            label: label.to_string(),
            coin_type: coin_type.to_string(),
            created_at: chrono::Utc::now().timestamp(),
            version: WALLET_VERSION.to_string(),
            wallet_type: WALLET_TYPE.to_string(),
            entries: Vec::new(),
            secrets: None,
            init_seed: Some(Zeroizing::new(seed.to_string())),
            seed_chain: Some(ChainSeed::from_seed_phrase(seed)),
        };
        wallet.derive_addresses(1)?;
        Ok(wallet)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn coin_type(&self) -> &str {
        &self.coin_type
    }

    /// Creation time, unix seconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Entries in derivation order.
    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    /// Addresses in derivation order.
    pub fn addresses(&self) -> Vec<Address> {
        self.entries.iter().map(|e| e.address).collect()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.iter().any(|e| e.address == *address)
    }

    /// True when no secret material is in memory.
    pub fn is_locked(&self) -> bool {
        self.seed_chain.is_none()
            && self.init_seed.is_none()
            && self.entries.iter().all(|e| e.secret_key.is_none())
    }

    /// The encrypted secrets blob, hex-encoded.
    pub fn secrets(&self) -> Option<&str> {
        self.secrets.as_deref()
    }

    /// Extend the address list by `n` entries from the current chain state.
    ///
    /// Requires the wallet to be unlocked. Returns the new addresses.
    /// At most [`MAX_DERIVE_BATCH`] addresses are derived per call.
    pub fn derive_addresses(&mut self, n: usize) -> Result<Vec<Address>, WalletError> {
        if n > MAX_DERIVE_BATCH {
            return Err(WalletError::TooManyAddresses {
                requested: n,
                max: MAX_DERIVE_BATCH,
            });
        }
        let chain = self
            .seed_chain
            .as_ref()
            .ok_or_else(|| WalletError::WalletLocked(self.id.clone()))?;
        let (next, keypairs) = chain.derive_keypairs(n);

        let known: HashSet<Address> = self.entries.iter().map(|e| e.address).collect();
        let new_entries: Vec<AddressEntry> = keypairs.iter().map(AddressEntry::from_keypair).collect();
        if new_entries.iter().any(|e| known.contains(&e.address)) {
            return Err(WalletError::CorruptedFile(format!(
                "wallet {} derived a duplicate address",
                self.id
            )));
        }

        let addresses = new_entries.iter().map(|e| e.address).collect();
        self.entries.extend(new_entries);
        self.seed_chain = Some(next);
        tracing::debug!(wallet = %self.id, count = n, total = self.entries.len(), "derived addresses");
        Ok(addresses)
    }

    /// Encrypt all secret material under `password`, then erase it from memory.
    pub fn encrypt(&mut self, password: &str, params: &KdfParams) -> Result<(), WalletError> {
        let chain = self
            .seed_chain
            .as_ref()
            .ok_or_else(|| WalletError::WalletLocked(self.id.clone()))?;
        let init_seed = self
            .init_seed
            .as_ref()
            .ok_or_else(|| WalletError::WalletLocked(self.id.clone()))?;

        let mut map = SecretMap::default();
        map.0.insert(SEED_KEY.to_string(), chain.to_hex());
        map.0.insert(INIT_SEED_KEY.to_string(), init_seed.to_string());
        for entry in &self.entries {
            let secret = entry
                .secret_key
                .as_ref()
                .ok_or_else(|| WalletError::WalletLocked(self.id.clone()))?;
            map.0.insert(entry.address.to_string(), secret.to_hex());
        }

        let plaintext = Zeroizing::new(
            serde_json::to_vec(&map).map_err(|e| WalletError::SerializationFailure(e.to_string()))?,
        );
        let blob = encryption::encrypt(&plaintext, password.as_bytes(), params)?;
        self.secrets = Some(hex::encode(blob));
        self.erase();
        Ok(())
    }

    /// Decrypt the secrets blob and repopulate secret fields.
    ///
    /// The caller must [`erase`](Self::erase) afterwards; prefer [`unlock`](Self::unlock).
    pub fn decrypt(&mut self, password: &str) -> Result<(), WalletError> {
        let blob_hex = self
            .secrets
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WalletError::CorruptedFile(format!("wallet {} has no secrets", self.id)))?;
        let blob = hex::decode(blob_hex)
            .map_err(|e| WalletError::CorruptedFile(format!("secrets hex: {e}")))?;
        let plaintext = encryption::decrypt(&blob, password.as_bytes())?;
        let mut map: SecretMap = serde_json::from_slice(&plaintext)
            .map_err(|e| WalletError::CorruptedFile(format!("secrets payload: {e}")))?;

        let chain = map
            .0
            .get(SEED_KEY)
            .ok_or_else(|| WalletError::CorruptedFile("secrets missing seed".into()))
            .and_then(|s| ChainSeed::from_hex(s))?;
        let init_seed = map
            .0
            .get_mut(INIT_SEED_KEY)
            .map(|s| Zeroizing::new(std::mem::take(s)))
            .ok_or_else(|| WalletError::CorruptedFile("secrets missing init_seed".into()))?;

        let mut secret_keys = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let hex_key = map.0.get(&entry.address.to_string()).ok_or_else(|| {
                WalletError::CorruptedFile(format!("secret for {} is missing", entry.address))
            })?;
            let secret = SecretKey::from_hex(hex_key)?;
            if KeyPair::from_secret(&secret).public_key() != entry.public_key {
                return Err(WalletError::CorruptedFile(format!(
                    "secret for {} does not match its public key",
                    entry.address
                )));
            }
            secret_keys.push(secret);
        }

        for (entry, secret) in self.entries.iter_mut().zip(secret_keys) {
            entry.secret_key = Some(secret);
        }
        self.seed_chain = Some(chain);
        self.init_seed = Some(init_seed);
        Ok(())
    }

    /// Decrypt and return a guard that erases secrets when dropped.
    pub fn unlock(&mut self, password: &str) -> Result<Unlocked<'_>, WalletError> {
        if let Err(e) = self.decrypt(password) {
            self.erase();
            return Err(e);
        }
        Ok(Unlocked { wallet: self })
    }

    /// Drop all secret material. Each secret type zeroizes on drop.
    pub fn erase(&mut self) {
        self.seed_chain = None;
        self.init_seed = None;
        for entry in &mut self.entries {
            entry.secret_key = None;
        }
    }

    /// Keypair for an owned address. Requires the wallet to be unlocked.
    pub fn keypair(&self, address: &Address) -> Result<KeyPair, WalletError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.address == *address)
            .ok_or_else(|| WalletError::AddressNotInWallet(address.to_string()))?;
        let secret = entry
            .secret_key
            .as_ref()
            .ok_or_else(|| WalletError::WalletLocked(self.id.clone()))?;
        Ok(KeyPair::from_secret(secret))
    }

    /// The recovery seed. Requires the wallet to be unlocked.
    pub fn seed(&self) -> Result<Zeroizing<String>, WalletError> {
        self.init_seed
            .clone()
            .ok_or_else(|| WalletError::WalletLocked(self.id.clone()))
    }

    /// Structural checks applied before trusting a wallet.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.id.is_empty() {
            return Err(WalletError::CorruptedFile("empty wallet id".into()));
        }
        if self.coin_type.is_empty() {
            return Err(WalletError::CorruptedFile("empty coin type".into()));
        }
        if !self.id.starts_with(&format!("{}_", self.coin_type)) {
            return Err(WalletError::CorruptedFile(format!(
                "wallet id {} does not match coin type {}",
                self.id, self.coin_type
            )));
        }
        if self.wallet_type != WALLET_TYPE {
            return Err(WalletError::CorruptedFile(format!(
                "unsupported wallet type: {}",
                self.wallet_type
            )));
        }
        if self.secrets.as_deref().is_none_or(str::is_empty) {
            return Err(WalletError::CorruptedFile(format!("wallet {} has no secrets", self.id)));
        }
        if self.entries.is_empty() {
            return Err(WalletError::CorruptedFile(format!("wallet {} has no addresses", self.id)));
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if Address::from_public_key(&entry.public_key) != entry.address {
                return Err(WalletError::CorruptedFile(format!(
                    "address {} does not match its public key",
                    entry.address
                )));
            }
            if !seen.insert(entry.address) {
                return Err(WalletError::CorruptedFile(format!(
                    "duplicate address {}",
                    entry.address
                )));
            }
        }
        Ok(())
    }

    /// Serialize to the JSON file format. The wallet must have been encrypted.
    pub fn to_json(&self) -> Result<Vec<u8>, WalletError> {
        let secrets = self
            .secrets
            .clone()
            .ok_or_else(|| WalletError::SerializationFailure(format!("wallet {} is not encrypted", self.id)))?;
        let file = WalletFile {
            meta: WalletMeta {
                id: self.id.clone(),
                label: self.label.clone(),
                coin_type: self.coin_type.clone(),
                wallet_type: self.wallet_type.clone(),
                version: self.version.clone(),
                created_at: self.created_at,
            },
            entries: self
                .entries
                .iter()
                .map(|e| EntryFile {
                    address: e.address,
                    public_key: e.public_key,
                })
                .collect(),
            secrets,
        };
        serde_json::to_vec_pretty(&file).map_err(|e| WalletError::SerializationFailure(e.to_string()))
    }

    /// Parse and validate the JSON file format. The result is locked.
    pub fn from_json(bytes: &[u8]) -> Result<Self, WalletError> {
        let file: WalletFile = serde_json::from_slice(bytes)
            .map_err(|e| WalletError::CorruptedFile(format!("invalid wallet file: {e}")))?;
        let wallet = Self {
            id: file.meta.id,
            label: file.meta.label,
            coin_type: file.meta.coin_type,
            created_at: file.meta.created_at,
            version: file.meta.version,
            wallet_type: file.meta.wallet_type,
            entries: file
                .entries
                .into_iter()
                .map(|e| AddressEntry {
                    address: e.address,
                    public_key: e.public_key,
                    secret_key: None,
                })
                .collect(),
            secrets: Some(file.secrets),
            init_seed: None,
            seed_chain: None,
        };
        wallet.validate()?;
        Ok(wallet)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("coin_type", &self.coin_type)
            .field("addresses", &self.entries.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// A wallet with decrypted secrets. Erases them when dropped.
pub struct Unlocked<'a> {
    wallet: &'a mut Wallet,
}

impl Deref for Unlocked<'_> {
    type Target = Wallet;

    fn deref(&self) -> &Wallet {
        &*self.wallet
    }
}

impl DerefMut for Unlocked<'_> {
    fn deref_mut(&mut self) -> &mut Wallet {
        &mut *self.wallet
    }
}

impl Drop for Unlocked<'_> {
    fn drop(&mut self) {
        self.wallet.erase();
    }
}

#[derive(Serialize, Deserialize)]
struct WalletMeta {
    id: String,
    label: String,
    coin_type: String,
    wallet_type: String,
    version: String,
    created_at: i64,
}

#[derive(Serialize, Deserialize)]
struct EntryFile {
    address: Address,
    #[serde(rename = "pubkey")]
    public_key: PublicKey,
}

/// On-disk JSON layout.
#[derive(Serialize, Deserialize)]
struct WalletFile {
    meta: WalletMeta,
    entries: Vec<EntryFile>,
    secrets: String,
}
