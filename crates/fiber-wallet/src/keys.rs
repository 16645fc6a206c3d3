//! Sequential deterministic key derivation.
//!
//! A wallet holds a 32-byte chain state. Each derivation step hashes the
//! state forward with BLAKE3 and derives one Ed25519 secret key from the new
//! state. The chain is stateful: the Nth key can only be reached by replaying
//! the N-1 steps before it.
//!
//! ```text
//! chain_0 = derive_key(SEED_CTX, seed_phrase)
//! chain_i = derive_key(CHAIN_CTX, chain_{i-1})
//! key_i   = derive_key(KEY_CTX, chain_i)
//! ```

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use fiber_core::crypto::{KeyPair, SecretKey};

use crate::error::WalletError;

/// BLAKE3 KDF context turning a seed phrase into the first chain state.
const SEED_CONTEXT: &str = "fiber-wallet 2024 seed chain v1";

/// BLAKE3 KDF context advancing the chain.
const CHAIN_CONTEXT: &str = "fiber-wallet 2024 chain step v1";

/// BLAKE3 KDF context deriving a secret key from a chain state.
const KEY_CONTEXT: &str = "fiber-wallet 2024 secret key v1";

/// Current position of a wallet's derivation chain.
///
/// Secret material is zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ChainSeed {
    bytes: [u8; 32],
}

impl ChainSeed {
    /// Start a chain from a recovery seed phrase.
    pub fn from_seed_phrase(seed: &str) -> Self {
        Self {
            bytes: blake3::derive_key(SEED_CONTEXT, seed.as_bytes()),
        }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Parse the hex form stored in the encrypted secrets map.
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        let mut raw = hex::decode(s).map_err(|_| WalletError::CorruptedFile("invalid chain seed".into()))?;
        if raw.len() != 32 {
            raw.zeroize();
            return Err(WalletError::CorruptedFile("invalid chain seed length".into()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&raw);
        raw.zeroize();
        Ok(Self { bytes })
    }

    /// Hex encoding. The returned string is secret material.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Advance one step, returning the next chain state and its secret key.
    pub fn step(&self) -> (ChainSeed, SecretKey) {
        let next = ChainSeed {
            bytes: blake3::derive_key(CHAIN_CONTEXT, &self.bytes),
        };
        let secret = SecretKey::from_bytes(blake3::derive_key(KEY_CONTEXT, &next.bytes));
        (next, secret)
    }

    /// Derive `n` keypairs, returning them with the chain state after the last one.
    pub fn derive_keypairs(&self, n: usize) -> (ChainSeed, Vec<KeyPair>) {
        let mut chain = self.clone();
        let mut keypairs = Vec::with_capacity(n);
        for _ in 0..n {
            let (next, secret) = chain.step();
            keypairs.push(KeyPair::from_secret(&secret));
            chain = next;
        }
        (chain, keypairs)
    }
}

impl fmt::Debug for ChainSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainSeed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
