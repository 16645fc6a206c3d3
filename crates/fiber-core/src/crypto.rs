//! Ed25519 key handling and transaction signing.
//!
//! # Signing scheme
//!
//! Each input is signed over `BLAKE3(inner_hash || input_id)`. The inner hash
//! already commits to every input and output, so a signature cannot be moved
//! to another transaction or another input of the same transaction.

use ed25519_dalek::{Signer, Verifier};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::Address;
use crate::error::CryptoError;
use crate::types::{Hash256, InputSignature, Transaction};

/// Raw Ed25519 secret key material, overwritten on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(s).map_err(|_| CryptoError::InvalidSecretKey)?;
        if bytes.len() != 32 {
            bytes.zeroize();
            return Err(CryptoError::InvalidSecretKey);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(arr))
    }

    /// Hex encoding. The returned string is secret material.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Borrow the raw bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Ed25519 keypair for signing transaction inputs.
///
/// The underlying signing key is zeroized on drop by ed25519-dalek.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Create a keypair from a [`SecretKey`].
    pub fn from_secret(secret: &SecretKey) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(secret.as_bytes()),
        }
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Copy out the secret key.
    pub fn secret_key(&self) -> SecretKey {
        SecretKey(self.signing_key.to_bytes())
    }

    /// The address this keypair controls.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Sign a message, returning the raw 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key.
#[derive(Clone, Copy)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key: vk })
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(&arr)
    }

    /// Raw public key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl serde::Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The message signed for input `index`.
pub fn signing_hash(tx: &Transaction, index: usize) -> Result<Hash256, CryptoError> {
    let input = tx.inputs.get(index).ok_or(CryptoError::InputIndexOutOfBounds {
        index,
        len: tx.inputs.len(),
    })?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(tx.inner_hash.as_bytes());
    hasher.update(input.as_bytes());
    Ok(Hash256(hasher.finalize().into()))
}

/// Sign every input with the matching keypair, replacing existing signatures.
///
/// `keys[i]` signs input `i`.
pub fn sign_inputs(tx: &mut Transaction, keys: &[KeyPair]) -> Result<(), CryptoError> {
    if keys.len() != tx.inputs.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index: keys.len(),
            len: tx.inputs.len(),
        });
    }
    let mut signatures = Vec::with_capacity(keys.len());
    for (i, kp) in keys.iter().enumerate() {
        let msg = signing_hash(tx, i)?;
        signatures.push(InputSignature {
            public_key: kp.public_key().to_bytes(),
            signature: kp.sign(msg.as_bytes()).to_vec(),
        });
    }
    tx.signatures = signatures;
    Ok(())
}

/// Verify input `index` is signed by the key owning `owner`.
pub fn verify_input(tx: &Transaction, index: usize, owner: &Address) -> Result<(), CryptoError> {
    let sig = tx.signatures.get(index).ok_or(CryptoError::InputIndexOutOfBounds {
        index,
        len: tx.signatures.len(),
    })?;
    let public_key = PublicKey::from_bytes(&sig.public_key)?;
    if Address::from_public_key(&public_key) != *owner {
        return Err(CryptoError::AddressMismatch(owner.to_string()));
    }
    let signature: [u8; 64] = sig
        .signature
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;
    let msg = signing_hash(tx, index)?;
    public_key.verify(msg.as_bytes(), &signature)
}
