//! Password-based AES-256-GCM encryption of wallet secrets.
//!
//! The key is derived with Argon2id. Cost parameters are written into the
//! blob, so a wallet decrypts with the parameters it was encrypted under
//! regardless of the current configuration.
//!
//! # Wire format
//! ```text
//! version (1) || m_cost (4 LE) || t_cost (4 LE) || p_cost (4 LE)
//!   || salt (16) || nonce (12) || ciphertext + auth_tag
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Blob format version.
const BLOB_VERSION: u8 = 1;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

const HEADER_LEN: usize = 1 + 4 + 4 + 4;

/// Minimum encrypted payload size (header + salt + nonce + auth tag).
const MIN_ENCRYPTED_LEN: usize = HEADER_LEN + SALT_LEN + NONCE_LEN + 16;

/// Upper bounds on cost parameters, applied before any key derivation.
const MAX_M_COST: u32 = 1 << 20;
const MAX_T_COST: u32 = 64;
const MAX_P_COST: u32 = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Iterations.
    pub t_cost: u32,
    /// Parallelism.
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    /// The cheapest parameters Argon2 accepts. Only for tests.
    pub fn testing() -> Self {
        Self {
            m_cost: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }
}

/// Derive a 256-bit encryption key from a password and salt using Argon2id.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, WalletError> {
    if params.m_cost > MAX_M_COST || params.t_cost > MAX_T_COST || params.p_cost > MAX_P_COST {
        return Err(WalletError::Encryption(format!(
            "kdf params out of range: m={} t={} p={}",
            params.m_cost, params.t_cost, params.p_cost
        )));
    }
    let argon_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| WalletError::Encryption(format!("kdf params: {e}")))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut key = Zeroizing::new([0u8; 32]);
    argon
        .hash_password_into(password, salt, &mut key[..])
        .map_err(|e| WalletError::Encryption(format!("kdf: {e}")))?;
    Ok(key)
}

/// Encrypt plaintext with a password using AES-256-GCM.
///
/// Generates a random salt and nonce for every call.
pub fn encrypt(plaintext: &[u8], password: &[u8], params: &KdfParams) -> Result<Vec<u8>, WalletError> {
    use rand::RngCore;
    if password.is_empty() {
        return Err(WalletError::Encryption("missing password".into()));
    }
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + SALT_LEN + NONCE_LEN + ciphertext.len());
    result.push(BLOB_VERSION);
    result.extend_from_slice(&params.m_cost.to_le_bytes());
    result.extend_from_slice(&params.t_cost.to_le_bytes());
    result.extend_from_slice(&params.p_cost.to_le_bytes());
    result.extend_from_slice(&salt);
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

/// Decrypt data that was encrypted with [`encrypt`].
///
/// Returns [`WalletError::WrongPassword`] for an empty password or an
/// authentication tag mismatch.
pub fn decrypt(encrypted: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    if password.is_empty() {
        return Err(WalletError::WrongPassword);
    }
    if encrypted.len() < MIN_ENCRYPTED_LEN {
        return Err(WalletError::CorruptedFile(format!(
            "encrypted data too short: {} < {MIN_ENCRYPTED_LEN}",
            encrypted.len()
        )));
    }
    if encrypted[0] != BLOB_VERSION {
        return Err(WalletError::CorruptedFile(format!(
            "unsupported encryption version: {}",
            encrypted[0]
        )));
    }

    let params = KdfParams {
        m_cost: read_u32(encrypted, 1),
        t_cost: read_u32(encrypted, 5),
        p_cost: read_u32(encrypted, 9),
    };
    let salt = &encrypted[HEADER_LEN..HEADER_LEN + SALT_LEN];
    let nonce_bytes = &encrypted[HEADER_LEN + SALT_LEN..HEADER_LEN + SALT_LEN + NONCE_LEN];
    let ciphertext = &encrypted[HEADER_LEN + SALT_LEN + NONCE_LEN..];

    let key = derive_key(password, salt, &params)
        .map_err(|e| WalletError::CorruptedFile(e.to_string()))?;
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| WalletError::WrongPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> KdfParams {
        KdfParams::testing()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let password = b"correct horse battery staple";
        let plaintext = b"secret wallet data";

        let encrypted = encrypt(plaintext, password, &params()).unwrap();
        let decrypted = decrypt(&encrypted, password).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn encrypt_decrypt_empty_data() {
        let encrypted = encrypt(b"", b"password", &params()).unwrap();
        let decrypted = decrypt(&encrypted, b"password").unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn wrong_password_fails() {
        let encrypted = encrypt(b"secret", b"correct", &params()).unwrap();
        assert_eq!(decrypt(&encrypted, b"wrong").unwrap_err(), WalletError::WrongPassword);
    }

    #[test]
    fn empty_password_rejected() {
        let encrypted = encrypt(b"secret", b"correct", &params()).unwrap();
        assert_eq!(decrypt(&encrypted, b"").unwrap_err(), WalletError::WrongPassword);
        assert!(matches!(
            encrypt(b"secret", b"", &params()),
            Err(WalletError::Encryption(_))
        ));
    }

    #[test]
    fn truncated_data_fails() {
        let err = decrypt(&[BLOB_VERSION; 10], b"password").unwrap_err();
        assert!(matches!(err, WalletError::CorruptedFile(_)));
    }

    #[test]
    fn unknown_version_fails() {
        let mut encrypted = encrypt(b"secret", b"password", &params()).unwrap();
        encrypted[0] = 9;
        assert!(matches!(
            decrypt(&encrypted, b"password"),
            Err(WalletError::CorruptedFile(_))
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let mut encrypted = encrypt(b"secret data", b"password", &params()).unwrap();
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0xFF;
        assert_eq!(decrypt(&encrypted, b"password").unwrap_err(), WalletError::WrongPassword);
    }

    #[test]
    fn tampered_salt_fails() {
        let mut encrypted = encrypt(b"secret", b"password", &params()).unwrap();
        encrypted[HEADER_LEN] ^= 0xFF;
        assert_eq!(decrypt(&encrypted, b"password").unwrap_err(), WalletError::WrongPassword);
    }

    #[test]
    fn tampered_nonce_fails() {
        let mut encrypted = encrypt(b"secret", b"password", &params()).unwrap();
        encrypted[HEADER_LEN + SALT_LEN] ^= 0xFF;
        assert_eq!(decrypt(&encrypted, b"password").unwrap_err(), WalletError::WrongPassword);
    }

    #[test]
    fn params_travel_with_blob() {
        let custom = KdfParams { m_cost: 16, t_cost: 2, p_cost: 1 };
        let encrypted = encrypt(b"secret", b"password", &custom).unwrap();
        assert_eq!(read_u32(&encrypted, 1), 16);
        assert_eq!(read_u32(&encrypted, 5), 2);
        assert_eq!(decrypt(&encrypted, b"password").unwrap().as_slice(), b"secret");
    }

    #[test]
    fn oversized_params_rejected_before_derivation() {
        let mut encrypted = encrypt(b"secret", b"password", &params()).unwrap();
        encrypted[1..5].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decrypt(&encrypted, b"password"),
            Err(WalletError::CorruptedFile(_))
        ));

        let greedy = KdfParams { m_cost: 8, t_cost: MAX_T_COST + 1, p_cost: 1 };
        assert!(matches!(
            encrypt(b"secret", b"password", &greedy),
            Err(WalletError::Encryption(_))
        ));
    }

    #[test]
    fn derive_key_deterministic() {
        let key1 = derive_key(b"password", b"saltsalt", &params()).unwrap();
        let key2 = derive_key(b"password", b"saltsalt", &params()).unwrap();
        assert_eq!(*key1, *key2);
        let key3 = derive_key(b"password2", b"saltsalt", &params()).unwrap();
        assert_ne!(*key1, *key3);
    }

    #[test]
    fn encrypted_has_correct_overhead() {
        let encrypted = encrypt(b"hello", b"password", &params()).unwrap();
        assert_eq!(encrypted.len(), HEADER_LEN + SALT_LEN + NONCE_LEN + 5 + 16);
    }
}
