//! Address encoding shared by every fiber network.
//!
//! An address is Base58 over `key_hash (20) || version (1) || checksum (4)`:
//! - `key_hash` is the first 20 bytes of BLAKE3 over the Ed25519 public key
//! - `checksum` is the first 4 bytes of BLAKE3 over `key_hash || version`
//!
//! All networks in the family share the format, so an address decodes the
//! same way whichever coin it is used with.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::PublicKey;
use crate::error::AddressError;

/// Current address version.
pub const ADDRESS_VERSION: u8 = 0;

const KEY_HASH_LEN: usize = 20;
const CHECKSUM_LEN: usize = 4;
const ENCODED_LEN: usize = KEY_HASH_LEN + 1 + CHECKSUM_LEN;

/// A fiber address identifying the owner of an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, bincode::Encode, bincode::Decode)]
pub struct Address {
    version: u8,
    key_hash: [u8; KEY_HASH_LEN],
}

impl Address {
    /// Create an address from a raw 20-byte key hash.
    pub fn from_key_hash(key_hash: [u8; KEY_HASH_LEN]) -> Self {
        Self {
            version: ADDRESS_VERSION,
            key_hash,
        }
    }

    /// Derive the address owned by a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = blake3::hash(&public_key.to_bytes());
        let mut key_hash = [0u8; KEY_HASH_LEN];
        key_hash.copy_from_slice(&digest.as_bytes()[..KEY_HASH_LEN]);
        Self::from_key_hash(key_hash)
    }

    /// The 20-byte key hash.
    pub fn key_hash(&self) -> &[u8; KEY_HASH_LEN] {
        &self.key_hash
    }

    /// The address version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Encode as a Base58 string.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(ENCODED_LEN);
        payload.extend_from_slice(&self.key_hash);
        payload.push(self.version);
        payload.extend_from_slice(&checksum(&self.key_hash, self.version));
        bs58::encode(payload).into_string()
    }

    /// Decode and verify a Base58 address string.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| AddressError::InvalidBase58)?;
        if bytes.len() != ENCODED_LEN {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let mut key_hash = [0u8; KEY_HASH_LEN];
        key_hash.copy_from_slice(&bytes[..KEY_HASH_LEN]);
        let version = bytes[KEY_HASH_LEN];

        if bytes[KEY_HASH_LEN + 1..] != checksum(&key_hash, version) {
            return Err(AddressError::InvalidChecksum);
        }
        if version != ADDRESS_VERSION {
            return Err(AddressError::InvalidVersion(version));
        }

        Ok(Self { version, key_hash })
    }
}

fn checksum(key_hash: &[u8; KEY_HASH_LEN], version: u8) -> [u8; CHECKSUM_LEN] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(key_hash);
    hasher.update(&[version]);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest.as_bytes()[..CHECKSUM_LEN]);
    out
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn encode_decode_roundtrip() {
        let addr = Address::from_key_hash([0x42; 20]);
        let s = addr.encode();
        assert_eq!(Address::decode(&s).unwrap(), addr);
        assert_eq!(s.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn from_public_key_is_deterministic() {
        let kp = KeyPair::from_secret_bytes([7u8; 32]);
        let a1 = Address::from_public_key(&kp.public_key());
        let a2 = Address::from_public_key(&kp.public_key());
        assert_eq!(a1, a2);

        let other = KeyPair::from_secret_bytes([8u8; 32]);
        assert_ne!(a1, Address::from_public_key(&other.public_key()));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let addr = Address::from_key_hash([1; 20]);
        let mut bytes = bs58::decode(addr.encode()).into_vec().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = bs58::encode(bytes).into_string();
        assert_eq!(Address::decode(&tampered).unwrap_err(), AddressError::InvalidChecksum);
    }

    #[test]
    fn decode_rejects_flipped_hash_byte() {
        let addr = Address::from_key_hash([1; 20]);
        let mut bytes = bs58::decode(addr.encode()).into_vec().unwrap();
        bytes[3] ^= 0x80;
        let tampered = bs58::encode(bytes).into_string();
        assert_eq!(Address::decode(&tampered).unwrap_err(), AddressError::InvalidChecksum);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let short = bs58::encode([0u8; 10]).into_string();
        assert_eq!(Address::decode(&short).unwrap_err(), AddressError::InvalidLength(10));
    }

    #[test]
    fn decode_rejects_non_base58() {
        // '0', 'O', 'I' and 'l' are outside the Base58 alphabet.
        assert_eq!(Address::decode("0OIl").unwrap_err(), AddressError::InvalidBase58);
    }

    #[test]
    fn decode_rejects_empty() {
        assert_eq!(Address::decode("  ").unwrap_err(), AddressError::Empty);
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let key_hash = [9u8; 20];
        let mut payload = key_hash.to_vec();
        payload.push(3);
        payload.extend_from_slice(&checksum(&key_hash, 3));
        let s = bs58::encode(payload).into_string();
        assert_eq!(Address::decode(&s).unwrap_err(), AddressError::InvalidVersion(3));
    }

    #[test]
    fn serde_as_string() {
        let addr = Address::from_key_hash([5; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.encode()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn serde_rejects_invalid_string() {
        let res: Result<Address, _> = serde_json::from_str("\"notanaddress\"");
        assert!(res.is_err());
    }
}
