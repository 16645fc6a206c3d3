//! BIP-39 mnemonic recovery seeds.

use bip39::{Language, Mnemonic};
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Entropy of a generated seed: 128 bits, 12 words.
const SEED_ENTROPY_LEN: usize = 16;

/// Generate a fresh 12-word English mnemonic.
pub fn new_seed() -> Result<Zeroizing<String>, WalletError> {
    use rand::RngCore;
    let mut entropy = Zeroizing::new([0u8; SEED_ENTROPY_LEN]);
    rand::rngs::OsRng.fill_bytes(entropy.as_mut_slice());
    let m = Mnemonic::from_entropy_in(Language::English, entropy.as_slice())
        .map_err(|e| WalletError::Encryption(format!("mnemonic: {e}")))?;
    Ok(Zeroizing::new(m.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_12_words() {
        let seed = new_seed().unwrap();
        let words = seed.split_whitespace().count();
        assert_eq!(words, 12, "expected 12 words, got {words}");
    }

    #[test]
    fn seed_is_valid_bip39() {
        let seed = new_seed().unwrap();
        let parsed = Mnemonic::parse_in(Language::English, seed.as_str()).unwrap();
        assert_eq!(parsed.to_entropy().len(), SEED_ENTROPY_LEN);
    }

    #[test]
    fn seeds_are_random() {
        assert_ne!(*new_seed().unwrap(), *new_seed().unwrap());
    }
}
