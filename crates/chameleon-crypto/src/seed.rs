//! Mnemonic to seed stretching (BIP-39 compatible).

use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroize;

/// Seed length in bytes (512 bits)
pub const SEED_SIZE: usize = 64;

/// PBKDF2 iteration count
const PBKDF2_ROUNDS: u32 = 2048;

/// Salt prefix prepended to the passphrase
const SALT_PREFIX: &str = "mnemonic";

/// Root secret derived from a mnemonic.
///
/// Neither `Clone` nor `Copy`. A seed has exactly one owner, the call that
/// stretched it, and is zeroized when that owner drops it.
pub struct Seed {
    bytes: [u8; SEED_SIZE],
}

impl Seed {
    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.bytes
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Derive the seed for a mnemonic and optional passphrase.
///
/// Both inputs are NFKD-normalized. The salt is `"mnemonic" ‖ passphrase`
/// and the stretch is PBKDF2-HMAC-SHA512 with 2048 rounds, so the output
/// equals the BIP-39 seed for the same phrase.
pub fn derive_seed(mnemonic: &str, passphrase: &str) -> Seed {
    let mut password: String = mnemonic.nfkd().collect();
    let mut salt: String = SALT_PREFIX.chars().chain(passphrase.chars()).nfkd().collect();

    let mut bytes = [0u8; SEED_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut bytes);

    password.zeroize();
    salt.zeroize();

    Seed { bytes }
}
