//! Password encryption compatible with the Collekto web front end.
//!
//! The login endpoint expects the password as base64(AES-128-ECB(PKCS#7)).

use crate::error::CollektoError;
use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyInit};
use aes::Aes128;
use base64::Engine;

/// Key used by the Collekto front end.
pub const DEFAULT_ENCRYPTION_KEY: &str = "collektoencrypte";

const KEY_SIZE: usize = 16;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;

/// Encrypts `raw_password` with AES-128-ECB and PKCS#7 padding.
///
/// The same input always yields the same ciphertext. `key` must be
/// exactly 16 bytes.
pub fn encrypt_password(raw_password: &str, key: &str) -> Result<String, CollektoError> {
    let cipher = Aes128EcbEnc::new_from_slice(key.as_bytes()).map_err(|_| {
        CollektoError::Crypto(format!(
            "encryption key must be {} bytes, got {}",
            KEY_SIZE,
            key.len()
        ))
    })?;

    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(raw_password.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockDecryptMut;

    fn decrypt(ciphertext_b64: &str, key: &str) -> String {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ciphertext_b64)
            .unwrap();
        let plain = ecb::Decryptor::<Aes128>::new_from_slice(key.as_bytes())
            .unwrap()
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .unwrap();
        String::from_utf8(plain).unwrap()
    }

    #[test]
    fn encryption_is_deterministic_and_reversible() {
        let pw = "MySecretPassword123!";
        let first = encrypt_password(pw, DEFAULT_ENCRYPTION_KEY).unwrap();
        let second = encrypt_password(pw, DEFAULT_ENCRYPTION_KEY).unwrap();
        assert_eq!(first, second);

        let different = encrypt_password("MySecretPassword123!A", DEFAULT_ENCRYPTION_KEY).unwrap();
        assert_ne!(first, different);

        assert_eq!(decrypt(&first, DEFAULT_ENCRYPTION_KEY), pw);
    }

    #[test]
    fn block_aligned_input_gets_a_full_padding_block() {
        // 32 ciphertext bytes -> 44 base64 chars
        let aligned = encrypt_password("0123456789abcdef", DEFAULT_ENCRYPTION_KEY).unwrap();
        assert_eq!(aligned.len(), 44);
        assert_eq!(decrypt(&aligned, DEFAULT_ENCRYPTION_KEY), "0123456789abcdef");

        // 16 ciphertext bytes -> 24 base64 chars
        let empty = encrypt_password("", DEFAULT_ENCRYPTION_KEY).unwrap();
        assert_eq!(empty.len(), 24);
        assert_eq!(decrypt(&empty, DEFAULT_ENCRYPTION_KEY), "");
    }

    #[test]
    fn rejects_wrong_key_length() {
        let result = encrypt_password("pw", "short");
        match result {
            Err(CollektoError::Crypto(msg)) => assert!(msg.contains("16 bytes"), "got: {}", msg),
            other => panic!("expected Crypto error, got {:?}", other),
        }
    }
}
