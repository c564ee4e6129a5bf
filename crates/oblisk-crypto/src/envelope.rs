//! Self-addressed encryption envelope
//!
//! Format: `base64(ciphertext) + "?iv=" + base64(iv)`, AES-256-CBC with
//! PKCS#7 padding and a random IV per write. The key is the x coordinate of
//! the ECDH point between the account's private key and its own public key.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use secp256k1::ecdh::shared_secret_point;
use zeroize::Zeroizing;

use crate::account::Account;
use crate::error::CryptoError;
use crate::Result;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const IV_SEPARATOR: &str = "?iv=";
const IV_SIZE: usize = 16;

fn self_shared_key(account: &Account) -> Zeroizing<[u8; 32]> {
    let keypair = account.keypair();
    let point = Zeroizing::new(shared_secret_point(
        &keypair.public_key(),
        &keypair.secret_key(),
    ));

    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&point[..32]);
    key
}

/// Encrypt `plaintext` so only the same account can read it back
pub fn encrypt_self(account: &Account, plaintext: &str) -> Result<String> {
    let key = self_shared_key(account);

    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_slice(), &iv)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(format!(
        "{}{}{}",
        STANDARD.encode(ciphertext),
        IV_SEPARATOR,
        STANDARD.encode(iv)
    ))
}

/// Decrypt an envelope produced by [`encrypt_self`] for the same account
pub fn decrypt_self(account: &Account, envelope: &str) -> Result<String> {
    let (ciphertext_b64, iv_b64) = envelope
        .split_once(IV_SEPARATOR)
        .ok_or_else(|| CryptoError::Decrypt("missing iv".to_string()))?;

    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| CryptoError::Decrypt(format!("ciphertext is not base64: {e}")))?;
    let iv = STANDARD
        .decode(iv_b64)
        .map_err(|e| CryptoError::Decrypt(format!("iv is not base64: {e}")))?;

    if iv.len() != IV_SIZE {
        return Err(CryptoError::Decrypt(format!(
            "iv must be {IV_SIZE} bytes, got {}",
            iv.len()
        )));
    }

    let key = self_shared_key(account);
    let cipher = Aes256CbcDec::new_from_slices(key.as_slice(), &iv)
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::Decrypt("bad padding or wrong key".to_string()))?,
    );

    String::from_utf8(plaintext.to_vec())
        .map_err(|_| CryptoError::Decrypt("plaintext is not utf-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let account = Account::generate();
        for plaintext in ["", "hello", "sesión ✓ 日本語", &"x".repeat(1000)] {
            let envelope = encrypt_self(&account, plaintext).unwrap();
            assert_eq!(decrypt_self(&account, &envelope).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_envelope_format() {
        let account = Account::generate();
        let envelope = encrypt_self(&account, "abc").unwrap();
        let (ct, iv) = envelope.split_once("?iv=").unwrap();
        assert_eq!(STANDARD.decode(iv).unwrap().len(), 16);
        // one padded block
        assert_eq!(STANDARD.decode(ct).unwrap().len(), 16);
    }

    #[test]
    fn test_random_iv_per_write() {
        let account = Account::generate();
        let a = encrypt_self(&account, "same").unwrap();
        let b = encrypt_self(&account, "same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let owner = Account::generate();
        let stranger = Account::generate();
        let envelope = encrypt_self(&owner, "{\"tabs\":[]}").unwrap();

        // A wrong key almost always breaks the padding; when it does not,
        // the output is garbage that cannot equal the plaintext.
        match decrypt_self(&stranger, &envelope) {
            Err(CryptoError::Decrypt(_)) => {}
            Ok(garbage) => assert_ne!(garbage, "{\"tabs\":[]}"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_envelopes() {
        let account = Account::generate();
        for bad in ["", "no-separator", "!!!?iv=AAAAAAAAAAAAAAAAAAAAAA==", "AAAA?iv=AAAA"] {
            assert!(
                matches!(decrypt_self(&account, bad), Err(CryptoError::Decrypt(_))),
                "expected decrypt error for {bad:?}"
            );
        }
    }
}
