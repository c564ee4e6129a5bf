//! Account keypair

use secp256k1::{schnorr, Keypair, Message, SecretKey, XOnlyPublicKey, SECP256K1};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::Result;

/// A private/public keypair. Every encryption and every relay lookup is
/// scoped to one account's public key (the "author").
#[derive(Clone)]
pub struct Account {
    keypair: Keypair,
    public: XOnlyPublicKey,
}

impl Account {
    /// Generate a fresh random account
    pub fn generate() -> Self {
        let keypair = Keypair::new(SECP256K1, &mut rand::thread_rng());
        Self::from_keypair(keypair)
    }

    /// Load an account from its hex encoded private key
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(secret_hex.trim())
                .map_err(|e| CryptoError::InvalidKey(format!("private key is not hex: {e}")))?,
        );
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(Self::from_keypair(Keypair::from_secret_key(SECP256K1, &secret)))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let (public, _parity) = keypair.x_only_public_key();
        Self { keypair, public }
    }

    /// Hex encoded x-only public key (the author id)
    pub fn public_hex(&self) -> String {
        hex::encode(self.public.serialize())
    }

    /// Hex encoded private key, wiped from memory on drop
    pub fn secret_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.keypair.secret_bytes()))
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Schnorr-sign a 32-byte digest, returning the hex signature
    pub fn sign(&self, digest: &[u8; 32]) -> String {
        let message = Message::from_digest(*digest);
        SECP256K1.sign_schnorr(&message, &self.keypair).to_string()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("public", &self.public_hex())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for Account {}

/// Derive the hex public key for a hex private key
pub fn derive_public(secret_hex: &str) -> Result<String> {
    Ok(Account::from_secret_hex(secret_hex)?.public_hex())
}

/// Check a hex Schnorr signature over `digest` by the hex x-only `pubkey`
pub fn verify_signature(pubkey_hex: &str, digest: &[u8; 32], sig_hex: &str) -> Result<()> {
    let public = XOnlyPublicKey::from_str(pubkey_hex)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let signature =
        schnorr::Signature::from_str(sig_hex).map_err(|e| CryptoError::Signature(e.to_string()))?;
    let message = Message::from_digest(*digest);

    SECP256K1
        .verify_schnorr(&signature, &message, &public)
        .map_err(|e| CryptoError::Signature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP-340 test vector 0 secret key (3) and its x-only public key
    const SECRET: &str = "0000000000000000000000000000000000000000000000000000000000000003";
    const PUBLIC: &str = "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9";

    #[test]
    fn test_derive_public() {
        assert_eq!(derive_public(SECRET).unwrap(), PUBLIC);
    }

    #[test]
    fn test_secret_hex_roundtrip() {
        let account = Account::generate();
        let restored = Account::from_secret_hex(&account.secret_hex()).unwrap();
        assert_eq!(account, restored);
        assert_eq!(account.public_hex().len(), 64);
    }

    #[test]
    fn test_invalid_secret_rejected() {
        assert!(matches!(
            Account::from_secret_hex("not-hex"),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(matches!(
            Account::from_secret_hex(&"00".repeat(32)),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_sign_and_verify() {
        let account = Account::generate();
        let digest = [7u8; 32];
        let sig = account.sign(&digest);

        verify_signature(&account.public_hex(), &digest, &sig).unwrap();

        let other = Account::generate();
        assert!(verify_signature(&other.public_hex(), &digest, &sig).is_err());
        assert!(verify_signature(&account.public_hex(), &[8u8; 32], &sig).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let account = Account::from_secret_hex(SECRET).unwrap();
        let printed = format!("{account:?}");
        assert!(printed.contains(PUBLIC));
        assert!(!printed.contains(SECRET));
    }
}
