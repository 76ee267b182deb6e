// RSA key handling

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

const KEY_BITS: usize = 2048;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[from] rsa::pkcs8::spki::Error),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[from] rsa::pkcs8::Error),
    #[error("rsa operation failed: {0}")]
    Rsa(#[from] rsa::Error),
    #[error("no private key loaded")]
    MissingPrivateKey,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// RSA keypair, or a lone public key when only verification is needed.
/// Public keys travel as X.509 SPKI DER, private keys live on disk as
/// PKCS#8 DER. Signatures are SHA-256 with PKCS#1 v1.5 padding.
#[derive(Debug, Clone)]
pub struct RsaKeys {
    public_der: Vec<u8>,
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl RsaKeys {
    /// Generate a fresh 2048-bit keypair
    pub fn generate() -> Result<Self, KeyError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), KEY_BITS)?;
        let public = RsaPublicKey::from(&private);
        let public_der = public.to_public_key_der()?.to_vec();
        Ok(Self { public_der, public, private: Some(private) })
    }

    /// Load a verification-only key from SPKI DER bytes
    pub fn public_only(public_der: &[u8]) -> Result<Self, KeyError> {
        let public = RsaPublicKey::from_public_key_der(public_der)?;
        Ok(Self { public_der: public_der.to_vec(), public, private: None })
    }

    /// Load a full keypair from DER bytes
    pub fn from_der(public_der: &[u8], private_der: &[u8]) -> Result<Self, KeyError> {
        let public = RsaPublicKey::from_public_key_der(public_der)?;
        let private = RsaPrivateKey::from_pkcs8_der(private_der)?;
        Ok(Self {
            public_der: public_der.to_vec(),
            public,
            private: Some(private),
        })
    }

    /// Load a keypair from DER files on disk
    pub fn from_files(public_path: &Path, private_path: &Path) -> Result<Self, KeyError> {
        let public_der = std::fs::read(public_path)?;
        let private_der = std::fs::read(private_path)?;
        Self::from_der(&public_der, &private_der)
    }

    /// Write both keys as DER files
    pub fn save(&self, public_path: &Path, private_path: &Path) -> Result<(), KeyError> {
        std::fs::write(public_path, &self.public_der)?;
        std::fs::write(private_path, self.private_der()?)?;
        Ok(())
    }

    /// The SPKI DER encoding of the public key, as used in outputs
    pub fn public_der(&self) -> &[u8] {
        &self.public_der
    }

    /// The PKCS#8 DER encoding of the private key
    pub fn private_der(&self) -> Result<Vec<u8>, KeyError> {
        let private = self.private.as_ref().ok_or(KeyError::MissingPrivateKey)?;
        Ok(private.to_pkcs8_der()?.as_bytes().to_vec())
    }

    /// Signature length in bytes for this key
    pub fn signature_len(&self) -> usize {
        use rsa::traits::PublicKeyParts;
        self.public.size()
    }

    /// Sign data with SHA-256 / PKCS#1 v1.5
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let private = self.private.as_ref().ok_or(KeyError::MissingPrivateKey)?;
        let digest = Sha256::digest(data);
        Ok(private.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)?)
    }

    /// Verify a signature against this public key
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(data);
        self.public
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .is_ok()
    }
}
