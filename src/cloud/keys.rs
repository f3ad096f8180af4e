//! Key management (KMS) and envelope encryption

use super::sdk_error;
use crate::crypto::{decode_base64, decrypt_aes, encode_base64, encrypt_aes};
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::DataKeySpec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const SERVICE: &str = "KMS";

/// Key spec used when none is given
pub const DEFAULT_KEY_SPEC: &str = "AES_256";

/// A freshly generated data key
#[derive(Clone)]
pub struct DataKey {
    /// Key material; never persist this
    pub plaintext: Vec<u8>,
    /// The same key encrypted under the master key
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey")
            .field("plaintext", &format_args!("<{} bytes>", self.plaintext.len()))
            .field("ciphertext", &format_args!("<{} bytes>", self.ciphertext.len()))
            .finish()
    }
}

/// Data encrypted under a data key, with that key in encrypted form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 ciphertext blob of the data key
    pub key: String,
    /// Base64 of IV followed by the AES-CTR ciphertext
    pub data: String,
}

/// Key management operations used by the tools
#[async_trait]
pub trait KeyManagementApi: Send + Sync {
    /// Generate a data key under `key_id`
    async fn generate_key(&self, key_id: &str, key_spec: &str) -> Result<DataKey>;

    /// Decrypt a data key ciphertext blob
    async fn decrypt_key(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

#[async_trait]
impl KeyManagementApi for aws_sdk_kms::Client {
    async fn generate_key(&self, key_id: &str, key_spec: &str) -> Result<DataKey> {
        let output = self
            .generate_data_key()
            .key_id(key_id)
            .key_spec(DataKeySpec::from(key_spec))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        let plaintext = output
            .plaintext()
            .ok_or_else(|| Error::cloud(SERVICE, "response carried no plaintext key"))?;
        let ciphertext = output
            .ciphertext_blob()
            .ok_or_else(|| Error::cloud(SERVICE, "response carried no ciphertext blob"))?;

        Ok(DataKey {
            plaintext: plaintext.as_ref().to_vec(),
            ciphertext: ciphertext.as_ref().to_vec(),
        })
    }

    async fn decrypt_key(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let output = self
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext.to_vec()))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        output
            .plaintext()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| Error::cloud(SERVICE, "response carried no plaintext key"))
    }
}

/// Key management service
#[derive(Debug)]
pub struct KeyVault<A> {
    pub(super) api: Arc<A>,
}

impl<A> Clone for KeyVault<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: KeyManagementApi> KeyVault<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    /// Generate a data key, returning plaintext and ciphertext blob
    pub async fn new_data_key(&self, key_id: &str, key_spec: &str) -> Result<DataKey> {
        let key = self.api.generate_key(key_id, key_spec).await?;
        info!("Generated a data key, length {}", key.plaintext.len());
        Ok(key)
    }

    /// Recover the plaintext of a data key ciphertext blob
    pub async fn data_key(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let plaintext = self.api.decrypt_key(ciphertext).await?;
        info!("Decrypted a data key, length {}", plaintext.len());
        Ok(plaintext)
    }

    /// Encrypt `plaintext` under a new data key from `key_id`
    pub async fn seal(&self, key_id: &str, plaintext: &[u8]) -> Result<Envelope> {
        let key = self.new_data_key(key_id, DEFAULT_KEY_SPEC).await?;
        let data = encrypt_aes(&key.plaintext, plaintext)?;
        Ok(Envelope {
            key: encode_base64(&key.ciphertext),
            data: encode_base64(&data),
        })
    }

    /// Decrypt an envelope produced by [`KeyVault::seal`]
    pub async fn open(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        let key = self.data_key(&decode_base64(&envelope.key)?).await?;
        decrypt_aes(&key, &decode_base64(&envelope.data)?)
    }
}
