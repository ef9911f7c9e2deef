use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TypeError;
use crate::hex_bytes::HexBytes;

/// Signing key material for one role.
///
/// The store persists keys but never uses them: signing and verification
/// happen in the repository manager.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Key algorithm, e.g. `"ed25519"`.
    #[serde(rename = "keytype")]
    pub key_type: String,
    /// Public and (optionally) private halves.
    #[serde(rename = "keyval")]
    pub value: KeyValue,
}

/// The public and private halves of a [`Key`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub public: HexBytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<HexBytes>,
}

/// Canonical public form hashed to produce the key ID. Field order matches
/// sorted-key canonical JSON.
#[derive(Serialize)]
struct PublicForm<'a> {
    keytype: &'a str,
    keyval: PublicValue<'a>,
}

#[derive(Serialize)]
struct PublicValue<'a> {
    public: &'a HexBytes,
}

impl Key {
    /// Create a key from its type and both halves.
    pub fn new(key_type: impl Into<String>, public: HexBytes, private: Option<HexBytes>) -> Self {
        Self {
            key_type: key_type.into(),
            value: KeyValue { public, private },
        }
    }

    /// The key ID: lowercase hex SHA-256 of the canonical JSON of the public
    /// form. Private material never contributes, so a key and its public
    /// projection share an ID.
    pub fn id(&self) -> Result<String, TypeError> {
        let form = PublicForm {
            keytype: &self.key_type,
            keyval: PublicValue {
                public: &self.value.public,
            },
        };
        let canonical =
            serde_json::to_vec(&form).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }

    /// A copy of this key with the private half stripped.
    pub fn public_only(&self) -> Self {
        Self::new(self.key_type.clone(), self.value.public.clone(), None)
    }

    /// Returns `true` if private material is present.
    pub fn has_private(&self) -> bool {
        self.value.private.is_some()
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("key_type", &self.key_type)
            .field("public", &self.value.public)
            .field(
                "private",
                &self.value.private.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl std::fmt::Debug for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValue")
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
