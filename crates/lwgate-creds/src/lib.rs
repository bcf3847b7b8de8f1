//! lwgate-creds - Device credential store
//!
//! Holds the pre-shared keys (PSK) that devices use to bootstrap a secure
//! session with the gateway. Records are decoded from JSON (base64 key
//! material), kept in memory in insertion order and persisted to a JSON
//! array file.
//!
//! # File format
//!
//! ```json
//! [
//!   { "uuid": "5f2c0f1e-...", "psk": "c2VjcmV0", "psk_id": "ZGV2aWNlLTE=" }
//! ]
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use lwgate_creds::{CredentialStore, validate_new_entry, create_from_validated_new};
//!
//! let mut store = CredentialStore::load(Path::new("devices.json"))?;
//! let body = serde_json::json!({ "psk": "QQ==", "psk_id": "Qg==" });
//! validate_new_entry(&body)?;
//! store.insert(create_from_validated_new(&body)?);
//! store.save(Some(Path::new("devices.json")))?;
//! ```

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{
    create_from_validated_existing, create_from_validated_new, validate_existing_entry,
    validate_new_entry, DeviceCredential, FullView, PublicView, MAX_DECODED_KEY_LEN,
};
pub use error::{CredentialError, CredentialResult};
pub use store::CredentialStore;
