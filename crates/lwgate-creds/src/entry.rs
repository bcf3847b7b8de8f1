//! Credential records and their JSON forms
//!
//! Two JSON shapes are accepted:
//! - the *new entry* form `{"psk", "psk_id"}` sent by REST clients, which is
//!   given a freshly generated uuid;
//! - the *existing entry* form `{"uuid", "psk", "psk_id"}` used by the
//!   persisted database.
//!
//! Key names are matched case-insensitively. The check works on the set of
//! key names seen, so a body that repeats a key still passes; with
//! `serde_json` object semantics the later value wins.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{CredentialError, CredentialResult};

/// Upper bound for one decoded base64 key field
pub const MAX_DECODED_KEY_LEN: usize = 512;

const UUID_KEY: &str = "uuid";
const PSK_KEY: &str = "psk";
const PSK_ID_KEY: &str = "psk_id";

/// A device credential record
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceCredential {
    /// Unique device identifier (compared case-insensitively)
    pub uuid: String,
    /// Pre-shared key
    pub psk: Vec<u8>,
    /// Pre-shared key identity
    pub psk_id: Vec<u8>,
}

impl fmt::Debug for DeviceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCredential")
            .field("uuid", &self.uuid)
            .field("psk", &"<redacted>")
            .field("psk_id", &STANDARD.encode(&self.psk_id))
            .finish()
    }
}

/// Public view of a record; never carries the secret key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicView {
    pub uuid: String,
    pub psk_id: String,
}

/// Full view of a record, used for the persisted database only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullView {
    pub uuid: String,
    pub psk: String,
    pub psk_id: String,
}

impl DeviceCredential {
    /// Build the public `{uuid, psk_id}` view
    pub fn to_public_view(&self) -> PublicView {
        PublicView {
            uuid: self.uuid.clone(),
            psk_id: STANDARD.encode(&self.psk_id),
        }
    }

    /// Build the full `{uuid, psk, psk_id}` view
    pub fn to_full_view(&self) -> FullView {
        FullView {
            uuid: self.uuid.clone(),
            psk: STANDARD.encode(&self.psk),
            psk_id: STANDARD.encode(&self.psk_id),
        }
    }

    /// Whether this record answers to `id`
    pub fn matches(&self, id: &str) -> bool {
        self.uuid.eq_ignore_ascii_case(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryForm {
    New,
    Existing,
}

#[derive(Debug, Default)]
struct SeenKeys {
    uuid: bool,
    psk: bool,
    psk_id: bool,
}

/// Validate a `{"psk", "psk_id"}` body
pub fn validate_new_entry(value: &Value) -> CredentialResult<()> {
    check_entry(value, EntryForm::New)
}

/// Validate a `{"uuid", "psk", "psk_id"}` body
pub fn validate_existing_entry(value: &Value) -> CredentialResult<()> {
    check_entry(value, EntryForm::Existing)
}

/// Create a record from a body accepted by [`validate_new_entry`].
///
/// A new uuid is generated before the key material is decoded.
pub fn create_from_validated_new(value: &Value) -> CredentialResult<DeviceCredential> {
    let uuid = Uuid::new_v4().to_string();
    let object = as_object(value)?;

    Ok(DeviceCredential {
        uuid,
        psk: decode_key(PSK_KEY, string_field(object, PSK_KEY)?)?,
        psk_id: decode_key(PSK_ID_KEY, string_field(object, PSK_ID_KEY)?)?,
    })
}

/// Create a record from a body accepted by [`validate_existing_entry`]
pub fn create_from_validated_existing(value: &Value) -> CredentialResult<DeviceCredential> {
    let object = as_object(value)?;

    Ok(DeviceCredential {
        uuid: string_field(object, UUID_KEY)?.to_string(),
        psk: decode_key(PSK_KEY, string_field(object, PSK_KEY)?)?,
        psk_id: decode_key(PSK_ID_KEY, string_field(object, PSK_ID_KEY)?)?,
    })
}

fn check_entry(value: &Value, form: EntryForm) -> CredentialResult<()> {
    let object = as_object(value)?;
    let mut seen = SeenKeys::default();

    for (key, value) in object {
        let text = value.as_str().ok_or_else(|| {
            CredentialError::InvalidEntry(format!("value of '{}' must be a string", key))
        })?;

        if key.eq_ignore_ascii_case(PSK_KEY) {
            decode_key(PSK_KEY, text)?;
            seen.psk = true;
        } else if key.eq_ignore_ascii_case(PSK_ID_KEY) {
            decode_key(PSK_ID_KEY, text)?;
            seen.psk_id = true;
        } else if form == EntryForm::Existing && key.eq_ignore_ascii_case(UUID_KEY) {
            seen.uuid = true;
        } else {
            return Err(CredentialError::InvalidEntry(format!(
                "unexpected key '{}'",
                key
            )));
        }
    }

    let complete = match form {
        EntryForm::New => seen.psk && seen.psk_id,
        EntryForm::Existing => seen.uuid && seen.psk && seen.psk_id,
    };

    if !complete {
        let expected = match form {
            EntryForm::New => "psk, psk_id",
            EntryForm::Existing => "uuid, psk, psk_id",
        };
        return Err(CredentialError::InvalidEntry(format!(
            "entry must contain keys: {}",
            expected
        )));
    }

    Ok(())
}

fn as_object(value: &Value) -> CredentialResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CredentialError::InvalidEntry("entry must be a JSON object".to_string()))
}

/// Find a string field by case-insensitive name; the last matching key wins
fn string_field<'a>(object: &'a Map<String, Value>, name: &str) -> CredentialResult<&'a str> {
    object
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .filter_map(|(_, value)| value.as_str())
        .last()
        .ok_or_else(|| CredentialError::InvalidEntry(format!("missing '{}'", name)))
}

fn decode_key(name: &str, text: &str) -> CredentialResult<Vec<u8>> {
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| CredentialError::InvalidEntry(format!("'{}' is not base64: {}", name, e)))?;

    if bytes.len() > MAX_DECODED_KEY_LEN {
        return Err(CredentialError::InvalidEntry(format!(
            "'{}' exceeds {} bytes",
            name, MAX_DECODED_KEY_LEN
        )));
    }

    Ok(bytes)
}
