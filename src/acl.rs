//! Access control list model and text codec.
//!
//! An ACL is a flat rule set: each entry names a role, an action string and an
//! allow flag. The serialized form stored on a record is JSON; the store only
//! ever passes that text through this module, so a corrupt stored policy
//! surfaces as a distinct `AclParse` failure rather than a generic one.

use serde::{Deserialize, Serialize};

use crate::error::{SeriesError, SeriesResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControlEntry {
    pub role: String,
    pub action: String,
    pub allow: bool,
}

impl AccessControlEntry {
    pub fn allow(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self { role: role.into(), action: action.into(), allow: true }
    }

    pub fn deny(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self { role: role.into(), action: action.into(), allow: false }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControlList {
    #[serde(default)]
    pub entries: Vec<AccessControlEntry>,
}

impl AccessControlList {
    pub fn new(entries: Vec<AccessControlEntry>) -> Self {
        Self { entries }
    }
}

/// Parse serialized ACL text. Malformed input is an `AclParse` error.
pub fn parse_acl(text: &str) -> SeriesResult<AccessControlList> {
    serde_json::from_str(text).map_err(|e| {
        SeriesError::acl_parse("acl_parse", format!("malformed access control document: {}", e))
    })
}

/// Serialize an ACL to its stored text form.
pub fn serialize_acl(acl: &AccessControlList) -> SeriesResult<String> {
    serde_json::to_string(acl)
        .map_err(|e| SeriesError::storage("acl_codec", format!("could not serialize ACL: {}", e)))
}
