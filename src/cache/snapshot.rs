//! Snapshot codec.
//!
//! A snapshot is a small JSON envelope around the serialized component:
//!
//! ```json
//! { "format": "rocolib-snapshot", "version": 1, "checksum": "<sha256>", "payload": "<component json>" }
//! ```
//!
//! The header is read on its own first, so a snapshot written by a future
//! codec version is reported as incompatible rather than as corrupt.

use serde::{Deserialize, Serialize};

use crate::cache::CacheError;
use crate::core::Component;
use crate::util::hash::sha256_str;

/// Format marker written into every snapshot.
pub const SNAPSHOT_FORMAT: &str = "rocolib-snapshot";

/// Current codec version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct Header {
    format: String,
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    checksum: String,
    payload: String,
}

/// Encode a component into snapshot bytes.
///
/// JSON has no encoding for `inf` or `NaN`, so a component holding one
/// anywhere in its tree is refused instead of decoding back as `null`.
pub fn encode(name: &str, component: &Component) -> Result<Vec<u8>, CacheError> {
    if let Some(path) = non_finite_parameter(component, "") {
        return Err(CacheError::Unencodable {
            name: name.to_string(),
            reason: format!("parameter `{}` is not a finite number", path),
        });
    }

    let payload = serde_json::to_string(component).map_err(|e| CacheError::Corrupt {
        name: name.to_string(),
        reason: format!("failed to encode component: {}", e),
    })?;

    let envelope = Envelope {
        format: SNAPSHOT_FORMAT.to_string(),
        version: SNAPSHOT_VERSION,
        checksum: sha256_str(&payload),
        payload,
    };

    serde_json::to_vec_pretty(&envelope).map_err(|e| CacheError::Corrupt {
        name: name.to_string(),
        reason: format!("failed to encode snapshot: {}", e),
    })
}

/// Dotted path of the first non-finite parameter or binding.
fn non_finite_parameter(component: &Component, prefix: &str) -> Option<String> {
    if let Some(key) = component
        .parameters()
        .iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(key, _)| key)
    {
        return Some(format!("{}{}", prefix, key));
    }

    for (sub_name, sub) in component.subcomponents() {
        let nested = format!("{}{}.", prefix, sub_name);
        if let Some((key, _)) = sub.bindings.iter().find(|(_, value)| !value.is_finite()) {
            return Some(format!("{}{}", nested, key));
        }
        if let Some(path) = non_finite_parameter(&sub.component, &nested) {
            return Some(path);
        }
    }
    None
}

/// Decode snapshot bytes back into a component.
pub fn decode(name: &str, bytes: &[u8]) -> Result<Component, CacheError> {
    let corrupt = |reason: String| CacheError::Corrupt {
        name: name.to_string(),
        reason,
    };

    let header: Header =
        serde_json::from_slice(bytes).map_err(|e| corrupt(format!("unreadable header: {}", e)))?;
    if header.format != SNAPSHOT_FORMAT {
        return Err(corrupt(format!("unknown format `{}`", header.format)));
    }
    if header.version != SNAPSHOT_VERSION {
        return Err(CacheError::IncompatibleVersion {
            name: name.to_string(),
            found: header.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| corrupt(format!("unreadable envelope: {}", e)))?;
    if sha256_str(&envelope.payload) != envelope.checksum {
        return Err(corrupt("checksum mismatch".to_string()));
    }

    serde_json::from_str(&envelope.payload)
        .map_err(|e| corrupt(format!("unreadable component: {}", e)))
}
