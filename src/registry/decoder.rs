//! Turns raw registry entries into [`DecodedGame`] records.
//!
//! Nodes return entries either flat (`{ developer, name, ... }`) or wrapped
//! one level deep (`{ type, fields: { developer, name, ... } }`), and encode
//! `vector<u8>` fields either as arrays of byte values or as strings. Both
//! variations are classified up front and matched exhaustively.

use serde_json::{Map, Value};

use crate::{
    error::{AppError, Result},
    models::{ChainTimestamp, DecodedGame, RawGameEntry},
};

/// Where the entry's fields live.
#[derive(Debug, Clone, Copy)]
enum EntryShape<'a> {
    Nested {
        fields: &'a Map<String, Value>,
        outer: &'a Map<String, Value>,
    },
    Flat(&'a Map<String, Value>),
}

impl<'a> EntryShape<'a> {
    fn classify(entry: &'a Value) -> Result<Self> {
        let outer = entry
            .as_object()
            .ok_or_else(|| AppError::MalformedData(format!("registry entry is not an object: {}", entry)))?;
        match outer.get("fields") {
            Some(Value::Object(fields)) => Ok(Self::Nested { fields, outer }),
            _ => Ok(Self::Flat(outer)),
        }
    }

    /// Field from the preferred shape only.
    fn primary(&self, key: &str) -> Option<&'a Value> {
        match *self {
            Self::Nested { fields, .. } => fields.get(key),
            Self::Flat(map) => map.get(key),
        }
        .filter(|value| !value.is_null())
    }

    /// Field from the preferred shape, then from the wrapper.
    fn with_fallback(&self, key: &str) -> Option<&'a Value> {
        self.primary(key).or_else(|| match *self {
            Self::Nested { outer, .. } => outer.get(key).filter(|value| !value.is_null()),
            Self::Flat(_) => None,
        })
    }
}

/// Encoding of a `vector<u8>` text field.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawField {
    Bytes(Vec<u8>),
    Text(String),
    Unsupported,
}

impl RawField {
    fn classify(field: &'static str, value: Option<&Value>) -> Result<Self> {
        match value {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| {
                            AppError::MalformedData(format!("{} has a non-byte element: {}", field, item))
                        })
                })
                .collect::<Result<Vec<u8>>>()
                .map(Self::Bytes),
            Some(Value::String(text)) => Ok(Self::Text(text.clone())),
            _ => Ok(Self::Unsupported),
        }
    }

    fn into_text(self) -> String {
        match self {
            Self::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Self::Text(text) => text,
            Self::Unsupported => String::new(),
        }
    }
}

fn passthrough_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn timestamp(value: Option<&Value>) -> Option<ChainTimestamp> {
    match value? {
        Value::Number(n) => Some(
            n.as_u64()
                .map(ChainTimestamp::Number)
                .unwrap_or_else(|| ChainTimestamp::Text(n.to_string())),
        ),
        Value::String(s) => Some(ChainTimestamp::Text(s.clone())),
        _ => None,
    }
}

fn submission_type(value: Option<&Value>) -> u8 {
    let tag = match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    // Any nonzero tag means "not a game"; saturate rather than wrap to 0.
    tag.map(|t| u8::try_from(t).unwrap_or(u8::MAX)).unwrap_or(0)
}

/// Decodes one entry, keeping the failure reason.
pub fn try_decode_entry(entry: &RawGameEntry) -> Result<DecodedGame> {
    let shape = EntryShape::classify(&entry.0)?;

    let name = RawField::classify("name", shape.primary("name"))?.into_text();
    let metadata_ipfs_hash =
        RawField::classify("metadata_ipfs_hash", shape.primary("metadata_ipfs_hash"))?.into_text();

    Ok(DecodedGame {
        developer: passthrough_string(shape.with_fallback("developer")),
        name,
        metadata_ipfs_hash,
        submitted_at: timestamp(shape.with_fallback("submitted_at")),
        submission_type: submission_type(shape.with_fallback("submission_type")),
    })
}

/// Decodes one entry; a malformed entry yields `None`.
pub fn decode_entry(entry: &RawGameEntry) -> Option<DecodedGame> {
    match try_decode_entry(entry) {
        Ok(game) => Some(game),
        Err(e) => {
            tracing::warn!("Skipping registry entry: {}", e);
            None
        }
    }
}

/// Decodes a whole registry listing, dropping malformed entries and keeping
/// on-chain order.
pub fn decode_entries(entries: &[RawGameEntry]) -> Vec<DecodedGame> {
    let decoded: Vec<DecodedGame> = entries.iter().filter_map(decode_entry).collect();
    if decoded.len() < entries.len() {
        tracing::warn!(
            "Decoded {} of {} registry entries",
            decoded.len(),
            entries.len()
        );
    } else {
        tracing::debug!("Decoded {} registry entries", decoded.len());
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(text: &str) -> Value {
        json!(text.as_bytes())
    }

    #[test]
    fn decodes_flat_byte_array_entry() {
        let entry = RawGameEntry(json!({
            "developer": "0xdev",
            "name": bytes("Cosmic Clash"),
            "metadata_ipfs_hash": bytes("QmHash"),
            "submitted_at": "1700000000000",
            "submission_type": 0
        }));

        let game = decode_entry(&entry).expect("entry should decode");
        assert_eq!(game.developer, "0xdev");
        assert_eq!(game.name, "Cosmic Clash");
        assert_eq!(game.metadata_ipfs_hash, "QmHash");
        assert_eq!(
            game.submitted_at,
            Some(ChainTimestamp::Text("1700000000000".to_string()))
        );
        assert_eq!(game.submission_type, 0);
    }

    #[test]
    fn prefers_nested_fields_and_passes_strings_through() {
        let entry = RawGameEntry(json!({
            "type": "0xpkg::game_registry::Game",
            "name": bytes("outer name"),
            "fields": {
                "developer": "0xnested",
                "name": "Mystic Realms",
                "metadata_ipfs_hash": "QmNested",
                "submitted_at": 42,
                "submission_type": 1
            }
        }));

        let game = decode_entry(&entry).unwrap();
        assert_eq!(game.developer, "0xnested");
        assert_eq!(game.name, "Mystic Realms");
        assert_eq!(game.metadata_ipfs_hash, "QmNested");
        assert_eq!(game.submitted_at, Some(ChainTimestamp::Number(42)));
        assert_eq!(game.submission_type, 1);
    }

    #[test]
    fn nested_shape_falls_back_to_wrapper_for_passthrough_fields() {
        let entry = RawGameEntry(json!({
            "developer": "0xwrapper",
            "submitted_at": 7,
            "fields": { "name": bytes("Foo Bar"), "metadata_ipfs_hash": bytes("Qm1") }
        }));

        let game = decode_entry(&entry).unwrap();
        assert_eq!(game.developer, "0xwrapper");
        assert_eq!(game.submitted_at, Some(ChainTimestamp::Number(7)));
        assert_eq!(game.submission_type, 0);
    }

    #[test]
    fn unsupported_text_shape_becomes_empty_string() {
        let entry = RawGameEntry(json!({
            "developer": "0xdev",
            "name": { "bytes": "nope" },
            "metadata": "{\"legacy\":true}"
        }));

        let game = decode_entry(&entry).unwrap();
        assert_eq!(game.name, "");
        assert_eq!(game.metadata_ipfs_hash, "");
    }

    #[test]
    fn utf8_multibyte_names_round_trip() {
        let entry = RawGameEntry(json!({ "name": bytes("Ниндзя 忍者"), "metadata_ipfs_hash": "Qm" }));
        assert_eq!(decode_entry(&entry).unwrap().name, "Ниндзя 忍者");
    }

    #[test]
    fn malformed_entries_are_dropped_without_failing_the_batch() {
        let entries = vec![
            RawGameEntry(json!({ "name": bytes("Good"), "metadata_ipfs_hash": bytes("Qm1") })),
            RawGameEntry(json!("not an object")),
            RawGameEntry(json!({ "name": [72, 300, 105], "metadata_ipfs_hash": "Qm2" })),
            RawGameEntry(json!({ "name": "Also Good", "metadata_ipfs_hash": [81, -1] })),
            RawGameEntry(json!({ "name": "Last", "metadata_ipfs_hash": "Qm3" })),
        ];

        let decoded = decode_entries(&entries);
        assert!(decoded.len() <= entries.len());
        let names: Vec<&str> = decoded.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Last"]);
    }

    #[test]
    fn large_submission_type_stays_nonzero() {
        assert_eq!(submission_type(Some(&json!(256))), u8::MAX);
        assert_eq!(submission_type(Some(&json!("2"))), 2);
        assert_eq!(submission_type(None), 0);
    }
}
