use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::{SUBMIT_GAME_FUNCTION, SUBMIT_PROJECT_FUNCTION};

/// One element of the registry's `games` vector, exactly as the node sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawGameEntry(pub Value);

impl From<Value> for RawGameEntry {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// `submitted_at` as the chain encodes it; u64 values arrive as strings
/// from most nodes, smaller ones as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainTimestamp {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Game,
    Project,
}

impl SubmissionKind {
    /// 0 is a game; every other tag is a project.
    pub fn from_type(submission_type: u8) -> Self {
        if submission_type == 0 {
            Self::Game
        } else {
            Self::Project
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "game" | "games" => Some(Self::Game),
            "project" | "projects" => Some(Self::Project),
            _ => None,
        }
    }

    pub fn entry_function(self) -> &'static str {
        match self {
            Self::Game => SUBMIT_GAME_FUNCTION,
            Self::Project => SUBMIT_PROJECT_FUNCTION,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Project => "project",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedGame {
    pub developer: String,
    pub name: String,
    pub metadata_ipfs_hash: String,
    pub submitted_at: Option<ChainTimestamp>,
    pub submission_type: u8,
}

impl DecodedGame {
    pub fn kind(&self) -> SubmissionKind {
        SubmissionKind::from_type(self.submission_type)
    }
}

/// Metadata document pinned on IPFS. Every field is optional and
/// unrecognised keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMetadata {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list", skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub xp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Strings pass through, numbers and booleans are stringified, anything else is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::String(s)) => Some(vec![s]),
        _ => None,
    })
}

/// A listing as the discovery page renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayGame {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    pub status: String,
    pub xp: String,
    pub button: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<ChainTimestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SubmissionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_ipfs_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_digest: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_tolerates_missing_and_odd_fields() {
        let metadata: GameMetadata = serde_json::from_value(json!({
            "projectName": "My Cool Game",
            "xp": 1500,
            "platforms": "PC",
            "logoUrl": null,
            "stage": "alpha"
        }))
        .expect("metadata should parse");

        assert_eq!(metadata.name, None);
        assert_eq!(metadata.project_name.as_deref(), Some("My Cool Game"));
        assert_eq!(metadata.xp.as_deref(), Some("1500"));
        assert_eq!(metadata.platforms, Some(vec!["PC".to_string()]));
        assert_eq!(metadata.logo_url, None);
        assert_eq!(metadata.extra.get("stage"), Some(&json!("alpha")));
    }

    #[test]
    fn empty_metadata_document_parses() {
        let metadata: GameMetadata = serde_json::from_value(json!({})).unwrap();
        assert_eq!(metadata, GameMetadata::default());
    }

    #[test]
    fn chain_timestamp_accepts_number_and_string() {
        let n: ChainTimestamp = serde_json::from_value(json!(1_700_000_000_000u64)).unwrap();
        let s: ChainTimestamp = serde_json::from_value(json!("1700000000000")).unwrap();
        assert_eq!(n, ChainTimestamp::Number(1_700_000_000_000));
        assert_eq!(s, ChainTimestamp::Text("1700000000000".to_string()));
    }

    #[test]
    fn submission_kind_from_type_tag() {
        assert_eq!(SubmissionKind::from_type(0), SubmissionKind::Game);
        assert_eq!(SubmissionKind::from_type(1), SubmissionKind::Project);
        assert_eq!(SubmissionKind::from_type(7), SubmissionKind::Project);
        assert_eq!(SubmissionKind::parse("Projects"), Some(SubmissionKind::Project));
        assert_eq!(SubmissionKind::parse("nft"), None);
    }
}
