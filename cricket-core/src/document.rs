//! The storage unit of the vector store (§3) and the tagged dispatch that
//! replaces the upstream registry-keyed-by-string normalizer pattern: each
//! [`DocumentKind`] carries its own normalize/snippet pair behind
//! [`crate::normalize::Normalizable`] rather than a lookup by type name.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Team,
    Fixture,
    Scorecard,
    Ladder,
    Roster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub team_id: Option<String>,
    pub season_id: String,
    pub grade_id: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub date: Option<String>,
}

impl DocumentMetadata {
    /// Stable key order used for content hashing and filter matching; both
    /// must see metadata the same way regardless of which of them built it.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("season_id", self.season_id.clone()),
            ("grade_id", self.grade_id.clone()),
            ("type", self.kind.to_string()),
        ];
        if let Some(team_id) = &self.team_id {
            entries.push(("team_id", team_id.clone()));
        }
        if let Some(date) = &self.date {
            entries.push(("date", date.clone()));
        }
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// A document as produced by normalization, prior to any vector-store
/// assigned embedding. The store computes `embedding` and the content hash;
/// this type is what the sync engine and webhook handler hand to `Upsert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }

    /// Derives the `id` convention from entity type + entity identifier so
    /// re-ingestion of the same entity overwrites rather than duplicates.
    pub fn id_for(kind: DocumentKind, entity_id: &str) -> String {
        format!("{kind}_{entity_id}")
    }
}
