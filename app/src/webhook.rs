//! Provider webhook ingestion (§4.5), active only in private mode. Four
//! event kinds arrive signed; verification must run in constant time since
//! it is comparing attacker-influenced input against a secret.

use crate::error::AppError;
use cricket_core::normalize::{chunk_snippet, Normalizable};
use cricket_core::{Document, DocumentMetadata, Fixture, Ladder, Roster, Scorecard};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use vector_store::VectorStore;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    FixtureUpdated,
    ScorecardUpdated,
    LadderUpdated,
    RosterUpdated,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub event: WebhookEventKind,
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub processed_count: usize,
    pub errors: Vec<String>,
}

/// Verifies `signature_hex` (a hex-encoded HMAC-SHA256 digest) over `body`
/// using `secret`, in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> Result<(), AppError> {
    let expected = {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any length");
        mac.update(body);
        mac.finalize().into_bytes()
    };

    let provided = hex::decode(signature_hex).map_err(|_| AppError::SignatureMismatch)?;
    if provided.len() != expected.len() || expected.as_slice().ct_eq(&provided).unwrap_u8() != 1 {
        return Err(AppError::SignatureMismatch);
    }
    Ok(())
}

/// Normalizes, snippets, and upserts the event's entity; scorecard events
/// short-circuit (counted, not errored) when `is_completed` is false.
pub async fn process_event(store: &Arc<dyn VectorStore>, payload: &WebhookPayload) -> Result<usize, String> {
    match payload.event {
        WebhookEventKind::FixtureUpdated => ingest::<Fixture>(store, &payload.data).await,
        WebhookEventKind::LadderUpdated => ingest::<Ladder>(store, &payload.data).await,
        WebhookEventKind::RosterUpdated => ingest::<Roster>(store, &payload.data).await,
        WebhookEventKind::ScorecardUpdated => {
            let is_completed = payload.data.get("status").and_then(|v| v.as_str()) == Some("completed");
            if !is_completed {
                return Ok(0);
            }
            ingest::<Scorecard>(store, &payload.data).await
        }
    }
}

async fn ingest<T: Normalizable>(store: &Arc<dyn VectorStore>, raw: &serde_json::Value) -> Result<usize, String> {
    let entity = T::normalize(raw).map_err(|e| e.to_string())?;
    let metadata = DocumentMetadata {
        team_id: raw.get("team_id").and_then(|v| v.as_str()).map(str::to_string),
        season_id: raw.get("season_id").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        grade_id: raw.get("grade_id").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        kind: T::KIND,
        date: None,
    };

    let id_prefix = Document::id_for(T::KIND, entity.entity_id());
    let snippet = entity.snippet();
    let docs: Vec<Document> = chunk_snippet(&id_prefix, &snippet)
        .into_iter()
        .map(|(id, text)| Document::new(id, text, metadata.clone()))
        .collect();

    let outcome = store.upsert(docs).await;
    if !outcome.errors.is_empty() {
        return Err(outcome.errors.into_iter().map(|(id, err)| format!("{id}: {err}")).collect::<Vec<_>>().join("; "));
    }
    Ok(outcome.written + outcome.dedupe_hits.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_signature_accepts_a_correctly_signed_body() {
        let secret = "webhook-secret";
        let body = br#"{"event":"fixture_updated"}"#;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature(secret, body, &signature).is_ok());
    }

    #[test]
    fn verify_signature_rejects_a_tampered_body() {
        let secret = "webhook-secret";
        let body = br#"{"event":"fixture_updated"}"#;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature(secret, b"{\"event\":\"tampered\"}", &signature).is_err());
    }
}
