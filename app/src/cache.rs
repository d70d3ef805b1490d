//! Router response cache (§4.6): keyed by `(normalized_text, team_hint)`
//! with a 30-minute TTL and a soft capacity bound, modeled on the
//! lock-guarded `Arc<Mutex<...>>` cache idiom used elsewhere in this
//! codebase rather than pulling in an external cache crate for something
//! this small and process-local.

use crate::router::AskResponse;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

const TTL: chrono::Duration = chrono::Duration::minutes(30);
const SOFT_CAPACITY: usize = 2_000;

type CacheKey = (String, Option<String>);

struct Entry {
    response: AskResponse,
    stored_at: DateTime<Utc>,
}

pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, text: &str, team_hint: &Option<String>) -> Option<AskResponse> {
        let key = Self::key(text, team_hint);
        let mut guard = self.entries.lock().expect("response cache lock poisoned");
        match guard.get(&key) {
            Some(entry) if Utc::now() - entry.stored_at < TTL => Some(entry.response.clone()),
            Some(_) => {
                guard.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, text: &str, team_hint: &Option<String>, response: AskResponse) {
        let key = Self::key(text, team_hint);
        let mut guard = self.entries.lock().expect("response cache lock poisoned");
        if guard.len() >= SOFT_CAPACITY {
            Self::evict_oldest(&mut guard);
        }
        guard.insert(
            key,
            Entry {
                response,
                stored_at: Utc::now(),
            },
        );
    }

    fn evict_oldest(guard: &mut HashMap<CacheKey, Entry>) {
        if let Some(oldest_key) = guard.iter().min_by_key(|(_, e)| e.stored_at).map(|(k, _)| k.clone()) {
            guard.remove(&oldest_key);
        }
    }

    fn key(text: &str, team_hint: &Option<String>) -> CacheKey {
        let normalized = text.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        (normalized, team_hint.clone())
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::AskMeta;
    use std::collections::HashMap as StdHashMap;

    fn sample_response(answer: &str) -> AskResponse {
        AskResponse {
            answer: answer.to_string(),
            meta: AskMeta {
                intent: "unknown".to_string(),
                entities: StdHashMap::new(),
                rag_ms: 0,
                api_ms: 0,
                latency_ms: 0,
                source: "test".to_string(),
                request_id: "r1".to_string(),
                error: None,
            },
        }
    }

    #[test]
    fn a_cached_answer_is_returned_for_the_same_normalized_key() {
        let cache = ResponseCache::new();
        cache.put("Ladder for Blue 10s", &None, sample_response("3rd place"));
        let hit = cache.get("ladder   for blue 10s", &None);
        assert_eq!(hit.unwrap().answer, "3rd place");
    }

    #[test]
    fn different_team_hints_are_different_keys() {
        let cache = ResponseCache::new();
        cache.put("ladder", &Some("team-a".to_string()), sample_response("a"));
        assert!(cache.get("ladder", &Some("team-b".to_string())).is_none());
    }
}
