//! LLM adapter (§4.7): the only component that talks to the model
//! provider or constructs a prompt. The provider itself is an external
//! collaborator named by interface only; [`DevEchoAdapter`] is a
//! deterministic stand-in used in development and tests.

use async_trait::async_trait;
use std::collections::HashMap;

/// Same closed set the regex router detects (§4.6(a)); `ClassifyIntent`
/// output is constrained to this set, malformed output maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    PlayerTeam,
    PlayerLastRuns,
    FixturesList,
    LadderPosition,
    NextFixture,
    RosterList,
    Unknown,
}

pub struct ClassifiedIntent {
    pub intent: Intent,
    pub entities: HashMap<String, String>,
}

pub struct Summary {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Approximate token budget for context assembly; truncation drops whole
/// snippets, oldest first, until the remainder fits.
const MAX_CONTEXT_TOKENS: usize = 2000;

#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn classify_intent(&self, text: &str) -> ClassifiedIntent;

    /// `context` is the ordered list of retrieved snippets, oldest (lowest
    /// relevance) first, so truncation can drop from the front.
    async fn summarise(&self, context: &[String], question: &str) -> Summary;
}

fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Truncates `context` to fit [`MAX_CONTEXT_TOKENS`], dropping whole
/// snippets from the front (oldest-out) rather than cutting mid-snippet.
pub fn truncate_context(context: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    let mut budget = MAX_CONTEXT_TOKENS;

    for snippet in context.iter().rev() {
        let cost = count_tokens(snippet);
        if cost > budget {
            break;
        }
        budget -= cost;
        kept.push(snippet.clone());
    }
    kept.reverse();
    kept
}

/// Deterministic development/test adapter: classification falls through to
/// `Unknown` (the regex router handles the closed set; this only fires when
/// patterns miss), and summarisation echoes whichever context snippets were
/// retrieved so grounding can be asserted exactly in tests.
pub struct DevEchoAdapter;

#[async_trait]
impl LlmAdapter for DevEchoAdapter {
    async fn classify_intent(&self, _text: &str) -> ClassifiedIntent {
        ClassifiedIntent {
            intent: Intent::Unknown,
            entities: HashMap::new(),
        }
    }

    async fn summarise(&self, context: &[String], question: &str) -> Summary {
        let truncated = truncate_context(context);
        let input_tokens = truncated.iter().map(|s| count_tokens(s)).sum::<usize>() + count_tokens(question);

        let text = if truncated.is_empty() {
            "I don't have that information available.".to_string()
        } else {
            truncated.join("\n")
        };

        Summary {
            output_tokens: count_tokens(&text),
            input_tokens,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_context_drops_oldest_snippets_first_when_over_budget() {
        let big_snippet = "word ".repeat(MAX_CONTEXT_TOKENS + 10);
        let context = vec!["old".to_string(), big_snippet.clone()];
        let kept = truncate_context(&context);
        assert_eq!(kept, vec![big_snippet]);
    }

    #[tokio::test]
    async fn dev_echo_adapter_reports_not_available_with_empty_context() {
        let adapter = DevEchoAdapter;
        let summary = adapter.summarise(&[], "who scored the most sixes last year?").await;
        assert!(summary.text.to_lowercase().contains("not"));
    }

    #[tokio::test]
    async fn dev_echo_adapter_echoes_context_verbatim() {
        let adapter = DevEchoAdapter;
        let snippet = "Ladder: Under-10\n3. Caroline Springs Blue U10 - 8 points".to_string();
        let summary = adapter.summarise(&[snippet.clone()], "ladder for blue 10s").await;
        assert!(summary.text.contains("8 points"));
    }
}
