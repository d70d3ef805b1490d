//! Pattern-matched handler dispatch (§4.6(a)): a closed set of intents
//! detected by ordered regular expressions, first match wins. Narrow but
//! deterministic and fully cited; the RAG path in [`crate::router`] is the
//! fallback when nothing here matches.

use crate::llm::Intent;
use cricket_core::team_names;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

struct Pattern {
    intent: Intent,
    regex: &'static str,
}

const PATTERNS: &[Pattern] = &[
    Pattern {
        intent: Intent::LadderPosition,
        regex: r"(?i)\b(ladder|standings|positions?)\b",
    },
    Pattern {
        intent: Intent::NextFixture,
        regex: r"(?i)\bnext\s+(fixture|game|match)\b",
    },
    Pattern {
        intent: Intent::FixturesList,
        regex: r"(?i)\b(fixtures?|schedule|upcoming\s+games?)\b",
    },
    Pattern {
        intent: Intent::PlayerLastRuns,
        regex: r"(?i)\bhow many runs\b|\bruns\s+(did|has|does)\b|\blast\s+runs\b",
    },
    Pattern {
        intent: Intent::RosterList,
        regex: r"(?i)\b(roster|squad|team list|who'?s? (playing|in the team))\b",
    },
    Pattern {
        intent: Intent::PlayerTeam,
        regex: r"(?i)\bwhat team is\b|\bwhich team does\b.*\bplay for\b",
    },
];

fn compiled() -> &'static Vec<Regex> {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| PATTERNS.iter().map(|p| Regex::new(p.regex).expect("static intent pattern is valid")).collect())
}

pub struct Detection {
    pub intent: Intent,
    pub entities: HashMap<String, String>,
}

/// Tries each pattern in order; the first match determines the intent. A
/// team-name entity is pulled from free text via the alias table whenever
/// present, independent of which pattern matched.
pub fn detect(text: &str) -> Detection {
    let regexes = compiled();
    let mut entities = HashMap::new();
    if let Some(team) = team_names::find_alias_in_text(text) {
        entities.insert("team".to_string(), team);
    }

    for (pattern, regex) in PATTERNS.iter().zip(regexes.iter()) {
        if regex.is_match(text) {
            return Detection {
                intent: pattern.intent,
                entities,
            };
        }
    }

    Detection {
        intent: Intent::Unknown,
        entities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_question_detects_ladder_position_and_team_entity() {
        let detection = detect("ladder for blue 10s");
        assert_eq!(detection.intent, Intent::LadderPosition);
        assert_eq!(detection.entities.get("team").map(String::as_str), Some("Caroline Springs Blue U10"));
    }

    #[test]
    fn next_fixture_question_detects_next_fixture() {
        let detection = detect("next fixture blue 10s");
        assert_eq!(detection.intent, Intent::NextFixture);
    }

    #[test]
    fn unrelated_question_falls_through_to_unknown() {
        let detection = detect("who scored the most sixes last year?");
        assert_eq!(detection.intent, Intent::Unknown);
    }
}
