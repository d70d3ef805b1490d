//! Raw provider JSON → typed record → deterministic embedding text.
//!
//! Each entity type implements [`Normalizable`] instead of going through a
//! registry keyed by a type-name string: the caller already knows which
//! variant it is normalizing (it came from a specific upstream endpoint or a
//! specific webhook event kind), so dispatch is a direct call, not a lookup.

use crate::document::DocumentKind;
use crate::error::CoreError;
use crate::model::{Fixture, FixtureStatus, Ladder, Roster, Scorecard, Team};
use itertools::Itertools;

/// Approximate budget before a snippet is split across documents. The
/// upstream source counts tokens; we approximate with characters, since
/// snippets are short, factual, line-oriented text and the two track closely
/// enough at this scale.
const CHUNK_CHAR_BUDGET: usize = 4000;

pub trait Normalizable: Sized {
    const KIND: DocumentKind;

    fn normalize(raw: &serde_json::Value) -> Result<Self, CoreError>;
    fn entity_id(&self) -> &str;
    fn snippet(&self) -> String;
}

fn require_str<'a>(raw: &'a serde_json::Value, entity: &'static str, field: &'static str) -> Result<&'a str, CoreError> {
    raw.get(field)
        .and_then(|v| v.as_str())
        .ok_or(CoreError::MissingField { entity, field })
}

impl Normalizable for Team {
    const KIND: DocumentKind = DocumentKind::Team;

    fn normalize(raw: &serde_json::Value) -> Result<Self, CoreError> {
        let id = require_str(raw, "team", "id")?.to_string();
        let name = require_str(raw, "team", "name")?.to_string();
        let grade = raw.get("grade").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let season = raw.get("season").and_then(|v| v.as_str()).unwrap_or("").to_string();
        Ok(Team {
            id,
            name,
            grade,
            season,
            players: None,
        })
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn snippet(&self) -> String {
        let mut lines = vec![format!("Team: {}", self.name), format!("Grade: {}", self.grade)];
        if let Some(players) = &self.players {
            let captain = players.iter().find(|p| p.is_captain).map(|p| p.name.as_str());
            let vice = players.iter().find(|p| p.is_vice_captain).map(|p| p.name.as_str());
            let keeper = players.iter().find(|p| p.is_wicket_keeper).map(|p| p.name.as_str());
            lines.push(format!("Captain: {}", captain.unwrap_or("unknown")));
            lines.push(format!("Vice-captain: {}", vice.unwrap_or("unknown")));
            lines.push(format!("Wicket-keeper: {}", keeper.unwrap_or("unknown")));
            lines.push(format!("Players: {}", players.len()));
        }
        lines.join("\n")
    }
}

impl Normalizable for Fixture {
    const KIND: DocumentKind = DocumentKind::Fixture;

    fn normalize(raw: &serde_json::Value) -> Result<Self, CoreError> {
        let id = require_str(raw, "fixture", "id")?.to_string();
        let home_team_id = require_str(raw, "fixture", "home_team_id")?.to_string();
        let home_team_name = require_str(raw, "fixture", "home_team_name")?.to_string();
        let away_team_id = require_str(raw, "fixture", "away_team_id")?.to_string();
        let away_team_name = require_str(raw, "fixture", "away_team_name")?.to_string();
        let scheduled_start_raw = require_str(raw, "fixture", "scheduled_start")?;
        let scheduled_start = chrono::DateTime::parse_from_rfc3339(scheduled_start_raw).map_err(|e| CoreError::Malformed {
            entity: "fixture",
            reason: format!("invalid scheduled_start `{scheduled_start_raw}`: {e}"),
        })?;
        let venue = raw.get("venue").and_then(|v| v.as_str()).map(str::to_string);
        let grade = raw.get("grade").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let status_raw = raw.get("status").and_then(|v| v.as_str()).unwrap_or("scheduled");
        let status = match status_raw {
            "in_progress" => FixtureStatus::InProgress,
            "completed" => FixtureStatus::Completed,
            "cancelled" => FixtureStatus::Cancelled,
            _ => FixtureStatus::Scheduled,
        };
        let result = raw.get("result").and_then(|v| v.as_str()).map(str::to_string);

        Ok(Fixture {
            id,
            home_team_id,
            home_team_name,
            away_team_id,
            away_team_name,
            scheduled_start,
            venue,
            grade,
            status,
            result,
        })
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn snippet(&self) -> String {
        let mut lines = vec![
            format!("Fixture: {} vs {}", self.home_team_name, self.away_team_name),
            format!("Date: {}", self.scheduled_start.format("%Y-%m-%d %H:%M")),
            format!("Status: {}", self.status),
        ];
        if let Some(venue) = &self.venue {
            lines.push(format!("Venue: {venue}"));
        }
        lines.push(format!("Grade: {}", self.grade));
        if let Some(result) = &self.result {
            lines.push(format!("Result: {result}"));
        }
        lines.join("\n")
    }
}

impl Normalizable for Ladder {
    const KIND: DocumentKind = DocumentKind::Ladder;

    fn normalize(raw: &serde_json::Value) -> Result<Self, CoreError> {
        let grade_id = require_str(raw, "ladder", "grade_id")?.to_string();
        let grade_name = raw.get("grade_name").and_then(|v| v.as_str()).unwrap_or(&grade_id).to_string();
        let season_id = require_str(raw, "ladder", "season_id")?.to_string();
        let entries_raw = raw
            .get("entries")
            .and_then(|v| v.as_array())
            .ok_or(CoreError::MissingField {
                entity: "ladder",
                field: "entries",
            })?;

        let entries = entries_raw
            .iter()
            .map(|e| {
                Ok(crate::model::LadderEntry {
                    position: e.get("position").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    team_id: e.get("team_id").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    team_name: e.get("team_name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    played: e.get("played").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    won: e.get("won").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    lost: e.get("lost").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    drawn: e.get("drawn").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    tied: e.get("tied").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    points: e.get("points").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    percentage: e.get("percentage").and_then(|v| v.as_f64()),
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(Ladder {
            grade_id,
            grade_name,
            season_id,
            entries,
        })
    }

    fn entity_id(&self) -> &str {
        &self.grade_id
    }

    fn snippet(&self) -> String {
        let mut lines = vec![
            format!("Ladder: {}", self.grade_name),
            format!("Season: {}", self.season_id),
            format!("Teams: {}", self.entries.len()),
        ];
        let ranked = self.entries.iter().sorted_by_key(|e| e.position);
        for entry in ranked {
            lines.push(format!("{}. {} - {} points", entry.position, entry.team_name, entry.points));
        }
        lines.join("\n")
    }
}

impl Normalizable for Scorecard {
    const KIND: DocumentKind = DocumentKind::Scorecard;

    fn normalize(raw: &serde_json::Value) -> Result<Self, CoreError> {
        let fixture_id = require_str(raw, "scorecard", "fixture_id")?.to_string();
        let date = raw.get("date").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let status_raw = raw.get("status").and_then(|v| v.as_str()).unwrap_or("completed");
        let status = match status_raw {
            "in_progress" => FixtureStatus::InProgress,
            "scheduled" => FixtureStatus::Scheduled,
            "cancelled" => FixtureStatus::Cancelled,
            _ => FixtureStatus::Completed,
        };
        let result = raw.get("result").and_then(|v| v.as_str()).map(str::to_string);
        let home = parse_team_scorecard(raw.get("home").ok_or(CoreError::MissingField {
            entity: "scorecard",
            field: "home",
        })?)?;
        let away = parse_team_scorecard(raw.get("away").ok_or(CoreError::MissingField {
            entity: "scorecard",
            field: "away",
        })?)?;

        Ok(Scorecard {
            fixture_id,
            date,
            status,
            result,
            home,
            away,
        })
    }

    fn entity_id(&self) -> &str {
        &self.fixture_id
    }

    fn snippet(&self) -> String {
        let mut lines = vec![
            format!("Match: {} vs {}", self.home.team_name, self.away.team_name),
            format!("Date: {}", self.date),
            format!("Status: {}", self.status),
        ];
        if let Some(result) = &self.result {
            lines.push(format!("Result: {result}"));
        }
        lines.push(format!(
            "{}: {}/{} ({} overs)",
            self.home.team_name, self.home.total_runs, self.home.wickets_lost, self.home.overs
        ));
        lines.push(format!(
            "{}: {}/{} ({} overs)",
            self.away.team_name, self.away.total_runs, self.away.wickets_lost, self.away.overs
        ));
        lines.join("\n")
    }
}

fn parse_team_scorecard(raw: &serde_json::Value) -> Result<crate::model::TeamScorecard, CoreError> {
    let team_id = raw.get("team_id").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let team_name = raw.get("team_name").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let total_runs = raw.get("total_runs").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let wickets_lost = raw.get("wickets_lost").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let overs = raw.get("overs").and_then(|v| v.as_str()).unwrap_or("0.0").to_string();
    let extras = raw.get("extras").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let batting = raw
        .get("batting")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .map(|b| crate::model::PlayerBattingStats {
                    player_name: b.get("player_name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    runs: b.get("runs").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    balls_faced: b.get("balls_faced").and_then(|v| v.as_u64()).map(|v| v as u32),
                    is_out: b.get("is_out").and_then(|v| v.as_bool()).unwrap_or(true),
                })
                .collect()
        })
        .unwrap_or_default();
    let bowling = raw
        .get("bowling")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .map(|b| crate::model::PlayerBowlingStats {
                    player_name: b.get("player_name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    overs: b.get("overs").and_then(|v| v.as_str()).unwrap_or("0.0").to_string(),
                    runs_conceded: b.get("runs_conceded").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    wickets: b.get("wickets").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(crate::model::TeamScorecard {
        team_id,
        team_name,
        total_runs,
        wickets_lost,
        overs,
        extras,
        batting,
        bowling,
    })
}

impl Normalizable for Roster {
    const KIND: DocumentKind = DocumentKind::Roster;

    fn normalize(raw: &serde_json::Value) -> Result<Self, CoreError> {
        let team_id = require_str(raw, "roster", "team_id")?.to_string();
        let team_name = raw.get("team_name").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let as_of_raw = raw.get("as_of").and_then(|v| v.as_str());
        let as_of = match as_of_raw {
            Some(s) => chrono::DateTime::parse_from_rfc3339(s).map_err(|e| CoreError::Malformed {
                entity: "roster",
                reason: format!("invalid as_of `{s}`: {e}"),
            })?,
            None => chrono::DateTime::parse_from_rfc3339("1970-01-01T00:00:00+00:00").unwrap(),
        };
        let players_raw = raw.get("players").and_then(|v| v.as_array()).ok_or(CoreError::MissingField {
            entity: "roster",
            field: "players",
        })?;
        let players = players_raw
            .iter()
            .map(parse_player)
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(Roster {
            team_id,
            team_name,
            players,
            as_of,
        })
    }

    fn entity_id(&self) -> &str {
        &self.team_id
    }

    fn snippet(&self) -> String {
        let captain = self.players.iter().find(|p| p.is_captain).map(|p| p.name.as_str());
        let vice = self.players.iter().find(|p| p.is_vice_captain).map(|p| p.name.as_str());
        let keeper = self.players.iter().find(|p| p.is_wicket_keeper).map(|p| p.name.as_str());
        vec![
            format!("Roster: {}", self.team_name),
            format!("Captain: {}", captain.unwrap_or("unknown")),
            format!("Vice-captain: {}", vice.unwrap_or("unknown")),
            format!("Wicket-keeper: {}", keeper.unwrap_or("unknown")),
            format!("Players: {}", self.players.len()),
        ]
        .join("\n")
    }
}

fn parse_player(raw: &serde_json::Value) -> Result<crate::model::Player, CoreError> {
    let id = require_str(raw, "player", "id")?.to_string();
    let name = require_str(raw, "player", "name")?.to_string();
    Ok(crate::model::Player {
        id,
        name,
        role: raw.get("role").and_then(|v| v.as_str()).map(str::to_string),
        jersey_number: raw.get("jersey_number").and_then(|v| v.as_u64()).map(|v| v as u32),
        is_captain: raw.get("is_captain").and_then(|v| v.as_bool()).unwrap_or(false),
        is_vice_captain: raw.get("is_vice_captain").and_then(|v| v.as_bool()).unwrap_or(false),
        is_wicket_keeper: raw.get("is_wicket_keeper").and_then(|v| v.as_bool()).unwrap_or(false),
        date_of_birth: raw.get("date_of_birth").and_then(|v| v.as_str()).map(str::to_string),
        batting_style: raw.get("batting_style").and_then(|v| v.as_str()).map(str::to_string),
        bowling_style: raw.get("bowling_style").and_then(|v| v.as_str()).map(str::to_string),
        contact: None,
    })
}

/// Splits an oversized snippet on line boundaries into documents sharing an
/// id prefix, per the chunking policy. In practice snippets run well under
/// 30 lines and this returns a single chunk.
pub fn chunk_snippet(id_prefix: &str, text: &str) -> Vec<(String, String)> {
    if text.len() <= CHUNK_CHAR_BUDGET {
        return vec![(id_prefix.to_string(), text.to_string())];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut chunk_index = 0usize;
    for line in text.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > CHUNK_CHAR_BUDGET {
            chunks.push((format!("{id_prefix}_chunk_{chunk_index}"), std::mem::take(&mut current)));
            chunk_index += 1;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push((format!("{id_prefix}_chunk_{chunk_index}"), current));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_snippet_matches_expected_shape() {
        let raw = serde_json::json!({
            "id": "f1",
            "home_team_id": "t1",
            "home_team_name": "Caroline Springs Blue U10",
            "away_team_id": "t2",
            "away_team_name": "Melbourne CC U10",
            "scheduled_start": "2025-03-15T10:00:00+11:00",
            "venue": "CSCG",
            "grade": "Under-10",
            "status": "scheduled",
        });
        let fixture = Fixture::normalize(&raw).unwrap();
        let snippet = fixture.snippet();
        assert!(snippet.contains("Fixture: Caroline Springs Blue U10 vs Melbourne CC U10"));
        assert!(snippet.contains("Venue: CSCG"));
        assert!(snippet.contains("Status: scheduled"));
    }

    #[test]
    fn ladder_snippet_lists_entries_in_position_order() {
        let raw = serde_json::json!({
            "grade_id": "g1",
            "grade_name": "Under-10",
            "season_id": "s1",
            "entries": [
                {"position": 3, "team_id": "t1", "team_name": "Caroline Springs Blue U10",
                 "played": 5, "won": 4, "lost": 1, "drawn": 0, "tied": 0, "points": 8},
            ],
        });
        let ladder = Ladder::normalize(&raw).unwrap();
        let snippet = ladder.snippet();
        assert!(snippet.contains("3. Caroline Springs Blue U10 - 8 points"));
    }

    #[test]
    fn chunk_snippet_returns_single_chunk_under_budget() {
        let chunks = chunk_snippet("fixture_f1", "Fixture: A vs B\nDate: 2025-01-01");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0, "fixture_f1");
    }

    #[test]
    fn chunk_snippet_splits_oversized_text_on_line_boundaries() {
        let line = "x".repeat(100);
        let text = std::iter::repeat(line).take(80).collect::<Vec<_>>().join("\n");
        let chunks = chunk_snippet("ladder_g1", &text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].0, "ladder_g1_chunk_0");
        for (_, chunk_text) in &chunks {
            assert!(chunk_text.len() <= CHUNK_CHAR_BUDGET);
        }
    }
}
