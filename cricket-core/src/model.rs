//! Typed records produced by the normalizer (§3). All immutable once built:
//! a new provider payload produces a brand new value, never a mutation of one
//! already in hand.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub season: String,
    pub players: Option<Vec<Player>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub jersey_number: Option<u32>,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub is_wicket_keeper: bool,
    pub date_of_birth: Option<String>,
    pub batting_style: Option<String>,
    pub bowling_style: Option<String>,
    /// Only populated in private mode; `None` in public mode regardless of
    /// whether the upstream payload carried it.
    pub contact: Option<PlayerContact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FixtureStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub home_team_id: String,
    pub home_team_name: String,
    pub away_team_id: String,
    pub away_team_name: String,
    pub scheduled_start: DateTime<FixedOffset>,
    pub venue: Option<String>,
    pub grade: String,
    pub status: FixtureStatus,
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderEntry {
    pub position: u32,
    pub team_id: String,
    pub team_name: String,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub drawn: u32,
    pub tied: u32,
    pub points: u32,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    pub grade_id: String,
    pub grade_name: String,
    pub season_id: String,
    pub entries: Vec<LadderEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBattingStats {
    pub player_name: String,
    pub runs: u32,
    pub balls_faced: Option<u32>,
    pub is_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBowlingStats {
    pub player_name: String,
    pub overs: String,
    pub runs_conceded: u32,
    pub wickets: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScorecard {
    pub team_id: String,
    pub team_name: String,
    pub total_runs: u32,
    pub wickets_lost: u32,
    pub overs: String,
    pub extras: u32,
    pub batting: Vec<PlayerBattingStats>,
    pub bowling: Vec<PlayerBowlingStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    pub fixture_id: String,
    pub date: String,
    pub status: FixtureStatus,
    pub result: Option<String>,
    pub home: TeamScorecard,
    pub away: TeamScorecard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub team_id: String,
    pub team_name: String,
    pub players: Vec<Player>,
    pub as_of: DateTime<FixedOffset>,
}
