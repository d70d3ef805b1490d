pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod normalize;
pub mod secrets;
pub mod team_names;

pub use document::{Document, DocumentKind, DocumentMetadata};
pub use error::CoreError;
pub use model::{Fixture, FixtureStatus, Ladder, LadderEntry, Player, Roster, Scorecard, Team};
