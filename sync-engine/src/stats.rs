use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// The sync engine's per-run counters (§4.4), folded from a stream of
/// [`crate::outcome::EntityOutcome`] values rather than mutated ad hoc.
#[derive(Debug, Default, Serialize)]
pub struct SyncStats {
    pub teams_updated: u64,
    pub fixtures_updated: u64,
    pub ladders_updated: u64,
    pub scorecards_updated: u64,
    pub rosters_updated: u64,
    pub vector_upserts: u64,
    pub dedupe_hits: u64,
    pub gcs_writes: u64,
    pub errors: u64,
}

impl SyncStats {
    pub fn merge(&mut self, other: &SyncStats) {
        self.teams_updated += other.teams_updated;
        self.fixtures_updated += other.fixtures_updated;
        self.ladders_updated += other.ladders_updated;
        self.scorecards_updated += other.scorecards_updated;
        self.rosters_updated += other.rosters_updated;
        self.vector_upserts += other.vector_upserts;
        self.dedupe_hits += other.dedupe_hits;
        self.gcs_writes += other.gcs_writes;
        self.errors += other.errors;
    }
}

/// A lock-free accumulator for use across the worker fan-out; collapsed
/// into a plain [`SyncStats`] once every worker has finished.
#[derive(Default)]
pub struct AtomicSyncStats {
    pub teams_updated: AtomicU64,
    pub fixtures_updated: AtomicU64,
    pub ladders_updated: AtomicU64,
    pub scorecards_updated: AtomicU64,
    pub rosters_updated: AtomicU64,
    pub vector_upserts: AtomicU64,
    pub dedupe_hits: AtomicU64,
    pub gcs_writes: AtomicU64,
    pub errors: AtomicU64,
}

impl AtomicSyncStats {
    pub fn snapshot(&self) -> SyncStats {
        SyncStats {
            teams_updated: self.teams_updated.load(Ordering::Relaxed),
            fixtures_updated: self.fixtures_updated.load(Ordering::Relaxed),
            ladders_updated: self.ladders_updated.load(Ordering::Relaxed),
            scorecards_updated: self.scorecards_updated.load(Ordering::Relaxed),
            rosters_updated: self.rosters_updated.load(Ordering::Relaxed),
            vector_upserts: self.vector_upserts.load(Ordering::Relaxed),
            dedupe_hits: self.dedupe_hits.load(Ordering::Relaxed),
            gcs_writes: self.gcs_writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}
