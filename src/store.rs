/// Reading store adapter contract.
///
/// The hash engine and the transient filter never talk to a database
/// directly — they go through this minimal trait, which is the whole
/// surface the core needs from the relational store: ordered retrieval by
/// insertion sequence, single-row insert returning an identity, and a
/// single-row digest update used only by rebuild.
///
/// Two implementations exist: `db::PgReadingStore` for production, and
/// `InMemoryStore` here for tests and offline development replay.

use chrono::{DateTime, Utc};

use crate::model::{NewReading, PipelineError, Reading};

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

pub trait ReadingStore {
    /// Digest of the most recently inserted reading, or an empty string if
    /// the chain has no records yet.
    fn fetch_tail_digest(&mut self) -> Result<String, PipelineError>;

    /// Persists the reading together with its digest as one atomic record
    /// and returns the store-assigned id. The store must never persist a
    /// reading without a digest — hashing and insertion are one logical
    /// unit from the caller's perspective.
    fn insert_record(&mut self, reading: &NewReading, digest: &str)
        -> Result<i64, PipelineError>;

    /// All readings in ascending id order — the chain walk order.
    fn fetch_all_ordered(&mut self) -> Result<Vec<Reading>, PipelineError>;

    /// Overwrites one record's stored digest. Used only by the privileged
    /// rebuild path.
    fn update_digest(&mut self, id: i64, digest: &str) -> Result<(), PipelineError>;

    /// Same-segment readings with timestamps in `[start, end]` inclusive,
    /// ascending by timestamp. Used by the transient filter to build
    /// trailing windows.
    fn fetch_segment_history(
        &mut self,
        segment_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, PipelineError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Vec-backed store for tests and development replay when no database is
/// available. Ids are assigned sequentially starting at 1, matching the
/// identity-column behavior of the production store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Vec<Reading>,
    next_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore { records: Vec::new(), next_id: 1 }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mutates a stored record in place, bypassing the hash engine.
    ///
    /// This exists so integrity tests can simulate out-of-band tampering
    /// (a direct UPDATE against the database). It must never be called
    /// from production code paths.
    pub fn tamper_with<F>(&mut self, id: i64, mutate: F) -> bool
    where
        F: FnOnce(&mut Reading),
    {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                mutate(record);
                true
            }
            None => false,
        }
    }
}

impl ReadingStore for InMemoryStore {
    fn fetch_tail_digest(&mut self) -> Result<String, PipelineError> {
        Ok(self
            .records
            .last()
            .map(|r| r.hash_signature.clone())
            .unwrap_or_default())
    }

    fn insert_record(
        &mut self,
        reading: &NewReading,
        digest: &str,
    ) -> Result<i64, PipelineError> {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(Reading {
            id,
            timestamp: reading.timestamp,
            segment_id: reading.segment_id.clone(),
            sensor_id: reading.sensor_id,
            pressure_psig: reading.pressure_psig,
            maop_psig: reading.maop_psig,
            recorded_by: reading.recorded_by.clone(),
            data_source: reading.data_source.clone(),
            data_quality: reading.data_quality.clone(),
            notes: reading.notes.clone(),
            hash_signature: digest.to_string(),
        });
        Ok(id)
    }

    fn fetch_all_ordered(&mut self) -> Result<Vec<Reading>, PipelineError> {
        // Records are appended in id order, so no sort is needed.
        Ok(self.records.clone())
    }

    fn update_digest(&mut self, id: i64, digest: &str) -> Result<(), PipelineError> {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.hash_signature = digest.to_string();
                Ok(())
            }
            None => Err(PipelineError::Store(format!("no reading with id {}", id))),
        }
    }

    fn fetch_segment_history(
        &mut self,
        segment_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, PipelineError> {
        let mut history: Vec<Reading> = self
            .records
            .iter()
            .filter(|r| {
                r.segment_id == segment_id && r.timestamp >= start && r.timestamp <= end
            })
            .cloned()
            .collect();
        history.sort_by_key(|r| r.timestamp);
        Ok(history)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewReading;
    use chrono::TimeZone;

    fn reading_at(minute: u32, segment: &str) -> NewReading {
        let ts = Utc.with_ymd_and_hms(2026, 2, 7, 10, minute, 0).unwrap();
        NewReading::scada(ts, segment, 1, 750.0, 1000.0)
    }

    #[test]
    fn test_empty_store_has_empty_tail_digest() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.fetch_tail_digest().unwrap(), "");
    }

    #[test]
    fn test_ids_are_assigned_sequentially_from_one() {
        let mut store = InMemoryStore::new();
        let a = store.insert_record(&reading_at(0, "SEG-01"), "aaa").unwrap();
        let b = store.insert_record(&reading_at(5, "SEG-01"), "bbb").unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_tail_digest_tracks_latest_insert() {
        let mut store = InMemoryStore::new();
        store.insert_record(&reading_at(0, "SEG-01"), "first").unwrap();
        store.insert_record(&reading_at(5, "SEG-01"), "second").unwrap();
        assert_eq!(store.fetch_tail_digest().unwrap(), "second");
    }

    #[test]
    fn test_segment_history_filters_by_segment_and_window() {
        let mut store = InMemoryStore::new();
        store.insert_record(&reading_at(0, "SEG-01"), "a").unwrap();
        store.insert_record(&reading_at(2, "SEG-02"), "b").unwrap();
        store.insert_record(&reading_at(4, "SEG-01"), "c").unwrap();
        store.insert_record(&reading_at(20, "SEG-01"), "d").unwrap();

        let start = Utc.with_ymd_and_hms(2026, 2, 7, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 7, 10, 5, 0).unwrap();
        let history = store.fetch_segment_history("SEG-01", start, end).unwrap();

        assert_eq!(history.len(), 2, "only SEG-01 readings inside the window");
        assert!(history.iter().all(|r| r.segment_id == "SEG-01"));
    }

    #[test]
    fn test_segment_history_window_bounds_are_inclusive() {
        let mut store = InMemoryStore::new();
        store.insert_record(&reading_at(0, "SEG-01"), "a").unwrap();
        store.insert_record(&reading_at(5, "SEG-01"), "b").unwrap();

        let start = Utc.with_ymd_and_hms(2026, 2, 7, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 7, 10, 5, 0).unwrap();
        let history = store.fetch_segment_history("SEG-01", start, end).unwrap();

        assert_eq!(
            history.len(),
            2,
            "readings exactly on the window boundary must be included"
        );
    }

    #[test]
    fn test_update_digest_on_missing_id_is_store_error() {
        let mut store = InMemoryStore::new();
        let result = store.update_digest(99, "deadbeef");
        assert!(matches!(result, Err(PipelineError::Store(_))));
    }

    #[test]
    fn test_tamper_with_mutates_record_in_place() {
        let mut store = InMemoryStore::new();
        store.insert_record(&reading_at(0, "SEG-01"), "a").unwrap();
        let hit = store.tamper_with(1, |r| r.pressure_psig = 999.0);
        assert!(hit);
        assert_eq!(store.fetch_all_ordered().unwrap()[0].pressure_psig, 999.0);
    }
}
