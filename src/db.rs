/// Postgres-backed reading store.
///
/// Production implementation of the `ReadingStore` contract against a
/// `readings` table. Connection configuration comes from the environment
/// (`DATABASE_URL`, loaded via dotenv) so deployments and local
/// development share one code path.
///
/// # Race detection
/// The hash engine serializes inserts through its own lock, but this
/// process is not necessarily the only writer. `insert_record` therefore
/// takes a table-level lock, re-reads the chain tail under it, and
/// rejects the insert with `RaceDetected` if the tail moved since
/// `fetch_tail_digest` — a second writer chaining to the same
/// predecessor would otherwise fork the chain silently. The caller can
/// retry from a fresh tail read.
///
/// The table lock is what makes the re-read sound. Under READ COMMITTED
/// a row-level `FOR UPDATE` re-read is not: an overlapping writer's
/// freshly committed row is invisible to the blocked statement's
/// snapshot, so both writers would see the old tail and fork the chain
/// anyway. `LOCK TABLE … IN SHARE ROW EXCLUSIVE MODE` queues overlapping
/// inserts, and the SELECT issued after the lock is granted runs on a
/// fresh snapshot that sees whatever committed while waiting.

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls, Row};

use crate::model::{NewReading, PipelineError, Reading};
use crate::store::ReadingStore;

const READING_COLUMNS: &str = "id, timestamp, segment_id, sensor_id, pressure_psig, \
     maop_psig, recorded_by, data_source, data_quality, notes, hash_signature";

pub struct PgReadingStore {
    client: Client,
    /// Tail digest as of the last `fetch_tail_digest` call, used to
    /// detect a concurrent writer at insert time.
    last_seen_tail: Option<String>,
}

impl PgReadingStore {
    /// Connects using `DATABASE_URL` from the environment (a `.env` file
    /// is honored in development).
    pub fn connect_from_env() -> Result<Self, PipelineError> {
        dotenv::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| PipelineError::Store("DATABASE_URL is not set".to_string()))?;
        Self::connect(&url)
    }

    pub fn connect(url: &str) -> Result<Self, PipelineError> {
        let client = Client::connect(url, NoTls).map_err(store_err)?;
        Ok(PgReadingStore { client, last_seen_tail: None })
    }

    /// Creates the `readings` table if it does not exist. Id assignment
    /// is a bigserial identity column — monotonically assigned, never
    /// reused — which is what makes ascending id order the chain order.
    pub fn ensure_schema(&mut self) -> Result<(), PipelineError> {
        self.client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS readings (
                    id              BIGSERIAL PRIMARY KEY,
                    timestamp       TIMESTAMPTZ NOT NULL,
                    segment_id      TEXT NOT NULL,
                    sensor_id       INT NOT NULL,
                    pressure_psig   DOUBLE PRECISION NOT NULL,
                    maop_psig       DOUBLE PRECISION NOT NULL,
                    recorded_by     TEXT NOT NULL,
                    data_source     TEXT NOT NULL,
                    data_quality    TEXT NOT NULL,
                    notes           TEXT,
                    hash_signature  TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS readings_segment_time_idx
                    ON readings (segment_id, timestamp);",
            )
            .map_err(store_err)
    }
}

fn store_err(e: postgres::Error) -> PipelineError {
    PipelineError::Store(e.to_string())
}

/// Fixed, statically-typed row mapping — column order matches
/// `READING_COLUMNS`, no runtime schema discovery.
fn row_to_reading(row: &Row) -> Reading {
    Reading {
        id: row.get(0),
        timestamp: row.get::<_, DateTime<Utc>>(1),
        segment_id: row.get(2),
        sensor_id: row.get(3),
        pressure_psig: row.get(4),
        maop_psig: row.get(5),
        recorded_by: row.get(6),
        data_source: row.get(7),
        data_quality: row.get(8),
        notes: row.get(9),
        hash_signature: row.get(10),
    }
}

impl ReadingStore for PgReadingStore {
    fn fetch_tail_digest(&mut self) -> Result<String, PipelineError> {
        let row = self
            .client
            .query_opt(
                "SELECT hash_signature FROM readings ORDER BY id DESC LIMIT 1",
                &[],
            )
            .map_err(store_err)?;

        let tail = row.map(|r| r.get::<_, String>(0)).unwrap_or_default();
        self.last_seen_tail = Some(tail.clone());
        Ok(tail)
    }

    fn insert_record(
        &mut self,
        reading: &NewReading,
        digest: &str,
    ) -> Result<i64, PipelineError> {
        let expected_tail = self.last_seen_tail.take();

        let mut tx = self.client.transaction().map_err(store_err)?;

        // Serialize against every other writer before looking at the
        // tail. See the module doc: a row-level FOR UPDATE re-read is
        // snapshot-blind to an overlapping writer's commit, so the
        // exclusion has to happen at table granularity, before the read.
        tx.batch_execute("LOCK TABLE readings IN SHARE ROW EXCLUSIVE MODE")
            .map_err(store_err)?;

        // Re-read the tail under the lock. If another writer appended
        // since our tail read, this digest chains to a stale predecessor
        // and must not be persisted.
        if let Some(expected) = expected_tail {
            let current: String = tx
                .query_opt(
                    "SELECT hash_signature FROM readings ORDER BY id DESC LIMIT 1",
                    &[],
                )
                .map_err(store_err)?
                .map(|r| r.get(0))
                .unwrap_or_default();

            if current != expected {
                return Err(PipelineError::RaceDetected { expected_tail: expected });
            }
        }

        let row = tx
            .query_one(
                "INSERT INTO readings
                    (timestamp, segment_id, sensor_id, pressure_psig, maop_psig,
                     recorded_by, data_source, data_quality, notes, hash_signature)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                 RETURNING id",
                &[
                    &reading.timestamp,
                    &reading.segment_id,
                    &reading.sensor_id,
                    &reading.pressure_psig,
                    &reading.maop_psig,
                    &reading.recorded_by,
                    &reading.data_source,
                    &reading.data_quality,
                    &reading.notes,
                    &digest,
                ],
            )
            .map_err(store_err)?;

        tx.commit().map_err(store_err)?;
        Ok(row.get(0))
    }

    fn fetch_all_ordered(&mut self) -> Result<Vec<Reading>, PipelineError> {
        let query = format!("SELECT {} FROM readings ORDER BY id ASC", READING_COLUMNS);
        let rows = self.client.query(&query, &[]).map_err(store_err)?;
        Ok(rows.iter().map(row_to_reading).collect())
    }

    fn update_digest(&mut self, id: i64, digest: &str) -> Result<(), PipelineError> {
        let updated = self
            .client
            .execute(
                "UPDATE readings SET hash_signature = $1 WHERE id = $2",
                &[&digest, &id],
            )
            .map_err(store_err)?;

        if updated == 0 {
            return Err(PipelineError::Store(format!("no reading with id {}", id)));
        }
        Ok(())
    }

    fn fetch_segment_history(
        &mut self,
        segment_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, PipelineError> {
        let query = format!(
            "SELECT {} FROM readings
             WHERE segment_id = $1 AND timestamp >= $2 AND timestamp <= $3
             ORDER BY timestamp ASC",
            READING_COLUMNS
        );
        let rows = self
            .client
            .query(&query, &[&segment_id, &start, &end])
            .map_err(store_err)?;
        Ok(rows.iter().map(row_to_reading).collect())
    }
}

// ---------------------------------------------------------------------------
// Integration Tests - Live Database
// ---------------------------------------------------------------------------
//
// These tests run against a real postgres instance and are marked
// #[ignore] so they don't run during normal CI builds. To run them:
//
//   DATABASE_URL=postgres://... cargo test -- --ignored pg_store
