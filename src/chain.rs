/// Tamper-evident hash chain for pressure readings.
///
/// Every stored reading carries a SHA-256 digest computed over its own
/// fields plus the digest of the immediately preceding reading, forming a
/// blockchain-style linked-hash list over the whole `Readings` table.
/// Changing any hashed field of any historical record invalidates that
/// record's digest and, transitively, every digest after it — so a single
/// ascending verification pass detects any retroactive edit.
///
/// The chain is global, not per-segment: readings from all segments share
/// one chain ordered by insertion id. Cross-segment insertion order is
/// deliberately part of the tamper-evidence surface.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Mutex;

use crate::model::{NewReading, PipelineError, Reading};
use crate::store::ReadingStore;

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Field delimiter in the hash input. Segment ids, sensor ids, and
/// provenance tags never contain `|`; see `segments` registry tests.
const HASH_DELIMITER: char = '|';

/// The one canonical timestamp form used in hash inputs: RFC 3339 at
/// seconds precision with a `Z` suffix, e.g. `2026-02-07T10:00:00Z`.
///
/// Timestamps arrive from SCADA as both structured datetimes and strings;
/// everything is normalized through here before hashing so the same
/// instant always contributes the same bytes.
pub fn canonical_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Computes the chained SHA-256 digest for one reading.
///
/// The hash input is exactly these fields, in this order, joined by `|`:
/// canonical timestamp, segment id, sensor id, pressure, MAOP, recorded-by,
/// data source, previous digest (empty string for the chain's first
/// record). `data_quality` and `notes` are annotation fields and are
/// deliberately outside the seal.
///
/// Numeric fields use Rust's natural `Display` formatting. The same
/// formatting runs at seal time and verify time, so a stored f64 always
/// reproduces its original hash input byte-for-byte.
///
/// Pure function: no I/O, no ordering dependency beyond the explicit
/// `previous_hash` argument. Returns 64 lowercase hex characters.
pub fn reading_hash(
    timestamp: DateTime<Utc>,
    segment_id: &str,
    sensor_id: i32,
    pressure_psig: f64,
    maop_psig: f64,
    recorded_by: &str,
    data_source: &str,
    previous_hash: &str,
) -> String {
    let input = format!(
        "{ts}{d}{seg}{d}{sen}{d}{p}{d}{m}{d}{rec}{d}{src}{d}{prev}",
        ts = canonical_timestamp(timestamp),
        seg = segment_id,
        sen = sensor_id,
        p = pressure_psig,
        m = maop_psig,
        rec = recorded_by,
        src = data_source,
        prev = previous_hash,
        d = HASH_DELIMITER,
    );

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn hash_new_reading(reading: &NewReading, previous_hash: &str) -> String {
    reading_hash(
        reading.timestamp,
        &reading.segment_id,
        reading.sensor_id,
        reading.pressure_psig,
        reading.maop_psig,
        &reading.recorded_by,
        &reading.data_source,
        previous_hash,
    )
}

fn hash_stored_reading(reading: &Reading, previous_hash: &str) -> String {
    reading_hash(
        reading.timestamp,
        &reading.segment_id,
        reading.sensor_id,
        reading.pressure_psig,
        reading.maop_psig,
        &reading.recorded_by,
        &reading.data_source,
        previous_hash,
    )
}

/// A stored record that has lost required fields (empty segment id, or a
/// signature that is not 64 lowercase hex chars) cannot have been produced
/// by this engine. Verification treats it as a chain break at that id
/// rather than a crash.
fn is_well_formed(reading: &Reading) -> bool {
    !reading.segment_id.is_empty()
        && reading.hash_signature.len() == 64
        && reading
            .hash_signature
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

// ---------------------------------------------------------------------------
// Verification report
// ---------------------------------------------------------------------------

/// Outcome of a full-chain verification pass.
///
/// A broken chain is the *expected, reportable result* of verification,
/// not an error — the forensic payload (earliest broken id plus the count
/// of records verified before it) is always carried in full, never
/// reduced to a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub is_valid: bool,
    /// Id of the earliest record whose stored digest does not match its
    /// recomputed digest. `None` when the chain is intact.
    pub first_broken_id: Option<i64>,
    /// Number of records verified strictly before the break (equal to the
    /// chain length when the chain is intact).
    pub records_verified: usize,
}

impl ChainVerification {
    fn intact(records_verified: usize) -> Self {
        ChainVerification { is_valid: true, first_broken_id: None, records_verified }
    }

    fn broken_at(id: i64, records_verified: usize) -> Self {
        ChainVerification { is_valid: false, first_broken_id: Some(id), records_verified }
    }
}

/// Prints a verification result in the operator console format.
pub fn print_summary(result: &ChainVerification) {
    println!("═══════════════════════════════════════════════════════════");
    println!("HASH CHAIN VERIFICATION");
    println!("═══════════════════════════════════════════════════════════");
    match result.first_broken_id {
        None => {
            println!("✓ CHAIN VALID - all {} readings verified", result.records_verified);
            println!("  Data integrity confirmed - no tampering detected");
        }
        Some(id) => {
            println!("✗ CHAIN BROKEN at ReadingID {}", id);
            println!("  {} readings verified before the break", result.records_verified);
            println!("  FORENSIC ALERT: stored data no longer matches its seals");
        }
    }
    println!("═══════════════════════════════════════════════════════════");
}

// ---------------------------------------------------------------------------
// Hash chain engine
// ---------------------------------------------------------------------------

/// The hash engine: seals new readings into the chain, verifies the whole
/// chain, and supports administrative rebuild.
///
/// The store lives behind a `Mutex` so that `insert` is serialized — two
/// concurrent inserts racing on "read tail, then write" would both chain
/// to the same predecessor and silently fork the chain. This lock is the
/// one correctness-critical concurrency control point in the whole core.
/// `rebuild` holds the same lock for its full duration, since it rewrites
/// the basis every insert depends on.
pub struct HashChain<S: ReadingStore> {
    store: Mutex<S>,
}

impl<S: ReadingStore> HashChain<S> {
    pub fn new(store: S) -> Self {
        HashChain { store: Mutex::new(store) }
    }

    /// Consumes the engine and returns the underlying store.
    pub fn into_store(self) -> S {
        match self.store.into_inner() {
            Ok(store) => store,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_store(&self) -> Result<std::sync::MutexGuard<'_, S>, PipelineError> {
        self.store
            .lock()
            .map_err(|_| PipelineError::Store("store lock poisoned".to_string()))
    }

    /// Seals and persists one reading as a single locked unit:
    /// read the current tail digest, chain the new reading to it, and
    /// insert reading + digest atomically. Returns the store-assigned id
    /// and the new digest (the new chain tail).
    pub fn insert(&self, reading: &NewReading) -> Result<(i64, String), PipelineError> {
        if reading.maop_psig <= 0.0 {
            return Err(PipelineError::InvalidMaop {
                segment_id: reading.segment_id.clone(),
                maop_psig: reading.maop_psig,
            });
        }

        let mut store = self.lock_store()?;
        let previous_hash = store.fetch_tail_digest()?;
        let digest = hash_new_reading(reading, &previous_hash);
        let id = store.insert_record(reading, &digest)?;
        Ok((id, digest))
    }

    /// Walks the whole chain in ascending id order, recomputing each
    /// record's digest from its stored fields and the running previous
    /// hash, and comparing byte-for-byte against the stored signature.
    ///
    /// Stops at the first mismatch: every downstream digest depends on
    /// the broken one, so one break is enough to declare the whole suffix
    /// untrustworthy. An empty chain is valid with zero records verified.
    ///
    /// Single O(n) pass. Holds the store lock so no insert lands mid-scan.
    pub fn verify(&self) -> Result<ChainVerification, PipelineError> {
        let mut store = self.lock_store()?;
        let readings = store.fetch_all_ordered()?;

        let mut previous_hash = String::new();
        let mut verified = 0usize;

        for reading in &readings {
            if !is_well_formed(reading) {
                return Ok(ChainVerification::broken_at(reading.id, verified));
            }

            let expected = hash_stored_reading(reading, &previous_hash);
            if reading.hash_signature != expected {
                return Ok(ChainVerification::broken_at(reading.id, verified));
            }

            previous_hash = reading.hash_signature.clone();
            verified += 1;
        }

        Ok(ChainVerification::intact(verified))
    }

    /// Recomputes and overwrites every stored digest in ascending id
    /// order, using the same algorithm as `insert`.
    ///
    /// WARNING: destructive administrative operation. A rebuild makes the
    /// chain verify clean regardless of what the stored field values now
    /// say, so it can paper over real tampering if misused. Intended only
    /// for initial backfill or after an authorized correction — never part
    /// of the ordinary request flow. Holds the chain lock exclusively for
    /// its full duration.
    ///
    /// Returns the number of readings updated.
    pub fn rebuild(&self) -> Result<usize, PipelineError> {
        let mut store = self.lock_store()?;
        let readings = store.fetch_all_ordered()?;

        let mut previous_hash = String::new();
        let mut updated = 0usize;

        for reading in &readings {
            let new_hash = hash_stored_reading(reading, &previous_hash);
            store.update_digest(reading.id, &new_hash)?;
            previous_hash = new_hash;
            updated += 1;
        }

        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
