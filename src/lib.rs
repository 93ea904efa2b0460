//! Pipeline pressure integrity service.
//!
//! Monitors pipeline pressure telemetry against regulatory MAOP limits
//! and records every reading in a tamper-evident hash chain. Two pieces
//! carry the real invariants:
//!
//! - [`chain`] — a blockchain-style linked-hash ledger over the stored
//!   readings; any retroactive edit to a sealed field breaks the chain at
//!   that record and is caught by a single verification pass.
//! - [`alert::transients`] — a trailing-window classifier that separates
//!   momentary pressure spikes from sustained threshold breaches, so the
//!   alerting layer doesn't page on nuisance transients.
//!
//! Persistence is a collaborator behind the [`store::ReadingStore`]
//! trait; [`db`] provides the postgres implementation and
//! [`store::InMemoryStore`] serves tests and offline replay.

pub mod alert;
pub mod chain;
pub mod db;
pub mod logging;
pub mod model;
pub mod segments;
pub mod store;
