//! Dispatch Draft API Library
//!
//! This library provides the core functionality for the dispatch draft
//! service backing the delivery operations dashboard: completion evaluation,
//! timeframe reconciliation, quote computation, and the upstream courier API
//! client.
//!
//! # Modules
//!
//! - `completion`: Completion evaluation for draft-order sub-forms.
//! - `config`: Configuration management.
//! - `courier_client`: Upstream courier platform API client.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `quote`: Quote decision and rendering.
//! - `reconcile`: Timeframe reconciliation state machine.
//! - `selector`: Preferred-service selection.
//! - `slot_cache`: Validated slot-availability cache entries.
//! - `workflow`: Reconcile/quote/submit orchestration.

pub mod completion;
pub mod config;
pub mod courier_client;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod quote;
pub mod reconcile;
pub mod selector;
pub mod slot_cache;
pub mod workflow;
