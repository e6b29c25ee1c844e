//! brandops-core library.
//!
//! The bulk operations engine behind the brand-strategy catalogs: pick a set
//! of items ([`selection`]), check the request ([`validate`]), run an action
//! over every target ([`executor`]) and reverse it later ([`ledger`]).
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at the library seams, `anyhow::Result`
//!   for config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod action;
pub mod config;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod model;
pub mod record;
pub mod selection;
pub mod validate;

pub use action::{ActionKind, ActionParams, BulkAction};
pub use executor::{CancelToken, Executor, OperationResult, OperationStatus, Progress};
pub use ledger::{LedgerEntry, UndoLedger, UndoPayload};
pub use model::item::{Identified, Item};
pub use record::{MemoryStore, RecordError, SystemOfRecord};
pub use selection::{Selection, SelectionState};
pub use validate::{ValidationError, available_actions, validate, validate_action};
