//! warpgrid-state — embedded instance record store for WarpGrid.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for scheduled instance records and the faults recorded against
//! them when scheduling fails.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Instances are keyed by UUID; faults use the composite key
//! `{instance_uuid}:{seq}` so a prefix scan returns one instance's history
//! in insertion order.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across threads.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{StateStore, epoch_secs};
pub use types::*;
