//! redb table definitions for the WarpGrid state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).

use redb::TableDefinition;

/// Instance records keyed by `{uuid}`.
pub const INSTANCES: TableDefinition<&str, &[u8]> = TableDefinition::new("instances");

/// Instance faults keyed by `{instance_uuid}:{seq:010}`.
pub const INSTANCE_FAULTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("instance_faults");
