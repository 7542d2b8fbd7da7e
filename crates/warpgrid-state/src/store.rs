//! StateStore — redb-backed state persistence for WarpGrid.
//!
//! Provides typed operations over instance records and instance faults.
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        txn.open_table(INSTANCE_FAULTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Instances ──────────────────────────────────────────────────

    /// Insert or replace an instance record.
    pub fn put_instance(&self, record: &InstanceRecord) -> StateResult<()> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Encode))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(uuid = %key, "instance stored");
        Ok(())
    }

    /// Get an instance by UUID.
    pub fn get_instance(&self, uuid: &str) -> StateResult<Option<InstanceRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        match table.get(uuid).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: InstanceRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Decode))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all instance records.
    pub fn list_instances(&self) -> StateResult<Vec<InstanceRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: InstanceRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Decode))?;
            results.push(record);
        }
        Ok(results)
    }

    /// Apply `updates` to an instance and return `(old, new)`.
    ///
    /// The read and the write happen inside a single write transaction, so
    /// `old` is exactly the record that `new` replaced. Fails with
    /// [`StateError::NotFound`] if the UUID is unknown; nothing is written
    /// in that case.
    pub fn update_and_get_original(
        &self,
        uuid: &str,
        updates: &InstanceUpdates,
    ) -> StateResult<(InstanceRecord, InstanceRecord)> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let (old, new) = {
            let mut table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            let old: InstanceRecord = match table.get(uuid).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Decode))?
                }
                None => return Err(StateError::NotFound(uuid.to_string())),
            };

            let mut new = old.clone();
            updates.apply(&mut new, epoch_secs());
            let value = serde_json::to_vec(&new).map_err(map_err!(Encode))?;
            table
                .insert(uuid, value.as_slice())
                .map_err(map_err!(Write))?;
            (old, new)
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%uuid, from = %old.vm_state, to = %new.vm_state, "instance updated");
        Ok((old, new))
    }

    /// Delete an instance and every fault recorded against it.
    /// Returns true if the instance existed.
    pub fn delete_instance(&self, uuid: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut instances = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            existed = instances.remove(uuid).map_err(map_err!(Write))?.is_some();

            let mut faults = txn.open_table(INSTANCE_FAULTS).map_err(map_err!(Table))?;
            let keys: Vec<String> = scan_faults(&faults, uuid)?
                .into_iter()
                .map(|(key, _)| key)
                .collect();
            for key in &keys {
                faults.remove(key.as_str()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%uuid, existed, "instance deleted");
        Ok(existed)
    }

    // ── Faults ─────────────────────────────────────────────────────

    /// Append a fault to an instance's history. Returns the fault's key.
    ///
    /// The instance itself does not have to exist; faults outlive the
    /// record they describe until [`StateStore::delete_instance`] runs.
    pub fn add_fault(&self, fault: &InstanceFault) -> StateResult<String> {
        let value = serde_json::to_vec(fault).map_err(map_err!(Encode))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let key = {
            let mut table = txn.open_table(INSTANCE_FAULTS).map_err(map_err!(Table))?;
            let existing = scan_faults(&table, &fault.instance_uuid)?.len();
            let seq = u32::try_from(existing).map_err(map_err!(Write))?;
            let key = fault_key(&fault.instance_uuid, seq);
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            key
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, code = fault.code, "instance fault recorded");
        Ok(key)
    }

    /// List the faults recorded for an instance, oldest first.
    pub fn list_faults_for_instance(&self, uuid: &str) -> StateResult<Vec<InstanceFault>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(INSTANCE_FAULTS).map_err(map_err!(Table))?;
        scan_faults(&table, uuid)?
            .into_iter()
            .map(|(_, value)| {
                serde_json::from_slice::<InstanceFault>(&value).map_err(map_err!(Decode))
            })
            .collect()
    }
}

/// Raw `(key, value)` fault rows owned by exactly `uuid`, in key order.
///
/// Starts at `{uuid}:` and stops at the first key outside that prefix.
/// Keys inside the prefix can still belong to a longer UUID (`a` vs `a:b`),
/// so ownership is checked on the parsed key.
fn scan_faults<T>(table: &T, uuid: &str) -> StateResult<Vec<(String, Vec<u8>)>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let prefix = format!("{uuid}:");
    let mut rows = Vec::new();
    for entry in table.range(prefix.as_str()..).map_err(map_err!(Read))? {
        let (key, value) = entry.map_err(map_err!(Read))?;
        let key = key.value();
        if !key.starts_with(&prefix) {
            break;
        }
        if fault_key_owner(key) == Some(uuid) {
            rows.push((key.to_string(), value.value().to_vec()));
        }
    }
    Ok(rows)
}

/// Current Unix epoch in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
