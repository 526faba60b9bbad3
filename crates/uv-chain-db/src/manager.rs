//! Lazy per-chain sqlite database manager.
//!
//! Reference: spec.md §4.2, §6.3.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use parking_lot::RwLock;
use rusqlite::Connection;
use shared_types::ChainId;

use crate::errors::ChainDbError;

const BUSY_TIMEOUT_MS: u32 = 5_000;
/// ~64 MiB of memory-mapped reads per chain database.
const MMAP_SIZE_BYTES: i64 = 64 * 1024 * 1024;

/// An open handle to one chain's database.
///
/// Exposes the raw connection (behind a mutex: sqlite serializes writers
/// under WAL, but `rusqlite::Connection` itself is only `Send`) so
/// `uv-event-store` can build an `EventStore` on top without this crate
/// depending on the event schema.
pub struct ChainHandle {
    chain_id: ChainId,
    conn: Arc<Mutex<Connection>>,
}

impl ChainHandle {
    /// The chain this handle belongs to.
    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// The shared connection, for building a store on top of this handle.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

/// Storage usage snapshot for one chain database.
///
/// Reference: spec.md §4.2 — `GetDatabaseStats()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total pages currently allocated to the database file.
    pub page_count: i64,
    /// Page size in bytes.
    pub page_size: i64,
    /// Pages on the freelist (reclaimable by a WAL truncate checkpoint).
    pub freelist_count: i64,
}

impl DatabaseStats {
    /// Approximate on-disk size in bytes (`page_count * page_size`).
    pub fn size_bytes(&self) -> i64 {
        self.page_count * self.page_size
    }
}

fn apply_pragmas(conn: &Connection, chain_id: &ChainId) -> Result<(), ChainDbError> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
    conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS as u64))
        .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
    conn.pragma_update(None, "mmap_size", MMAP_SIZE_BYTES)
        .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), ChainDbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ChainDbError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o750);
            let _ = std::fs::set_permissions(parent, perms);
        }
    }
    Ok(())
}

/// Where a chain's sqlite file lives on disk.
///
/// Reference: spec.md §6.3 — `<base>/chains/<sanitized-chainID>/chain_data.db`.
pub fn chain_db_path(base_dir: &Path, chain_id: &ChainId) -> PathBuf {
    base_dir.join("chains").join(chain_id.sanitized()).join("chain_data.db")
}

/// Maintains a mapping from chain-ID to an open database handle, opening
/// lazily on first access.
///
/// Reference: spec.md §4.2 — "Concurrent Get of the same chain-ID returns
/// the same handle (double-checked under a write lock)."
pub struct ChainDbManager {
    base_dir: Option<PathBuf>,
    handles: RwLock<HashMap<ChainId, Arc<ChainHandle>>>,
}

impl ChainDbManager {
    /// A manager that persists chain databases under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: Some(base_dir.into()), handles: RwLock::new(HashMap::new()) }
    }

    /// A manager backed by `:memory:` databases, for tests.
    ///
    /// Reference: spec.md §4.2 — "In-memory mode (for tests) uses a single
    /// connection for the lifetime of the manager."
    pub fn in_memory() -> Self {
        Self { base_dir: None, handles: RwLock::new(HashMap::new()) }
    }

    /// `GetChainDB(id)` — open lazily, return the cached handle otherwise.
    pub fn get_chain_db(&self, chain_id: &ChainId) -> Result<Arc<ChainHandle>, ChainDbError> {
        if let Some(handle) = self.handles.read().get(chain_id) {
            return Ok(Arc::clone(handle));
        }

        let mut handles = self.handles.write();
        // Re-check: another writer may have opened it while we waited.
        if let Some(handle) = handles.get(chain_id) {
            return Ok(Arc::clone(handle));
        }

        let conn = match &self.base_dir {
            Some(base_dir) => {
                let path = chain_db_path(base_dir, chain_id);
                ensure_parent_dir(&path)?;
                Connection::open(&path)
                    .map_err(|source| ChainDbError::Open { chain_id: chain_id.clone(), source })?
            }
            None => Connection::open_in_memory()
                .map_err(|source| ChainDbError::Open { chain_id: chain_id.clone(), source })?,
        };
        apply_pragmas(&conn, chain_id)?;

        let handle = Arc::new(ChainHandle {
            chain_id: chain_id.clone(),
            conn: Arc::new(Mutex::new(conn)),
        });
        handles.insert(chain_id.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    /// `GetAllDatabases()`.
    pub fn get_all_databases(&self) -> Vec<(ChainId, Arc<ChainHandle>)> {
        self.handles.read().iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect()
    }

    /// `CloseChainDB(id)`.
    pub fn close_chain_db(&self, chain_id: &ChainId) -> Result<(), ChainDbError> {
        self.handles
            .write()
            .remove(chain_id)
            .map(|_| ())
            .ok_or_else(|| ChainDbError::NotOpen(chain_id.clone()))
    }

    /// `CloseAll()`.
    pub fn close_all(&self) {
        self.handles.write().clear();
    }

    /// `GetDatabaseStats()`.
    pub fn get_database_stats(&self, chain_id: &ChainId) -> Result<DatabaseStats, ChainDbError> {
        let handle = self.get_chain_db(chain_id)?;
        let conn = handle.conn.lock().expect("chain db connection poisoned");
        let page_count: i64 = conn
            .pragma_query_value(None, "page_count", |r| r.get(0))
            .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
        let page_size: i64 = conn
            .pragma_query_value(None, "page_size", |r| r.get(0))
            .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
        let freelist_count: i64 = conn
            .pragma_query_value(None, "freelist_count", |r| r.get(0))
            .map_err(|source| ChainDbError::Configure { chain_id: chain_id.clone(), source })?;
        Ok(DatabaseStats { page_count, page_size, freelist_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_chain_db_is_idempotent() {
        let manager = ChainDbManager::in_memory();
        let chain = ChainId::new("eip155:1");
        let a = manager.get_chain_db(&chain).unwrap();
        let b = manager.get_chain_db(&chain).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_chains_get_distinct_handles() {
        let manager = ChainDbManager::in_memory();
        let a = manager.get_chain_db(&ChainId::new("eip155:1")).unwrap();
        let b = manager.get_chain_db(&ChainId::new("solana:mainnet")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn close_chain_db_removes_the_handle() {
        let manager = ChainDbManager::in_memory();
        let chain = ChainId::new("eip155:1");
        manager.get_chain_db(&chain).unwrap();
        manager.close_chain_db(&chain).unwrap();
        assert!(manager.get_all_databases().is_empty());
    }

    #[test]
    fn close_chain_db_on_unopened_chain_errors() {
        let manager = ChainDbManager::in_memory();
        assert!(matches!(
            manager.close_chain_db(&ChainId::new("eip155:1")),
            Err(ChainDbError::NotOpen(_))
        ));
    }

    #[test]
    fn sanitized_path_replaces_non_alphanumerics() {
        let base = PathBuf::from("/var/data");
        let path = chain_db_path(&base, &ChainId::new("eip155:11155111"));
        assert_eq!(path, base.join("chains").join("eip155_11155111").join("chain_data.db"));
    }

    #[test]
    fn get_database_stats_reports_nonzero_page_size() {
        let manager = ChainDbManager::in_memory();
        let chain = ChainId::new("eip155:1");
        let stats = manager.get_database_stats(&chain).unwrap();
        assert!(stats.page_size > 0);
    }
}
