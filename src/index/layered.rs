//! Two-tier index: transient in-memory map over a persistent redb table.
//!
//! Reads check the in-memory tier first and fall back to the persistent
//! tier, backfilling the in-memory tier on a hit (read-through cache).
//! Writes land in the in-memory tier only; [`LayeredIndex::flush`] pumps the
//! accumulated entries into the persistent table at the batch boundary and
//! clears the in-memory tier.
//!
//! Without a persistent tier the in-memory map is authoritative and flush
//! keeps it intact, so lookups keep working in memory-only stores.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::IndexError;

/// Result type for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Log throughput after this many pumped entries.
const LOG_ENTRY_INTERVAL: usize = 1_000_000;

/// Log throughput after this many seconds, even if few entries were pumped.
const LOG_SECS_INTERVAL: u64 = 60;

fn read_err(index: &'static str, err: impl std::fmt::Display) -> IndexError {
    IndexError::Read {
        index,
        message: err.to_string(),
    }
}

fn flush_err(index: &'static str, err: impl std::fmt::Display) -> IndexError {
    IndexError::Flush {
        index,
        message: err.to_string(),
    }
}

/// String-keyed layered index mapping identity keys to node ids.
pub struct LayeredIndex {
    name: &'static str,
    table: TableDefinition<'static, &'static str, u64>,
    mem: HashMap<String, u64>,
    db: Option<Arc<Database>>,
}

impl LayeredIndex {
    /// Create a layered index over an optional persistent database.
    pub fn new(
        name: &'static str,
        table: TableDefinition<'static, &'static str, u64>,
        db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            name,
            table,
            mem: HashMap::new(),
            db,
        }
    }

    /// The index name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a key in the in-memory tier.
    pub fn put(&mut self, key: impl Into<String>, id: u64) {
        self.mem.insert(key.into(), id);
    }

    /// Look up a key: in-memory tier first, then the persistent tier with
    /// backfill on a hit.
    pub fn get(&mut self, key: &str) -> IndexResult<Option<u64>> {
        if let Some(id) = self.mem.get(key) {
            return Ok(Some(*id));
        }

        let Some(db) = &self.db else {
            return Ok(None);
        };

        let txn = db.begin_read().map_err(|e| read_err(self.name, e))?;
        let table = match txn.open_table(self.table) {
            Ok(table) => table,
            // Nothing flushed yet: the table doesn't exist until first pump.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(read_err(self.name, e)),
        };
        let hit = table
            .get(key)
            .map_err(|e| read_err(self.name, e))?
            .map(|guard| guard.value());

        if let Some(id) = hit {
            self.mem.insert(key.to_owned(), id);
        }

        Ok(hit)
    }

    /// Pump the in-memory tier into the persistent tier, then clear it.
    ///
    /// Idempotent on an empty in-memory tier. Throughput is logged
    /// periodically; the logging is observational only.
    pub fn flush(&mut self) -> IndexResult<()> {
        if self.mem.is_empty() {
            tracing::debug!(index = self.name, "nothing to pump");
            return Ok(());
        }

        let Some(db) = &self.db else {
            // Memory-only store: the in-memory tier is authoritative.
            tracing::debug!(index = self.name, "no persistent tier, keeping in-memory entries");
            return Ok(());
        };

        tracing::debug!(index = self.name, size = self.mem.len(), "start pumping index");

        let txn = db.begin_write().map_err(|e| flush_err(self.name, e))?;
        {
            let mut table = txn
                .open_table(self.table)
                .map_err(|e| flush_err(self.name, e))?;

            let mut written = 0usize;
            let mut since_last = 0usize;
            let mut tick = Instant::now();

            for (key, id) in &self.mem {
                table
                    .insert(key.as_str(), id)
                    .map_err(|e| flush_err(self.name, e))?;
                written += 1;

                let entry_delta = written - since_last;
                let secs = tick.elapsed().as_secs();
                if entry_delta >= LOG_ENTRY_INTERVAL || secs >= LOG_SECS_INTERVAL {
                    let rate = entry_delta as f64 / secs.max(1) as f64;
                    tracing::debug!(
                        index = self.name,
                        written,
                        rate,
                        "pumped entries @ ~entries/second"
                    );
                    since_last = written;
                    tick = Instant::now();
                }
            }

            tracing::debug!(index = self.name, written, "finished pumping index");
        }
        txn.commit().map_err(|e| flush_err(self.name, e))?;

        self.mem.clear();
        Ok(())
    }

    /// Number of entries in the in-memory tier.
    pub fn mem_len(&self) -> usize {
        self.mem.len()
    }
}

impl std::fmt::Debug for LayeredIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredIndex")
            .field("name", &self.name)
            .field("mem", &self.mem.len())
            .field("persistent", &self.db.is_some())
            .finish()
    }
}

/// Layered membership index over statement hashes (the dedup index).
///
/// The in-memory tier is an ordered set, matching the submission-order
/// guarantee within one batch; the persistent tier stores hashes as keys
/// with unit values.
pub struct LayeredHashIndex {
    name: &'static str,
    table: TableDefinition<'static, u64, ()>,
    mem: BTreeSet<u64>,
    db: Option<Arc<Database>>,
}

impl LayeredHashIndex {
    /// Create a layered hash index over an optional persistent database.
    pub fn new(
        name: &'static str,
        table: TableDefinition<'static, u64, ()>,
        db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            name,
            table,
            mem: BTreeSet::new(),
            db,
        }
    }

    /// Record a hash in the in-memory tier.
    pub fn insert(&mut self, hash: u64) {
        self.mem.insert(hash);
    }

    /// Whether the hash is present in either tier.
    pub fn contains(&self, hash: u64) -> IndexResult<bool> {
        if self.mem.contains(&hash) {
            return Ok(true);
        }

        let Some(db) = &self.db else {
            return Ok(false);
        };

        let txn = db.begin_read().map_err(|e| read_err(self.name, e))?;
        let table = match txn.open_table(self.table) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(false),
            Err(e) => return Err(read_err(self.name, e)),
        };
        Ok(table
            .get(hash)
            .map_err(|e| read_err(self.name, e))?
            .is_some())
    }

    /// Pump the in-memory tier into the persistent tier, then clear it.
    /// Idempotent on an empty in-memory tier.
    pub fn flush(&mut self) -> IndexResult<()> {
        if self.mem.is_empty() {
            tracing::debug!(index = self.name, "nothing to pump");
            return Ok(());
        }

        let Some(db) = &self.db else {
            tracing::debug!(index = self.name, "no persistent tier, keeping in-memory entries");
            return Ok(());
        };

        tracing::debug!(index = self.name, size = self.mem.len(), "start pumping index");

        let txn = db.begin_write().map_err(|e| flush_err(self.name, e))?;
        {
            let mut table = txn
                .open_table(self.table)
                .map_err(|e| flush_err(self.name, e))?;

            let mut written = 0usize;
            let mut since_last = 0usize;
            let mut tick = Instant::now();

            for hash in &self.mem {
                table
                    .insert(hash, ())
                    .map_err(|e| flush_err(self.name, e))?;
                written += 1;

                let entry_delta = written - since_last;
                let secs = tick.elapsed().as_secs();
                if entry_delta >= LOG_ENTRY_INTERVAL || secs >= LOG_SECS_INTERVAL {
                    let rate = entry_delta as f64 / secs.max(1) as f64;
                    tracing::debug!(
                        index = self.name,
                        written,
                        rate,
                        "pumped entries @ ~entries/second"
                    );
                    since_last = written;
                    tick = Instant::now();
                }
            }

            tracing::debug!(index = self.name, written, "finished pumping index");
        }
        txn.commit().map_err(|e| flush_err(self.name, e))?;

        self.mem.clear();
        Ok(())
    }

    /// Number of hashes in the in-memory tier.
    pub fn mem_len(&self) -> usize {
        self.mem.len()
    }
}

impl std::fmt::Debug for LayeredHashIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredHashIndex")
            .field("name", &self.name)
            .field("mem", &self.mem.len())
            .field("persistent", &self.db.is_some())
            .finish()
    }
}
