//! An ordered map keyed by `(primary, secondary)`, backed by a scratch SQLite database. This
//! holds the tables too large to keep in memory. The composite primary key of a `WITHOUT ROWID`
//! table is a clustered B-tree, so scanning everything for one primary key is a single seek
//! followed by a walk over just those rows.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::ops::{Bound, RangeBounds};
use std::rc::Rc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::TempDir;

use crate::StoreConfig;

/// Cloning the handle shares the same backing database.
pub struct CompositeStore<V> {
    name: String,
    backing: Rc<RefCell<Option<Backing>>>,
    _value: PhantomData<V>,
}

struct Backing {
    conn: Connection,
    // Writes during the load phase are batched into one transaction
    in_transaction: Cell<bool>,
    // Dropped after the connection; removes the database file
    _dir: TempDir,
}

impl<V> Clone for CompositeStore<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backing: self.backing.clone(),
            _value: PhantomData,
        }
    }
}

impl<V: Serialize + DeserializeOwned> CompositeStore<V> {
    pub fn create(name: &str, config: &StoreConfig) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("gtfs-{name}-");
        builder.prefix(&prefix);
        let dir = match config.scratch_dir {
            Some(ref parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .with_context(|| format!("creating scratch directory for {name}"))?;

        let path = dir.path().join(format!("{name}.db"));
        let conn = Connection::open(&path)
            .with_context(|| format!("opening scratch database {}", path.display()))?;
        // Nothing here needs to survive a crash
        conn.pragma_update(None, "journal_mode", "OFF")?;
        conn.pragma_update(None, "synchronous", "OFF")?;
        // Negative means KiB, not pages
        conn.pragma_update(None, "cache_size", -i64::from(config.cache_size_kib))?;
        conn.pragma_update(
            None,
            "mmap_size",
            i64::try_from(config.mmap_size_bytes).unwrap_or(i64::MAX),
        )?;
        conn.execute(
            "CREATE TABLE entries (
                primary_key TEXT NOT NULL,
                secondary_key INTEGER NOT NULL,
                value BLOB NOT NULL,
                PRIMARY KEY (primary_key, secondary_key)
            ) WITHOUT ROWID",
            [],
        )?;
        debug!("Created scratch store {name} at {}", path.display());

        Ok(Self {
            name: name.to_string(),
            backing: Rc::new(RefCell::new(Some(Backing {
                conn,
                in_transaction: Cell::new(false),
                _dir: dir,
            }))),
            _value: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts or overwrites.
    pub fn put(&self, primary: &str, secondary: i64, value: &V) -> Result<()> {
        let encoded = serde_json::to_vec(value)?;
        self.with_conn(|backing| {
            if !backing.in_transaction.get() {
                backing.conn.execute_batch("BEGIN")?;
                backing.in_transaction.set(true);
            }
            backing
                .conn
                .prepare_cached(
                    "INSERT OR REPLACE INTO entries (primary_key, secondary_key, value) VALUES (?1, ?2, ?3)",
                )?
                .execute(params![primary, secondary, encoded])?;
            Ok(())
        })
    }

    pub fn get(&self, primary: &str, secondary: i64) -> Result<Option<V>> {
        let encoded: Option<Vec<u8>> = self.with_conn(|backing| {
            Ok(backing
                .conn
                .prepare_cached(
                    "SELECT value FROM entries WHERE primary_key = ?1 AND secondary_key = ?2",
                )?
                .query_row(params![primary, secondary], |row| row.get(0))
                .optional()?)
        })?;
        match encoded {
            Some(bytes) => Ok(Some(self.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, primary: &str, secondary: i64) -> Result<bool> {
        self.with_conn(|backing| {
            Ok(backing
                .conn
                .prepare_cached(
                    "SELECT 1 FROM entries WHERE primary_key = ?1 AND secondary_key = ?2",
                )?
                .exists(params![primary, secondary])?)
        })
    }

    /// All values under `primary` with a secondary key in `range`, ascending by secondary key.
    /// Pass `..` to get everything.
    pub fn range_scan<R: RangeBounds<i64>>(&self, primary: &str, range: R) -> Result<Vec<V>> {
        let Some((low, high)) = inclusive_bounds(&range) else {
            return Ok(Vec::new());
        };
        self.with_conn(|backing| {
            let mut stmt = backing.conn.prepare_cached(
                "SELECT value FROM entries
                 WHERE primary_key = ?1 AND secondary_key BETWEEN ?2 AND ?3
                 ORDER BY secondary_key",
            )?;
            let mut rows = stmt.query(params![primary, low, high])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                let bytes: Vec<u8> = row.get(0)?;
                results.push(self.decode(&bytes)?);
            }
            Ok(results)
        })
    }

    /// Streams every entry in key order. The store can be read, but not closed, from inside `f`.
    pub fn for_each<F: FnMut(&str, i64, V) -> Result<()>>(&self, mut f: F) -> Result<()> {
        self.with_conn(|backing| {
            let mut stmt = backing.conn.prepare_cached(
                "SELECT primary_key, secondary_key, value FROM entries
                 ORDER BY primary_key, secondary_key",
            )?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let primary: String = row.get(0)?;
                let secondary: i64 = row.get(1)?;
                let bytes: Vec<u8> = row.get(2)?;
                f(&primary, secondary, self.decode(&bytes)?)?;
            }
            Ok(())
        })
    }

    pub fn len(&self) -> Result<usize> {
        self.with_conn(|backing| {
            let n: i64 = backing
                .conn
                .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_conn(|backing| {
            Ok(backing
                .conn
                .prepare_cached("SELECT 1 FROM entries LIMIT 1")?
                .exists([])?)
        })
        .map(|any| !any)
    }

    /// Ends the batch of writes started by `put`. Reads never need this.
    pub fn commit(&self) -> Result<()> {
        self.with_conn(|backing| {
            if backing.in_transaction.replace(false) {
                backing.conn.execute_batch("COMMIT")?;
            }
            Ok(())
        })
    }

    /// Deletes the scratch database. Every handle sharing it becomes unusable. Closing again is
    /// a no-op.
    pub fn close(&self) -> Result<()> {
        let mut backing = self
            .backing
            .try_borrow_mut()
            .map_err(|_| anyhow!("can't close {} while it's being read", self.name))?;
        if let Some(backing) = backing.take() {
            // Dropping the TempDir removes the file; the pending batch is worthless by now.
            backing
                .conn
                .close()
                .map_err(|(_, err)| anyhow!("closing {}: {err}", self.name))?;
            debug!("Closed scratch store {}", self.name);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.backing.borrow().is_none()
    }

    fn with_conn<T, F: FnOnce(&Backing) -> Result<T>>(&self, f: F) -> Result<T> {
        let backing = self.backing.borrow();
        match backing.as_ref() {
            Some(backing) => f(backing).with_context(|| format!("store {}", self.name)),
            None => bail!("store {} is closed", self.name),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes)
            .with_context(|| format!("corrupt value in store {}", self.name))
    }
}

// Converts any range into a closed interval, or None if it can't contain anything.
fn inclusive_bounds<R: RangeBounds<i64>>(range: &R) -> Option<(i64, i64)> {
    let low = match range.start_bound() {
        Bound::Included(x) => *x,
        Bound::Excluded(x) => x.checked_add(1)?,
        Bound::Unbounded => i64::MIN,
    };
    let high = match range.end_bound() {
        Bound::Included(x) => *x,
        Bound::Excluded(x) => x.checked_sub(1)?,
        Bound::Unbounded => i64::MAX,
    };
    if low > high {
        return None;
    }
    Some((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CompositeStore<String> {
        CompositeStore::create("test", &StoreConfig::default()).unwrap()
    }

    #[test]
    fn range_scan_is_ordered_by_secondary_key() {
        let store = store();
        for seq in [30, 1, 20, 5, 100, 2] {
            store.put("trip", seq, &format!("v{seq}")).unwrap();
        }
        assert_eq!(
            store.range_scan("trip", ..).unwrap(),
            vec!["v1", "v2", "v5", "v20", "v30", "v100"]
        );
    }

    #[test]
    fn range_scan_is_isolated_per_primary_key() {
        let store = store();
        store.put("a", 1, &"a1".to_string()).unwrap();
        store.put("ab", 1, &"ab1".to_string()).unwrap();
        store.put("b", 0, &"b0".to_string()).unwrap();
        store.put("a", 2, &"a2".to_string()).unwrap();

        assert_eq!(store.range_scan("a", ..).unwrap(), vec!["a1", "a2"]);
        assert_eq!(store.range_scan("b", ..).unwrap(), vec!["b0"]);
        assert!(store.range_scan("c", ..).unwrap().is_empty());
    }

    #[test]
    fn range_scan_bounds() {
        let store = store();
        for seq in 1..=10 {
            store.put("x", seq, &seq.to_string()).unwrap();
        }
        assert_eq!(store.range_scan("x", 3..5).unwrap(), vec!["3", "4"]);
        assert_eq!(store.range_scan("x", 8..).unwrap(), vec!["8", "9", "10"]);
        assert_eq!(store.range_scan("x", ..=2).unwrap(), vec!["1", "2"]);
        assert!(store.range_scan("x", 5..5).unwrap().is_empty());
        assert!(store.range_scan("x", ..i64::MIN).unwrap().is_empty());
    }

    #[test]
    fn put_overwrites() {
        let store = store();
        store.put("x", 1, &"first".to_string()).unwrap();
        store.put("x", 1, &"second".to_string()).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get("x", 1).unwrap(), Some("second".to_string()));
        assert!(store.contains("x", 1).unwrap());
        assert!(!store.contains("x", 2).unwrap());
    }

    #[test]
    fn reads_see_writes_across_commits() {
        let store = store();
        store.put("x", 1, &"a".to_string()).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        store.commit().unwrap();
        store.put("x", 2, &"b".to_string()).unwrap();
        store.commit().unwrap();
        store.commit().unwrap();
        assert_eq!(store.range_scan("x", ..).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn for_each_walks_keys_in_order() {
        let store = store();
        store.put("b", 2, &"b2".to_string()).unwrap();
        store.put("a", 9, &"a9".to_string()).unwrap();
        store.put("b", 1, &"b1".to_string()).unwrap();
        let mut seen = Vec::new();
        store
            .for_each(|primary, secondary, value| {
                seen.push((primary.to_string(), secondary, value));
                Ok(())
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), 9, "a9".to_string()),
                ("b".to_string(), 1, "b1".to_string()),
                ("b".to_string(), 2, "b2".to_string()),
            ]
        );
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let store = store();
        store.put("x", 1, &"a".to_string()).unwrap();
        let shared = store.clone();

        store.close().unwrap();
        store.close().unwrap();
        assert!(store.is_closed());
        assert!(shared.is_closed());
        assert!(store.range_scan("x", ..).is_err());
        assert!(shared.put("x", 2, &"b".to_string()).is_err());
    }

    #[test]
    fn close_removes_scratch_files() {
        let parent = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            scratch_dir: Some(parent.path().to_path_buf()),
            ..Default::default()
        };
        let store: CompositeStore<u32> = CompositeStore::create("scratch", &config).unwrap();
        store.put("x", 1, &1).unwrap();
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 1);
        store.close().unwrap();
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn scratch_dir_is_named_after_the_store() {
        let parent = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            scratch_dir: Some(parent.path().to_path_buf()),
            ..Default::default()
        };
        let _store: CompositeStore<u32> = CompositeStore::create("stop_times", &config).unwrap();
        let names: Vec<String> = std::fs::read_dir(parent.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("gtfs-stop_times-"));
    }
}
