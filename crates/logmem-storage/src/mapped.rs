//! Growable memory-mapped log store
//!
//! One store per service name: a shared, writable mapping over
//! `<log_dir>/<service_name>.log`, holding fixed-size records back to back
//! from offset 0. Capacity is always a whole number of pages and only ever
//! grows. Writes land in the page cache immediately; durability is explicit,
//! via [`MappedLogStore::flush`].
//!
//! All offset arithmetic lives in this module. Nothing outside it ever sees
//! a raw address — callers get `append`, `flush`, `records`, and counters.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use memmap2::MmapMut;
use tracing::{debug, instrument, warn};

use logmem_core::{GROWTH_PAGES, INIT_PAGES, LogLine, RECORD_SIZE};

use crate::error::StorageError;

/// The system page size, read once
fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(|| {
        // sysconf cannot fail for _SC_PAGESIZE on any supported platform
        unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
    })
}

/// Append-optimized storage for one service's log lines, backed by a
/// growable memory mapping over a file
///
/// Invariants: `bytes_written <= capacity`,
/// `bytes_written == log_count * RECORD_SIZE`, and `capacity` is a page
/// multiple that never shrinks while the store is alive.
#[derive(Debug)]
pub struct MappedLogStore {
    path: PathBuf,
    file: File,
    map: MmapMut,
    /// Mapped capacity in bytes, always a whole number of pages
    capacity: usize,
    bytes_written: usize,
    log_count: usize,
}

impl MappedLogStore {
    /// Open (creating if absent) the backing file for a service and map it
    ///
    /// A file smaller than the minimum gets [`INIT_PAGES`] pages of initial
    /// capacity; a larger one gets its own page count plus [`GROWTH_PAGES`]
    /// of headroom. The file is extended to the capacity before mapping —
    /// a shared writable mapping must not reach past EOF. Existing contents
    /// are not replayed: the store starts empty and only capacity reflects
    /// the on-disk size.
    #[instrument(skip(log_dir), fields(service = service_name))]
    pub fn open(log_dir: &Path, service_name: &str) -> Result<Self, StorageError> {
        let path = log_dir.join(format!("{service_name}.log"));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::init(format!("{}: {e}", path.display())))?;

        let file_len = file
            .metadata()
            .map_err(|e| StorageError::init(e.to_string()))?
            .len() as usize;

        let page = page_size();
        let existing_pages = file_len.div_ceil(page);
        let pages = if existing_pages < INIT_PAGES {
            INIT_PAGES
        } else {
            existing_pages + GROWTH_PAGES
        };
        let capacity = pages * page;

        file.set_len(capacity as u64)
            .map_err(|e| StorageError::init(e.to_string()))?;

        // Safety: the mapping stays within the file length set above, and
        // the store owns the file handle for the mapping's whole lifetime.
        let map = unsafe { MmapMut::map_mut(&file) }
            .map_err(|e| StorageError::init(e.to_string()))?;

        debug!(
            path = %path.display(),
            capacity = capacity,
            file_len = file_len,
            "Opened mapped log store"
        );

        Ok(Self {
            path,
            file,
            map,
            capacity,
            bytes_written: 0,
            log_count: 0,
        })
    }

    /// Append one record at the current write offset, growing the mapping
    /// first if the record does not fit
    ///
    /// On a growth failure nothing is applied: counters, contents, and the
    /// existing mapping are untouched. An append that needs no growth is a
    /// plain memcpy.
    pub fn append(&mut self, line: &LogLine) -> Result<(), StorageError> {
        let needed = self.bytes_written + RECORD_SIZE;
        if needed > self.capacity {
            self.grow(needed)?;
        }

        self.map[self.bytes_written..needed].copy_from_slice(&line.to_bytes());
        self.bytes_written = needed;
        self.log_count += 1;
        Ok(())
    }

    /// Enlarge the mapping to hold at least `needed` bytes, in whole pages
    ///
    /// The file is extended first, then a fresh shared mapping of it
    /// replaces the old one. Dirty pages live in the kernel page cache keyed
    /// by the file, so every byte written through the old mapping is visible
    /// through the new one; no flush is required to survive growth.
    fn grow(&mut self, needed: usize) -> Result<(), StorageError> {
        let page = page_size();
        let pages = needed.div_ceil(page) + GROWTH_PAGES;
        let new_capacity = pages * page;

        self.file
            .set_len(new_capacity as u64)
            .map_err(|e| StorageError::Full(e.to_string()))?;

        // Safety: same file, length just extended past new_capacity.
        let new_map = unsafe { MmapMut::map_mut(&self.file) }
            .map_err(|e| StorageError::Full(e.to_string()))?;

        debug!(
            path = %self.path.display(),
            old_capacity = self.capacity,
            new_capacity = new_capacity,
            "Grew mapped log store"
        );

        self.map = new_map;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Synchronously flush the written byte range to the backing file
    pub fn flush(&self) -> Result<(), StorageError> {
        if self.bytes_written == 0 {
            return Ok(());
        }
        self.map
            .flush_range(0, self.bytes_written)
            .map_err(|e| StorageError::Flush(e.to_string()))
    }

    /// A restartable iterator over the stored records, in append order
    pub fn records(&self) -> impl Iterator<Item = LogLine> + '_ {
        (0..self.log_count)
            .map(|i| LogLine::from_bytes(&self.map[i * RECORD_SIZE..(i + 1) * RECORD_SIZE]))
    }

    /// Copy out every stored record, for sending without holding the store
    pub fn snapshot(&self) -> Vec<LogLine> {
        self.records().collect()
    }

    /// Bytes written so far; always `log_count * RECORD_SIZE`
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Number of stored records
    pub fn log_count(&self) -> usize {
        self.log_count
    }

    /// Current mapped capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MappedLogStore {
    /// Best-effort flush before the mapping unmaps itself. A failure here is
    /// a housekeeping problem, not a caller error.
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(path = %self.path.display(), error = %e, "Flush on release failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_line(i: usize) -> LogLine {
        LogLine::new("2024-01-01T00:00:00", &format!("message {i}"))
    }

    #[test]
    fn test_append_updates_counters() {
        let dir = TempDir::new().unwrap();
        let mut store = MappedLogStore::open(dir.path(), "svc1").unwrap();

        for i in 0..5 {
            store.append(&sample_line(i)).unwrap();
        }

        assert_eq!(store.log_count(), 5);
        assert_eq!(store.bytes_written(), 5 * RECORD_SIZE);
    }

    #[test]
    fn test_growth_preserves_existing_records() {
        let dir = TempDir::new().unwrap();
        let mut store = MappedLogStore::open(dir.path(), "svc1").unwrap();

        // Enough records to cross the initial page capacity several times.
        let total = store.capacity() / RECORD_SIZE * 3;
        let initial_capacity = store.capacity();

        let mut prefix = Vec::new();
        for i in 0..total {
            let line = sample_line(i);
            store.append(&line).unwrap();
            if store.capacity() == initial_capacity {
                prefix.push(line);
            }
        }

        assert!(store.capacity() > initial_capacity);
        assert_eq!(store.capacity() % page_size(), 0);

        let all: Vec<LogLine> = store.records().collect();
        assert_eq!(all.len(), total);
        assert_eq!(&all[..prefix.len()], &prefix[..]);
        for (i, line) in all.iter().enumerate() {
            assert_eq!(line.message(), format!("message {i}"));
        }
    }

    #[test]
    fn test_records_is_restartable() {
        let dir = TempDir::new().unwrap();
        let mut store = MappedLogStore::open(dir.path(), "svc1").unwrap();
        for i in 0..3 {
            store.append(&sample_line(i)).unwrap();
        }

        let first: Vec<LogLine> = store.records().collect();
        let second: Vec<LogLine> = store.records().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flush_persists_to_backing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = MappedLogStore::open(dir.path(), "svc1").unwrap();
        store.append(&sample_line(0)).unwrap();
        store.flush().unwrap();

        let len = std::fs::metadata(store.path()).unwrap().len();
        assert!(len >= RECORD_SIZE as u64);
    }

    #[test]
    fn test_reopen_sizes_capacity_from_file() {
        let dir = TempDir::new().unwrap();
        let grown_capacity;
        {
            let mut store = MappedLogStore::open(dir.path(), "svc1").unwrap();
            let total = store.capacity() / RECORD_SIZE + 1;
            for i in 0..total {
                store.append(&sample_line(i)).unwrap();
            }
            grown_capacity = store.capacity();
        }

        // The reopened store starts empty but its capacity reflects the
        // on-disk size plus headroom.
        let store = MappedLogStore::open(dir.path(), "svc1").unwrap();
        assert_eq!(store.log_count(), 0);
        assert_eq!(store.bytes_written(), 0);
        assert!(store.capacity() > grown_capacity);
    }

    #[test]
    fn test_fresh_store_has_minimum_capacity() {
        let dir = TempDir::new().unwrap();
        let store = MappedLogStore::open(dir.path(), "svc1").unwrap();
        assert_eq!(store.capacity(), INIT_PAGES * page_size());
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = MappedLogStore::open(&missing, "svc1").unwrap_err();
        assert!(matches!(err, StorageError::Init(_)));
    }
}
