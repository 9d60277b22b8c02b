//! Append-only record of validation attempts.
//!
//! Each entry is stored under its zero-padded sequence number, so key
//! order is append order. Sequence numbers and timestamps are assigned
//! under one lock from a [`MonotonicClock`], which makes key order and
//! timestamp order agree.

use crate::error::{StoreError, StoreResult};
use crate::record_store::RecordStore;
use chrono::{DateTime, Utc};
use licensy_types::{EntryId, LicenseKey, MonotonicClock, NewUsageEntry, UsageLogEntry};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error};

/// Namespace holding usage log entries, keyed by entry ID.
pub const USAGE_NAMESPACE: &str = "usage";

const PAGE_SIZE: usize = 256;

struct Cursor {
    next_id: EntryId,
    clock: MonotonicClock,
}

/// The audit log.
pub struct AuditLog {
    store: Arc<dyn RecordStore>,
    cursor: Mutex<Cursor>,
}

impl AuditLog {
    /// Opens the audit log, resuming the sequence after any stored entries.
    pub fn open(store: Arc<dyn RecordStore>) -> StoreResult<Self> {
        let mut last: Option<UsageLogEntry> = None;
        let mut after: Option<String> = None;

        loop {
            let page = store.scan(USAGE_NAMESPACE, after.as_deref(), PAGE_SIZE, &|_, _| true)?;
            let exhausted = page.len() < PAGE_SIZE;
            if let Some((key, record)) = page.into_iter().last() {
                last = Some(decode(&key, &record)?);
                after = Some(key);
            }
            if exhausted {
                break;
            }
        }

        let cursor = match last {
            Some(entry) => {
                debug!("resuming audit log after entry {}", entry.id);
                Cursor {
                    next_id: entry.id.next(),
                    clock: MonotonicClock::resume_from(entry.timestamp),
                }
            }
            None => Cursor {
                next_id: EntryId::new(1),
                clock: MonotonicClock::new(),
            },
        };

        Ok(Self {
            store,
            cursor: Mutex::new(cursor),
        })
    }

    /// Appends an entry, stamping it with the next ID and the write time.
    ///
    /// # Errors
    ///
    /// [`StoreError::StorageUnavailable`] if the record store could not
    /// persist the entry. A failed append consumes no ID.
    pub fn append(&self, entry: NewUsageEntry) -> StoreResult<EntryId> {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);

        let id = cursor.next_id;
        let timestamp = cursor.clock.peek();
        let stamped = UsageLogEntry::stamp(entry, id, timestamp);
        let record = serde_json::to_string(&stamped).map_err(|e| StoreError::Corrupt {
            key: id.to_record_key(),
            reason: e.to_string(),
        })?;

        if let Err(e) = self.store.write(USAGE_NAMESPACE, &id.to_record_key(), &record) {
            error!(
                "audit append failed for key {} ({}): {e}",
                stamped.license_key, stamped.action
            );
            return Err(e);
        }

        cursor.clock.commit(timestamp);
        cursor.next_id = id.next();
        debug!(
            "audit entry {id}: {} {} by {}",
            stamped.license_key, stamped.action, stamped.caller_identity
        );
        Ok(id)
    }

    /// Returns the entries for `license_key` with `from <= timestamp <= to`,
    /// in ascending timestamp order.
    ///
    /// The result is read lazily, page by page. Running the same query again
    /// yields the same entries unless new ones were appended in between.
    pub fn query(
        &self,
        license_key: &LicenseKey,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AuditQuery<'_> {
        AuditQuery {
            store: self.store.as_ref(),
            license_key: license_key.clone(),
            from,
            to,
            after: None,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Returns the number of entries in the log.
    pub fn len(&self) -> usize {
        let cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        cursor.next_id.as_u64().saturating_sub(1) as usize
    }

    /// Returns true if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lazy iterator over the result of [`AuditLog::query`].
pub struct AuditQuery<'a> {
    store: &'a dyn RecordStore,
    license_key: LicenseKey,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    after: Option<String>,
    buffer: VecDeque<UsageLogEntry>,
    done: bool,
}

/// The fields a scan filter needs, without decoding the whole entry.
#[derive(Deserialize)]
struct EntryHead {
    license_key: String,
    timestamp: DateTime<Utc>,
}

impl AuditQuery<'_> {
    fn fetch_page(&mut self) -> StoreResult<()> {
        let (key, from, to) = (self.license_key.as_str(), self.from, self.to);
        let matches = |_: &str, record: &str| match serde_json::from_str::<EntryHead>(record) {
            Ok(head) => head.license_key == key && head.timestamp >= from && head.timestamp <= to,
            // Let undecodable records through so the caller sees the corruption.
            Err(_) => true,
        };

        let page = self
            .store
            .scan(USAGE_NAMESPACE, self.after.as_deref(), PAGE_SIZE, &matches)?;
        if page.len() < PAGE_SIZE {
            self.done = true;
        }
        for (key, record) in page {
            self.buffer.push_back(decode(&key, &record)?);
            self.after = Some(key);
        }
        Ok(())
    }
}

impl Iterator for AuditQuery<'_> {
    type Item = StoreResult<UsageLogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Some(Ok(entry));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.done = true;
                self.buffer.clear();
                return Some(Err(e));
            }
        }
    }
}

fn decode(key: &str, record: &str) -> StoreResult<UsageLogEntry> {
    serde_json::from_str(record).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
