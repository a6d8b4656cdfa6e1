//! Bookkeeping table shared between the two passes.
//!
//! The server writes one [`ServerStateRecord`] per recorded request under
//! [`SERVER_STATE_DATA_KEY`] and keeps the highest id it handed out under
//! [`LAST_ID_KEY`]. The client claims records by fingerprint instead of
//! relying on both passes issuing requests in the same order.

use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;

use super::{
    CacheError, CachedEntry, KeyGenerator, ServerStateRecord,
    store::{StoreError, TransferStore},
};
use crate::config::DuplicatePolicy;

pub const SERVER_STATE_DATA_KEY: &str = "server_state_data";
pub const LAST_ID_KEY: &str = "server_state_last_id";

/// Read/write access to the bookkeeping table of one render pass.
///
/// Every read-modify-write of the table happens under one mutex, so concurrent
/// interceptions within one process cannot lose records.
pub struct Ledger {
    store: Arc<dyn TransferStore>,
    // Ids claimed by this pass; the mutex also serializes table updates.
    consumed: Mutex<HashSet<u64>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn TransferStore>) -> Self {
        Self {
            store,
            consumed: Mutex::new(HashSet::new()),
        }
    }

    /// All records, or an empty table when none was written.
    pub fn records(&self) -> Result<Vec<ServerStateRecord>, StoreError> {
        Ok(self
            .store
            .get_as::<Vec<ServerStateRecord>>(SERVER_STATE_DATA_KEY)?
            .unwrap_or_default())
    }

    pub fn last_id(&self) -> Result<Option<u64>, StoreError> {
        self.store.get_as::<u64>(LAST_ID_KEY)
    }

    /// Returns `true` while the store still holds any bookkeeping.
    pub fn is_populated(&self) -> bool {
        self.store.has_key(SERVER_STATE_DATA_KEY) || self.store.has_key(LAST_ID_KEY)
    }

    /// Server side: records occurrence `id` of `fingerprint` and bumps `lastId`.
    ///
    /// # Errors
    ///
    /// [`CacheError::DuplicateRequestInPass`] when `policy` is
    /// [`DuplicatePolicy::Reject`] and the fingerprint is already recorded.
    pub fn append(
        &self,
        fingerprint: &str,
        id: u64,
        policy: DuplicatePolicy,
    ) -> Result<(), CacheError> {
        let _guard = self.consumed.lock();
        let mut records = self.records()?;

        if policy == DuplicatePolicy::Reject && records.iter().any(|r| r.req_key == fingerprint) {
            return Err(CacheError::DuplicateRequestInPass {
                fingerprint: fingerprint.to_owned(),
            });
        }

        let last_id = self.last_id()?.map_or(id, |last| last.max(id));
        self.store.set_as(LAST_ID_KEY, &last_id)?;

        records.push(ServerStateRecord {
            id,
            req_key: fingerprint.to_owned(),
        });
        self.store.set_as(SERVER_STATE_DATA_KEY, &records)?;
        Ok(())
    }

    /// Server side: writes the outcome recorded for `record`.
    ///
    /// The write is skipped, returning `false`, when the table no longer
    /// holds `record`, i.e. cleanup ran while the request was in flight.
    pub fn commit(
        &self,
        record: &ServerStateRecord,
        entry: &CachedEntry,
    ) -> Result<bool, StoreError> {
        let _guard = self.consumed.lock();
        if !self.records()?.contains(record) {
            return Ok(false);
        }
        self.store
            .set_as(&KeyGenerator::entry_key(&record.req_key, record.id), entry)?;
        Ok(true)
    }

    /// Client side: claims the first record for `fingerprint` this pass has
    /// not consumed yet, validated against `lastId`.
    ///
    /// # Errors
    ///
    /// - [`CacheError::RequestMissingInServerState`]: no unconsumed record matches.
    /// - [`CacheError::WrongIdForServerState`]: `lastId` is absent or lower than the record's id.
    pub fn claim(&self, fingerprint: &str) -> Result<ServerStateRecord, CacheError> {
        let mut consumed = self.consumed.lock();

        let record = self
            .records()?
            .into_iter()
            .find(|r| r.req_key == fingerprint && !consumed.contains(&r.id))
            .ok_or_else(|| CacheError::RequestMissingInServerState {
                fingerprint: fingerprint.to_owned(),
            })?;

        let last_id = self.last_id()?;
        if last_id.is_none_or(|last| record.id > last) {
            return Err(CacheError::WrongIdForServerState {
                id: record.id,
                last_id,
            });
        }

        consumed.insert(record.id);
        Ok(record)
    }

    /// Removes `lastId`, every entry the table points at, and the table.
    ///
    /// Safe to call repeatedly. Every removal is attempted even if an earlier
    /// one fails; the first failure is returned. Returns how many records the
    /// table held, which is the number of recorded entries it referenced.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let mut consumed = self.consumed.lock();
        let mut first_error = None;

        let records = match self.records() {
            Ok(records) => records,
            Err(e) => {
                first_error.get_or_insert(e);
                Vec::new()
            }
        };

        let removals = std::iter::once(LAST_ID_KEY.to_owned())
            .chain(
                records
                    .iter()
                    .map(|r| KeyGenerator::entry_key(&r.req_key, r.id)),
            )
            .chain(std::iter::once(SERVER_STATE_DATA_KEY.to_owned()));

        for key in removals {
            if let Err(e) = self.store.remove(&key) {
                first_error.get_or_insert(e);
            }
        }

        consumed.clear();
        match first_error {
            Some(e) => Err(e),
            None => Ok(records.len()),
        }
    }
}
