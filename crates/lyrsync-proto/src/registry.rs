//! Track registry — the ordered, unique-keyed collection of every track the
//! server has told us about in the current session.
//!
//! The registry is created empty, replaced wholesale exactly once (the
//! analysis snapshot) and patched in place for the rest of the session.  Its
//! membership is authoritative: batch updates may only change known tracks,
//! never introduce new ones.
//!
//! Ordering invariant: keyed records (Some track number) first, ascending and
//! unique; un-keyed error records after them, in arrival order.  Every
//! operation preserves this, which is what makes the aligned merge and the
//! binary-search point patch possible.

use std::collections::BTreeSet;

use tracing::debug;

use crate::protocol::{TrackPatch, TrackRecord, TrackStatus};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: Vec<TrackRecord>,
    /// Length of the keyed prefix — records beyond it have no track number.
    keyed_len: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    /// Keyed lookup by track number.
    pub fn get(&self, track_number: u32) -> Option<&TrackRecord> {
        let idx = self.find(track_number)?;
        self.records.get(idx)
    }

    /// Discard the current collection and install `records`, sorted by track
    /// number with un-keyed records last.  An empty snapshot is a no-op:
    /// callers must treat it as "no tracks", not as an error.
    pub fn replace_all(&mut self, records: Vec<TrackRecord>) {
        if records.is_empty() {
            return;
        }

        let mut records = records;
        records.sort_by_key(|r| (r.track_number.is_none(), r.track_number));
        // Drop duplicate keys, first occurrence wins.
        let mut last_key: Option<u32> = None;
        records.retain(|r| match r.track_number {
            Some(n) => {
                if last_key == Some(n) {
                    debug!("snapshot carries duplicate track {n}, keeping first");
                    false
                } else {
                    last_key = Some(n);
                    true
                }
            }
            None => true,
        });

        self.keyed_len = records.iter().filter(|r| r.track_number.is_some()).count();
        self.records = records;
    }

    /// Apply a batch of status changes.  Updates whose key is not in the
    /// registry are discarded; keys unique to the registry stay untouched.
    /// Returns the set of track numbers whose record actually changed.
    ///
    /// The server contract says batches arrive ascending by track number; the
    /// aligned merge relies on that.  A batch that violates the contract is
    /// stably sorted first instead of being silently mis-merged.
    pub fn merge_batch(&mut self, updates: &[TrackPatch]) -> BTreeSet<u32> {
        if updates.is_empty() {
            return BTreeSet::new();
        }
        let sorted = updates
            .windows(2)
            .all(|w| w[0].track_number <= w[1].track_number);
        if sorted {
            self.merge_aligned(updates)
        } else {
            debug!("update batch out of order, sorting before merge");
            let mut copy = updates.to_vec();
            copy.sort_by_key(|u| u.track_number);
            self.merge_aligned(&copy)
        }
    }

    /// Two-cursor sweep over two ascending sequences: equal keys apply and
    /// advance both; an update ahead of the registry advances the registry
    /// cursor; an update behind it refers to an unknown track and is dropped.
    /// Single linear pass, no lookup table.  A duplicate key within a batch
    /// only takes effect once — the cursor has already moved past it.
    fn merge_aligned(&mut self, updates: &[TrackPatch]) -> BTreeSet<u32> {
        let mut changed = BTreeSet::new();
        let mut ri = 0;
        let mut ui = 0;
        while ri < self.keyed_len && ui < updates.len() {
            let Some(rkey) = self.records[ri].track_number else {
                break;
            };
            let update = &updates[ui];
            match update.track_number.cmp(&rkey) {
                std::cmp::Ordering::Equal => {
                    let record = &mut self.records[ri];
                    if record.status != update.status || record.message != update.message {
                        record.status = update.status;
                        record.message = update.message.clone();
                        changed.insert(rkey);
                    }
                    ri += 1;
                    ui += 1;
                }
                std::cmp::Ordering::Greater => {
                    // This registry record is not in the batch.
                    ri += 1;
                }
                std::cmp::Ordering::Less => {
                    // Update for a track we don't know.  Expected under races
                    // between analysis and update messages.
                    debug!("dropping update for unknown track {}", update.track_number);
                    ui += 1;
                }
            }
        }
        changed
    }

    /// Point patch by key.  Binary search over the keyed prefix, so this
    /// stays logarithmic even for a full album.  Returns whether a record
    /// matched; a miss leaves the registry untouched.
    pub fn patch_one(&mut self, track_number: u32, status: TrackStatus, message: &str) -> bool {
        match self.find(track_number) {
            Some(idx) => {
                let record = &mut self.records[idx];
                record.status = status;
                record.message = message.to_string();
                true
            }
            None => false,
        }
    }

    fn find(&self, track_number: u32) -> Option<usize> {
        self.records[..self.keyed_len]
            .binary_search_by_key(&track_number, |r| r.track_number.unwrap_or(u32::MAX))
            .ok()
    }
}
