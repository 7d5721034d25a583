use std::sync::Arc;

use chrono::Utc;
use docket_proto::EventRecord;
use docket_signals::Mut;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use ulid::Ulid;

use super::Reconciler;
use crate::{
    action_debug, action_warn,
    cache::{CacheEntry, CacheStore, CachedEvent, EntryStatus, RecordKey},
    error::InvalidTransition,
    intent::MutationIntent,
    query::QueryKey,
};

/// Where a query key is in its mutation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CyclePhase {
    /// The cache reflects the last committed server state
    Idle,
    /// A speculative change is in the cache and the server call is outstanding
    Pending,
    ResolvedSuccess,
    ResolvedFailure,
}

impl CyclePhase {
    pub fn can_advance_to(self, next: CyclePhase) -> bool {
        use CyclePhase::*;
        matches!((self, next), (Idle, Pending) | (Pending, ResolvedSuccess) | (Pending, ResolvedFailure) | (ResolvedSuccess, Idle) | (ResolvedFailure, Idle))
    }
}

/// One pass through Idle → Pending → Resolved → Idle for a single intent.
///
/// Holds the key's turn for its whole life, so no other cycle on the same key can interleave, and
/// anything scheduled on resolution is in place before the next cycle begins. Dropping a cycle that
/// is still pending (its future was cancelled mid-call) rolls it back.
pub(crate) struct MutationCycle {
    id: Ulid,
    key: QueryKey,
    intent: MutationIntent,
    reconciler: Reconciler,
    phase: CyclePhase,
    signal: Arc<Mut<CyclePhase>>,
    snapshot: Option<Arc<CacheEntry>>,
    _turn: OwnedMutexGuard<()>,
}

impl MutationCycle {
    /// Cancel refetches, snapshot, and write the speculative list, all before any await point.
    pub(crate) fn begin(
        reconciler: &Reconciler,
        key: &QueryKey,
        intent: MutationIntent,
        signal: Arc<Mut<CyclePhase>>,
        turn: OwnedMutexGuard<()>,
    ) -> Result<Self, InvalidTransition> {
        let mut cycle = Self {
            id: Ulid::new(),
            key: key.clone(),
            intent,
            reconciler: reconciler.clone(),
            phase: CyclePhase::Idle,
            signal,
            snapshot: None,
            _turn: turn,
        };

        cycle.advance(CyclePhase::Pending)?;
        if cycle.store().open_cycle(key) {
            action_debug!(cycle, "cancelled refetch");
        }
        let snapshot = cycle.store().update(key, |entry| speculate(entry, &cycle.intent));
        cycle.snapshot = Some(snapshot);
        Ok(cycle)
    }

    pub(crate) fn intent(&self) -> &MutationIntent { &self.intent }

    fn store(&self) -> &CacheStore { &self.reconciler.0.store }

    /// Swap the speculative row for the server's record, then mark the list stale and schedule
    /// its refetch.
    pub(crate) fn commit(mut self, data: Option<&EventRecord>) -> Result<Arc<CacheEntry>, InvalidTransition> {
        self.advance(CyclePhase::ResolvedSuccess)?;
        self.store().update(&self.key, |entry| settle(entry, &self.intent, data));
        self.snapshot = None;
        self.store().close_cycle(&self.key);
        self.advance(CyclePhase::Idle)?;
        self.reconciler.invalidate(&self.key);
        Ok(self.store().entry(&self.key))
    }

    /// Put the snapshot back exactly as it was taken.
    ///
    /// With `resync`, the list is refetched afterwards even if it was not stale, for failures that
    /// leave the server's state unknown.
    pub(crate) fn rollback(mut self, resync: bool) -> Result<Arc<CacheEntry>, InvalidTransition> {
        self.advance(CyclePhase::ResolvedFailure)?;
        let restored = self.restore(resync);
        self.advance(CyclePhase::Idle)?;
        Ok(restored)
    }

    fn restore(&mut self, resync: bool) -> Arc<CacheEntry> {
        if let Some(snapshot) = self.snapshot.take() {
            self.store().restore(&self.key, snapshot);
        }
        self.store().close_cycle(&self.key);
        let restored = self.store().entry(&self.key);
        // a stale entry was waiting on the refetch that begin cancelled
        if resync || restored.status == EntryStatus::Stale {
            self.reconciler.schedule_refetch(&self.key);
        }
        restored
    }

    fn advance(&mut self, next: CyclePhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_advance_to(next) {
            return Err(InvalidTransition { from: self.phase, to: next });
        }
        action_debug!(self, "phase", "{:?} -> {:?}", self.phase, next);
        self.phase = next;
        self.signal.set(next);
        Ok(())
    }
}

impl Drop for MutationCycle {
    fn drop(&mut self) {
        match self.phase {
            CyclePhase::Pending => {
                action_warn!(self, "abandoned while pending", "rolling back");
                let _ = self.advance(CyclePhase::ResolvedFailure);
                self.restore(false);
                let _ = self.advance(CyclePhase::Idle);
            }
            // resolved, but the transition back to idle failed
            CyclePhase::ResolvedSuccess | CyclePhase::ResolvedFailure => {
                self.store().close_cycle(&self.key);
                let _ = self.advance(CyclePhase::Idle);
            }
            CyclePhase::Idle => {}
        }
    }
}

impl std::fmt::Display for MutationCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.id.to_string();
        write!(f, "Cycle {} {} ({})", &id[id.len() - 6..], self.key, self.intent)
    }
}

/// The list as it should look while `intent` is in flight.
pub(crate) fn speculate(entry: &CacheEntry, intent: &MutationIntent) -> CacheEntry {
    let mut next = entry.clone();
    match intent {
        MutationIntent::Create { input, optimistic_id } => {
            next.records.push(CachedEvent::speculative_create(*optimistic_id, input, Utc::now()));
        }
        MutationIntent::Edit(input) => {
            if let Some(row) = next.records.iter_mut().find(|r| r.server_id() == Some(&input.id)) {
                row.apply_edit(input);
            }
        }
        MutationIntent::Delete(input) => next.records.retain(|r| r.server_id() != Some(&input.id)),
    }
    next
}

/// The list once the server has confirmed `intent`, with `data` as the authoritative record.
pub(crate) fn settle(entry: &CacheEntry, intent: &MutationIntent, data: Option<&EventRecord>) -> CacheEntry {
    let mut next = entry.clone();
    match intent {
        MutationIntent::Create { optimistic_id, .. } => {
            let temp = RecordKey::Temporary(*optimistic_id);
            match data {
                Some(record) => {
                    next.records.retain(|r| r.server_id() != Some(&record.id));
                    let confirmed = CachedEvent::from(record.clone());
                    match next.position(&temp) {
                        Some(index) => next.records[index] = confirmed,
                        None => next.records.push(confirmed),
                    }
                }
                None => next.records.retain(|r| r.key != temp),
            }
        }
        MutationIntent::Edit(input) => {
            if let Some(index) = next.records.iter().position(|r| r.server_id() == Some(&input.id)) {
                match data {
                    Some(record) => next.records[index] = CachedEvent::from(record.clone()),
                    None => next.records[index].speculative = false,
                }
            }
        }
        MutationIntent::Delete(input) => next.records.retain(|r| r.server_id() != Some(&input.id)),
    }
    if next.status == EntryStatus::Fresh {
        next.status = EntryStatus::Stale;
    }
    next
}
