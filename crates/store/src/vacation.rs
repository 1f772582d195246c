//! Per-participant vacation intervals with overlap validation.
//!
//! Intervals are closed date ranges. For a single owner no two intervals may
//! overlap, touching endpoints included; the check runs at insertion time
//! only. Each interval carries two announcement flags consumed by the
//! scheduler, permanent once set.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rota_core::{RotaError, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A closed vacation date range with announcement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationInterval {
    pub id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub announced_start: bool,
    pub announced_end: bool,
}

impl VacationInterval {
    /// Whether `date` falls inside the interval (bounds inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }
}

/// Vacation intervals keyed by owner, in insertion order per owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacationStore {
    by_owner: BTreeMap<UserId, Vec<VacationInterval>>,
}

impl VacationStore {
    /// Record a new vacation for `owner`.
    ///
    /// Rejects `start > end` with [`RotaError::InvalidRange`] and any
    /// conflict with an existing interval of the same owner with
    /// [`RotaError::Overlap`]. On success the interval is stored with a
    /// fresh id and both announcement flags cleared.
    pub fn add(
        &mut self,
        owner: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<&VacationInterval, RotaError> {
        if start > end {
            return Err(RotaError::InvalidRange);
        }
        let list = self.by_owner.entry(owner).or_default();
        if list.iter().any(|iv| iv.overlaps(start, end)) {
            return Err(RotaError::Overlap);
        }
        let idx = list.len();
        list.push(VacationInterval {
            id: Uuid::new_v4(),
            start,
            end,
            announced_start: false,
            announced_end: false,
        });
        Ok(&list[idx])
    }

    /// Intervals of `owner` in insertion order (1-based display indices).
    pub fn list_for(&self, owner: UserId) -> &[VacationInterval] {
        self.by_owner.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Delete the `index`-th (1-based) interval of `owner`.
    ///
    /// Drops the owner key entirely when its list becomes empty.
    pub fn delete_at(
        &mut self,
        owner: UserId,
        index: usize,
    ) -> Result<VacationInterval, RotaError> {
        let list = match self.by_owner.get_mut(&owner) {
            Some(list) => list,
            None => return Err(RotaError::OutOfRange(index)),
        };
        if index == 0 || index > list.len() {
            return Err(RotaError::OutOfRange(index));
        }
        let removed = list.remove(index - 1);
        if list.is_empty() {
            self.by_owner.remove(&owner);
        }
        Ok(removed)
    }

    /// Set the start-announced flag of an interval. Idempotent; unknown ids
    /// are a no-op.
    pub fn mark_announced_start(&mut self, interval_id: Uuid) {
        if let Some(iv) = self.find_mut(interval_id) {
            iv.announced_start = true;
        }
    }

    /// Set the end-announced flag of an interval. Idempotent; unknown ids
    /// are a no-op.
    pub fn mark_announced_end(&mut self, interval_id: Uuid) {
        if let Some(iv) = self.find_mut(interval_id) {
            iv.announced_end = true;
        }
    }

    /// Whether `owner` is on vacation on `date`.
    pub fn is_on_vacation(&self, owner: UserId, date: NaiveDate) -> bool {
        self.list_for(owner).iter().any(|iv| iv.contains(date))
    }

    /// Iterate `(owner, intervals)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &[VacationInterval])> {
        self.by_owner.iter().map(|(owner, list)| (*owner, list.as_slice()))
    }

    fn find_mut(&mut self, interval_id: Uuid) -> Option<&mut VacationInterval> {
        self.by_owner
            .values_mut()
            .flatten()
            .find(|iv| iv.id == interval_id)
    }
}
