//! Roster of duty participants and their rotation positions.
//!
//! Position `1` is the currently serving participant; higher positions are
//! deeper in the queue. Positions form a permutation of `1..=N`, except
//! between a removal and the next rotation advance, which re-establishes
//! contiguity.

use rota_core::{RotaError, UserId};
use serde::{Deserialize, Serialize};

/// A duty participant.
///
/// `display_name` is captured when the participant is added and is not kept
/// in sync with later profile changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
    pub position: u32,
}

/// Ordered set of duty participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterStore {
    participants: Vec<Participant>,
}

impl RosterStore {
    /// Add a participant at the back of the rotation queue.
    ///
    /// The new position is the current maximum plus one (`1` on an empty
    /// roster). Returns [`RotaError::AlreadyExists`] without mutating if the
    /// id is already present.
    pub fn add(
        &mut self,
        id: UserId,
        display_name: impl Into<String>,
    ) -> Result<&Participant, RotaError> {
        if self.get(id).is_some() {
            return Err(RotaError::AlreadyExists(id));
        }
        let position = self
            .participants
            .iter()
            .map(|p| p.position)
            .max()
            .unwrap_or(0)
            + 1;
        let idx = self.participants.len();
        self.participants.push(Participant {
            id,
            display_name: display_name.into(),
            position,
        });
        Ok(&self.participants[idx])
    }

    /// Remove a participant.
    ///
    /// Survivors keep their positions; the resulting gap is closed by the
    /// next rotation advance.
    pub fn remove(&mut self, id: UserId) -> Result<Participant, RotaError> {
        match self.participants.iter().position(|p| p.id == id) {
            Some(idx) => Ok(self.participants.remove(idx)),
            None => Err(RotaError::NotFound(id)),
        }
    }

    pub fn get(&self, id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Rotation position of a participant, if present.
    pub fn position_of(&self, id: UserId) -> Option<u32> {
        self.get(id).map(|p| p.position)
    }

    /// The participant currently serving (lowest position).
    pub fn current(&self) -> Option<&Participant> {
        self.participants.iter().min_by_key(|p| p.position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
