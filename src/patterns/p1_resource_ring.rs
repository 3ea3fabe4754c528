//! # Resource ring
//! N participants sit in a circle with a unit between every two neighbours.
//! Participant `i` needs unit `i` on the left and unit `(i+1) mod N` on the right at the same time.
//!
//! Taking left then right naively can deadlock: everyone holds its left unit and waits for the right one forever.
//! That cycle needs all N participants holding a unit each. An admission pool of N-1 permits
//! keeps at least one of them out of the contention, so one unit is always free and somebody always proceeds.
//!
//! No fairness though: a participant can be passed over again and again by its neighbours.

use tracing::trace;

use crate::{
    error::{ConfigError, SyncError},
    primitives::{BinaryLock, PermitPool},
};

pub struct ResourceRing {
    units: Vec<BinaryLock<()>>,
    /// N-1 permits
    admission: PermitPool,
}

impl ResourceRing {
    pub fn new(participants: usize) -> Result<Self, ConfigError> {
        if participants < 2 {
            return Err(ConfigError::TooFewParticipants(participants));
        }
        Ok(Self {
            units: (0..participants).map(|_| BinaryLock::new(())).collect(),
            admission: PermitPool::new(participants - 1),
        })
    }

    pub fn participants(&self) -> usize {
        self.units.len()
    }

    /// Left and right unit of the participant
    pub fn seats(&self, id: usize) -> Result<(usize, usize), SyncError> {
        let participants = self.participants();
        if id >= participants {
            return Err(SyncError::UnknownParticipant { id, participants });
        }
        Ok((id, (id + 1) % participants))
    }

    /// Blocks until the participant holds both of its units.
    ///
    /// Order: admission permit, left unit, right unit.
    /// If a unit turns out to be misused (e.g. already held by this thread),
    /// whatever was taken so far is given back before the error is returned.
    /// One thread playing two participants can still block itself on the admission pool.
    pub fn enter(&self, id: usize) -> Result<(), SyncError> {
        let (left, right) = self.seats(id)?;

        self.admission.acquire();
        if let Err(e) = self.units[left].acquire() {
            self.admission.release()?;
            return Err(e);
        }
        if let Err(e) = self.units[right].acquire() {
            self.units[left].release()?;
            self.admission.release()?;
            return Err(e);
        }

        trace!(participant = id, left, right, "holding both units");
        Ok(())
    }

    /// Releases right, then left, then the admission permit.
    ///
    /// Both units are checked first, a wrong call leaves the ring untouched.
    pub fn leave(&self, id: usize) -> Result<(), SyncError> {
        let (left, right) = self.seats(id)?;
        if !self.units[left].is_held_by_current_thread()
            || !self.units[right].is_held_by_current_thread()
        {
            return Err(SyncError::NotHolder);
        }

        self.units[right].release()?;
        self.units[left].release()?;
        self.admission.release()?;

        trace!(participant = id, left, right, "released both units");
        Ok(())
    }

    /// `enter`, do the work, `leave`
    pub fn occupy<R>(&self, id: usize, work: impl FnOnce() -> R) -> Result<R, SyncError> {
        self.enter(id)?;
        let result = work();
        self.leave(id)?;
        Ok(result)
    }
}
