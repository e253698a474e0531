//! Telemetry snapshot
//!
//! The latest decoded value of every object instance. Samples are only
//! ever inserted whole, so a reader never sees half of an update.

use heapless::{FnvIndexMap, Vec};

use super::value::FieldValue;
use crate::config::MAX_FIELDS;

/// Object instances tracked at once (must be a power of two)
pub const SNAPSHOT_CAPACITY: usize = 32;

/// Identifies one object instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObjectKey {
    pub obj_id: u32,
    pub inst_id: u16,
}

/// One fully decoded object update
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObjectSample {
    /// Field values in descriptor order
    pub values: Vec<FieldValue, MAX_FIELDS>,
    /// Receive time (ms, caller's clock)
    pub received_ms: u32,
}

/// Snapshot has no room for another object instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SnapshotFull;

/// Latest values of all decoded objects
#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    samples: FnvIndexMap<ObjectKey, ObjectSample, SNAPSHOT_CAPACITY>,
    revision: u32,
}

impl TelemetrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sample for `key` in one step
    pub fn publish(&mut self, key: ObjectKey, sample: ObjectSample) -> Result<(), SnapshotFull> {
        match self.samples.get_mut(&key) {
            Some(slot) => *slot = sample,
            None => {
                self.samples.insert(key, sample).map_err(|_| SnapshotFull)?;
            }
        }
        self.revision = self.revision.wrapping_add(1);
        Ok(())
    }

    pub fn get(&self, key: ObjectKey) -> Option<&ObjectSample> {
        self.samples.get(&key)
    }

    /// Bumped on every publish; lets a reader skip unchanged snapshots
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectKey, &ObjectSample)> {
        self.samples.iter()
    }

    /// Forget all samples (e.g. after the link dropped)
    pub fn clear(&mut self) {
        self.samples.clear();
        self.revision = self.revision.wrapping_add(1);
    }
}
