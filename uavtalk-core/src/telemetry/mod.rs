//! Decoded telemetry
//!
//! Values extracted from object frames, published for the OSD renderer.

pub mod snapshot;
pub mod value;

pub use snapshot::{ObjectKey, ObjectSample, SnapshotFull, TelemetrySnapshot, SNAPSHOT_CAPACITY};
pub use value::FieldValue;
