//! Object dispatcher
//!
//! Maps a frame's object ID to its descriptor and decodes the fields into
//! the telemetry snapshot. Decoding happens into a local sample first; the
//! snapshot is only touched once every field has been read.

use heapless::Vec;
use uavtalk_protocol::{Frame, MAX_DATA_LEN};

use crate::config::{DescriptorTable, ObjectDescriptor};
use crate::telemetry::{FieldValue, ObjectKey, ObjectSample, TelemetrySnapshot};

/// Reasons an object frame was not published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// No descriptor for this object ID
    UnknownObjId(u32),
    /// Data too short for the descriptor's fields
    Truncated { obj_id: u32, needed: usize, got: usize },
    /// Snapshot has no room for a new object instance
    SnapshotFull(ObjectKey),
    /// Values do not match the descriptor (encoding only)
    FieldMismatch { obj_id: u32, index: usize },
}

/// Decodes object frames using an injected descriptor table
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: DescriptorTable,
}

impl Dispatcher {
    pub fn new(table: DescriptorTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    /// Decode `frame` and publish it to `snapshot`
    ///
    /// Returns the published key, or `None` for frames that carry nothing
    /// to decode (control frames and bodiless object frames).
    pub fn dispatch(
        &self,
        frame: &Frame,
        snapshot: &mut TelemetrySnapshot,
        now_ms: u32,
    ) -> Result<Option<ObjectKey>, DispatchError> {
        if !frame.msg_type.carries_object() {
            return Ok(None);
        }

        let descriptor = self
            .table
            .get(frame.obj_id)
            .ok_or(DispatchError::UnknownObjId(frame.obj_id))?;

        if frame.data.is_empty() {
            trace!("{=str}: bodiless, nothing to decode", descriptor.name.as_str());
            return Ok(None);
        }

        let sample = decode_object(descriptor, &frame.data, now_ms)?;
        let key = ObjectKey {
            obj_id: frame.obj_id,
            inst_id: frame.inst_id,
        };
        snapshot
            .publish(key, sample)
            .map_err(|_| DispatchError::SnapshotFull(key))?;

        trace!("{=str} published", descriptor.name.as_str());
        Ok(Some(key))
    }
}

/// Decode every field of `descriptor` from `data`
///
/// Fails without a partial result if any field lies past the end of `data`.
pub fn decode_object(
    descriptor: &ObjectDescriptor,
    data: &[u8],
    now_ms: u32,
) -> Result<ObjectSample, DispatchError> {
    let mut values = Vec::new();
    for field in &descriptor.fields {
        let value = data
            .get(field.offset as usize..)
            .and_then(|bytes| FieldValue::decode(field.kind, bytes))
            .ok_or(DispatchError::Truncated {
                obj_id: descriptor.obj_id,
                needed: descriptor.data_len(),
                got: data.len(),
            })?;
        // Descriptor and sample share the MAX_FIELDS capacity
        let _ = values.push(value);
    }
    Ok(ObjectSample {
        values,
        received_ms: now_ms,
    })
}

/// Build object data from field values, zero-filling unlisted bytes
///
/// `values` must match the descriptor's fields one-to-one in kind.
pub fn encode_object(
    descriptor: &ObjectDescriptor,
    values: &[FieldValue],
) -> Result<Vec<u8, MAX_DATA_LEN>, DispatchError> {
    let mismatch = |index| DispatchError::FieldMismatch {
        obj_id: descriptor.obj_id,
        index,
    };

    if values.len() != descriptor.fields.len() {
        return Err(mismatch(values.len().min(descriptor.fields.len())));
    }

    let mut data = [0u8; MAX_DATA_LEN];
    for (index, (field, value)) in descriptor.fields.iter().zip(values).enumerate() {
        if field.kind != value.kind() {
            return Err(mismatch(index));
        }
        value
            .encode(&mut data[field.offset as usize..])
            .ok_or(mismatch(index))?;
    }

    Vec::from_slice(&data[..descriptor.data_len()]).map_err(|_| mismatch(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldKind;
    use uavtalk_protocol::MsgType;

    const GPSTIME_OBJID: u32 = 0xD447_8084;

    fn table() -> DescriptorTable {
        let mut table = DescriptorTable::new();
        table
            .insert(
                ObjectDescriptor::new("GPSTime", GPSTIME_OBJID)
                    .and_then(|o| o.with_field("Year", 0, FieldKind::U16))
                    .and_then(|o| o.with_field("Month", 2, FieldKind::U8))
                    .and_then(|o| o.with_field("Day", 3, FieldKind::U8))
                    .unwrap(),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_dispatch_known_object() {
        let dispatcher = Dispatcher::new(table());
        let mut snapshot = TelemetrySnapshot::new();
        let frame = Frame::new(MsgType::Object, GPSTIME_OBJID, 0, &[0xE0, 0x07, 12, 24]).unwrap();

        let key = dispatcher.dispatch(&frame, &mut snapshot, 500).unwrap().unwrap();

        let sample = snapshot.get(key).unwrap();
        assert_eq!(
            &sample.values[..],
            &[FieldValue::U16(2016), FieldValue::U8(12), FieldValue::U8(24)]
        );
        assert_eq!(sample.received_ms, 500);
    }

    #[test]
    fn test_object_ack_is_decoded() {
        let dispatcher = Dispatcher::new(table());
        let mut snapshot = TelemetrySnapshot::new();
        let frame = Frame::new(MsgType::ObjectAck, GPSTIME_OBJID, 0, &[0, 0, 1, 1]).unwrap();
        assert!(dispatcher.dispatch(&frame, &mut snapshot, 0).unwrap().is_some());
    }

    #[test]
    fn test_unknown_object_dropped() {
        let dispatcher = Dispatcher::new(table());
        let mut snapshot = TelemetrySnapshot::new();
        let frame = Frame::new(MsgType::Object, 0x1234_5678, 0, &[1, 2, 3]).unwrap();

        assert_eq!(
            dispatcher.dispatch(&frame, &mut snapshot, 0),
            Err(DispatchError::UnknownObjId(0x1234_5678))
        );
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_bodiless_object_not_decoded() {
        let dispatcher = Dispatcher::new(table());
        let mut snapshot = TelemetrySnapshot::new();
        let frame = Frame::empty(MsgType::Object, GPSTIME_OBJID, 0);

        assert_eq!(dispatcher.dispatch(&frame, &mut snapshot, 0), Ok(None));
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_control_frames_ignored() {
        let dispatcher = Dispatcher::new(table());
        let mut snapshot = TelemetrySnapshot::new();
        for frame in [
            Frame::request(0x1234_5678, 0),
            Frame::empty(MsgType::Ack, GPSTIME_OBJID, 0),
            Frame::empty(MsgType::Nack, 0x1, 0),
        ] {
            assert_eq!(dispatcher.dispatch(&frame, &mut snapshot, 0), Ok(None));
        }
    }

    #[test]
    fn test_truncated_object_publishes_nothing() {
        let dispatcher = Dispatcher::new(table());
        let mut snapshot = TelemetrySnapshot::new();
        // Day (offset 3) missing
        let frame = Frame::new(MsgType::Object, GPSTIME_OBJID, 0, &[0xE0, 0x07, 12]).unwrap();

        assert_eq!(
            dispatcher.dispatch(&frame, &mut snapshot, 0),
            Err(DispatchError::Truncated {
                obj_id: GPSTIME_OBJID,
                needed: 4,
                got: 3
            })
        );
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.revision(), 0);
    }

    #[test]
    fn test_encode_object() {
        let table = table();
        let descriptor = table.get(GPSTIME_OBJID).unwrap();
        let values = [FieldValue::U16(2024), FieldValue::U8(2), FieldValue::U8(29)];

        let data = encode_object(descriptor, &values).unwrap();
        assert_eq!(&data[..], &[0xE8, 0x07, 2, 29]);
        assert_eq!(decode_object(descriptor, &data, 0).unwrap().values[..], values[..]);
    }

    #[test]
    fn test_encode_object_kind_mismatch() {
        let table = table();
        let descriptor = table.get(GPSTIME_OBJID).unwrap();
        let values = [FieldValue::U16(2024), FieldValue::I8(2), FieldValue::U8(29)];
        assert_eq!(
            encode_object(descriptor, &values),
            Err(DispatchError::FieldMismatch {
                obj_id: GPSTIME_OBJID,
                index: 1
            })
        );
    }
}
