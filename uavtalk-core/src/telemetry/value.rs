//! Decoded field values

use crate::config::FieldKind;

/// A single decoded field
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
}

impl FieldValue {
    /// Decode a little-endian value of `kind` from the start of `bytes`
    ///
    /// Returns `None` if `bytes` is shorter than the kind's width.
    pub fn decode(kind: FieldKind, bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..kind.width())?;
        let value = match kind {
            FieldKind::U8 => FieldValue::U8(raw[0]),
            FieldKind::I8 => FieldValue::I8(raw[0] as i8),
            FieldKind::U16 => FieldValue::U16(u16::from_le_bytes([raw[0], raw[1]])),
            FieldKind::I16 => FieldValue::I16(i16::from_le_bytes([raw[0], raw[1]])),
            FieldKind::U32 => FieldValue::U32(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
            FieldKind::I32 => FieldValue::I32(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
            FieldKind::F32 => FieldValue::F32(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        };
        Some(value)
    }

    /// Write the little-endian representation into the start of `out`
    ///
    /// Returns the number of bytes written, or `None` if `out` is too short.
    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        let width = self.kind().width();
        let dst = out.get_mut(..width)?;
        match *self {
            FieldValue::U8(v) => dst[0] = v,
            FieldValue::I8(v) => dst[0] = v as u8,
            FieldValue::U16(v) => dst.copy_from_slice(&v.to_le_bytes()),
            FieldValue::I16(v) => dst.copy_from_slice(&v.to_le_bytes()),
            FieldValue::U32(v) => dst.copy_from_slice(&v.to_le_bytes()),
            FieldValue::I32(v) => dst.copy_from_slice(&v.to_le_bytes()),
            FieldValue::F32(v) => dst.copy_from_slice(&v.to_le_bytes()),
        }
        Some(width)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::U8(_) => FieldKind::U8,
            FieldValue::I8(_) => FieldKind::I8,
            FieldValue::U16(_) => FieldKind::U16,
            FieldValue::I16(_) => FieldKind::I16,
            FieldValue::U32(_) => FieldKind::U32,
            FieldValue::I32(_) => FieldKind::I32,
            FieldValue::F32(_) => FieldKind::F32,
        }
    }

    /// Integer value, if this is an integer field
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::U8(v) => Some(v as i64),
            FieldValue::I8(v) => Some(v as i64),
            FieldValue::U16(v) => Some(v as i64),
            FieldValue::I16(v) => Some(v as i64),
            FieldValue::U32(v) => Some(v as i64),
            FieldValue::I32(v) => Some(v as i64),
            FieldValue::F32(_) => None,
        }
    }

    /// Value as a float (lossy for large 32-bit integers)
    pub fn as_f32(&self) -> f32 {
        match *self {
            FieldValue::F32(v) => v,
            _ => self.as_i64().unwrap_or_default() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_little_endian() {
        assert_eq!(
            FieldValue::decode(FieldKind::U16, &[0xE0, 0x07]),
            Some(FieldValue::U16(2016))
        );
        assert_eq!(
            FieldValue::decode(FieldKind::I32, &[0xFF, 0xFF, 0xFF, 0xFF]),
            Some(FieldValue::I32(-1))
        );
        assert_eq!(
            FieldValue::decode(FieldKind::F32, &1.5f32.to_le_bytes()),
            Some(FieldValue::F32(1.5))
        );
        assert_eq!(FieldValue::decode(FieldKind::I8, &[0x80]), Some(FieldValue::I8(-128)));
    }

    #[test]
    fn test_decode_short_input() {
        assert_eq!(FieldValue::decode(FieldKind::U32, &[1, 2, 3]), None);
        assert_eq!(FieldValue::decode(FieldKind::U8, &[]), None);
    }

    #[test]
    fn test_encode_matches_decode() {
        let mut buf = [0u8; 4];
        let value = FieldValue::I16(-1234);
        assert_eq!(value.encode(&mut buf), Some(2));
        assert_eq!(FieldValue::decode(FieldKind::I16, &buf), Some(value));
        assert_eq!(FieldValue::U32(1).encode(&mut buf[..3]), None);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(FieldValue::U8(12).as_i64(), Some(12));
        assert_eq!(FieldValue::F32(2.5).as_i64(), None);
        assert_eq!(FieldValue::I32(-7).as_f32(), -7.0);
        assert_eq!(FieldValue::F32(0.25).kind(), FieldKind::F32);
    }
}
