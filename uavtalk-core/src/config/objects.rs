//! Object descriptor tables
//!
//! UAVTalk object IDs are a hash of the object definition, so every
//! firmware release has its own IDs and field offsets. The tables below are
//! produced outside this crate (from the release's XML definitions) and
//! injected as configuration.

use heapless::{String, Vec};

use super::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum object or field name length
pub const MAX_LABEL_LEN: usize = 24;

/// Maximum decoded fields per object
pub const MAX_FIELDS: usize = 16;

/// Maximum objects per table
pub const MAX_OBJECTS: usize = 16;

/// Largest object data size the wire format allows
pub const MAX_OBJECT_LEN: usize = 255;

/// Wire type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
}

impl FieldKind {
    /// Width on the wire in bytes
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::I8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 | FieldKind::I32 | FieldKind::F32 => 4,
        }
    }
}

/// One decoded field of an object
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldDescriptor {
    /// Field name as in the object definition
    pub name: String<MAX_LABEL_LEN>,
    /// Byte offset inside the object data
    pub offset: u8,
    /// Wire type
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Create a field descriptor
    pub fn new(name: &str, offset: u8, kind: FieldKind) -> Result<Self, ConfigError> {
        Ok(Self {
            name: label(name)?,
            offset,
            kind,
        })
    }

    /// Width on the wire in bytes
    pub fn width(&self) -> usize {
        self.kind.width()
    }

    /// One past the last byte this field occupies
    pub fn end(&self) -> usize {
        self.offset as usize + self.width()
    }
}

/// Decoding recipe for one object type
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectDescriptor {
    /// Object name, e.g. "AttitudeState"
    pub name: String<MAX_LABEL_LEN>,
    /// Release-specific object ID
    pub obj_id: u32,
    /// Fields to decode, in publication order
    pub fields: Vec<FieldDescriptor, MAX_FIELDS>,
}

impl ObjectDescriptor {
    /// Create a descriptor with no fields
    pub fn new(name: &str, obj_id: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            name: label(name)?,
            obj_id,
            fields: Vec::new(),
        })
    }

    /// Append a field (builder style)
    pub fn with_field(mut self, name: &str, offset: u8, kind: FieldKind) -> Result<Self, ConfigError> {
        let field = FieldDescriptor::new(name, offset, kind)?;
        self.fields
            .push(field)
            .map_err(|_| ConfigError::TooManyFields)?;
        Ok(self)
    }

    /// Position of a field in publication order
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.as_str() == name)
    }

    /// Minimum data length needed to decode every field
    pub fn data_len(&self) -> usize {
        self.fields.iter().map(FieldDescriptor::end).max().unwrap_or(0)
    }

    /// Check that every field fits inside a maximum-size object
    pub fn validate(&self) -> Result<(), ConfigError> {
        for field in &self.fields {
            if field.end() > MAX_OBJECT_LEN {
                return Err(ConfigError::FieldOutOfRange {
                    obj_id: self.obj_id,
                    offset: field.offset,
                });
            }
        }
        Ok(())
    }
}

/// All objects known for one firmware release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DescriptorTable {
    objects: Vec<ObjectDescriptor, MAX_OBJECTS>,
}

impl DescriptorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, rejecting duplicate IDs
    pub fn insert(&mut self, object: ObjectDescriptor) -> Result<(), ConfigError> {
        object.validate()?;
        if self.get(object.obj_id).is_some() {
            return Err(ConfigError::DuplicateObjId(object.obj_id));
        }
        self.objects
            .push(object)
            .map_err(|_| ConfigError::TooManyObjects)
    }

    /// Look up an object by ID
    pub fn get(&self, obj_id: u32) -> Option<&ObjectDescriptor> {
        self.objects.iter().find(|o| o.obj_id == obj_id)
    }

    /// Look up an object by name
    pub fn by_name(&self, name: &str) -> Option<&ObjectDescriptor> {
        self.objects.iter().find(|o| o.name.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectDescriptor> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Check field ranges and ID uniqueness
    ///
    /// Needed for tables that did not go through [`insert`](Self::insert),
    /// i.e. deserialized ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, object) in self.objects.iter().enumerate() {
            object.validate()?;
            if self.objects[..i].iter().any(|o| o.obj_id == object.obj_id) {
                return Err(ConfigError::DuplicateObjId(object.obj_id));
            }
        }
        Ok(())
    }
}

fn label(name: &str) -> Result<String<MAX_LABEL_LEN>, ConfigError> {
    let mut s = String::new();
    s.push_str(name).map_err(|_| ConfigError::LabelTooLong)?;
    Ok(s)
}
