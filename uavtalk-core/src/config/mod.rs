//! Configuration types
//!
//! Everything that changes between flight controller releases lives here:
//! object IDs, field offsets, header layout and the stats objects used for
//! the handshake. Configuration is either parsed from TOML text or stored
//! as postcard-serialized binary data.

pub mod link;
pub mod objects;
#[cfg(feature = "serde")]
pub mod store;
#[cfg(feature = "toml")]
pub mod toml;

pub use link::*;
pub use objects::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Name longer than [`MAX_LABEL_LEN`]
    LabelTooLong,
    /// More than [`MAX_FIELDS`] fields in one object
    TooManyFields,
    /// More than [`MAX_OBJECTS`] objects in one table
    TooManyObjects,
    /// Two descriptors share an object ID
    DuplicateObjId(u32),
    /// A field extends past the maximum object size
    FieldOutOfRange { obj_id: u32, offset: u8 },
    /// A stats status byte lies outside its object
    StatusOutOfRange { obj_id: u32, offset: u8 },
    /// Zero timeout or period
    InvalidTiming,
    /// TOML text could not be parsed
    TomlParse,
    /// Binary config could not be written
    Serialize,
    /// Binary config could not be read
    Deserialize,
    /// Binary config written by an incompatible version
    VersionMismatch,
}

/// Complete configuration for one link
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UavTalkConfig {
    /// Header layout, timing and handshake objects
    pub link: LinkConfig,
    /// Objects to decode into the telemetry snapshot
    #[cfg_attr(feature = "serde", serde(default))]
    pub objects: DescriptorTable,
}

impl UavTalkConfig {
    pub fn new(link: LinkConfig, objects: DescriptorTable) -> Self {
        Self { link, objects }
    }

    /// Validate link settings and the descriptor table
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.link.validate()?;
        self.objects.validate()
    }
}
