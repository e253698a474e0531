//! Binary configuration format
//!
//! The flash-resident copy of the configuration is postcard data prefixed by
//! a one-byte format version. Reading and writing flash is up to the
//! caller; this module only converts between bytes and [`UavTalkConfig`].

use super::{ConfigError, UavTalkConfig};

/// Current binary format version
pub const CONFIG_FORMAT_VERSION: u8 = 1;

/// Serialize `config` into `buffer`, returning the used prefix
pub fn encode<'b>(config: &UavTalkConfig, buffer: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
    postcard::to_slice(&(CONFIG_FORMAT_VERSION, config), buffer).map_err(|_| ConfigError::Serialize)
}

/// Deserialize and validate a binary configuration
pub fn decode(bytes: &[u8]) -> Result<UavTalkConfig, ConfigError> {
    let (version, rest): (u8, &[u8]) =
        postcard::take_from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;

    if version != CONFIG_FORMAT_VERSION {
        warn!(
            "Config version mismatch: found {}, expected {}",
            version,
            CONFIG_FORMAT_VERSION
        );
        return Err(ConfigError::VersionMismatch);
    }

    let config: UavTalkConfig = postcard::from_bytes(rest).map_err(|_| ConfigError::Deserialize)?;
    config.validate()?;
    debug!("Decoded binary config with {} objects", config.objects.len());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DescriptorTable, FieldKind, LinkConfig, ObjectDescriptor, StatsObject};

    fn config() -> UavTalkConfig {
        let stats = |obj_id| StatsObject {
            obj_id,
            len: 37,
            status_offset: 36,
        };
        let mut objects = DescriptorTable::new();
        objects
            .insert(
                ObjectDescriptor::new("AttitudeState", 0xD7E0_D964)
                    .and_then(|o| o.with_field("Roll", 16, FieldKind::F32))
                    .and_then(|o| o.with_field("Pitch", 20, FieldKind::F32))
                    .unwrap(),
            )
            .unwrap();
        UavTalkConfig::new(LinkConfig::new(stats(0x100), stats(0x200)), objects)
    }

    #[test]
    fn test_store_roundtrip() {
        let original = config();
        let mut buffer = [0u8; 512];
        let encoded = encode(&original, &mut buffer).unwrap();
        assert_eq!(encoded[0], CONFIG_FORMAT_VERSION);

        let decoded = decode(encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_version_mismatch() {
        let mut buffer = [0u8; 512];
        let len = encode(&config(), &mut buffer).unwrap().len();
        buffer[0] = CONFIG_FORMAT_VERSION + 1;
        assert_eq!(decode(&buffer[..len]), Err(ConfigError::VersionMismatch));
    }

    #[test]
    fn test_truncated_data() {
        let mut buffer = [0u8; 512];
        let len = encode(&config(), &mut buffer).unwrap().len();
        assert_eq!(decode(&buffer[..len / 2]), Err(ConfigError::Deserialize));
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buffer = [0u8; 8];
        assert_eq!(encode(&config(), &mut buffer), Err(ConfigError::Serialize));
    }
}
