//! TOML configuration
//!
//! Descriptor tables are generated per firmware release and shipped as TOML:
//!
//! ```toml
//! [link]
//! header = "extended"
//! flight_stats = { obj_id = 0x6737BB5A, len = 37, status_offset = 36 }
//! gcs_stats = { obj_id = 0xCAD1DC0A, len = 37, status_offset = 36 }
//!
//! [[objects]]
//! name = "GPSTime"
//! obj_id = 0xD4478084
//! fields = [
//!     { name = "Year", offset = 0, kind = "u16" },
//!     { name = "Month", offset = 2, kind = "u8" },
//! ]
//! ```

use super::{ConfigError, UavTalkConfig};

/// Parse and validate a TOML configuration
pub fn parse(input: &str) -> Result<UavTalkConfig, ConfigError> {
    let config: UavTalkConfig = ::toml::from_str(input).map_err(|_| {
        warn!("TOML parse error");
        ConfigError::TomlParse
    })?;

    config.validate()?;
    log_config_summary(&config);
    Ok(config)
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &UavTalkConfig) {
    info!("Configuration loaded successfully");
    debug!("  header {}", config.link.header);
    debug!("  passive {}", config.link.passive);
    debug!("  {} objects", config.objects.len());
}
