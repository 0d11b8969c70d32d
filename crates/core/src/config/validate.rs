use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Index limits and channel capacities are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let index = &config.index;
    for (name, value) in [
        ("index.search_limit", index.search_limit),
        ("index.command_buffer", index.command_buffer),
        ("index.event_buffer", index.event_buffer),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be 0",
                name
            )));
        }
    }

    Ok(())
}
