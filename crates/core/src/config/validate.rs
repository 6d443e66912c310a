use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Database path is not empty
/// - CORS origins are http(s) URLs
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.path cannot be empty".to_string(),
        ));
    }

    for origin in &config.cors.origins {
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "cors.origins entry '{}' must start with http:// or https://",
                origin
            )));
        }
    }

    Ok(())
}
