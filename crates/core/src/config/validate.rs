use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Download section exists (enforced by serde)
/// - Server port is not 0
/// - Run defaults form a valid run request
/// - Timeouts are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    config
        .download
        .to_run_request()
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("download: {}", e)))?;

    if config.fetcher.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.downloader.navigation_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.navigation_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.downloader.referer.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloader.referer cannot be empty".to_string(),
        ));
    }

    Ok(())
}
