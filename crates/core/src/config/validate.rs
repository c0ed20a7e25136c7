use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Manager timeout, history limit and error capacity are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.manager.stop_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "manager.stop_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.manager.history_limit == 0 {
        return Err(ConfigError::ValidationError(
            "manager.history_limit cannot be 0".to_string(),
        ));
    }

    if config.manager.error_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "manager.error_capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_stop_timeout_fails() {
        let mut config = Config::default();
        config.manager.stop_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_history_limit_fails() {
        let mut config = Config::default();
        config.manager.history_limit = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_error_capacity_fails() {
        let mut config = Config::default();
        config.manager.error_capacity = 0;
        assert!(validate_config(&config).is_err());
    }
}
