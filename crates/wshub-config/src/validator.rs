//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_websocket(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.server.host == "0.0.0.0" || config.server.host == "::" {
            result.add_warning(ValidationWarning::new(
                "server.host",
                "Listening on all interfaces",
            ));
        }
    }

    fn validate_websocket(config: &Config, result: &mut ValidationResult) {
        let ws = &config.websocket;

        if !ws.path.starts_with('/') {
            result.add_error(ValidationError::new(
                "websocket.path",
                "path must start with '/'",
            ));
        }

        if ws.max_payload == 0 {
            result.add_error(ValidationError::new(
                "websocket.max_payload",
                "max_payload must be greater than 0",
            ));
        }

        if ws.heartbeat {
            if ws.heartbeat_interval == 0 {
                result.add_error(ValidationError::new(
                    "websocket.heartbeat_interval",
                    "heartbeat_interval must be greater than 0",
                ));
            } else if ws.heartbeat_interval < 1_000 {
                result.add_warning(ValidationWarning::new(
                    "websocket.heartbeat_interval",
                    "heartbeat_interval below 1000ms sends a probe more than once per second",
                ));
            }
        }

        if ws.max_missed_probes == Some(0) {
            result.add_error(ValidationError::new(
                "websocket.max_missed_probes",
                "max_missed_probes must be at least 1 when set",
            ));
        }

        if ws.max_missed_probes.is_some() && !ws.heartbeat {
            result.add_warning(ValidationWarning::new(
                "websocket.max_missed_probes",
                "max_missed_probes has no effect while heartbeat is disabled",
            ));
        }

        for origin in &ws.allowed_origins {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                result.add_error(ValidationError::new(
                    "websocket.allowed_origins",
                    format!("Origin must start with http:// or https://: {}", origin),
                ));
            }
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "level cannot be empty",
            ));
        }
    }
}
