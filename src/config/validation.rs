//! Semantic configuration checks, run after deserialization.

use crate::config::schema::GatewayConfig;

/// A single failed semantic check.
#[derive(Debug)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a deserialized configuration.
///
/// Collects every failed check rather than stopping at the first, so a bad
/// config file is fixable in one pass.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut require = |ok: bool, field: &'static str, message: &str| {
        if !ok {
            errors.push(ValidationError {
                field,
                message: message.to_string(),
            });
        }
    };

    require(
        !config.listener.bind_address.is_empty(),
        "listener.bind_address",
        "must not be empty",
    );
    require(
        config.listener.max_body_bytes > 0,
        "listener.max_body_bytes",
        "must be greater than zero",
    );
    require(
        !config.backend.address.is_empty(),
        "backend.address",
        "must not be empty",
    );
    require(
        config.timeouts.connect_secs > 0,
        "timeouts.connect_secs",
        "must be greater than zero",
    );
    require(
        config.timeouts.write_secs > 0,
        "timeouts.write_secs",
        "must be greater than zero",
    );
    require(
        config.timeouts.read_secs > 0,
        "timeouts.read_secs",
        "must be greater than zero",
    );
    require(
        config.timeouts.request_secs > 0,
        "timeouts.request_secs",
        "must be greater than zero",
    );
    require(
        !config.auth.token_secret.is_empty(),
        "auth.token_secret",
        "must be set",
    );
    require(
        config.auth.token_ttl_secs > 0,
        "auth.token_ttl_secs",
        "must be greater than zero",
    );
    require(
        !config.database.url.is_empty(),
        "database.url",
        "must not be empty",
    );
    require(
        config.database.max_connections > 0,
        "database.max_connections",
        "must be greater than zero",
    );

    if config.health_check.enabled {
        require(
            config.health_check.interval_secs > 0,
            "health_check.interval_secs",
            "must be greater than zero",
        );
        require(
            config.health_check.timeout_secs > 0,
            "health_check.timeout_secs",
            "must be greater than zero",
        );
        require(
            config.health_check.unhealthy_threshold > 0,
            "health_check.unhealthy_threshold",
            "must be greater than zero",
        );
        require(
            config.health_check.healthy_threshold > 0,
            "health_check.healthy_threshold",
            "must be greater than zero",
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
