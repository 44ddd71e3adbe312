// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::BlacklabConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates a deserialized config, collecting every problem rather than
/// stopping at the first.
pub fn validate_config(config: &BlacklabConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if config.server.port == 0 {
        fail("server.port must be between 1 and 65535".to_string());
    }

    if config.server.admin_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
        fail("server.admin_token must not be blank when set".to_string());
    }

    if config.session.timeout_secs == 0 {
        fail("session.timeout_secs must be greater than zero".to_string());
    }

    if config.session.sweep_interval_secs == 0 {
        fail("session.sweep_interval_secs must be greater than zero".to_string());
    }

    if config.session.dedup_capacity == 0 {
        fail("session.dedup_capacity must be greater than zero".to_string());
    }

    // Orders and the catalog always live in SQLite.
    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let level = config.bot.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "bot.log_level `{}` is not one of: {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.whatsapp.request_timeout_secs == 0 {
        fail("whatsapp.request_timeout_secs must be greater than zero".to_string());
    }

    if !config.whatsapp.api_base_url.starts_with("http://")
        && !config.whatsapp.api_base_url.starts_with("https://")
    {
        fail(format!(
            "whatsapp.api_base_url `{}` must start with http:// or https://",
            config.whatsapp.api_base_url
        ));
    }

    if !config.whatsapp.api_version.starts_with('v') {
        fail(format!(
            "whatsapp.api_version `{}` must look like `v20.0`",
            config.whatsapp.api_version
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &BlacklabConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&BlacklabConfig::default()).is_ok());
    }

    #[test]
    fn zero_timeout_fails() {
        let mut config = BlacklabConfig::default();
        config.session.timeout_secs = 0;
        assert!(messages(&config).iter().any(|m| m.contains("timeout_secs")));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = BlacklabConfig::default();
        config.server.host = "  ".to_string();
        config.server.port = 0;
        config.session.dedup_capacity = 0;
        config.storage.database_path = String::new();
        let msgs = messages(&config);
        assert_eq!(msgs.len(), 4, "{msgs:?}");
    }

    #[test]
    fn bad_log_level_fails() {
        let mut config = BlacklabConfig::default();
        config.bot.log_level = "loud".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("log_level")));
    }

    #[test]
    fn uppercase_log_level_is_accepted() {
        let mut config = BlacklabConfig::default();
        config.bot.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn host_with_spaces_fails() {
        let mut config = BlacklabConfig::default();
        config.server.host = "my host".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("server.host")));
    }

    #[test]
    fn blank_admin_token_fails() {
        let mut config = BlacklabConfig::default();
        config.server.admin_token = Some(" ".to_string());
        assert!(messages(&config).iter().any(|m| m.contains("admin_token")));
    }
}
