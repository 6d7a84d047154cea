//! API configuration

use std::time::Duration;

use serde::Deserialize;

use core_kernel::{CoreError, Timezone};
use domain_case::{LegacyOwnerPolicy, PipelineOptions};
use infra_db::DatabaseConfig;

/// API configuration
///
/// Every field can be set from the environment with the `API_` prefix,
/// e.g. `API_PORT=9000` or `API_FIRM_TIMEZONE=America/Chicago`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled connections
    pub database_max_connections: u32,
    /// Per-statement limit in milliseconds, unset for none
    pub statement_timeout_ms: Option<u64>,
    /// Log level
    pub log_level: String,
    /// IANA zone of the firm, used to date statute countdowns
    pub firm_timezone: String,
    /// Where claims without an owner are listed
    pub legacy_owner_policy: LegacyOwnerPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/cases".to_string(),
            database_max_connections: 10,
            statement_timeout_ms: None,
            log_level: "info".to_string(),
            firm_timezone: "UTC".to_string(),
            legacy_owner_policy: LegacyOwnerPolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pipeline options derived from the firm settings
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Temporal` when `firm_timezone` is not a known zone
    pub fn pipeline_options(&self) -> Result<PipelineOptions, CoreError> {
        let timezone: Timezone = self.firm_timezone.parse()?;
        Ok(PipelineOptions {
            timezone,
            legacy_owner_policy: self.legacy_owner_policy,
        })
    }

    /// Pool settings for the case store
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` for an empty pool or a zero
    /// statement timeout
    pub fn database_config(&self) -> Result<DatabaseConfig, CoreError> {
        if self.database_max_connections == 0 {
            return Err(CoreError::configuration(
                "database_max_connections must be at least 1",
            ));
        }
        let config = DatabaseConfig::new(&self.database_url)
            .max_connections(self.database_max_connections);
        match self.statement_timeout_ms {
            Some(0) => Err(CoreError::configuration(
                "statement_timeout_ms must be positive; leave it unset for no limit",
            )),
            Some(ms) => Ok(config.statement_timeout(Duration::from_millis(ms))),
            None => Ok(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.pipeline_options().unwrap(), PipelineOptions::default());
        assert!(config.database_config().unwrap().statement_timeout.is_none());
    }

    #[test]
    fn test_firm_timezone_and_policy() {
        let config = ApiConfig {
            firm_timezone: "America/Chicago".to_string(),
            legacy_owner_policy: LegacyOwnerPolicy::Drop,
            statement_timeout_ms: Some(1500),
            ..Default::default()
        };
        let options = config.pipeline_options().unwrap();
        assert_eq!(options.timezone, "America/Chicago".parse::<Timezone>().unwrap());
        assert_eq!(options.legacy_owner_policy, LegacyOwnerPolicy::Drop);
        assert_eq!(
            config.database_config().unwrap().statement_timeout,
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let config = ApiConfig {
            firm_timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.pipeline_options(), Err(CoreError::Temporal(_))));
    }

    #[test]
    fn test_invalid_pool_settings_are_rejected() {
        let empty_pool = ApiConfig {
            database_max_connections: 0,
            ..Default::default()
        };
        assert!(matches!(empty_pool.database_config(), Err(CoreError::Configuration(_))));

        let zero_timeout = ApiConfig {
            statement_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_timeout.database_config(), Err(CoreError::Configuration(_))));
    }
}
