// crates/steering-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for steering-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use steering_config::ConfigError;
use steering_config::PrincipalConfig;
use steering_config::ServerAuthConfig;
use steering_config::ServerAuthMode;
use steering_config::SteeringConfig;
use steering_core::PrincipalRole;

/// Result type for tests that report failures as strings.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `SteeringConfig` without validating it.
pub fn config_from_toml(toml_str: &str) -> Result<SteeringConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<SteeringConfig, toml::de::Error> {
    config_from_toml("")
}

/// Builds a principal entry.
pub fn principal(name: &str, token: &str, role: PrincipalRole, ds: &[&str]) -> PrincipalConfig {
    PrincipalConfig {
        name: name.to_string(),
        token: token.to_string(),
        role,
        delivery_services: ds.iter().map(|xml_id| (*xml_id).to_string()).collect(),
    }
}

/// Returns a minimal config using bearer auth with the given principals.
pub fn config_with_principals(
    principals: Vec<PrincipalConfig>,
) -> Result<SteeringConfig, toml::de::Error> {
    let mut config = minimal_config()?;
    config.server.auth = ServerAuthConfig {
        mode: ServerAuthMode::BearerToken,
        principals,
    };
    Ok(config)
}

/// Asserts that validation failed with an `Invalid` error containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(ConfigError::Invalid(message)) if message.contains(needle) => Ok(()),
        Err(other) => Err(format!("expected invalid error containing '{needle}', got {other}")),
        Ok(()) => Err(format!("expected invalid error containing '{needle}', got ok")),
    }
}
