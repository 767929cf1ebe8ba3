//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AuthType, FerryConfig};
use super::secret::secret_string;
use crate::domain::errors::FerryError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`FerryConfig`]
/// 4. Applies environment variable overrides (`FERRY_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`FerryError::Configuration`] if any of the steps above fail.
///
/// # Examples
///
/// ```no_run
/// use ferry::config::loader::load_config;
///
/// let config = load_config("ferry.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<FerryConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FerryError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FerryError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: FerryConfig = toml::from_str(&contents)
        .map_err(|e| FerryError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        FerryError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied as-is.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| FerryError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(FerryError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the `FERRY_*` prefix
///
/// Environment variables follow the pattern `FERRY_<SECTION>_<KEY>`,
/// for example `FERRY_SERVER_BASE_URL` or `FERRY_EXPORT_FORMAT`.
fn apply_env_overrides(config: &mut FerryConfig) -> Result<()> {
    if let Ok(val) = std::env::var("FERRY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Server overrides
    if let Ok(val) = std::env::var("FERRY_SERVER_BASE_URL") {
        config.server.base_url = val;
    }
    if let Ok(val) = std::env::var("FERRY_SERVER_AUTH_TYPE") {
        config.server.auth_type = match val.to_lowercase().as_str() {
            "basic" => AuthType::Basic,
            "token" => AuthType::Token,
            other => {
                return Err(FerryError::Configuration(format!(
                    "Invalid FERRY_SERVER_AUTH_TYPE '{other}'. Must be basic or token"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("FERRY_SERVER_USERNAME") {
        config.server.username = Some(val);
    }
    if let Ok(val) = std::env::var("FERRY_SERVER_PASSWORD") {
        config.server.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("FERRY_SERVER_API_TOKEN") {
        config.server.api_token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("FERRY_SERVER_TLS_VERIFY") {
        config.server.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("FERRY_SERVER_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.server.timeout_seconds = Some(secs);
        }
    }
    if let Ok(val) = std::env::var("FERRY_SERVER_PAGE_SIZE") {
        if let Ok(size) = val.parse() {
            config.server.page_size = Some(size);
        }
    }

    // Export overrides
    if let Ok(val) = std::env::var("FERRY_EXPORT_FORMAT") {
        config.export.format = val.parse().map_err(FerryError::Configuration)?;
    }
    if let Ok(val) = std::env::var("FERRY_EXPORT_OUTPUT_PATH") {
        config.export.output_path = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("FERRY_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("FERRY_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("FERRY_TEST_SUBST_VAR", "test_value");
        let input = "password = \"${FERRY_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"");
        std::env::remove_var("FERRY_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("FERRY_TEST_MISSING_VAR");
        let input = "password = \"${FERRY_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("FERRY_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("FERRY_TEST_COMMENTED_VAR");
        let input = "# password = \"${FERRY_TEST_COMMENTED_VAR}\"\nname = \"x\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(FerryError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[server]
base_url = "https://play.example.org/dhis"
username = "admin"
password = "district"

[export]
org_units = ["ImspTQPwCqd"]
programs = ["IpHINAT79UW", "eBAyeGv0exc"]
format = "json"
output_path = "out.json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.server.base_url, "https://play.example.org/dhis");
        assert_eq!(config.export.programs.len(), 2);
        assert_eq!(config.export.format, crate::config::OutputFormat::Json);
    }
}
