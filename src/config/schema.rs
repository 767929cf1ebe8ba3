//! Configuration schema types

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Main Ferry configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Tracker server connection
    pub server: ServerConfig,

    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FerryConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// How requests to the tracker server authenticate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// HTTP basic authentication with username and password
    #[default]
    Basic,
    /// Personal access token sent as `Authorization: ApiToken <token>`
    Token,
}

/// Tracker server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server, without the `/api` suffix
    pub base_url: String,

    /// Authentication scheme
    #[serde(default)]
    pub auth_type: AuthType,

    /// Username for basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Personal access token for token authentication
    #[serde(default)]
    pub api_token: Option<SecretString>,

    /// TLS certificate verification
    ///
    /// Only disable this against development servers with self-signed
    /// certificates.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Optional request timeout in seconds; requests never time out when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Page size for list queries; when unset every list query asks the
    /// server to skip paging and return everything in one response
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("server.base_url cannot be empty".to_string());
        }

        if url::Url::parse(&self.base_url).is_err()
            || (!self.base_url.starts_with("http://") && !self.base_url.starts_with("https://"))
        {
            return Err(format!(
                "server.base_url must be an http:// or https:// URL, got '{}'",
                self.base_url
            ));
        }

        match self.auth_type {
            AuthType::Basic => {
                if self.username.as_deref().map(str::is_empty).unwrap_or(true) {
                    return Err(
                        "server.username cannot be empty when auth_type is 'basic'".to_string()
                    );
                }
                if self
                    .password
                    .as_ref()
                    .map(|p| p.expose_secret().is_empty())
                    .unwrap_or(true)
                {
                    return Err(
                        "server.password cannot be empty when auth_type is 'basic'".to_string()
                    );
                }
            }
            AuthType::Token => {
                if self
                    .api_token
                    .as_ref()
                    .map(|t| t.expose_secret().is_empty())
                    .unwrap_or(true)
                {
                    return Err(
                        "server.api_token cannot be empty when auth_type is 'token'".to_string()
                    );
                }
            }
        }

        if self.timeout_seconds == Some(0) {
            return Err("server.timeout_seconds must be > 0 when set".to_string());
        }

        if let Some(page_size) = self.page_size {
            if page_size == 0 || page_size > 50_000 {
                return Err(format!(
                    "server.page_size must be between 1 and 50000, got {page_size}"
                ));
            }
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            auth_type: AuthType::Basic,
            username: None,
            password: None,
            api_token: None,
            tls_verify: true,
            timeout_seconds: None,
            page_size: None,
        }
    }
}

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Nested zip archive
    #[default]
    Zip,
    /// Plain JSON bundle
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zip" => Ok(OutputFormat::Zip),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Invalid output format '{other}'. Must be zip or json")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Zip => f.write_str("zip"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// Export defaults, each overridable from the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Org units to export (descendants are always included)
    #[serde(default)]
    pub org_units: Vec<String>,

    /// Programs to restrict the export to (empty = any program)
    #[serde(default)]
    pub programs: Vec<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Where to write the export
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.org_units.iter().any(|ou| ou.trim().is_empty()) {
            return Err("export.org_units cannot contain empty entries".to_string());
        }
        if self.programs.iter().any(|p| p.trim().is_empty()) {
            return Err("export.programs cannot contain empty entries".to_string());
        }
        if self.output_path.is_empty() {
            return Err("export.output_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            org_units: vec![],
            programs: vec![],
            format: OutputFormat::default(),
            output_path: default_output_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a rolling file
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation schedule (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_path() -> String {
    "export.zip".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
