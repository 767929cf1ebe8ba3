//! Configuration management for Ferry.
//!
//! Ferry reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `FERRY_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [server]
//! base_url = "https://play.example.org/dhis"
//! username = "admin"
//! password = "${FERRY_SERVER_PASSWORD}"
//!
//! [export]
//! org_units = ["ImspTQPwCqd"]
//! programs = ["IpHINAT79UW"]
//! format = "zip"
//! output_path = "export.zip"
//! ```
//!
//! # Sections
//!
//! - [`ApplicationConfig`] - log level
//! - [`ServerConfig`] - tracker server connection and authentication
//! - [`ExportConfig`] - default org units, programs and output
//! - [`LoggingConfig`] - optional rolling file logs

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, AuthType, ExportConfig, FerryConfig, LoggingConfig, OutputFormat,
    ServerConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
