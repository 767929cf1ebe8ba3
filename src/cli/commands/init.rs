//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "ferry.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Ferry configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your server and org units", self.output);
                println!("  2. Put credentials in a .env file:");
                println!("     - FERRY_SERVER_USERNAME and FERRY_SERVER_PASSWORD, or");
                println!("     - FERRY_SERVER_API_TOKEN with auth_type = \"token\"");
                println!("  3. Validate configuration: ferry validate-config --check-connection");
                println!("  4. Run export: ferry export --last-updated 2024-01-01");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Ferry Configuration File

[application]
log_level = "info"

[server]
base_url = "https://play.example.org/dhis"
auth_type = "basic"
username = "${FERRY_SERVER_USERNAME}"
password = "${FERRY_SERVER_PASSWORD}"

[export]
org_units = []
programs = []
format = "zip"
output_path = "export.zip"

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Ferry Configuration File
# Tracker event export with dependency backfill
#
# Values of the form ${VAR} are read from the environment (or .env).
# Any setting can also be overridden with FERRY_<SECTION>_<KEY>,
# e.g. FERRY_SERVER_BASE_URL or FERRY_EXPORT_FORMAT.

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

[server]
# Base URL of the tracker server, without /api
base_url = "https://play.example.org/dhis"

# Authentication: "basic" (username + password) or "token" (personal access token)
auth_type = "basic"
username = "${FERRY_SERVER_USERNAME}"
password = "${FERRY_SERVER_PASSWORD}"
# api_token = "${FERRY_SERVER_API_TOKEN}"

# TLS certificate verification (only disable for self-signed development servers)
tls_verify = true

# Request timeout in seconds; requests never time out when unset
# timeout_seconds = 120

# Page size for list queries; when unset every query asks for all records at once
# page_size = 500

[export]
# Org units to export; descendants are always included
org_units = ["ImspTQPwCqd"]

# Programs to restrict the export to; empty means any program
programs = []

# Output format: "zip" (zip of events.zip, trackedEntityInstances.zip,
# enrollments.zip) or "json" (one JSON document)
format = "zip"
output_path = "export.zip"

[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "logs"

# Rotation: daily or hourly
local_rotation = "daily"
"#
        .to_string()
    }
}
