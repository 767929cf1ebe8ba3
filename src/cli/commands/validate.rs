//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Ferry configuration file, optionally against the live server.

use crate::adapters::tracker::TrackerClient;
use crate::config::{load_config, AuthType};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also call the server's system info endpoint with the configured credentials
    #[arg(long)]
    pub check_connection: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Server: {}", config.server.base_url);
        match config.server.auth_type {
            AuthType::Basic => println!(
                "  Auth: basic ({})",
                config.server.username.as_deref().unwrap_or("no username")
            ),
            AuthType::Token => println!("  Auth: API token"),
        }
        println!(
            "  Paging: {}",
            config
                .server
                .page_size
                .map(|size| format!("{size} per page"))
                .unwrap_or_else(|| "disabled".to_string())
        );
        println!("  Org Units: {:?}", config.export.org_units);
        println!("  Programs: {:?}", config.export.programs);
        println!("  Format: {}", config.export.format);
        println!("  Output: {}", config.export.output_path);
        println!();

        if !self.check_connection {
            return Ok(0);
        }

        let client = match TrackerClient::new(config.server.clone()) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to create tracker client: {e}");
                return Ok(4);
            }
        };

        match client.health_check().await {
            Ok(()) => {
                println!("✅ Connected to {}", config.server.base_url);
                Ok(0)
            }
            Err(e) => {
                println!("❌ Connection check failed");
                println!("   Error: {e}");
                Ok(4) // Connection error exit code
            }
        }
    }
}
