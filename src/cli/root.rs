use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use super::{demo::DemoCommand, schema::SchemaCommand};
use dialog_bridge::BridgeConfig;

/// Drive a UI dialog element from the controlling runtime
#[derive(Parser)]
#[command(
    name = "dialog-bridge",
    version,
    about = "Drive a UI dialog element from the controlling runtime",
    long_about = r#"Runs the dialog bridge against an in-process UI host.

Examples:
  dialog-bridge demo                          # Open and close the sample dialog
  dialog-bridge demo --modal --return-value ok
  dialog-bridge schema --pretty               # Print the config JSON schema"#
)]
pub struct Cli {
    /// Configuration file (defaults to ./dialog-bridge.json or the user config dir)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scripted session against a sample dialog
    Demo(DemoCommand),
    /// Print the configuration JSON schema
    Schema(SchemaCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => {
                let mut config = BridgeConfig::load_from_path(path).await?;
                config.load_from_env();
                config.validate()?;
                config
            }
            None => BridgeConfig::init().await?,
        };
        debug!("Configuration initialized: {:?}", config);

        match self.command {
            Commands::Demo(demo) => demo.execute(&config).await,
            Commands::Schema(schema) => schema.execute(),
        }
    }
}
