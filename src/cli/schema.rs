//! Configuration schema output

use anyhow::{Context, Result};
use clap::Args;
use schemars::schema_for;

use dialog_bridge::BridgeConfig;

#[derive(Debug, Args)]
pub struct SchemaCommand {
    /// Pretty print the output
    #[arg(short, long)]
    pub pretty: bool,
}

impl SchemaCommand {
    pub fn execute(&self) -> Result<()> {
        let schema = schema_for!(BridgeConfig);
        let output = if self.pretty {
            serde_json::to_string_pretty(&schema)
        } else {
            serde_json::to_string(&schema)
        }
        .context("Failed to serialize schema")?;

        println!("{}", output);
        Ok(())
    }
}
