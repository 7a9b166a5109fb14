use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Specifier the UI host resolves to the dialog bridge module
pub const DEFAULT_MODULE_SPECIFIER: &str = "./_content/dialog-bridge/dialogBridge.js";

/// How `removeAllCloseCallbacks` selects the listeners it detaches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallbackScope {
    /// Only listeners registered for the same dialog id
    #[default]
    PerDialog,
    /// Every listener ever registered with the module, regardless of dialog id
    Global,
}

impl std::str::FromStr for CallbackScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "per_dialog" | "per-dialog" | "dialog" => Ok(CallbackScope::PerDialog),
            "global" => Ok(CallbackScope::Global),
            other => Err(anyhow::anyhow!("Unknown callback scope: {}", other)),
        }
    }
}

/// Bridge configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BridgeConfig {
    /// Module specifier imported on first use
    #[serde(default = "default_module_specifier")]
    pub module_specifier: String,

    /// Controlling-side module that close callbacks dispatch to by default
    #[serde(default)]
    pub calling_module_name: Option<String>,

    /// Listener selection for callback removal
    #[serde(default)]
    pub callback_scope: CallbackScope,

    /// Upper bound for a single bridge round trip; unset waits indefinitely
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
}

fn default_module_specifier() -> String {
    DEFAULT_MODULE_SPECIFIER.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_specifier: default_module_specifier(),
            calling_module_name: None,
            callback_scope: CallbackScope::default(),
            call_timeout_ms: None,
        }
    }
}

impl BridgeConfig {
    /// Initialize configuration from file and environment
    pub async fn init() -> Result<Self> {
        debug!("Initializing bridge configuration");

        let mut config = Self::load_from_file().await?.unwrap_or_default();
        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `DIALOG_BRIDGE_*` environment overrides
    pub fn load_from_env(&mut self) {
        if let Ok(specifier) = std::env::var("DIALOG_BRIDGE_MODULE") {
            self.module_specifier = specifier;
        }

        if let Ok(name) = std::env::var("DIALOG_BRIDGE_CALLING_MODULE") {
            self.calling_module_name = Some(name);
        }

        if let Ok(scope) = std::env::var("DIALOG_BRIDGE_CALLBACK_SCOPE") {
            match scope.parse() {
                Ok(scope) => self.callback_scope = scope,
                Err(e) => debug!("Ignoring DIALOG_BRIDGE_CALLBACK_SCOPE: {}", e),
            }
        }

        if let Ok(timeout_str) = std::env::var("DIALOG_BRIDGE_CALL_TIMEOUT_MS") {
            if let Ok(timeout) = timeout_str.parse() {
                self.call_timeout_ms = Some(timeout);
            }
        }
    }

    /// Candidate config files, highest priority first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./dialog-bridge.json")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("dialog-bridge").join("config.json"));
        }
        paths
    }

    /// Load the first config file that exists
    pub async fn load_from_file() -> Result<Option<Self>> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }
        Ok(None)
    }

    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.module_specifier.trim().is_empty() {
            return Err(anyhow::anyhow!("module_specifier must not be empty"));
        }

        if let Some(name) = &self.calling_module_name {
            if name.trim().is_empty() {
                return Err(anyhow::anyhow!("calling_module_name must not be empty when set"));
            }
        }

        if self.call_timeout_ms == Some(0) {
            return Err(anyhow::anyhow!("call_timeout_ms must be greater than 0"));
        }

        Ok(())
    }
}
