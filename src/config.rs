//! Provider configuration loaded via `ortho-config`.
//!
//! The configuration is an explicit value handed to the session gateway; no
//! operation resolves settings from ambient state at call time.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default remote shell used to interpret generated scripts.
pub const DEFAULT_REMOTE_SHELL: &str = "/bin/bash";

/// Default storage-management tool invoked on the node.
pub const DEFAULT_STORAGE_TOOL: &str = "pvesm";

/// SSH and remote tool settings merged from defaults, configuration files,
/// environment variables, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "PVEDISK",
    discovery(
        app_name = "pvedisk",
        env_var = "PVEDISK_CONFIG_PATH",
        config_file_name = "pvedisk.toml",
        dotfile_name = ".pvedisk.toml",
        project_file_name = "pvedisk.toml"
    )
)]
pub struct ProviderConfig {
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
    /// Remote user to connect as; `pvesm` requires root on the node.
    #[ortho_config(default = "root".to_owned())]
    pub ssh_user: String,
    /// TCP port of the node's SSH daemon.
    #[ortho_config(default = 22)]
    pub ssh_port: u16,
    /// Host name pattern; `{node}` is replaced with the node name.
    #[ortho_config(default = "{node}".to_owned())]
    pub ssh_host_template: String,
    /// Whether to force batch mode for SSH to avoid password prompts.
    #[ortho_config(default = true)]
    pub ssh_batch_mode: bool,
    /// Whether to enforce host key checking.
    #[ortho_config(default = true)]
    pub ssh_strict_host_key_checking: bool,
    /// Known hosts file override. Supports tilde expansion.
    pub ssh_known_hosts_file: Option<String>,
    /// Private key used for authentication. Supports tilde expansion; when
    /// absent SSH falls back to its default key locations.
    pub ssh_identity_file: Option<String>,
    /// Shell used to interpret generated scripts on the node.
    #[ortho_config(default = DEFAULT_REMOTE_SHELL.to_owned())]
    pub remote_shell: String,
    /// Storage-management tool invoked by generated scripts.
    #[ortho_config(default = DEFAULT_STORAGE_TOOL.to_owned())]
    pub storage_tool: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(env_var: &'static str, toml_key: &'static str) -> Self {
        Self { env_var, toml_key }
    }
}

impl ProviderConfig {
    /// Loads configuration using the default argument iterator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when merging sources fails.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("pvedisk")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Ensures required values are present after trimming whitespace and
    /// that optional values, when given, are not blank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a value is empty, or
    /// [`ConfigError::InvalidField`] when the port is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_value(
            &self.ssh_bin,
            &FieldMetadata::new("PVEDISK_SSH_BIN", "ssh_bin"),
        )?;
        Self::require_value(
            &self.ssh_user,
            &FieldMetadata::new("PVEDISK_SSH_USER", "ssh_user"),
        )?;
        Self::require_value(
            &self.ssh_host_template,
            &FieldMetadata::new("PVEDISK_SSH_HOST_TEMPLATE", "ssh_host_template"),
        )?;
        Self::require_optional_value(
            self.ssh_known_hosts_file.as_deref(),
            &FieldMetadata::new("PVEDISK_SSH_KNOWN_HOSTS_FILE", "ssh_known_hosts_file"),
        )?;
        Self::require_optional_value(
            self.ssh_identity_file.as_deref(),
            &FieldMetadata::new("PVEDISK_SSH_IDENTITY_FILE", "ssh_identity_file"),
        )?;
        Self::require_value(
            &self.remote_shell,
            &FieldMetadata::new("PVEDISK_REMOTE_SHELL", "remote_shell"),
        )?;
        Self::require_value(
            &self.storage_tool,
            &FieldMetadata::new("PVEDISK_STORAGE_TOOL", "storage_tool"),
        )?;
        if self.ssh_port == 0 {
            return Err(ConfigError::InvalidField(String::from(
                "ssh_port must be between 1 and 65535: set PVEDISK_SSH_PORT or add ssh_port to pvedisk.toml",
            )));
        }
        Ok(())
    }

    fn require_value(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        Self::require_optional_value(Some(value), metadata)
    }

    fn require_optional_value(
        value: Option<&str>,
        metadata: &FieldMetadata,
    ) -> Result<(), ConfigError> {
        match value {
            None => Ok(()),
            Some(v) if !v.trim().is_empty() => Ok(()),
            Some(_) => Err(ConfigError::MissingField(format!(
                "missing {key}: set {env} or add {key} to pvedisk.toml",
                key = metadata.toml_key,
                env = metadata.env_var,
            ))),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration field holds an unusable value.
    #[error("invalid configuration field: {0}")]
    InvalidField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
