// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Server Configuration
//!
//! This module provides configuration management for the server.
//!
//! ## Configuration Structure
//!
//! The server configuration includes:
//! - Recompilation timing (debounce quiet period, compile timeout)
//! - Compiler invocation settings (executable, project and profiles paths)
//!
//! Configuration arrives as the `initialization_options` value of the LSP
//! `initialize` request:
//!
//! ```json
//! {
//!   "compileDebounceMs": 300,
//!   "compileTimeoutSecs": 60,
//!   "compiler": {
//!     "command": "dbt",
//!     "projectDir": "/work/analytics",
//!     "profilesDir": "/home/user/.dbt"
//!   }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::scheduler::SchedulerSettings;

/// Default quiet period in milliseconds
const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default compile timeout in seconds
const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 60;

/// Default compiler executable
const DEFAULT_COMPILER_COMMAND: &str = "dbt";

/// Compiler invocation settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerSettings {
    /// Compiler executable name or path
    pub command: String,

    /// Directory containing the model project; defaults to the process's
    /// working directory
    pub project_dir: Option<PathBuf>,

    /// Profiles directory passed to every invocation
    pub profiles_dir: Option<PathBuf>,

    /// Directory (relative to the project) searched for compiled artifacts
    pub target_path: Option<PathBuf>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMPILER_COMMAND.to_string(),
            project_dir: None,
            profiles_dir: None,
            target_path: None,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Quiet period between the last edit and a compile, in milliseconds
    pub compile_debounce_ms: u64,

    /// Upper bound for one compile run, in seconds
    pub compile_timeout_secs: u64,

    /// Compiler invocation settings
    pub compiler: CompilerSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            compile_debounce_ms: DEFAULT_DEBOUNCE_MS,
            compile_timeout_secs: DEFAULT_COMPILE_TIMEOUT_SECS,
            compiler: CompilerSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Decode configuration from LSP initialization options
    ///
    /// Missing options or undecodable values fall back to defaults with a
    /// warning; a malformed client must not keep the server from starting.
    pub fn from_initialization_options(options: Option<Value>) -> Self {
        let Some(value) = options else {
            return Self::default();
        };

        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid initialization options, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compile_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "compileTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        if self.compiler.command.is_empty() {
            return Err(ConfigError::Invalid(
                "compiler.command must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Scheduler timing derived from this configuration
    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            debounce: Duration::from_millis(self.compile_debounce_ms),
            compile_timeout: Duration::from_secs(self.compile_timeout_secs),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configured value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
