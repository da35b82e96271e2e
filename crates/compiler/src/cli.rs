// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # CLI compiler
//!
//! This module drives the external model compiler as a subprocess.
//!
//! ## Overview
//!
//! A compile run executes the compiler CLI with a model selector and a
//! profiles directory, then reads the expanded SQL from the artifact the run
//! wrote under the project's compile target directory. Error output from the
//! process is returned verbatim so the diagnostics layer can locate line
//! numbers in it.

use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{CompilerError, CompilerResult};
use crate::r#trait::Compiler;

/// Default directory (relative to the project) where compiled artifacts land
const DEFAULT_TARGET_PATH: &str = "target/compiled";

/// Process-backed compiler
///
/// Invokes the compiler CLI once per compile request.
#[derive(Debug, Clone)]
pub struct CliCompiler {
    /// Compiler executable
    command: String,

    /// Profiles directory passed to every invocation, if configured
    profiles_dir: Option<PathBuf>,

    /// Project directory the compiler runs in
    project_dir: PathBuf,

    /// Directory (relative to the project) searched for compiled artifacts
    target_path: PathBuf,
}

impl CliCompiler {
    /// Create a new CLI compiler
    ///
    /// # Arguments
    ///
    /// * `command` - Compiler executable name or path
    /// * `project_dir` - Directory containing the model project
    pub fn new(command: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            profiles_dir: None,
            project_dir: project_dir.into(),
            target_path: PathBuf::from(DEFAULT_TARGET_PATH),
        }
    }

    /// Set the profiles directory
    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = Some(dir.into());
        self
    }

    /// Override the compile target directory
    pub fn with_target_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.target_path = path.into();
        self
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.current_dir(&self.project_dir);
        cmd.args(["--no-send-anonymous-usage-stats", "--no-use-colors"]);
        cmd
    }

    /// Find the compiled `<model>.sql` artifact under the target directory
    ///
    /// The compiler mirrors the project's source layout under the target
    /// directory, so the artifact's parent directories are not known up
    /// front; the search walks the whole tree.
    async fn find_artifact(&self, model: &str) -> CompilerResult<PathBuf> {
        let file_name = format!("{model}.sql");
        let root = self.project_dir.join(&self.target_path);

        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("skipping unreadable target directory {:?}: {}", dir, e);
                    continue;
                }
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if path.file_name().and_then(|n| n.to_str()) == Some(file_name.as_str()) {
                    return Ok(path);
                }
            }
        }

        Err(CompilerError::ArtifactMissing(model.to_string()))
    }
}

#[async_trait::async_trait]
impl Compiler for CliCompiler {
    async fn compile(&self, model: &str) -> CompilerResult<String> {
        info!("Compiling model: {}", model);

        let mut cmd = self.base_command();
        cmd.args(["compile", "--model", model]);
        if let Some(dir) = &self.profiles_dir {
            cmd.arg("--profiles-dir").arg(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| CompilerError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            if !output.stderr.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&String::from_utf8_lossy(&output.stderr));
            }
            warn!("Compile failed for model {}: {}", model, text.trim());
            return Err(CompilerError::CompileFailed(text));
        }

        let artifact = self.find_artifact(model).await?;
        debug!("Reading compiled artifact: {:?}", artifact);
        let sql = tokio::fs::read_to_string(&artifact).await?;
        Ok(sql)
    }

    async fn refresh(&self) -> CompilerResult<()> {
        debug!("Refreshing compiler state");

        let output = self
            .base_command()
            .arg("--version")
            .output()
            .await
            .map_err(|e| CompilerError::Unavailable(e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CompilerError::Unavailable(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}
