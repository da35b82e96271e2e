// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock compiler with scripted results
//!
//! Each model name can be scripted to succeed with a given SQL text or to
//! fail with a given error text. Every compile call is recorded so tests can
//! assert on invocation counts (e.g. debounce coalescing).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use templated_sql_lsp_compiler::{Compiler, CompilerError, CompilerResult};

/// Scripted outcome for one model
#[derive(Debug, Clone)]
enum Scripted {
    Succeed(String),
    Fail(String),
}

/// Compiler test double
#[derive(Debug, Default)]
pub struct MockCompiler {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
    refreshes: Mutex<usize>,
    delay: Mutex<Option<Duration>>,
}

impl MockCompiler {
    /// Create a new mock with no scripted results
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful compile for a model
    pub fn succeed_with(&self, model: impl Into<String>, sql: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(model.into(), Scripted::Succeed(sql.into()));
    }

    /// Script a failing compile for a model
    pub fn fail_with(&self, model: impl Into<String>, error_text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(model.into(), Scripted::Fail(error_text.into()));
    }

    /// Add an artificial compile latency (respects paused tokio time)
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Number of compile calls so far
    pub fn compile_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Models compiled so far, in call order
    pub fn compiled_models(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of refresh calls so far
    pub fn refresh_count(&self) -> usize {
        *self.refreshes.lock().unwrap()
    }
}

#[async_trait]
impl Compiler for MockCompiler {
    async fn compile(&self, model: &str) -> CompilerResult<String> {
        self.calls.lock().unwrap().push(model.to_string());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().get(model).cloned();
        match scripted {
            Some(Scripted::Succeed(sql)) => Ok(sql),
            Some(Scripted::Fail(text)) => Err(CompilerError::CompileFailed(text)),
            None => Err(CompilerError::ArtifactMissing(model.to_string())),
        }
    }

    async fn refresh(&self) -> CompilerResult<()> {
        *self.refreshes.lock().unwrap() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_success_and_failure() {
        let mock = MockCompiler::new();
        mock.succeed_with("orders", "select * from raw.orders");
        mock.fail_with("customers", "Compilation Error at line 3");

        assert_eq!(
            mock.compile("orders").await.unwrap(),
            "select * from raw.orders"
        );
        assert!(matches!(
            mock.compile("customers").await,
            Err(CompilerError::CompileFailed(_))
        ));
        assert_eq!(mock.compile_count(), 2);
        assert_eq!(mock.compiled_models(), vec!["orders", "customers"]);
    }

    #[tokio::test]
    async fn test_unscripted_model_is_missing() {
        let mock = MockCompiler::new();
        assert!(matches!(
            mock.compile("unknown").await,
            Err(CompilerError::ArtifactMissing(_))
        ));
    }
}
