/// Execution Engine - Abstraction for Remote Code Execution
///
/// **Core Responsibility:**
/// Send one source file plus one stdin to a sandbox and bring back raw output.
///
/// **Boundary:**
/// - Engine knows HOW to reach the sandbox (HTTP, in-process mock, ...)
/// - Engine does NOT compare outputs or score anything
/// - Engine reports failures as `EngineError`; the executor decides what they mean
///
/// Production uses `PistonEngine`, which speaks the Piston v2 `/execute` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub content: String,
}

/// Body of one remote execution call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRequest {
    pub language: String,
    pub version: String,
    pub files: Vec<SourceFile>,
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(language: &str, version: &str, source_code: &str, stdin: &str) -> Self {
        Self {
            language: language.to_string(),
            version: version.to_string(),
            files: vec![SourceFile {
                content: source_code.to_string(),
            }],
            stdin: stdin.to_string(),
        }
    }
}

/// Raw sandbox output for a single execution
/// `stderr` holds compile and run diagnostics, in that order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
    pub signal: Option<String>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Execution service unreachable: {0}")]
    Transport(String),
    #[error("Execution service returned {code} {reason}")]
    Status { code: u16, reason: String },
    #[error("Unreadable response from execution service: {0}")]
    Decode(String),
    #[error("Compilation failed: {0}")]
    Compile(String),
}

/// Execution engine trait
///
/// Any implementation must guarantee:
/// 1. Exactly one execution per call
/// 2. Capture stdout and diagnostics
/// 3. Report unreachable or failing services as errors, never panic
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<SandboxOutput, EngineError>;
}

#[derive(Debug, Default, Deserialize)]
struct PistonStage {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    signal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PistonResponse {
    #[serde(default)]
    run: Option<PistonStage>,
    #[serde(default)]
    compile: Option<PistonStage>,
}

impl PistonResponse {
    fn into_output(self) -> Result<SandboxOutput, EngineError> {
        let compile_err = self
            .compile
            .as_ref()
            .and_then(|stage| stage.stderr.as_deref())
            .map(str::trim_end)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        // Piston skips the run stage entirely when compilation fails
        let run = match self.run {
            Some(run) => run,
            None => {
                return Err(match (self.compile, compile_err) {
                    (Some(_), Some(stderr)) => EngineError::Compile(stderr),
                    (Some(stage), None) => EngineError::Compile(match stage.code {
                        Some(code) => format!("compiler exited with code {}", code),
                        None => "compiler produced no output".to_string(),
                    }),
                    (None, _) => EngineError::Decode("response has no run stage".to_string()),
                });
            }
        };

        let mut diagnostics = Vec::new();
        if let Some(compile_err) = compile_err {
            diagnostics.push(compile_err);
        }
        if let Some(run_err) = run.stderr.as_deref().filter(|s| !s.trim().is_empty()) {
            diagnostics.push(run_err.trim_end().to_string());
        }

        Ok(SandboxOutput {
            stdout: run.stdout.or(run.output).unwrap_or_default(),
            stderr: diagnostics.join("\n"),
            exit_code: run.code,
            signal: run.signal,
        })
    }
}

/// HTTP client for a Piston-compatible execution service
pub struct PistonEngine {
    base_url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl PistonEngine {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ExecutionEngine for PistonEngine {
    async fn execute(&self, request: &ExecutionRequest) -> Result<SandboxOutput, EngineError> {
        let execute_url = format!("{}/execute", self.base_url);

        let mut builder = self.client.post(&execute_url).json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body: PistonResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        let output = body.into_output()?;
        debug!(
            language = %request.language,
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Sandbox responded"
        );

        Ok(output)
    }
}
