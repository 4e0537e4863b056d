//! Conversational front end over the tool registry.
//!
//! A [`HostedExecutor`] drives a remote [`AgentRuntime`] that decides which
//! tools to call. When no runtime is available, or local mode is forced, a
//! [`DirectExecutor`] answers with a canned message and still lets callers run
//! tools by name.

use crate::config::{AgentConfig, AgentMode};
use crate::error::{OrderError, Result};
use crate::interfaces::tools::{ToolCall, ToolDescriptor, ToolRegistry};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity and instructions handed to the agent runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub name: String,
    pub model: String,
    pub description: String,
    pub instruction: String,
}

impl From<&AgentConfig> for AgentProfile {
    fn from(config: &AgentConfig) -> Self {
        Self {
            name: config.name.clone(),
            model: config.model.clone(),
            description: config.description.clone(),
            instruction: config.instruction.clone(),
        }
    }
}

/// What the runtime wants next.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentTurn {
    Message(String),
    ToolCall(ToolCall),
}

/// A hosted model session. Implementations own transport and credentials.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn start(
        &self,
        profile: &AgentProfile,
        prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<AgentTurn>;

    async fn submit_tool_result(&self, call: &ToolCall, result: &Value) -> Result<AgentTurn>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    Hosted,
    Direct,
}

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    fn kind(&self) -> ExecutorKind;

    fn profile(&self) -> &AgentProfile;

    /// Runs one tool and returns its status envelope.
    async fn execute(&self, call: &ToolCall) -> Value;

    /// Answers a free-form customer prompt.
    async fn respond(&self, prompt: &str) -> Result<String>;
}

pub type ToolExecutorBox = Box<dyn ToolExecutor>;

pub struct HostedExecutor {
    runtime: Box<dyn AgentRuntime>,
    registry: Arc<ToolRegistry>,
    profile: AgentProfile,
    max_tool_rounds: u32,
}

impl HostedExecutor {
    pub fn new(
        runtime: Box<dyn AgentRuntime>,
        registry: Arc<ToolRegistry>,
        profile: AgentProfile,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            runtime,
            registry,
            profile,
            max_tool_rounds,
        }
    }
}

#[async_trait]
impl ToolExecutor for HostedExecutor {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Hosted
    }

    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn execute(&self, call: &ToolCall) -> Value {
        self.registry.invoke(call).await
    }

    async fn respond(&self, prompt: &str) -> Result<String> {
        let tools = self.registry.descriptors();
        let mut turn = self.runtime.start(&self.profile, prompt, &tools).await?;
        for round in 0..self.max_tool_rounds {
            match turn {
                AgentTurn::Message(text) => return Ok(text),
                AgentTurn::ToolCall(call) => {
                    debug!(round, tool = %call.name, "agent requested tool");
                    let result = self.registry.invoke(&call).await;
                    turn = self.runtime.submit_tool_result(&call, &result).await?;
                }
            }
        }
        match turn {
            AgentTurn::Message(text) => Ok(text),
            AgentTurn::ToolCall(_) => Err(OrderError::ToolLoopExceeded(self.max_tool_rounds)),
        }
    }
}

pub struct DirectExecutor {
    registry: Arc<ToolRegistry>,
    profile: AgentProfile,
}

impl DirectExecutor {
    pub fn new(registry: Arc<ToolRegistry>, profile: AgentProfile) -> Self {
        Self { registry, profile }
    }
}

#[async_trait]
impl ToolExecutor for DirectExecutor {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Direct
    }

    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn execute(&self, call: &ToolCall) -> Value {
        self.registry.invoke(call).await
    }

    async fn respond(&self, prompt: &str) -> Result<String> {
        Ok(format!(
            "[local:{}] hosted agent unavailable. You asked: {prompt}",
            self.profile.name
        ))
    }
}

/// Picks the executor once, at startup.
///
/// Hosted mode with a runtime gives a [`HostedExecutor`]. Anything else gives a
/// [`DirectExecutor`]; asking for hosted mode without a runtime logs a warning.
pub fn build_executor(
    config: &AgentConfig,
    registry: Arc<ToolRegistry>,
    runtime: Option<Box<dyn AgentRuntime>>,
) -> ToolExecutorBox {
    let profile = AgentProfile::from(config);
    match (config.mode, runtime) {
        (AgentMode::Hosted, Some(runtime)) => Box::new(HostedExecutor::new(
            runtime,
            registry,
            profile,
            config.max_tool_rounds,
        )),
        (AgentMode::Hosted, None) => {
            warn!(
                event_name = "agent.fallback",
                agent = %profile.name,
                "hosted agent runtime unavailable, using local executor"
            );
            Box::new(DirectExecutor::new(registry, profile))
        }
        (AgentMode::Local, _) => Box::new(DirectExecutor::new(registry, profile)),
    }
}
