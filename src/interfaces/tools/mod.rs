//! Named tools the agent runtime can call. Each takes a JSON object and
//! answers with a JSON object wrapped in a `SUCCESS`/`FAILURE` envelope.

pub mod order_tools;

use crate::error::{OrderError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILURE: &str = "FAILURE";

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

/// A request from the agent to run one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// What the agent runtime is told about each tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tools, sorted by name.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name(),
                description: tool.description(),
            })
            .collect()
    }

    /// Runs the named tool and returns its raw result.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Value> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| OrderError::UnknownTool(call.name.clone()))?;
        tool.execute(call.args.clone()).await
    }

    /// Runs the named tool and wraps the outcome in a status envelope.
    ///
    /// Never fails: errors become `{"status": "FAILURE", "error": .., "kind": ..}`.
    pub async fn invoke(&self, call: &ToolCall) -> Value {
        match self.dispatch(call).await {
            Ok(result) => {
                info!(event_name = "tool.invoked", tool = %call.name, "tool succeeded");
                success(result)
            }
            Err(e) => {
                warn!(event_name = "tool.failed", tool = %call.name, error = %e, "tool failed");
                json!({
                    "status": STATUS_FAILURE,
                    "error": e.to_string(),
                    "kind": e.kind().as_str(),
                })
            }
        }
    }
}

fn success(result: Value) -> Value {
    let mut body = match result {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    };
    body.insert("status".to_string(), Value::from(STATUS_SUCCESS));
    Value::Object(body)
}

/// Deserializes tool arguments, treating a missing payload as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(input: Value) -> Result<T> {
    let input = if input.is_null() { json!({}) } else { input };
    serde_json::from_value(input)
        .map_err(|e| OrderError::ValidationError(format!("invalid tool arguments: {e}")))
}
