//! Capability interface for agent tools.

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from tool lookup and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under the name.
    #[error("unknown tool: {0}")]
    Unknown(String),
    /// The tool itself failed.
    #[error("tool invocation failed: {0}")]
    Invocation(String),
}

#[async_trait]
/// A capability an agent can invoke with a uniform JSON contract.
pub trait Tool: Send + Sync {
    /// Registered tool name.
    fn name(&self) -> &str;

    /// Human-readable description surfaced in the persona block.
    fn description(&self) -> &str;

    /// Invoke the tool with JSON arguments.
    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;
}

/// Name-keyed registry of tools attached to an agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous one with the same name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!("registering tool (name={})", name);
        self.tools.write().insert(name, tool);
    }

    /// Sorted names of all registered tools.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Invoke a registered tool by name.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::Unknown(name.to_string()))?;
        tool.invoke(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::{Tool, ToolError, ToolRegistry};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the arguments back"
        }

        async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn registry_registers_lists_and_invokes() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        assert_eq!(registry.list(), vec!["echo".to_string()]);

        let result = registry.invoke("echo", json!({"q": 1})).await.expect("invoke");
        assert_eq!(result, json!({"q": 1}));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nope", json!({})).await.expect_err("unknown");
        assert!(matches!(err, ToolError::Unknown(_)));
    }
}
