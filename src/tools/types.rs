use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::ToolError;

/// A request from the model to invoke a named function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier of the call, unique within one response
    pub id: String,
    #[serde(rename = "type", default)]
    pub call_type: CallType,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallType {
    #[default]
    #[serde(rename = "function")]
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Raw argument string as produced by the model, usually JSON but not guaranteed
    pub arguments: String,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: CallType::Function,
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Parses the raw argument string, yielding `Null` when it is not valid JSON
    pub fn parsed_arguments(&self) -> Value {
        serde_json::from_str(&self.function.arguments).unwrap_or(Value::Null)
    }
}

impl Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.function.name, self.function.arguments)
    }
}

/// Defines a tool's interface including its name, description, and parameter schema
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON schema defining the tool's parameters
    pub parameters: Value,
}

/// Trait that must be implemented by all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's definition including its name, description, and parameter schema
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the provided arguments
    ///
    /// # Arguments
    /// * `arguments` - JSON value containing the tool's arguments
    async fn execute(&self, arguments: &Value) -> Result<Value, ToolError>;
}
