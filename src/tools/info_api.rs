use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::error::ToolError;
use crate::tools::types::{Tool, ToolDefinition};

const API_DESCRIPTION: &str =
    "This API provides bank statement data, credit card invoices and related account records.";
const NAME_MISSING_ERROR: &str = "name must be a non-empty string";

/// Looks up what an internal information API is responsible for, by API name
#[derive(Debug, Default)]
pub struct InfoApiTool;

#[async_trait]
impl Tool for InfoApiTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "info_api".to_string(),
            description: "Searches for information about an internal API by name.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The name of the information API to search for"
                    }
                },
                "required": ["name"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> Result<Value, ToolError> {
        let name = arguments["name"]
            .as_str()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgument(String::from(NAME_MISSING_ERROR)))?;
        log::debug!("[info_api] lookup: {name}");

        Ok(json!(API_DESCRIPTION))
    }
}
