//! Tool definitions and execution boundary
//!
//! A tool is a named, schema-described unit of work owned by exactly one
//! agent. Schemas are static and validated once at construction, not
//! re-derived per request.

pub mod builtin;

use crate::error::CouncilError;
use crate::types::{RunContext, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Parameter type for a tool schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }
}

/// One declared parameter of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Static input schema attached to a tool at construction time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSchema {
    pub params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self { params }
    }

    /// Checked once at startup; rejects empty or duplicate parameter names
    pub fn validate(&self) -> Result<(), CouncilError> {
        let mut seen = std::collections::HashSet::new();
        for param in &self.params {
            if param.name.is_empty() {
                return Err(CouncilError::Configuration(
                    "tool schema has a parameter with an empty name".to_string(),
                ));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(CouncilError::Configuration(format!(
                    "tool schema declares parameter '{}' twice",
                    param.name
                )));
            }
        }
        Ok(())
    }

    /// Check an input object against the schema. Returns an error message
    /// rather than failing, so a bad input becomes a failed ToolResult.
    pub fn check_input(&self, input: &Value) -> Result<(), String> {
        let object = match input.as_object() {
            Some(o) => o,
            None => return Err("tool input must be a JSON object".to_string()),
        };
        for param in &self.params {
            match object.get(&param.name) {
                Some(value) => {
                    if !param.kind.matches(value) {
                        return Err(format!(
                            "parameter '{}' must be of type {}",
                            param.name,
                            param.kind.as_str()
                        ));
                    }
                }
                None if param.required => {
                    return Err(format!("missing required parameter '{}'", param.name));
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// Executable contract of a tool
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, input: &Value, ctx: &RunContext) -> ToolResult;
}

/// A named, schema-described unit of work owned by one agent
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub schema: ToolSchema,
    executor: Arc<dyn ToolExecutor>,
}

impl Tool {
    /// Create a tool, validating its schema up front
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ToolSchema,
        executor: Arc<dyn ToolExecutor>,
    ) -> Result<Self, CouncilError> {
        schema.validate()?;
        Ok(Self {
            name: name.into(),
            description: description.into(),
            schema,
            executor,
        })
    }

    /// Run the tool. Schema violations surface as a failed result, not an
    /// error, so callers treat them like any other tool failure.
    pub async fn run(&self, input: &Value, ctx: &RunContext) -> ToolResult {
        if let Err(message) = self.schema.check_input(input) {
            return ToolResult::failed(message);
        }
        self.executor.execute(input, ctx).await
    }

    /// One-line description used when enumerating tools in a system prompt
    pub fn prompt_line(&self) -> String {
        let params = self
            .schema
            .params
            .iter()
            .map(|p| {
                if p.required {
                    format!("{}: {}", p.name, p.kind.as_str())
                } else {
                    format!("{}?: {}", p.name, p.kind.as_str())
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("- {}({}): {}", self.name, params, self.description)
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoExecutor;

    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        async fn execute(&self, input: &Value, _ctx: &RunContext) -> ToolResult {
            ToolResult::ok(input.clone())
        }
    }

    fn message_schema() -> ToolSchema {
        ToolSchema::new(vec![ParamSpec::required("message", ParamKind::String)])
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let schema = ToolSchema::new(vec![
            ParamSpec::required("message", ParamKind::String),
            ParamSpec::optional("message", ParamKind::Number),
        ]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_schema_rejects_empty_name() {
        let schema = ToolSchema::new(vec![ParamSpec::required("", ParamKind::String)]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_check_input() {
        let schema = message_schema();
        assert!(schema.check_input(&json!({"message": "hi"})).is_ok());
        assert!(schema.check_input(&json!({})).is_err());
        assert!(schema.check_input(&json!({"message": 7})).is_err());
        assert!(schema.check_input(&json!("not an object")).is_err());
    }

    #[tokio::test]
    async fn test_run_rejects_bad_input_as_failed_result() {
        let tool = Tool::new("echo", "Echo input", message_schema(), Arc::new(EchoExecutor))
            .unwrap();
        let ctx = RunContext::new("org", "user");

        let bad = tool.run(&json!({}), &ctx).await;
        assert!(!bad.success);
        assert!(bad.error.unwrap().contains("message"));

        let good = tool.run(&json!({"message": "hi"}), &ctx).await;
        assert!(good.success);
    }

    #[test]
    fn test_prompt_line() {
        let tool = Tool::new("echo", "Echo input", message_schema(), Arc::new(EchoExecutor))
            .unwrap();
        assert_eq!(tool.prompt_line(), "- echo(message: string): Echo input");
    }
}
