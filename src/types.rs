//! Shared types used across modules
//!
//! This module contains the data model used by the registry, the
//! orchestrator, and the tool layer, to avoid circular dependencies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a council agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Orchestration,
    Security,
    Design,
    Integration,
    Quality,
}

impl AgentRole {
    /// All roles, orchestration first
    pub fn all() -> &'static [AgentRole] {
        &[
            AgentRole::Orchestration,
            AgentRole::Security,
            AgentRole::Design,
            AgentRole::Integration,
            AgentRole::Quality,
        ]
    }

    /// Role name as used in prompts, ids, and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Orchestration => "orchestration",
            AgentRole::Security => "security",
            AgentRole::Design => "design",
            AgentRole::Integration => "integration",
            AgentRole::Quality => "quality",
        }
    }

    /// Parse a role name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "orchestration" | "orchestrator" => Some(AgentRole::Orchestration),
            "security" => Some(AgentRole::Security),
            "design" => Some(AgentRole::Design),
            "integration" => Some(AgentRole::Integration),
            "quality" => Some(AgentRole::Quality),
            _ => None,
        }
    }

    /// Validation category for this role, if it produces findings
    pub fn validation_category(&self) -> Option<ValidationCategory> {
        match self {
            AgentRole::Orchestration => None,
            AgentRole::Security => Some(ValidationCategory::Security),
            AgentRole::Design => Some(ValidationCategory::Design),
            AgentRole::Integration => Some(ValidationCategory::Integration),
            AgentRole::Quality => Some(ValidationCategory::Quality),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of an agent within one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Active,
    Completed,
    Error,
}

/// Role of a message sender in the conversation history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-request execution context, immutable after creation.
///
/// Owned by the caller; the orchestrator and agents only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    /// Workflow being analyzed, if any
    pub workflow_id: Option<String>,
    pub organization_id: String,
    pub user_id: String,
    pub user_role: String,
    /// Granted permission strings (e.g. "workflow:create")
    pub permissions: Vec<String>,
    pub session_id: String,
    /// Ordered conversation history so far
    pub history: Vec<Message>,
}

impl RunContext {
    /// Minimal context for a fresh session
    pub fn new(organization_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            workflow_id: None,
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            user_role: "member".to_string(),
            permissions: Vec::new(),
            session_id: uuid::Uuid::new_v4().to_string(),
            history: Vec::new(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Result of a single tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ToolResult {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

/// A tool invocation made during one agent execution, with its result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub input: serde_json::Value,
    pub result: ToolResult,
}

/// Metadata attached to every agent response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub execution_time_ms: u64,
    pub tokens_used: u64,
    pub tool_count: usize,
    /// Cost incurred by this invocation; added to the request total exactly once
    pub cost: Decimal,
}

/// One agent invocation's output. Immutable once created; appended to the
/// per-request response list in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: String,
    pub role: AgentRole,
    pub content: String,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Always within [0, 1]
    pub confidence: f64,
    /// Best-effort heuristic annotation, not a correctness-bearing field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub metadata: ResponseMetadata,
}

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationCategory {
    Security,
    Design,
    Integration,
    Quality,
}

/// Outcome of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Passed,
    Failed,
    Warning,
}

/// A structured finding derived from one tool call's result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub role: AgentRole,
    pub category: ValidationCategory,
    pub status: ValidationStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// How budget-relevant steps are approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalMode {
    #[default]
    Auto,
    StepByStep,
    Batch,
}

impl ApprovalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalMode::Auto => "auto",
            ApprovalMode::StepByStep => "step-by-step",
            ApprovalMode::Batch => "batch",
        }
    }
}

/// One end-to-end orchestration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    pub user_message: String,
    pub context: RunContext,
    /// Explicit role list; used verbatim for selection when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_agents: Option<Vec<AgentRole>>,
    /// Cost ceiling for this request; falls back to the configured default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<Decimal>,
    #[serde(default)]
    pub approval_mode: ApprovalMode,
}

impl OrchestrationRequest {
    pub fn new(user_message: impl Into<String>, context: RunContext) -> Self {
        Self {
            user_message: user_message.into(),
            context,
            required_agents: None,
            max_cost: None,
            approval_mode: ApprovalMode::Auto,
        }
    }
}

/// Terminal artifact of one orchestration request.
///
/// Invariant: `total_cost` equals the sum of `metadata.cost` over `responses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResponse {
    /// True iff `errors` is empty
    pub success: bool,
    pub responses: Vec<AgentResponse>,
    pub final_text: String,
    /// First fenced code block found in the final text or agent output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_artifact: Option<String>,
    pub validations: Vec<ValidationResult>,
    /// Deduplicated, capped at 10
    pub suggestions: Vec<String>,
    pub errors: Vec<String>,
    pub total_time_ms: u64,
    pub total_cost: Decimal,
    /// Roles not yet executed when the request halted early
    pub pending_steps: Vec<AgentRole>,
    pub needs_approval: bool,
    /// Per-request status of every agent role
    pub agent_statuses: HashMap<AgentRole, AgentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in AgentRole::all() {
            assert_eq!(AgentRole::parse(role.as_str()), Some(*role));
        }
        assert_eq!(AgentRole::parse("Orchestrator"), Some(AgentRole::Orchestration));
        assert_eq!(AgentRole::parse("unknown"), None);
    }

    #[test]
    fn test_validation_category_mapping() {
        assert_eq!(AgentRole::Orchestration.validation_category(), None);
        assert_eq!(
            AgentRole::Security.validation_category(),
            Some(ValidationCategory::Security)
        );
        assert_eq!(
            AgentRole::Quality.validation_category(),
            Some(ValidationCategory::Quality)
        );
    }

    #[test]
    fn test_run_context_permissions() {
        let mut ctx = RunContext::new("org-1", "user-1");
        assert!(!ctx.has_permission("workflow:create"));
        ctx.permissions.push("workflow:create".to_string());
        assert!(ctx.has_permission("workflow:create"));
    }

    #[test]
    fn test_tool_result_builders() {
        let result = ToolResult::ok(serde_json::json!({"n": 1}))
            .with_warning("minor issue")
            .with_suggestion("consider a fix");
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.suggestions.len(), 1);

        let failed = ToolResult::failed("boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_approval_mode_serde() {
        let mode: ApprovalMode = serde_json::from_str("\"step-by-step\"").unwrap();
        assert_eq!(mode, ApprovalMode::StepByStep);
        assert_eq!(ApprovalMode::default(), ApprovalMode::Auto);
    }
}
