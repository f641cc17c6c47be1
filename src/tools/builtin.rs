//! Built-in analysis tools owned by the specialized agents
//!
//! All of these are deterministic text checks over the request being
//! analyzed. They never touch the network or filesystem, so they are safe
//! to invoke concurrently across requests.

use crate::error::CouncilError;
use crate::tools::{ParamKind, ParamSpec, Tool, ToolExecutor, ToolSchema};
use crate::types::{RunContext, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

fn message_of(input: &Value) -> &str {
    input.get("message").and_then(Value::as_str).unwrap_or("")
}

fn message_schema() -> ToolSchema {
    ToolSchema::new(vec![ParamSpec::required("message", ParamKind::String)])
}

/// Scans the request for risky patterns (secrets, unsafe calls, plaintext
/// endpoints). Owned by the security agent.
pub struct SecurityScan;

const RISKY_PATTERNS: &[(&str, &str)] = &[
    ("eval(", "dynamic code evaluation"),
    ("exec(", "dynamic command execution"),
    ("password", "credential material referenced in plain text"),
    ("secret", "secret material referenced in plain text"),
    ("api key", "API key referenced in plain text"),
    ("api_key", "API key referenced in plain text"),
    ("http://", "unencrypted endpoint"),
];

#[async_trait]
impl ToolExecutor for SecurityScan {
    async fn execute(&self, input: &Value, _ctx: &RunContext) -> ToolResult {
        let message = message_of(input).to_lowercase();
        let findings: Vec<&str> = RISKY_PATTERNS
            .iter()
            .filter(|(pattern, _)| message.contains(pattern))
            .map(|(_, description)| *description)
            .collect();

        let mut result = ToolResult::ok(json!({
            "findings": findings,
            "scanned_chars": message.len(),
        }));
        for finding in &findings {
            result = result.with_warning(format!("security scan: {finding}"));
        }
        if findings.iter().any(|f| f.contains("plain text")) {
            result = result.with_suggestion(
                "Store credentials in a secrets manager instead of the workflow definition",
            );
        }
        if findings.iter().any(|f| f.contains("unencrypted")) {
            result = result.with_suggestion("Use https:// for all external endpoints");
        }
        result
    }
}

/// Checks that the requesting user holds the permissions a build/creation
/// request needs. Owned by the security agent.
pub struct PermissionCheck;

#[async_trait]
impl ToolExecutor for PermissionCheck {
    async fn execute(&self, _input: &Value, ctx: &RunContext) -> ToolResult {
        let privileged = ctx.user_role == "admin" || ctx.has_permission("workflow:create");
        let mut result = ToolResult::ok(json!({
            "user_role": ctx.user_role,
            "granted_permissions": ctx.permissions.len(),
            "privileged": privileged,
        }));
        if !privileged {
            result = result
                .with_warning(format!(
                    "user {} lacks the workflow:create permission",
                    ctx.user_id
                ))
                .with_suggestion("Request the workflow:create permission before deploying");
        }
        result
    }
}

/// Maps third-party systems referenced by the request and flags
/// integrations with no authentication mentioned. Owned by the
/// integration agent.
pub struct IntegrationMap;

const KNOWN_SYSTEMS: &[&str] = &[
    "salesforce", "slack", "stripe", "hubspot", "jira", "github", "gmail", "zapier", "twilio",
];

const AUTH_MARKERS: &[&str] = &["oauth", "token", "auth", "credential"];

#[async_trait]
impl ToolExecutor for IntegrationMap {
    async fn execute(&self, input: &Value, _ctx: &RunContext) -> ToolResult {
        let message = message_of(input).to_lowercase();
        let systems: Vec<&str> = KNOWN_SYSTEMS
            .iter()
            .filter(|s| message.contains(*s))
            .copied()
            .collect();
        let mentions_auth = AUTH_MARKERS.iter().any(|m| message.contains(m));

        let mut result = ToolResult::ok(json!({
            "systems": systems,
            "mentions_api": message.contains("api") || message.contains("webhook"),
            "mentions_auth": mentions_auth,
        }));
        if !systems.is_empty() && !mentions_auth {
            result = result
                .with_warning(format!(
                    "integration with {} mentions no authentication",
                    systems.join(", ")
                ))
                .with_suggestion("Configure OAuth or API-token credentials for each integration");
        }
        result
    }
}

/// Reviews requested UI surfaces for missing validation and accessibility
/// gaps. Owned by the design agent.
pub struct LayoutReview;

const UI_ELEMENTS: &[&str] = &["form", "dashboard", "table", "chart", "page", "modal", "button"];

#[async_trait]
impl ToolExecutor for LayoutReview {
    async fn execute(&self, input: &Value, _ctx: &RunContext) -> ToolResult {
        let message = message_of(input).to_lowercase();
        let elements: Vec<&str> = UI_ELEMENTS
            .iter()
            .filter(|e| message.contains(*e))
            .copied()
            .collect();

        let mut result = ToolResult::ok(json!({ "elements": elements }));
        if elements.contains(&"form") && !message.contains("validation") {
            result = result
                .with_warning("form requested without input validation")
                .with_suggestion("Add client-side validation to every form field");
        }
        if !elements.is_empty() {
            result = result
                .with_suggestion("Check color contrast and keyboard navigation for new UI");
        }
        result
    }
}

/// Lints the request itself for size, embedded code, and vagueness.
/// Owned by the quality agent.
pub struct WorkflowLint;

#[async_trait]
impl ToolExecutor for WorkflowLint {
    async fn execute(&self, input: &Value, _ctx: &RunContext) -> ToolResult {
        let message = message_of(input);
        let has_code = message.contains("```");

        let mut result = ToolResult::ok(json!({
            "length": message.len(),
            "has_code": has_code,
        }));
        if message.trim().len() < 10 {
            result = result
                .with_warning("request is too short to analyze meaningfully")
                .with_suggestion("Describe the desired workflow in more detail");
        }
        if message.len() > 2000 {
            result = result
                .with_warning("request is very long; analysis may miss details")
                .with_suggestion("Split the request into smaller workflows");
        }
        if has_code {
            result = result.with_suggestion("Review embedded code for style and error handling");
        }
        result
    }
}

/// Security agent tools
pub fn security_tools() -> Result<Vec<Tool>, CouncilError> {
    Ok(vec![
        Tool::new(
            "security_scan",
            "Scan the request for risky patterns and plaintext secrets",
            message_schema(),
            Arc::new(SecurityScan),
        )?,
        Tool::new(
            "permission_check",
            "Verify the requesting user holds the required permissions",
            ToolSchema::default(),
            Arc::new(PermissionCheck),
        )?,
    ])
}

/// Integration agent tools
pub fn integration_tools() -> Result<Vec<Tool>, CouncilError> {
    Ok(vec![Tool::new(
        "integration_map",
        "Map referenced third-party systems and their authentication",
        message_schema(),
        Arc::new(IntegrationMap),
    )?])
}

/// Design agent tools
pub fn design_tools() -> Result<Vec<Tool>, CouncilError> {
    Ok(vec![Tool::new(
        "layout_review",
        "Review requested UI surfaces for validation and accessibility gaps",
        message_schema(),
        Arc::new(LayoutReview),
    )?])
}

/// Quality agent tools
pub fn quality_tools() -> Result<Vec<Tool>, CouncilError> {
    Ok(vec![Tool::new(
        "workflow_lint",
        "Lint the request for size, embedded code, and vagueness",
        message_schema(),
        Arc::new(WorkflowLint),
    )?])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RunContext {
        RunContext::new("org-1", "user-1")
    }

    #[tokio::test]
    async fn test_security_scan_flags_plaintext_endpoint() {
        let result = SecurityScan
            .execute(&json!({"message": "post results to http://example.com"}), &ctx())
            .await;
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.contains("unencrypted")));
        assert!(result.suggestions.iter().any(|s| s.contains("https")));
    }

    #[tokio::test]
    async fn test_security_scan_clean_message() {
        let result = SecurityScan
            .execute(&json!({"message": "summarize weekly sales"}), &ctx())
            .await;
        assert!(result.success);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_permission_check_warns_without_grant() {
        let result = PermissionCheck.execute(&json!({}), &ctx()).await;
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);

        let mut privileged = ctx();
        privileged.permissions.push("workflow:create".to_string());
        let result = PermissionCheck.execute(&json!({}), &privileged).await;
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_integration_map_detects_systems() {
        let result = IntegrationMap
            .execute(&json!({"message": "sync Salesforce leads to Slack"}), &ctx())
            .await;
        let data = result.data.unwrap();
        let systems = data["systems"].as_array().unwrap();
        assert_eq!(systems.len(), 2);
        assert_eq!(result.warnings.len(), 1);

        let with_auth = IntegrationMap
            .execute(
                &json!({"message": "sync salesforce using oauth token"}),
                &ctx(),
            )
            .await;
        assert!(with_auth.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_layout_review_flags_unvalidated_form() {
        let result = LayoutReview
            .execute(&json!({"message": "build a signup form"}), &ctx())
            .await;
        assert!(result.warnings.iter().any(|w| w.contains("validation")));
    }

    #[tokio::test]
    async fn test_workflow_lint_short_message() {
        let result = WorkflowLint.execute(&json!({"message": "hi"}), &ctx()).await;
        assert!(result.warnings.iter().any(|w| w.contains("too short")));
    }

    #[test]
    fn test_tool_sets_construct() {
        assert_eq!(security_tools().unwrap().len(), 2);
        assert_eq!(integration_tools().unwrap().len(), 1);
        assert_eq!(design_tools().unwrap().len(), 1);
        assert_eq!(quality_tools().unwrap().len(), 1);
    }
}
