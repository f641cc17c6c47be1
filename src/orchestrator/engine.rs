//! Orchestration engine
//!
//! Drives one request through the lifecycle: pre-flight cost check,
//! orchestration call, agent selection, batch cost check, sequential
//! specialized execution, synthesis. Agents run strictly one at a time so
//! that every ceiling check happens before the money it guards is spent.
//! No error escapes `process()`; the caller always gets a structured
//! response.

use crate::agents::{AgentDefinition, AgentRegistry};
use crate::config::CouncilConfig;
use crate::error::CouncilError;
use crate::inference::InferenceProvider;
use crate::metrics::{ExecutionMetric, MetricsStore};
use crate::orchestrator::confidence;
use crate::orchestrator::cost::{CostModel, CostTracker};
use crate::orchestrator::selection::{dependency_order, AgentSelector, KeywordSelector};
use crate::orchestrator::synthesis::Synthesizer;
use crate::types::{
    AgentResponse, AgentRole, AgentStatus, ApprovalMode, OrchestrationRequest,
    OrchestrationResponse, ResponseMetadata, RunContext, ToolCallRecord, ValidationResult,
    ValidationStatus,
};
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Cooperative cancellation handle. Checked before each agent starts; a
/// call already in flight completes or times out.
#[derive(Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Display view of one agent's last-known status
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatusView {
    pub status: AgentStatus,
    pub is_active: bool,
}

/// The control core of the council
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    provider: Arc<dyn InferenceProvider>,
    selector: Arc<dyn AgentSelector>,
    config: CouncilConfig,
    metrics: MetricsStore,
}

impl Orchestrator {
    /// Fails fast when the registry is missing the orchestration agent
    pub fn new(
        registry: Arc<AgentRegistry>,
        provider: Arc<dyn InferenceProvider>,
        config: CouncilConfig,
    ) -> Result<Self, CouncilError> {
        registry.orchestration_agent()?;
        Ok(Self {
            registry,
            provider,
            selector: Arc::new(KeywordSelector),
            config,
            metrics: MetricsStore::new(),
        })
    }

    /// Swap the selection strategy (e.g. for a trained classifier)
    pub fn with_selector(mut self, selector: Arc<dyn AgentSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Process one orchestration request end to end
    pub async fn process(&self, request: OrchestrationRequest) -> OrchestrationResponse {
        self.process_with_cancel(request, CancelFlag::new()).await
    }

    /// Like `process`, but stops before the next agent once `cancel` fires
    pub async fn process_with_cancel(
        &self,
        request: OrchestrationRequest,
        cancel: CancelFlag,
    ) -> OrchestrationResponse {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let ceiling = request
            .max_cost
            .unwrap_or(self.config.cost.default_max_cost);
        let mut tracker =
            CostTracker::new(CostModel::new(self.config.cost.cost_per_token), ceiling);

        let mut statuses: HashMap<AgentRole, AgentStatus> = AgentRole::all()
            .iter()
            .map(|role| (*role, AgentStatus::Idle))
            .collect();
        let mut responses: Vec<AgentResponse> = Vec::new();
        let mut validations: Vec<ValidationResult> = Vec::new();
        let mut suggestions: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        let mut pending: Vec<AgentRole> = Vec::new();
        let mut needs_approval = false;

        info!(%request_id, ceiling = %ceiling, "processing orchestration request");

        if request.approval_mode != ApprovalMode::Auto {
            warn!(
                mode = request.approval_mode.as_str(),
                "approval mode is not enforced; degrading to cost monitoring only"
            );
            suggestions.push(format!(
                "Approval mode '{}' is not enforced yet; this request ran with cost \
                 monitoring only",
                request.approval_mode.as_str()
            ));
        }

        // Pre-flight check for the fixed-size orchestration call. Halting
        // here means no API call was made at all.
        let orchestration_estimate =
            tracker.estimate(self.config.estimates.orchestration_tokens);
        if let Err(err) = tracker.check(orchestration_estimate) {
            warn!(%err, "halting before the orchestration call");
            errors.push(err.to_string());
            pending.push(AgentRole::Orchestration);
            pending.extend(dependency_order(AgentRole::all()));
            let final_text = Synthesizer::fallback_summary(&responses, &validations);
            return self.assemble(
                started, &tracker, responses, validations, suggestions, errors, pending, true,
                statuses, final_text,
            );
        }

        // Orchestration call: raw user message, no prior responses yet
        self.mark(&mut statuses, AgentRole::Orchestration, AgentStatus::Active);
        let orchestration_result = match self.registry.orchestration_agent() {
            Ok(agent) => {
                self.invoke_agent(agent, &request.user_message, &request.context, &[], &mut tracker, &request_id)
                    .await
            }
            Err(err) => Err(err),
        };
        match orchestration_result {
            Ok(response) => {
                self.mark(&mut statuses, AgentRole::Orchestration, AgentStatus::Completed);
                responses.push(response);
            }
            Err(err) => {
                self.mark(&mut statuses, AgentRole::Orchestration, AgentStatus::Error);
                errors.push(err.to_string());
            }
        }

        // Derive the required specialized roles, then force the fixed
        // dependency order whatever the selector produced.
        let selected = self
            .selector
            .select(&request.user_message, request.required_agents.as_deref());
        let ordered = dependency_order(&selected);
        debug!(roles = ?ordered.iter().map(|r| r.as_str()).collect::<Vec<_>>(), "selected specialized agents");

        // One commit-or-halt check for the whole remaining batch
        let batch_estimate = tracker.estimate(self.config.estimates.per_agent_tokens)
            * rust_decimal::Decimal::from(ordered.len() as u64);
        if let Err(err) = tracker.check(batch_estimate) {
            warn!(%err, agents = ordered.len(), "halting before the specialized batch");
            errors.push(err.to_string());
            let final_text = Synthesizer::fallback_summary(&responses, &validations);
            return self.assemble(
                started, &tracker, responses, validations, suggestions, errors, ordered, true,
                statuses, final_text,
            );
        }

        // Sequential execution in dependency order. A failing agent is
        // recorded and skipped; the batch continues.
        for (index, role) in ordered.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(next = %role, "request cancelled; remaining agents not started");
                pending = ordered[index..].to_vec();
                suggestions
                    .push("Request was cancelled; re-run to execute the remaining agents".to_string());
                break;
            }

            // Recheck against remaining budget in case earlier agents in
            // the batch overspent their estimate.
            let agent_estimate = tracker.estimate(self.config.estimates.per_agent_tokens);
            if let Err(err) = tracker.check(agent_estimate) {
                warn!(%err, next = %role, "halting mid-batch");
                errors.push(err.to_string());
                pending = ordered[index..].to_vec();
                needs_approval = true;
                break;
            }

            let Some(agent) = self.registry.get_by_role(*role) else {
                errors.push(
                    CouncilError::Configuration(format!("no agent registered for role {role}"))
                        .to_string(),
                );
                continue;
            };

            self.mark(&mut statuses, *role, AgentStatus::Active);
            match self
                .invoke_agent(agent, &request.user_message, &request.context, &responses, &mut tracker, &request_id)
                .await
            {
                Ok(response) => {
                    self.mark(&mut statuses, *role, AgentStatus::Completed);
                    validations.extend(derive_validations(&response));
                    responses.push(response);
                }
                Err(err) => {
                    self.mark(&mut statuses, *role, AgentStatus::Error);
                    warn!(role = %role, %err, "agent failed; continuing batch");
                    errors.push(err.to_string());
                }
            }
        }

        // Synthesis. Failure or an unaffordable estimate falls back to the
        // deterministic formatter and never surfaces as a request error.
        let final_text = self
            .synthesize_or_fallback(&request.user_message, &responses, &validations, &tracker)
            .await;

        self.assemble(
            started, &tracker, responses, validations, suggestions, errors, pending,
            needs_approval, statuses, final_text,
        )
    }

    /// Last-known agent statuses, for display only
    pub fn agent_statuses(&self) -> HashMap<String, AgentStatusView> {
        self.registry
            .statuses()
            .into_iter()
            .map(|(id, status)| {
                (
                    id,
                    AgentStatusView {
                        status,
                        is_active: status == AgentStatus::Active,
                    },
                )
            })
            .collect()
    }

    /// Per-step timing records, keyed by `{request_id}:{role}`
    pub async fn execution_metrics(&self) -> HashMap<String, ExecutionMetric> {
        self.metrics.snapshot().await
    }

    async fn invoke_agent(
        &self,
        agent: &AgentDefinition,
        user_message: &str,
        ctx: &RunContext,
        prior: &[AgentResponse],
        tracker: &mut CostTracker,
        request_id: &str,
    ) -> Result<AgentResponse, CouncilError> {
        let started = Instant::now();
        let metrics_key = format!("{request_id}:{}", agent.role);
        debug!(role = %agent.role, "invoking agent");

        let system_prompt = build_system_prompt(agent, ctx, prior);
        let timeout = Duration::from_secs(self.config.limits.call_timeout_secs);
        let inference = tokio::time::timeout(
            timeout,
            self.provider.infer(
                &system_prompt,
                user_message,
                self.config.limits.max_tokens_per_call,
                self.config.inference.temperature,
            ),
        )
        .await;

        let output = match inference {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                self.metrics
                    .record(metrics_key, started.elapsed().as_millis() as u64, false)
                    .await;
                return Err(CouncilError::agent(agent.role, err.to_string()));
            }
            Err(_) => {
                self.metrics
                    .record(metrics_key, started.elapsed().as_millis() as u64, false)
                    .await;
                return Err(CouncilError::agent(
                    agent.role,
                    format!("timed out after {}s", self.config.limits.call_timeout_secs),
                ));
            }
        };

        // Tools run sequentially after the model call; their findings feed
        // the validation layer. A failing tool is a finding, not an agent
        // failure.
        let input = json!({ "message": user_message });
        let mut tool_calls = Vec::new();
        for tool in &agent.tools {
            let result = tool.run(&input, ctx).await;
            tool_calls.push(ToolCallRecord {
                tool_name: tool.name.clone(),
                input: input.clone(),
                result,
            });
        }

        let cost = tracker.charge(output.total_tokens);
        let confidence = confidence::score(&tool_calls, &output.text);
        let reasoning = confidence::extract_reasoning(&output.text);
        let execution_time_ms = started.elapsed().as_millis() as u64;
        let tool_count = tool_calls.len();

        self.metrics.record(metrics_key, execution_time_ms, true).await;
        info!(
            role = %agent.role,
            tokens = output.total_tokens,
            cost = %cost,
            "agent completed"
        );

        Ok(AgentResponse {
            agent_id: agent.id.clone(),
            role: agent.role,
            content: output.text,
            tool_calls,
            confidence,
            reasoning,
            metadata: ResponseMetadata {
                execution_time_ms,
                tokens_used: output.total_tokens,
                tool_count,
                cost,
            },
        })
    }

    async fn synthesize_or_fallback(
        &self,
        user_message: &str,
        responses: &[AgentResponse],
        validations: &[ValidationResult],
        tracker: &CostTracker,
    ) -> String {
        if responses.is_empty() {
            return Synthesizer::fallback_summary(responses, validations);
        }
        let estimate = tracker.estimate(self.config.estimates.synthesis_tokens);
        if !tracker.can_afford(estimate) {
            debug!("synthesis skipped: estimate exceeds remaining budget");
            return Synthesizer::fallback_summary(responses, validations);
        }
        let timeout = Duration::from_secs(self.config.limits.call_timeout_secs);
        match tokio::time::timeout(
            timeout,
            Synthesizer::synthesize(
                self.provider.as_ref(),
                user_message,
                responses,
                validations,
                self.config.limits.max_tokens_per_call,
                self.config.inference.temperature,
            ),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                warn!(%err, "synthesis failed; using fallback formatter");
                Synthesizer::fallback_summary(responses, validations)
            }
            Err(_) => {
                warn!("synthesis timed out; using fallback formatter");
                Synthesizer::fallback_summary(responses, validations)
            }
        }
    }

    /// Mirror a per-request status transition to the display registry
    fn mark(
        &self,
        statuses: &mut HashMap<AgentRole, AgentStatus>,
        role: AgentRole,
        status: AgentStatus,
    ) {
        statuses.insert(role, status);
        if let Some(agent) = self.registry.get_by_role(role) {
            self.registry.set_status(&agent.id, status);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        started: Instant,
        tracker: &CostTracker,
        responses: Vec<AgentResponse>,
        validations: Vec<ValidationResult>,
        mut suggestions: Vec<String>,
        errors: Vec<String>,
        pending: Vec<AgentRole>,
        needs_approval: bool,
        statuses: HashMap<AgentRole, AgentStatus>,
        final_text: String,
    ) -> OrchestrationResponse {
        for validation in &validations {
            for suggestion in &validation.suggestions {
                suggestions.push(suggestion.clone());
            }
        }
        let mut seen = HashSet::new();
        suggestions.retain(|s| seen.insert(s.clone()));
        suggestions.truncate(self.config.limits.suggestion_cap);

        let code_artifact = extract_code_block(&final_text)
            .or_else(|| responses.iter().find_map(|r| extract_code_block(&r.content)));

        OrchestrationResponse {
            success: errors.is_empty(),
            responses,
            final_text,
            code_artifact,
            validations,
            suggestions,
            errors,
            total_time_ms: started.elapsed().as_millis() as u64,
            total_cost: tracker.spent(),
            pending_steps: pending,
            needs_approval,
            agent_statuses: statuses,
        }
    }
}

/// Instructions + owned tools + enriched context + prior responses as
/// role-labeled blocks.
fn build_system_prompt(
    agent: &AgentDefinition,
    ctx: &RunContext,
    prior: &[AgentResponse],
) -> String {
    let mut prompt = agent.instructions.clone();
    prompt.push_str(&format!("\n\nRole: {}\n", agent.role));

    if !agent.tools.is_empty() {
        prompt.push_str("\nYou own these tools; their findings are attached to your analysis:\n");
        for tool in &agent.tools {
            prompt.push_str(&tool.prompt_line());
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "\nOrganization: {} | User: {} ({})\n",
        ctx.organization_id, ctx.user_id, ctx.user_role
    ));
    if let Some(workflow_id) = &ctx.workflow_id {
        prompt.push_str(&format!("Workflow: {workflow_id}\n"));
    }

    if !ctx.history.is_empty() {
        prompt.push_str("\nConversation so far:\n");
        for message in &ctx.history {
            prompt.push_str(&format!("[{:?}] {}\n", message.role, message.content));
        }
    }

    if !prior.is_empty() {
        prompt.push_str("\nPrior agent responses:\n");
        for response in prior {
            prompt.push_str(&format!("### {}\n{}\n", response.role, response.content));
        }
    }
    prompt
}

/// Derive validation findings from the tool calls of one response.
/// Deterministic: same response, same findings.
pub fn derive_validations(response: &AgentResponse) -> Vec<ValidationResult> {
    let Some(category) = response.role.validation_category() else {
        return Vec::new();
    };
    response
        .tool_calls
        .iter()
        .map(|call| {
            let status = if !call.result.success {
                ValidationStatus::Failed
            } else if !call.result.warnings.is_empty() {
                ValidationStatus::Warning
            } else {
                ValidationStatus::Passed
            };
            let message = match status {
                ValidationStatus::Failed => call
                    .result
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("{} failed", call.tool_name)),
                ValidationStatus::Warning => call.result.warnings.join("; "),
                ValidationStatus::Passed => format!("{} passed", call.tool_name),
            };
            ValidationResult {
                role: response.role,
                category,
                status,
                message,
                details: call.result.data.clone(),
                suggestions: call.result.suggestions.clone(),
            }
        })
        .collect()
}

/// First fenced code block in the text, language line stripped
pub fn extract_code_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1)?;
    let body = &after[body_start..];
    let end = body.find("```")?;
    let block = body[..end].trim();
    if block.is_empty() {
        None
    } else {
        Some(block.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolCallRecord, ToolResult};
    use rust_decimal::Decimal;

    fn response_with_calls(role: AgentRole, calls: Vec<ToolCallRecord>) -> AgentResponse {
        AgentResponse {
            agent_id: format!("agent-{role}"),
            role,
            content: "analysis".to_string(),
            tool_calls: calls,
            confidence: 0.9,
            reasoning: None,
            metadata: ResponseMetadata {
                execution_time_ms: 1,
                tokens_used: 10,
                tool_count: 0,
                cost: Decimal::ZERO,
            },
        }
    }

    fn call(name: &str, result: ToolResult) -> ToolCallRecord {
        ToolCallRecord {
            tool_name: name.to_string(),
            input: json!({}),
            result,
        }
    }

    #[test]
    fn test_derive_validations_statuses() {
        let response = response_with_calls(
            AgentRole::Security,
            vec![
                call("scan", ToolResult::ok(json!({}))),
                call(
                    "scan2",
                    ToolResult::ok(json!({})).with_warning("risky").with_suggestion("fix it"),
                ),
                call("scan3", ToolResult::failed("broke")),
            ],
        );
        let validations = derive_validations(&response);
        assert_eq!(validations.len(), 3);
        assert_eq!(validations[0].status, ValidationStatus::Passed);
        assert_eq!(validations[1].status, ValidationStatus::Warning);
        assert_eq!(validations[1].message, "risky");
        assert_eq!(validations[1].suggestions, vec!["fix it".to_string()]);
        assert_eq!(validations[2].status, ValidationStatus::Failed);
        assert_eq!(validations[2].message, "broke");
    }

    #[test]
    fn test_orchestration_derives_no_validations() {
        let response = response_with_calls(AgentRole::Orchestration, Vec::new());
        assert!(derive_validations(&response).is_empty());
    }

    #[test]
    fn test_extract_code_block() {
        let text = "Here you go:\n```rust\nfn main() {}\n```\nDone.";
        assert_eq!(extract_code_block(text).unwrap(), "fn main() {}");
        assert_eq!(extract_code_block("no code here"), None);
        assert_eq!(extract_code_block("```\n\n```"), None);
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
