//! Final-report synthesis
//!
//! Merges all agent responses and validation findings into one narrative.
//! When the AI synthesis call fails, a deterministic formatter takes over;
//! that path never fails and never surfaces an error to the caller.

use crate::error::CouncilError;
use crate::inference::InferenceProvider;
use crate::types::{AgentResponse, ValidationResult, ValidationStatus};
use tracing::debug;

const SUMMARY_TRUNCATE_CHARS: usize = 400;

pub struct Synthesizer;

impl Synthesizer {
    /// AI-generated synthesis of the council's output
    pub async fn synthesize(
        provider: &dyn InferenceProvider,
        user_message: &str,
        responses: &[AgentResponse],
        validations: &[ValidationResult],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, CouncilError> {
        let prompt = Self::build_prompt(responses, validations);
        debug!(agents = responses.len(), "running synthesis");
        let output = provider
            .infer(&prompt, user_message, max_tokens, temperature)
            .await
            .map_err(|e| CouncilError::Synthesis(e.to_string()))?;
        if output.text.trim().is_empty() {
            return Err(CouncilError::Synthesis(
                "synthesis produced empty output".to_string(),
            ));
        }
        Ok(output.text)
    }

    fn build_prompt(responses: &[AgentResponse], validations: &[ValidationResult]) -> String {
        let mut prompt = String::from(
            "You are the synthesis step of an analysis council. Merge the agent \
             findings below into one coherent report for the user. Lead with the \
             overall assessment, then the concrete issues and recommendations.\n\n\
             Agent findings:\n",
        );
        for response in responses {
            prompt.push_str(&format!("### {}\n{}\n\n", response.role, response.content));
        }
        if !validations.is_empty() {
            prompt.push_str("Validation findings:\n");
            for validation in validations {
                prompt.push_str(&format!(
                    "- [{:?}] {}: {}\n",
                    validation.status, validation.role, validation.message
                ));
            }
        }
        prompt
    }

    /// Deterministic fallback: truncated per-agent summaries plus every
    /// failed or warning finding. Infallible by construction.
    pub fn fallback_summary(
        responses: &[AgentResponse],
        validations: &[ValidationResult],
    ) -> String {
        let mut report = String::from("Council analysis summary:\n");

        if responses.is_empty() {
            report.push_str("\nNo agent responses were produced.\n");
        }
        for response in responses {
            let mut summary = response.content.trim().to_string();
            if summary.len() > SUMMARY_TRUNCATE_CHARS {
                let mut cut = SUMMARY_TRUNCATE_CHARS;
                while !summary.is_char_boundary(cut) {
                    cut -= 1;
                }
                summary.truncate(cut);
                summary.push_str("...");
            }
            report.push_str(&format!("\n[{}]\n{}\n", response.role, summary));
        }

        let flagged: Vec<&ValidationResult> = validations
            .iter()
            .filter(|v| v.status != ValidationStatus::Passed)
            .collect();
        if !flagged.is_empty() {
            report.push_str("\nFindings requiring attention:\n");
            for validation in flagged {
                report.push_str(&format!(
                    "- {} ({:?}): {}\n",
                    validation.role, validation.status, validation.message
                ));
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AgentRole, AgentResponse, ResponseMetadata, ValidationCategory, ValidationStatus,
    };
    use rust_decimal::Decimal;

    fn response(role: AgentRole, content: &str) -> AgentResponse {
        AgentResponse {
            agent_id: format!("agent-{role}"),
            role,
            content: content.to_string(),
            tool_calls: Vec::new(),
            confidence: 0.9,
            reasoning: None,
            metadata: ResponseMetadata {
                execution_time_ms: 10,
                tokens_used: 100,
                tool_count: 0,
                cost: Decimal::ZERO,
            },
        }
    }

    fn validation(status: ValidationStatus, message: &str) -> ValidationResult {
        ValidationResult {
            role: AgentRole::Security,
            category: ValidationCategory::Security,
            status,
            message: message.to_string(),
            details: None,
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_fallback_names_every_role_and_flagged_finding() {
        let responses = vec![
            response(AgentRole::Orchestration, "plan"),
            response(AgentRole::Security, "risk found"),
            response(AgentRole::Quality, "looks fine"),
        ];
        let validations = vec![
            validation(ValidationStatus::Passed, "scan passed"),
            validation(ValidationStatus::Warning, "plaintext endpoint"),
            validation(ValidationStatus::Failed, "permission denied"),
        ];

        let report = Synthesizer::fallback_summary(&responses, &validations);
        assert!(report.contains("orchestration"));
        assert!(report.contains("security"));
        assert!(report.contains("quality"));
        assert!(report.contains("plaintext endpoint"));
        assert!(report.contains("permission denied"));
        assert!(!report.contains("scan passed"));
    }

    #[test]
    fn test_fallback_truncates_long_content() {
        let long = "a".repeat(1000);
        let responses = vec![response(AgentRole::Design, &long)];
        let report = Synthesizer::fallback_summary(&responses, &[]);
        assert!(report.contains("..."));
        assert!(report.len() < long.len());
    }

    #[test]
    fn test_fallback_handles_empty_input() {
        let report = Synthesizer::fallback_summary(&[], &[]);
        assert!(report.contains("No agent responses"));
    }

    #[test]
    fn test_prompt_includes_findings() {
        let responses = vec![response(AgentRole::Integration, "uses salesforce")];
        let validations = vec![validation(ValidationStatus::Warning, "no auth mentioned")];
        let prompt = Synthesizer::build_prompt(&responses, &validations);
        assert!(prompt.contains("### integration"));
        assert!(prompt.contains("no auth mentioned"));
    }
}
