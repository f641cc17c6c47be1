//! Error taxonomy for the council
//!
//! Only `Configuration` is fatal; everything else is absorbed into the
//! structured `OrchestrationResponse` before it can escape `process()`.

use crate::types::AgentRole;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CouncilError {
    /// A required agent is missing from the registry. Raised at
    /// construction time and never recovered.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pre-flight estimate would push spend past the ceiling. Terminal
    /// for the request; diagnostics itemize the overage.
    #[error(
        "estimated cost ${estimated} exceeds cost limit ${limit} \
         (spent so far: ${spent})"
    )]
    BudgetExceeded {
        limit: Decimal,
        spent: Decimal,
        estimated: Decimal,
    },

    /// A single agent invocation failed; recorded and skipped, the batch
    /// continues.
    #[error("{role} agent failed: {message}")]
    AgentExecution { role: AgentRole, message: String },

    /// The AI synthesis step failed; recovered via the fallback formatter.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// The inference provider returned an error or malformed output.
    #[error("inference request failed: {0}")]
    Inference(String),

    /// A tool rejected its input or could not run.
    #[error("tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },
}

impl CouncilError {
    pub fn agent(role: AgentRole, message: impl Into<String>) -> Self {
        CouncilError::AgentExecution {
            role,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_budget_message_names_overage() {
        let err = CouncilError::BudgetExceeded {
            limit: dec!(0.05),
            spent: dec!(0.03),
            estimated: dec!(0.04),
        };
        let msg = err.to_string();
        assert!(msg.contains("exceeds cost limit"));
        assert!(msg.contains("0.05"));
        assert!(msg.contains("0.03"));
        assert!(msg.contains("0.04"));
    }

    #[test]
    fn test_agent_error_names_role() {
        let err = CouncilError::agent(AgentRole::Quality, "timed out");
        assert!(err.to_string().contains("quality agent failed"));
    }
}
