//! Agent definitions and the agent registry
//!
//! One immutable agent per role, built eagerly at startup. Registry
//! membership never changes after construction; only display statuses
//! mutate.

use crate::error::CouncilError;
use crate::tools::{builtin, Tool};
use crate::types::{AgentRole, AgentStatus};
use std::collections::HashMap;
use std::sync::RwLock;

/// Immutable descriptor of one council agent
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub id: String,
    pub role: AgentRole,
    /// Natural-language instructions prefixed to every system prompt
    pub instructions: String,
    /// Tools this agent owns; invoked sequentially during its turn
    pub tools: Vec<Tool>,
    pub capabilities: Vec<String>,
}

fn instructions_for(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Orchestration => {
            "You are the orchestration agent of an analysis council. Break the user's \
             request into the concerns that matter: security exposure, third-party \
             integrations, UI surfaces, and workflow quality. Summarize what the \
             specialized agents should focus on. Be concise and concrete."
        }
        AgentRole::Security => {
            "You are the security agent. Assess the request for exposure of secrets, \
             unsafe execution, missing authentication, and permission gaps. State each \
             risk plainly and say what would mitigate it."
        }
        AgentRole::Design => {
            "You are the design agent. Assess any requested forms, dashboards, or other \
             UI surfaces for usability, validation, and accessibility. Recommend concrete \
             layout and interaction improvements."
        }
        AgentRole::Integration => {
            "You are the integration agent. Identify every third-party system the request \
             touches, how it should authenticate, and what failure modes the integration \
             needs to handle."
        }
        AgentRole::Quality => {
            "You are the quality agent. Assess the requested workflow's logic, error \
             handling, and testability. Point out vague requirements and missing edge \
             cases."
        }
    }
}

fn capabilities_for(role: AgentRole) -> Vec<String> {
    let caps: &[&str] = match role {
        AgentRole::Orchestration => &["planning", "delegation"],
        AgentRole::Security => &["threat-analysis", "permission-audit"],
        AgentRole::Design => &["ui-review", "accessibility"],
        AgentRole::Integration => &["api-mapping", "auth-review"],
        AgentRole::Quality => &["workflow-lint", "edge-case-analysis"],
    };
    caps.iter().map(|c| c.to_string()).collect()
}

fn tools_for(role: AgentRole) -> Result<Vec<Tool>, CouncilError> {
    match role {
        AgentRole::Orchestration => Ok(Vec::new()),
        AgentRole::Security => builtin::security_tools(),
        AgentRole::Design => builtin::design_tools(),
        AgentRole::Integration => builtin::integration_tools(),
        AgentRole::Quality => builtin::quality_tools(),
    }
}

/// Holds one agent instance per role plus display-only statuses.
///
/// Status here exists for dashboards and diagnostics; correctness
/// decisions always use the per-request status map in the orchestrator.
pub struct AgentRegistry {
    agents: Vec<AgentDefinition>,
    statuses: RwLock<HashMap<String, AgentStatus>>,
}

impl AgentRegistry {
    /// Eagerly instantiate exactly one agent per defined role
    pub fn new() -> Result<Self, CouncilError> {
        let mut agents = Vec::new();
        for role in AgentRole::all() {
            agents.push(AgentDefinition {
                id: format!("agent-{}", role.as_str()),
                role: *role,
                instructions: instructions_for(*role).to_string(),
                tools: tools_for(*role)?,
                capabilities: capabilities_for(*role),
            });
        }
        let statuses = agents
            .iter()
            .map(|a| (a.id.clone(), AgentStatus::Idle))
            .collect();
        Ok(Self {
            agents,
            statuses: RwLock::new(statuses),
        })
    }

    pub fn get(&self, id: &str) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn get_by_role(&self, role: AgentRole) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.role == role)
    }

    pub fn all(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// All agents except orchestration
    pub fn specialized(&self) -> Vec<&AgentDefinition> {
        self.agents
            .iter()
            .filter(|a| a.role != AgentRole::Orchestration)
            .collect()
    }

    /// The orchestration agent. Its absence is a configuration error, not
    /// a runtime condition.
    pub fn orchestration_agent(&self) -> Result<&AgentDefinition, CouncilError> {
        self.get_by_role(AgentRole::Orchestration).ok_or_else(|| {
            CouncilError::Configuration("orchestration agent missing from registry".to_string())
        })
    }

    /// Update the display status for an agent. Lost writes between
    /// concurrent requests are acceptable here.
    pub fn set_status(&self, id: &str, status: AgentStatus) {
        if let Ok(mut statuses) = self.statuses.write() {
            if let Some(entry) = statuses.get_mut(id) {
                *entry = status;
            }
        }
    }

    /// Snapshot of last-known statuses, display only
    pub fn statuses(&self) -> HashMap<String, AgentStatus> {
        self.statuses
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_one_agent_per_role() {
        let registry = AgentRegistry::new().unwrap();
        assert_eq!(registry.all().len(), AgentRole::all().len());
        for role in AgentRole::all() {
            let agent = registry.get_by_role(*role).unwrap();
            assert_eq!(agent.role, *role);
            assert!(!agent.instructions.is_empty());
        }
    }

    #[test]
    fn test_specialized_excludes_orchestration() {
        let registry = AgentRegistry::new().unwrap();
        let specialized = registry.specialized();
        assert_eq!(specialized.len(), 4);
        assert!(specialized.iter().all(|a| a.role != AgentRole::Orchestration));
    }

    #[test]
    fn test_orchestration_agent_present() {
        let registry = AgentRegistry::new().unwrap();
        let agent = registry.orchestration_agent().unwrap();
        assert_eq!(agent.role, AgentRole::Orchestration);
        assert_eq!(registry.get(&agent.id).unwrap().id, agent.id);
    }

    #[test]
    fn test_status_updates() {
        let registry = AgentRegistry::new().unwrap();
        registry.set_status("agent-security", AgentStatus::Active);
        let statuses = registry.statuses();
        assert_eq!(statuses["agent-security"], AgentStatus::Active);
        assert_eq!(statuses["agent-quality"], AgentStatus::Idle);

        // Unknown ids are ignored
        registry.set_status("agent-unknown", AgentStatus::Error);
        assert!(!registry.statuses().contains_key("agent-unknown"));
    }

    #[test]
    fn test_specialized_agents_own_tools() {
        let registry = AgentRegistry::new().unwrap();
        for agent in registry.specialized() {
            assert!(
                !agent.tools.is_empty(),
                "{} agent should own at least one tool",
                agent.role
            );
        }
    }
}
