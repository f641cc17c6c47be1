//! Agent selection strategy
//!
//! A pure, swappable function from (message, explicit list) to the set of
//! required specialized roles. Execution order is decided separately by
//! `dependency_order`, never by the selector.

use crate::types::AgentRole;
use tracing::warn;

/// Fixed execution order for specialized agents. Security findings must be
/// visible before integration, design, and quality reasoning runs.
pub const DEPENDENCY_ORDER: [AgentRole; 4] = [
    AgentRole::Security,
    AgentRole::Integration,
    AgentRole::Design,
    AgentRole::Quality,
];

/// Filter a selection down to the fixed dependency order. The result is
/// always a subsequence of `DEPENDENCY_ORDER`, whatever order the selector
/// produced.
pub fn dependency_order(selected: &[AgentRole]) -> Vec<AgentRole> {
    DEPENDENCY_ORDER
        .iter()
        .filter(|role| selected.contains(role))
        .copied()
        .collect()
}

/// Strategy contract: same input, same output
pub trait AgentSelector: Send + Sync {
    fn select(&self, message: &str, explicit: Option<&[AgentRole]>) -> Vec<AgentRole>;
}

/// Keyword/substring classifier over role-relevant vocabularies
#[derive(Debug, Default, Clone)]
pub struct KeywordSelector;

const INTEGRATION_KEYWORDS: &[&str] = &[
    "integration", "integrate", "api", "webhook", "sync", "salesforce", "slack", "stripe",
    "hubspot", "jira", "github", "gmail", "zapier", "twilio",
];

const DESIGN_KEYWORDS: &[&str] = &[
    "form", "ui", "dashboard", "layout", "page", "screen", "design", "interface",
];

const CREATION_KEYWORDS: &[&str] = &["create", "build", "make", "generate", "add", "new", "set up"];

const QUALITY_KEYWORDS: &[&str] = &["code", "workflow", "function", "script", "test", "logic"];

fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| message.contains(k))
}

impl AgentSelector for KeywordSelector {
    fn select(&self, message: &str, explicit: Option<&[AgentRole]>) -> Vec<AgentRole> {
        if let Some(roles) = explicit {
            // Caller-supplied lists are used verbatim; orchestration always
            // runs first anyway and is dropped here if listed.
            let mut selected = Vec::new();
            for role in roles {
                if *role == AgentRole::Orchestration {
                    warn!("explicit agent list includes orchestration; ignoring it");
                    continue;
                }
                if !selected.contains(role) {
                    selected.push(*role);
                }
            }
            return selected;
        }

        let message = message.to_lowercase();
        let mut selected = Vec::new();
        if contains_any(&message, CREATION_KEYWORDS) {
            selected.push(AgentRole::Security);
        }
        if contains_any(&message, INTEGRATION_KEYWORDS) {
            selected.push(AgentRole::Integration);
        }
        if contains_any(&message, DESIGN_KEYWORDS) {
            selected.push(AgentRole::Design);
        }
        if contains_any(&message, QUALITY_KEYWORDS) {
            selected.push(AgentRole::Quality);
        }

        if selected.is_empty() {
            // Nothing matched: the whole council weighs in
            DEPENDENCY_ORDER.to_vec()
        } else {
            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_list_used_verbatim() {
        let selector = KeywordSelector;
        let explicit = [AgentRole::Quality, AgentRole::Design, AgentRole::Quality];
        let selected = selector.select("anything at all", Some(&explicit));
        assert_eq!(selected, vec![AgentRole::Quality, AgentRole::Design]);
    }

    #[test]
    fn test_explicit_list_drops_orchestration() {
        let selector = KeywordSelector;
        let explicit = [AgentRole::Orchestration, AgentRole::Security];
        let selected = selector.select("anything", Some(&explicit));
        assert_eq!(selected, vec![AgentRole::Security]);
    }

    #[test]
    fn test_keyword_buckets() {
        let selector = KeywordSelector;
        let selected = selector.select("Build a form that syncs to Salesforce", None);
        assert!(selected.contains(&AgentRole::Security)); // creation intent
        assert!(selected.contains(&AgentRole::Integration));
        assert!(selected.contains(&AgentRole::Design));
        assert!(!selected.contains(&AgentRole::Quality));
    }

    #[test]
    fn test_no_match_defaults_to_all_four() {
        let selector = KeywordSelector;
        let selected = selector.select("hello there", None);
        assert_eq!(selected, DEPENDENCY_ORDER.to_vec());
    }

    #[test]
    fn test_selection_is_pure() {
        let selector = KeywordSelector;
        let message = "create a workflow with an api call";
        assert_eq!(selector.select(message, None), selector.select(message, None));
    }

    #[test]
    fn test_dependency_order_is_subsequence() {
        let selected = vec![AgentRole::Quality, AgentRole::Security, AgentRole::Design];
        assert_eq!(
            dependency_order(&selected),
            vec![AgentRole::Security, AgentRole::Design, AgentRole::Quality]
        );
        assert!(dependency_order(&[]).is_empty());
    }
}
