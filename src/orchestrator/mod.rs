//! Multi-agent orchestration module

pub mod confidence;
pub mod cost;
pub mod engine;
pub mod selection;
pub mod synthesis;

// Re-export commonly used types
pub use cost::{CostModel, CostTracker};
pub use engine::{CancelFlag, Orchestrator};
pub use selection::{dependency_order, AgentSelector, KeywordSelector, DEPENDENCY_ORDER};
pub use synthesis::Synthesizer;
