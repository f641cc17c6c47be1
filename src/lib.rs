//! Agent Council - Multi-Agent Analysis Library
//!
//! Coordinates specialized AI agents (security, design, integration,
//! quality) behind an orchestration agent that decides who runs, enforces
//! a hard monetary cost ceiling, executes agents in dependency order, and
//! synthesizes one final report.
//!
//! # Example
//!
//! ```ignore
//! use agent_council::agents::AgentRegistry;
//! use agent_council::config::CouncilConfig;
//! use agent_council::inference::HttpInferenceClient;
//! use agent_council::orchestrator::Orchestrator;
//! use agent_council::types::{OrchestrationRequest, RunContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CouncilConfig::from_env();
//!     let provider = Arc::new(HttpInferenceClient::new(&config.inference)?);
//!     let registry = Arc::new(AgentRegistry::new()?);
//!     let orchestrator = Orchestrator::new(registry, provider, config)?;
//!
//!     let context = RunContext::new("org-1", "user-1");
//!     let request = OrchestrationRequest::new("Build a Slack integration", context);
//!     let response = orchestrator.process(request).await;
//!     println!("{}", response.final_text);
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod error;
pub mod config;
pub mod inference;
pub mod tools;
pub mod agents;
pub mod orchestrator;
pub mod metrics;

// Re-export commonly used types for convenience
pub use agents::{AgentDefinition, AgentRegistry};
pub use config::CouncilConfig;
pub use error::CouncilError;
pub use inference::{HttpInferenceClient, InferenceOutput, InferenceProvider};
pub use orchestrator::{CancelFlag, Orchestrator};
pub use types::{
    AgentResponse, AgentRole, AgentStatus, ApprovalMode, OrchestrationRequest,
    OrchestrationResponse, RunContext, ValidationResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Install a global tracing subscriber honoring `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    static INIT: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
    INIT.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
