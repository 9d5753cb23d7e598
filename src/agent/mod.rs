//! Agents: pluggable backends that act on a conversation with routed tools.

pub mod control;
pub mod echo;
#[cfg(any(feature = "openai", feature = "google"))]
pub(crate) mod functions;
#[cfg(feature = "google")]
pub mod google;
#[cfg(any(feature = "openai", feature = "google"))]
pub mod http;
#[cfg(feature = "openai")]
pub mod openai;

pub use control::{AgentLoop, CONCLUDE_INSTRUCTION, CONTINUE_INSTRUCTION, DEFAULT_MAX_ROUNDS};
pub use echo::EchoAgent;
#[cfg(feature = "google")]
pub use google::GeminiAgent;
#[cfg(feature = "openai")]
pub use openai::OpenAiAgent;

use async_trait::async_trait;

use crate::error::Result;
use crate::router::ToolRouter;
use crate::types::{Message, Part};

/// Per-round context passed to [`Agent::act`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActOptions {
    /// 1-based round index within the turn.
    pub round: usize,
    /// Set on the last round, where no tools are offered.
    pub final_round: bool,
    /// Steering note for the backend, absent on the first round.
    pub instruction: Option<String>,
}

/// What one round produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundOutcome {
    pub parts: Vec<Part>,
    /// Tool calls requested and dispatched this round.
    pub tool_calls: usize,
}

impl RoundOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
            tool_calls: 0,
        }
    }

    /// A round with no tool calls ends the turn.
    pub fn is_complete(&self) -> bool {
        self.tool_calls == 0
    }
}

/// A reasoning backend. One call is one round.
///
/// Routing errors returned by the router should be propagated; tool failures
/// arrive as error parts and belong in the returned outcome.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    async fn act(
        &self,
        router: &dyn ToolRouter,
        history: &[Message],
        options: &ActOptions,
    ) -> Result<RoundOutcome>;
}
