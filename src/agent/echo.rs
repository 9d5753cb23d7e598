//! Backend that repeats the caller's last text.

use async_trait::async_trait;

use super::{ActOptions, Agent, RoundOutcome};
use crate::error::Result;
use crate::router::ToolRouter;
use crate::types::Message;

/// Echoes the last text part of the last message. Never calls tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoAgent;

impl EchoAgent {
    pub const NOTHING: &'static str = "nothing to echo";
}

#[async_trait]
impl Agent for EchoAgent {
    fn name(&self) -> &str {
        "echo"
    }

    async fn act(
        &self,
        _router: &dyn ToolRouter,
        history: &[Message],
        _options: &ActOptions,
    ) -> Result<RoundOutcome> {
        let text = history
            .last()
            .and_then(Message::last_text)
            .unwrap_or(Self::NOTHING);
        Ok(RoundOutcome::text(text))
    }
}
