//! Bounded round loop driving an [`Agent`] through one turn.

use tracing::{debug, info};

use super::{ActOptions, Agent};
use crate::error::{HostError, Result};
use crate::router::{NullToolRouter, ToolRouter};
use crate::types::{Message, Part};

pub const DEFAULT_MAX_ROUNDS: usize = 3;

/// Steering for middle rounds.
pub const CONTINUE_INSTRUCTION: &str = "Tool outputs are not shown to the user. \
Continue your reply to the user in natural language, and call further tools only if necessary.";

/// Steering for the last round, which offers no tools.
pub const CONCLUDE_INSTRUCTION: &str = "Tool outputs are not shown to the user. \
Conclude your reply to the user in natural language without calling any more tools.";

/// Runs up to `max_rounds` rounds and folds their parts into one model message.
///
/// Round 1 sees the caller's history. Later rounds see that history plus a
/// synthetic model message holding every part produced so far. The last round
/// of a multi-round budget gets a [`NullToolRouter`]. A round with no tool
/// calls ends the turn early.
#[derive(Debug, Clone, Copy)]
pub struct AgentLoop {
    max_rounds: usize,
}

impl Default for AgentLoop {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl AgentLoop {
    pub fn new(max_rounds: usize) -> Result<Self> {
        if max_rounds == 0 {
            return Err(HostError::Configuration(
                "max rounds must be at least 1".into(),
            ));
        }
        Ok(Self { max_rounds })
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    fn options_for(&self, round: usize) -> ActOptions {
        let final_round = round == self.max_rounds && self.max_rounds > 1;
        let instruction = match round {
            1 => None,
            _ if final_round => Some(CONCLUDE_INSTRUCTION.to_string()),
            _ => Some(CONTINUE_INSTRUCTION.to_string()),
        };
        ActOptions {
            round,
            final_round,
            instruction,
        }
    }

    pub async fn run(
        &self,
        agent: &dyn Agent,
        router: &dyn ToolRouter,
        history: &[Message],
    ) -> Result<Message> {
        let mut parts: Vec<Part> = Vec::new();

        for round in 1..=self.max_rounds {
            let options = self.options_for(round);
            let round_router: &dyn ToolRouter = if options.final_round {
                &NullToolRouter
            } else {
                router
            };

            let outcome = if round == 1 {
                agent.act(round_router, history, &options).await?
            } else {
                let mut extended = history.to_vec();
                extended.push(Message::model(parts.clone()));
                agent.act(round_router, &extended, &options).await?
            };

            debug!(
                agent = agent.name(),
                round,
                tool_calls = outcome.tool_calls,
                parts = outcome.parts.len(),
                "agent round complete"
            );

            let complete = outcome.is_complete();
            parts.extend(outcome.parts);
            if complete {
                break;
            }
        }

        info!(agent = agent.name(), parts = parts.len(), "turn complete");
        Ok(Message::model(parts))
    }
}
