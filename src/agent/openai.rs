//! OpenAI-compatible Chat Completions backend.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::functions::{dispatch, sanitize, FunctionTable};
use super::http::{json_headers, shared_client, status_to_error};
use super::{ActOptions, Agent, RoundOutcome};
use crate::error::{HostError, Result};
use crate::router::ToolRouter;
use crate::types::{Message, Part, Role, TextPart, ToolId, ToolOutcome};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat Completions backend. Tools are offered as functions and every call
/// the model requests is dispatched through the round's router.
pub struct OpenAiAgent {
    model: String,
    api_key: Option<String>,
    base_url: String,
    system_prompt: Option<String>,
}

impl OpenAiAgent {
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(
        &self,
        history: &[Message],
        options: &ActOptions,
        functions: &FunctionTable,
    ) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &self.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        for (index, message) in history.iter().enumerate() {
            messages.extend(message_to_openai(index, message));
        }
        if let Some(instruction) = &options.instruction {
            messages.push(json!({ "role": "system", "content": instruction }));
        }

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !functions.is_empty() {
            body["tools"] = Value::Array(function_definitions(functions));
        }
        body
    }
}

#[async_trait]
impl Agent for OpenAiAgent {
    fn name(&self) -> &str {
        "openai"
    }

    async fn act(
        &self,
        router: &dyn ToolRouter,
        history: &[Message],
        options: &ActOptions,
    ) -> Result<RoundOutcome> {
        let functions = FunctionTable::new(router.list_tools().await?, function_name);
        let body = self.build_request_body(history, options, &functions);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %self.model,
            round = options.round,
            tools = functions.len(),
            "chat completion request"
        );

        let resp = shared_client()
            .post(&url)
            .headers(json_headers(self.api_key.as_deref()))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| HostError::backend("openai", "response has no choices"))?;

        let mut parts = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            parts.push(Part::text(text));
        }

        let calls = choice.message.tool_calls.unwrap_or_default();
        let tool_calls = calls.len();
        for call in calls {
            let Some(tool_id) = functions.resolve(&call.function.name) else {
                warn!(function = %call.function.name, "model requested an unknown tool");
                parts.push(Part::text_error(format!(
                    "unknown tool requested: {}",
                    call.function.name
                )));
                continue;
            };
            let arguments = serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments));
            let used = dispatch(router, tool_id, arguments).await?;
            parts.push(used.into());
        }

        Ok(RoundOutcome { parts, tool_calls })
    }
}

/// `server__tool`, restricted to `[A-Za-z0-9_-]` and 64 characters.
fn function_name(tool_id: &ToolId) -> String {
    sanitize(&format!("{}__{}", tool_id.server_name, tool_id.name), &[])
}

fn function_definitions(functions: &FunctionTable) -> Vec<Value> {
    functions
        .iter()
        .map(|(name, tool)| {
            json!({
                "type": "function",
                "function": {
                    "name": name,
                    "description": tool.tool.description.clone().unwrap_or_default(),
                    "parameters": tool.tool.input_schema,
                }
            })
        })
        .collect()
}

fn message_to_openai(index: usize, message: &Message) -> Vec<Value> {
    let role = match message.role {
        Role::User => "user",
        Role::Model => "assistant",
    };

    let mut out = Vec::new();
    let mut text = String::new();
    for (position, part) in message.parts.iter().enumerate() {
        match part {
            Part::Text(TextPart::Text(t)) => text.push_str(t),
            Part::Text(TextPart::Error(e)) => text.push_str(&format!("[error] {e}")),
            Part::ToolUse(used) => {
                if !text.is_empty() {
                    out.push(json!({ "role": role, "content": std::mem::take(&mut text) }));
                }
                let call_id = format!("call_{index}_{position}");
                out.push(json!({
                    "role": "assistant",
                    "content": Value::Null,
                    "tool_calls": [{
                        "id": call_id,
                        "type": "function",
                        "function": {
                            "name": function_name(&used.tool_id),
                            "arguments": used.input.to_string(),
                        }
                    }]
                }));
                let result = match &used.outcome {
                    ToolOutcome::Output(output) => output.clone().into_value(),
                    ToolOutcome::Error(error) => json!({ "error": error }),
                };
                out.push(json!({
                    "role": "tool",
                    "tool_call_id": call_id,
                    "content": result.to_string(),
                }));
            }
        }
    }
    if !text.is_empty() {
        out.push(json!({ "role": role, "content": text }));
    }
    out
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Deserialize)]
struct ChatToolCall {
    function: ChatFunction,
}

#[derive(Deserialize)]
struct ChatFunction {
    name: String,
    arguments: String,
}
