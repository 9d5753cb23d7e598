//! Google Gemini `generateContent` backend.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::functions::{dispatch, sanitize, FunctionTable};
use super::http::{json_headers, shared_client, status_to_error};
use super::{ActOptions, Agent, RoundOutcome};
use crate::error::{HostError, Result};
use crate::router::ToolRouter;
use crate::types::{Message, Part, Role, TextPart, ToolId, ToolOutcome, ToolUsePart};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini backend. Tools are declared under their composite `server.tool`
/// names and every requested call goes through the round's router.
pub struct GeminiAgent {
    model: String,
    api_key: Option<String>,
    base_url: String,
    system_prompt: Option<String>,
}

impl GeminiAgent {
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
        let contents: Vec<Value> = history.iter().flat_map(message_to_gemini).collect();
        let mut body = json!({ "contents": contents });

        let system: Vec<Value> = self
            .system_prompt
            .iter()
            .chain(options.instruction.iter())
            .map(|text| json!({ "text": text }))
            .collect();
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": system });
        }

        if !functions.is_empty() {
            let declarations: Vec<Value> = functions
                .iter()
                .map(|(name, tool)| {
                    let mut declaration = json!({
                        "name": name,
                        "description": tool.tool.description.clone().unwrap_or_default(),
                        "parametersJsonSchema": tool.tool.input_schema,
                    });
                    if let Some(output) = &tool.tool.output_schema {
                        declaration["responseJsonSchema"] = output.clone();
                    }
                    declaration
                })
                .collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }
        body
    }
}

#[async_trait]
impl Agent for GeminiAgent {
    fn name(&self) -> &str {
        "google"
    }

    async fn act(
        &self,
        router: &dyn ToolRouter,
        history: &[Message],
        options: &ActOptions,
    ) -> Result<RoundOutcome> {
        let functions = FunctionTable::new(router.list_tools().await?, function_name);
        let body = self.build_request_body(history, options, &functions);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(
            model = %self.model,
            round = options.round,
            tools = functions.len(),
            "Gemini generateContent request"
        );

        let mut request = shared_client().post(&url).headers(json_headers(None));
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let resp = request.json(&body).send().await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: GeminiResponse = resp.json().await?;
        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| HostError::backend("google", "no candidates in Gemini response"))?;

        let mut text = String::new();
        let mut calls = Vec::new();
        for part in candidate.content.parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                calls.push(call);
            }
        }

        let mut parts = Vec::new();
        if !text.is_empty() {
            parts.push(Part::text(text));
        }

        let tool_calls = calls.len();
        for call in calls {
            let Some(tool_id) = functions.resolve(&call.name) else {
                warn!(function = %call.name, "model requested an unknown tool");
                parts.push(Part::text_error(format!("unknown tool requested: {}", call.name)));
                continue;
            };
            let arguments = call.args.unwrap_or_else(|| json!({}));
            let used = dispatch(router, tool_id, arguments).await?;
            parts.push(used.into());
        }

        Ok(RoundOutcome { parts, tool_calls })
    }
}

/// The composite `server.tool` name, restricted to Gemini's character set.
fn function_name(tool_id: &ToolId) -> String {
    sanitize(&tool_id.compose(), &['.'])
}

/// One message becomes one or more contents: text runs keep the message's
/// role, and each tool use becomes a model `functionCall` followed by a user
/// `functionResponse`.
fn message_to_gemini(message: &Message) -> Vec<Value> {
    let role = match message.role {
        Role::User => "user",
        Role::Model => "model",
    };

    let mut out = Vec::new();
    let mut texts = Vec::new();
    for part in &message.parts {
        match part {
            Part::Text(TextPart::Text(t)) => texts.push(json!({ "text": t })),
            Part::Text(TextPart::Error(e)) => texts.push(json!({ "text": format!("[error] {e}") })),
            Part::ToolUse(used) => {
                if !texts.is_empty() {
                    out.push(json!({ "role": role, "parts": std::mem::take(&mut texts) }));
                }
                let name = function_name(&used.tool_id);
                out.push(json!({
                    "role": "model",
                    "parts": [{ "functionCall": { "name": name, "args": call_args(used) } }]
                }));
                out.push(json!({
                    "role": "user",
                    "parts": [{ "functionResponse": { "name": name, "response": call_response(used) } }]
                }));
            }
        }
    }
    if !texts.is_empty() {
        out.push(json!({ "role": role, "parts": texts }));
    }
    out
}

fn call_args(used: &ToolUsePart) -> Value {
    match &used.input {
        Value::Object(_) => used.input.clone(),
        Value::Null => json!({}),
        other => json!({ "input": other }),
    }
}

/// Gemini wants an object response; anything else is wrapped as `output`.
fn call_response(used: &ToolUsePart) -> Value {
    match &used.outcome {
        ToolOutcome::Output(output) => match output.clone().into_value() {
            value @ Value::Object(_) => value,
            value => json!({ "output": value }),
        },
        ToolOutcome::Error(error) => json!({ "error": error }),
    }
}

// Gemini response types (internal)

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<Value>,
}
