//! Conversation messages and their tagged parts.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::tool::ToolId;

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    /// Create a user message holding one text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a host-generated message.
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// The last successful text part, if any.
    pub fn last_text(&self) -> Option<&str> {
        self.parts.iter().rev().find_map(Part::as_text)
    }

    /// Concatenate all successful text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Conversation role.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Caller input.
    User,
    /// Host-generated output.
    Model,
}

/// Text content or an error message in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPart {
    Text(String),
    Error(String),
}

/// Result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallOutput {
    /// Absent and `null` are distinct: `Some(Value::Null)` survives encoding.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub structured_content: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<serde_json::Value>,
}

impl ToolCallOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn structured(value: serde_json::Value) -> Self {
        Self {
            structured_content: Some(value),
            ..Default::default()
        }
    }

    /// Collapse to one JSON value, preferring structured content.
    pub fn into_value(self) -> serde_json::Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        if let Some(text) = self.text {
            return serde_json::Value::String(text);
        }
        serde_json::Value::Array(self.content)
    }
}

fn present_value<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// How a tool invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Output(ToolCallOutput),
    Error(String),
}

/// Record of one tool invocation and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUsePart {
    pub tool_id: ToolId,
    pub input: serde_json::Value,
    pub outcome: ToolOutcome,
}

impl ToolUsePart {
    pub fn succeeded(tool_id: ToolId, input: serde_json::Value, output: ToolCallOutput) -> Self {
        Self {
            tool_id,
            input,
            outcome: ToolOutcome::Output(output),
        }
    }

    pub fn failed(tool_id: ToolId, input: serde_json::Value, error: impl Into<String>) -> Self {
        Self {
            tool_id,
            input,
            outcome: ToolOutcome::Error(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Error(_))
    }
}

/// One element of a message.
///
/// Encoded as an object with a `type` discriminant (`text` or `tool-use`)
/// followed by the variant fields. Decoding an unknown `type` fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(TextPart),
    ToolUse(ToolUsePart),
}

impl Part {
    pub const TEXT_TAG: &'static str = "text";
    pub const TOOL_USE_TAG: &'static str = "tool-use";

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextPart::Text(text.into()))
    }

    pub fn text_error(error: impl Into<String>) -> Self {
        Self::Text(TextPart::Error(error.into()))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Text(_) => Self::TEXT_TAG,
            Self::ToolUse(_) => Self::TOOL_USE_TAG,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(TextPart::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUsePart> {
        match self {
            Self::ToolUse(part) => Some(part),
            _ => None,
        }
    }
}

impl From<ToolUsePart> for Part {
    fn from(part: ToolUsePart) -> Self {
        Self::ToolUse(part)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodedPart<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_id: Option<&'a ToolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a ToolCallOutput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodedPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    tool_id: Option<ToolId>,
    #[serde(default)]
    input: Option<serde_json::Value>,
    #[serde(default)]
    output: Option<ToolCallOutput>,
}

impl Serialize for Part {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut encoded = EncodedPart {
            kind: self.tag(),
            text: None,
            error: None,
            tool_id: None,
            input: None,
            output: None,
        };
        match self {
            Self::Text(TextPart::Text(text)) => encoded.text = Some(text),
            Self::Text(TextPart::Error(error)) => encoded.error = Some(error),
            Self::ToolUse(part) => {
                encoded.tool_id = Some(&part.tool_id);
                encoded.input = Some(&part.input);
                match &part.outcome {
                    ToolOutcome::Output(output) => encoded.output = Some(output),
                    ToolOutcome::Error(error) => encoded.error = Some(error),
                }
            }
        }
        encoded.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let decoded = DecodedPart::deserialize(deserializer)?;
        match decoded.kind.as_str() {
            Self::TEXT_TAG => match (decoded.text, decoded.error) {
                (Some(text), None) => Ok(Self::Text(TextPart::Text(text))),
                (None, Some(error)) => Ok(Self::Text(TextPart::Error(error))),
                (Some(_), Some(_)) => Err(D::Error::custom(
                    "text part carries both text and error",
                )),
                (None, None) => Err(D::Error::custom("text part carries neither text nor error")),
            },
            Self::TOOL_USE_TAG => {
                let tool_id = decoded
                    .tool_id
                    .ok_or_else(|| D::Error::missing_field("toolId"))?;
                let input = decoded.input.unwrap_or(serde_json::Value::Null);
                let outcome = match (decoded.output, decoded.error) {
                    (Some(output), None) => ToolOutcome::Output(output),
                    (None, Some(error)) => ToolOutcome::Error(error),
                    (Some(_), Some(_)) => {
                        return Err(D::Error::custom(
                            "tool-use part carries both output and error",
                        ))
                    }
                    (None, None) => ToolOutcome::Output(ToolCallOutput::default()),
                };
                Ok(Self::ToolUse(ToolUsePart {
                    tool_id,
                    input,
                    outcome,
                }))
            }
            other => Err(D::Error::custom(format!("unknown part type: {other}"))),
        }
    }
}
