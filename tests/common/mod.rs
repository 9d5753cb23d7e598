//! Shared test helpers: in-memory tool servers and a connector for them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use mcp_host::error::{HostError, Result};
use mcp_host::mcp::{Session, SessionConnector, SessionSpec, ToolPage};
use mcp_host::types::{JsonObject, ToolCallOutput, ToolDescriptor};

pub type CallLog = Arc<Mutex<Vec<(String, Option<JsonObject>)>>>;

/// An in-memory tool server.
///
/// `greet` answers `Hello, <name>!`; every other tool echoes its arguments
/// back as structured content.
pub struct MockSession {
    name: String,
    tools: Vec<ToolDescriptor>,
    pub calls: CallLog,
    pub closed: Arc<AtomicBool>,
}

impl MockSession {
    pub fn new(name: &str, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            tools,
            calls: Arc::default(),
            closed: Arc::default(),
        }
    }

    pub fn greeter(name: &str) -> Self {
        Self::new(name, vec![greet_tool()])
    }
}

#[async_trait]
impl Session for MockSession {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn list_tools(&self, _cursor: Option<String>) -> Result<ToolPage> {
        Ok(ToolPage {
            tools: self.tools.clone(),
            next_cursor: None,
        })
    }

    async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> Result<ToolCallOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(HostError::ToolExecution {
                tool: name.to_string(),
                message: "no such tool".into(),
            });
        }
        if name == "greet" {
            let who = arguments
                .as_ref()
                .and_then(|args| args.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("stranger");
            return Ok(ToolCallOutput::text(format!("Hello, {who}!")));
        }
        Ok(ToolCallOutput {
            structured_content: Some(Value::Object(arguments.unwrap_or_default())),
            text: None,
            content: Vec::new(),
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Connects config lines to prepared [`MockSession`]s by name. Unknown names
/// get a server with no tools.
#[derive(Default)]
pub struct MockConnector {
    prepared: Mutex<HashMap<String, Arc<MockSession>>>,
    pub connected: Mutex<Vec<SessionSpec>>,
}

impl MockConnector {
    pub fn with(sessions: Vec<MockSession>) -> Self {
        let prepared = sessions
            .into_iter()
            .map(|s| (s.name.clone(), Arc::new(s)))
            .collect();
        Self {
            prepared: Mutex::new(prepared),
            connected: Mutex::default(),
        }
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    async fn connect(&self, spec: &SessionSpec) -> Result<Arc<dyn Session>> {
        self.connected.lock().unwrap().push(spec.clone());
        let session = self
            .prepared
            .lock()
            .unwrap()
            .remove(&spec.name)
            .unwrap_or_else(|| Arc::new(MockSession::new(&spec.name, Vec::new())));
        Ok(session)
    }
}

pub fn greet_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: "greet".into(),
        description: Some("Greet someone by name".into()),
        input_schema: json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }),
        output_schema: None,
    }
}

pub fn object_tool(name: &str, fields: &[&str]) -> ToolDescriptor {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|f| (f.to_string(), json!({ "type": "integer" })))
        .collect();
    ToolDescriptor {
        name: name.into(),
        description: None,
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": fields,
        }),
        output_schema: None,
    }
}
