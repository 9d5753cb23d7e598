//! Provider-safe function names for one round's tools.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::router::ToolRouter;
use crate::types::{ServerTool, ToolId, ToolUsePart};

pub(crate) const MAX_FUNCTION_NAME: usize = 64;

/// Maps the round's tools to unique function names and back.
///
/// Calls are resolved through this table, never by re-parsing the name.
pub(crate) struct FunctionTable {
    entries: Vec<(String, ServerTool)>,
    by_name: HashMap<String, ToolId>,
}

impl FunctionTable {
    pub(crate) fn new(tools: Vec<ServerTool>, name_for: fn(&ToolId) -> String) -> Self {
        let mut entries = Vec::with_capacity(tools.len());
        let mut by_name = HashMap::with_capacity(tools.len());
        for tool in tools {
            let base = name_for(&tool.id());
            let mut name = base.clone();
            let mut suffix = 1;
            while by_name.contains_key(&name) {
                suffix += 1;
                let tail = format!("_{suffix}");
                let keep = base.len().min(MAX_FUNCTION_NAME - tail.len());
                name = format!("{}{tail}", &base[..keep]);
            }
            by_name.insert(name.clone(), tool.id());
            entries.push((name, tool));
        }
        Self { entries, by_name }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&ToolId> {
        self.by_name.get(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &ServerTool)> {
        self.entries.iter().map(|(name, tool)| (name.as_str(), tool))
    }
}

/// Route one requested call. Routing failures abort the round; anything else
/// the router reports goes back to the model as a failed tool use.
pub(crate) async fn dispatch(
    router: &dyn ToolRouter,
    tool_id: &ToolId,
    arguments: Value,
) -> Result<ToolUsePart> {
    match router.call_tool(tool_id, arguments.clone()).await {
        Ok(used) => Ok(used),
        Err(error) if error.is_routing_failure() => Err(error),
        Err(error) => {
            warn!(tool = %tool_id, %error, "tool call could not be routed; reporting to model");
            Ok(ToolUsePart::failed(tool_id.clone(), arguments, error.to_string()))
        }
    }
}

/// Restrict `raw` to `[A-Za-z0-9_-]` plus `extra`, replacing anything else
/// with `_`, and cut it to [`MAX_FUNCTION_NAME`] characters.
pub(crate) fn sanitize(raw: &str, extra: &[char]) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || extra.contains(&c) {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FUNCTION_NAME)
        .collect()
}
