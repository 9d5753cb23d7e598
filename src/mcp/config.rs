//! Line-oriented session config.
//!
//! One session per line, in one of two forms:
//!
//! ```text
//! ![./servers/greet][greet] node index.js --quiet
//! >[math] http://127.0.0.1:8080/mcp
//! ```
//!
//! The first spawns `command args...` inside the bracketed working directory
//! and speaks MCP over its stdio; the optional second bracket names the
//! session, defaulting to the command. The second connects over streamable
//! HTTP and must be named.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::HostError;
use crate::types::ToolId;

/// How a session reaches its server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransport {
    Stdio {
        dir: PathBuf,
        command: String,
        args: Vec<String>,
    },
    Http {
        url: String,
    },
}

/// One parsed config line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub name: String,
    pub transport: SessionTransport,
}

impl SessionSpec {
    pub fn kind(&self) -> &'static str {
        match self.transport {
            SessionTransport::Stdio { .. } => "stdio",
            SessionTransport::Http { .. } => "http",
        }
    }
}

fn stdio_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^!\[(?P<dir>[^\]]+)\](?:\[(?P<name>\w[\w-]*)\])?\s+(?P<cmd>\S+)\s*(?P<args>.*)$")
            .expect("stdio config pattern is valid")
    })
}

fn http_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^>\[(?P<name>\w[\w-]*)\]\s+(?P<url>http://.+)$")
            .expect("http config pattern is valid")
    })
}

/// Parse a single config line.
pub fn parse_line(line: &str) -> Result<SessionSpec, HostError> {
    let line = line.trim();

    if let Some(caps) = stdio_pattern().captures(line) {
        let command = caps["cmd"].to_string();
        let name = caps
            .name("name")
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| command.clone());
        if name.contains(ToolId::SEPARATOR) {
            return Err(HostError::Configuration(format!(
                "server name '{name}' contains '{}'; name the session explicitly: {line}",
                ToolId::SEPARATOR
            )));
        }
        let args = caps["args"].split_whitespace().map(str::to_string).collect();
        return Ok(SessionSpec {
            name,
            transport: SessionTransport::Stdio {
                dir: PathBuf::from(&caps["dir"]),
                command,
                args,
            },
        });
    }

    if let Some(caps) = http_pattern().captures(line) {
        return Ok(SessionSpec {
            name: caps["name"].to_string(),
            transport: SessionTransport::Http {
                url: caps["url"].trim().to_string(),
            },
        });
    }

    Err(HostError::Configuration(format!(
        "invalid line in config: {line}"
    )))
}

/// Parse a whole config, skipping blank lines. Any invalid line fails the parse.
pub fn parse_config(text: &str) -> Result<Vec<SessionSpec>, HostError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}
