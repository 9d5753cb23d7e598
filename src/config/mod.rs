//! Host settings (layered: defaults < TOML file < environment < CLI flags).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, EchoAgent, DEFAULT_MAX_ROUNDS};
use crate::error::{HostError, Result};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const SETTINGS_FILE: &str = "mcp-host.toml";

/// Credential variables, checked in order; the first one set wins.
const API_KEY_VARS: &[(&str, BackendKind)] = &[
    ("OPENAI_API_KEY", BackendKind::OpenAi),
    ("GEMINI_API_KEY", BackendKind::Google),
    ("GOOGLE_API_KEY", BackendKind::Google),
];

const BASE_URL_VARS: &[(&str, BackendKind)] = &[
    ("OPENAI_BASE_URL", BackendKind::OpenAi),
    ("GEMINI_BASE_URL", BackendKind::Google),
];

/// Which agent backend answers generations.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Echo,
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
    Google,
}

impl BackendKind {
    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::OpenAi => "gpt-4o-mini",
            Self::Google => "gemini-2.0-flash",
        }
    }
}

/// Model backend settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub kind: BackendKind,
    /// Falls back to [`BackendKind::default_model`].
    pub model: Option<String>,
    /// Explicit endpoint; wins over the per-backend environment value.
    pub base_url: Option<String>,
    /// Explicit key; wins over the per-backend environment value.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub system_prompt: Option<String>,
    /// Keys found in the environment, per backend.
    #[serde(skip)]
    pub api_keys: HashMap<BackendKind, String>,
    #[serde(skip)]
    pub base_urls: HashMap<BackendKind, String>,
}

impl BackendSettings {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }

    /// The key for the selected backend.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| self.api_keys.get(&self.kind).cloned())
    }

    pub fn resolved_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.base_urls.get(&self.kind).cloned())
    }

    /// Instantiate the configured backend.
    pub fn build_agent(&self) -> Result<Arc<dyn Agent>> {
        match self.kind {
            BackendKind::Echo => Ok(Arc::new(EchoAgent)),
            #[cfg(feature = "openai")]
            BackendKind::OpenAi => {
                let mut agent = crate::agent::OpenAiAgent::new(
                    self.model(),
                    self.resolved_api_key(),
                    self.resolved_base_url(),
                );
                if let Some(prompt) = &self.system_prompt {
                    agent = agent.with_system_prompt(prompt.clone());
                }
                Ok(Arc::new(agent))
            }
            #[cfg(not(feature = "openai"))]
            BackendKind::OpenAi => Err(HostError::Configuration(
                "the openai backend requires the `openai` feature".into(),
            )),
            #[cfg(feature = "google")]
            BackendKind::Google => {
                let mut agent = crate::agent::GeminiAgent::new(
                    self.model(),
                    self.resolved_api_key(),
                    self.resolved_base_url(),
                );
                if let Some(prompt) = &self.system_prompt {
                    agent = agent.with_system_prompt(prompt.clone());
                }
                Ok(Arc::new(agent))
            }
            #[cfg(not(feature = "google"))]
            BackendKind::Google => Err(HostError::Configuration(
                "the google backend requires the `google` feature".into(),
            )),
        }
    }
}

/// Settings for one host process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct HostSettings {
    /// Address the HTTP façade listens on.
    #[builder(default = DEFAULT_BIND.to_string(), into)]
    pub bind: String,
    /// Line-oriented session config.
    #[builder(into)]
    pub servers_file: Option<PathBuf>,
    #[builder(default = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: usize,
    /// Whole-generation deadline.
    pub request_timeout_secs: Option<u64>,
    #[builder(default)]
    pub backend: BackendSettings,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HostSettings {
    /// Load settings from `path`, or from the default settings file if it
    /// exists, then apply environment overrides (`.env` included).
    ///
    /// Not validated: callers layer CLI flags on top and then call
    /// [`HostSettings::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`HostSettings::load`] with environment lookups going through `lookup`.
    pub fn load_with(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        settings.apply_env(lookup)?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HostError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HostError::Configuration(format!("invalid settings: {e}")))
    }

    /// Platform config location, e.g. `~/.config/mcp-host/mcp-host.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mcp-host")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Apply `MCP_HOST_*` overrides and backend credentials read through
    /// `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(bind) = lookup("MCP_HOST_BIND") {
            self.bind = bind;
        }
        if let Some(path) = lookup("MCP_HOST_SERVERS") {
            self.servers_file = Some(PathBuf::from(path));
        }
        if let Some(rounds) = lookup("MCP_HOST_MAX_ROUNDS") {
            self.max_rounds = parse_env("MCP_HOST_MAX_ROUNDS", &rounds)?;
        }
        if let Some(secs) = lookup("MCP_HOST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(parse_env("MCP_HOST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(kind) = lookup("MCP_HOST_BACKEND") {
            self.backend.kind = parse_env("MCP_HOST_BACKEND", &kind)?;
        }
        if let Some(model) = lookup("MCP_HOST_MODEL") {
            self.backend.model = Some(model);
        }
        for (var, kind) in API_KEY_VARS {
            if let Some(key) = lookup(var) {
                self.backend.api_keys.entry(*kind).or_insert(key);
            }
        }
        for (var, kind) in BASE_URL_VARS {
            if let Some(url) = lookup(var) {
                self.backend.base_urls.entry(*kind).or_insert(url);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(HostError::Configuration("max_rounds must be at least 1".into()));
        }
        if self.backend.model().trim().is_empty() {
            return Err(HostError::Configuration(format!(
                "{} backend needs a model",
                self.backend.kind
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Read the session config named by `servers_file`; empty when unset.
    pub fn read_servers(&self) -> Result<String> {
        match &self.servers_file {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                HostError::Configuration(format!("cannot read {}: {e}", path.display()))
            }),
            None => Ok(String::new()),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| HostError::Configuration(format!("{key}={value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_sensible() {
        let settings = HostSettings::default();
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.max_rounds, 3);
        assert_eq!(settings.backend.kind, BackendKind::Echo);
        assert!(settings.servers_file.is_none());
        assert!(settings.request_timeout().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let settings = HostSettings::from_toml_str(
            r#"
            max_rounds = 5
            servers_file = "servers.conf"

            [backend]
            kind = "openai"
            model = "gpt-test"
            "#,
        )
        .expect("settings should parse");
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.max_rounds, 5);
        assert_eq!(settings.servers_file, Some(PathBuf::from("servers.conf")));
        assert_eq!(settings.backend.kind, BackendKind::OpenAi);
        assert_eq!(settings.backend.model(), "gpt-test");
    }

    #[test]
    fn bad_toml_is_a_configuration_error() {
        let err = HostSettings::from_toml_str("max_rounds = \"many\"").expect_err("type mismatch");
        assert!(matches!(err, HostError::Configuration(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MCP_HOST_BIND", "0.0.0.0:9000"),
            ("MCP_HOST_MAX_ROUNDS", "4"),
            ("MCP_HOST_TIMEOUT_SECS", "30"),
            ("MCP_HOST_BACKEND", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        let mut settings = HostSettings::default();
        settings
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .expect("env should apply");

        assert_eq!(settings.bind, "0.0.0.0:9000");
        assert_eq!(settings.max_rounds, 4);
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.backend.kind, BackendKind::OpenAi);
        assert_eq!(settings.backend.resolved_api_key().as_deref(), Some("sk-test"));
        assert!(settings.backend.api_key.is_none());
    }

    #[test]
    fn credentials_follow_the_selected_backend() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-openai"),
            ("GEMINI_API_KEY", "gm-first"),
            ("GOOGLE_API_KEY", "gm-second"),
            ("GEMINI_BASE_URL", "http://localhost:9/v1beta"),
        ]);
        let mut settings = HostSettings::default();
        settings
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .expect("env should apply");
        assert!(settings.backend.resolved_api_key().is_none());

        settings.backend.kind = BackendKind::Google;
        assert_eq!(settings.backend.resolved_api_key().as_deref(), Some("gm-first"));
        assert_eq!(
            settings.backend.resolved_base_url().as_deref(),
            Some("http://localhost:9/v1beta")
        );
        assert_eq!(settings.backend.model(), "gemini-2.0-flash");

        settings.backend.kind = BackendKind::OpenAi;
        assert_eq!(settings.backend.resolved_api_key().as_deref(), Some("sk-openai"));
        assert!(settings.backend.resolved_base_url().is_none());

        settings.backend.api_key = Some("sk-explicit".into());
        assert_eq!(settings.backend.resolved_api_key().as_deref(), Some("sk-explicit"));
    }

    #[test]
    fn loading_defers_validation_to_the_caller() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        std::io::Write::write_all(&mut file, b"max_rounds = 2\n").expect("write settings");

        let settings = HostSettings::load_with(Some(file.path()), |key| {
            (key == "MCP_HOST_MAX_ROUNDS").then(|| "0".to_string())
        })
        .expect("out-of-range values load");
        assert_eq!(settings.max_rounds, 0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn blank_model_fails_validation() {
        let mut settings = HostSettings::default();
        settings.backend.kind = BackendKind::Google;
        settings.backend.model = Some("  ".into());
        let err = settings.validate().expect_err("blank model must fail");
        assert!(matches!(err, HostError::Configuration(message) if message.contains("google")));
    }

    #[test]
    fn unparsable_env_values_fail() {
        let mut settings = HostSettings::default();
        let err = settings
            .apply_env(|key| (key == "MCP_HOST_MAX_ROUNDS").then(|| "lots".to_string()))
            .expect_err("non-numeric rounds must fail");
        assert!(matches!(err, HostError::Configuration(message) if message.contains("MCP_HOST_MAX_ROUNDS")));
    }

    #[test]
    fn zero_rounds_fail_validation() {
        let settings = HostSettings::builder().max_rounds(0).build();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn builder_accepts_string_like_values() {
        let settings = HostSettings::builder()
            .bind("127.0.0.1:0")
            .servers_file("servers.conf")
            .build();
        assert_eq!(settings.bind, "127.0.0.1:0");
        assert_eq!(settings.servers_file, Some(PathBuf::from("servers.conf")));
    }

    #[test]
    fn api_key_is_never_serialized() {
        let mut settings = HostSettings::default();
        settings.backend.api_key = Some("sk-secret".into());
        let text = toml::to_string(&settings).expect("settings should serialize");
        assert!(!text.contains("sk-secret"));
    }

    #[test]
    fn backend_kind_parses_from_text() {
        assert_eq!("openai".parse::<BackendKind>().expect("openai parses"), BackendKind::OpenAi);
        assert_eq!("echo".parse::<BackendKind>().expect("echo parses"), BackendKind::Echo);
        assert_eq!("google".parse::<BackendKind>().expect("google parses"), BackendKind::Google);
        assert_eq!(BackendKind::OpenAi.to_string(), "openai");
        assert_eq!(BackendKind::Google.to_string(), "google");
    }

    #[test]
    fn echo_backend_builds_without_credentials() {
        let agent = BackendSettings::default().build_agent().expect("echo builds");
        assert_eq!(agent.name(), "echo");
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_backend_builds_from_settings() {
        let backend = BackendSettings {
            kind: BackendKind::Google,
            ..Default::default()
        };
        let agent = backend.build_agent().expect("google builds");
        assert_eq!(agent.name(), "google");
    }
}
