//! Command-line interface for the host binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{BackendKind, HostSettings};

/// MCP host: aggregate tool servers behind one model endpoint.
#[derive(Parser, Debug)]
#[command(name = "mcp-host", version, about = "Aggregate MCP tool servers behind a model")]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print every tool the configured servers expose
    Tools(ToolsArgs),
}

/// Arguments for `mcp-host serve`.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Session config file, one server per line
    #[arg(short, long)]
    pub servers: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8080
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Model rounds per generation
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Agent backend (echo, openai, google)
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Model name for the backend
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Arguments for `mcp-host tools`.
#[derive(Args, Debug, Default)]
pub struct ToolsArgs {
    /// Session config file, one server per line
    #[arg(short, long)]
    pub servers: Option<PathBuf>,
}

impl ServeArgs {
    /// Flags win over file and environment values.
    pub fn apply(&self, settings: &mut HostSettings) {
        if let Some(servers) = &self.servers {
            settings.servers_file = Some(servers.clone());
        }
        if let Some(bind) = &self.bind {
            settings.bind = bind.clone();
        }
        if let Some(rounds) = self.max_rounds {
            settings.max_rounds = rounds;
        }
        if let Some(kind) = self.backend {
            settings.backend.kind = kind;
        }
        if let Some(model) = &self.model {
            settings.backend.model = Some(model.clone());
        }
    }
}

impl ToolsArgs {
    pub fn apply(&self, settings: &mut HostSettings) {
        if let Some(servers) = &self.servers {
            settings.servers_file = Some(servers.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_with_defaults() {
        let cli = Cli::try_parse_from(["mcp-host", "serve"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.log_json);
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.servers.is_none());
                assert!(args.bind.is_none());
                assert!(args.max_rounds.is_none());
                assert!(args.backend.is_none());
            }
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn parse_serve_with_all_options() {
        let cli = Cli::try_parse_from([
            "mcp-host",
            "serve",
            "--servers",
            "servers.conf",
            "--bind",
            "0.0.0.0:9000",
            "--max-rounds",
            "5",
            "--backend",
            "openai",
            "--model",
            "gpt-test",
            "--config",
            "host.toml",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("host.toml")));
        assert!(cli.log_json);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.servers, Some(PathBuf::from("servers.conf")));
                assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
                assert_eq!(args.max_rounds, Some(5));
                assert_eq!(args.backend, Some(BackendKind::OpenAi));
                assert_eq!(args.model.as_deref(), Some("gpt-test"));
            }
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["mcp-host", "serve", "--backend", "llama"]).is_err());
    }

    #[test]
    fn parse_tools() {
        let cli = Cli::try_parse_from(["mcp-host", "tools", "-s", "servers.conf"]).unwrap();
        match cli.command {
            Commands::Tools(args) => assert_eq!(args.servers, Some(PathBuf::from("servers.conf"))),
            other => panic!("expected Tools, got {other:?}"),
        }
    }

    #[test]
    fn serve_flags_override_settings() {
        let mut settings = HostSettings::default();
        ServeArgs {
            bind: Some("127.0.0.1:0".into()),
            max_rounds: Some(1),
            backend: Some(BackendKind::OpenAi),
            ..Default::default()
        }
        .apply(&mut settings);
        assert_eq!(settings.bind, "127.0.0.1:0");
        assert_eq!(settings.max_rounds, 1);
        assert_eq!(settings.backend.kind, BackendKind::OpenAi);
        assert!(settings.servers_file.is_none());
    }

    #[test]
    fn flags_rescue_out_of_range_environment_values() {
        let mut settings = HostSettings::load_with(None, |key| {
            (key == "MCP_HOST_MAX_ROUNDS").then(|| "0".to_string())
        })
        .expect("settings load without validation");
        ServeArgs {
            max_rounds: Some(2),
            backend: Some(BackendKind::Google),
            ..Default::default()
        }
        .apply(&mut settings);

        settings.validate().expect("flag value replaces the bad env value");
        assert_eq!(settings.max_rounds, 2);
        assert_eq!(settings.backend.model(), "gemini-2.0-flash");
    }
}
