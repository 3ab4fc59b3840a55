pub mod ask;
pub mod config;

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

use cr_domain::config::Config;

/// Environment variable naming the config file.
pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG";

/// chatrelay: a chat relay in front of pluggable text-generation backends.
#[derive(Debug, Parser)]
#[command(name = "chatrelay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP + WebSocket server (default when no subcommand is given).
    Serve,
    /// Send a single message to the configured backend and print the reply.
    Ask {
        /// The message to send.
        message: String,
        /// Output the reply as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any issues.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `RELAY_CONFIG` (or
/// `config.toml` by default) and apply environment overrides. Returns the
/// parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(Path::new(&config_path), |key| std::env::var(key).ok())?;
    Ok((config, config_path))
}

/// Read `path` if it exists (defaults otherwise), then apply overrides
/// from `lookup`.
pub fn load_config_from(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
    } else {
        Config::default()
    };
    config.apply_overrides_from(lookup);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml"), |_| None).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.backend.provider, "openai");
    }

    #[test]
    fn environment_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8080\n\n[backend]\nprovider = \"ollama\"").unwrap();

        let config = load_config_from(file.path(), |key| match key {
            "PORT" => Some("9090".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.backend.provider, "ollama");
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = load_config_from(file.path(), |_| None).unwrap_err();
        assert!(err.to_string().starts_with("parsing"));
    }

    #[test]
    fn cli_defaults_to_serve() {
        let cli = Cli::parse_from(["chatrelay"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["chatrelay", "ask", "hello there", "--json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Ask { ref message, json: true }) if message == "hello there"
        ));
    }
}
