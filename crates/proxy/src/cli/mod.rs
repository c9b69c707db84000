pub mod call;
pub mod commands;
pub mod config;

use clap::{Parser, Subcommand};

/// godot-bridge: talk to a running Godot editor over its plugin WebSocket.
#[derive(Debug, Parser)]
#[command(name = "godot-bridge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP proxy (default when no subcommand is given).
    Serve,
    /// Send a single call to the editor and print the result as JSON.
    Call {
        /// Editor method name (e.g. "get_scene_tree").
        method: String,
        /// Parameters as a JSON object.
        #[arg(long)]
        params: Option<String>,
        /// Pretty-print the result.
        #[arg(long)]
        pretty: bool,
    },
    /// List the known editor commands.
    Commands {
        /// Output the catalogue as JSON instead of a table.
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
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `GB_CONFIG` (or
/// `config.toml` by default). A missing file yields the defaults.
/// Returns the parsed [`Config`](gb_domain::config::Config) and the path
/// that was used.
pub fn load_config() -> anyhow::Result<(gb_domain::config::Config, String)> {
    let config_path = std::env::var("GB_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<gb_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(gb_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_call_with_params() {
        let cli = Cli::try_parse_from([
            "godot-bridge",
            "call",
            "select_node",
            "--params",
            r#"{"node_path":"/root/Main"}"#,
        ])
        .unwrap();
        match cli.command {
            Some(Command::Call { method, params, pretty }) => {
                assert_eq!(method, "select_node");
                assert_eq!(params.as_deref(), Some(r#"{"node_path":"/root/Main"}"#));
                assert!(!pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["godot-bridge"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config_from("/definitely/not/here/config.toml").unwrap();
        assert_eq!(config.bridge.port, 8090);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let dir = std::env::temp_dir().join(format!("gb-proxy-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[bridge\nport = 1").unwrap();

        let err = load_config_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("parsing "));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
