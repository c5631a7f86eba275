//! Clap derive structures for the `snmpdash` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// snmpdash -- live SNMP telemetry from the command line
#[derive(Debug, Parser)]
#[command(
    name = "snmpdash",
    version,
    about = "Watch live network metrics from an snmpdash backend",
    long_about = "Pulls one telemetry snapshot over HTTP, then follows the backend's\n\
        STOMP push channel, printing normalized network metrics as they arrive.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "SNMPDASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// REST API base URL (overrides profile)
    #[arg(long, env = "SNMPDASH_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Push channel WebSocket URL (overrides profile)
    #[arg(long, env = "SNMPDASH_WS_URL", global = true)]
    pub ws_url: Option<String>,

    /// Username for session sign-in (overrides profile)
    #[arg(long, short = 'u', env = "SNMPDASH_USERNAME", global = true, hide_env = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SNMPDASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SNMPDASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SNMPDASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain `key=value` pairs (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pull one telemetry snapshot and print it
    #[command(alias = "snap", alias = "s")]
    Snapshot,

    /// Follow the merged pull + push snapshot stream
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Session and address helpers
    Auth(AuthArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in and check the session is accepted
    Signin,

    /// Register a new account
    Signup {
        /// Account name
        #[arg(long)]
        username: String,
        /// Contact email
        #[arg(long)]
        email: String,
    },

    /// Sign in, then end the session
    Signout,

    /// Report whether the backend accepts the current session
    Check,

    /// Show this client's address as seen by the backend
    Ip,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a profile field
    Set {
        /// Field name (api_base, ws_url, username, heartbeat_ms, ...)
        key: String,
        /// New value
        value: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,

    /// List profiles
    Profiles,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_watch_count() {
        let cli = Cli::try_parse_from(["snmpdash", "watch", "-n", "3", "-o", "json-compact"]).unwrap();
        assert!(matches!(cli.command, Command::Watch(WatchArgs { count: Some(3) })));
        assert!(matches!(cli.global.output, OutputFormat::JsonCompact));
    }
}
