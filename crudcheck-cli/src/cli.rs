//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// crudcheck -- CRUD scenario suite for appliance entities.
///
/// Use `crudcheck <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "crudcheck", version, about, long_about = None)]
pub struct Cli {
    /// Path to the crudcheck.toml configuration file.
    #[arg(short, long, global = true, default_value = "crudcheck.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenario suite against a fresh simulated appliance.
    Run(RunArgs),

    /// List scenarios without running them.
    List(ListArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run / list ----

/// Scenario selection shared by `run` and `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioFilter {
    /// Keep only scenarios whose id contains this substring.
    #[arg(long)]
    pub filter: Option<String>,

    /// Keep key pair scenarios for this provider only.
    #[arg(long)]
    pub provider: Option<String>,
}

/// Run the scenario suite.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: ScenarioFilter,

    /// Stop at the first failing scenario.
    #[arg(long)]
    pub fail_fast: bool,
}

/// List scenario ids.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub selection: ScenarioFilter,
}

// ---- config ----

/// Manage crudcheck configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, session, appliance, data).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["crudcheck", "run"]).expect("parse succeeded");
        match cli.command {
            Commands::Run(args) => {
                assert!(args.selection.filter.is_none());
                assert!(args.selection.provider.is_none());
                assert!(!args.fail_fast);
            }
            _ => panic!("expected Run command"),
        }
        assert_eq!(cli.config, PathBuf::from("crudcheck.toml"));
    }

    #[test]
    fn test_cli_parse_run_with_selection() {
        let cli = Cli::try_parse_from([
            "crudcheck",
            "run",
            "--filter",
            "keypair",
            "--provider",
            "rhos-01",
            "--fail-fast",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.selection.filter.as_deref(), Some("keypair"));
                assert_eq!(args.selection.provider.as_deref(), Some("rhos-01"));
                assert!(args.fail_fast);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_list_with_filter() {
        let cli = Cli::try_parse_from(["crudcheck", "list", "--filter", "widget"])
            .expect("parse succeeded");
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.selection.filter.as_deref(), Some("widget"));
            }
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["crudcheck", "config", "show", "--section", "appliance"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("appliance")),
            _ => panic!("expected Config Show command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "crudcheck",
            "config",
            "validate",
            "--config",
            "/tmp/other.toml",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("/tmp/other.toml"));
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["crudcheck", "--output", "yaml", "list"]);
        assert!(result.is_err(), "yaml is not a supported output format");
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["crudcheck"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
