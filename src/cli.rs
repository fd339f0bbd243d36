//! # Command Line
//!
//! The clap surface. Switcher-specific flags are parsed here; the child
//! command's argv is captured raw (`trailing_var_arg` + hyphen values) and
//! never re-parsed, so flags meant for the child pass through untouched.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "shunt",
    about = "Switch API endpoint profiles and launch commands with them",
    version
)]
pub struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List configured profiles
    List,
    /// Show one profile and the variables it injects
    Show { name: String },
    /// Add a profile, replacing any existing one with the same name
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Variable to inject, as KEY=VALUE (repeatable)
        #[arg(short, long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
    },
    /// Remove a profile
    Remove { name: String },
    /// Persist a profile as the default
    Use { name: String },
    /// Pick a profile and launch a command with its variables
    Run(RunArgs),
    /// Create a git worktree for a branch and launch there
    Worktree {
        branch: String,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Profile to use; skips interactive selection
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Command to launch; falls back to the configured default command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Split `KEY=VALUE`. The value may itself contain `=`.
pub fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Hide secret-looking values when printing a profile.
pub fn redact_value(key: &str, value: &str) -> String {
    let upper = key.to_uppercase();
    let sensitive = ["TOKEN", "KEY", "SECRET", "PASSWORD"]
        .iter()
        .any(|marker| upper.contains(marker));
    if !sensitive {
        return value.to_string();
    }
    let visible: String = value.chars().take(4).collect();
    format!("{visible}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("API_BASE_URL=https://api.example"),
            Ok((
                "API_BASE_URL".to_string(),
                "https://api.example".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_env_pair_value_may_contain_equals() {
        assert_eq!(
            parse_env_pair("QUERY=a=b"),
            Ok(("QUERY".to_string(), "a=b".to_string()))
        );
    }

    #[test]
    fn test_parse_env_pair_rejects_missing_equals() {
        assert!(parse_env_pair("JUSTAKEY").is_err());
        assert!(parse_env_pair("=value").is_err());
    }

    #[test]
    fn test_run_captures_child_flags_verbatim() {
        let cli = Cli::try_parse_from([
            "shunt", "run", "--profile", "prod", "claude", "--model", "opus",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Run(args)) => {
                assert_eq!(args.profile.as_deref(), Some("prod"));
                assert_eq!(args.command, ["claude", "--model", "opus"]);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_bare_invocation_has_no_command() {
        let cli = Cli::try_parse_from(["shunt"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_add_collects_repeated_env_flags() {
        let cli = Cli::try_parse_from([
            "shunt", "add", "prod", "-e", "A=1", "-e", "B=2", "--description", "live",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Add {
                name,
                description,
                env,
            }) => {
                assert_eq!(name, "prod");
                assert_eq!(description.as_deref(), Some("live"));
                assert_eq!(env, ["A=1", "B=2"]);
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_redact_hides_secrets() {
        assert_eq!(redact_value("API_TOKEN", "sk-abcdef123"), "sk-a…");
        assert_eq!(redact_value("API_BASE_URL", "https://x"), "https://x");
    }
}
