//! # Launcher
//!
//! Spawns the child process with the selected profile's variables layered
//! over the parent environment, waits for it, and reports its exit code.
//! The child environment is assembled explicitly (`env_clear` + the merged
//! map) so injection has a single source of truth.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::Command;

use log::{info, warn};

use crate::core::config::Profile;

#[derive(Debug)]
pub enum LaunchError {
    /// Neither the command line nor the config supplied an argv.
    EmptyCommand,
    Spawn { program: String, source: io::Error },
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::EmptyCommand => write!(f, "no command to launch"),
            LaunchError::Spawn { program, source } => {
                write!(f, "failed to launch '{program}': {source}")
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Spawn { source, .. } => Some(source),
            LaunchError::EmptyCommand => None,
        }
    }
}

/// Parent environment with the profile's variables layered on top.
pub fn merged_env(profile: &Profile) -> BTreeMap<String, String> {
    merge_env(env::vars(), profile)
}

fn merge_env(
    parent: impl IntoIterator<Item = (String, String)>,
    profile: &Profile,
) -> BTreeMap<String, String> {
    let mut vars: BTreeMap<String, String> = parent.into_iter().collect();
    for (key, value) in &profile.env {
        vars.insert(key.clone(), value.clone());
    }
    vars
}

/// Launch `argv` with `profile`'s variables injected, blocking until the
/// child exits. A child killed by a signal reports exit code -1.
pub fn launch(profile: &Profile, argv: &[String], cwd: Option<&Path>) -> Result<i32, LaunchError> {
    let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;

    let mut command = Command::new(program);
    command.args(args).env_clear().envs(merged_env(profile));
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    info!(
        "launching '{program}' with profile '{}' ({} variable(s))",
        profile.name,
        profile.env.len()
    );
    let status = command.status().map_err(|source| LaunchError::Spawn {
        program: program.clone(),
        source,
    })?;

    match status.code() {
        Some(code) => Ok(code),
        None => {
            warn!("child '{program}' was terminated by a signal");
            Ok(-1)
        }
    }
}
