//! # Headless Detector
//!
//! Decides whether the process is running non-interactively: output
//! redirected to a file or pipe, or a known automation environment.
//!
//! This check is deliberately independent of the capability probe, so a
//! pipe with an otherwise valid `TERM` is still treated as headless.

use std::env;
use std::io;

use crossterm::tty::IsTty;
use log::debug;

/// Environment markers set by CI systems.
const CI_MARKERS: [&str; 8] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
];

/// True when stdout is not a character device or a CI marker is present.
/// No side effects, never blocks.
pub fn is_headless() -> bool {
    if !io::stdout().is_tty() {
        debug!("stdout is not a terminal, treating session as headless");
        return true;
    }
    if let Some(marker) = CI_MARKERS.iter().find(|name| env::var_os(name).is_some()) {
        debug!("{marker} is set, treating session as headless");
        return true;
    }
    false
}
