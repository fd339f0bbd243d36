use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, info};
use simplelog::{ConfigBuilder, WriteLogger};

use shunt::cli::{Cli, Command, RunArgs, parse_env_pair, redact_value};
use shunt::core::config::{self, ConfigError, Profile, ShuntConfig};
use shunt::core::{launch, worktree};
use shunt::select::{SelectError, SelectItem, Selector};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("shunt starting up");

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("shunt: {e}");
            ExitCode::FAILURE
        }
    }
}

/// File logger in `~/.shunt/shunt.log` — stdout belongs to the selection UI
/// and the child process, so log records never go there.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Some(dir) = config::config_dir() {
        if std::fs::create_dir_all(&dir).is_ok() {
            if let Ok(log_file) = File::create(dir.join("shunt.log")) {
                let _ = WriteLogger::init(level, log_config, log_file);
            }
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        None => launch_flow(RunArgs::default(), None, true),
        Some(Command::List) => list_profiles(),
        Some(Command::Show { name }) => show_profile(&name),
        Some(Command::Add {
            name,
            description,
            env,
        }) => add_profile(name, description, &env),
        Some(Command::Remove { name }) => {
            let mut config = config::load()?;
            config.remove_profile(&name)?;
            config::save(&config)?;
            println!("Removed profile '{name}'.");
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Use { name }) => {
            let mut config = config::load()?;
            config.set_default(&name)?;
            config::save(&config)?;
            println!("'{name}' is now the default profile.");
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Run(args)) => launch_flow(args, None, true),
        Some(Command::Worktree { branch, run }) => {
            let path = worktree::create(&branch)?;
            println!("Created worktree at {}", path.display());
            // With no command the worktree itself is the deliverable.
            launch_flow(run, Some(path.as_path()), false)
        }
    }
}

fn list_profiles() -> Result<ExitCode, Box<dyn Error>> {
    let config = config::load()?;
    if config.profiles.is_empty() {
        println!("No profiles configured. Add one with 'shunt add <name> --env KEY=VALUE'.");
        return Ok(ExitCode::SUCCESS);
    }

    let width = config
        .profiles
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0);
    for profile in &config.profiles {
        let marker = if config.default_profile.as_deref() == Some(profile.name.as_str()) {
            "*"
        } else {
            " "
        };
        match &profile.description {
            Some(description) => {
                println!("{marker} {:<width$}  {description}", profile.name);
            }
            None => println!("{marker} {}", profile.name),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn show_profile(name: &str) -> Result<ExitCode, Box<dyn Error>> {
    let config = config::load()?;
    let profile = config
        .profile(name)
        .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;

    println!("{}", profile.name);
    if let Some(description) = &profile.description {
        println!("  {description}");
    }
    for (key, value) in &profile.env {
        println!("  {key}={}", redact_value(key, value));
    }
    Ok(ExitCode::SUCCESS)
}

fn add_profile(
    name: String,
    description: Option<String>,
    env: &[String],
) -> Result<ExitCode, Box<dyn Error>> {
    let mut vars = std::collections::BTreeMap::new();
    for raw in env {
        let (key, value) = parse_env_pair(raw)?;
        vars.insert(key, value);
    }

    let mut config = config::load()?;
    config.upsert_profile(Profile {
        name: name.clone(),
        description,
        env: vars,
    });
    config::save(&config)?;
    println!("Saved profile '{name}'.");
    Ok(ExitCode::SUCCESS)
}

/// Resolve profile and argv, then launch. `command_required` is false for
/// the worktree flow, where creating the checkout alone is a valid outcome.
fn launch_flow(
    args: RunArgs,
    cwd: Option<&Path>,
    command_required: bool,
) -> Result<ExitCode, Box<dyn Error>> {
    let config = config::load()?;

    let argv = if args.command.is_empty() {
        config.default_command.clone()
    } else {
        args.command.clone()
    };
    if argv.is_empty() {
        if !command_required {
            return Ok(ExitCode::SUCCESS);
        }
        return Err(
            "no command to launch: pass one after 'run', or set default_command in config.json"
                .into(),
        );
    }

    let Some(profile) = pick_profile(&config, args.profile.as_deref())? else {
        eprintln!("shunt: selection cancelled");
        return Ok(ExitCode::from(130));
    };

    let status = launch::launch(&profile, &argv, cwd)?;
    Ok(exit_code(status))
}

/// Profile precedence: `--profile` flag, then the persisted default, then
/// interactive selection. `Ok(None)` means the user cancelled.
fn pick_profile(
    config: &ShuntConfig,
    flag: Option<&str>,
) -> Result<Option<Profile>, Box<dyn Error>> {
    if let Some(name) = flag {
        return match config.profile(name) {
            Some(profile) => Ok(Some(profile.clone())),
            None => Err(ConfigError::UnknownProfile(name.to_string()).into()),
        };
    }

    if let Some(profile) = config.resolved_default() {
        info!("using default profile '{}'", profile.name);
        return Ok(Some(profile.clone()));
    }

    if config.profiles.is_empty() {
        return Err("no profiles configured; add one with 'shunt add <name> --env KEY=VALUE'".into());
    }

    let items = config
        .profiles
        .iter()
        .map(|profile| {
            let item = SelectItem::new(profile.name.clone(), profile.clone());
            match &profile.description {
                Some(description) => item.with_detail(description.clone()),
                None => item,
            }
        })
        .collect();

    match Selector::from_env().select(items) {
        Ok(item) => Ok(Some(item.value)),
        Err(SelectError::Cancelled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn exit_code(status: i32) -> ExitCode {
    match u8::try_from(status) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}
