//! task-quest
//!
//! Command-line task list that rewards completed tasks with experience,
//! levels, and badges.

use anyhow::Result;
use clap::Parser;
use serde_json::{Value, json};
use std::process::ExitCode;
use task_quest::cli::{Cli, Command};
use task_quest::config::{Config, ConfigLoader, StorageBackend};
use task_quest::error::TrackerError;
use task_quest::format::{self, OutputFormat};
use task_quest::logging::{LogTarget, init_tracing};
use task_quest::persistence::{FileStore, KeyValueStore, MemoryStore};
use task_quest::session::Session;
use tracing::{debug, info};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut loader = ConfigLoader::load(cli.config.as_deref())?;
    for (tier, origin) in loader.sources() {
        debug!(tier = %tier, origin = %origin, "Applied config");
    }

    // CLI flags are the last tier
    let config = loader.config_mut();
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.clone());
    }
    if let Some(output_format) = cli.format {
        config.display.format = output_format;
    }
    if cli.ephemeral {
        config.storage.backend = StorageBackend::Memory;
    }
    let config = loader.into_config();
    config.validate()?;

    let store = open_store(&config);
    let mut session = Session::open(store);

    let result = run_command(&mut session, &config, cli.command.unwrap_or(Command::List));

    if let Some(warning) = session.last_warning() {
        eprintln!("Warning: changes were not saved: {}", warning);
    }

    match result {
        Ok(output) => {
            print!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_user_error() => {
            report_error(&err, config.display.format);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn open_store(config: &Config) -> Box<dyn KeyValueStore> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage; nothing will be saved");
            Box::new(MemoryStore::new())
        }
        StorageBackend::File => {
            let store = FileStore::new(config.storage.resolved_data_dir());
            debug!(dir = %store.dir().display(), "Using file storage");
            Box::new(store)
        }
    }
}

/// Run one command and render its output.
fn run_command<S: KeyValueStore>(
    session: &mut Session<S>,
    config: &Config,
    command: Command,
) -> Result<String, TrackerError> {
    let output_format = config.display.format;
    match command {
        Command::Add { text } => {
            let (task, events) = session.add_task(&Command::joined_text(&text))?;
            Ok(match output_format {
                OutputFormat::Json => to_json(json!({ "task": task, "events": format::events_json(&events) })),
                OutputFormat::Text => format!(
                    "{}{}",
                    format::format_task_line(&task),
                    format::format_events(&events)
                ),
            })
        }
        Command::Done { id } => {
            let id = session.resolve_id(&id)?;
            let outcome = session.toggle_task(&id);
            let transition = outcome.transition.map(|t| t.as_str());
            Ok(match output_format {
                OutputFormat::Json => to_json(json!({
                    "taskId": id,
                    "transition": transition,
                    "events": format::events_json(&outcome.events),
                    "stats": format::stats_json(session.progression()),
                })),
                OutputFormat::Text => {
                    let line = session
                        .tasks()
                        .get(&id)
                        .map(format::format_task_line)
                        .unwrap_or_default();
                    format!("{}{}", line, format::format_events(&outcome.events))
                }
            })
        }
        Command::Rm { id } => {
            let id = session.resolve_id(&id)?;
            let removed = session.remove_task(&id);
            Ok(match output_format {
                OutputFormat::Json => to_json(json!({ "taskId": id, "removed": removed })),
                OutputFormat::Text => format!("Removed task `{}`\n", format::short_id(&id)),
            })
        }
        Command::List => Ok(match output_format {
            OutputFormat::Json => to_json(json!({ "tasks": session.tasks().list() })),
            OutputFormat::Text => format::format_tasks(session.tasks().list()),
        }),
        Command::Stats => Ok(match output_format {
            OutputFormat::Json => to_json(format::stats_json(session.progression())),
            OutputFormat::Text => format::format_stats(session.progression(), &config.display),
        }),
        Command::Badges => Ok(match output_format {
            OutputFormat::Json => to_json(format::badges_json(&session.progression().badges)),
            OutputFormat::Text => format::format_badges(&session.progression().badges),
        }),
    }
}

fn to_json(value: Value) -> String {
    let mut out = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    out.push('\n');
    out
}

fn report_error(err: &TrackerError, output_format: OutputFormat) {
    match output_format {
        OutputFormat::Json => {
            let body = serde_json::to_value(err).unwrap_or_else(|_| json!(err.message));
            print!("{}", to_json(json!({ "error": body })));
        }
        OutputFormat::Text => eprintln!("Error: {}", err),
    }
}
