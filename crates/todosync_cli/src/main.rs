use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use todosync_cli::cli::{Cli, Command, collect_overrides};
use todosync_cli::{logging, render};
use todosync_core::config::{
    Palette, StoreConfig, load_config_with_fallback, merge_overrides, palette_for_theme,
};
use todosync_core::error::AppError;
use todosync_core::model::{Task, TaskId};
use todosync_core::store::RestStore;
use todosync_core::{AddOutcome, Synchronizer};
use tracing::{info, warn};

struct App {
    sync: Synchronizer<RestStore>,
    palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    OneShot,
    Interactive,
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
    mode: Mode,
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// Builds the store client. A missing endpoint or key ends the process.
fn startup(raw_overrides: &[String]) -> Result<App, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        warn!(error = %err, "ignoring config file");
    }

    let overrides = collect_overrides(raw_overrides)?;
    let config = merge_overrides(&loaded.config, &overrides);
    let store_config = StoreConfig::from_env(&config)?;
    let store = RestStore::new(&store_config).map_err(|err| AppError::config(err.to_string()))?;
    info!(url = %store_config.url, table = %store_config.table, "store client ready");

    Ok(App {
        sync: Synchronizer::new(store),
        palette: palette_for_theme(config.theme.as_deref()),
    })
}

fn store_failure(app: &App) -> AppError {
    AppError::store(
        app.sync
            .error()
            .unwrap_or_else(|| "store request failed".to_string()),
    )
}

fn lookup(app: &App, raw_id: &str) -> Result<Task, AppError> {
    let id = TaskId::from(raw_id);
    if id.as_str().is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    app.sync
        .find(&id)
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

fn announce(app: &App, output: Output, verb: &str, task: &Task) -> Result<(), AppError> {
    match (output.json, output.mode) {
        (true, Mode::OneShot) => println!("{}", render::task_json(task)?),
        (true, Mode::Interactive) => {}
        (false, _) => println!(
            "{}: {} ({})",
            app.palette.accentize(verb),
            task.text,
            task.id
        ),
    }
    Ok(())
}

fn show_view(app: &App, json: bool) -> Result<(), AppError> {
    let state = app.sync.snapshot();
    if json {
        println!("{}", render::view_json(&state)?);
    } else {
        println!("{}", render::render_view(&state, &app.palette)?);
    }
    Ok(())
}

async fn run_command(app: &App, command: Command, output: Output) -> Result<(), AppError> {
    let sync = &app.sync;
    let is_list = matches!(command, Command::List);

    if output.mode == Mode::OneShot || is_list {
        let loaded = sync.load_all().await;
        if !loaded && output.mode == Mode::OneShot {
            return Err(store_failure(app));
        }
    }

    let succeeded = match command {
        Command::List => true,
        Command::Add { text } => match sync.add_task(text.as_deref().unwrap_or_default()).await {
            AddOutcome::Ignored => true,
            AddOutcome::Prepended(task) => {
                announce(app, output, "Added task", &task)?;
                true
            }
            AddOutcome::Reloaded => {
                if !output.json {
                    println!("Added task (list reloaded)");
                }
                sync.error().is_none()
            }
            AddOutcome::Failed => false,
        },
        Command::Toggle { id } => {
            let task = lookup(app, &id)?;
            let confirmed = sync.toggle_completion(&task.id, task.completed).await;
            if confirmed {
                let updated = sync.find(&task.id).unwrap_or(task);
                let verb = if updated.completed {
                    "Completed task"
                } else {
                    "Reopened task"
                };
                announce(app, output, verb, &updated)?;
            }
            confirmed
        }
        Command::Delete { id } => {
            let task = lookup(app, &id)?;
            let confirmed = sync.delete_task(&task.id).await;
            if confirmed {
                announce(app, output, "Deleted task", &task)?;
            }
            confirmed
        }
    };

    match output.mode {
        Mode::OneShot if !succeeded => Err(store_failure(app)),
        Mode::OneShot if is_list => show_view(app, output.json),
        Mode::OneShot => Ok(()),
        Mode::Interactive => show_view(app, output.json),
    }
}

async fn run_interactive() -> Result<(), AppError> {
    logging::init(false);
    let app = startup(&[])?;

    println!("{}", render::LOADING_MESSAGE);
    app.sync.load_all().await;
    show_view(&app, false)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(input) = lines
        .next_line()
        .await
        .map_err(|err| AppError::io(err.to_string()))?
    {
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("todosync".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if cli.verbose || !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input(
                    "--verbose and --config-override only apply when starting todosync"
                )
            );
            continue;
        }

        let output = Output {
            json: cli.json,
            mode: Mode::Interactive,
        };
        if let Err(err) = run_command(&app, cli.command, output).await {
            if err.is_fatal() {
                return Err(err);
            }
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive().await {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    logging::init(cli.verbose);

    let app = match startup(&cli.config_override) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    let output = Output {
        json: cli.json,
        mode: Mode::OneShot,
    };
    if let Err(err) = run_command(&app, cli.command, output).await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
