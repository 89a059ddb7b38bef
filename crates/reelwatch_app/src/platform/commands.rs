use std::fs;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use engine_logging::engine_info;
use reelwatch_core::{Msg, TaskController, TaskSlot};
use reelwatch_engine::{
    ensure_dir, Catalog, ClientError, ClientSettings, EngineEvent, EngineHandle, FileTaskSlot,
};

use super::app::{spawn_console, Finish, Session};
use super::effects::EffectRunner;
use super::settings::{load_settings, save_settings};
use crate::cli::{Cli, Command, GenerateArgs, TextSource, TrackArgs};

const EXIT_FAILED: u8 = 1;
const EXIT_DETACHED: u8 = 3;

pub fn run(cli: Cli) -> Result<ExitCode> {
    ensure_dir(&cli.state_dir)
        .with_context(|| format!("state directory {:?}", cli.state_dir))?;

    match &cli.command {
        Command::Generate(args) => generate(&cli, args),
        Command::Resume(args) => resume(&cli, args),
        Command::Abort => abort(&cli),
        Command::Options => options(&cli),
        Command::Status => status(&cli),
    }
}

fn client_settings(cli: &Cli) -> ClientSettings {
    ClientSettings {
        base_url: cli.server.clone(),
        ..ClientSettings::default()
    }
}

fn open_session(cli: &Cli, track: Option<&TrackArgs>) -> Result<Session<FileTaskSlot>> {
    let output = track.and_then(|track| track.output.clone());
    if let Some(dir) = &output {
        ensure_dir(dir).with_context(|| format!("output directory {dir:?}"))?;
    }
    let engine = EngineHandle::new(client_settings(cli)).context("starting the engine")?;
    let controller = TaskController::new(FileTaskSlot::new(cli.state_dir.clone()));
    let runner = EffectRunner::new(engine, output);
    let reconnects = track.map_or(0, |track| track.reconnect);
    Ok(Session::new(controller, runner, reconnects))
}

fn read_text(source: &TextSource) -> Result<String> {
    match (&source.text, &source.text_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("reading script from {path:?}"))
        }
        (None, None) => anyhow::bail!("either --text or --text-file is required"),
    }
}

fn generate(cli: &Cli, args: &GenerateArgs) -> Result<ExitCode> {
    let text = read_text(&args.source)?;
    let settings = load_settings(&cli.state_dir).merge(args.overrides());

    let mut session = open_session(cli, Some(&args.track))?;
    if session.boot() {
        println!("a task from an earlier run is still active; following it instead");
    } else {
        save_settings(&cli.state_dir, &settings);
    }
    session.dispatch(Msg::InputChanged(text));
    session.dispatch(Msg::OptionsChanged(settings.to_options()));
    session.dispatch(Msg::GenerateClicked);

    let finish = session.with_console(spawn_console()).run();
    Ok(exit_code(finish))
}

fn resume(cli: &Cli, args: &TrackArgs) -> Result<ExitCode> {
    let mut session = open_session(cli, Some(args))?;
    if !session.boot() {
        println!("no task to resume");
        return Ok(ExitCode::from(EXIT_FAILED));
    }
    let finish = session.with_console(spawn_console()).run();
    Ok(exit_code(finish))
}

fn abort(cli: &Cli) -> Result<ExitCode> {
    let mut session = open_session(cli, None)?;
    if !session.boot() {
        println!("idle; nothing to abort");
        return Ok(ExitCode::SUCCESS);
    }
    session.dispatch(Msg::AbortClicked);
    Ok(match session.run() {
        Finish::Aborted { confirmed: true } => ExitCode::SUCCESS,
        Finish::Aborted { confirmed: false } => {
            eprintln!("the backend did not confirm the abort; the task was forgotten locally");
            ExitCode::from(EXIT_FAILED)
        }
        other => exit_code(other),
    })
}

fn status(cli: &Cli) -> Result<ExitCode> {
    let slot = FileTaskSlot::new(cli.state_dir.clone());
    match slot.get() {
        Some(task_id) => {
            let since = fs::metadata(slot.path())
                .and_then(|meta| meta.modified())
                .map(|modified| DateTime::<Local>::from(modified).format("%Y-%m-%d %H:%M:%S"));
            match since {
                Ok(since) => println!("{task_id} (since {since})"),
                Err(_) => println!("{task_id}"),
            }
        }
        None => println!("idle"),
    }
    Ok(ExitCode::SUCCESS)
}

fn options(cli: &Cli) -> Result<ExitCode> {
    let settings = client_settings(cli);
    let wait = settings.request_timeout + Duration::from_secs(5);
    let engine = EngineHandle::new(settings).context("starting the engine")?;
    engine.load_catalog();

    let catalog = loop {
        match engine.recv_timeout(wait) {
            Some(EngineEvent::CatalogLoaded(catalog)) => break catalog,
            Some(_) => continue,
            None => anyhow::bail!("the backend did not answer within {wait:?}"),
        }
    };
    engine_info!("Catalog loaded");
    Ok(if print_catalog(&catalog) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    })
}

/// Prints every list; returns false if any of them failed to load.
fn print_catalog(catalog: &Catalog) -> bool {
    let mut complete = true;
    let mut section = |title: &str, lines: Result<Vec<String>, &ClientError>| {
        println!("{title}:");
        match lines {
            Ok(lines) if lines.is_empty() => println!("  (none)"),
            Ok(lines) => lines.iter().for_each(|line| println!("  {line}")),
            Err(err) => {
                complete = false;
                println!("  unavailable: {err}");
            }
        }
    };

    section(
        "voices",
        catalog.voices.as_ref().map(|voices| {
            voices
                .iter()
                .map(|voice| match &voice.lang {
                    Some(lang) => format!("{} ({}, {lang})", voice.id, voice.name),
                    None => format!("{} ({})", voice.id, voice.name),
                })
                .collect()
        }),
    );
    section(
        "resolutions",
        catalog.resolutions.as_ref().map(|entries| {
            entries
                .iter()
                .map(|entry| format!("{} ({})", entry.id, entry.name))
                .collect()
        }),
    );
    section(
        "bgm",
        catalog.bgm.as_ref().map(|entries| {
            entries
                .iter()
                .map(|entry| format!("{} ({})", entry.id, entry.name))
                .collect()
        }),
    );
    section(
        "subtitle presets",
        catalog.subtitles.as_ref().map(|subtitles| {
            subtitles
                .presets
                .iter()
                .map(|entry| format!("{} ({})", entry.id, entry.name))
                .collect()
        }),
    );
    section(
        "fonts",
        catalog
            .subtitles
            .as_ref()
            .map(|subtitles| subtitles.fonts.clone()),
    );
    complete
}

fn exit_code(finish: Finish) -> ExitCode {
    match finish {
        Finish::Completed => ExitCode::SUCCESS,
        Finish::Failed | Finish::Aborted { .. } | Finish::Idle => ExitCode::from(EXIT_FAILED),
        Finish::Disconnected => {
            eprintln!("connection lost; run `reelwatch resume` to continue following the task");
            ExitCode::from(EXIT_DETACHED)
        }
        Finish::Detached => {
            eprintln!("detached; run `reelwatch resume` to continue following the task");
            ExitCode::from(EXIT_DETACHED)
        }
    }
}

