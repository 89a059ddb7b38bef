use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use engine_logging::{engine_info, engine_trace, engine_warn};
use reelwatch_core::{
    AppViewModel, Msg, RunPhase, StreamPhase, TaskController, TaskOutcome, TaskSlot,
};

use super::effects::EffectRunner;
use super::render::diff_lines;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Commands typed on stdin while a task is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Abort,
    Detach,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(ConsoleCommand::Abort),
            "detach" => Some(ConsoleCommand::Detach),
            _ => None,
        }
    }
}

/// Why a tracking session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Completed,
    Failed,
    Aborted { confirmed: bool },
    /// Connection lost with no reconnect attempts left; the task is kept.
    Disconnected,
    /// User left; the task is kept.
    Detached,
    /// Nothing was started.
    Idle,
}

/// Reads stdin on its own thread; EOF simply ends the feed of commands.
pub fn spawn_console() -> mpsc::Receiver<ConsoleCommand> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match ConsoleCommand::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("unknown command {:?}; type `abort` or `detach`", line.trim()),
            }
        }
    });
    rx
}

/// One run of the client: a controller, the engine behind it, and the terminal.
pub struct Session<S: TaskSlot> {
    controller: TaskController<S>,
    runner: EffectRunner,
    console: Option<mpsc::Receiver<ConsoleCommand>>,
    reconnects_left: u32,
    reconnect_at: Option<Instant>,
    abort_confirmed: Option<bool>,
    shown: AppViewModel,
}

impl<S: TaskSlot> Session<S> {
    pub fn new(controller: TaskController<S>, runner: EffectRunner, reconnects: u32) -> Self {
        Self {
            controller,
            runner,
            console: None,
            reconnects_left: reconnects,
            reconnect_at: None,
            abort_confirmed: None,
            shown: AppViewModel::default(),
        }
    }

    pub fn with_console(mut self, console: mpsc::Receiver<ConsoleCommand>) -> Self {
        self.console = Some(console);
        self
    }

    /// Picks up a persisted task; returns whether one was resumed.
    pub fn boot(&mut self) -> bool {
        let effects = self.controller.boot();
        self.runner.run(effects);
        self.render();
        self.controller.view().phase == RunPhase::Running
    }

    pub fn dispatch(&mut self, msg: Msg) {
        if let Msg::AbortSettled { result, .. } = &msg {
            self.abort_confirmed = Some(result.is_ok());
        }
        let effects = self.controller.dispatch(msg);
        self.runner.run(effects);
        self.render();
    }

    fn render(&mut self) {
        let dirty = self.controller.consume_dirty();
        let redraws = self.controller.take_redraws();
        if !dirty && redraws.is_empty() {
            return;
        }
        engine_trace!("Rendering {} slot changes", redraws.len());
        let view = self.controller.view();
        for line in diff_lines(&self.shown, &view) {
            println!("{line}");
        }
        self.shown = view;
    }

    pub fn run(mut self) -> Finish {
        loop {
            if let Some(event) = self.runner.engine().recv_timeout(POLL_INTERVAL) {
                if let Some(msg) = self.runner.translate(event) {
                    self.dispatch(msg);
                }
            }

            let commands: Vec<ConsoleCommand> = match &self.console {
                Some(console) => console.try_iter().collect(),
                None => Vec::new(),
            };
            for command in commands {
                match command {
                    ConsoleCommand::Abort => self.dispatch(Msg::AbortClicked),
                    ConsoleCommand::Detach => {
                        engine_info!("Detached; the task stays persisted");
                        return Finish::Detached;
                    }
                }
            }

            if let Some(at) = self.reconnect_at {
                if Instant::now() >= at {
                    self.reconnect_at = None;
                    self.dispatch(Msg::ResumeRequested);
                }
            }

            if let Some(finish) = self.check_finished() {
                return finish;
            }
        }
    }

    fn check_finished(&mut self) -> Option<Finish> {
        let view = self.controller.view();
        match view.phase {
            RunPhase::Running => {
                if view.stream != StreamPhase::Disconnected || self.reconnect_at.is_some() {
                    return None;
                }
                if self.reconnects_left == 0 {
                    return Some(Finish::Disconnected);
                }
                self.reconnects_left -= 1;
                engine_warn!(
                    "Connection lost; reconnecting in {:?} ({} attempts left)",
                    RECONNECT_DELAY,
                    self.reconnects_left
                );
                self.reconnect_at = Some(Instant::now() + RECONNECT_DELAY);
                None
            }
            RunPhase::Idle if self.runner.awaiting_replies() => None,
            RunPhase::Idle => Some(match view.outcome {
                Some(TaskOutcome::Completed) => Finish::Completed,
                Some(TaskOutcome::Failed(_)) => Finish::Failed,
                Some(TaskOutcome::Aborted) => Finish::Aborted {
                    confirmed: self.abort_confirmed.unwrap_or(false),
                },
                None => Finish::Idle,
            }),
        }
    }
}
