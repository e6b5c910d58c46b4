// src/console.rs

//! Line-based reader commands for `--interactive` sessions.

use std::io::{self, BufRead};
use std::str::FromStr;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::types::PageIndex;

/// One command typed by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderCommand {
    Launch,
    Sheet(usize),
    Next,
    Prev,
    Reink(PageIndex),
    Cancel(PageIndex),
    Reset,
    Quit,
}

impl FromStr for ReaderCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| "empty command".to_string())?
            .to_ascii_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments for '{verb}'"));
        }

        let number = |what: &str| -> Result<usize, String> {
            arg.ok_or_else(|| format!("'{verb}' needs a {what}"))?
                .parse::<usize>()
                .map_err(|e| format!("invalid {what} for '{verb}': {e}"))
        };

        let command = match verb.as_str() {
            "launch" | "start" => ReaderCommand::Launch,
            "sheet" | "goto" => ReaderCommand::Sheet(number("sheet number")?),
            "next" | "n" => ReaderCommand::Next,
            "prev" | "p" => ReaderCommand::Prev,
            "reink" | "retry" => ReaderCommand::Reink(number("page index")?),
            "cancel" => ReaderCommand::Cancel(number("page index")?),
            "reset" => ReaderCommand::Reset,
            "quit" | "exit" | "q" => ReaderCommand::Quit,
            other => return Err(format!("unknown command '{other}'")),
        };

        let takes_arg = matches!(
            command,
            ReaderCommand::Sheet(_) | ReaderCommand::Reink(_) | ReaderCommand::Cancel(_)
        );
        if !takes_arg && arg.is_some() {
            return Err(format!("'{verb}' takes no arguments"));
        }
        Ok(command)
    }
}

/// The reader's position in the book, turned into runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reader {
    sheet: usize,
    max_sheet: usize,
}

impl Reader {
    pub fn new(max_sheet: usize) -> Self {
        Self {
            sheet: 0,
            max_sheet,
        }
    }

    pub fn sheet(&self) -> usize {
        self.sheet
    }

    /// Update the position and return the event to send.
    pub fn apply(&mut self, command: ReaderCommand) -> RuntimeEvent {
        match command {
            ReaderCommand::Launch => {
                self.sheet = 0;
                RuntimeEvent::Launch
            }
            ReaderCommand::Sheet(sheet) => self.turn_to(sheet),
            ReaderCommand::Next => self.turn_to(self.sheet.saturating_add(1)),
            ReaderCommand::Prev => self.turn_to(self.sheet.saturating_sub(1)),
            ReaderCommand::Reink(page) => RuntimeEvent::Reink { page },
            ReaderCommand::Cancel(page) => RuntimeEvent::Cancel { page },
            ReaderCommand::Reset => {
                self.sheet = 0;
                RuntimeEvent::Reset
            }
            ReaderCommand::Quit => RuntimeEvent::ShutdownRequested,
        }
    }

    fn turn_to(&mut self, sheet: usize) -> RuntimeEvent {
        self.sheet = sheet.min(self.max_sheet);
        RuntimeEvent::ViewportChanged { sheet: self.sheet }
    }
}

/// Read commands from stdin until EOF or `quit`, forwarding them to the
/// runtime.
///
/// Runs on its own OS thread: a pending blocking read must not keep the Tokio
/// runtime from shutting down.
pub fn spawn_console(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    max_sheet: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("inkflow-console".to_string())
        .spawn(move || run_console(runtime_tx, max_sheet))
}

fn run_console(runtime_tx: mpsc::Sender<RuntimeEvent>, max_sheet: usize) {
    let mut reader = Reader::new(max_sheet);
    info!(max_sheet, "console ready (launch, sheet N, next, prev, reink N, cancel N, reset, quit)");

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "reading stdin failed");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ReaderCommand>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        let event = reader.apply(command);
        let quit = matches!(event, RuntimeEvent::ShutdownRequested);
        if runtime_tx.blocking_send(event).is_err() || quit {
            return;
        }
    }

    // EOF on stdin ends the session too.
    debug!("stdin closed");
    let _ = runtime_tx.blocking_send(RuntimeEvent::ShutdownRequested);
}
