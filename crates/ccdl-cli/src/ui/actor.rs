//! UI Actor - Single-threaded event processing
//!
//! Downloads report progress from async tasks while prompts and summaries
//! print from command code. Every console write goes through one thread
//! that owns stdout, so a progress line is never torn by another message.

use super::progress::{Throttle, fit, format_transfer};
use super::theme::{Theme, format_size};
use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::style::{Stylize, style};
use crossterm::terminal::{Clear, ClearType};
use std::io::{IsTerminal, Stdout, Write, stdout};
use std::sync::mpsc;
use std::thread;

/// Events that can be sent to the UI actor
#[derive(Debug)]
pub enum UiEvent {
    /// Print a section header
    Section(String),
    /// Transfer progress of one file
    Downloading {
        file: String,
        current: u64,
        total: Option<u64>,
    },
    /// Extraction progress of one archive
    Extracting {
        file: String,
        current: u64,
        total: Option<u64>,
    },
    /// File finished
    Done {
        file: String,
        detail: String,
        size: Option<u64>,
    },
    /// File failed
    Failed { file: String, reason: String },
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// Unstyled line (lists, prompts)
    Plain(String),
    Summary {
        count: usize,
        action: String,
        elapsed_secs: f64,
    },
    /// Synchronize UI state (wait for all pending renders)
    Sync(tokio::sync::oneshot::Sender<()>),
    /// Shutdown the actor
    Shutdown,
}

/// Handle to the UI actor thread
#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    _handle: thread::JoinHandle<()>,
}

impl UiActor {
    /// Spawn a new UI actor thread
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            Renderer::new(Theme::default()).run(&receiver);
        });

        Self {
            sender,
            _handle: handle,
        }
    }

    /// Get a cloneable sender for this actor
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
    }
}

struct Renderer {
    out: Stdout,
    theme: Theme,
    live: bool,
    /// A transfer line without trailing newline is on screen.
    line_open: bool,
    throttle: Throttle,
}

impl Renderer {
    fn new(theme: Theme) -> Self {
        Self {
            out: stdout(),
            theme,
            live: stdout().is_terminal(),
            line_open: false,
            throttle: Throttle::default(),
        }
    }

    fn run(mut self, receiver: &mpsc::Receiver<UiEvent>) {
        while let Ok(event) = receiver.recv() {
            if matches!(event, UiEvent::Shutdown) {
                break;
            }
            // a closed stdout leaves nothing to render to
            if self.handle(event).is_err() {
                break;
            }
        }
        let _ = self.close_line();
    }

    fn close_line(&mut self) -> std::io::Result<()> {
        if self.line_open {
            self.out.queue(MoveToColumn(0))?;
            self.out.queue(Clear(ClearType::CurrentLine))?;
            self.line_open = false;
        }
        self.out.flush()
    }

    fn println(&mut self, line: &str) -> std::io::Result<()> {
        self.close_line()?;
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    fn progress(&mut self, verb: &str, file: &str, current: u64, total: Option<u64>) -> std::io::Result<()> {
        let finished = total.is_some_and(|t| current >= t);
        if !self.live || !self.throttle.ready(finished) {
            return Ok(());
        }
        let line = format!(
            "  {} {} {} {}",
            style(self.theme.icons.active).with(self.theme.colors.active),
            style(fit(file, self.theme.layout.name_width)).with(self.theme.colors.name),
            style(verb).with(self.theme.colors.secondary),
            format_transfer(current, total),
        );
        self.out.queue(MoveToColumn(0))?;
        self.out.queue(Clear(ClearType::CurrentLine))?;
        write!(self.out, "{line}")?;
        self.line_open = true;
        self.out.flush()
    }

    fn handle(&mut self, event: UiEvent) -> std::io::Result<()> {
        let theme = self.theme.clone();
        match event {
            UiEvent::Section(title) => {
                self.println("")?;
                self.println(&format!("{}", title.bold()))
            }
            UiEvent::Downloading {
                file,
                current,
                total,
            } => self.progress("fetching", &file, current, total),
            UiEvent::Extracting {
                file,
                current,
                total,
            } => self.progress("extracting", &file, current, total),
            UiEvent::Done { file, detail, size } => {
                self.throttle.reset();
                let size = size.map(format_size).unwrap_or_default();
                self.println(&format!(
                    "  {} {} {:>width$}  {}",
                    style(theme.icons.success).with(theme.colors.success),
                    style(fit(&file, theme.layout.name_width)).with(theme.colors.name),
                    style(size).with(theme.colors.secondary),
                    detail,
                    width = theme.layout.size_width,
                ))
            }
            UiEvent::Failed { file, reason } => {
                self.throttle.reset();
                self.println(&format!(
                    "  {} {} {}",
                    style(theme.icons.error).with(theme.colors.error),
                    style(fit(&file, theme.layout.name_width)).with(theme.colors.name),
                    style(reason).with(theme.colors.error),
                ))
            }
            UiEvent::Info(msg) => self.println(&format!("  {} {msg}", theme.icons.info)),
            UiEvent::Success(msg) => self.println(&format!(
                "  {} {}",
                style(theme.icons.success).with(theme.colors.success),
                msg.bold()
            )),
            UiEvent::Warning(msg) => self.println(&format!(
                "  {} {}",
                style(theme.icons.warning).with(theme.colors.warning),
                style(msg).with(theme.colors.warning)
            )),
            UiEvent::Error(msg) => self.println(&format!(
                "  {} {}",
                style(theme.icons.error).with(theme.colors.error),
                style(msg).with(theme.colors.error)
            )),
            UiEvent::Plain(line) => self.println(&line),
            UiEvent::Summary {
                count,
                action,
                elapsed_secs,
            } => {
                let operation = action.to_uppercase();
                self.println("")?;
                self.println(&format!(
                    "{}",
                    format!("{operation} COMPLETE {count}, elapsed {elapsed_secs:.1}s").green()
                ))
            }
            UiEvent::Sync(tx) => {
                self.close_line()?;
                // All previous events are processed because of sequential mpsc
                let _ = tx.send(());
                Ok(())
            }
            UiEvent::Shutdown => Ok(()),
        }
    }
}
