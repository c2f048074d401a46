//! Application core — state, lifecycle, and event dispatch.
//!
//! The [`App`] struct holds all runtime state and is the single entry point
//! for the rest of the binary.  Heavy concerns are delegated to focused
//! submodules:
//!
//! | Module     | Responsibility                              |
//! |------------|---------------------------------------------|
//! | `chat`     | Submitting messages & draining replies      |
//! | `commands` | Slash-command dispatch & handlers           |
//! | `input`    | Text-input editing (cursor, insert, etc.)   |
//! | `logging`  | `LogLevel`, `LogLine`                       |
//! | `session`  | Message list, in-flight flag, send queue    |
//! | `ui`       | TUI rendering & status-bar helpers          |
//! | `worker`   | Background request tasks                    |

mod chat;
mod commands;
mod input;
mod logging;
mod session;
mod ui;
mod worker;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::agent::config::{AgentRegistry, AgentSource};
use crate::client::{AgentClient, FallbackPolicy};
use crate::constants::{DEFAULT_AGENT, MAX_LOGS};
use crate::util::env_first;

use self::logging::{LogLevel, LogLine};
use self::session::ChatSession;
use self::worker::ChatEvent;

// ── Logging ──────────────────────────────────────────────────────────

/// Log a `Warn`/`Error` message, attaching `[file:line]` in debug-logs builds.
///
/// In release (no `debug-logs` feature) this behaves like `self.log()`.
///
/// ```ignore
/// log_src!(self, LogLevel::Warn, format!("something broke: {err:#}"));
/// ```
macro_rules! log_src {
    ($app:expr, $level:expr, $msg:expr) => {{
        #[cfg(feature = "debug-logs")]
        {
            let loc = format!("{}:{}", file!(), line!());
            $app.log_with_src($level, $msg, &loc);
        }
        #[cfg(not(feature = "debug-logs"))]
        {
            $app.log($level, $msg);
        }
    }};
}
pub(crate) use log_src;

impl App {
    /// Append a message to the activity log.
    pub(crate) fn log(&mut self, level: LogLevel, message: String) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.logs.push(LogLine {
            timestamp,
            level,
            message,
        });
        if self.logs.len() > MAX_LOGS {
            let overflow = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..overflow);
        }
    }

    /// Append a message with a source location suffix (debug-logs builds only).
    #[cfg(feature = "debug-logs")]
    pub(crate) fn log_with_src(&mut self, level: LogLevel, message: String, src: &str) {
        let tagged = match level {
            LogLevel::Warn | LogLevel::Error => format!("{message}  [{src}]"),
            _ => message,
        };
        self.log(level, tagged);
    }
}

// ── Application state ────────────────────────────────────────────────

/// Top-level application state.
///
/// Fields use `pub(crate)` visibility so that the sibling submodules
/// (`commands`, `chat`, `ui`, …) can access them directly while keeping
/// them hidden from the rest of the crate.
pub struct App {
    pub(crate) runtime: Runtime,
    pub(crate) input: String,
    pub(crate) cursor: usize,
    pub(crate) logs: Vec<LogLine>,
    pub(crate) registry: AgentRegistry,
    pub(crate) agent_source: AgentSource,
    pub(crate) active_agent: String,
    pub(crate) client: AgentClient,
    pub(crate) session: ChatSession,
    pub(crate) chat_tx: mpsc::UnboundedSender<ChatEvent>,
    pub(crate) chat_rx: mpsc::UnboundedReceiver<ChatEvent>,
    pub(crate) scroll_offset: u16,
    pub(crate) should_quit: bool,
}

// ── Lifecycle ────────────────────────────────────────────────────────

impl App {
    /// Create and initialise a new application instance from the environment.
    pub fn new() -> Result<Self> {
        let client = AgentClient::from_env()?;
        let (registry, agent_source) = AgentRegistry::load()?;
        let active_agent =
            env_first(&["AGENTCHAT_AGENT"]).unwrap_or_else(|| DEFAULT_AGENT.to_string());
        let fallback_raw = env_first(&["AGENTCHAT_FALLBACK"]);
        let policy = fallback_raw
            .as_deref()
            .and_then(FallbackPolicy::parse)
            .unwrap_or_default();

        let mut app = App::with_parts(client, registry, agent_source, active_agent, policy)?;

        if let Some(raw) = fallback_raw {
            if FallbackPolicy::parse(&raw).is_none() {
                log_src!(
                    app,
                    LogLevel::Warn,
                    format!("Unknown AGENTCHAT_FALLBACK '{raw}', using no-reply.")
                );
            }
        }
        Ok(app)
    }

    /// Assemble an application from already-resolved configuration.
    pub(crate) fn with_parts(
        client: AgentClient,
        registry: AgentRegistry,
        agent_source: AgentSource,
        active_agent: String,
        policy: FallbackPolicy,
    ) -> Result<Self> {
        let runtime = Runtime::new().context("create tokio runtime")?;
        let (chat_tx, chat_rx) = mpsc::unbounded_channel();

        let mut app = App {
            runtime,
            input: String::new(),
            cursor: 0,
            logs: Vec::new(),
            registry,
            agent_source,
            active_agent,
            client,
            session: ChatSession::new(policy),
            chat_tx,
            chat_rx,
            scroll_offset: 0,
            should_quit: false,
        };

        app.log(
            LogLevel::Info,
            format!(
                "Loaded {} agent declaration(s) from {}.",
                app.registry.len(),
                app.agent_source.label(),
            ),
        );
        if app.registry.get(&app.active_agent).is_none() {
            log_src!(
                app,
                LogLevel::Warn,
                format!(
                    "Agent '{}' is not declared locally; the runtime must know it.",
                    app.active_agent
                )
            );
        }
        app.log(
            LogLevel::Info,
            format!("Talking to {}. Type /help for commands.", app.endpoint_label()),
        );
        Ok(app)
    }

    /// Whether the user has requested to quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Human-readable generate URL for the active agent.
    pub(crate) fn endpoint_label(&self) -> String {
        match self.client.generate_url(&self.active_agent) {
            Ok(url) => url.to_string(),
            Err(err) => format!("<invalid: {err}>"),
        }
    }
}

// ── Event handling ───────────────────────────────────────────────────

impl App {
    /// Route a terminal event to the appropriate handler.
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            self.handle_key(key)?;
        }
        Ok(())
    }

    /// Dispatch a key press to input editing, commands, or control actions.
    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.should_quit = true,

            KeyEvent {
                code: KeyCode::Char('l'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.logs.clear(),

            KeyEvent { code, .. } => match code {
                KeyCode::Char(ch) => self.insert_char(ch),
                KeyCode::Backspace => self.backspace(),
                KeyCode::Delete => self.delete(),
                KeyCode::Left => self.move_cursor_left(),
                KeyCode::Right => self.move_cursor_right(),
                KeyCode::Home => self.move_cursor_home(),
                KeyCode::End => self.move_cursor_end(),
                KeyCode::Up => self.scroll_up(1),
                KeyCode::Down => self.scroll_down(1),
                KeyCode::PageUp => self.scroll_up(10),
                KeyCode::PageDown => self.scroll_down(10),
                KeyCode::Enter => {
                    self.scroll_offset = 0; // snap to bottom on submit
                    self.submit_input()?;
                }
                KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
        }
        Ok(())
    }

    /// Submit the current input line for processing.
    ///
    /// Blank lines are dropped here and never reach the chat session.
    fn submit_input(&mut self) -> Result<()> {
        let line = std::mem::take(&mut self.input);
        self.cursor = 0;

        if line.trim().is_empty() {
            return Ok(());
        }

        if line.trim_start().starts_with('/') {
            self.handle_command(line.trim())?;
        } else {
            self.handle_chat_message(&line);
        }

        Ok(())
    }
}

// ── Scrolling ────────────────────────────────────────────────────────

impl App {
    /// Scroll the conversation up by `n` lines.
    pub(crate) fn scroll_up(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(n);
    }

    /// Scroll the conversation down by `n` lines (towards the latest).
    pub(crate) fn scroll_down(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }
}
