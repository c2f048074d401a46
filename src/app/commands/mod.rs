//! Slash-command dispatch and handler implementations.
//!
//! Every `/command` typed by the user is routed through [`App::handle_command`]
//! and dispatched to the appropriate handler:
//!
//! | Module   | Commands                                  |
//! |----------|-------------------------------------------|
//! | `agents` | `/agent` – list, info, use                |
//! | (here)   | `/help`, `/endpoint`, `/fallback`, `/quit` |

mod agents;

use crate::client::FallbackPolicy;

use super::App;
use super::log_src;
use super::logging::LogLevel;

// ── Command dispatch ─────────────────────────────────────────────────

impl App {
    /// Route a slash-command to the matching handler.
    pub(crate) fn handle_command(&mut self, line: &str) -> anyhow::Result<()> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "/help" => self.show_help(),
            "/quit" | "/exit" => self.should_quit = true,
            "/clear" => self.logs.clear(),
            "/agent" | "/agents" => self.handle_agent_command(parts.collect()),
            "/endpoint" => {
                let endpoint = self.endpoint_label();
                self.log(LogLevel::Info, format!("POST {endpoint}"));
            }
            "/fallback" => self.handle_fallback_command(parts.collect()),
            _ => log_src!(self, LogLevel::Warn, format!("Unknown command: {cmd}")),
        }

        Ok(())
    }
}

// ── /fallback ────────────────────────────────────────────────────────

impl App {
    fn handle_fallback_command(&mut self, args: Vec<&str>) {
        let Some(raw) = args.first() else {
            let current = self.session.policy().label();
            self.log(
                LogLevel::Info,
                format!("Fallback for replies without text: {current}"),
            );
            return;
        };

        match FallbackPolicy::parse(raw) {
            Some(policy) => {
                self.session.set_policy(policy);
                self.log(
                    LogLevel::Info,
                    format!("Fallback set to {}.", policy.label()),
                );
            }
            None => log_src!(
                self,
                LogLevel::Warn,
                "Usage: /fallback [no-reply|stringify]".to_string()
            ),
        }
    }
}

// ── Help ─────────────────────────────────────────────────────────────

impl App {
    fn show_help(&mut self) {
        let lines = [
            "━━━  agentchat — talk to an agent runtime  ━━━",
            "",
            "Just type and press Enter to chat with the active agent.",
            "",
            "Agents",
            "  /agent                  List declared agents",
            "  /agent info [name]      Show an agent declaration",
            "  /agent use <name>       Send future messages to another agent",
            "",
            "Connection",
            "  /endpoint               Show the generate URL in use",
            "  /fallback [policy]      Show or set reply fallback (no-reply|stringify)",
            "",
            "Screen",
            "  Up/Down, PgUp/PgDn      Scroll the conversation",
            "  /clear, Ctrl+L          Clear the activity log",
            "  /quit, Esc, Ctrl+C      Exit",
        ];
        for line in lines {
            self.log(LogLevel::Info, line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::tests::test_app;
    use crate::client::FallbackPolicy;

    #[test]
    fn fallback_command_switches_policy() {
        let mut app = test_app();
        app.handle_command("/fallback stringify").unwrap();
        assert_eq!(app.session.policy(), FallbackPolicy::Stringify);

        app.handle_command("/fallback bogus").unwrap();
        assert_eq!(app.session.policy(), FallbackPolicy::Stringify);
        assert!(app.logs.last().unwrap().message.starts_with("Usage"));
    }

    #[test]
    fn endpoint_command_logs_generate_url() {
        let mut app = test_app();
        app.handle_command("/endpoint").unwrap();
        let last = &app.logs.last().unwrap().message;
        assert!(last.starts_with("POST http://127.0.0.1:"));
        assert!(last.ends_with("/api/agents/weatherAgent/generate"));
    }

    #[test]
    fn clear_empties_activity_log_only() {
        let mut app = test_app();
        app.handle_chat_message("hello");
        app.handle_command("/clear").unwrap();
        assert!(app.logs.is_empty());
        assert_eq!(app.session.messages().len(), 1);
    }

    #[test]
    fn unknown_command_warns() {
        let mut app = test_app();
        app.handle_command("/frobnicate").unwrap();
        assert!(app.logs.last().unwrap().message.contains("/frobnicate"));
    }

    #[test]
    fn quit_command() {
        let mut app = test_app();
        app.handle_command("/exit").unwrap();
        assert!(app.should_quit());
    }
}
