//! Chat flow — submitting messages and folding replies back in.

use super::App;
use super::log_src;
use super::logging::LogLevel;
use super::session::{PendingSend, Submission};
use super::worker;

impl App {
    /// Send one line of user text to the active agent.
    ///
    /// The user message lands in the conversation immediately.  If another
    /// request is still pending the new one waits in the session queue so
    /// replies stay in submission order.
    pub(crate) fn handle_chat_message(&mut self, text: &str) {
        let agent = self.active_agent.clone();
        match self.session.submit(&agent, text) {
            Submission::Ignored => {}
            Submission::Dispatch(send) => self.dispatch(send),
            Submission::Queued { position } => self.log(
                LogLevel::Info,
                format!("Queued behind the pending reply (position {position})."),
            ),
        }
    }

    /// Start the background request for `send`.
    fn dispatch(&mut self, send: PendingSend) {
        self.log(
            LogLevel::Info,
            format!("→ {} #{}", send.agent, send.seq),
        );
        let rt = self.runtime.handle().clone();
        worker::spawn_chat_task(send, self.chat_tx.clone(), self.client.clone(), &rt);
    }

    /// Drain settled requests into the conversation.  Called once per tick.
    pub fn drain_chat_events(&mut self) {
        while let Ok(event) = self.chat_rx.try_recv() {
            match &event.outcome {
                Ok(body) => self.log(
                    LogLevel::Info,
                    format!("← {} #{} at {}: {body}", event.agent, event.seq, event.timestamp),
                ),
                Err(err) => log_src!(
                    self,
                    LogLevel::Error,
                    format!("Request to {} failed: {err:#}", event.agent)
                ),
            }

            if let Some(next) = self.session.settle(event.seq, event.outcome) {
                self.dispatch(next);
            }
        }
    }
}
