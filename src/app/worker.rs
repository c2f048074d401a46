//! Background request tasks.
//!
//! Each dispatched [`PendingSend`] runs on the tokio runtime so the TUI
//! draw loop never blocks on the network.  The outcome comes back to the
//! UI thread as a [`ChatEvent`] over an unbounded [`mpsc`] channel.

use anyhow::Result;
use chrono::Local;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::client::AgentTransport;

use super::session::PendingSend;

/// The settled outcome of one request.
#[derive(Debug)]
pub struct ChatEvent {
    /// Sequence number of the request this answers.
    pub seq: u64,
    /// Agent the request went to.
    pub agent: String,
    /// Raw reply body, or the failure.
    pub outcome: Result<Value>,
    /// Wall-clock timestamp of settlement.
    pub timestamp: String,
}

/// Spawn one request on `rt` and report its outcome through `tx`.
pub fn spawn_chat_task<T: AgentTransport>(
    send: PendingSend,
    tx: mpsc::UnboundedSender<ChatEvent>,
    transport: T,
    rt: &Handle,
) {
    rt.spawn(async move {
        let outcome = transport.generate(&send.agent, &send.text).await;
        // The receiver only goes away when the app is shutting down.
        let _ = tx.send(ChatEvent {
            seq: send.seq,
            agent: send.agent,
            outcome,
            timestamp: Local::now().format("%H:%M:%S").to_string(),
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    use crate::app::session::{ChatSession, Role, Submission};
    use crate::client::FallbackPolicy;

    /// Transport that answers every request with the same canned outcome.
    #[derive(Clone)]
    enum Canned {
        Body(Value),
        Fail(&'static str),
    }

    impl AgentTransport for Canned {
        async fn generate(&self, _agent: &str, text: &str) -> Result<Value> {
            match self {
                Canned::Body(body) if body.is_null() => Ok(json!({ "text": format!("echo: {text}") })),
                Canned::Body(body) => Ok(body.clone()),
                Canned::Fail(message) => Err(anyhow!(*message)),
            }
        }
    }

    async fn run_once(session: &mut ChatSession, transport: Canned, text: &str) {
        let Submission::Dispatch(send) = session.submit("weatherAgent", text) else {
            panic!("expected a dispatch");
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_chat_task(send, tx, transport, &Handle::current());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.agent, "weatherAgent");
        assert!(session.is_in_flight());
        session.settle(event.seq, event.outcome);
    }

    #[tokio::test]
    async fn reply_flows_back_to_session() {
        let mut session = ChatSession::new(FallbackPolicy::NoReply);
        run_once(&mut session, Canned::Body(json!({"text": "Sunny"})), "Weather?").await;

        assert!(!session.is_in_flight());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].role, Role::Bot);
        assert_eq!(session.messages()[1].content, "Sunny");
    }

    #[tokio::test]
    async fn transport_failure_flows_back_as_error() {
        let mut session = ChatSession::new(FallbackPolicy::NoReply);
        run_once(&mut session, Canned::Fail("Network Error"), "Weather?").await;

        assert_eq!(session.messages()[1].content, "Error: Network Error");
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn queued_send_is_dispatched_after_first_settles() {
        let mut session = ChatSession::default();
        let transport = Canned::Body(Value::Null);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let Submission::Dispatch(first) = session.submit("weatherAgent", "one") else {
            panic!("expected a dispatch");
        };
        spawn_chat_task(first, tx.clone(), transport.clone(), &Handle::current());
        assert!(matches!(
            session.submit("weatherAgent", "two"),
            Submission::Queued { .. }
        ));

        let event = rx.recv().await.unwrap();
        let next = session.settle(event.seq, event.outcome).unwrap();
        spawn_chat_task(next, tx, transport, &Handle::current());

        let event = rx.recv().await.unwrap();
        assert!(session.settle(event.seq, event.outcome).is_none());

        let contents: Vec<&str> = session
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "two", "echo: one", "echo: two"]);
    }
}
