//! Conversation state — the append-only message list, the in-flight flag,
//! and the FIFO queue that keeps replies in submission order.
//!
//! The session never touches the network.  [`ChatSession::submit`] hands
//! back the request to dispatch (if any) and [`ChatSession::settle`] takes
//! the outcome once it arrives, so the whole state machine is driven by the
//! caller:
//!
//! ```text
//! idle ──submit──▶ sending ──settle──▶ idle
//!                    │  ▲
//!            submit  │  │ settle (queue non-empty: dispatch next)
//!                    ▼  │
//!                  queued
//! ```

use std::collections::VecDeque;
use std::fmt;

use anyhow::Result;
use serde_json::Value;

use crate::client::FallbackPolicy;
use crate::constants::ERROR_PREFIX;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Bot => f.write_str("bot"),
        }
    }
}

/// One chat bubble.  Never mutated after it is appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// A request that should go out to the agent runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSend {
    /// Monotonic id used to match the reply to this request.
    pub seq: u64,
    pub agent: String,
    pub text: String,
}

/// Result of submitting a line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; nothing appended.
    Ignored,
    /// The caller must dispatch this request now.
    Dispatch(PendingSend),
    /// A request is already in flight; this one waits its turn.
    Queued { position: usize },
}

/// Message list plus request bookkeeping for one chat session.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    in_flight: Option<u64>,
    queue: VecDeque<PendingSend>,
    next_seq: u64,
    policy: FallbackPolicy,
}

impl ChatSession {
    pub fn new(policy: FallbackPolicy) -> Self {
        ChatSession {
            policy,
            ..Default::default()
        }
    }

    /// Append the user's message and decide whether to dispatch or queue it.
    pub fn submit(&mut self, agent: &str, text: &str) -> Submission {
        if text.trim().is_empty() {
            return Submission::Ignored;
        }

        self.messages.push(Message {
            role: Role::User,
            content: text.to_string(),
        });

        let send = PendingSend {
            seq: self.next_seq,
            agent: agent.to_string(),
            text: text.to_string(),
        };
        self.next_seq += 1;

        if self.in_flight.is_some() {
            self.queue.push_back(send);
            return Submission::Queued {
                position: self.queue.len(),
            };
        }

        self.in_flight = Some(send.seq);
        Submission::Dispatch(send)
    }

    /// Record the outcome of the in-flight request as exactly one bot
    /// message.  Returns the next queued request to dispatch, if any.
    ///
    /// Outcomes for any other sequence number are dropped.
    pub fn settle(&mut self, seq: u64, outcome: Result<Value>) -> Option<PendingSend> {
        if self.in_flight != Some(seq) {
            return None;
        }

        let content = match outcome {
            Ok(body) => self.policy.reply_text(&body),
            Err(err) => format!("{ERROR_PREFIX}{err:#}"),
        };
        self.messages.push(Message {
            role: Role::Bot,
            content,
        });

        let next = self.queue.pop_front();
        self.in_flight = next.as_ref().map(|send| send.seq);
        next
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of submissions waiting behind the in-flight request.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Change how future replies are rendered.  Existing messages keep their text.
    pub fn set_policy(&mut self, policy: FallbackPolicy) {
        self.policy = policy;
    }
}
