//! Compile-time constants and tunables shared across the crate.

/// Application name used for config directories.
pub const APP_NAME: &str = "agentchat";

/// Default agent runtime base URL when `AGENTCHAT_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4111";
/// Default agent name when `AGENTCHAT_AGENT` is not set.
pub const DEFAULT_AGENT: &str = "weatherAgent";
/// File name of the agent declarations file.
pub const AGENTS_FILE: &str = "agents.json";

/// Bot message content when a reply carries no usable `text`.
pub const NO_REPLY_TEXT: &str = "No reply";
/// Prefix for bot messages produced from a failed request.
pub const ERROR_PREFIX: &str = "Error: ";

/// Maximum number of log entries kept in the activity panel.
pub const MAX_LOGS: usize = 1000;
/// Height (in rows, borders included) of the activity panel.
pub const ACTIVITY_PANEL_HEIGHT: u16 = 8;
