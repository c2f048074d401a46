//! Agent runtime HTTP client — the `generate` endpoint and reply parsing.

use std::future::Future;

use anyhow::{Context, Result, anyhow};
use reqwest::Client as HttpClient;
use serde_json::{Value, json};
use url::Url;

use crate::constants::{DEFAULT_BASE_URL, NO_REPLY_TEXT};
use crate::util::{env_first, normalize_url};

/// Anything that can deliver one user message to a named agent and hand
/// back the raw JSON reply body.
pub trait AgentTransport: Clone + Send + Sync + 'static {
    fn generate(&self, agent: &str, text: &str) -> impl Future<Output = Result<Value>> + Send;
}

/// Thin wrapper around the agent runtime's HTTP API.
#[derive(Clone)]
pub struct AgentClient {
    pub base_url: Url,
    http_client: HttpClient,
}

impl AgentClient {
    /// Build a client from `AGENTCHAT_BASE_URL`, falling back to the local runtime.
    pub fn from_env() -> Result<Self> {
        let raw = env_first(&["AGENTCHAT_BASE_URL"]).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(&raw)
    }

    pub fn new(base_url: &str) -> Result<Self> {
        let normalized = normalize_url(base_url);
        let base_url = Url::parse(normalized.trim_end_matches('/'))
            .with_context(|| format!("parse agent base URL '{normalized}'"))?;
        Ok(AgentClient {
            base_url,
            http_client: HttpClient::new(),
        })
    }

    /// `POST` target for an agent: `{base}/api/agents/{agent}/generate`.
    pub fn generate_url(&self, agent: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("agent base URL '{}' cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(["api", "agents", agent, "generate"]);
        Ok(url)
    }
}

impl AgentTransport for AgentClient {
    async fn generate(&self, agent: &str, text: &str) -> Result<Value> {
        let url = self.generate_url(agent)?;
        let body = generate_body(text);

        let response = self.http_client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Request failed with status code {}", status.as_u16()));
        }
        let raw = response.text().await?;
        parse_reply_body(&raw)
    }
}

/// Decode a 2xx body.  An empty body is an empty reply; a literal `null`
/// has no `text` to read and counts as a failed request.
pub fn parse_reply_body(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::String(String::new()));
    }
    match serde_json::from_str::<Value>(raw)? {
        Value::Null => Err(anyhow!("Cannot read properties of null (reading 'text')")),
        json => Ok(json),
    }
}

/// Request body for a single user turn.
pub fn generate_body(text: &str) -> Value {
    json!({
        "messages": [{ "role": "user", "content": text }],
    })
}

/// How a reply without a usable `text` field is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Missing or falsy `text` becomes `"No reply"`.
    #[default]
    NoReply,
    /// `text` is coerced to a string as-is; missing becomes `"undefined"`.
    Stringify,
}

impl FallbackPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "no-reply" | "noreply" | "default" => Some(FallbackPolicy::NoReply),
            "stringify" | "string" => Some(FallbackPolicy::Stringify),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FallbackPolicy::NoReply => "no-reply",
            FallbackPolicy::Stringify => "stringify",
        }
    }

    /// Turn a reply body into the bot message content.
    pub fn reply_text(self, body: &Value) -> String {
        let text = body.get("text");
        match self {
            FallbackPolicy::NoReply => match text {
                Some(value) if is_truthy(value) => value_to_string(value),
                _ => NO_REPLY_TEXT.to_string(),
            },
            FallbackPolicy::Stringify => match text {
                Some(value) => value_to_string(value),
                None => "undefined".to_string(),
            },
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread;

    use tiny_http::{Header, Response, Server};

    /// Serve exactly one request with `status`/`body`, returning the
    /// base URL and a handle yielding the received (path, body).
    fn one_shot_server(status: u16, body: &'static str) -> (String, thread::JoinHandle<(String, String)>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let path = request.url().to_string();
            let mut received = String::new();
            request.as_reader().read_to_string(&mut received).unwrap();
            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(header);
            request.respond(response).unwrap();
            (path, received)
        });
        (format!("http://127.0.0.1:{port}"), handle)
    }

    #[test]
    fn generate_url_targets_agent() {
        let client = AgentClient::new("localhost:4111").unwrap();
        assert_eq!(
            client.generate_url("weatherAgent").unwrap().as_str(),
            "http://localhost:4111/api/agents/weatherAgent/generate"
        );
    }

    #[test]
    fn generate_url_keeps_base_path() {
        let client = AgentClient::new("https://example.com/mastra/").unwrap();
        assert_eq!(
            client.generate_url("weatherAgent").unwrap().as_str(),
            "https://example.com/mastra/api/agents/weatherAgent/generate"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(AgentClient::new("http://exa mple.com").is_err());
    }

    #[test]
    fn no_reply_policy() {
        let policy = FallbackPolicy::NoReply;
        assert_eq!(policy.reply_text(&json!({"text": "Sunny"})), "Sunny");
        assert_eq!(policy.reply_text(&json!({})), "No reply");
        assert_eq!(policy.reply_text(&json!({"text": ""})), "No reply");
        assert_eq!(policy.reply_text(&json!({"text": null})), "No reply");
        assert_eq!(policy.reply_text(&json!({"text": 42})), "42");
        assert_eq!(policy.reply_text(&json!("not an object")), "No reply");
    }

    #[test]
    fn stringify_policy() {
        let policy = FallbackPolicy::Stringify;
        assert_eq!(policy.reply_text(&json!({"text": "Sunny"})), "Sunny");
        assert_eq!(policy.reply_text(&json!({})), "undefined");
        assert_eq!(policy.reply_text(&json!({"text": null})), "null");
        assert_eq!(policy.reply_text(&json!({"text": ""})), "");
        assert_eq!(policy.reply_text(&json!({"text": ["a"]})), r#"["a"]"#);
    }

    #[test]
    fn policy_parse() {
        assert_eq!(FallbackPolicy::parse("No-Reply"), Some(FallbackPolicy::NoReply));
        assert_eq!(FallbackPolicy::parse("stringify"), Some(FallbackPolicy::Stringify));
        assert_eq!(FallbackPolicy::parse("loud"), None);
    }

    #[tokio::test]
    async fn posts_user_message_and_reads_reply() {
        let (base, server) = one_shot_server(200, r#"{"text":"Sunny","usage":{}}"#);
        let client = AgentClient::new(&base).unwrap();

        let reply = client.generate("weatherAgent", "Weather in Oslo?").await.unwrap();
        assert_eq!(reply["text"], "Sunny");

        let (path, body) = server.join().unwrap();
        assert_eq!(path, "/api/agents/weatherAgent/generate");
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, generate_body("Weather in Oslo?"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, server) = one_shot_server(500, r#"{"error":"boom"}"#);
        let client = AgentClient::new(&base).unwrap();

        let err = client.generate("weatherAgent", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status code 500");
        server.join().unwrap();
    }

    #[test]
    fn empty_body_falls_back_and_null_body_fails() {
        let empty = parse_reply_body("  ").unwrap();
        assert_eq!(FallbackPolicy::NoReply.reply_text(&empty), "No reply");
        assert_eq!(FallbackPolicy::Stringify.reply_text(&empty), "undefined");

        let err = parse_reply_body("null").unwrap_err();
        assert_eq!(err.to_string(), "Cannot read properties of null (reading 'text')");
    }

    #[tokio::test]
    async fn empty_success_body_is_a_reply_without_text() {
        let (base, server) = one_shot_server(200, "");
        let client = AgentClient::new(&base).unwrap();

        let reply = client.generate("weatherAgent", "hi").await.unwrap();
        assert_eq!(FallbackPolicy::NoReply.reply_text(&reply), "No reply");
        server.join().unwrap();
    }

    #[tokio::test]
    async fn null_success_body_is_an_error() {
        let (base, server) = one_shot_server(200, "null");
        let client = AgentClient::new(&base).unwrap();

        let err = client.generate("weatherAgent", "hi").await.unwrap_err();
        assert!(err.to_string().contains("reading 'text'"));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let (base, server) = one_shot_server(200, "not json");
        let client = AgentClient::new(&base).unwrap();

        assert!(client.generate("weatherAgent", "hi").await.is_err());
        server.join().unwrap();
    }
}
