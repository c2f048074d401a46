//! Agent declarations — the configuration an external agent runtime loads
//! and serves under a name.
//!
//! A declaration carries the agent's name, its instructions, the model it
//! runs on, and the memory store the runtime persists conversation history
//! into.  This crate never runs the agent itself; it only declares it and
//! uses the name to address the runtime over HTTP.

pub mod config;

use std::fmt;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Provider assumed when a model id carries no `provider/` prefix.
const DEFAULT_MODEL_PROVIDER: &str = "openai";

/// A declared, invocable agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name the runtime registers the agent under (e.g. "weatherAgent").
    pub name: String,
    /// System instructions handed to the model.
    pub instructions: String,
    /// Model the runtime invokes.
    pub model: ModelRef,
    /// Memory store backing the agent's conversation history.
    pub memory: MemoryConfig,
}

impl AgentConfig {
    /// Instructions with per-line indentation stripped, for display.
    pub fn instructions_lines(&self) -> Vec<String> {
        self.instructions
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A `provider/model` pair such as `openai/gpt-4o-mini`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelRef {
    pub provider: String,
    pub id: String,
}

impl ModelRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (provider, id) = match raw.split_once('/') {
            Some((provider, id)) => (provider.trim(), id.trim()),
            None => (DEFAULT_MODEL_PROVIDER, raw),
        };
        if provider.is_empty() || id.is_empty() {
            return Err(anyhow!("invalid model reference '{raw}'"));
        }
        Ok(ModelRef {
            provider: provider.to_string(),
            id: id.to_string(),
        })
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.id)
    }
}

impl TryFrom<String> for ModelRef {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        ModelRef::parse(&value)
    }
}

impl From<ModelRef> for String {
    fn from(value: ModelRef) -> Self {
        value.to_string()
    }
}

/// Memory configuration handed to the runtime.  Opaque beyond its storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub storage: StorageConfig,
}

/// Storage backend for agent memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Embedded libSQL database, addressed by URL (`file:<path>` for local files).
    Libsql { url: String },
}

impl StorageConfig {
    pub fn label(&self) -> String {
        match self {
            StorageConfig::Libsql { url } => format!("libsql ({url})"),
        }
    }

    /// Local database file path, when the store is file-backed.
    pub fn database_path(&self) -> Option<PathBuf> {
        match self {
            StorageConfig::Libsql { url } => url
                .strip_prefix("file:")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_ref_splits_provider() {
        let model = ModelRef::parse("openai/gpt-4o-mini").unwrap();
        assert_eq!(model.provider, "openai");
        assert_eq!(model.id, "gpt-4o-mini");
        assert_eq!(model.to_string(), "openai/gpt-4o-mini");
    }

    #[test]
    fn bare_model_id_defaults_provider() {
        let model = ModelRef::parse("gpt-4o-mini").unwrap();
        assert_eq!(model.provider, "openai");
        assert_eq!(model.id, "gpt-4o-mini");
    }

    #[test]
    fn rejects_empty_model_parts() {
        assert!(ModelRef::parse("openai/").is_err());
        assert!(ModelRef::parse("").is_err());
    }

    #[test]
    fn declaration_round_trips_registration_shape() {
        let value = json!({
            "name": "weatherAgent",
            "instructions": "  Be helpful.\n  Be concise.\n",
            "model": "openai/gpt-4o-mini",
            "memory": { "storage": { "type": "libsql", "url": "file:../mastra.db" } }
        });
        let agent: AgentConfig = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(agent.name, "weatherAgent");
        assert_eq!(agent.instructions_lines(), vec!["Be helpful.", "Be concise."]);
        assert_eq!(serde_json::to_value(&agent).unwrap(), value);
    }

    #[test]
    fn file_url_yields_database_path() {
        let storage = StorageConfig::Libsql {
            url: "file:../mastra.db".to_string(),
        };
        assert_eq!(storage.database_path(), Some(PathBuf::from("../mastra.db")));

        let remote = StorageConfig::Libsql {
            url: "libsql://db.example.com".to_string(),
        };
        assert_eq!(remote.database_path(), None);
    }
}
