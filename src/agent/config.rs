//! Agent registry — loading declarations, lookup, and name uniqueness.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::{AGENTS_FILE, APP_NAME};
use crate::util::env_first;

use super::AgentConfig;

/// On-disk shape of `agents.json`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct AgentsFile {
    agents: Vec<AgentConfig>,
}

/// The set of declared agents, keyed by unique name.
#[derive(Clone, Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<AgentConfig>,
}

/// Where the agent declarations were loaded from.
#[derive(Clone, Debug)]
pub enum AgentSource {
    Embedded,
    File(PathBuf),
}

impl AgentSource {
    pub fn label(&self) -> String {
        match self {
            AgentSource::Embedded => "embedded defaults".to_string(),
            AgentSource::File(path) => path.display().to_string(),
        }
    }
}

impl AgentRegistry {
    /// Load declarations from `$AGENTCHAT_AGENTS_JSON`, `./agents.json`,
    /// the user config directory, or the embedded defaults, in that order.
    pub fn load() -> Result<(Self, AgentSource)> {
        let env_path = env_first(&["AGENTCHAT_AGENTS_JSON"]).map(PathBuf::from);
        Self::load_from_sources(
            env_path,
            &PathBuf::from(AGENTS_FILE),
            config_dir_file(AGENTS_FILE),
        )
    }

    /// Resolve declarations against explicit candidate locations.
    ///
    /// An explicit path must exist; the others are skipped when absent.
    fn load_from_sources(
        env_path: Option<PathBuf>,
        cwd_path: &Path,
        config_path: Option<PathBuf>,
    ) -> Result<(Self, AgentSource)> {
        if let Some(path) = env_path {
            return Ok((Self::load_from_path(&path)?, AgentSource::File(path)));
        }

        if cwd_path.exists() {
            let path = cwd_path.to_path_buf();
            return Ok((Self::load_from_path(&path)?, AgentSource::File(path)));
        }

        if let Some(config_path) = config_path {
            if config_path.exists() {
                return Ok((
                    Self::load_from_path(&config_path)?,
                    AgentSource::File(config_path),
                ));
            }
        }

        Ok((Self::embedded()?, AgentSource::Embedded))
    }

    /// The declarations compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(include_str!("../../agents.json")).context("parse embedded agents.json")
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read agent declarations from {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("parse agent declarations from {}", path.display()))
    }

    fn from_json(contents: &str) -> Result<Self> {
        let file: AgentsFile = serde_json::from_str(contents)?;
        let mut registry = AgentRegistry::default();
        for agent in file.agents {
            registry.register(agent)?;
        }
        Ok(registry)
    }

    /// Register an agent under its name.  Names must be unique.
    pub fn register(&mut self, agent: AgentConfig) -> Result<()> {
        if agent.name.trim().is_empty() {
            return Err(anyhow!("agent name must not be empty"));
        }
        if self.get(&agent.name).is_some() {
            return Err(anyhow!("agent '{}' is declared more than once", agent.name));
        }
        self.agents.push(agent);
        Ok(())
    }

    /// Exact-name lookup, as the runtime routes requests.
    pub fn get(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    /// Case-insensitive lookup for user-typed names.
    pub fn find(&self, query: &str) -> Option<&AgentConfig> {
        self.get(query).or_else(|| {
            let query = query.to_lowercase();
            self.agents
                .iter()
                .find(|agent| agent.name.to_lowercase() == query)
        })
    }

    pub fn agents(&self) -> &[AgentConfig] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn config_dir_file(filename: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", APP_NAME, APP_NAME)?;
    Some(proj_dirs.config_dir().join(filename))
}
