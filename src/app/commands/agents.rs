//! `/agent` command handlers — list, inspect, and switch declared agents.

use super::super::App;
use super::super::log_src;
use super::super::logging::LogLevel;

impl App {
    pub(crate) fn handle_agent_command(&mut self, args: Vec<&str>) {
        if args.is_empty() {
            self.list_agents();
            return;
        }

        match args[0] {
            "list" | "ls" => self.list_agents(),
            "info" => {
                let name = args
                    .get(1)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| self.active_agent.clone());
                self.show_agent_info(&name);
            }
            "use" | "switch" => match args.get(1) {
                Some(name) => self.use_agent(name),
                None => log_src!(self, LogLevel::Warn, "Usage: /agent use <name>".to_string()),
            },
            other => log_src!(
                self,
                LogLevel::Warn,
                format!("Unknown /agent command: {other}")
            ),
        }
    }

    fn list_agents(&mut self) {
        if self.registry.is_empty() {
            self.log(LogLevel::Info, "No agents declared.".to_string());
            return;
        }
        let lines: Vec<String> = self
            .registry
            .agents()
            .iter()
            .map(|agent| {
                let marker = if agent.name == self.active_agent { "▶" } else { " " };
                format!("{marker} {} ({})", agent.name, agent.model)
            })
            .collect();
        self.log(
            LogLevel::Info,
            format!("Agents from {}:", self.agent_source.label()),
        );
        for line in lines {
            self.log(LogLevel::Info, line);
        }
    }

    fn show_agent_info(&mut self, name: &str) {
        let Some(agent) = self.registry.find(name).cloned() else {
            log_src!(self, LogLevel::Warn, format!("Unknown agent: {name}"));
            return;
        };

        self.log(LogLevel::Info, format!("Agent:   {}", agent.name));
        self.log(LogLevel::Info, format!("Model:   {}", agent.model));
        self.log(
            LogLevel::Info,
            format!("Memory:  {}", agent.memory.storage.label()),
        );
        if let Some(path) = agent.memory.storage.database_path() {
            self.log(LogLevel::Info, format!("DB file: {}", path.display()));
        }
        self.log(LogLevel::Info, "Instructions:".to_string());
        for line in agent.instructions_lines() {
            self.log(LogLevel::Info, format!("  {line}"));
        }
    }

    fn use_agent(&mut self, name: &str) {
        let Some(agent) = self.registry.find(name) else {
            log_src!(self, LogLevel::Warn, format!("Unknown agent: {name}"));
            return;
        };
        self.active_agent = agent.name.clone();
        let endpoint = self.endpoint_label();
        self.log(
            LogLevel::Info,
            format!("Now talking to {} at {endpoint}.", self.active_agent),
        );
    }
}
