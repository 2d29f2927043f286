use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// Top-level `mcp-config.json` document.
///
/// `mcp_servers` is `None` when the key is absent so that validation can tell
/// a missing section apart from an empty one.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct McpConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: Option<BTreeMap<String, ServerDescriptor>>,
}

/// One entry of the `mcpServers` section.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ServerDescriptor {
    #[serde(default)]
    pub command: Option<CommandSpec>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// `command` may be a bare executable or a full argv.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CommandSpec {
    Program(String),
    Argv(Vec<String>),
}

/// Normalized launch parameters for one provider process.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerParams {
    pub server: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl McpConfig {
    /// Parse a config file, failing on I/O or JSON errors.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let txt = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&txt)?)
    }

    /// Parse a config file, degrading to an empty server section on failure.
    ///
    /// The error is logged; [`McpConfig::validate`] rejects the result later.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(
                    name: "mcp.config.load_failed",
                    path = %path.display(),
                    error = %e,
                    "Failed to load MCP configuration"
                );
                Self::empty()
            }
        }
    }

    /// A config with a present but empty `mcpServers` section.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            mcp_servers: Some(BTreeMap::new()),
        }
    }

    /// Check that at least one server is configured.
    pub fn validate(&self) -> Result<()> {
        match &self.mcp_servers {
            None => Err(Error::InvalidConfig(
                "missing 'mcpServers' section".to_string(),
            )),
            Some(servers) if servers.is_empty() => Err(Error::InvalidConfig(
                "no MCP servers are configured".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.mcp_servers
            .iter()
            .flat_map(|servers| servers.keys().map(String::as_str))
            .collect()
    }

    pub fn descriptor(&self, name: &str) -> Option<&ServerDescriptor> {
        self.mcp_servers.as_ref()?.get(name)
    }

    /// Resolve launch parameters for a named server.
    pub fn server_params(&self, name: &str) -> Result<ServerParams> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| Error::UnknownServer(name.to_string()))?;
        ServerParams::from_descriptor(name, descriptor)
    }
}

impl ServerParams {
    /// Split an argv-style command into program and leading arguments.
    ///
    /// `["python", "server.py"]` with `args = ["--verbose"]` yields program
    /// `python` and args `["server.py", "--verbose"]`.
    pub fn from_descriptor(name: &str, descriptor: &ServerDescriptor) -> Result<Self> {
        let missing = || Error::MissingCommand(name.to_string());

        let (program, mut args) = match descriptor.command.as_ref().ok_or_else(missing)? {
            CommandSpec::Program(program) => (program.clone(), Vec::new()),
            CommandSpec::Argv(argv) => {
                let (head, rest) = argv.split_first().ok_or_else(missing)?;
                (head.clone(), rest.to_vec())
            }
        };
        if program.trim().is_empty() {
            return Err(missing());
        }
        args.extend(descriptor.args.iter().cloned());

        Ok(Self {
            server: name.to_string(),
            program,
            args,
            cwd: descriptor.cwd.clone(),
            env: expand_env_map(&descriptor.env),
        })
    }

    /// Human-readable command line, for the launch preview.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the child-process command.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env).kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

/// Expand "${VAR}" placeholders from the process environment.
///
/// Missing variables leave the placeholder unchanged.
pub fn expand_env_placeholders(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                match std::env::var(var) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => out.push_str(&rest[start..start + 3 + end]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn expand_env_map(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), expand_env_placeholders(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(json: &str) -> McpConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn missing_section_is_invalid() {
        let cfg = parse("{}");
        assert!(cfg.mcp_servers.is_none());
        assert!(!cfg.is_valid());
    }

    #[test]
    fn empty_section_is_invalid() {
        let cfg = parse(r#"{"mcpServers":{}}"#);
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn single_server_is_valid() {
        let cfg = parse(r#"{"mcpServers":{"demo":{"command":"echo","args":["hi"]}}}"#);
        assert!(cfg.is_valid());
        assert_eq!(cfg.server_names(), vec!["demo"]);

        let params = cfg.server_params("demo").unwrap();
        assert_eq!(params.program, "echo");
        assert_eq!(params.args, vec!["hi"]);
        assert_eq!(params.cwd, None);
    }

    #[test]
    fn argv_command_is_split_before_args() {
        let cfg = parse(
            r#"{"mcpServers":{"py":{"command":["python","server.py","--stdio"],"args":["-v","--port","0"],"cwd":"/srv"}}}"#,
        );
        let params = cfg.server_params("py").unwrap();
        assert_eq!(params.program, "python");
        assert_eq!(params.args, vec!["server.py", "--stdio", "-v", "--port", "0"]);
        assert_eq!(params.cwd, Some(PathBuf::from("/srv")));
        assert_eq!(params.command_line(), "python server.py --stdio -v --port 0");
    }

    #[test]
    fn single_element_argv_keeps_args() {
        let cfg = parse(r#"{"mcpServers":{"a":{"command":["node"],"args":["index.js"]}}}"#);
        let params = cfg.server_params("a").unwrap();
        assert_eq!(params.program, "node");
        assert_eq!(params.args, vec!["index.js"]);
    }

    #[test]
    fn missing_or_blank_command_fails() {
        let cfg = parse(
            r#"{"mcpServers":{"none":{"args":["x"]},"blank":{"command":"  "},"empty":{"command":[]}}}"#,
        );
        for name in ["none", "blank", "empty"] {
            assert!(
                matches!(cfg.server_params(name), Err(Error::MissingCommand(n)) if n == name),
                "{name} should have no command"
            );
        }
    }

    #[test]
    fn unknown_server_fails() {
        let cfg = parse(r#"{"mcpServers":{"demo":{"command":"echo"}}}"#);
        assert!(matches!(
            cfg.server_params("other"),
            Err(Error::UnknownServer(_))
        ));
    }

    #[test]
    fn load_or_empty_degrades_on_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let cfg = McpConfig::load_or_empty(file.path());
        assert_eq!(cfg, McpConfig::empty());
        assert!(!cfg.is_valid());
    }

    #[test]
    fn load_or_empty_degrades_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = McpConfig::load_or_empty(dir.path().join("absent.json"));
        assert_eq!(cfg, McpConfig::empty());
    }

    #[test]
    fn env_placeholders_expand() {
        // PATH is present in any test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_placeholders("${PATH}:/extra"), format!("{path}:/extra"));
        assert_eq!(
            expand_env_placeholders("${MCP_DISPATCH_SURELY_UNSET_VAR}"),
            "${MCP_DISPATCH_SURELY_UNSET_VAR}"
        );
        assert_eq!(expand_env_placeholders("plain ${open"), "plain ${open");
    }
}
