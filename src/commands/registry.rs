use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::commands::builder::CommandBuilder;
use crate::commands::node::CommandNode;
use crate::config::{ConfigError, HelpConfig};

/// Scope used when none is named
pub const DEFAULT_SCOPE: &str = "default";

/// Independent command trees keyed by scope, plus the help configuration
/// they are rendered with.
///
/// Handlers are reference counted without synchronisation, so a registry
/// stays on the thread that built it.
#[derive(Debug, Default)]
pub struct Registry {
    scopes: IndexMap<String, CommandNode>,
    config: HelpConfig,
    program_name: Option<String>,
}

/// Find or create the node at a space-delimited path.
fn node_mut<'a>(root: &'a mut CommandNode, path: &str) -> &'a mut CommandNode {
    let mut node = root;
    for segment in path.split_whitespace() {
        let mut child_path = node.path.clone();
        child_path.push(segment.to_string());
        node = node
            .children
            .entry(segment.to_string())
            .or_insert_with(|| CommandNode::at(child_path));
    }
    node
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Registry::default()
    }

    #[must_use]
    pub fn config(&self) -> &HelpConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut HelpConfig {
        &mut self.config
    }

    /// Set a configuration value by key name.
    ///
    /// Labels such as the required marker are applied when options are
    /// declared, so configure before declaring commands.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for keys outside the recognised set.
    pub fn configure(&mut self, key: &str, value: Option<&str>) -> Result<&mut Self, ConfigError> {
        self.config.set(key, value)?;
        Ok(self)
    }

    /// Apply configuration overrides from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// See [`HelpConfig::from_file`].
    pub fn configure_from_file(&mut self, file: &Path) -> Result<&mut Self, ConfigError> {
        self.config.merge_file(file)?;
        Ok(self)
    }

    /// Declare (or extend) the command at `path` in the default scope.
    pub fn command<R>(&mut self, path: &str, build: impl FnOnce(&mut CommandBuilder<'_>) -> R) -> R {
        self.command_in(DEFAULT_SCOPE, path, build)
    }

    /// Declare (or extend) the command at `path` in `scope`, creating the
    /// scope and any intermediate nodes on the way.
    pub fn command_in<R>(
        &mut self,
        scope: &str,
        path: &str,
        build: impl FnOnce(&mut CommandBuilder<'_>) -> R,
    ) -> R {
        debug!("Declaring command '{path}' in scope '{scope}'");
        let root = self.scopes.entry(scope.to_string()).or_default();
        let node = node_mut(root, path);
        let mut builder = CommandBuilder::new(node, &self.config);
        build(&mut builder)
    }

    /// Give the prefixes of `path` one-line descriptions, shortest first.
    /// Prefixes beyond the last label are not declared.
    pub fn label_path(&mut self, scope: &str, path: &str, labels: &[&str]) {
        let segments: Vec<&str> = path.split_whitespace().collect();
        for (i, label) in labels.iter().enumerate().take(segments.len()) {
            let prefix = segments[..=i].join(" ");
            self.command_in(scope, &prefix, |cmd| {
                cmd.desc(label);
            });
        }
    }

    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains_key(scope)
    }

    #[must_use]
    pub fn root(&self, scope: &str) -> Option<&CommandNode> {
        self.scopes.get(scope)
    }

    /// The node at `path` in `scope`, if it was declared.
    #[must_use]
    pub fn node(&self, scope: &str, path: &str) -> Option<&CommandNode> {
        path.split_whitespace()
            .try_fold(self.root(scope)?, |node, segment| node.child(segment))
    }

    /// Drop one scope's tree. Returns whether it existed.
    pub fn reset_scope(&mut self, scope: &str) -> bool {
        self.scopes.shift_remove(scope).is_some()
    }

    /// Drop every tree and restore the default configuration.
    pub fn reset_all(&mut self) {
        self.scopes.clear();
        self.config = HelpConfig::default();
    }

    /// Name substituted for `%0` in usage lines.
    pub fn set_program_name(&mut self, name: &str) -> &mut Self {
        self.program_name = Some(name.to_string());
        self
    }

    /// The configured program name, or the file name of the running executable.
    #[must_use]
    pub fn program_name(&self) -> String {
        if let Some(name) = &self.program_name {
            return name.clone();
        }
        std::env::args_os()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_default()
    }
}
