//! Path resolution: walking a command tree along the argument vector and
//! collecting what every visited node passes down to its descendants.

use std::sync::LazyLock;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::commands::node::{CommandNode, Handler};
use crate::commands::registry::Registry;
use crate::config::{ConfigKey, HelpConfig};
use crate::invoke::InvokeError;
use crate::parser::{Directive, TriggerKeys};

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(" +").expect("valid regex"));

/// Declarations accumulated root to leaf while walking a path
#[derive(Default)]
struct Inheritance<'r> {
    nodes: Vec<&'r CommandNode>,
    calls: Vec<&'r Directive>,
    texts: Vec<&'r str>,
    filters: Vec<&'r Handler>,
    triggers: IndexMap<&'r TriggerKeys, &'r Handler>,
}

impl<'r> Inheritance<'r> {
    fn absorb(&mut self, node: &'r CommandNode) {
        self.nodes.push(node);
        self.calls.extend(node.calls.iter());
        self.texts.extend(node.text.as_deref());
        self.filters.extend(node.filters.iter());
        // Deeper declarations replace the handler but keep the key set's position
        for (keys, handler) in &node.triggers {
            self.triggers.insert(keys, handler);
        }
    }

    /// First declared header walking from the deepest node up.
    fn header(&self) -> Option<&'r str> {
        self.nodes
            .iter()
            .rev()
            .find_map(|node| node.header.as_deref().filter(|h| !h.is_empty()))
    }
}

/// Substitute the usage placeholders and collapse runs of spaces.
#[must_use]
pub fn usage_line(template: &str, program: &str, command: &[String], params: &str) -> String {
    let text = template
        .replace("%0", program)
        .replace("%command", &command.join(" "))
        .replace("%params", params);
    SPACE_RUNS.replace_all(&text, " ").trim_end().to_string()
}

/// A command path resolved against one scope's tree
pub struct Resolution<'r> {
    /// The deepest node reached
    pub node: &'r CommandNode,
    /// The consumed path segments
    pub command: Vec<String>,
    /// Arguments left after the path, untouched
    pub args: Vec<String>,
    /// Parser directives of every visited node, root first
    pub calls: Vec<&'r Directive>,
    /// Help text of every visited node that declared some, root first
    pub texts: Vec<&'r str>,
    pub filters: Vec<&'r Handler>,
    pub triggers: IndexMap<&'r TriggerKeys, &'r Handler>,
    /// Effective params hint, the subcommand placeholder if `node` has children
    pub params: String,
    /// Substituted usage line
    pub header: String,
}

impl Resolution<'_> {
    #[must_use]
    pub fn has_subcommands(&self) -> bool {
        self.node.has_subcommands()
    }

    pub fn subcommands(&self) -> impl Iterator<Item = &str> {
        self.node.subcommands()
    }

    #[must_use]
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

fn resolve_tree<'r>(
    root: &'r CommandNode,
    argv: &[String],
    config: &HelpConfig,
    program: &str,
) -> Resolution<'r> {
    let mut inherited = Inheritance::default();
    inherited.absorb(root);

    let mut node = root;
    let mut consumed = 0;
    while let Some(child) = argv.get(consumed).and_then(|segment| node.child(segment)) {
        node = child;
        consumed += 1;
        inherited.absorb(node);
    }
    let command = argv[..consumed].to_vec();
    let args = argv[consumed..].to_vec();

    let params = if node.has_subcommands() {
        config.text(ConfigKey::TextParamSubcommand).to_string()
    } else {
        node.params.clone().unwrap_or_default()
    };
    let template = inherited
        .header()
        .unwrap_or_else(|| config.text(ConfigKey::TextHeaderUsage));
    let header = usage_line(template, program, &command, &params);

    Resolution {
        node,
        command,
        args,
        calls: inherited.calls,
        texts: inherited.texts,
        filters: inherited.filters,
        triggers: inherited.triggers,
        params,
        header,
    }
}

impl Registry {
    /// Walk `scope`'s tree along `argv`, consuming segments while they name a
    /// child of the current node.
    ///
    /// # Errors
    ///
    /// Returns `InvokeError::ScopeNotDefined` if nothing was ever declared in `scope`.
    pub fn resolve(&self, argv: &[String], scope: &str) -> Result<Resolution<'_>, InvokeError> {
        let root = self
            .root(scope)
            .ok_or_else(|| InvokeError::ScopeNotDefined(scope.to_string()))?;
        let resolution = resolve_tree(root, argv, self.config(), &self.program_name());
        debug!(
            "Resolved '{}' in scope '{scope}' with {} remaining args",
            resolution.command_line(),
            resolution.args.len()
        );
        Ok(resolution)
    }
}
