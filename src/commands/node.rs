use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::invoke::{HandlerResult, Invocation};
use crate::parser::{Directive, TriggerKeys};

/// A filter, trigger or exec handler
pub type Handler = Rc<dyn Fn(&Invocation<'_>) -> HandlerResult>;

/// A vertex in a command tree
#[derive(Default)]
pub struct CommandNode {
    pub(crate) path: Vec<String>,
    pub(crate) children: IndexMap<String, CommandNode>,
    /// Parser directives in declaration order: options, banners, dependencies
    pub(crate) calls: Vec<Directive>,
    pub(crate) description: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) params: Option<String>,
    pub(crate) header: Option<String>,
    pub(crate) filters: Vec<Handler>,
    pub(crate) triggers: IndexMap<TriggerKeys, Handler>,
    pub(crate) exec: Option<Handler>,
}

impl CommandNode {
    pub(crate) fn at(path: Vec<String>) -> Self {
        CommandNode {
            path,
            ..Default::default()
        }
    }

    /// Segments leading from the root to this node; empty for the root.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.get(name)
    }

    /// Names of the immediate subcommands, in declaration order.
    pub fn subcommands(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_subcommands(&self) -> bool {
        !self.children.is_empty()
    }

    #[must_use]
    pub fn calls(&self) -> &[Directive] {
        &self.calls
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn has_exec(&self) -> bool {
        self.exec.is_some()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("path", &self.path)
            .field("children", &self.children)
            .field("calls", &self.calls)
            .field("description", &self.description)
            .field("text", &self.text)
            .field("params", &self.params)
            .field("header", &self.header)
            .field("filters", &self.filters.len())
            .field("triggers", &self.triggers.keys().collect::<Vec<_>>())
            .field("exec", &self.exec.is_some())
            .finish()
    }
}
