use std::rc::Rc;

use log::{debug, warn};
use thiserror::Error;

use crate::commands::node::CommandNode;
use crate::config::{ConfigKey, HelpConfig};
use crate::invoke::{HandlerResult, Invocation};
use crate::parser::{Directive, Opt, OptSpec, TriggerKeys, Value};

/// Errors raised while declaring a command through [`CommandBuilder::action`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Unknown command action: '{0}'")]
    UnknownAction(String),
    #[error("Command action '{action}' expects {expected}")]
    MissingArgument {
        action: String,
        expected: &'static str,
    },
    #[error("Command action '{0}' takes a handler and cannot be declared by name")]
    HandlerAction(String),
}

/// Builder context bound to one node of a command tree.
///
/// Every call appends to or replaces something on the node, so the same path
/// may be declared from several places.
pub struct CommandBuilder<'a> {
    node: &'a mut CommandNode,
    config: &'a HelpConfig,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

impl<'a> CommandBuilder<'a> {
    pub(crate) fn new(node: &'a mut CommandNode, config: &'a HelpConfig) -> Self {
        CommandBuilder { node, config }
    }

    /// Path of the node being declared.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.node.path
    }

    fn display_path(&self) -> String {
        self.node.path.join(" ")
    }

    /// One-line description shown in the parent's subcommand listing.
    pub fn desc(&mut self, text: &str) -> &mut Self {
        self.node.description = Some(text.to_string());
        self
    }

    /// Free-form help text; repeated calls are joined with newlines.
    pub fn text(&mut self, text: &str) -> &mut Self {
        match &mut self.node.text {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(text);
            }
            _ => self.node.text = Some(text.to_string()),
        }
        self
    }

    /// Positional parameter hint substituted for `%params` in the usage line.
    pub fn params(&mut self, text: &str) -> &mut Self {
        self.node.params = Some(text.to_string());
        self
    }

    /// Usage line template for this node and its descendants.
    pub fn header(&mut self, template: &str) -> &mut Self {
        if self.node.header.is_some() {
            warn!("Header of command '{}' replaced", self.display_path());
        }
        self.node.header = Some(template.to_string());
        self
    }

    /// A help line placed after the option listing.
    pub fn banner(&mut self, text: &str) -> &mut Self {
        self.node.calls.push(Directive::Banner(text.to_string()));
        self
    }

    /// Declare an option. A default always wins over `required`; a required
    /// option gets the configured marker appended to its description.
    pub fn opt(&mut self, name: &str, desc: &str, mut attrs: Opt) -> &mut Self {
        // A false default is what an absent flag means anyway
        if attrs.is_required()
            && attrs
                .default_value()
                .is_some_and(|value| *value != Value::Bool(false))
        {
            debug!("Option '{name}' has a default, dropping required");
            attrs.drop_required();
        }
        let mut desc = desc.to_string();
        if attrs.is_required() {
            desc.push_str(self.config.text(ConfigKey::TextRequired));
        }
        self.node.calls.push(Directive::Opt(OptSpec {
            name: name.to_string(),
            desc,
            attrs,
        }));
        self
    }

    /// Shorthand for a boolean option.
    pub fn flag(&mut self, name: &str, desc: &str) -> &mut Self {
        self.opt(name, desc, Opt::new())
    }

    /// The named options must be given together.
    pub fn depends(&mut self, names: &[&str]) -> &mut Self {
        self.node.calls.push(Directive::Depends(owned(names)));
        self
    }

    /// At most one of the named options may be given.
    pub fn conflicts(&mut self, names: &[&str]) -> &mut Self {
        self.node.calls.push(Directive::Conflicts(owned(names)));
        self
    }

    /// Run `handler` before the exec handler of this node and every node below it.
    pub fn filter<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + 'static,
    {
        self.node.filters.push(Rc::new(handler));
        self
    }

    /// Run `handler` instead of the normal pipeline whenever one of `keys` is
    /// given. Re-declaring the same key set replaces the earlier handler.
    pub fn trigger<F>(&mut self, keys: &[&str], handler: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + 'static,
    {
        let keys: TriggerKeys = keys.iter().map(ToString::to_string).collect();
        self.node.triggers.insert(keys, Rc::new(handler));
        self
    }

    /// The handler dispatched to when this node is invoked. Last declaration wins.
    pub fn exec<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + 'static,
    {
        if self.node.exec.is_some() {
            warn!("Exec handler of command '{}' replaced", self.display_path());
        }
        self.node.exec = Some(Rc::new(handler));
        self
    }

    /// Apply an action by name, for declarations that come from data rather
    /// than code. Handler actions are recognised but must use their methods.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::UnknownAction` for a name outside the vocabulary,
    /// `BuildError::HandlerAction` for `filter`, `trigger` and `exec`, and
    /// `BuildError::MissingArgument` when `args` is too short.
    pub fn action(&mut self, name: &str, args: &[&str]) -> Result<&mut Self, BuildError> {
        let missing = |expected| BuildError::MissingArgument {
            action: name.to_string(),
            expected,
        };
        match name {
            "desc" | "text" | "params" | "header" | "banner" => {
                let [value, ..] = args else {
                    return Err(missing("a text argument"));
                };
                Ok(match name {
                    "desc" => self.desc(value),
                    "text" => self.text(value),
                    "params" => self.params(value),
                    "header" => self.header(value),
                    _ => self.banner(value),
                })
            }
            "opt" => match args {
                [option] => Ok(self.flag(option, "")),
                [option, desc, ..] => Ok(self.flag(option, desc)),
                [] => Err(missing("an option name")),
            },
            "depends" | "conflicts" => {
                if args.len() < 2 {
                    return Err(missing("at least two option names"));
                }
                Ok(if name == "depends" {
                    self.depends(args)
                } else {
                    self.conflicts(args)
                })
            }
            "filter" | "trigger" | "exec" => Err(BuildError::HandlerAction(name.to_string())),
            other => Err(BuildError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_builder(build: impl FnOnce(&mut CommandBuilder<'_>)) -> CommandNode {
        let mut node = CommandNode::at(vec!["file".to_string()]);
        let config = HelpConfig::default();
        build(&mut CommandBuilder::new(&mut node, &config));
        node
    }

    #[test]
    fn test_text_concatenates() {
        let node = with_builder(|cmd| {
            cmd.text("Verbose explanation").text("More text");
        });
        assert_eq!(node.text(), Some("Verbose explanation\nMore text"));
    }

    #[test]
    fn test_required_with_default_is_dropped() {
        let node = with_builder(|cmd| {
            cmd.opt("count", "How many", Opt::new().required().default(1))
                .opt("name", "Who", Opt::new().kind("string").required());
        });
        let Directive::Opt(count) = &node.calls()[0] else {
            panic!("Expected an option");
        };
        assert!(!count.attrs.is_required());
        assert_eq!(count.desc, "How many");
        assert_eq!(count.attrs.default_value(), Some(&Value::Int(1)));
        let Directive::Opt(name) = &node.calls()[1] else {
            panic!("Expected an option");
        };
        assert!(name.attrs.is_required());
        assert_eq!(name.desc, "Who (required)");
    }

    #[test]
    fn test_text_after_empty_text() {
        let node = with_builder(|cmd| {
            cmd.text("").text("Second block");
        });
        assert_eq!(node.text(), Some("Second block"));
    }

    #[test]
    fn test_required_with_false_default_is_kept() {
        let node = with_builder(|cmd| {
            cmd.opt("yes", "Confirm", Opt::new().required().default(false));
        });
        let Directive::Opt(yes) = &node.calls()[0] else {
            panic!("Expected an option");
        };
        assert!(yes.attrs.is_required());
        assert_eq!(yes.desc, "Confirm (required)");
    }

    #[test]
    fn test_exec_last_declaration_wins() {
        let node = with_builder(|cmd| {
            cmd.exec(|_| Ok(())).exec(|_| Err(crate::invoke::HandlerError::HelpRequested));
        });
        let exec = node.exec.as_ref().unwrap();
        let options = crate::parser::Options::default();
        let invocation = Invocation {
            command: &[],
            options: &options,
            args: &[],
        };
        assert!((exec.as_ref())(&invocation).is_err());
    }

    #[test]
    fn test_trigger_key_sets_are_unordered() {
        let node = with_builder(|cmd| {
            cmd.trigger(&["version", "foobar"], |_| Ok(()))
                .trigger(&["foobar", "version"], |_| Ok(()));
        });
        assert_eq!(node.triggers.len(), 1);
    }

    #[test]
    fn test_action_by_name() {
        let node = with_builder(|cmd| {
            cmd.action("desc", &["Operations on files"]).unwrap();
            cmd.action("opt", &["force", "Force overwrite"]).unwrap();
            cmd.action("depends", &["force", "verbose"]).unwrap();
        });
        assert_eq!(node.description(), Some("Operations on files"));
        assert_eq!(node.calls().len(), 2);
    }

    #[test]
    fn test_unknown_action_is_named() {
        with_builder(|cmd| {
            let err = cmd.action("non_existing_command", &[]).err().unwrap();
            assert_eq!(err.to_string(), "Unknown command action: 'non_existing_command'");
            assert_eq!(
                cmd.action("exec", &[]).err(),
                Some(BuildError::HandlerAction("exec".into()))
            );
            assert!(matches!(
                cmd.action("text", &[]).err(),
                Some(BuildError::MissingArgument { .. })
            ));
        });
    }
}
