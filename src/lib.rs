//! Core implementation of cmdtree, a declarative command tree framework
//!
//! Applications declare nested commands with options, help text and handlers
//! in a [`Registry`], then hand it the command line. The registry resolves the
//! longest matching command path, parses the remaining arguments against the
//! options inherited along that path and dispatches to triggers, filters and
//! the exec handler, or renders a help screen.

pub mod commands;
pub mod config;
pub mod help;
pub mod invoke;
pub mod logger;
pub mod parser;

pub use commands::builder::{BuildError, CommandBuilder};
pub use commands::registry::{DEFAULT_SCOPE, Registry};
pub use config::{ConfigError, ConfigKey, HelpConfig};
pub use invoke::{HandlerError, HandlerResult, InvokeError, Invocation, Outcome};
pub use parser::{Opt, OptType, Options, ParseError, SpecError, Value};
