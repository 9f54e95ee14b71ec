use std::io::{self, Write};
use std::process::ExitCode;

use log::{debug, info};
use thiserror::Error;

use crate::commands::node::Handler;
use crate::commands::registry::Registry;
use crate::help;
use crate::parser::{OptionParser, Options, ParseOutcome, SpecError, TriggerKeys};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a filter, trigger or exec handler sees
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Resolved command path
    pub command: &'a [String],
    pub options: &'a Options,
    /// Positional arguments left after the path and the options
    pub args: &'a [String],
}

impl Invocation<'_> {
    #[must_use]
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    /// Stop here and show the help screen of the resolved command
    #[error("Help requested")]
    HelpRequested,
    #[error("{0}")]
    Failed(BoxError),
}

impl HandlerError {
    pub fn failed(err: impl Into<BoxError>) -> Self {
        HandlerError::Failed(err.into())
    }
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        HandlerError::Failed(err)
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// Failures that point at a mistake in the command declarations or in a
/// handler, as opposed to a mistake on the command line.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("Scope '{0}' is not defined")]
    ScopeNotDefined(String),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("Command '{0}' has no exec handler")]
    MissingExec(String),
    #[error("Command '{command}' failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: BoxError,
    },
}

/// How an invocation ended when nothing was fatally wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The exec handler ran
    Dispatched,
    /// A trigger ran in place of the exec handler
    Triggered,
    /// The rendered help screen
    Help(String),
    /// A command line diagnostic
    Invalid(String),
}

impl Outcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Invalid(_))
    }

    /// Write help to `out` or the diagnostic to `err` and pick the exit code.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to the streams.
    pub fn emit(&self, out: &mut impl Write, err: &mut impl Write) -> io::Result<ExitCode> {
        match self {
            Outcome::Dispatched | Outcome::Triggered => Ok(ExitCode::SUCCESS),
            Outcome::Help(text) => {
                out.write_all(text.as_bytes())?;
                out.flush()?;
                Ok(ExitCode::SUCCESS)
            }
            Outcome::Invalid(message) => {
                writeln!(err, "Error: {message}")?;
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// Call a handler. `Ok(true)` means it asked for the help screen.
fn run_handler(handler: &Handler, invocation: &Invocation<'_>) -> Result<bool, InvokeError> {
    match (handler.as_ref())(invocation) {
        Ok(()) => Ok(false),
        Err(HandlerError::HelpRequested) => Ok(true),
        Err(HandlerError::Failed(source)) => Err(InvokeError::Handler {
            command: invocation.command_line(),
            source,
        }),
    }
}

impl Registry {
    /// Resolve `argv` in `scope`, parse the remaining arguments and run the
    /// matching trigger, or the filter chain followed by the exec handler.
    ///
    /// Command line mistakes and help requests are outcomes, not errors.
    ///
    /// # Errors
    ///
    /// Returns `InvokeError` for an undeclared scope, an invalid option
    /// declaration, a leaf without exec handler or a failing handler.
    pub fn invoke(&self, argv: &[String], scope: &str) -> Result<Outcome, InvokeError> {
        let resolution = self.resolve(argv, scope)?;
        let directives = help::assemble(&resolution, self.config());
        let parser = OptionParser::build(directives)?;

        let trigger_keys: Vec<&TriggerKeys> = resolution.triggers.keys().copied().collect();
        let outcome = match parser.parse(&resolution.args, &trigger_keys) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!("Rejected arguments of '{}': {err}", resolution.command_line());
                return Ok(Outcome::Invalid(err.to_string()));
            }
        };

        let (options, args) = match outcome {
            ParseOutcome::HelpRequested => return Ok(Outcome::Help(parser.help())),
            ParseOutcome::Triggered {
                index,
                options,
                args,
            } => {
                let Some((keys, handler)) = resolution.triggers.get_index(index) else {
                    return Ok(Outcome::Triggered);
                };
                info!("Running trigger {keys:?} of '{}'", resolution.command_line());
                let invocation = Invocation {
                    command: &resolution.command,
                    options: &options,
                    args: &args,
                };
                if run_handler(handler, &invocation)? {
                    return Ok(Outcome::Help(parser.help()));
                }
                return Ok(Outcome::Triggered);
            }
            ParseOutcome::Parsed { options, args } => (options, args),
        };

        if resolution.has_subcommands() {
            return Ok(Outcome::Help(parser.help()));
        }

        let invocation = Invocation {
            command: &resolution.command,
            options: &options,
            args: &args,
        };
        for filter in &resolution.filters {
            if run_handler(filter, &invocation)? {
                debug!("Filter of '{}' requested help", resolution.command_line());
                return Ok(Outcome::Help(parser.help()));
            }
        }

        let Some(exec) = &resolution.node.exec else {
            return Err(InvokeError::MissingExec(resolution.command_line()));
        };
        debug!("Dispatching '{}'", resolution.command_line());
        if run_handler(exec, &invocation)? {
            return Ok(Outcome::Help(parser.help()));
        }
        Ok(Outcome::Dispatched)
    }

    /// Invoke with the process arguments and report on stdout/stderr.
    #[must_use]
    pub fn run(&self, scope: &str) -> ExitCode {
        let argv: Vec<String> = std::env::args_os()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        let outcome = match self.invoke(&argv, scope) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        };
        match outcome.emit(&mut io::stdout().lock(), &mut io::stderr().lock()) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        }
    }
}
