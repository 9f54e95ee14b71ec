//! Option parsing for a resolved command
//!
//! The parser is fed an ordered list of [`Directive`]s (banners and option
//! declarations) and uses them twice: to match the remaining argument vector
//! with clap, and to render the help screen in exactly the declared order.
//! clap only tokenizes; typing, triggers and validation happen here so that a
//! firing trigger can short-circuit before any value or requirement check.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches};
use log::debug;
use thiserror::Error;

pub mod spec;
pub mod value;

pub use spec::{Opt, OptSpec, OptType};
pub use value::{Options, Value};

use spec::{ResolvedOpt, is_valid_short};

/// Name of the option every help screen offers unless disabled.
pub const HELP_OPTION: &str = "help";

const POSITIONAL: &str = "[args]";

/// Option keys a trigger is bound to; it fires when any of them is given
pub type TriggerKeys = BTreeSet<String>;

/// Errors in the declared option specs. These are programming mistakes in a
/// command tree and are never shown as usage errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("unsupported argument type '{0}'")]
    UnsupportedType(String),
    #[error("type specification and default type don't match for option '{0}'")]
    TypeMismatch(String),
    #[error("invalid option name '{0}'")]
    InvalidOptionName(String),
    #[error("invalid long option name {0:?}")]
    InvalidLongName(String),
    #[error("invalid short option name '{0:?}'")]
    InvalidShortName(String),
    #[error("you already have an argument named '{0}'")]
    DuplicateOption(String),
    #[error("long option name {0:?} is already taken")]
    DuplicateLong(String),
    #[error("short option name '{0}' is already taken")]
    DuplicateShort(char),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

/// Errors in the user's command line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid argument syntax: '{0}'")]
    Syntax(String),
    #[error("unknown argument '{0}'")]
    Unknown(String),
    #[error("option '{0}' specified multiple times")]
    Duplicate(String),
    #[error("option '{0}' needs a value")]
    MissingValue(String),
    #[error("option '{option}' needs {expected}, got '{value}'")]
    InvalidValue {
        option: String,
        expected: &'static str,
        value: String,
    },
    #[error("option {0} must be specified")]
    MissingRequired(String),
    #[error("{option} requires {required}")]
    Requires { option: String, required: String },
    #[error("{option} conflicts with {other}")]
    Conflicts { option: String, other: String },
    #[error("{0}")]
    Other(String),
}

impl From<clap::Error> for ParseError {
    fn from(err: clap::Error) -> Self {
        let arg = match err.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(s)) => s.split_whitespace().next().unwrap_or_default().to_string(),
            _ => String::new(),
        };
        match err.kind() {
            ErrorKind::UnknownArgument => ParseError::Unknown(arg),
            ErrorKind::InvalidValue
            | ErrorKind::NoEquals
            | ErrorKind::WrongNumberOfValues
            | ErrorKind::TooFewValues => ParseError::MissingValue(arg),
            ErrorKind::ArgumentConflict => ParseError::Duplicate(arg),
            _ => {
                let rendered = err.to_string();
                let first = rendered.lines().next().unwrap_or_default();
                ParseError::Other(first.trim_start_matches("error: ").to_string())
            }
        }
    }
}

/// A single instruction for the parser builder
#[derive(Debug, Clone)]
pub enum Directive {
    /// Help text line emitted verbatim
    Nowrap(String),
    /// Help text line
    Banner(String),
    Opt(OptSpec),
    /// The named options must be given together
    Depends(Vec<String>),
    /// At most one of the named options may be given
    Conflicts(Vec<String>),
}

impl Directive {
    #[must_use]
    pub fn is_opt(&self) -> bool {
        matches!(self, Directive::Opt(_))
    }

    #[must_use]
    pub fn opt_name(&self) -> Option<&str> {
        match self {
            Directive::Opt(spec) => Some(&spec.name),
            _ => None,
        }
    }
}

/// What the parser concluded about an argument vector
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed {
        options: Options,
        args: Vec<String>,
    },
    /// The help option was given
    HelpRequested,
    /// The trigger at `index` matched; `options` holds what could be typed so far
    Triggered {
        index: usize,
        options: Options,
        args: Vec<String>,
    },
}

#[derive(Debug, Clone)]
enum Line {
    Text(String),
    Opt(usize),
}

/// Parser for one resolved command, built from its directive sequence
#[derive(Debug, Clone)]
pub struct OptionParser {
    lines: Vec<Line>,
    opts: Vec<ResolvedOpt>,
    index: HashMap<String, usize>,
    depends: Vec<Vec<String>>,
    conflicts: Vec<Vec<String>>,
    command: clap::Command,
}

impl OptionParser {
    /// Build a parser from an ordered directive sequence.
    ///
    /// # Errors
    ///
    /// Returns `SpecError` if an option has an unsupported type, an invalid or
    /// duplicate spelling, or a dependency names an undeclared option.
    pub fn build(directives: impl IntoIterator<Item = Directive>) -> Result<Self, SpecError> {
        let mut lines = Vec::new();
        let mut opts: Vec<ResolvedOpt> = Vec::new();
        let mut index = HashMap::new();
        let mut depends = Vec::new();
        let mut conflicts = Vec::new();

        for directive in directives {
            match directive {
                Directive::Nowrap(text) | Directive::Banner(text) => lines.push(Line::Text(text)),
                Directive::Opt(spec) => {
                    let resolved = spec.resolve()?;
                    if index.insert(resolved.name.clone(), opts.len()).is_some() {
                        return Err(SpecError::DuplicateOption(resolved.name));
                    }
                    lines.push(Line::Opt(opts.len()));
                    opts.push(resolved);
                }
                Directive::Depends(names) => depends.push(names),
                Directive::Conflicts(names) => conflicts.push(names),
            }
        }

        for name in depends.iter().chain(conflicts.iter()).flatten() {
            if !index.contains_key(name) {
                return Err(SpecError::UnknownOption(name.clone()));
            }
        }
        check_longs(&opts)?;
        assign_shorts(&mut opts)?;

        let command = clap_command(&opts);
        debug!("Built option parser with {} options", opts.len());
        Ok(OptionParser {
            lines,
            opts,
            index,
            depends,
            conflicts,
            command,
        })
    }

    /// Names of the declared options in help order.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.opts.iter().map(|o| o.name.as_str())
    }

    /// Short flag assigned to an option, if any.
    #[must_use]
    pub fn short_of(&self, name: &str) -> Option<char> {
        self.index.get(name).and_then(|&i| self.opts[i].short)
    }

    /// Parse `argv`, firing the first trigger whose keys were given.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for malformed, unknown, duplicated, mistyped,
    /// missing or conflicting options.
    pub fn parse(&self, argv: &[String], triggers: &[&TriggerKeys]) -> Result<ParseOutcome, ParseError> {
        if let Some(bad) = argv
            .iter()
            .take_while(|a| a.as_str() != "--")
            .find(|a| a.starts_with("---"))
        {
            return Err(ParseError::Syntax(bad.clone()));
        }

        let matches = self.command.clone().try_get_matches_from(argv)?;
        let given = self.given(&matches)?;
        if given.contains(HELP_OPTION) {
            return Ok(ParseOutcome::HelpRequested);
        }

        let args: Vec<String> = matches
            .get_many::<String>(POSITIONAL)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        if let Some(index) = triggers
            .iter()
            .position(|keys| keys.iter().any(|k| given.contains(k.as_str())))
        {
            debug!("Trigger {:?} matched", triggers[index]);
            let options = self.values(&matches, &given, true)?;
            return Ok(ParseOutcome::Triggered {
                index,
                options,
                args,
            });
        }

        let options = self.values(&matches, &given, false)?;
        self.validate(&given)?;
        Ok(ParseOutcome::Parsed { options, args })
    }

    fn given(&self, matches: &ArgMatches) -> Result<HashSet<&str>, ParseError> {
        let mut given = HashSet::new();
        for opt in &self.opts {
            let count = if opt.ty == OptType::Boolean {
                usize::from(matches.get_count(&opt.name))
            } else {
                matches
                    .get_occurrences::<String>(&opt.name)
                    .map_or(0, Iterator::count)
            };
            if count > 1 && !opt.multi {
                return Err(ParseError::Duplicate(opt.flag()));
            }
            if count > 0 {
                given.insert(opt.name.as_str());
            }
        }
        Ok(given)
    }

    fn values(
        &self,
        matches: &ArgMatches,
        given: &HashSet<&str>,
        lenient: bool,
    ) -> Result<Options, ParseError> {
        let mut options = Options::default();
        for opt in &self.opts {
            let is_given = given.contains(opt.name.as_str());
            if opt.ty == OptType::Boolean {
                let value = if is_given {
                    !opt.negated
                } else {
                    opt.default.as_ref().and_then(Value::as_bool).unwrap_or(false)
                };
                options.insert(&opt.name, Value::Bool(value));
                continue;
            }
            if !is_given {
                if let Some(default) = &opt.default {
                    options.insert(&opt.name, default.clone());
                }
                continue;
            }
            let raw: Vec<&String> = matches
                .get_occurrences::<String>(&opt.name)
                .map(|occurrences| occurrences.flatten().collect())
                .unwrap_or_default();
            match convert(opt.ty, opt.ty.is_list() || opt.multi, &raw) {
                Ok(value) => options.insert(&opt.name, value),
                Err(_) if lenient => {}
                Err(bad) => {
                    return Err(ParseError::InvalidValue {
                        option: opt.flag(),
                        expected: opt.ty.describe(),
                        value: bad,
                    });
                }
            }
        }
        Ok(options)
    }

    fn flag_of(&self, name: &str) -> String {
        self.index
            .get(name)
            .map_or_else(|| format!("--{name}"), |&i| self.opts[i].flag())
    }

    fn validate(&self, given: &HashSet<&str>) -> Result<(), ParseError> {
        for opt in &self.opts {
            if opt.required && !given.contains(opt.name.as_str()) {
                return Err(ParseError::MissingRequired(opt.flag()));
            }
        }
        for group in &self.depends {
            for option in group.iter().filter(|n| given.contains(n.as_str())) {
                if let Some(required) = group.iter().find(|n| !given.contains(n.as_str())) {
                    return Err(ParseError::Requires {
                        option: self.flag_of(option),
                        required: self.flag_of(required),
                    });
                }
            }
        }
        for group in &self.conflicts {
            let mut present = group.iter().filter(|n| given.contains(n.as_str()));
            if let (Some(option), Some(other)) = (present.next(), present.next()) {
                return Err(ParseError::Conflicts {
                    option: self.flag_of(option),
                    other: self.flag_of(other),
                });
            }
        }
        Ok(())
    }

    fn left_column(opt: &ResolvedOpt) -> String {
        let mut left = opt.flag();
        if let Some(c) = opt.short {
            left.push_str(&format!(", -{c}"));
        }
        if let Some(tag) = opt.ty.tag() {
            left.push_str(&format!(" <{tag}>"));
        }
        left
    }

    /// Render the help screen in directive order.
    #[must_use]
    pub fn help(&self) -> String {
        let columns: Vec<String> = self.opts.iter().map(Self::left_column).collect();
        let width = columns.iter().map(|c| c.chars().count()).max().unwrap_or(0);

        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Text(text) => {
                    out.push_str(text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                }
                Line::Opt(i) => {
                    let opt = &self.opts[*i];
                    let mut desc = opt.desc.clone();
                    if let Some(default) = &opt.default {
                        if opt.ty != OptType::Boolean {
                            desc.push_str(&format!(" (default: {default})"));
                        }
                    }
                    let entry = format!("  {:>width$}:   {desc}", columns[*i]);
                    out.push_str(entry.trim_end());
                    out.push('\n');
                }
            }
        }
        out
    }
}

fn check_longs(opts: &[ResolvedOpt]) -> Result<(), SpecError> {
    let mut seen = HashSet::new();
    for opt in opts {
        let flag = opt.flag();
        if !seen.insert(flag.clone()) {
            return Err(SpecError::DuplicateLong(flag));
        }
    }
    Ok(())
}

/// Explicit shorts are claimed first, then the help option takes `h`, then
/// every other option takes the first free character of its long name.
fn assign_shorts(opts: &mut [ResolvedOpt]) -> Result<(), SpecError> {
    let mut taken = HashSet::new();
    for opt in opts.iter() {
        if let Some(c) = opt.short {
            if !taken.insert(c) {
                return Err(SpecError::DuplicateShort(c));
            }
        }
    }
    if let Some(help) = opts
        .iter_mut()
        .find(|o| o.name == HELP_OPTION && o.auto_short)
    {
        if taken.insert('h') {
            help.short = Some('h');
        }
    }
    for opt in opts.iter_mut().filter(|o| o.auto_short && o.short.is_none()) {
        opt.short = opt
            .long
            .chars()
            .find(|&c| is_valid_short(c) && !taken.contains(&c));
        if let Some(c) = opt.short {
            taken.insert(c);
        }
    }
    Ok(())
}

fn clap_command(opts: &[ResolvedOpt]) -> clap::Command {
    let mut command = clap::Command::new("cmdtree")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .color(clap::ColorChoice::Never)
        .arg(
            Arg::new(POSITIONAL)
                .num_args(1..)
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(String)),
        );
    for opt in opts {
        let long = opt.flag().trim_start_matches('-').to_string();
        let mut arg = Arg::new(opt.name.clone()).long(long);
        if let Some(c) = opt.short {
            arg = arg.short(c);
        }
        arg = if opt.ty == OptType::Boolean {
            arg.action(ArgAction::Count)
        } else {
            let numeric = matches!(opt.ty.scalar(), OptType::Integer | OptType::Float);
            let arg = arg
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(String))
                .allow_negative_numbers(numeric);
            if opt.ty.is_list() {
                arg.num_args(1..)
            } else {
                arg.num_args(1)
            }
        };
        command = command.arg(arg);
    }
    command
}

fn each<T>(raw: &[&String], parse: impl Fn(&str) -> Option<T>) -> Result<Vec<T>, String> {
    raw.iter()
        .map(|s| parse(s.as_str()).ok_or_else(|| (*s).clone()))
        .collect()
}

fn pick<T>(mut values: Vec<T>, list: bool, many: fn(Vec<T>) -> Value, one: fn(T) -> Value) -> Value {
    if list {
        return many(values);
    }
    match values.pop() {
        Some(value) => one(value),
        None => many(values),
    }
}

/// Type the raw strings of one option; the offending string is returned on failure.
fn convert(ty: OptType, list: bool, raw: &[&String]) -> Result<Value, String> {
    Ok(match ty.scalar() {
        OptType::Integer => pick(each(raw, |s| s.parse::<i64>().ok())?, list, Value::Ints, Value::Int),
        OptType::Float => pick(each(raw, |s| s.parse::<f64>().ok())?, list, Value::Floats, Value::Float),
        OptType::Date => pick(
            each(raw, |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?,
            list,
            Value::Dates,
            Value::Date,
        ),
        OptType::File => pick(
            each(raw, |s| Some(PathBuf::from(s)))?,
            list,
            Value::Files,
            Value::File,
        ),
        _ => pick(
            each(raw, |s| Some(s.to_string()))?,
            list,
            Value::Strs,
            Value::Str,
        ),
    })
}
