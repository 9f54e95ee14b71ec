use std::fmt;
use std::str::FromStr;

use crate::parser::SpecError;
use crate::parser::value::Value;

/// Value types understood by the option parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptType {
    Boolean,
    Integer,
    Integers,
    Float,
    Floats,
    String,
    Strings,
    Date,
    Dates,
    File,
    Files,
}

impl OptType {
    /// The type a default value implies.
    #[must_use]
    pub fn of(value: &Value) -> OptType {
        match value {
            Value::Bool(_) => OptType::Boolean,
            Value::Int(_) => OptType::Integer,
            Value::Ints(_) => OptType::Integers,
            Value::Float(_) => OptType::Float,
            Value::Floats(_) => OptType::Floats,
            Value::Str(_) => OptType::String,
            Value::Strs(_) => OptType::Strings,
            Value::Date(_) => OptType::Date,
            Value::Dates(_) => OptType::Dates,
            Value::File(_) => OptType::File,
            Value::Files(_) => OptType::Files,
        }
    }

    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(
            self,
            OptType::Integers | OptType::Floats | OptType::Strings | OptType::Dates | OptType::Files
        )
    }

    /// Element type of a list type; scalar types map to themselves.
    #[must_use]
    pub fn scalar(self) -> OptType {
        match self {
            OptType::Integers => OptType::Integer,
            OptType::Floats => OptType::Float,
            OptType::Strings => OptType::String,
            OptType::Dates => OptType::Date,
            OptType::Files => OptType::File,
            other => other,
        }
    }

    /// Placeholder shown after the flag in help output.
    #[must_use]
    pub fn tag(self) -> Option<&'static str> {
        match self {
            OptType::Boolean => None,
            OptType::Integer => Some("i"),
            OptType::Integers => Some("i+"),
            OptType::Float => Some("f"),
            OptType::Floats => Some("f+"),
            OptType::String => Some("s"),
            OptType::Strings => Some("s+"),
            OptType::Date => Some("date"),
            OptType::Dates => Some("date+"),
            OptType::File => Some("filename/uri"),
            OptType::Files => Some("filename/uri+"),
        }
    }

    /// Noun used in "needs ..." diagnostics.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self.scalar() {
            OptType::Boolean => "no value",
            OptType::Integer => "an integer",
            OptType::Float => "a floating-point number",
            OptType::Date => "a date (YYYY-MM-DD)",
            OptType::File => "a filename or uri",
            _ => "a string",
        }
    }
}

impl FromStr for OptType {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "boolean" | "bool" | "flag" => OptType::Boolean,
            "integer" | "int" => OptType::Integer,
            "integers" | "ints" => OptType::Integers,
            "float" | "double" => OptType::Float,
            "floats" | "doubles" => OptType::Floats,
            "string" => OptType::String,
            "strings" => OptType::Strings,
            "date" => OptType::Date,
            "dates" => OptType::Dates,
            "io" | "file" => OptType::File,
            "ios" | "files" => OptType::Files,
            other => return Err(SpecError::UnsupportedType(other.to_string())),
        })
    }
}

impl fmt::Display for OptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptType::Boolean => "boolean",
            OptType::Integer => "integer",
            OptType::Integers => "integers",
            OptType::Float => "float",
            OptType::Floats => "floats",
            OptType::String => "string",
            OptType::Strings => "strings",
            OptType::Date => "date",
            OptType::Dates => "dates",
            OptType::File => "file",
            OptType::Files => "files",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
enum TypeSpec {
    Known(OptType),
    Named(String),
}

#[derive(Debug, Clone, Default)]
enum Short {
    #[default]
    Auto,
    Disabled,
    Given(String),
}

/// Attributes of a declared option.
///
/// Spellings and type names are stored as given and only checked when the
/// parser for an invocation is built.
#[derive(Debug, Clone, Default)]
pub struct Opt {
    kind: Option<TypeSpec>,
    default: Option<Value>,
    required: bool,
    multi: bool,
    long: Option<String>,
    short: Short,
}

impl Opt {
    #[must_use]
    pub fn new() -> Self {
        <Opt as Default>::default()
    }

    #[must_use]
    pub fn of_type(mut self, ty: OptType) -> Self {
        self.kind = Some(TypeSpec::Known(ty));
        self
    }

    /// Declare the type by name, e.g. `"int"` or `"strings"`.
    #[must_use]
    pub fn kind(mut self, name: &str) -> Self {
        self.kind = Some(TypeSpec::Named(name.to_string()));
        self
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allow the option to be given more than once.
    #[must_use]
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    #[must_use]
    pub fn long(mut self, long: &str) -> Self {
        self.long = Some(long.to_string());
        self
    }

    #[must_use]
    pub fn short(mut self, short: &str) -> Self {
        self.short = Short::Given(short.to_string());
        self
    }

    #[must_use]
    pub fn no_short(mut self) -> Self {
        self.short = Short::Disabled;
        self
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn drop_required(&mut self) {
        self.required = false;
    }
}

/// An option declaration as registered on a command node
#[derive(Debug, Clone)]
pub struct OptSpec {
    pub name: String,
    pub desc: String,
    pub attrs: Opt,
}

/// An option declaration after validation, ready to be handed to clap
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOpt {
    pub name: String,
    pub desc: String,
    pub ty: OptType,
    pub default: Option<Value>,
    pub required: bool,
    pub multi: bool,
    pub long: String,
    pub short: Option<char>,
    /// No explicit short was given and none was disabled
    pub auto_short: bool,
    /// Boolean defaulting to true, spelled `--no-<long>`
    pub negated: bool,
}

impl ResolvedOpt {
    /// The long flag exactly as typed on the command line.
    pub fn flag(&self) -> String {
        if self.negated {
            format!("--no-{}", self.long)
        } else {
            format!("--{}", self.long)
        }
    }
}

fn resolve_type(spec: &OptSpec) -> Result<OptType, SpecError> {
    let declared = match &spec.attrs.kind {
        Some(TypeSpec::Known(ty)) => Some(*ty),
        Some(TypeSpec::Named(name)) => Some(name.parse::<OptType>()?),
        None => None,
    };
    let inferred = spec.attrs.default.as_ref().map(|default| {
        let ty = OptType::of(default);
        if spec.attrs.multi { ty.scalar() } else { ty }
    });
    match (declared, inferred) {
        (Some(declared), Some(inferred)) if declared != inferred => {
            // A multi option may carry a list default of its element type
            if spec.attrs.multi && declared.scalar() == inferred {
                Ok(declared)
            } else {
                Err(SpecError::TypeMismatch(spec.name.clone()))
            }
        }
        (Some(ty), _) | (None, Some(ty)) => Ok(ty),
        (None, None) => Ok(OptType::Boolean),
    }
}

fn resolve_long(spec: &OptSpec) -> Result<String, SpecError> {
    let Some(given) = &spec.attrs.long else {
        return Ok(spec.name.replace('_', "-"));
    };
    let long = given.strip_prefix("--").unwrap_or(given);
    if long.is_empty() || long.starts_with('-') || long.chars().any(char::is_whitespace) {
        return Err(SpecError::InvalidLongName(given.clone()));
    }
    Ok(long.to_string())
}

fn resolve_short(spec: &OptSpec) -> Result<Option<char>, SpecError> {
    let Short::Given(given) = &spec.attrs.short else {
        return Ok(None);
    };
    let raw = given.strip_prefix('-').unwrap_or(given);
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if is_valid_short(c) => Ok(Some(c)),
        _ => Err(SpecError::InvalidShortName(given.clone())),
    }
}

pub(crate) fn is_valid_short(c: char) -> bool {
    c.is_alphanumeric() && !c.is_ascii_digit()
}

impl OptSpec {
    pub(crate) fn resolve(&self) -> Result<ResolvedOpt, SpecError> {
        if self.name.is_empty()
            || self.name.starts_with('-')
            || self.name.chars().any(|c| c.is_whitespace() || c == '[' || c == ']')
        {
            return Err(SpecError::InvalidOptionName(self.name.clone()));
        }
        let ty = resolve_type(self)?;
        let negated = ty == OptType::Boolean && self.attrs.default == Some(Value::Bool(true));
        Ok(ResolvedOpt {
            name: self.name.clone(),
            desc: self.desc.clone(),
            ty,
            default: self.attrs.default.clone(),
            required: self.attrs.required,
            multi: self.attrs.multi,
            long: resolve_long(self)?,
            short: resolve_short(self)?,
            auto_short: matches!(self.attrs.short, Short::Auto),
            negated,
        })
    }
}
