//! Per-command flag grammar.
//!
//! A [`FlagSet`] strips the flags it knows about out of an [`Args`] and
//! leaves everything else in place, so a command can still hand the
//! leftovers to git. Handlers never read the dynamic [`FlagValues`] bag
//! directly: the [`flag_set!`] macro generates a typed struct plus the
//! grammar it is parsed from.

use crate::args::{is_flag_like, Args};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlagError {
    #[error("flag --{0} declared twice")]
    Duplicate(String),

    #[error("ambiguous option {token}: could be {candidates}")]
    Ambiguous { token: String, candidates: String },

    #[error("flag needs an argument: {0}")]
    MissingValue(String),

    #[error("invalid value {value:?} for boolean flag --{flag}")]
    InvalidBool { flag: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    String,
    /// Every occurrence is kept, in order.
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl FlagKind {
    fn zero(self) -> FlagValue {
        match self {
            FlagKind::Bool => FlagValue::Bool(false),
            FlagKind::String => FlagValue::Str(String::new()),
            FlagKind::Repeated => FlagValue::List(Vec::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flag {
    kind: FlagKind,
    long: &'static str,
    short: Option<char>,
    default: FlagValue,
}

impl Flag {
    pub fn new(kind: FlagKind, long: &'static str) -> Self {
        Self {
            kind,
            long,
            short: None,
            default: kind.zero(),
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Value reported when the flag never appears. Ignored if it does not
    /// match the flag's kind.
    pub fn with_default(mut self, default: FlagValue) -> Self {
        if std::mem::discriminant(&default) == std::mem::discriminant(&self.kind.zero()) {
            self.default = default;
        }
        self
    }

    /// `-d, --draft` style label used in usage listings.
    pub fn label(&self) -> String {
        match self.short {
            Some(c) => format!("-{}, --{}", c, self.long),
            None => format!("--{}", self.long),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, flag: Flag) -> Result<&mut Self, FlagError> {
        let clash = self.flags.iter().any(|f| {
            f.long == flag.long || (flag.short.is_some() && f.short == flag.short)
        });
        if clash {
            return Err(FlagError::Duplicate(flag.long.to_string()));
        }
        self.flags.push(flag);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn defaults(&self) -> FlagValues {
        let mut values = FlagValues::default();
        for flag in &self.flags {
            values.values.insert(flag.long.to_string(), flag.default.clone());
        }
        values
    }

    /// Strip every declared flag (and its value) out of `args`.
    ///
    /// Scanning is left to right over the live container and stops at `--`.
    /// Tokens that match nothing stay where they are.
    pub fn parse(&self, args: &mut Args) -> Result<FlagValues, FlagError> {
        let mut values = self.defaults();
        let mut i = 0;

        while let Some(token) = args.get(i).map(str::to_string) {
            if token == "--" {
                break;
            }

            let matched = if let Some(body) = token.strip_prefix("--") {
                self.take_long(&token, body, args, i, &mut values)?
            } else if is_flag_like(&token) {
                self.take_short(&token, args, i, &mut values)?
            } else {
                false
            };

            if !matched {
                i += 1;
            }
        }

        Ok(values)
    }

    fn lookup_long(&self, token: &str, name: &str) -> Result<Option<&Flag>, FlagError> {
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(flag) = self.flags.iter().find(|f| f.long == name) {
            return Ok(Some(flag));
        }

        let candidates: Vec<&Flag> = self
            .flags
            .iter()
            .filter(|f| f.long.starts_with(name))
            .collect();

        match candidates.as_slice() {
            [] => Ok(None),
            [flag] => Ok(Some(flag)),
            many => Err(FlagError::Ambiguous {
                token: token.to_string(),
                candidates: many
                    .iter()
                    .map(|f| format!("--{}", f.long))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn take_long(
        &self,
        token: &str,
        body: &str,
        args: &mut Args,
        at: usize,
        values: &mut FlagValues,
    ) -> Result<bool, FlagError> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (body, None),
        };

        let Some(flag) = self.lookup_long(token, name)? else {
            return Ok(false);
        };

        if flag.kind == FlagKind::Bool {
            let on = match inline.as_deref() {
                None => true,
                Some(v) => parse_bool(v).ok_or_else(|| FlagError::InvalidBool {
                    flag: flag.long.to_string(),
                    value: v.to_string(),
                })?,
            };
            values.record(flag, on.to_string());
            remove_at(args, at, 1);
            return Ok(true);
        }

        let taken = match inline {
            Some(value) => {
                remove_at(args, at, 1);
                value
            }
            None => take_value(args, at, token)?,
        };
        values.record(flag, taken);
        Ok(true)
    }

    /// Handles `-d`, clusters such as `-dp`, and attached values (`-mtext`, `-m=text`).
    /// A cluster with any undeclared letter is left alone.
    fn take_short(
        &self,
        token: &str,
        args: &mut Args,
        at: usize,
        values: &mut FlagValues,
    ) -> Result<bool, FlagError> {
        let cluster = &token[1..];
        let mut switches = Vec::new();
        let mut valued: Option<(&Flag, &str)> = None;

        for (pos, c) in cluster.char_indices() {
            let Some(flag) = self.flags.iter().find(|f| f.short == Some(c)) else {
                return Ok(false);
            };
            if flag.kind == FlagKind::Bool {
                switches.push(flag);
            } else {
                valued = Some((flag, &cluster[pos + c.len_utf8()..]));
                break;
            }
        }

        for flag in switches {
            values.record(flag, "true".to_string());
        }

        match valued {
            None => remove_at(args, at, 1),
            Some((flag, rest)) if !rest.is_empty() => {
                let value = rest.strip_prefix('=').unwrap_or(rest).to_string();
                values.record(flag, value);
                remove_at(args, at, 1);
            }
            Some((flag, _)) => {
                let value = take_value(args, at, token)?;
                values.record(flag, value);
            }
        }
        Ok(true)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn remove_at(args: &mut Args, at: usize, count: usize) {
    for _ in 0..count {
        // `at` always points at a token the caller just read.
        let _ = args.remove(at);
    }
}

/// Remove the flag at `at` together with the value token that follows it.
fn take_value(args: &mut Args, at: usize, token: &str) -> Result<String, FlagError> {
    let value = args
        .get(at + 1)
        .map(str::to_string)
        .ok_or_else(|| FlagError::MissingValue(token.to_string()))?;
    remove_at(args, at, 2);
    Ok(value)
}

/// Resolved values for one invocation, keyed by long name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagValues {
    values: HashMap<String, FlagValue>,
}

impl FlagValues {
    fn record(&mut self, flag: &Flag, raw: String) {
        let slot = self
            .values
            .entry(flag.long.to_string())
            .or_insert_with(|| flag.kind.zero());
        match (flag.kind, slot) {
            (FlagKind::Bool, slot) => *slot = FlagValue::Bool(raw == "true"),
            (FlagKind::String, slot) => *slot = FlagValue::Str(raw),
            (FlagKind::Repeated, FlagValue::List(items)) => items.push(raw),
            (FlagKind::Repeated, slot) => *slot = FlagValue::List(vec![raw]),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.values.get(name)
    }

    pub fn bool(&self, name: &str) -> bool {
        matches!(self.get(name), Some(FlagValue::Bool(true)))
    }

    pub fn string(&self, name: &str) -> String {
        match self.get(name) {
            Some(FlagValue::Str(s)) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(FlagValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Fold values parsed by a parent command underneath this bag.
    pub fn merge_parent(&mut self, parent: FlagValues) {
        for (name, value) in parent.values {
            self.values.entry(name).or_insert(value);
        }
    }
}

/// Rust types a flag can be read into.
pub trait FlagType: Sized {
    const KIND: FlagKind;

    fn extract(values: &FlagValues, name: &str) -> Self;

    fn into_value(self) -> FlagValue;
}

impl FlagType for bool {
    const KIND: FlagKind = FlagKind::Bool;

    fn extract(values: &FlagValues, name: &str) -> Self {
        values.bool(name)
    }

    fn into_value(self) -> FlagValue {
        FlagValue::Bool(self)
    }
}

impl FlagType for String {
    const KIND: FlagKind = FlagKind::String;

    fn extract(values: &FlagValues, name: &str) -> Self {
        values.string(name)
    }

    fn into_value(self) -> FlagValue {
        FlagValue::Str(self)
    }
}

impl FlagType for Vec<String> {
    const KIND: FlagKind = FlagKind::Repeated;

    fn extract(values: &FlagValues, name: &str) -> Self {
        values.list(name)
    }

    fn into_value(self) -> FlagValue {
        FlagValue::List(self)
    }
}

/// Implemented by structs generated with [`flag_set!`].
pub trait FlagStruct: Sized {
    fn grammar() -> Result<FlagSet, FlagError>;

    fn from_values(values: &FlagValues) -> Self;
}

/// Declare a typed options struct and the grammar that fills it.
///
/// ```ignore
/// flag_set! {
///     pub struct CreateFlags {
///         draft: bool = ("draft", 'd'),
///         assets: Vec<String> = ("attach", 'a'),
///         remote: String = ("remote"; default "origin"),
///     }
/// }
/// ```
macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $field:ident : $ty:ty = ($long:literal $(, $short:literal)? $(; default $default:expr)?)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        $vis struct $name {
            $(pub $field: $ty,)*
        }

        impl $crate::flags::FlagStruct for $name {
            fn grammar() -> Result<$crate::flags::FlagSet, $crate::flags::FlagError> {
                let mut set = $crate::flags::FlagSet::new();
                $(
                    set.declare(
                        $crate::flags::Flag::new(
                            <$ty as $crate::flags::FlagType>::KIND,
                            $long,
                        )
                        $(.short($short))?
                        $(.with_default(
                            <$ty as $crate::flags::FlagType>::into_value(<$ty>::from($default)),
                        ))?
                    )?;
                )*
                Ok(set)
            }

            fn from_values(values: &$crate::flags::FlagValues) -> Self {
                Self {
                    $($field: <$ty as $crate::flags::FlagType>::extract(values, $long),)*
                }
            }
        }
    };
}

pub(crate) use flag_set;
