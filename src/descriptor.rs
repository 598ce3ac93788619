//! Declarative type descriptors.
//!
//! A `TypeDescriptor` is the static shape a field's value must have. The set of
//! variants is closed; anything the matcher cannot interpret is kept as
//! `Unrecognized` with its source text so strict mode can report it.
//!
//! Descriptors have a compact text form (`Dict[String, List[Int]]`,
//! `Optional[Int]`, `Int | String`) used by record schemas and the CLI; serde
//! reads and writes that text.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------- Types ------------------------------------ //

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Any,
    None,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    DateTime,
    /// Nominal record type, matched against `RecordValue::type_name`.
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    Scalar(ScalarType),
    Sequence(Box<TypeDescriptor>),
    Mapping(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Callable,
    Union(Vec<TypeDescriptor>),
    Unrecognized(String),
}

impl TypeDescriptor {
    pub fn scalar(t: ScalarType) -> Self { Self::Scalar(t) }
    pub fn named(name: impl Into<String>) -> Self { Self::Scalar(ScalarType::Named(name.into())) }
    pub fn list(item: TypeDescriptor) -> Self { Self::Sequence(Box::new(item)) }
    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }
    pub fn union(alternatives: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self::Union(alternatives.into_iter().collect())
    }
    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Union(vec![inner, Self::Scalar(ScalarType::None)])
    }

    /// First `Unrecognized` node in the tree, depth-first in declaration order.
    pub fn find_unrecognized(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) | Self::Callable => None,
            Self::Unrecognized(raw) => Some(raw),
            Self::Sequence(item) => item.find_unrecognized(),
            Self::Mapping(k, v) => k.find_unrecognized().or_else(|| v.find_unrecognized()),
            Self::Union(alts) => alts.iter().find_map(Self::find_unrecognized),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarType::Any => "Any",
            ScalarType::None => "None",
            ScalarType::Bool => "Bool",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Str => "String",
            ScalarType::Bytes => "Bytes",
            ScalarType::DateTime => "DateTime",
            ScalarType::Named(name) => name,
        })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(t) => write!(f, "{t}"),
            Self::Sequence(item) => write!(f, "List[{item}]"),
            Self::Mapping(k, v) => write!(f, "Dict[{k}, {v}]"),
            Self::Callable => f.write_str("Callable"),
            Self::Union(alts) => {
                f.write_str("Union[")?;
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{alt}")?;
                }
                f.write_str("]")
            }
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl From<TypeDescriptor> for String {
    fn from(d: TypeDescriptor) -> Self { d.to_string() }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = DescriptorParseError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl FromStr for TypeDescriptor {
    type Err = DescriptorParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut p = Parser { src: s, pos: 0, depth: 0 };
        let d = p.union()?;
        p.skip_ws();
        if p.pos < s.len() {
            return Err(p.error("unexpected trailing input"));
        }
        Ok(d)
    }
}

// ------------------------------- Grammar ---------------------------------- //

static SCALAR_NAMES: Lazy<HashMap<&'static str, ScalarType>> = Lazy::new(|| {
    HashMap::from([
        ("Any", ScalarType::Any),
        ("object", ScalarType::Any),
        ("None", ScalarType::None),
        ("null", ScalarType::None),
        ("bool", ScalarType::Bool),
        ("Bool", ScalarType::Bool),
        ("int", ScalarType::Int),
        ("Int", ScalarType::Int),
        ("float", ScalarType::Float),
        ("Float", ScalarType::Float),
        ("str", ScalarType::Str),
        ("String", ScalarType::Str),
        ("bytes", ScalarType::Bytes),
        ("Bytes", ScalarType::Bytes),
        ("datetime", ScalarType::DateTime),
        ("DateTime", ScalarType::DateTime),
    ])
});

/// Generic shapes the matcher has no rule for.
const UNSUPPORTED_GENERICS: &[&str] = &[
    "Tuple", "tuple", "Set", "set", "FrozenSet", "frozenset", "Literal",
    "Sequence", "Iterable", "Iterator", "Type", "type", "Mapping", "Generator",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type descriptor at offset {offset}: {reason}")]
pub struct DescriptorParseError {
    pub offset: usize,
    pub reason: String,
}

enum Arg {
    Desc(TypeDescriptor),
    /// Bracketed parameter list, only meaningful inside `Callable[...]`.
    Group,
    Ellipsis,
}

/// Bracket nesting accepted before parsing gives up; matches serde_json.
const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> DescriptorParseError {
        DescriptorParseError { offset: self.pos, reason: reason.into() }
    }

    fn skip_ws(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), DescriptorParseError> {
        if self.eat(c) { Ok(()) } else { Err(self.error(format!("expected `{c}`"))) }
    }

    fn ident(&mut self) -> Result<&'a str, DescriptorParseError> {
        self.skip_ws();
        let src = self.src;
        let rest = &src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn union(&mut self) -> Result<TypeDescriptor, DescriptorParseError> {
        let first = self.term()?;
        let mut alts = vec![first];
        while self.eat('|') {
            alts.push(self.term()?);
        }
        Ok(if alts.len() == 1 { alts.remove(0) } else { TypeDescriptor::Union(alts) })
    }

    fn args(&mut self) -> Result<Vec<Arg>, DescriptorParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("descriptor nested too deeply"));
        }
        self.depth += 1;
        let args = self.arg_list();
        self.depth -= 1;
        args
    }

    fn arg_list(&mut self) -> Result<Vec<Arg>, DescriptorParseError> {
        let mut args = Vec::new();
        loop {
            self.skip_ws();
            if self.src[self.pos..].starts_with("...") {
                self.pos += 3;
                args.push(Arg::Ellipsis);
            } else if self.eat('[') {
                if !self.eat(']') {
                    loop {
                        self.union()?;
                        if self.eat(']') { break; }
                        self.expect(',')?;
                    }
                }
                args.push(Arg::Group);
            } else {
                args.push(Arg::Desc(self.union()?));
            }
            if self.eat(']') { return Ok(args); }
            self.expect(',')?;
        }
    }

    fn term(&mut self) -> Result<TypeDescriptor, DescriptorParseError> {
        let start = { self.skip_ws(); self.pos };
        let name = self.ident()?;
        let args = if self.eat('[') { Some(self.args()?) } else { None };
        let raw = || self.src[start..self.pos].trim().to_string();

        if UNSUPPORTED_GENERICS.contains(&name) {
            return Ok(TypeDescriptor::Unrecognized(raw()));
        }

        let Some(args) = args else {
            return Ok(match name {
                "List" | "list" => TypeDescriptor::list(TypeDescriptor::Scalar(ScalarType::Any)),
                "Dict" | "dict" => TypeDescriptor::dict(
                    TypeDescriptor::Scalar(ScalarType::Any),
                    TypeDescriptor::Scalar(ScalarType::Any),
                ),
                "Callable" => TypeDescriptor::Callable,
                _ => match SCALAR_NAMES.get(name) {
                    Some(t) => TypeDescriptor::Scalar(t.clone()),
                    None => TypeDescriptor::named(name),
                },
            });
        };

        match name {
            "List" | "list" => match <[Arg; 1]>::try_from(args) {
                Ok([Arg::Desc(item)]) => Ok(TypeDescriptor::list(item)),
                _ => Err(self.error("`List` takes exactly one type argument")),
            },
            "Dict" | "dict" => match <[Arg; 2]>::try_from(args) {
                Ok([Arg::Desc(k), Arg::Desc(v)]) => Ok(TypeDescriptor::dict(k, v)),
                _ => Err(self.error("`Dict` takes exactly two type arguments")),
            },
            "Optional" => match <[Arg; 1]>::try_from(args) {
                Ok([Arg::Desc(inner)]) => Ok(TypeDescriptor::optional(inner)),
                _ => Err(self.error("`Optional` takes exactly one type argument")),
            },
            "Union" => args
                .into_iter()
                .map(|a| match a {
                    Arg::Desc(d) => Ok(d),
                    _ => Err(self.error("`Union` arguments must be types")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(TypeDescriptor::Union),
            // signature is not checked
            "Callable" => Ok(TypeDescriptor::Callable),
            _ => Ok(TypeDescriptor::Unrecognized(raw())),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
